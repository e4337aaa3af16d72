/// Attempt admission and finalization rules.
///
/// A completed attempt either inserts the first result row, improves an
/// existing one, or is discarded when the row has no attempts left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ResultUpdate {
    Insert {
        best_score: i64,
        total: i64,
        attempts_left: i64,
    },
    Update {
        best_score: i64,
        total: i64,
    },
    /// The score is shown to the user but not persisted. Only reachable by
    /// a session that outlived its last attempt, since selection rejects
    /// exhausted tests up front.
    Discard,
}

/// Normalization applied to free-text answers on both sides of the
/// comparison: correct answers are stored this way, submissions are folded
/// the same way before matching.
pub fn normalize_free_text(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Case-insensitive, whitespace-trimmed equality. A question without a
/// stored correct answer never matches.
pub fn free_text_matches(submitted: &str, correct: Option<&str>) -> bool {
    match correct {
        Some(correct) => normalize_free_text(submitted) == normalize_free_text(correct),
        None => false,
    }
}

/// Number of the attempt about to start: completed attempts + 1. With a
/// result row present, completed attempts are `max_attempts -
/// attempts_left`; without one, none have finished yet.
pub fn attempt_number(max_attempts: i64, prior_attempts_left: Option<i64>) -> i64 {
    match prior_attempts_left {
        Some(left) => max_attempts - left + 1,
        None => 1,
    }
}

/// Attempts the user may still start. Used by the selection listing, which
/// hides tests where this reaches zero.
pub fn attempts_remaining(max_attempts: i64, prior_attempts_left: Option<i64>) -> i64 {
    prior_attempts_left.unwrap_or(max_attempts)
}

/// Folds a finished attempt into the stored result.
///
/// First completion inserts `best_score = score` and burns one attempt.
/// Later completions with attempts left keep best_score monotone
/// (`max(old, new)`) and burn one attempt. With no attempts left the score
/// is dropped, never clamping best_score downward.
pub fn finalize_attempt(
    score: i64,
    total: i64,
    prior: Option<(i64, i64)>, // (best_score, attempts_left)
    max_attempts: i64,
) -> ResultUpdate {
    match prior {
        None => ResultUpdate::Insert {
            best_score: score,
            total,
            attempts_left: max_attempts - 1,
        },
        Some((best_score, attempts_left)) if attempts_left > 0 => ResultUpdate::Update {
            best_score: best_score.max(score),
            total,
        },
        Some(_) => ResultUpdate::Discard,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_free_text_matching_is_case_and_whitespace_insensitive() {
        assert!(free_text_matches("Paris", Some("paris")));
        assert!(free_text_matches(" paris ", Some("paris")));
        assert!(free_text_matches("PARIS", Some("paris")));
        assert!(free_text_matches("\tParis\n", Some("paris")));
        assert!(!free_text_matches("London", Some("paris")));
    }

    #[test]
    fn test_free_text_never_matches_without_a_stored_answer() {
        assert!(!free_text_matches("anything", None));
        assert!(!free_text_matches("", None));
    }

    #[test]
    fn test_normalize_free_text() {
        assert_eq!(normalize_free_text("  Mont Blanc  "), "mont blanc");
        assert_eq!(normalize_free_text("PARIS"), "paris");
        // inner whitespace is preserved, only the edges are trimmed
        assert_eq!(normalize_free_text(" a  b "), "a  b");
    }

    #[test]
    fn test_attempt_number_starts_at_one_and_counts_completions() {
        assert_eq!(attempt_number(3, None), 1);
        assert_eq!(attempt_number(3, Some(2)), 2);
        assert_eq!(attempt_number(3, Some(1)), 3);
        assert_eq!(attempt_number(3, Some(0)), 4);
    }

    #[test]
    fn test_attempts_remaining() {
        assert_eq!(attempts_remaining(2, None), 2);
        assert_eq!(attempts_remaining(2, Some(1)), 1);
        assert_eq!(attempts_remaining(2, Some(0)), 0);
    }

    #[test]
    fn test_first_completion_inserts_and_burns_one_attempt() {
        let update = finalize_attempt(1, 1, None, 2);
        assert_eq!(
            update,
            ResultUpdate::Insert {
                best_score: 1,
                total: 1,
                attempts_left: 1,
            }
        );
    }

    #[test]
    fn test_later_completion_keeps_best_score_monotone() {
        // second attempt scored worse: best_score stays
        assert_eq!(
            finalize_attempt(0, 1, Some((1, 1)), 2),
            ResultUpdate::Update {
                best_score: 1,
                total: 1,
            }
        );
        // second attempt scored better: best_score moves up
        assert_eq!(
            finalize_attempt(3, 3, Some((2, 1)), 2),
            ResultUpdate::Update {
                best_score: 3,
                total: 3,
            }
        );
    }

    #[test]
    fn test_exhausted_result_discards_the_score() {
        assert_eq!(finalize_attempt(5, 5, Some((2, 0)), 2), ResultUpdate::Discard);
    }
}
