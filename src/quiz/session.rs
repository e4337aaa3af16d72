use serde::{Deserialize, Serialize};

/// Who is taking the quiz. Mirrors the Telegram identity captured at
/// selection time; the name fields end up in the result row.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizTaker {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// The slice of a question the session needs to keep in memory: enough to
/// present it and to log the answer. Full rows are re-read from the store
/// per question so mid-attempt deletions are detected.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionRef {
    pub id: i64,
    pub text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AttemptScore {
    pub score: i64,
    pub total: i64,
}

/// One in-flight quiz attempt.
///
/// States: answering question `current_index` until the index reaches the
/// question count, at which point the attempt is complete and gets
/// finalized and discarded. There is exactly one session per user at a
/// time, held in the dialogue state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuizSession {
    pub test_id: i64,
    pub taker: QuizTaker,
    pub questions: Vec<QuestionRef>,
    pub current_index: usize,
    pub correct_answers: i64,
    pub attempt_number: i64,
}

impl QuizSession {
    pub fn new(
        test_id: i64,
        taker: QuizTaker,
        questions: Vec<QuestionRef>,
        attempt_number: i64,
    ) -> Self {
        Self {
            test_id,
            taker,
            questions,
            current_index: 0,
            correct_answers: 0,
            attempt_number,
        }
    }

    /// The question currently awaiting an answer, or `None` once the
    /// attempt is complete.
    pub fn current_question(&self) -> Option<&QuestionRef> {
        self.questions.get(self.current_index)
    }

    pub fn is_complete(&self) -> bool {
        self.current_index >= self.questions.len()
    }

    /// Books one answer and advances to the next question. A no-op after
    /// completion so a stray late answer cannot inflate the score.
    pub fn record_answer(&mut self, correct: bool) {
        if self.is_complete() {
            return;
        }
        if correct {
            self.correct_answers += 1;
        }
        self.current_index += 1;
    }

    pub fn score(&self) -> AttemptScore {
        AttemptScore {
            score: self.correct_answers,
            total: self.questions.len() as i64,
        }
    }

    /// 1-based position of the current question, for "Question i/n" prompts.
    pub fn progress(&self) -> (usize, usize) {
        (self.current_index + 1, self.questions.len())
    }
}
