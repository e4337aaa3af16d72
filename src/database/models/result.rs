use serde::{Deserialize, Serialize};
use sqlx::FromRow;

use crate::quiz::scoring::ResultUpdate;

/// Best score and remaining attempts for one (user, test) pair. Created on
/// the first completed attempt, updated on later ones.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserResult {
    pub id: i64,
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
    pub test_id: i64,
    pub best_score: i64,
    pub total: i64,
    pub attempts_left: i64,
    pub completed_at: String,
}

impl UserResult {
    pub async fn find(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        test_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, UserResult>(
            r#"
            SELECT id, user_id, first_name, last_name, test_id, best_score, total, attempts_left, completed_at
            FROM user_results
            WHERE user_id = ? AND test_id = ?
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .fetch_optional(pool)
        .await
    }

    /// Applies a finalized attempt to the store.
    ///
    /// The update path issues two single-statement writes, not one
    /// transaction: first the best_score/total/completed_at update, then
    /// the guarded attempts_left decrement. A `Discard` leaves the row
    /// untouched.
    pub async fn apply(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        first_name: &str,
        last_name: &str,
        test_id: i64,
        update: &ResultUpdate,
    ) -> Result<(), sqlx::Error> {
        match update {
            ResultUpdate::Insert {
                best_score,
                total,
                attempts_left,
            } => {
                sqlx::query(
                    r#"
                    INSERT INTO user_results (user_id, first_name, last_name, test_id, best_score, total, attempts_left)
                    VALUES (?, ?, ?, ?, ?, ?, ?)
                    "#,
                )
                .bind(user_id)
                .bind(first_name)
                .bind(last_name)
                .bind(test_id)
                .bind(best_score)
                .bind(total)
                .bind(attempts_left)
                .execute(pool)
                .await?;
            }
            ResultUpdate::Update { best_score, total } => {
                sqlx::query(
                    r#"
                    UPDATE user_results
                    SET best_score = ?, total = ?, completed_at = CURRENT_TIMESTAMP
                    WHERE user_id = ? AND test_id = ?
                    "#,
                )
                .bind(best_score)
                .bind(total)
                .bind(user_id)
                .bind(test_id)
                .execute(pool)
                .await?;

                sqlx::query(
                    r#"
                    UPDATE user_results
                    SET attempts_left = attempts_left - 1
                    WHERE user_id = ? AND test_id = ? AND attempts_left > 0
                    "#,
                )
                .bind(user_id)
                .bind(test_id)
                .execute(pool)
                .await?;
            }
            ResultUpdate::Discard => {}
        }
        Ok(())
    }
}

/// One row per question answered per attempt, append-only.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct UserAnswer {
    pub id: i64,
    pub user_id: i64,
    pub test_id: i64,
    pub question_id: i64,
    pub answer_id: Option<i64>,
    pub text_answer: Option<String>,
    pub attempt_number: i64,
    pub answer_time: String,
}

/// A user who has answer rows for a test; the teacher's result browser
/// lists these.
#[derive(Debug, Clone, FromRow)]
pub struct TestTaker {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: String,
}

/// One line of the per-attempt detail view.
#[derive(Debug, Clone, FromRow)]
pub struct AttemptDetail {
    pub question_text: String,
    pub option_text: Option<String>,
    pub text_answer: Option<String>,
    pub correct: bool,
}

impl UserAnswer {
    pub async fn record(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        test_id: i64,
        question_id: i64,
        answer_id: Option<i64>,
        text_answer: Option<&str>,
        attempt_number: i64,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO user_answers (user_id, test_id, question_id, answer_id, text_answer, attempt_number)
            VALUES (?, ?, ?, ?, ?, ?)
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .bind(question_id)
        .bind(answer_id)
        .bind(text_answer)
        .bind(attempt_number)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn users_for_test(
        pool: &sqlx::SqlitePool,
        test_id: i64,
    ) -> Result<Vec<TestTaker>, sqlx::Error> {
        sqlx::query_as::<_, TestTaker>(
            r#"
            SELECT DISTINCT ua.user_id, s.first_name, s.last_name
            FROM user_answers ua
            JOIN students s ON ua.user_id = s.telegram_id
            WHERE ua.test_id = ?
            "#,
        )
        .bind(test_id)
        .fetch_all(pool)
        .await
    }

    pub async fn attempt_numbers(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        test_id: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT attempt_number
            FROM user_answers
            WHERE user_id = ? AND test_id = ?
            ORDER BY attempt_number
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .fetch_all(pool)
        .await
    }

    /// The attempt, question by question, with correctness recomputed the
    /// same way the runtime scored it.
    pub async fn attempt_details(
        pool: &sqlx::SqlitePool,
        user_id: i64,
        test_id: i64,
        attempt_number: i64,
    ) -> Result<Vec<AttemptDetail>, sqlx::Error> {
        sqlx::query_as::<_, AttemptDetail>(
            r#"
            SELECT q.text AS question_text,
                   o.text AS option_text,
                   ua.text_answer,
                   CASE WHEN o.is_correct = 1 OR LOWER(TRIM(ua.text_answer)) = q.correct_text
                        THEN 1 ELSE 0 END AS correct
            FROM user_answers ua
            JOIN questions q ON ua.question_id = q.id
            LEFT JOIN options o ON ua.answer_id = o.id
            WHERE ua.user_id = ? AND ua.test_id = ? AND ua.attempt_number = ?
            ORDER BY ua.answer_time, ua.id
            "#,
        )
        .bind(user_id)
        .bind(test_id)
        .bind(attempt_number)
        .fetch_all(pool)
        .await
    }
}
