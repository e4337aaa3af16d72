use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Test {
    pub id: i64,
    pub title: String,
    pub max_attempts: i64,
}

impl Test {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        title: &str,
        max_attempts: i64,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO tests (title, max_attempts) VALUES (?, ?)")
            .bind(title)
            .bind(max_attempts)
            .execute(pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        test_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Test>("SELECT id, title, max_attempts FROM tests WHERE id = ?")
            .bind(test_id)
            .fetch_optional(pool)
            .await
    }

    pub async fn all(pool: &sqlx::SqlitePool) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Test>("SELECT id, title, max_attempts FROM tests ORDER BY id")
            .fetch_all(pool)
            .await
    }
}

/// Discriminant for the two question shapes. Stored as TEXT and matched
/// exhaustively everywhere a question is rendered or scored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum QuestionKind {
    Choice,
    FreeText,
}

impl QuestionKind {
    pub fn as_str(self) -> &'static str {
        match self {
            QuestionKind::Choice => "choice",
            QuestionKind::FreeText => "text",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "choice" => Some(QuestionKind::Choice),
            "text" => Some(QuestionKind::FreeText),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub test_id: i64,
    pub text: String,
    pub file_path: Option<String>,
    pub kind: String,
    pub correct_text: Option<String>,
}

impl Question {
    /// Unknown kind values in the store are treated as choice questions,
    /// matching the schema default.
    pub fn question_kind(&self) -> QuestionKind {
        QuestionKind::parse(&self.kind).unwrap_or(QuestionKind::Choice)
    }

    pub async fn create(
        pool: &sqlx::SqlitePool,
        test_id: i64,
        text: &str,
        file_path: Option<&str>,
        kind: QuestionKind,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query(
            "INSERT INTO questions (test_id, text, file_path, kind) VALUES (?, ?, ?, ?)",
        )
        .bind(test_id)
        .bind(text)
        .bind(file_path)
        .bind(kind.as_str())
        .execute(pool)
        .await?;
        Ok(result.last_insert_rowid())
    }

    /// Stores the reference answer for a free-text question, normalized to
    /// lowercase and trimmed so runtime matching is a plain equality check.
    pub async fn set_correct_text(
        pool: &sqlx::SqlitePool,
        question_id: i64,
        correct_text: &str,
    ) -> Result<(), sqlx::Error> {
        sqlx::query("UPDATE questions SET correct_text = ? WHERE id = ?")
            .bind(correct_text.trim().to_lowercase())
            .bind(question_id)
            .execute(pool)
            .await?;
        Ok(())
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        question_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            "SELECT id, test_id, text, file_path, kind, correct_text FROM questions WHERE id = ?",
        )
        .bind(question_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn find_by_test(
        pool: &sqlx::SqlitePool,
        test_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Question>(
            "SELECT id, test_id, text, file_path, kind, correct_text FROM questions WHERE test_id = ? ORDER BY id"
        )
        .bind(test_id)
        .fetch_all(pool)
        .await
    }

    pub async fn correct_text(
        pool: &sqlx::SqlitePool,
        question_id: i64,
    ) -> Result<Option<String>, sqlx::Error> {
        sqlx::query_scalar::<_, Option<String>>(
            "SELECT correct_text FROM questions WHERE id = ?",
        )
        .bind(question_id)
        .fetch_optional(pool)
        .await
        .map(Option::flatten)
    }
}

/// What a choice option shows the student: a text label or an image sent
/// ahead of the keyboard.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionContent {
    Text(String),
    Image(String),
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct QuestionOption {
    pub id: i64,
    pub question_id: i64,
    pub text: Option<String>,
    pub image_path: Option<String>,
    pub is_correct: bool,
}

impl QuestionOption {
    pub fn content(&self) -> OptionContent {
        match (&self.text, &self.image_path) {
            (Some(text), _) => OptionContent::Text(text.clone()),
            (None, Some(image)) => OptionContent::Image(image.clone()),
            // Authoring always fills one of the two; an empty row renders
            // as an empty label rather than failing the quiz.
            (None, None) => OptionContent::Text(String::new()),
        }
    }

    pub async fn create(
        pool: &sqlx::SqlitePool,
        question_id: i64,
        text: Option<&str>,
        image_path: Option<&str>,
        is_correct: bool,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO options (question_id, text, image_path, is_correct)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(question_id)
        .bind(text)
        .bind(image_path)
        .bind(is_correct)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_question(
        pool: &sqlx::SqlitePool,
        question_id: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, QuestionOption>(
            "SELECT id, question_id, text, image_path, is_correct FROM options WHERE question_id = ? ORDER BY id"
        )
        .bind(question_id)
        .fetch_all(pool)
        .await
    }

    /// Correctness flag for a selected option; a vanished option counts as
    /// incorrect rather than failing the attempt.
    pub async fn is_correct(
        pool: &sqlx::SqlitePool,
        option_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let flag = sqlx::query_scalar::<_, bool>("SELECT is_correct FROM options WHERE id = ?")
            .bind(option_id)
            .fetch_optional(pool)
            .await?;
        Ok(flag.unwrap_or(false))
    }
}
