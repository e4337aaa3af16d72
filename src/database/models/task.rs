use chrono::Utc;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub file_path: Option<String>,
}

/// A lightweight (id, title) pair used by selection keyboards.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskSummary {
    pub id: i64,
    pub title: String,
}

impl Task {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        title: &str,
        description: &str,
        file_path: Option<&str>,
    ) -> Result<i64, sqlx::Error> {
        let result = sqlx::query("INSERT INTO tasks (title, description, file_path) VALUES (?, ?, ?)")
            .bind(title)
            .bind(description)
            .bind(file_path)
            .execute(pool)
            .await?;
        Ok(result.last_insert_rowid())
    }

    pub async fn find_by_id(
        pool: &sqlx::SqlitePool,
        task_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Task>(
            "SELECT id, title, description, file_path FROM tasks WHERE id = ?",
        )
        .bind(task_id)
        .fetch_optional(pool)
        .await
    }

    pub async fn all(pool: &sqlx::SqlitePool) -> Result<Vec<TaskSummary>, sqlx::Error> {
        sqlx::query_as::<_, TaskSummary>("SELECT id, title FROM tasks ORDER BY id DESC")
            .fetch_all(pool)
            .await
    }

    /// Tasks that have at least one registered class they were not yet
    /// assigned to.
    pub async fn not_sent_to_all_classes(
        pool: &sqlx::SqlitePool,
    ) -> Result<Vec<TaskSummary>, sqlx::Error> {
        sqlx::query_as::<_, TaskSummary>(
            r#"
            SELECT t.id, t.title
            FROM tasks t
            WHERE (
                SELECT COUNT(DISTINCT class_number) FROM students
            ) > (
                SELECT COUNT(class_number) FROM task_assignments ta WHERE ta.task_id = t.id
            )
            ORDER BY t.id DESC
            "#,
        )
        .fetch_all(pool)
        .await
    }

    /// Class numbers this task has not been assigned to yet.
    pub async fn pending_classes(
        pool: &sqlx::SqlitePool,
        task_id: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            r#"
            SELECT DISTINCT s.class_number
            FROM students s
            WHERE s.class_number NOT IN (
                SELECT ta.class_number FROM task_assignments ta WHERE ta.task_id = ?
            )
            ORDER BY s.class_number
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    /// Tasks assigned to the class the given student belongs to.
    pub async fn assigned_to_student(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
    ) -> Result<Vec<TaskSummary>, sqlx::Error> {
        sqlx::query_as::<_, TaskSummary>(
            r#"
            SELECT t.id, t.title
            FROM tasks t
            JOIN task_assignments ta ON t.id = ta.task_id
            JOIN students s ON ta.class_number = s.class_number
            WHERE s.telegram_id = ?
            ORDER BY t.id DESC
            "#,
        )
        .bind(telegram_id)
        .fetch_all(pool)
        .await
    }
}

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct TaskAssignment {
    pub task_id: i64,
    pub class_number: i64,
    pub send_date: String,
}

impl TaskAssignment {
    /// Records that delivery of a task to a class was attempted. Recorded
    /// unconditionally after the send loop: "assigned" means "delivery was
    /// attempted", not "every send succeeded".
    pub async fn record(
        pool: &sqlx::SqlitePool,
        task_id: i64,
        class_number: i64,
    ) -> Result<(), sqlx::Error> {
        let now = Utc::now().to_rfc3339();
        sqlx::query(
            "INSERT INTO task_assignments (task_id, class_number, send_date) VALUES (?, ?, ?)",
        )
        .bind(task_id)
        .bind(class_number)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn exists(
        pool: &sqlx::SqlitePool,
        task_id: i64,
        class_number: i64,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM task_assignments WHERE task_id = ? AND class_number = ?",
        )
        .bind(task_id)
        .bind(class_number)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}

/// A student's homework submission for a task.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Answer {
    pub id: i64,
    pub student_id: i64,
    pub task_id: i64,
    pub answer_text: Option<String>,
    pub answer_file_path: Option<String>,
    pub sent_date: String,
}

/// An answer joined with the submitting student's name, for the teacher's
/// answer export.
#[derive(Debug, Clone, FromRow)]
pub struct AnswerWithStudent {
    pub answer_text: Option<String>,
    pub answer_file_path: Option<String>,
    pub first_name: String,
    pub last_name: String,
}

impl Answer {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        student_id: i64,
        task_id: i64,
        answer_text: Option<&str>,
        answer_file_path: Option<&str>,
    ) -> Result<(), sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO answers (student_id, task_id, answer_text, answer_file_path)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(student_id)
        .bind(task_id)
        .bind(answer_text)
        .bind(answer_file_path)
        .execute(pool)
        .await?;
        Ok(())
    }

    pub async fn find_by_task(
        pool: &sqlx::SqlitePool,
        task_id: i64,
    ) -> Result<Vec<AnswerWithStudent>, sqlx::Error> {
        sqlx::query_as::<_, AnswerWithStudent>(
            r#"
            SELECT a.answer_text, a.answer_file_path, s.first_name, s.last_name
            FROM answers a
            JOIN students s ON a.student_id = s.id
            WHERE a.task_id = ?
            "#,
        )
        .bind(task_id)
        .fetch_all(pool)
        .await
    }

    pub async fn exists_for_student(
        pool: &sqlx::SqlitePool,
        student_id: i64,
        task_id: i64,
    ) -> Result<bool, sqlx::Error> {
        let count = sqlx::query_scalar::<_, i64>(
            "SELECT COUNT(*) FROM answers WHERE student_id = ? AND task_id = ?",
        )
        .bind(student_id)
        .bind(task_id)
        .fetch_one(pool)
        .await?;
        Ok(count > 0)
    }
}
