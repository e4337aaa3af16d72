use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Student {
    pub id: i64,
    pub first_name: String,
    pub last_name: String,
    pub class_number: i64,
    pub telegram_id: i64,
}

impl Student {
    pub async fn create(
        pool: &sqlx::SqlitePool,
        first_name: &str,
        last_name: &str,
        class_number: i64,
        telegram_id: i64,
    ) -> Result<Self, sqlx::Error> {
        sqlx::query(
            r#"
            INSERT INTO students (first_name, last_name, class_number, telegram_id)
            VALUES (?, ?, ?, ?)
            "#,
        )
        .bind(first_name)
        .bind(last_name)
        .bind(class_number)
        .bind(telegram_id)
        .execute(pool)
        .await?;

        Self::find_by_telegram_id(pool, telegram_id)
            .await?
            .ok_or(sqlx::Error::RowNotFound)
    }

    pub async fn find_by_telegram_id(
        pool: &sqlx::SqlitePool,
        telegram_id: i64,
    ) -> Result<Option<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            "SELECT id, first_name, last_name, class_number, telegram_id FROM students WHERE telegram_id = ?"
        )
        .bind(telegram_id)
        .fetch_optional(pool)
        .await
    }

    /// Telegram chat ids of every student in a class; the delivery targets
    /// for task distribution.
    pub async fn telegram_ids_by_class(
        pool: &sqlx::SqlitePool,
        class_number: i64,
    ) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>("SELECT telegram_id FROM students WHERE class_number = ?")
            .bind(class_number)
            .fetch_all(pool)
            .await
    }

    pub async fn find_by_class(
        pool: &sqlx::SqlitePool,
        class_number: i64,
    ) -> Result<Vec<Self>, sqlx::Error> {
        sqlx::query_as::<_, Student>(
            "SELECT id, first_name, last_name, class_number, telegram_id FROM students WHERE class_number = ? ORDER BY last_name, first_name"
        )
        .bind(class_number)
        .fetch_all(pool)
        .await
    }

    /// Distinct class numbers with at least one registered student.
    pub async fn unique_classes(pool: &sqlx::SqlitePool) -> Result<Vec<i64>, sqlx::Error> {
        sqlx::query_scalar::<_, i64>(
            "SELECT DISTINCT class_number FROM students ORDER BY class_number",
        )
        .fetch_all(pool)
        .await
    }
}
