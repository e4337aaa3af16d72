//! Delivery semantics that hold without any Telegram round trip: a class
//! with no students records its assignment and sends nothing.

use anyhow::Result;
use classwork_bot::database::{connection::DatabaseManager, models::*};
use classwork_bot::services::distribution::deliver_to_class;
use classwork_bot::error::BotError;
use teloxide::Bot;
use tempfile::{tempdir, TempDir};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn offline_bot() -> Bot {
    // Never used for a network call in these tests.
    Bot::new("0000000000:TEST_TOKEN_NOT_A_REAL_ONE")
}

#[tokio::test]
async fn test_empty_class_records_assignment_without_sending() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let bot = offline_bot();

    let task_id = Task::create(&db.pool, "Essay", "Write about rivers", None).await?;

    let report = deliver_to_class(&bot, &db, task_id, 7).await?;
    assert_eq!(report.delivered, 0);
    assert_eq!(report.failed, 0);

    assert!(TaskAssignment::exists(&db.pool, task_id, 7).await?);
    let pending = Task::pending_classes(&db.pool, task_id).await?;
    assert!(!pending.contains(&7));

    Ok(())
}

#[tokio::test]
async fn test_missing_task_aborts_before_any_assignment() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let bot = offline_bot();

    let result = deliver_to_class(&bot, &db, 424242, 7).await;
    assert!(matches!(result, Err(BotError::NotFound(_))));
    assert!(!TaskAssignment::exists(&db.pool, 424242, 7).await?);

    Ok(())
}

#[tokio::test]
async fn test_repeat_delivery_to_the_same_class_is_rejected_by_the_store() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let bot = offline_bot();

    let task_id = Task::create(&db.pool, "Essay", "Write about rivers", None).await?;
    deliver_to_class(&bot, &db, task_id, 7).await?;

    // the (task, class) primary key blocks a second assignment row
    let result = deliver_to_class(&bot, &db, task_id, 7).await;
    assert!(result.is_err());

    Ok(())
}
