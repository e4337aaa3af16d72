use anyhow::{anyhow, Result};
use chrono::{DateTime, Utc};
use teloxide::prelude::*;
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::database::connection::DatabaseManager;
use crate::database::models::{Student, Task, TaskAssignment};
use crate::error::{BotError, BotResult};
use crate::utils::files::send_file_message;

/// What happened to one class-wide delivery batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeliveryReport {
    pub delivered: usize,
    pub failed: usize,
}

/// Sends a task to every student of a class and records the assignment.
///
/// Individual delivery failures are logged and skipped; the batch always
/// runs to the end. The assignment row is recorded unconditionally
/// afterwards: "assigned" means delivery was attempted for the class,
/// not that every send succeeded. A class with no students records the
/// assignment without sending anything.
pub async fn deliver_to_class(
    bot: &Bot,
    db: &DatabaseManager,
    task_id: i64,
    class_number: i64,
) -> BotResult<DeliveryReport> {
    let task = Task::find_by_id(&db.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;

    let students = Student::telegram_ids_by_class(&db.pool, class_number).await?;
    let message = format!("New task: {}\n{}", task.title, task.description);

    let mut report = DeliveryReport {
        delivered: 0,
        failed: 0,
    };

    for telegram_id in students {
        let chat_id = ChatId(telegram_id);
        let sent = match &task.file_path {
            Some(file_path) => send_file_message(bot, chat_id, file_path, Some(&message)).await,
            None => bot
                .send_message(chat_id, &message)
                .await
                .map(|_| ())
                .map_err(|source| BotError::Delivery {
                    chat_id: telegram_id,
                    source,
                }),
        };

        match sent {
            Ok(()) => report.delivered += 1,
            Err(e) => {
                report.failed += 1;
                error!("Failed to deliver task {} to student {}: {}", task_id, telegram_id, e);
            }
        }
    }

    TaskAssignment::record(&db.pool, task_id, class_number).await?;
    info!(
        "Task {} assigned to class {} ({} delivered, {} failed)",
        task_id, class_number, report.delivered, report.failed
    );

    Ok(report)
}

/// Owns the one-shot job scheduler used for deferred task delivery.
///
/// Scheduled jobs carry only the task id and class number; the job
/// re-resolves the task and the student list from the store when it
/// fires, so it survives running in a freshly started process.
#[derive(Clone)]
pub struct DistributionService {
    bot: Bot,
    db: DatabaseManager,
    scheduler: JobScheduler,
}

impl DistributionService {
    pub async fn new(bot: Bot, db: DatabaseManager) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create job scheduler: {e}"))?;

        Ok(Self { bot, db, scheduler })
    }

    pub async fn start(&self) -> Result<()> {
        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start job scheduler: {e}"))?;
        info!("Distribution scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop job scheduler: {e}"))?;
        Ok(())
    }

    /// Immediate delivery path.
    pub async fn deliver_now(&self, task_id: i64, class_number: i64) -> BotResult<DeliveryReport> {
        deliver_to_class(&self.bot, &self.db, task_id, class_number).await
    }

    /// Enqueues a one-shot delivery at an absolute time. At-least-once:
    /// the scheduler may duplicate or lose the job across process
    /// restarts, which is accepted here.
    pub async fn schedule_delivery(
        &self,
        task_id: i64,
        class_number: i64,
        at: DateTime<Utc>,
    ) -> Result<()> {
        let delay = (at - Utc::now())
            .to_std()
            .map_err(|_| anyhow!("The scheduled time must be in the future"))?;
        let instant = std::time::Instant::now() + delay;

        let bot = self.bot.clone();
        let db = self.db.clone();

        let job = Job::new_one_shot_at_instant_async(instant, move |_uuid, _lock| {
            let bot = bot.clone();
            let db = db.clone();
            Box::pin(async move {
                info!(
                    "Running scheduled delivery of task {} to class {}",
                    task_id, class_number
                );
                if let Err(e) = deliver_to_class(&bot, &db, task_id, class_number).await {
                    error!(
                        "Scheduled delivery of task {} to class {} failed: {}",
                        task_id, class_number, e
                    );
                }
            })
        })
        .map_err(|e| anyhow!("Failed to create delivery job: {e}"))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to schedule delivery job: {e}"))?;

        info!(
            "Task {} scheduled for class {} at {}",
            task_id,
            class_number,
            at.to_rfc3339()
        );
        Ok(())
    }
}
