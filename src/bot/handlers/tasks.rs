use std::path::PathBuf;
use std::sync::Arc;

use chrono::Utc;
use teloxide::prelude::*;
use tracing::{info, warn};

use crate::bot::handlers::{BotDialogue, HandlerResult};
use crate::bot::state::State;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::{Answer, Student, Task};
use crate::error::BotError;
use crate::services::distribution::DistributionService;
use crate::utils::{files, keyboards, validation};

const SKIP_KEYWORD: &str = "skip";
const DONE_KEYWORD: &str = "done";

pub async fn receive_task_title(bot: Bot, dialogue: BotDialogue, msg: Message) -> HandlerResult {
    let Some(title) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter the task title as text.")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Enter the task description:")
        .await?;
    dialogue
        .update(State::NewTaskDescription {
            title: title.to_string(),
        })
        .await?;
    Ok(())
}

pub async fn receive_task_description(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    title: String,
) -> HandlerResult {
    let Some(description) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter the task description as text.")
            .await?;
        return Ok(());
    };

    bot.send_message(
        msg.chat.id,
        format!("Attach a file for the task, or send '{SKIP_KEYWORD}':"),
    )
    .await?;
    dialogue
        .update(State::NewTaskFile {
            title,
            description: description.to_string(),
        })
        .await?;
    Ok(())
}

/// Final step of task authoring: an optional attachment, then the insert.
pub async fn receive_task_file(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (title, description): (String, String),
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let file_path = if let Some(document) = msg.document() {
        let name = document
            .file_name
            .clone()
            .unwrap_or_else(|| "attachment".to_string());
        Some(files::download_document(&bot, &document.file.id, &name, &config.homework_dir, "").await?)
    } else if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        Some(files::download_photo(&bot, &photo.file.id, &config.homework_dir, "").await?)
    } else if msg
        .text()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case(SKIP_KEYWORD))
    {
        None
    } else {
        bot.send_message(
            msg.chat.id,
            format!("Attach a file or a photo, or send '{SKIP_KEYWORD}'."),
        )
        .await?;
        return Ok(());
    };

    let task_id = Task::create(&db.pool, &title, &description, file_path.as_deref()).await?;
    info!("Created task {} '{}'", task_id, title);

    bot.send_message(msg.chat.id, format!("Task '{title}' created."))
        .reply_markup(keyboards::main_menu(true))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

pub async fn receive_schedule_time(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (task_id, class_number): (i64, i64),
    distribution: DistributionService,
) -> HandlerResult {
    let at = match validation::parse_schedule_time(msg.text().unwrap_or_default(), Utc::now()) {
        Ok(at) => at,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    distribution
        .schedule_delivery(task_id, class_number, at)
        .await?;

    bot.send_message(
        msg.chat.id,
        format!(
            "Scheduled: class {} will receive the task on {} UTC.",
            class_number,
            at.format("%d.%m.%Y %H:%M")
        ),
    )
    .reply_markup(keyboards::main_menu(true))
    .await?;
    dialogue.exit().await?;
    Ok(())
}

/// Collects one homework submission: any mix of text and files, closed by
/// the done keyword. Text parts replace each other; files accumulate.
pub async fn receive_answer_part(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (task_id, text, mut file_paths): (i64, Option<String>, Vec<String>),
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    if let Some(document) = msg.document() {
        let name = document
            .file_name
            .clone()
            .unwrap_or_else(|| "attachment".to_string());
        let suffix = format!("_t{task_id}");
        let path =
            files::download_document(&bot, &document.file.id, &name, &config.homework_dir, &suffix)
                .await?;
        file_paths.push(path);

        bot.send_message(
            msg.chat.id,
            format!("File received. Send more, or '{DONE_KEYWORD}' to submit."),
        )
        .await?;
        dialogue
            .update(State::AnswerTaskCollect {
                task_id,
                text,
                files: file_paths,
            })
            .await?;
        return Ok(());
    }

    if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        let suffix = format!("_t{task_id}");
        let path =
            files::download_photo(&bot, &photo.file.id, &config.homework_dir, &suffix).await?;
        file_paths.push(path);

        bot.send_message(
            msg.chat.id,
            format!("Photo received. Send more, or '{DONE_KEYWORD}' to submit."),
        )
        .await?;
        dialogue
            .update(State::AnswerTaskCollect {
                task_id,
                text,
                files: file_paths,
            })
            .await?;
        return Ok(());
    }

    let Some(message_text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(
            msg.chat.id,
            format!("Send text, a file or a photo, or '{DONE_KEYWORD}' to submit."),
        )
        .await?;
        return Ok(());
    };

    if !message_text.eq_ignore_ascii_case(DONE_KEYWORD) {
        bot.send_message(
            msg.chat.id,
            format!("Text received. Send more, or '{DONE_KEYWORD}' to submit."),
        )
        .await?;
        dialogue
            .update(State::AnswerTaskCollect {
                task_id,
                text: Some(message_text.to_string()),
                files: file_paths,
            })
            .await?;
        return Ok(());
    }

    if text.is_none() && file_paths.is_empty() {
        bot.send_message(msg.chat.id, "Send some text or a file before submitting.")
            .await?;
        return Ok(());
    }

    let student = Student::find_by_telegram_id(&db.pool, user.id.0 as i64)
        .await?
        .ok_or("submitting student is not registered")?;

    if file_paths.is_empty() {
        Answer::create(&db.pool, student.id, task_id, text.as_deref(), None).await?;
    } else {
        // The text rides along with the first file row.
        for (index, path) in file_paths.iter().enumerate() {
            let row_text = if index == 0 { text.as_deref() } else { None };
            Answer::create(&db.pool, student.id, task_id, row_text, Some(path)).await?;
        }
    }
    info!(
        "Student {} submitted an answer for task {}",
        student.id, task_id
    );

    bot.send_message(msg.chat.id, "Answer submitted. Well done!")
        .reply_markup(keyboards::main_menu(false))
        .await?;
    dialogue.exit().await?;
    Ok(())
}

/// Collects every submission for a task into one directory per student
/// under the homework dir, so the teacher gets a browsable folder tree.
pub async fn export_answers(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
    config: &Config,
    task_id: i64,
) -> HandlerResult {
    let answers = Answer::find_by_task(&db.pool, task_id).await?;
    if answers.is_empty() {
        bot.send_message(chat_id, "No answers for this task yet.").await?;
        return Ok(());
    }

    let task = Task::find_by_id(&db.pool, task_id)
        .await?
        .ok_or(BotError::NotFound("task"))?;
    let output_dir = config.homework_dir.join(&task.title);

    for answer in &answers {
        let student_dir = output_dir.join(format!("{}_{}", answer.first_name, answer.last_name));
        tokio::fs::create_dir_all(&student_dir).await?;

        if let Some(text) = &answer.answer_text {
            tokio::fs::write(student_dir.join("answer.txt"), text).await?;
        }

        if let Some(source) = &answer.answer_file_path {
            let source = PathBuf::from(source);
            if let Some(file_name) = source.file_name() {
                match tokio::fs::copy(&source, student_dir.join(file_name)).await {
                    Ok(_) => {}
                    Err(e) => warn!("Could not copy {} into the export: {}", source.display(), e),
                }
            }
        }
    }

    bot.send_message(
        chat_id,
        format!(
            "{} answer(s) saved under {}.",
            answers.len(),
            output_dir.display()
        ),
    )
    .await?;
    Ok(())
}
