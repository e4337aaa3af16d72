use std::sync::Arc;

use teloxide::prelude::*;
use tracing::warn;

use crate::bot::handlers::{quiz_runtime, results, tasks, BotDialogue, HandlerResult};
use crate::bot::state::State;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::{Answer, Student, Task};
use crate::services::distribution::DistributionService;
use crate::utils::keyboards;

fn parse_id(data: &str, prefix: &str) -> Option<i64> {
    data.strip_prefix(prefix)?.parse().ok()
}

fn parse_ids<const N: usize>(data: &str, prefix: &str) -> Option<[i64; N]> {
    let mut ids = [0i64; N];
    let mut parts = data.strip_prefix(prefix)?.splitn(N, '_');
    for slot in &mut ids {
        *slot = parts.next()?.parse().ok()?;
    }
    Some(ids)
}

/// Single dispatcher for every inline button in the bot, keyed by the
/// token prefix. Teacher-only tokens are ignored for everyone else.
pub async fn callback_handler(
    bot: Bot,
    dialogue: BotDialogue,
    q: CallbackQuery,
    db: DatabaseManager,
    config: Arc<Config>,
    distribution: DistributionService,
) -> HandlerResult {
    let Some(data) = q.data.clone() else {
        return Ok(());
    };
    bot.answer_callback_query(q.id.clone()).await?;

    let Some(message) = q.message.as_ref() else {
        return Ok(());
    };
    let chat_id = message.chat.id;
    let user_id = q.from.id.0 as i64;
    let is_admin = config.is_admin(user_id);

    if let Some(test_id) = parse_id(&data, "take_test_") {
        return quiz_runtime::start_test(&bot, &dialogue, chat_id, &q.from, &db, test_id).await;
    }

    if let Some(option_id) = parse_id(&data, "opt_") {
        match dialogue.get().await? {
            Some(State::TakingQuiz { session }) => {
                return quiz_runtime::receive_option_answer(
                    &bot, &dialogue, chat_id, &db, option_id, session,
                )
                .await;
            }
            _ => {
                bot.send_message(chat_id, "This question is no longer active.")
                    .await?;
                return Ok(());
            }
        }
    }

    if let Some(task_id) = parse_id(&data, "answer_task_") {
        return begin_answer_collection(&bot, &dialogue, chat_id, &db, user_id, task_id).await;
    }

    if !is_admin {
        warn!("Ignoring callback '{}' from non-admin user {}", data, user_id);
        return Ok(());
    }

    if let Some(task_id) = parse_id(&data, "send_task_") {
        let classes = Task::pending_classes(&db.pool, task_id).await?;
        if classes.is_empty() {
            bot.send_message(chat_id, "This task was already sent to every class.")
                .await?;
        } else {
            bot.send_message(chat_id, "Which class should receive it?")
                .reply_markup(keyboards::class_selection(&classes, "send_class_"))
                .await?;
            dialogue.update(State::SendTaskClass { task_id }).await?;
        }
        return Ok(());
    }

    if let Some(class_number) = parse_id(&data, "send_class_") {
        let Some(State::SendTaskClass { task_id }) = dialogue.get().await? else {
            bot.send_message(chat_id, "Pick a task first.").await?;
            return Ok(());
        };
        bot.send_message(chat_id, "Send it now or schedule it?")
            .reply_markup(keyboards::send_method())
            .await?;
        dialogue
            .update(State::SendTaskMethod {
                task_id,
                class_number,
            })
            .await?;
        return Ok(());
    }

    if data == "send_now" || data == "send_later" {
        let Some(State::SendTaskMethod {
            task_id,
            class_number,
        }) = dialogue.get().await?
        else {
            bot.send_message(chat_id, "Pick a task and a class first.").await?;
            return Ok(());
        };

        if data == "send_now" {
            let report = distribution.deliver_now(task_id, class_number).await?;
            bot.send_message(
                chat_id,
                format!(
                    "Sent to class {}: {} delivered, {} failed.",
                    class_number, report.delivered, report.failed
                ),
            )
            .reply_markup(keyboards::main_menu(true))
            .await?;
            dialogue.exit().await?;
        } else {
            bot.send_message(
                chat_id,
                "When should it go out? Send the time as DD.MM.YYYY HH:MM (UTC):",
            )
            .await?;
            dialogue
                .update(State::SendTaskSchedule {
                    task_id,
                    class_number,
                })
                .await?;
        }
        return Ok(());
    }

    if let Some([test_id, user, attempt_number]) = parse_ids::<3>(&data, "attempt_") {
        return results::show_attempt(&bot, chat_id, &db, test_id, user, attempt_number).await;
    }

    if let Some([test_id, user]) = parse_ids::<2>(&data, "user_results_") {
        return results::show_user_attempts(&bot, chat_id, &db, test_id, user).await;
    }

    if let Some(test_id) = parse_id(&data, "results_") {
        return results::show_test_takers(&bot, chat_id, &db, test_id).await;
    }

    if let Some(task_id) = parse_id(&data, "show_answers_") {
        return tasks::export_answers(&bot, chat_id, &db, &config, task_id).await;
    }

    if let Some(class_number) = parse_id(&data, "list_class_") {
        let students = Student::find_by_class(&db.pool, class_number).await?;
        if students.is_empty() {
            bot.send_message(chat_id, format!("Class {class_number} has no students."))
                .await?;
        } else {
            let mut lines = vec![format!("Class {class_number}:")];
            lines.extend(
                students
                    .iter()
                    .map(|s| format!("• {} {}", s.last_name, s.first_name)),
            );
            bot.send_message(chat_id, lines.join("\n")).await?;
        }
        return Ok(());
    }

    warn!("Unrecognized callback token '{}' from user {}", data, user_id);
    Ok(())
}

/// Entry point for a homework submission; duplicates are rejected here so
/// the collection dialogue only ever starts once per (student, task).
async fn begin_answer_collection(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    db: &DatabaseManager,
    user_id: i64,
    task_id: i64,
) -> HandlerResult {
    let Some(student) = Student::find_by_telegram_id(&db.pool, user_id).await? else {
        bot.send_message(chat_id, "Please register first with /start.").await?;
        return Ok(());
    };

    if Task::find_by_id(&db.pool, task_id).await?.is_none() {
        bot.send_message(chat_id, "This task no longer exists.").await?;
        return Ok(());
    }

    if Answer::exists_for_student(&db.pool, student.id, task_id).await? {
        bot.send_message(chat_id, "You already submitted an answer for this task.")
            .await?;
        return Ok(());
    }

    bot.send_message(
        chat_id,
        "Send your answer: text, files and photos in any order, then send 'done'.",
    )
    .await?;
    dialogue
        .update(State::AnswerTaskCollect {
            task_id,
            text: None,
            files: Vec::new(),
        })
        .await?;
    Ok(())
}
