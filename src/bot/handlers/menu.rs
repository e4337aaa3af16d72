use std::sync::Arc;

use teloxide::prelude::*;

use crate::bot::handlers::{quiz_runtime, BotDialogue, HandlerResult};
use crate::bot::state::State;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::{Student, Task, Test};
use crate::utils::keyboards;

/// Fallback for messages outside any dialogue: routes the reply-keyboard
/// buttons. Teacher-only buttons are ignored for everyone else.
pub async fn menu_handler(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        return Ok(());
    };
    let user_id = user.id.0 as i64;
    let is_admin = config.is_admin(user_id);

    let student = Student::find_by_telegram_id(&db.pool, user_id).await?;
    if student.is_none() && !is_admin {
        bot.send_message(msg.chat.id, "Please register first with /start.")
            .await?;
        return Ok(());
    }

    match msg.text() {
        Some(keyboards::BTN_MY_TASKS) => {
            let tasks = Task::assigned_to_student(&db.pool, user_id).await?;
            if tasks.is_empty() {
                bot.send_message(msg.chat.id, "You have no tasks yet.").await?;
            } else {
                bot.send_message(msg.chat.id, "Your tasks. Pick one to submit an answer:")
                    .reply_markup(keyboards::task_selection(&tasks, "answer_task_"))
                    .await?;
            }
        }
        Some(keyboards::BTN_TAKE_TEST) => {
            quiz_runtime::list_available_tests(&bot, msg.chat.id, user_id, &db).await?;
        }
        Some(keyboards::BTN_CANCEL) => {
            dialogue.exit().await?;
            bot.send_message(msg.chat.id, "Choose an action:")
                .reply_markup(keyboards::main_menu(is_admin))
                .await?;
        }
        Some(keyboards::BTN_NEW_TASK) if is_admin => {
            bot.send_message(msg.chat.id, "Enter the task title:").await?;
            dialogue.update(State::NewTaskTitle).await?;
        }
        Some(keyboards::BTN_SEND_TASK) if is_admin => {
            let tasks = Task::not_sent_to_all_classes(&db.pool).await?;
            if tasks.is_empty() {
                bot.send_message(msg.chat.id, "Every task has been sent to every class.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "Which task do you want to send?")
                    .reply_markup(keyboards::task_selection(&tasks, "send_task_"))
                    .await?;
            }
        }
        Some(keyboards::BTN_NEW_TEST) if is_admin => {
            bot.send_message(msg.chat.id, "Enter the test title:").await?;
            dialogue.update(State::NewTestTitle).await?;
        }
        Some(keyboards::BTN_TEST_RESULTS) if is_admin => {
            let tests = Test::all(&db.pool).await?;
            if tests.is_empty() {
                bot.send_message(msg.chat.id, "There are no tests yet.").await?;
            } else {
                let buttons = tests
                    .iter()
                    .map(|test| (test.title.clone(), format!("results_{}", test.id)))
                    .collect();
                bot.send_message(msg.chat.id, "Results for which test?")
                    .reply_markup(keyboards::inline_keyboard(buttons, 1))
                    .await?;
            }
        }
        Some(keyboards::BTN_STUDENT_ANSWERS) if is_admin => {
            let tasks = Task::all(&db.pool).await?;
            if tasks.is_empty() {
                bot.send_message(msg.chat.id, "There are no tasks yet.").await?;
            } else {
                bot.send_message(msg.chat.id, "Answers for which task?")
                    .reply_markup(keyboards::task_selection(&tasks, "show_answers_"))
                    .await?;
            }
        }
        Some(keyboards::BTN_STUDENT_LIST) if is_admin => {
            let classes = Student::unique_classes(&db.pool).await?;
            if classes.is_empty() {
                bot.send_message(msg.chat.id, "No students have registered yet.")
                    .await?;
            } else {
                bot.send_message(msg.chat.id, "Which class?")
                    .reply_markup(keyboards::class_selection(&classes, "list_class_"))
                    .await?;
            }
        }
        _ => {
            bot.send_message(msg.chat.id, "Choose an action:")
                .reply_markup(keyboards::main_menu(is_admin))
                .await?;
        }
    }
    Ok(())
}
