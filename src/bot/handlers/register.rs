use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::bot::handlers::{BotDialogue, HandlerResult};
use crate::bot::state::State;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::Student;
use crate::utils::{keyboards, validation};

pub async fn receive_first_name(bot: Bot, dialogue: BotDialogue, msg: Message) -> HandlerResult {
    let Some(first_name) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter your first name as text.")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Now enter your last name:")
        .await?;
    dialogue
        .update(State::RegisterLastName {
            first_name: first_name.to_string(),
        })
        .await?;
    Ok(())
}

pub async fn receive_last_name(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    first_name: String,
) -> HandlerResult {
    let Some(last_name) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter your last name as text.")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "Which class are you in? Enter the number:")
        .await?;
    dialogue
        .update(State::RegisterClassNumber {
            first_name,
            last_name: last_name.to_string(),
        })
        .await?;
    Ok(())
}

pub async fn receive_class_number(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (first_name, last_name): (String, String),
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    let Some(user) = msg.from() else {
        return Ok(());
    };

    let class_number = match validation::parse_class_number(msg.text().unwrap_or_default()) {
        Ok(class_number) => class_number,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    let telegram_id = user.id.0 as i64;
    let student =
        Student::create(&db.pool, &first_name, &last_name, class_number, telegram_id).await?;
    info!(
        "Registered student {} {} (class {}, telegram id {})",
        student.first_name, student.last_name, student.class_number, telegram_id
    );

    bot.send_message(
        msg.chat.id,
        format!(
            "You're all set, {} {}! Class {}.",
            student.first_name, student.last_name, student.class_number
        ),
    )
    .reply_markup(keyboards::main_menu(config.is_admin(telegram_id)))
    .await?;
    dialogue.exit().await?;
    Ok(())
}
