use std::sync::Arc;

use teloxide::prelude::*;
use teloxide::utils::command::BotCommands;

use crate::bot::handlers::{BotDialogue, HandlerResult};
use crate::bot::state::State;
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::Student;
use crate::utils::keyboards;

#[derive(BotCommands, Clone)]
#[command(rename_rule = "lowercase", description = "Classwork bot commands:")]
pub enum Command {
    #[command(description = "Start the bot and register")]
    Start,
    #[command(description = "Display this help message")]
    Help,
    #[command(description = "Cancel the current action")]
    Cancel,
}

pub async fn command_handler(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    cmd: Command,
    db: DatabaseManager,
    config: Arc<Config>,
) -> HandlerResult {
    match cmd {
        Command::Start => {
            let Some(user) = msg.from() else {
                return Ok(());
            };
            let user_id = user.id.0 as i64;

            match Student::find_by_telegram_id(&db.pool, user_id).await? {
                Some(_) => {
                    bot.send_message(msg.chat.id, "Welcome back! Choose an action:")
                        .reply_markup(keyboards::main_menu(config.is_admin(user_id)))
                        .await?;
                }
                None => {
                    bot.send_message(
                        msg.chat.id,
                        "Welcome! Let's get you registered.\nEnter your first name:",
                    )
                    .await?;
                    dialogue.update(State::RegisterFirstName).await?;
                }
            }
        }
        Command::Help => {
            bot.send_message(msg.chat.id, Command::descriptions().to_string())
                .await?;
        }
        Command::Cancel => {
            let user_id = msg.from().map(|u| u.id.0 as i64).unwrap_or_default();
            let had_state = !matches!(dialogue.get().await?, None | Some(State::Idle));
            dialogue.exit().await?;

            let text = if had_state {
                "Action cancelled."
            } else {
                "Nothing to cancel."
            };
            bot.send_message(msg.chat.id, text)
                .reply_markup(keyboards::main_menu(config.is_admin(user_id)))
                .await?;
        }
    }
    Ok(())
}
