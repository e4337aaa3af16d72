use std::sync::Arc;

use teloxide::prelude::*;
use tracing::info;

use crate::bot::handlers::{BotDialogue, HandlerResult};
use crate::bot::state::{OptionDraft, State};
use crate::config::Config;
use crate::database::connection::DatabaseManager;
use crate::database::models::{Question, QuestionKind, QuestionOption, Test};
use crate::utils::validation::CHOICE_OPTION_COUNT;
use crate::utils::{files, keyboards, validation};

const SKIP_KEYWORD: &str = "skip";

pub async fn receive_title(bot: Bot, dialogue: BotDialogue, msg: Message) -> HandlerResult {
    let Some(title) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter the test title as text.")
            .await?;
        return Ok(());
    };

    bot.send_message(msg.chat.id, "How many attempts is each student allowed?")
        .await?;
    dialogue
        .update(State::NewTestMaxAttempts {
            title: title.to_string(),
        })
        .await?;
    Ok(())
}

pub async fn receive_max_attempts(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    title: String,
    db: DatabaseManager,
) -> HandlerResult {
    let max_attempts = match validation::parse_max_attempts(msg.text().unwrap_or_default()) {
        Ok(max_attempts) => max_attempts,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    let test_id = Test::create(&db.pool, &title, max_attempts).await?;
    info!("Created test {} '{}' ({} attempts)", test_id, title, max_attempts);

    bot.send_message(msg.chat.id, "Enter the first question:").await?;
    dialogue.update(State::NewTestQuestionText { test_id }).await?;
    Ok(())
}

pub async fn receive_question_text(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    test_id: i64,
) -> HandlerResult {
    let Some(question_text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter the question as text.")
            .await?;
        return Ok(());
    };

    bot.send_message(
        msg.chat.id,
        format!("Attach an image or a file for the question, or send '{SKIP_KEYWORD}':"),
    )
    .await?;
    dialogue
        .update(State::NewTestQuestionFile {
            test_id,
            question_text: question_text.to_string(),
        })
        .await?;
    Ok(())
}

pub async fn receive_question_file(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (test_id, question_text): (i64, String),
    config: Arc<Config>,
) -> HandlerResult {
    let question_file = if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        let suffix = format!("_test{test_id}");
        Some(files::download_photo(&bot, &photo.file.id, &config.question_dir, &suffix).await?)
    } else if let Some(document) = msg.document() {
        let name = document
            .file_name
            .clone()
            .unwrap_or_else(|| "attachment".to_string());
        let suffix = format!("_test{test_id}");
        Some(
            files::download_document(&bot, &document.file.id, &name, &config.question_dir, &suffix)
                .await?,
        )
    } else if msg
        .text()
        .is_some_and(|t| t.trim().eq_ignore_ascii_case(SKIP_KEYWORD))
    {
        None
    } else {
        bot.send_message(
            msg.chat.id,
            format!("Send a photo or a file, or '{SKIP_KEYWORD}' for a text-only question."),
        )
        .await?;
        return Ok(());
    };

    bot.send_message(
        msg.chat.id,
        "Is this a multiple-choice question or a free-text one? Send 'options' or 'text':",
    )
    .await?;
    dialogue
        .update(State::NewTestQuestionKind {
            test_id,
            question_text,
            question_file,
        })
        .await?;
    Ok(())
}

pub async fn receive_question_kind(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (test_id, question_text, question_file): (i64, String, Option<String>),
    db: DatabaseManager,
) -> HandlerResult {
    let kind = match msg.text().map(|t| t.trim().to_lowercase()).as_deref() {
        Some("options") => QuestionKind::Choice,
        Some("text") => QuestionKind::FreeText,
        _ => {
            bot.send_message(msg.chat.id, "Send 'options' or 'text'.").await?;
            return Ok(());
        }
    };

    let question_id = Question::create(
        &db.pool,
        test_id,
        &question_text,
        question_file.as_deref(),
        kind,
    )
    .await?;

    match kind {
        QuestionKind::Choice => {
            bot.send_message(
                msg.chat.id,
                format!("Send option 1 of {CHOICE_OPTION_COUNT} (text or a photo):"),
            )
            .await?;
            dialogue
                .update(State::NewTestOption {
                    test_id,
                    question_id,
                    options: Vec::new(),
                })
                .await?;
        }
        QuestionKind::FreeText => {
            bot.send_message(msg.chat.id, "Enter the correct answer:").await?;
            dialogue
                .update(State::NewTestCorrectText { test_id, question_id })
                .await?;
        }
    }
    Ok(())
}

/// Collects the four options of a choice question, each either a text
/// message or a photo.
pub async fn receive_option(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (test_id, question_id, mut options): (i64, i64, Vec<OptionDraft>),
    config: Arc<Config>,
) -> HandlerResult {
    let draft = if let Some(photo) = msg.photo().and_then(|sizes| sizes.last()) {
        let suffix = format!("_q{question_id}_{}", options.len() + 1);
        let path =
            files::download_photo(&bot, &photo.file.id, &config.test_media_dir, &suffix).await?;
        OptionDraft {
            text: None,
            image_path: Some(path),
        }
    } else if let Some(text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) {
        OptionDraft {
            text: Some(text.to_string()),
            image_path: None,
        }
    } else {
        bot.send_message(msg.chat.id, "Send the option as text or a photo.")
            .await?;
        return Ok(());
    };

    options.push(draft);

    if options.len() < CHOICE_OPTION_COUNT {
        bot.send_message(
            msg.chat.id,
            format!(
                "Send option {} of {CHOICE_OPTION_COUNT} (text or a photo):",
                options.len() + 1
            ),
        )
        .await?;
        dialogue
            .update(State::NewTestOption {
                test_id,
                question_id,
                options,
            })
            .await?;
    } else {
        bot.send_message(
            msg.chat.id,
            format!("Which option is correct? Enter 1-{CHOICE_OPTION_COUNT}:"),
        )
        .await?;
        dialogue
            .update(State::NewTestCorrectOption {
                test_id,
                question_id,
                options,
            })
            .await?;
    }
    Ok(())
}

/// Marks the correct option and writes the whole block, so a stored choice
/// question always has exactly one correct option.
pub async fn receive_correct_option(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (test_id, question_id, options): (i64, i64, Vec<OptionDraft>),
    db: DatabaseManager,
) -> HandlerResult {
    let correct_index = match validation::parse_correct_option_index(msg.text().unwrap_or_default())
    {
        Ok(index) => index,
        Err(e) => {
            bot.send_message(msg.chat.id, e.to_string()).await?;
            return Ok(());
        }
    };

    for (index, option) in options.iter().enumerate() {
        QuestionOption::create(
            &db.pool,
            question_id,
            option.text.as_deref(),
            option.image_path.as_deref(),
            index == correct_index,
        )
        .await?;
    }
    info!("Stored question {} with {} options", question_id, options.len());

    ask_add_more(&bot, &dialogue, msg.chat.id, test_id).await
}

pub async fn receive_correct_text(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    (test_id, question_id): (i64, i64),
    db: DatabaseManager,
) -> HandlerResult {
    let Some(correct_text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please enter the correct answer as text.")
            .await?;
        return Ok(());
    };

    Question::set_correct_text(&db.pool, question_id, correct_text).await?;
    ask_add_more(&bot, &dialogue, msg.chat.id, test_id).await
}

pub async fn receive_add_more(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    test_id: i64,
) -> HandlerResult {
    match msg.text().map(|t| t.trim().to_lowercase()).as_deref() {
        Some("yes") => {
            bot.send_message(msg.chat.id, "Enter the next question:").await?;
            dialogue.update(State::NewTestQuestionText { test_id }).await?;
        }
        Some("no") => {
            info!("Finished authoring test {}", test_id);
            bot.send_message(msg.chat.id, "The test is saved and ready for students.")
                .reply_markup(keyboards::main_menu(true))
                .await?;
            dialogue.exit().await?;
        }
        _ => {
            bot.send_message(msg.chat.id, "Send 'yes' or 'no'.").await?;
        }
    }
    Ok(())
}

async fn ask_add_more(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    test_id: i64,
) -> HandlerResult {
    bot.send_message(chat_id, "Question saved. Add another one? (yes/no)")
        .await?;
    dialogue.update(State::NewTestAddMore { test_id }).await?;
    Ok(())
}
