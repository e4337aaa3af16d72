use teloxide::prelude::*;

use crate::bot::handlers::HandlerResult;
use crate::database::connection::DatabaseManager;
use crate::database::models::{UserAnswer, UserResult};
use crate::utils::keyboards;

/// Lists everyone who has answered at least one question of a test.
pub async fn show_test_takers(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
    test_id: i64,
) -> HandlerResult {
    let takers = UserAnswer::users_for_test(&db.pool, test_id).await?;
    if takers.is_empty() {
        bot.send_message(chat_id, "No one has taken this test yet.").await?;
        return Ok(());
    }

    let buttons = takers
        .iter()
        .map(|taker| {
            (
                format!("{} {}", taker.first_name, taker.last_name),
                format!("user_results_{}_{}", test_id, taker.user_id),
            )
        })
        .collect();
    bot.send_message(chat_id, "Whose results?")
        .reply_markup(keyboards::inline_keyboard(buttons, 1))
        .await?;
    Ok(())
}

/// The stored summary for one user plus a button per recorded attempt.
pub async fn show_user_attempts(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
    test_id: i64,
    user_id: i64,
) -> HandlerResult {
    let summary = match UserResult::find(&db.pool, user_id, test_id).await? {
        Some(result) => format!(
            "{} {}: best score {}/{}, {} attempt(s) left.",
            result.first_name, result.last_name, result.best_score, result.total, result.attempts_left
        ),
        None => "No completed attempt on record.".to_string(),
    };

    let attempts = UserAnswer::attempt_numbers(&db.pool, user_id, test_id).await?;
    if attempts.is_empty() {
        bot.send_message(chat_id, summary).await?;
        return Ok(());
    }

    let buttons = attempts
        .iter()
        .map(|n| {
            (
                format!("Attempt {n}"),
                format!("attempt_{}_{}_{}", test_id, user_id, n),
            )
        })
        .collect();
    bot.send_message(chat_id, summary)
        .reply_markup(keyboards::inline_keyboard(buttons, 2))
        .await?;
    Ok(())
}

/// One attempt, question by question, with the given answer and a verdict.
pub async fn show_attempt(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
    test_id: i64,
    user_id: i64,
    attempt_number: i64,
) -> HandlerResult {
    let details = UserAnswer::attempt_details(&db.pool, user_id, test_id, attempt_number).await?;
    if details.is_empty() {
        bot.send_message(chat_id, "No answers recorded for this attempt.")
            .await?;
        return Ok(());
    }

    let mut lines = vec![format!("Attempt {attempt_number}:")];
    for detail in &details {
        let answer = detail
            .option_text
            .as_deref()
            .or(detail.text_answer.as_deref())
            .unwrap_or("(image option)");
        let verdict = if detail.correct { "✅" } else { "❌" };
        lines.push(format!("{verdict} {}\n    → {answer}", detail.question_text));
    }

    bot.send_message(chat_id, lines.join("\n")).await?;
    Ok(())
}
