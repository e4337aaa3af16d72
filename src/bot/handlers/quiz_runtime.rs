use teloxide::prelude::*;
use teloxide::types::User;
use tracing::{info, warn};

use crate::bot::handlers::{BotDialogue, HandlerResult};
use crate::bot::state::State;
use crate::database::connection::DatabaseManager;
use crate::database::models::{
    OptionContent, Question, QuestionKind, QuestionOption, Student, Test, UserAnswer, UserResult,
};
use crate::error::{BotError, BotResult};
use crate::quiz::{scoring, QuestionRef, QuizSession, QuizTaker};
use crate::utils::{files, keyboards};

/// Lists the tests the user can still start, hiding exhausted ones.
pub async fn list_available_tests(
    bot: &Bot,
    chat_id: ChatId,
    user_id: i64,
    db: &DatabaseManager,
) -> HandlerResult {
    let mut available = Vec::new();
    for test in Test::all(&db.pool).await? {
        let prior = UserResult::find(&db.pool, user_id, test.id)
            .await?
            .map(|r| r.attempts_left);
        let remaining = scoring::attempts_remaining(test.max_attempts, prior);
        if remaining > 0 {
            available.push((test, remaining));
        }
    }

    if available.is_empty() {
        bot.send_message(chat_id, "No tests are available for you right now.")
            .await?;
    } else {
        bot.send_message(chat_id, "Pick a test:")
            .reply_markup(keyboards::test_selection(&available))
            .await?;
    }
    Ok(())
}

/// Admission check for a new attempt. The caller turns the error variants
/// into chat messages.
async fn admit(
    db: &DatabaseManager,
    user_id: i64,
    test_id: i64,
) -> BotResult<(Test, Vec<QuestionRef>, Option<i64>)> {
    let test = Test::find_by_id(&db.pool, test_id)
        .await?
        .ok_or(BotError::NotFound("test"))?;

    let prior = UserResult::find(&db.pool, user_id, test_id)
        .await?
        .map(|r| r.attempts_left);
    if scoring::attempts_remaining(test.max_attempts, prior) <= 0 {
        return Err(BotError::ExhaustedAttempts);
    }

    let questions: Vec<QuestionRef> = Question::find_by_test(&db.pool, test_id)
        .await?
        .into_iter()
        .map(|q| QuestionRef { id: q.id, text: q.text })
        .collect();
    if questions.is_empty() {
        return Err(BotError::NotFound("question"));
    }

    Ok((test, questions, prior))
}

/// Starts an attempt: admission check, session setup, first question.
pub async fn start_test(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    user: &User,
    db: &DatabaseManager,
    test_id: i64,
) -> HandlerResult {
    let user_id = user.id.0 as i64;

    let (test, questions, prior) = match admit(db, user_id, test_id).await {
        Ok(admitted) => admitted,
        Err(BotError::ExhaustedAttempts) => {
            bot.send_message(chat_id, "You have no attempts left for this test.")
                .await?;
            return Ok(());
        }
        Err(BotError::NotFound("test")) => {
            bot.send_message(chat_id, "This test no longer exists.").await?;
            return Ok(());
        }
        Err(BotError::NotFound(_)) => {
            bot.send_message(chat_id, "This test has no questions yet.").await?;
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    // Registered name wins; the Telegram profile name is the fallback for
    // the teacher account taking its own test.
    let taker = match Student::find_by_telegram_id(&db.pool, user_id).await? {
        Some(student) => QuizTaker {
            user_id,
            first_name: student.first_name,
            last_name: student.last_name,
        },
        None => QuizTaker {
            user_id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone().unwrap_or_default(),
        },
    };

    let attempt_number = scoring::attempt_number(test.max_attempts, prior);
    let session = QuizSession::new(test_id, taker, questions, attempt_number);
    info!(
        "User {} started attempt {} of test {}",
        user_id, attempt_number, test_id
    );

    bot.send_message(chat_id, format!("Starting '{}'. Good luck!", test.title))
        .await?;
    advance(bot, dialogue, chat_id, db, session).await
}

/// A typed reply while a quiz is running: the answer to a free-text
/// question, or a nudge back to the buttons for a choice one.
pub async fn receive_text_answer(
    bot: Bot,
    dialogue: BotDialogue,
    msg: Message,
    session: QuizSession,
    db: DatabaseManager,
) -> HandlerResult {
    let Some(text) = msg.text().map(str::trim).filter(|t| !t.is_empty()) else {
        bot.send_message(msg.chat.id, "Please answer with text.").await?;
        return Ok(());
    };

    let mut session = session;
    let Some(current) = session.current_question() else {
        dialogue.exit().await?;
        return Ok(());
    };

    let Some(question) = Question::find_by_id(&db.pool, current.id).await? else {
        return abort_missing_question(&bot, &dialogue, msg.chat.id, &session).await;
    };

    if question.question_kind() != QuestionKind::FreeText {
        bot.send_message(msg.chat.id, "Use the buttons to answer this question.")
            .await?;
        return Ok(());
    }

    let correct = scoring::free_text_matches(text, question.correct_text.as_deref());
    UserAnswer::record(
        &db.pool,
        session.taker.user_id,
        session.test_id,
        question.id,
        None,
        Some(&scoring::normalize_free_text(text)),
        session.attempt_number,
    )
    .await?;
    session.record_answer(correct);

    advance(&bot, &dialogue, msg.chat.id, &db, session).await
}

/// A pressed option button while a quiz is running.
pub async fn receive_option_answer(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    db: &DatabaseManager,
    option_id: i64,
    session: QuizSession,
) -> HandlerResult {
    let mut session = session;
    let Some(current) = session.current_question() else {
        dialogue.exit().await?;
        return Ok(());
    };
    let question_id = current.id;

    let correct = QuestionOption::is_correct(&db.pool, option_id).await?;
    UserAnswer::record(
        &db.pool,
        session.taker.user_id,
        session.test_id,
        question_id,
        Some(option_id),
        None,
        session.attempt_number,
    )
    .await?;
    session.record_answer(correct);

    advance(bot, dialogue, chat_id, db, session).await
}

/// Presents the next question, or finalizes the attempt once there is none
/// left. A question deleted mid-attempt aborts the session; already-logged
/// answer rows stay.
async fn advance(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    db: &DatabaseManager,
    session: QuizSession,
) -> HandlerResult {
    let Some(current) = session.current_question() else {
        return finalize(bot, dialogue, chat_id, db, session).await;
    };

    let Some(question) = Question::find_by_id(&db.pool, current.id).await? else {
        return abort_missing_question(bot, dialogue, chat_id, &session).await;
    };

    present_question(bot, chat_id, db, &session, &question).await?;
    dialogue.update(State::TakingQuiz { session }).await?;
    Ok(())
}

/// Error path for a question row that vanished mid-attempt: the session
/// is discarded without touching user_results.
async fn abort_missing_question(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    session: &QuizSession,
) -> HandlerResult {
    warn!(
        "Question vanished during attempt {} on test {}; aborting the session",
        session.attempt_number, session.test_id
    );
    bot.send_message(
        chat_id,
        "This test changed while you were taking it. The attempt was cancelled.",
    )
    .reply_markup(keyboards::main_menu(false))
    .await?;
    dialogue.exit().await?;
    Ok(())
}

async fn present_question(
    bot: &Bot,
    chat_id: ChatId,
    db: &DatabaseManager,
    session: &QuizSession,
    question: &Question,
) -> HandlerResult {
    let (position, count) = session.progress();
    let prompt = format!("Question {position}/{count}:\n{}", question.text);

    if let Some(path) = &question.file_path {
        files::send_file_message(bot, chat_id, path, None).await?;
    }

    match question.question_kind() {
        QuestionKind::Choice => {
            let options = QuestionOption::find_by_question(&db.pool, question.id).await?;
            let mut buttons = Vec::with_capacity(options.len());
            for (index, option) in options.iter().enumerate() {
                let label = match option.content() {
                    OptionContent::Text(text) => text,
                    OptionContent::Image(path) => {
                        let label = format!("Option {}", index + 1);
                        files::send_file_message(bot, chat_id, &path, Some(&label)).await?;
                        label
                    }
                };
                buttons.push((label, format!("opt_{}", option.id)));
            }
            bot.send_message(chat_id, prompt)
                .reply_markup(keyboards::inline_keyboard(buttons, 1))
                .await?;
        }
        QuestionKind::FreeText => {
            bot.send_message(chat_id, format!("{prompt}\nType your answer."))
                .await?;
        }
    }
    Ok(())
}

/// Applies the finished attempt to the stored result and reports the score.
async fn finalize(
    bot: &Bot,
    dialogue: &BotDialogue,
    chat_id: ChatId,
    db: &DatabaseManager,
    session: QuizSession,
) -> HandlerResult {
    let score = session.score();

    let outcome = match Test::find_by_id(&db.pool, session.test_id).await? {
        Some(test) => {
            let prior = UserResult::find(&db.pool, session.taker.user_id, session.test_id)
                .await?
                .map(|r| (r.best_score, r.attempts_left));
            let update =
                scoring::finalize_attempt(score.score, score.total, prior, test.max_attempts);
            UserResult::apply(
                &db.pool,
                session.taker.user_id,
                &session.taker.first_name,
                &session.taker.last_name,
                session.test_id,
                &update,
            )
            .await?;
            Some(update)
        }
        None => None,
    };
    info!(
        "User {} finished attempt {} of test {}: {}/{}",
        session.taker.user_id, session.attempt_number, session.test_id, score.score, score.total
    );

    let mut report = format!("Test complete! Your score: {}/{}.", score.score, score.total);
    match outcome {
        Some(scoring::ResultUpdate::Update { best_score, .. }) if best_score > score.score => {
            report.push_str(&format!(" Your best score stays {best_score}."));
        }
        Some(scoring::ResultUpdate::Discard) => {
            report.push_str(" You were out of attempts, so this score is not saved.");
        }
        _ => {}
    }

    bot.send_message(chat_id, report)
        .reply_markup(keyboards::main_menu(false))
        .await?;
    dialogue.exit().await?;
    Ok(())
}
