//! End-to-end attempt bookkeeping: the session walks the questions, the
//! scoring rules decide what the store keeps.

use anyhow::Result;
use classwork_bot::database::{connection::DatabaseManager, models::*};
use classwork_bot::quiz::{
    attempt_number, attempts_remaining, finalize_attempt, free_text_matches, QuestionRef,
    QuizSession, QuizTaker, ResultUpdate,
};
use tempfile::{tempdir, TempDir};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

fn ada() -> QuizTaker {
    QuizTaker {
        user_id: 1001,
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
    }
}

/// Builds the two-attempt geography test: one choice question whose
/// fourth option is correct.
async fn seed_geo_test(db: &DatabaseManager) -> Result<(i64, i64, Vec<QuestionOption>)> {
    let test_id = Test::create(&db.pool, "Geography", 2).await?;
    let question_id = Question::create(
        &db.pool,
        test_id,
        "Longest river in Europe?",
        None,
        QuestionKind::Choice,
    )
    .await?;
    for (index, label) in ["Danube", "Rhine", "Dnieper", "Volga"].iter().enumerate() {
        QuestionOption::create(&db.pool, question_id, Some(label), None, index == 3).await?;
    }
    let options = QuestionOption::find_by_question(&db.pool, question_id).await?;
    Ok((test_id, question_id, options))
}

/// Runs one complete attempt against the store, the way the runtime does:
/// log each answer, then finalize into user_results.
async fn run_attempt(
    db: &DatabaseManager,
    test_id: i64,
    question_id: i64,
    chosen_option: &QuestionOption,
) -> Result<ResultUpdate> {
    let taker = ada();
    let max_attempts = Test::find_by_id(&db.pool, test_id).await?.unwrap().max_attempts;
    let prior_left = UserResult::find(&db.pool, taker.user_id, test_id)
        .await?
        .map(|r| r.attempts_left);

    let mut session = QuizSession::new(
        test_id,
        taker.clone(),
        vec![QuestionRef {
            id: question_id,
            text: "Longest river in Europe?".to_string(),
        }],
        attempt_number(max_attempts, prior_left),
    );

    let correct = QuestionOption::is_correct(&db.pool, chosen_option.id).await?;
    UserAnswer::record(
        &db.pool,
        taker.user_id,
        test_id,
        question_id,
        Some(chosen_option.id),
        None,
        session.attempt_number,
    )
    .await?;
    session.record_answer(correct);
    assert!(session.is_complete());

    let score = session.score();
    let prior = UserResult::find(&db.pool, taker.user_id, test_id)
        .await?
        .map(|r| (r.best_score, r.attempts_left));
    let update = finalize_attempt(score.score, score.total, prior, max_attempts);
    UserResult::apply(
        &db.pool,
        taker.user_id,
        &taker.first_name,
        &taker.last_name,
        test_id,
        &update,
    )
    .await?;
    Ok(update)
}

#[tokio::test]
async fn test_two_correct_attempts_burn_both_attempts_and_keep_the_score() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let (test_id, question_id, options) = seed_geo_test(&db).await?;
    let volga = options.iter().find(|o| o.is_correct).unwrap();

    // first attempt: correct, row inserted with one attempt left
    let update = run_attempt(&db, test_id, question_id, volga).await?;
    assert!(matches!(update, ResultUpdate::Insert { best_score: 1, .. }));
    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!((result.best_score, result.total, result.attempts_left), (1, 1, 1));
    assert_eq!(attempt_number(2, Some(result.attempts_left)), 2);

    // second attempt: correct again, attempts exhausted, score unchanged
    let update = run_attempt(&db, test_id, question_id, volga).await?;
    assert!(matches!(update, ResultUpdate::Update { best_score: 1, .. }));
    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!((result.best_score, result.attempts_left), (1, 0));

    // the test now disappears from the selection listing
    assert_eq!(attempts_remaining(2, Some(result.attempts_left)), 0);

    // both attempts are in the append-only log
    let attempts = UserAnswer::attempt_numbers(&db.pool, 1001, test_id).await?;
    assert_eq!(attempts, vec![1, 2]);

    Ok(())
}

#[tokio::test]
async fn test_best_score_is_monotone_across_attempts() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let (test_id, question_id, options) = seed_geo_test(&db).await?;
    let volga = options.iter().find(|o| o.is_correct).unwrap();
    let danube = options.iter().find(|o| !o.is_correct).unwrap();

    run_attempt(&db, test_id, question_id, volga).await?;
    let best_after_first = UserResult::find(&db.pool, 1001, test_id).await?.unwrap().best_score;

    // a worse second attempt must not lower the stored best score
    run_attempt(&db, test_id, question_id, danube).await?;
    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!(result.best_score, best_after_first);
    assert_eq!(result.attempts_left, 0);

    Ok(())
}

#[tokio::test]
async fn test_attempt_after_exhaustion_is_discarded() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;
    let (test_id, question_id, options) = seed_geo_test(&db).await?;
    let volga = options.iter().find(|o| o.is_correct).unwrap();
    let danube = options.iter().find(|o| !o.is_correct).unwrap();

    run_attempt(&db, test_id, question_id, danube).await?;
    run_attempt(&db, test_id, question_id, danube).await?;
    let exhausted = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!((exhausted.best_score, exhausted.attempts_left), (0, 0));

    // a session that outlived its last attempt completes but is not saved
    let update = run_attempt(&db, test_id, question_id, volga).await?;
    assert_eq!(update, ResultUpdate::Discard);
    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!((result.best_score, result.attempts_left), (0, 0));

    Ok(())
}

#[tokio::test]
async fn test_free_text_question_accepts_sloppy_casing_and_spacing() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let test_id = Test::create(&db.pool, "Capitals", 1).await?;
    let question_id = Question::create(
        &db.pool,
        test_id,
        "Capital of France?",
        None,
        QuestionKind::FreeText,
    )
    .await?;
    Question::set_correct_text(&db.pool, question_id, "Paris").await?;

    let correct_text = Question::correct_text(&db.pool, question_id).await?;
    assert!(free_text_matches("Paris ", correct_text.as_deref()));
    assert!(free_text_matches(" PARIS", correct_text.as_deref()));
    assert!(!free_text_matches("Lyon", correct_text.as_deref()));

    // a choice question has no stored text answer, so text never matches
    let choice_id = Question::create(
        &db.pool,
        test_id,
        "Pick one",
        None,
        QuestionKind::Choice,
    )
    .await?;
    let no_text = Question::correct_text(&db.pool, choice_id).await?;
    assert!(!free_text_matches("anything", no_text.as_deref()));

    Ok(())
}

#[tokio::test]
async fn test_question_kinds_round_trip_through_the_store() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let test_id = Test::create(&db.pool, "Mixed", 1).await?;
    let choice_id = Question::create(&db.pool, test_id, "A?", None, QuestionKind::Choice).await?;
    let text_id = Question::create(&db.pool, test_id, "B?", None, QuestionKind::FreeText).await?;

    let questions = Question::find_by_test(&db.pool, test_id).await?;
    assert_eq!(questions.len(), 2);

    let choice = questions.iter().find(|q| q.id == choice_id).unwrap();
    assert_eq!(choice.question_kind(), QuestionKind::Choice);
    let text = questions.iter().find(|q| q.id == text_id).unwrap();
    assert_eq!(text.question_kind(), QuestionKind::FreeText);

    Ok(())
}
