use anyhow::Result;
use classwork_bot::database::{connection::DatabaseManager, models::*};
use classwork_bot::quiz::ResultUpdate;
use tempfile::{tempdir, TempDir};

async fn setup_test_db() -> Result<(DatabaseManager, TempDir)> {
    let temp_dir = tempdir()?;
    let db_path = temp_dir.path().join("test.db");
    let database_url = format!("sqlite:{}", db_path.display());

    let db_manager = DatabaseManager::new(&database_url).await?;
    db_manager.run_migrations().await?;

    Ok((db_manager, temp_dir))
}

#[tokio::test]
async fn test_student_registration_and_lookup() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let student = Student::create(&db.pool, "Ada", "Lovelace", 7, 1001).await?;
    assert_eq!(student.first_name, "Ada");
    assert_eq!(student.class_number, 7);

    let found = Student::find_by_telegram_id(&db.pool, 1001).await?;
    assert!(found.is_some());
    assert_eq!(found.unwrap().id, student.id);

    let missing = Student::find_by_telegram_id(&db.pool, 9999).await?;
    assert!(missing.is_none());

    Ok(())
}

#[tokio::test]
async fn test_class_rosters_and_unique_classes() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    Student::create(&db.pool, "Ada", "Lovelace", 7, 1001).await?;
    Student::create(&db.pool, "Charles", "Babbage", 7, 1002).await?;
    Student::create(&db.pool, "Alan", "Turing", 9, 1003).await?;

    let class7 = Student::telegram_ids_by_class(&db.pool, 7).await?;
    assert_eq!(class7.len(), 2);
    assert!(class7.contains(&1001));
    assert!(class7.contains(&1002));

    let classes = Student::unique_classes(&db.pool).await?;
    assert_eq!(classes, vec![7, 9]);

    // the roster is ordered by last name
    let roster = Student::find_by_class(&db.pool, 7).await?;
    assert_eq!(roster[0].last_name, "Babbage");
    assert_eq!(roster[1].last_name, "Lovelace");

    Ok(())
}

#[tokio::test]
async fn test_task_assignment_tracking() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    Student::create(&db.pool, "Ada", "Lovelace", 7, 1001).await?;
    Student::create(&db.pool, "Alan", "Turing", 9, 1003).await?;

    let task_id = Task::create(&db.pool, "Essay", "Write about rivers", None).await?;

    // not assigned anywhere yet: both classes pending
    let pending = Task::pending_classes(&db.pool, task_id).await?;
    assert_eq!(pending, vec![7, 9]);
    let unsent = Task::not_sent_to_all_classes(&db.pool).await?;
    assert_eq!(unsent.len(), 1);

    TaskAssignment::record(&db.pool, task_id, 7).await?;
    assert!(TaskAssignment::exists(&db.pool, task_id, 7).await?);
    assert!(!TaskAssignment::exists(&db.pool, task_id, 9).await?);

    let pending = Task::pending_classes(&db.pool, task_id).await?;
    assert_eq!(pending, vec![9]);

    // students of the assigned class see the task, others do not
    let for_ada = Task::assigned_to_student(&db.pool, 1001).await?;
    assert_eq!(for_ada.len(), 1);
    let for_alan = Task::assigned_to_student(&db.pool, 1003).await?;
    assert!(for_alan.is_empty());

    TaskAssignment::record(&db.pool, task_id, 9).await?;
    let unsent = Task::not_sent_to_all_classes(&db.pool).await?;
    assert!(unsent.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_homework_answers_and_duplicate_detection() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let student = Student::create(&db.pool, "Ada", "Lovelace", 7, 1001).await?;
    let task_id = Task::create(&db.pool, "Essay", "Write about rivers", None).await?;

    assert!(!Answer::exists_for_student(&db.pool, student.id, task_id).await?);

    Answer::create(&db.pool, student.id, task_id, Some("The Volga is long"), None).await?;
    Answer::create(
        &db.pool,
        student.id,
        task_id,
        None,
        Some("homeworks/doc_abc_essay.pdf"),
    )
    .await?;

    assert!(Answer::exists_for_student(&db.pool, student.id, task_id).await?);

    let answers = Answer::find_by_task(&db.pool, task_id).await?;
    assert_eq!(answers.len(), 2);
    assert!(answers.iter().all(|a| a.first_name == "Ada"));

    Ok(())
}

#[tokio::test]
async fn test_question_authoring_has_exactly_one_correct_option() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

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
    assert_eq!(options.len(), 4);
    assert_eq!(options.iter().filter(|o| o.is_correct).count(), 1);

    let correct = options.iter().find(|o| o.is_correct).unwrap();
    assert_eq!(correct.text.as_deref(), Some("Volga"));
    assert!(QuestionOption::is_correct(&db.pool, correct.id).await?);

    // a vanished option id counts as incorrect
    assert!(!QuestionOption::is_correct(&db.pool, 424242).await?);

    Ok(())
}

#[tokio::test]
async fn test_free_text_answer_is_stored_normalized() -> Result<()> {
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
    Question::set_correct_text(&db.pool, question_id, "  Paris ").await?;

    let stored = Question::correct_text(&db.pool, question_id).await?;
    assert_eq!(stored.as_deref(), Some("paris"));

    Ok(())
}

#[tokio::test]
async fn test_user_result_insert_then_update() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let test_id = Test::create(&db.pool, "Geography", 2).await?;

    UserResult::apply(
        &db.pool,
        1001,
        "Ada",
        "Lovelace",
        test_id,
        &ResultUpdate::Insert {
            best_score: 1,
            total: 3,
            attempts_left: 1,
        },
    )
    .await?;

    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!(result.best_score, 1);
    assert_eq!(result.total, 3);
    assert_eq!(result.attempts_left, 1);

    UserResult::apply(
        &db.pool,
        1001,
        "Ada",
        "Lovelace",
        test_id,
        &ResultUpdate::Update {
            best_score: 2,
            total: 3,
        },
    )
    .await?;

    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!(result.best_score, 2);
    assert_eq!(result.attempts_left, 0);

    // the decrement is guarded: a further update cannot go below zero
    UserResult::apply(
        &db.pool,
        1001,
        "Ada",
        "Lovelace",
        test_id,
        &ResultUpdate::Update {
            best_score: 3,
            total: 3,
        },
    )
    .await?;
    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!(result.attempts_left, 0);

    Ok(())
}

#[tokio::test]
async fn test_discard_leaves_the_result_untouched() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    let test_id = Test::create(&db.pool, "Geography", 2).await?;
    UserResult::apply(
        &db.pool,
        1001,
        "Ada",
        "Lovelace",
        test_id,
        &ResultUpdate::Insert {
            best_score: 2,
            total: 3,
            attempts_left: 0,
        },
    )
    .await?;

    UserResult::apply(&db.pool, 1001, "Ada", "Lovelace", test_id, &ResultUpdate::Discard).await?;

    let result = UserResult::find(&db.pool, 1001, test_id).await?.unwrap();
    assert_eq!(result.best_score, 2);
    assert_eq!(result.attempts_left, 0);

    Ok(())
}

#[tokio::test]
async fn test_attempt_log_and_detail_view() -> Result<()> {
    let (db, _temp_dir) = setup_test_db().await?;

    Student::create(&db.pool, "Ada", "Lovelace", 7, 1001).await?;
    let test_id = Test::create(&db.pool, "Geography", 2).await?;

    let choice_id = Question::create(
        &db.pool,
        test_id,
        "Longest river in Europe?",
        None,
        QuestionKind::Choice,
    )
    .await?;
    QuestionOption::create(&db.pool, choice_id, Some("Danube"), None, false).await?;
    QuestionOption::create(&db.pool, choice_id, Some("Volga"), None, true).await?;
    let options = QuestionOption::find_by_question(&db.pool, choice_id).await?;

    let text_id = Question::create(
        &db.pool,
        test_id,
        "Capital of France?",
        None,
        QuestionKind::FreeText,
    )
    .await?;
    Question::set_correct_text(&db.pool, text_id, "Paris").await?;

    // attempt 1: wrong option, right text
    UserAnswer::record(&db.pool, 1001, test_id, choice_id, Some(options[0].id), None, 1).await?;
    UserAnswer::record(&db.pool, 1001, test_id, text_id, None, Some("paris"), 1).await?;
    // attempt 2: right option
    UserAnswer::record(&db.pool, 1001, test_id, choice_id, Some(options[1].id), None, 2).await?;

    let takers = UserAnswer::users_for_test(&db.pool, test_id).await?;
    assert_eq!(takers.len(), 1);
    assert_eq!(takers[0].first_name, "Ada");

    let attempts = UserAnswer::attempt_numbers(&db.pool, 1001, test_id).await?;
    assert_eq!(attempts, vec![1, 2]);

    let details = UserAnswer::attempt_details(&db.pool, 1001, test_id, 1).await?;
    assert_eq!(details.len(), 2);
    let river = details
        .iter()
        .find(|d| d.question_text.contains("river"))
        .unwrap();
    assert!(!river.correct);
    assert_eq!(river.option_text.as_deref(), Some("Danube"));
    let capital = details
        .iter()
        .find(|d| d.question_text.contains("Capital"))
        .unwrap();
    assert!(capital.correct);
    assert_eq!(capital.text_answer.as_deref(), Some("paris"));

    let details = UserAnswer::attempt_details(&db.pool, 1001, test_id, 2).await?;
    assert_eq!(details.len(), 1);
    assert!(details[0].correct);

    Ok(())
}
