//! Validation against input as it actually arrives from a chat: stray
//! whitespace, words instead of numbers, half-remembered formats.

use chrono::{Duration, Utc};
use classwork_bot::error::BotError;
use classwork_bot::utils::validation::{
    parse_class_number, parse_correct_option_index, parse_max_attempts, parse_schedule_time,
    CHOICE_OPTION_COUNT,
};

#[test]
fn test_attempt_count_with_chat_noise() {
    assert_eq!(parse_max_attempts("  2\n").unwrap(), 2);
    assert!(parse_max_attempts("2 attempts").is_err());
    assert!(parse_max_attempts("two").is_err());
    assert!(parse_max_attempts("∞").is_err());
}

#[test]
fn test_class_number_from_chat() {
    assert_eq!(parse_class_number(" 11 ").unwrap(), 11);
    assert!(parse_class_number("7a").is_err());
    assert!(parse_class_number("class 7").is_err());
}

#[test]
fn test_correct_option_covers_the_whole_block() {
    for index in 1..=CHOICE_OPTION_COUNT {
        assert_eq!(
            parse_correct_option_index(&index.to_string()).unwrap(),
            index - 1
        );
    }
    assert!(parse_correct_option_index(&(CHOICE_OPTION_COUNT + 1).to_string()).is_err());
}

#[test]
fn test_schedule_time_relative_to_now() {
    let now = Utc::now();

    let future = (now + Duration::days(1)).format("%d.%m.%Y %H:%M").to_string();
    assert!(parse_schedule_time(&future, now).is_ok());

    let past = (now - Duration::days(1)).format("%d.%m.%Y %H:%M").to_string();
    assert!(parse_schedule_time(&past, now).is_err());
}

#[test]
fn test_rejections_are_user_input_errors_with_a_retry_prompt() {
    let err = parse_schedule_time("next friday", Utc::now()).unwrap_err();
    match err {
        BotError::UserInput(message) => assert!(message.contains("DD.MM.YYYY HH:MM")),
        other => panic!("expected UserInput, got {other:?}"),
    }
}
