use chrono::{DateTime, NaiveDateTime, Utc};

use crate::error::{BotError, BotResult};

/// Number of options every choice question carries.
pub const CHOICE_OPTION_COUNT: usize = 4;

fn invalid(message: impl Into<String>) -> BotError {
    BotError::UserInput(message.into())
}

pub fn parse_max_attempts(input: &str) -> BotResult<i64> {
    let attempts: i64 = input
        .trim()
        .parse()
        .map_err(|_| invalid("Attempt count must be a number"))?;

    if attempts <= 0 {
        return Err(invalid("Attempt count must be positive"));
    }

    Ok(attempts)
}

pub fn parse_class_number(input: &str) -> BotResult<i64> {
    let class_number: i64 = input
        .trim()
        .parse()
        .map_err(|_| invalid("Class number must be a number"))?;

    if class_number <= 0 {
        return Err(invalid("Class number must be positive"));
    }

    Ok(class_number)
}

/// Parses the 1-based correct-option index entered at the end of a choice
/// question block. Returns the 0-based index into the option list.
pub fn parse_correct_option_index(input: &str) -> BotResult<usize> {
    let index: usize = input
        .trim()
        .parse()
        .map_err(|_| invalid(format!("Enter a number from 1 to {CHOICE_OPTION_COUNT}")))?;

    if !(1..=CHOICE_OPTION_COUNT).contains(&index) {
        return Err(invalid(format!(
            "Enter a number from 1 to {CHOICE_OPTION_COUNT}"
        )));
    }

    Ok(index - 1)
}

/// Parses a "DD.MM.YYYY HH:MM" schedule time, interpreted as UTC. Times
/// not strictly in the future are rejected.
pub fn parse_schedule_time(input: &str, now: DateTime<Utc>) -> BotResult<DateTime<Utc>> {
    let naive = NaiveDateTime::parse_from_str(input.trim(), "%d.%m.%Y %H:%M")
        .map_err(|_| invalid("Use the format DD.MM.YYYY HH:MM"))?;

    let at = DateTime::<Utc>::from_naive_utc_and_offset(naive, Utc);
    if at <= now {
        return Err(invalid("The scheduled time must be in the future"));
    }

    Ok(at)
}
