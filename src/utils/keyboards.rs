use teloxide::types::{
    InlineKeyboardButton, InlineKeyboardMarkup, KeyboardButton,
    KeyboardMarkup as ReplyKeyboardMarkup,
};

use crate::database::models::{TaskSummary, Test};

// Main menu button labels; the message handler matches on these.
pub const BTN_MY_TASKS: &str = "📚 My tasks";
pub const BTN_TAKE_TEST: &str = "📝 Take a test";
pub const BTN_CANCEL: &str = "❌ Cancel";
pub const BTN_NEW_TASK: &str = "➕ New task";
pub const BTN_SEND_TASK: &str = "📤 Send task";
pub const BTN_NEW_TEST: &str = "➕ New test";
pub const BTN_TEST_RESULTS: &str = "📊 Test results";
pub const BTN_STUDENT_ANSWERS: &str = "📥 Student answers";
pub const BTN_STUDENT_LIST: &str = "📋 Student list";

/// Reply keyboard shown after registration; teacher-only rows are added
/// for the admin account.
pub fn main_menu(is_admin: bool) -> ReplyKeyboardMarkup {
    let mut rows = vec![
        vec![
            KeyboardButton::new(BTN_MY_TASKS),
            KeyboardButton::new(BTN_TAKE_TEST),
        ],
        vec![KeyboardButton::new(BTN_CANCEL)],
    ];

    if is_admin {
        rows.push(vec![
            KeyboardButton::new(BTN_NEW_TASK),
            KeyboardButton::new(BTN_SEND_TASK),
        ]);
        rows.push(vec![
            KeyboardButton::new(BTN_NEW_TEST),
            KeyboardButton::new(BTN_TEST_RESULTS),
        ]);
        rows.push(vec![
            KeyboardButton::new(BTN_STUDENT_ANSWERS),
            KeyboardButton::new(BTN_STUDENT_LIST),
        ]);
    }

    ReplyKeyboardMarkup::new(rows).resize_keyboard(true)
}

/// One inline button per (label, callback token) pair, `per_row` across.
pub fn inline_keyboard(buttons: Vec<(String, String)>, per_row: usize) -> InlineKeyboardMarkup {
    let rows: Vec<Vec<InlineKeyboardButton>> = buttons
        .chunks(per_row.max(1))
        .map(|chunk| {
            chunk
                .iter()
                .map(|(label, token)| InlineKeyboardButton::callback(label.clone(), token.clone()))
                .collect()
        })
        .collect();
    InlineKeyboardMarkup::new(rows)
}

pub fn task_selection(tasks: &[TaskSummary], prefix: &str) -> InlineKeyboardMarkup {
    let buttons = tasks
        .iter()
        .map(|task| (task.title.clone(), format!("{prefix}{}", task.id)))
        .collect();
    inline_keyboard(buttons, 1)
}

pub fn class_selection(classes: &[i64], prefix: &str) -> InlineKeyboardMarkup {
    let buttons = classes
        .iter()
        .map(|class| (class.to_string(), format!("{prefix}{class}")))
        .collect();
    inline_keyboard(buttons, 2)
}

/// Tests the user may still start, labeled with their remaining attempts.
pub fn test_selection(tests: &[(Test, i64)]) -> InlineKeyboardMarkup {
    let buttons = tests
        .iter()
        .map(|(test, attempts_left)| {
            (
                format!("{} ({} attempts left)", test.title, attempts_left),
                format!("take_test_{}", test.id),
            )
        })
        .collect();
    inline_keyboard(buttons, 1)
}

pub fn send_method() -> InlineKeyboardMarkup {
    inline_keyboard(
        vec![
            ("Send now".to_string(), "send_now".to_string()),
            ("Schedule".to_string(), "send_later".to_string()),
        ],
        1,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_main_menu_hides_admin_rows_for_students() {
        let student_menu = main_menu(false);
        let admin_menu = main_menu(true);
        assert_eq!(student_menu.keyboard.len(), 2);
        assert_eq!(admin_menu.keyboard.len(), 5);
    }

    #[test]
    fn test_inline_keyboard_chunks_rows() {
        let buttons = (1..=5)
            .map(|i| (format!("b{i}"), format!("t{i}")))
            .collect();
        let keyboard = inline_keyboard(buttons, 2);
        assert_eq!(keyboard.inline_keyboard.len(), 3);
        assert_eq!(keyboard.inline_keyboard[0].len(), 2);
        assert_eq!(keyboard.inline_keyboard[2].len(), 1);
    }

    #[test]
    fn test_test_selection_tokens_carry_test_id() {
        let tests = vec![(
            Test {
                id: 42,
                title: "Geo".to_string(),
                max_attempts: 2,
            },
            2,
        )];
        let keyboard = test_selection(&tests);
        let button = &keyboard.inline_keyboard[0][0];
        assert_eq!(button.text, "Geo (2 attempts left)");
    }
}
