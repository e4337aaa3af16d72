//! The quiz attempt state machine and its scoring rules, kept free of
//! transport and store handles so the transitions are testable on their own.

pub mod scoring;
pub mod session;

pub use scoring::{
    attempt_number, attempts_remaining, finalize_attempt, free_text_matches, normalize_free_text,
    ResultUpdate,
};
pub use session::{AttemptScore, QuestionRef, QuizSession, QuizTaker};
