use thiserror::Error;

/// Error taxonomy for the bot core.
///
/// Every variant is handled at the point of detection: user-facing
/// variants turn into a chat message, delivery failures are logged and
/// the batch continues. Nothing here is fatal to the process.
#[derive(Debug, Error)]
pub enum BotError {
    /// Malformed user input; the user is re-prompted and state stays put.
    #[error("invalid input: {0}")]
    UserInput(String),

    /// A referenced entity is gone; the current session is aborted.
    #[error("{0} not found")]
    NotFound(&'static str),

    /// The user has no quiz attempts left; reported, no state change.
    #[error("no attempts left for this test")]
    ExhaustedAttempts,

    /// A message or file could not be delivered to one recipient.
    #[error("delivery to chat {chat_id} failed: {source}")]
    Delivery {
        chat_id: i64,
        #[source]
        source: teloxide::RequestError,
    },

    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

pub type BotResult<T> = Result<T, BotError>;
