//! Server error types

use thiserror::Error;

/// Errors talking to the chat platform
#[derive(Error, Debug)]
pub enum LarkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The API answered with a non-zero code
    #[error("Lark API error {code}: {msg}")]
    Api { code: i64, msg: String },

    #[error("Unexpected Lark response: {0}")]
    InvalidResponse(String),
}

pub type LarkResult<T> = Result<T, LarkError>;

/// Errors while answering one chat message
#[derive(Error, Debug)]
pub enum JobError {
    #[error(transparent)]
    Conversation(#[from] larkbridge_core::ConversationError),

    #[error(transparent)]
    Lark(#[from] LarkError),
}

impl JobError {
    /// Short name shown to users in the error card
    pub fn kind(&self) -> &'static str {
        use larkbridge_core::ConversationError;

        match self {
            JobError::Conversation(ConversationError::Provider(_)) => "ProviderError",
            JobError::Conversation(ConversationError::Timeout(_)) => "TimeoutError",
            JobError::Conversation(ConversationError::ToolRoundLimit(_)) => "ToolRoundLimit",
            JobError::Lark(_) => "LarkError",
        }
    }
}

pub type JobResult<T> = Result<T, JobError>;

/// The worker pool no longer accepts jobs
#[derive(Error, Debug)]
#[error("Worker pool is shut down")]
pub struct PoolClosed;

/// Errors that stop the process from starting
#[derive(Error, Debug)]
pub enum ServerError {
    #[error("Configuration error: {0}")]
    Config(#[from] larkbridge_core::ConfigError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Chat platform error: {0}")]
    Lark(#[from] LarkError),
}

pub type ServerResult<T> = Result<T, ServerError>;
