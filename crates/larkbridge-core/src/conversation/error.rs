//! Conversation loop errors

use std::time::Duration;

use thiserror::Error;

use crate::providers::ProviderError;

/// Faults that prevent the loop from producing any answer
#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("Model backend error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Model backend timed out after {0:?}")]
    Timeout(Duration),

    #[error("Model requested tools for more than {0} rounds without answering")]
    ToolRoundLimit(u32),
}

pub type ConversationResult<T> = Result<T, ConversationError>;
