//! Tool server error types

use std::time::Duration;

use thiserror::Error;

/// Errors raised by tool server connections
#[derive(Error, Debug)]
pub enum McpError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Initialization failed: {0}")]
    InitializationFailed(String),

    #[error("Connection timed out after {0:?}")]
    Timeout(Duration),

    #[error("Session not initialized, connect first")]
    NotConnected,

    #[error("Tool '{tool}' not found on server {server}")]
    ToolNotFound { tool: String, server: String },

    #[error("Tool call failed: {0}")]
    ToolCallFailed(String),

    #[error("Protocol error: {0}")]
    Protocol(String),
}

pub type McpResult<T> = Result<T, McpError>;
