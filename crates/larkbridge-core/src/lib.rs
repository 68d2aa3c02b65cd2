//! Larkbridge Core
//!
//! The tool-augmented conversation engine behind the chat bridge. Nothing in
//! this crate knows about webhooks or the chat platform.
//!
//! ## Pieces
//!
//! - `mcp`: one `ToolClient` per remote tool server, behind a `ToolConnector`
//! - `tools`: the `ToolRegistry` merging every catalog into one routing table
//! - `providers`: the model backend (`GenaiProvider`, `MockProvider`)
//! - `conversation`: the `ConversationLoop` state machine
//!
//! ```rust,ignore
//! use larkbridge_core::{ConversationLoop, GenaiProvider, RmcpConnector, Settings, ToolRegistry};
//!
//! let settings = Settings::load(None)?;
//! let registry = Arc::new(ToolRegistry::from_settings(
//!     &settings.mcp,
//!     Arc::new(RmcpConnector::new(logger.clone())),
//!     logger.clone(),
//! ));
//! registry.startup(&settings.mcp.servers).await;
//!
//! let conversation = ConversationLoop::from_settings(
//!     &settings.model,
//!     Arc::new(GenaiProvider::new(logger.clone())),
//!     registry.clone(),
//!     logger,
//! );
//! let answer = conversation.run(messages, "gpt-4-turbo").await?;
//! ```

pub mod types;
pub mod logging;
pub mod config;
pub mod providers;
pub mod mcp;
pub mod tools;
pub mod conversation;

pub use types::{ChatMessage, ContentBlock, MessageRole, Tool, ToolCall, ToolDescriptor, ToolOutput};

pub use logging::{Logger, MemoryLogger, NoOpLogger, SharedLogger, TracingLogger};

pub use config::{ConfigError, ConfigResult, Settings, ToolServerConfig};

pub use providers::{
    Completion, CompletionOptions, GenaiProvider, MockProvider, Provider, ProviderError,
    ProviderModelConfig, ProviderResult,
};

pub use mcp::{
    ensure_no_additional_properties, McpError, McpResult, RmcpConnector, ToolClient, ToolConnector,
    ToolSession,
};

pub use tools::ToolRegistry;

pub use conversation::{
    ConversationError, ConversationLoop, ConversationOutcome, ConversationResult, FALLBACK_ANSWER,
};
