//! Core types for model conversations
//!
//! This module contains the shared types used by the providers, the tool
//! registry and the conversation loop.

mod message;
mod tool;

pub use message::{ChatMessage, MessageRole};
pub use tool::{ContentBlock, Tool, ToolCall, ToolDescriptor, ToolOutput};
