//! Conversation loop
//!
//! One run per inbound message:
//!
//! ```text
//! Request ──► Decide ──(plain text)──► Done
//!    ▲          │
//!    │     (tool calls)
//!    │          ▼
//!    └────── Execute
//! ```
//!
//! Tool faults come back as text in `tool` turns so the model can react;
//! only backend faults abort the run.

mod error;
mod runner;

pub use error::{ConversationError, ConversationResult};
pub use runner::{ConversationLoop, ConversationOutcome, FALLBACK_ANSWER};
