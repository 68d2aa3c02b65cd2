//! Chat platform (Lark/Feishu)
//!
//! `ChatPlatform` is the outbound seam: `LarkClient` talks to the open
//! platform over HTTP, `MockPlatform` records messages for tests. Inbound
//! callback payloads live in `event`.

mod client;
pub mod event;
pub mod mock;

use async_trait::async_trait;

use crate::error::LarkResult;

pub use client::{markdown_card, LarkClient};
pub use event::{resolve_mentions, CallbackPayload, Message};
pub use mock::{MockPlatform, Outgoing};

/// Outbound operations the bridge needs from the chat platform
#[async_trait]
pub trait ChatPlatform: Send + Sync {
    /// Post a markdown card to `chat_id`; returns the new message id
    async fn send_message(&self, chat_id: &str, content: &str) -> LarkResult<String>;

    /// Replace the card content of an earlier message
    async fn patch_message(&self, message_id: &str, content: &str) -> LarkResult<()>;

    /// The bot's own open id, used to detect mentions
    async fn bot_open_id(&self) -> LarkResult<String>;
}
