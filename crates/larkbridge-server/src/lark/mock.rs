//! In-memory chat platform for testing

use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::error::{LarkError, LarkResult};

use super::ChatPlatform;

/// Something the bridge posted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outgoing {
    Sent { chat_id: String, message_id: String, content: String },
    Patched { message_id: String, content: String },
}

/// Records outgoing messages instead of calling the platform
pub struct MockPlatform {
    bot_open_id: Option<String>,
    outgoing: Mutex<Vec<Outgoing>>,
    next_id: AtomicUsize,
    bot_lookups: AtomicUsize,
    fail_sends: bool,
}

impl MockPlatform {
    pub fn new(bot_open_id: impl Into<String>) -> Self {
        Self {
            bot_open_id: Some(bot_open_id.into()),
            outgoing: Mutex::new(Vec::new()),
            next_id: AtomicUsize::new(1),
            bot_lookups: AtomicUsize::new(0),
            fail_sends: false,
        }
    }

    /// Bot info lookups fail
    pub fn without_bot_info(mut self) -> Self {
        self.bot_open_id = None;
        self
    }

    /// Every send fails
    pub fn failing_sends(mut self) -> Self {
        self.fail_sends = true;
        self
    }

    pub fn outgoing(&self) -> Vec<Outgoing> {
        self.outgoing.lock().clone()
    }

    /// Content of every send and patch, in order
    pub fn contents(&self) -> Vec<String> {
        self.outgoing
            .lock()
            .iter()
            .map(|o| match o {
                Outgoing::Sent { content, .. } | Outgoing::Patched { content, .. } => content.clone(),
            })
            .collect()
    }

    pub fn bot_lookups(&self) -> usize {
        self.bot_lookups.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatPlatform for MockPlatform {
    async fn send_message(&self, chat_id: &str, content: &str) -> LarkResult<String> {
        if self.fail_sends {
            return Err(LarkError::Api {
                code: 99991663,
                msg: "send disabled".to_string(),
            });
        }
        let message_id = format!("om_mock_{}", self.next_id.fetch_add(1, Ordering::SeqCst));
        self.outgoing.lock().push(Outgoing::Sent {
            chat_id: chat_id.to_string(),
            message_id: message_id.clone(),
            content: content.to_string(),
        });
        Ok(message_id)
    }

    async fn patch_message(&self, message_id: &str, content: &str) -> LarkResult<()> {
        self.outgoing.lock().push(Outgoing::Patched {
            message_id: message_id.to_string(),
            content: content.to_string(),
        });
        Ok(())
    }

    async fn bot_open_id(&self) -> LarkResult<String> {
        self.bot_lookups.fetch_add(1, Ordering::SeqCst);
        self.bot_open_id
            .clone()
            .ok_or_else(|| LarkError::InvalidResponse("bot info unavailable".to_string()))
    }
}
