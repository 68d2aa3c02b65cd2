//! Volatile chat state with per-key expiry
//!
//! Nothing here survives a restart. Expiry uses tokio's clock so paused-time
//! tests can step through it.

use std::collections::HashMap;
use std::time::Duration;

use larkbridge_core::ChatMessage;
use parking_lot::Mutex;
use tokio::time::Instant;

/// Chat history lifetime after the last write
pub const HISTORY_TTL: Duration = Duration::from_secs(2 * 60 * 60);
/// Per-chat settings lifetime after the last write
pub const SETTINGS_TTL: Duration = Duration::from_secs(7 * 24 * 60 * 60);
/// How long a message id is remembered for duplicate suppression
pub const PROCESSED_TTL: Duration = Duration::from_secs(24 * 60 * 60);
/// Tokens are dropped this long before the platform expires them
pub const TOKEN_EXPIRY_MARGIN: u64 = 120;

/// Setting key for the per-chat model override
pub const MODEL_KEY: &str = "model";
/// Setting key for the per-chat role
pub const ROLE_KEY: &str = "role";

struct Entry<T> {
    value: T,
    expires_at: Instant,
}

impl<T> Entry<T> {
    fn new(value: T, ttl: Duration) -> Self {
        Self {
            value,
            expires_at: Instant::now() + ttl,
        }
    }

    fn is_live(&self) -> bool {
        Instant::now() < self.expires_at
    }
}

fn live<'a, T>(map: &'a HashMap<String, Entry<T>>, key: &str) -> Option<&'a T> {
    map.get(key).filter(|e| e.is_live()).map(|e| &e.value)
}

/// In-memory replacement for the bridge's key-value cache
#[derive(Default)]
pub struct ChatStore {
    history: Mutex<HashMap<String, Entry<Vec<ChatMessage>>>>,
    settings: Mutex<HashMap<String, Entry<HashMap<String, String>>>>,
    processed: Mutex<HashMap<String, Instant>>,
    token: Mutex<Option<Entry<String>>>,
}

impl ChatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Rolling history for `chat_id`, oldest first
    pub fn history(&self, chat_id: &str) -> Vec<ChatMessage> {
        live(&*self.history.lock(), chat_id).cloned().unwrap_or_default()
    }

    pub fn save_history(&self, chat_id: &str, messages: Vec<ChatMessage>) {
        self.history
            .lock()
            .insert(chat_id.to_string(), Entry::new(messages, HISTORY_TTL));
    }

    /// Append one user/assistant exchange, keeping the last `max_entries` turns
    pub fn append_exchange(&self, chat_id: &str, user: ChatMessage, assistant: ChatMessage, max_entries: usize) {
        let mut map = self.history.lock();
        let mut history = live(&*map, chat_id).cloned().unwrap_or_default();
        history.push(user);
        history.push(assistant);
        if history.len() > max_entries {
            history.drain(..history.len() - max_entries);
        }
        map.insert(chat_id.to_string(), Entry::new(history, HISTORY_TTL));
    }

    pub fn clear_history(&self, chat_id: &str) {
        self.history.lock().remove(chat_id);
    }

    /// Per-chat settings such as the model override and role
    pub fn settings(&self, chat_id: &str) -> HashMap<String, String> {
        live(&*self.settings.lock(), chat_id).cloned().unwrap_or_default()
    }

    pub fn setting(&self, chat_id: &str, key: &str) -> Option<String> {
        live(&*self.settings.lock(), chat_id).and_then(|s| s.get(key).cloned())
    }

    /// Set one setting and restart the settings TTL
    pub fn set_setting(&self, chat_id: &str, key: &str, value: &str) {
        let mut settings = self.settings.lock();
        let mut current = live(&*settings, chat_id).cloned().unwrap_or_default();
        current.insert(key.to_string(), value.to_string());
        settings.insert(chat_id.to_string(), Entry::new(current, SETTINGS_TTL));
    }

    /// Forget history and settings for `chat_id`
    pub fn clear_user_data(&self, chat_id: &str) {
        self.clear_history(chat_id);
        self.settings.lock().remove(chat_id);
    }

    /// Record `message_id`; returns false if it was already seen
    pub fn mark_processed(&self, message_id: &str) -> bool {
        let now = Instant::now();
        let mut processed = self.processed.lock();
        processed.retain(|_, expires_at| *expires_at > now);
        if processed.contains_key(message_id) {
            return false;
        }
        processed.insert(message_id.to_string(), now + PROCESSED_TTL);
        true
    }

    /// Cached platform access token, if still valid
    pub fn access_token(&self) -> Option<String> {
        self.token
            .lock()
            .as_ref()
            .filter(|e| e.is_live())
            .map(|e| e.value.clone())
    }

    /// Cache a token that the platform says expires in `expire_secs`
    pub fn set_access_token(&self, token: &str, expire_secs: u64) {
        let ttl = expire_secs.saturating_sub(TOKEN_EXPIRY_MARGIN);
        let mut slot = self.token.lock();
        *slot = (ttl > 0).then(|| Entry::new(token.to_string(), Duration::from_secs(ttl)));
    }

    /// Drop everything
    pub fn clear(&self) {
        self.history.lock().clear();
        self.settings.lock().clear();
        self.processed.lock().clear();
        *self.token.lock() = None;
    }
}
