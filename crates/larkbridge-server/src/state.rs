//! Shared state behind the webhook

use std::sync::Arc;

use larkbridge_core::{ConversationLoop, Settings};
use tokio::sync::OnceCell;

use crate::lark::ChatPlatform;
use crate::prompts::PromptBook;
use crate::store::ChatStore;
use crate::worker::WorkerPool;

pub type SharedState = Arc<AppState>;

pub struct AppState {
    pub settings: Settings,
    pub store: Arc<ChatStore>,
    pub prompts: PromptBook,
    pub platform: Arc<dyn ChatPlatform>,
    pub conversation: ConversationLoop,
    pub pool: WorkerPool,
    bot_open_id: OnceCell<String>,
}

impl AppState {
    /// Must be called inside a tokio runtime; spawns the worker pool
    pub fn new(
        settings: Settings,
        store: Arc<ChatStore>,
        prompts: PromptBook,
        platform: Arc<dyn ChatPlatform>,
        conversation: ConversationLoop,
    ) -> Self {
        let pool = WorkerPool::new(settings.server.workers);
        Self {
            settings,
            store,
            prompts,
            platform,
            conversation,
            pool,
            bot_open_id: OnceCell::new(),
        }
    }

    /// The bot's open id, fetched on first use
    ///
    /// A failed lookup is not cached and is retried on the next call.
    pub async fn bot_open_id(&self) -> Option<String> {
        let result = self
            .bot_open_id
            .get_or_try_init(|| self.platform.bot_open_id())
            .await;
        match result {
            Ok(open_id) => Some(open_id.clone()),
            Err(e) => {
                tracing::warn!(error = %e, "failed to fetch bot info");
                None
            }
        }
    }
}
