//! Larkbridge Server
//!
//! Lark/Feishu webhook bridge around `larkbridge_core`. Events arrive on
//! `/api/lark_callback`, are filtered and acknowledged at once, and the
//! conversation runs on a worker pool before the reply is posted back.
//!
//! ```text
//! webhook ──► WorkerPool ──► job::process_message
//!                               │
//!                               ├── ChatStore (history, settings)
//!                               ├── ConversationLoop ──► ToolRegistry
//!                               └── ChatPlatform (placeholder, reply)
//! ```

pub mod commands;
pub mod error;
pub mod job;
pub mod lark;
pub mod postprocess;
pub mod prompts;
pub mod state;
pub mod store;
pub mod webhook;
pub mod worker;

use std::path::Path;
use std::sync::Arc;

use larkbridge_core::{ConversationLoop, GenaiProvider, RmcpConnector, Settings, SharedLogger, ToolRegistry, TracingLogger};
use tracing::{error, info};

pub use error::{JobError, LarkError, LarkResult, PoolClosed, ServerError, ServerResult};
pub use lark::{ChatPlatform, LarkClient};
pub use state::{AppState, SharedState};
pub use store::ChatStore;
pub use worker::WorkerPool;

/// Settings from file and environment, with an optional port override
pub fn load_settings(config: Option<&Path>, port: Option<u16>) -> ServerResult<Settings> {
    let mut settings = Settings::load(config)?;
    if let Some(port) = port {
        settings.server.port = port;
    }
    Ok(settings)
}

/// Connect tool servers, serve the webhook until Ctrl-C, then drain and disconnect
pub async fn serve(settings: Settings) -> ServerResult<()> {
    let logger: SharedLogger = Arc::new(TracingLogger::new());

    let store = Arc::new(ChatStore::new());
    if settings.chat.clear_on_startup {
        store.clear();
        info!("chat store cleared on startup");
    }

    let registry = Arc::new(ToolRegistry::from_settings(
        &settings.mcp,
        Arc::new(RmcpConnector::new(logger.clone())),
        logger.clone(),
    ));
    registry.startup(&settings.mcp.servers).await;

    let conversation = ConversationLoop::from_settings(
        &settings.model,
        Arc::new(GenaiProvider::new(logger.clone())),
        registry.clone(),
        logger,
    );
    let platform = Arc::new(LarkClient::new(settings.lark.clone(), store.clone())?);
    let prompts = prompts::PromptBook::load(&settings.prompts_dir);

    let addr = format!("{}:{}", settings.server.host, settings.server.port);
    let state = Arc::new(AppState::new(settings, store, prompts, platform, conversation));

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(
        addr = %addr,
        tools = registry.tool_count(),
        workers = state.pool.size(),
        "listening"
    );

    axum::serve(listener, webhook::router(state.clone()))
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("shutting down, draining queued jobs");
    state.pool.shutdown().await;
    registry.shutdown().await;
    info!("stopped");
    Ok(())
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!(error = %e, "failed to listen for Ctrl-C");
    }
}
