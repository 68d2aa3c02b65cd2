//! Logger that forwards to `tracing`

use super::traits::Logger;

/// Forwards every message to the `tracing` macros under a fixed target
///
/// Hosts that install a `tracing` subscriber use this to get core logs in
/// the same stream as their own.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingLogger;

impl TracingLogger {
    pub fn new() -> Self {
        Self
    }
}

impl Logger for TracingLogger {
    fn debug(&self, message: &str) {
        tracing::debug!(target: "larkbridge_core", "{}", message);
    }

    fn info(&self, message: &str) {
        tracing::info!(target: "larkbridge_core", "{}", message);
    }

    fn warn(&self, message: &str) {
        tracing::warn!(target: "larkbridge_core", "{}", message);
    }

    fn error(&self, message: &str) {
        tracing::error!(target: "larkbridge_core", "{}", message);
    }
}
