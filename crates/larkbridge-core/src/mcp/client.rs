//! One connection to one remote tool server

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Map, Value};

use crate::config::ToolServerConfig;
use crate::logging::Logger;
use crate::types::{ToolDescriptor, ToolOutput};
use crate::{log_debug, log_error, log_info, log_warn};

use super::error::{McpError, McpResult};
use super::session::{ToolConnector, ToolSession};

/// Client for a single configured tool server
///
/// Owns the session and the tool list discovered over it. `connect` never
/// fails: an unreachable server simply ends up with no tools.
pub struct ToolClient {
    server: ToolServerConfig,
    connector: Arc<dyn ToolConnector>,
    connect_timeout: Duration,
    session: Option<Box<dyn ToolSession>>,
    tools: Vec<ToolDescriptor>,
    logger: Arc<dyn Logger>,
}

impl ToolClient {
    /// Create an unconnected client
    pub fn new(
        server: ToolServerConfig,
        connector: Arc<dyn ToolConnector>,
        connect_timeout: Duration,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            server,
            connector,
            connect_timeout,
            session: None,
            tools: Vec::new(),
            logger,
        }
    }

    /// Server URL
    pub fn url(&self) -> &str {
        &self.server.url
    }

    /// Tools discovered on the last successful connect
    pub fn tools(&self) -> &[ToolDescriptor] {
        &self.tools
    }

    pub fn is_connected(&self) -> bool {
        self.session.is_some()
    }

    pub fn has_tool(&self, name: &str) -> bool {
        self.tools.iter().any(|t| t.name == name)
    }

    /// Handshake and discover the tool catalog, bounded by the connect timeout
    ///
    /// Failures are logged and leave the tool list empty. Calling it again
    /// closes the previous session and replaces the list.
    pub async fn connect(&mut self) {
        if let Some(previous) = self.session.take() {
            if let Err(e) = previous.close().await {
                log_warn!(self.logger, "[ToolClient] Closing previous session to {} failed: {}", self.server.url, e);
            }
        }
        self.tools.clear();

        let connector = Arc::clone(&self.connector);
        let server = &self.server;
        let attempt = async move {
            let session = connector.connect(server).await?;
            match session.list_tools().await {
                Ok(tools) => Ok((session, tools)),
                Err(e) => {
                    let _ = session.close().await;
                    Err(e)
                }
            }
        };

        let outcome = tokio::time::timeout(self.connect_timeout, attempt).await;
        match outcome {
            Ok(Ok((session, tools))) => {
                let names: Vec<&str> = tools.iter().map(|t| t.name.as_str()).collect();
                log_info!(
                    self.logger,
                    "[ToolClient] Connected to {}, found tools: {:?}",
                    self.server.url,
                    names
                );
                self.session = Some(session);
                self.tools = tools;
            }
            Ok(Err(e)) => {
                log_error!(self.logger, "[ToolClient] Failed to connect to {}: {}", self.server.url, e);
            }
            Err(_) => {
                log_error!(
                    self.logger,
                    "[ToolClient] {}: {}",
                    self.server.url,
                    McpError::Timeout(self.connect_timeout)
                );
            }
        }
    }

    /// Invoke `tool_name` with structured arguments
    pub async fn call(&self, tool_name: &str, arguments: Map<String, Value>) -> McpResult<ToolOutput> {
        let session = self.session.as_ref().ok_or(McpError::NotConnected)?;

        if !self.has_tool(tool_name) {
            return Err(McpError::ToolNotFound {
                tool: tool_name.to_string(),
                server: self.server.url.clone(),
            });
        }

        log_debug!(
            self.logger,
            "[ToolClient] Calling tool '{}' on {} with args: {}",
            tool_name,
            self.server.url,
            Value::Object(arguments.clone())
        );

        let output = session.call_tool(tool_name, arguments).await?;

        log_debug!(self.logger, "[ToolClient] Tool '{}' result: {:?}", tool_name, output);

        Ok(output)
    }

    /// Release the session, if any
    pub async fn close(&self) {
        let Some(session) = self.session.as_ref() else {
            return;
        };
        match session.close().await {
            Ok(()) => log_info!(self.logger, "[ToolClient] Closed connection to {}", self.server.url),
            Err(e) => log_warn!(self.logger, "[ToolClient] Closing {} failed: {}", self.server.url, e),
        }
    }
}
