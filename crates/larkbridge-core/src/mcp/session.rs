//! Transport seam between a `ToolClient` and the wire

use async_trait::async_trait;
use serde_json::{Map, Value};

use crate::config::ToolServerConfig;
use crate::types::{ToolDescriptor, ToolOutput};

use super::error::McpResult;

/// A live, handshaken session with one tool server
#[async_trait]
pub trait ToolSession: Send + Sync {
    /// Fetch the server's full tool catalog
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>>;

    /// Invoke a tool with structured arguments
    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<ToolOutput>;

    /// Release the underlying transport. Calling it twice is a no-op.
    async fn close(&self) -> McpResult<()>;
}

/// Opens sessions to configured tool servers
#[async_trait]
pub trait ToolConnector: Send + Sync {
    /// Establish the transport and perform the protocol handshake
    async fn connect(&self, server: &ToolServerConfig) -> McpResult<Box<dyn ToolSession>>;
}
