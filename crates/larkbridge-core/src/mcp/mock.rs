//! In-memory tool servers for testing
//!
//! Serves deterministic tool catalogs and results without network
//! dependencies, with optional slow or failing handshakes.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Map, Value};

use crate::config::ToolServerConfig;
use crate::types::{ContentBlock, ToolDescriptor, ToolOutput};

use super::error::{McpError, McpResult};
use super::session::{ToolConnector, ToolSession};

/// What a mock tool does when called
#[derive(Debug, Clone)]
pub enum MockToolBehavior {
    /// Return a fixed text value
    Text(String),
    /// Return content blocks
    Blocks(Vec<ContentBlock>),
    /// Return a structured value
    Json(Value),
    /// Return the received arguments as JSON
    EchoArgs,
    /// Fail with the given message
    Fail(String),
    /// Sleep, then return text
    Delay(Duration, String),
}

#[derive(Debug, Clone)]
struct MockTool {
    descriptor: ToolDescriptor,
    behavior: MockToolBehavior,
}

/// One fake tool server, addressed by URL
#[derive(Debug, Clone)]
pub struct MockToolServer {
    url: String,
    tools: Vec<MockTool>,
    connect_delay: Option<Duration>,
    fail_connect: bool,
}

impl MockToolServer {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            tools: Vec::new(),
            connect_delay: None,
            fail_connect: false,
        }
    }

    /// Add a tool with an explicit descriptor
    pub fn with_tool(mut self, descriptor: ToolDescriptor, behavior: MockToolBehavior) -> Self {
        self.tools.push(MockTool { descriptor, behavior });
        self
    }

    /// Add a tool taking a single string `q` that always returns `text`
    pub fn with_text_tool(self, name: &str, text: &str) -> Self {
        let descriptor = ToolDescriptor::new(
            name,
            format!("Mock tool {}", name),
            json!({
                "type": "object",
                "properties": { "q": { "type": "string" } }
            }),
        );
        self.with_tool(descriptor, MockToolBehavior::Text(text.to_string()))
    }

    /// Delay the handshake
    pub fn with_connect_delay(mut self, delay: Duration) -> Self {
        self.connect_delay = Some(delay);
        self
    }

    /// Refuse every handshake
    pub fn failing(mut self) -> Self {
        self.fail_connect = true;
        self
    }
}

/// A call observed by the mock
#[derive(Debug, Clone, PartialEq)]
pub struct RecordedCall {
    pub server: String,
    pub tool: String,
    pub arguments: Map<String, Value>,
}

/// Connector that hands out sessions to `MockToolServer`s
#[derive(Default)]
pub struct MockToolConnector {
    servers: HashMap<String, MockToolServer>,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    closed: Arc<Mutex<HashMap<String, usize>>>,
}

impl MockToolConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_server(mut self, server: MockToolServer) -> Self {
        self.servers.insert(server.url.clone(), server);
        self
    }

    /// Every tool call made through any session, in order
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// How many sessions to `url` have been closed
    pub fn closed_sessions(&self, url: &str) -> usize {
        self.closed.lock().get(url).copied().unwrap_or(0)
    }
}

#[async_trait]
impl ToolConnector for MockToolConnector {
    async fn connect(&self, server: &ToolServerConfig) -> McpResult<Box<dyn ToolSession>> {
        let mock = self
            .servers
            .get(&server.url)
            .cloned()
            .ok_or_else(|| McpError::ConnectionFailed(format!("no route to {}", server.url)))?;

        if let Some(delay) = mock.connect_delay {
            tokio::time::sleep(delay).await;
        }
        if mock.fail_connect {
            return Err(McpError::InitializationFailed(format!("{} refused the handshake", server.url)));
        }

        Ok(Box::new(MockSession {
            server: mock,
            calls: Arc::clone(&self.calls),
            closed: Arc::clone(&self.closed),
            is_closed: AtomicBool::new(false),
        }))
    }
}

struct MockSession {
    server: MockToolServer,
    calls: Arc<Mutex<Vec<RecordedCall>>>,
    closed: Arc<Mutex<HashMap<String, usize>>>,
    is_closed: AtomicBool,
}

#[async_trait]
impl ToolSession for MockSession {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        Ok(self.server.tools.iter().map(|t| t.descriptor.clone()).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<ToolOutput> {
        if self.is_closed.load(Ordering::SeqCst) {
            return Err(McpError::NotConnected);
        }

        self.calls.lock().push(RecordedCall {
            server: self.server.url.clone(),
            tool: name.to_string(),
            arguments: arguments.clone(),
        });

        let tool = self
            .server
            .tools
            .iter()
            .find(|t| t.descriptor.name == name)
            .ok_or_else(|| McpError::Protocol(format!("unknown tool {}", name)))?;

        match &tool.behavior {
            MockToolBehavior::Text(text) => Ok(ToolOutput::Text(text.clone())),
            MockToolBehavior::Blocks(blocks) => Ok(ToolOutput::Blocks(blocks.clone())),
            MockToolBehavior::Json(value) => Ok(ToolOutput::Json(value.clone())),
            MockToolBehavior::EchoArgs => Ok(ToolOutput::Json(Value::Object(arguments))),
            MockToolBehavior::Fail(message) => Err(McpError::ToolCallFailed(message.clone())),
            MockToolBehavior::Delay(delay, text) => {
                tokio::time::sleep(*delay).await;
                Ok(ToolOutput::Text(text.clone()))
            }
        }
    }

    async fn close(&self) -> McpResult<()> {
        if !self.is_closed.swap(true, Ordering::SeqCst) {
            *self.closed.lock().entry(self.server.url.clone()).or_insert(0) += 1;
        }
        Ok(())
    }
}
