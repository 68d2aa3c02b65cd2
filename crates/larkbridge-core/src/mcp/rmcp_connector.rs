//! MCP streamable HTTP transport using the official rmcp SDK

use std::sync::Arc;

use async_trait::async_trait;
use rmcp::{
    ServiceExt,
    model::{CallToolRequestParams, CallToolResult, ClientCapabilities, ClientInfo, Implementation, RawContent, Tool},
    service::RunningService,
    transport::{StreamableHttpClientTransport, streamable_http_client::StreamableHttpClientTransportConfig},
    RoleClient,
};
use serde_json::{Map, Value};
use tokio::sync::RwLock;

use crate::config::ToolServerConfig;
use crate::log_info;
use crate::logging::Logger;
use crate::types::{ContentBlock, ToolDescriptor, ToolOutput};

use super::error::{McpError, McpResult};
use super::session::{ToolConnector, ToolSession};

/// Connects to MCP servers over streamable HTTP
pub struct RmcpConnector {
    logger: Arc<dyn Logger>,
}

impl RmcpConnector {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }

    fn client_info() -> ClientInfo {
        ClientInfo {
            meta: None,
            protocol_version: Default::default(),
            capabilities: ClientCapabilities::default(),
            client_info: Implementation {
                name: "larkbridge".to_string(),
                title: Some("Larkbridge".to_string()),
                version: env!("CARGO_PKG_VERSION").to_string(),
                website_url: None,
                icons: None,
            },
        }
    }
}

#[async_trait]
impl ToolConnector for RmcpConnector {
    async fn connect(&self, server: &ToolServerConfig) -> McpResult<Box<dyn ToolSession>> {
        let transport = match server.token.as_deref() {
            Some(token) => {
                log_info!(self.logger, "[McpClient] Connecting to {} with bearer token", server.url);
                let mut config = StreamableHttpClientTransportConfig::with_uri(server.url.as_str());
                config.auth_header = Some(token.to_string());
                StreamableHttpClientTransport::from_config(config)
            }
            None => {
                log_info!(self.logger, "[McpClient] Connecting to {} without authentication", server.url);
                StreamableHttpClientTransport::from_uri(server.url.as_str())
            }
        };

        let service = Self::client_info()
            .serve(transport)
            .await
            .map_err(|e| McpError::InitializationFailed(e.to_string()))?;

        log_info!(self.logger, "[McpClient] Handshake with {} complete", server.url);

        Ok(Box::new(RmcpSession {
            service: RwLock::new(Some(service)),
        }))
    }
}

/// A running rmcp client service
struct RmcpSession {
    /// Taken on close
    service: RwLock<Option<RunningService<RoleClient, ClientInfo>>>,
}

#[async_trait]
impl ToolSession for RmcpSession {
    async fn list_tools(&self) -> McpResult<Vec<ToolDescriptor>> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or(McpError::NotConnected)?;

        let tools = service
            .list_all_tools()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;

        Ok(tools.into_iter().map(descriptor_from_rmcp).collect())
    }

    async fn call_tool(&self, name: &str, arguments: Map<String, Value>) -> McpResult<ToolOutput> {
        let guard = self.service.read().await;
        let service = guard.as_ref().ok_or(McpError::NotConnected)?;

        let params = CallToolRequestParams {
            meta: None,
            name: name.to_owned().into(),
            arguments: Some(arguments),
            task: None,
        };

        let result = service
            .call_tool(params)
            .await
            .map_err(|e| McpError::ToolCallFailed(e.to_string()))?;

        Ok(output_from_rmcp(result))
    }

    async fn close(&self) -> McpResult<()> {
        let Some(service) = self.service.write().await.take() else {
            return Ok(());
        };
        service
            .cancel()
            .await
            .map_err(|e| McpError::Protocol(e.to_string()))?;
        Ok(())
    }
}

fn descriptor_from_rmcp(tool: Tool) -> ToolDescriptor {
    ToolDescriptor {
        name: tool.name.to_string(),
        description: tool.description.map(|d| d.to_string()).unwrap_or_default(),
        // input_schema is Arc<JsonObject>
        input_schema: Value::Object(tool.input_schema.as_ref().clone()),
    }
}

/// Content blocks win; a result with only structured content is passed on as JSON
fn output_from_rmcp(result: CallToolResult) -> ToolOutput {
    if result.content.is_empty() {
        if let Some(structured) = result.structured_content {
            return ToolOutput::Json(structured);
        }
    }

    let blocks = result
        .content
        .iter()
        .map(|c| match &c.raw {
            RawContent::Text(t) => ContentBlock::text(t.text.clone()),
            RawContent::Image(_) => ContentBlock::Other { kind: "image".to_string() },
            _ => ContentBlock::Other { kind: "other".to_string() },
        })
        .collect();

    ToolOutput::Blocks(blocks)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rmcp::model::{Content, JsonObject};
    use serde_json::json;

    #[test]
    fn test_text_and_image_become_blocks() {
        let result = CallToolResult::success(vec![
            Content::text("first"),
            Content::image("aGVsbG8=", "image/png"),
            Content::text("second"),
        ]);

        let output = output_from_rmcp(result);
        assert_eq!(
            output,
            ToolOutput::Blocks(vec![
                ContentBlock::text("first"),
                ContentBlock::Other { kind: "image".to_string() },
                ContentBlock::text("second"),
            ])
        );
        assert_eq!(output.render(), "first\nsecond");
    }

    #[test]
    fn test_structured_only_result_becomes_json() {
        let mut result = CallToolResult::structured(json!({"temperature": 21}));
        result.content.clear();

        let output = output_from_rmcp(result);
        assert_eq!(output, ToolOutput::Json(json!({"temperature": 21})));
        assert!(output.render().contains("\"temperature\": 21"));
    }

    #[test]
    fn test_content_wins_over_structured() {
        let result = CallToolResult::structured(json!({"temperature": 21}));
        let output = output_from_rmcp(result);
        assert!(matches!(output, ToolOutput::Blocks(_)));
    }

    #[test]
    fn test_descriptor_mapping() {
        let mut schema = JsonObject::new();
        schema.insert("type".to_string(), json!("object"));
        schema.insert("properties".to_string(), json!({"q": {"type": "string"}}));

        let mut tool = Tool::new("search", "Search the docs", Arc::new(schema));
        let descriptor = descriptor_from_rmcp(tool.clone());
        assert_eq!(descriptor.name, "search");
        assert_eq!(descriptor.description, "Search the docs");
        assert_eq!(descriptor.input_schema["properties"]["q"]["type"], "string");

        tool.description = None;
        assert_eq!(descriptor_from_rmcp(tool).description, "");
    }
}
