//! Tool registry: the fleet of tool clients and a single dispatch surface
//!
//! Startup connects every configured server concurrently, then merges the
//! discovered catalogs into a name → client routing table. The table is
//! rebuilt only by `startup` and read by every conversation.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use futures::future::join_all;
use parking_lot::RwLock;
use serde_json::{json, Map, Value};

use crate::config::{McpSettings, ToolServerConfig};
use crate::logging::Logger;
use crate::mcp::{ensure_no_additional_properties, ToolClient, ToolConnector};
use crate::types::{Tool, ToolDescriptor};
use crate::{log_error, log_info, log_warn};

impl From<&ToolDescriptor> for Tool {
    fn from(descriptor: &ToolDescriptor) -> Self {
        let schema = if descriptor.input_schema.is_object() {
            ensure_no_additional_properties(&descriptor.input_schema)
        } else {
            // Servers may omit the schema for no-argument tools
            ensure_no_additional_properties(&json!({ "type": "object", "properties": {} }))
        };
        Tool::new(descriptor.name.clone(), descriptor.description.clone()).with_parameters(schema)
    }
}

#[derive(Default)]
struct RegistryState {
    clients: Vec<Arc<ToolClient>>,
    routes: HashMap<String, Arc<ToolClient>>,
    catalog: Vec<Tool>,
}

/// Registry of tool servers and their merged catalog
pub struct ToolRegistry {
    connector: Arc<dyn ToolConnector>,
    connect_timeout: Duration,
    call_timeout: Duration,
    state: RwLock<RegistryState>,
    logger: Arc<dyn Logger>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new(
        connector: Arc<dyn ToolConnector>,
        connect_timeout: Duration,
        call_timeout: Duration,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self {
            connector,
            connect_timeout,
            call_timeout,
            state: RwLock::new(RegistryState::default()),
            logger,
        }
    }

    /// Create a registry using the timeouts from settings
    pub fn from_settings(
        settings: &McpSettings,
        connector: Arc<dyn ToolConnector>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::new(connector, settings.connect_timeout(), settings.call_timeout(), logger)
    }

    /// Connect to every configured server and build the routing table
    ///
    /// Servers connect concurrently; each is bounded by the connect timeout
    /// and a failed server simply contributes no tools. On a name collision
    /// the server listed first keeps the tool.
    pub async fn startup(&self, servers: &[ToolServerConfig]) {
        if servers.is_empty() {
            log_info!(self.logger, "[ToolRegistry] No tool servers configured");
            self.replace_state(RegistryState::default()).await;
            return;
        }

        log_info!(
            self.logger,
            "[ToolRegistry] Connecting to {} tool server(s)",
            servers.len()
        );

        let mut clients: Vec<ToolClient> = servers
            .iter()
            .map(|server| {
                ToolClient::new(
                    server.clone(),
                    Arc::clone(&self.connector),
                    self.connect_timeout,
                    Arc::clone(&self.logger),
                )
            })
            .collect();

        join_all(clients.iter_mut().map(|client| client.connect())).await;

        let state = self.merge(clients.into_iter().map(Arc::new).collect());
        log_info!(
            self.logger,
            "[ToolRegistry] {} tool(s) available from {} server(s)",
            state.catalog.len(),
            state.clients.iter().filter(|c| c.is_connected()).count()
        );
        self.replace_state(state).await;
    }

    /// Swap in a new routing table and close the clients it replaces
    async fn replace_state(&self, state: RegistryState) {
        let previous = std::mem::replace(&mut *self.state.write(), state).clients;
        if !previous.is_empty() {
            join_all(previous.iter().map(|client| client.close())).await;
            log_info!(self.logger, "[ToolRegistry] Closed {} previous tool server client(s)", previous.len());
        }
    }

    fn merge(&self, clients: Vec<Arc<ToolClient>>) -> RegistryState {
        let mut routes: HashMap<String, Arc<ToolClient>> = HashMap::new();
        let mut catalog = Vec::new();

        for client in &clients {
            for descriptor in client.tools() {
                if let Some(owner) = routes.get(&descriptor.name) {
                    log_warn!(
                        self.logger,
                        "[ToolRegistry] Tool name collision: '{}' from {} ignored, already provided by {}",
                        descriptor.name,
                        client.url(),
                        owner.url()
                    );
                    continue;
                }
                routes.insert(descriptor.name.clone(), Arc::clone(client));
                catalog.push(Tool::from(descriptor));
            }
        }

        RegistryState {
            clients,
            routes,
            catalog,
        }
    }

    /// Release every connection and empty the routing table
    ///
    /// Clients that never connected are skipped by `ToolClient::close`.
    pub async fn shutdown(&self) {
        let clients = std::mem::take(&mut *self.state.write()).clients;
        if clients.is_empty() {
            return;
        }
        join_all(clients.iter().map(|client| client.close())).await;
        log_info!(self.logger, "[ToolRegistry] Closed {} tool server client(s)", clients.len());
    }

    /// Merged catalog formatted for the model backend
    pub fn get_all_tools(&self) -> Vec<Tool> {
        self.state.read().catalog.clone()
    }

    pub fn tool_count(&self) -> usize {
        self.state.read().catalog.len()
    }

    /// URL of the server that owns `name`
    pub fn owner_of(&self, name: &str) -> Option<String> {
        self.state
            .read()
            .routes
            .get(name)
            .map(|client| client.url().to_string())
    }

    /// Dispatch a tool call by name
    ///
    /// Never fails: every fault is rendered as readable text so it can be fed
    /// back to the model as a tool turn.
    pub async fn call_tool(&self, name: &str, raw_arguments: &str) -> String {
        let client = self.state.read().routes.get(name).cloned();
        let Some(client) = client else {
            log_warn!(self.logger, "[ToolRegistry] Unknown tool requested: {}", name);
            return format!("Error: Tool '{}' not found.", name);
        };

        let arguments = match parse_arguments(raw_arguments) {
            Ok(arguments) => arguments,
            Err(ArgumentsError::InvalidJson(e)) => {
                log_warn!(
                    self.logger,
                    "[ToolRegistry] Invalid JSON arguments for '{}': {} ({})",
                    name,
                    raw_arguments,
                    e
                );
                return format!("Error: Invalid JSON arguments for tool '{}'.", name);
            }
            Err(ArgumentsError::NotAnObject) => {
                log_warn!(
                    self.logger,
                    "[ToolRegistry] Arguments for '{}' are not an object: {}",
                    name,
                    raw_arguments
                );
                return format!("Error: Arguments for tool '{}' must be a JSON object.", name);
            }
        };

        match tokio::time::timeout(self.call_timeout, client.call(name, arguments)).await {
            Ok(Ok(output)) => output.render(),
            Ok(Err(e)) => {
                log_error!(
                    self.logger,
                    "[ToolRegistry] Tool '{}' on {} failed: {:?}",
                    name,
                    client.url(),
                    e
                );
                format!("Error: An unexpected error occurred while calling tool '{}'.", name)
            }
            Err(_) => {
                log_error!(
                    self.logger,
                    "[ToolRegistry] Tool '{}' on {} timed out after {:?}",
                    name,
                    client.url(),
                    self.call_timeout
                );
                format!(
                    "Error: Tool '{}' timed out after {}s.",
                    name,
                    self.call_timeout.as_secs()
                )
            }
        }
    }
}

enum ArgumentsError {
    InvalidJson(serde_json::Error),
    NotAnObject,
}

/// Parse model-supplied argument text; blank and `null` mean no arguments
fn parse_arguments(raw: &str) -> Result<Map<String, Value>, ArgumentsError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Ok(Map::new());
    }
    match serde_json::from_str::<Value>(raw) {
        Ok(Value::Object(map)) => Ok(map),
        Ok(Value::Null) => Ok(Map::new()),
        Ok(_) => Err(ArgumentsError::NotAnObject),
        Err(e) => Err(ArgumentsError::InvalidJson(e)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::{LogLevel, MemoryLogger, NoOpLogger};
    use crate::mcp::{MockToolBehavior, MockToolConnector, MockToolServer};
    use crate::types::ContentBlock;

    fn registry(connector: Arc<MockToolConnector>, logger: Arc<dyn Logger>) -> ToolRegistry {
        ToolRegistry::new(connector, Duration::from_secs(5), Duration::from_secs(10), logger)
    }

    fn servers(urls: &[&str]) -> Vec<ToolServerConfig> {
        urls.iter().map(|u| ToolServerConfig::new(*u)).collect()
    }

    fn fleet() -> Arc<MockToolConnector> {
        let nested = ToolDescriptor::new(
            "plan",
            "Plan a trip",
            json!({
                "type": "object",
                "properties": {
                    "stops": {
                        "type": "array",
                        "items": { "type": "object", "properties": { "city": { "type": "string" } } }
                    }
                }
            }),
        );
        Arc::new(
            MockToolConnector::new()
                .with_server(
                    MockToolServer::new("http://a.local")
                        .with_text_tool("search", "from a")
                        .with_text_tool("lookup", "42"),
                )
                .with_server(
                    MockToolServer::new("http://b.local")
                        .with_text_tool("search", "from b")
                        .with_tool(nested, MockToolBehavior::EchoArgs)
                        .with_tool(
                            ToolDescriptor::new("notes", "Read notes", Value::Null),
                            MockToolBehavior::Blocks(vec![
                                ContentBlock::text("first"),
                                ContentBlock::Other { kind: "image".to_string() },
                                ContentBlock::text("second"),
                            ]),
                        )
                        .with_tool(
                            ToolDescriptor::new("explode", "Always fails", json!({"type": "object"})),
                            MockToolBehavior::Fail("kaboom".to_string()),
                        )
                        .with_tool(
                            ToolDescriptor::new("sleepy", "Slow tool", json!({"type": "object"})),
                            MockToolBehavior::Delay(Duration::from_secs(60), "late".to_string()),
                        ),
                )
                .with_server(MockToolServer::new("http://slow.local").with_connect_delay(Duration::from_secs(600)))
                .with_server(MockToolServer::new("http://down.local").failing()),
        )
    }

    #[tokio::test]
    async fn test_collision_first_registered_wins() {
        let logger = Arc::new(MemoryLogger::new());
        let connector = fleet();
        let registry = registry(connector.clone(), logger.clone());
        registry.startup(&servers(&["http://a.local", "http://b.local"])).await;

        assert_eq!(registry.owner_of("search").as_deref(), Some("http://a.local"));
        assert_eq!(registry.call_tool("search", r#"{"q":"x"}"#).await, "from a");
        assert_eq!(connector.calls()[0].server, "http://a.local");

        let warnings = logger.messages(LogLevel::Warn);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("'search'"));
        assert!(warnings[0].contains("http://b.local"));

        let names: Vec<String> = registry.get_all_tools().into_iter().map(|t| t.name).collect();
        assert_eq!(names, vec!["search", "lookup", "plan", "notes", "explode", "sleepy"]);
    }

    #[tokio::test]
    async fn test_catalog_schemas_are_normalized() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://b.local"])).await;

        let tools = registry.get_all_tools();
        let plan = tools.iter().find(|t| t.name == "plan").unwrap();
        assert_eq!(plan.parameters["additionalProperties"], json!(false));
        assert_eq!(
            plan.parameters["properties"]["stops"]["items"]["additionalProperties"],
            json!(false)
        );

        let notes = tools.iter().find(|t| t.name == "notes").unwrap();
        assert_eq!(notes.parameters["type"], "object");
        assert_eq!(notes.parameters["additionalProperties"], json!(false));
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://a.local"])).await;

        let result = registry.call_tool("teleport", "{}").await;
        assert_eq!(result, "Error: Tool 'teleport' not found.");
    }

    #[tokio::test]
    async fn test_argument_faults_are_distinct() {
        let connector = fleet();
        let registry = registry(connector.clone(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://a.local"])).await;

        let invalid = registry.call_tool("lookup", "{not json").await;
        assert_eq!(invalid, "Error: Invalid JSON arguments for tool 'lookup'.");

        let not_object = registry.call_tool("lookup", "[1, 2]").await;
        assert_eq!(not_object, "Error: Arguments for tool 'lookup' must be a JSON object.");
        assert_ne!(invalid, not_object);

        assert!(connector.calls().is_empty());
    }

    #[tokio::test]
    async fn test_blank_arguments_mean_empty_object() {
        let connector = fleet();
        let registry = registry(connector.clone(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://a.local"])).await;

        assert_eq!(registry.call_tool("lookup", "").await, "42");
        assert_eq!(registry.call_tool("lookup", " null ").await, "42");
        assert!(connector.calls().iter().all(|c| c.arguments.is_empty()));
    }

    #[tokio::test]
    async fn test_output_rendering() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://b.local"])).await;

        assert_eq!(registry.call_tool("notes", "{}").await, "first\nsecond");

        let echoed = registry
            .call_tool("plan", r#"{"stops":[{"city":"Oslo"}]}"#)
            .await;
        let parsed: Value = serde_json::from_str(&echoed).unwrap();
        assert_eq!(parsed, json!({"stops": [{"city": "Oslo"}]}));
        assert!(echoed.contains('\n'));
    }

    #[tokio::test]
    async fn test_execution_fault_is_generic_text() {
        let logger = Arc::new(MemoryLogger::new());
        let registry = registry(fleet(), logger.clone());
        registry.startup(&servers(&["http://b.local"])).await;

        let result = registry.call_tool("explode", "{}").await;
        assert_eq!(
            result,
            "Error: An unexpected error occurred while calling tool 'explode'."
        );
        assert!(logger
            .messages(LogLevel::Error)
            .iter()
            .any(|m| m.contains("kaboom")));
    }

    #[tokio::test(start_paused = true)]
    async fn test_call_timeout_is_text() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://b.local"])).await;

        let result = registry.call_tool("sleepy", "{}").await;
        assert_eq!(result, "Error: Tool 'sleepy' timed out after 10s.");
    }

    #[tokio::test]
    async fn test_zero_servers() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        registry.startup(&[]).await;

        assert!(registry.get_all_tools().is_empty());
        let result = registry.call_tool("search", "{}").await;
        assert!(result.contains("not found"));
        assert!(result.contains("search"));

        registry.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_and_broken_servers_do_not_block_startup() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        let started = tokio::time::Instant::now();
        registry
            .startup(&servers(&[
                "http://slow.local",
                "http://down.local",
                "http://a.local",
            ]))
            .await;

        assert!(started.elapsed() < Duration::from_secs(6));
        assert_eq!(registry.tool_count(), 2);
        assert_eq!(registry.owner_of("lookup").as_deref(), Some("http://a.local"));
        assert_eq!(registry.call_tool("lookup", "{}").await, "42");
    }

    #[tokio::test]
    async fn test_shutdown_closes_every_connected_session() {
        let connector = fleet();
        let registry = registry(connector.clone(), Arc::new(NoOpLogger));
        registry
            .startup(&servers(&["http://a.local", "http://b.local", "http://down.local"]))
            .await;
        registry.shutdown().await;

        assert_eq!(connector.closed_sessions("http://a.local"), 1);
        assert_eq!(connector.closed_sessions("http://b.local"), 1);
        assert_eq!(connector.closed_sessions("http://down.local"), 0);
        assert!(registry.get_all_tools().is_empty());

        // Second shutdown is a no-op
        registry.shutdown().await;
        assert_eq!(connector.closed_sessions("http://a.local"), 1);
    }

    #[tokio::test]
    async fn test_restart_replaces_routes() {
        let registry = registry(fleet(), Arc::new(NoOpLogger));
        registry.startup(&servers(&["http://a.local"])).await;
        registry.startup(&servers(&["http://b.local"])).await;

        assert_eq!(registry.owner_of("search").as_deref(), Some("http://b.local"));
        assert_eq!(registry.owner_of("lookup"), None);
    }

    #[tokio::test]
    async fn test_restart_closes_previous_sessions() {
        let connector = fleet();
        let registry = registry(connector.clone(), Arc::new(NoOpLogger));

        registry.startup(&servers(&["http://a.local"])).await;
        assert_eq!(connector.closed_sessions("http://a.local"), 0);

        registry.startup(&servers(&["http://b.local"])).await;
        assert_eq!(connector.closed_sessions("http://a.local"), 1);
        assert_eq!(connector.closed_sessions("http://b.local"), 0);

        registry.startup(&[]).await;
        assert_eq!(connector.closed_sessions("http://b.local"), 1);
        assert!(registry.get_all_tools().is_empty());
    }
}
