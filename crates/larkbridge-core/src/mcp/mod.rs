//! Tool server (MCP) connections
//!
//! A `ToolClient` owns one session to one configured server. Sessions come
//! from a `ToolConnector`: `RmcpConnector` speaks MCP streamable HTTP using
//! the official rmcp SDK, `MockToolConnector` serves in-memory catalogs for
//! tests.
//!
//! # Example
//!
//! ```rust,ignore
//! use larkbridge_core::mcp::{RmcpConnector, ToolClient};
//!
//! let connector = Arc::new(RmcpConnector::new(logger.clone()));
//! let mut client = ToolClient::new(server_config, connector, Duration::from_secs(10), logger);
//! client.connect().await;
//!
//! let output = client.call("search", args).await?;
//! ```

mod client;
mod error;
pub mod mock;
mod rmcp_connector;
mod schema;
mod session;

pub use client::ToolClient;
pub use error::{McpError, McpResult};
pub use mock::{MockToolBehavior, MockToolConnector, MockToolServer, RecordedCall};
pub use rmcp_connector::RmcpConnector;
pub use schema::ensure_no_additional_properties;
pub use session::{ToolConnector, ToolSession};
