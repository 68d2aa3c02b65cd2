//! Tool management
//!
//! ```text
//! ┌──────────────────────────────────────────────┐
//! │  ToolRegistry                                │
//! │                                              │
//! │  - Connects all tool servers concurrently    │
//! │  - Merges catalogs (first registered wins)   │
//! │  - Advertises normalized schemas to the LLM  │
//! │  - Dispatches calls by name, errors as text  │
//! └──────────────────────────────────────────────┘
//!           │
//!           │ ToolClient (one per server)
//!           ▼
//! ┌──────────────────────────────────────────────┐
//! │  MCP servers (streamable HTTP)               │
//! └──────────────────────────────────────────────┘
//! ```

mod registry;

pub use registry::ToolRegistry;
