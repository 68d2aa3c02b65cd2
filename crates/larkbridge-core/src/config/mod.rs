//! Configuration
//!
//! Sources, lowest precedence first:
//! - Built-in defaults
//! - YAML file (explicit path, or `~/.config/larkbridge/config.yaml`)
//! - Environment variables

mod env;
mod error;
mod file;
mod settings;

pub use error::{ConfigError, ConfigResult};
pub use file::default_config_path;
pub use settings::{
    ChatSettings, LarkSettings, McpSettings, ModelSettings, ServerSettings, Settings, ToolServerConfig,
};
