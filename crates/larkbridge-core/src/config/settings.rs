//! Process settings

use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// One configured tool server
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ToolServerConfig {
    /// Streamable HTTP endpoint
    pub url: String,
    /// Optional bearer token sent as `Authorization: Bearer <token>`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

impl ToolServerConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: None,
        }
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }
}

impl fmt::Debug for ToolServerConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolServerConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// Top-level settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub lark: LarkSettings,
    pub model: ModelSettings,
    pub mcp: McpSettings,
    pub chat: ChatSettings,
    pub server: ServerSettings,
    /// Directory holding `<role>.txt` system prompts
    pub prompts_dir: PathBuf,
    /// Verbose logging and error details in chat replies
    pub debug_mode: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            lark: LarkSettings::default(),
            model: ModelSettings::default(),
            mcp: McpSettings::default(),
            chat: ChatSettings::default(),
            server: ServerSettings::default(),
            prompts_dir: PathBuf::from("prompts"),
            debug_mode: false,
        }
    }
}

/// Chat platform credentials
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LarkSettings {
    pub app_id: String,
    pub app_secret: String,
    pub verification_token: String,
    pub base_url: String,
}

impl Default for LarkSettings {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            app_secret: String::new(),
            verification_token: String::new(),
            base_url: "https://open.feishu.cn".to_string(),
        }
    }
}

/// Model backend parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ModelSettings {
    pub api_key: Option<String>,
    /// OpenAI-compatible endpoint; when unset the model name picks the provider
    pub base_url: Option<String>,
    pub default_model: String,
    pub temperature: f32,
    pub top_p: f32,
    /// `None` leaves the limit to the backend
    pub max_tokens: Option<u32>,
    pub timeout_secs: u64,
    /// Tool rounds allowed per message; 0 means unbounded
    pub max_tool_rounds: u32,
}

impl Default for ModelSettings {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: None,
            default_model: "gpt-4-turbo".to_string(),
            temperature: 0.7,
            top_p: 1.0,
            max_tokens: Some(4096),
            timeout_secs: 60,
            max_tool_rounds: 16,
        }
    }
}

impl ModelSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn tool_round_limit(&self) -> Option<u32> {
        (self.max_tool_rounds > 0).then_some(self.max_tool_rounds)
    }
}

/// Tool server fleet
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct McpSettings {
    pub servers: Vec<ToolServerConfig>,
    pub connect_timeout_secs: u64,
    pub call_timeout_secs: u64,
}

impl Default for McpSettings {
    fn default() -> Self {
        Self {
            servers: Vec::new(),
            connect_timeout_secs: 10,
            call_timeout_secs: 60,
        }
    }
}

impl McpSettings {
    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_secs)
    }
}

/// Conversation bookkeeping
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ChatSettings {
    /// Exchanges (user + assistant pairs) kept in history
    pub context_max_messages: usize,
    pub max_message_age_secs: u64,
    pub enable_send_and_replace: bool,
    pub placeholder_message: String,
    pub default_role: String,
    pub clear_on_startup: bool,
}

impl Default for ChatSettings {
    fn default() -> Self {
        Self {
            context_max_messages: 20,
            max_message_age_secs: 300,
            enable_send_and_replace: true,
            placeholder_message: "Thinking, please wait...".to_string(),
            default_role: "default".to_string(),
            clear_on_startup: false,
        }
    }
}

/// HTTP listener and worker pool
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: usize,
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 5001,
            workers: 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_documented_values() {
        let settings = Settings::default();
        assert_eq!(settings.model.default_model, "gpt-4-turbo");
        assert_eq!(settings.model.timeout(), Duration::from_secs(60));
        assert_eq!(settings.model.max_tokens, Some(4096));
        assert_eq!(settings.mcp.connect_timeout(), Duration::from_secs(10));
        assert!(settings.mcp.servers.is_empty());
        assert_eq!(settings.chat.context_max_messages, 20);
        assert_eq!(settings.server.port, 5001);
    }

    #[test]
    fn test_tool_round_limit_zero_is_unbounded() {
        let mut model = ModelSettings::default();
        assert_eq!(model.tool_round_limit(), Some(16));
        model.max_tool_rounds = 0;
        assert_eq!(model.tool_round_limit(), None);
    }

    #[test]
    fn test_debug_redacts_token() {
        let server = ToolServerConfig::new("http://tools.local").with_token("s3cret");
        let rendered = format!("{:?}", server);
        assert!(rendered.contains("<redacted>"));
        assert!(!rendered.contains("s3cret"));
    }
}
