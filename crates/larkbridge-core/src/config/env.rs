//! Environment variable overrides

use std::str::FromStr;

use super::error::{ConfigError, ConfigResult};
use super::settings::{Settings, ToolServerConfig};

impl Settings {
    /// Apply overrides from the environment
    ///
    /// `lookup` maps a variable name to its value; empty values are ignored.
    /// Values that fail to parse are reported rather than skipped.
    pub fn apply_env<F>(&mut self, lookup: F) -> ConfigResult<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        if let Some(v) = get("LARK_APP_ID") {
            self.lark.app_id = v;
        }
        if let Some(v) = get("LARK_APP_SECRET") {
            self.lark.app_secret = v;
        }
        if let Some(v) = get("LARK_VERIFICATION_TOKEN") {
            self.lark.verification_token = v;
        }
        if let Some(v) = get("LARK_BASE_URL") {
            self.lark.base_url = v;
        }

        if let Some(v) = get("OPENAI_API_KEY") {
            self.model.api_key = Some(v);
        }
        if let Some(v) = get("OPENAI_BASE_URL") {
            self.model.base_url = Some(v);
        }
        if let Some(v) = get("OPENAI_MODEL") {
            self.model.default_model = v;
        }
        if let Some(v) = get("OPENAI_API_TIMEOUT") {
            self.model.timeout_secs = parse("OPENAI_API_TIMEOUT", &v)?;
        }
        if let Some(v) = get("OPENAI_TEMPERATURE") {
            self.model.temperature = parse("OPENAI_TEMPERATURE", &v)?;
        }
        if let Some(v) = get("OPENAI_TOP_P") {
            self.model.top_p = parse("OPENAI_TOP_P", &v)?;
        }
        if let Some(v) = get("OPENAI_MAX_TOKENS") {
            let max: u32 = parse("OPENAI_MAX_TOKENS", &v)?;
            self.model.max_tokens = (max > 0).then_some(max);
        }
        if let Some(v) = get("MAX_TOOL_ROUNDS") {
            self.model.max_tool_rounds = parse("MAX_TOOL_ROUNDS", &v)?;
        }

        if let Some(v) = get("MCP_SERVERS") {
            self.mcp.servers = serde_json::from_str::<Vec<ToolServerConfig>>(&v).map_err(|e| {
                ConfigError::InvalidValue {
                    key: "MCP_SERVERS".to_string(),
                    value: v.clone(),
                    reason: e.to_string(),
                }
            })?;
        }
        if let Some(v) = get("MCP_CONNECT_TIMEOUT") {
            self.mcp.connect_timeout_secs = parse("MCP_CONNECT_TIMEOUT", &v)?;
        }
        if let Some(v) = get("MCP_CALL_TIMEOUT") {
            self.mcp.call_timeout_secs = parse("MCP_CALL_TIMEOUT", &v)?;
        }

        if let Some(v) = get("CHAT_CONTEXT_MAX_MESSAGES") {
            self.chat.context_max_messages = parse("CHAT_CONTEXT_MAX_MESSAGES", &v)?;
        }
        if let Some(v) = get("MAX_MESSAGE_AGE_SECONDS") {
            self.chat.max_message_age_secs = parse("MAX_MESSAGE_AGE_SECONDS", &v)?;
        }
        if let Some(v) = get("ENABLE_SEND_AND_REPLACE") {
            self.chat.enable_send_and_replace = parse_bool("ENABLE_SEND_AND_REPLACE", &v)?;
        }
        if let Some(v) = get("PLACEHOLDER_MESSAGE") {
            self.chat.placeholder_message = v;
        }
        if let Some(v) = get("DEFAULT_ROLE") {
            self.chat.default_role = v;
        }
        if let Some(v) = get("CLEAR_REDIS_ON_STARTUP") {
            self.chat.clear_on_startup = parse_bool("CLEAR_REDIS_ON_STARTUP", &v)?;
        }

        if let Some(v) = get("SERVER_HOST") {
            self.server.host = v;
        }
        if let Some(v) = get("SERVER_PORT") {
            self.server.port = parse("SERVER_PORT", &v)?;
        }
        if let Some(v) = get("WORKER_COUNT") {
            self.server.workers = parse("WORKER_COUNT", &v)?;
        }

        if let Some(v) = get("PROMPTS_DIR") {
            self.prompts_dir = v.into();
        }
        if let Some(v) = get("DEBUG_MODE") {
            self.debug_mode = parse_bool("DEBUG_MODE", &v)?;
        }

        Ok(())
    }
}

fn parse<T>(key: &str, value: &str) -> ConfigResult<T>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    value.trim().parse::<T>().map_err(|e| ConfigError::InvalidValue {
        key: key.to_string(),
        value: value.to_string(),
        reason: e.to_string(),
    })
}

fn parse_bool(key: &str, value: &str) -> ConfigResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(ConfigError::InvalidValue {
            key: key.to_string(),
            value: value.to_string(),
            reason: "expected a boolean".to_string(),
        }),
    }
}
