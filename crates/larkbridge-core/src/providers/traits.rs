//! Provider trait definition

use std::time::Duration;

use async_trait::async_trait;

use crate::config::ModelSettings;
use crate::types::{ChatMessage, Tool, ToolCall};
use super::error::ProviderResult;

/// Model configuration for provider requests
#[derive(Debug, Clone)]
pub struct ProviderModelConfig {
    /// Model identifier as used by the provider's API
    pub model: String,
    /// API key for authentication
    pub api_key: Option<String>,
    /// Custom API base URL
    pub api_base: Option<String>,
}

impl ProviderModelConfig {
    /// Create a new model config
    pub fn new(model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            api_key: None,
            api_base: None,
        }
    }

    /// Set the API key
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the API base URL
    pub fn with_api_base(mut self, base: impl Into<String>) -> Self {
        self.api_base = Some(base.into());
        self
    }

    /// Credentials from settings, targeting the configured default model
    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            model: settings.default_model.clone(),
            api_key: settings.api_key.clone(),
            api_base: settings.base_url.clone(),
        }
    }

    /// Same credentials, different model
    pub fn for_model(&self, model: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            ..self.clone()
        }
    }
}

/// Sampling parameters and tool catalog for one completion request
#[derive(Debug, Clone)]
pub struct CompletionOptions {
    pub temperature: Option<f32>,
    pub top_p: Option<f32>,
    pub max_tokens: Option<u32>,
    /// Deadline for one backend call
    pub timeout: Duration,
    /// Tools advertised to the model; empty means none
    pub tools: Vec<Tool>,
}

impl Default for CompletionOptions {
    fn default() -> Self {
        Self {
            temperature: None,
            top_p: None,
            max_tokens: None,
            timeout: Duration::from_secs(60),
            tools: Vec::new(),
        }
    }
}

impl CompletionOptions {
    /// Create new options with defaults
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_settings(settings: &ModelSettings) -> Self {
        Self {
            temperature: Some(settings.temperature),
            top_p: Some(settings.top_p),
            max_tokens: settings.max_tokens,
            timeout: settings.timeout(),
            tools: Vec::new(),
        }
    }

    /// Set temperature
    pub fn with_temperature(mut self, temp: f32) -> Self {
        self.temperature = Some(temp);
        self
    }

    /// Set max tokens
    pub fn with_max_tokens(mut self, tokens: u32) -> Self {
        self.max_tokens = Some(tokens);
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Set tools
    pub fn with_tools(mut self, tools: Vec<Tool>) -> Self {
        self.tools = tools;
        self
    }
}

/// One reply from the model backend
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Completion {
    /// Reply text, absent when the model only requested tools
    pub content: Option<String>,
    /// Tool calls in the order the model listed them
    pub tool_calls: Vec<ToolCall>,
}

impl Completion {
    /// A plain text reply
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: Some(content.into()),
            tool_calls: Vec::new(),
        }
    }

    /// A reply requesting tool calls
    pub fn with_tool_calls(tool_calls: Vec<ToolCall>) -> Self {
        Self {
            content: None,
            tool_calls,
        }
    }

    pub fn has_tool_calls(&self) -> bool {
        !self.tool_calls.is_empty()
    }
}

/// Provider trait for LLM implementations
#[async_trait]
pub trait Provider: Send + Sync {
    /// Get the provider name (e.g., "genai", "mock")
    fn name(&self) -> &str;

    /// Run one non-streaming chat completion
    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &ProviderModelConfig,
        options: &CompletionOptions,
    ) -> ProviderResult<Completion>;
}
