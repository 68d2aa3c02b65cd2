//! GenaiProvider - model backend using the genai crate
//!
//! Requests always use the OpenAI-compatible protocol against the configured
//! endpoint; the model name is sent exactly as chosen.

use async_trait::async_trait;
use std::sync::Arc;

use genai::chat::ChatRequest;

use crate::logging::Logger;
use crate::types::ChatMessage;

use super::error::{ProviderError, ProviderResult};
use super::genai_adapter::{
    create_client, from_genai_response, to_genai_messages, to_genai_options, to_genai_tools,
};
use super::traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};

/// Provider backed by genai for all supported LLM APIs
pub struct GenaiProvider {
    logger: Arc<dyn Logger>,
}

impl GenaiProvider {
    pub fn new(logger: Arc<dyn Logger>) -> Self {
        Self { logger }
    }
}

#[async_trait]
impl Provider for GenaiProvider {
    fn name(&self) -> &str {
        "genai"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model_config: &ProviderModelConfig,
        options: &CompletionOptions,
    ) -> ProviderResult<Completion> {
        let model_name = model_config.model.as_str();
        self.logger.debug(&format!(
            "[GenaiProvider] complete: model={}, messages={}, tools={}",
            model_name,
            messages.len(),
            options.tools.len()
        ));

        let client = create_client(model_config);

        let mut chat_req = ChatRequest::new(to_genai_messages(messages)?);
        if !options.tools.is_empty() {
            chat_req = chat_req.with_tools(to_genai_tools(&options.tools));
        }

        let genai_options = to_genai_options(options);

        let response = client
            .exec_chat(model_name, chat_req, Some(&genai_options))
            .await
            .map_err(|e| {
                self.logger
                    .error(&format!("[GenaiProvider] Request failed: {}", e));
                ProviderError::api_error(model_name, e.to_string())
            })?;

        let completion = from_genai_response(&response);
        self.logger.debug(&format!(
            "[GenaiProvider] Reply: {} chars, {} tool call(s)",
            completion.content.as_deref().map(str::len).unwrap_or(0),
            completion.tool_calls.len()
        ));
        Ok(completion)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::logging::NoOpLogger;

    #[test]
    fn test_name() {
        let provider = GenaiProvider::new(Arc::new(NoOpLogger));
        assert_eq!(provider.name(), "genai");
    }
}
