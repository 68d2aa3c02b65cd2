//! The tool-augmented conversation loop

use std::sync::Arc;

use crate::config::ModelSettings;
use crate::logging::Logger;
use crate::providers::{Completion, CompletionOptions, Provider, ProviderModelConfig};
use crate::tools::ToolRegistry;
use crate::types::{ChatMessage, ToolCall};
use crate::{log_debug, log_info, log_warn};

use super::error::{ConversationError, ConversationResult};

/// Answer used when the model replies with no text
pub const FALLBACK_ANSWER: &str = "I'm not sure how to respond to that.";

/// Result of one loop run
#[derive(Debug, Clone)]
pub struct ConversationOutcome {
    /// Final answer text, never empty
    pub answer: String,
    /// Working list: the initial messages, every tool exchange, and the
    /// terminal assistant turn
    pub transcript: Vec<ChatMessage>,
    /// Number of tool rounds executed
    pub tool_rounds: u32,
}

enum State {
    Request,
    Decide(Completion),
    Execute(Vec<ToolCall>),
    Done(String),
}

/// Drives the exchange with the model backend until it answers in plain text
pub struct ConversationLoop {
    provider: Arc<dyn Provider>,
    registry: Arc<ToolRegistry>,
    backend: ProviderModelConfig,
    options: CompletionOptions,
    max_tool_rounds: Option<u32>,
    logger: Arc<dyn Logger>,
}

impl ConversationLoop {
    pub fn new(provider: Arc<dyn Provider>, registry: Arc<ToolRegistry>, logger: Arc<dyn Logger>) -> Self {
        Self {
            provider,
            registry,
            backend: ProviderModelConfig::new(""),
            options: CompletionOptions::default(),
            max_tool_rounds: None,
            logger,
        }
    }

    /// Credentials, sampling parameters and round guard from settings
    pub fn from_settings(
        settings: &ModelSettings,
        provider: Arc<dyn Provider>,
        registry: Arc<ToolRegistry>,
        logger: Arc<dyn Logger>,
    ) -> Self {
        Self::new(provider, registry, logger)
            .with_backend(ProviderModelConfig::from_settings(settings))
            .with_options(CompletionOptions::from_settings(settings))
            .with_max_tool_rounds(settings.tool_round_limit())
    }

    /// Credentials and endpoint; the model name is chosen per run
    pub fn with_backend(mut self, backend: ProviderModelConfig) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_options(mut self, options: CompletionOptions) -> Self {
        self.options = options;
        self
    }

    /// `None` lets the model request tools indefinitely
    pub fn with_max_tool_rounds(mut self, limit: Option<u32>) -> Self {
        self.max_tool_rounds = limit;
        self
    }

    /// Run to completion and return the final answer
    pub async fn run(&self, messages: Vec<ChatMessage>, model: &str) -> ConversationResult<String> {
        Ok(self.run_with_transcript(messages, model).await?.answer)
    }

    /// Run to completion, keeping the full working list
    pub async fn run_with_transcript(
        &self,
        messages: Vec<ChatMessage>,
        model: &str,
    ) -> ConversationResult<ConversationOutcome> {
        let model = self.backend.for_model(model);
        let options = self.options.clone().with_tools(self.registry.get_all_tools());
        log_debug!(
            self.logger,
            "[ConversationLoop] Starting: model={}, {} message(s), {} tool(s)",
            model.model,
            messages.len(),
            options.tools.len()
        );

        let mut transcript = messages;
        let mut rounds = 0u32;
        let mut state = State::Request;

        loop {
            state = match state {
                State::Request => State::Decide(self.request(&transcript, &model, &options).await?),
                State::Decide(completion) if !completion.has_tool_calls() => {
                    let answer = completion
                        .content
                        .filter(|text| !text.trim().is_empty())
                        .unwrap_or_else(|| {
                            log_warn!(self.logger, "[ConversationLoop] Empty reply, using fallback answer");
                            FALLBACK_ANSWER.to_string()
                        });
                    State::Done(answer)
                }
                State::Decide(completion) => {
                    if let Some(limit) = self.max_tool_rounds {
                        if rounds >= limit {
                            return Err(ConversationError::ToolRoundLimit(limit));
                        }
                    }
                    rounds += 1;

                    let calls = completion.tool_calls.clone();
                    transcript.push(ChatMessage::assistant_with_tool_calls(
                        completion.content.unwrap_or_default(),
                        completion.tool_calls,
                    ));
                    State::Execute(calls)
                }
                State::Execute(calls) => {
                    for call in &calls {
                        log_info!(
                            self.logger,
                            "[ConversationLoop] Round {}: calling '{}' ({})",
                            rounds,
                            call.name,
                            call.id
                        );
                        let result = self.registry.call_tool(&call.name, &call.arguments).await;
                        transcript.push(ChatMessage::tool(call.id.clone(), call.name.clone(), result));
                    }
                    State::Request
                }
                State::Done(answer) => {
                    transcript.push(ChatMessage::assistant(answer.clone()));
                    log_debug!(
                        self.logger,
                        "[ConversationLoop] Done after {} tool round(s)",
                        rounds
                    );
                    return Ok(ConversationOutcome {
                        answer,
                        transcript,
                        tool_rounds: rounds,
                    });
                }
            };
        }
    }

    async fn request(
        &self,
        transcript: &[ChatMessage],
        model: &ProviderModelConfig,
        options: &CompletionOptions,
    ) -> ConversationResult<Completion> {
        match tokio::time::timeout(options.timeout, self.provider.complete(transcript, model, options)).await {
            Ok(result) => Ok(result?),
            Err(_) => Err(ConversationError::Timeout(options.timeout)),
        }
    }
}
