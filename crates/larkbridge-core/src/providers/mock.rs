//! Mock provider for testing
//!
//! Replays a script of completions without network access and records every
//! request it receives.

use async_trait::async_trait;
use parking_lot::Mutex;
use std::collections::VecDeque;
use std::time::Duration;

use super::error::{ProviderError, ProviderResult};
use super::traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};
use crate::types::{ChatMessage, Tool};

/// One scripted reply
#[derive(Debug, Clone)]
pub enum MockStep {
    /// Return this completion
    Reply(Completion),
    /// Fail with an API error carrying this message
    Fail(String),
}

/// A request as the mock saw it
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub messages: Vec<ChatMessage>,
    pub model: String,
    pub tools: Vec<Tool>,
}

/// Scripted LLM provider for testing
#[derive(Default)]
pub struct MockProvider {
    script: Mutex<VecDeque<MockStep>>,
    requests: Mutex<Vec<RecordedRequest>>,
    delay: Option<Duration>,
}

impl MockProvider {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a provider that always answers with the same text
    pub fn fixed(response: impl Into<String>) -> Self {
        Self::new().then_reply(Completion::text(response))
    }

    /// Queue a completion
    pub fn then_reply(self, completion: Completion) -> Self {
        self.script.lock().push_back(MockStep::Reply(completion));
        self
    }

    /// Queue a failure
    pub fn then_fail(self, message: impl Into<String>) -> Self {
        self.script.lock().push_back(MockStep::Fail(message.into()));
        self
    }

    /// Sleep before every reply
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Requests received so far
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    fn next_step(&self) -> Option<MockStep> {
        let mut script = self.script.lock();
        // The last step repeats once the script runs dry
        if script.len() > 1 {
            script.pop_front()
        } else {
            script.front().cloned()
        }
    }
}

#[async_trait]
impl Provider for MockProvider {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        model: &ProviderModelConfig,
        options: &CompletionOptions,
    ) -> ProviderResult<Completion> {
        self.requests.lock().push(RecordedRequest {
            messages: messages.to_vec(),
            model: model.model.clone(),
            tools: options.tools.clone(),
        });

        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }

        match self.next_step() {
            Some(MockStep::Reply(completion)) => Ok(completion),
            Some(MockStep::Fail(message)) => Err(ProviderError::api_error("mock", message)),
            None => Err(ProviderError::Other("mock provider has no scripted replies".to_string())),
        }
    }
}
