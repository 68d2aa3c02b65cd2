//! Model backend
//!
//! `GenaiProvider` talks to real LLM APIs through the `genai` crate;
//! `MockProvider` replays scripted completions for tests.

mod traits;
mod error;
mod genai_adapter;
mod genai_provider;
mod mock;

pub use traits::{Completion, CompletionOptions, Provider, ProviderModelConfig};
pub use error::{ProviderError, ProviderResult};

pub use genai_provider::GenaiProvider;
pub use genai_adapter::normalize_api_base;

pub use mock::{MockProvider, MockStep, RecordedRequest};

