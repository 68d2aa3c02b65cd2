//! Adapter between larkbridge-core types and genai types
//!
//! Every model goes to the configured OpenAI-compatible endpoint (OpenAI
//! itself by default) with the key from settings.

use genai::chat::{
    ChatMessage as GenaiMessage, ChatOptions as GenaiOptions, ChatResponse, ContentPart, MessageContent,
    Tool as GenaiTool, ToolCall as GenaiToolCall, ToolResponse as GenaiToolResponse,
};
use genai::resolver::{AuthData, Endpoint, ServiceTargetResolver};
use genai::{adapter::AdapterKind, Client, ModelIden, ServiceTarget};
use serde_json::{json, Value};

use crate::types::{ChatMessage, MessageRole, Tool, ToolCall};

use super::error::ProviderResult;
use super::traits::{Completion, CompletionOptions, ProviderModelConfig};

// ============================================================================
// Message Conversion: larkbridge -> genai
// ============================================================================

/// Convert one of our tool calls into genai's representation
///
/// Arguments stay opaque text on our side; genai wants a JSON value, so text
/// that does not parse is passed through as a JSON string.
pub fn to_genai_tool_call(call: &ToolCall) -> ProviderResult<GenaiToolCall> {
    let arguments = serde_json::from_str::<Value>(&call.arguments)
        .unwrap_or_else(|_| Value::String(call.arguments.clone()));
    let tool_call = serde_json::from_value(json!({
        "call_id": call.id,
        "fn_name": call.name,
        "fn_arguments": arguments,
    }))?;
    Ok(tool_call)
}

/// Convert a ChatMessage to a genai ChatMessage
pub fn to_genai_message(msg: &ChatMessage) -> ProviderResult<GenaiMessage> {
    let converted = match msg.role {
        MessageRole::System => GenaiMessage::system(msg.content.clone()),
        MessageRole::User => GenaiMessage::user(msg.content.clone()),
        MessageRole::Assistant if msg.has_tool_calls() => {
            let calls = msg
                .tool_calls
                .iter()
                .map(to_genai_tool_call)
                .collect::<ProviderResult<Vec<_>>>()?;
            // Text sent alongside the calls stays in the history the model sees
            let mut parts = Vec::with_capacity(calls.len() + 1);
            if !msg.content.trim().is_empty() {
                parts.push(ContentPart::Text(msg.content.clone()));
            }
            parts.extend(calls.into_iter().map(ContentPart::ToolCall));
            GenaiMessage::assistant(MessageContent::from_parts(parts))
        }
        MessageRole::Assistant => GenaiMessage::assistant(msg.content.clone()),
        MessageRole::Tool => {
            let call_id = msg.tool_call_id.clone().unwrap_or_default();
            GenaiMessage::from(GenaiToolResponse::new(call_id, msg.content.clone()))
        }
    };
    Ok(converted)
}

/// Convert a slice of messages to genai messages
pub fn to_genai_messages(messages: &[ChatMessage]) -> ProviderResult<Vec<GenaiMessage>> {
    messages.iter().map(to_genai_message).collect()
}

// ============================================================================
// Tool Conversion: larkbridge -> genai
// ============================================================================

/// Convert a Tool to a genai Tool
pub fn to_genai_tool(tool: &Tool) -> GenaiTool {
    GenaiTool::new(&tool.name)
        .with_description(&tool.description)
        .with_schema(tool.parameters.clone())
}

pub fn to_genai_tools(tools: &[Tool]) -> Vec<GenaiTool> {
    tools.iter().map(to_genai_tool).collect()
}

// ============================================================================
// Options Conversion: larkbridge -> genai
// ============================================================================

/// Convert CompletionOptions to genai ChatOptions
pub fn to_genai_options(options: &CompletionOptions) -> GenaiOptions {
    let mut genai_opts = GenaiOptions::default();

    if let Some(temp) = options.temperature {
        genai_opts = genai_opts.with_temperature(temp as f64);
    }

    if let Some(top_p) = options.top_p {
        genai_opts = genai_opts.with_top_p(top_p as f64);
    }

    if let Some(max_tokens) = options.max_tokens {
        genai_opts = genai_opts.with_max_tokens(max_tokens);
    }

    genai_opts
}

// ============================================================================
// Response Conversion: genai -> larkbridge
// ============================================================================

/// Convert a genai ToolCall to our ToolCall
pub fn from_genai_tool_call(tc: &GenaiToolCall) -> ToolCall {
    let arguments = match &tc.fn_arguments {
        Value::String(raw) => raw.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    };
    ToolCall::new(tc.call_id.clone(), tc.fn_name.clone(), arguments)
}

/// Convert a genai ChatResponse to a Completion
pub fn from_genai_response(response: &ChatResponse) -> Completion {
    let tool_calls: Vec<ToolCall> = response
        .tool_calls()
        .into_iter()
        .map(from_genai_tool_call)
        .collect();
    let content = response
        .first_text()
        .map(str::to_string)
        .filter(|text| !text.is_empty());

    Completion { content, tool_calls }
}

// ============================================================================
// Client Creation with Custom Auth
// ============================================================================

/// Normalize a base URL so genai can append endpoint paths to it
pub fn normalize_api_base(base: &str) -> String {
    if base.ends_with('/') {
        base.to_string()
    } else {
        format!("{}/", base)
    }
}

/// Endpoint used when no base URL is configured
pub const OPENAI_API_BASE: &str = "https://api.openai.com/v1/";

/// Create a genai Client that sends every model to one OpenAI-compatible endpoint
///
/// The model name is passed through unchanged, so `deepseek/deepseek-chat`
/// or `qwen-max` reach the configured endpoint as written instead of being
/// routed to another backend by genai's name matching.
pub fn create_client(config: &ProviderModelConfig) -> Client {
    let auth = config
        .api_key
        .clone()
        .map(AuthData::from_single)
        .unwrap_or_else(|| AuthData::from_env("OPENAI_API_KEY"));
    let api_base = normalize_api_base(config.api_base.as_deref().unwrap_or(OPENAI_API_BASE));

    let target_resolver = ServiceTargetResolver::from_resolver_fn(
        move |target: ServiceTarget| -> Result<ServiceTarget, genai::resolver::Error> {
            Ok(ServiceTarget {
                endpoint: Endpoint::from_owned(api_base.clone()),
                auth: auth.clone(),
                model: ModelIden::new(AdapterKind::OpenAI, target.model.model_name),
            })
        },
    );

    Client::builder()
        .with_service_target_resolver(target_resolver)
        .build()
}
