//! Tool/function calling types

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A callable capability discovered from a tool server
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDescriptor {
    /// Tool name, unique within the merged catalog
    pub name: String,
    /// Human readable description shown to the model
    #[serde(default)]
    pub description: String,
    /// JSON Schema describing accepted arguments, as advertised by the server
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

impl ToolDescriptor {
    /// Create a new descriptor
    pub fn new(name: impl Into<String>, description: impl Into<String>, input_schema: Value) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            input_schema,
        }
    }
}

/// Tool definition advertised to the model backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    /// Tool name (function name)
    pub name: String,
    /// Description of what the tool does
    pub description: String,
    /// Normalized JSON Schema for the parameters
    pub parameters: Value,
}

impl Tool {
    /// Create a new tool definition
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: Value::Object(Default::default()),
        }
    }

    /// Set the parameter schema
    pub fn with_parameters(mut self, schema: Value) -> Self {
        self.parameters = schema;
        self
    }
}

/// Tool call requested by the model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Opaque identifier for this tool call
    pub id: String,
    /// Name of the tool being called
    pub name: String,
    /// Raw argument text; parsed as JSON only when the call is dispatched
    pub arguments: String,
}

impl ToolCall {
    /// Create a new tool call
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments: arguments.into(),
        }
    }
}

/// One block of a tool result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentBlock {
    /// Text block
    Text { text: String },
    /// Anything without a text rendering (images, resources, ...)
    Other { kind: String },
}

impl ContentBlock {
    /// Create a text block
    pub fn text(text: impl Into<String>) -> Self {
        ContentBlock::Text { text: text.into() }
    }

    /// The text of this block, if it has one
    pub fn as_text(&self) -> Option<&str> {
        match self {
            ContentBlock::Text { text } => Some(text),
            ContentBlock::Other { .. } => None,
        }
    }
}

/// Raw result payload of a tool invocation
#[derive(Debug, Clone, PartialEq)]
pub enum ToolOutput {
    /// A single text value
    Text(String),
    /// A sequence of content blocks
    Blocks(Vec<ContentBlock>),
    /// Any other structured value
    Json(Value),
}

impl ToolOutput {
    /// Render the payload as the text of a `tool` turn
    ///
    /// Blocks are joined with newlines (blocks without text are skipped),
    /// plain text is returned unchanged and anything else becomes pretty JSON.
    pub fn render(&self) -> String {
        match self {
            ToolOutput::Text(text) => text.clone(),
            ToolOutput::Blocks(blocks) => blocks
                .iter()
                .filter_map(ContentBlock::as_text)
                .collect::<Vec<_>>()
                .join("\n"),
            ToolOutput::Json(value) => {
                serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
            }
        }
    }
}
