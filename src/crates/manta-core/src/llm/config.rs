//! Chat request configuration with builder pattern

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::messages::Message;

/// A complete chat request: message history plus configuration
///
/// # Example
///
/// ```rust
/// use manta_core::llm::ChatRequest;
/// use manta_core::Message;
///
/// let request = ChatRequest::new(vec![Message::user("Hello!")])
///     .with_temperature(0.7);
/// assert!(!request.is_tool_bound());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatRequest {
    /// Ordered conversation history
    pub messages: Vec<Message>,
    /// Sampling and binding configuration
    pub config: ChatConfig,
}

impl ChatRequest {
    /// Create a request with default configuration
    pub fn new(messages: Vec<Message>) -> Self {
        Self {
            messages,
            config: ChatConfig::default(),
        }
    }

    /// Set the sampling temperature
    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.config.temperature = Some(temperature);
        self
    }

    /// Set nucleus sampling top-p
    pub fn with_top_p(mut self, top_p: f32) -> Self {
        self.config.top_p = Some(top_p);
        self
    }

    /// Bind tools to this request (tool-bound mode)
    pub fn with_tools(mut self, tools: Vec<ToolDefinition>) -> Self {
        self.config.tools = tools;
        self
    }

    /// True when the request carries tool bindings
    ///
    /// Tool-bound requests may come back with `tool_calls`; plain
    /// requests never do. The grounded follow-up call is always plain.
    pub fn is_tool_bound(&self) -> bool {
        !self.config.tools.is_empty()
    }
}

/// Configuration options for a chat request
///
/// All fields optional; providers apply their own defaults for unset
/// values.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ChatConfig {
    /// Sampling temperature (0.0 = deterministic)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,

    /// Nucleus sampling threshold
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,

    /// Tools the model may call; empty = plain mode
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tools: Vec<ToolDefinition>,
}

/// Declaration of a callable tool for tool-bound requests
///
/// Serialized by providers into their function-calling wire format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    /// Tool name the model should emit in calls
    pub name: String,
    /// What the tool does, shown to the model
    pub description: String,
    /// JSON schema of the argument object
    pub parameters: Value,
}

impl ToolDefinition {
    /// Create a definition with an empty object schema
    pub fn new(name: impl Into<String>, description: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters: json!({"type": "object", "properties": {}}),
        }
    }

    /// Set the parameter schema
    pub fn with_parameters(mut self, parameters: Value) -> Self {
        self.parameters = parameters;
        self
    }
}
