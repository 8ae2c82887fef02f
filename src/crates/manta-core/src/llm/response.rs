//! Chat response types

use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::messages::Message;

/// A complete chat response from a model backend
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatResponse {
    /// The assistant message, normalized to the core [`Message`] shape
    pub message: Message,
    /// Token accounting when the provider reports it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub usage: Option<UsageMetadata>,
    /// Provider-specific extras (model id, timings)
    #[serde(default, skip_serializing_if = "HashMap::is_empty")]
    pub metadata: HashMap<String, Value>,
}

impl ChatResponse {
    /// Create a response from just a message
    pub fn new(message: Message) -> Self {
        Self {
            message,
            usage: None,
            metadata: HashMap::new(),
        }
    }

    /// Attach usage metadata
    pub fn with_usage(mut self, usage: UsageMetadata) -> Self {
        self.usage = Some(usage);
        self
    }
}

/// Token usage reported by a provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageMetadata {
    /// Tokens consumed by the prompt
    pub input_tokens: u32,
    /// Tokens generated in the response
    pub output_tokens: u32,
    /// Sum of input and output tokens
    pub total_tokens: u32,
}

impl UsageMetadata {
    /// Build usage from input/output counts
    pub fn new(input_tokens: u32, output_tokens: u32) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens: input_tokens + output_tokens,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_usage_totals() {
        let usage = UsageMetadata::new(120, 30);
        assert_eq!(usage.total_tokens, 150);
    }

    #[test]
    fn test_response_builder() {
        let response =
            ChatResponse::new(Message::assistant("answer")).with_usage(UsageMetadata::new(1, 2));
        assert_eq!(response.message.text(), Some("answer"));
        assert_eq!(response.usage.unwrap().total_tokens, 3);
    }
}
