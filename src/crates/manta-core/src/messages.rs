//! Conversation message types
//!
//! Every component in the workspace speaks one [`Message`] type: the
//! session log stores it, the model boundary consumes and produces it,
//! and the turn router inspects it. Provider responses are normalized
//! into this shape at the boundary instead of branching on raw JSON
//! throughout the core.
//!
//! # Structure
//!
//! A message is a role, a content payload, and (for assistant messages
//! only) an optional list of structured tool calls:
//!
//! ```json
//! {
//!   "role": "assistant",
//!   "content": "Let me look that up.",
//!   "tool_calls": [
//!     {"id": "…", "name": "rag_search", "args": {"query": "refund policy"}}
//!   ]
//! }
//! ```
//!
//! Content is plain text for ordinary turns. The vision path sends a
//! multimodal payload: a question plus local image paths, expressed as
//! [`MessageContent::Parts`].
//!
//! # Examples
//!
//! ```rust
//! use manta_core::messages::{Message, MessageRole};
//!
//! let msg = Message::user("What is the refund policy?");
//! assert_eq!(msg.role, MessageRole::User);
//! assert_eq!(msg.text(), Some("What is the refund policy?"));
//! ```

use serde::{Deserialize, Serialize};

use crate::tool::ToolCall;

/// Role of a message participant
///
/// Serialized lowercase to match the wire format of local model
/// servers (`"system"`, `"user"`, `"assistant"`, `"tool"`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    /// Instructions and injected grounding context
    System,
    /// End-user input
    User,
    /// Model output
    Assistant,
    /// Raw tool output (kept in the vocabulary for provider
    /// round-trips; grounding context travels as `System`)
    Tool,
}

impl MessageRole {
    /// Wire name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            MessageRole::System => "system",
            MessageRole::User => "user",
            MessageRole::Assistant => "assistant",
            MessageRole::Tool => "tool",
        }
    }
}

/// One part of a multimodal content payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ContentPart {
    /// Plain text
    Text {
        /// The text content
        text: String,
    },
    /// A local image file, referenced by path
    ///
    /// Providers read and encode the file at request time; the path is
    /// not resolved until the message reaches the model boundary.
    Image {
        /// Absolute or working-directory-relative path to the image
        path: String,
    },
}

impl ContentPart {
    /// Create a text part
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Create an image part from a local file path
    pub fn image(path: impl Into<String>) -> Self {
        Self::Image { path: path.into() }
    }
}

/// Message content: plain text or a multimodal part list
///
/// Uses `#[serde(untagged)]` so plain strings deserialize directly
/// into the `Text` variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum MessageContent {
    /// Simple text content
    Text(String),
    /// Multimodal content (text + images) for the vision path
    Parts(Vec<ContentPart>),
}

impl From<String> for MessageContent {
    fn from(s: String) -> Self {
        MessageContent::Text(s)
    }
}

impl From<&str> for MessageContent {
    fn from(s: &str) -> Self {
        MessageContent::Text(s.to_string())
    }
}

impl From<Vec<ContentPart>> for MessageContent {
    fn from(parts: Vec<ContentPart>) -> Self {
        MessageContent::Parts(parts)
    }
}

/// One conversational turn
///
/// Invariants: the role is always present; `tool_calls` is only ever
/// set on `Assistant` messages (providers normalize to this shape).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Who authored this message
    pub role: MessageRole,
    /// Text or multimodal payload
    pub content: MessageContent,
    /// Structured tool-call requests, assistant messages only
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tool_calls: Option<Vec<ToolCall>>,
}

impl Message {
    /// Create a message with an explicit role
    pub fn new(role: MessageRole, content: impl Into<MessageContent>) -> Self {
        Self {
            role,
            content: content.into(),
            tool_calls: None,
        }
    }

    /// Create a system message
    pub fn system(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::System, content)
    }

    /// Create a user message
    pub fn user(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::User, content)
    }

    /// Create an assistant message
    pub fn assistant(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Assistant, content)
    }

    /// Create a tool message
    pub fn tool(content: impl Into<MessageContent>) -> Self {
        Self::new(MessageRole::Tool, content)
    }

    /// Create a multimodal user message: a question followed by page images
    pub fn user_with_images(
        text: impl Into<String>,
        image_paths: impl IntoIterator<Item = String>,
    ) -> Self {
        let mut parts = vec![ContentPart::text(text)];
        parts.extend(image_paths.into_iter().map(ContentPart::image));
        Self::new(MessageRole::User, parts)
    }

    /// Attach structured tool calls (builder style)
    pub fn with_tool_calls(mut self, tool_calls: Vec<ToolCall>) -> Self {
        self.tool_calls = Some(tool_calls);
        self
    }

    /// Get the text content
    ///
    /// Returns the string for `Text` content, or the first text part
    /// of a multimodal payload. `None` when no text exists at all.
    pub fn text(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Text(s) => Some(s.as_str()),
            MessageContent::Parts(parts) => parts.iter().find_map(|p| match p {
                ContentPart::Text { text } => Some(text.as_str()),
                ContentPart::Image { .. } => None,
            }),
        }
    }

    /// True when the message carries at least one structured tool call
    pub fn has_tool_calls(&self) -> bool {
        self.tool_calls
            .as_ref()
            .map(|calls| !calls.is_empty())
            .unwrap_or(false)
    }
}

/// Text of the most recent user-authored message, if any
///
/// Used by the escalation and fallback paths, which re-query tools
/// with what the user last actually asked.
pub fn latest_user_text(messages: &[Message]) -> Option<&str> {
    messages
        .iter()
        .rev()
        .filter(|m| m.role == MessageRole::User)
        .find_map(|m| m.text().filter(|t| !t.trim().is_empty()))
}

// ============================================================================
// Tests
// ============================================================================
