//! Model boundary traits
//!
//! The core defines **traits** for the model boundary and stays
//! provider-agnostic; provider crates implement them. Two invocation
//! modes exist and are selected per call site by the request itself:
//! tool-bound (the request carries tool definitions, the response may
//! carry `tool_calls`) and plain (no tool definitions, the response
//! never carries `tool_calls`).

use async_trait::async_trait;

use crate::error::Result;
use crate::llm::{ChatRequest, ChatResponse};

/// A chat-capable model backend
///
/// Implementations must be `Send + Sync`; share them across components
/// as `Arc<dyn ChatModel>`. The same trait serves text and multimodal
/// calls: a request whose messages contain image parts is a vision
/// call, and providers that cannot handle images should return an
/// error rather than silently dropping them.
///
/// # Errors
///
/// Implementations return [`CoreError::Model`](crate::error::CoreError)
/// for network failures, unknown models, and malformed provider
/// responses. Callers in the turn loop absorb these into user-visible
/// text; they never abort a turn.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Generate a complete chat response for the given history
    async fn chat(&self, request: ChatRequest) -> Result<ChatResponse>;

    /// Check whether the backend is reachable and healthy
    ///
    /// Default implementation assumes availability. Local servers
    /// should probe their endpoint.
    async fn is_available(&self) -> Result<bool> {
        Ok(true)
    }

    /// Clone into a boxed trait object
    fn clone_box(&self) -> Box<dyn ChatModel>;
}

impl Clone for Box<dyn ChatModel> {
    fn clone(&self) -> Self {
        self.clone_box()
    }
}

/// An embedding model backend
///
/// Turns text into a dense vector. Used by the index builder (chunk
/// embedding) and the retriever (query embedding); both sides must use
/// the same model id for the cosine ranking to mean anything, which is
/// why the index file records it.
#[async_trait]
pub trait EmbeddingModel: Send + Sync {
    /// Embed one text into a vector
    async fn embed(&self, text: &str) -> Result<Vec<f32>>;

    /// Identifier of the underlying embedding model
    fn model_id(&self) -> &str;
}
