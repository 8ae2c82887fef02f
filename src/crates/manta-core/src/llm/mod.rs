//! Model boundary: traits and request/response types
//!
//! This module defines the **traits** backing the two model roles the
//! agent needs (chat and embeddings) plus the request/response types
//! they exchange. The core contains no provider code; `manta-llm`
//! implements these traits for a local Ollama server, and tests
//! implement them with scripted mocks.
//!
//! # Invocation modes
//!
//! | Mode | Request | Response |
//! |------|---------|----------|
//! | Tool-bound | `with_tools(registry.definitions())` | may carry `tool_calls` |
//! | Plain | no tools | never carries `tool_calls` |
//!
//! The turn loop uses the tool-bound mode for its first call and the
//! plain mode for the single grounded follow-up.
//!
//! # See Also
//!
//! - [`ChatModel`] - the chat trait providers implement
//! - [`EmbeddingModel`] - the embedding trait
//! - [`ChatRequest`] - request builder (`with_temperature`, `with_tools`)
//! - [`ChatResponse`] - normalized response

pub mod config;
pub mod response;
pub mod traits;

pub use config::{ChatConfig, ChatRequest, ToolDefinition};
pub use response::{ChatResponse, UsageMetadata};
pub use traits::{ChatModel, EmbeddingModel};
