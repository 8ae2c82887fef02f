//! # manta-core - Shared primitives for the manta agent
//!
//! Vocabulary types used by every crate in the workspace:
//!
//! - **Messages** - a single [`Message`] variant type (role, text or
//!   multimodal content, optional structured tool calls) that every
//!   boundary normalizes into, instead of branching on raw provider
//!   JSON throughout the core
//! - **Tools** - the [`Tool`] contract (name + `query` in, provenance-
//!   tagged `CONTEXT` text out), an order-preserving [`ToolRegistry`],
//!   and the normalized [`ToolInvocation`] pair routing works with
//! - **Sessions** - [`SessionStore`], an append-only in-memory message
//!   log keyed by session id, alive for the process lifetime only
//! - **Model boundary** - [`ChatModel`] / [`EmbeddingModel`] traits
//!   with request/response types; providers live in `manta-llm`
//! - **Errors** - [`CoreError`] with per-crate `From` conversions
//!
//! The crate is deliberately free of I/O: no HTTP, no filesystem, no
//! provider specifics. Everything here is either a data type or an
//! in-memory structure, which keeps the routing logic in `manta-agent`
//! testable without a model server.

pub mod error;
pub mod llm;
pub mod messages;
pub mod session;
pub mod tool;

pub use error::{CoreError, Result};
pub use llm::{
    ChatConfig, ChatModel, ChatRequest, ChatResponse, EmbeddingModel, ToolDefinition,
    UsageMetadata,
};
pub use messages::{latest_user_text, ContentPart, Message, MessageContent, MessageRole};
pub use session::SessionStore;
pub use tool::{Tool, ToolCall, ToolError, ToolInvocation, ToolRegistry};
