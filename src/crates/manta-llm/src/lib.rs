//! Ollama-backed model providers.
//!
//! This crate implements the [`manta_core::ChatModel`] and
//! [`manta_core::EmbeddingModel`] traits against a local Ollama server.
//! The agent layer only sees the traits; everything Ollama-specific
//! (wire format, tool definition encoding, base64 image payloads)
//! stays here.
//!
//! # Example
//!
//! ```no_run
//! use manta_llm::{OllamaChatModel, OllamaConfig};
//! use manta_core::{ChatModel, ChatRequest, Message};
//!
//! # async fn run() -> manta_core::Result<()> {
//! let model = OllamaChatModel::new(OllamaConfig::new("gemma3:4b-it-qat"));
//! let request = ChatRequest::new(vec![Message::user("hello")]);
//! let response = model.chat(request).await?;
//! # Ok(())
//! # }
//! ```

pub mod config;
pub mod error;
pub mod ollama;

pub use config::{OllamaConfig, DEFAULT_BASE_URL};
pub use error::{LlmError, Result};
pub use ollama::{OllamaChatModel, OllamaEmbeddings};
