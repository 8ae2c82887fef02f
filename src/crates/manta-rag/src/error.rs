//! Error types for indexing and retrieval.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for RAG operations.
pub type Result<T> = std::result::Result<T, RagError>;

/// Errors that can occur while building or querying the document index.
///
/// Query-time code mostly absorbs these (an unloadable index degrades to
/// an empty retriever); build-time code propagates them to the caller.
#[derive(Error, Debug)]
pub enum RagError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Embedding error: {0}")]
    Embedding(String),

    #[error("Docs folder not found: {}", .0.display())]
    MissingDocs(PathBuf),

    #[error("No documents found under {}", .0.display())]
    NoDocuments(PathBuf),

    #[error("PDF processing failed: {0}")]
    Pdf(String),

    #[error("Configuration error: {0}")]
    Config(String),
}
