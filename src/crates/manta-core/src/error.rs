//! Error types shared across the manta workspace
//!
//! All errors implement `std::error::Error` via the `thiserror` crate.
//!
//! # Error Hierarchy
//!
//! ```text
//! CoreError
//! ├── Configuration      - Invalid or missing configuration
//! ├── Model              - Model backend failures (wraps provider errors)
//! ├── Tool               - Tool invocation failures
//! ├── Serialization      - JSON errors
//! └── Io                 - Filesystem errors
//! ```
//!
//! The agent's turn loop absorbs these into user-visible text at each
//! call site; see the routing crate for the absorb-locally rules. Only
//! construction-time problems (a bad config, a pattern that fails to
//! compile) propagate out of builders as `Err`.

use thiserror::Error;

use crate::tool::ToolError;

/// Convenience result type using [`CoreError`]
pub type Result<T> = std::result::Result<T, CoreError>;

/// Error type shared by the manta crates
///
/// # Examples
///
/// ```rust
/// use manta_core::error::CoreError;
///
/// let err = CoreError::configuration("chunk_size must be positive");
/// assert_eq!(format!("{}", err), "Configuration error: chunk_size must be positive");
/// ```
#[derive(Error, Debug)]
pub enum CoreError {
    /// Invalid or missing configuration
    ///
    /// Occurs when a builder is given values it cannot work with
    /// (empty tool list, zero chunk size, malformed base url).
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// Model backend failure
    ///
    /// Network failures, unknown models, and malformed provider
    /// responses all surface here. Provider crates convert their own
    /// error types into this variant.
    #[error("Model error: {0}")]
    Model(String),

    /// Tool invocation failure
    ///
    /// Wraps [`ToolError`]. Expected "no result" conditions are not
    /// errors; tools report those through sentinel text instead.
    #[error("Tool error: {0}")]
    Tool(#[from] ToolError),

    /// JSON serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O operation failed
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl CoreError {
    /// Create a configuration error
    pub fn configuration(msg: impl Into<String>) -> Self {
        Self::Configuration(msg.into())
    }

    /// Create a model backend error
    pub fn model(msg: impl Into<String>) -> Self {
        Self::Model(msg.into())
    }
}
