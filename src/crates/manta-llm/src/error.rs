//! Error types for LLM provider operations.

use thiserror::Error;

/// Result type alias for LLM operations.
pub type Result<T> = std::result::Result<T, LlmError>;

/// Errors that can occur when talking to a model provider.
#[derive(Error, Debug)]
pub enum LlmError {
    /// HTTP transport error (connection refused, timeout, etc.)
    #[error("HTTP error: {0}")]
    HttpError(#[from] reqwest::Error),

    /// The provider returned a non-success status or an error body
    #[error("Provider error: {0}")]
    ProviderError(String),

    /// The requested model is not available on the server
    #[error("Model not found: {0}")]
    ModelNotFound(String),

    /// The provider is not reachable or not healthy
    #[error("Service unavailable: {0}")]
    ServiceUnavailable(String),

    /// The response body could not be interpreted
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// The request could not be constructed, e.g. an unreadable
    /// image attachment
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Request or response serialization failed
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// Provider configuration is invalid
    #[error("Configuration error: {0}")]
    ConfigError(String),
}

impl LlmError {
    /// Returns true if the error is transient and the request may
    /// succeed on retry.
    pub fn is_retryable(&self) -> bool {
        match self {
            LlmError::HttpError(e) => e.is_timeout() || e.is_connect(),
            LlmError::ServiceUnavailable(_) => true,
            _ => false,
        }
    }
}

impl From<serde_json::Error> for LlmError {
    fn from(err: serde_json::Error) -> Self {
        LlmError::SerializationError(err.to_string())
    }
}

impl From<LlmError> for manta_core::CoreError {
    fn from(err: LlmError) -> Self {
        manta_core::CoreError::Model(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_service_unavailable_is_retryable() {
        let err = LlmError::ServiceUnavailable("ollama down".to_string());
        assert!(err.is_retryable());
    }

    #[test]
    fn test_provider_error_is_not_retryable() {
        let err = LlmError::ProviderError("bad model".to_string());
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_serde_error_converts() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad").unwrap_err();
        let err: LlmError = json_err.into();
        assert!(matches!(err, LlmError::SerializationError(_)));
    }

    #[test]
    fn test_converts_to_core_error() {
        let err = LlmError::ModelNotFound("gemma3".to_string());
        let core: manta_core::CoreError = err.into();
        assert!(matches!(core, manta_core::CoreError::Model(_)));
        assert!(core.to_string().contains("gemma3"));
    }
}
