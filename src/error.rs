//! Error types for Hobby Mentor.

use std::time::Duration;

/// Errors that abort a turn or a session operation.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Session error: {0}")]
    Session(#[from] SessionError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Missing required configuration: {key}. {hint}")]
    MissingRequired { key: String, hint: String },

    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },
}

/// LLM provider errors.
#[derive(Debug, thiserror::Error)]
pub enum LlmError {
    #[error("Provider {provider} request failed: {reason}")]
    RequestFailed { provider: String, reason: String },

    #[error("Provider {provider} rate limited, retry after {retry_after:?}")]
    RateLimited {
        provider: String,
        retry_after: Option<Duration>,
    },

    #[error("Invalid response from {provider}: {reason}")]
    InvalidResponse { provider: String, reason: String },

    #[error("Authentication failed for provider {provider}")]
    AuthFailed { provider: String },

    #[error("Provider {provider} timed out after {timeout:?}")]
    Timeout { provider: String, timeout: Duration },

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl LlmError {
    /// Whether retrying the same request could plausibly succeed.
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            Self::RequestFailed { .. } | Self::RateLimited { .. } | Self::Timeout { .. }
        )
    }
}

/// Structured extraction failures. Always recovered locally as an empty update.
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("Extraction call failed: {0}")]
    Llm(#[from] LlmError),

    #[error("Extraction timed out after {0:?}")]
    Timeout(Duration),

    #[error("Extraction output is not JSON: {0}")]
    Parse(String),

    #[error("Extraction output for phase {phase} has the wrong shape: {reason}")]
    InvalidShape { phase: String, reason: String },
}

/// Session state errors.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session {id} cannot transition from {from} to {to}")]
    InvalidTransition { id: String, from: String, to: String },
}

/// Session store errors.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Storage backend failed: {0}")]
    Backend(String),
}

/// Result type alias for the service.
pub type Result<T> = std::result::Result<T, Error>;
