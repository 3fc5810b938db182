//! Agent endpoint error types.

use thiserror::Error;

/// Result type alias for agent endpoint calls.
pub type AgentResult<T> = Result<T, AgentError>;

/// Errors that can occur calling an external agent endpoint.
#[derive(Debug, Error)]
pub enum AgentError {
    /// HTTP transport failed (connect, protocol, body).
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The call exceeded its bounded timeout.
    #[error("timed out after {timeout_ms}ms")]
    Timeout {
        /// The configured timeout in milliseconds.
        timeout_ms: u64,
    },

    /// The endpoint returned a non-success status.
    #[error("endpoint error ({status}): {message}")]
    Api {
        /// HTTP status code.
        status: u16,
        /// Response body or status text.
        message: String,
    },

    /// Response body could not be decoded.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AgentError {
    /// Whether this failure was a timeout. The coordinator treats timeouts
    /// identically to endpoint-reported failures; this only affects the
    /// recorded description.
    pub fn is_timeout(&self) -> bool {
        match self {
            Self::Timeout { .. } => true,
            Self::Http(e) => e.is_timeout(),
            _ => false,
        }
    }

    /// Error category string for trace payloads.
    pub fn category(&self) -> &str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Http(e) if e.is_timeout() => "timeout",
            Self::Http(_) => "network",
            Self::Api { .. } => "api",
            Self::Json(_) => "parse",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
