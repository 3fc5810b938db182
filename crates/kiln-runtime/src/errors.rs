//! Pipeline error taxonomy.

use kiln_core::{AgentName, ValidationError};
use kiln_store::StoreError;
use thiserror::Error;

/// Result type alias for pipeline operations.
pub type PipelineResult<T> = Result<T, PipelineError>;

/// Errors surfaced by the coordinator and its collaborators.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// The start event failed validation. Nothing was recorded.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// The session store failed. Includes session-not-found.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// An agent stage failed (endpoint error, timeout, bad response).
    #[error("{agent} stage failed: {message}")]
    Stage {
        /// The stage that failed.
        agent: AgentName,
        /// Description of the failure, as recorded in the trace.
        message: String,
    },
}

impl PipelineError {
    /// Short category string for logs.
    pub fn category(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation",
            Self::Store(StoreError::SessionNotFound(_)) => "not-found",
            Self::Store(_) => "storage",
            Self::Stage { .. } => "stage",
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
