//! Store error types.

use thiserror::Error;

/// Errors produced by the session store.
#[derive(Debug, Error)]
pub enum StoreError {
    /// Underlying `SQLite` error.
    #[error("SQLite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// JSON serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    /// Schema migration failed.
    #[error("migration failed: {message}")]
    Migration {
        /// Error description.
        message: String,
    },

    /// Referenced session does not exist.
    #[error("session not found: {0}")]
    SessionNotFound(String),

    /// Internal invariant violation (poisoned lock, corrupt row).
    #[error("internal store error: {0}")]
    Internal(String),
}

/// Result type alias for store operations.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn session_not_found_display() {
        let err = StoreError::SessionNotFound("sess_123".into());
        assert_eq!(err.to_string(), "session not found: sess_123");
    }

    #[test]
    fn migration_display() {
        let err = StoreError::Migration {
            message: "v1 failed".into(),
        };
        assert_eq!(err.to_string(), "migration failed: v1 failed");
    }

    #[test]
    fn internal_display() {
        let err = StoreError::Internal("lock poisoned".into());
        assert_eq!(err.to_string(), "internal store error: lock poisoned");
    }

    #[test]
    fn sqlite_error_from_conversion() {
        let err: StoreError = rusqlite::Error::InvalidQuery.into();
        assert!(matches!(err, StoreError::Sqlite(_)));
    }

    #[test]
    fn serde_error_from_conversion() {
        let json_err = serde_json::from_str::<serde_json::Value>("{bad}").unwrap_err();
        let err: StoreError = json_err.into();
        assert!(matches!(err, StoreError::Serde(_)));
    }
}
