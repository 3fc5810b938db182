//! Read-side service for session state and progress.

use std::sync::Arc;

use kiln_store::{SessionRow, SessionStore, StoreError, TraceRow};
use serde::Serialize;

/// A session together with its ordered trace.
#[derive(Clone, Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionProgress {
    /// The session record, including metric counters.
    pub session: SessionRow,
    /// Trace entries ordered by timestamp, ties broken by sequence.
    pub trace: Vec<TraceRow>,
}

/// Read-only queries over sessions and their traces.
#[derive(Clone, Debug)]
pub struct SessionQueryService {
    store: Arc<SessionStore>,
}

impl SessionQueryService {
    /// Create a query service over the given store.
    pub fn new(store: Arc<SessionStore>) -> Self {
        Self { store }
    }

    /// Fetch one session record.
    pub fn get_session(&self, session_id: &str) -> Result<SessionRow, StoreError> {
        self.store.get_session(session_id)
    }

    /// Fetch a session with its full ordered trace.
    pub fn get_progress(&self, session_id: &str) -> Result<SessionProgress, StoreError> {
        let session = self.store.get_session(session_id)?;
        let trace = self.store.list_trace(session_id)?;
        Ok(SessionProgress { session, trace })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
