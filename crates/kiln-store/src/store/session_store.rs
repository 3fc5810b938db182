//! [`SessionStore`] — the single write path to sessions and trace.
//!
//! All trace/metric writes for one session are serialized through a
//! per-session lock, and counter updates are additionally atomic SQL
//! increments, so a coordinator-driven write racing a gateway-driven update
//! can never lose either side. Writes that still hit `SQLITE_BUSY` under
//! WAL contention are retried with linear backoff and jitter.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, Weak};
use std::time::Duration;

use kiln_core::SessionStatus;
use tracing::instrument;

use crate::errors::{Result, StoreError};
use crate::sqlite::connection::{ConnectionPool, PooledConnection};
use crate::sqlite::repositories::session::SessionRepo;
use crate::sqlite::repositories::trace::TraceRepo;
use crate::types::{
    CreateSessionOptions, MetricsDelta, RecordStepOptions, SessionRow, StepRecorded, TraceRow,
};

/// Durable session store backed by `SQLite`.
pub struct SessionStore {
    pool: ConnectionPool,
    session_locks: Mutex<HashMap<String, Weak<Mutex<()>>>>,
}

impl SessionStore {
    const SQLITE_BUSY_MAX_RETRIES: u32 = 32;

    /// Create a store over an existing (migrated) connection pool.
    pub fn new(pool: ConnectionPool) -> Self {
        Self {
            pool,
            session_locks: Mutex::new(HashMap::new()),
        }
    }

    // ─────────────────────────────────────────────────────────────────────
    // Session lifecycle
    // ─────────────────────────────────────────────────────────────────────

    /// Create a session in `started` status.
    #[instrument(skip(self, opts), fields(session_id = opts.session_id))]
    pub fn create_session(&self, opts: &CreateSessionOptions<'_>) -> Result<SessionRow> {
        let conn = self.conn()?;
        SessionRepo::create(&conn, opts)
    }

    /// Fetch a session, failing with [`StoreError::SessionNotFound`] if absent.
    pub fn get_session(&self, session_id: &str) -> Result<SessionRow> {
        let conn = self.conn()?;
        SessionRepo::get_by_id(&conn, session_id)?
            .ok_or_else(|| StoreError::SessionNotFound(session_id.to_owned()))
    }

    /// Whether a session exists.
    pub fn session_exists(&self, session_id: &str) -> Result<bool> {
        let conn = self.conn()?;
        SessionRepo::exists(&conn, session_id)
    }

    /// Atomically claim a session for orchestration (`started` → `in-progress`).
    ///
    /// Returns `false` when the session is missing or no longer startable —
    /// callers distinguish the two with [`Self::get_session`].
    pub fn claim(&self, session_id: &str) -> Result<bool> {
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            SessionRepo::claim(&conn, session_id)
        })
    }

    /// Set a session's lifecycle status.
    pub fn set_status(&self, session_id: &str, status: SessionStatus) -> Result<()> {
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            if SessionRepo::set_status(&conn, session_id, status)? {
                Ok(())
            } else {
                Err(StoreError::SessionNotFound(session_id.to_owned()))
            }
        })
    }

    // ─────────────────────────────────────────────────────────────────────
    // Trace and metrics
    // ─────────────────────────────────────────────────────────────────────

    /// Append or merge one trace step for an existing session.
    ///
    /// Runs in a transaction under the session's write lock: the existence
    /// check and the upsert are atomic with respect to other writers.
    #[instrument(skip(self, opts), fields(session_id = opts.session_id, step_id = opts.step_id))]
    pub fn record_step(&self, opts: &RecordStepOptions<'_>) -> Result<StepRecorded> {
        self.with_session_write_lock(opts.session_id, || {
            let conn = self.conn()?;
            let tx = conn.unchecked_transaction()?;
            if !SessionRepo::exists(&tx, opts.session_id)? {
                return Err(StoreError::SessionNotFound(opts.session_id.to_owned()));
            }
            let recorded = TraceRepo::upsert(&tx, opts)?;
            tx.commit()?;
            Ok(recorded)
        })
    }

    /// Apply metric counter increments (merge semantics; atomic in SQL).
    pub fn update_metrics(&self, session_id: &str, delta: &MetricsDelta) -> Result<()> {
        if delta.is_empty() {
            return Ok(());
        }
        self.with_session_write_lock(session_id, || {
            let conn = self.conn()?;
            SessionRepo::apply_metrics_delta(&conn, session_id, delta)
        })
    }

    /// Ordered trace for a session (timestamp asc, ties by sequence).
    pub fn list_trace(&self, session_id: &str) -> Result<Vec<TraceRow>> {
        let conn = self.conn()?;
        if !SessionRepo::exists(&conn, session_id)? {
            return Err(StoreError::SessionNotFound(session_id.to_owned()));
        }
        TraceRepo::list_by_session(&conn, session_id)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Per-session write serialization
    // ─────────────────────────────────────────────────────────────────────

    fn acquire_session_lock(&self, session_id: &str) -> Result<Arc<Mutex<()>>> {
        let mut locks = self
            .session_locks
            .lock()
            .map_err(|_| StoreError::Internal("session lock map poisoned".into()))?;

        // Opportunistically prune dead weak refs when the map grows.
        if locks.len() > 128 {
            locks.retain(|_, weak| weak.strong_count() > 0);
        }

        if let Some(existing) = locks.get(session_id).and_then(Weak::upgrade) {
            return Ok(existing);
        }

        let lock = Arc::new(Mutex::new(()));
        let _ = locks.insert(session_id.to_owned(), Arc::downgrade(&lock));
        Ok(lock)
    }

    fn with_session_write_lock<T>(
        &self,
        session_id: &str,
        f: impl FnMut() -> Result<T>,
    ) -> Result<T> {
        let session_lock = self.acquire_session_lock(session_id)?;
        let _guard = session_lock
            .lock()
            .map_err(|_| StoreError::Internal("session write lock poisoned".into()))?;
        Self::retry_on_sqlite_busy(f)
    }

    /// Retry an operation on `SQLite` BUSY/LOCKED with linear backoff + jitter.
    ///
    /// Backoff: base = min(attempts * 10, 500) ms, jitter ±25% to avoid
    /// thundering herd when multiple writers contend on the same database.
    fn retry_on_sqlite_busy<T>(mut f: impl FnMut() -> Result<T>) -> Result<T> {
        let mut attempts = 0;

        loop {
            match f() {
                Ok(value) => return Ok(value),
                Err(err)
                    if Self::is_sqlite_busy_or_locked(&err)
                        && attempts < Self::SQLITE_BUSY_MAX_RETRIES =>
                {
                    attempts += 1;
                    let base_ms = u64::from(attempts).saturating_mul(10).min(500);
                    let jitter_range = base_ms / 4;
                    let jitter = if jitter_range > 0 {
                        rand::random::<u64>() % (jitter_range * 2 + 1)
                    } else {
                        0
                    };
                    let backoff_ms = base_ms.saturating_sub(jitter_range) + jitter;
                    std::thread::sleep(Duration::from_millis(backoff_ms));
                }
                Err(err) => return Err(err),
            }
        }
    }

    fn is_sqlite_busy_or_locked(err: &StoreError) -> bool {
        match err {
            StoreError::Sqlite(rusqlite::Error::SqliteFailure(code, _)) => {
                matches!(
                    code.code,
                    rusqlite::ErrorCode::DatabaseBusy | rusqlite::ErrorCode::DatabaseLocked
                )
            }
            _ => false,
        }
    }

    /// Get a connection from the pool.
    fn conn(&self) -> Result<PooledConnection> {
        Ok(self.pool.get()?)
    }
}

impl std::fmt::Debug for SessionStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionStore").finish_non_exhaustive()
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
