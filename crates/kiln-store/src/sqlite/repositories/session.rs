//! Session repository: CRUD and atomic metric updates for the `sessions` table.

use kiln_core::SessionStatus;
use kiln_core::agent::PIPELINE_TOTAL_AGENTS;
use kiln_core::ids::SessionId;
use rusqlite::{Connection, OptionalExtension, Row, params};

use super::now_rfc3339;
use crate::errors::{Result, StoreError};
use crate::types::{CreateSessionOptions, MetricsDelta, SessionRow};

/// Repository for session records. Stateless; methods take a connection.
pub struct SessionRepo;

impl SessionRepo {
    /// Insert a new session in `started` status with zeroed counters.
    ///
    /// Generates a `sess_` id when none is supplied. Fails if the id already
    /// exists (one session per id, created exactly once).
    pub fn create(conn: &Connection, opts: &CreateSessionOptions<'_>) -> Result<SessionRow> {
        let id = opts
            .session_id
            .map_or_else(|| SessionId::new().into_inner(), str::to_owned);
        let created_at = now_rfc3339();
        let total_agents = opts.total_agents.unwrap_or(PIPELINE_TOTAL_AGENTS);

        let _ = conn.execute(
            "INSERT INTO sessions (id, status, voice_input, image_url, created_at, total_agents)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                id,
                SessionStatus::Started.as_str(),
                opts.voice_input,
                opts.image_url,
                created_at,
                total_agents,
            ],
        )?;

        Ok(SessionRow {
            id,
            status: SessionStatus::Started,
            voice_input: opts.voice_input.to_owned(),
            image_url: opts.image_url.to_owned(),
            created_at,
            total_agents,
            completed_agents: 0,
            errors: 0,
        })
    }

    /// Fetch a session by id.
    pub fn get_by_id(conn: &Connection, id: &str) -> Result<Option<SessionRow>> {
        conn.query_row(
            "SELECT id, status, voice_input, image_url, created_at,
                    total_agents, completed_agents, errors
             FROM sessions WHERE id = ?1",
            params![id],
            Self::map_row,
        )
        .optional()
        .map_err(StoreError::Sqlite)?
        .transpose()
    }

    /// Whether a session exists.
    pub fn exists(conn: &Connection, id: &str) -> Result<bool> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM sessions WHERE id = ?1",
            params![id],
            |row| row.get(0),
        )?;
        Ok(count > 0)
    }

    /// Set a session's status unconditionally. Returns `false` if no row matched.
    pub fn set_status(conn: &Connection, id: &str, status: SessionStatus) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET status = ?2 WHERE id = ?1",
            params![id, status.as_str()],
        )?;
        Ok(changed > 0)
    }

    /// Compare-and-set `started` → `in-progress`.
    ///
    /// Returns `true` if this call claimed the session. A session already
    /// claimed, completed, or failed is left untouched and returns `false` —
    /// this is the idempotent-start guard under at-least-once delivery.
    pub fn claim(conn: &Connection, id: &str) -> Result<bool> {
        let changed = conn.execute(
            "UPDATE sessions SET status = ?2 WHERE id = ?1 AND status = ?3",
            params![
                id,
                SessionStatus::InProgress.as_str(),
                SessionStatus::Started.as_str()
            ],
        )?;
        Ok(changed > 0)
    }

    /// Apply counter increments as a single atomic UPDATE.
    ///
    /// Never read-modify-write: concurrent deltas for the same session both
    /// land regardless of interleaving.
    pub fn apply_metrics_delta(conn: &Connection, id: &str, delta: &MetricsDelta) -> Result<()> {
        let changed = conn.execute(
            "UPDATE sessions
             SET completed_agents = completed_agents + ?2,
                 errors = errors + ?3
             WHERE id = ?1",
            params![id, delta.completed_agents, delta.errors],
        )?;
        if changed == 0 {
            return Err(StoreError::SessionNotFound(id.to_owned()));
        }
        Ok(())
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Result<SessionRow>> {
        let status_raw: String = row.get(1)?;
        Ok(match SessionStatus::parse(&status_raw) {
            Some(status) => Ok(SessionRow {
                id: row.get(0)?,
                status,
                voice_input: row.get(2)?,
                image_url: row.get(3)?,
                created_at: row.get(4)?,
                total_agents: row.get(5)?,
                completed_agents: row.get(6)?,
                errors: row.get(7)?,
            }),
            None => Err(StoreError::Internal(format!(
                "unknown session status in store: {status_raw}"
            ))),
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
