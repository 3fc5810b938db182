//! Trace repository: append-or-upsert step entries for the `trace` table.
//!
//! Append when the `(session_id, step_id)` pair is unseen; merge-update when
//! seen. A merge keeps the original `timestamp` and `seq` so the entry never
//! moves in the ordered trace — the only permitted "in place" update.

use kiln_core::TraceStatus;
use rusqlite::{Connection, OptionalExtension, Row, params};
use serde_json::Value;

use super::now_rfc3339;
use crate::errors::{Result, StoreError};
use crate::types::{RecordStepOptions, StepRecorded, TraceRow};

/// Repository for trace entries. Stateless; methods take a connection.
pub struct TraceRepo;

impl TraceRepo {
    /// Next per-session insertion sequence number (starts at 1).
    pub fn next_seq(conn: &Connection, session_id: &str) -> Result<i64> {
        let seq: i64 = conn.query_row(
            "SELECT COALESCE(MAX(seq), 0) + 1 FROM trace WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(seq)
    }

    /// Append a new step entry or merge into an existing one.
    ///
    /// On merge, the payload is shallow-merged (incoming keys override),
    /// `status` is replaced, and `updated_at` is set; `timestamp` and `seq`
    /// are preserved.
    pub fn upsert(conn: &Connection, opts: &RecordStepOptions<'_>) -> Result<StepRecorded> {
        let now = now_rfc3339();

        if let Some(existing) = Self::get(conn, opts.session_id, opts.step_id)? {
            let merged = merge_payload(&existing.data, opts.data);
            let _ = conn.execute(
                "UPDATE trace
                 SET status = ?3, data = ?4, updated_at = ?5
                 WHERE session_id = ?1 AND step_id = ?2",
                params![
                    opts.session_id,
                    opts.step_id,
                    opts.status.as_str(),
                    serde_json::to_string(&merged)?,
                    now,
                ],
            )?;

            return Ok(StepRecorded {
                row: TraceRow {
                    status: opts.status,
                    data: merged,
                    updated_at: Some(now),
                    ..existing.clone()
                },
                appended: false,
                prior_status: Some(existing.status),
            });
        }

        let seq = Self::next_seq(conn, opts.session_id)?;
        let _ = conn.execute(
            "INSERT INTO trace (session_id, step_id, agent_name, status, data, timestamp, seq)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
            params![
                opts.session_id,
                opts.step_id,
                opts.agent_name,
                opts.status.as_str(),
                serde_json::to_string(opts.data)?,
                now,
                seq,
            ],
        )?;

        Ok(StepRecorded {
            row: TraceRow {
                session_id: opts.session_id.to_owned(),
                step_id: opts.step_id.to_owned(),
                agent_name: opts.agent_name.to_owned(),
                status: opts.status,
                data: opts.data.clone(),
                timestamp: now,
                seq,
                updated_at: None,
            },
            appended: true,
            prior_status: None,
        })
    }

    /// Fetch one step entry.
    pub fn get(conn: &Connection, session_id: &str, step_id: &str) -> Result<Option<TraceRow>> {
        conn.query_row(
            "SELECT session_id, step_id, agent_name, status, data, timestamp, seq, updated_at
             FROM trace WHERE session_id = ?1 AND step_id = ?2",
            params![session_id, step_id],
            Self::map_row,
        )
        .optional()
        .map_err(StoreError::Sqlite)?
        .transpose()
    }

    /// All entries for a session, timestamp ascending, ties by sequence.
    pub fn list_by_session(conn: &Connection, session_id: &str) -> Result<Vec<TraceRow>> {
        let mut stmt = conn.prepare(
            "SELECT session_id, step_id, agent_name, status, data, timestamp, seq, updated_at
             FROM trace WHERE session_id = ?1
             ORDER BY timestamp ASC, seq ASC",
        )?;
        let rows = stmt.query_map(params![session_id], Self::map_row)?;
        rows.map(|r| r.map_err(StoreError::Sqlite)?).collect()
    }

    /// Number of entries for a session.
    pub fn count_by_session(conn: &Connection, session_id: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM trace WHERE session_id = ?1",
            params![session_id],
            |row| row.get(0),
        )?;
        Ok(count)
    }

    fn map_row(row: &Row<'_>) -> rusqlite::Result<Result<TraceRow>> {
        let status_raw: String = row.get(3)?;
        let data_raw: String = row.get(4)?;
        Ok(match TraceStatus::parse(&status_raw) {
            Some(status) => match serde_json::from_str(&data_raw) {
                Ok(data) => Ok(TraceRow {
                    session_id: row.get(0)?,
                    step_id: row.get(1)?,
                    agent_name: row.get(2)?,
                    status,
                    data,
                    timestamp: row.get(5)?,
                    seq: row.get(6)?,
                    updated_at: row.get(7)?,
                }),
                Err(e) => Err(StoreError::Serde(e)),
            },
            None => Err(StoreError::Internal(format!(
                "unknown trace status in store: {status_raw}"
            ))),
        })
    }
}

/// Shallow merge of two JSON payloads: incoming object keys override existing
/// ones; a non-object incoming payload replaces the existing one entirely.
fn merge_payload(existing: &Value, incoming: &Value) -> Value {
    match (existing, incoming) {
        (Value::Object(base), Value::Object(patch)) => {
            let mut merged = base.clone();
            for (key, value) in patch {
                let _ = merged.insert(key.clone(), value.clone());
            }
            Value::Object(merged)
        }
        (_, incoming) => incoming.clone(),
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sqlite::migrations::run_migrations;
    use crate::sqlite::repositories::session::SessionRepo;
    use crate::types::CreateSessionOptions;
    use serde_json::json;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        let _ = run_migrations(&conn).unwrap();
        let _ = SessionRepo::create(
            &conn,
            &CreateSessionOptions {
                session_id: Some("s1"),
                voice_input: "a bowl",
                image_url: "img://raw/1",
                total_agents: None,
            },
        )
        .unwrap();
        conn
    }

    fn step<'a>(step_id: &'a str, status: TraceStatus, data: &'a Value) -> RecordStepOptions<'a> {
        RecordStepOptions {
            session_id: "s1",
            step_id,
            agent_name: "Image Enhancer Agent",
            status,
            data,
        }
    }

    // ── append ──

    #[test]
    fn first_record_appends() {
        let conn = setup();
        let data = json!({"imageUrl": "img://raw/1"});
        let recorded =
            TraceRepo::upsert(&conn, &step("image-enhancer-in-progress", TraceStatus::InProgress, &data))
                .unwrap();
        assert!(recorded.appended);
        assert_eq!(recorded.prior_status, None);
        assert_eq!(recorded.row.seq, 1);
        assert_eq!(recorded.row.status, TraceStatus::InProgress);
        assert!(recorded.row.updated_at.is_none());
    }

    #[test]
    fn sequences_increase_per_session() {
        let conn = setup();
        let data = json!({});
        let first = TraceRepo::upsert(&conn, &step("a", TraceStatus::Success, &data)).unwrap();
        let second = TraceRepo::upsert(&conn, &step("b", TraceStatus::Success, &data)).unwrap();
        assert_eq!(first.row.seq, 1);
        assert_eq!(second.row.seq, 2);
    }

    #[test]
    fn append_to_missing_session_fails() {
        let conn = setup();
        let data = json!({});
        let result = TraceRepo::upsert(
            &conn,
            &RecordStepOptions {
                session_id: "nope",
                step_id: "a",
                agent_name: "Voice Agent",
                status: TraceStatus::Success,
                data: &data,
            },
        );
        // Foreign key violation surfaces as a SQLite error.
        assert!(matches!(result, Err(StoreError::Sqlite(_))));
    }

    // ── merge ──

    #[test]
    fn second_record_merges_preserving_order_keys() {
        let conn = setup();
        let request = json!({"imageUrl": "img://raw/1"});
        let appended =
            TraceRepo::upsert(&conn, &step("enhance", TraceStatus::InProgress, &request)).unwrap();

        let response = json!({"enhancedImageUrl": "img://enhanced/1"});
        let merged = TraceRepo::upsert(&conn, &step("enhance", TraceStatus::Success, &response)).unwrap();

        assert!(!merged.appended);
        assert_eq!(merged.prior_status, Some(TraceStatus::InProgress));
        assert_eq!(merged.row.status, TraceStatus::Success);
        // Creation timestamp and sequence survive the merge.
        assert_eq!(merged.row.timestamp, appended.row.timestamp);
        assert_eq!(merged.row.seq, appended.row.seq);
        assert!(merged.row.updated_at.is_some());
        // Payload shallow-merged.
        assert_eq!(merged.row.data["imageUrl"], "img://raw/1");
        assert_eq!(merged.row.data["enhancedImageUrl"], "img://enhanced/1");
    }

    #[test]
    fn merge_overrides_conflicting_keys() {
        let conn = setup();
        let first = json!({"note": "old", "keep": true});
        let _ = TraceRepo::upsert(&conn, &step("x", TraceStatus::Pending, &first)).unwrap();
        let second = json!({"note": "new"});
        let merged = TraceRepo::upsert(&conn, &step("x", TraceStatus::Done, &second)).unwrap();
        assert_eq!(merged.row.data["note"], "new");
        assert_eq!(merged.row.data["keep"], true);
    }

    #[test]
    fn merge_persists_to_store() {
        let conn = setup();
        let data = json!({"a": 1});
        let _ = TraceRepo::upsert(&conn, &step("x", TraceStatus::InProgress, &data)).unwrap();
        let update = json!({"b": 2});
        let _ = TraceRepo::upsert(&conn, &step("x", TraceStatus::Success, &update)).unwrap();

        let row = TraceRepo::get(&conn, "s1", "x").unwrap().unwrap();
        assert_eq!(row.status, TraceStatus::Success);
        assert_eq!(row.data, json!({"a": 1, "b": 2}));
        assert_eq!(TraceRepo::count_by_session(&conn, "s1").unwrap(), 1);
    }

    // ── list ──

    #[test]
    fn list_orders_by_timestamp_then_seq() {
        let conn = setup();
        let data = json!({});
        for step_id in ["first", "second", "third"] {
            let _ = TraceRepo::upsert(&conn, &step(step_id, TraceStatus::Success, &data)).unwrap();
        }

        let rows = TraceRepo::list_by_session(&conn, "s1").unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.step_id.as_str()).collect();
        assert_eq!(ids, ["first", "second", "third"]);

        for pair in rows.windows(2) {
            assert!((pair[0].timestamp.as_str(), pair[0].seq) < (pair[1].timestamp.as_str(), pair[1].seq));
        }
    }

    #[test]
    fn merged_entry_keeps_its_list_position() {
        let conn = setup();
        let data = json!({});
        let _ = TraceRepo::upsert(&conn, &step("first", TraceStatus::InProgress, &data)).unwrap();
        let _ = TraceRepo::upsert(&conn, &step("second", TraceStatus::Success, &data)).unwrap();
        // Late merge on the earlier step must not reorder it.
        let _ = TraceRepo::upsert(&conn, &step("first", TraceStatus::Success, &data)).unwrap();

        let rows = TraceRepo::list_by_session(&conn, "s1").unwrap();
        let ids: Vec<&str> = rows.iter().map(|r| r.step_id.as_str()).collect();
        assert_eq!(ids, ["first", "second"]);
    }

    #[test]
    fn list_empty_session() {
        let conn = setup();
        assert!(TraceRepo::list_by_session(&conn, "s1").unwrap().is_empty());
    }

    // ── merge_payload ──

    #[test]
    fn merge_payload_non_object_replaces() {
        let merged = merge_payload(&json!({"a": 1}), &json!("flat"));
        assert_eq!(merged, json!("flat"));
    }

    #[test]
    fn merge_payload_into_non_object_replaces() {
        let merged = merge_payload(&json!(42), &json!({"a": 1}));
        assert_eq!(merged, json!({"a": 1}));
    }
}
