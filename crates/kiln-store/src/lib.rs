//! # kiln-store
//!
//! Durable session store with a `SQLite` backend:
//!
//! - **Sessions**: one row per listing session with denormalized metric counters
//! - **Trace**: ordered per-session step entries, append-or-upsert semantics
//! - **`SQLite` backend**: `rusqlite` behind an `r2d2` pool (WAL, foreign keys)
//! - **Repositories**: stateless `SessionRepo`/`TraceRepo` over `&Connection`
//! - **Store facade**: [`SessionStore`] serializes writes per session and
//!   applies metric updates as atomic SQL increments
//! - **Migrations**: version-tracked, embedded at compile time

#![deny(unsafe_code)]

pub mod errors;
pub mod sqlite;
pub mod store;
pub mod types;

pub use errors::{Result, StoreError};
pub use sqlite::connection::{
    ConnectionConfig, ConnectionPool, PooledConnection, new_file, new_in_memory,
};
pub use sqlite::migrations::run_migrations;
pub use store::session_store::SessionStore;
pub use types::{
    CreateSessionOptions, MetricsDelta, RecordStepOptions, SessionRow, StepRecorded, TraceRow,
};
