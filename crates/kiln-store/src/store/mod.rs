//! High-level store facade over the `SQLite` backend.

pub mod session_store;
