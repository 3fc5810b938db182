//! Stateless repositories over `&rusqlite::Connection`.
//!
//! Repositories own the SQL for one table each; transactions and per-session
//! serialization live in the [`crate::store::session_store::SessionStore`]
//! facade.

pub mod session;
pub mod trace;

use chrono::{SecondsFormat, Utc};

/// Current time as an RFC 3339 string with microsecond precision.
///
/// Microseconds keep timestamps distinct in tight loops; remaining ties are
/// broken by the trace `seq` column.
pub(crate) fn now_rfc3339() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}
