//! Administrative bulk operations against the durable table.
//!
//! These go straight at the [`SessionTable`], not through the per-request
//! chain: counting, batch deletion of expired sessions, full truncation, and
//! synthetic-session generation for load testing.  They honor the same
//! sanitization and expiry rules as the chain tiers.

use chrono::Utc;
use stratum_domain::Result;

use crate::handlers::database::{SessionRow, SessionTable};
use crate::token::generate_id;

/// Total number of sessions currently stored.
pub fn count_sessions(table: &SessionTable) -> usize {
    table.count()
}

/// Delete up to `limit` expired sessions, oldest-expiring first.  Returns
/// the number deleted; callers loop until this reaches zero.
pub fn delete_old_sessions(table: &SessionTable, limit: usize) -> Result<usize> {
    table.delete_expired(Utc::now().timestamp(), limit)
}

/// Delete every session.  Returns the number deleted.
pub fn delete_all_sessions(table: &SessionTable) -> Result<usize> {
    table.delete_all()
}

/// Insert `count` synthetic sessions expiring at `expires` (unix seconds),
/// each with a fresh random ID and an empty-object payload.  Returns the
/// number created.
pub fn generate_sessions(table: &SessionTable, count: usize, expires: i64) -> Result<usize> {
    for _ in 0..count {
        table.upsert(SessionRow {
            session_key: generate_id(),
            session_value: "{}".into(),
            session_expiry: expires,
        })?;
    }
    Ok(count)
}
