//! Command bodies shared between the binary and its tests.

use anyhow::Context;
use chrono::{DateTime, Utc};

use stratum_store::{admin, SessionTable};

/// Delete sessions.  `limit` bounds one pass and returns; `all` truncates;
/// otherwise loop batch-wise until no expired sessions remain.
pub fn delete(
    table: &SessionTable,
    all: bool,
    batch: usize,
    limit: Option<usize>,
) -> anyhow::Result<()> {
    if let Some(limit) = limit {
        let count = admin::delete_old_sessions(table, limit)?;
        if count > 0 {
            println!("Deleted {count} sessions.");
        }
        return Ok(());
    }

    if all {
        let count = admin::delete_all_sessions(table)?;
        println!("Deleted all {count} sessions.");
        return Ok(());
    }

    loop {
        let count = admin::delete_old_sessions(table, batch)?;
        if count == 0 {
            break;
        }
        println!("Deleted {count} sessions.");
    }
    Ok(())
}

/// Resolve the expiry timestamp for synthetic sessions.  A malformed date is
/// reported before any session is inserted.
pub fn resolve_expiry(expires: Option<&str>, lifetime_secs: u64) -> anyhow::Result<i64> {
    match expires {
        Some(raw) => {
            let parsed = DateTime::parse_from_rfc3339(raw)
                .with_context(|| format!("invalid --expires date: {raw:?} (expected RFC 3339)"))?;
            Ok(parsed.timestamp())
        }
        None => Ok(Utc::now().timestamp() + lifetime_secs as i64),
    }
}
