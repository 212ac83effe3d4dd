//! Durable session-table tier.
//!
//! One row per session — sanitized 32-char key, opaque serialized payload,
//! integer expiry — persisted as a JSON table file under the configured
//! path.  The on-disk format carries a schema version; migration is
//! monotonic and idempotent, safe to run on every boot.
//!
//! The handler degrades gracefully: constructed without a table it becomes a
//! forwarding no-op, so the chain keeps working through the other tiers when
//! no durable storage is available.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::Utc;
use parking_lot::{RwLock, RwLockWriteGuard};
use serde::{Deserialize, Serialize};
use stratum_domain::{Error, Result};

use crate::handler::{sanitize_key, CleanNext, DeleteNext, Handler, ReadNext, WriteNext};

/// Current on-disk schema version.  v1 carried a redundant `session_id`
/// column per row; v2 dropped it.  Parsing ignores the legacy column, so
/// migration is just a version bump plus rewrite.
const SCHEMA_VERSION: u32 = 2;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Table
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// One stored session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRow {
    pub session_key: String,
    pub session_value: String,
    pub session_expiry: i64,
}

#[derive(Debug, Default, Serialize, Deserialize)]
struct TableFile {
    #[serde(default)]
    schema_version: u32,
    #[serde(default)]
    rows: Vec<SessionRow>,
}

/// The durable session table: an in-memory row map persisted to a JSON file
/// on every mutation.  Also carries the bulk operations the administrative
/// surface uses directly, outside the handler chain.
pub struct SessionTable {
    path: PathBuf,
    rows: RwLock<HashMap<String, SessionRow>>,
}

impl SessionTable {
    /// Load or create the table at `path`, running the schema migration if
    /// the file predates the current version.
    pub fn open(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).map_err(Error::Io)?;
        }

        let (file, needs_rewrite) = if path.exists() {
            let raw = std::fs::read_to_string(path).map_err(Error::Io)?;
            let file: TableFile = serde_json::from_str(&raw).unwrap_or_default();
            let stale = file.schema_version < SCHEMA_VERSION;
            if stale {
                tracing::info!(
                    from = file.schema_version,
                    to = SCHEMA_VERSION,
                    "migrating session table schema"
                );
            }
            (file, stale)
        } else {
            (TableFile::default(), false)
        };

        let rows: HashMap<String, SessionRow> = file
            .rows
            .into_iter()
            .map(|row| (row.session_key.clone(), row))
            .collect();

        tracing::info!(
            sessions = rows.len(),
            path = %path.display(),
            "session table loaded"
        );

        let table = Self {
            path: path.to_path_buf(),
            rows: RwLock::new(rows),
        };

        if needs_rewrite {
            let guard = table.rows.write();
            table.persist_locked(&guard)?;
        }

        Ok(table)
    }

    fn persist_locked(&self, rows: &RwLockWriteGuard<'_, HashMap<String, SessionRow>>) -> Result<()> {
        let mut out: Vec<SessionRow> = rows.values().cloned().collect();
        out.sort_by(|a, b| a.session_key.cmp(&b.session_key));
        let file = TableFile {
            schema_version: SCHEMA_VERSION,
            rows: out,
        };
        let json = serde_json::to_string_pretty(&file).map_err(Error::Json)?;
        std::fs::write(&self.path, json).map_err(Error::Io)?;
        Ok(())
    }

    /// Look up a row by sanitized key.
    pub fn get(&self, key: &str) -> Option<SessionRow> {
        self.rows.read().get(key).cloned()
    }

    /// Insert or overwrite a row.
    pub fn upsert(&self, row: SessionRow) -> Result<()> {
        let mut rows = self.rows.write();
        rows.insert(row.session_key.clone(), row);
        self.persist_locked(&rows)
    }

    /// Remove a row.  Returns whether anything was there.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let mut rows = self.rows.write();
        let removed = rows.remove(key).is_some();
        if removed {
            self.persist_locked(&rows)?;
        }
        Ok(removed)
    }

    /// Remove up to `limit` rows with `expiry < now`, oldest-expiring first.
    /// Returns the number removed.
    pub fn delete_expired(&self, now: i64, limit: usize) -> Result<usize> {
        let mut rows = self.rows.write();

        let mut victims: Vec<(String, i64)> = rows
            .values()
            .filter(|row| row.session_expiry < now)
            .map(|row| (row.session_key.clone(), row.session_expiry))
            .collect();
        victims.sort_by_key(|(_, expiry)| *expiry);
        victims.truncate(limit);

        for (key, _) in &victims {
            rows.remove(key);
        }
        if !victims.is_empty() {
            self.persist_locked(&rows)?;
        }
        Ok(victims.len())
    }

    /// Remove every row.  Returns the number removed.
    pub fn delete_all(&self) -> Result<usize> {
        let mut rows = self.rows.write();
        let count = rows.len();
        rows.clear();
        self.persist_locked(&rows)?;
        Ok(count)
    }

    /// Total number of stored sessions.
    pub fn count(&self) -> usize {
        self.rows.read().len()
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct DatabaseHandler {
    table: Option<Arc<SessionTable>>,
    lifetime_secs: u64,
    clean_batch: usize,
}

impl DatabaseHandler {
    /// `table = None` builds the degraded variant: every operation is a
    /// local no-op that still forwards down the chain.
    pub fn new(table: Option<Arc<SessionTable>>, lifetime_secs: u64, clean_batch: usize) -> Self {
        Self {
            table,
            lifetime_secs,
            clean_batch,
        }
    }

    /// Row lookup with the expiry check.  An expired row is purged on sight
    /// and reported as a miss.
    fn direct_read(&self, table: &SessionTable, key: &str) -> Option<String> {
        let row = table.get(key)?;
        if Utc::now().timestamp() >= row.session_expiry {
            if let Err(e) = table.remove(key) {
                tracing::warn!(error = %e, "failed to purge expired session row");
            }
            return None;
        }
        Some(row.session_value)
    }

    fn direct_write(&self, table: &SessionTable, key: &str, data: &str) {
        let result = if data.is_empty() {
            table.remove(key).map(|_| ())
        } else {
            table.upsert(SessionRow {
                session_key: key.to_owned(),
                session_value: data.to_owned(),
                session_expiry: Utc::now().timestamp() + self.lifetime_secs as i64,
            })
        };

        // A failed durable write must not block the rest of the chain.
        if let Err(e) = result {
            tracing::warn!(error = %e, "session table write failed");
        }
    }
}

impl Handler for DatabaseHandler {
    fn read(&self, key: &str, next: ReadNext<'_>) -> Option<String> {
        let Some(ref table) = self.table else {
            return next.call(key);
        };
        let id = sanitize_key(key);

        if let Some(data) = self.direct_read(table, &id) {
            return Some(data);
        }

        let data = next.call(key)?;
        self.direct_write(table, &id, &data);
        Some(data)
    }

    fn write(&self, key: &str, data: &str, next: WriteNext<'_>) -> Result<()> {
        if let Some(ref table) = self.table {
            let id = sanitize_key(key);
            self.direct_write(table, &id, data);
        }
        next.call(key, data)
    }

    fn delete(&self, key: &str, next: DeleteNext<'_>) -> Result<()> {
        if let Some(ref table) = self.table {
            let id = sanitize_key(key);
            if let Err(e) = table.remove(&id) {
                tracing::warn!(error = %e, "session table delete failed");
            }
        }
        next.call(key)
    }

    fn clean(&self, max_lifetime: u64, next: CleanNext<'_>) -> Result<usize> {
        let removed = match self.table {
            Some(ref table) => table
                .delete_expired(Utc::now().timestamp(), self.clean_batch)
                .unwrap_or_else(|e| {
                    tracing::warn!(error = %e, "session table cleanup failed");
                    0
                }),
            None => 0,
        };
        Ok(removed + next.call(max_lifetime)?)
    }

    fn name(&self) -> &'static str {
        "database"
    }
}
