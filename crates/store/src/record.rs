//! Immutable wrapper for option-store session entries.

use chrono::Utc;

/// A session payload paired with the timestamp it was written at.
///
/// Deliberately has no mutators: once constructed, a record's data and
/// timestamp cannot change.  Freshness is re-evaluated against the clock
/// instead of patched in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OptionRecord {
    data: String,
    time: i64,
}

impl OptionRecord {
    /// Wrap freshly-written data, stamped with the current time.
    pub fn new(data: impl Into<String>) -> Self {
        Self {
            data: data.into(),
            time: Utc::now().timestamp(),
        }
    }

    /// Rehydrate a record read back from storage.
    pub fn with_time(data: impl Into<String>, time: i64) -> Self {
        Self {
            data: data.into(),
            time,
        }
    }

    pub fn data(&self) -> &str {
        &self.data
    }

    pub fn time(&self) -> i64 {
        self.time
    }

    /// Whether the record is still fresh: `now - time < lifetime`.
    pub fn is_valid(&self, lifetime: u64, now: i64) -> bool {
        now - self.time < lifetime as i64
    }
}
