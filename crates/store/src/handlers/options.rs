//! Plain key-value option-store tier.
//!
//! The durable fallback for deployments without a dedicated session table.
//! Each session occupies two entries — `_session_<id>` for the payload and
//! `_session_expires_<id>` for the write timestamp — so the value and its
//! metadata never collide even though the store has no native TTL.

use std::collections::BTreeMap;
use std::sync::Arc;

use chrono::Utc;
use parking_lot::RwLock;
use stratum_domain::Result;

use crate::handler::{sanitize_key, CleanNext, DeleteNext, Handler, ReadNext, WriteNext};
use crate::record::OptionRecord;

const VALUE_PREFIX: &str = "_session_";
const EXPIRES_PREFIX: &str = "_session_expires_";

/// Contract for a plain key-value option store: opaque string values, no
/// TTL, prefix enumeration for cleanup.
pub trait OptionStore: Send + Sync {
    fn get(&self, name: &str) -> Option<String>;
    fn set(&self, name: &str, value: &str);
    fn delete(&self, name: &str);
    /// All `(name, value)` pairs whose name starts with `prefix`.
    fn scan_prefix(&self, prefix: &str) -> Vec<(String, String)>;
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct OptionsHandler {
    store: Arc<dyn OptionStore>,
    lifetime_secs: u64,
    clean_batch: usize,
}

impl OptionsHandler {
    pub fn new(store: Arc<dyn OptionStore>, lifetime_secs: u64, clean_batch: usize) -> Self {
        Self {
            store,
            lifetime_secs,
            clean_batch,
        }
    }

    fn value_key(id: &str) -> String {
        format!("{VALUE_PREFIX}{id}")
    }

    fn expires_key(id: &str) -> String {
        format!("{EXPIRES_PREFIX}{id}")
    }

    fn purge(&self, id: &str) {
        self.store.delete(&Self::value_key(id));
        self.store.delete(&Self::expires_key(id));
    }

    fn store_record(&self, id: &str, record: &OptionRecord) {
        self.store.set(&Self::value_key(id), record.data());
        self.store
            .set(&Self::expires_key(id), &record.time().to_string());
    }

    /// Local lookup with freshness check.  A stale pair is purged on sight
    /// and reported as a miss.
    fn local_read(&self, id: &str) -> Option<String> {
        let data = self.store.get(&Self::value_key(id))?;
        let time = self
            .store
            .get(&Self::expires_key(id))
            .and_then(|v| v.parse::<i64>().ok())
            .unwrap_or(0);

        let record = OptionRecord::with_time(data, time);
        if !record.is_valid(self.lifetime_secs, Utc::now().timestamp()) {
            self.purge(id);
            return None;
        }

        Some(record.data().to_owned())
    }
}

impl Handler for OptionsHandler {
    fn read(&self, key: &str, next: ReadNext<'_>) -> Option<String> {
        let id = sanitize_key(key);

        if let Some(data) = self.local_read(&id) {
            return Some(data);
        }

        let data = next.call(key)?;
        self.store_record(&id, &OptionRecord::new(data.clone()));
        Some(data)
    }

    fn write(&self, key: &str, data: &str, next: WriteNext<'_>) -> Result<()> {
        let id = sanitize_key(key);
        self.store_record(&id, &OptionRecord::new(data));
        next.call(key, data)
    }

    fn delete(&self, key: &str, next: DeleteNext<'_>) -> Result<()> {
        let id = sanitize_key(key);
        self.purge(&id);
        next.call(key)
    }

    fn clean(&self, max_lifetime: u64, next: CleanNext<'_>) -> Result<usize> {
        let cutoff = Utc::now().timestamp() - max_lifetime as i64;

        // Collect expired entries oldest-first, bounded to one batch.
        let mut expired: Vec<(String, i64)> = self
            .store
            .scan_prefix(EXPIRES_PREFIX)
            .into_iter()
            .filter_map(|(name, value)| {
                let time = value.parse::<i64>().ok()?;
                (time < cutoff).then_some((name, time))
            })
            .collect();
        expired.sort_by_key(|(_, time)| *time);
        expired.truncate(self.clean_batch);

        let mut removed = 0;
        for (name, _) in expired {
            let id = sanitize_key(&name[EXPIRES_PREFIX.len()..]);
            self.purge(&id);
            removed += 1;
        }

        Ok(removed + next.call(max_lifetime)?)
    }

    fn name(&self) -> &'static str {
        "options"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-memory implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// In-process [`OptionStore`] backed by an ordered map.
pub struct MemoryOptionStore {
    entries: RwLock<BTreeMap<String, String>>,
}

impl MemoryOptionStore {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(BTreeMap::new()),
        }
    }
}

impl Default for MemoryOptionStore {
    fn default() -> Self {
        Self::new()
    }
}

impl OptionStore for MemoryOptionStore {
    fn get(&self, name: &str) -> Option<String> {
        self.entries.read().get(name).cloned()
    }

    fn set(&self, name: &str, value: &str) {
        self.entries
            .write()
            .insert(name.to_owned(), value.to_owned());
    }

    fn delete(&self, name: &str) {
        self.entries.write().remove(name);
    }

    fn scan_prefix(&self, prefix: &str) -> Vec<(String, String)> {
        self.entries
            .read()
            .range(prefix.to_owned()..)
            .take_while(|(name, _)| name.starts_with(prefix))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainBuilder;

    fn options_chain(
        lifetime: u64,
        batch: usize,
    ) -> (Arc<MemoryOptionStore>, crate::chain::HandlerChain) {
        let store = Arc::new(MemoryOptionStore::new());
        let chain = ChainBuilder::new()
            .add_handler(Box::new(OptionsHandler::new(store.clone(), lifetime, batch)))
            .build();
        (store, chain)
    }

    #[test]
    fn write_creates_value_and_expiry_pair() {
        let (store, chain) = options_chain(1800, 1000);
        chain.write("abc123", "payload").unwrap();
        assert!(store.get("_session_abc123").is_some());
        assert!(store.get("_session_expires_abc123").is_some());
        assert_eq!(chain.read("abc123").as_deref(), Some("payload"));
    }

    #[test]
    fn delete_removes_both_entries() {
        let (store, chain) = options_chain(1800, 1000);
        chain.write("abc123", "payload").unwrap();
        chain.delete("abc123").unwrap();
        assert!(store.get("_session_abc123").is_none());
        assert!(store.get("_session_expires_abc123").is_none());
    }

    #[test]
    fn stale_pair_is_purged_on_read() {
        let (store, chain) = options_chain(1800, 1000);
        let stale = Utc::now().timestamp() - 3600;
        store.set("_session_old1", "payload");
        store.set("_session_expires_old1", &stale.to_string());

        assert_eq!(chain.read("old1"), None);
        assert!(store.get("_session_old1").is_none());
    }

    #[test]
    fn clean_removes_expired_oldest_first_within_batch() {
        let (store, chain) = options_chain(1800, 2);
        let now = Utc::now().timestamp();
        for (id, age) in [("a", 7200), ("b", 5400), ("c", 3600)] {
            store.set(&format!("_session_{id}"), "x");
            store.set(&format!("_session_expires_{id}"), &(now - age).to_string());
        }

        // Batch of 2: the two oldest go, the third survives this pass.
        assert_eq!(chain.clean(1800).unwrap(), 2);
        assert!(store.get("_session_a").is_none());
        assert!(store.get("_session_b").is_none());
        assert!(store.get("_session_c").is_some());

        // Next pass picks up the remainder, then the store is stable.
        assert_eq!(chain.clean(1800).unwrap(), 1);
        assert_eq!(chain.clean(1800).unwrap(), 0);
    }

    #[test]
    fn clean_leaves_fresh_sessions_alone() {
        let (store, chain) = options_chain(1800, 1000);
        chain.write("fresh", "payload").unwrap();
        assert_eq!(chain.clean(1800).unwrap(), 0);
        assert!(store.get("_session_fresh").is_some());
    }
}
