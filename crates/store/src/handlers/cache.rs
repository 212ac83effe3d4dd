//! External object-cache tier.
//!
//! Wraps an opaque grouped key-value cache behind [`ObjectCache`].  Entries
//! live under `session_<id>` in a configurable namespace group with a TTL
//! equal to the session lifetime; the cache is trusted to expire entries on
//! its own, so the cleanup pass is a no-op here.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::RwLock;
use stratum_domain::Result;

use crate::handler::{sanitize_key, CleanNext, DeleteNext, Handler, ReadNext, WriteNext};

/// Contract for an external object cache: grouped keys, per-entry TTL,
/// best-effort storage.  Implementations never surface errors — a broken
/// cache just behaves as permanently empty.
pub trait ObjectCache: Send + Sync {
    fn get(&self, group: &str, key: &str) -> Option<String>;
    fn set(&self, group: &str, key: &str, value: &str, ttl: Duration);
    fn delete(&self, group: &str, key: &str);
    fn flush(&self);
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Handler
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub struct CacheHandler {
    cache: Arc<dyn ObjectCache>,
    group: String,
    lifetime_secs: u64,
}

impl CacheHandler {
    pub fn new(cache: Arc<dyn ObjectCache>, group: &str, lifetime_secs: u64) -> Self {
        Self {
            cache,
            group: group.to_owned(),
            lifetime_secs,
        }
    }

    fn cache_key(&self, key: &str) -> String {
        format!("session_{}", sanitize_key(key))
    }

    fn ttl(&self) -> Duration {
        Duration::from_secs(self.lifetime_secs)
    }
}

impl Handler for CacheHandler {
    fn read(&self, key: &str, next: ReadNext<'_>) -> Option<String> {
        let cache_key = self.cache_key(key);

        if let Some(data) = self.cache.get(&self.group, &cache_key) {
            return Some(data);
        }

        let data = next.call(key)?;
        self.cache.set(&self.group, &cache_key, &data, self.ttl());
        Some(data)
    }

    fn write(&self, key: &str, data: &str, next: WriteNext<'_>) -> Result<()> {
        let cache_key = self.cache_key(key);
        self.cache.set(&self.group, &cache_key, data, self.ttl());
        next.call(key, data)
    }

    fn delete(&self, key: &str, next: DeleteNext<'_>) -> Result<()> {
        let cache_key = self.cache_key(key);
        self.cache.delete(&self.group, &cache_key);
        next.call(key)
    }

    fn clean(&self, max_lifetime: u64, next: CleanNext<'_>) -> Result<usize> {
        // The external cache expires entries on its own.
        next.call(max_lifetime)
    }

    fn name(&self) -> &'static str {
        "cache"
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// In-process implementation
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Default in-process [`ObjectCache`]: a map with per-entry deadlines,
/// evicting lazily on `get`.  Stands in for memcached/redis in deployments
/// without one.
pub struct InProcessCache {
    entries: RwLock<HashMap<(String, String), (String, Instant)>>,
}

impl InProcessCache {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }
}

impl Default for InProcessCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ObjectCache for InProcessCache {
    fn get(&self, group: &str, key: &str) -> Option<String> {
        let map_key = (group.to_owned(), key.to_owned());

        {
            let entries = self.entries.read();
            match entries.get(&map_key) {
                Some((value, deadline)) if Instant::now() < *deadline => {
                    return Some(value.clone());
                }
                Some(_) => {}
                None => return None,
            }
        }

        // Entry exists but is past its deadline: evict it.
        self.entries.write().remove(&map_key);
        None
    }

    fn set(&self, group: &str, key: &str, value: &str, ttl: Duration) {
        let deadline = Instant::now() + ttl;
        self.entries.write().insert(
            (group.to_owned(), key.to_owned()),
            (value.to_owned(), deadline),
        );
    }

    fn delete(&self, group: &str, key: &str) {
        self.entries
            .write()
            .remove(&(group.to_owned(), key.to_owned()));
    }

    fn flush(&self) {
        self.entries.write().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chain::ChainBuilder;

    #[test]
    fn round_trip_through_cache_tier() {
        let cache = Arc::new(InProcessCache::new());
        let chain = ChainBuilder::new()
            .add_handler(Box::new(CacheHandler::new(cache.clone(), "sessions", 1800)))
            .build();

        chain.write("abc123", "payload").unwrap();
        assert_eq!(chain.read("abc123").as_deref(), Some("payload"));
        // Stored under the namespaced cache key, not the raw session ID.
        assert!(cache.get("sessions", "session_abc123").is_some());
    }

    #[test]
    fn delete_removes_cache_entry() {
        let cache = Arc::new(InProcessCache::new());
        let chain = ChainBuilder::new()
            .add_handler(Box::new(CacheHandler::new(cache.clone(), "sessions", 1800)))
            .build();

        chain.write("abc123", "payload").unwrap();
        chain.delete("abc123").unwrap();
        assert_eq!(chain.read("abc123"), None);
        assert!(cache.get("sessions", "session_abc123").is_none());
    }

    #[test]
    fn expired_cache_entry_is_evicted_on_get() {
        let cache = InProcessCache::new();
        cache.set("sessions", "k", "v", Duration::from_secs(0));
        assert_eq!(cache.get("sessions", "k"), None);
        assert!(cache.entries.read().is_empty());
    }

    #[test]
    fn groups_do_not_collide() {
        let cache = InProcessCache::new();
        cache.set("a", "k", "1", Duration::from_secs(60));
        cache.set("b", "k", "2", Duration::from_secs(60));
        assert_eq!(cache.get("a", "k").as_deref(), Some("1"));
        assert_eq!(cache.get("b", "k").as_deref(), Some("2"));
    }
}
