//! Process-local first tier.
//!
//! A plain map in front of the slower tiers so repeat reads within one
//! process never leave memory.  Tracks no expiry of its own — freshness is
//! enforced by the durable tiers it delegates to.  `flush` exists so a
//! request scope can drop its view before the next logical session runs.

use std::collections::HashMap;

use parking_lot::RwLock;
use stratum_domain::Result;

use crate::handler::{sanitize_key, CleanNext, DeleteNext, Handler, ReadNext, WriteNext};

pub struct MemoryHandler {
    entries: RwLock<HashMap<String, String>>,
}

impl MemoryHandler {
    pub fn new() -> Self {
        Self {
            entries: RwLock::new(HashMap::new()),
        }
    }

    /// Drop every cached entry.  Called between request scopes so one
    /// session's data can never bleed into another.
    pub fn flush(&self) {
        self.entries.write().clear();
    }
}

impl Default for MemoryHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl Handler for MemoryHandler {
    fn read(&self, key: &str, next: ReadNext<'_>) -> Option<String> {
        let key = sanitize_key(key);

        // Fast path: serve from the local map without touching deeper tiers.
        {
            let entries = self.entries.read();
            if let Some(data) = entries.get(&key) {
                return Some(data.clone());
            }
        }

        // Miss: delegate, and cache whatever the deeper tiers produce.
        let data = next.call(&key)?;
        self.entries.write().insert(key, data.clone());
        Some(data)
    }

    fn write(&self, key: &str, data: &str, next: WriteNext<'_>) -> Result<()> {
        let key = sanitize_key(key);
        self.entries.write().insert(key.clone(), data.to_owned());
        next.call(&key, data)
    }

    fn delete(&self, key: &str, next: DeleteNext<'_>) -> Result<()> {
        let key = sanitize_key(key);
        self.entries.write().remove(&key);
        next.call(&key)
    }

    fn clean(&self, max_lifetime: u64, next: CleanNext<'_>) -> Result<usize> {
        // No expiry tracking here; the durable tiers own cleanup.
        next.call(max_lifetime)
    }

    fn name(&self) -> &'static str {
        "memory"
    }
}
