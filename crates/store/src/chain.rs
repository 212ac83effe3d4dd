//! The ordered tier stack and its unified operation surface.
//!
//! [`ChainBuilder`] collects tiers while the chain is still mutable;
//! [`ChainBuilder::build`] freezes the ordering for good.  The first
//! registered tier is the first consulted on reads and the first to receive
//! writes — fastest and most volatile tiers go in front, durable storage at
//! the back, with the encryption tier placed just behind memory so every
//! slower tier only ever holds ciphertext.

use std::sync::Arc;

use stratum_domain::{Config, Result, TraceEvent};

use crate::handler::{CleanNext, CreateNext, DeleteNext, Handler, ReadNext, WriteNext};
use crate::handlers::cache::{CacheHandler, InProcessCache};
use crate::handlers::database::{DatabaseHandler, SessionTable};
use crate::handlers::encryption::EncryptionHandler;
use crate::handlers::memory::MemoryHandler;
use crate::handlers::options::{MemoryOptionStore, OptionsHandler};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Builder
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Accumulates tiers before the chain goes live.  Registration order is
/// significant: tier 0 is checked first on every read.
#[derive(Default)]
pub struct ChainBuilder {
    handlers: Vec<Box<dyn Handler>>,
}

impl ChainBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a tier at the back of the chain.
    pub fn add_handler(mut self, handler: Box<dyn Handler>) -> Self {
        self.handlers.push(handler);
        self
    }

    /// Freeze the chain.  One-way transition: once built, the tier list can
    /// no longer change.
    pub fn build(self) -> HandlerChain {
        let tiers: Vec<String> = self
            .handlers
            .iter()
            .map(|h| h.name().to_owned())
            .collect();
        TraceEvent::ChainBuilt { tiers }.emit();

        HandlerChain {
            handlers: self.handlers,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Chain
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The frozen tier stack.  Every operation threads a continuation through
/// the tiers from front to back.
pub struct HandlerChain {
    handlers: Vec<Box<dyn Handler>>,
}

impl HandlerChain {
    /// Build the concrete chain an application configuration calls for.
    ///
    /// Tier order: memory, then encryption (when a key is configured), then
    /// the external cache (when enabled), then the durable tier — the plain
    /// option store when `use_options` is set, the session table otherwise.
    /// All branching on configuration happens here, once; the tiers
    /// themselves never consult config at request time.
    pub fn from_config(config: &Config, table: Option<Arc<SessionTable>>) -> Result<Self> {
        let mut builder = ChainBuilder::new().add_handler(Box::new(MemoryHandler::new()));

        if let Some(ref passphrase) = config.storage.encryption_key {
            builder = builder.add_handler(Box::new(EncryptionHandler::new(passphrase)?));
        }

        if config.storage.use_cache {
            builder = builder.add_handler(Box::new(CacheHandler::new(
                Arc::new(InProcessCache::new()),
                &config.storage.cache_namespace,
                config.session.lifetime_secs,
            )));
        }

        if config.storage.use_options {
            builder = builder.add_handler(Box::new(OptionsHandler::new(
                Arc::new(MemoryOptionStore::new()),
                config.session.lifetime_secs,
                config.cleanup.batch,
            )));
        } else {
            builder = builder.add_handler(Box::new(DatabaseHandler::new(
                table,
                config.session.lifetime_secs,
                config.cleanup.batch,
            )));
        }

        Ok(builder.build())
    }

    /// Number of tiers in the chain.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run the initialization hook through every tier.
    pub fn create(&self, path: &str, name: &str) -> Result<()> {
        CreateNext::new(&self.handlers).call(path, name)
    }

    /// Read through the chain.  `None` means no tier holds a valid record.
    pub fn read(&self, key: &str) -> Option<String> {
        ReadNext::new(&self.handlers).call(key)
    }

    /// Write through every tier.  Empty data is a delete: no tier may retain
    /// empty state, so the chain converts the operation before any tier
    /// sees it.
    pub fn write(&self, key: &str, data: &str) -> Result<()> {
        if data.is_empty() {
            return self.delete(key);
        }
        WriteNext::new(&self.handlers).call(key, data)
    }

    /// Delete from every tier.
    pub fn delete(&self, key: &str) -> Result<()> {
        DeleteNext::new(&self.handlers).call(key)
    }

    /// Run one bounded cleanup pass through every tier.  Returns the number
    /// of expired records removed chain-wide.
    pub fn clean(&self, max_lifetime: u64) -> Result<usize> {
        let removed = CleanNext::new(&self.handlers).call(max_lifetime)?;
        TraceEvent::CleanupPass { removed }.emit();
        Ok(removed)
    }
}
