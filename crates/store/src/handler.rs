//! The tier contract and its typed continuations.
//!
//! Every storage or transform tier implements [`Handler`].  Each operation
//! receives a `next` value representing the rest of the chain; a tier either
//! short-circuits (serves from its own store without calling `next`) or
//! delegates and, for reads, opportunistically caches whatever the deeper
//! tiers produced.  The continuations are small recursive dispatchers over
//! the remaining handler slice rather than raw function pointers, so each
//! tier holds a typed capability it can only invoke once per operation.

use stratum_domain::Result;

/// One storage or transform tier in the handler chain.
///
/// Contract, shared by every tier:
/// - `read` returns `None` for a miss — misses are never errors.
/// - `write` and `delete` always forward to `next` regardless of the local
///   outcome, so deeper tiers stay consistent even when a shallow tier is
///   degraded.
/// - `clean` removes locally-expired records in a bounded batch and reports
///   the total removed across the chain.
pub trait Handler: Send + Sync {
    /// Chain initialization hook.  Almost every tier passes straight through.
    fn create(&self, path: &str, name: &str, next: CreateNext<'_>) -> Result<()> {
        next.call(path, name)
    }

    /// Look up `key` locally, or delegate to `next` on a miss.
    fn read(&self, key: &str, next: ReadNext<'_>) -> Option<String>;

    /// Persist `data` under `key` locally, then forward unconditionally.
    fn write(&self, key: &str, data: &str, next: WriteNext<'_>) -> Result<()>;

    /// Purge `key` locally, then forward unconditionally.
    fn delete(&self, key: &str, next: DeleteNext<'_>) -> Result<()>;

    /// Purge locally-expired records (`expired ⇔ now > expiry`), then
    /// forward.  Returns the number of records removed chain-wide.
    fn clean(&self, max_lifetime: u64, next: CleanNext<'_>) -> Result<usize>;

    /// Tier name used in trace output.
    fn name(&self) -> &'static str;
}

/// Normalize a session key to the storage-safe charset `[A-Za-z0-9_]`.
///
/// Applied by every tier before constructing a storage key.  Idempotent:
/// sanitizing an already-sanitized key is a no-op.  Note that distinct raw
/// identifiers can collapse to the same sanitized key (`"abc!! def"` and
/// `"abcdef"`), which is acceptable because generated session IDs never
/// contain stripped characters in the first place.
pub fn sanitize_key(key: &str) -> String {
    key.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .collect()
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Continuations
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// The rest of the chain for a `create` operation.
#[derive(Clone, Copy)]
pub struct CreateNext<'a> {
    rest: &'a [Box<dyn Handler>],
}

impl<'a> CreateNext<'a> {
    pub(crate) fn new(rest: &'a [Box<dyn Handler>]) -> Self {
        Self { rest }
    }

    pub fn call(&self, path: &str, name: &str) -> Result<()> {
        match self.rest.split_first() {
            Some((head, tail)) => head.create(path, name, CreateNext { rest: tail }),
            None => Ok(()),
        }
    }
}

/// The rest of the chain for a `read`.  The terminal continuation is the
/// miss sentinel: calling it past the last tier yields `None`.
#[derive(Clone, Copy)]
pub struct ReadNext<'a> {
    rest: &'a [Box<dyn Handler>],
}

impl<'a> ReadNext<'a> {
    pub(crate) fn new(rest: &'a [Box<dyn Handler>]) -> Self {
        Self { rest }
    }

    pub fn call(&self, key: &str) -> Option<String> {
        match self.rest.split_first() {
            Some((head, tail)) => head.read(key, ReadNext { rest: tail }),
            None => None,
        }
    }
}

/// The rest of the chain for a `write`.
#[derive(Clone, Copy)]
pub struct WriteNext<'a> {
    rest: &'a [Box<dyn Handler>],
}

impl<'a> WriteNext<'a> {
    pub(crate) fn new(rest: &'a [Box<dyn Handler>]) -> Self {
        Self { rest }
    }

    pub fn call(&self, key: &str, data: &str) -> Result<()> {
        match self.rest.split_first() {
            Some((head, tail)) => head.write(key, data, WriteNext { rest: tail }),
            None => Ok(()),
        }
    }
}

/// The rest of the chain for a `delete`.
#[derive(Clone, Copy)]
pub struct DeleteNext<'a> {
    rest: &'a [Box<dyn Handler>],
}

impl<'a> DeleteNext<'a> {
    pub(crate) fn new(rest: &'a [Box<dyn Handler>]) -> Self {
        Self { rest }
    }

    pub fn call(&self, key: &str) -> Result<()> {
        match self.rest.split_first() {
            Some((head, tail)) => head.delete(key, DeleteNext { rest: tail }),
            None => Ok(()),
        }
    }
}

/// The rest of the chain for a cleanup pass.  Accumulates the count of
/// removed records from every tier below.
#[derive(Clone, Copy)]
pub struct CleanNext<'a> {
    rest: &'a [Box<dyn Handler>],
}

impl<'a> CleanNext<'a> {
    pub(crate) fn new(rest: &'a [Box<dyn Handler>]) -> Self {
        Self { rest }
    }

    pub fn call(&self, max_lifetime: u64) -> Result<usize> {
        match self.rest.split_first() {
            Some((head, tail)) => head.clean(max_lifetime, CleanNext { rest: tail }),
            None => Ok(0),
        }
    }
}
