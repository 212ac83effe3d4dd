//! Tiered session storage for Stratum.
//!
//! A session store composed from an ordered stack of storage tiers.  A read
//! cascades through progressively slower tiers (memory → external cache →
//! durable table), each tier able to populate itself lazily from the one
//! below; writes, deletes, and cleanup passes propagate through every tier so
//! the stack converges after each mutation.  An optional encryption tier
//! transforms payloads in flight so everything below it only ever sees
//! ciphertext.
//!
//! The pieces:
//! - [`handler::Handler`] — the five-operation contract every tier implements,
//!   threaded together with typed continuations.
//! - [`chain::HandlerChain`] — the ordered, immutable stack and its unified
//!   read/write/delete/clean surface.
//! - [`handlers`] — memory, option-store, object-cache, durable-table, and
//!   encryption tiers.
//! - [`session::Session`] — the per-request facade binding one session ID to
//!   an in-memory data bag with throttled expiry refresh.
//! - [`admin`] — bulk count/delete/generate operations against the durable
//!   table, outside the per-request chain.

pub mod admin;
pub mod chain;
pub mod handler;
pub mod handlers;
pub mod record;
pub mod session;
pub mod token;

pub use chain::{ChainBuilder, HandlerChain};
pub use handler::{sanitize_key, Handler};
pub use handlers::cache::{CacheHandler, InProcessCache, ObjectCache};
pub use handlers::database::{DatabaseHandler, SessionRow, SessionTable};
pub use handlers::encryption::EncryptionHandler;
pub use handlers::memory::MemoryHandler;
pub use handlers::options::{MemoryOptionStore, OptionStore, OptionsHandler};
pub use record::OptionRecord;
pub use session::Session;
pub use token::SessionToken;
