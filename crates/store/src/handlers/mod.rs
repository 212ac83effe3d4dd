//! Concrete tiers: memory, object cache, plain option store, durable table,
//! and the encryption transform.

pub mod cache;
pub mod database;
pub mod encryption;
pub mod memory;
pub mod options;
