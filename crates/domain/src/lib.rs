//! Shared types for the Stratum session store.
//!
//! Holds the error type, configuration structs, and structured trace events
//! used across all Stratum crates.

pub mod config;
pub mod error;
pub mod trace;

pub use config::Config;
pub use error::{Error, Result};
pub use trace::TraceEvent;
