use serde::{Deserialize, Serialize};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Top-level config
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub session: SessionConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    #[serde(default)]
    pub cleanup: CleanupConfig,
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Session lifetime
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Session lifetime settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Seconds until a session expires (default 30 minutes).
    #[serde(default = "d_lifetime_secs")]
    pub lifetime_secs: u64,

    /// Seconds until the expiry *variant* threshold (default 24 minutes).
    /// While the variant has not passed, active sessions keep their stored
    /// expiry untouched, so the expiry metadata is rewritten at most once
    /// per variant window instead of on every request.
    #[serde(default = "d_variant_secs")]
    pub variant_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            lifetime_secs: d_lifetime_secs(),
            variant_secs: d_variant_secs(),
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Storage tiers
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Which storage tiers the handler chain is built from, and how each is
/// addressed.  The chain builder consumes this once at startup — tiers never
/// consult configuration at request time.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Path to the durable session table file.  When unset, the database
    /// tier runs in degraded mode (local no-op, still forwards down the
    /// chain) and administrative commands refuse to run.
    #[serde(default)]
    pub table_path: Option<String>,

    /// Insert an external-cache tier in front of the durable tier.
    #[serde(default = "d_true")]
    pub use_cache: bool,

    /// Cache group the session entries are namespaced under.
    #[serde(default = "d_cache_namespace")]
    pub cache_namespace: String,

    /// Store sessions as paired key/expiry entries in a plain key-value
    /// option store instead of the session table.
    #[serde(default)]
    pub use_options: bool,

    /// Passphrase for encrypting session payloads at rest.  When set, an
    /// encryption tier wraps every tier below the in-memory one.
    #[serde(default)]
    pub encryption_key: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            table_path: None,
            use_cache: true,
            cache_namespace: d_cache_namespace(),
            use_options: false,
            encryption_key: None,
        }
    }
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Cleanup
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Stale-session cleanup settings.  An external scheduler invokes the clean
/// operation on this cadence; each pass is bounded to `batch` rows so a
/// large backlog never holds the durable store for long.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CleanupConfig {
    /// Maximum expired rows removed per cleanup pass.
    #[serde(default = "d_cleanup_batch")]
    pub batch: usize,

    /// Seconds between cleanup passes (informational — the timer itself
    /// lives outside this crate).
    #[serde(default = "d_cleanup_interval_secs")]
    pub interval_secs: u64,
}

impl Default for CleanupConfig {
    fn default() -> Self {
        Self {
            batch: d_cleanup_batch(),
            interval_secs: d_cleanup_interval_secs(),
        }
    }
}

// ── serde default helpers ───────────────────────────────────────────

fn d_lifetime_secs() -> u64 {
    30 * 60
}
fn d_variant_secs() -> u64 {
    24 * 60
}
fn d_cache_namespace() -> String {
    "sessions".into()
}
fn d_cleanup_batch() -> usize {
    1000
}
fn d_cleanup_interval_secs() -> u64 {
    60 * 60
}
fn d_true() -> bool {
    true
}
