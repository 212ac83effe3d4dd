//! Administrative CLI for the Stratum session store.
//!
//! Bulk session maintenance against the durable table — counting, batch
//! deletion, synthetic-session generation — plus a chain-wide cleanup pass.

pub mod cli;
pub mod commands;

use stratum_domain::{Config, Error};
use stratum_store::SessionTable;

/// Load configuration from `$STRATUM_CONFIG` or `config.toml`, falling back
/// to defaults when no file exists.
pub fn load_config() -> anyhow::Result<(Config, String)> {
    let config_path = std::env::var("STRATUM_CONFIG").unwrap_or_else(|_| "config.toml".into());

    let config = if std::path::Path::new(&config_path).exists() {
        let raw = std::fs::read_to_string(&config_path)
            .map_err(|e| anyhow::anyhow!("reading {config_path}: {e}"))?;
        toml::from_str(&raw).map_err(|e| anyhow::anyhow!("parsing {config_path}: {e}"))?
    } else {
        Config::default()
    };

    Ok((config, config_path))
}

/// Open the durable session table the administrative commands operate on.
/// Refuses to run without one — admin operations have no degraded mode.
pub fn open_table(config: &Config) -> anyhow::Result<SessionTable> {
    let path = config.storage.table_path.as_deref().ok_or_else(|| {
        Error::Config("no durable session table configured (storage.table_path)".into())
    })?;
    Ok(SessionTable::open(std::path::Path::new(path))?)
}
