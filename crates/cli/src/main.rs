use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use stratum_cli::cli::{Cli, Command};
use stratum_cli::{load_config, open_table};
use stratum_store::HandlerChain;

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    let cli = Cli::parse();
    let (config, config_path) = load_config()?;
    tracing::debug!(config = %config_path, "configuration loaded");

    match cli.command {
        Command::Count => {
            let table = open_table(&config)?;
            println!(
                "{} sessions currently exist.",
                stratum_store::admin::count_sessions(&table)
            );
            Ok(())
        }
        Command::Delete { all, batch, limit } => {
            let table = open_table(&config)?;
            stratum_cli::commands::delete(&table, all, batch.unwrap_or(config.cleanup.batch), limit)
        }
        Command::Generate { count, expires } => {
            let table = open_table(&config)?;
            let expires_at = stratum_cli::commands::resolve_expiry(
                expires.as_deref(),
                config.session.lifetime_secs,
            )?;
            let created = stratum_store::admin::generate_sessions(&table, count, expires_at)
                .context("generating sessions")?;
            println!("Generated {created} sessions.");
            Ok(())
        }
        Command::Clean => {
            let table = open_table(&config)?;
            let chain = HandlerChain::from_config(&config, Some(Arc::new(table)))
                .context("building handler chain")?;
            let removed = chain
                .clean(config.session.lifetime_secs)
                .context("running cleanup pass")?;
            println!("Removed {removed} expired sessions.");
            Ok(())
        }
    }
}
