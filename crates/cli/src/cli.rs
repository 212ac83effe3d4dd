use clap::{Parser, Subcommand};

/// Stratum — tiered session storage maintenance.
#[derive(Debug, Parser)]
#[command(name = "stratum", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Count the sessions stored in the durable table.
    Count,
    /// Delete expired sessions (default: loop batch-wise until none remain).
    Delete {
        /// Purge every session, expired or not.
        #[arg(long)]
        all: bool,
        /// Batch size per deletion pass (defaults to the configured cleanup batch).
        #[arg(long)]
        batch: Option<usize>,
        /// Delete at most this many expired sessions, then stop.
        #[arg(long)]
        limit: Option<usize>,
    },
    /// Insert synthetic sessions for load testing.
    Generate {
        /// Number of sessions to create.
        count: usize,
        /// Expiry for each session, RFC 3339 (default: now + session lifetime).
        #[arg(long)]
        expires: Option<String>,
    },
    /// Run one bounded cleanup pass through the full handler chain.
    Clean,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn delete_flags_parse() {
        let cli = Cli::parse_from(["stratum", "delete", "--batch", "50", "--limit", "200"]);
        match cli.command {
            Command::Delete { all, batch, limit } => {
                assert!(!all);
                assert_eq!(batch, Some(50));
                assert_eq!(limit, Some(200));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn generate_requires_count() {
        assert!(Cli::try_parse_from(["stratum", "generate"]).is_err());
        assert!(Cli::try_parse_from(["stratum", "generate", "5000"]).is_ok());
    }

    #[test]
    fn non_numeric_batch_is_rejected() {
        assert!(Cli::try_parse_from(["stratum", "delete", "--batch", "many"]).is_err());
    }
}
