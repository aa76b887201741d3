//! StripVault CLI - Command-line interface
//!
//! Downloads daily comic strips into the archive, backfills gaps and
//! navigates the per-comic date index.

mod commands;
mod error;
mod runner;

use std::path::PathBuf;
use std::process;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use commands::backfill::BackfillArgs;
use commands::config::ConfigCommands;
use commands::daemon::{DaemonArgs, DEFAULT_INTERVAL_HOURS, MAX_INTERVAL_HOURS};
use commands::index::IndexCommands;
use error::CliError;
use runner::CliRunner;

#[derive(Debug, Parser)]
#[command(name = "stripvault", version, about = "Acquire, archive and index daily comic strips")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Download one date's strip for every enabled comic
    Today {
        /// Date to download (YYYY-MM-DD, default: today)
        #[arg(long)]
        date: Option<NaiveDate>,
    },

    /// Fetch strips missing from the archive
    Backfill {
        /// Only print the planned downloads
        #[arg(long)]
        dry_run: bool,

        /// Limit to one comic (name or id)
        #[arg(long)]
        comic: Option<String>,

        /// Plan as if today were this date (YYYY-MM-DD)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Download on a fixed interval until interrupted
    Daemon {
        /// Hours between download cycles
        #[arg(
            long,
            default_value_t = DEFAULT_INTERVAL_HOURS,
            value_parser = clap::value_parser!(u64).range(1..=MAX_INTERVAL_HOURS)
        )]
        interval_hours: u64,

        /// Also run a backfill pass each cycle
        #[arg(long)]
        backfill: bool,
    },

    /// Date index navigation and maintenance
    Index {
        #[command(subcommand)]
        command: IndexCommands,
    },

    /// Rebuild content hashes for a comic
    Rehash {
        /// Comic name or id
        #[arg(long)]
        comic: String,

        /// Only this year (default: every archived year)
        #[arg(long)]
        year: Option<i32>,
    },

    /// Show archived ranges and disk usage per comic
    Status,

    /// View or change configuration
    Config {
        #[command(subcommand)]
        command: ConfigCommands,
    },
}

fn main() {
    let cli = Cli::parse();

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        process::exit(1);
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let config_path = cli.config.as_deref();

    // Config commands work even when the file is broken.
    if let Commands::Config { command } = cli.command {
        return commands::config::run(command, config_path);
    }

    let runner = CliRunner::new(config_path)?;
    match cli.command {
        Commands::Today { date } => commands::today::run(&runner, date),
        Commands::Backfill {
            dry_run,
            comic,
            today,
        } => commands::backfill::run(
            &runner,
            BackfillArgs {
                today,
                comic,
                dry_run,
            },
        ),
        Commands::Daemon {
            interval_hours,
            backfill,
        } => commands::daemon::run(
            &runner,
            DaemonArgs {
                interval_hours,
                backfill,
            },
        ),
        Commands::Index { command } => commands::index::run(&runner, command),
        Commands::Rehash { comic, year } => commands::rehash::run(&runner, &comic, year),
        Commands::Status => commands::status::run(&runner),
        Commands::Config { .. } => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_parse_backfill() {
        let cli = Cli::try_parse_from([
            "stripvault",
            "--config",
            "/tmp/sv.ini",
            "backfill",
            "--dry-run",
            "--today",
            "2024-06-10",
        ])
        .unwrap();

        assert_eq!(cli.config, Some(PathBuf::from("/tmp/sv.ini")));
        match cli.command {
            Commands::Backfill { dry_run, today, comic } => {
                assert!(dry_run);
                assert_eq!(today, NaiveDate::from_ymd_opt(2024, 6, 10));
                assert!(comic.is_none());
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_parse_index_next() {
        let cli = Cli::try_parse_from(["stripvault", "index", "next", "Morning Paper", "2024-01-31"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Index {
                command: IndexCommands::Next { .. }
            }
        ));
    }

    #[test]
    fn test_daemon_default_interval() {
        let cli = Cli::try_parse_from(["stripvault", "daemon"]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Daemon {
                interval_hours: DEFAULT_INTERVAL_HOURS,
                backfill: false
            }
        ));
    }

    #[test]
    fn test_daemon_interval_bounds() {
        assert!(Cli::try_parse_from(["stripvault", "daemon", "--interval-hours", "0"]).is_err());
        assert!(Cli::try_parse_from(["stripvault", "daemon", "--interval-hours", "18446744073709551615"]).is_err());

        let max = MAX_INTERVAL_HOURS.to_string();
        let cli = Cli::try_parse_from(["stripvault", "daemon", "--interval-hours", max.as_str()]).unwrap();
        assert!(matches!(
            cli.command,
            Commands::Daemon {
                interval_hours: MAX_INTERVAL_HOURS,
                ..
            }
        ));
    }

    #[test]
    fn test_bad_date_rejected() {
        assert!(Cli::try_parse_from(["stripvault", "today", "--date", "31/01/2024"]).is_err());
    }
}
