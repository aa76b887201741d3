//! Date index commands.

use chrono::NaiveDate;
use clap::Subcommand;

use super::common::{print_date, resolve_comic};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Index subcommands.
#[derive(Debug, Subcommand)]
pub enum IndexCommands {
    /// Rebuild date indexes from the files on disk
    Rebuild {
        /// Comic name or id (default: every comic in the catalog)
        #[arg(long)]
        comic: Option<String>,

        /// Check each strip's metadata sidecar while scanning
        #[arg(long)]
        validate: bool,
    },

    /// Show the first archived date after DATE
    Next {
        /// Comic name or id
        comic: String,
        /// Reference date (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Show the last archived date before DATE
    Prev {
        /// Comic name or id
        comic: String,
        /// Reference date (YYYY-MM-DD)
        date: NaiveDate,
    },

    /// Show the newest archived date
    Newest {
        /// Comic name or id
        comic: String,
    },

    /// Show the oldest archived date
    Oldest {
        /// Comic name or id
        comic: String,
    },
}

/// Run an index subcommand.
pub fn run(runner: &CliRunner, command: IndexCommands) -> Result<(), CliError> {
    let service = runner.service()?;
    let catalog = service.load_catalog()?;
    let index = service.index();

    match command {
        IndexCommands::Rebuild { comic, validate } => {
            runner.log_startup("index rebuild");
            let comics = match comic {
                Some(name) => vec![resolve_comic(&catalog, &name)?],
                None => catalog.comics().to_vec(),
            };
            for (identity, count) in service.rebuild_indexes(&comics, validate) {
                println!("{}: {} dates", identity, count);
            }
        }
        IndexCommands::Next { comic, date } => {
            let comic = resolve_comic(&catalog, &comic)?.identity();
            print_date("Next", index.get_next_date(&comic, date));
        }
        IndexCommands::Prev { comic, date } => {
            let comic = resolve_comic(&catalog, &comic)?.identity();
            print_date("Previous", index.get_previous_date(&comic, date));
        }
        IndexCommands::Newest { comic } => {
            let comic = resolve_comic(&catalog, &comic)?.identity();
            print_date("Newest", index.get_newest_date(&comic));
        }
        IndexCommands::Oldest { comic } => {
            let comic = resolve_comic(&catalog, &comic)?.identity();
            print_date("Oldest", index.get_oldest_date(&comic));
        }
    }

    Ok(())
}
