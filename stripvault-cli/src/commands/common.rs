//! Helpers shared across CLI commands.

use chrono::{Local, NaiveDate};
use stripvault::comic::{ComicCatalog, ComicItem};

use crate::error::CliError;

/// Find a comic by numeric id or by name (case-insensitive).
pub fn resolve_comic(catalog: &ComicCatalog, name_or_id: &str) -> Result<ComicItem, CliError> {
    let by_id = name_or_id
        .trim()
        .parse::<u32>()
        .ok()
        .and_then(|id| catalog.get(id));

    by_id
        .or_else(|| catalog.find_by_name(name_or_id.trim()))
        .cloned()
        .ok_or_else(|| CliError::ComicNotFound(name_or_id.to_string()))
}

/// The given date, or today in local time.
pub fn date_or_today(date: Option<NaiveDate>) -> NaiveDate {
    date.unwrap_or_else(|| Local::now().date_naive())
}

/// Print a placeholder for a missing navigation result.
pub fn print_date(label: &str, date: Option<NaiveDate>) {
    match date {
        Some(date) => println!("{}: {}", label, date),
        None => println!("{}: (none)", label),
    }
}
