//! Rehash command - rebuild content hashes from archived strips.

use super::common::resolve_comic;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the rehash command for one comic, optionally limited to one year.
pub fn run(runner: &CliRunner, comic: &str, year: Option<i32>) -> Result<(), CliError> {
    runner.log_startup("rehash");
    let service = runner.service()?;
    let catalog = service.load_catalog()?;
    let comic = resolve_comic(&catalog, comic)?.identity();

    let hashes = match year {
        Some(year) => service.detector().rehash(&comic, year),
        None => service.rehash_comic(&comic),
    }
    .map_err(|e| CliError::Archive(format!("rehash of {} failed: {}", comic, e)))?;

    println!(
        "{}: {} hashes ({})",
        comic,
        hashes,
        service.detector().algorithm()
    );
    Ok(())
}
