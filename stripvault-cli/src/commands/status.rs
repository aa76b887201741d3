//! Status command - per-comic archive summary.

use console::style;
use stripvault::config::format_size;

use crate::error::CliError;
use crate::runner::CliRunner;

/// Print archived range and disk usage for every catalog comic.
pub fn run(runner: &CliRunner) -> Result<(), CliError> {
    let service = runner.service()?;
    let catalog = service.load_catalog()?;
    let index = service.index();
    let writer = service.writer();

    println!("Archive: {}", runner.config().archive.root.display());
    println!("Comics:  {}", catalog.len());
    println!();

    let mut total = 0;
    for comic in catalog.comics() {
        let identity = comic.identity();
        let size = writer.storage_size(&identity);
        total += size;

        let range = match (index.get_oldest_date(&identity), index.get_newest_date(&identity)) {
            (Some(oldest), Some(newest)) => format!("{} .. {}", oldest, newest),
            _ => "(empty)".to_string(),
        };
        let name = if comic.enabled {
            style(comic.name.as_str()).bold()
        } else {
            style(comic.name.as_str()).dim()
        };

        println!(
            "  {:>5}  {}  {} dates  {}  {}",
            comic.id,
            name,
            index.all_dates(&identity).len(),
            range,
            format_size(size)
        );
    }

    println!();
    println!("Total: {}", format_size(total));
    Ok(())
}
