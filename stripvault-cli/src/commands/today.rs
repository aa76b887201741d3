//! Today command - download one date's strip for every comic.

use chrono::NaiveDate;
use stripvault::service::DailyReport;

use super::common::date_or_today;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Run the today command.
pub fn run(runner: &CliRunner, date: Option<NaiveDate>) -> Result<(), CliError> {
    runner.log_startup("today");
    let service = runner.service()?;
    let catalog = service.load_catalog()?;
    let date = date_or_today(date);

    let comics: Vec<_> = catalog.downloadable().cloned().collect();
    println!("Downloading {} for {} comics...", date, comics.len());

    let report = service.download_date(&comics, date);
    print_report(&report);

    Ok(())
}

pub fn print_report(report: &DailyReport) {
    println!(
        "  {} saved, {} duplicates, {} failed ({} attempted)",
        report.saved, report.duplicates, report.failed, report.attempted
    );
}
