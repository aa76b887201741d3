//! Backfill command - fetch strips missing from the archive.

use std::time::Duration;

use chrono::NaiveDate;
use console::style;
use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use stripvault::backfill::{BackfillTask, TaskStatus};

use super::common::{date_or_today, resolve_comic};
use crate::error::CliError;
use crate::runner::CliRunner;

/// Arguments for the backfill command.
pub struct BackfillArgs {
    pub today: Option<NaiveDate>,
    pub comic: Option<String>,
    pub dry_run: bool,
}

/// Run the backfill command.
pub fn run(runner: &CliRunner, args: BackfillArgs) -> Result<(), CliError> {
    runner.log_startup("backfill");
    let service = runner.service()?;
    let catalog = service.load_catalog()?;
    let today = date_or_today(args.today);

    let comics = match &args.comic {
        Some(name) => vec![resolve_comic(&catalog, name)?],
        None => catalog.comics().to_vec(),
    };

    let tasks = service.plan_backfill(&comics, today);
    if tasks.is_empty() {
        println!("Nothing to backfill.");
        return Ok(());
    }

    if args.dry_run {
        print_plan(&tasks);
        return Ok(());
    }

    let pb = make_progress_bar(tasks.len() as u64);
    let report = service.run_backfill(&tasks, |task, status| {
        if let TaskStatus::Failed(reason) = status {
            pb.println(format!(
                "{} {} {}: {}",
                style("failed").red(),
                task.comic.name,
                task.date,
                reason
            ));
        }
        pb.set_message(task.comic.name.clone());
        pb.inc(1);
    });
    pb.finish_with_message("done");

    println!();
    println!(
        "Backfill: {} saved, {} duplicates, {} failed ({} attempted)",
        style(report.saved).green(),
        report.duplicates,
        style(report.failed).red(),
        report.attempted
    );
    Ok(())
}

fn print_plan(tasks: &[BackfillTask]) {
    println!("Would fetch {} strips:", tasks.len());
    let mut current = None;
    for task in tasks {
        if current != Some(task.comic.id) {
            println!("  {} ({})", style(&task.comic.name).bold(), task.comic.source);
            current = Some(task.comic.id);
        }
        println!("    {}", task.date);
    }
}

fn make_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template("{spinner:.cyan} [{elapsed_precise}] {pos}/{len} strips ({eta}) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_spinner()),
    );
    pb.set_draw_target(ProgressDrawTarget::stderr_with_hz(12));
    pb.enable_steady_tick(Duration::from_millis(120));
    pb
}
