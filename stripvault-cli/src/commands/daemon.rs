//! Daemon command - download on a fixed interval until interrupted.

use std::sync::Arc;
use std::time::Duration;

use chrono::Local;
use stripvault::service::ArchiveService;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

use super::today::print_report;
use crate::error::CliError;
use crate::runner::CliRunner;

/// Default hours between download cycles.
pub const DEFAULT_INTERVAL_HOURS: u64 = 6;

/// Longest accepted interval: one year.
pub const MAX_INTERVAL_HOURS: u64 = 24 * 366;

/// Arguments for the daemon command.
pub struct DaemonArgs {
    pub interval_hours: u64,
    pub backfill: bool,
}

/// Run the daemon command.
pub fn run(runner: &CliRunner, args: DaemonArgs) -> Result<(), CliError> {
    if args.interval_hours == 0 {
        return Err(CliError::Config("--interval-hours must be at least 1".to_string()));
    }
    runner.log_startup("daemon");

    // Built outside the runtime: the blocking HTTP client must not be
    // created or dropped on an async worker.
    let service = Arc::new(runner.service()?);

    let shutdown = CancellationToken::new();
    let shutdown_clone = shutdown.clone();
    ctrlc::set_handler(move || {
        println!();
        println!("Received shutdown signal, stopping after the current cycle...");
        shutdown_clone.cancel();
    })
    .map_err(|e| CliError::Config(format!("Failed to set signal handler: {}", e)))?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_time()
        .build()
        .map_err(|e| CliError::Runtime(e.to_string()))?;

    println!(
        "Downloading every {} hour(s). Press Ctrl+C to stop.",
        args.interval_hours
    );

    let period = Duration::from_secs(args.interval_hours.saturating_mul(3600));
    runtime.block_on(run_loop(Arc::clone(&service), period, args.backfill, shutdown));
    runtime.shutdown_timeout(Duration::from_secs(5));

    info!("Daemon stopped");
    Ok(())
}

async fn run_loop(service: Arc<ArchiveService>, period: Duration, backfill: bool, shutdown: CancellationToken) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            _ = interval.tick() => {
                let service = Arc::clone(&service);
                let cycle = tokio::task::spawn_blocking(move || run_cycle(&service, backfill));
                if let Err(e) = cycle.await {
                    error!(error = %e, "Download cycle panicked");
                }
            }
        }
    }
}

fn run_cycle(service: &ArchiveService, backfill: bool) {
    let today = Local::now().date_naive();
    let catalog = match service.load_catalog() {
        Ok(catalog) => catalog,
        Err(e) => {
            error!(error = %e, "Cannot load comic catalog, skipping cycle");
            return;
        }
    };

    let comics: Vec<_> = catalog.downloadable().cloned().collect();
    println!("[{}] Downloading {} comics", Local::now().format("%Y-%m-%d %H:%M"), comics.len());
    print_report(&service.download_date(&comics, today));

    if backfill {
        let tasks = service.plan_backfill(catalog.comics(), today);
        if !tasks.is_empty() {
            let report = service.run_backfill(&tasks, |_, _| {});
            println!(
                "  backfill: {} saved, {} duplicates, {} failed",
                report.saved, report.duplicates, report.failed
            );
        }
    }
}
