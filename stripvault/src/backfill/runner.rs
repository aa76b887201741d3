//! Backfill execution.

use std::ops::Add;
use std::sync::Arc;

use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::BackfillTask;
use crate::archive::{ArchiveWriter, SaveOutcome};
use crate::comic::ComicItem;
use crate::downloader::{DownloadRequest, DownloaderRegistry};

/// Counts from one backfill run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BackfillReport {
    pub attempted: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub failed: usize,
}

impl Add for BackfillReport {
    type Output = BackfillReport;

    fn add(self, other: BackfillReport) -> BackfillReport {
        BackfillReport {
            attempted: self.attempted + other.attempted,
            saved: self.saved + other.saved,
            duplicates: self.duplicates + other.duplicates,
            failed: self.failed + other.failed,
        }
    }
}

/// What happened to one task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TaskStatus {
    Saved,
    Duplicate,
    Failed(String),
}

/// Executes planned tasks: download through the registry, save through the
/// writer.
///
/// Comics are processed in parallel; the tasks of one comic run in order on
/// one worker.
pub struct BackfillRunner {
    registry: Arc<DownloaderRegistry>,
    writer: Arc<ArchiveWriter>,
}

impl BackfillRunner {
    pub fn new(registry: Arc<DownloaderRegistry>, writer: Arc<ArchiveWriter>) -> Self {
        Self { registry, writer }
    }

    /// Run `tasks`, calling `progress` after each one.
    pub fn run<P>(&self, tasks: &[BackfillTask], progress: P) -> BackfillReport
    where
        P: Fn(&BackfillTask, &TaskStatus) + Sync,
    {
        let groups = group_by_comic(tasks);

        let report = groups
            .par_iter()
            .map(|group| {
                let report = group
                    .iter()
                    .map(|task| {
                        let status = self.run_task(task);
                        progress(task, &status);
                        report_for(&status)
                    })
                    .fold(BackfillReport::default(), Add::add);

                if let Some(first) = group.first() {
                    self.ensure_avatar(&first.comic);
                }
                report
            })
            .reduce(BackfillReport::default, Add::add);

        info!(
            attempted = report.attempted,
            saved = report.saved,
            duplicates = report.duplicates,
            failed = report.failed,
            "Backfill run complete"
        );
        report
    }

    /// Download and save one strip.
    pub fn run_task(&self, task: &BackfillTask) -> TaskStatus {
        let result = self
            .registry
            .download_comic(&DownloadRequest::for_comic(&task.comic, task.date));

        let Some(bytes) = result.image_bytes() else {
            return TaskStatus::Failed(result.error_message().unwrap_or_default().to_string());
        };

        match self.writer.save_strip(&task.comic.identity(), task.date, bytes) {
            Ok(SaveOutcome::Saved { .. }) => TaskStatus::Saved,
            Ok(SaveOutcome::DuplicateSkipped { .. }) => TaskStatus::Duplicate,
            Err(e) => {
                warn!(comic = %task.comic.name, date = %task.date, error = %e, "Backfill save failed");
                TaskStatus::Failed(e.to_string())
            }
        }
    }

    /// Fetch the avatar for a comic that advertises one and has none on disk.
    pub fn ensure_avatar(&self, comic: &ComicItem) {
        let identity = comic.identity();
        if !comic.avatar_available || self.writer.layout().find_avatar(&identity).is_some() {
            return;
        }

        match self
            .registry
            .download_avatar(comic.id, &comic.name, &comic.source, &comic.source_identifier)
        {
            Some(bytes) => {
                if let Err(e) = self.writer.save_avatar(&identity, &bytes) {
                    warn!(comic = %comic.name, error = %e, "Failed to save avatar");
                }
            }
            None => debug!(comic = %comic.name, "No avatar available"),
        }
    }
}

fn report_for(status: &TaskStatus) -> BackfillReport {
    let mut report = BackfillReport {
        attempted: 1,
        ..BackfillReport::default()
    };
    match status {
        TaskStatus::Saved => report.saved = 1,
        TaskStatus::Duplicate => report.duplicates = 1,
        TaskStatus::Failed(_) => report.failed = 1,
    }
    report
}

/// Split tasks into per-comic groups, keeping first-seen order.
fn group_by_comic(tasks: &[BackfillTask]) -> Vec<Vec<&BackfillTask>> {
    let mut groups: Vec<Vec<&BackfillTask>> = Vec::new();
    for task in tasks {
        match groups
            .iter_mut()
            .find(|group| group.first().is_some_and(|t| t.comic.id == task.comic.id))
        {
            Some(group) => group.push(task),
            None => groups.push(vec![task]),
        }
    }
    groups
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::ArchiveLayout;
    use crate::dedupe::{DuplicateDetector, DuplicateHashStore, HashAlgorithm};
    use crate::downloader::{DownloadResult, DownloaderStrategy, FetchError};
    use crate::index::IndexStore;
    use crate::test_support::png_bytes;
    use chrono::{Datelike, NaiveDate};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use tempfile::TempDir;

    /// Serves a distinct image per day, a repeat on the 15th and nothing on the 13th.
    struct CalendarStrategy;

    impl DownloaderStrategy for CalendarStrategy {
        fn source(&self) -> &str {
            "calendar"
        }

        fn download_comic(&self, request: &DownloadRequest) -> Result<DownloadResult, FetchError> {
            match request.date.day() {
                13 => Err(FetchError::Http {
                    status: 404,
                    url: "calendar".into(),
                }),
                15 => Ok(DownloadResult::success(request.clone(), png_bytes(120, 60, 14))),
                day => Ok(DownloadResult::success(request.clone(), png_bytes(120, 60, day as u8))),
            }
        }

        fn download_avatar(&self, _: u32, _: &str, _: &str) -> Option<Vec<u8>> {
            Some(png_bytes(40, 40, 99))
        }
    }

    fn runner(temp: &TempDir) -> (BackfillRunner, Arc<ArchiveWriter>) {
        let layout = ArchiveLayout::new(temp.path());
        let index = Arc::new(IndexStore::new(layout.clone()));
        let detector = Arc::new(DuplicateDetector::new(
            Arc::new(DuplicateHashStore::new(layout)),
            HashAlgorithm::Sha256,
        ));
        let writer = Arc::new(ArchiveWriter::new(index, detector));
        let registry = Arc::new(DownloaderRegistry::new());
        registry.register_strategy(Arc::new(CalendarStrategy)).unwrap();
        (BackfillRunner::new(registry, Arc::clone(&writer)), writer)
    }

    fn task(comic: &ComicItem, day: u32) -> BackfillTask {
        BackfillTask {
            comic: comic.clone(),
            date: NaiveDate::from_ymd_opt(2024, 5, day).unwrap(),
        }
    }

    #[test]
    fn test_run_reports_outcomes() {
        let temp = TempDir::new().unwrap();
        let (runner, writer) = runner(&temp);
        let mut comic = ComicItem::new(1, "Calendar", "calendar");
        comic.avatar_available = true;
        let other = ComicItem::new(2, "Elsewhere", "unregistered");

        let tasks = vec![
            task(&comic, 12),
            task(&comic, 13),
            task(&comic, 14),
            task(&comic, 15),
            task(&other, 12),
        ];

        let calls = AtomicUsize::new(0);
        let report = runner.run(&tasks, |_, _| {
            calls.fetch_add(1, Ordering::SeqCst);
        });

        assert_eq!(
            report,
            BackfillReport {
                attempted: 5,
                saved: 2,
                duplicates: 1,
                failed: 2,
            }
        );
        assert_eq!(calls.load(Ordering::SeqCst), 5);
        assert!(writer.layout().find_avatar(&comic.identity()).is_some());
        assert_eq!(writer.index().all_dates(&comic.identity()).len(), 2);
    }

    #[test]
    fn test_grouping_keeps_order() {
        let a = ComicItem::new(1, "A", "s");
        let b = ComicItem::new(2, "B", "s");
        let tasks = vec![task(&a, 1), task(&b, 1), task(&a, 2)];

        let groups = group_by_comic(&tasks);
        assert_eq!(groups.len(), 2);
        assert_eq!(groups[0].len(), 2);
        assert_eq!(groups[0][1].date.day(), 2);
        assert_eq!(groups[1][0].comic.id, 2);
    }
}
