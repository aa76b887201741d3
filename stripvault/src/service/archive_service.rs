//! Wiring of the archive engine from configuration.

use std::io;
use std::sync::Arc;

use chrono::NaiveDate;
use rayon::prelude::*;
use rayon::ThreadPool;
use tracing::{info, warn};

use super::ServiceError;
use crate::analysis::ColorAnalyzer;
use crate::archive::{ArchiveLayout, ArchiveWriter, SaveOutcome};
use crate::backfill::{
    BackfillPlanner, BackfillReport, BackfillRunner, BackfillTask, StripLookup, TaskStatus,
};
use crate::comic::{ComicCatalog, ComicIdentity, ComicItem};
use crate::config::ConfigFile;
use crate::dedupe::{DuplicateDetector, DuplicateHashStore};
use crate::downloader::{
    BaseStrategy, DownloaderRegistry, ErrorTracker, InMemoryTracker, ReqwestClient,
    RetrievalTracker, UrlTemplateSource,
};
use crate::index::IndexStore;

/// Counts from downloading one date for every comic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DailyReport {
    pub attempted: usize,
    pub saved: usize,
    pub duplicates: usize,
    pub failed: usize,
}

/// Register a [`UrlTemplateSource`] for every `[source.<name>]` section.
///
/// Returns the number of sources registered.
pub fn register_sources(registry: &DownloaderRegistry, config: &ConfigFile) -> Result<usize, ServiceError> {
    for (name, settings) in &config.sources {
        let client = ReqwestClient::with_settings(config.download.timeout, &config.download.user_agent)?;
        let mut fetcher = UrlTemplateSource::new(name.as_str(), settings.strip_url.as_str(), client);
        if let Some(avatar) = &settings.avatar_url {
            fetcher = fetcher.with_avatar_template(avatar.as_str());
        }

        registry
            .register(name, Arc::new(BaseStrategy::new(fetcher)))
            .map_err(|source| ServiceError::Registration {
                source_name: name.clone(),
                source,
            })?;
        info!(source = %name, "Registered download source");
    }
    Ok(config.sources.len())
}

/// The archive engine assembled from a [`ConfigFile`].
///
/// Owns one instance of each component; everything is shared through `Arc`
/// so the service can be used from several threads.
pub struct ArchiveService {
    config: ConfigFile,
    index: Arc<IndexStore>,
    detector: Arc<DuplicateDetector>,
    writer: Arc<ArchiveWriter>,
    registry: Arc<DownloaderRegistry>,
    tracker: Arc<InMemoryTracker>,
    planner: BackfillPlanner,
    runner: BackfillRunner,
    pool: ThreadPool,
}

impl ArchiveService {
    /// Build the service, registering the configured download sources.
    pub fn from_config(config: ConfigFile) -> Result<Self, ServiceError> {
        let tracker = Arc::new(InMemoryTracker::new());
        let retrieval: Arc<dyn RetrievalTracker> = tracker.clone();
        let errors: Arc<dyn ErrorTracker> = tracker.clone();
        let registry = Arc::new(DownloaderRegistry::with_trackers(retrieval, errors));
        register_sources(&registry, &config)?;
        Self::assemble(config, registry, tracker)
    }

    /// Build the service around an existing registry.
    pub fn with_registry(config: ConfigFile, registry: Arc<DownloaderRegistry>) -> Result<Self, ServiceError> {
        Self::assemble(config, registry, Arc::new(InMemoryTracker::new()))
    }

    fn assemble(
        config: ConfigFile,
        registry: Arc<DownloaderRegistry>,
        tracker: Arc<InMemoryTracker>,
    ) -> Result<Self, ServiceError> {
        let layout = ArchiveLayout::new(&config.archive.root);
        let index = Arc::new(IndexStore::new(layout.clone()));
        let detector = Arc::new(DuplicateDetector::new(
            Arc::new(DuplicateHashStore::new(layout)),
            config.hashing.algorithm,
        ));
        let writer = Arc::new(
            ArchiveWriter::new(Arc::clone(&index), Arc::clone(&detector))
                .with_min_dimensions(config.archive.min_width, config.archive.min_height)
                .with_analyzer(Arc::new(ColorAnalyzer::new(config.analysis.sample_percentage))),
        );

        let lookup: Arc<dyn StripLookup> = writer.clone();
        let planner = BackfillPlanner::new(config.backfill.clone(), lookup);
        let runner = BackfillRunner::new(Arc::clone(&registry), Arc::clone(&writer));
        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.download.parallel)
            .thread_name(|i| format!("stripvault-download-{}", i))
            .build()?;

        info!(
            root = %config.archive.root.display(),
            algorithm = %config.hashing.algorithm,
            parallel = config.download.parallel,
            "Archive service ready"
        );

        Ok(Self {
            config,
            index,
            detector,
            writer,
            registry,
            tracker,
            planner,
            runner,
            pool,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn index(&self) -> &Arc<IndexStore> {
        &self.index
    }

    pub fn detector(&self) -> &Arc<DuplicateDetector> {
        &self.detector
    }

    pub fn writer(&self) -> &Arc<ArchiveWriter> {
        &self.writer
    }

    pub fn registry(&self) -> &Arc<DownloaderRegistry> {
        &self.registry
    }

    /// Retrieval and error history of this process.
    pub fn tracker(&self) -> &Arc<InMemoryTracker> {
        &self.tracker
    }

    /// Load the comic catalog named in the config.
    pub fn load_catalog(&self) -> Result<ComicCatalog, ServiceError> {
        Ok(ComicCatalog::load(&self.config.archive.comics_file)?)
    }

    /// Download and archive `date`'s strip for every comic.
    ///
    /// Comics whose strip is already archived are not downloaded again.
    pub fn download_date(&self, comics: &[ComicItem], date: NaiveDate) -> DailyReport {
        let pending: Vec<ComicItem> = comics
            .iter()
            .filter(|comic| !self.writer.strip_exists(&comic.identity(), date))
            .cloned()
            .collect();

        self.pool.install(|| {
            let results = self.registry.download_for_date(&pending, date);

            let report = results
                .par_iter()
                .zip(pending.par_iter())
                .map(|(result, comic)| {
                    let mut report = DailyReport {
                        attempted: 1,
                        ..DailyReport::default()
                    };
                    let Some(bytes) = result.image_bytes() else {
                        report.failed = 1;
                        return report;
                    };
                    match self.writer.save_strip(&comic.identity(), date, bytes) {
                        Ok(SaveOutcome::Saved { .. }) => report.saved = 1,
                        Ok(SaveOutcome::DuplicateSkipped { .. }) => report.duplicates = 1,
                        Err(e) => {
                            warn!(comic = %comic.name, %date, error = %e, "Failed to save strip");
                            report.failed = 1;
                        }
                    }
                    self.runner.ensure_avatar(comic);
                    report
                })
                .reduce(DailyReport::default, |a, b| DailyReport {
                    attempted: a.attempted + b.attempted,
                    saved: a.saved + b.saved,
                    duplicates: a.duplicates + b.duplicates,
                    failed: a.failed + b.failed,
                });

            info!(
                %date,
                skipped = comics.len() - pending.len(),
                saved = report.saved,
                duplicates = report.duplicates,
                failed = report.failed,
                "Daily download complete"
            );
            report
        })
    }

    /// Plan backfill tasks as of `today`.
    pub fn plan_backfill(&self, comics: &[ComicItem], today: NaiveDate) -> Vec<BackfillTask> {
        self.planner.find_missing_strips(comics, today)
    }

    /// Execute planned tasks on the download pool.
    pub fn run_backfill<P>(&self, tasks: &[BackfillTask], progress: P) -> BackfillReport
    where
        P: Fn(&BackfillTask, &TaskStatus) + Sync,
    {
        self.pool.install(|| self.runner.run(tasks, &progress))
    }

    /// Rebuild the date index of every comic in `comics` from disk.
    pub fn rebuild_indexes(&self, comics: &[ComicItem], validate_metadata: bool) -> Vec<(ComicIdentity, usize)> {
        self.pool.install(|| {
            comics
                .par_iter()
                .map(|comic| {
                    let identity = comic.identity();
                    let count = self.index.rebuild_index(&identity, validate_metadata);
                    (identity, count)
                })
                .collect()
        })
    }

    /// Recompute the content hashes of every archived year of `comic`.
    pub fn rehash_comic(&self, comic: &ComicIdentity) -> io::Result<usize> {
        self.writer
            .years_with_content(comic)
            .into_iter()
            .try_fold(0, |total, year| Ok(total + self.detector.rehash(comic, year)?))
    }
}
