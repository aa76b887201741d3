//! Source-keyed strategy dispatch.

use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;
use std::time::Instant;

use chrono::{NaiveDate, Utc};
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use super::{
    DownloadRequest, DownloadResult, DownloaderStrategy, ErrorTracker, FailureKind, NoopTracker,
    RegistryError, RetrievalRecord, RetrievalStatus, RetrievalTracker,
};
use crate::comic::ComicItem;

/// Dispatches downloads to the strategy registered for each source.
///
/// Every steady-state call returns a value: a missing strategy, a strategy
/// error and a strategy panic all come back as a classified failure
/// [`DownloadResult`].
pub struct DownloaderRegistry {
    strategies: DashMap<String, Arc<dyn DownloaderStrategy>>,
    retrieval: Arc<dyn RetrievalTracker>,
    errors: Arc<dyn ErrorTracker>,
}

impl DownloaderRegistry {
    /// Create an empty registry that discards tracking records.
    pub fn new() -> Self {
        Self::with_trackers(Arc::new(NoopTracker), Arc::new(NoopTracker))
    }

    pub fn with_trackers(retrieval: Arc<dyn RetrievalTracker>, errors: Arc<dyn ErrorTracker>) -> Self {
        Self {
            strategies: DashMap::new(),
            retrieval,
            errors,
        }
    }

    /// Register `strategy` under `source`, replacing any previous one.
    pub fn register(&self, source: &str, strategy: Arc<dyn DownloaderStrategy>) -> Result<(), RegistryError> {
        let source = source.trim();
        if source.is_empty() {
            return Err(RegistryError::InvalidArgument(
                "source must not be empty".to_string(),
            ));
        }

        if self
            .strategies
            .insert(source.to_string(), strategy)
            .is_some()
        {
            debug!(source, "Replaced downloader strategy");
        } else {
            debug!(source, "Registered downloader strategy");
        }
        Ok(())
    }

    /// Register a strategy under the source name it reports.
    pub fn register_strategy(&self, strategy: Arc<dyn DownloaderStrategy>) -> Result<(), RegistryError> {
        let source = strategy.source().to_string();
        self.register(&source, strategy)
    }

    pub fn has_source(&self, source: &str) -> bool {
        self.strategies.contains_key(source)
    }

    /// Registered source names, sorted.
    pub fn sources(&self) -> Vec<String> {
        let mut sources: Vec<String> = self.strategies.iter().map(|e| e.key().clone()).collect();
        sources.sort();
        sources
    }

    fn strategy(&self, source: &str) -> Option<Arc<dyn DownloaderStrategy>> {
        self.strategies.get(source).map(|entry| Arc::clone(entry.value()))
    }

    /// Download one strip.
    pub fn download_comic(&self, request: &DownloadRequest) -> DownloadResult {
        let started = Instant::now();

        let result = match self.strategy(&request.source) {
            None => DownloadResult::failure(
                request.clone(),
                FailureKind::UnknownError,
                format!("No downloader strategy registered for source: {}", request.source),
            ),
            Some(strategy) => {
                match panic::catch_unwind(AssertUnwindSafe(|| strategy.download_comic(request))) {
                    Ok(Ok(result)) => result,
                    Ok(Err(e)) => DownloadResult::failure(
                        request.clone(),
                        e.classify(),
                        format!("Error downloading {} for {}: {}", request.comic_name, request.date, e),
                    ),
                    Err(payload) => DownloadResult::failure(
                        request.clone(),
                        FailureKind::UnknownError,
                        format!("Downloader for {} panicked: {}", request.source, panic_message(&*payload)),
                    ),
                }
            }
        };

        self.track(&result, started);
        result
    }

    /// Download a comic's avatar. Missing strategies and failures yield `None`.
    pub fn download_avatar(
        &self,
        comic_id: u32,
        comic_name: &str,
        source: &str,
        source_identifier: &str,
    ) -> Option<Vec<u8>> {
        let strategy = self.strategy(source)?;
        panic::catch_unwind(AssertUnwindSafe(|| {
            strategy.download_avatar(comic_id, comic_name, source_identifier)
        }))
        .unwrap_or_else(|payload| {
            warn!(comic = comic_name, source, panic = %panic_message(&*payload), "Avatar download panicked");
            None
        })
    }

    /// Download `date`'s strip for every comic, in parallel across comics.
    ///
    /// Results are in the order of `comics`.
    pub fn download_for_date(&self, comics: &[ComicItem], date: NaiveDate) -> Vec<DownloadResult> {
        let results: Vec<DownloadResult> = comics
            .par_iter()
            .map(|comic| self.download_comic(&DownloadRequest::for_comic(comic, date)))
            .collect();

        let succeeded = results.iter().filter(|r| r.is_success()).count();
        info!(%date, comics = comics.len(), succeeded, "Finished downloads for date");
        results
    }

    fn track(&self, result: &DownloadResult, started: Instant) {
        let request = &result.request;
        let status = match result.failure_kind() {
            None => RetrievalStatus::Success,
            Some(kind) => RetrievalStatus::Failure(kind),
        };

        match (result.failure_kind(), result.error_message()) {
            (Some(kind), Some(message)) => {
                warn!(
                    comic = %request.comic_name,
                    date = %request.date,
                    source = %request.source,
                    %kind,
                    error = message,
                    "Download failed"
                );
                self.errors.record_error(request.comic_id, kind, message);
            }
            _ => {
                debug!(comic = %request.comic_name, date = %request.date, "Download succeeded");
                self.errors.clear_errors(request.comic_id);
            }
        }

        self.retrieval.record_retrieval(RetrievalRecord {
            comic_id: request.comic_id,
            comic_name: request.comic_name.clone(),
            source: request.source.clone(),
            date: request.date,
            status,
            error_message: result.error_message().map(str::to_string),
            duration: started.elapsed(),
            image_size: result.image_bytes().map(<[u8]>::len),
            recorded_at: Utc::now(),
        });
    }
}

impl Default for DownloaderRegistry {
    fn default() -> Self {
        Self::new()
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
