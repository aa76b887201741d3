//! The save pipeline.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use chrono::NaiveDate;
use parking_lot::Mutex;
use tracing::{debug, info, warn};

use super::{ArchiveLayout, SaveError, SaveOutcome};
use crate::analysis::{ColorAnalyzer, ImageAnalyzer, MetadataRepository};
use crate::comic::ComicIdentity;
use crate::dedupe::DuplicateDetector;
use crate::index::{IndexStore, LockRegistry};
use crate::validation::{ImageValidator, StandardValidator, StripFormat, ValidationResult};

/// Minimum strip width accepted by default.
pub const DEFAULT_MIN_WIDTH: u32 = 100;

/// Minimum strip height accepted by default.
pub const DEFAULT_MIN_HEIGHT: u32 = 50;

/// Writes strips into the archive and keeps the side indexes current.
///
/// Saves for one comic are serialized by a per-comic mutex so the
/// duplicate check, file write, hash record and index update happen as one
/// unit. Saves for different comics run in parallel.
pub struct ArchiveWriter {
    layout: ArchiveLayout,
    index: Arc<IndexStore>,
    detector: Arc<DuplicateDetector>,
    validator: Arc<dyn ImageValidator>,
    analyzer: Arc<dyn ImageAnalyzer>,
    metadata: MetadataRepository,
    min_width: u32,
    min_height: u32,
    save_locks: LockRegistry<u32, Mutex<()>>,
}

impl ArchiveWriter {
    /// Create a writer with the standard validator and color analyzer.
    pub fn new(index: Arc<IndexStore>, detector: Arc<DuplicateDetector>) -> Self {
        Self {
            layout: index.layout().clone(),
            index,
            detector,
            validator: Arc::new(StandardValidator::new()),
            analyzer: Arc::new(ColorAnalyzer::default()),
            metadata: MetadataRepository::new(),
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
            save_locks: LockRegistry::new(),
        }
    }

    pub fn with_validator(mut self, validator: Arc<dyn ImageValidator>) -> Self {
        self.validator = validator;
        self
    }

    pub fn with_analyzer(mut self, analyzer: Arc<dyn ImageAnalyzer>) -> Self {
        self.analyzer = analyzer;
        self
    }

    pub fn with_min_dimensions(mut self, min_width: u32, min_height: u32) -> Self {
        self.min_width = min_width;
        self.min_height = min_height;
        self
    }

    pub fn layout(&self) -> &ArchiveLayout {
        &self.layout
    }

    pub fn index(&self) -> &Arc<IndexStore> {
        &self.index
    }

    pub fn validator(&self) -> &Arc<dyn ImageValidator> {
        &self.validator
    }

    /// Save a downloaded strip.
    ///
    /// 1. Validate format and minimum dimensions.
    /// 2. Hash the bytes; if the year's partition already holds the hash,
    ///    return [`SaveOutcome::DuplicateSkipped`] without touching disk.
    /// 3. Write `<root>/<comic>/<yyyy>/<yyyy-MM-dd>.<ext>`.
    /// 4. Record the hash, then the date.
    /// 5. Capture sidecar metadata; failures are logged only.
    pub fn save_strip(
        &self,
        comic: &ComicIdentity,
        date: NaiveDate,
        data: &[u8],
    ) -> Result<SaveOutcome, SaveError> {
        let validation = self
            .validator
            .validate_with_min_dimensions(data, self.min_width, self.min_height);
        if !validation.valid {
            warn!(comic = %comic, %date, error = validation.error_message(), "Rejected strip");
            return Err(SaveError::Validation(validation.error_message().to_string()));
        }

        let lock = self.save_locks.get(&comic.id);
        let _guard = lock.lock();

        let hash = self.detector.hash(data);
        if let Some(hash) = &hash {
            if let Some(existing) = self.detector.find_duplicate(comic, date, hash) {
                info!(
                    comic = %comic,
                    %date,
                    original = %existing.date,
                    "Duplicate strip detected, skipping save"
                );
                return Ok(SaveOutcome::DuplicateSkipped {
                    original: existing.file_path,
                    hash: existing.hash,
                });
            }
        }

        let path = self.layout.strip_path(comic, date, validation.format);
        write_file(&path, data)?;
        self.remove_other_formats(comic, date, &path);

        match hash {
            Some(hash) => {
                if let Err(e) = self.detector.record(comic, date, hash, &path) {
                    warn!(comic = %comic, %date, error = %e, "Failed to record image hash");
                }
            }
            None => warn!(comic = %comic, %date, "Strip could not be hashed"),
        }
        self.index.add_date(comic, date);

        self.capture_metadata(comic, data, &path, &validation);

        info!(comic = %comic, %date, path = %path.display(), "Saved strip");
        Ok(SaveOutcome::Saved { path })
    }

    /// Whether a strip for `date` exists in any supported format.
    pub fn strip_exists(&self, comic: &ComicIdentity, date: NaiveDate) -> bool {
        self.layout.find_strip(comic, date).is_some()
    }

    /// Read an archived strip.
    pub fn load_strip(&self, comic: &ComicIdentity, date: NaiveDate) -> Option<(PathBuf, Vec<u8>)> {
        let path = self.layout.find_strip(comic, date)?;
        match fs::read(&path) {
            Ok(data) => Some((path, data)),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Failed to read strip");
                None
            }
        }
    }

    /// Remove one strip, its sidecar and its index entry.
    ///
    /// Returns whether a file was removed. The hash partition keeps its
    /// record so the same content is still recognised as seen.
    pub fn delete_strip(&self, comic: &ComicIdentity, date: NaiveDate) -> Result<bool, SaveError> {
        let lock = self.save_locks.get(&comic.id);
        let _guard = lock.lock();

        let Some(path) = self.layout.find_strip(comic, date) else {
            self.index.remove_date(comic, date);
            return Ok(false);
        };

        fs::remove_file(&path).map_err(|e| SaveError::filesystem(&path, e))?;
        if let Err(e) = self.metadata.delete(&path) {
            warn!(path = %path.display(), error = %e, "Failed to delete sidecar metadata");
        }
        self.index.remove_date(comic, date);
        info!(comic = %comic, %date, "Deleted strip");
        Ok(true)
    }

    /// Save a comic's avatar, replacing any previous one.
    pub fn save_avatar(&self, comic: &ComicIdentity, data: &[u8]) -> Result<PathBuf, SaveError> {
        let validation = self.validator.validate(data);
        if !validation.valid {
            return Err(SaveError::Validation(validation.error_message().to_string()));
        }

        let path = self.layout.avatar_path(comic, validation.format);
        write_file(&path, data)?;

        for format in StripFormat::ARCHIVED {
            let other = self.layout.avatar_path(comic, format);
            if other != path && other.is_file() {
                if let Err(e) = fs::remove_file(&other) {
                    warn!(path = %other.display(), error = %e, "Failed to remove old avatar");
                }
            }
        }

        debug!(comic = %comic, path = %path.display(), "Saved avatar");
        Ok(path)
    }

    /// Delete a comic's whole archive and drop its cached state.
    ///
    /// Returns whether anything was on disk.
    pub fn delete_comic(&self, comic: &ComicIdentity) -> Result<bool, SaveError> {
        let lock = self.save_locks.get(&comic.id);
        let _guard = lock.lock();

        let dir = self.layout.comic_dir(comic);
        let existed = match fs::remove_dir_all(&dir) {
            Ok(()) => true,
            Err(e) if e.kind() == io::ErrorKind::NotFound => false,
            Err(e) => return Err(SaveError::filesystem(&dir, e)),
        };

        self.index.invalidate(comic.id);
        self.detector.evict_comic(comic.id);

        info!(comic = %comic, existed, "Deleted comic archive");
        Ok(existed)
    }

    /// Years that contain at least one strip, ascending.
    pub fn years_with_content(&self, comic: &ComicIdentity) -> Vec<i32> {
        let Ok(entries) = fs::read_dir(self.layout.comic_dir(comic)) else {
            return Vec::new();
        };

        let mut years: Vec<i32> = entries
            .flatten()
            .filter(|entry| entry.file_type().is_ok_and(|t| t.is_dir()))
            .filter(|entry| !ArchiveLayout::is_reserved(&entry.file_name()))
            .filter_map(|entry| {
                let year = entry.file_name().to_str()?.parse::<i32>().ok()?;
                has_strips(&entry.path()).then_some(year)
            })
            .collect();
        years.sort_unstable();
        years
    }

    /// Total bytes used by a comic's archive, ignoring reserved directories.
    pub fn storage_size(&self, comic: &ComicIdentity) -> u64 {
        directory_size(&self.layout.comic_dir(comic))
    }

    fn remove_other_formats(&self, comic: &ComicIdentity, date: NaiveDate, keep: &Path) {
        for other in self.layout.strip_files(comic, date) {
            if other != keep {
                debug!(path = %other.display(), "Removing strip saved in another format");
                if let Err(e) = fs::remove_file(&other) {
                    warn!(path = %other.display(), error = %e, "Failed to remove stale strip");
                }
            }
        }
    }

    fn capture_metadata(
        &self,
        comic: &ComicIdentity,
        data: &[u8],
        path: &Path,
        validation: &ValidationResult,
    ) {
        let metadata = match self.analyzer.analyze(comic.id, data, path, validation) {
            Ok(metadata) => metadata,
            Err(e) => {
                warn!(comic = %comic, path = %path.display(), error = %e, "Image analysis failed");
                return;
            }
        };
        if let Err(e) = self.metadata.save(&metadata) {
            warn!(comic = %comic, path = %path.display(), error = %e, "Failed to save image metadata");
        }
    }
}

fn write_file(path: &Path, data: &[u8]) -> Result<(), SaveError> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(|e| SaveError::filesystem(parent, e))?;
    }
    fs::write(path, data).map_err(|e| SaveError::filesystem(path, e))
}

fn has_strips(dir: &Path) -> bool {
    fs::read_dir(dir).is_ok_and(|entries| {
        entries
            .flatten()
            .any(|entry| ArchiveLayout::strip_date(&entry.path()).is_some())
    })
}

fn directory_size(dir: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(dir) else {
        return 0;
    };

    entries
        .flatten()
        .map(|entry| match entry.file_type() {
            Ok(t) if t.is_dir() => {
                if ArchiveLayout::is_reserved(&entry.file_name()) {
                    0
                } else {
                    directory_size(&entry.path())
                }
            }
            Ok(_) => entry.metadata().map(|m| m.len()).unwrap_or(0),
            Err(_) => 0,
        })
        .sum()
}
