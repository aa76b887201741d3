//! Comic catalog: the list of comics the archive knows about.
//!
//! The catalog is stored as a JSON array of [`ComicItem`] records. It is the
//! configuration collaborator for comic business metadata; the archive engine
//! never writes to it on its own.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate, Weekday};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::debug;

use super::ComicIdentity;

/// Errors raised while reading or writing the catalog file.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The catalog file could not be read or written.
    #[error("failed to access catalog {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The catalog file is not valid JSON for a list of comics.
    #[error("failed to parse catalog {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

fn default_true() -> bool {
    true
}

/// Business metadata for a single comic.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ComicItem {
    pub id: u32,
    pub name: String,

    /// Source key used to select a downloader strategy (e.g. `"gocomics"`).
    #[serde(default)]
    pub source: String,

    /// Source-specific identifier (slug or URL) for this comic.
    #[serde(default)]
    pub source_identifier: String,

    /// Oldest date the comic is known to have published.
    #[serde(default)]
    pub oldest: Option<NaiveDate>,

    /// Newest date the comic is known to have published.
    #[serde(default)]
    pub newest: Option<NaiveDate>,

    /// Whether the comic takes part in downloads and backfill.
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Whether the comic is still publishing. Discontinued comics are never
    /// scanned past their last known strip.
    #[serde(default = "default_true")]
    pub active: bool,

    /// Days of the week the comic publishes. Empty means daily.
    #[serde(default)]
    pub publication_days: Vec<Weekday>,

    #[serde(default)]
    pub avatar_available: bool,
}

impl ComicItem {
    /// Create a daily, enabled, active comic with no known date range.
    pub fn new(id: u32, name: impl Into<String>, source: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            source: source.into(),
            source_identifier: String::new(),
            oldest: None,
            newest: None,
            enabled: true,
            active: true,
            publication_days: Vec::new(),
            avatar_available: false,
        }
    }

    /// Set the source identifier.
    pub fn with_source_identifier(mut self, identifier: impl Into<String>) -> Self {
        self.source_identifier = identifier.into();
        self
    }

    /// Set the known date range.
    pub fn with_date_range(mut self, oldest: Option<NaiveDate>, newest: Option<NaiveDate>) -> Self {
        self.oldest = oldest;
        self.newest = newest;
        self
    }

    /// Restrict publication to the given weekdays.
    pub fn with_publication_days(mut self, days: Vec<Weekday>) -> Self {
        self.publication_days = days;
        self
    }

    /// Mark the comic as discontinued.
    pub fn discontinued(mut self) -> Self {
        self.active = false;
        self
    }

    /// The identity used to address this comic in the archive.
    pub fn identity(&self) -> ComicIdentity {
        ComicIdentity::new(self.id, self.name.clone())
    }

    /// Whether the comic is expected to publish on `date`.
    pub fn publishes_on(&self, date: NaiveDate) -> bool {
        self.publication_days.is_empty() || self.publication_days.contains(&date.weekday())
    }
}

/// The full list of comics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ComicCatalog {
    comics: Vec<ComicItem>,
}

impl ComicCatalog {
    /// Create a catalog from a list of comics.
    pub fn new(comics: Vec<ComicItem>) -> Self {
        Self { comics }
    }

    /// Load the catalog from a JSON file.
    ///
    /// A missing file yields an empty catalog.
    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        if !path.exists() {
            debug!(path = %path.display(), "No catalog file, using empty catalog");
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let comics: Vec<ComicItem> =
            serde_json::from_str(&content).map_err(|source| CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            })?;

        debug!(path = %path.display(), comics = comics.len(), "Loaded comic catalog");
        Ok(Self { comics })
    }

    /// Write the catalog to a JSON file, creating parent directories.
    pub fn save(&self, path: &Path) -> Result<(), CatalogError> {
        let io_err = |source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        };

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }
        let json = serde_json::to_string_pretty(&self.comics).map_err(|source| {
            CatalogError::Parse {
                path: path.to_path_buf(),
                source,
            }
        })?;
        fs::write(path, json).map_err(io_err)
    }

    /// All comics in catalog order.
    pub fn comics(&self) -> &[ComicItem] {
        &self.comics
    }

    /// Find a comic by id.
    pub fn get(&self, id: u32) -> Option<&ComicItem> {
        self.comics.iter().find(|c| c.id == id)
    }

    /// Find a comic by name, ignoring case.
    pub fn find_by_name(&self, name: &str) -> Option<&ComicItem> {
        self.comics
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(name))
    }

    /// Comics that are enabled and have a source configured.
    pub fn downloadable(&self) -> impl Iterator<Item = &ComicItem> {
        self.comics
            .iter()
            .filter(|c| c.enabled && !c.source.is_empty())
    }

    pub fn len(&self) -> usize {
        self.comics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.comics.is_empty()
    }
}
