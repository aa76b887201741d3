//! Strip downloading.
//!
//! Each comic source (a syndicate site, a static image host, ...) is served by
//! one [`DownloaderStrategy`]. The [`DownloaderRegistry`] maps source names to
//! strategies, dispatches requests, classifies failures into a
//! [`FailureKind`] and reports every attempt to the tracking collaborators.
//!
//! Most sources only need to implement the small [`SourceFetcher`] trait and
//! be wrapped in a [`BaseStrategy`], which adds empty-data and image
//! validation checks.
//!
//! ```ignore
//! use std::sync::Arc;
//! use stripvault::downloader::{BaseStrategy, DownloaderRegistry, ReqwestClient, UrlTemplateSource};
//!
//! let source = UrlTemplateSource::new(
//!     "static",
//!     "https://strips.example.com/{identifier}/{yyyy}-{MM}-{dd}.png",
//!     ReqwestClient::new()?,
//! );
//! let registry = DownloaderRegistry::new();
//! registry.register_strategy(Arc::new(BaseStrategy::new(source)))?;
//! ```

mod error;
mod http;
mod registry;
pub mod sources;
mod strategy;
mod tracking;
mod types;

pub use error::{FetchError, RegistryError};
pub use http::{HttpClient, ReqwestClient, DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
pub use registry::DownloaderRegistry;
pub use sources::UrlTemplateSource;
pub use strategy::{BaseStrategy, DownloaderStrategy, SourceFetcher};
pub use tracking::{
    ErrorRecord, ErrorTracker, InMemoryTracker, NoopTracker, RetrievalRecord, RetrievalStatus,
    RetrievalTracker, MAX_ERRORS_PER_COMIC, MAX_RETRIEVAL_RECORDS,
};
pub use types::{DownloadOutcome, DownloadRequest, DownloadResult, FailureKind};
