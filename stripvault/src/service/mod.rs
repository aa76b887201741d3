//! Archive service assembled from configuration.
//!
//! [`ArchiveService`] builds the layout, index store, hash store, duplicate
//! detector, writer, downloader registry and backfill components from a
//! [`ConfigFile`](crate::config::ConfigFile) and exposes the operations the
//! CLI runs: daily download, backfill, index rebuild and rehash.
//!
//! Download sources come from `[source.<name>]` config sections; each one is
//! registered as a URL-template strategy backed by a blocking HTTP client.

mod archive_service;
mod error;

pub use archive_service::{register_sources, ArchiveService, DailyReport};
pub use error::ServiceError;
