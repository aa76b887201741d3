//! Comic identity and catalog metadata.
//!
//! A comic is addressed everywhere in the archive by its [`ComicIdentity`]:
//! a stable numeric id plus a display name. The name is sanitized into a
//! directory name before it ever touches the filesystem.
//!
//! Business metadata (source, publication schedule, known date range) lives in
//! [`ComicItem`] records owned by the catalog file; this crate only reads it.

mod catalog;
mod identity;

pub use catalog::{CatalogError, ComicCatalog, ComicItem};
pub use identity::{sanitize_dir_name, ComicIdentity};
