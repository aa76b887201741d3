//! The strip archive on disk.
//!
//! [`ArchiveLayout`] decides where files live; [`ArchiveWriter`] is the save
//! pipeline that validates incoming bytes, skips duplicates, writes the file
//! and keeps the date index and hash store in step.

mod error;
mod layout;
pub(crate) mod persist;
mod writer;

pub use error::{SaveError, SaveOutcome};
pub use layout::{
    strip_file_name, ArchiveLayout, AVATAR_STEM, HASH_FILENAME, INDEX_FILENAME, RESERVED_PREFIX,
};
pub use writer::{ArchiveWriter, DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH};
