//! Save pipeline results.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Successful outcome of saving a strip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The strip was written to `path`.
    Saved { path: PathBuf },
    /// The content is already archived at `original`; nothing was written.
    DuplicateSkipped { original: PathBuf, hash: String },
}

impl SaveOutcome {
    /// Whether a new file was written.
    pub fn is_saved(&self) -> bool {
        matches!(self, SaveOutcome::Saved { .. })
    }

    pub fn is_duplicate(&self) -> bool {
        matches!(self, SaveOutcome::DuplicateSkipped { .. })
    }
}

/// Reasons a save fails.
#[derive(Debug, Error)]
pub enum SaveError {
    /// The bytes are not an acceptable image.
    #[error("validation failed: {0}")]
    Validation(String),

    /// Writing to or removing from the archive failed.
    #[error("filesystem error at {path}: {source}")]
    Filesystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl SaveError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: io::Error) -> Self {
        SaveError::Filesystem {
            path: path.into(),
            source,
        }
    }
}
