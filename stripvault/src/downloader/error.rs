//! Downloader errors and their classification.

use std::io;

use thiserror::Error;

use super::FailureKind;

/// Error raised by a source while fetching.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("network error: {0}")]
    Network(String),

    #[error("request timed out: {0}")]
    Timeout(String),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("HTTP {status} from {url}")]
    Http { status: u16, url: String },

    #[error("failed to parse response: {0}")]
    Parse(String),

    #[error("permission denied: {0}")]
    PermissionDenied(String),

    #[error("{0}")]
    Other(String),
}

impl FetchError {
    /// Map the error onto the failure taxonomy.
    ///
    /// Permission problems are checked before generic I/O so a denied write
    /// is reported as storage, not network. A 404 means the source has no
    /// strip for the date.
    pub fn classify(&self) -> FailureKind {
        match self {
            FetchError::PermissionDenied(_) => FailureKind::StorageError,
            FetchError::Io(e) if e.kind() == io::ErrorKind::PermissionDenied => {
                FailureKind::StorageError
            }
            FetchError::Network(_) | FetchError::Timeout(_) | FetchError::Io(_) => {
                FailureKind::NetworkError
            }
            FetchError::Http { status: 404, .. } => FailureKind::ComicUnavailable,
            FetchError::Http { .. } | FetchError::Parse(_) => FailureKind::ParsingError,
            FetchError::Other(_) => FailureKind::UnknownError,
        }
    }
}

impl From<reqwest::Error> for FetchError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            FetchError::Timeout(e.to_string())
        } else if let Some(status) = e.status() {
            FetchError::Http {
                status: status.as_u16(),
                url: e.url().map(|u| u.to_string()).unwrap_or_default(),
            }
        } else if e.is_decode() || e.is_body() {
            FetchError::Parse(e.to_string())
        } else if e.is_connect() || e.is_request() {
            FetchError::Network(e.to_string())
        } else {
            FetchError::Other(e.to_string())
        }
    }
}

/// Contract violations when configuring the registry.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
}
