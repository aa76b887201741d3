//! Download request and result types.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::comic::{ComicIdentity, ComicItem};

/// A request to fetch one comic's strip for one date.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadRequest {
    pub comic_id: u32,
    pub comic_name: String,
    pub source: String,
    pub source_identifier: String,
    pub date: NaiveDate,
}

impl DownloadRequest {
    /// Build a request from catalog metadata.
    pub fn for_comic(comic: &ComicItem, date: NaiveDate) -> Self {
        Self {
            comic_id: comic.id,
            comic_name: comic.name.clone(),
            source: comic.source.clone(),
            source_identifier: comic.source_identifier.clone(),
            date,
        }
    }

    pub fn identity(&self) -> ComicIdentity {
        ComicIdentity::new(self.comic_id, self.comic_name.clone())
    }
}

/// Classification of a failed download.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum FailureKind {
    /// Connectivity, timeout or transport I/O problems.
    NetworkError,
    /// The source answered but the response was unusable.
    ParsingError,
    /// Local filesystem problems such as denied permissions.
    StorageError,
    /// Anything else, including missing strategies and strategy panics.
    UnknownError,
    /// The source has no strip for the requested date.
    ComicUnavailable,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FailureKind::NetworkError => "network error",
            FailureKind::ParsingError => "parsing error",
            FailureKind::StorageError => "storage error",
            FailureKind::UnknownError => "unknown error",
            FailureKind::ComicUnavailable => "comic unavailable",
        };
        f.write_str(name)
    }
}

/// Payload of a [`DownloadResult`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DownloadOutcome {
    Success(Vec<u8>),
    Failure { kind: FailureKind, message: String },
}

/// Result of a download attempt. Failures are values, never errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadResult {
    pub request: DownloadRequest,
    pub outcome: DownloadOutcome,
}

impl DownloadResult {
    pub fn success(request: DownloadRequest, image: Vec<u8>) -> Self {
        Self {
            request,
            outcome: DownloadOutcome::Success(image),
        }
    }

    pub fn failure(request: DownloadRequest, kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            request,
            outcome: DownloadOutcome::Failure {
                kind,
                message: message.into(),
            },
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.outcome, DownloadOutcome::Success(_))
    }

    pub fn image_bytes(&self) -> Option<&[u8]> {
        match &self.outcome {
            DownloadOutcome::Success(bytes) => Some(bytes),
            DownloadOutcome::Failure { .. } => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.outcome {
            DownloadOutcome::Success(_) => None,
            DownloadOutcome::Failure { message, .. } => Some(message),
        }
    }

    pub fn failure_kind(&self) -> Option<FailureKind> {
        match &self.outcome {
            DownloadOutcome::Success(_) => None,
            DownloadOutcome::Failure { kind, .. } => Some(*kind),
        }
    }
}
