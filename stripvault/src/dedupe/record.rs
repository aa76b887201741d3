use std::path::PathBuf;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::HashAlgorithm;

/// One archived strip's fingerprint, stored in its year's hash partition.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageHashRecord {
    pub date: NaiveDate,
    pub hash: String,
    pub file_path: PathBuf,
    /// Missing in partitions written before algorithms were selectable.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub algorithm: Option<HashAlgorithm>,
}

impl ImageHashRecord {
    pub fn new(
        date: NaiveDate,
        hash: impl Into<String>,
        file_path: impl Into<PathBuf>,
        algorithm: HashAlgorithm,
    ) -> Self {
        Self {
            date,
            hash: hash.into(),
            file_path: file_path.into(),
            algorithm: Some(algorithm),
        }
    }
}
