//! Sidecar metadata record.

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::validation::StripFormat;

/// Whether a strip is printed in color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ColorMode {
    Grayscale,
    Color,
    Unknown,
}

/// Derived properties of an archived strip, stored as JSON beside the image.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ImageMetadata {
    /// Comic the image was saved for; checked by index rebuilds.
    pub comic_id: u32,
    pub file_path: PathBuf,
    pub format: StripFormat,
    pub width: u32,
    pub height: u32,
    pub size_in_bytes: u64,
    pub color_mode: ColorMode,
    pub sample_percentage: f64,
    pub captured_at: DateTime<Utc>,
    #[serde(default)]
    pub source_url: Option<String>,
}

impl ImageMetadata {
    /// Whether the record carries enough information to be worth storing.
    ///
    /// An unknown color mode is acceptable; an unknown format, empty
    /// dimensions or a zero size is not.
    pub fn is_complete(&self) -> bool {
        self.format != StripFormat::Unknown
            && self.width > 0
            && self.height > 0
            && self.size_in_bytes > 0
    }
}
