//! Image analysis producing sidecar metadata.

use std::path::Path;

use chrono::Utc;
use image::{DynamicImage, GenericImageView};
use thiserror::Error;
use tracing::debug;

use super::{ColorMode, ImageMetadata};
use crate::validation::ValidationResult;

/// Default share of pixels sampled for color detection.
pub const DEFAULT_SAMPLE_PERCENTAGE: f64 = 5.0;

/// Errors raised while analyzing an image.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("failed to decode image for analysis: {0}")]
    Decode(#[from] image::ImageError),
}

/// Analysis collaborator used by the save pipeline.
pub trait ImageAnalyzer: Send + Sync {
    /// Produce metadata for an image that has already passed validation.
    fn analyze(
        &self,
        comic_id: u32,
        data: &[u8],
        file_path: &Path,
        validation: &ValidationResult,
    ) -> Result<ImageMetadata, AnalysisError>;
}

/// Detects whether a strip is grayscale or color by sampling pixels.
///
/// Samples are spread evenly over the image so the result is deterministic
/// for a given image and sample percentage.
#[derive(Debug, Clone)]
pub struct ColorAnalyzer {
    sample_percentage: f64,
}

impl ColorAnalyzer {
    /// Create an analyzer sampling `sample_percentage` percent of pixels.
    ///
    /// Values are clamped to `(0, 100]`.
    pub fn new(sample_percentage: f64) -> Self {
        let sample_percentage = if sample_percentage.is_finite() && sample_percentage > 0.0 {
            sample_percentage.min(100.0)
        } else {
            DEFAULT_SAMPLE_PERCENTAGE
        };
        Self { sample_percentage }
    }

    pub fn sample_percentage(&self) -> f64 {
        self.sample_percentage
    }

    /// Detect the color mode of a decoded image.
    pub fn detect_color_mode(&self, image: &DynamicImage) -> ColorMode {
        let (width, height) = image.dimensions();
        let total = u64::from(width) * u64::from(height);
        if total == 0 {
            return ColorMode::Unknown;
        }

        let samples = ((total as f64 * self.sample_percentage / 100.0) as u64).max(1);
        let step = (total / samples).max(1);

        let mut index = 0u64;
        while index < total {
            let x = (index % u64::from(width)) as u32;
            let y = (index / u64::from(width)) as u32;
            let [r, g, b, _] = image.get_pixel(x, y).0;
            if r != g || g != b {
                return ColorMode::Color;
            }
            index += step;
        }

        ColorMode::Grayscale
    }
}

impl Default for ColorAnalyzer {
    fn default() -> Self {
        Self::new(DEFAULT_SAMPLE_PERCENTAGE)
    }
}

impl ImageAnalyzer for ColorAnalyzer {
    fn analyze(
        &self,
        comic_id: u32,
        data: &[u8],
        file_path: &Path,
        validation: &ValidationResult,
    ) -> Result<ImageMetadata, AnalysisError> {
        let image = image::load_from_memory(data)?;
        let color_mode = self.detect_color_mode(&image);

        debug!(path = %file_path.display(), ?color_mode, "Analyzed strip");

        Ok(ImageMetadata {
            comic_id,
            file_path: file_path.to_path_buf(),
            format: validation.format,
            width: validation.width,
            height: validation.height,
            size_in_bytes: validation.size_in_bytes as u64,
            color_mode,
            sample_percentage: self.sample_percentage,
            captured_at: Utc::now(),
            source_url: None,
        })
    }
}
