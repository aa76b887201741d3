//! Image validation service.

use tracing::{debug, warn};

use super::StripFormat;

/// Largest image accepted into the archive (10 MB).
pub const MAX_IMAGE_SIZE: usize = 10 * 1024 * 1024;

/// Outcome of validating a byte buffer as an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationResult {
    pub valid: bool,
    pub format: StripFormat,
    pub width: u32,
    pub height: u32,
    pub size_in_bytes: usize,
    pub error: Option<String>,
}

impl ValidationResult {
    /// A successful validation.
    pub fn success(format: StripFormat, width: u32, height: u32, size_in_bytes: usize) -> Self {
        Self {
            valid: true,
            format,
            width,
            height,
            size_in_bytes,
            error: None,
        }
    }

    /// A failed validation with a reason.
    pub fn failure(error: impl Into<String>) -> Self {
        Self {
            valid: false,
            format: StripFormat::Unknown,
            width: 0,
            height: 0,
            size_in_bytes: 0,
            error: Some(error.into()),
        }
    }

    /// The failure reason, or an empty string for valid results.
    pub fn error_message(&self) -> &str {
        self.error.as_deref().unwrap_or("")
    }
}

/// Validation collaborator used by the save pipeline and downloader strategies.
pub trait ImageValidator: Send + Sync {
    /// Validate that `data` is a decodable, reasonably sized image.
    fn validate(&self, data: &[u8]) -> ValidationResult;

    /// Validate `data` and additionally require minimum dimensions.
    fn validate_with_min_dimensions(
        &self,
        data: &[u8],
        min_width: u32,
        min_height: u32,
    ) -> ValidationResult {
        let result = self.validate(data);
        if !result.valid {
            return result;
        }

        if result.width < min_width || result.height < min_height {
            return ValidationResult::failure(format!(
                "Image dimensions {}x{} below minimum {}x{}",
                result.width, result.height, min_width, min_height
            ));
        }

        result
    }
}

/// Validator backed by the `image` crate.
///
/// The image is fully decoded so truncated or corrupted files are rejected,
/// not just files with a bad header.
#[derive(Debug, Clone)]
pub struct StandardValidator {
    max_size: usize,
}

impl StandardValidator {
    pub fn new() -> Self {
        Self {
            max_size: MAX_IMAGE_SIZE,
        }
    }

    /// Create a validator with a custom size ceiling.
    pub fn with_max_size(max_size: usize) -> Self {
        Self { max_size }
    }
}

impl Default for StandardValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl ImageValidator for StandardValidator {
    fn validate(&self, data: &[u8]) -> ValidationResult {
        if data.is_empty() {
            return ValidationResult::failure("Image data is null or empty");
        }

        if data.len() > self.max_size {
            return ValidationResult::failure(format!(
                "Image exceeds maximum size of {} bytes (actual: {} bytes)",
                self.max_size,
                data.len()
            ));
        }

        let detected = match image::guess_format(data) {
            Ok(format) => format,
            Err(e) => {
                return ValidationResult::failure(format!("Unrecognised image format: {}", e));
            }
        };

        let decoded = match image::load_from_memory_with_format(data, detected) {
            Ok(img) => img,
            Err(e) => {
                warn!(error = %e, "Image validation failed");
                return ValidationResult::failure(format!("Failed to decode image: {}", e));
            }
        };

        let (width, height) = (decoded.width(), decoded.height());
        if width == 0 || height == 0 {
            return ValidationResult::failure(format!("Invalid dimensions: {}x{}", width, height));
        }

        let format = StripFormat::from(detected);
        debug!(%format, width, height, bytes = data.len(), "Image validation successful");

        ValidationResult::success(format, width, height, data.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::png_bytes;

    #[test]
    fn test_valid_png() {
        let validator = StandardValidator::new();
        let data = png_bytes(200, 80, 1);

        let result = validator.validate(&data);
        assert!(result.valid, "{}", result.error_message());
        assert_eq!(result.format, StripFormat::Png);
        assert_eq!((result.width, result.height), (200, 80));
        assert_eq!(result.size_in_bytes, data.len());
    }

    #[test]
    fn test_empty_data_rejected() {
        let result = StandardValidator::new().validate(&[]);
        assert!(!result.valid);
        assert!(result.error_message().contains("empty"));
    }

    #[test]
    fn test_garbage_rejected() {
        let result = StandardValidator::new().validate(b"definitely not an image");
        assert!(!result.valid);
    }

    #[test]
    fn test_truncated_png_rejected() {
        let data = png_bytes(200, 80, 1);
        let truncated = &data[..data.len() / 2];

        let result = StandardValidator::new().validate(truncated);
        assert!(!result.valid);
    }

    #[test]
    fn test_size_ceiling() {
        let data = png_bytes(200, 80, 1);
        let validator = StandardValidator::with_max_size(16);

        let result = validator.validate(&data);
        assert!(!result.valid);
        assert!(result.error_message().contains("maximum size"));
    }

    #[test]
    fn test_min_dimensions() {
        let validator = StandardValidator::new();
        let small = png_bytes(60, 30, 1);

        let result = validator.validate_with_min_dimensions(&small, 100, 50);
        assert!(!result.valid);
        assert!(result.error_message().contains("below minimum"));

        let big = png_bytes(120, 60, 1);
        assert!(validator.validate_with_min_dimensions(&big, 100, 50).valid);
    }
}
