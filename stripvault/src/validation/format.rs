//! Supported strip image formats.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Image format of an archived strip.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum StripFormat {
    Png,
    Jpeg,
    Gif,
    Tiff,
    Bmp,
    Webp,
    Unknown,
}

impl StripFormat {
    /// Formats that can appear in the archive, in lookup order.
    pub const ARCHIVED: [StripFormat; 6] = [
        StripFormat::Png,
        StripFormat::Jpeg,
        StripFormat::Gif,
        StripFormat::Webp,
        StripFormat::Tiff,
        StripFormat::Bmp,
    ];

    /// File extension used when writing this format to disk.
    pub fn extension(&self) -> &'static str {
        match self {
            StripFormat::Png => "png",
            StripFormat::Jpeg => "jpg",
            StripFormat::Gif => "gif",
            StripFormat::Tiff => "tif",
            StripFormat::Bmp => "bmp",
            StripFormat::Webp => "webp",
            // Unknown bytes are stored as png, matching the historical layout
            StripFormat::Unknown => "png",
        }
    }

    /// Map a file extension back to a format.
    ///
    /// Accepts the common aliases (`jpeg`, `tiff`) and is case-insensitive.
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_ascii_lowercase().as_str() {
            "png" => Some(StripFormat::Png),
            "jpg" | "jpeg" => Some(StripFormat::Jpeg),
            "gif" => Some(StripFormat::Gif),
            "tif" | "tiff" => Some(StripFormat::Tiff),
            "bmp" => Some(StripFormat::Bmp),
            "webp" => Some(StripFormat::Webp),
            _ => None,
        }
    }

    /// Whether `ext` names an image file that may hold a strip.
    pub fn is_image_extension(ext: &str) -> bool {
        Self::from_extension(ext).is_some()
    }
}

impl From<image::ImageFormat> for StripFormat {
    fn from(format: image::ImageFormat) -> Self {
        match format {
            image::ImageFormat::Png => StripFormat::Png,
            image::ImageFormat::Jpeg => StripFormat::Jpeg,
            image::ImageFormat::Gif => StripFormat::Gif,
            image::ImageFormat::Tiff => StripFormat::Tiff,
            image::ImageFormat::Bmp => StripFormat::Bmp,
            image::ImageFormat::WebP => StripFormat::Webp,
            _ => StripFormat::Unknown,
        }
    }
}

impl fmt::Display for StripFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            StripFormat::Png => "PNG",
            StripFormat::Jpeg => "JPEG",
            StripFormat::Gif => "GIF",
            StripFormat::Tiff => "TIFF",
            StripFormat::Bmp => "BMP",
            StripFormat::Webp => "WEBP",
            StripFormat::Unknown => "UNKNOWN",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extension_aliases() {
        assert_eq!(StripFormat::from_extension("JPEG"), Some(StripFormat::Jpeg));
        assert_eq!(StripFormat::from_extension("jpg"), Some(StripFormat::Jpeg));
        assert_eq!(StripFormat::from_extension("tiff"), Some(StripFormat::Tiff));
        assert_eq!(StripFormat::from_extension("json"), None);
    }

    #[test]
    fn test_archived_extensions_are_recognised() {
        for format in StripFormat::ARCHIVED {
            assert_eq!(StripFormat::from_extension(format.extension()), Some(format));
        }
    }

    #[test]
    fn test_serde_uses_uppercase_names() {
        let json = serde_json::to_string(&StripFormat::Webp).unwrap();
        assert_eq!(json, "\"WEBP\"");
    }
}
