//! Sidecar metadata storage.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use super::ImageMetadata;
use crate::archive::persist::{read_json, write_json_atomic};

/// Path of the sidecar for an image: same directory and stem, `.json` extension.
pub fn sidecar_path(image_path: &Path) -> PathBuf {
    image_path.with_extension("json")
}

/// Reads and writes `<yyyy-MM-dd>.json` sidecars next to archived images.
#[derive(Debug, Clone, Default)]
pub struct MetadataRepository;

impl MetadataRepository {
    pub fn new() -> Self {
        Self
    }

    /// Store metadata beside its image.
    ///
    /// Incomplete records are refused with `InvalidInput`.
    pub fn save(&self, metadata: &ImageMetadata) -> io::Result<PathBuf> {
        if !metadata.is_complete() {
            warn!(
                path = %metadata.file_path.display(),
                "Refusing to save incomplete image metadata"
            );
            return Err(io::Error::new(
                io::ErrorKind::InvalidInput,
                "image metadata is incomplete",
            ));
        }

        let path = sidecar_path(&metadata.file_path);
        write_json_atomic(&path, metadata)?;
        debug!(path = %path.display(), "Saved image metadata");
        Ok(path)
    }

    /// Load the sidecar for an image, if present and readable.
    pub fn load(&self, image_path: &Path) -> Option<ImageMetadata> {
        let path = sidecar_path(image_path);
        if !path.is_file() {
            return None;
        }
        match read_json(&path) {
            Ok(metadata) => Some(metadata),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Unreadable image metadata");
                None
            }
        }
    }

    pub fn exists(&self, image_path: &Path) -> bool {
        sidecar_path(image_path).is_file()
    }

    /// Delete the sidecar for an image. Missing sidecars are not an error.
    pub fn delete(&self, image_path: &Path) -> io::Result<()> {
        match fs::remove_file(sidecar_path(image_path)) {
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(()),
            other => other,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ColorMode;
    use crate::validation::StripFormat;
    use chrono::Utc;
    use tempfile::TempDir;

    fn metadata(path: PathBuf) -> ImageMetadata {
        ImageMetadata {
            comic_id: 4,
            file_path: path,
            format: StripFormat::Png,
            width: 300,
            height: 100,
            size_in_bytes: 2048,
            color_mode: ColorMode::Color,
            sample_percentage: 5.0,
            captured_at: Utc::now(),
            source_url: Some("https://example.com/a.png".to_string()),
        }
    }

    #[test]
    fn test_save_and_load() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("2024").join("2024-03-01.png");
        let repo = MetadataRepository::new();

        let saved = repo.save(&metadata(image.clone())).unwrap();
        assert_eq!(saved, temp.path().join("2024").join("2024-03-01.json"));
        assert!(repo.exists(&image));

        let loaded = repo.load(&image).unwrap();
        assert_eq!(loaded.comic_id, 4);
        assert_eq!(loaded.color_mode, ColorMode::Color);

        repo.delete(&image).unwrap();
        assert!(!repo.exists(&image));
        repo.delete(&image).unwrap();
    }

    #[test]
    fn test_incomplete_metadata_refused() {
        let temp = TempDir::new().unwrap();
        let mut record = metadata(temp.path().join("2024-03-01.png"));
        record.width = 0;

        let err = MetadataRepository::new().save(&record).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
        assert!(!sidecar_path(&record.file_path).exists());
    }

    #[test]
    fn test_corrupt_sidecar_loads_as_none() {
        let temp = TempDir::new().unwrap();
        let image = temp.path().join("2024-03-01.png");
        fs::write(sidecar_path(&image), b"garbage").unwrap();

        assert!(MetadataRepository::new().load(&image).is_none());
    }
}
