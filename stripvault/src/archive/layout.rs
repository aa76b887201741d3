//! Archive directory layout.
//!
//! This module is the single source of truth for where things live inside the
//! archive root:
//!
//! ```text
//! <root>/<ComicDir>/available-dates.json        date index
//! <root>/<ComicDir>/avatar.<ext>                 comic avatar
//! <root>/<ComicDir>/<yyyy>/<yyyy-MM-dd>.<ext>   strip image
//! <root>/<ComicDir>/<yyyy>/<yyyy-MM-dd>.json    sidecar metadata
//! <root>/<ComicDir>/<yyyy>/image-hashes.json    duplicate hashes for the year
//! ```
//!
//! Directories whose names start with `@` belong to NAS platforms (e.g.
//! Synology's `@eaDir`) and are never treated as archive content.

use std::ffi::OsStr;
use std::fs;
use std::path::{Path, PathBuf};

use chrono::{Datelike, NaiveDate};

use crate::comic::ComicIdentity;
use crate::validation::StripFormat;

/// File name of the per-comic date index.
pub const INDEX_FILENAME: &str = "available-dates.json";

/// File name of the per-year duplicate hash partition.
pub const HASH_FILENAME: &str = "image-hashes.json";

/// File stem of a comic's avatar image.
pub const AVATAR_STEM: &str = "avatar";

/// Prefix of platform metadata directories that must be skipped.
pub const RESERVED_PREFIX: char = '@';

/// Date format used for strip file stems.
const STRIP_DATE_FORMAT: &str = "%Y-%m-%d";

/// Resolves archive paths for comics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: PathBuf,
}

impl ArchiveLayout {
    /// Create a layout rooted at `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// The archive root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding everything for one comic.
    pub fn comic_dir(&self, comic: &ComicIdentity) -> PathBuf {
        self.root.join(comic.dir_name())
    }

    /// Directory holding one year of strips.
    pub fn year_dir(&self, comic: &ComicIdentity, year: i32) -> PathBuf {
        self.comic_dir(comic).join(format!("{:04}", year))
    }

    /// Path of the persisted date index.
    pub fn index_path(&self, comic: &ComicIdentity) -> PathBuf {
        self.comic_dir(comic).join(INDEX_FILENAME)
    }

    /// Path of the persisted hash partition for a year.
    pub fn hash_path(&self, comic: &ComicIdentity, year: i32) -> PathBuf {
        self.year_dir(comic, year).join(HASH_FILENAME)
    }

    /// Path a strip of the given format is written to.
    pub fn strip_path(&self, comic: &ComicIdentity, date: NaiveDate, format: StripFormat) -> PathBuf {
        self.year_dir(comic, date.year())
            .join(strip_file_name(date, format))
    }

    /// Locate an existing strip for `date`, whatever its image format.
    ///
    /// Accepts exactly the files [`ArchiveLayout::strip_date`] accepts, so
    /// `2024-01-01.jpeg` or `2024-01-01.PNG` count as well as the names the
    /// writer produces.
    pub fn find_strip(&self, comic: &ComicIdentity, date: NaiveDate) -> Option<PathBuf> {
        let year_dir = self.year_dir(comic, date.year());
        StripFormat::ARCHIVED
            .iter()
            .map(|format| year_dir.join(strip_file_name(date, *format)))
            .find(|path| path.is_file())
            .or_else(|| self.strip_files(comic, date).into_iter().next())
    }

    /// Every image file in the year directory whose name parses as `date`.
    pub fn strip_files(&self, comic: &ComicIdentity, date: NaiveDate) -> Vec<PathBuf> {
        let Ok(entries) = fs::read_dir(self.year_dir(comic, date.year())) else {
            return Vec::new();
        };

        let mut files: Vec<PathBuf> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| Self::strip_date(path) == Some(date) && path.is_file())
            .collect();
        files.sort();
        files
    }

    /// Path an avatar of the given format is written to.
    pub fn avatar_path(&self, comic: &ComicIdentity, format: StripFormat) -> PathBuf {
        self.comic_dir(comic)
            .join(format!("{}.{}", AVATAR_STEM, format.extension()))
    }

    /// Locate an existing avatar, whatever its image format.
    pub fn find_avatar(&self, comic: &ComicIdentity) -> Option<PathBuf> {
        StripFormat::ARCHIVED
            .iter()
            .map(|format| self.avatar_path(comic, *format))
            .find(|path| path.is_file())
    }

    /// Whether a directory entry is platform metadata rather than content.
    pub fn is_reserved(name: &OsStr) -> bool {
        name.to_str()
            .is_some_and(|n| n.starts_with(RESERVED_PREFIX))
    }

    /// Parse the date of a strip file from its name.
    ///
    /// Returns `None` for anything that is not `<yyyy-MM-dd>.<image ext>`,
    /// which excludes sidecar metadata, hash partitions and the index.
    pub fn strip_date(path: &Path) -> Option<NaiveDate> {
        let ext = path.extension()?.to_str()?;
        if !StripFormat::is_image_extension(ext) {
            return None;
        }
        let stem = path.file_stem()?.to_str()?;
        NaiveDate::parse_from_str(stem, STRIP_DATE_FORMAT).ok()
    }
}

/// File name for a strip: `<yyyy-MM-dd>.<ext>`.
pub fn strip_file_name(date: NaiveDate, format: StripFormat) -> String {
    format!("{}.{}", date.format(STRIP_DATE_FORMAT), format.extension())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_paths() {
        let layout = ArchiveLayout::new("/archive");
        let comic = ComicIdentity::new(7, "Adam At Home");

        assert_eq!(
            layout.index_path(&comic),
            PathBuf::from("/archive/AdamAtHome/available-dates.json")
        );
        assert_eq!(
            layout.hash_path(&comic, 2024),
            PathBuf::from("/archive/AdamAtHome/2024/image-hashes.json")
        );
        assert_eq!(
            layout.strip_path(&comic, date(2024, 1, 5), StripFormat::Png),
            PathBuf::from("/archive/AdamAtHome/2024/2024-01-05.png")
        );
        assert_eq!(
            layout.avatar_path(&comic, StripFormat::Jpeg),
            PathBuf::from("/archive/AdamAtHome/avatar.jpg")
        );
    }

    #[test]
    fn test_strip_date_parsing() {
        assert_eq!(
            ArchiveLayout::strip_date(Path::new("2024-01-05.png")),
            Some(date(2024, 1, 5))
        );
        assert_eq!(
            ArchiveLayout::strip_date(Path::new("2024-01-05.JPG")),
            Some(date(2024, 1, 5))
        );
        assert_eq!(ArchiveLayout::strip_date(Path::new("2024-01-05.json")), None);
        assert_eq!(ArchiveLayout::strip_date(Path::new("image-hashes.json")), None);
        assert_eq!(ArchiveLayout::strip_date(Path::new("2024-13-45.png")), None);
        assert_eq!(ArchiveLayout::strip_date(Path::new("avatar.png")), None);
    }

    #[test]
    fn test_reserved_names() {
        assert!(ArchiveLayout::is_reserved(OsStr::new("@eaDir")));
        assert!(!ArchiveLayout::is_reserved(OsStr::new("2024")));
    }

    #[test]
    fn test_find_strip_any_format() {
        let temp = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(temp.path());
        let comic = ComicIdentity::new(1, "Test");

        assert!(layout.find_strip(&comic, date(2023, 6, 1)).is_none());

        let path = layout.strip_path(&comic, date(2023, 6, 1), StripFormat::Gif);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"gif").unwrap();

        assert_eq!(layout.find_strip(&comic, date(2023, 6, 1)), Some(path));
    }

    #[test]
    fn test_find_strip_accepts_extension_aliases() {
        let temp = TempDir::new().unwrap();
        let layout = ArchiveLayout::new(temp.path());
        let comic = ComicIdentity::new(1, "Test");
        let year_dir = layout.year_dir(&comic, 2024);
        fs::create_dir_all(&year_dir).unwrap();

        let jpeg = year_dir.join("2024-01-01.jpeg");
        let tiff = year_dir.join("2024-01-02.TIFF");
        fs::write(&jpeg, b"jpeg").unwrap();
        fs::write(&tiff, b"tiff").unwrap();
        fs::write(year_dir.join("2024-01-03.json"), b"{}").unwrap();

        for path in [&jpeg, &tiff] {
            let date = ArchiveLayout::strip_date(path).unwrap();
            assert_eq!(layout.find_strip(&comic, date).as_ref(), Some(path));
        }
        assert!(layout.find_strip(&comic, date(2024, 1, 3)).is_none());
        assert_eq!(layout.strip_files(&comic, date(2024, 1, 1)), vec![jpeg]);
    }
}
