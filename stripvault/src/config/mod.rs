//! Configuration file handling.
//!
//! Settings live in an INI file at [`config_file_path`]. Every section is
//! optional; anything not given falls back to its default.
//!
//! ```ini
//! [archive]
//! root = /srv/comics
//! min_width = 100
//!
//! [backfill.gocomics]
//! max_per_day = 20
//!
//! [source.gocomics]
//! strip_url = https://example.com/{identifier}/{yyyy}/{MM}/{dd}
//! ```

mod file;
mod keys;

use std::io;
use std::path::PathBuf;

use thiserror::Error;

pub use file::{
    config_dir, config_file_path, AnalysisSettings, ArchiveSettings, ConfigFile, DownloadSettings,
    HashingSettings, SourceSettings, APP_DIR_NAME, CONFIG_FILENAME, DEFAULT_PARALLEL_DOWNLOADS,
};
pub use keys::ConfigKey;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to parse {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("invalid value '{value}' for [{section}] {key}: {reason}")]
    InvalidValue {
        section: String,
        key: String,
        value: String,
        reason: String,
    },

    #[error("unknown configuration key '{0}'")]
    UnknownKey(String),
}

impl ConfigError {
    pub(crate) fn invalid(
        section: impl Into<String>,
        key: impl Into<String>,
        value: impl Into<String>,
        reason: impl Into<String>,
    ) -> Self {
        ConfigError::InvalidValue {
            section: section.into(),
            key: key.into(),
            value: value.into(),
            reason: reason.into(),
        }
    }
}

/// Human-readable byte count, e.g. `1.5 MB`.
pub fn format_size(bytes: u64) -> String {
    const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

    if bytes < 1024 {
        return format!("{} B", bytes);
    }

    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    format!("{:.1} {}", size, UNITS[unit])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_size() {
        assert_eq!(format_size(0), "0 B");
        assert_eq!(format_size(1023), "1023 B");
        assert_eq!(format_size(1536), "1.5 KB");
        assert_eq!(format_size(5 * 1024 * 1024), "5.0 MB");
    }
}
