//! Individually addressable settings for `config get` / `config set`.

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;

use super::file::parse_bool;
use super::{ConfigError, ConfigFile};

/// A `section.key` setting.
///
/// Per-source sections are edited in the file directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    ArchiveRoot,
    ArchiveComicsFile,
    ArchiveMinWidth,
    ArchiveMinHeight,
    HashingAlgorithm,
    AnalysisSamplePercentage,
    DownloadTimeout,
    DownloadUserAgent,
    DownloadParallel,
    BackfillEnabled,
    BackfillMaxConsecutiveFailures,
    BackfillDefaultMaxPerDay,
    BackfillDefaultMaxDaysBack,
    LoggingLevel,
    LoggingDirectory,
}

impl ConfigKey {
    /// Every key, in file order.
    pub fn all() -> &'static [ConfigKey] {
        use ConfigKey::*;
        &[
            ArchiveRoot,
            ArchiveComicsFile,
            ArchiveMinWidth,
            ArchiveMinHeight,
            HashingAlgorithm,
            AnalysisSamplePercentage,
            DownloadTimeout,
            DownloadUserAgent,
            DownloadParallel,
            BackfillEnabled,
            BackfillMaxConsecutiveFailures,
            BackfillDefaultMaxPerDay,
            BackfillDefaultMaxDaysBack,
            LoggingLevel,
            LoggingDirectory,
        ]
    }

    /// Full `section.key` name.
    pub fn name(&self) -> &'static str {
        match self {
            ConfigKey::ArchiveRoot => "archive.root",
            ConfigKey::ArchiveComicsFile => "archive.comics_file",
            ConfigKey::ArchiveMinWidth => "archive.min_width",
            ConfigKey::ArchiveMinHeight => "archive.min_height",
            ConfigKey::HashingAlgorithm => "hashing.algorithm",
            ConfigKey::AnalysisSamplePercentage => "analysis.sample_percentage",
            ConfigKey::DownloadTimeout => "download.timeout",
            ConfigKey::DownloadUserAgent => "download.user_agent",
            ConfigKey::DownloadParallel => "download.parallel",
            ConfigKey::BackfillEnabled => "backfill.enabled",
            ConfigKey::BackfillMaxConsecutiveFailures => "backfill.max_consecutive_failures",
            ConfigKey::BackfillDefaultMaxPerDay => "backfill.default_max_per_day",
            ConfigKey::BackfillDefaultMaxDaysBack => "backfill.default_max_days_back",
            ConfigKey::LoggingLevel => "logging.level",
            ConfigKey::LoggingDirectory => "logging.directory",
        }
    }

    pub fn section(&self) -> &'static str {
        self.split().0
    }

    pub fn key_name(&self) -> &'static str {
        self.split().1
    }

    fn split(&self) -> (&'static str, &'static str) {
        self.name().split_once('.').unwrap_or((self.name(), ""))
    }

    /// Current value as text. Unset optional values are empty.
    pub fn get(&self, config: &ConfigFile) -> String {
        match self {
            ConfigKey::ArchiveRoot => config.archive.root.display().to_string(),
            ConfigKey::ArchiveComicsFile => config.archive.comics_file.display().to_string(),
            ConfigKey::ArchiveMinWidth => config.archive.min_width.to_string(),
            ConfigKey::ArchiveMinHeight => config.archive.min_height.to_string(),
            ConfigKey::HashingAlgorithm => config.hashing.algorithm.to_string(),
            ConfigKey::AnalysisSamplePercentage => config.analysis.sample_percentage.to_string(),
            ConfigKey::DownloadTimeout => config.download.timeout.to_string(),
            ConfigKey::DownloadUserAgent => config.download.user_agent.clone(),
            ConfigKey::DownloadParallel => config.download.parallel.to_string(),
            ConfigKey::BackfillEnabled => config.backfill.enabled.to_string(),
            ConfigKey::BackfillMaxConsecutiveFailures => {
                config.backfill.max_consecutive_failures.to_string()
            }
            ConfigKey::BackfillDefaultMaxPerDay => config.backfill.default_max_per_day.to_string(),
            ConfigKey::BackfillDefaultMaxDaysBack => {
                config.backfill.default_max_days_back.to_string()
            }
            ConfigKey::LoggingLevel => config.logging.level.clone(),
            ConfigKey::LoggingDirectory => config
                .logging
                .directory
                .as_ref()
                .map(|d| d.display().to_string())
                .unwrap_or_default(),
        }
    }

    /// Parse `value` and store it. Invalid values leave `config` untouched.
    pub fn set(&self, config: &mut ConfigFile, value: &str) -> Result<(), ConfigError> {
        let value = value.trim();
        match self {
            ConfigKey::ArchiveRoot => config.archive.root = self.path(value)?,
            ConfigKey::ArchiveComicsFile => config.archive.comics_file = self.path(value)?,
            ConfigKey::ArchiveMinWidth => config.archive.min_width = self.parse(value)?,
            ConfigKey::ArchiveMinHeight => config.archive.min_height = self.parse(value)?,
            ConfigKey::HashingAlgorithm => config.hashing.algorithm = self.parse(value)?,
            ConfigKey::AnalysisSamplePercentage => {
                let pct: f64 = self.parse(value)?;
                if !(pct > 0.0 && pct <= 100.0) {
                    return Err(self.invalid(value, "must be in (0, 100]"));
                }
                config.analysis.sample_percentage = pct;
            }
            ConfigKey::DownloadTimeout => config.download.timeout = self.parse(value)?,
            ConfigKey::DownloadUserAgent => config.download.user_agent = value.to_string(),
            ConfigKey::DownloadParallel => {
                let parallel: usize = self.parse(value)?;
                if parallel == 0 {
                    return Err(self.invalid(value, "must be at least 1"));
                }
                config.download.parallel = parallel;
            }
            ConfigKey::BackfillEnabled => {
                config.backfill.enabled =
                    parse_bool(value).ok_or_else(|| self.invalid(value, "expected true or false"))?
            }
            ConfigKey::BackfillMaxConsecutiveFailures => {
                config.backfill.max_consecutive_failures = self.parse(value)?
            }
            ConfigKey::BackfillDefaultMaxPerDay => {
                config.backfill.default_max_per_day = self.parse(value)?
            }
            ConfigKey::BackfillDefaultMaxDaysBack => {
                config.backfill.default_max_days_back = self.parse(value)?
            }
            ConfigKey::LoggingLevel => {
                if value.is_empty() {
                    return Err(self.invalid(value, "must not be empty"));
                }
                config.logging.level = value.to_string();
            }
            ConfigKey::LoggingDirectory => {
                config.logging.directory = (!value.is_empty()).then(|| PathBuf::from(value))
            }
        }
        Ok(())
    }

    fn parse<T>(&self, value: &str) -> Result<T, ConfigError>
    where
        T: FromStr,
        T::Err: fmt::Display,
    {
        value
            .parse()
            .map_err(|e: T::Err| self.invalid(value, e.to_string()))
    }

    fn path(&self, value: &str) -> Result<PathBuf, ConfigError> {
        if value.is_empty() {
            return Err(self.invalid(value, "must not be empty"));
        }
        Ok(PathBuf::from(value))
    }

    fn invalid(&self, value: &str, reason: impl Into<String>) -> ConfigError {
        ConfigError::invalid(self.section(), self.key_name(), value, reason)
    }
}

impl fmt::Display for ConfigKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ConfigKey {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_ascii_lowercase();
        ConfigKey::all()
            .iter()
            .copied()
            .find(|key| key.name() == wanted)
            .ok_or(ConfigError::UnknownKey(wanted))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dedupe::HashAlgorithm;

    #[test]
    fn test_names_parse_back() {
        for key in ConfigKey::all() {
            assert_eq!(key.name().parse::<ConfigKey>().unwrap(), *key);
            assert_eq!(format!("{}.{}", key.section(), key.key_name()), key.name());
        }
        assert!(matches!(
            "archive.nope".parse::<ConfigKey>(),
            Err(ConfigError::UnknownKey(_))
        ));
    }

    #[test]
    fn test_set_and_get() {
        let mut config = ConfigFile::default();

        ConfigKey::HashingAlgorithm.set(&mut config, "average").unwrap();
        assert_eq!(config.hashing.algorithm, HashAlgorithm::AverageHash);
        assert_eq!(ConfigKey::HashingAlgorithm.get(&config), "average");

        ConfigKey::BackfillEnabled.set(&mut config, "off").unwrap();
        assert!(!config.backfill.enabled);

        ConfigKey::LoggingDirectory.set(&mut config, "/tmp/logs").unwrap();
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "/tmp/logs");
        ConfigKey::LoggingDirectory.set(&mut config, "").unwrap();
        assert_eq!(ConfigKey::LoggingDirectory.get(&config), "");
    }

    #[test]
    fn test_invalid_set_leaves_config_untouched() {
        let mut config = ConfigFile::default();
        let before = config.clone();

        assert!(ConfigKey::ArchiveMinWidth.set(&mut config, "-5").is_err());
        assert!(ConfigKey::DownloadParallel.set(&mut config, "0").is_err());
        assert!(ConfigKey::AnalysisSamplePercentage.set(&mut config, "150").is_err());
        assert!(ConfigKey::ArchiveRoot.set(&mut config, "  ").is_err());

        assert_eq!(config, before);
    }
}
