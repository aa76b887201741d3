//! INI configuration file.

use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use ini::{Ini, Properties};
use tracing::debug;

use super::ConfigError;
use crate::analysis::DEFAULT_SAMPLE_PERCENTAGE;
use crate::archive::{DEFAULT_MIN_HEIGHT, DEFAULT_MIN_WIDTH};
use crate::backfill::{BackfillConfig, SourceLimits};
use crate::dedupe::HashAlgorithm;
use crate::downloader::{DEFAULT_TIMEOUT_SECS, DEFAULT_USER_AGENT};
use crate::logging::LoggingConfig;

/// Application directory name under the platform config and data dirs.
pub const APP_DIR_NAME: &str = "stripvault";

/// Configuration file name.
pub const CONFIG_FILENAME: &str = "config.ini";

/// Default number of comics downloaded in parallel.
pub const DEFAULT_PARALLEL_DOWNLOADS: usize = 4;

const BACKFILL_SECTION_PREFIX: &str = "backfill.";
const SOURCE_SECTION_PREFIX: &str = "source.";

/// Path of the user's configuration file.
pub fn config_file_path() -> PathBuf {
    config_dir().join(CONFIG_FILENAME)
}

/// Directory holding the configuration file and the default comic catalog.
pub fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
}

fn default_archive_root() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_DIR_NAME)
        .join("archive")
}

/// `[archive]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveSettings {
    /// Root directory of the strip archive.
    pub root: PathBuf,
    /// JSON comic catalog.
    pub comics_file: PathBuf,
    pub min_width: u32,
    pub min_height: u32,
}

impl Default for ArchiveSettings {
    fn default() -> Self {
        Self {
            root: default_archive_root(),
            comics_file: config_dir().join("comics.json"),
            min_width: DEFAULT_MIN_WIDTH,
            min_height: DEFAULT_MIN_HEIGHT,
        }
    }
}

/// `[hashing]` section.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HashingSettings {
    pub algorithm: HashAlgorithm,
}

/// `[analysis]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisSettings {
    /// Percentage of pixels sampled for color detection.
    pub sample_percentage: f64,
}

impl Default for AnalysisSettings {
    fn default() -> Self {
        Self {
            sample_percentage: DEFAULT_SAMPLE_PERCENTAGE,
        }
    }
}

/// `[download]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct DownloadSettings {
    /// Request timeout in seconds.
    pub timeout: u64,
    pub user_agent: String,
    /// Number of comics downloaded concurrently.
    pub parallel: usize,
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT_SECS,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            parallel: DEFAULT_PARALLEL_DOWNLOADS,
        }
    }
}

/// `[source.<name>]` section: a URL-template download source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceSettings {
    /// Strip URL with `{identifier}`, `{yyyy}`, `{MM}` and `{dd}` placeholders.
    pub strip_url: String,
    /// Avatar URL with an `{identifier}` placeholder.
    pub avatar_url: Option<String>,
}

/// Complete configuration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigFile {
    pub archive: ArchiveSettings,
    pub hashing: HashingSettings,
    pub analysis: AnalysisSettings,
    pub download: DownloadSettings,
    pub backfill: BackfillConfig,
    /// Download sources keyed by source name.
    pub sources: BTreeMap<String, SourceSettings>,
    pub logging: LoggingConfig,
}

impl ConfigFile {
    /// Load from the default location. A missing file yields defaults.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(&config_file_path())
    }

    /// Load from `path`. A missing file yields defaults.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "No config file, using defaults");
            return Ok(Self::default());
        }

        let ini = Ini::load_from_file(path).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Parse from INI text.
    pub fn parse(text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse {
            path: PathBuf::new(),
            message: e.to_string(),
        })?;
        Self::from_ini(&ini)
    }

    /// Save to the default location.
    pub fn save(&self) -> Result<(), ConfigError> {
        self.save_to(&config_file_path())
    }

    /// Save to `path`, creating its parent directory.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| ConfigError::Io {
                path: parent.to_path_buf(),
                source: e,
            })?;
        }
        self.to_ini().write_to_file(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Render as INI text.
    pub fn to_ini_string(&self) -> String {
        let mut buffer = Vec::new();
        // Writing into a Vec cannot fail.
        let _ = self.to_ini().write_to(&mut buffer);
        String::from_utf8_lossy(&buffer).into_owned()
    }

    fn from_ini(ini: &Ini) -> Result<Self, ConfigError> {
        let mut config = Self::default();

        if let Some(section) = ini.section(Some("archive")) {
            let archive = &mut config.archive;
            if let Some(root) = non_empty(section, "root") {
                archive.root = PathBuf::from(root);
            }
            if let Some(file) = non_empty(section, "comics_file") {
                archive.comics_file = PathBuf::from(file);
            }
            archive.min_width = parse_or(section, "archive", "min_width", archive.min_width)?;
            archive.min_height = parse_or(section, "archive", "min_height", archive.min_height)?;
        }

        if let Some(section) = ini.section(Some("hashing")) {
            config.hashing.algorithm =
                parse_or(section, "hashing", "algorithm", config.hashing.algorithm)?;
        }

        if let Some(section) = ini.section(Some("analysis")) {
            let pct: f64 = parse_or(
                section,
                "analysis",
                "sample_percentage",
                config.analysis.sample_percentage,
            )?;
            if !(pct > 0.0 && pct <= 100.0) {
                return Err(ConfigError::invalid(
                    "analysis",
                    "sample_percentage",
                    pct.to_string(),
                    "must be in (0, 100]",
                ));
            }
            config.analysis.sample_percentage = pct;
        }

        if let Some(section) = ini.section(Some("download")) {
            let download = &mut config.download;
            download.timeout = parse_or(section, "download", "timeout", download.timeout)?;
            if let Some(agent) = non_empty(section, "user_agent") {
                download.user_agent = agent.to_string();
            }
            download.parallel = parse_or(section, "download", "parallel", download.parallel)?;
            if download.parallel == 0 {
                return Err(ConfigError::invalid("download", "parallel", "0", "must be at least 1"));
            }
        }

        if let Some(section) = ini.section(Some("backfill")) {
            let backfill = &mut config.backfill;
            backfill.enabled = parse_bool_or(section, "backfill", "enabled", backfill.enabled)?;
            backfill.max_consecutive_failures = parse_or(
                section,
                "backfill",
                "max_consecutive_failures",
                backfill.max_consecutive_failures,
            )?;
            backfill.default_max_per_day =
                parse_or(section, "backfill", "default_max_per_day", backfill.default_max_per_day)?;
            backfill.default_max_days_back = parse_or(
                section,
                "backfill",
                "default_max_days_back",
                backfill.default_max_days_back,
            )?;
        }

        if let Some(section) = ini.section(Some("logging")) {
            if let Some(level) = non_empty(section, "level") {
                config.logging.level = level.to_string();
            }
            config.logging.directory = non_empty(section, "directory").map(PathBuf::from);
        }

        for (name, section) in ini.iter() {
            let Some(name) = name else { continue };

            if let Some(source) = name.strip_prefix(BACKFILL_SECTION_PREFIX) {
                let limits = SourceLimits {
                    max_per_day: parse_opt(section, name, "max_per_day")?,
                    max_days_back: parse_opt(section, name, "max_days_back")?,
                    enabled: parse_bool_or(section, name, "enabled", true)?,
                };
                config.backfill.sources.insert(source.to_string(), limits);
            } else if let Some(source) = name.strip_prefix(SOURCE_SECTION_PREFIX) {
                let strip_url = non_empty(section, "strip_url")
                    .ok_or_else(|| ConfigError::invalid(name, "strip_url", "", "is required"))?;
                config.sources.insert(
                    source.to_string(),
                    SourceSettings {
                        strip_url: strip_url.to_string(),
                        avatar_url: non_empty(section, "avatar_url").map(str::to_string),
                    },
                );
            }
        }

        Ok(config)
    }

    fn to_ini(&self) -> Ini {
        let mut ini = Ini::new();

        ini.with_section(Some("archive"))
            .set("root", self.archive.root.to_string_lossy())
            .set("comics_file", self.archive.comics_file.to_string_lossy())
            .set("min_width", self.archive.min_width.to_string())
            .set("min_height", self.archive.min_height.to_string());

        ini.with_section(Some("hashing"))
            .set("algorithm", self.hashing.algorithm.config_name());

        ini.with_section(Some("analysis"))
            .set("sample_percentage", self.analysis.sample_percentage.to_string());

        ini.with_section(Some("download"))
            .set("timeout", self.download.timeout.to_string())
            .set("user_agent", self.download.user_agent.as_str())
            .set("parallel", self.download.parallel.to_string());

        ini.with_section(Some("backfill"))
            .set("enabled", self.backfill.enabled.to_string())
            .set(
                "max_consecutive_failures",
                self.backfill.max_consecutive_failures.to_string(),
            )
            .set("default_max_per_day", self.backfill.default_max_per_day.to_string())
            .set("default_max_days_back", self.backfill.default_max_days_back.to_string());

        let mut sources: Vec<_> = self.backfill.sources.iter().collect();
        sources.sort_by(|a, b| a.0.cmp(b.0));
        for (source, limits) in sources {
            let name = format!("{}{}", BACKFILL_SECTION_PREFIX, source);
            let mut section = ini.with_section(Some(name));
            section.set("enabled", limits.enabled.to_string());
            if let Some(max) = limits.max_per_day {
                section.set("max_per_day", max.to_string());
            }
            if let Some(days) = limits.max_days_back {
                section.set("max_days_back", days.to_string());
            }
        }

        for (source, settings) in &self.sources {
            let name = format!("{}{}", SOURCE_SECTION_PREFIX, source);
            let mut section = ini.with_section(Some(name));
            section.set("strip_url", settings.strip_url.as_str());
            if let Some(avatar) = &settings.avatar_url {
                section.set("avatar_url", avatar.as_str());
            }
        }

        let mut logging = ini.with_section(Some("logging"));
        logging.set("level", self.logging.level.as_str());
        if let Some(dir) = &self.logging.directory {
            logging.set("directory", dir.to_string_lossy());
        }

        ini
    }
}

fn non_empty<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section.get(key).map(str::trim).filter(|v| !v.is_empty())
}

fn parse_or<T>(section: &Properties, name: &str, key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    Ok(parse_opt(section, name, key)?.unwrap_or(default))
}

fn parse_opt<T>(section: &Properties, name: &str, key: &str) -> Result<Option<T>, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    non_empty(section, key)
        .map(|raw| {
            raw.parse()
                .map_err(|e: T::Err| ConfigError::invalid(name, key, raw, e.to_string()))
        })
        .transpose()
}

fn parse_bool_or(section: &Properties, name: &str, key: &str, default: bool) -> Result<bool, ConfigError> {
    match non_empty(section, key) {
        None => Ok(default),
        Some(raw) => parse_bool(raw)
            .ok_or_else(|| ConfigError::invalid(name, key, raw, "expected true or false")),
    }
}

pub(crate) fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}
