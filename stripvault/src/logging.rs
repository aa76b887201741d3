//! Tracing subscriber setup.
//!
//! Logs go to stderr with local RFC 3339 timestamps. When a log directory is
//! configured, a daily-rolling file is written as well. `RUST_LOG` overrides
//! the configured level.

use std::fs;
use std::io;
use std::path::PathBuf;

use thiserror::Error;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::fmt::time::LocalTime;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::{fmt, EnvFilter, Layer};

/// Default log level when neither the config nor `RUST_LOG` set one.
pub const DEFAULT_LOG_LEVEL: &str = "info";

/// File name prefix for rolling log files.
pub const LOG_FILE_PREFIX: &str = "stripvault.log";

/// Logging settings from the `[logging]` config section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Filter directive, e.g. `info` or `stripvault=debug,warn`.
    pub level: String,
    /// Directory for daily log files. `None` logs to stderr only.
    pub directory: Option<PathBuf>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: DEFAULT_LOG_LEVEL.to_string(),
            directory: None,
        }
    }
}

#[derive(Debug, Error)]
pub enum LoggingError {
    #[error("invalid log filter '{filter}': {message}")]
    InvalidFilter { filter: String, message: String },

    #[error("failed to create log directory {path}: {source}")]
    Directory {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to install tracing subscriber: {0}")]
    Install(String),
}

/// Keeps the background log writer alive. Drop it at shutdown to flush.
#[must_use = "dropping the guard stops file logging"]
pub struct LoggingGuard {
    _file: Option<WorkerGuard>,
}

/// Build the level filter, letting `RUST_LOG` win over the config.
pub fn build_filter(level: &str) -> Result<EnvFilter, LoggingError> {
    if let Ok(filter) = EnvFilter::try_from_default_env() {
        return Ok(filter);
    }
    EnvFilter::try_new(level).map_err(|e| LoggingError::InvalidFilter {
        filter: level.to_string(),
        message: e.to_string(),
    })
}

/// Install the global subscriber.
pub fn init(config: &LoggingConfig) -> Result<LoggingGuard, LoggingError> {
    let filter = build_filter(&config.level)?;

    let stderr_layer = fmt::layer()
        .with_writer(io::stderr)
        .with_timer(LocalTime::rfc_3339())
        .with_target(false);

    let (file_layer, guard) = match &config.directory {
        Some(dir) => {
            fs::create_dir_all(dir).map_err(|e| LoggingError::Directory {
                path: dir.clone(),
                source: e,
            })?;
            let appender = tracing_appender::rolling::daily(dir, LOG_FILE_PREFIX);
            let (writer, guard) = tracing_appender::non_blocking(appender);
            let layer = fmt::layer()
                .with_writer(writer)
                .with_timer(LocalTime::rfc_3339())
                .with_ansi(false)
                .boxed();
            (Some(layer), Some(guard))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr_layer)
        .with(file_layer)
        .try_init()
        .map_err(|e| LoggingError::Install(e.to_string()))?;

    Ok(LoggingGuard { _file: guard })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = LoggingConfig::default();
        assert_eq!(config.level, "info");
        assert!(config.directory.is_none());
    }

    #[test]
    fn test_filter_directives() {
        if std::env::var_os("RUST_LOG").is_some() {
            return;
        }
        assert!(build_filter("stripvault=debug,warn").is_ok());
        assert!(matches!(
            build_filter("stripvault=notalevel"),
            Err(LoggingError::InvalidFilter { .. })
        ));
    }
}
