//! Shared command setup: configuration, logging and the archive service.

use std::path::{Path, PathBuf};

use stripvault::config::{config_file_path, ConfigFile};
use stripvault::logging::{self, LoggingGuard};
use stripvault::service::ArchiveService;
use tracing::info;

use crate::error::CliError;

/// Loads configuration and installs logging for one CLI invocation.
pub struct CliRunner {
    config: ConfigFile,
    config_path: PathBuf,
    _log_guard: LoggingGuard,
}

impl CliRunner {
    /// Load the config at `path`, or the default location, and start logging.
    pub fn new(path: Option<&Path>) -> Result<Self, CliError> {
        let config_path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
        let config = ConfigFile::load_from(&config_path)?;
        let log_guard = logging::init(&config.logging)?;

        Ok(Self {
            config,
            config_path,
            _log_guard: log_guard,
        })
    }

    pub fn config(&self) -> &ConfigFile {
        &self.config
    }

    pub fn log_startup(&self, command: &str) {
        info!(
            command,
            version = stripvault::VERSION,
            config = %self.config_path.display(),
            archive = %self.config.archive.root.display(),
            "stripvault starting"
        );
    }

    /// Build the archive service from the loaded config.
    pub fn service(&self) -> Result<ArchiveService, CliError> {
        let service = ArchiveService::from_config(self.config.clone())?;
        if service.registry().sources().is_empty() {
            println!(
                "No download sources configured. Add a [source.<name>] section to {}.",
                self.config_path.display()
            );
        }
        Ok(service)
    }
}
