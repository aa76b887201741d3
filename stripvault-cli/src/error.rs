//! CLI error type.

use std::fmt;

use stripvault::config::ConfigError;
use stripvault::logging::LoggingError;
use stripvault::service::ServiceError;

/// Errors reported by CLI commands. Each maps to exit code 1.
#[derive(Debug)]
pub enum CliError {
    /// Bad or missing configuration, or a bad argument.
    Config(String),
    /// The archive service could not be built.
    Service(ServiceError),
    /// Logging could not be installed.
    Logging(LoggingError),
    /// A named comic is not in the catalog.
    ComicNotFound(String),
    /// An archive operation failed.
    Archive(String),
    /// The async runtime could not be started.
    Runtime(String),
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(msg) => write!(f, "Configuration error: {}", msg),
            CliError::Service(e) => write!(f, "Service error: {}", e),
            CliError::Logging(e) => write!(f, "Logging error: {}", e),
            CliError::ComicNotFound(name) => write!(
                f,
                "Comic '{}' not found in the catalog. Use a name or numeric id from comics.json.",
                name
            ),
            CliError::Archive(msg) => write!(f, "Archive error: {}", msg),
            CliError::Runtime(msg) => write!(f, "Runtime error: {}", msg),
        }
    }
}

impl std::error::Error for CliError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CliError::Service(e) => Some(e),
            CliError::Logging(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(e: ConfigError) -> Self {
        CliError::Config(e.to_string())
    }
}

impl From<ServiceError> for CliError {
    fn from(e: ServiceError) -> Self {
        CliError::Service(e)
    }
}

impl From<LoggingError> for CliError {
    fn from(e: LoggingError) -> Self {
        CliError::Logging(e)
    }
}
