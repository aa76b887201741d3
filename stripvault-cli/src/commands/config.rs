//! Configuration management CLI commands.
//!
//! Provides `config get`, `config set`, `config list`, `config show` and
//! `config path` for viewing and modifying settings from the command line.

use std::path::Path;

use clap::Subcommand;
use stripvault::config::{config_file_path, ConfigFile, ConfigKey};

use crate::error::CliError;

/// Config subcommands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommands {
    /// Get a configuration value
    Get {
        /// Configuration key in format section.key (e.g., archive.root)
        key: String,
    },

    /// Set a configuration value
    Set {
        /// Configuration key in format section.key (e.g., archive.root)
        key: String,

        /// Value to set
        value: String,
    },

    /// List all configuration settings
    List,

    /// Print the effective configuration as INI
    Show,

    /// Show the configuration file path
    Path,
}

/// Run a config subcommand against `path`, or the default config file.
pub fn run(command: ConfigCommands, path: Option<&Path>) -> Result<(), CliError> {
    let path = path.map(Path::to_path_buf).unwrap_or_else(config_file_path);
    match command {
        ConfigCommands::Get { key } => run_get(&path, &key),
        ConfigCommands::Set { key, value } => run_set(&path, &key, &value),
        ConfigCommands::List => run_list(&path),
        ConfigCommands::Show => run_show(&path),
        ConfigCommands::Path => run_path(&path),
    }
}

fn parse_key(key: &str) -> Result<ConfigKey, CliError> {
    key.parse().map_err(|_| {
        CliError::Config(format!(
            "Unknown configuration key '{}'. Use 'stripvault config list' to see available keys.",
            key
        ))
    })
}

/// Get a configuration value.
fn run_get(path: &Path, key: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;
    let config = ConfigFile::load_from(path).unwrap_or_default();
    let value = config_key.get(&config);

    if value.is_empty() {
        println!("(not set)");
    } else {
        println!("{}", value);
    }

    Ok(())
}

/// Set a configuration value.
fn run_set(path: &Path, key: &str, value: &str) -> Result<(), CliError> {
    let config_key = parse_key(key)?;

    // Refuse to overwrite a file we cannot read back.
    let mut config = ConfigFile::load_from(path)?;
    config_key.set(&mut config, value)?;
    config.save_to(path)?;

    println!("Set {} = {}", config_key.name(), value);

    Ok(())
}

/// List all configuration settings.
fn run_list(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path).unwrap_or_default();

    println!("Configuration Settings");
    println!("======================");
    println!();

    let mut current_section = "";

    for key in ConfigKey::all() {
        let section = key.section();

        if section != current_section {
            if !current_section.is_empty() {
                println!();
            }
            println!("[{}]", section);
            current_section = section;
        }

        let value = key.get(&config);
        if value.is_empty() {
            println!("  {} = (not set)", key.key_name());
        } else {
            println!("  {} = {}", key.key_name(), value);
        }
    }

    if !config.sources.is_empty() {
        println!();
        println!("Sources: {}", config.sources.keys().cloned().collect::<Vec<_>>().join(", "));
    }

    Ok(())
}

/// Print the whole effective configuration, defaults included.
fn run_show(path: &Path) -> Result<(), CliError> {
    let config = ConfigFile::load_from(path)?;
    print!("{}", config.to_ini_string());
    Ok(())
}

/// Show the configuration file path.
fn run_path(path: &Path) -> Result<(), CliError> {
    println!("{}", path.display());
    Ok(())
}
