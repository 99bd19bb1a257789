//! Configuration loader for the Compass channel
//!
//! This module provides the `ConfigLoader` struct that handles loading
//! configuration from files and environment variables with proper precedence.

use std::path::{Path, PathBuf};

use config::{Config, Environment, File, FileFormat};

use crate::config::error::ConfigError;
use crate::config::settings::Settings;

/// Environment variable for the configuration directory
const CONFIG_DIR_ENV: &str = "COMPASS_CONFIG_DIR";

/// Environment variable for a specific configuration file
const CONFIG_FILE_ENV: &str = "COMPASS_CONFIG_FILE";

/// Default configuration directory
const DEFAULT_CONFIG_DIR: &str = "config";

/// Environment variable prefix for configuration overrides
const ENV_PREFIX: &str = "COMPASS";

/// Separator for nested configuration keys in environment variables
const ENV_SEPARATOR: &str = "__";

/// Configuration loader that handles layered configuration loading
///
/// Sources, in order of priority:
/// 1. `default.toml` - Base default configuration (optional)
/// 2. `local.toml` - Local development overrides (optional)
/// 3. `COMPASS_*` environment variables (highest priority)
///
/// With no file present at all, [`Settings::default`] values apply.
#[derive(Debug)]
pub struct ConfigLoader {
    /// Configuration directory path
    config_dir: PathBuf,
    /// Specific configuration file path (if set, skips layered loading)
    config_file: Option<PathBuf>,
}

impl ConfigLoader {
    /// Create a new configuration loader from the process environment
    ///
    /// # Errors
    ///
    /// Returns an error if both `COMPASS_CONFIG_DIR` and `COMPASS_CONFIG_FILE`
    /// are set, as they are mutually exclusive.
    pub fn new() -> Result<Self, ConfigError> {
        let config_dir = std::env::var(CONFIG_DIR_ENV)
            .map(PathBuf::from)
            .unwrap_or_else(|_| PathBuf::from(DEFAULT_CONFIG_DIR));

        let config_file = std::env::var(CONFIG_FILE_ENV).ok().map(PathBuf::from);

        if config_file.is_some() && std::env::var(CONFIG_DIR_ENV).is_ok() {
            return Err(ConfigError::mutual_exclusivity(
                "COMPASS_CONFIG_DIR and COMPASS_CONFIG_FILE cannot both be set. \
                 Use COMPASS_CONFIG_DIR for layered configuration or \
                 COMPASS_CONFIG_FILE for a single configuration file.",
            ));
        }

        Ok(Self {
            config_dir,
            config_file,
        })
    }

    /// Create a loader reading from a specific configuration directory
    pub fn from_dir(dir: impl AsRef<Path>) -> Self {
        Self {
            config_dir: dir.as_ref().to_path_buf(),
            config_file: None,
        }
    }

    /// Create a loader reading a single configuration file
    pub fn from_file(file: impl AsRef<Path>) -> Self {
        Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: Some(file.as_ref().to_path_buf()),
        }
    }

    /// Load and validate settings from all sources
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - `COMPASS_CONFIG_FILE` points at a missing file
    /// - Configuration parsing fails
    /// - Configuration validation fails
    pub fn load(&self) -> Result<Settings, ConfigError> {
        let config = self.build_config()?;
        let settings: Settings = config.try_deserialize().map_err(|e| {
            ConfigError::ParseError(format!("Failed to deserialize configuration: {e}"))
        })?;

        settings.validate()?;

        Ok(settings)
    }

    /// Build the config::Config instance from all sources
    fn build_config(&self) -> Result<Config, ConfigError> {
        let mut builder = Config::builder();

        if let Some(file) = &self.config_file {
            if !file.exists() {
                return Err(ConfigError::file_not_found(file.display().to_string()));
            }
            builder = builder.add_source(File::from(file.as_path()).format(FileFormat::Toml));
        } else {
            builder = builder
                .add_source(
                    File::from(self.config_dir.join("default.toml"))
                        .format(FileFormat::Toml)
                        .required(false),
                )
                .add_source(
                    File::from(self.config_dir.join("local.toml"))
                        .format(FileFormat::Toml)
                        .required(false),
                );
        }

        // Environment variables are always highest priority:
        // COMPASS_BOTS__MAIN__TOKEN -> bots.main.token
        builder = builder.add_source(
            Environment::with_prefix(ENV_PREFIX)
                .prefix_separator("_")
                .separator(ENV_SEPARATOR)
                .ignore_empty(true)
                .try_parsing(true),
        );

        builder.build().map_err(ConfigError::from)
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new().unwrap_or_else(|_| Self {
            config_dir: PathBuf::from(DEFAULT_CONFIG_DIR),
            config_file: None,
        })
    }
}
