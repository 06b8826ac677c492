//! Configuration management for palcharity.
//!
//! Configuration is layered with figment: built-in defaults, then a TOML file,
//! then `PALCHARITY_`-prefixed environment variables.

use std::path::PathBuf;
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Default data directory name.
const DATA_DIR_NAME: &str = "palcharity";

/// Prefix for environment overrides.
const ENV_PREFIX: &str = "PALCHARITY_";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "ledger.db";

/// Image reference given to projects created without one.
pub const DEFAULT_PROJECT_IMAGE: &str = "default_project.jpg";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `PALCHARITY_`)
/// 2. TOML config file at `~/.config/palcharity/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Record store configuration.
    pub storage: StorageConfig,
    /// Donation and project rules.
    pub donations: DonationConfig,
}

/// Record store configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/palcharity/ledger.db`
    pub database_path: Option<PathBuf>,
    /// How long a writer waits on a locked database, in milliseconds.
    pub busy_timeout_ms: u64,
}

/// Donation and project rules.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DonationConfig {
    /// Largest single money donation accepted. 0 means unlimited.
    pub max_amount: u32,
    /// Image reference for projects created without one.
    pub default_image: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            busy_timeout_ms: 5_000,
        }
    }
}

impl Default for DonationConfig {
    fn default() -> Self {
        Self {
            max_amount: 0,
            default_image: DEFAULT_PROJECT_IMAGE.to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading or parsing fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        Self::load_with_env(config_path, ENV_PREFIX)
    }

    fn load_with_env(config_path: Option<PathBuf>, env_prefix: &str) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        // Tables in the file are config sections, not figment profiles.
        // Field names contain `_`, so env sections are separated by `__`.
        let figment = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed(env_prefix).split("__"));

        let config: Config = figment.extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(DATA_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(DATA_DIR_NAME)
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        if self.storage.busy_timeout_ms == 0 {
            return Err(Error::ConfigValidation {
                message: "busy_timeout_ms must be greater than 0".to_string(),
            });
        }

        if self.donations.default_image.trim().is_empty() {
            return Err(Error::ConfigValidation {
                message: "default_image cannot be blank".to_string(),
            });
        }

        Ok(())
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Get the busy timeout as a Duration.
    #[must_use]
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_millis(self.storage.busy_timeout_ms)
    }

    /// Upper bound for one money donation, if any.
    #[must_use]
    pub fn max_amount(&self) -> Option<u32> {
        match self.donations.max_amount {
            0 => None,
            n => Some(n),
        }
    }
}
