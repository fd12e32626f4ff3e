//! Configuration management for stowage
//!
//! Configuration is loaded from multiple sources with clear precedence:
//!
//! 1. Environment variables (highest priority, `STOWAGE_` prefix, `__` for nesting)
//! 2. `./stowage.toml` (development)
//! 3. `~/.config/stowage/config.toml` (user config, XDG)
//! 4. `/etc/stowage/config.toml` (system config)
//! 5. Hardcoded defaults (fallback)
//!
//! # Example Configuration
//!
//! ```toml
//! # stowage.toml
//! [storage]
//! root = "/var/lib/stowage/files"
//! url_prefix = "https://cdn.example.com/files"
//!
//! [naming]
//! max_len = 60
//! policy = "suffix"
//!
//! [thumbnails]
//! max_width = 300
//! extensions = ["jpg", "jpeg", "png", "gif"]
//!
//! [database]
//! url = "sqlite:///var/lib/stowage/stowage.db"
//! ```
//!
//! # Usage
//!
//! ```rust,no_run
//! use stowage::config::StowageConfig;
//!
//! # fn example() -> anyhow::Result<()> {
//! let config = StowageConfig::load()?;
//!
//! let root = &config.storage.root;
//! let width = config.thumbnails.max_width;
//! # Ok(())
//! # }
//! ```

use crate::naming::{NamingPolicy, DEFAULT_MAX_LEN, DEFAULT_MAX_SUFFIX};
use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub use crate::thumbnail::ThumbnailConfig;

/// Environment variable prefix
pub const ENV_PREFIX: &str = "STOWAGE_";

/// Blob backend settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    /// Root directory of the local blob backend
    pub root: PathBuf,

    /// Public URL prefix blobs are served under
    pub url_prefix: String,
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            root: PathBuf::from("./storage"),
            url_prefix: "/storage".to_string(),
        }
    }
}

/// Name sanitizing and collision settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct NamingSettings {
    /// Maximum sanitized name length, extension included
    pub max_len: usize,

    /// Collision handling
    pub policy: NamingPolicy,

    /// Highest numeric suffix tried before giving up
    pub max_suffix: u32,
}

impl Default for NamingSettings {
    fn default() -> Self {
        Self {
            max_len: DEFAULT_MAX_LEN,
            policy: NamingPolicy::Suffix,
            max_suffix: DEFAULT_MAX_SUFFIX,
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// SQLite connection URL
    pub url: String,

    /// Identifier candidates tried before giving up
    pub identifier_attempts: u32,
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            url: "sqlite://./stowage.db".to_string(),
            identifier_attempts: crate::identifier::DEFAULT_MAX_ATTEMPTS,
        }
    }
}

/// Complete stowage configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct StowageConfig {
    /// Blob backend settings
    #[serde(default)]
    pub storage: StorageSettings,

    /// Naming settings
    #[serde(default)]
    pub naming: NamingSettings,

    /// Thumbnail settings
    #[serde(default)]
    pub thumbnails: ThumbnailConfig,

    /// Record store settings
    #[serde(default)]
    pub database: DatabaseSettings,
}

impl StowageConfig {
    /// Load configuration from the standard locations
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - Default configuration cannot be serialized to TOML
    /// - A configuration file cannot be read or parsed
    /// - Configuration values fail type conversion
    pub fn load() -> anyhow::Result<Self> {
        let mut figment = Figment::new()
            // 5. Defaults (lowest priority)
            .merge(Toml::string(&toml::to_string(&Self::default())?));

        // 4. System config
        let system_config = PathBuf::from("/etc/stowage/config.toml");
        if system_config.exists() {
            figment = figment.merge(Toml::file(&system_config));
        }

        // 3. User config
        let user_config = Self::recommended_path();
        if user_config.exists() {
            figment = figment.merge(Toml::file(&user_config));
        }

        // 2. Local config
        let local_config = PathBuf::from("./stowage.toml");
        if local_config.exists() {
            figment = figment.merge(Toml::file(&local_config));
        }

        // 1. Environment variables
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true));

        let config = figment.extract()?;
        Ok(config)
    }

    /// Load configuration from a specific file, with environment overrides
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the file contains invalid TOML or values fail
    /// type conversion
    pub fn load_from(path: &str) -> anyhow::Result<Self> {
        let config = Figment::new()
            .merge(Toml::string(&toml::to_string(&Self::default())?))
            .merge(Toml::file(path))
            .merge(Env::prefixed(ENV_PREFIX).split("__").lowercase(true))
            .extract()?;

        Ok(config)
    }

    /// Per-user config path (`~/.config/stowage/config.toml` on Linux)
    #[must_use]
    pub fn recommended_path() -> PathBuf {
        dirs::config_dir().map_or_else(
            || PathBuf::from("./stowage.toml"),
            |config_dir| config_dir.join("stowage").join("config.toml"),
        )
    }
}
