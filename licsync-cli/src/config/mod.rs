//! Application configuration
//!
//! Loaded from `~/.config/licsync/config.toml` when present; every setting
//! has a default so a missing file just means defaults. `LICSYNC_DB`
//! overrides the database path for ad-hoc runs and tests.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::import::SchemaConfig;

fn default_batch_size() -> usize {
    500
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Path to the SQLite licensee database
    #[serde(default)]
    pub database_path: Option<PathBuf>,
    /// Records per transaction during imports
    #[serde(default = "default_batch_size")]
    pub batch_size: usize,
    /// Column aliases and license-number normalization
    #[serde(default)]
    pub schema: SchemaConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            database_path: None,
            batch_size: default_batch_size(),
            schema: SchemaConfig::default(),
        }
    }
}

fn config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("licsync")
}

impl Config {
    /// Load the config file if it exists, falling back to defaults
    pub fn load() -> Result<Self> {
        let path = config_dir().join("config.toml");
        Self::load_from(&path)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No config at {}, using defaults", path.display());
            return Ok(Config::default());
        }

        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let config: Config = toml::from_str(&contents)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        log::debug!("Loaded config from {}", path.display());
        Ok(config)
    }

    /// Resolve the database path: `LICSYNC_DB` env var, then the config
    /// file, then the default under the user config directory.
    pub fn database_path(&self) -> PathBuf {
        if let Ok(path) = std::env::var("LICSYNC_DB") {
            return PathBuf::from(path);
        }
        self.database_path
            .clone()
            .unwrap_or_else(|| config_dir().join("licensees.db"))
    }
}
