//! Configuration loading from warden.toml.

use policy::PolicyConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Deserialize, Default)]
pub struct Config {
    /// Process-wide policy settings.
    #[serde(default)]
    pub policy: PolicyConfig,

    /// Object store configuration.
    #[serde(default)]
    pub storage: StorageConfig,
}

/// Object store configuration.
#[derive(Debug, Deserialize, Default)]
pub struct StorageConfig {
    /// Database path. Defaults to `objects.db` in the data directory.
    pub path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Load configuration if the file exists, otherwise use defaults.
    pub fn load_or_default(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Parse configuration from TOML string.
    pub fn parse(toml: &str) -> Result<Self, ConfigError> {
        toml::from_str(toml).map_err(|e| ConfigError::Parse(e.to_string()))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("failed to parse config: {0}")]
    Parse(String),
}
