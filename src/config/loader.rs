//! Configuration loading from disk.

use std::fs;
use std::path::Path;
use thiserror::Error;

use crate::config::schema::{SinkConfig, SinkSettings};
use crate::config::validation::resolve;

/// Error type for configuration loading and validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("invalid size {0:?}")]
    InvalidSize(String),

    #[error("invalid value for {key}: expected {expected}")]
    InvalidValue { key: String, expected: &'static str },

    #[error("unknown log driver: {0}")]
    UnknownDriver(String),
}

/// Load raw sink settings from a TOML file.
pub fn load_settings(path: &Path) -> Result<SinkSettings, ConfigError> {
    let content = fs::read_to_string(path)?;
    let settings: SinkSettings = toml::from_str(&content)?;
    Ok(settings)
}

/// Load and validate a sink configuration from a TOML file.
pub fn load_config(path: &Path, default_store: &Path) -> Result<SinkConfig, ConfigError> {
    let settings = load_settings(path)?;
    resolve(&settings, default_store)
}
