//! Configuration schema definitions.
//!
//! `SinkSettings` is the loosely-typed map handed over by whoever hosts the
//! sink: keys are matched case-insensitively and a key may hold a boolean, an
//! integer or a string. `SinkConfig` is the validated, typed form the sink
//! runs on; see `validation.rs` for the mapping between the two.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::record::Level;
use crate::rotation::RotationConfig;

/// Store directory used when none is configured.
pub const DEFAULT_STORE: &str = "store/logs";

/// File name of the aggregate file inside the store.
pub const DEFAULT_OUTPUT_FILE: &str = "output.log";

/// One loosely-typed setting value.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(untagged)]
pub enum SettingValue {
    Bool(bool),
    Int(i64),
    Text(String),
}

impl From<bool> for SettingValue {
    fn from(value: bool) -> Self {
        SettingValue::Bool(value)
    }
}

impl From<i64> for SettingValue {
    fn from(value: i64) -> Self {
        SettingValue::Int(value)
    }
}

impl From<i32> for SettingValue {
    fn from(value: i32) -> Self {
        SettingValue::Int(value.into())
    }
}

impl From<&str> for SettingValue {
    fn from(value: &str) -> Self {
        SettingValue::Text(value.to_string())
    }
}

impl From<String> for SettingValue {
    fn from(value: String) -> Self {
        SettingValue::Text(value)
    }
}

/// Raw sink settings as supplied by the host.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(transparent)]
pub struct SinkSettings {
    entries: BTreeMap<String, SettingValue>,
}

impl SinkSettings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add or replace a setting.
    pub fn set(mut self, key: impl Into<String>, value: impl Into<SettingValue>) -> Self {
        let key = key.into();
        self.entries.retain(|k, _| !k.eq_ignore_ascii_case(&key));
        self.entries.insert(key, value.into());
        self
    }

    /// Look a setting up, ignoring ASCII case.
    pub fn get(&self, key: &str) -> Option<&SettingValue> {
        self.entries
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(_, v)| v)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.get(key).is_some()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Validated configuration for one sink.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct SinkConfig {
    /// Base directory for default file paths.
    pub store: PathBuf,

    /// Aggregate file receiving every record, if any.
    pub output: Option<PathBuf>,

    /// Per-level files. Levels without an entry have no file.
    pub level_files: BTreeMap<Level, PathBuf>,

    /// Thresholds shared by every writer of the sink.
    pub rotation: RotationConfig,
}

impl Default for SinkConfig {
    fn default() -> Self {
        Self {
            store: PathBuf::from(DEFAULT_STORE),
            output: None,
            level_files: BTreeMap::new(),
            rotation: RotationConfig::default(),
        }
    }
}

impl SinkConfig {
    /// Empty configuration rooted at `store`.
    pub fn new(store: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            ..Self::default()
        }
    }

    /// Default path for a level's file: `<store>/<level>.log`.
    pub fn default_level_path(&self, level: Level) -> PathBuf {
        default_level_path(&self.store, level)
    }

    /// Route `level` to its default file.
    pub fn with_level(mut self, level: Level) -> Self {
        let path = self.default_level_path(level);
        self.level_files.insert(level, path);
        self
    }

    /// Route `level` to `path`.
    pub fn with_level_file(mut self, level: Level, path: impl Into<PathBuf>) -> Self {
        self.level_files.insert(level, path.into());
        self
    }

    /// Enable the aggregate file at its default path.
    pub fn with_output(mut self) -> Self {
        self.output = Some(self.store.join(DEFAULT_OUTPUT_FILE));
        self
    }

    pub fn with_output_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.output = Some(path.into());
        self
    }

    pub fn with_rotation(mut self, rotation: RotationConfig) -> Self {
        self.rotation = rotation;
        self
    }

    /// True when at least one destination is configured.
    pub fn has_destinations(&self) -> bool {
        self.output.is_some() || !self.level_files.is_empty()
    }
}

pub(crate) fn default_level_path(store: &Path, level: Level) -> PathBuf {
    store.join(format!("{}.log", level.key()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_settings_case_insensitive() {
        let settings = SinkSettings::new().set("MaxLine", 10).set("maxline", 20);
        assert_eq!(settings.get("MAXLINE"), Some(&SettingValue::Int(20)));
        assert!(settings.contains("maxline"));
        assert!(!settings.contains("output"));
    }

    #[test]
    fn test_settings_from_toml() {
        let settings: SinkSettings = toml::from_str(
            r#"
            store = "/var/log/app"
            error = true
            output = "all.log"
            maxsize = "10MB"
            maxline = 500
            "#,
        )
        .unwrap();

        assert_eq!(settings.get("store"), Some(&SettingValue::Text("/var/log/app".into())));
        assert_eq!(settings.get("error"), Some(&SettingValue::Bool(true)));
        assert_eq!(settings.get("maxline"), Some(&SettingValue::Int(500)));
    }

    #[test]
    fn test_config_builders() {
        let config = SinkConfig::new("/tmp/x")
            .with_level(Level::Error)
            .with_level_file(Level::Warn, "/elsewhere/w.log")
            .with_output();

        assert_eq!(config.level_files[&Level::Error], PathBuf::from("/tmp/x/error.log"));
        assert_eq!(config.level_files[&Level::Warn], PathBuf::from("/elsewhere/w.log"));
        assert_eq!(config.output, Some(PathBuf::from("/tmp/x/output.log")));
        assert!(config.has_destinations());
        assert!(!SinkConfig::default().has_destinations());
    }
}
