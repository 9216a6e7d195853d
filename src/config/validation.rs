//! Settings resolution and validation.
//!
//! # Responsibilities
//! - Turn loosely-typed `SinkSettings` into a typed `SinkConfig`
//! - Parse size strings with unit suffixes
//! - Reject values of the wrong type or out of range
//!
//! # Design Decisions
//! - Resolution is a pure function of the settings and the driver's default store
//! - A boolean `true` selects the default path, a string names the path
//! - Settings that name no destination at all route every level to its default file

use std::path::{Path, PathBuf};

use crate::config::loader::ConfigError;
use crate::config::schema::{
    default_level_path, SettingValue, SinkConfig, SinkSettings, DEFAULT_OUTPUT_FILE,
};
use crate::record::Level;
use crate::rotation::{RotationConfig, SliceUnit};

/// Resolve raw settings into a validated configuration.
pub fn resolve(settings: &SinkSettings, default_store: &Path) -> Result<SinkConfig, ConfigError> {
    let store = match settings.get("store") {
        Some(SettingValue::Text(s)) if !s.trim().is_empty() => PathBuf::from(s),
        Some(SettingValue::Text(_)) | None => default_store.to_path_buf(),
        Some(_) => return Err(invalid("store", "a directory path")),
    };

    let mut config = SinkConfig::new(store);
    let mut destination_named = false;

    for level in Level::ALL {
        let Some((key, value)) = level_setting(settings, level) else {
            continue;
        };
        destination_named = true;
        if let Some(path) = destination(key, value, || default_level_path(&config.store, level))? {
            config.level_files.insert(level, path);
        }
    }

    if let Some(value) = settings.get("output") {
        destination_named = true;
        let store = config.store.clone();
        config.output = destination("output", value, || store.join(DEFAULT_OUTPUT_FILE))?;
    }

    if !destination_named {
        for level in Level::ALL {
            let path = config.default_level_path(level);
            config.level_files.insert(level, path);
        }
    }

    config.rotation = rotation(settings)?;
    Ok(config)
}

fn level_setting(settings: &SinkSettings, level: Level) -> Option<(&'static str, &SettingValue)> {
    let aliases: &[&'static str] = match level {
        Level::Warn => &["warn", "warning"],
        _ => &[],
    };
    std::iter::once(level.key())
        .chain(aliases.iter().copied())
        .find_map(|key| settings.get(key).map(|value| (key, value)))
}

fn destination(
    key: &str,
    value: &SettingValue,
    default_path: impl FnOnce() -> PathBuf,
) -> Result<Option<PathBuf>, ConfigError> {
    match value {
        SettingValue::Text(s) if !s.trim().is_empty() => Ok(Some(PathBuf::from(s))),
        SettingValue::Text(_) | SettingValue::Bool(true) => Ok(Some(default_path())),
        SettingValue::Bool(false) => Ok(None),
        SettingValue::Int(_) => Err(invalid(key, "a boolean or a file path")),
    }
}

fn rotation(settings: &SinkSettings) -> Result<RotationConfig, ConfigError> {
    let mut rotation = RotationConfig::default();

    if let Some((key, value)) = first_of(settings, &["maxsize", "weight"]) {
        rotation.max_size_bytes = match value {
            SettingValue::Text(s) => parse_size(s)?,
            SettingValue::Int(n) if *n > 0 => *n as u64,
            _ => return Err(invalid(key, "a positive byte count or a size such as \"100MB\"")),
        };
    }

    if let Some((key, value)) = first_of(settings, &["maxline", "height"]) {
        rotation.max_lines = match value {
            SettingValue::Int(n) if *n > 0 => *n as u64,
            SettingValue::Text(s) => match s.trim().parse::<u64>() {
                Ok(n) if n > 0 => n,
                _ => return Err(invalid(key, "a positive line count")),
            },
            _ => return Err(invalid(key, "a positive line count")),
        };
    }

    if let Some(value) = settings.get("slice") {
        rotation.slice = match value {
            SettingValue::Text(s) => SliceUnit::from_setting(s),
            SettingValue::Bool(false) => SliceUnit::None,
            _ => return Err(invalid("slice", "one of \"day\", \"month\", \"year\"")),
        };
    }

    Ok(rotation)
}

fn first_of<'a>(
    settings: &'a SinkSettings,
    keys: &[&'static str],
) -> Option<(&'static str, &'a SettingValue)> {
    keys.iter()
        .find_map(|key| settings.get(key).map(|value| (*key, value)))
}

fn invalid(key: &str, expected: &'static str) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.to_string(),
        expected,
    }
}

/// Parse a size such as `"512"`, `"64KB"`, `"1.5 MB"` or `"2g"` into bytes.
///
/// Units are 1024-based and case-insensitive.
pub fn parse_size(value: &str) -> Result<u64, ConfigError> {
    let err = || ConfigError::InvalidSize(value.to_string());

    let s = value.trim();
    let split = s
        .find(|c: char| !(c.is_ascii_digit() || c == '.'))
        .unwrap_or(s.len());
    let (number, unit) = s.split_at(split);
    let number: f64 = number.parse().map_err(|_| err())?;

    let multiplier: u64 = match unit.trim().to_ascii_uppercase().as_str() {
        "" | "B" => 1,
        "K" | "KB" | "KIB" => 1 << 10,
        "M" | "MB" | "MIB" => 1 << 20,
        "G" | "GB" | "GIB" => 1 << 30,
        "T" | "TB" | "TIB" => 1 << 40,
        _ => return Err(err()),
    };

    let bytes = (number * multiplier as f64).round();
    if !bytes.is_finite() || bytes < 1.0 || bytes > u64::MAX as f64 {
        return Err(err());
    }
    Ok(bytes as u64)
}
