//! Log records and severity levels.
//!
//! # Responsibilities
//! - Define the ordered severity levels used for routing
//! - Represent a single structured log record
//! - Render a record as exactly one line of text
//!
//! # Design Decisions
//! - Records are immutable once built; the sink only reads them
//! - Embedded newlines are escaped so one record is always one physical line
//! - Structured fields are rendered as a trailing JSON object

use chrono::{DateTime, Local, NaiveDateTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;

/// Timestamp layout at the start of every line.
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S%.3f";

/// Severity of a record, ordered by increasing urgency.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Debug,
    Info,
    Warn,
    Error,
    Fatal,
}

impl Level {
    /// Every level, least urgent first.
    pub const ALL: [Level; 5] = [
        Level::Debug,
        Level::Info,
        Level::Warn,
        Level::Error,
        Level::Fatal,
    ];

    /// Upper-case name as written into log lines.
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Debug => "DEBUG",
            Level::Info => "INFO",
            Level::Warn => "WARN",
            Level::Error => "ERROR",
            Level::Fatal => "FATAL",
        }
    }

    /// Lower-case name, used as the settings key and default file stem.
    pub fn key(&self) -> &'static str {
        match self {
            Level::Debug => "debug",
            Level::Info => "info",
            Level::Warn => "warn",
            Level::Error => "error",
            Level::Fatal => "fatal",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string names no known level.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown log level: {0}")]
pub struct ParseLevelError(pub String);

impl FromStr for Level {
    type Err = ParseLevelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "debug" => Ok(Level::Debug),
            "info" => Ok(Level::Info),
            "warn" | "warning" => Ok(Level::Warn),
            "error" => Ok(Level::Error),
            "fatal" => Ok(Level::Fatal),
            _ => Err(ParseLevelError(s.to_string())),
        }
    }
}

/// A structured log record handed to the sink.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogRecord {
    pub level: Level,
    pub timestamp: DateTime<Local>,
    pub message: String,
    #[serde(default)]
    pub fields: BTreeMap<String, serde_json::Value>,
}

impl LogRecord {
    /// Create a record stamped with the current local time.
    pub fn new(level: Level, message: impl Into<String>) -> Self {
        Self {
            level,
            timestamp: Local::now(),
            message: message.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Replace the timestamp.
    pub fn at(mut self, timestamp: DateTime<Local>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Attach a structured field.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<serde_json::Value>) -> Self {
        self.fields.insert(key.into(), value.into());
        self
    }

    /// Render the record as one newline-terminated line.
    pub fn to_line(&self) -> String {
        let mut line = format!(
            "{} [{}] {}",
            self.timestamp.format(TIMESTAMP_FORMAT),
            self.level,
            escape(&self.message)
        );
        if !self.fields.is_empty() {
            // serde_json escapes control characters, so this stays on one line.
            if let Ok(fields) = serde_json::to_string(&self.fields) {
                line.push(' ');
                line.push_str(&fields);
            }
        }
        line.push('\n');
        line
    }
}

/// Recover the timestamp a line was written with.
pub fn parse_line_timestamp(line: &str) -> Option<NaiveDateTime> {
    // "YYYY-MM-DD HH:MM:SS.mmm" is 23 bytes.
    let prefix = line.get(..23)?;
    NaiveDateTime::parse_from_str(prefix, TIMESTAMP_FORMAT).ok()
}

fn escape(message: &str) -> String {
    if !message.contains(['\n', '\r']) {
        return message.to_string();
    }
    message.replace('\r', "\\r").replace('\n', "\\n")
}
