//! Shared utilities for integration and load testing.

use std::fs::{self, OpenOptions};
use std::path::Path;

use chrono::{Local, NaiveDate, NaiveDateTime, TimeZone};
use file_log_sink::{Level, LogRecord};

/// Local wall-clock time from its parts.
#[allow(dead_code)]
pub fn at(y: i32, m: u32, d: u32, h: u32, min: u32, s: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(y, m, d)
        .unwrap()
        .and_hms_opt(h, min, s)
        .unwrap()
}

/// A record stamped with `when`.
#[allow(dead_code)]
pub fn record_at(level: Level, message: &str, when: NaiveDateTime) -> LogRecord {
    LogRecord::new(level, message).at(Local.from_local_datetime(&when).unwrap())
}

/// Lines of a file, or nothing if it does not exist.
pub fn read_lines(path: &Path) -> Vec<String> {
    fs::read_to_string(path)
        .map(|s| s.lines().map(str::to_string).collect())
        .unwrap_or_default()
}

/// File names in `dir`, sorted.
#[allow(dead_code)]
pub fn file_names(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = fs::read_dir(dir)
        .unwrap()
        .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
        .collect();
    names.sort();
    names
}

/// Mark `path` as last modified at local time `when`.
#[allow(dead_code)]
pub fn set_modified(path: &Path, when: NaiveDateTime) {
    let when = Local.from_local_datetime(&when).unwrap();
    OpenOptions::new()
        .write(true)
        .open(path)
        .unwrap()
        .set_modified(when.into())
        .unwrap();
}
