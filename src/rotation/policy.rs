//! Rotation decisions and file naming.
//!
//! Everything here is pure: the writer passes in its counters, the clock
//! reading and a way to test whether a path exists.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::ffi::OsString;
use std::fmt;
use std::path::{Path, PathBuf};

/// Default size cap: 100 MiB.
pub const DEFAULT_MAX_SIZE: u64 = 100 * 1024 * 1024;

/// Default line cap.
pub const DEFAULT_MAX_LINES: u64 = 1_000_000;

/// Calendar period that starts a new file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SliceUnit {
    None,
    #[default]
    Day,
    Month,
    Year,
}

impl SliceUnit {
    /// Interpret a `slice` setting; anything unrecognised disables slicing.
    pub fn from_setting(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "day" => SliceUnit::Day,
            "month" => SliceUnit::Month,
            "year" => SliceUnit::Year,
            _ => SliceUnit::None,
        }
    }

    /// Key identifying the period containing `now`, if slicing is enabled.
    pub fn key(&self, now: NaiveDateTime) -> Option<String> {
        let pattern = match self {
            SliceUnit::None => return None,
            SliceUnit::Day => "%Y-%m-%d",
            SliceUnit::Month => "%Y-%m",
            SliceUnit::Year => "%Y",
        };
        Some(now.format(pattern).to_string())
    }
}

/// Thresholds that govern when a writer moves to a fresh file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RotationConfig {
    pub max_size_bytes: u64,
    pub max_lines: u64,
    pub slice: SliceUnit,
}

impl Default for RotationConfig {
    fn default() -> Self {
        Self {
            max_size_bytes: DEFAULT_MAX_SIZE,
            max_lines: DEFAULT_MAX_LINES,
            slice: SliceUnit::Day,
        }
    }
}

/// Counters describing the currently open file.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RotationState {
    pub bytes_written: u64,
    pub lines_written: u64,
    /// `None` until the first write establishes a slice.
    pub current_slice_key: Option<String>,
}

impl RotationState {
    pub fn is_empty(&self) -> bool {
        self.bytes_written == 0 && self.lines_written == 0
    }
}

/// Which threshold forced a rotation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RotationReason {
    Size,
    Lines,
    Slice,
}

impl RotationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RotationReason::Size => "size",
            RotationReason::Lines => "lines",
            RotationReason::Slice => "slice",
        }
    }
}

impl fmt::Display for RotationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Decide whether writing `record_len` more bytes requires a new file first.
///
/// The triggers are OR-combined; when several fire at once the slice change
/// is reported, since it also determines the next file's name. Size and line
/// caps never fire on an empty file.
pub fn rotation_reason(
    state: &RotationState,
    config: &RotationConfig,
    record_len: u64,
    now: NaiveDateTime,
) -> Option<RotationReason> {
    if let (Some(current), Some(key)) = (&state.current_slice_key, config.slice.key(now)) {
        if *current != key {
            return Some(RotationReason::Slice);
        }
    }

    if state.is_empty() {
        return None;
    }

    if state.bytes_written.saturating_add(record_len) > config.max_size_bytes {
        return Some(RotationReason::Size);
    }

    if state.lines_written.saturating_add(1) > config.max_lines {
        return Some(RotationReason::Lines);
    }

    None
}

/// Boolean form of [`rotation_reason`].
pub fn should_rotate(
    state: &RotationState,
    config: &RotationConfig,
    record_len: u64,
    now: NaiveDateTime,
) -> bool {
    rotation_reason(state, config, record_len, now).is_some()
}

/// Name for the file that replaces the active one.
///
/// Date-sliced writers get `base.<key>`, falling back to `base.<key>.<n>` when
/// that name is taken; unsliced writers get `base.<n>`. `n` is the smallest
/// positive integer that names a file which does not exist yet.
pub fn next_file_name(
    base: &Path,
    slice: SliceUnit,
    now: NaiveDateTime,
    exists: impl Fn(&Path) -> bool,
) -> PathBuf {
    suffixed_name(base, slice.key(now).as_deref(), exists)
}

/// Name under which a finished base file is kept, labelled with its own slice.
pub fn archive_name(base: &Path, slice_key: &str, exists: impl Fn(&Path) -> bool) -> PathBuf {
    suffixed_name(base, Some(slice_key), exists)
}

/// The most recent successor of `base` for the period containing `now`.
///
/// This is the last name in the sequence [`next_file_name`] hands out:
/// `base.<key>`, `base.<key>.1`, ... when sliced, `base.1`, `base.2`, ... when
/// not. `None` when no successor exists yet, in which case `base` is current.
pub fn latest_file_name(
    base: &Path,
    slice: SliceUnit,
    now: NaiveDateTime,
    exists: impl Fn(&Path) -> bool,
) -> Option<PathBuf> {
    let (stem, mut latest) = match slice.key(now) {
        Some(key) => {
            let keyed = with_suffix(base.as_os_str().to_owned(), &key);
            if !exists(&keyed) {
                return None;
            }
            (keyed.clone().into_os_string(), Some(keyed))
        }
        None => (base.as_os_str().to_owned(), None),
    };

    let mut n: u64 = 1;
    loop {
        let candidate = with_suffix(stem.clone(), &n.to_string());
        if !exists(&candidate) {
            return latest;
        }
        latest = Some(candidate);
        n += 1;
    }
}

fn suffixed_name(base: &Path, key: Option<&str>, exists: impl Fn(&Path) -> bool) -> PathBuf {
    let stem = match key {
        Some(key) => {
            let candidate = with_suffix(base.as_os_str().to_owned(), key);
            if !exists(&candidate) {
                return candidate;
            }
            candidate.into_os_string()
        }
        None => base.as_os_str().to_owned(),
    };

    let mut n: u64 = 1;
    loop {
        let candidate = with_suffix(stem.clone(), &n.to_string());
        if !exists(&candidate) {
            return candidate;
        }
        n += 1;
    }
}

fn with_suffix(mut name: OsString, suffix: &str) -> PathBuf {
    name.push(".");
    name.push(suffix);
    PathBuf::from(name)
}
