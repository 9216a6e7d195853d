//! Rotation-aware append-only writer for one log destination.
//!
//! # Responsibilities
//! - Own the single open handle for a destination
//! - Track bytes and lines of the active file, including what a previous run left
//! - Rotate to a fresh file before a write that would break a threshold
//!
//! # Design Decisions
//! - One mutex guards the check, the rotation and the append, so concurrent
//!   callers never interleave partial lines or corrupt the counters
//! - Each record goes to the file with one unbuffered `write_all`; a failed
//!   write leaves nothing behind to surface with a later record
//! - A failed rotation leaves the writer unusable until `init()` is called again

use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, Read, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Local, NaiveDateTime};

use crate::error::{SinkError, SinkResult};
use crate::observability::metrics;
use crate::record::{parse_line_timestamp, LogRecord};
use crate::rotation::policy::{self, RotationReason};
use crate::rotation::{Clock, RotationConfig, RotationState};

/// Lifecycle of a writer's handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriterStatus {
    /// Constructed, not opened yet. The first write opens it.
    Pending,
    Open,
    /// A rotation could not open the next file.
    Failed,
    Closed,
}

struct Inner {
    status: WriterStatus,
    handle: Option<File>,
    active_path: PathBuf,
    counters: RotationState,
}

/// Append-only writer for one logical destination.
pub struct FileWriter {
    base_path: PathBuf,
    label: String,
    rotation: RotationConfig,
    clock: Arc<dyn Clock>,
    inner: Mutex<Inner>,
}

impl FileWriter {
    /// Create a writer for `base_path`. Nothing touches the disk until
    /// [`init`](Self::init) or the first write.
    pub fn new(base_path: impl Into<PathBuf>, rotation: RotationConfig, clock: Arc<dyn Clock>) -> Self {
        let base_path = base_path.into();
        Self {
            label: base_path.display().to_string(),
            inner: Mutex::new(Inner {
                status: WriterStatus::Pending,
                handle: None,
                active_path: base_path.clone(),
                counters: RotationState::default(),
            }),
            base_path,
            rotation,
            clock,
        }
    }

    pub fn base_path(&self) -> &Path {
        &self.base_path
    }

    pub fn rotation(&self) -> &RotationConfig {
        &self.rotation
    }

    /// Path of the file currently receiving writes.
    pub fn active_path(&self) -> PathBuf {
        self.lock().active_path.clone()
    }

    /// Snapshot of the active file's counters.
    pub fn counters(&self) -> RotationState {
        self.lock().counters.clone()
    }

    pub fn status(&self) -> WriterStatus {
        self.lock().status
    }

    /// Open the current file, creating parent directories as needed.
    ///
    /// The current file is the newest successor rotation produced for the
    /// present period (`base.<key>[.n]`, or `base.<n>` when unsliced), and the
    /// base file when there is none. Counters are initialised from what is
    /// already on disk so thresholds carry over from a previous run. Calling
    /// this again reopens, which is how a writer recovers from a failed
    /// rotation.
    pub fn init(&self) -> SinkResult<()> {
        let mut inner = self.lock();
        if let Some(handle) = inner.handle.take() {
            metrics::writer_closed();
            if let Err(e) = handle.sync_data() {
                tracing::warn!(path = %inner.active_path.display(), error = %e, "Sync before reopen failed");
            }
        }
        self.open_current(&mut inner)
    }

    /// Append one record, rotating first if a threshold requires it.
    pub fn write(&self, record: &LogRecord) -> SinkResult<()> {
        let line = record.to_line();
        let mut inner = self.lock();
        match self.append(&mut inner, line.as_bytes()) {
            Ok(()) => {
                metrics::record_write(&self.label, line.len());
                Ok(())
            }
            Err(e) => {
                metrics::record_write_error(&self.label);
                Err(e)
            }
        }
    }

    /// Sync written data to disk without closing.
    pub fn flush(&self) -> SinkResult<()> {
        let inner = self.lock();
        if let Some(handle) = &inner.handle {
            handle.sync_data().map_err(|source| SinkError::Write {
                path: inner.active_path.clone(),
                source,
            })?;
        }
        Ok(())
    }

    /// Sync and close the handle. Closing twice is a no-op.
    pub fn close(&self) -> SinkResult<()> {
        let mut inner = self.lock();
        if inner.status == WriterStatus::Closed {
            return Ok(());
        }
        inner.status = WriterStatus::Closed;

        let Some(handle) = inner.handle.take() else {
            return Ok(());
        };
        metrics::writer_closed();
        tracing::debug!(path = %inner.active_path.display(), "Closing log file");
        handle.sync_data().map_err(|source| SinkError::Write {
            path: inner.active_path.clone(),
            source,
        })
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn append(&self, inner: &mut Inner, line: &[u8]) -> SinkResult<()> {
        match inner.status {
            WriterStatus::Closed => {
                return Err(SinkError::Closed {
                    path: self.base_path.clone(),
                })
            }
            WriterStatus::Failed => {
                return Err(SinkError::Unavailable {
                    path: inner.active_path.clone(),
                })
            }
            WriterStatus::Pending => self.open_current(inner)?,
            WriterStatus::Open => {}
        }

        let now = self.clock.now();
        if inner.counters.current_slice_key.is_none() {
            inner.counters.current_slice_key = self.rotation.slice.key(now);
        }

        if let Some(reason) =
            policy::rotation_reason(&inner.counters, &self.rotation, line.len() as u64, now)
        {
            self.rotate(inner, reason, now)?;
        }

        let Inner {
            handle,
            active_path,
            counters,
            ..
        } = &mut *inner;
        let Some(handle) = handle.as_mut() else {
            return Err(SinkError::Unavailable {
                path: active_path.clone(),
            });
        };
        if let Err(source) = handle.write_all(line) {
            discard_partial(handle, active_path, counters);
            return Err(SinkError::Write {
                path: active_path.clone(),
                source,
            });
        }

        counters.bytes_written += line.len() as u64;
        counters.lines_written += 1;
        Ok(())
    }

    /// Pick the current file for this period and open it.
    fn open_current(&self, inner: &mut Inner) -> SinkResult<()> {
        let now = self.clock.now();
        match policy::latest_file_name(&self.base_path, self.rotation.slice, now, |p| p.exists()) {
            Some(latest) => {
                inner.active_path = latest;
                // A successor's name carries its period.
                self.open_active(inner, self.rotation.slice.key(now))
            }
            None => {
                inner.active_path = self.base_path.clone();
                self.open_active(inner, None)
            }
        }
    }

    fn open_active(&self, inner: &mut Inner, known_key: Option<String>) -> SinkResult<()> {
        let path = inner.active_path.clone();
        create_parent(&path).map_err(|(dir, source)| SinkError::Configuration { path: dir, source })?;

        let open_error = |source| SinkError::Open {
            path: path.clone(),
            source,
        };
        let file = open_append(&path).map_err(open_error)?;
        let metadata = file.metadata().map_err(open_error)?;
        let bytes = metadata.len();
        let (lines, first_stamp) = inspect(&path).map_err(open_error)?;

        // An empty file has no slice yet; the first write establishes it.
        // Otherwise the key is the period of the last write, which the
        // modification time records.
        let current_slice_key = if bytes == 0 {
            None
        } else {
            known_key.or_else(|| {
                let last_write = metadata
                    .modified()
                    .ok()
                    .map(|t| DateTime::<Local>::from(t).naive_local())
                    .or(first_stamp)
                    .unwrap_or_else(|| self.clock.now());
                self.rotation.slice.key(last_write)
            })
        };

        inner.handle = Some(file);
        inner.counters = RotationState {
            bytes_written: bytes,
            lines_written: lines,
            current_slice_key,
        };
        inner.status = WriterStatus::Open;
        metrics::writer_opened();

        tracing::debug!(
            path = %path.display(),
            bytes,
            lines,
            slice = ?inner.counters.current_slice_key,
            "Opened log file"
        );
        Ok(())
    }

    fn rotate(&self, inner: &mut Inner, reason: RotationReason, now: NaiveDateTime) -> SinkResult<()> {
        let previous = inner.active_path.clone();

        if let Some(handle) = inner.handle.take() {
            metrics::writer_closed();
            if let Err(e) = handle.sync_data() {
                tracing::warn!(path = %previous.display(), error = %e, "Sync before rotation failed");
            }
        }

        // A finished base file is labelled with the period it covers.
        if reason == RotationReason::Slice && previous == self.base_path && !inner.counters.is_empty() {
            if let Some(old_key) = inner.counters.current_slice_key.as_deref() {
                let archived = policy::archive_name(&self.base_path, old_key, |p| p.exists());
                match fs::rename(&previous, &archived) {
                    Ok(()) => tracing::debug!(
                        from = %previous.display(),
                        to = %archived.display(),
                        "Archived finished slice"
                    ),
                    Err(e) => tracing::warn!(
                        path = %previous.display(),
                        error = %e,
                        "Could not label finished slice, leaving it in place"
                    ),
                }
            }
        }

        let next = policy::next_file_name(&self.base_path, self.rotation.slice, now, |p| p.exists());
        let opened = create_parent(&next)
            .map_err(|(_, source)| source)
            .and_then(|()| open_append(&next));
        let file = match opened {
            Ok(file) => file,
            Err(source) => {
                inner.status = WriterStatus::Failed;
                tracing::error!(
                    path = %next.display(),
                    error = %source,
                    "Rotation failed, destination unavailable"
                );
                return Err(SinkError::Rotation { path: next, source });
            }
        };

        inner.handle = Some(file);
        inner.counters = RotationState {
            bytes_written: 0,
            lines_written: 0,
            current_slice_key: self.rotation.slice.key(now),
        };
        inner.active_path = next;
        metrics::writer_opened();
        metrics::record_rotation(reason.as_str());

        tracing::info!(
            reason = %reason,
            from = %previous.display(),
            to = %inner.active_path.display(),
            "Rotated log file"
        );
        Ok(())
    }
}

fn open_append(path: &Path) -> io::Result<File> {
    OpenOptions::new().create(true).append(true).open(path)
}

fn create_parent(path: &Path) -> Result<(), (PathBuf, io::Error)> {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => {
            fs::create_dir_all(dir).map_err(|e| (dir.to_path_buf(), e))
        }
        _ => Ok(()),
    }
}

/// Cut off whatever part of a failed line reached the file.
fn discard_partial(file: &File, path: &Path, counters: &mut RotationState) {
    let len = match file.metadata() {
        Ok(metadata) => metadata.len(),
        Err(e) => {
            tracing::warn!(path = %path.display(), error = %e, "Cannot inspect file after failed write");
            return;
        }
    };
    if len <= counters.bytes_written {
        return;
    }
    if let Err(e) = file.set_len(counters.bytes_written) {
        tracing::warn!(
            path = %path.display(),
            error = %e,
            "Partial record left in file"
        );
        counters.bytes_written = len;
    }
}

/// Count complete lines and read the timestamp of the first one.
fn inspect(path: &Path) -> io::Result<(u64, Option<NaiveDateTime>)> {
    let mut reader = BufReader::new(File::open(path)?);

    let mut first = Vec::new();
    reader.read_until(b'\n', &mut first)?;
    let first_stamp = parse_line_timestamp(&String::from_utf8_lossy(&first));
    let mut lines = first.iter().filter(|b| **b == b'\n').count() as u64;

    let mut buf = [0u8; 64 * 1024];
    loop {
        let n = reader.read(&mut buf)?;
        if n == 0 {
            break;
        }
        lines += buf[..n].iter().filter(|b| **b == b'\n').count() as u64;
    }
    Ok((lines, first_stamp))
}
