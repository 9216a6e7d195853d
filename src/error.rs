//! Error definitions for the sink and its writers.

use std::fmt;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur while opening, writing to or closing log files.
#[derive(Debug, Error)]
pub enum SinkError {
    /// A directory required by the store or a writer could not be created.
    #[error("cannot create directory {path}: {source}")]
    Configuration { path: PathBuf, source: io::Error },

    /// The active file could not be opened.
    #[error("cannot open log file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },

    /// The next file could not be opened during rotation.
    #[error("rotation to {path} failed: {source}")]
    Rotation { path: PathBuf, source: io::Error },

    /// Writing or flushing an open handle failed.
    #[error("write to {path} failed: {source}")]
    Write { path: PathBuf, source: io::Error },

    /// The writer lost its handle in a failed rotation.
    #[error("log file {path} is unavailable after a failed rotation")]
    Unavailable { path: PathBuf },

    /// The writer has been closed.
    #[error("log file {path} is closed")]
    Closed { path: PathBuf },

    /// `write` was called before `open`.
    #[error("log sink is not open")]
    NotOpen,

    /// A blocking write task panicked or was cancelled.
    #[error("write task failed: {0}")]
    Task(String),

    /// Several independent failures, most important first.
    #[error("{}", DisplayAll(.0))]
    Multiple(Vec<SinkError>),
}

impl SinkError {
    /// Collapse a list of failures into a single result.
    pub fn collect(mut errors: Vec<SinkError>) -> SinkResult<()> {
        match errors.len() {
            0 => Ok(()),
            1 => Err(errors.remove(0)),
            _ => Err(SinkError::Multiple(errors)),
        }
    }
}

struct DisplayAll<'a>(&'a [SinkError]);

impl fmt::Display for DisplayAll<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, err) in self.0.iter().enumerate() {
            if i > 0 {
                write!(f, "; ")?;
            }
            write!(f, "{}", err)?;
        }
        Ok(())
    }
}

/// Result type for sink operations.
pub type SinkResult<T> = Result<T, SinkError>;
