//! File log sink library.
//!
//! Persists structured log records to plain text files, one file per
//! configured severity level plus an optional aggregate file, rotating each
//! file by size, line count or calendar period.

pub mod config;
pub mod error;
pub mod observability;
pub mod record;
pub mod rotation;
pub mod sink;
pub mod writer;

pub use config::{SinkConfig, SinkSettings};
pub use error::{SinkError, SinkResult};
pub use record::{Level, LogRecord};
pub use sink::{DriverRegistry, FileLogDriver, LogDriver, LogSink};
