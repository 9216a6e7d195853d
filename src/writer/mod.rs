//! File writing subsystem.
//!
//! # Data Flow
//! ```text
//! SinkConfig
//!     → registry.rs (one FileWriter per configured level, plus the aggregate)
//!     → file.rs init() (create directories, open, recover counters)
//!
//! LogSink::write(record)
//!     → registry.rs lookup(Aggregate) / lookup(Level(record.level))
//!     → file.rs write() (rotation check, rotate, append)
//! ```
//!
//! # Design Decisions
//! - Each FileWriter is the sole owner of its handle and serialises its own writes
//! - The registry map never changes after open, so lookups need no locking
//! - Shutdown is best-effort: every writer is closed even if some fail

pub mod file;
pub mod registry;

pub use file::{FileWriter, WriterStatus};
pub use registry::{WriterKey, WriterRegistry};
