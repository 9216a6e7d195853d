//! Sink subsystem.
//!
//! # Data Flow
//! ```text
//! DriverRegistry::connect(name, settings)
//!     → driver.rs FileLogDriver (resolve settings → SinkConfig)
//!     → connect.rs LogSink
//!
//! LogSink::open()     → create store → WriterRegistry::open
//! LogSink::write(rec) → spawn aggregate write ┐
//!                     → spawn level write     ┴→ join both → first error wins
//! LogSink::close()    → grace delay → flush_all → close_all
//! ```
//!
//! # Design Decisions
//! - At most two blocking tasks per record; both are joined before returning
//! - The aggregate and level paths share no mutable state
//! - Drivers are registered explicitly by the host, never at load time

pub mod connect;
pub mod driver;

pub use connect::{LogSink, CLOSE_GRACE};
pub use driver::{DriverRegistry, FileLogDriver, LogDriver, FILE_DRIVER};
