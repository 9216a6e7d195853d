//! Rotation subsystem.
//!
//! # Data Flow
//! ```text
//! FileWriter::write(record)
//!     → clock.rs (current local time)
//!     → policy.rs rotation_reason(counters, thresholds, line length, now)
//!     → None: append to the active file
//!     → Some(reason): policy.rs next_file_name → writer opens it, resets counters
//! ```
//!
//! # Design Decisions
//! - Checked before every write, so a cap is never exceeded by the record
//!   that triggers it
//! - Size, line and date triggers are OR-combined into one rotation
//! - New files always get a name that does not exist yet; nothing is overwritten

pub mod clock;
pub mod policy;

pub use clock::{Clock, ManualClock, SystemClock};
pub use policy::{RotationConfig, RotationReason, RotationState, SliceUnit};
