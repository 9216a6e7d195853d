//! Observability subsystem.
//!
//! # Data Flow
//! ```text
//! writer / registry / sink produce:
//!     → logging.rs (structured diagnostics: opens, rotations, failures)
//!     → metrics.rs (records, bytes, rotations, errors, open writers)
//!
//! Consumers:
//!     → stderr via tracing-subscriber
//!     → Metrics endpoint (Prometheus scrape)
//! ```
//!
//! # Design Decisions
//! - The sink's own diagnostics never go through the sink
//! - Metrics are cheap (atomic increments) and no-ops without a recorder

pub mod logging;
pub mod metrics;
