//! Structured logging.
//!
//! # Responsibilities
//! - Initialize the diagnostic logging subsystem for the sink's own events
//! - Configure log level from the environment or a fallback directive
//!
//! # Design Decisions
//! - Uses tracing crate for structured logging
//! - `RUST_LOG` wins over the fallback so operators can raise verbosity
//! - Diagnostics go to stderr, never into the files the sink manages

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

/// Install the global subscriber. Returns false if one was already set.
pub fn init_logging(fallback: &str) -> bool {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init()
        .is_ok()
}
