//! Configuration management subsystem.
//!
//! # Data Flow
//! ```text
//! host settings map / TOML file
//!     → loader.rs (read & deserialize into SinkSettings)
//!     → validation.rs (resolve keys, parse sizes, apply defaults)
//!     → SinkConfig (typed, immutable)
//!     → LogSink::open
//! ```
//!
//! # Design Decisions
//! - Config is resolved once when the sink is built; it never changes afterwards
//! - Every field has a default so an empty map is a valid configuration
//! - Deserialization accepts loose types; validation turns them into strict ones

pub mod loader;
pub mod schema;
pub mod validation;

pub use loader::{load_config, load_settings, ConfigError};
pub use schema::{SettingValue, SinkConfig, SinkSettings, DEFAULT_OUTPUT_FILE, DEFAULT_STORE};
pub use validation::{parse_size, resolve};
