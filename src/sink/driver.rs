//! Sink factories and an explicit driver registry.
//!
//! A host that supports several log backends keeps a `DriverRegistry`, adds
//! the drivers it wants under a name, and asks the registry to build a sink
//! from raw settings. Nothing registers itself.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{resolve, ConfigError, SinkSettings, DEFAULT_STORE};
use crate::rotation::{Clock, SystemClock};
use crate::sink::LogSink;

/// Name the file driver is registered under by [`DriverRegistry::with_defaults`].
pub const FILE_DRIVER: &str = "file";

/// Builds sinks from raw settings.
pub trait LogDriver: Send + Sync {
    fn connect(&self, settings: &SinkSettings) -> Result<LogSink, ConfigError>;
}

/// Driver producing file sinks rooted at a default store directory.
#[derive(Clone)]
pub struct FileLogDriver {
    store: PathBuf,
    clock: Arc<dyn Clock>,
}

impl FileLogDriver {
    pub fn new(store: impl Into<PathBuf>) -> Self {
        Self {
            store: store.into(),
            clock: Arc::new(SystemClock),
        }
    }

    /// Use `clock` for every sink this driver builds.
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn store(&self) -> &PathBuf {
        &self.store
    }
}

impl Default for FileLogDriver {
    fn default() -> Self {
        Self::new(DEFAULT_STORE)
    }
}

impl LogDriver for FileLogDriver {
    fn connect(&self, settings: &SinkSettings) -> Result<LogSink, ConfigError> {
        let config = resolve(settings, &self.store)?;
        Ok(LogSink::with_clock(config, self.clock.clone()))
    }
}

/// Named drivers, owned by the caller.
#[derive(Default, Clone)]
pub struct DriverRegistry {
    drivers: HashMap<String, Arc<dyn LogDriver>>,
}

impl DriverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the file driver under [`FILE_DRIVER`].
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register(FILE_DRIVER, FileLogDriver::default());
        registry
    }

    /// Add a driver, returning the one it replaced.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        driver: impl LogDriver + 'static,
    ) -> Option<Arc<dyn LogDriver>> {
        self.drivers.insert(name.into(), Arc::new(driver))
    }

    pub fn get(&self, name: &str) -> Option<Arc<dyn LogDriver>> {
        self.drivers.get(name).cloned()
    }

    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.drivers.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Build a sink with the driver registered as `name`.
    pub fn connect(&self, name: &str, settings: &SinkSettings) -> Result<LogSink, ConfigError> {
        let driver = self
            .drivers
            .get(name)
            .ok_or_else(|| ConfigError::UnknownDriver(name.to_string()))?;
        driver.connect(settings)
    }
}
