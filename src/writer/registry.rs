//! Level to writer lookup for one sink.

use std::collections::HashMap;
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::SinkConfig;
use crate::error::{SinkError, SinkResult};
use crate::record::Level;
use crate::rotation::Clock;
use crate::writer::FileWriter;

/// Destination a writer is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum WriterKey {
    /// Receives every record regardless of level.
    Aggregate,
    Level(Level),
}

impl fmt::Display for WriterKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WriterKey::Aggregate => f.write_str("aggregate"),
            WriterKey::Level(level) => f.write_str(level.key()),
        }
    }
}

/// The writers owned by one sink. Built once, read-only afterwards.
#[derive(Default)]
pub struct WriterRegistry {
    writers: HashMap<WriterKey, Arc<FileWriter>>,
}

impl WriterRegistry {
    /// Build and initialise a writer for every configured destination.
    ///
    /// A level file that cannot be opened is logged and left out. The
    /// aggregate file is required: failing to open it fails the registry.
    pub fn open(config: &SinkConfig, clock: Arc<dyn Clock>) -> SinkResult<Self> {
        let mut writers = HashMap::with_capacity(config.level_files.len() + 1);

        for (level, path) in &config.level_files {
            let writer = FileWriter::new(path, config.rotation, clock.clone());
            match writer.init() {
                Ok(()) => {
                    writers.insert(WriterKey::Level(*level), Arc::new(writer));
                }
                Err(e) => {
                    tracing::warn!(
                        level = %level,
                        path = %path.display(),
                        error = %e,
                        "Level log file unavailable, continuing without it"
                    );
                }
            }
        }

        if let Some(path) = &config.output {
            let writer = FileWriter::new(path, config.rotation, clock);
            if let Err(e) = writer.init() {
                // Release the level files opened so far before giving up.
                let opened = Self { writers };
                if let Err(close_err) = opened.close_all() {
                    tracing::warn!(error = %close_err, "Closing level files after failed open");
                }
                return Err(e);
            }
            writers.insert(WriterKey::Aggregate, Arc::new(writer));
        }

        tracing::info!(writers = writers.len(), "Writer registry opened");
        Ok(Self { writers })
    }

    /// Writer for `key`, if a destination is configured for it.
    pub fn lookup(&self, key: WriterKey) -> Option<Arc<FileWriter>> {
        self.writers.get(&key).cloned()
    }

    pub fn contains(&self, key: WriterKey) -> bool {
        self.writers.contains_key(&key)
    }

    pub fn len(&self) -> usize {
        self.writers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.writers.is_empty()
    }

    /// Configured destinations and their base paths.
    pub fn destinations(&self) -> Vec<(WriterKey, PathBuf)> {
        self.writers
            .iter()
            .map(|(key, writer)| (*key, writer.base_path().to_path_buf()))
            .collect()
    }

    /// Flush every writer, attempting all of them even if some fail.
    pub fn flush_all(&self) -> SinkResult<()> {
        let errors = self
            .writers
            .values()
            .filter_map(|writer| writer.flush().err())
            .collect();
        SinkError::collect(errors)
    }

    /// Close every writer, attempting all of them even if some fail.
    pub fn close_all(&self) -> SinkResult<()> {
        let mut errors = Vec::new();
        for (key, writer) in &self.writers {
            if let Err(e) = writer.close() {
                tracing::error!(destination = %key, error = %e, "Failed to close log file");
                errors.push(e);
            }
        }
        SinkError::collect(errors)
    }
}
