//! The public sink: lifecycle and level fan-out.

use std::fs;
use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;

use crate::config::SinkConfig;
use crate::error::{SinkError, SinkResult};
use crate::record::LogRecord;
use crate::rotation::{Clock, SystemClock};
use crate::writer::{FileWriter, WriterKey, WriterRegistry};

/// Pause before the final flush so a write still in flight can land.
pub const CLOSE_GRACE: Duration = Duration::from_micros(100);

/// A file log sink.
///
/// Every record goes to the aggregate file, if one is configured, and to the
/// file configured for its level, if any. The two writes run as separate
/// blocking tasks and `write` returns once both have finished.
pub struct LogSink {
    config: SinkConfig,
    clock: Arc<dyn Clock>,
    registry: Option<WriterRegistry>,
}

impl LogSink {
    /// Create a sink using the system clock. Call [`open`](Self::open) before writing.
    pub fn new(config: SinkConfig) -> Self {
        Self::with_clock(config, Arc::new(SystemClock))
    }

    pub fn with_clock(config: SinkConfig, clock: Arc<dyn Clock>) -> Self {
        Self {
            config,
            clock,
            registry: None,
        }
    }

    pub fn config(&self) -> &SinkConfig {
        &self.config
    }

    pub fn is_open(&self) -> bool {
        self.registry.is_some()
    }

    /// The sink's writers, once open.
    pub fn registry(&self) -> Option<&WriterRegistry> {
        self.registry.as_ref()
    }

    /// Create the store directory and open every configured writer.
    ///
    /// An unusable level file is skipped with a warning; an unusable store or
    /// aggregate file fails the call. Opening an open sink does nothing.
    pub fn open(&mut self) -> SinkResult<()> {
        if self.registry.is_some() {
            return Ok(());
        }

        let store = &self.config.store;
        fs::create_dir_all(store).map_err(|source| SinkError::Configuration {
            path: store.clone(),
            source,
        })?;

        if !self.config.has_destinations() {
            tracing::warn!(store = %store.display(), "No log files configured, records will be discarded");
        }

        let registry = WriterRegistry::open(&self.config, self.clock.clone())?;
        tracing::info!(
            store = %store.display(),
            output = ?self.config.output,
            levels = registry.len(),
            "Log sink opened"
        );
        self.registry = Some(registry);
        Ok(())
    }

    /// Write a record to its aggregate and level destinations concurrently.
    ///
    /// Both paths always run to completion. If both fail the aggregate error
    /// comes first in the returned [`SinkError::Multiple`].
    pub async fn write(&self, record: LogRecord) -> SinkResult<()> {
        let registry = self.registry.as_ref().ok_or(SinkError::NotOpen)?;
        let level = record.level;
        let record = Arc::new(record);

        let aggregate = registry
            .lookup(WriterKey::Aggregate)
            .map(|writer| spawn_write(writer, record.clone()));
        let leveled = registry
            .lookup(WriterKey::Level(level))
            .map(|writer| spawn_write(writer, record.clone()));

        let aggregate_result = settle(aggregate).await;
        let level_result = settle(leveled).await;

        match (aggregate_result, level_result) {
            (Ok(()), Ok(())) => Ok(()),
            (Err(e), Ok(())) | (Ok(()), Err(e)) => Err(e),
            (Err(aggregate_err), Err(level_err)) => {
                tracing::error!(
                    level = %level,
                    error = %level_err,
                    "Level file write failed together with the aggregate file"
                );
                Err(SinkError::Multiple(vec![aggregate_err, level_err]))
            }
        }
    }

    /// Flush and sync every writer without closing it.
    pub fn flush(&self) -> SinkResult<()> {
        match &self.registry {
            Some(registry) => registry.flush_all(),
            None => Ok(()),
        }
    }

    /// Wait briefly, flush, then close every writer. Closing twice is harmless.
    pub async fn close(&self) -> SinkResult<()> {
        let Some(registry) = &self.registry else {
            return Ok(());
        };

        tokio::time::sleep(CLOSE_GRACE).await;

        let mut errors = Vec::new();
        if let Err(e) = registry.flush_all() {
            tracing::warn!(error = %e, "Flush before close failed");
            errors.push(e);
        }
        if let Err(e) = registry.close_all() {
            errors.push(e);
        }
        SinkError::collect(errors)
    }
}

fn spawn_write(writer: Arc<FileWriter>, record: Arc<LogRecord>) -> JoinHandle<SinkResult<()>> {
    tokio::task::spawn_blocking(move || writer.write(&record))
}

/// Await a write path; an unconfigured path counts as success.
async fn settle(handle: Option<JoinHandle<SinkResult<()>>>) -> SinkResult<()> {
    match handle {
        Some(handle) => handle.await.map_err(|e| SinkError::Task(e.to_string()))?,
        None => Ok(()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::Level;
    use std::path::Path;

    fn line_count(path: &Path) -> usize {
        std::fs::read_to_string(path).map(|s| s.lines().count()).unwrap_or(0)
    }

    #[tokio::test]
    async fn test_write_before_open() {
        let sink = LogSink::new(SinkConfig::default());
        let err = sink.write(LogRecord::new(Level::Info, "early")).await.unwrap_err();
        assert!(matches!(err, SinkError::NotOpen));
        // Closing an unopened sink is fine.
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_fan_out() {
        let dir = tempfile::tempdir().unwrap();
        let config = SinkConfig::new(dir.path())
            .with_level(Level::Error)
            .with_output();
        let mut sink = LogSink::new(config);
        sink.open().unwrap();
        assert!(sink.is_open());

        sink.write(LogRecord::new(Level::Error, "boom")).await.unwrap();
        sink.write(LogRecord::new(Level::Info, "fine")).await.unwrap();
        sink.close().await.unwrap();

        assert_eq!(line_count(&dir.path().join("output.log")), 2);
        assert_eq!(line_count(&dir.path().join("error.log")), 1);
        assert!(!dir.path().join("info.log").exists());
    }

    #[tokio::test]
    async fn test_open_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let mut sink = LogSink::new(SinkConfig::new(dir.path()).with_output());
        sink.open().unwrap();
        sink.open().unwrap();
        assert_eq!(sink.registry().map(WriterRegistry::len), Some(1));
        sink.close().await.unwrap();
    }

    #[tokio::test]
    async fn test_open_fails_on_unusable_store() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        std::fs::write(&blocker, b"").unwrap();

        let mut sink = LogSink::new(SinkConfig::new(blocker.join("logs")).with_output());
        let err = sink.open().unwrap_err();
        assert!(matches!(err, SinkError::Configuration { .. }));
        assert!(!sink.is_open());
    }
}
