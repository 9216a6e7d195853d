//! Failure injection testing for the file log sink.

use std::fs;
use std::path::Path;
use std::sync::Arc;

use file_log_sink::rotation::{ManualClock, RotationConfig};
use file_log_sink::writer::{WriterKey, WriterStatus};
use file_log_sink::{Level, LogRecord, LogSink, SinkConfig, SinkError};

mod common;
use common::{at, read_lines};

/// Replace a directory with a plain file so nothing can be created inside it.
#[cfg(unix)]
fn block_dir(dir: &Path) {
    fs::remove_dir_all(dir).unwrap();
    fs::write(dir, b"not a directory").unwrap();
}

#[tokio::test]
async fn test_unusable_level_file_degrades() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let config = SinkConfig::new(dir.path())
        .with_output()
        .with_level(Level::Info)
        .with_level_file(Level::Error, blocker.join("error.log"));
    let clock = Arc::new(ManualClock::new(at(2024, 5, 1, 12, 0, 0)));
    let mut sink = LogSink::with_clock(config, clock);
    sink.open().unwrap();

    let registry = sink.registry().unwrap();
    assert!(registry.contains(WriterKey::Aggregate));
    assert!(registry.contains(WriterKey::Level(Level::Info)));
    assert!(!registry.contains(WriterKey::Level(Level::Error)));

    sink.write(LogRecord::new(Level::Error, "still recorded")).await.unwrap();
    sink.write(LogRecord::new(Level::Info, "routine")).await.unwrap();
    sink.close().await.unwrap();

    assert_eq!(read_lines(&dir.path().join("output.log")).len(), 2);
    assert_eq!(read_lines(&dir.path().join("info.log")).len(), 1);
}

#[tokio::test]
async fn test_unusable_aggregate_fails_open() {
    let dir = tempfile::tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, b"").unwrap();

    let config = SinkConfig::new(dir.path())
        .with_level(Level::Warn)
        .with_output_file(blocker.join("output.log"));
    let mut sink = LogSink::new(config);

    let err = sink.open().unwrap_err();
    assert!(matches!(err, SinkError::Configuration { .. }), "got {:?}", err);
    assert!(!sink.is_open());
    let err = sink.write(LogRecord::new(Level::Warn, "nowhere")).await.unwrap_err();
    assert!(matches!(err, SinkError::NotOpen));
}

#[tokio::test]
async fn test_write_after_close() {
    let dir = tempfile::tempdir().unwrap();
    let mut sink = LogSink::new(SinkConfig::new(dir.path()).with_output());
    sink.open().unwrap();
    sink.close().await.unwrap();

    let err = sink.write(LogRecord::new(Level::Info, "too late")).await.unwrap_err();
    assert!(matches!(err, SinkError::Closed { .. }), "got {:?}", err);
    assert!(read_lines(&dir.path().join("output.log")).is_empty());
}

#[cfg(unix)]
#[tokio::test]
async fn test_aggregate_failure_does_not_block_level_file() {
    let dir = tempfile::tempdir().unwrap();
    let now = at(2024, 5, 1, 12, 0, 0);
    let aggregate_dir = dir.path().join("all");
    let level_dir = dir.path().join("levels");

    let config = SinkConfig::new(dir.path())
        .with_output_file(aggregate_dir.join("output.log"))
        .with_level_file(Level::Error, level_dir.join("error.log"))
        .with_rotation(RotationConfig {
            max_lines: 1,
            ..Default::default()
        });
    let mut sink = LogSink::with_clock(config, Arc::new(ManualClock::new(now)));
    sink.open().unwrap();

    sink.write(LogRecord::new(Level::Error, "first")).await.unwrap();

    // The aggregate's next file cannot be created.
    block_dir(&aggregate_dir);
    let err = sink.write(LogRecord::new(Level::Error, "second")).await.unwrap_err();
    assert!(matches!(err, SinkError::Rotation { .. }), "got {:?}", err);

    let aggregate = sink.registry().unwrap().lookup(WriterKey::Aggregate).unwrap();
    assert_eq!(aggregate.status(), WriterStatus::Failed);

    let err = sink.write(LogRecord::new(Level::Error, "third")).await.unwrap_err();
    assert!(matches!(err, SinkError::Unavailable { .. }), "got {:?}", err);

    // Every record still reached the level file.
    assert_eq!(
        common::file_names(&level_dir),
        vec!["error.log", "error.log.2024-05-01", "error.log.2024-05-01.1"]
    );
    assert!(read_lines(&level_dir.join("error.log.2024-05-01.1"))[0].ends_with("third"));

    // Clearing the obstruction and re-initialising restores the aggregate.
    fs::remove_file(&aggregate_dir).unwrap();
    aggregate.init().unwrap();
    sink.write(LogRecord::new(Level::Info, "recovered")).await.unwrap();
    sink.close().await.unwrap();
    assert!(read_lines(&aggregate_dir.join("output.log"))[0].ends_with("recovered"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_both_paths_failing_reports_both() {
    let dir = tempfile::tempdir().unwrap();
    let aggregate_dir = dir.path().join("all");
    let level_dir = dir.path().join("levels");

    let config = SinkConfig::new(dir.path())
        .with_output_file(aggregate_dir.join("output.log"))
        .with_level_file(Level::Fatal, level_dir.join("fatal.log"))
        .with_rotation(RotationConfig {
            max_lines: 1,
            ..Default::default()
        });
    let mut sink = LogSink::new(config);
    sink.open().unwrap();
    sink.write(LogRecord::new(Level::Fatal, "first")).await.unwrap();

    block_dir(&aggregate_dir);
    block_dir(&level_dir);

    let err = sink.write(LogRecord::new(Level::Fatal, "second")).await.unwrap_err();
    match err {
        SinkError::Multiple(errors) => {
            assert_eq!(errors.len(), 2);
            for e in &errors {
                assert!(matches!(e, SinkError::Rotation { .. }), "got {:?}", e);
            }
            // Aggregate first.
            let first = errors[0].to_string();
            assert!(first.contains("output.log"), "got {}", first);
        }
        other => panic!("expected both failures, got {:?}", other),
    }
}
