//! file-log-sink
//!
//! Reads log lines from stdin and persists them through a file log sink.
//!
//! # Architecture Overview
//!
//! ```text
//!     stdin ──▶ parse "LEVEL message" ──▶ LogSink::write
//!                                             │
//!                          ┌──────────────────┴──────────────────┐
//!                          ▼                                     ▼
//!                 aggregate FileWriter                  level FileWriter
//!                 (output.log)                          (error.log, ...)
//!                          │                                     │
//!                          └── rotation policy: size / lines / date slice
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;

use clap::Parser;
use tokio::io::{AsyncBufReadExt, BufReader};

use file_log_sink::config::{load_settings, SinkSettings};
use file_log_sink::observability::{logging, metrics};
use file_log_sink::sink::FILE_DRIVER;
use file_log_sink::{DriverRegistry, Level, LogRecord};

#[derive(Parser)]
#[command(name = "file-log-sink")]
#[command(about = "Write log lines from stdin into level-routed, rotating files", long_about = None)]
struct Cli {
    /// TOML file with sink settings (store, output, error, maxsize, ...).
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Driver used to build the sink.
    #[arg(short, long, default_value = FILE_DRIVER)]
    driver: String,

    /// Filter for the sink's own diagnostics when RUST_LOG is unset.
    #[arg(long, default_value = "file_log_sink=info")]
    log_level: String,

    /// Serve Prometheus metrics on this address.
    #[arg(long)]
    metrics_address: Option<SocketAddr>,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    logging::init_logging(&cli.log_level);

    if let Some(addr) = cli.metrics_address {
        metrics::init_metrics(addr);
    }

    let settings = match &cli.config {
        Some(path) => load_settings(path)?,
        None => SinkSettings::new(),
    };

    let drivers = DriverRegistry::with_defaults();
    let mut sink = drivers.connect(&cli.driver, &settings)?;
    sink.open()?;

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }
                if let Err(e) = sink.write(parse_line(&line)).await {
                    tracing::error!(error = %e, "Failed to write record");
                }
            }
            _ = tokio::signal::ctrl_c() => {
                tracing::info!("Interrupted, closing sink");
                break;
            }
        }
    }

    sink.close().await?;
    tracing::info!("Shutdown complete");
    Ok(())
}

/// Split `LEVEL message`; lines without a recognised level are logged at INFO.
fn parse_line(line: &str) -> LogRecord {
    let (first, rest) = line.split_once(char::is_whitespace).unwrap_or((line, ""));
    let first = first.trim_matches(|c: char| c == '[' || c == ']' || c == ':');
    match first.parse::<Level>() {
        Ok(level) => LogRecord::new(level, rest.trim_start()),
        Err(_) => LogRecord::new(Level::Info, line),
    }
}
