//! Subscriber setup for the `bf` binary.
//!
//! The library only emits `tracing` events; nothing is recorded unless a
//! subscriber is installed. The binary installs two layers:
//! - stderr, filtered by `RUST_LOG` (default `error`, so normal runs stay quiet),
//! - optionally, JSON execution records appended to a log file at `info`.

use std::fs::OpenOptions;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{fmt, layer::SubscriberExt, EnvFilter, Layer};

#[derive(Debug, thiserror::Error)]
pub enum LoggingError {
    #[error("failed to open log file {}: {source}", .path.display())]
    Open { path: PathBuf, #[source] source: io::Error },

    #[error("failed to install log subscriber: {0}")]
    Init(#[from] TryInitError),
}

pub fn init_logging(log_file: Option<&Path>) -> Result<(), LoggingError> {
    let console_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("error"));
    let console = fmt::layer()
        .with_writer(io::stderr)
        .with_target(false)
        .with_filter(console_filter);

    let records = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .map_err(|source| LoggingError::Open { path: path.to_path_buf(), source })?;
            Some(
                fmt::layer()
                    .json()
                    .with_ansi(false)
                    .with_writer(Mutex::new(file))
                    .with_filter(EnvFilter::new("info")),
            )
        }
        None => None,
    };

    tracing_subscriber::registry().with(console).with(records).try_init()?;
    Ok(())
}
