//! Error type shared by the logsift crates.
//!
//! Configuration gaps and parse misses are not errors (they are skipped and
//! logged). Everything represented here is fatal for a run.

use crate::histogram::HistogramError;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Directory listing, file open or file read failed.
    #[error("i/o error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A sink could not write an emitted field.
    #[error("sink write failed: {0}")]
    Write(#[from] std::io::Error),

    #[error("configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Histogram(#[from] HistogramError),

    #[error("dictionary snapshot: {0}")]
    Json(#[from] serde_json::Error),

    /// A worker panicked or was cancelled.
    #[error("worker failed: {0}")]
    Worker(String),
}

impl Error {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Error::Io {
            path: path.into(),
            source,
        }
    }
}
