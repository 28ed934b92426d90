//! Error types for system-wide data acquisition.
//!
//! Per-process failures never surface here: a process that vanishes while it
//! is being read is an expected outcome and is modelled by
//! [`crate::process::Extraction`]. Only data the whole report depends on
//! (memory totals, uptime) can fail a run.

use std::path::PathBuf;

/// Failure to establish a system-wide figure.
#[derive(Debug, thiserror::Error)]
pub enum MeminfoError {
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("required field '{field}' missing from {}", path.display())]
    MissingField { field: &'static str, path: PathBuf },

    #[error("malformed {}: {detail}", path.display())]
    Malformed { path: PathBuf, detail: String },
}

impl MeminfoError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}

pub type Result<T> = std::result::Result<T, MeminfoError>;
