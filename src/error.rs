//! Error types shared by the report pipeline

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Every failure is terminal for a run; callers report it and stop.
#[derive(Debug, Error)]
pub enum ReportError {
    /// Coverage data is missing, unreadable or malformed
    #[error("Failed to import coverage data from {}: {reason}", .path.display())]
    Import { path: PathBuf, reason: String },

    /// The source directory cannot be scanned
    #[error("Cannot read source directory {}", .path.display())]
    FileSystem {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// The report destination cannot be written
    #[error("Failed to write report to {}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to serialize report")]
    Xml(#[from] quick_xml::Error),

    #[error("Invalid configuration: {0}")]
    Config(String),
}

impl ReportError {
    pub(crate) fn import(path: impl Into<PathBuf>, reason: impl Into<String>) -> Self {
        ReportError::Import {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

pub type Result<T> = std::result::Result<T, ReportError>;
