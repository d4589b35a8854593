//! Error types for migviz-jsonl operations.

use std::io;
use thiserror::Error;

/// The error type for migviz-jsonl operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred while reading or writing.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A line could not be parsed during a strict read.
    #[error("line {line_number}: {source}")]
    Parse {
        /// The 1-based line number of the offending line.
        line_number: usize,
        /// The underlying JSON error.
        #[source]
        source: serde_json::Error,
    },
}

impl Error {
    /// Returns `true` if this error means the file does not exist.
    ///
    /// Callers that treat a missing file as "no data yet" use this to tell
    /// that case apart from genuine read failures.
    #[must_use]
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::Io(e) if e.kind() == io::ErrorKind::NotFound)
    }
}

/// A specialized Result type for migviz-jsonl operations.
pub type Result<T> = std::result::Result<T, Error>;
