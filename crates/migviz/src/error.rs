//! Error types for migviz.
//!
//! Errors are split by layer:
//!
//! - [`GraphError`]: the graph could not be built. Always fatal for the
//!   current build and never retried; construction is a pure function of its
//!   inputs.
//! - [`StoreError`]: the applied-state store could not answer. `Unavailable`
//!   is downgraded to "nothing applied" by the filter; `Read` is fatal.
//! - [`RenderError`]: the rendering backend failed.
//! - [`ConfigError`]: the `.migviz/` directory or its configuration is
//!   missing or invalid.
//!
//! [`Error`] wraps all of them for library callers.

use crate::domain::{DependencyRef, RecordKey};
use std::collections::BTreeSet;
use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// The error type for migviz operations.
#[derive(Debug, Error)]
pub enum Error {
    /// IO error occurred.
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    /// JSON serialization error.
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// A data file is not valid JSONL.
    #[error("Invalid data file: {0}")]
    InvalidFormat(String),

    /// Configuration error.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Applied-state store error.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Graph construction or validation error.
    #[error(transparent)]
    Graph(#[from] GraphError),

    /// Rendering backend error.
    #[error(transparent)]
    Render(#[from] RenderError),
}

impl From<migviz_jsonl::Error> for Error {
    fn from(err: migviz_jsonl::Error) -> Self {
        match err {
            migviz_jsonl::Error::Io(io_err) => Self::Io(io_err),
            migviz_jsonl::Error::Json(json_err) => Self::Json(json_err),
            parse @ migviz_jsonl::Error::Parse { .. } => Self::InvalidFormat(parse.to_string()),
        }
    }
}

/// A specialized Result type for migviz operations.
pub type Result<T> = std::result::Result<T, Error>;

/// The graph could not be built into a consistent DAG.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// An edge points at a record that is not a node of the graph.
    #[error("{}", dangling_message(.origin, .missing, .replaced_by))]
    Inconsistent {
        /// The record holding the dangling edge.
        origin: RecordKey,
        /// The record the edge points at.
        missing: RecordKey,
        /// Replacing records that could have stood in for `missing` but did
        /// not take effect (empty when `missing` is not a replacement target).
        replaced_by: BTreeSet<RecordKey>,
    },

    /// A `__first__`/`__latest__` dependency names a namespace with no
    /// root (or leaf) record in the graph.
    #[error("{}", marker_message(.origin, .dependency))]
    UnresolvedMarker {
        /// The record declaring the dependency.
        origin: RecordKey,
        /// The symbolic dependency that could not be resolved.
        dependency: DependencyRef,
    },

    /// The dependency graph contains a cycle.
    #[error("dependency cycle detected at {entry}: {}", cycle_message(.path))]
    Cyclic {
        /// The node at which the traversal re-entered the cycle.
        entry: RecordKey,
        /// The cycle from `entry` back to `entry`.
        path: Vec<RecordKey>,
    },
}

impl GraphError {
    /// Returns `true` for the dangling-reference family of errors.
    pub fn is_inconsistent(&self) -> bool {
        matches!(self, Self::Inconsistent { .. } | Self::UnresolvedMarker { .. })
    }

    /// The key most useful for diagnosis: the missing record, the record
    /// with the unresolved marker, or the cycle entry.
    pub fn key(&self) -> &RecordKey {
        match self {
            Self::Inconsistent { missing, .. } => missing,
            Self::UnresolvedMarker { origin, .. } => origin,
            Self::Cyclic { entry, .. } => entry,
        }
    }
}

fn dangling_message(
    origin: &RecordKey,
    missing: &RecordKey,
    replaced_by: &BTreeSet<RecordKey>,
) -> String {
    if replaced_by.is_empty() {
        return format!("{origin} depends on nonexistent record {missing}");
    }

    let candidates = replaced_by
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    format!(
        "{origin} depends on nonexistent record {missing}. It could have been replaced by \
         any of [{candidates}], but was not because the replacement was not fully applied"
    )
}

fn marker_message(origin: &RecordKey, dependency: &DependencyRef) -> String {
    let boundary = match dependency {
        DependencyRef::Latest(_) => "leaf",
        _ => "root",
    };
    let namespace = dependency.namespace();
    format!(
        "{origin} depends on {dependency}, but namespace '{namespace}' has no {boundary} \
         record in the graph"
    )
}

fn cycle_message(path: &[RecordKey]) -> String {
    path.iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// The applied-state store could not answer a query.
#[derive(Debug, Error)]
pub enum StoreError {
    /// No store is configured or its backing data does not exist.
    #[error("applied-state store unavailable: {0}")]
    Unavailable(String),

    /// The store exists but reading it failed.
    #[error("failed to read applied state: {0}")]
    Read(#[from] migviz_jsonl::Error),
}

/// The rendering backend failed.
#[derive(Debug, Error)]
pub enum RenderError {
    /// The output format token is unusable.
    #[error("invalid output format '{0}': expected a non-empty token of letters, digits, '.', '_', ':' or '-'")]
    InvalidFormat(String),

    /// The renderer executable was not found.
    #[error("{command} not found\n\n{install_hint}")]
    NotFound {
        /// The command that was not found.
        command: String,
        /// Installation instructions for the missing command.
        install_hint: String,
    },

    /// The renderer process could not be started.
    #[error("failed to spawn renderer '{command}': {source}")]
    SpawnFailed {
        /// The command that failed to spawn.
        command: String,
        /// The underlying I/O error.
        #[source]
        source: io::Error,
    },

    /// The renderer ran but reported failure.
    #[error("renderer '{command}' failed ({status}): {stderr}")]
    Failed {
        /// The command that failed.
        command: String,
        /// Exit status description.
        status: String,
        /// Captured standard error.
        stderr: String,
    },

    /// I/O error while writing render output.
    #[error("render I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Configuration and repository layout errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// No `.migviz/` directory was found.
    #[error("Not a migviz repository (or any parent). Run 'migviz init' first.")]
    NotInitialized,

    /// `init` was run where a `.migviz/` directory already exists.
    #[error("migviz is already initialized. Found existing '{}'", .0.display())]
    AlreadyInitialized(PathBuf),

    /// The configuration file could not be parsed or contains bad values.
    #[error("Configuration error: {0}")]
    Invalid(String),
}
