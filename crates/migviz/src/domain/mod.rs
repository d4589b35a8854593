//! Domain types for migration records.
//!
//! A record is one versioned change unit (a "migration") identified by a
//! [`RecordKey`]. Records declare the records they depend on and, for
//! squashed records, the records they replace.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// Marker name for a dependency on a namespace's first (root) record.
pub const FIRST_MARKER: &str = "__first__";

/// Marker name for a dependency on a namespace's latest (leaf) record.
pub const LATEST_MARKER: &str = "__latest__";

/// Unique identity of a record: `(namespace, name)`.
///
/// Ordering is lexicographic on the tuple, which is the ordering every
/// deterministic walk in migviz relies on.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub struct RecordKey {
    /// Grouping scope of the record (e.g. an application name).
    pub namespace: String,
    /// Name of the record within its namespace.
    pub name: String,
}

impl RecordKey {
    /// Create a new record key
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }

    /// Label used in graph exports: `namespace/name`.
    pub fn label(&self) -> String {
        format!("{}/{}", self.namespace, self.name)
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.namespace, self.name)
    }
}

impl From<(String, String)> for RecordKey {
    fn from((namespace, name): (String, String)) -> Self {
        Self { namespace, name }
    }
}

impl From<RecordKey> for (String, String) {
    fn from(key: RecordKey) -> Self {
        (key.namespace, key.name)
    }
}

impl From<(&str, &str)> for RecordKey {
    fn from((namespace, name): (&str, &str)) -> Self {
        Self::new(namespace, name)
    }
}

/// A declared dependency of a record.
///
/// On disk every dependency is a `[namespace, name]` pair; the names
/// [`FIRST_MARKER`] and [`LATEST_MARKER`] select the symbolic forms, which
/// are resolved against the graph while edges are being added rather than
/// when the record is declared.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(from = "(String, String)", into = "(String, String)")]
pub enum DependencyRef {
    /// A specific record.
    Key(RecordKey),
    /// The root record of a namespace.
    First(String),
    /// The leaf record of a namespace.
    Latest(String),
}

impl DependencyRef {
    /// Namespace the dependency points into.
    pub fn namespace(&self) -> &str {
        match self {
            Self::Key(key) => &key.namespace,
            Self::First(namespace) | Self::Latest(namespace) => namespace,
        }
    }

    /// Returns `true` for the `First`/`Latest` forms.
    pub fn is_symbolic(&self) -> bool {
        !matches!(self, Self::Key(_))
    }
}

impl From<(String, String)> for DependencyRef {
    fn from((namespace, name): (String, String)) -> Self {
        match name.as_str() {
            FIRST_MARKER => Self::First(namespace),
            LATEST_MARKER => Self::Latest(namespace),
            _ => Self::Key(RecordKey { namespace, name }),
        }
    }
}

impl From<DependencyRef> for (String, String) {
    fn from(dep: DependencyRef) -> Self {
        match dep {
            DependencyRef::Key(key) => key.into(),
            DependencyRef::First(namespace) => (namespace, FIRST_MARKER.to_string()),
            DependencyRef::Latest(namespace) => (namespace, LATEST_MARKER.to_string()),
        }
    }
}

impl From<RecordKey> for DependencyRef {
    fn from(key: RecordKey) -> Self {
        Self::Key(key)
    }
}

impl fmt::Display for DependencyRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => write!(f, "{key}"),
            Self::First(namespace) => write!(f, "{namespace}.{FIRST_MARKER}"),
            Self::Latest(namespace) => write!(f, "{namespace}.{LATEST_MARKER}"),
        }
    }
}

/// A versioned change record as declared in the catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    /// Namespace of the record
    pub namespace: String,

    /// Name of the record
    pub name: String,

    /// Records this one depends on
    #[serde(default)]
    pub dependencies: BTreeSet<DependencyRef>,

    /// Records this one supersedes (empty for ordinary records)
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub replaces: BTreeSet<RecordKey>,
}

impl Record {
    /// Create a record with no dependencies and no replacements
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
            dependencies: BTreeSet::new(),
            replaces: BTreeSet::new(),
        }
    }

    /// Builder-style helper adding a dependency.
    #[must_use]
    pub fn depends_on(mut self, dep: impl Into<DependencyRef>) -> Self {
        self.dependencies.insert(dep.into());
        self
    }

    /// Builder-style helper adding a replaced record.
    #[must_use]
    pub fn replacing(mut self, key: impl Into<RecordKey>) -> Self {
        self.replaces.insert(key.into());
        self
    }

    /// The record's key.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.namespace.clone(), self.name.clone())
    }

    /// Returns `true` if this record supersedes other records.
    pub fn is_replacement(&self) -> bool {
        !self.replaces.is_empty()
    }
}

/// One row of applied state: a record and when it was applied.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppliedEntry {
    /// Namespace of the applied record
    pub namespace: String,

    /// Name of the applied record
    pub name: String,

    /// When the record was applied
    pub applied_at: DateTime<Utc>,
}

impl AppliedEntry {
    /// The applied record's key.
    pub fn key(&self) -> RecordKey {
        RecordKey::new(self.namespace.clone(), self.name.clone())
    }
}
