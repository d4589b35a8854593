//! The record catalog: every migration record known to the system.
//!
//! The catalog is loaded once per build and never mutated by graph
//! construction. On disk it is a JSONL file with one [`Record`] per line:
//!
//! ```text
//! {"namespace":"auth","name":"0001_initial","dependencies":[]}
//! {"namespace":"auth","name":"0002_user","dependencies":[["auth","0001_initial"]]}
//! ```

use crate::domain::{Record, RecordKey};
use crate::error::Result;
use migviz_jsonl::{read_jsonl_resilient, Warning as JsonlWarning};
use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use tracing::{debug, warn};

/// Non-fatal problems found while loading a catalog file.
///
/// The offending line or field is skipped and loading continues.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadWarning {
    /// A line was not valid JSON.
    MalformedJson { line_number: usize, error: String },

    /// A line was valid JSON but not a record.
    InvalidRecord { line_number: usize, reason: String },

    /// A second record with an already-seen key.
    ///
    /// **Effect**: the later record is dropped; the first one wins.
    DuplicateRecord { key: RecordKey },

    /// A record lists itself in its own `replaces` set.
    ///
    /// **Effect**: the self-entry is dropped; the rest of the record is kept.
    SelfReplacement { key: RecordKey },
}

impl From<JsonlWarning> for LoadWarning {
    fn from(warning: JsonlWarning) -> Self {
        match warning {
            JsonlWarning::MalformedJson { line_number, error } => {
                Self::MalformedJson { line_number, error }
            }
            JsonlWarning::SkippedLine {
                line_number,
                reason,
            } => Self::InvalidRecord {
                line_number,
                reason,
            },
        }
    }
}

impl fmt::Display for LoadWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MalformedJson { line_number, error } => {
                write!(f, "line {line_number}: malformed JSON: {error}")
            }
            Self::InvalidRecord {
                line_number,
                reason,
            } => write!(f, "line {line_number}: invalid record: {reason}"),
            Self::DuplicateRecord { key } => write!(f, "duplicate record {key} ignored"),
            Self::SelfReplacement { key } => write!(f, "{key} cannot replace itself"),
        }
    }
}

/// Ordered collection of records keyed by [`RecordKey`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Catalog {
    records: BTreeMap<RecordKey, Record>,
}

impl Catalog {
    /// Create an empty catalog
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a record, returning `false` (and dropping it) if its key is
    /// already present.
    pub fn insert(&mut self, record: Record) -> bool {
        let key = record.key();
        if self.records.contains_key(&key) {
            return false;
        }
        self.records.insert(key, record);
        true
    }

    /// Look up a record by key.
    pub fn get(&self, key: &RecordKey) -> Option<&Record> {
        self.records.get(key)
    }

    /// Returns `true` if the catalog holds `key`.
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.records.contains_key(key)
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Returns `true` if the catalog is empty.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// Records in ascending key order.
    pub fn iter(&self) -> impl Iterator<Item = &Record> {
        self.records.values()
    }

    /// Load a catalog from a JSONL file.
    ///
    /// # Errors
    ///
    /// Fails only if the file cannot be opened; a catalog is always
    /// required. Line-level problems are returned as warnings.
    pub async fn load_from_jsonl(path: &Path) -> Result<(Self, Vec<LoadWarning>)> {
        let (records, jsonl_warnings) = read_jsonl_resilient::<Record, _>(path).await?;

        let mut warnings: Vec<LoadWarning> =
            jsonl_warnings.into_iter().map(LoadWarning::from).collect();
        let mut catalog = Self::new();

        for mut record in records {
            let key = record.key();
            if record.replaces.remove(&key) {
                warnings.push(LoadWarning::SelfReplacement { key: key.clone() });
            }
            if !catalog.insert(record) {
                warnings.push(LoadWarning::DuplicateRecord { key });
            }
        }

        for warning in &warnings {
            warn!(path = %path.display(), "{warning}");
        }
        debug!(
            records = catalog.len(),
            warnings = warnings.len(),
            "Loaded catalog from {}",
            path.display()
        );

        Ok((catalog, warnings))
    }
}

impl FromIterator<Record> for Catalog {
    /// Collects records, keeping the first record seen for each key.
    fn from_iter<I: IntoIterator<Item = Record>>(iter: I) -> Self {
        let mut catalog = Self::new();
        for record in iter {
            catalog.insert(record);
        }
        catalog
    }
}
