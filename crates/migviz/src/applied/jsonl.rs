//! Applied-state store backed by a JSONL file.

use super::{AppliedSet, AppliedStateStore};
use crate::domain::AppliedEntry;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use migviz_jsonl::read_jsonl;
use std::path::{Path, PathBuf};

/// Applied-state store reading `{"namespace","name","applied_at"}` lines.
///
/// The file is read strictly on every query: a single malformed line fails
/// the whole read, since silently skipping an applied record would change
/// which records the graph contains. A missing file means the store has not
/// been created yet and is reported as `StoreError::Unavailable`.
#[derive(Debug, Clone)]
pub struct JsonlAppliedStore {
    path: PathBuf,
}

impl JsonlAppliedStore {
    /// Create a store reading from `path`
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Path of the backing file.
    pub fn path(&self) -> &Path {
        &self.path
    }
}

#[async_trait]
impl AppliedStateStore for JsonlAppliedStore {
    async fn applied_as_of(&self, cutoff: DateTime<Utc>) -> Result<AppliedSet, StoreError> {
        let entries: Vec<AppliedEntry> = match read_jsonl(&self.path).await {
            Ok(entries) => entries,
            Err(e) if e.is_not_found() => {
                return Err(StoreError::Unavailable(format!(
                    "{} does not exist",
                    self.path.display()
                )));
            }
            Err(e) => return Err(StoreError::Read(e)),
        };

        Ok(entries
            .into_iter()
            .filter(|entry| entry.applied_at < cutoff)
            .map(|entry| (entry.key(), entry.applied_at))
            .collect())
    }
}
