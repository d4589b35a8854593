//! In-memory applied-state store.

use super::{AppliedSet, AppliedStateStore};
use crate::domain::{AppliedEntry, RecordKey};
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Applied-state store backed by a fixed list of entries.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppliedStore {
    entries: AppliedSet,
}

impl InMemoryAppliedStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as applied at `applied_at`.
    pub fn record(&mut self, key: impl Into<RecordKey>, applied_at: DateTime<Utc>) {
        self.entries.insert(key.into(), applied_at);
    }

    /// Builder-style variant of [`record`](Self::record).
    #[must_use]
    pub fn with(mut self, key: impl Into<RecordKey>, applied_at: DateTime<Utc>) -> Self {
        self.record(key, applied_at);
        self
    }
}

impl FromIterator<AppliedEntry> for InMemoryAppliedStore {
    fn from_iter<I: IntoIterator<Item = AppliedEntry>>(iter: I) -> Self {
        Self {
            entries: iter
                .into_iter()
                .map(|entry| (entry.key(), entry.applied_at))
                .collect(),
        }
    }
}

#[async_trait]
impl AppliedStateStore for InMemoryAppliedStore {
    async fn applied_as_of(&self, cutoff: DateTime<Utc>) -> Result<AppliedSet, StoreError> {
        Ok(self
            .entries
            .keys()
            .filter_map(|key| {
                self.entries
                    .applied_at(key)
                    .filter(|applied_at| *applied_at < cutoff)
                    .map(|applied_at| (key.clone(), applied_at))
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap()
    }

    #[tokio::test]
    async fn cutoff_is_exclusive() {
        let store = InMemoryAppliedStore::new()
            .with(("auth", "0001_initial"), at(1))
            .with(("auth", "0002_user"), at(2));

        let applied = store.applied_as_of(at(2)).await.unwrap();

        assert!(applied.contains(&RecordKey::new("auth", "0001_initial")));
        assert!(!applied.contains(&RecordKey::new("auth", "0002_user")));
    }

    #[tokio::test]
    async fn collects_from_entries() {
        let store: InMemoryAppliedStore = vec![AppliedEntry {
            namespace: "auth".to_string(),
            name: "0001_initial".to_string(),
            applied_at: at(1),
        }]
        .into_iter()
        .collect();

        let applied = store.applied_as_of(at(3)).await.unwrap();
        assert_eq!(applied.applied_at(&RecordKey::new("auth", "0001_initial")), Some(at(1)));
    }
}
