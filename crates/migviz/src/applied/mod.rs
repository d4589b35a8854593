//! Applied-state lookup.
//!
//! The applied-state store records when each migration was applied. The
//! graph builder only ever asks one question of it: which records had been
//! applied strictly before a cutoff?
//!
//! # Availability
//!
//! A missing store is not an error. With no store configured, or a store
//! whose backing data does not exist yet, [`applied_as_of`] returns an empty
//! set, meaning "treat as a fresh, unmigrated system". Any other failure is
//! returned to the caller unchanged; nothing here retries.
//!
//! # Implementations
//!
//! - [`InMemoryAppliedStore`]: a fixed map, for tests and embedding
//! - [`JsonlAppliedStore`]: one `{"namespace","name","applied_at"}` object
//!   per line, re-read on every query

mod in_memory;
mod jsonl;

use crate::domain::RecordKey;
use crate::error::StoreError;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use tracing::debug;

pub use in_memory::InMemoryAppliedStore;
pub use jsonl::JsonlAppliedStore;

/// Records applied before some cutoff, with their applied-at timestamps.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AppliedSet {
    entries: BTreeMap<RecordKey, DateTime<Utc>>,
}

impl AppliedSet {
    /// Create an empty set
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `key` as applied at `applied_at`.
    ///
    /// If the key is already present the earlier timestamp is kept.
    pub fn insert(&mut self, key: RecordKey, applied_at: DateTime<Utc>) {
        self.entries
            .entry(key)
            .and_modify(|existing| *existing = (*existing).min(applied_at))
            .or_insert(applied_at);
    }

    /// Returns `true` if `key` is applied.
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.entries.contains_key(key)
    }

    /// When `key` was applied, if it was.
    pub fn applied_at(&self, key: &RecordKey) -> Option<DateTime<Utc>> {
        self.entries.get(key).copied()
    }

    /// Number of applied records.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns `true` if nothing is applied.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Applied keys in ascending order.
    pub fn keys(&self) -> impl Iterator<Item = &RecordKey> {
        self.entries.keys()
    }
}

impl FromIterator<(RecordKey, DateTime<Utc>)> for AppliedSet {
    fn from_iter<I: IntoIterator<Item = (RecordKey, DateTime<Utc>)>>(iter: I) -> Self {
        let mut set = Self::new();
        for (key, applied_at) in iter {
            set.insert(key, applied_at);
        }
        set
    }
}

/// Source of applied-state records.
///
/// Implementations must treat their data as a read-only snapshot so that
/// concurrent builds see consistent answers.
#[async_trait]
pub trait AppliedStateStore: Send + Sync {
    /// Every record whose applied-at timestamp is strictly earlier than
    /// `cutoff`.
    ///
    /// # Errors
    ///
    /// - `StoreError::Unavailable` if the store has no backing data
    /// - `StoreError::Read` if the backing data exists but cannot be read
    async fn applied_as_of(&self, cutoff: DateTime<Utc>) -> Result<AppliedSet, StoreError>;
}

/// Applied records as of `cutoff`, treating an absent store as empty.
///
/// # Errors
///
/// Returns `StoreError::Read` from the store unchanged. `Unavailable` is
/// never returned.
pub async fn applied_as_of(
    store: Option<&dyn AppliedStateStore>,
    cutoff: DateTime<Utc>,
) -> Result<AppliedSet, StoreError> {
    let Some(store) = store else {
        debug!("No applied-state store configured, treating system as unmigrated");
        return Ok(AppliedSet::new());
    };

    match store.applied_as_of(cutoff).await {
        Ok(applied) => {
            debug!(count = applied.len(), %cutoff, "Loaded applied state");
            Ok(applied)
        }
        Err(StoreError::Unavailable(reason)) => {
            debug!(%reason, "Applied-state store unavailable, treating system as unmigrated");
            Ok(AppliedSet::new())
        }
        Err(err) => Err(err),
    }
}
