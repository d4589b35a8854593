//! Point-in-time graph construction.

use super::{replace, resolve, validate, MigrationGraph};
use crate::applied::{applied_as_of, AppliedSet, AppliedStateStore};
use crate::catalog::Catalog;
use crate::domain::Record;
use crate::error::{GraphError, Result};
use chrono::{DateTime, Utc};
use tracing::debug;

/// Builds a [`MigrationGraph`] of the records applied before a cutoff.
///
/// # Example
///
/// ```
/// # use migviz::applied::InMemoryAppliedStore;
/// # use migviz::catalog::Catalog;
/// # use migviz::domain::{Record, RecordKey};
/// # use migviz::graph::GraphBuilder;
/// # use chrono::{TimeZone, Utc};
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() -> migviz::error::Result<()> {
/// let catalog: Catalog = vec![
///     Record::new("app", "0001_initial"),
///     Record::new("app", "0002_add_field").depends_on(RecordKey::new("app", "0001_initial")),
/// ]
/// .into_iter()
/// .collect();
///
/// let store = InMemoryAppliedStore::new()
///     .with(("app", "0001_initial"), Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap())
///     .with(("app", "0002_add_field"), Utc.with_ymd_and_hms(2024, 2, 1, 0, 0, 0).unwrap());
///
/// let cutoff = Utc.with_ymd_and_hms(2024, 1, 15, 0, 0, 0).unwrap();
/// let graph = GraphBuilder::new().build(&catalog, Some(&store), cutoff).await?;
/// assert_eq!(graph.node_count(), 1);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphBuilder {
    allow_replacement: bool,
}

impl Default for GraphBuilder {
    fn default() -> Self {
        Self {
            allow_replacement: true,
        }
    }
}

impl GraphBuilder {
    /// Create a builder with replacement handling enabled
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable replacement handling.
    ///
    /// With replacement disabled, replacing and replaced records all stay in
    /// the graph as ordinary records.
    #[must_use]
    pub fn allow_replacement(mut self, allow: bool) -> Self {
        self.allow_replacement = allow;
        self
    }

    /// Fetch the applied state as of `cutoff`, then build.
    ///
    /// The store query is the only await point; everything after it is
    /// synchronous.
    ///
    /// # Errors
    ///
    /// - `Error::Store` if the store exists but cannot be read
    /// - `Error::Graph` if the applied records do not form a consistent DAG
    pub async fn build(
        &self,
        catalog: &Catalog,
        store: Option<&dyn AppliedStateStore>,
        cutoff: DateTime<Utc>,
    ) -> Result<MigrationGraph> {
        let applied = applied_as_of(store, cutoff).await?;
        Ok(self.build_from_applied(catalog, &applied)?)
    }

    /// Build from an already computed applied set.
    ///
    /// # Errors
    ///
    /// - `GraphError::UnresolvedMarker` for a `__first__`/`__latest__`
    ///   dependency on a namespace with no applied records
    /// - `GraphError::Inconsistent` for a dependency on a record that is not
    ///   in the graph
    /// - `GraphError::Cyclic` if the dependencies form a cycle
    pub fn build_from_applied(
        &self,
        catalog: &Catalog,
        applied: &AppliedSet,
    ) -> std::result::Result<MigrationGraph, GraphError> {
        let records: Vec<&Record> = catalog
            .iter()
            .filter(|record| applied.contains(&record.key()))
            .collect();
        debug!(
            catalog = catalog.len(),
            applied = records.len(),
            "Filtered catalog to applied records"
        );

        let mut graph = MigrationGraph::default();
        let mut candidates = Vec::new();
        for record in &records {
            graph.add_record(record.key());
            if record.is_replacement() {
                candidates.push(*record);
            }
        }

        resolve::add_internal_dependencies(&mut graph, &records);
        resolve::add_external_dependencies(&mut graph, &records)?;

        if self.allow_replacement {
            replace::apply_replacements(&mut graph, &candidates, applied);
        }

        validate::validate_consistency(&graph, &candidates)?;
        validate::ensure_acyclic(&graph)?;

        debug!(
            nodes = graph.node_count(),
            edges = graph.edge_count(),
            "Built migration graph"
        );
        Ok(graph)
    }
}
