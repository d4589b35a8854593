//! Dependency edge resolution.
//!
//! Edges are added in two passes. The internal pass adds every concrete
//! same-namespace dependency, which fixes each namespace's roots and leaves.
//! The external pass then adds cross-namespace dependencies, resolving
//! `__first__`/`__latest__` markers against those now-stable sets. Cross-
//! namespace edges never change a namespace's own roots or leaves, so the
//! order records are visited in within a pass does not matter.
//!
//! A symbolic marker pointing at its own namespace is ignored: a record
//! cannot meaningfully depend on the first or latest record of the namespace
//! it belongs to.

use super::MigrationGraph;
use crate::domain::{DependencyRef, Record, RecordKey};
use crate::error::GraphError;
use tracing::debug;

/// Add every concrete dependency between records of the same namespace.
pub(super) fn add_internal_dependencies(graph: &mut MigrationGraph, records: &[&Record]) {
    for record in records {
        let key = record.key();
        for dependency in &record.dependencies {
            if let DependencyRef::Key(target) = dependency {
                if target.namespace == key.namespace {
                    graph.add_dependency(&key, target);
                }
            }
        }
    }
}

/// Add every cross-namespace dependency, resolving symbolic markers.
///
/// # Errors
///
/// Returns `GraphError::UnresolvedMarker` if a marker names a namespace
/// with no root (for `__first__`) or leaf (for `__latest__`) in the graph.
pub(super) fn add_external_dependencies(
    graph: &mut MigrationGraph,
    records: &[&Record],
) -> Result<(), GraphError> {
    for record in records {
        let key = record.key();
        for dependency in &record.dependencies {
            if dependency.namespace() == key.namespace {
                continue;
            }
            let target = resolve(graph, &key, dependency)?;
            graph.add_dependency(&key, &target);
        }
    }
    Ok(())
}

/// Resolve a dependency to a concrete key.
fn resolve(
    graph: &MigrationGraph,
    origin: &RecordKey,
    dependency: &DependencyRef,
) -> Result<RecordKey, GraphError> {
    let candidates = match dependency {
        DependencyRef::Key(key) => return Ok(key.clone()),
        DependencyRef::First(namespace) => graph.roots(namespace),
        DependencyRef::Latest(namespace) => graph.leaves(namespace),
    };

    let resolved = candidates
        .into_iter()
        .next()
        .ok_or_else(|| GraphError::UnresolvedMarker {
            origin: origin.clone(),
            dependency: dependency.clone(),
        })?;
    debug!(%origin, %dependency, %resolved, "Resolved symbolic dependency");
    Ok(resolved)
}
