//! The migration dependency graph.
//!
//! # Edge Direction
//!
//! Edges point from **dependent to dependency**: `A -> B` means A depends on
//! B and must be applied after it. Exports flip this around and list each
//! edge as `(dependency, dependent)`.
//!
//! # Placeholder Nodes
//!
//! While edges are being added, a dependency on a record that is not in the
//! graph creates a *placeholder* node for the missing key instead of failing
//! immediately. Replacement handling may still rewire those edges onto a
//! replacing record. Any placeholder that is still referenced after
//! replacement handling is reported by validation as a dangling reference,
//! and placeholders left without dependents are pruned. A successfully
//! built graph contains no placeholders.
//!
//! Removed nodes leave holes in the index space, so the graph uses petgraph's
//! `StableDiGraph`, which keeps the remaining indices valid.

mod builder;
mod replace;
mod resolve;
mod validate;

pub use builder::GraphBuilder;
pub use replace::ReplacementOutcome;

use crate::domain::RecordKey;
use petgraph::stable_graph::{NodeIndex, StableDiGraph};
use petgraph::visit::EdgeRef;
use petgraph::Direction;
use std::collections::{BTreeMap, HashMap};

/// Whether a node stands for a record in the graph or only for a key that
/// something depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum NodeKind {
    Real,
    Placeholder,
}

#[derive(Debug, Clone)]
pub(crate) struct Node {
    pub(crate) key: RecordKey,
    pub(crate) kind: NodeKind,
}

/// A validated, acyclic migration dependency graph.
///
/// Built fresh by [`GraphBuilder`] for every query and never mutated
/// afterwards.
#[derive(Debug, Clone, Default)]
pub struct MigrationGraph {
    /// Edge direction: source (dependent) -> target (dependency).
    graph: StableDiGraph<Node, ()>,

    /// Every node in `graph`, real or placeholder, by key.
    node_map: HashMap<RecordKey, NodeIndex>,

    /// What replacement handling did with each replacing record.
    replacements: BTreeMap<RecordKey, ReplacementOutcome>,
}

impl MigrationGraph {
    /// Number of records in the graph.
    pub fn node_count(&self) -> usize {
        self.real_nodes().count()
    }

    /// Number of dependency edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// Returns `true` if `key` is a record in the graph.
    pub fn contains(&self, key: &RecordKey) -> bool {
        self.real_index(key).is_some()
    }

    /// Record keys in ascending order.
    pub fn keys(&self) -> Vec<RecordKey> {
        let mut keys: Vec<RecordKey> = self.real_nodes().map(|node| node.key.clone()).collect();
        keys.sort();
        keys
    }

    /// Direct dependencies of `key`, ascending. Empty if `key` is absent.
    pub fn dependencies(&self, key: &RecordKey) -> Vec<RecordKey> {
        self.neighbor_keys(key, Direction::Outgoing)
    }

    /// All edges as `(dependent, dependency)`, ordered by dependent then
    /// dependency.
    pub fn edges(&self) -> Vec<(RecordKey, RecordKey)> {
        let mut edges: Vec<(RecordKey, RecordKey)> = self
            .graph
            .edge_indices()
            .filter_map(|edge| self.graph.edge_endpoints(edge))
            .map(|(source, target)| {
                (
                    self.graph[source].key.clone(),
                    self.graph[target].key.clone(),
                )
            })
            .collect();
        edges.sort();
        edges
    }

    /// Records of `namespace` with no dependency inside `namespace`,
    /// ascending.
    pub fn roots(&self, namespace: &str) -> Vec<RecordKey> {
        self.namespace_boundary(namespace, Direction::Outgoing)
    }

    /// Records of `namespace` with no dependent inside `namespace`,
    /// ascending.
    pub fn leaves(&self, namespace: &str) -> Vec<RecordKey> {
        self.namespace_boundary(namespace, Direction::Incoming)
    }

    /// Replacement outcomes, keyed by replacing record.
    pub fn replacements(&self) -> &BTreeMap<RecordKey, ReplacementOutcome> {
        &self.replacements
    }

    // ------------------------------------------------------------------
    // Construction helpers used by the builder passes
    // ------------------------------------------------------------------

    pub(crate) fn add_record(&mut self, key: RecordKey) -> NodeIndex {
        let index = self.graph.add_node(Node {
            key: key.clone(),
            kind: NodeKind::Real,
        });
        self.node_map.insert(key, index);
        index
    }

    /// Add `dependent -> dependency`, creating a placeholder for a missing
    /// dependency. `dependent` must already be a record in the graph.
    pub(crate) fn add_dependency(&mut self, dependent: &RecordKey, dependency: &RecordKey) {
        let Some(&source) = self.node_map.get(dependent) else {
            return;
        };
        let target = match self.node_map.get(dependency) {
            Some(&index) => index,
            None => {
                let index = self.graph.add_node(Node {
                    key: dependency.clone(),
                    kind: NodeKind::Placeholder,
                });
                self.node_map.insert(dependency.clone(), index);
                index
            }
        };
        self.graph.update_edge(source, target, ());
    }

    pub(crate) fn index_of(&self, key: &RecordKey) -> Option<NodeIndex> {
        self.node_map.get(key).copied()
    }

    pub(crate) fn real_index(&self, key: &RecordKey) -> Option<NodeIndex> {
        self.index_of(key)
            .filter(|&index| self.graph[index].kind == NodeKind::Real)
    }

    pub(crate) fn node(&self, index: NodeIndex) -> &Node {
        &self.graph[index]
    }

    /// Neighbor indices of `index` in `direction`, in ascending key order.
    pub(crate) fn sorted_neighbors(
        &self,
        index: NodeIndex,
        direction: Direction,
    ) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> =
            self.graph.neighbors_directed(index, direction).collect();
        neighbors.sort_by(|a, b| self.graph[*a].key.cmp(&self.graph[*b].key));
        neighbors.dedup();
        neighbors
    }

    /// All node indices in ascending key order, placeholders included.
    pub(crate) fn sorted_indices(&self) -> Vec<NodeIndex> {
        let mut indices: Vec<NodeIndex> = self.graph.node_indices().collect();
        indices.sort_by(|a, b| self.graph[*a].key.cmp(&self.graph[*b].key));
        indices
    }

    pub(crate) fn remove_node(&mut self, index: NodeIndex) {
        if let Some(node) = self.graph.remove_node(index) {
            self.node_map.remove(&node.key);
        }
    }

    /// Turn a record into a placeholder: its own dependencies are dropped
    /// and anything still depending on it becomes a dangling reference. A
    /// node nothing depends on is removed outright.
    pub(crate) fn demote_to_placeholder(&mut self, index: NodeIndex) {
        let outgoing: Vec<_> = self
            .graph
            .edges_directed(index, Direction::Outgoing)
            .map(|edge| edge.id())
            .collect();
        for edge in outgoing {
            self.graph.remove_edge(edge);
        }

        let has_dependents = self
            .graph
            .neighbors_directed(index, Direction::Incoming)
            .next()
            .is_some();
        if has_dependents {
            self.graph[index].kind = NodeKind::Placeholder;
        } else {
            self.remove_node(index);
        }
    }

    /// Remove placeholders nothing depends on any more.
    pub(crate) fn prune_orphan_placeholders(&mut self) {
        let orphans: Vec<NodeIndex> = self
            .graph
            .node_indices()
            .filter(|&index| self.graph[index].kind == NodeKind::Placeholder)
            .filter(|&index| {
                self.graph
                    .neighbors_directed(index, Direction::Incoming)
                    .next()
                    .is_none()
            })
            .collect();
        for index in orphans {
            self.remove_node(index);
        }
    }

    pub(crate) fn add_edge_by_index(&mut self, dependent: NodeIndex, dependency: NodeIndex) {
        if dependent != dependency {
            self.graph.update_edge(dependent, dependency, ());
        }
    }

    pub(crate) fn record_replacement(&mut self, replacing: RecordKey, outcome: ReplacementOutcome) {
        self.replacements.insert(replacing, outcome);
    }

    fn real_nodes(&self) -> impl Iterator<Item = &Node> {
        self.graph
            .node_indices()
            .map(|index| &self.graph[index])
            .filter(|node| node.kind == NodeKind::Real)
    }

    fn neighbor_keys(&self, key: &RecordKey, direction: Direction) -> Vec<RecordKey> {
        let Some(index) = self.real_index(key) else {
            return Vec::new();
        };
        self.sorted_neighbors(index, direction)
            .into_iter()
            .filter(|&n| self.graph[n].kind == NodeKind::Real)
            .map(|n| self.graph[n].key.clone())
            .collect()
    }

    /// Real nodes of `namespace` with no neighbor in `namespace` in the given
    /// direction. Placeholders count as neighbors, so a record depending on a
    /// missing same-namespace record is not a root.
    fn namespace_boundary(&self, namespace: &str, direction: Direction) -> Vec<RecordKey> {
        let mut keys: Vec<RecordKey> = self
            .graph
            .node_indices()
            .filter(|&index| {
                let node = &self.graph[index];
                node.kind == NodeKind::Real && node.key.namespace == namespace
            })
            .filter(|&index| {
                !self
                    .graph
                    .neighbors_directed(index, direction)
                    .any(|n| self.graph[n].key.namespace == namespace)
            })
            .map(|index| self.graph[index].key.clone())
            .collect();
        keys.sort();
        keys
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ns: &str, name: &str) -> RecordKey {
        RecordKey::new(ns, name)
    }

    fn chain() -> MigrationGraph {
        let mut graph = MigrationGraph::default();
        graph.add_record(key("auth", "0001"));
        graph.add_record(key("auth", "0002"));
        graph.add_record(key("auth", "0003"));
        graph.add_dependency(&key("auth", "0002"), &key("auth", "0001"));
        graph.add_dependency(&key("auth", "0003"), &key("auth", "0002"));
        graph
    }

    #[test]
    fn roots_and_leaves_of_a_chain() {
        let graph = chain();
        assert_eq!(graph.roots("auth"), vec![key("auth", "0001")]);
        assert_eq!(graph.leaves("auth"), vec![key("auth", "0003")]);
        assert!(graph.roots("shop").is_empty());
    }

    #[test]
    fn missing_dependency_becomes_placeholder() {
        let mut graph = chain();
        graph.add_dependency(&key("auth", "0001"), &key("core", "0001"));

        assert_eq!(graph.node_count(), 3);
        assert!(!graph.contains(&key("core", "0001")));
        assert!(graph.index_of(&key("core", "0001")).is_some());
        // Placeholders are not dependencies of the public view.
        assert!(graph.dependencies(&key("auth", "0001")).is_empty());
    }

    #[test]
    fn duplicate_edges_collapse() {
        let mut graph = chain();
        graph.add_dependency(&key("auth", "0002"), &key("auth", "0001"));
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn demoting_a_node_without_dependents_removes_it() {
        let mut graph = chain();
        let leaf = graph.index_of(&key("auth", "0003")).unwrap();
        graph.demote_to_placeholder(leaf);

        assert_eq!(graph.node_count(), 2);
        assert!(graph.index_of(&key("auth", "0003")).is_none());
        assert_eq!(graph.edge_count(), 1);
    }

    #[test]
    fn pruning_drops_only_unreferenced_placeholders() {
        let mut graph = chain();
        graph.add_dependency(&key("auth", "0003"), &key("core", "0001"));
        graph.add_dependency(&key("auth", "0002"), &key("core", "0002"));
        let middle = graph.index_of(&key("auth", "0002")).unwrap();
        graph.demote_to_placeholder(middle);

        graph.prune_orphan_placeholders();

        assert!(graph.index_of(&key("core", "0001")).is_some());
        assert!(graph.index_of(&key("core", "0002")).is_none());
        assert!(graph.index_of(&key("auth", "0002")).is_some());
    }

    #[test]
    fn demoting_a_depended_on_node_keeps_a_placeholder() {
        let mut graph = chain();
        let middle = graph.index_of(&key("auth", "0002")).unwrap();
        graph.demote_to_placeholder(middle);

        assert!(!graph.contains(&key("auth", "0002")));
        assert_eq!(graph.edges(), vec![(key("auth", "0003"), key("auth", "0002"))]);
    }
}
