//! Post-construction checks: no dangling references, no cycles.

use super::{MigrationGraph, NodeKind};
use crate::domain::{Record, RecordKey};
use crate::error::GraphError;
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// Fail on the first placeholder (ascending key order) that something still
/// depends on.
///
/// When the missing key is a target of replacing records none of which made
/// it into the graph, the error names those records: the usual cause is a
/// squash that could not be used because it was only partly applied.
pub(super) fn validate_consistency(
    graph: &MigrationGraph,
    candidates: &[&Record],
) -> Result<(), GraphError> {
    for index in graph.sorted_indices() {
        let node = graph.node(index);
        if node.kind != NodeKind::Placeholder {
            continue;
        }
        let Some(&origin) = graph.sorted_neighbors(index, Direction::Incoming).first() else {
            continue;
        };

        let replaced_by = reverse_replacements(candidates)
            .remove(&node.key)
            .filter(|replacing| !replacing.iter().any(|key| graph.contains(key)))
            .unwrap_or_default();

        return Err(GraphError::Inconsistent {
            origin: graph.node(origin).key.clone(),
            missing: node.key.clone(),
            replaced_by,
        });
    }
    Ok(())
}

fn reverse_replacements(candidates: &[&Record]) -> BTreeMap<RecordKey, BTreeSet<RecordKey>> {
    let mut reverse: BTreeMap<RecordKey, BTreeSet<RecordKey>> = BTreeMap::new();
    for record in candidates {
        for replaced in &record.replaces {
            reverse
                .entry(replaced.clone())
                .or_default()
                .insert(record.key());
        }
    }
    reverse
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Visit {
    OnStack,
    Done,
}

/// Depth-first cycle check.
///
/// Start nodes and dependencies are visited in ascending key order, so the
/// reported cycle is the same on every run. The error names the node the
/// traversal re-entered and the path from it back to itself.
pub(super) fn ensure_acyclic(graph: &MigrationGraph) -> Result<(), GraphError> {
    let mut visits: HashMap<NodeIndex, Visit> = HashMap::new();

    for start in graph.sorted_indices() {
        if visits.contains_key(&start) {
            continue;
        }

        // Each frame holds a node and its unvisited dependencies, reversed
        // so that `pop` yields them in ascending order.
        let mut stack: Vec<(NodeIndex, Vec<NodeIndex>)> = vec![(start, pending(graph, start))];
        visits.insert(start, Visit::OnStack);

        while let Some((node, dependencies)) = stack.last_mut() {
            let node = *node;
            match dependencies.pop() {
                Some(next) => match visits.get(&next) {
                    Some(Visit::OnStack) => {
                        let entry = stack
                            .iter()
                            .position(|(n, _)| *n == next)
                            .unwrap_or_default();
                        let mut path: Vec<RecordKey> = stack[entry..]
                            .iter()
                            .map(|(n, _)| graph.node(*n).key.clone())
                            .collect();
                        path.push(graph.node(next).key.clone());
                        return Err(GraphError::Cyclic {
                            entry: graph.node(next).key.clone(),
                            path,
                        });
                    }
                    Some(Visit::Done) => {}
                    None => {
                        visits.insert(next, Visit::OnStack);
                        stack.push((next, pending(graph, next)));
                    }
                },
                None => {
                    visits.insert(node, Visit::Done);
                    stack.pop();
                }
            }
        }
    }
    Ok(())
}

fn pending(graph: &MigrationGraph, index: NodeIndex) -> Vec<NodeIndex> {
    let mut dependencies = graph.sorted_neighbors(index, Direction::Outgoing);
    dependencies.reverse();
    dependencies
}

#[cfg(test)]
mod tests {
    use super::*;

    fn key(ns: &str, name: &str) -> RecordKey {
        RecordKey::new(ns, name)
    }

    fn graph_with(nodes: &[RecordKey], edges: &[(RecordKey, RecordKey)]) -> MigrationGraph {
        let mut graph = MigrationGraph::default();
        for node in nodes {
            graph.add_record(node.clone());
        }
        for (dependent, dependency) in edges {
            graph.add_dependency(dependent, dependency);
        }
        graph
    }

    #[test]
    fn two_cycle_is_reported_from_lowest_key() {
        let a = key("app", "a");
        let b = key("app", "b");
        let graph = graph_with(
            &[a.clone(), b.clone()],
            &[(a.clone(), b.clone()), (b.clone(), a.clone())],
        );

        let err = ensure_acyclic(&graph).unwrap_err();
        assert_eq!(
            err,
            GraphError::Cyclic {
                entry: a.clone(),
                path: vec![a.clone(), b, a],
            }
        );
    }

    #[test]
    fn diamond_is_acyclic() {
        let [a, b, c, d] = ["a", "b", "c", "d"].map(|n| key("app", n));
        let graph = graph_with(
            &[a.clone(), b.clone(), c.clone(), d.clone()],
            &[
                (b.clone(), a.clone()),
                (c.clone(), a.clone()),
                (d.clone(), b),
                (d, c),
            ],
        );

        assert!(ensure_acyclic(&graph).is_ok());
    }

    #[test]
    fn cycle_entry_is_the_reentered_node() {
        // a -> b -> c -> b: the traversal starts at app.a and re-enters at app.b.
        let [a, b, c] = ["a", "b", "c"].map(|n| key("app", n));
        let graph = graph_with(
            &[a.clone(), b.clone(), c.clone()],
            &[(a, b.clone()), (b.clone(), c.clone()), (c.clone(), b.clone())],
        );

        let GraphError::Cyclic { entry, path } = ensure_acyclic(&graph).unwrap_err() else {
            panic!("expected a cycle");
        };
        assert_eq!(entry, b);
        assert_eq!(path, vec![b.clone(), c, b]);
    }

    #[test]
    fn dangling_reference_names_origin_and_missing_key() {
        let graph = graph_with(
            &[key("shop", "0001")],
            &[(key("shop", "0001"), key("auth", "0001"))],
        );

        let err = validate_consistency(&graph, &[]).unwrap_err();
        assert_eq!(
            err,
            GraphError::Inconsistent {
                origin: key("shop", "0001"),
                missing: key("auth", "0001"),
                replaced_by: BTreeSet::new(),
            }
        );
    }

    #[test]
    fn dangling_reference_hints_at_unused_replacement() {
        let squash = Record::new("auth", "0001_squashed_0002").replacing(("auth", "0002"));
        let graph = graph_with(
            &[key("shop", "0001")],
            &[(key("shop", "0001"), key("auth", "0002"))],
        );

        let err = validate_consistency(&graph, &[&squash]).unwrap_err();
        assert!(matches!(
            err,
            GraphError::Inconsistent { ref replaced_by, .. } if replaced_by.contains(&squash.key())
        ));
    }
}
