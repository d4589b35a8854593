//! Replacement (squash) handling.
//!
//! A replacing record R supersedes a set of replaced records T. What happens
//! to R depends on how much of T is applied:
//!
//! | Applied members of T | Outcome                                        |
//! |----------------------|------------------------------------------------|
//! | all                  | T folded into R, edges into T redirected to R  |
//! | none                 | R removed, nothing rewired                     |
//! | some                 | R removed, T left as is                        |
//!
//! In the partial case, records that depended on R are handed to the latest
//! applied member of T when there is exactly one. When the applied members
//! have several heads there is no single record to hand them to, so R is
//! left as a dangling reference and validation rejects the graph.

use super::MigrationGraph;
use crate::applied::AppliedSet;
use crate::domain::{Record, RecordKey};
use petgraph::stable_graph::NodeIndex;
use petgraph::Direction;
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// What replacement handling did with one replacing record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum ReplacementOutcome {
    /// Every replaced record was applied and has been folded into the
    /// replacing record.
    Collapsed {
        /// The records folded away.
        replaced: BTreeSet<RecordKey>,
    },

    /// No replaced record was applied; the replacing record was removed.
    RemovedVacuous,

    /// Only some replaced records were applied; the replacing record was
    /// removed and the replaced records kept.
    RemovedPartial {
        /// Replaced records that were applied.
        applied: BTreeSet<RecordKey>,
        /// Replaced records that were not.
        unapplied: BTreeSet<RecordKey>,
    },
}

impl ReplacementOutcome {
    /// Returns `true` if the replacing record stays in the graph.
    pub fn keeps_replacing(&self) -> bool {
        matches!(self, Self::Collapsed { .. })
    }

    /// Short name of the outcome.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Collapsed { .. } => "collapsed",
            Self::RemovedVacuous => "removed (nothing applied)",
            Self::RemovedPartial { .. } => "removed (partially applied)",
        }
    }
}

/// Apply every replacement candidate in order.
pub(super) fn apply_replacements(
    graph: &mut MigrationGraph,
    candidates: &[&Record],
    applied: &AppliedSet,
) {
    for record in candidates {
        let replacing = record.key();
        let Some(index) = graph.real_index(&replacing) else {
            debug!(%replacing, "Replacing record already folded away, skipping");
            continue;
        };

        let (applied_targets, unapplied): (BTreeSet<RecordKey>, BTreeSet<RecordKey>) = record
            .replaces
            .iter()
            .cloned()
            .partition(|target| applied.contains(target));

        let outcome = if unapplied.is_empty() {
            collapse(graph, index, &record.replaces);
            ReplacementOutcome::Collapsed {
                replaced: applied_targets,
            }
        } else if applied_targets.is_empty() {
            graph.demote_to_placeholder(index);
            ReplacementOutcome::RemovedVacuous
        } else {
            remove_partial(graph, index, &record.replaces);
            ReplacementOutcome::RemovedPartial {
                applied: applied_targets,
                unapplied,
            }
        };

        debug!(%replacing, outcome = outcome.as_str(), "Handled replacement");
        graph.record_replacement(replacing, outcome);
    }
    graph.prune_orphan_placeholders();
}

/// Fold every node of `targets` into `replacing`.
///
/// Placeholders are folded too: a replaced record that is applied but no
/// longer in the catalog is exactly what a replacing record stands in for.
fn collapse(graph: &mut MigrationGraph, replacing: NodeIndex, targets: &BTreeSet<RecordKey>) {
    for target in targets {
        let Some(index) = graph.index_of(target) else {
            continue;
        };
        if index == replacing {
            continue;
        }

        for dependent in graph.sorted_neighbors(index, Direction::Incoming) {
            if !targets.contains(&graph.node(dependent).key) {
                graph.add_edge_by_index(dependent, replacing);
            }
        }
        for dependency in graph.sorted_neighbors(index, Direction::Outgoing) {
            if !targets.contains(&graph.node(dependency).key) {
                graph.add_edge_by_index(replacing, dependency);
            }
        }
        graph.remove_node(index);
    }
}

/// Remove a partially applied replacing record.
fn remove_partial(graph: &mut MigrationGraph, replacing: NodeIndex, targets: &BTreeSet<RecordKey>) {
    let present: Vec<NodeIndex> = targets
        .iter()
        .filter_map(|target| graph.real_index(target))
        .collect();
    let heads: Vec<NodeIndex> = present
        .iter()
        .copied()
        .filter(|&target| {
            !graph
                .sorted_neighbors(target, Direction::Incoming)
                .iter()
                .any(|dependent| present.contains(dependent))
        })
        .collect();

    if let [head] = heads.as_slice() {
        for dependent in graph.sorted_neighbors(replacing, Direction::Incoming) {
            graph.add_edge_by_index(dependent, *head);
        }
        graph.remove_node(replacing);
    } else {
        graph.demote_to_placeholder(replacing);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn key(ns: &str, name: &str) -> RecordKey {
        RecordKey::new(ns, name)
    }

    fn applied(keys: &[RecordKey]) -> AppliedSet {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        keys.iter().map(|k| (k.clone(), at)).collect()
    }

    /// auth.0001 <- auth.0002 <- shop.0001, plus squash auth.0001_squashed_0002.
    fn squash_fixture() -> (MigrationGraph, Record) {
        let squash = Record::new("auth", "0001_squashed_0002")
            .replacing(("auth", "0001"))
            .replacing(("auth", "0002"));

        let mut graph = MigrationGraph::default();
        for k in [
            key("auth", "0001"),
            key("auth", "0002"),
            key("auth", "0001_squashed_0002"),
            key("shop", "0001"),
        ] {
            graph.add_record(k);
        }
        graph.add_dependency(&key("auth", "0002"), &key("auth", "0001"));
        graph.add_dependency(&key("shop", "0001"), &key("auth", "0002"));
        (graph, squash)
    }

    #[test]
    fn fully_applied_targets_collapse_into_replacing_record() {
        let (mut graph, squash) = squash_fixture();
        let applied = applied(&[key("auth", "0001"), key("auth", "0002")]);

        apply_replacements(&mut graph, &[&squash], &applied);

        assert_eq!(
            graph.keys(),
            vec![key("auth", "0001_squashed_0002"), key("shop", "0001")]
        );
        assert_eq!(
            graph.edges(),
            vec![(key("shop", "0001"), key("auth", "0001_squashed_0002"))]
        );
        assert!(graph.replacements()[&squash.key()].keeps_replacing());
    }

    #[test]
    fn collapse_absorbs_placeholders_for_deleted_targets() {
        let squash = Record::new("auth", "0001_squashed_0002")
            .replacing(("auth", "0001"))
            .replacing(("auth", "0002"));
        let mut graph = MigrationGraph::default();
        graph.add_record(squash.key());
        graph.add_record(key("shop", "0001"));
        graph.add_dependency(&key("shop", "0001"), &key("auth", "0002"));

        apply_replacements(
            &mut graph,
            &[&squash],
            &applied(&[key("auth", "0001"), key("auth", "0002")]),
        );

        assert_eq!(
            graph.edges(),
            vec![(key("shop", "0001"), key("auth", "0001_squashed_0002"))]
        );
    }

    #[test]
    fn nothing_applied_removes_replacing_record() {
        let (mut graph, squash) = squash_fixture();

        apply_replacements(&mut graph, &[&squash], &applied(&[]));

        assert!(!graph.contains(&squash.key()));
        assert_eq!(graph.node_count(), 3);
        assert_eq!(
            graph.replacements()[&squash.key()],
            ReplacementOutcome::RemovedVacuous
        );
    }

    #[test]
    fn removed_partial_replacement_leaves_no_orphan_placeholder() {
        let (mut graph, squash) = squash_fixture();
        graph.add_dependency(&squash.key(), &key("core", "0001"));

        apply_replacements(&mut graph, &[&squash], &applied(&[key("auth", "0001")]));

        assert!(graph.index_of(&key("core", "0001")).is_none());
        assert!(graph.index_of(&squash.key()).is_none());
        assert_eq!(graph.edge_count(), 2);
    }

    #[test]
    fn partial_application_keeps_replaced_records() {
        let (mut graph, squash) = squash_fixture();
        graph.add_record(key("billing", "0001"));
        graph.add_dependency(&key("billing", "0001"), &squash.key());

        apply_replacements(&mut graph, &[&squash], &applied(&[key("auth", "0001")]));

        assert!(!graph.contains(&squash.key()));
        assert!(graph.contains(&key("auth", "0001")));
        assert!(graph.contains(&key("auth", "0002")));
        // auth.0002 still depends on auth.0001, so auth.0002 is the single head.
        assert_eq!(
            graph.dependencies(&key("billing", "0001")),
            vec![key("auth", "0002")]
        );
        assert!(matches!(
            graph.replacements()[&squash.key()],
            ReplacementOutcome::RemovedPartial { .. }
        ));
    }
}
