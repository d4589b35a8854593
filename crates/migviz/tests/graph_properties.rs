//! Graph building and export properties, exercised through the public API.

use chrono::{DateTime, Duration, Utc};
use migviz::applied::{AppliedSet, AppliedStateStore, InMemoryAppliedStore};
use migviz::catalog::Catalog;
use migviz::domain::{Record, RecordKey};
use migviz::error::{Error, GraphError};
use migviz::export::{export, to_dot, Anonymizer, LabelTransform, PlainLabels};
use migviz::graph::{GraphBuilder, MigrationGraph, ReplacementOutcome};
use proptest::prelude::*;
use std::collections::BTreeSet;

mod common;
use common::day;

fn key(namespace: &str, name: &str) -> RecordKey {
    RecordKey::new(namespace, name)
}

fn all_applied(catalog: &Catalog) -> AppliedSet {
    catalog.iter().map(|r| (r.key(), day(1))).collect()
}

fn build(catalog: &Catalog, applied: &AppliedSet) -> Result<MigrationGraph, GraphError> {
    GraphBuilder::new().build_from_applied(catalog, applied)
}

// ============================================================================
// Cutoff and basic shape
// ============================================================================

fn app_a() -> (Catalog, InMemoryAppliedStore) {
    let catalog = vec![
        Record::new("appA", "initial"),
        Record::new("appA", "add_field").depends_on(key("appA", "initial")),
    ]
    .into_iter()
    .collect();
    let store = InMemoryAppliedStore::new()
        .with(key("appA", "initial"), day(1))
        .with(key("appA", "add_field"), day(3));
    (catalog, store)
}

#[tokio::test]
async fn both_applied_gives_two_nodes_one_edge() {
    let (catalog, store) = app_a();

    let graph = GraphBuilder::new()
        .build(&catalog, Some(&store as &dyn AppliedStateStore), day(5))
        .await
        .unwrap();

    assert_eq!(graph.node_count(), 2);
    let exported = export(&graph, &mut PlainLabels);
    assert_eq!(exported.edges.len(), 1);
    assert_eq!(exported.edges[0].from, "appA/initial");
    assert_eq!(exported.edges[0].to, "appA/add_field");
}

#[tokio::test]
async fn cutoff_before_second_application_excludes_it() {
    let (catalog, store) = app_a();

    let graph = GraphBuilder::new()
        .build(&catalog, Some(&store as &dyn AppliedStateStore), day(2))
        .await
        .unwrap();

    assert_eq!(graph.keys(), vec![key("appA", "initial")]);
    assert_eq!(graph.edge_count(), 0);
}

#[tokio::test]
async fn cutoff_is_exclusive() {
    let (catalog, store) = app_a();

    let graph = GraphBuilder::new()
        .build(&catalog, Some(&store as &dyn AppliedStateStore), day(3))
        .await
        .unwrap();
    assert!(!graph.contains(&key("appA", "add_field")));

    let graph = GraphBuilder::new()
        .build(
            &catalog,
            Some(&store as &dyn AppliedStateStore),
            day(3) + Duration::seconds(1),
        )
        .await
        .unwrap();
    assert!(graph.contains(&key("appA", "add_field")));
}

#[tokio::test]
async fn missing_store_means_nothing_applied() {
    let (catalog, _) = app_a();

    let graph = GraphBuilder::new()
        .build(&catalog, None, Utc::now())
        .await
        .unwrap();

    assert_eq!(graph.node_count(), 0);
}

// ============================================================================
// Validation
// ============================================================================

#[test]
fn two_cycle_names_a_member() {
    let catalog: Catalog = vec![
        Record::new("app", "a").depends_on(key("app", "b")),
        Record::new("app", "b").depends_on(key("app", "a")),
    ]
    .into_iter()
    .collect();

    let err = build(&catalog, &all_applied(&catalog)).unwrap_err();

    let GraphError::Cyclic { entry, path } = err else {
        panic!("expected a cycle error");
    };
    assert!(entry == key("app", "a") || entry == key("app", "b"));
    assert_eq!(path.first(), Some(&entry));
    assert_eq!(path.last(), Some(&entry));
}

#[test]
fn dependency_on_unapplied_record_is_inconsistent() {
    let catalog: Catalog = vec![
        Record::new("auth", "0001_initial"),
        Record::new("shop", "0001_initial").depends_on(key("auth", "0001_initial")),
    ]
    .into_iter()
    .collect();
    let applied: AppliedSet = [(key("shop", "0001_initial"), day(1))].into_iter().collect();

    let err = build(&catalog, &applied).unwrap_err();

    assert!(err.is_inconsistent());
    assert_eq!(err.key(), &key("auth", "0001_initial"));
}

#[tokio::test]
async fn graph_errors_surface_through_the_crate_error() {
    let catalog: Catalog = vec![Record::new("app", "a").depends_on(key("app", "a"))]
        .into_iter()
        .collect();
    let store = InMemoryAppliedStore::new().with(key("app", "a"), day(1));

    let err = GraphBuilder::new()
        .build(&catalog, Some(&store as &dyn AppliedStateStore), day(2))
        .await
        .unwrap_err();

    assert!(matches!(err, Error::Graph(GraphError::Cyclic { .. })));
}

// ============================================================================
// Replacement
// ============================================================================

fn squashed_catalog() -> Catalog {
    vec![
        Record::new("app", "0001_initial"),
        Record::new("app", "0002_change").depends_on(key("app", "0001_initial")),
        Record::new("app", "0001_squashed")
            .replacing(key("app", "0001_initial"))
            .replacing(key("app", "0002_change")),
        Record::new("app", "0003_next").depends_on(key("app", "0002_change")),
        Record::new("other", "0001_initial").depends_on(key("app", "0001_initial")),
    ]
    .into_iter()
    .collect()
}

#[test]
fn replacement_totality() {
    let catalog = squashed_catalog();

    let graph = build(&catalog, &all_applied(&catalog)).unwrap();

    let squashed = key("app", "0001_squashed");
    assert!(graph.contains(&squashed));
    assert!(!graph.contains(&key("app", "0001_initial")));
    assert!(!graph.contains(&key("app", "0002_change")));
    assert_eq!(graph.dependencies(&key("app", "0003_next")), vec![squashed.clone()]);
    assert_eq!(
        graph.dependencies(&key("other", "0001_initial")),
        vec![squashed.clone()]
    );
    assert!(matches!(
        graph.replacements().get(&squashed),
        Some(ReplacementOutcome::Collapsed { .. })
    ));
}

#[test]
fn replacement_vacuity() {
    let catalog: Catalog = vec![
        Record::new("app", "0001_initial"),
        Record::new("app", "0002_change"),
        Record::new("app", "0001_squashed")
            .replacing(key("app", "0001_initial"))
            .replacing(key("app", "0002_change")),
    ]
    .into_iter()
    .collect();
    let applied: AppliedSet = [(key("app", "0001_squashed"), day(1))].into_iter().collect();

    let graph = build(&catalog, &applied).unwrap();

    assert_eq!(graph.node_count(), 0);
    assert_eq!(
        graph.replacements().get(&key("app", "0001_squashed")),
        Some(&ReplacementOutcome::RemovedVacuous)
    );
}

#[test]
fn disabled_replacement_keeps_every_record() {
    let catalog = squashed_catalog();

    let graph = GraphBuilder::new()
        .allow_replacement(false)
        .build_from_applied(&catalog, &all_applied(&catalog))
        .unwrap();

    assert_eq!(graph.node_count(), 5);
    assert!(graph.replacements().is_empty());
}

#[test]
fn partial_replacement_with_several_heads_is_inconsistent() {
    let squashed = key("app", "0001_squashed");
    let catalog: Catalog = vec![
        Record::new("app", "0001"),
        Record::new("app", "0002"),
        Record::new("app", "0003"),
        Record::new("app", "0001_squashed")
            .replacing(key("app", "0001"))
            .replacing(key("app", "0002"))
            .replacing(key("app", "0003")),
        Record::new("x", "0001").depends_on(squashed.clone()),
    ]
    .into_iter()
    .collect();
    let applied: AppliedSet = [
        (key("app", "0001"), day(1)),
        (key("app", "0002"), day(1)),
        (squashed.clone(), day(2)),
        (key("x", "0001"), day(3)),
    ]
    .into_iter()
    .collect();

    let err = build(&catalog, &applied).unwrap_err();

    assert_eq!(
        err,
        GraphError::Inconsistent {
            origin: key("x", "0001"),
            missing: squashed,
            replaced_by: BTreeSet::new(),
        }
    );
}

#[test]
fn unapplied_replacement_target_names_the_replacing_record() {
    let squashed = key("app", "0001_squashed");
    let catalog: Catalog = vec![
        Record::new("app", "0001"),
        Record::new("app", "0002").depends_on(key("app", "0001")),
        Record::new("app", "0001_squashed")
            .replacing(key("app", "0001"))
            .replacing(key("app", "0002")),
        Record::new("x", "0001").depends_on(key("app", "0002")),
    ]
    .into_iter()
    .collect();
    let applied: AppliedSet = [
        (key("app", "0001"), day(1)),
        (squashed.clone(), day(2)),
        (key("x", "0001"), day(3)),
    ]
    .into_iter()
    .collect();

    let err = build(&catalog, &applied).unwrap_err();

    assert_eq!(
        err,
        GraphError::Inconsistent {
            origin: key("x", "0001"),
            missing: key("app", "0002"),
            replaced_by: BTreeSet::from([squashed]),
        }
    );
    assert!(err.to_string().starts_with(
        "x.0001 depends on nonexistent record app.0002. It could have been replaced by any of \
         [app.0001_squashed]"
    ));
}

// ============================================================================
// Export properties
// ============================================================================

/// A catalog of `len` records in a few namespaces where each record may
/// depend on any earlier one, which can never form a cycle.
fn dag_catalog() -> impl Strategy<Value = Catalog> {
    (1usize..24).prop_flat_map(|len| {
        let namespaces = prop::collection::vec(0usize..3, len);
        let indices = prop::collection::vec(any::<prop::sample::Index>(), 0..3);
        let deps = prop::collection::vec(indices, len);
        (namespaces, deps).prop_map(|(namespaces, deps)| {
            let keys: Vec<RecordKey> = namespaces
                .iter()
                .enumerate()
                .map(|(i, ns)| key(&format!("ns{ns}"), &format!("{i:04}_step")))
                .collect();
            keys.iter()
                .enumerate()
                .map(|(i, k)| {
                    let mut record = Record::new(k.namespace.clone(), k.name.clone());
                    if i > 0 {
                        for index in &deps[i] {
                            record = record.depends_on(keys[index.index(i)].clone());
                        }
                    }
                    record
                })
                .collect()
        })
    })
}

proptest! {
    #[test]
    fn acyclic_applied_catalogs_build(catalog in dag_catalog()) {
        let graph = build(&catalog, &all_applied(&catalog)).unwrap();
        let expected: Vec<RecordKey> = catalog.iter().map(Record::key).collect();
        prop_assert_eq!(graph.keys(), expected);
    }

    #[test]
    fn export_is_deterministic(catalog in dag_catalog(), seed in any::<u64>()) {
        let graph = build(&catalog, &all_applied(&catalog)).unwrap();

        let plain = to_dot(&export(&graph, &mut PlainLabels), None);
        prop_assert_eq!(&plain, &to_dot(&export(&graph, &mut PlainLabels), None));

        let first = export(&graph, &mut Anonymizer::new(Some(seed)));
        let second = export(&graph, &mut Anonymizer::new(Some(seed)));
        prop_assert_eq!(first, second);
    }

    #[test]
    fn anonymized_labels_do_not_collide(
        names in prop::collection::btree_set("[a-z]{1,6}(_[a-z0-9]{1,4}){0,2}", 1..40),
        seed in any::<u64>(),
    ) {
        let mut anonymizer = Anonymizer::new(Some(seed));
        let labels: BTreeSet<String> = names
            .iter()
            .map(|name| anonymizer.label(&key("app", name)))
            .collect();
        prop_assert_eq!(labels.len(), names.len());
    }

    #[test]
    fn anonymization_preserves_topology(catalog in dag_catalog(), seed in any::<u64>()) {
        let graph = build(&catalog, &all_applied(&catalog)).unwrap();

        let plain = export(&graph, &mut PlainLabels);
        let anonymized = export(&graph, &mut Anonymizer::new(Some(seed)));

        prop_assert_eq!(plain.nodes.len(), anonymized.nodes.len());
        prop_assert_eq!(plain.edges.len(), anonymized.edges.len());
    }
}

#[test]
fn applied_timestamps_are_kept() {
    let at: DateTime<Utc> = day(4);
    let applied: AppliedSet = [(key("app", "a"), at), (key("app", "a"), day(2))]
        .into_iter()
        .collect();
    assert_eq!(applied.applied_at(&key("app", "a")), Some(day(2)));
}
