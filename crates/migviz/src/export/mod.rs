//! Graph export: a deterministic node/edge description of a built graph.
//!
//! Submodules:
//! - [`label`]: label transforms (plain and anonymizing)
//! - [`dot`]: Graphviz DOT source

pub mod dot;
pub mod label;

pub use dot::to_dot;
pub use label::{Anonymizer, LabelTransform, PlainLabels};

use crate::graph::MigrationGraph;
use serde::{Deserialize, Serialize};

/// One exported edge, drawn from a dependency to the record that needs it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportEdge {
    /// Label of the dependency.
    pub from: String,
    /// Label of the dependent record.
    pub to: String,
}

/// Node labels and edges of a graph, in export order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GraphExport {
    /// Node labels, in ascending key order.
    pub nodes: Vec<String>,
    /// Edges, ordered by dependent key then dependency key.
    pub edges: Vec<ExportEdge>,
}

/// Export `graph` with labels produced by `labels`.
///
/// Nodes are labelled before any edge, so a transform with state (such as
/// [`Anonymizer`]) assigns labels in node order no matter how edges are
/// laid out.
pub fn export(graph: &MigrationGraph, labels: &mut dyn LabelTransform) -> GraphExport {
    let nodes = graph.keys().iter().map(|key| labels.label(key)).collect();
    let edges = graph
        .edges()
        .iter()
        .map(|(dependent, dependency)| ExportEdge {
            from: labels.label(dependency),
            to: labels.label(dependent),
        })
        .collect();

    GraphExport { nodes, edges }
}
