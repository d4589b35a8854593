//! Graphviz DOT source for an export.
//!
//! The layout mirrors what Graphviz tooling conventionally writes: an
//! optional `//` comment, then one statement per line inside `digraph { }`,
//! indented with a tab, nodes first and edges after.

use super::GraphExport;
use std::fmt::Write;

/// Render `export` as DOT source.
pub fn to_dot(export: &GraphExport, comment: Option<&str>) -> String {
    let mut out = String::new();

    if let Some(comment) = comment {
        for line in comment.lines() {
            let _ = writeln!(out, "// {line}");
        }
    }

    out.push_str("digraph {\n");
    for node in &export.nodes {
        let id = quote(node);
        let _ = writeln!(out, "\t{id} [label={id}]");
    }
    for edge in &export.edges {
        let _ = writeln!(out, "\t{} -> {}", quote(&edge.from), quote(&edge.to));
    }
    out.push_str("}\n");

    out
}

fn quote(id: &str) -> String {
    let mut quoted = String::with_capacity(id.len() + 2);
    quoted.push('"');
    for c in id.chars() {
        if matches!(c, '"' | '\\') {
            quoted.push('\\');
        }
        quoted.push(c);
    }
    quoted.push('"');
    quoted
}
