//! Migviz - point-in-time migration dependency graphs.
//!
//! Given a catalog of migration records and an applied-state store, migviz
//! builds the dependency graph of the records applied before a cutoff,
//! folds fully applied squashes into their replacement, validates the
//! result, and exports it as Graphviz DOT or JSON.
//!
//! The pipeline, in library terms:
//!
//! 1. [`catalog::Catalog`] holds the declared records.
//! 2. [`applied::applied_as_of`] asks an [`applied::AppliedStateStore`] what
//!    was applied before the cutoff.
//! 3. [`graph::GraphBuilder`] builds and validates a
//!    [`graph::MigrationGraph`].
//! 4. [`export::export`] labels it, optionally anonymized, and
//!    [`export::to_dot`] turns that into DOT source.
//! 5. [`snapshot::SnapshotStore`] renders and records the result.

#![forbid(unsafe_code)]

// Public modules for library usage
pub mod applied;
pub mod catalog;
pub mod domain;
pub mod error;
pub mod export;
pub mod graph;
pub mod render;
pub mod snapshot;

// Public CLI module (needed by binary)
pub mod cli;

// Application context and repository layout
pub mod app;
pub mod commands;
pub mod config;

// CLI output formatting
pub mod output;
