//! Command execution logic.
//!
//! This module contains the implementation of all CLI commands.

use anyhow::Result;

use super::args::{CheckArgs, ExportArgs, InitArgs, SnapshotArgs, SnapshotsArgs};
use super::types::ExportFormatArg;
use crate::app::App;
use crate::applied::AppliedStateStore;
use crate::export::to_dot;
use crate::graph::GraphBuilder;
use crate::output::{self, CheckReport, OutputMode};
use crate::snapshot::{build_export, SnapshotRequest};

/// Execute the init command
pub async fn execute_init(args: &InitArgs) -> Result<()> {
    use crate::commands::init;

    let current_dir = std::env::current_dir()?;

    if !args.quiet {
        println!("Initializing migviz repository...");
    }

    let result = init::init(&current_dir).await?;

    if !args.quiet {
        println!("Initialized migviz in {}", result.migviz_dir.display());
        println!("  Config:    {}", result.config_file.display());
        println!("  Catalog:   {}", result.catalog_file.display());
        println!("  Applied:   {}", result.applied_file.display());
        println!("  Snapshots: {}", result.snapshots_dir.display());
    }

    Ok(())
}

/// Execute the check command
///
/// Builds the graph and reports its size and replacement outcomes. Any graph
/// error is returned, which makes the process exit non-zero.
pub async fn execute_check(app: &App, args: &CheckArgs, output_mode: OutputMode) -> Result<()> {
    let (catalog, warnings) = app.load_catalog().await?;
    output::print_load_warnings(&warnings)?;

    let cutoff = args.graph.cutoff();
    let store = app.applied_store();
    let graph = GraphBuilder::new()
        .allow_replacement(args.graph.allow_replacement(app.config().allow_replacement))
        .build(
            &catalog,
            store.as_ref().map(|s| s as &dyn AppliedStateStore),
            cutoff,
        )
        .await?;

    let report = CheckReport::new(&graph, cutoff, &warnings);
    output::print_check_report(&report, output_mode)?;
    Ok(())
}

/// Execute the export command
///
/// `--json` and `--format json` both select the JSON node/edge export.
pub async fn execute_export(app: &App, args: &ExportArgs, output_mode: OutputMode) -> Result<()> {
    let (catalog, warnings) = app.load_catalog().await?;
    output::print_load_warnings(&warnings)?;

    let config = app.config();
    let store = app.applied_store();
    let (_, exported) = build_export(
        &catalog,
        store.as_ref().map(|s| s as &dyn AppliedStateStore),
        args.graph.cutoff(),
        args.graph.allow_replacement(config.allow_replacement),
        args.labels.anonymize || config.anonymize,
        args.labels.seed.or(config.seed),
    )
    .await?;

    match (args.format, output_mode) {
        (ExportFormatArg::Json, _) | (_, OutputMode::Json) => output::print_json(&exported)?,
        (ExportFormatArg::Dot, OutputMode::Text) => {
            print!("{}", to_dot(&exported, args.comment.as_deref()));
        }
    }

    Ok(())
}

/// Execute the snapshot command
pub async fn execute_snapshot(
    app: &App,
    args: &SnapshotArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let (catalog, warnings) = app.load_catalog().await?;
    output::print_load_warnings(&warnings)?;

    let config = app.config();
    let mut request = SnapshotRequest::new(args.graph.cutoff());
    request.output_format = args
        .output_format
        .clone()
        .unwrap_or_else(|| config.output_format.clone());
    request.allow_replacement = args.graph.allow_replacement(config.allow_replacement);
    request.anonymize = args.labels.anonymize || config.anonymize;
    request.seed = args.labels.seed.or(config.seed);
    request.comment = args.comment.clone();

    let store = app.applied_store();
    let snapshots = app.snapshot_store();
    let backend = app.backend();
    let snapshot = snapshots
        .create(
            &catalog,
            store.as_ref().map(|s| s as &dyn AppliedStateStore),
            backend.as_ref(),
            &request,
        )
        .await?;

    output::print_snapshot(&snapshot, &snapshots.artifact(&snapshot), output_mode)?;
    Ok(())
}

/// Execute the snapshots command
pub async fn execute_snapshots(
    app: &App,
    args: &SnapshotsArgs,
    output_mode: OutputMode,
) -> Result<()> {
    let (snapshots, warnings) = app.snapshot_store().list().await?;
    for warning in &warnings {
        tracing::warn!("Skipped snapshot manifest entry: {warning}");
    }

    let skip = args
        .limit
        .map_or(0, |limit| snapshots.len().saturating_sub(limit));
    output::print_snapshots(&snapshots[skip..], output_mode)?;
    Ok(())
}
