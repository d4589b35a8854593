//! Output formatting for CLI commands.
//!
//! Every command prints either human-readable text or pretty JSON. Text
//! printers write to any `Write` so they can be tested without a terminal.

mod color;

use crate::catalog::LoadWarning;
use crate::graph::{MigrationGraph, ReplacementOutcome};
use crate::snapshot::Snapshot;
use chrono::{DateTime, SecondsFormat, Utc};
use serde::Serialize;
use std::env;
use std::io::{self, Write};
use std::path::Path;

use color::{bold, colorize_outcome, dimmed, info, ok_icon, warn_icon};

// ============================================================================
// Output Configuration
// ============================================================================

/// Configuration for output formatting.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputConfig {
    /// Whether to use ASCII-only icons instead of Unicode.
    pub use_ascii: bool,
    /// Whether to use colors in output.
    pub use_colors: bool,
}

impl OutputConfig {
    /// Create a new OutputConfig with explicit values.
    pub fn new(use_ascii: bool, use_colors: bool) -> Self {
        Self {
            use_ascii,
            use_colors,
        }
    }

    /// Create an OutputConfig by reading from environment variables.
    ///
    /// Reads:
    /// - `MIGVIZ_ASCII`: Set to "1" or "true" for ASCII-only icons (default: false)
    /// - `NO_COLOR`: Standard env var to disable colors (any value disables colors)
    /// - `MIGVIZ_COLOR`: Set to "0" or "false" to disable colors (default: true)
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let use_ascii = match lookup("MIGVIZ_ASCII") {
            Some(v) if v == "1" || v.eq_ignore_ascii_case("true") => true,
            Some(v) if v == "0" || v.eq_ignore_ascii_case("false") || v.is_empty() => false,
            Some(v) => {
                tracing::warn!(
                    env_var = "MIGVIZ_ASCII",
                    value = %v,
                    "Invalid value (expected '1', 'true', '0', or 'false'), using default"
                );
                false
            }
            None => false,
        };

        // Respect NO_COLOR (https://no-color.org/), MIGVIZ_COLOR for explicit control
        let use_colors = lookup("NO_COLOR").is_none()
            && lookup("MIGVIZ_COLOR")
                .map(|v| v != "0" && !v.eq_ignore_ascii_case("false"))
                .unwrap_or(true);

        Self {
            use_ascii,
            use_colors,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            use_ascii: false,
            use_colors: true,
        }
    }
}

/// Output format mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    /// Human-readable text format
    Text,
    /// JSON format for programmatic use
    Json,
}

// ============================================================================
// Reports
// ============================================================================

/// Summary of a successful graph build.
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    /// Cutoff the graph was built for
    pub cutoff: DateTime<Utc>,
    /// Number of records in the graph
    pub nodes: usize,
    /// Number of dependency edges
    pub edges: usize,
    /// What happened to each replacing record
    pub replacements: Vec<ReplacementReport>,
    /// Catalog load warnings
    pub warnings: Vec<String>,
}

/// One replacing record and its outcome.
#[derive(Debug, Clone, Serialize)]
pub struct ReplacementReport {
    /// The replacing record
    pub record: String,
    /// What replacement handling did with it
    #[serde(flatten)]
    pub outcome: ReplacementOutcome,
}

impl CheckReport {
    /// Summarize `graph` as built for `cutoff`.
    pub fn new(graph: &MigrationGraph, cutoff: DateTime<Utc>, warnings: &[LoadWarning]) -> Self {
        Self {
            cutoff,
            nodes: graph.node_count(),
            edges: graph.edge_count(),
            replacements: graph
                .replacements()
                .iter()
                .map(|(key, outcome)| ReplacementReport {
                    record: key.to_string(),
                    outcome: outcome.clone(),
                })
                .collect(),
            warnings: warnings.iter().map(ToString::to_string).collect(),
        }
    }
}

// ============================================================================
// Public Dispatch Functions
// ============================================================================

/// Print a check report in the specified format
pub fn print_check_report(report: &CheckReport, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(report),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_check_report(&mut handle, report, &config)
        }
    }
}

/// Print a newly created snapshot in the specified format
pub fn print_snapshot(snapshot: &Snapshot, artifact: &Path, mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(snapshot),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(
                handle,
                "{} Recorded snapshot #{} at {}",
                ok_icon(&config),
                snapshot.id,
                info(&artifact.display().to_string(), &config)
            )
        }
    }
}

/// Print the snapshot manifest in the specified format
pub fn print_snapshots(snapshots: &[Snapshot], mode: OutputMode) -> io::Result<()> {
    match mode {
        OutputMode::Json => print_json(&snapshots),
        OutputMode::Text => {
            let config = OutputConfig::from_env();
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            write_snapshots(&mut handle, snapshots, &config)
        }
    }
}

/// Print catalog load warnings to stderr.
pub fn print_load_warnings(warnings: &[LoadWarning]) -> io::Result<()> {
    if warnings.is_empty() {
        return Ok(());
    }
    let config = OutputConfig::from_env();
    let stderr = io::stderr();
    let mut handle = stderr.lock();
    for warning in warnings {
        writeln!(handle, "{} {warning}", warn_icon(&config))?;
    }
    Ok(())
}

/// Print a JSON-formatted result for any serializable value
pub fn print_json<T: Serialize>(value: &T) -> io::Result<()> {
    let stdout = io::stdout();
    let mut handle = stdout.lock();
    let json = serde_json::to_string_pretty(value)
        .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
    writeln!(handle, "{}", json)
}

// ============================================================================
// Text Formatting
// ============================================================================

fn timestamp(at: &DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Secs, true)
}

fn write_check_report<W: Write>(
    w: &mut W,
    report: &CheckReport,
    config: &OutputConfig,
) -> io::Result<()> {
    writeln!(
        w,
        "{} Graph as of {}: {} nodes, {} edges",
        ok_icon(config),
        timestamp(&report.cutoff),
        report.nodes,
        report.edges
    )?;

    if !report.replacements.is_empty() {
        writeln!(w)?;
        writeln!(w, "{}:", bold("Replacements", config))?;
        for entry in &report.replacements {
            writeln!(
                w,
                "  {}  {}",
                info(&entry.record, config),
                colorize_outcome(&entry.outcome, config)
            )?;
        }
    }

    Ok(())
}

fn write_snapshots<W: Write>(
    w: &mut W,
    snapshots: &[Snapshot],
    config: &OutputConfig,
) -> io::Result<()> {
    if snapshots.is_empty() {
        return writeln!(w, "No snapshots recorded");
    }

    for snapshot in snapshots {
        let digest: String = snapshot.sha256.chars().take(12).collect();
        writeln!(
            w,
            "#{:<4} {}  {:<6} {}  {}",
            snapshot.id,
            timestamp(&snapshot.cutoff),
            snapshot.output_format.as_str(),
            info(&snapshot.output_file, config),
            dimmed(&digest, config)
        )?;
    }
    Ok(())
}
