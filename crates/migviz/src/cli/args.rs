//! CLI argument structs for all commands.
//!
//! Each command has its own argument struct with clap derive attributes
//! for parsing and validation.

use chrono::{DateTime, Utc};
use clap::{Args, Parser};

use super::types::ExportFormatArg;
use super::validators::{parse_cutoff, parse_output_format};
use crate::render::OutputFormat;

/// Arguments for the `init` command
#[derive(Parser, Debug, Clone)]
pub struct InitArgs {
    /// Suppress output messages
    #[arg(short, long)]
    pub quiet: bool,
}

/// Options shared by every command that builds a graph
#[derive(Args, Debug, Clone)]
pub struct GraphArgs {
    /// Build the graph as of this instant (RFC 3339, default: now)
    ///
    /// Only migrations applied strictly before this instant are included.
    #[arg(long, value_parser = parse_cutoff)]
    pub at: Option<DateTime<Utc>>,

    /// Do not fold squashed migrations into their replacement
    #[arg(long)]
    pub no_replace: bool,
}

impl GraphArgs {
    /// The cutoff to build for.
    pub fn cutoff(&self) -> DateTime<Utc> {
        self.at.unwrap_or_else(Utc::now)
    }

    /// Whether replacement handling is enabled, given the configured default.
    pub fn allow_replacement(&self, configured: bool) -> bool {
        configured && !self.no_replace
    }
}

/// Label anonymization options
#[derive(Args, Debug, Clone)]
pub struct AnonymizeArgs {
    /// Replace record names with random letters
    #[arg(long)]
    pub anonymize: bool,

    /// Seed for anonymization, for reproducible labels
    #[arg(long)]
    pub seed: Option<u64>,
}

/// Arguments for the `check` command
#[derive(Parser, Debug, Clone)]
pub struct CheckArgs {
    #[command(flatten)]
    pub graph: GraphArgs,
}

/// Arguments for the `export` command
#[derive(Parser, Debug, Clone)]
pub struct ExportArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub labels: AnonymizeArgs,

    /// What to write to stdout
    #[arg(short, long, value_enum, default_value = "dot")]
    pub format: ExportFormatArg,

    /// Comment written at the top of DOT output
    #[arg(long)]
    pub comment: Option<String>,
}

/// Arguments for the `snapshot` command
#[derive(Parser, Debug, Clone)]
pub struct SnapshotArgs {
    #[command(flatten)]
    pub graph: GraphArgs,

    #[command(flatten)]
    pub labels: AnonymizeArgs,

    /// Format passed to the renderer (default from config, e.g. gv, svg, png)
    #[arg(short = 'T', long, value_parser = parse_output_format)]
    pub output_format: Option<OutputFormat>,

    /// Comment written at the top of the graph source
    #[arg(long)]
    pub comment: Option<String>,
}

/// Arguments for the `snapshots` command
#[derive(Parser, Debug, Clone)]
pub struct SnapshotsArgs {
    /// Show at most this many of the most recent snapshots
    #[arg(short = 'n', long)]
    pub limit: Option<usize>,
}
