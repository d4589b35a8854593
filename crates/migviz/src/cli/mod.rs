//! CLI argument parsing and command dispatch.
//!
//! This module provides the command-line interface for migviz using clap's
//! derive API.
//!
//! # Commands
//!
//! - `init`: Initialize a new migviz repository
//! - `check`: Build the graph and report on it
//! - `export`: Print the graph as DOT or JSON
//! - `snapshot`: Render the graph and record it in the manifest
//! - `snapshots`: List recorded snapshots
//!
//! # Global Flags
//!
//! - `--json`: Output in JSON format (applies to all commands)
//!
//! # Example
//!
//! ```bash
//! migviz check --at 2024-03-01T00:00:00Z
//! migviz export --anonymize --seed 7 > graph.gv
//! migviz snapshot -T svg --comment "before release"
//! ```

mod args;
mod execute;
mod types;
mod validators;

use anyhow::Result;
use clap::{Parser, Subcommand};

pub use args::{
    AnonymizeArgs, CheckArgs, ExportArgs, GraphArgs, InitArgs, SnapshotArgs, SnapshotsArgs,
};
pub use types::ExportFormatArg;
pub use validators::{parse_cutoff, parse_output_format};

/// Migviz - point-in-time migration dependency graphs
///
/// Builds the dependency graph of the migrations applied before a given
/// instant, validates it, and exports it for Graphviz.
#[derive(Parser, Debug)]
#[command(name = "migviz")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output in JSON format for programmatic use
    #[arg(long, global = true)]
    pub json: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available commands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Initialize a new migviz repository
    ///
    /// Creates the `.migviz/` directory with configuration, an empty catalog
    /// and applied-state file, and the snapshot directory.
    Init(InitArgs),

    /// Build and validate the graph
    ///
    /// Prints node and edge counts and what happened to each replacing
    /// migration. Exits non-zero if the graph is inconsistent or cyclic.
    Check(CheckArgs),

    /// Print the graph to stdout
    ///
    /// Writes Graphviz DOT source by default, or node and edge lists as JSON.
    Export(ExportArgs),

    /// Render the graph and record a snapshot
    ///
    /// Renders with the configured backend into `.migviz/snapshots/` and
    /// appends an entry to `.migviz/snapshots.jsonl`.
    Snapshot(SnapshotArgs),

    /// List recorded snapshots
    Snapshots(SnapshotsArgs),
}

impl Cli {
    /// Parse CLI arguments from command line
    pub fn parse_args() -> Self {
        <Self as Parser>::parse()
    }

    /// Parse CLI arguments from an iterator (for testing)
    pub fn try_parse_from<I, T>(iter: I) -> std::result::Result<Self, clap::Error>
    where
        I: IntoIterator<Item = T>,
        T: Into<std::ffi::OsString> + Clone,
    {
        <Self as Parser>::try_parse_from(iter)
    }

    /// Execute the CLI command
    pub async fn execute(&self) -> Result<()> {
        use crate::app::App;
        use crate::output::OutputMode;

        let output_mode = if self.json {
            OutputMode::Json
        } else {
            OutputMode::Text
        };

        match &self.command {
            Some(Commands::Init(args)) => execute::execute_init(args).await,
            Some(Commands::Check(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_check(&app, args, output_mode).await
            }
            Some(Commands::Export(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_export(&app, args, output_mode).await
            }
            Some(Commands::Snapshot(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_snapshot(&app, args, output_mode).await
            }
            Some(Commands::Snapshots(args)) => {
                let app = App::from_directory(&std::env::current_dir()?).await?;
                execute::execute_snapshots(&app, args, output_mode).await
            }
            None => {
                println!("migviz migration graph tool");
                println!("Use --help for more information");
                Ok(())
            }
        }
    }
}
