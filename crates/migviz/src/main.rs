//! Migviz CLI binary.

use anyhow::Result;
use migviz::cli::Cli;
use tracing_subscriber::EnvFilter;

/// Main entry point for the migviz CLI.
///
/// Uses tokio's current_thread runtime; every command is a short sequence
/// of file reads, a graph build and at most one renderer process.
#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    // Controlled via RUST_LOG, e.g. RUST_LOG=migviz=debug,migviz_jsonl=trace
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("migviz=info,migviz_jsonl=info")),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    tracing::debug!("Starting migviz CLI");

    let cli = Cli::parse_args();
    cli.execute().await?;

    tracing::debug!("Migviz CLI completed successfully");
    Ok(())
}
