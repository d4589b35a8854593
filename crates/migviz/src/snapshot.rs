//! Snapshots: rendered graph artifacts recorded in a manifest.
//!
//! Creating a snapshot runs the whole pipeline (build, export, DOT, render)
//! and then records the result in `snapshots.jsonl`. Either every step
//! succeeds and the artifact plus manifest entry exist, or the run fails and
//! neither does.
//!
//! Rendering goes to a staging path inside the snapshots directory and is
//! only moved to its final name once the backend reports success. The
//! manifest is rewritten atomically, and if that fails the already moved
//! artifact is removed again.
//!
//! Listing skips unparseable manifest lines with a warning. Creating reads
//! the manifest strictly and refuses to append to a damaged one.

use crate::applied::AppliedStateStore;
use crate::catalog::Catalog;
use crate::error::Result;
use crate::export::{export, to_dot, Anonymizer, GraphExport, LabelTransform, PlainLabels};
use crate::graph::{GraphBuilder, MigrationGraph};
use crate::render::{artifact_path, OutputFormat, RenderBackend};
use chrono::{DateTime, Utc};
use migviz_jsonl::{read_jsonl, read_jsonl_resilient, write_jsonl_atomic, Warning};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::io;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info};

/// Parameters of one snapshot run.
#[derive(Debug, Clone)]
pub struct SnapshotRequest {
    /// Only records applied strictly before this instant are included.
    pub cutoff: DateTime<Utc>,
    /// Format token handed to the render backend.
    pub output_format: OutputFormat,
    /// Fold fully applied squashes into their replacing record.
    pub allow_replacement: bool,
    /// Scramble labels.
    pub anonymize: bool,
    /// Seed for the anonymizer.
    pub seed: Option<u64>,
    /// Comment written at the top of the DOT source.
    pub comment: Option<String>,
}

impl SnapshotRequest {
    /// A request for `cutoff` with default settings
    pub fn new(cutoff: DateTime<Utc>) -> Self {
        Self {
            cutoff,
            output_format: OutputFormat::default(),
            allow_replacement: true,
            anonymize: false,
            seed: None,
            comment: None,
        }
    }
}

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    /// Sequential snapshot number, starting at 1
    pub id: u64,

    /// Format the artifact was rendered in
    pub output_format: OutputFormat,

    /// Cutoff the graph was built for
    pub cutoff: DateTime<Utc>,

    /// DOT source the artifact was rendered from
    pub graph_source: String,

    /// Hex SHA-256 of `graph_source`
    pub sha256: String,

    /// Artifact file name, relative to the snapshots directory
    pub output_file: String,

    /// When the snapshot was taken
    pub created_at: DateTime<Utc>,
}

/// Build the graph as of `cutoff` and produce its labelled export.
///
/// Shared by snapshots and the `export` command so both label graphs the
/// same way.
pub async fn build_export(
    catalog: &Catalog,
    store: Option<&dyn AppliedStateStore>,
    cutoff: DateTime<Utc>,
    allow_replacement: bool,
    anonymize: bool,
    seed: Option<u64>,
) -> Result<(MigrationGraph, GraphExport)> {
    let graph = GraphBuilder::new()
        .allow_replacement(allow_replacement)
        .build(catalog, store, cutoff)
        .await?;

    let mut labels: Box<dyn LabelTransform> = if anonymize {
        Box::new(Anonymizer::new(seed))
    } else {
        Box::new(PlainLabels)
    };
    let exported = export(&graph, labels.as_mut());
    Ok((graph, exported))
}

/// Snapshot artifacts and their manifest.
#[derive(Debug, Clone)]
pub struct SnapshotStore {
    dir: PathBuf,
    manifest: PathBuf,
}

impl SnapshotStore {
    /// Store artifacts in `dir` and entries in `manifest`
    pub fn new(dir: impl Into<PathBuf>, manifest: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            manifest: manifest.into(),
        }
    }

    /// Directory holding the artifacts.
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Full path of a snapshot's artifact.
    pub fn artifact(&self, snapshot: &Snapshot) -> PathBuf {
        self.dir.join(&snapshot.output_file)
    }

    /// Read the manifest. A missing manifest means no snapshots yet.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest exists but cannot be read.
    /// Unparseable lines are skipped and reported as warnings.
    pub async fn list(&self) -> Result<(Vec<Snapshot>, Vec<Warning>)> {
        match read_jsonl_resilient::<Snapshot, _>(&self.manifest).await {
            Ok(result) => Ok(result),
            Err(e) if e.is_not_found() => Ok((Vec::new(), Vec::new())),
            Err(e) => Err(e.into()),
        }
    }

    /// Strict manifest read used before appending to it.
    async fn read_manifest(&self) -> Result<Vec<Snapshot>> {
        match read_jsonl::<Snapshot, _>(&self.manifest).await {
            Ok(snapshots) => Ok(snapshots),
            Err(e) if e.is_not_found() => Ok(Vec::new()),
            Err(e) => Err(e.into()),
        }
    }

    /// Run the snapshot pipeline and record the result.
    ///
    /// # Errors
    ///
    /// Returns the first error from building, rendering, or writing the
    /// manifest. No artifact or manifest entry is left behind on error.
    /// A manifest with unparseable lines is refused with
    /// [`Error::InvalidFormat`](crate::error::Error::InvalidFormat), and an
    /// existing artifact with the next id is never overwritten.
    pub async fn create(
        &self,
        catalog: &Catalog,
        store: Option<&dyn AppliedStateStore>,
        backend: &dyn RenderBackend,
        request: &SnapshotRequest,
    ) -> Result<Snapshot> {
        let (_, exported) = build_export(
            catalog,
            store,
            request.cutoff,
            request.allow_replacement,
            request.anonymize,
            request.seed,
        )
        .await?;
        let source = to_dot(&exported, request.comment.as_deref());

        let mut snapshots = self.read_manifest().await?;
        let id = snapshots.iter().map(|s| s.id).max().unwrap_or(0) + 1;

        fs::create_dir_all(&self.dir).await?;
        let staging_stem = self.dir.join(format!(".staging-{id:04}"));
        let staged = match backend.render(&source, &request.output_format, &staging_stem) {
            Ok(path) => path,
            Err(e) => {
                remove_quietly(&artifact_path(&staging_stem, &request.output_format)).await;
                return Err(e.into());
            }
        };

        let final_stem = self.dir.join(format!("snapshot-{id:04}"));
        let final_path = artifact_path(&final_stem, &request.output_format);
        if fs::try_exists(&final_path).await.unwrap_or(true) {
            remove_quietly(&staged).await;
            return Err(io::Error::new(
                io::ErrorKind::AlreadyExists,
                format!("snapshot artifact {} already exists", final_path.display()),
            )
            .into());
        }
        if let Err(e) = fs::rename(&staged, &final_path).await {
            remove_quietly(&staged).await;
            return Err(e.into());
        }

        let output_file = final_path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_default();
        let snapshot = Snapshot {
            id,
            output_format: request.output_format.clone(),
            cutoff: request.cutoff,
            sha256: sha256_hex(&source),
            graph_source: source,
            output_file,
            created_at: Utc::now(),
        };

        snapshots.push(snapshot.clone());
        if let Err(e) = write_jsonl_atomic(&self.manifest, &snapshots).await {
            remove_quietly(&final_path).await;
            return Err(e.into());
        }

        info!(
            id,
            backend = backend.name(),
            artifact = %final_path.display(),
            "Recorded snapshot"
        );
        Ok(snapshot)
    }
}

fn sha256_hex(source: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(source.as_bytes());
    hasher
        .finalize()
        .iter()
        .map(|byte| format!("{byte:02x}"))
        .collect()
}

async fn remove_quietly(path: &Path) {
    if let Err(e) = fs::remove_file(path).await {
        if e.kind() != io::ErrorKind::NotFound {
            debug!(path = %path.display(), error = %e, "Failed to remove leftover file");
        }
    }
}
