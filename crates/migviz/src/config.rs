//! Configuration management for migviz.
//!
//! A migviz repository is a directory containing `.migviz/`, which holds
//! `config.yaml` plus the default data files. Paths in the configuration are
//! relative to the repository root (the directory containing `.migviz/`).

use crate::error::{ConfigError, Result};
use crate::render::{OutputFormat, RendererKind};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Name of the migviz directory
pub const MIGVIZ_DIR_NAME: &str = ".migviz";

/// Name of the configuration file
pub const CONFIG_FILE_NAME: &str = "config.yaml";

/// Name of the default catalog file
pub const CATALOG_FILE_NAME: &str = "catalog.jsonl";

/// Name of the default applied-state file
pub const APPLIED_FILE_NAME: &str = "applied.jsonl";

/// Name of the snapshot manifest
pub const SNAPSHOTS_FILE_NAME: &str = "snapshots.jsonl";

/// Name of the directory holding snapshot artifacts
pub const SNAPSHOTS_DIR_NAME: &str = "snapshots";

/// Name of the gitignore file within .migviz
pub const GITIGNORE_FILE_NAME: &str = ".gitignore";

/// Maximum directory depth to traverse when searching for the migviz root
pub const MAX_TRAVERSAL_DEPTH: usize = 256;

/// Contents of `.migviz/config.yaml`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct MigvizConfig {
    /// Record catalog, one record per JSONL line
    pub catalog_file: PathBuf,

    /// Applied-state file; without one, nothing counts as applied
    #[serde(default)]
    pub applied_file: Option<PathBuf>,

    /// Fold fully applied squashes into their replacing record
    #[serde(default = "default_allow_replacement")]
    pub allow_replacement: bool,

    /// Default snapshot output format
    #[serde(default)]
    pub output_format: OutputFormat,

    /// Backend used to render snapshots
    #[serde(default)]
    pub renderer: RendererKind,

    /// Anonymize labels by default
    #[serde(default)]
    pub anonymize: bool,

    /// Fixed seed for anonymization
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seed: Option<u64>,
}

fn default_allow_replacement() -> bool {
    true
}

impl Default for MigvizConfig {
    fn default() -> Self {
        Self {
            catalog_file: Path::new(MIGVIZ_DIR_NAME).join(CATALOG_FILE_NAME),
            applied_file: Some(Path::new(MIGVIZ_DIR_NAME).join(APPLIED_FILE_NAME)),
            allow_replacement: true,
            output_format: OutputFormat::default(),
            renderer: RendererKind::default(),
            anonymize: false,
            seed: None,
        }
    }
}

impl MigvizConfig {
    /// Load configuration from a file
    pub async fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path).await?;
        Self::parse(&content)
    }

    /// Parse configuration from YAML text
    pub fn parse(content: &str) -> Result<Self> {
        serde_yaml::from_str(content).map_err(|e| ConfigError::Invalid(e.to_string()).into())
    }

    /// Save configuration to a file
    pub async fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self)
            .map_err(|e| ConfigError::Invalid(format!("YAML error: {e}")))?;
        fs::write(path, content).await?;
        Ok(())
    }
}

/// Find the migviz root directory by searching up the directory tree.
///
/// Starts from the given directory and traverses parent directories until a
/// `.migviz/` directory is found, the filesystem root is reached, or the
/// maximum traversal depth is exceeded.
pub fn find_migviz_root(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    let mut depth = 0;

    loop {
        if current.join(MIGVIZ_DIR_NAME).is_dir() {
            return Some(current);
        }

        depth += 1;
        if depth > MAX_TRAVERSAL_DEPTH || !current.pop() {
            return None;
        }
    }
}
