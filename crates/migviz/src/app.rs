//! Application context for CLI command execution.
//!
//! `App` locates the repository, loads its configuration and hands out the
//! adapters a command needs, with every configured path resolved against the
//! repository root.
//!
//! # Example
//!
//! ```no_run
//! use migviz::app::App;
//! use std::path::Path;
//!
//! #[tokio::main(flavor = "current_thread")]
//! async fn main() -> anyhow::Result<()> {
//!     let app = App::from_directory(Path::new(".")).await?;
//!     let (catalog, _warnings) = app.load_catalog().await?;
//!     println!("{} records", catalog.len());
//!     Ok(())
//! }
//! ```

use crate::applied::JsonlAppliedStore;
use crate::catalog::{Catalog, LoadWarning};
use crate::config::{
    find_migviz_root, MigvizConfig, CONFIG_FILE_NAME, MIGVIZ_DIR_NAME, SNAPSHOTS_DIR_NAME,
    SNAPSHOTS_FILE_NAME,
};
use crate::error::{ConfigError, Result};
use crate::render::RenderBackend;
use crate::snapshot::SnapshotStore;
use std::path::{Path, PathBuf};

/// Application context for CLI operations.
#[derive(Debug, Clone)]
pub struct App {
    /// Directory containing `.migviz/`
    root_dir: PathBuf,

    /// Path to the migviz directory (.migviz)
    migviz_dir: PathBuf,

    /// Loaded configuration
    config: MigvizConfig,
}

impl App {
    /// Create an App instance from the given working directory.
    ///
    /// Searches up the directory tree for a `.migviz/` directory and loads
    /// its configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - No migviz repository is found in the directory tree
    /// - The configuration cannot be read or parsed
    pub async fn from_directory(working_dir: &Path) -> Result<Self> {
        let root_dir = find_migviz_root(working_dir).ok_or(ConfigError::NotInitialized)?;

        let migviz_dir = root_dir.join(MIGVIZ_DIR_NAME);
        let config = MigvizConfig::load(&migviz_dir.join(CONFIG_FILE_NAME)).await?;

        Ok(Self {
            root_dir,
            migviz_dir,
            config,
        })
    }

    /// The repository root.
    pub fn root_dir(&self) -> &Path {
        &self.root_dir
    }

    /// The `.migviz/` directory.
    pub fn migviz_dir(&self) -> &Path {
        &self.migviz_dir
    }

    /// The loaded configuration.
    pub fn config(&self) -> &MigvizConfig {
        &self.config
    }

    /// Absolute path of the configured catalog file.
    pub fn catalog_path(&self) -> PathBuf {
        self.resolve(&self.config.catalog_file)
    }

    /// Load the record catalog.
    ///
    /// # Errors
    ///
    /// Returns an error if the catalog file cannot be opened.
    pub async fn load_catalog(&self) -> Result<(Catalog, Vec<LoadWarning>)> {
        Catalog::load_from_jsonl(&self.catalog_path()).await
    }

    /// The applied-state store, if one is configured.
    pub fn applied_store(&self) -> Option<JsonlAppliedStore> {
        self.config
            .applied_file
            .as_deref()
            .map(|path| JsonlAppliedStore::new(self.resolve(path)))
    }

    /// Snapshot artifacts and manifest under `.migviz/`.
    pub fn snapshot_store(&self) -> SnapshotStore {
        SnapshotStore::new(
            self.migviz_dir.join(SNAPSHOTS_DIR_NAME),
            self.migviz_dir.join(SNAPSHOTS_FILE_NAME),
        )
    }

    /// The configured render backend.
    pub fn backend(&self) -> Box<dyn RenderBackend> {
        self.config.renderer.backend()
    }

    fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root_dir.join(path)
        }
    }
}
