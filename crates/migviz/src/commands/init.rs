//! Implementation of the `init` command.
//!
//! Creates the `.migviz/` directory with a default configuration, empty
//! catalog and applied-state files, and the snapshot directory.

use crate::config::{
    MigvizConfig, APPLIED_FILE_NAME, CATALOG_FILE_NAME, CONFIG_FILE_NAME, GITIGNORE_FILE_NAME,
    MIGVIZ_DIR_NAME, SNAPSHOTS_DIR_NAME,
};
use crate::error::{ConfigError, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// Result of the init command
#[derive(Debug)]
pub struct InitResult {
    /// Path to the created migviz directory
    pub migviz_dir: PathBuf,
    /// Path to the created config file
    pub config_file: PathBuf,
    /// Path to the created catalog file
    pub catalog_file: PathBuf,
    /// Path to the created applied-state file
    pub applied_file: PathBuf,
    /// Path to the created snapshots directory
    pub snapshots_dir: PathBuf,
}

/// Initialize a new migviz repository in the given directory.
///
/// # Errors
///
/// Returns an error if:
/// - The `.migviz/` directory already exists
/// - File system operations fail
pub async fn init(base_dir: &Path) -> Result<InitResult> {
    let migviz_dir = base_dir.join(MIGVIZ_DIR_NAME);

    if migviz_dir.exists() {
        return Err(ConfigError::AlreadyInitialized(migviz_dir).into());
    }

    fs::create_dir_all(&migviz_dir).await?;

    let config_file = migviz_dir.join(CONFIG_FILE_NAME);
    MigvizConfig::default().save(&config_file).await?;

    let catalog_file = migviz_dir.join(CATALOG_FILE_NAME);
    fs::write(&catalog_file, "").await?;

    let applied_file = migviz_dir.join(APPLIED_FILE_NAME);
    fs::write(&applied_file, "").await?;

    let snapshots_dir = migviz_dir.join(SNAPSHOTS_DIR_NAME);
    fs::create_dir_all(&snapshots_dir).await?;

    let gitignore_content = "\
# Rendered snapshot artifacts can be regenerated from the manifest's graph source
snapshots/
*.tmp
";
    fs::write(migviz_dir.join(GITIGNORE_FILE_NAME), gitignore_content).await?;

    Ok(InitResult {
        migviz_dir,
        config_file,
        catalog_file,
        applied_file,
        snapshots_dir,
    })
}

/// Check if a directory has been initialized with migviz.
pub fn is_initialized(base_dir: &Path) -> bool {
    base_dir.join(MIGVIZ_DIR_NAME).exists()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use tempfile::TempDir;

    #[tokio::test]
    async fn init_creates_layout() {
        let dir = TempDir::new().unwrap();

        let result = init(dir.path()).await.unwrap();

        assert!(is_initialized(dir.path()));
        assert!(result.config_file.exists());
        assert!(result.catalog_file.exists());
        assert!(result.applied_file.exists());
        assert!(result.snapshots_dir.is_dir());
        assert!(result.migviz_dir.join(GITIGNORE_FILE_NAME).exists());

        let config = MigvizConfig::load(&result.config_file).await.unwrap();
        assert_eq!(config, MigvizConfig::default());
    }

    #[tokio::test]
    async fn init_refuses_to_reinitialize() {
        let dir = TempDir::new().unwrap();
        init(dir.path()).await.unwrap();

        let err = init(dir.path()).await.unwrap_err();
        assert!(matches!(
            err,
            Error::Config(ConfigError::AlreadyInitialized(_))
        ));
    }
}
