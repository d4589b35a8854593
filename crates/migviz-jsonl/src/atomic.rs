//! Atomic write operations for JSONL files.
//!
//! On POSIX systems, renames within the same filesystem are atomic. Writes
//! go to a sibling temporary file first and are renamed over the target only
//! after every value has been serialized and flushed, so readers never see a
//! partially-written file.
//!
//! # Examples
//!
//! ```no_run
//! use migviz_jsonl::write_jsonl_atomic;
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Entry {
//!     id: u32,
//! }
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! write_jsonl_atomic("manifest.jsonl", &[Entry { id: 1 }, Entry { id: 2 }]).await?;
//! # Ok(())
//! # }
//! ```

use crate::{JsonlWriter, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tokio::fs::File;

/// Atomically writes a slice of values to a JSONL file.
///
/// # Errors
///
/// Returns an error if the temporary file cannot be created, any value fails
/// to serialize, an I/O error occurs, or the final rename fails. On failure
/// the original file (if any) is left unchanged and the temporary file is
/// removed on a best-effort basis.
pub async fn write_jsonl_atomic<T, P>(path: P, values: &[T]) -> Result<()>
where
    T: Serialize,
    P: AsRef<Path>,
{
    write_jsonl_atomic_iter(path, values.iter()).await
}

/// Atomically writes an iterator of values to a JSONL file.
///
/// # Errors
///
/// See [`write_jsonl_atomic`] for error conditions.
pub async fn write_jsonl_atomic_iter<T, I, P>(path: P, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
    P: AsRef<Path>,
{
    let path = path.as_ref();
    let temp_path = make_temp_path(path);

    if let Err(e) = write_to_temp_file(&temp_path, values).await {
        // Best-effort cleanup of temp file
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(e);
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

/// Creates the temporary path used during an atomic write.
///
/// `.tmp` is appended to the existing extension (`a.jsonl` → `a.jsonl.tmp`),
/// or used as the extension if there is none.
fn make_temp_path(path: &Path) -> PathBuf {
    let mut temp_path = path.to_path_buf();
    let new_extension = match path.extension() {
        Some(ext) => {
            let mut new_ext = ext.to_os_string();
            new_ext.push(".tmp");
            new_ext
        }
        None => std::ffi::OsString::from("tmp"),
    };
    temp_path.set_extension(new_extension);
    temp_path
}

async fn write_to_temp_file<T, I>(temp_path: &Path, values: I) -> Result<()>
where
    T: Serialize,
    I: IntoIterator<Item = T>,
{
    let file = File::create(temp_path).await?;
    let mut writer = JsonlWriter::new(file);
    writer.write_all(values).await?;
    writer.flush().await?;
    Ok(())
}
