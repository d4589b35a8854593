//! Streaming and whole-file reading of JSONL data.
//!
//! Two reading policies are provided:
//!
//! - **Strict** ([`read_jsonl`]): the first bad line aborts the read with an
//!   error naming the line. Used where a partial view of the data would be
//!   wrong (e.g. applied-state records).
//! - **Resilient** ([`stream_resilient`], [`read_jsonl_resilient`]): bad lines
//!   are skipped and reported as [`Warning`]s. Used for hand-edited files
//!   where the caller prefers to continue and report.

use crate::warning::{Warning, WarningCollector};
use crate::{JsonlReader, Result};
use futures::stream::{self, Stream, StreamExt};
use serde::de::DeserializeOwned;
use std::path::Path;
use tokio::fs::File;
use tokio::io::AsyncRead;

/// Streams values from a reader, skipping lines that fail to parse.
///
/// Each skipped line is recorded in `warnings`. An I/O failure ends the
/// stream after recording a [`Warning::SkippedLine`] for the line that could
/// not be read.
pub fn stream_resilient<T, R>(
    reader: JsonlReader<R>,
    warnings: WarningCollector,
) -> impl Stream<Item = T>
where
    T: DeserializeOwned,
    R: AsyncRead + Unpin,
{
    stream::unfold((reader, warnings), |(mut reader, warnings)| async move {
        loop {
            match reader.read_line().await {
                Ok(Some(line)) => match serde_json::from_str::<T>(&line) {
                    Ok(value) => return Some((value, (reader, warnings))),
                    Err(e) => warnings.add(Warning::from_json_error(reader.line_number(), &e)),
                },
                Ok(None) => return None,
                Err(e) => {
                    warnings.add(Warning::SkippedLine {
                        line_number: reader.line_number() + 1,
                        reason: format!("read failed: {e}"),
                    });
                    return None;
                }
            }
        }
    })
}

/// Reads every value from a JSONL file, failing on the first bad line.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] if the file cannot be opened or read, and
/// [`crate::Error::Parse`] naming the line of the first value that fails to
/// deserialize.
pub async fn read_jsonl<T, P>(path: P) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    let mut reader = JsonlReader::new(file);

    let mut values = Vec::new();
    while let Some(value) = reader.read_value().await? {
        values.push(value);
    }
    Ok(values)
}

/// Reads every parseable value from a JSONL file, collecting warnings for
/// the lines that were skipped.
///
/// # Errors
///
/// Returns [`crate::Error::Io`] only if the file cannot be opened. Problems
/// with individual lines are reported through the returned warnings.
pub async fn read_jsonl_resilient<T, P>(path: P) -> Result<(Vec<T>, Vec<Warning>)>
where
    T: DeserializeOwned,
    P: AsRef<Path>,
{
    let file = File::open(path.as_ref()).await?;
    let collector = WarningCollector::new();

    let values: Vec<T> = stream_resilient(JsonlReader::new(file), collector.clone())
        .collect()
        .await;

    Ok((values, collector.into_warnings()))
}
