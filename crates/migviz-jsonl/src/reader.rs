//! JSONL reading operations.
//!
//! This module provides async functionality for reading JSONL files line-by-line
//! with efficient buffering and line number tracking for error reporting.

use crate::{Error, Result};
use serde::de::DeserializeOwned;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};

/// Async reader for JSONL (JSON Lines) data.
///
/// `JsonlReader` wraps an async reader and provides buffered reading of JSONL
/// formatted data. It tracks line numbers to provide useful context in error
/// messages when parsing fails. Blank lines are skipped but still counted, so
/// reported line numbers always match the file.
///
/// # Examples
///
/// ```no_run
/// use migviz_jsonl::reader::JsonlReader;
/// use tokio::fs::File;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let file = File::open("catalog.jsonl").await?;
/// let mut reader = JsonlReader::new(file);
/// while let Some(value) = reader.read_value::<serde_json::Value>().await? {
///     println!("line {}: {value}", reader.line_number());
/// }
/// # Ok(())
/// # }
/// ```
pub struct JsonlReader<R> {
    /// Buffered reader wrapping the underlying async reader.
    reader: BufReader<R>,
    /// Current line number (1-based counting, 0 before any lines are read) for error reporting.
    line_number: usize,
}

impl<R: AsyncRead + Unpin> JsonlReader<R> {
    /// Creates a new `JsonlReader` wrapping the given async reader.
    #[must_use]
    pub fn new(reader: R) -> Self {
        Self {
            reader: BufReader::new(reader),
            line_number: 0,
        }
    }

    /// Creates a new `JsonlReader` with a custom buffer capacity.
    #[must_use]
    pub fn with_capacity(reader: R, capacity: usize) -> Self {
        Self {
            reader: BufReader::with_capacity(capacity, reader),
            line_number: 0,
        }
    }

    /// Returns the current line number.
    ///
    /// Returns 0 before any lines have been read. After reading, returns the
    /// 1-based line number of the last line read.
    #[must_use]
    pub fn line_number(&self) -> usize {
        self.line_number
    }

    pub(crate) fn increment_line(&mut self) {
        self.line_number += 1;
    }

    /// Reads the next non-blank line, trimmed of surrounding whitespace.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] if the underlying reader fails or the line is
    /// not valid UTF-8.
    pub async fn read_line(&mut self) -> Result<Option<String>> {
        let mut buf = String::new();
        loop {
            buf.clear();
            let read = self.reader.read_line(&mut buf).await?;
            if read == 0 {
                return Ok(None);
            }
            self.increment_line();

            let trimmed = buf.trim();
            if !trimmed.is_empty() {
                return Ok(Some(trimmed.to_string()));
            }
        }
    }

    /// Reads and deserializes the next non-blank line.
    ///
    /// Returns `Ok(None)` at end of input.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Parse`] carrying the line number when the line is not
    /// a valid `T`, or [`Error::Io`] if reading fails.
    pub async fn read_value<T: DeserializeOwned>(&mut self) -> Result<Option<T>> {
        let Some(line) = self.read_line().await? else {
            return Ok(None);
        };

        serde_json::from_str(&line)
            .map(Some)
            .map_err(|source| Error::Parse {
                line_number: self.line_number,
                source,
            })
    }

    /// Consumes the reader, returning the underlying buffered reader.
    #[must_use]
    pub fn into_inner(self) -> BufReader<R> {
        self.reader
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use std::io::Cursor;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Row {
        id: u32,
    }

    #[test]
    fn new_reader_starts_at_line_zero() {
        let reader = JsonlReader::new(Cursor::new(b""));
        assert_eq!(reader.line_number(), 0);
    }

    #[test]
    fn increment_line_increases_count() {
        let mut reader = JsonlReader::new(Cursor::new(b""));
        reader.increment_line();
        reader.increment_line();
        assert_eq!(reader.line_number(), 2);
    }

    #[tokio::test]
    async fn read_line_skips_blank_lines_but_counts_them() {
        let mut reader = JsonlReader::new(Cursor::new(b"\n  \n{\"id\":1}\n".to_vec()));

        let line = reader.read_line().await.unwrap();
        assert_eq!(line.as_deref(), Some(r#"{"id":1}"#));
        assert_eq!(reader.line_number(), 3);

        assert!(reader.read_line().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn read_value_parses_rows_in_order() {
        let mut reader =
            JsonlReader::with_capacity(Cursor::new(b"{\"id\":1}\n{\"id\":2}".to_vec()), 64);

        assert_eq!(reader.read_value::<Row>().await.unwrap(), Some(Row { id: 1 }));
        assert_eq!(reader.read_value::<Row>().await.unwrap(), Some(Row { id: 2 }));
        assert_eq!(reader.read_value::<Row>().await.unwrap(), None);
    }

    #[tokio::test]
    async fn read_value_reports_offending_line() {
        let mut reader = JsonlReader::new(Cursor::new(b"{\"id\":1}\n\n{oops}\n".to_vec()));

        reader.read_value::<Row>().await.unwrap();
        let err = reader.read_value::<Row>().await.unwrap_err();

        match err {
            Error::Parse { line_number, .. } => assert_eq!(line_number, 3),
            other => panic!("expected parse error, got {other:?}"),
        }
    }
}
