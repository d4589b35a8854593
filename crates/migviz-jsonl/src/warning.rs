//! Warning types for non-fatal errors during JSONL processing.
//!
//! When processing JSONL files it is often desirable to continue reading
//! even when individual lines are bad. The [`Warning`] type represents these
//! non-fatal errors, and the [`WarningCollector`] accumulates them during
//! streaming.
//!
//! # Examples
//!
//! ```
//! use migviz_jsonl::warning::{Warning, WarningCollector};
//!
//! let collector = WarningCollector::new();
//! collector.add(Warning::MalformedJson {
//!     line_number: 5,
//!     error: "unexpected end of input".to_string(),
//! });
//!
//! let warnings = collector.into_warnings();
//! assert_eq!(warnings.len(), 1);
//! ```

use serde_json::error::Category;
use std::sync::{Arc, Mutex};

/// A non-fatal warning that occurred during JSONL processing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Warning {
    /// A line contained malformed JSON that could not be parsed.
    MalformedJson {
        /// The 1-based line number where the error occurred.
        line_number: usize,
        /// A description of the JSON parsing error.
        error: String,
    },

    /// A line was well-formed JSON but did not match the expected record
    /// shape, or could not be read at all.
    SkippedLine {
        /// The 1-based line number that was skipped.
        line_number: usize,
        /// The reason the line was skipped.
        reason: String,
    },
}

impl Warning {
    /// Classifies a deserialization failure for the given line.
    ///
    /// Syntax and truncation errors become [`Warning::MalformedJson`]; shape
    /// mismatches (missing fields, wrong types) become
    /// [`Warning::SkippedLine`].
    #[must_use]
    pub fn from_json_error(line_number: usize, error: &serde_json::Error) -> Self {
        match error.classify() {
            Category::Data => Self::SkippedLine {
                line_number,
                reason: format!("unexpected record shape: {error}"),
            },
            Category::Syntax | Category::Eof | Category::Io => Self::MalformedJson {
                line_number,
                error: error.to_string(),
            },
        }
    }

    /// Returns the line number associated with this warning.
    #[must_use]
    pub fn line_number(&self) -> usize {
        match self {
            Self::MalformedJson { line_number, .. } | Self::SkippedLine { line_number, .. } => {
                *line_number
            }
        }
    }

    /// Returns a human-readable description of the warning.
    #[must_use]
    pub fn description(&self) -> String {
        match self {
            Self::MalformedJson { line_number, error } => {
                format!("line {line_number}: malformed JSON: {error}")
            }
            Self::SkippedLine {
                line_number,
                reason,
            } => format!("line {line_number}: skipped: {reason}"),
        }
    }

    /// Returns a static string identifying the warning kind.
    #[must_use]
    pub fn kind(&self) -> &'static str {
        match self {
            Self::MalformedJson { .. } => "malformed_json",
            Self::SkippedLine { .. } => "skipped_line",
        }
    }
}

impl std::fmt::Display for Warning {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.description())
    }
}

impl std::error::Error for Warning {}

/// A thread-safe collector for accumulating warnings during JSONL processing.
///
/// Clones share the same underlying list, so a clone can be moved into a
/// stream while the caller keeps the original to read the results.
///
/// # Mutex Poisoning
///
/// All methods panic if the internal mutex is poisoned, which only occurs
/// if another thread panicked while holding the lock.
#[derive(Debug, Clone, Default)]
pub struct WarningCollector {
    warnings: Arc<Mutex<Vec<Warning>>>,
}

impl WarningCollector {
    /// Creates a new empty `WarningCollector`.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a warning to the collector.
    pub fn add(&self, warning: Warning) {
        tracing::debug!(kind = warning.kind(), line = warning.line_number(), "JSONL warning");
        self.warnings
            .lock()
            .expect("warning collector mutex should not be poisoned")
            .push(warning);
    }

    /// Returns the number of warnings collected.
    #[must_use]
    pub fn len(&self) -> usize {
        self.warnings
            .lock()
            .expect("warning collector mutex should not be poisoned")
            .len()
    }

    /// Returns `true` if no warnings have been collected.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Consumes the collector and returns all collected warnings.
    ///
    /// If this is the last reference to the underlying warning storage,
    /// the warnings are moved out directly. Otherwise, they are cloned.
    #[must_use]
    pub fn into_warnings(self) -> Vec<Warning> {
        Arc::try_unwrap(self.warnings)
            .map(|mutex| mutex.into_inner().expect("mutex should not be poisoned"))
            .unwrap_or_else(|arc| {
                arc.lock()
                    .expect("warning collector mutex should not be poisoned")
                    .clone()
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::syntax("{oops", "malformed_json")]
    #[case::truncated("{\"id\": 1", "malformed_json")]
    #[case::wrong_shape("{\"name\": \"x\"}", "skipped_line")]
    #[case::wrong_type("{\"id\": \"one\"}", "skipped_line")]
    fn from_json_error_classifies(#[case] input: &str, #[case] expected_kind: &str) {
        #[derive(Debug, serde::Deserialize)]
        #[allow(dead_code)]
        struct Row {
            id: u32,
        }

        let err = serde_json::from_str::<Row>(input).unwrap_err();
        let warning = Warning::from_json_error(4, &err);

        assert_eq!(warning.kind(), expected_kind);
        assert_eq!(warning.line_number(), 4);
    }

    #[test]
    fn description_includes_line_and_detail() {
        let warning = Warning::SkippedLine {
            line_number: 15,
            reason: "unexpected record shape".to_string(),
        };

        let desc = warning.description();
        assert!(desc.contains("line 15"));
        assert!(desc.contains("skipped"));
        assert_eq!(format!("{warning}"), desc);
    }

    #[test]
    fn clones_share_storage() {
        let collector = WarningCollector::new();
        let clone = collector.clone();

        clone.add(Warning::MalformedJson {
            line_number: 1,
            error: "bad".to_string(),
        });

        assert_eq!(collector.len(), 1);
        drop(clone);
        assert_eq!(collector.into_warnings().len(), 1);
    }

    #[test]
    fn into_warnings_clones_when_shared() {
        let collector = WarningCollector::new();
        let keep = collector.clone();
        collector.add(Warning::MalformedJson {
            line_number: 2,
            error: "bad".to_string(),
        });

        let warnings = collector.into_warnings();
        assert_eq!(warnings.len(), 1);
        assert!(!keep.is_empty());
    }
}
