//! CLI input validation functions.
//!
//! These validators are used by clap's `value_parser` attribute to validate
//! user input at parse time, providing immediate feedback for invalid values.

use crate::render::OutputFormat;
use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp and normalize it to UTC.
///
/// Examples: `2024-03-01T12:00:00Z`, `2024-03-01T13:00:00+01:00`
pub fn parse_cutoff(s: &str) -> Result<DateTime<Utc>, String> {
    let s = s.trim();
    DateTime::parse_from_rfc3339(s)
        .map(|at| at.with_timezone(&Utc))
        .map_err(|e| {
            format!("Invalid timestamp '{s}': {e}. Expected RFC 3339, e.g. 2024-03-01T12:00:00Z")
        })
}

/// Validate a snapshot output format token.
pub fn parse_output_format(s: &str) -> Result<OutputFormat, String> {
    OutputFormat::new(s.trim()).map_err(|e| e.to_string())
}
