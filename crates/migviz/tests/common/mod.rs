//! Common test utilities shared across integration tests.
#![allow(dead_code)]

use chrono::{DateTime, TimeZone, Utc};
use migviz::domain::{AppliedEntry, Record};
use std::path::Path;
use std::process::{Command, Output};

/// Run the migviz binary in the specified directory
pub fn run_migviz_in_dir(dir: &Path, args: &[&str]) -> Output {
    Command::new(env!("CARGO_BIN_EXE_migviz"))
        .args(args)
        .current_dir(dir)
        .env("NO_COLOR", "1")
        .env("MIGVIZ_ASCII", "1")
        .env_remove("RUST_LOG")
        .output()
        .expect("Failed to execute migviz binary")
}

/// Midnight UTC on the given day of January 2024
pub fn day(d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap()
}

/// Write records as a JSONL catalog
pub fn write_catalog(path: &Path, records: &[Record]) {
    write_lines(path, records);
}

/// Write applied-state entries as JSONL
pub fn write_applied(path: &Path, entries: &[(&str, &str, DateTime<Utc>)]) {
    let entries: Vec<AppliedEntry> = entries
        .iter()
        .map(|(namespace, name, applied_at)| AppliedEntry {
            namespace: (*namespace).to_string(),
            name: (*name).to_string(),
            applied_at: *applied_at,
        })
        .collect();
    write_lines(path, &entries);
}

fn write_lines<T: serde::Serialize>(path: &Path, values: &[T]) {
    let mut content = String::new();
    for value in values {
        content.push_str(&serde_json::to_string(value).unwrap());
        content.push('\n');
    }
    std::fs::write(path, content).unwrap();
}
