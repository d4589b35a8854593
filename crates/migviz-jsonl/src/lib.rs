//! JSONL (JSON Lines) support for migviz.
//!
//! This library provides line-oriented reading, resilient streaming, and
//! crash-safe atomic writing of JSONL formatted data. migviz uses it for
//! record catalogs, applied-state files, and the snapshot manifest.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod atomic;
pub mod error;
pub mod reader;
pub mod stream;
pub mod warning;
pub mod writer;

pub use atomic::{write_jsonl_atomic, write_jsonl_atomic_iter};
pub use error::{Error, Result};
pub use reader::JsonlReader;
pub use stream::{read_jsonl, read_jsonl_resilient, stream_resilient};
pub use warning::{Warning, WarningCollector};
pub use writer::JsonlWriter;
