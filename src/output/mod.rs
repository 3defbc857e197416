//! Durable newline-delimited JSON output
//!
//! The sink is truncated exactly once when created, then appended to one
//! record at a time. Each append flushes before returning, so a crash
//! between pages loses at most the current page's unwritten tail.

use crate::Result;
use serde::Serialize;
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Append-only record writer with truncate-on-create semantics
pub struct JsonlSink {
    writer: BufWriter<File>,
}

impl JsonlSink {
    /// Creates the sink, truncating any previous contents
    ///
    /// The parent directory is created on demand. Each run starts from a
    /// fresh destination rather than appending to stale data.
    pub fn create(path: &Path) -> Result<Self> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let file = OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .open(path)?;

        Ok(Self {
            writer: BufWriter::new(file),
        })
    }

    /// Appends one record as a single JSON line and flushes it
    ///
    /// serde_json leaves non-ASCII characters unescaped, so the output
    /// stays readable UTF-8.
    pub fn append<R: Serialize>(&mut self, record: &R) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }
}
