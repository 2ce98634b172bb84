//! Write-ahead log records and file operations
//!
//! ## File format
//!
//! One JSON object per line, LF- or CRLF-terminated:
//!
//! ```text
//! {"operation":"INSERT","id":"1","fields":{"id":"1","age":30},"timestamp":1722500000000}
//! ```
//!
//! Keys are exactly `operation`, `id`, `fields` (object or null) and
//! `timestamp` (integer milliseconds). Appends flush the buffered
//! writer before returning, so a process kill loses at most the line
//! being written; replay discards a truncated tail.

use serde::{Deserialize, Serialize};
use shale_core::{Fields, Result};
use std::fs::{File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

/// Mutation kind carried by a WAL record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum WalOp {
    /// Entity inserted (or overwritten by insert)
    Insert,
    /// Entity replaced by update
    Update,
    /// Entity removed
    Delete,
}

/// One logged mutation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WalRecord {
    /// Mutation kind
    pub operation: WalOp,
    /// Entity id
    pub id: String,
    /// Full field map for insert/update, null for delete
    pub fields: Option<Fields>,
    /// Store timestamp in milliseconds, shared with the version history
    pub timestamp: u64,
}

impl WalRecord {
    /// Record an insert, deep-copying the fields
    pub fn insert(id: &str, fields: &Fields, timestamp: u64) -> Self {
        WalRecord {
            operation: WalOp::Insert,
            id: id.to_string(),
            fields: Some(fields.clone()),
            timestamp,
        }
    }

    /// Record an update, deep-copying the fields
    pub fn update(id: &str, fields: &Fields, timestamp: u64) -> Self {
        WalRecord {
            operation: WalOp::Update,
            id: id.to_string(),
            fields: Some(fields.clone()),
            timestamp,
        }
    }

    /// Record a delete (fields stay null)
    pub fn delete(id: &str, timestamp: u64) -> Self {
        WalRecord {
            operation: WalOp::Delete,
            id: id.to_string(),
            fields: None,
            timestamp,
        }
    }
}

/// Append-only handle over `wal.log`
#[derive(Debug)]
pub struct Wal {
    path: PathBuf,
    writer: BufWriter<File>,
}

impl Wal {
    /// Open the log for appending, creating it if absent
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        Ok(Wal {
            path,
            writer: BufWriter::new(file),
        })
    }

    /// Append one record as a single JSON line and flush
    pub fn append(&mut self, record: &WalRecord) -> Result<()> {
        let line = serde_json::to_string(record)?;
        self.writer.write_all(line.as_bytes())?;
        self.writer.write_all(b"\n")?;
        self.writer.flush()?;
        Ok(())
    }

    /// Truncate the log after a successful snapshot
    pub fn reset(&mut self) -> Result<()> {
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(&self.path)?;
        drop(file);
        let file = OpenOptions::new().create(true).append(true).open(&self.path)?;
        self.writer = BufWriter::new(file);
        Ok(())
    }

    /// Path of the underlying file
    pub fn path(&self) -> &Path {
        &self.path
    }
}
