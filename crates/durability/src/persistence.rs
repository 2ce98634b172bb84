//! Snapshot + WAL persistence for one store directory
//!
//! `load` folds the snapshot (if any) and every readable WAL line into
//! the live map while collecting the ordered history feed that seeds
//! the version store. `save_snapshot` uses the write-fsync-rename
//! pattern: a crash at any point leaves either the prior snapshot or
//! the new one readable, never a torn file. Deleting the WAL after the
//! rename is the commit point.

use crate::wal::{Wal, WalOp, WalRecord};
use indexmap::IndexMap;
use shale_core::{Fields, Result};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::UNIX_EPOCH;
use tracing::{debug, warn};

/// Snapshot file name under the base directory
pub const SNAPSHOT_FILE: &str = "snapshot.json";
/// WAL file name under the base directory
pub const WAL_FILE: &str = "wal.log";

/// Counters reported after a `load`
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RecoveryStats {
    /// Entities read from the snapshot
    pub snapshot_entries: usize,
    /// WAL records applied
    pub wal_records: usize,
    /// WAL lines skipped as malformed or truncated
    pub skipped_lines: usize,
}

/// Result of replaying a store directory
#[derive(Debug, Default)]
pub struct LoadOutcome {
    /// Live map after snapshot + WAL replay
    pub live: IndexMap<String, Fields>,
    /// Ordered history feed (snapshot entries first, then WAL records)
    pub feed: Vec<WalRecord>,
    /// Replay counters
    pub stats: RecoveryStats,
}

/// Durable state for one store: a base directory holding the snapshot
/// and the write-ahead log
#[derive(Debug)]
pub struct Persistence {
    dir: PathBuf,
    wal: Wal,
}

impl Persistence {
    /// Open (creating if needed) a base directory and its WAL
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)?;
        let wal = Wal::open(dir.join(WAL_FILE))?;
        Ok(Persistence { dir, wal })
    }

    /// Base directory of this store
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    // ========================================================================
    // Replay
    // ========================================================================

    /// Read snapshot and WAL into a live map plus history feed.
    ///
    /// Snapshot entries are timestamped with the snapshot file's
    /// modification time; WAL records carry their own timestamps.
    /// Replaying the same files twice yields the same live map.
    pub fn load(&self) -> Result<LoadOutcome> {
        let mut outcome = LoadOutcome::default();

        let snapshot_path = self.dir.join(SNAPSHOT_FILE);
        if snapshot_path.exists() {
            let text = fs::read_to_string(&snapshot_path)?;
            let entries: IndexMap<String, Fields> = serde_json::from_str(&text)?;
            let taken_at = file_mtime_millis(&snapshot_path)?;
            outcome.stats.snapshot_entries = entries.len();
            for (id, fields) in entries {
                outcome
                    .feed
                    .push(WalRecord::insert(&id, &fields, taken_at));
                outcome.live.insert(id, fields);
            }
        }

        let wal_path = self.dir.join(WAL_FILE);
        if wal_path.exists() {
            let reader = BufReader::new(File::open(&wal_path)?);
            let lines: Vec<String> = reader.lines().collect::<std::io::Result<_>>()?;
            let total = lines.len();
            for (number, line) in lines.into_iter().enumerate() {
                let line = line.trim();
                if line.is_empty() {
                    continue;
                }
                match serde_json::from_str::<WalRecord>(line) {
                    Ok(record) => {
                        apply(&mut outcome.live, &record);
                        outcome.feed.push(record);
                        outcome.stats.wal_records += 1;
                    }
                    Err(error) => {
                        outcome.stats.skipped_lines += 1;
                        if number + 1 == total {
                            // Truncated tail from an interrupted append.
                            debug!(
                                target: "shale::durability",
                                "discarding partial final WAL line"
                            );
                        } else {
                            warn!(
                                target: "shale::durability",
                                line = number + 1,
                                error = %error,
                                "skipping malformed WAL record"
                            );
                        }
                    }
                }
            }
        }

        Ok(outcome)
    }

    // ========================================================================
    // Appends
    // ========================================================================

    /// Log an insert
    pub fn append_insert(&mut self, id: &str, fields: &Fields, timestamp: u64) -> Result<()> {
        self.wal.append(&WalRecord::insert(id, fields, timestamp))
    }

    /// Log an update
    pub fn append_update(&mut self, id: &str, fields: &Fields, timestamp: u64) -> Result<()> {
        self.wal.append(&WalRecord::update(id, fields, timestamp))
    }

    /// Log a delete
    pub fn append_delete(&mut self, id: &str, timestamp: u64) -> Result<()> {
        self.wal.append(&WalRecord::delete(id, timestamp))
    }

    // ========================================================================
    // Snapshots
    // ========================================================================

    /// Atomically replace the snapshot with the given entities, then
    /// truncate the WAL.
    pub fn save_snapshot<'a, I>(&mut self, entities: I) -> Result<()>
    where
        I: IntoIterator<Item = (&'a str, &'a Fields)>,
    {
        let ordered: BTreeMap<&str, &Fields> = entities.into_iter().collect();

        let tmp_path = self.dir.join("snapshot.json.tmp");
        {
            let file = File::create(&tmp_path)?;
            let mut writer = BufWriter::new(file);
            serde_json::to_writer(&mut writer, &ordered)?;
            writer.flush()?;
            writer.get_ref().sync_all()?;
        }
        fs::rename(&tmp_path, self.dir.join(SNAPSHOT_FILE))?;
        self.wal.reset()?;
        debug!(
            target: "shale::durability",
            entities = ordered.len(),
            "snapshot committed, WAL truncated"
        );
        Ok(())
    }
}

fn apply(live: &mut IndexMap<String, Fields>, record: &WalRecord) {
    match record.operation {
        WalOp::Insert | WalOp::Update => {
            live.insert(
                record.id.clone(),
                record.fields.clone().unwrap_or_default(),
            );
        }
        WalOp::Delete => {
            live.shift_remove(&record.id);
        }
    }
}

fn file_mtime_millis(path: &Path) -> Result<u64> {
    let modified = fs::metadata(path)?.modified()?;
    let millis = modified
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0);
    Ok(millis)
}
