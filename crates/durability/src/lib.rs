//! Durability layer for shaledb
//!
//! Two files under the store's base directory:
//! - `wal.log`: newline-delimited JSON mutation records appended since
//!   the last snapshot
//! - `snapshot.json`: one JSON object mapping id to fields, written
//!   atomically via the write-fsync-rename pattern
//!
//! Opening a store replays snapshot + WAL; taking a snapshot truncates
//! the WAL, which is the commit point.

pub mod persistence;
pub mod wal;

pub use persistence::{LoadOutcome, Persistence, RecoveryStats, SNAPSHOT_FILE, WAL_FILE};
pub use wal::{Wal, WalOp, WalRecord};
