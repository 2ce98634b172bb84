//! Per-entity version history and time travel
//!
//! Every successful mutation appends a `Version`: a timestamped deep
//! copy of the fields, or a tombstone for a delete. Per id the list is
//! kept sorted by timestamp; appends insert at the right position, so
//! a bootstrap feed that arrives slightly out of order still lands
//! sorted. History is never pruned; re-inserting a deleted id appends
//! past its tombstone.

use shale_core::{Entity, Fields, Value};
use shale_durability::{WalOp, WalRecord};
use std::collections::HashMap;

/// Synthetic key carrying the version timestamp in history rows
pub const TIMESTAMP_KEY: &str = "_timestamp";
/// Synthetic key carrying the tombstone flag in history rows
pub const DELETED_KEY: &str = "_deleted";

/// One recorded state of an entity
#[derive(Debug, Clone, PartialEq)]
pub struct Version {
    /// Mutation timestamp in milliseconds
    pub timestamp: u64,
    /// Deep copy of the fields, or None for a tombstone
    pub fields: Option<Fields>,
    /// True when this version records a delete
    pub deleted: bool,
}

/// All version lists, keyed by entity id
#[derive(Debug, Default)]
pub struct VersionStore {
    versions: HashMap<String, Vec<Version>>,
}

impl VersionStore {
    /// Create an empty version store
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Recording
    // ========================================================================

    /// Record an insert
    pub fn record_insert(&mut self, entity: &Entity, timestamp: u64) {
        self.push(
            &entity.id,
            Version {
                timestamp,
                fields: Some(entity.fields.clone()),
                deleted: false,
            },
        );
    }

    /// Record a full-replacement update
    pub fn record_update(&mut self, id: &str, fields: &Fields, timestamp: u64) {
        self.push(
            id,
            Version {
                timestamp,
                fields: Some(fields.clone()),
                deleted: false,
            },
        );
    }

    /// Record a delete tombstone
    pub fn record_delete(&mut self, id: &str, timestamp: u64) {
        self.push(
            id,
            Version {
                timestamp,
                fields: None,
                deleted: true,
            },
        );
    }

    fn push(&mut self, id: &str, version: Version) {
        let list = self.versions.entry(id.to_string()).or_default();
        // Sorted insert keeps the invariant even when a feed arrives
        // out of timestamp order; equal stamps keep arrival order.
        let at = list.partition_point(|v| v.timestamp <= version.timestamp);
        list.insert(at, version);
    }

    // ========================================================================
    // Reads
    // ========================================================================

    /// Fields of the newest non-deleted version at or before `at`,
    /// deep-copied; None if the id was absent or deleted at that time
    pub fn get_at(&self, id: &str, at: u64) -> Option<Fields> {
        let list = self.versions.get(id)?;
        let idx = list.partition_point(|v| v.timestamp <= at);
        if idx == 0 {
            return None;
        }
        let version = &list[idx - 1];
        if version.deleted {
            None
        } else {
            version.fields.clone()
        }
    }

    /// Every version of an id, oldest first, each annotated with
    /// `_timestamp` and `_deleted`
    pub fn history(&self, id: &str) -> Vec<Fields> {
        self.versions
            .get(id)
            .map(|list| list.iter().map(annotate).collect())
            .unwrap_or_default()
    }

    /// Live view of every id at time `at`, omitting deletions
    pub fn snapshot_at(&self, at: u64) -> HashMap<String, Fields> {
        self.versions
            .keys()
            .filter_map(|id| self.get_at(id, at).map(|fields| (id.clone(), fields)))
            .collect()
    }

    /// Largest timestamp recorded anywhere, 0 when empty
    pub fn last_timestamp(&self) -> u64 {
        self.versions
            .values()
            .filter_map(|list| list.last())
            .map(|v| v.timestamp)
            .max()
            .unwrap_or(0)
    }

    // ========================================================================
    // Bootstrap
    // ========================================================================

    /// Reset and rebuild from a replayed feed. Inserts and updates
    /// become versions, deletes become tombstones.
    pub fn bootstrap(&mut self, feed: &[WalRecord]) {
        self.versions.clear();
        for record in feed {
            match record.operation {
                WalOp::Insert | WalOp::Update => self.push(
                    &record.id,
                    Version {
                        timestamp: record.timestamp,
                        fields: Some(record.fields.clone().unwrap_or_default()),
                        deleted: false,
                    },
                ),
                WalOp::Delete => self.record_delete(&record.id, record.timestamp),
            }
        }
    }
}

fn annotate(version: &Version) -> Fields {
    let mut fields = version.fields.clone().unwrap_or_default();
    fields.insert(
        TIMESTAMP_KEY.to_string(),
        Value::I64(version.timestamp as i64),
    );
    fields.insert(DELETED_KEY.to_string(), Value::Bool(version.deleted));
    fields
}
