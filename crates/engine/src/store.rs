//! The document store
//!
//! Owns the live map and routes every mutation through the index
//! manager, the version history and the WAL under one timestamp.
//! Mutations take `&mut self`; exclusive ownership is the locking
//! discipline for the single-writer model.
//!
//! With a base directory the store is durable: opening replays
//! snapshot + WAL, and `save_snapshot` truncates the log. Without one
//! it is purely in-memory.

use crate::clock::Clock;
use crate::history::VersionStore;
use shale_core::{path, Entity, Error, Fields, Result};
use shale_durability::Persistence;
use shale_index::IndexManager;
use shale_query::{parse, parse_value_expression, Filter};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Embeddable schemaless document store
#[derive(Debug, Default)]
pub struct DocumentStore {
    live: HashMap<String, Entity>,
    indexes: IndexManager,
    history: VersionStore,
    persistence: Option<Persistence>,
    clock: Clock,
}

impl DocumentStore {
    // ========================================================================
    // Construction
    // ========================================================================

    /// Create a store with no persistence: no WAL, no snapshots
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Open a durable store on a base directory, replaying any
    /// existing snapshot and WAL and rebuilding indexes and history
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let persistence = Persistence::open(dir)?;
        let outcome = persistence.load()?;

        let mut store = DocumentStore {
            persistence: Some(persistence),
            ..Self::default()
        };
        for (id, fields) in outcome.live {
            let entity = Entity::new(id, fields);
            store.indexes.index(&entity);
            store.live.insert(entity.id.clone(), entity);
        }
        store.history.bootstrap(&outcome.feed);
        store.clock.observe(store.history.last_timestamp());

        info!(
            target: "shale::store",
            entities = store.live.len(),
            snapshot_entries = outcome.stats.snapshot_entries,
            wal_records = outcome.stats.wal_records,
            skipped_lines = outcome.stats.skipped_lines,
            "recovery complete"
        );
        Ok(store)
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Insert an entity, overwriting any previous one with the same id.
    /// The store owns the fields after this call.
    pub fn insert(&mut self, entity: Entity) -> Result<()> {
        if entity.id.is_empty() {
            return Err(Error::InvalidArgument(
                "entity id must be non-empty".to_string(),
            ));
        }
        let entity = Entity::new(entity.id, entity.fields);
        let timestamp = self.clock.now();
        let id = entity.id.clone();

        if let Some(old) = self.live.remove(&id) {
            self.indexes.remove(&old);
        }
        self.indexes.index(&entity);
        self.history.record_insert(&entity, timestamp);
        let logged = match self.persistence.as_mut() {
            Some(persistence) => persistence.append_insert(&id, &entity.fields, timestamp),
            None => Ok(()),
        };
        self.live.insert(id, entity);
        // A failed append propagates only after the in-memory state is
        // in place; replay is idempotent if the caller retries.
        logged
    }

    /// Replace an entity's fields wholesale. An unknown id behaves
    /// like an insert recorded as an update.
    pub fn update(&mut self, id: &str, fields: Fields) -> Result<()> {
        if id.is_empty() {
            return Err(Error::InvalidArgument(
                "entity id must be non-empty".to_string(),
            ));
        }
        let entity = Entity::new(id, fields);
        let timestamp = self.clock.now();

        if let Some(old) = self.live.remove(id) {
            self.indexes.remove(&old);
        }
        self.indexes.index(&entity);
        self.history.record_update(id, &entity.fields, timestamp);
        let logged = match self.persistence.as_mut() {
            Some(persistence) => persistence.append_update(id, &entity.fields, timestamp),
            None => Ok(()),
        };
        self.live.insert(id.to_string(), entity);
        logged
    }

    /// Merge a delta into the current fields (delta wins per key) and
    /// apply it as a full update
    pub fn update_partial(&mut self, id: &str, delta: Fields) -> Result<()> {
        let mut merged = self
            .live
            .get(id)
            .map(|entity| entity.fields.clone())
            .unwrap_or_default();
        for (key, value) in delta {
            merged.insert(key, value);
        }
        self.update(id, merged)
    }

    /// Evaluate a value expression against the entity and write the
    /// result at a dotted path (the shell's transform surface)
    pub fn update_field(&mut self, id: &str, field_path: &str, expression: &str) -> Result<()> {
        if field_path.is_empty() {
            return Err(Error::InvalidArgument(
                "field path must be non-empty".to_string(),
            ));
        }
        let expr = parse_value_expression(expression)?;
        let entity = self
            .live
            .get(id)
            .ok_or_else(|| Error::InvalidArgument(format!("unknown entity id '{}'", id)))?;
        let value = expr.evaluate(entity);
        let mut fields = entity.fields.clone();
        path::set_at(&mut fields, field_path, value);
        self.update(id, fields)
    }

    /// Delete an entity. Unknown ids succeed without effect.
    pub fn delete(&mut self, id: &str) -> Result<()> {
        let Some(old) = self.live.remove(id) else {
            debug!(target: "shale::store", id, "delete of unknown id, nothing to do");
            return Ok(());
        };
        let timestamp = self.clock.now();
        self.indexes.remove(&old);
        self.history.record_delete(id, timestamp);
        match self.persistence.as_mut() {
            Some(persistence) => persistence.append_delete(id, timestamp),
            None => Ok(()),
        }
    }

    // ========================================================================
    // Queries
    // ========================================================================

    /// Entities matching a parsed filter, in unspecified order
    pub fn query(&self, filter: &Filter) -> Vec<Entity> {
        filter
            .evaluate(&self.indexes, &self.live)
            .into_iter()
            .filter_map(|id| self.live.get(&id).cloned())
            .collect()
    }

    /// Parse a filter expression and run it
    pub fn query_text(&self, text: &str) -> Result<Vec<Entity>> {
        let filter = parse(text)?;
        Ok(self.query(&filter))
    }

    /// Live entity by id
    pub fn get(&self, id: &str) -> Option<&Entity> {
        self.live.get(id)
    }

    /// True if the id is live
    pub fn contains(&self, id: &str) -> bool {
        self.live.contains_key(id)
    }

    /// Every live entity, in unspecified order
    pub fn find_all(&self) -> Vec<Entity> {
        self.live.values().cloned().collect()
    }

    /// Every live id, in unspecified order
    pub fn all_ids(&self) -> Vec<String> {
        self.live.keys().cloned().collect()
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.live.len()
    }

    /// True when no entity is live
    pub fn is_empty(&self) -> bool {
        self.live.is_empty()
    }

    // ========================================================================
    // Time travel
    // ========================================================================

    /// The entity as of timestamp `at`, or None if absent or deleted
    pub fn get_at(&self, id: &str, at: u64) -> Option<Entity> {
        self.history.get_at(id, at).map(|fields| Entity::new(id, fields))
    }

    /// All entities live at timestamp `at`
    pub fn snapshot_at(&self, at: u64) -> Vec<Entity> {
        self.history
            .snapshot_at(at)
            .into_iter()
            .map(|(id, fields)| Entity::new(id, fields))
            .collect()
    }

    /// Full version history of an id, annotated with `_timestamp`
    /// and `_deleted`
    pub fn get_history(&self, id: &str) -> Vec<Fields> {
        self.history.history(id)
    }

    // ========================================================================
    // Durability
    // ========================================================================

    /// Write an atomic snapshot of the live map and truncate the WAL.
    /// A no-op for in-memory stores.
    pub fn save_snapshot(&mut self) -> Result<()> {
        let Some(persistence) = self.persistence.as_mut() else {
            debug!(target: "shale::store", "snapshot requested on in-memory store");
            return Ok(());
        };
        persistence.save_snapshot(
            self.live
                .iter()
                .map(|(id, entity)| (id.as_str(), &entity.fields)),
        )?;
        info!(target: "shale::store", entities = self.live.len(), "snapshot saved");
        Ok(())
    }
}
