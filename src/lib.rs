//! # shaledb
//!
//! An embeddable, schemaless document store: live working set in
//! memory, secondary indexes over nested fields, a small filter
//! language, full per-entity version history with time travel, and
//! durability through a write-ahead log plus atomic snapshots.
//!
//! # Quick Start
//!
//! ```
//! use shaledb::{DocumentStore, Entity};
//!
//! fn main() -> shaledb::Result<()> {
//!     let mut store = DocumentStore::in_memory();
//!
//!     store.insert(Entity::from_json("1", serde_json::json!({
//!         "name": "Alice",
//!         "age": 30,
//!         "address": {"city": "Belgrade"}
//!     })))?;
//!     store.insert(Entity::from_json("2", serde_json::json!({
//!         "name": "Bob",
//!         "age": 25
//!     })))?;
//!
//!     // Filters run against secondary indexes where they can.
//!     let hits = store.query_text(r#"address.city == "Belgrade" and age < 35"#)?;
//!     assert_eq!(hits.len(), 1);
//!     assert_eq!(hits[0].id, "1");
//!
//!     // Every mutation is versioned; deletes leave tombstones.
//!     store.delete("2")?;
//!     assert_eq!(store.get_history("2").len(), 2);
//!
//!     Ok(())
//! }
//! ```
//!
//! # Durability
//!
//! Open with a base directory to persist: mutations append to
//! `wal.log`, [`DocumentStore::save_snapshot`] atomically rewrites
//! `snapshot.json` and truncates the log, and reopening replays both.
//!
//! ```no_run
//! use shaledb::DocumentStore;
//!
//! fn main() -> shaledb::Result<()> {
//!     let mut store = DocumentStore::open("./data")?;
//!     store.save_snapshot()?;
//!     Ok(())
//! }
//! ```

pub use shale_core::{Entity, Error, Fields, Result, Value};
pub use shale_durability::{WalOp, WalRecord};
pub use shale_engine::{DocumentStore, Version, VersionStore};
pub use shale_index::IndexManager;
pub use shale_query::{parse, parse_value_expression, CompareOp, Filter, ValueExpr};
