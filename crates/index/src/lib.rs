//! Secondary indexes for shaledb
//!
//! This crate maintains two index families per dotted field path:
//! - an ordered index from normalized value to id-set, answering
//!   equality and range lookups
//! - a text index from id to lowercased string, answering substring
//!   and SQL-style wildcard lookups
//!
//! The index manager is strictly internal to the store: lookups with
//! unusable arguments warn and return the empty set, never an error.

pub mod key;
pub mod manager;
pub mod pattern;

pub use key::IndexKey;
pub use manager::{IdSet, IndexManager};
pub use pattern::like_to_regex;
