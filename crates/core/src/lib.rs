//! Core types for shaledb
//!
//! This crate defines the foundational types used throughout the system:
//! - Value: schemaless field value (scalars, arrays, nested maps)
//! - Entity: an (id, fields) pair, the unit of storage
//! - Dotted-path resolution over nested fields
//! - Error: unified error type hierarchy

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod path;
pub mod value;

pub use error::{Error, Result};
pub use path::{resolve, set_at};
pub use value::{Entity, Fields, Value};
