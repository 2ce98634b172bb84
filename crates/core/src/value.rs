//! Value model and entities
//!
//! This module defines:
//! - Value: unified enum for all schemaless field values
//! - Fields: insertion-ordered mapping from field name to Value
//! - Entity: an (id, fields) pair, the unit the store works with
//!
//! Numbers keep their original integer/float kind in memory; the index
//! and comparison layers normalize both to f64 so that `5` and `5.0`
//! meet at the same key.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Insertion-ordered mapping from field name to value
pub type Fields = IndexMap<String, Value>;

/// Unified value type for entity fields
///
/// Serializes as plain JSON (untagged), so the on-disk snapshot and WAL
/// formats contain ordinary JSON objects rather than enum wrappers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Value {
    /// Null value
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    I64(i64),
    /// 64-bit floating point
    F64(f64),
    /// UTF-8 string
    String(String),
    /// Array of values
    Array(Vec<Value>),
    /// Nested mapping, preserving insertion order
    Map(IndexMap<String, Value>),
}

impl Value {
    /// True for `I64` and `F64`
    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::F64(_))
    }

    /// The numeric value normalized to f64, for numbers only
    pub fn as_number(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    /// Coerce to f64 the way comparisons do: numbers pass through,
    /// anything else is parsed from its rendered string form.
    ///
    /// `Value::String("5")` coerces to `5.0`; booleans, nulls, arrays
    /// and maps fail (their string forms do not parse as doubles).
    pub fn coerce_number(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::F64(f) => Some(*f),
            Value::String(s) => s.trim().parse::<f64>().ok(),
            _ => None,
        }
    }

    /// Unwrap a `Map` variant into a `Fields` map
    pub fn into_map(self) -> Option<Fields> {
        match self {
            Value::Map(m) => Some(m),
            _ => None,
        }
    }

    /// Convert to a `serde_json::Value` tree
    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Value::Null => serde_json::Value::Null,
            Value::Bool(b) => serde_json::Value::Bool(*b),
            Value::I64(i) => serde_json::Value::from(*i),
            Value::F64(f) => serde_json::Number::from_f64(*f)
                .map(serde_json::Value::Number)
                .unwrap_or(serde_json::Value::Null),
            Value::String(s) => serde_json::Value::String(s.clone()),
            Value::Array(items) => {
                serde_json::Value::Array(items.iter().map(Value::to_json).collect())
            }
            Value::Map(m) => serde_json::Value::Object(
                m.iter().map(|(k, v)| (k.clone(), v.to_json())).collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::I64(i),
                None => Value::F64(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(m) => {
                Value::Map(m.into_iter().map(|(k, v)| (k, Value::from(v))).collect())
            }
        }
    }
}

impl fmt::Display for Value {
    /// Renders scalars bare (`5`, `true`, `belgrade`) and composites as
    /// compact JSON. This is the `toString` used by string concatenation
    /// and numeric coercion.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "null"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::I64(i) => write!(f, "{}", i),
            Value::F64(n) => write!(f, "{}", n),
            Value::String(s) => write!(f, "{}", s),
            composite => {
                let rendered = serde_json::to_string(composite)
                    .unwrap_or_else(|_| String::from("null"));
                write!(f, "{}", rendered)
            }
        }
    }
}

/// An entity: non-empty id plus its schemaless fields
///
/// The store guarantees that `fields["id"]` always equals `id`;
/// `Entity::new` writes the id into the fields to enforce it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    /// Unique identifier within a store
    pub id: String,
    /// Field map, insertion-ordered
    pub fields: Fields,
}

impl Entity {
    /// Create an entity, stamping `id` into the field map
    pub fn new(id: impl Into<String>, mut fields: Fields) -> Self {
        let id = id.into();
        fields.insert("id".to_string(), Value::String(id.clone()));
        Entity { id, fields }
    }

    /// Create an entity from a JSON object literal
    ///
    /// Non-object JSON yields an entity with only the `id` field.
    pub fn from_json(id: impl Into<String>, json: serde_json::Value) -> Self {
        let fields = Value::from(json).into_map().unwrap_or_default();
        Entity::new(id, fields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_value_json_round_trip() {
        let original = Value::from(json!({
            "name": "Alice",
            "age": 30,
            "score": 4.5,
            "tags": ["a", "b"],
            "address": {"city": "Belgrade"}
        }));
        let text = serde_json::to_string(&original).unwrap();
        let back: Value = serde_json::from_str(&text).unwrap();
        assert_eq!(original, back);
    }

    #[test]
    fn test_value_untagged_variants() {
        assert_eq!(Value::from(json!(null)), Value::Null);
        assert_eq!(Value::from(json!(true)), Value::Bool(true));
        assert_eq!(Value::from(json!(42)), Value::I64(42));
        assert_eq!(Value::from(json!(2.5)), Value::F64(2.5));
        assert_eq!(
            Value::from(json!("hi")),
            Value::String("hi".to_string())
        );
    }

    #[test]
    fn test_map_preserves_insertion_order() {
        let value = Value::from(json!({"z": 1, "a": 2, "m": 3}));
        let map = value.into_map().unwrap();
        let keys: Vec<&str> = map.keys().map(String::as_str).collect();
        assert_eq!(keys, vec!["z", "a", "m"]);
    }

    #[test]
    fn test_coerce_number() {
        assert_eq!(Value::I64(5).coerce_number(), Some(5.0));
        assert_eq!(Value::F64(5.5).coerce_number(), Some(5.5));
        assert_eq!(Value::String("5".into()).coerce_number(), Some(5.0));
        assert_eq!(Value::String("abc".into()).coerce_number(), None);
        assert_eq!(Value::Bool(true).coerce_number(), None);
        assert_eq!(Value::Null.coerce_number(), None);
    }

    #[test]
    fn test_display_scalars_bare() {
        assert_eq!(Value::I64(5).to_string(), "5");
        assert_eq!(Value::String("x".into()).to_string(), "x");
        assert_eq!(Value::Bool(false).to_string(), "false");
        assert_eq!(Value::Null.to_string(), "null");
    }

    #[test]
    fn test_display_composites_as_json() {
        let v = Value::from(json!({"a": [1, 2]}));
        assert_eq!(v.to_string(), r#"{"a":[1,2]}"#);
    }

    #[test]
    fn test_entity_new_stamps_id_field() {
        let entity = Entity::from_json("e1", json!({"age": 30}));
        assert_eq!(entity.id, "e1");
        assert_eq!(
            entity.fields.get("id"),
            Some(&Value::String("e1".to_string()))
        );
    }

    #[test]
    fn test_entity_new_overwrites_conflicting_id_field() {
        let entity = Entity::from_json("real", json!({"id": "fake", "x": 1}));
        assert_eq!(
            entity.fields.get("id"),
            Some(&Value::String("real".to_string()))
        );
    }
}
