//! Index maintenance and lookup
//!
//! The manager keeps, for every dotted path reached by a full recursive
//! descent through an entity's fields:
//! - an ordered index: `BTreeMap<IndexKey, BTreeSet<id>>`
//! - a text index: `HashMap<id, lowercased string>` for string leaves
//!
//! `index` and `remove` are exact mirrors; removal prunes empty value
//! buckets and empty path buckets so stale entries never linger.

use crate::key::IndexKey;
use crate::pattern::like_to_regex;
use shale_core::{Entity, Value};
use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet};
use std::ops::Bound;
use tracing::warn;

/// Set of entity ids produced by a lookup
pub type IdSet = HashSet<String>;

type OrderedIndex = BTreeMap<IndexKey, BTreeSet<String>>;

/// Ordered and text indexes over every indexable dotted path
#[derive(Debug, Default)]
pub struct IndexManager {
    /// path -> normalized value -> ids
    ordered: HashMap<String, OrderedIndex>,
    /// path -> id -> lowercased original string
    text: HashMap<String, HashMap<String, String>>,
}

impl IndexManager {
    /// Create an empty index manager
    pub fn new() -> Self {
        Self::default()
    }

    // ========================================================================
    // Maintenance
    // ========================================================================

    /// Add index entries for every indexable path of an entity
    pub fn index(&mut self, entity: &Entity) {
        for (name, value) in &entity.fields {
            self.add(&entity.id, name, value);
        }
    }

    /// Remove an entity's entries, pruning emptied buckets
    pub fn remove(&mut self, entity: &Entity) {
        for (name, value) in &entity.fields {
            self.drop_entries(&entity.id, name, value);
        }
    }

    fn add(&mut self, id: &str, path: &str, value: &Value) {
        match value {
            Value::Map(m) => {
                for (key, child) in m {
                    self.add(id, &format!("{}.{}", path, key), child);
                }
            }
            Value::Array(items) => {
                for (position, child) in items.iter().enumerate() {
                    self.add(id, &format!("{}.{}", path, position), child);
                }
            }
            leaf => {
                if let Some(key) = IndexKey::from_value(leaf) {
                    self.ordered
                        .entry(path.to_string())
                        .or_default()
                        .entry(key)
                        .or_default()
                        .insert(id.to_string());
                }
                if let Value::String(s) = leaf {
                    self.text
                        .entry(path.to_string())
                        .or_default()
                        .insert(id.to_string(), s.to_lowercase());
                }
            }
        }
    }

    fn drop_entries(&mut self, id: &str, path: &str, value: &Value) {
        match value {
            Value::Map(m) => {
                for (key, child) in m {
                    self.drop_entries(id, &format!("{}.{}", path, key), child);
                }
            }
            Value::Array(items) => {
                for (position, child) in items.iter().enumerate() {
                    self.drop_entries(id, &format!("{}.{}", path, position), child);
                }
            }
            leaf => {
                if let Some(key) = IndexKey::from_value(leaf) {
                    if let Some(buckets) = self.ordered.get_mut(path) {
                        if let Some(ids) = buckets.get_mut(&key) {
                            ids.remove(id);
                            if ids.is_empty() {
                                buckets.remove(&key);
                            }
                        }
                        if buckets.is_empty() {
                            self.ordered.remove(path);
                        }
                    }
                }
                if matches!(leaf, Value::String(_)) {
                    if let Some(texts) = self.text.get_mut(path) {
                        texts.remove(id);
                        if texts.is_empty() {
                            self.text.remove(path);
                        }
                    }
                }
            }
        }
    }

    // ========================================================================
    // Ordered lookups
    // ========================================================================

    /// Ids whose value at `path` equals `value` (numbers normalized)
    pub fn search_equals(&self, path: &str, value: &Value) -> IdSet {
        let Some(key) = self.lookup_key(path, value) else {
            return IdSet::new();
        };
        self.ordered
            .get(path)
            .and_then(|buckets| buckets.get(&key))
            .map(|ids| ids.iter().cloned().collect())
            .unwrap_or_default()
    }

    /// Ids whose value at `path` sorts strictly after `value`, among
    /// keys of the same kind
    pub fn search_greater_than(&self, path: &str, value: &Value) -> IdSet {
        let Some(key) = self.lookup_key(path, value) else {
            return IdSet::new();
        };
        self.range_union(path, &key, (Bound::Excluded(&key), Bound::Unbounded))
    }

    /// Ids whose value at `path` sorts at or after `value`, among keys
    /// of the same kind
    pub fn search_greater_or_equals(&self, path: &str, value: &Value) -> IdSet {
        let Some(key) = self.lookup_key(path, value) else {
            return IdSet::new();
        };
        self.range_union(path, &key, (Bound::Included(&key), Bound::Unbounded))
    }

    /// Ids whose value at `path` sorts strictly before `value`, among
    /// keys of the same kind
    pub fn search_less_than(&self, path: &str, value: &Value) -> IdSet {
        let Some(key) = self.lookup_key(path, value) else {
            return IdSet::new();
        };
        self.range_union(path, &key, (Bound::Unbounded, Bound::Excluded(&key)))
    }

    /// Ids whose value at `path` sorts at or before `value`, among keys
    /// of the same kind
    pub fn search_less_or_equals(&self, path: &str, value: &Value) -> IdSet {
        let Some(key) = self.lookup_key(path, value) else {
            return IdSet::new();
        };
        self.range_union(path, &key, (Bound::Unbounded, Bound::Included(&key)))
    }

    // ========================================================================
    // Text lookups
    // ========================================================================

    /// Ids whose string at `path` contains `needle`, case-insensitively
    pub fn search_contains(&self, path: &str, needle: &str) -> IdSet {
        if path.is_empty() {
            warn!(target: "shale::index", "contains lookup with empty path");
            return IdSet::new();
        }
        let needle = needle.to_lowercase();
        self.text
            .get(path)
            .map(|texts| {
                texts
                    .iter()
                    .filter(|(_, stored)| stored.contains(&needle))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    /// Ids whose string at `path` matches a `%`/`_` wildcard pattern
    pub fn search_like(&self, path: &str, pattern: &str) -> IdSet {
        if path.is_empty() {
            warn!(target: "shale::index", "like lookup with empty path");
            return IdSet::new();
        }
        let regex = match like_to_regex(&pattern.to_lowercase()) {
            Ok(regex) => regex,
            Err(error) => {
                warn!(
                    target: "shale::index",
                    pattern, error = %error,
                    "like pattern failed to compile"
                );
                return IdSet::new();
            }
        };
        self.text
            .get(path)
            .map(|texts| {
                texts
                    .iter()
                    .filter(|(_, stored)| regex.is_match(stored))
                    .map(|(id, _)| id.clone())
                    .collect()
            })
            .unwrap_or_default()
    }

    // ========================================================================
    // Internals
    // ========================================================================

    fn lookup_key(&self, path: &str, value: &Value) -> Option<IndexKey> {
        if path.is_empty() {
            warn!(target: "shale::index", "lookup with empty path");
            return None;
        }
        let key = IndexKey::from_value(value);
        if key.is_none() {
            warn!(
                target: "shale::index",
                path,
                "lookup with unindexable value kind"
            );
        }
        key
    }

    fn range_union(
        &self,
        path: &str,
        key: &IndexKey,
        bounds: (Bound<&IndexKey>, Bound<&IndexKey>),
    ) -> IdSet {
        // One map holds every key kind for the path, and kinds sort as
        // blocks (numbers, then strings, then booleans), so a one-sided
        // range would sweep up every later block. Ordering across kinds
        // is false, so the slice stays within the query key's kind.
        self.ordered
            .get(path)
            .map(|buckets| {
                buckets
                    .range(bounds)
                    .filter(|(candidate, _)| candidate.same_kind(key))
                    .flat_map(|(_, ids)| ids.iter().cloned())
                    .collect()
            })
            .unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn entity(id: &str, body: serde_json::Value) -> Entity {
        Entity::from_json(id, body)
    }

    fn ids(set: &IdSet) -> Vec<&str> {
        let mut v: Vec<&str> = set.iter().map(String::as_str).collect();
        v.sort_unstable();
        v
    }

    #[test]
    fn test_equals_after_index() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"age": 30})));
        index.index(&entity("2", json!({"age": 25})));

        assert_eq!(ids(&index.search_equals("age", &Value::I64(30))), ["1"]);
        assert_eq!(
            ids(&index.search_equals("age", &Value::F64(25.0))),
            ["2"],
            "integer and float keys must collide"
        );
    }

    #[test]
    fn test_nested_paths_are_indexed() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"address": {"city": "Belgrade"}})));

        let hits = index.search_equals("address.city", &Value::String("Belgrade".into()));
        assert_eq!(ids(&hits), ["1"]);
    }

    #[test]
    fn test_array_elements_extend_path() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"tags": ["red", "green"]})));

        assert_eq!(
            ids(&index.search_equals("tags.0", &Value::String("red".into()))),
            ["1"]
        );
        assert_eq!(
            ids(&index.search_equals("tags.1", &Value::String("green".into()))),
            ["1"]
        );
    }

    #[test]
    fn test_range_bounds() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"age": 10})));
        index.index(&entity("2", json!({"age": 20})));
        index.index(&entity("3", json!({"age": 30})));

        assert_eq!(
            ids(&index.search_greater_than("age", &Value::I64(20))),
            ["3"]
        );
        assert_eq!(
            ids(&index.search_greater_or_equals("age", &Value::I64(20))),
            ["2", "3"]
        );
        assert_eq!(ids(&index.search_less_than("age", &Value::I64(20))), ["1"]);
        assert_eq!(
            ids(&index.search_less_or_equals("age", &Value::I64(20))),
            ["1", "2"]
        );
    }

    #[test]
    fn test_ranges_stay_within_the_query_kind() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"age": 10})));
        index.index(&entity("2", json!({"age": "zz"})));
        index.index(&entity("3", json!({"age": true})));

        // Strings and booleans sort above every number, but a numeric
        // range must not capture them.
        assert_eq!(
            ids(&index.search_greater_than("age", &Value::I64(5))),
            ["1"]
        );
        assert!(index.search_less_than("age", &Value::I64(5)).is_empty());

        assert_eq!(
            ids(&index.search_greater_or_equals("age", &Value::String("a".into()))),
            ["2"]
        );
        assert_eq!(
            ids(&index.search_less_or_equals("age", &Value::Bool(true))),
            ["3"]
        );
    }

    #[test]
    fn test_remove_mirrors_index() {
        let mut index = IndexManager::new();
        let e = entity("1", json!({"age": 30, "name": "Alice"}));
        index.index(&e);
        index.remove(&e);

        assert!(index.search_equals("age", &Value::I64(30)).is_empty());
        assert!(index.search_contains("name", "ali").is_empty());
        assert!(index.ordered.is_empty(), "path buckets must be pruned");
        assert!(index.text.is_empty());
    }

    #[test]
    fn test_remove_keeps_other_ids() {
        let mut index = IndexManager::new();
        let a = entity("1", json!({"age": 30}));
        let b = entity("2", json!({"age": 30}));
        index.index(&a);
        index.index(&b);
        index.remove(&a);

        assert_eq!(ids(&index.search_equals("age", &Value::I64(30))), ["2"]);
    }

    #[test]
    fn test_contains_is_case_insensitive() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"name": "Alice"})));
        index.index(&entity("2", json!({"name": "Bob"})));

        assert_eq!(ids(&index.search_contains("name", "LI")), ["1"]);
        assert!(index.search_contains("name", "zzz").is_empty());
    }

    #[test]
    fn test_like_wildcards() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"name": "Alice"})));
        index.index(&entity("2", json!({"name": "Alfred"})));
        index.index(&entity("3", json!({"name": "Bob"})));

        assert_eq!(ids(&index.search_like("name", "AL%")), ["1", "2"]);
        assert_eq!(ids(&index.search_like("name", "b_b")), ["3"]);
        assert!(index.search_like("name", "lice").is_empty());
    }

    #[test]
    fn test_unindexable_lookup_is_empty() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"age": 30})));

        assert!(index.search_equals("age", &Value::Null).is_empty());
        assert!(index.search_equals("", &Value::I64(30)).is_empty());
        assert!(index
            .search_greater_than("age", &Value::Array(vec![]))
            .is_empty());
    }

    #[test]
    fn test_null_leaves_are_skipped() {
        let mut index = IndexManager::new();
        index.index(&entity("1", json!({"ghost": null})));
        assert!(index.ordered.get("ghost").is_none());
    }
}
