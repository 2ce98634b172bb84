//! Dotted-path resolution over entity fields
//!
//! A path like `address.city` or `tags.0` walks nested maps by key and
//! arrays by base-10 index. Resolution is a free function over
//! (fields, path) so filter ASTs never hold a reference to a store.

use crate::value::{Fields, Value};

/// Resolve a dotted path against a field map.
///
/// Returns `None` when any segment misses: unknown key, non-numeric or
/// out-of-range array index, or a scalar reached before the last segment.
pub fn resolve<'a>(fields: &'a Fields, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let mut current = fields.get(segments.next()?)?;
    for segment in segments {
        current = match current {
            Value::Map(m) => m.get(segment)?,
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Write `value` at a dotted path, creating intermediate maps as needed.
///
/// Array elements are assigned in place when the segment parses as an
/// in-range index; any other intermediate that is not a map is replaced
/// by one. Used by the field-transform surface, not by queries.
pub fn set_at(fields: &mut Fields, path: &str, value: Value) {
    let segments: Vec<&str> = path.split('.').collect();
    let Some((last, parents)) = segments.split_last() else {
        return;
    };
    if last.is_empty() && parents.is_empty() {
        return;
    }

    let mut current = fields;
    for segment in parents {
        let slot = current
            .entry((*segment).to_string())
            .or_insert_with(|| Value::Map(Fields::new()));
        if !matches!(slot, Value::Map(_)) {
            *slot = Value::Map(Fields::new());
        }
        current = match slot {
            Value::Map(m) => m,
            _ => unreachable!(),
        };
    }
    current.insert((*last).to_string(), value);
}
