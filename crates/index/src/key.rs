//! Normalized, totally ordered index keys
//!
//! The ordered index stores values of different kinds in one balanced
//! map, so the key needs a total order that never panics across kinds:
//! numbers sort before strings, strings before booleans, and within a
//! kind the natural order applies. Numbers are normalized to f64 so
//! that integer `5` and float `5.0` land on the same key.

use shale_core::Value;
use std::cmp::Ordering;

/// A value normalized for the ordered index
#[derive(Debug, Clone, PartialEq)]
pub enum IndexKey {
    /// Any numeric value, normalized to double
    Number(f64),
    /// String, kept in original case (the text index handles folding)
    String(String),
    /// Boolean, false < true
    Bool(bool),
}

impl IndexKey {
    /// Normalize an indexable value into a key.
    ///
    /// Nulls, arrays and maps are not indexable and yield `None`;
    /// the descent simply records no entry for them.
    pub fn from_value(value: &Value) -> Option<IndexKey> {
        match value {
            Value::I64(i) => Some(IndexKey::Number(*i as f64)),
            Value::F64(f) => Some(IndexKey::Number(*f)),
            Value::String(s) => Some(IndexKey::String(s.clone())),
            Value::Bool(b) => Some(IndexKey::Bool(*b)),
            _ => None,
        }
    }

    fn kind_rank(&self) -> u8 {
        match self {
            IndexKey::Number(_) => 0,
            IndexKey::String(_) => 1,
            IndexKey::Bool(_) => 2,
        }
    }

    /// True when both keys hold the same kind of value
    pub fn same_kind(&self, other: &Self) -> bool {
        self.kind_rank() == other.kind_rank()
    }
}

// f64::total_cmp makes the order lawful for every bit pattern,
// so Eq and Ord are safe to implement by hand.
impl Eq for IndexKey {}

impl Ord for IndexKey {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (IndexKey::Number(a), IndexKey::Number(b)) => a.total_cmp(b),
            (IndexKey::String(a), IndexKey::String(b)) => a.cmp(b),
            (IndexKey::Bool(a), IndexKey::Bool(b)) => a.cmp(b),
            (a, b) => a.kind_rank().cmp(&b.kind_rank()),
        }
    }
}

impl PartialOrd for IndexKey {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_and_float_collide() {
        let a = IndexKey::from_value(&Value::I64(5)).unwrap();
        let b = IndexKey::from_value(&Value::F64(5.0)).unwrap();
        assert_eq!(a.cmp(&b), Ordering::Equal);
    }

    #[test]
    fn test_kind_order_number_string_bool() {
        let n = IndexKey::Number(1e9);
        let s = IndexKey::String("a".to_string());
        let b = IndexKey::Bool(false);
        assert!(n < s);
        assert!(s < b);
    }

    #[test]
    fn test_natural_order_within_kinds() {
        assert!(IndexKey::Number(1.0) < IndexKey::Number(2.0));
        assert!(IndexKey::String("abc".into()) < IndexKey::String("abd".into()));
        assert!(IndexKey::Bool(false) < IndexKey::Bool(true));
    }

    #[test]
    fn test_unindexable_values() {
        assert!(IndexKey::from_value(&Value::Null).is_none());
        assert!(IndexKey::from_value(&Value::Array(vec![])).is_none());
    }

    #[test]
    fn test_same_kind() {
        assert!(IndexKey::Number(1.0).same_kind(&IndexKey::Number(-7.5)));
        assert!(IndexKey::String("a".into()).same_kind(&IndexKey::String("b".into())));
        assert!(!IndexKey::Number(1.0).same_kind(&IndexKey::String("1".into())));
        assert!(!IndexKey::Bool(true).same_kind(&IndexKey::Number(1.0)));
    }
}
