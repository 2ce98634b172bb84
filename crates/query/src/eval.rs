//! Filter and value-expression evaluation
//!
//! A comparison with a plain comparable literal on the right goes
//! through the index manager; everything else scans the live map and
//! applies the comparison rules per entity. Evaluation of a well-formed
//! expression never fails: semantic mismatches collapse to `false` for
//! filters and `Null` for value expressions.

use crate::ast::{ArithOp, CompareOp, Filter, ValueExpr};
use shale_core::{path, Entity, Value};
use shale_index::{like_to_regex, IdSet, IndexManager};
use std::cmp::Ordering;
use std::collections::HashMap;

impl Filter {
    /// Evaluate to the set of matching entity ids.
    ///
    /// `live` is the store's current id-to-entity map; it backs the
    /// scan path and the complement sets used by `not` and `!=`.
    pub fn evaluate(&self, index: &IndexManager, live: &HashMap<String, Entity>) -> IdSet {
        match self {
            Filter::And(left, right) => {
                let a = left.evaluate(index, live);
                let b = right.evaluate(index, live);
                a.intersection(&b).cloned().collect()
            }
            Filter::Or(left, right) => {
                let a = left.evaluate(index, live);
                let b = right.evaluate(index, live);
                a.union(&b).cloned().collect()
            }
            Filter::Not(inner) => {
                let matched = inner.evaluate(index, live);
                live.keys()
                    .filter(|id| !matched.contains(*id))
                    .cloned()
                    .collect()
            }
            Filter::Compare { path, op, rhs } => indexed_lookup(path, *op, rhs, index, live)
                .unwrap_or_else(|| scan(path, *op, rhs, live)),
        }
    }

    /// True when this filter matches the given entity (scan semantics)
    pub fn matches(&self, entity: &Entity) -> bool {
        match self {
            Filter::And(left, right) => left.matches(entity) && right.matches(entity),
            Filter::Or(left, right) => left.matches(entity) || right.matches(entity),
            Filter::Not(inner) => !inner.matches(entity),
            Filter::Compare { path: field, op, rhs } => {
                let left = resolve_or_null(entity, field);
                let right = rhs.evaluate(entity);
                compare(*op, &left, &right)
            }
        }
    }
}

impl ValueExpr {
    /// Evaluate against one entity; the entity is the whole environment
    pub fn evaluate(&self, entity: &Entity) -> Value {
        match self {
            ValueExpr::Literal(value) => value.clone(),
            ValueExpr::Field(field) => resolve_or_null(entity, field),
            ValueExpr::Neg(inner) => match inner.evaluate(entity) {
                Value::I64(i) => Value::I64(-i),
                Value::F64(f) => Value::F64(-f),
                _ => Value::Null,
            },
            ValueExpr::Binary { op, lhs, rhs } => {
                let left = lhs.evaluate(entity);
                let right = rhs.evaluate(entity);
                arithmetic(*op, &left, &right)
            }
        }
    }
}

// ============================================================================
// Indexed fast path
// ============================================================================

fn indexed_lookup(
    field: &str,
    op: CompareOp,
    rhs: &ValueExpr,
    index: &IndexManager,
    live: &HashMap<String, Entity>,
) -> Option<IdSet> {
    let literal = rhs.as_index_literal()?;
    let ids = match op {
        CompareOp::Eq => index.search_equals(field, literal),
        CompareOp::Ne => {
            let equal = index.search_equals(field, literal);
            live.keys()
                .filter(|id| !equal.contains(*id))
                .cloned()
                .collect()
        }
        CompareOp::Gt => index.search_greater_than(field, literal),
        CompareOp::Ge => index.search_greater_or_equals(field, literal),
        CompareOp::Lt => index.search_less_than(field, literal),
        CompareOp::Le => index.search_less_or_equals(field, literal),
        CompareOp::Contains => match literal {
            Value::String(needle) => index.search_contains(field, needle),
            _ => return None,
        },
        CompareOp::Like => match literal {
            Value::String(pattern) => index.search_like(field, pattern),
            _ => return None,
        },
    };
    Some(ids)
}

// ============================================================================
// Scan path
// ============================================================================

fn scan(field: &str, op: CompareOp, rhs: &ValueExpr, live: &HashMap<String, Entity>) -> IdSet {
    live.values()
        .filter(|entity| {
            let left = resolve_or_null(entity, field);
            let right = rhs.evaluate(entity);
            compare(op, &left, &right)
        })
        .map(|entity| entity.id.clone())
        .collect()
}

fn resolve_or_null(entity: &Entity, field: &str) -> Value {
    path::resolve(&entity.fields, field)
        .cloned()
        .unwrap_or(Value::Null)
}

// ============================================================================
// Comparison rules
// ============================================================================

/// Apply one comparison operator to two evaluated values
pub fn compare(op: CompareOp, left: &Value, right: &Value) -> bool {
    match op {
        CompareOp::Eq => values_equal(left, right),
        CompareOp::Ne => !values_equal(left, right),
        CompareOp::Gt => ordering(left, right) == Some(Ordering::Greater),
        CompareOp::Ge => matches!(
            ordering(left, right),
            Some(Ordering::Greater) | Some(Ordering::Equal)
        ),
        CompareOp::Lt => ordering(left, right) == Some(Ordering::Less),
        CompareOp::Le => matches!(
            ordering(left, right),
            Some(Ordering::Less) | Some(Ordering::Equal)
        ),
        CompareOp::Contains => match (left, right) {
            (Value::String(haystack), Value::String(needle)) => haystack
                .to_lowercase()
                .contains(&needle.to_lowercase()),
            _ => false,
        },
        CompareOp::Like => match (left, right) {
            (Value::String(text), Value::String(pattern)) => {
                like_to_regex(&pattern.to_lowercase())
                    .map(|regex| regex.is_match(&text.to_lowercase()))
                    .unwrap_or(false)
            }
            _ => false,
        },
    }
}

fn values_equal(left: &Value, right: &Value) -> bool {
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return left == right;
    }
    if left.is_number() || right.is_number() {
        return match (left.coerce_number(), right.coerce_number()) {
            (Some(a), Some(b)) => a == b,
            _ => false,
        };
    }
    left == right
}

fn ordering(left: &Value, right: &Value) -> Option<Ordering> {
    if matches!(left, Value::Null) || matches!(right, Value::Null) {
        return None;
    }
    if left.is_number() || right.is_number() {
        let a = left.coerce_number()?;
        let b = right.coerce_number()?;
        // partial_cmp gives IEEE semantics: NaN orders with nothing.
        return a.partial_cmp(&b);
    }
    match (left, right) {
        (Value::String(a), Value::String(b)) => Some(a.cmp(b)),
        (Value::Bool(a), Value::Bool(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

// ============================================================================
// Arithmetic
// ============================================================================

fn arithmetic(op: ArithOp, left: &Value, right: &Value) -> Value {
    if left.is_number() || right.is_number() {
        let (Some(a), Some(b)) = (arith_operand(left), arith_operand(right)) else {
            return Value::Null;
        };
        let result = match op {
            ArithOp::Add => a + b,
            ArithOp::Sub => a - b,
            ArithOp::Mul => a * b,
            ArithOp::Div => a / b,
        };
        return Value::F64(result);
    }
    if op == ArithOp::Add {
        return Value::String(format!("{}{}", left, right));
    }
    Value::Null
}

fn arith_operand(value: &Value) -> Option<f64> {
    match value {
        Value::Null => Some(0.0),
        other => other.coerce_number(),
    }
}
