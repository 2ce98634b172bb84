//! Filter language for shaledb
//!
//! A recursive-descent parser and evaluator for expressions like
//!
//! ```text
//! address.city == "Belgrade" and age < 35
//! name like "al%" or not (score > 0.5)
//! salary > &bonus * 12
//! {"role": "admin", "active": true}
//! ```
//!
//! Filters evaluate to id-sets against the index manager where the
//! right-hand side is a plain comparable literal, and fall back to a
//! full scan for field references and arithmetic. Value expressions
//! (`&path`, literals, `+ - * /`) are exposed separately so callers
//! can compute fresh field values against an entity.

pub mod ast;
pub mod eval;
pub mod parser;
pub mod token;

pub use ast::{ArithOp, CompareOp, Filter, ValueExpr};
pub use parser::{parse, parse_value_expression};
