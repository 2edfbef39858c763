//! Field value types and comparison operators for RelicDB.

use crate::error::{RelicError, Result};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;

/// Serialized width of a CHAR field in bytes. Shorter strings are
/// NUL-padded on disk.
pub const CHAR_WIDTH: usize = 32;

/// Identifier for the supported column types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldType {
    Int,
    Double,
    Char,
}

impl FieldType {
    /// Returns the serialized byte width for this type.
    pub fn byte_size(&self) -> usize {
        match self {
            FieldType::Int => 4,
            FieldType::Double => 8,
            FieldType::Char => CHAR_WIDTH,
        }
    }
}

impl std::fmt::Display for FieldType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            FieldType::Int => "INT",
            FieldType::Double => "DOUBLE",
            FieldType::Char => "CHAR",
        };
        write!(f, "{}", name)
    }
}

/// Comparison operators for predicates and cardinality estimates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PredicateOp {
    Eq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

/// A single column value.
#[derive(Debug, Clone, PartialEq)]
pub enum Field {
    Int(i32),
    Double(f64),
    Char(String),
}

impl Field {
    /// Returns the type of this value.
    pub fn field_type(&self) -> FieldType {
        match self {
            Field::Int(_) => FieldType::Int,
            Field::Double(_) => FieldType::Double,
            Field::Char(_) => FieldType::Char,
        }
    }

    /// Orders this value against another.
    ///
    /// Int and Double compare numerically against each other; Char only
    /// compares against Char. Anything else is a type mismatch.
    pub fn ordering(&self, other: &Field) -> Result<Ordering> {
        match (self, other) {
            (Field::Int(a), Field::Int(b)) => Ok(a.cmp(b)),
            (Field::Double(a), Field::Double(b)) => Ok(a.total_cmp(b)),
            (Field::Int(a), Field::Double(b)) => Ok((*a as f64).total_cmp(b)),
            (Field::Double(a), Field::Int(b)) => Ok(a.total_cmp(&(*b as f64))),
            (Field::Char(a), Field::Char(b)) => Ok(a.cmp(b)),
            (a, b) => Err(RelicError::TypeMismatch {
                expected: a.field_type().to_string(),
                actual: b.field_type().to_string(),
            }),
        }
    }

    /// Evaluates `self op other`.
    pub fn compare(&self, op: PredicateOp, other: &Field) -> Result<bool> {
        let ord = self.ordering(other)?;
        Ok(match op {
            PredicateOp::Eq => ord == Ordering::Equal,
            PredicateOp::Ne => ord != Ordering::Equal,
            PredicateOp::Lt => ord == Ordering::Less,
            PredicateOp::Le => ord != Ordering::Greater,
            PredicateOp::Gt => ord == Ordering::Greater,
            PredicateOp::Ge => ord != Ordering::Less,
        })
    }
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Field::Int(v) => write!(f, "{}", v),
            Field::Double(v) => write!(f, "{}", v),
            Field::Char(v) => write!(f, "{:?}", v),
        }
    }
}
