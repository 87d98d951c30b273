//! Heterogeneous value domain for indexes over mixed-type fields.

use std::collections::BTreeMap;

/// A dynamically typed value, as stored in a schemaless document field.
///
/// The derived `PartialEq`/`PartialOrd` are structural and variant-sensitive
/// (`Int(1) != Float(1.0)`, and every `Int` sorts before every `Float`). Use
/// [`GeneralizedComparator`](crate::GeneralizedComparator) for the type-aware
/// order the index buckets by.
#[derive(Debug, Clone, PartialEq, PartialOrd, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    List(Vec<Value>),
    Map(BTreeMap<String, Value>),
}

impl Value {
    /// Position of this value's type in the cross-type ordering.
    ///
    /// `Null < Bool < Number < String < List < Map`. Integers and floats share
    /// a rank so they compare numerically against each other.
    pub fn type_rank(&self) -> u8 {
        match self {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Int(_) | Value::Float(_) => 2,
            Value::Str(_) => 3,
            Value::List(_) => 4,
            Value::Map(_) => 5,
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Value::Null, Into::into)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_rank_order() {
        let ranked = [
            Value::Null,
            Value::Bool(true),
            Value::Int(-3),
            Value::Str("a".into()),
            Value::List(vec![]),
            Value::Map(BTreeMap::new()),
        ];
        for pair in ranked.windows(2) {
            assert!(pair[0].type_rank() < pair[1].type_rank());
        }
        assert_eq!(Value::Int(1).type_rank(), Value::Float(1.0).type_rank());
    }

    #[test]
    fn test_conversions() {
        assert_eq!(Value::from(None::<i64>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
        assert_eq!(
            Value::from(vec![1i64, 2]),
            Value::List(vec![Value::Int(1), Value::Int(2)])
        );
    }
}
