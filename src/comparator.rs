//! Comparison strategies that order index values.
//!
//! A comparator is a pure function over a fixed value domain. The index calls
//! it on every descent step, and the `Equal` outcome decides which values
//! share a bucket.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{IndexError, Result};
use crate::value::Value;

/// A total order over values of type `V`.
pub trait Comparator<V>: Send + Sync {
    fn compare(&self, a: &V, b: &V) -> Ordering;
}

impl<V, C: Comparator<V> + ?Sized> Comparator<V> for Arc<C> {
    #[inline]
    fn compare(&self, a: &V, b: &V) -> Ordering {
        (**self).compare(a, b)
    }
}

// =============================================================================
// Natural ordering
// =============================================================================

/// Native ordering for homogeneous domains (`i64`, `String`, `&str`, ...).
///
/// Requires `Ord`, so float domains are rejected at compile time. Index
/// floats as [`Value`] with [`GeneralizedComparator`], which orders NaN.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct NaturalComparator;

impl<V: Ord> Comparator<V> for NaturalComparator {
    #[inline]
    fn compare(&self, a: &V, b: &V) -> Ordering {
        a.cmp(b)
    }
}

// =============================================================================
// Generalized ordering over `Value`
// =============================================================================

/// Type-aware ordering for mixed-type [`Value`] domains.
///
/// Cross-type policy: `Null < Bool < Number < String < List < Map`.
///
/// - Integers and floats compare numerically, exactly (no lossy casts), so
///   `Int(1)` and `Float(1.0)` are equal and share a bucket.
/// - NaN is greater than every other number and equal to itself. `-0.0`
///   equals `0.0`.
/// - Strings compare by bytes.
/// - Lists compare element-wise, then by length.
/// - Maps compare entry-wise in key order (key first, then value), then by
///   length.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct GeneralizedComparator;

impl Comparator<Value> for GeneralizedComparator {
    fn compare(&self, a: &Value, b: &Value) -> Ordering {
        compare_values(a, b)
    }
}

fn compare_values(a: &Value, b: &Value) -> Ordering {
    match (a, b) {
        (Value::Null, Value::Null) => Ordering::Equal,
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Int(x), Value::Int(y)) => x.cmp(y),
        (Value::Float(x), Value::Float(y)) => compare_f64(*x, *y),
        (Value::Int(x), Value::Float(y)) => compare_i64_f64(*x, *y),
        (Value::Float(x), Value::Int(y)) => compare_i64_f64(*y, *x).reverse(),
        (Value::Str(x), Value::Str(y)) => x.as_bytes().cmp(y.as_bytes()),
        (Value::List(x), Value::List(y)) => {
            for (l, r) in x.iter().zip(y) {
                match compare_values(l, r) {
                    Ordering::Equal => continue,
                    ord => return ord,
                }
            }
            x.len().cmp(&y.len())
        }
        (Value::Map(x), Value::Map(y)) => {
            for ((lk, lv), (rk, rv)) in x.iter().zip(y) {
                match lk.cmp(rk).then_with(|| compare_values(lv, rv)) {
                    Ordering::Equal => continue,
                    ord => return ord,
                }
            }
            x.len().cmp(&y.len())
        }
        _ => a.type_rank().cmp(&b.type_rank()),
    }
}

/// Total order on floats: numeric order, NaN last, all NaNs equal.
fn compare_f64(a: f64, b: f64) -> Ordering {
    match a.partial_cmp(&b) {
        Some(ord) => ord,
        None => a.is_nan().cmp(&b.is_nan()),
    }
}

/// Exact comparison of an integer against a float.
fn compare_i64_f64(i: i64, f: f64) -> Ordering {
    // 2^63: the first float above every i64.
    const TWO_POW_63: f64 = 9_223_372_036_854_775_808.0;

    if f.is_nan() {
        return Ordering::Less;
    }
    if f >= TWO_POW_63 {
        return Ordering::Less;
    }
    if f < -TWO_POW_63 {
        return Ordering::Greater;
    }

    let whole = f.trunc();
    // In range, so the cast is exact.
    match i.cmp(&(whole as i64)) {
        Ordering::Equal => compare_f64(0.0, f - whole),
        ord => ord,
    }
}

// =============================================================================
// Registry
// =============================================================================

/// Named comparator strategies for one value domain.
///
/// The registry is an ordinary value owned by the caller; build one, pick a
/// comparator out of it and inject that into the index.
pub struct ComparatorRegistry<V> {
    entries: HashMap<String, Arc<dyn Comparator<V>>>,
}

impl<V> ComparatorRegistry<V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
        }
    }

    /// Register `comparator` under `name`, replacing any previous entry.
    pub fn register(&mut self, name: impl Into<String>, comparator: Arc<dyn Comparator<V>>) {
        self.entries.insert(name.into(), comparator);
    }

    /// Look up a comparator by name.
    pub fn get(&self, name: &str) -> Result<Arc<dyn Comparator<V>>> {
        self.entries
            .get(name)
            .cloned()
            .ok_or_else(|| IndexError::UnknownComparator(name.to_owned()))
    }

    /// Registered names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.entries.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<V: Ord + 'static> ComparatorRegistry<V> {
    /// Registry holding only `"natural"`.
    pub fn natural() -> Self {
        let mut registry = Self::new();
        registry.register("natural", Arc::new(NaturalComparator));
        registry
    }
}

impl ComparatorRegistry<Value> {
    /// Registry holding `"generalized"` for [`Value`].
    ///
    /// `Value` holds floats and is only `PartialOrd`, so there is no
    /// `"natural"` entry here.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("generalized", Arc::new(GeneralizedComparator));
        registry
    }
}

impl<V> Default for ComparatorRegistry<V> {
    fn default() -> Self {
        Self::new()
    }
}
