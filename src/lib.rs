//! # ranged-index
//!
//! An in-memory ordered secondary index: identifiers sorted by an associated
//! value, answering equality and range queries in logarithmic time.
//!
//! The index is an AVL tree over values. Identifiers that share a value are
//! kept together in a bucket at one node, in insertion order, and a side
//! table maps each identifier to its node so updates and removals by
//! identifier stay logarithmic too.
//!
//! ## Example
//!
//! ```rust
//! use ranged_index::{AvlIndex, NaturalComparator, RangeQuery};
//!
//! let mut index = AvlIndex::new("last", NaturalComparator);
//! index.insert(1u64, "a").unwrap();
//! index.insert(2u64, "c").unwrap();
//! index.insert(3u64, "b").unwrap();
//!
//! assert_eq!(index.range_request(None), vec![1, 3, 2]);
//! assert_eq!(index.range_request(Some(&RangeQuery::Gte("b"))), vec![3, 2]);
//!
//! index.update(1, "d").unwrap();
//! assert_eq!(index.range_request_op("$between", "b", Some("c")).unwrap(), vec![3, 2]);
//! ```
//!
//! ## Mixed-type values
//!
//! [`GeneralizedComparator`] orders the dynamically typed [`Value`] with a
//! fixed cross-type policy, so one index can hold numbers, strings and nested
//! documents side by side.
//!
//! ```rust
//! use ranged_index::{AvlIndex, GeneralizedComparator, RangeQuery, Value};
//!
//! let mut index = AvlIndex::new("score", GeneralizedComparator);
//! index.insert(1u64, Value::Int(3)).unwrap();
//! index.insert(2u64, Value::Float(3.0)).unwrap();
//! index.insert(3u64, Value::from("three")).unwrap();
//!
//! assert_eq!(index.range_request(Some(&RangeQuery::Eq(Value::Int(3)))), vec![1, 2]);
//! ```

#![forbid(unsafe_code)]
#![warn(clippy::all)]

mod arena;
pub mod avl;
pub mod comparator;
pub mod config;
pub mod error;
pub mod query;
pub mod registry;
pub mod shared;
pub mod value;

pub use avl::AvlIndex;
pub use comparator::{Comparator, ComparatorRegistry, GeneralizedComparator, NaturalComparator};
pub use config::IndexConfig;
pub use error::{IndexError, Result};
pub use query::{Range, RangeOp, RangeQuery};
pub use registry::{IndexConstructor, IndexRegistry, RangedIndex};
pub use shared::SharedIndex;
pub use value::Value;

#[cfg(test)]
mod proptests;
