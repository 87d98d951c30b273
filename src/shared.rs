//! Thread-safe wrapper around [`AvlIndex`].
//!
//! The index itself is single-writer; this wrapper serializes access with a
//! reader-writer lock so one index can be shared across threads.

use std::fmt;
use std::hash::Hash;

use parking_lot::RwLock;

use crate::avl::AvlIndex;
use crate::comparator::Comparator;
use crate::config::IndexConfig;
use crate::error::Result;
use crate::query::RangeQuery;

/// An [`AvlIndex`] behind a `RwLock`.
///
/// Mutations take the write lock; queries share the read lock. Every call
/// runs to completion under its lock, so no caller observes a half-applied
/// rebalance.
pub struct SharedIndex<I, V, C> {
    inner: RwLock<AvlIndex<I, V, C>>,
}

impl<I, V, C> SharedIndex<I, V, C>
where
    I: Eq + Hash + Clone + fmt::Debug,
    C: Comparator<V>,
{
    pub fn new(name: impl Into<String>, comparator: C) -> Self {
        Self::from_index(AvlIndex::new(name, comparator))
    }

    pub fn with_config(name: impl Into<String>, comparator: C, config: IndexConfig) -> Self {
        Self::from_index(AvlIndex::with_config(name, comparator, config))
    }

    pub fn from_index(index: AvlIndex<I, V, C>) -> Self {
        Self {
            inner: RwLock::new(index),
        }
    }

    pub fn insert(&self, id: I, value: V) -> Result<()> {
        self.inner.write().insert(id, value)
    }

    pub fn update(&self, id: I, value: V) -> Result<()> {
        self.inner.write().update(id, value)
    }

    pub fn remove(&self, id: &I) -> Result<()> {
        self.inner.write().remove(id)
    }

    pub fn range_request(&self, query: Option<&RangeQuery<V>>) -> Vec<I> {
        self.inner.read().range_request(query)
    }

    pub fn range_request_op(&self, op: &str, val: V, val2: Option<V>) -> Result<Vec<I>> {
        self.inner.read().range_request_op(op, val, val2)
    }

    pub fn contains(&self, id: &I) -> bool {
        self.inner.read().contains(id)
    }

    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.read().is_empty()
    }

    pub fn validate(&self) -> Result<()> {
        self.inner.read().validate()
    }

    /// Run `f` with shared access to the underlying index.
    pub fn with_read<R>(&self, f: impl FnOnce(&AvlIndex<I, V, C>) -> R) -> R {
        f(&self.inner.read())
    }

    pub fn into_inner(self) -> AvlIndex<I, V, C> {
        self.inner.into_inner()
    }
}
