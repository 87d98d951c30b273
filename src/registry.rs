//! Index implementations behind a common object-safe interface, and a
//! name-to-constructor table for choosing one at runtime.

use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

use crate::avl::AvlIndex;
use crate::comparator::Comparator;
use crate::error::{IndexError, Result};
use crate::query::RangeQuery;

/// Operations every ranged index implementation provides.
pub trait RangedIndex<I, V> {
    fn name(&self) -> &str;

    fn insert(&mut self, id: I, value: V) -> Result<()>;

    fn update(&mut self, id: I, value: V) -> Result<()>;

    fn remove(&mut self, id: &I) -> Result<()>;

    /// Identifiers matching `query` (every identifier for `None`), ascending
    /// by value.
    fn range_request(&self, query: Option<&RangeQuery<V>>) -> Vec<I>;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn validate(&self) -> Result<()>;
}

impl<I, V, C> RangedIndex<I, V> for AvlIndex<I, V, C>
where
    I: Eq + Hash + Clone + fmt::Debug,
    C: Comparator<V>,
{
    fn name(&self) -> &str {
        AvlIndex::name(self)
    }

    fn insert(&mut self, id: I, value: V) -> Result<()> {
        AvlIndex::insert(self, id, value)
    }

    fn update(&mut self, id: I, value: V) -> Result<()> {
        AvlIndex::update(self, id, value)
    }

    fn remove(&mut self, id: &I) -> Result<()> {
        AvlIndex::remove(self, id)
    }

    fn range_request(&self, query: Option<&RangeQuery<V>>) -> Vec<I> {
        AvlIndex::range_request(self, query)
    }

    fn len(&self) -> usize {
        AvlIndex::len(self)
    }

    fn validate(&self) -> Result<()> {
        AvlIndex::validate(self)
    }
}

/// Builds an index from a name and a comparator.
pub type IndexConstructor<I, V> = fn(&str, Arc<dyn Comparator<V>>) -> Box<dyn RangedIndex<I, V>>;

/// Index implementations by algorithm name.
///
/// Like [`ComparatorRegistry`](crate::ComparatorRegistry), this is a plain
/// value: callers build it and pass it where a choice is needed. Indexes do
/// not consult it.
pub struct IndexRegistry<I, V> {
    constructors: HashMap<String, IndexConstructor<I, V>>,
}

impl<I, V> IndexRegistry<I, V> {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            constructors: HashMap::new(),
        }
    }

    /// Register `constructor` under `algorithm`, replacing any previous entry.
    pub fn register(&mut self, algorithm: impl Into<String>, constructor: IndexConstructor<I, V>) {
        self.constructors.insert(algorithm.into(), constructor);
    }

    /// Construct an index named `name` using the `algorithm` implementation.
    pub fn create(
        &self,
        algorithm: &str,
        name: &str,
        comparator: Arc<dyn Comparator<V>>,
    ) -> Result<Box<dyn RangedIndex<I, V>>> {
        let constructor = self
            .constructors
            .get(algorithm)
            .ok_or_else(|| IndexError::UnknownIndexType(algorithm.to_owned()))?;
        Ok(constructor(name, comparator))
    }

    /// Registered algorithm names, sorted.
    pub fn algorithms(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.constructors.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }
}

impl<I, V> IndexRegistry<I, V>
where
    I: Eq + Hash + Clone + fmt::Debug + 'static,
    V: 'static,
{
    /// Registry holding the AVL implementation as `"avl"`.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        registry.register("avl", create_avl::<I, V>);
        registry
    }
}

impl<I, V> Default for IndexRegistry<I, V> {
    fn default() -> Self {
        Self::new()
    }
}

fn create_avl<I, V>(name: &str, comparator: Arc<dyn Comparator<V>>) -> Box<dyn RangedIndex<I, V>>
where
    I: Eq + Hash + Clone + fmt::Debug + 'static,
    V: 'static,
{
    Box::new(AvlIndex::new(name, comparator))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::comparator::{ComparatorRegistry, NaturalComparator};

    #[test]
    fn test_create_avl_by_name() {
        let comparators = ComparatorRegistry::<String>::natural();
        let indexes = IndexRegistry::<u64, String>::with_defaults();
        assert_eq!(indexes.algorithms(), vec!["avl"]);

        let mut index = indexes
            .create("avl", "last", comparators.get("natural").unwrap())
            .unwrap();
        assert_eq!(index.name(), "last");

        index.insert(1, "c".into()).unwrap();
        index.insert(2, "a".into()).unwrap();
        index.insert(3, "b".into()).unwrap();
        index.update(1, "0".into()).unwrap();
        index.remove(&3).unwrap();
        index.validate().unwrap();

        assert_eq!(index.len(), 2);
        assert!(!index.is_empty());
        assert_eq!(index.range_request(None), vec![1, 2]);
    }

    #[test]
    fn test_unknown_algorithm() {
        let indexes = IndexRegistry::<u64, i64>::with_defaults();
        let result = indexes.create("btree", "x", Arc::new(NaturalComparator));
        match result {
            Err(IndexError::UnknownIndexType(name)) => assert_eq!(name, "btree"),
            Err(other) => panic!("unexpected error: {other}"),
            Ok(_) => panic!("unknown algorithm constructed an index"),
        }
    }

    #[test]
    fn test_custom_constructor() {
        fn sized(name: &str, comparator: Arc<dyn Comparator<i64>>) -> Box<dyn RangedIndex<u64, i64>> {
            let config = crate::IndexConfig::default().with_initial_capacity(16);
            Box::new(AvlIndex::with_config(name, comparator, config))
        }

        let mut indexes = IndexRegistry::<u64, i64>::new();
        indexes.register("avl-small", sized);
        let index = indexes
            .create("avl-small", "tiny", Arc::new(NaturalComparator))
            .unwrap();
        assert!(index.is_empty());
    }
}
