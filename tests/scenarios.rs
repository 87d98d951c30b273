//! End-to-end behaviour through the public API.

use std::sync::Arc;

use ranged_index::{
    AvlIndex, ComparatorRegistry, IndexError, IndexRegistry, NaturalComparator, RangeQuery,
    RangedIndex, Value,
};

#[test]
fn full_traversal_is_value_ordered() {
    let mut index = AvlIndex::new("letters", NaturalComparator);
    index.insert(1u64, "a").unwrap();
    index.insert(2u64, "b").unwrap();
    index.insert(3u64, "c").unwrap();
    assert_eq!(index.range_request(None), vec![1, 2, 3]);
}

#[test]
fn eq_hit_and_miss() {
    let mut index = AvlIndex::new("numbers", NaturalComparator);
    index.insert(1u64, 5).unwrap();
    assert_eq!(index.range_request_op("$eq", 5, None).unwrap(), vec![1]);
    assert_eq!(index.range_request_op("$eq", 9, None).unwrap(), Vec::<u64>::new());
}

#[test]
fn reverse_insertion_stays_balanced() {
    const N: u64 = 1000;
    let mut index = AvlIndex::new("reverse", NaturalComparator);
    for id in 1..=N {
        index.insert(id, N - id).unwrap();
        index.validate().unwrap();
    }
    let bound = (1.44 * ((N + 2) as f64).log2()).ceil() as usize;
    assert!(
        index.height() <= bound,
        "height {} exceeds {bound}",
        index.height()
    );
}

#[test]
fn removed_identifier_can_be_reinserted() {
    let mut index = AvlIndex::new("reuse", NaturalComparator);
    index.insert(1u64, "x").unwrap();
    index.remove(&1).unwrap();
    assert!(matches!(
        index.update(1, "y"),
        Err(IndexError::IdentifierNotFound { .. })
    ));
    index.insert(1, "y").unwrap();
    assert_eq!(index.range_request(Some(&RangeQuery::Eq("y"))), vec![1]);
    assert_eq!(index.range_request(Some(&RangeQuery::Eq("x"))), Vec::<u64>::new());
}

#[test]
fn duplicate_values_keep_insertion_order() {
    let mut index = AvlIndex::new("dups", NaturalComparator);
    index.insert(1u64, "a").unwrap();
    index.insert(2u64, "a").unwrap();
    assert_eq!(index.range_request(Some(&RangeQuery::Eq("a"))), vec![1, 2]);
    index.remove(&1).unwrap();
    assert_eq!(index.range_request(Some(&RangeQuery::Eq("a"))), vec![2]);
}

#[test]
fn unsupported_operator_is_rejected() {
    let mut index = AvlIndex::new("ops", NaturalComparator);
    index.insert(1u64, 1).unwrap();
    assert_eq!(
        index.range_request_op("$ne", 1, None),
        Err(IndexError::UnsupportedOperator("$ne".into()))
    );
}

#[test]
fn registries_wire_a_mixed_type_index() {
    let comparators = ComparatorRegistry::<Value>::with_defaults();
    let indexes = IndexRegistry::<u64, Value>::with_defaults();
    let mut index: Box<dyn RangedIndex<u64, Value>> = indexes
        .create("avl", "mixed", comparators.get("generalized").unwrap())
        .unwrap();

    index.insert(1, Value::from("apple")).unwrap();
    index.insert(2, Value::Int(10)).unwrap();
    index.insert(3, Value::Float(2.5)).unwrap();
    index.insert(4, Value::Null).unwrap();
    index.insert(5, Value::from(vec![1i64, 2])).unwrap();

    assert_eq!(index.range_request(None), vec![4, 3, 2, 1, 5]);
    assert_eq!(
        index.range_request(Some(&RangeQuery::between(Value::Int(0), Value::from("b")))),
        vec![3, 2, 1]
    );

    index.update(2, Value::Bool(true)).unwrap();
    assert_eq!(index.range_request(Some(&RangeQuery::Lt(Value::Int(0)))), vec![4, 2]);
    index.validate().unwrap();
}

#[test]
fn injected_comparator_is_used() {
    let comparator: Arc<dyn ranged_index::Comparator<i64>> = Arc::new(NaturalComparator);
    let mut index = AvlIndex::new("arc", comparator);
    for id in 0..10u64 {
        index.insert(id, -(id as i64)).unwrap();
    }
    assert_eq!(index.range_request(Some(&RangeQuery::Gt(-3))), vec![2, 1, 0]);
}
