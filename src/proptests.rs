use super::*;

use proptest::prelude::*;
use proptest_derive::Arbitrary;
use std::collections::BTreeMap;

/// Reference model: id -> (value, insertion sequence).
///
/// Expected query output is every matching entry sorted by value, then by the
/// order entries joined their value's bucket.
#[derive(Default)]
struct Model {
    entries: BTreeMap<u64, (i64, u64)>,
    seq: u64,
}

impl Model {
    fn insert(&mut self, id: u64, value: i64) -> bool {
        if self.entries.contains_key(&id) {
            return false;
        }
        self.seq += 1;
        self.entries.insert(id, (value, self.seq));
        true
    }

    fn remove(&mut self, id: u64) -> bool {
        self.entries.remove(&id).is_some()
    }

    fn update(&mut self, id: u64, value: i64) -> bool {
        self.remove(id) && self.insert(id, value)
    }

    fn query(&self, matches: impl Fn(i64) -> bool) -> Vec<u64> {
        let mut hits: Vec<(i64, u64, u64)> = self
            .entries
            .iter()
            .filter(|(_, (value, _))| matches(*value))
            .map(|(id, (value, seq))| (*value, *seq, *id))
            .collect();
        hits.sort_unstable();
        hits.into_iter().map(|(_, _, id)| id).collect()
    }
}

#[derive(Clone, Copy, Debug, Arbitrary)]
enum QueryKind {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
}

impl QueryKind {
    fn build(self, a: i64, b: i64) -> RangeQuery<i64> {
        match self {
            QueryKind::Eq => RangeQuery::Eq(a),
            QueryKind::Gt => RangeQuery::Gt(a),
            QueryKind::Gte => RangeQuery::Gte(a),
            QueryKind::Lt => RangeQuery::Lt(a),
            QueryKind::Lte => RangeQuery::Lte(a),
            QueryKind::Between => RangeQuery::between(a, b),
        }
    }

    fn matches(self, a: i64, b: i64, v: i64) -> bool {
        match self {
            QueryKind::Eq => v == a,
            QueryKind::Gt => v > a,
            QueryKind::Gte => v >= a,
            QueryKind::Lt => v < a,
            QueryKind::Lte => v <= a,
            QueryKind::Between => a <= v && v <= b,
        }
    }
}

#[derive(Clone, Debug, Arbitrary)]
enum Op {
    #[proptest(weight = 4)]
    Insert(
        #[proptest(strategy = "0u64..96")] u64,
        #[proptest(strategy = "-32i64..32")] i64,
    ),
    #[proptest(weight = 2)]
    Update(
        #[proptest(strategy = "0u64..96")] u64,
        #[proptest(strategy = "-32i64..32")] i64,
    ),
    #[proptest(weight = 3)]
    Remove(#[proptest(strategy = "0u64..96")] u64),
    #[proptest(weight = 1)]
    Query(
        QueryKind,
        #[proptest(strategy = "-40i64..40")] i64,
        #[proptest(strategy = "-40i64..40")] i64,
    ),
}

fn ops_strategy() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(any::<Op>(), 0..=600)
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 256,
        max_shrink_iters: 50_000,
        .. ProptestConfig::default()
    })]

    #[test]
    fn prop_equivalence_with_model(ops in ops_strategy()) {
        let mut t = AvlIndex::new("prop", NaturalComparator);
        let mut m = Model::default();

        for op in ops {
            match op {
                Op::Insert(id, value) => {
                    prop_assert_eq!(t.insert(id, value).is_ok(), m.insert(id, value));
                }
                Op::Update(id, value) => {
                    prop_assert_eq!(t.update(id, value).is_ok(), m.update(id, value));
                }
                Op::Remove(id) => {
                    prop_assert_eq!(t.remove(&id).is_ok(), m.remove(id));
                }
                Op::Query(kind, a, b) => {
                    let got = t.range_request(Some(&kind.build(a, b)));
                    let expected = m.query(|v| kind.matches(a, b, v));
                    prop_assert_eq!(got, expected);
                }
            }
            prop_assert_eq!(t.len(), m.entries.len());
        }

        prop_assert!(t.validate().is_ok(), "{:?}", t.validate());
        prop_assert_eq!(t.range_request(None), m.query(|_| true));
        for (id, (value, _)) in &m.entries {
            let bucket = t.range_request(Some(&RangeQuery::Eq(*value)));
            prop_assert_eq!(bucket.iter().filter(|held| *held == id).count(), 1);
        }
    }

    #[test]
    fn prop_gte_returns_exactly_matching(
        values in prop::collection::vec(-1000i64..1000, 0..300),
        bound in -1100i64..1100,
    ) {
        let mut t = AvlIndex::new("gte", NaturalComparator);
        let mut m = Model::default();
        for (id, value) in values.into_iter().enumerate() {
            t.insert(id as u64, value).unwrap();
            m.insert(id as u64, value);
        }
        prop_assert_eq!(
            t.range_request(Some(&RangeQuery::Gte(bound))),
            m.query(|v| v >= bound)
        );
    }

    #[test]
    fn prop_removed_ids_disappear(
        values in prop::collection::vec(-50i64..50, 1..200),
        removals in prop::collection::vec(any::<prop::sample::Index>(), 0..100),
    ) {
        let mut t = AvlIndex::new("removal", NaturalComparator);
        for (id, value) in values.iter().enumerate() {
            t.insert(id as u64, *value).unwrap();
        }

        let mut removed = Vec::new();
        for pick in removals {
            let id = pick.index(values.len()) as u64;
            if t.contains(&id) {
                t.remove(&id).unwrap();
                removed.push(id);
            } else {
                prop_assert!(
                    matches!(t.remove(&id), Err(IndexError::IdentifierNotFound { .. })),
                    "remove of an untracked id must fail"
                );
                prop_assert!(
                    matches!(t.update(id, 0), Err(IndexError::IdentifierNotFound { .. })),
                    "update of an untracked id must fail"
                );
            }
        }

        t.validate().unwrap();
        let all = t.range_request(None);
        for id in removed {
            prop_assert!(!all.contains(&id));
            prop_assert!(!t.range_request(Some(&RangeQuery::Eq(values[id as usize]))).contains(&id));
        }
    }
}

fn for_each_permutation<T: Clone>(items: &[T], mut f: impl FnMut(Vec<T>)) {
    fn rec<T: Clone>(items: &[T], used: &mut [bool], out: &mut Vec<T>, f: &mut impl FnMut(Vec<T>)) {
        if out.len() == items.len() {
            f(out.clone());
            return;
        }
        for i in 0..items.len() {
            if used[i] {
                continue;
            }
            used[i] = true;
            out.push(items[i].clone());
            rec(items, used, out, f);
            out.pop();
            used[i] = false;
        }
    }

    let mut used = vec![false; items.len()];
    let mut out = Vec::with_capacity(items.len());
    rec(items, &mut used, &mut out, &mut f);
}

#[test]
fn exhaustive_insert_order_small_set() {
    let values: Vec<i64> = vec![10, 20, 30, 40, 50, 60, 70];

    for_each_permutation(&values, |perm| {
        let mut t = AvlIndex::new("perm", NaturalComparator);
        for v in &perm {
            t.insert(*v as u64, *v).unwrap();
        }

        t.validate().unwrap();
        assert!(t.height() <= 4, "height {} for {perm:?}", t.height());
        let got: Vec<i64> = t.iter().map(|(v, _)| *v).collect();
        assert_eq!(got, values);
    });
}

#[test]
fn exhaustive_remove_order_small_set() {
    let values: Vec<i64> = vec![1, 2, 3, 4, 5, 6, 7];

    // Insert in a fixed order (two ids per value), then remove values in all
    // permutations.
    let mut base = AvlIndex::new("perm", NaturalComparator);
    for v in &values {
        base.insert(*v as u64, *v).unwrap();
        base.insert(100 + *v as u64, *v).unwrap();
    }

    for_each_permutation(&values, |perm| {
        let mut t = base.clone();
        for v in perm {
            t.remove(&(v as u64)).unwrap();
            t.validate().unwrap();
            t.remove(&(100 + v as u64)).unwrap();
            t.validate().unwrap();
        }
        assert!(t.is_empty());
        assert_eq!(t.node_count(), 0);
        assert_eq!(t.height(), 0);
    });
}
