//! Range queries and the bounded in-order traversal that answers them.

use std::cmp::Ordering;
use std::fmt;
use std::ops::Bound;
use std::str::FromStr;

use crate::arena::{NodeArena, NodeId};
use crate::comparator::Comparator;
use crate::error::{IndexError, Result};

/// Query operator names, as they appear in a `{op, val, val2}` query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RangeOp {
    Eq,
    Gt,
    Gte,
    Lt,
    Lte,
    Between,
}

impl RangeOp {
    pub fn as_str(self) -> &'static str {
        match self {
            RangeOp::Eq => "$eq",
            RangeOp::Gt => "$gt",
            RangeOp::Gte => "$gte",
            RangeOp::Lt => "$lt",
            RangeOp::Lte => "$lte",
            RangeOp::Between => "$between",
        }
    }
}

impl FromStr for RangeOp {
    type Err = IndexError;

    fn from_str(op: &str) -> Result<Self> {
        match op {
            "$eq" => Ok(RangeOp::Eq),
            "$gt" => Ok(RangeOp::Gt),
            "$gte" => Ok(RangeOp::Gte),
            "$lt" => Ok(RangeOp::Lt),
            "$lte" => Ok(RangeOp::Lte),
            "$between" => Ok(RangeOp::Between),
            other => Err(IndexError::UnsupportedOperator(other.to_owned())),
        }
    }
}

impl fmt::Display for RangeOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A predicate over index values.
#[derive(Debug, Clone, PartialEq)]
pub enum RangeQuery<V> {
    Eq(V),
    Gt(V),
    Gte(V),
    Lt(V),
    Lte(V),
    Between {
        low: V,
        high: V,
        low_inclusive: bool,
        high_inclusive: bool,
    },
}

impl<V> RangeQuery<V> {
    /// `low <= value <= high`.
    pub fn between(low: V, high: V) -> Self {
        RangeQuery::Between {
            low,
            high,
            low_inclusive: true,
            high_inclusive: true,
        }
    }

    /// Build a query from its operator-string form.
    ///
    /// `val2` is the upper bound of `$between` (inclusive on both ends) and is
    /// ignored by every other operator.
    pub fn parse(op: &str, val: V, val2: Option<V>) -> Result<Self> {
        let query = match op.parse::<RangeOp>()? {
            RangeOp::Eq => RangeQuery::Eq(val),
            RangeOp::Gt => RangeQuery::Gt(val),
            RangeOp::Gte => RangeQuery::Gte(val),
            RangeOp::Lt => RangeQuery::Lt(val),
            RangeOp::Lte => RangeQuery::Lte(val),
            RangeOp::Between => {
                let high = val2.ok_or_else(|| IndexError::MissingBound { op: op.to_owned() })?;
                RangeQuery::between(val, high)
            }
        };
        Ok(query)
    }

    pub fn op(&self) -> RangeOp {
        match self {
            RangeQuery::Eq(_) => RangeOp::Eq,
            RangeQuery::Gt(_) => RangeOp::Gt,
            RangeQuery::Gte(_) => RangeOp::Gte,
            RangeQuery::Lt(_) => RangeOp::Lt,
            RangeQuery::Lte(_) => RangeOp::Lte,
            RangeQuery::Between { .. } => RangeOp::Between,
        }
    }

    /// Lower and upper bounds of the matching region.
    pub fn bounds(&self) -> (Bound<&V>, Bound<&V>) {
        match self {
            RangeQuery::Eq(v) => (Bound::Included(v), Bound::Included(v)),
            RangeQuery::Gt(v) => (Bound::Excluded(v), Bound::Unbounded),
            RangeQuery::Gte(v) => (Bound::Included(v), Bound::Unbounded),
            RangeQuery::Lt(v) => (Bound::Unbounded, Bound::Excluded(v)),
            RangeQuery::Lte(v) => (Bound::Unbounded, Bound::Included(v)),
            RangeQuery::Between {
                low,
                high,
                low_inclusive,
                high_inclusive,
            } => (
                if *low_inclusive {
                    Bound::Included(low)
                } else {
                    Bound::Excluded(low)
                },
                if *high_inclusive {
                    Bound::Included(high)
                } else {
                    Bound::Excluded(high)
                },
            ),
        }
    }
}

/// In-order walk over the nodes whose values fall within a pair of bounds.
///
/// Yields each matching node's value and its bucket. Subtrees that lie
/// entirely below the lower bound are never entered, and the walk stops at the
/// first node past the upper bound.
pub struct Range<'a, I, V, C> {
    nodes: &'a NodeArena<I, V>,
    comparator: &'a C,
    lower: Bound<&'a V>,
    upper: Bound<&'a V>,
    /// Nodes whose left side is done and which still need visiting.
    stack: Vec<NodeId>,
}

impl<'a, I, V, C: Comparator<V>> Range<'a, I, V, C> {
    pub(crate) fn new(
        nodes: &'a NodeArena<I, V>,
        comparator: &'a C,
        root: Option<NodeId>,
        lower: Bound<&'a V>,
        upper: Bound<&'a V>,
    ) -> Self {
        let mut range = Self {
            nodes,
            comparator,
            lower,
            upper,
            stack: Vec::new(),
        };
        range.descend(root);
        range
    }

    /// Push the left spine of `subtree`, skipping left children that can only
    /// hold values below the lower bound.
    fn descend(&mut self, mut subtree: Option<NodeId>) {
        let nodes = self.nodes;
        while let Some(id) = subtree {
            self.stack.push(id);
            let node = nodes.get(id);
            subtree = if self.left_may_match(&node.value) {
                node.left
            } else {
                None
            };
        }
    }

    /// Something smaller than `value` could still satisfy the lower bound.
    fn left_may_match(&self, value: &V) -> bool {
        match self.lower {
            Bound::Unbounded => true,
            Bound::Included(low) | Bound::Excluded(low) => {
                self.comparator.compare(value, low) == Ordering::Greater
            }
        }
    }

    /// Something larger than `value` could still satisfy the upper bound.
    fn right_may_match(&self, value: &V) -> bool {
        match self.upper {
            Bound::Unbounded => true,
            Bound::Included(high) | Bound::Excluded(high) => {
                self.comparator.compare(value, high) == Ordering::Less
            }
        }
    }

    fn above_lower(&self, value: &V) -> bool {
        match self.lower {
            Bound::Unbounded => true,
            Bound::Included(low) => self.comparator.compare(value, low) != Ordering::Less,
            Bound::Excluded(low) => self.comparator.compare(value, low) == Ordering::Greater,
        }
    }

    fn past_upper(&self, value: &V) -> bool {
        match self.upper {
            Bound::Unbounded => false,
            Bound::Included(high) => self.comparator.compare(value, high) == Ordering::Greater,
            Bound::Excluded(high) => self.comparator.compare(value, high) != Ordering::Less,
        }
    }
}

impl<'a, I, V, C: Comparator<V>> Iterator for Range<'a, I, V, C> {
    type Item = (&'a V, &'a [I]);

    fn next(&mut self) -> Option<Self::Item> {
        let nodes = self.nodes;
        while let Some(id) = self.stack.pop() {
            let node = nodes.get(id);
            if self.past_upper(&node.value) {
                // In-order: everything still pending is larger.
                self.stack.clear();
                return None;
            }
            if self.right_may_match(&node.value) {
                self.descend(node.right);
            }
            if self.above_lower(&node.value) {
                return Some((&node.value, node.bucket.as_slice()));
            }
        }
        None
    }
}
