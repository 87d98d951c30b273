//! AVL-balanced ordered index.
//!
//! The tree is a binary search tree over values. Each node owns one distinct
//! value (distinct under the index's comparator) and the bucket of identifiers
//! currently mapped to it. A side table maps every identifier to the node that
//! holds it, so updates and removals by identifier never scan the tree.
//!
//! Structural changes record the root-to-node path on the way down and retrace
//! it bottom-up afterwards, recomputing heights and rotating wherever a node's
//! children differ in height by more than one.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::fmt;
use std::hash::Hash;

use tracing::{debug, trace};

use crate::arena::{NodeArena, NodeId};
use crate::comparator::Comparator;
use crate::config::IndexConfig;
use crate::error::{IndexError, Result};
use crate::query::{Range, RangeQuery};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Right,
}

/// One step of a root-to-node descent: the node visited and the child taken.
#[derive(Clone, Copy, Debug)]
struct PathFrame {
    node: NodeId,
    side: Side,
}

/// An ordered secondary index mapping identifiers to values, sorted by value.
///
/// Identifiers are unique; values are not. Identifiers that share a value
/// (under the comparator) are kept in one bucket in insertion order.
///
/// ```rust
/// use ranged_index::{AvlIndex, NaturalComparator, RangeQuery};
///
/// let mut index = AvlIndex::new("age", NaturalComparator);
/// index.insert(1u64, 34).unwrap();
/// index.insert(2u64, 27).unwrap();
/// index.insert(3u64, 34).unwrap();
///
/// assert_eq!(index.range_request(None), vec![2, 1, 3]);
/// assert_eq!(index.range_request(Some(&RangeQuery::Eq(34))), vec![1, 3]);
/// assert_eq!(index.range_request(Some(&RangeQuery::Lt(30))), vec![2]);
/// ```
#[derive(Clone)]
pub struct AvlIndex<I, V, C> {
    name: String,
    comparator: C,
    nodes: NodeArena<I, V>,
    root: Option<NodeId>,
    /// Identifier -> node currently holding it.
    locations: HashMap<I, NodeId>,
}

impl<I, V, C> AvlIndex<I, V, C>
where
    I: Eq + Hash + Clone + fmt::Debug,
    C: Comparator<V>,
{
    /// Create an empty index with default configuration.
    pub fn new(name: impl Into<String>, comparator: C) -> Self {
        Self::with_config(name, comparator, IndexConfig::default())
    }

    /// Create an empty index with the given configuration.
    pub fn with_config(name: impl Into<String>, comparator: C, config: IndexConfig) -> Self {
        let name = name.into();
        debug!(index = %name, capacity = config.initial_capacity, "creating avl index");
        Self {
            name,
            comparator,
            nodes: NodeArena::with_capacity(config.initial_capacity),
            root: None,
            locations: HashMap::with_capacity(config.initial_capacity),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn comparator(&self) -> &C {
        &self.comparator
    }

    /// Number of tracked identifiers.
    #[inline]
    pub fn len(&self) -> usize {
        self.locations.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.locations.is_empty()
    }

    /// Number of distinct values (tree nodes).
    #[inline]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Height of the tree; 0 when empty.
    pub fn height(&self) -> usize {
        usize::from(self.height_of(self.root))
    }

    pub fn contains(&self, id: &I) -> bool {
        self.locations.contains_key(id)
    }

    /// The value `id` is filed under.
    ///
    /// This is the value of the node holding `id`: the first value inserted
    /// into that bucket, which compares equal to (but need not be identical
    /// to) the value passed for `id`.
    pub fn get(&self, id: &I) -> Option<&V> {
        self.locations.get(id).map(|&node| &self.nodes.get(node).value)
    }

    // =========================================================================
    // Mutation
    // =========================================================================

    /// Track `id` under `value`.
    ///
    /// Fails with [`IndexError::DuplicateIdentifier`] if `id` is already
    /// tracked; use [`update`](Self::update) to move it.
    pub fn insert(&mut self, id: I, value: V) -> Result<()> {
        if self.locations.contains_key(&id) {
            return Err(IndexError::duplicate(&self.name, &id));
        }

        let mut path = Vec::with_capacity(self.height());
        let mut cursor = self.root;
        while let Some(node) = cursor {
            let current = self.nodes.get(node);
            let side = match self.comparator.compare(&value, &current.value) {
                Ordering::Equal => {
                    self.nodes.get_mut(node).bucket.push(id.clone());
                    self.locations.insert(id, node);
                    return Ok(());
                }
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
            };
            path.push(PathFrame { node, side });
            cursor = self.child(node, side);
        }

        let leaf = self.nodes.alloc(value, id.clone());
        self.locations.insert(id, leaf);
        trace!(index = %self.name, node = leaf.index(), depth = path.len(), "created node");

        self.link(path.last(), Some(leaf));
        self.retrace(&path);
        Ok(())
    }

    /// Move `id` to `value`.
    ///
    /// Equivalent to `remove(id)` followed by `insert(id, value)`: the entry
    /// leaves its old bucket (deleting the node if it empties) and is appended
    /// to the bucket for `value`, even when the two values compare equal.
    pub fn update(&mut self, id: I, value: V) -> Result<()> {
        self.remove(&id)?;
        self.insert(id, value)
    }

    /// Stop tracking `id`.
    ///
    /// Fails with [`IndexError::IdentifierNotFound`] if `id` is not tracked.
    pub fn remove(&mut self, id: &I) -> Result<()> {
        let Some(node) = self.locations.remove(id) else {
            return Err(IndexError::not_found(&self.name, id));
        };

        let bucket = &mut self.nodes.get_mut(node).bucket;
        if let Some(pos) = bucket.iter().position(|held| held == id) {
            bucket.remove(pos);
        }
        debug_assert!(
            !bucket.iter().any(|held| held == id),
            "identifier held twice in one bucket"
        );

        if bucket.is_empty() {
            self.delete_node(node);
        }
        Ok(())
    }

    /// Drop every entry. The arena and side table keep their allocations.
    pub fn clear(&mut self) {
        debug!(index = %self.name, entries = self.len(), "clearing avl index");
        self.nodes.clear();
        self.locations.clear();
        self.root = None;
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Identifiers matching `query`, ascending by value and in insertion order
    /// within a value. `None` returns every tracked identifier.
    ///
    /// An empty result is not an error.
    pub fn range_request(&self, query: Option<&RangeQuery<V>>) -> Vec<I> {
        match query {
            Some(RangeQuery::Eq(value)) => self
                .find_node(value)
                .map(|node| self.nodes.get(node).bucket.to_vec())
                .unwrap_or_default(),
            Some(query) => self.collect_ids(self.range(query)),
            None => self.collect_ids(self.iter()),
        }
    }

    /// Parse `{op, val, val2}` and evaluate it.
    ///
    /// Fails with [`IndexError::UnsupportedOperator`] before any traversal
    /// when `op` is not a known operator.
    pub fn range_request_op(&self, op: &str, val: V, val2: Option<V>) -> Result<Vec<I>> {
        let query = RangeQuery::parse(op, val, val2)?;
        Ok(self.range_request(Some(&query)))
    }

    /// Lazily walk the nodes matching `query` in ascending value order.
    pub fn range<'a>(&'a self, query: &'a RangeQuery<V>) -> Range<'a, I, V, C> {
        let (lower, upper) = query.bounds();
        Range::new(&self.nodes, &self.comparator, self.root, lower, upper)
    }

    /// Lazily walk every node in ascending value order.
    pub fn iter(&self) -> Range<'_, I, V, C> {
        use std::ops::Bound::Unbounded;
        Range::new(&self.nodes, &self.comparator, self.root, Unbounded, Unbounded)
    }

    fn collect_ids(&self, range: Range<'_, I, V, C>) -> Vec<I> {
        let mut out = Vec::new();
        for (_, bucket) in range {
            out.extend_from_slice(bucket);
        }
        out
    }

    fn find_node(&self, value: &V) -> Option<NodeId> {
        let mut cursor = self.root;
        while let Some(node) = cursor {
            let current = self.nodes.get(node);
            cursor = match self.comparator.compare(value, &current.value) {
                Ordering::Equal => return Some(node),
                Ordering::Less => current.left,
                Ordering::Greater => current.right,
            };
        }
        None
    }

    // =========================================================================
    // Validation
    // =========================================================================

    /// Check every structural invariant.
    ///
    /// Verifies BST ordering under the comparator, cached heights, the AVL
    /// balance bound, non-empty buckets and agreement between the tree and the
    /// identifier table. Intended for tests and debugging: O(n).
    pub fn validate(&self) -> Result<()> {
        let mut entries = 0usize;
        let mut reachable = 0usize;
        self.validate_subtree(self.root, None, None, &mut entries, &mut reachable)?;

        if entries != self.locations.len() {
            return Err(IndexError::invariant(
                &self.name,
                format!(
                    "tree holds {entries} identifiers but {} are tracked",
                    self.locations.len()
                ),
            ));
        }
        if reachable != self.nodes.len() {
            return Err(IndexError::invariant(
                &self.name,
                format!(
                    "{reachable} nodes reachable but {} allocated",
                    self.nodes.len()
                ),
            ));
        }
        Ok(())
    }

    /// Returns the subtree height.
    fn validate_subtree(
        &self,
        subtree: Option<NodeId>,
        lower: Option<&V>,
        upper: Option<&V>,
        entries: &mut usize,
        reachable: &mut usize,
    ) -> Result<u8> {
        let Some(id) = subtree else {
            return Ok(0);
        };
        let node = self.nodes.get(id);
        *reachable += 1;

        if let Some(lower) = lower {
            if self.comparator.compare(&node.value, lower) != Ordering::Greater {
                return Err(IndexError::invariant(
                    &self.name,
                    format!("node {} is not above its left ancestor", id.index()),
                ));
            }
        }
        if let Some(upper) = upper {
            if self.comparator.compare(&node.value, upper) != Ordering::Less {
                return Err(IndexError::invariant(
                    &self.name,
                    format!("node {} is not below its right ancestor", id.index()),
                ));
            }
        }

        if node.bucket.is_empty() {
            return Err(IndexError::invariant(
                &self.name,
                format!("node {} has an empty bucket", id.index()),
            ));
        }
        for held in &node.bucket {
            if self.locations.get(held) != Some(&id) {
                return Err(IndexError::invariant(
                    &self.name,
                    format!("identifier {held:?} is not mapped to node {}", id.index()),
                ));
            }
        }
        *entries += node.bucket.len();

        let left = self.validate_subtree(node.left, lower, Some(&node.value), entries, reachable)?;
        let right =
            self.validate_subtree(node.right, Some(&node.value), upper, entries, reachable)?;

        let expected = left.max(right) + 1;
        if node.height != expected {
            return Err(IndexError::invariant(
                &self.name,
                format!(
                    "node {} caches height {} but has height {expected}",
                    id.index(),
                    node.height
                ),
            ));
        }
        if left.abs_diff(right) > 1 {
            return Err(IndexError::invariant(
                &self.name,
                format!(
                    "node {} is unbalanced (left {left}, right {right})",
                    id.index()
                ),
            ));
        }
        Ok(expected)
    }

    // =========================================================================
    // Structure
    // =========================================================================

    #[inline]
    fn height_of(&self, subtree: Option<NodeId>) -> u8 {
        subtree.map_or(0, |id| self.nodes.get(id).height)
    }

    #[inline]
    fn child(&self, node: NodeId, side: Side) -> Option<NodeId> {
        let node = self.nodes.get(node);
        match side {
            Side::Left => node.left,
            Side::Right => node.right,
        }
    }

    #[inline]
    fn set_child(&mut self, node: NodeId, side: Side, child: Option<NodeId>) {
        let node = self.nodes.get_mut(node);
        match side {
            Side::Left => node.left = child,
            Side::Right => node.right = child,
        }
    }

    /// Hang `child` below `parent`, or make it the root when there is no parent.
    fn link(&mut self, parent: Option<&PathFrame>, child: Option<NodeId>) {
        match parent {
            Some(frame) => self.set_child(frame.node, frame.side, child),
            None => self.root = child,
        }
    }

    fn update_height(&mut self, node: NodeId) {
        let (left, right) = {
            let n = self.nodes.get(node);
            (n.left, n.right)
        };
        let height = self.height_of(left).max(self.height_of(right)) + 1;
        self.nodes.get_mut(node).height = height;
    }

    /// Left height minus right height.
    fn balance_factor(&self, node: NodeId) -> i16 {
        let n = self.nodes.get(node);
        i16::from(self.height_of(n.left)) - i16::from(self.height_of(n.right))
    }

    /// Rotate `node` down to the left; its right child takes its place.
    fn rotate_left(&mut self, node: NodeId) -> NodeId {
        let Some(pivot) = self.nodes.get(node).right else {
            return node;
        };
        trace!(index = %self.name, node = node.index(), pivot = pivot.index(), "rotate left");

        let inner = self.nodes.get(pivot).left;
        self.nodes.get_mut(node).right = inner;
        self.nodes.get_mut(pivot).left = Some(node);
        self.update_height(node);
        self.update_height(pivot);
        pivot
    }

    /// Rotate `node` down to the right; its left child takes its place.
    fn rotate_right(&mut self, node: NodeId) -> NodeId {
        let Some(pivot) = self.nodes.get(node).left else {
            return node;
        };
        trace!(index = %self.name, node = node.index(), pivot = pivot.index(), "rotate right");

        let inner = self.nodes.get(pivot).right;
        self.nodes.get_mut(node).left = inner;
        self.nodes.get_mut(pivot).right = Some(node);
        self.update_height(node);
        self.update_height(pivot);
        pivot
    }

    /// Restore the balance bound at `node`, whose children are balanced.
    /// Returns the new subtree root.
    fn rebalance(&mut self, node: NodeId) -> NodeId {
        self.update_height(node);
        let balance = self.balance_factor(node);

        if balance > 1 {
            if let Some(left) = self.nodes.get(node).left {
                // Left-right case.
                if self.balance_factor(left) < 0 {
                    let rotated = self.rotate_left(left);
                    self.nodes.get_mut(node).left = Some(rotated);
                }
            }
            return self.rotate_right(node);
        }
        if balance < -1 {
            if let Some(right) = self.nodes.get(node).right {
                // Right-left case.
                if self.balance_factor(right) > 0 {
                    let rotated = self.rotate_right(right);
                    self.nodes.get_mut(node).right = Some(rotated);
                }
            }
            return self.rotate_left(node);
        }
        node
    }

    /// Rebalance every node on `path`, deepest first, relinking each rebalanced
    /// subtree into its parent.
    fn retrace(&mut self, path: &[PathFrame]) {
        for depth in (0..path.len()).rev() {
            let balanced = self.rebalance(path[depth].node);
            if balanced != path[depth].node {
                self.link(path[..depth].last(), Some(balanced));
            }
        }
    }

    /// Root-to-parent path of a linked node.
    ///
    /// Descends by value first. A comparator that is not a consistent total
    /// order can steer that descent away from `target`, in which case the
    /// path is found from the tree structure instead.
    fn path_to(&self, target: NodeId) -> Vec<PathFrame> {
        let value = &self.nodes.get(target).value;
        let mut path = Vec::with_capacity(self.height());
        let mut cursor = self.root;
        while let Some(node) = cursor {
            if node == target {
                return path;
            }
            let side = match self.comparator.compare(value, &self.nodes.get(node).value) {
                Ordering::Less => Side::Left,
                Ordering::Greater => Side::Right,
                Ordering::Equal => break,
            };
            path.push(PathFrame { node, side });
            cursor = self.child(node, side);
        }

        debug!(index = %self.name, node = target.index(), "value descent missed node");
        path.clear();
        self.search_path(self.root, target, &mut path);
        path
    }

    /// Depth-first search for `target` below `subtree`, leaving the path to it
    /// in `path`.
    fn search_path(
        &self,
        subtree: Option<NodeId>,
        target: NodeId,
        path: &mut Vec<PathFrame>,
    ) -> bool {
        let Some(node) = subtree else {
            return false;
        };
        if node == target {
            return true;
        }
        for side in [Side::Left, Side::Right] {
            path.push(PathFrame { node, side });
            if self.search_path(self.child(node, side), target, path) {
                return true;
            }
            path.pop();
        }
        false
    }

    /// Unlink a node whose bucket just emptied, free it and rebalance.
    fn delete_node(&mut self, target: NodeId) {
        let mut path = self.path_to(target);
        let (left, right) = {
            let n = self.nodes.get(target);
            (n.left, n.right)
        };

        match (left, right) {
            (Some(_), Some(right)) => {
                // The in-order successor (leftmost node of the right subtree)
                // is moved into the target's position. Nodes are relinked, not
                // copied, so every NodeId in the identifier table stays valid.
                let slot = path.len();
                path.push(PathFrame {
                    node: target,
                    side: Side::Right,
                });
                let mut successor = right;
                while let Some(next) = self.nodes.get(successor).left {
                    path.push(PathFrame {
                        node: successor,
                        side: Side::Left,
                    });
                    successor = next;
                }

                let successor_right = self.nodes.get(successor).right;
                self.link(path.last(), successor_right);

                let (left, right, height) = {
                    let t = self.nodes.get(target);
                    (t.left, t.right, t.height)
                };
                let moved = self.nodes.get_mut(successor);
                moved.left = left;
                moved.right = right;
                moved.height = height;

                path[slot].node = successor;
                self.link(path[..slot].last(), Some(successor));
            }
            (child, None) | (None, child) => {
                self.link(path.last(), child);
            }
        }

        self.nodes.free(target);
        trace!(index = %self.name, node = target.index(), "deleted node");
        self.retrace(&path);
    }
}

impl<I, V, C> fmt::Debug for AvlIndex<I, V, C>
where
    I: Eq + Hash + Clone + fmt::Debug,
    V: fmt::Debug,
    C: Comparator<V>,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
