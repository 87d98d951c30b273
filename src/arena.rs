//! Slot arena for tree nodes.
//!
//! Nodes are addressed by 32-bit [`NodeId`] indices instead of pointers, so
//! rotations are plain index reassignments. Freed slots are chained into a
//! free list and reused by the next allocation; a `NodeId` stays valid until
//! its node is freed.

use smallvec::SmallVec;

/// Identifiers sharing one value. Most values are unique, so one id is stored
/// inline.
pub(crate) type Bucket<I> = SmallVec<[I; 1]>;

/// Index of a node slot.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub(crate) struct NodeId(u32);

impl NodeId {
    #[inline]
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }

    /// # Panics
    /// Panics if the arena grows past `u32::MAX` slots.
    fn from_usize(idx: usize) -> Self {
        assert!(idx < u32::MAX as usize, "node arena index too large");
        Self(idx as u32)
    }
}

/// A tree node: one distinct value and the ids currently mapped to it.
#[derive(Clone, Debug)]
pub(crate) struct Node<I, V> {
    pub(crate) value: V,
    /// Insertion order. Never empty while the node is linked.
    pub(crate) bucket: Bucket<I>,
    pub(crate) left: Option<NodeId>,
    pub(crate) right: Option<NodeId>,
    /// Height of the subtree rooted here; a leaf is 1.
    pub(crate) height: u8,
}

impl<I, V> Node<I, V> {
    fn leaf(value: V, id: I) -> Self {
        let mut bucket = Bucket::new();
        bucket.push(id);
        Self {
            value,
            bucket,
            left: None,
            right: None,
            height: 1,
        }
    }
}

#[derive(Clone, Debug)]
enum Slot<I, V> {
    Occupied(Node<I, V>),
    Vacant { next_free: Option<NodeId> },
}

/// Node storage with a free list.
#[derive(Clone, Debug)]
pub(crate) struct NodeArena<I, V> {
    slots: Vec<Slot<I, V>>,
    free_head: Option<NodeId>,
    live: usize,
}

impl<I, V> NodeArena<I, V> {
    pub(crate) fn with_capacity(capacity: usize) -> Self {
        Self {
            slots: Vec::with_capacity(capacity),
            free_head: None,
            live: 0,
        }
    }

    /// Number of occupied slots.
    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.live
    }

    /// Allocate a leaf node holding `value` with `id` as its only bucket entry.
    pub(crate) fn alloc(&mut self, value: V, id: I) -> NodeId {
        let node = Slot::Occupied(Node::leaf(value, id));
        self.live += 1;

        match self.free_head {
            Some(free) => {
                let slot = &mut self.slots[free.index()];
                self.free_head = match slot {
                    Slot::Vacant { next_free } => *next_free,
                    Slot::Occupied(_) => unreachable!("free list points at live node {free:?}"),
                };
                *slot = node;
                free
            }
            None => {
                let id = NodeId::from_usize(self.slots.len());
                self.slots.push(node);
                id
            }
        }
    }

    /// Release a node's slot and hand its contents back.
    pub(crate) fn free(&mut self, id: NodeId) -> Node<I, V> {
        let vacant = Slot::Vacant {
            next_free: self.free_head,
        };
        match std::mem::replace(&mut self.slots[id.index()], vacant) {
            Slot::Occupied(node) => {
                self.free_head = Some(id);
                self.live -= 1;
                node
            }
            Slot::Vacant { .. } => unreachable!("double free of node {id:?}"),
        }
    }

    #[inline]
    pub(crate) fn get(&self, id: NodeId) -> &Node<I, V> {
        match &self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("access to freed node {id:?}"),
        }
    }

    #[inline]
    pub(crate) fn get_mut(&mut self, id: NodeId) -> &mut Node<I, V> {
        match &mut self.slots[id.index()] {
            Slot::Occupied(node) => node,
            Slot::Vacant { .. } => unreachable!("access to freed node {id:?}"),
        }
    }

    /// Drop every node. Keeps the allocation.
    pub(crate) fn clear(&mut self) {
        self.slots.clear();
        self.free_head = None;
        self.live = 0;
    }
}
