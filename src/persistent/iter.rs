//! Lazy in-order cursors over B-tree nodes.
//!
//! A cursor keeps one frame per level, from the root down to the node
//! holding the next entry, so advancing costs amortised O(1) and the whole
//! traversal never materialises the entries. Cursors are generic over the
//! way they hold nodes: borrowed handles back the `iter` and `range`
//! iterators, shared handles back the owning iterators.

use std::borrow::Borrow;
use std::ops::Bound;

use smallvec::SmallVec;

use super::node::{Node, NodeRef};

/// Frames kept inline before the stack spills to the heap. Trees of eight
/// levels already hold hundreds of millions of entries.
const INLINE_DEPTH: usize = 8;

/// A way of holding on to a node while a cursor is parked on it.
pub(crate) trait NodeHandle: Clone {
    type Key;
    type Value;

    fn node(&self) -> &Node<Self::Key, Self::Value>;

    /// Returns child `index`, or `None` for a leaf.
    fn child(&self, index: usize) -> Option<Self>;
}

impl<K, V> NodeHandle for &Node<K, V> {
    type Key = K;
    type Value = V;

    #[inline]
    fn node(&self) -> &Node<K, V> {
        self
    }

    #[inline]
    fn child(&self, index: usize) -> Option<Self> {
        let node: Self = *self;
        node.edges().map(|edges| &*edges[index])
    }
}

impl<K, V> NodeHandle for NodeRef<K, V> {
    type Key = K;
    type Value = V;

    #[inline]
    fn node(&self) -> &Node<K, V> {
        self
    }

    #[inline]
    fn child(&self, index: usize) -> Option<Self> {
        self.edges().map(|edges| edges[index].clone())
    }
}

// =============================================================================
// Ascending
// =============================================================================

/// Front-to-back cursor.
///
/// Each frame stores the index of the next key to yield in its node.
#[derive(Clone)]
pub(crate) struct Ascending<H> {
    frames: SmallVec<[(H, usize); INLINE_DEPTH]>,
}

impl<H: NodeHandle> Ascending<H> {
    pub(crate) fn new(root: Option<H>) -> Self {
        let mut cursor = Self {
            frames: SmallVec::new(),
        };
        if let Some(root) = root {
            cursor.descend(root);
        }
        cursor
    }

    /// Positions the cursor on the first key satisfying `bound`.
    pub(crate) fn seek<Q>(root: Option<H>, bound: Bound<&Q>) -> Self
    where
        H::Key: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let mut frames = SmallVec::new();
        let mut current = root;
        while let Some(handle) = current {
            let position = handle
                .node()
                .keys()
                .iter()
                .take_while(|&key| !satisfies_lower(<H::Key as Borrow<Q>>::borrow(key), bound))
                .count();
            current = handle.child(position);
            frames.push((handle, position));
        }
        Self { frames }
    }

    fn descend(&mut self, handle: H) {
        let mut current = Some(handle);
        while let Some(handle) = current {
            current = handle.child(0);
            self.frames.push((handle, 0));
        }
    }

    /// Returns the node and index of the next entry.
    pub(crate) fn next(&mut self) -> Option<(H, usize)> {
        loop {
            let (handle, next_index) = self.frames.last_mut()?;
            let position = *next_index;
            if position < handle.node().len() {
                *next_index += 1;
                let yielded = handle.clone();
                if let Some(child) = yielded.child(position + 1) {
                    self.descend(child);
                }
                return Some((yielded, position));
            }
            self.frames.pop();
        }
    }
}

// =============================================================================
// Descending
// =============================================================================

/// Back-to-front cursor.
///
/// Each frame stores how many keys of its node are still unvisited; the
/// next key to yield sits just below that count.
#[derive(Clone)]
pub(crate) struct Descending<H> {
    frames: SmallVec<[(H, usize); INLINE_DEPTH]>,
}

impl<H: NodeHandle> Descending<H> {
    pub(crate) fn new(root: Option<H>) -> Self {
        let mut cursor = Self {
            frames: SmallVec::new(),
        };
        if let Some(root) = root {
            cursor.descend(root);
        }
        cursor
    }

    fn descend(&mut self, handle: H) {
        let mut current = Some(handle);
        while let Some(handle) = current {
            let len = handle.node().len();
            current = handle.child(len);
            self.frames.push((handle, len));
        }
    }

    /// Returns the node and index of the previous entry.
    pub(crate) fn next(&mut self) -> Option<(H, usize)> {
        loop {
            let (handle, unvisited) = self.frames.last_mut()?;
            if *unvisited > 0 {
                *unvisited -= 1;
                let position = *unvisited;
                let yielded = handle.clone();
                if let Some(child) = yielded.child(position) {
                    self.descend(child);
                }
                return Some((yielded, position));
            }
            self.frames.pop();
        }
    }
}

// =============================================================================
// Bounds
// =============================================================================

pub(crate) fn satisfies_lower<Q: Ord + ?Sized>(key: &Q, bound: Bound<&Q>) -> bool {
    match bound {
        Bound::Included(start) => key >= start,
        Bound::Excluded(start) => key > start,
        Bound::Unbounded => true,
    }
}

pub(crate) fn satisfies_upper<Q: Ord + ?Sized>(key: &Q, bound: Bound<&Q>) -> bool {
    match bound {
        Bound::Included(end) => key <= end,
        Bound::Excluded(end) => key < end,
        Bound::Unbounded => true,
    }
}

/// Finds the largest key satisfying the upper `bound`.
///
/// Keys deeper in the tree along the search path are larger than the
/// in-bound keys of their ancestors, so the deepest candidate wins.
pub(crate) fn last_within<'a, K, V, Q>(
    root: Option<&'a Node<K, V>>,
    bound: Bound<&Q>,
) -> Option<&'a K>
where
    K: Borrow<Q>,
    Q: Ord + ?Sized,
{
    let mut best = None;
    let mut current = root;
    while let Some(node) = current {
        let keys = node.keys();
        let position = keys
            .iter()
            .take_while(|&key| satisfies_upper(<K as Borrow<Q>>::borrow(key), bound))
            .count();
        if let Some(index) = position.checked_sub(1) {
            best = Some(&keys[index]);
        }
        current = node.edges().map(|edges| &*edges[position]);
    }
    best
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::ReferenceCounter;
    use rstest::rstest;

    fn tree(size: i32) -> NodeRef<i32, i32> {
        let (root, _) = Node::build_from_sorted((0..size).map(|key| (key, -key)));
        root.unwrap()
    }

    fn drain_ascending<H: NodeHandle<Key = i32>>(mut cursor: Ascending<H>) -> Vec<i32> {
        let mut keys = Vec::new();
        while let Some((handle, index)) = cursor.next() {
            keys.push(handle.node().keys()[index]);
        }
        keys
    }

    #[rstest]
    #[case(1)]
    #[case(11)]
    #[case(12)]
    #[case(500)]
    fn ascending_visits_all_keys_in_order(#[case] size: i32) {
        let root = tree(size);
        let keys = drain_ascending(Ascending::new(Some(&*root)));
        assert_eq!(keys, (0..size).collect::<Vec<_>>());
    }

    #[rstest]
    #[case(1)]
    #[case(12)]
    #[case(500)]
    fn descending_visits_all_keys_in_reverse(#[case] size: i32) {
        let root = tree(size);
        let mut cursor = Descending::new(Some(root.clone()));
        let mut keys = Vec::new();
        while let Some((handle, index)) = cursor.next() {
            keys.push(handle.keys()[index]);
        }
        assert_eq!(keys, (0..size).rev().collect::<Vec<_>>());
    }

    #[rstest]
    fn shared_handles_keep_nodes_alive() {
        let cursor = {
            let root = tree(100);
            Ascending::new(Some(ReferenceCounter::clone(&root)))
        };
        assert_eq!(drain_ascending(cursor), (0..100).collect::<Vec<_>>());
    }

    #[rstest]
    #[case(Bound::Included(40), 40)]
    #[case(Bound::Excluded(40), 41)]
    #[case(Bound::Unbounded, 0)]
    fn seek_starts_at_lower_bound(#[case] bound: Bound<i32>, #[case] first: i32) {
        let root = tree(300);
        let cursor = Ascending::seek(Some(&*root), bound.as_ref());
        let keys = drain_ascending(cursor);
        assert_eq!(keys.first(), Some(&first));
        assert_eq!(keys.last(), Some(&299));
    }

    #[rstest]
    fn seek_past_the_end_yields_nothing() {
        let root = tree(300);
        let cursor = Ascending::seek(Some(&*root), Bound::Included(&1000));
        assert!(drain_ascending(cursor).is_empty());
    }

    #[rstest]
    #[case(Bound::Included(150), Some(150))]
    #[case(Bound::Excluded(150), Some(149))]
    #[case(Bound::Unbounded, Some(299))]
    #[case(Bound::Excluded(0), None)]
    #[case(Bound::Included(5000), Some(299))]
    fn last_within_finds_largest_in_bound_key(
        #[case] bound: Bound<i32>,
        #[case] expected: Option<i32>,
    ) {
        let root = tree(300);
        assert_eq!(last_within(Some(&*root), bound.as_ref()).copied(), expected);
    }

    #[rstest]
    fn bounds_on_borrowed_keys() {
        let names = ["apple", "banana", "cherry"].map(|name| (name.to_string(), ()));
        let (root, _) = Node::build_from_sorted(names);
        let root = root.unwrap();
        let last = last_within::<String, (), str>(Some(&*root), Bound::Excluded("cherry"));
        assert_eq!(last.map(String::as_str), Some("banana"));
    }
}
