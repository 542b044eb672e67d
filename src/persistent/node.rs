//! B-tree nodes and the top-down insertion engine.
//!
//! Every node is immutable once it is shared. Updates clone the nodes along
//! the path from the root to the changed position and reuse every other
//! subtree through its [`ReferenceCounter`]. Local restructuring (splits,
//! rotations, merges) goes through [`ReferenceCounter::make_mut`], so a
//! child that is still shared with an older version is copied first while a
//! freshly built child is edited in place.
//!
//! # Shape
//!
//! With minimum degree [`B`] = 6:
//!
//! - every node holds at most [`CAPACITY`] = 11 keys
//! - every non-root node holds at least [`MIN_LEN`] = 5 keys
//! - an internal node with `n` keys has exactly `n + 1` children
//! - all leaves sit at the same depth

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::mem;

use arrayvec::ArrayVec;
use static_assertions::{const_assert, const_assert_eq};

use super::ReferenceCounter;

// =============================================================================
// Constants
// =============================================================================

/// Minimum degree of the tree.
pub(crate) const B: usize = 6;

/// Maximum number of keys held by a node.
pub(crate) const CAPACITY: usize = 2 * B - 1;

/// Minimum number of keys held by a non-root node.
pub(crate) const MIN_LEN: usize = B - 1;

/// Maximum number of children held by an internal node.
pub(crate) const EDGE_CAPACITY: usize = 2 * B;

const_assert_eq!(EDGE_CAPACITY, CAPACITY + 1);
const_assert!(2 * MIN_LEN + 1 == CAPACITY);

const LEAF_HAS_NO_EDGES_MESSAGE: &str = "leaf nodes have no edges";
const EMPTY_NODE_MESSAGE: &str = "cannot take an entry from an empty node";
const LEVEL_MISMATCH_MESSAGE: &str = "an edge must be supplied exactly when the node is internal";
const SPLIT_NOT_FULL_MESSAGE: &str = "split_child requires a full child";

// =============================================================================
// Node Definition
// =============================================================================

/// Shared handle to a node.
pub(crate) type NodeRef<K, V> = ReferenceCounter<Node<K, V>>;

pub(crate) type Keys<K> = ArrayVec<K, CAPACITY>;
pub(crate) type Values<V> = ArrayVec<V, CAPACITY>;
pub(crate) type Edges<K, V> = ArrayVec<NodeRef<K, V>, EDGE_CAPACITY>;

/// A B-tree node.
///
/// `keys` and `values` are parallel arrays. For an internal node,
/// `edges[i]` holds the keys less than `keys[i]` and `edges[i + 1]` holds
/// the keys greater than it.
#[derive(Clone)]
pub(crate) enum Node<K, V> {
    Leaf {
        keys: Keys<K>,
        values: Values<V>,
    },
    Internal {
        keys: Keys<K>,
        values: Values<V>,
        edges: Edges<K, V>,
    },
}

impl<K, V> Node<K, V> {
    pub(crate) fn empty_leaf() -> Self {
        Self::Leaf {
            keys: ArrayVec::new(),
            values: ArrayVec::new(),
        }
    }

    pub(crate) fn empty_internal() -> Self {
        Self::Internal {
            keys: ArrayVec::new(),
            values: ArrayVec::new(),
            edges: ArrayVec::new(),
        }
    }

    #[inline]
    pub(crate) fn keys(&self) -> &[K] {
        match self {
            Self::Leaf { keys, .. } | Self::Internal { keys, .. } => keys,
        }
    }

    #[inline]
    pub(crate) fn values(&self) -> &[V] {
        match self {
            Self::Leaf { values, .. } | Self::Internal { values, .. } => values,
        }
    }

    /// Returns the children, or `None` for a leaf.
    #[inline]
    pub(crate) fn edges(&self) -> Option<&[NodeRef<K, V>]> {
        match self {
            Self::Leaf { .. } => None,
            Self::Internal { edges, .. } => Some(edges),
        }
    }

    #[inline]
    pub(crate) fn len(&self) -> usize {
        self.keys().len()
    }

    #[inline]
    pub(crate) const fn is_leaf(&self) -> bool {
        matches!(self, Self::Leaf { .. })
    }

    #[inline]
    pub(crate) fn is_full(&self) -> bool {
        self.len() >= CAPACITY
    }

    /// A thin node cannot give up a key without dropping below [`MIN_LEN`].
    #[inline]
    pub(crate) fn is_thin(&self) -> bool {
        self.len() < B
    }

    /// Returns child `index` of an internal node.
    ///
    /// # Panics
    ///
    /// Panics if the node is a leaf or `index` is out of bounds.
    #[inline]
    pub(crate) fn edge(&self, index: usize) -> &NodeRef<K, V> {
        match self {
            Self::Internal { edges, .. } => &edges[index],
            Self::Leaf { .. } => unreachable!("{}", LEAF_HAS_NO_EDGES_MESSAGE),
        }
    }

    /// Locates `key` among this node's keys.
    ///
    /// Returns `Ok(i)` when `keys[i]` equals `key`, otherwise `Err(i)` where
    /// `i` is the number of keys less than `key`. Nodes are small enough
    /// that a linear scan beats a binary search.
    pub(crate) fn find_key_in<Q>(&self, key: &Q) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        for (index, candidate) in self.keys().iter().enumerate() {
            match key.cmp(candidate.borrow()) {
                Ordering::Less => return Err(index),
                Ordering::Equal => return Ok(index),
                Ordering::Greater => {}
            }
        }
        Err(self.len())
    }

    /// Returns the smallest entry of the subtree rooted here.
    pub(crate) fn first_entry(&self) -> Option<(&K, &V)> {
        match self {
            Self::Leaf { keys, values } => keys.first().zip(values.first()),
            Self::Internal { edges, .. } => edges.first().and_then(|edge| edge.first_entry()),
        }
    }

    /// Returns the largest entry of the subtree rooted here.
    pub(crate) fn last_entry(&self) -> Option<(&K, &V)> {
        match self {
            Self::Leaf { keys, values } => keys.last().zip(values.last()),
            Self::Internal { edges, .. } => edges.last().and_then(|edge| edge.last_entry()),
        }
    }

    // =========================================================================
    // Local Mutation
    // =========================================================================

    fn parts_mut(&mut self) -> (&mut Keys<K>, &mut Values<V>, Option<&mut Edges<K, V>>) {
        match self {
            Self::Leaf { keys, values } => (keys, values, None),
            Self::Internal {
                keys,
                values,
                edges,
            } => (keys, values, Some(edges)),
        }
    }

    pub(crate) fn edges_mut(&mut self) -> &mut Edges<K, V> {
        match self {
            Self::Internal { edges, .. } => edges,
            Self::Leaf { .. } => unreachable!("{}", LEAF_HAS_NO_EDGES_MESSAGE),
        }
    }

    pub(crate) fn set_edge(&mut self, index: usize, child: Self) {
        self.edges_mut()[index] = ReferenceCounter::new(child);
    }

    pub(crate) fn replace_value(&mut self, index: usize, value: V) -> V {
        mem::replace(&mut self.parts_mut().1[index], value)
    }

    pub(crate) fn replace_entry(&mut self, index: usize, key: K, value: V) -> (K, V) {
        let (keys, values, _) = self.parts_mut();
        (
            mem::replace(&mut keys[index], key),
            mem::replace(&mut values[index], value),
        )
    }

    /// Inserts an entry into a leaf at `index`.
    pub(crate) fn insert_entry(&mut self, index: usize, key: K, value: V) {
        debug_assert!(self.is_leaf(), "entries without an edge belong in a leaf");
        let (keys, values, _) = self.parts_mut();
        keys.insert(index, key);
        values.insert(index, value);
    }

    /// Removes the entry at `index` from a leaf.
    pub(crate) fn remove_entry(&mut self, index: usize) -> (K, V) {
        debug_assert!(self.is_leaf(), "entries without an edge belong in a leaf");
        let (keys, values, _) = self.parts_mut();
        (keys.remove(index), values.remove(index))
    }

    /// Prepends an entry, together with a new first child for internal nodes.
    pub(crate) fn push_front(&mut self, key: K, value: V, edge: Option<NodeRef<K, V>>) {
        match (self.parts_mut(), edge) {
            ((keys, values, None), None) => {
                keys.insert(0, key);
                values.insert(0, value);
            }
            ((keys, values, Some(edges)), Some(edge)) => {
                keys.insert(0, key);
                values.insert(0, value);
                edges.insert(0, edge);
            }
            _ => unreachable!("{}", LEVEL_MISMATCH_MESSAGE),
        }
    }

    /// Appends an entry, together with a new last child for internal nodes.
    pub(crate) fn push_back(&mut self, key: K, value: V, edge: Option<NodeRef<K, V>>) {
        match (self.parts_mut(), edge) {
            ((keys, values, None), None) => {
                keys.push(key);
                values.push(value);
            }
            ((keys, values, Some(edges)), Some(edge)) => {
                keys.push(key);
                values.push(value);
                edges.push(edge);
            }
            _ => unreachable!("{}", LEVEL_MISMATCH_MESSAGE),
        }
    }

    /// Removes the first entry and, for internal nodes, the first child.
    pub(crate) fn pop_front(&mut self) -> (K, V, Option<NodeRef<K, V>>) {
        let (keys, values, edges) = self.parts_mut();
        match (keys.pop_at(0), values.pop_at(0)) {
            (Some(key), Some(value)) => (key, value, edges.and_then(|edges| edges.pop_at(0))),
            _ => unreachable!("{}", EMPTY_NODE_MESSAGE),
        }
    }

    /// Removes the last entry and, for internal nodes, the last child.
    pub(crate) fn pop_back(&mut self) -> (K, V, Option<NodeRef<K, V>>) {
        let (keys, values, edges) = self.parts_mut();
        match (keys.pop(), values.pop()) {
            (Some(key), Some(value)) => (key, value, edges.and_then(ArrayVec::pop)),
            _ => unreachable!("{}", EMPTY_NODE_MESSAGE),
        }
    }
}

// =============================================================================
// Restructuring
// =============================================================================

impl<K: Clone, V: Clone> Node<K, V> {
    /// Splits a full node around its median.
    ///
    /// Returns the left half, the median entry and the right half. Each half
    /// holds exactly [`MIN_LEN`] keys.
    fn split_at_median(&self) -> (Self, K, V, Self) {
        let keys = self.keys();
        let values = self.values();
        let left_keys: Keys<K> = keys[..MIN_LEN].iter().cloned().collect();
        let left_values: Values<V> = values[..MIN_LEN].iter().cloned().collect();
        let right_keys: Keys<K> = keys[B..].iter().cloned().collect();
        let right_values: Values<V> = values[B..].iter().cloned().collect();
        let median_key = keys[MIN_LEN].clone();
        let median_value = values[MIN_LEN].clone();

        match self {
            Self::Leaf { .. } => (
                Self::Leaf {
                    keys: left_keys,
                    values: left_values,
                },
                median_key,
                median_value,
                Self::Leaf {
                    keys: right_keys,
                    values: right_values,
                },
            ),
            Self::Internal { edges, .. } => (
                Self::Internal {
                    keys: left_keys,
                    values: left_values,
                    edges: edges[..B].iter().cloned().collect(),
                },
                median_key,
                median_value,
                Self::Internal {
                    keys: right_keys,
                    values: right_values,
                    edges: edges[B..].iter().cloned().collect(),
                },
            ),
        }
    }

    /// Splits the full child at `index`, lifting its median into this node.
    ///
    /// This node must not be full.
    ///
    /// # Panics
    ///
    /// Panics if the child at `index` is not full.
    pub(crate) fn split_child(&mut self, index: usize) {
        let child = self.edge(index);
        assert!(child.is_full(), "{}", SPLIT_NOT_FULL_MESSAGE);
        let (left, median_key, median_value, right) = child.split_at_median();

        let (keys, values, edges) = self.parts_mut();
        let Some(edges) = edges else {
            unreachable!("{}", LEAF_HAS_NO_EDGES_MESSAGE)
        };
        keys.insert(index, median_key);
        values.insert(index, median_value);
        edges[index] = ReferenceCounter::new(left);
        edges.insert(index + 1, ReferenceCounter::new(right));
    }

    /// Moves one entry from child `index - 1` through separator `index - 1`
    /// into the front of child `index`.
    pub(crate) fn rotate_right(&mut self, index: usize) {
        let (keys, values, edges) = self.parts_mut();
        let Some(edges) = edges else {
            unreachable!("{}", LEAF_HAS_NO_EDGES_MESSAGE)
        };
        let (key, value, edge) = ReferenceCounter::make_mut(&mut edges[index - 1]).pop_back();
        let separator_key = mem::replace(&mut keys[index - 1], key);
        let separator_value = mem::replace(&mut values[index - 1], value);
        ReferenceCounter::make_mut(&mut edges[index]).push_front(
            separator_key,
            separator_value,
            edge,
        );
    }

    /// Moves one entry from child `index + 1` through separator `index`
    /// into the back of child `index`.
    pub(crate) fn rotate_left(&mut self, index: usize) {
        let (keys, values, edges) = self.parts_mut();
        let Some(edges) = edges else {
            unreachable!("{}", LEAF_HAS_NO_EDGES_MESSAGE)
        };
        let (key, value, edge) = ReferenceCounter::make_mut(&mut edges[index + 1]).pop_front();
        let separator_key = mem::replace(&mut keys[index], key);
        let separator_value = mem::replace(&mut values[index], value);
        ReferenceCounter::make_mut(&mut edges[index]).push_back(
            separator_key,
            separator_value,
            edge,
        );
    }

    /// Folds separator `index` and child `index + 1` into child `index`.
    ///
    /// Both children must be thin so the merged node fits.
    pub(crate) fn merge_children(&mut self, index: usize) {
        let (keys, values, edges) = self.parts_mut();
        let Some(edges) = edges else {
            unreachable!("{}", LEAF_HAS_NO_EDGES_MESSAGE)
        };
        let separator_key = keys.remove(index);
        let separator_value = values.remove(index);
        let right = edges.remove(index + 1);
        ReferenceCounter::make_mut(&mut edges[index]).append(
            separator_key,
            separator_value,
            &right,
        );
    }

    fn append(&mut self, separator_key: K, separator_value: V, right: &Self) {
        let (keys, values, edges) = self.parts_mut();
        keys.push(separator_key);
        values.push(separator_value);
        keys.extend(right.keys().iter().cloned());
        values.extend(right.values().iter().cloned());
        match (edges, right.edges()) {
            (Some(edges), Some(right_edges)) => edges.extend(right_edges.iter().cloned()),
            (None, None) => {}
            _ => unreachable!("{}", LEVEL_MISMATCH_MESSAGE),
        }
    }
}

// =============================================================================
// Insertion
// =============================================================================

impl<K: Clone + Ord, V: Clone> Node<K, V> {
    /// Inserts into the tree rooted at `root` and returns the new root.
    ///
    /// A full root is split before descending, which is the only way the
    /// tree grows in height. Returns the value previously stored under an
    /// equal key.
    pub(crate) fn insert_root(
        root: Option<&NodeRef<K, V>>,
        key: K,
        value: V,
    ) -> (Option<V>, NodeRef<K, V>) {
        let Some(root) = root else {
            let mut leaf = Self::empty_leaf();
            leaf.push_back(key, value, None);
            return (None, ReferenceCounter::new(leaf));
        };

        if !root.is_full() {
            let (previous, node) = root.insert_not_full(key, value);
            return (previous, ReferenceCounter::new(node));
        }

        trace_structure!("splitting full root");
        let mut grown = Self::empty_internal();
        grown.edges_mut().push(root.clone());
        grown.split_child(0);
        let (previous, node) = grown.insert_after_split(0, key, value);
        (previous, ReferenceCounter::new(node))
    }

    /// Inserts into a subtree whose root has room for one more key.
    fn insert_not_full(&self, key: K, value: V) -> (Option<V>, Self) {
        let mut node = self.clone();
        match self.find_key_in(&key) {
            Ok(index) => {
                let previous = node.replace_value(index, value);
                (Some(previous), node)
            }
            Err(index) if node.is_leaf() => {
                node.insert_entry(index, key, value);
                (None, node)
            }
            Err(index) => node.insert_into_child(index, key, value),
        }
    }

    fn insert_into_child(mut self, index: usize, key: K, value: V) -> (Option<V>, Self) {
        if self.edge(index).is_full() {
            self.split_child(index);
            return self.insert_after_split(index, key, value);
        }
        self.insert_into_roomy_child(index, key, value)
    }

    /// Routes `key` after child `index` was split into `index` and `index + 1`.
    fn insert_after_split(mut self, index: usize, key: K, value: V) -> (Option<V>, Self) {
        match key.cmp(&self.keys()[index]) {
            Ordering::Equal => {
                let previous = self.replace_value(index, value);
                (Some(previous), self)
            }
            Ordering::Less => self.insert_into_roomy_child(index, key, value),
            Ordering::Greater => self.insert_into_roomy_child(index + 1, key, value),
        }
    }

    fn insert_into_roomy_child(mut self, index: usize, key: K, value: V) -> (Option<V>, Self) {
        let (previous, child) = self.edge(index).insert_not_full(key, value);
        self.set_edge(index, child);
        (previous, self)
    }
}
