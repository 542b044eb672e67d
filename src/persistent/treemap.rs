//! Persistent (immutable) ordered map based on a B-tree.
//!
//! This module provides [`PersistentTreeMap`], an immutable ordered map
//! that uses structural sharing for efficient operations.
//!
//! # Overview
//!
//! `PersistentTreeMap` is a B-tree of minimum degree 6: every node holds
//! between 5 and 11 keys (the root may hold fewer) and all leaves sit at
//! the same depth. Wide nodes keep the tree shallow, so point operations
//! touch few nodes and iteration stays cache friendly.
//!
//! - O(log N) get
//! - O(log N) insert
//! - O(log N) remove
//! - O(1) len
//! - O(N) construction from sorted input
//! - Ordered iteration (in-order traversal)
//!
//! All operations return new maps without modifying the original,
//! and structural sharing ensures memory efficiency.
//!
//! # Examples
//!
//! ```rust
//! use persistent_btree::persistent::PersistentTreeMap;
//!
//! let (_, map) = PersistentTreeMap::new().insert(3, "three");
//! let (_, map) = map.insert(1, "one");
//! let (_, map) = map.insert(2, "two");
//!
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert_eq!(map.len(), 3);
//!
//! // Entries are always in sorted order
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! // Structural sharing: the original map is preserved
//! let (removed, smaller) = map.remove(&2);
//! assert_eq!(removed, Some("two"));
//! assert_eq!(map.len(), 3);
//! assert_eq!(smaller.len(), 2);
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FusedIterator, Peekable};
use std::ops::RangeBounds;

use super::ReferenceCounter;
use super::invariant::{self, InvariantViolation};
use super::iter::{Ascending, Descending, last_within};
use super::node::{Node, NodeRef};
use super::remove::Seek;

// =============================================================================
// PersistentTreeMap Definition
// =============================================================================

/// A persistent (immutable) ordered map based on a B-tree.
///
/// `PersistentTreeMap` is an immutable data structure that uses structural
/// sharing to efficiently support functional programming patterns.
///
/// Keys must implement `Ord` for ordering. The map maintains entries in
/// sorted key order, enabling efficient range queries and ordered iteration.
///
/// # Time Complexity
///
/// | Operation          | Complexity        |
/// |--------------------|-------------------|
/// | `new`              | O(1)              |
/// | `get`              | O(log N)          |
/// | `insert`           | O(log N)          |
/// | `remove`           | O(log N)          |
/// | `contains_key`     | O(log N)          |
/// | `first_key_value`  | O(log N)          |
/// | `range`            | O(log N + k)      |
/// | `from_sorted_iter` | O(N)              |
/// | `len`              | O(1)              |
/// | `is_empty`         | O(1)              |
///
/// # Examples
///
/// ```rust
/// use persistent_btree::persistent::PersistentTreeMap;
///
/// let map = PersistentTreeMap::singleton(42, "answer");
/// assert_eq!(map.get(&42), Some(&"answer"));
///
/// // Ordered iteration
/// let map: PersistentTreeMap<i32, &str> =
///     [(3, "three"), (1, "one"), (2, "two")].into_iter().collect();
///
/// let keys: Vec<&i32> = map.keys().collect();
/// assert_eq!(keys, vec![&1, &2, &3]);
/// ```
pub struct PersistentTreeMap<K, V> {
    /// Root node of the tree, absent when the map is empty
    root: Option<NodeRef<K, V>>,
    /// Number of entries
    length: usize,
}

impl<K, V> Clone for PersistentTreeMap<K, V> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            root: self.root.clone(),
            length: self.length,
        }
    }
}

impl<K, V> PersistentTreeMap<K, V> {
    /// Creates a new empty map.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
    /// assert!(map.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            root: None,
            length: 0,
        }
    }

    /// Returns the number of entries in the map.
    ///
    /// # Complexity
    ///
    /// O(1)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
    /// assert_eq!(map.len(), 2);
    /// ```
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.length
    }

    /// Returns `true` if the map contains no entries.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let empty: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
    /// assert!(empty.is_empty());
    ///
    /// let (_, non_empty) = empty.insert(1, "one".to_string());
    /// assert!(!non_empty.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.length == 0
    }

    /// Returns `true` if both maps share the same root node.
    ///
    /// Maps sharing a root are always equal; unequal roots say nothing
    /// about equality. Useful to observe structural sharing.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::singleton(1, "one");
    /// let (_, unchanged) = map.remove(&2);
    /// assert!(map.ptr_eq(&unchanged));
    /// ```
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        match (&self.root, &other.root) {
            (Some(left), Some(right)) => ReferenceCounter::ptr_eq(left, right),
            (None, None) => true,
            _ => false,
        }
    }

    /// Returns the number of node levels, 0 for an empty map.
    ///
    /// # Complexity
    ///
    /// O(log N)
    #[must_use]
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut current = self.root.as_deref();
        while let Some(node) = current {
            height += 1;
            current = node.edges().and_then(<[_]>::first).map(|edge| &**edge);
        }
        height
    }

    /// Returns the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> =
    ///     [(3, "three"), (1, "one"), (2, "two")].into_iter().collect();
    /// assert_eq!(map.first_key_value(), Some((&1, &"one")));
    /// ```
    #[must_use]
    pub fn first_key_value(&self) -> Option<(&K, &V)> {
        self.root.as_deref().and_then(Node::first_entry)
    }

    /// Returns the entry with the largest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> =
    ///     [(3, "three"), (1, "one"), (2, "two")].into_iter().collect();
    /// assert_eq!(map.last_key_value(), Some((&3, &"three")));
    /// ```
    #[must_use]
    pub fn last_key_value(&self) -> Option<(&K, &V)> {
        self.root.as_deref().and_then(Node::last_entry)
    }

    /// Returns an iterator over key-value pairs in sorted key order.
    ///
    /// The iterator is lazy and double-ended: it walks the tree on demand
    /// and can be consumed from both ends.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> =
    ///     [(3, "three"), (1, "one"), (2, "two")].into_iter().collect();
    ///
    /// let entries: Vec<(&i32, &&str)> = map.iter().collect();
    /// assert_eq!(entries, vec![(&1, &"one"), (&2, &"two"), (&3, &"three")]);
    ///
    /// let mut iterator = map.iter();
    /// assert_eq!(iterator.next_back(), Some((&3, &"three")));
    /// assert_eq!(iterator.len(), 2);
    /// ```
    pub fn iter(&self) -> PersistentTreeMapIterator<'_, K, V> {
        let root = self.root.as_deref();
        PersistentTreeMapIterator {
            front: Ascending::new(root),
            back: Descending::new(root),
            remaining: self.length,
        }
    }

    /// Returns an iterator over key-value pairs in descending key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = (0..5).map(|key| (key, key)).collect();
    /// let keys: Vec<&i32> = map.iter_rev().map(|(key, _)| key).collect();
    /// assert_eq!(keys, vec![&4, &3, &2, &1, &0]);
    /// ```
    pub fn iter_rev(&self) -> std::iter::Rev<PersistentTreeMapIterator<'_, K, V>> {
        self.iter().rev()
    }

    /// Returns an iterator over keys in sorted order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
    /// let keys: Vec<&i32> = map.keys().collect();
    /// assert_eq!(keys, vec![&1, &2]);
    /// ```
    pub fn keys(&self) -> impl DoubleEndedIterator<Item = &K> + ExactSizeIterator {
        self.iter().map(|(key, _)| key)
    }

    /// Returns an iterator over values in key order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
    /// let values: Vec<&&str> = map.values().collect();
    /// assert_eq!(values, vec![&"one", &"two"]);
    /// ```
    pub fn values(&self) -> impl DoubleEndedIterator<Item = &V> + ExactSizeIterator {
        self.iter().map(|(_, value)| value)
    }

    /// Returns an iterator over all key-value pairs.
    ///
    /// Equivalent to [`iter`](Self::iter).
    pub fn entries(&self) -> PersistentTreeMapIterator<'_, K, V> {
        self.iter()
    }

    /// Folds the entries from the smallest key to the largest.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> =
    ///     [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();
    /// let joined = map.fold_left(String::new(), |accumulator, (_, value)| accumulator + value);
    /// assert_eq!(joined, "abc");
    /// ```
    pub fn fold_left<B, F>(&self, init: B, function: F) -> B
    where
        F: FnMut(B, (&K, &V)) -> B,
    {
        self.iter().fold(init, function)
    }

    /// Folds the entries from the largest key to the smallest.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> =
    ///     [(1, "a"), (2, "b"), (3, "c")].into_iter().collect();
    /// let joined = map.fold_right(String::new(), |(_, value), accumulator| accumulator + value);
    /// assert_eq!(joined, "cba");
    /// ```
    pub fn fold_right<B, F>(&self, init: B, mut function: F) -> B
    where
        F: FnMut((&K, &V), B) -> B,
    {
        self.iter_rev()
            .fold(init, |accumulator, entry| function(entry, accumulator))
    }
}

impl<K: Ord, V> PersistentTreeMap<K, V> {
    /// Returns a reference to the value corresponding to the key.
    ///
    /// The key may be any borrowed form of the map's key type, but the
    /// ordering on the borrowed form must match the ordering on the key type.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to look up
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::singleton("hello".to_string(), 42);
    ///
    /// // Can use &str to look up String keys
    /// assert_eq!(map.get("hello"), Some(&42));
    /// assert_eq!(map.get("world"), None);
    /// ```
    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get_key_value(key).map(|(_, value)| value)
    }

    /// Returns the stored key and its value for the given key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::singleton("key".to_string(), 1);
    /// assert_eq!(map.get_key_value("key"), Some((&"key".to_string(), &1)));
    /// ```
    #[must_use]
    pub fn get_key_value<Q>(&self, key: &Q) -> Option<(&K, &V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self::get_from_node(self.root.as_deref(), key)
    }

    /// Recursive helper for `get_key_value`.
    fn get_from_node<'a, Q>(node: Option<&'a Node<K, V>>, key: &Q) -> Option<(&'a K, &'a V)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let node = node?;
        match node.find_key_in(key) {
            Ok(index) => Some((&node.keys()[index], &node.values()[index])),
            Err(index) => Self::get_from_node(node.edges().map(|edges| &*edges[index]), key),
        }
    }

    /// Returns `true` if the map contains the given key.
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::singleton(1, "one");
    /// assert!(map.contains_key(&1));
    /// assert!(!map.contains_key(&2));
    /// ```
    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Returns an iterator over entries whose keys fall within the range.
    ///
    /// The cursor seeks the lower bound on the way down and stops at the
    /// last key inside the upper bound. An empty or inverted range yields
    /// nothing.
    ///
    /// # Arguments
    ///
    /// * `range` - The range of keys to include
    ///
    /// # Complexity
    ///
    /// O(log N + k) where k is the number of entries in the range
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = (1..=10).map(|key| (key, key * 10)).collect();
    ///
    /// let keys: Vec<i32> = map.range(3..7).map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![3, 4, 5, 6]);
    ///
    /// let keys: Vec<i32> = map.range(8..).map(|(key, _)| *key).collect();
    /// assert_eq!(keys, vec![8, 9, 10]);
    /// ```
    pub fn range<R, Q>(&self, range: R) -> PersistentTreeMapRangeIterator<'_, K, V>
    where
        R: RangeBounds<Q>,
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root.as_deref();
        PersistentTreeMapRangeIterator {
            front: Ascending::seek(root, range.start_bound()),
            last: last_within(root, range.end_bound()),
        }
    }

    /// Verifies the structural invariants of the underlying tree.
    ///
    /// Checks key order and separation, node fill, child counts, leaf depth
    /// and the recorded length. Every map produced through the public API
    /// passes.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, ()> = (0..1000).map(|key| (key, ())).collect();
    /// assert_eq!(map.check_invariants(), Ok(()));
    /// ```
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        invariant::check_tree(self.root.as_deref(), self.length)
    }
}

impl<K: Clone + Ord, V: Clone> PersistentTreeMap<K, V> {
    /// Creates a map containing a single key-value pair.
    ///
    /// # Arguments
    ///
    /// * `key` - The key
    /// * `value` - The value
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::singleton(42, "answer");
    /// assert_eq!(map.len(), 1);
    /// assert_eq!(map.get(&42), Some(&"answer"));
    /// ```
    #[inline]
    #[must_use]
    pub fn singleton(key: K, value: V) -> Self {
        Self::new().insert(key, value).1
    }

    /// Builds a map from entries already sorted by key.
    ///
    /// The tree is packed bottom-up in a single pass. Runs of equal keys
    /// keep their last entry.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the keys are not in non-decreasing order.
    /// Release builds skip the check and produce an unspecified map for
    /// unsorted input.
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map = PersistentTreeMap::from_sorted_iter([(1, "a"), (2, "b"), (2, "c")]);
    /// assert_eq!(map.len(), 2);
    /// assert_eq!(map.get(&2), Some(&"c"));
    /// ```
    #[must_use]
    pub fn from_sorted_iter<I>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let (root, length) = Node::build_from_sorted(entries);
        Self { root, length }
    }

    /// Inserts a key-value pair into the map.
    ///
    /// If the map already contains the key, the value is replaced and the
    /// old value is returned alongside the new map.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to insert
    /// * `value` - The value to associate with the key
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let (previous, map1) = PersistentTreeMap::new().insert(1, "one");
    /// assert_eq!(previous, None);
    ///
    /// let (previous, map2) = map1.insert(1, "ONE");
    /// assert_eq!(previous, Some("one"));
    /// assert_eq!(map1.get(&1), Some(&"one")); // Original unchanged
    /// assert_eq!(map2.get(&1), Some(&"ONE")); // New version
    /// ```
    #[must_use]
    pub fn insert(&self, key: K, value: V) -> (Option<V>, Self) {
        let (previous, root) = Node::insert_root(self.root.as_ref(), key, value);
        let length = if previous.is_some() {
            self.length
        } else {
            self.length + 1
        };
        (
            previous,
            Self {
                root: Some(root),
                length,
            },
        )
    }

    /// Removes a key from the map.
    ///
    /// Returns the removed value and the new map. If the key is absent,
    /// returns `None` and a map sharing the original root.
    ///
    /// # Arguments
    ///
    /// * `key` - The key to remove
    ///
    /// # Complexity
    ///
    /// O(log N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
    /// let (removed, smaller) = map.remove(&1);
    ///
    /// assert_eq!(removed, Some("one"));
    /// assert_eq!(map.len(), 2);     // Original unchanged
    /// assert_eq!(smaller.len(), 1); // New version
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, key: &Q) -> (Option<V>, Self)
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.remove_seek(Seek::Key(key))
            .map_or_else(|| (None, self.clone()), |((_, value), map)| (Some(value), map))
    }

    /// Removes the entry with the smallest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
    /// let (first, rest) = map.pop_first();
    /// assert_eq!(first, Some((1, "one")));
    /// assert_eq!(rest.len(), 1);
    /// ```
    #[must_use]
    pub fn pop_first(&self) -> (Option<(K, V)>, Self) {
        self.remove_seek(Seek::<K>::First)
            .map_or_else(|| (None, self.clone()), |(entry, map)| (Some(entry), map))
    }

    /// Removes the entry with the largest key.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
    /// let (last, rest) = map.pop_last();
    /// assert_eq!(last, Some((2, "two")));
    /// assert_eq!(rest.first_key_value(), Some((&1, &"one")));
    /// ```
    #[must_use]
    pub fn pop_last(&self) -> (Option<(K, V)>, Self) {
        self.remove_seek(Seek::<K>::Last)
            .map_or_else(|| (None, self.clone()), |(entry, map)| (Some(entry), map))
    }

    fn remove_seek<Q>(&self, seek: Seek<'_, Q>) -> Option<((K, V), Self)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let root = self.root.as_ref()?;
        let (entry, root) = Node::remove_root(root, seek)?;
        Some((
            entry,
            Self {
                root,
                length: self.length - 1,
            },
        ))
    }

    /// Transforms all values in the map using the given function.
    ///
    /// Keys are preserved and the result is built bottom-up in one pass.
    ///
    /// # Arguments
    ///
    /// * `transform` - A function to apply to each value
    ///
    /// # Complexity
    ///
    /// O(N)
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = [(1, 10), (2, 20)].into_iter().collect();
    /// let doubled = map.map_values(|value| value * 2);
    /// assert_eq!(doubled.get(&1), Some(&20));
    /// assert_eq!(doubled.get(&2), Some(&40));
    /// ```
    #[must_use]
    pub fn map_values<W, F>(&self, mut transform: F) -> PersistentTreeMap<K, W>
    where
        W: Clone,
        F: FnMut(&V) -> W,
    {
        PersistentTreeMap::from_sorted_iter(
            self.iter()
                .map(|(key, value)| (key.clone(), transform(value))),
        )
    }

    /// Transforms and filters entries in a single pass.
    ///
    /// Entries for which `filter_transform` returns `None` are dropped.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = (1..=4).map(|key| (key, key * 10)).collect();
    /// let even_halves = map.filter_map(|key, value| (key % 2 == 0).then(|| value / 2));
    /// let entries: Vec<(&i32, &i32)> = even_halves.iter().collect();
    /// assert_eq!(entries, vec![(&2, &10), (&4, &20)]);
    /// ```
    #[must_use]
    pub fn filter_map<W, F>(&self, mut filter_transform: F) -> PersistentTreeMap<K, W>
    where
        W: Clone,
        F: FnMut(&K, &V) -> Option<W>,
    {
        PersistentTreeMap::from_sorted_iter(self.iter().filter_map(|(key, value)| {
            filter_transform(key, value).map(|transformed| (key.clone(), transformed))
        }))
    }

    /// Keeps only the entries for which the predicate returns true.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = [(1, 10), (2, 20), (3, 30)].into_iter().collect();
    /// let large_values = map.keep_if(|_, value| *value >= 20);
    /// assert_eq!(large_values.len(), 2);
    /// assert!(!large_values.contains_key(&1));
    /// ```
    #[must_use]
    pub fn keep_if<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        Self::from_sorted_iter(
            self.iter()
                .filter(|(key, value)| predicate(key, value))
                .map(|(key, value)| (key.clone(), value.clone())),
        )
    }

    /// Removes the entries for which the predicate returns true.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = [(1, 10), (2, 20), (3, 30)].into_iter().collect();
    /// let small_values = map.delete_if(|_, value| *value >= 20);
    /// assert_eq!(small_values.len(), 1);
    /// assert_eq!(small_values.get(&1), Some(&10));
    /// ```
    #[must_use]
    pub fn delete_if<F>(&self, mut predicate: F) -> Self
    where
        F: FnMut(&K, &V) -> bool,
    {
        self.keep_if(|key, value| !predicate(key, value))
    }

    /// Splits the map into the entries that satisfy the predicate and the
    /// entries that do not.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map: PersistentTreeMap<i32, i32> = (1..=6).map(|key| (key, key)).collect();
    /// let (even, odd) = map.partition(|key, _| key % 2 == 0);
    /// assert_eq!(even.keys().copied().collect::<Vec<_>>(), vec![2, 4, 6]);
    /// assert_eq!(odd.keys().copied().collect::<Vec<_>>(), vec![1, 3, 5]);
    /// ```
    #[must_use]
    pub fn partition<F>(&self, mut predicate: F) -> (Self, Self)
    where
        F: FnMut(&K, &V) -> bool,
    {
        let (matching, rest): (Vec<_>, Vec<_>) = self
            .iter()
            .map(|(key, value)| (key.clone(), value.clone()))
            .partition(|(key, value)| predicate(key, value));
        (
            Self::from_sorted_iter(matching),
            Self::from_sorted_iter(rest),
        )
    }

    /// Merges two maps, preferring the values of `other` on conflicts.
    ///
    /// # Complexity
    ///
    /// O(n + m) where n is the size of self and m is the size of other
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map1: PersistentTreeMap<i32, &str> = [(1, "one"), (2, "two")].into_iter().collect();
    /// let map2: PersistentTreeMap<i32, &str> = [(2, "TWO"), (3, "three")].into_iter().collect();
    /// let merged = map1.merge(&map2);
    /// assert_eq!(merged.get(&1), Some(&"one"));
    /// assert_eq!(merged.get(&2), Some(&"TWO")); // From map2
    /// assert_eq!(merged.get(&3), Some(&"three"));
    /// ```
    #[must_use]
    pub fn merge(&self, other: &Self) -> Self {
        self.merge_with(other, |_, _, other_value| other_value.clone())
    }

    /// Merges two maps with a custom conflict resolver.
    ///
    /// When a key exists in both maps, the resolver function is called
    /// with the key and both values to determine the final value.
    ///
    /// # Arguments
    ///
    /// * `other` - The map to merge with
    /// * `resolver` - A function that receives (key, `self_value`, `other_value`) and
    ///   returns the value to use in the merged map
    ///
    /// # Complexity
    ///
    /// O(n + m) where n is the size of self and m is the size of other
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeMap;
    ///
    /// let map1: PersistentTreeMap<i32, i32> = [(1, 100), (2, 200)].into_iter().collect();
    /// let map2: PersistentTreeMap<i32, i32> = [(2, 50), (3, 300)].into_iter().collect();
    /// let merged = map1.merge_with(&map2, |_, v1, v2| *v1.max(v2));
    /// assert_eq!(merged.get(&1), Some(&100));
    /// assert_eq!(merged.get(&2), Some(&200)); // max(200, 50)
    /// assert_eq!(merged.get(&3), Some(&300));
    /// ```
    #[must_use]
    pub fn merge_with<F>(&self, other: &Self, resolver: F) -> Self
    where
        F: FnMut(&K, &V, &V) -> V,
    {
        Self::from_sorted_iter(MergeEntries {
            left: self.iter().peekable(),
            right: other.iter().peekable(),
            resolver,
        })
    }
}

/// Merge-walk over two sorted entry streams, resolving equal keys.
struct MergeEntries<'a, K, V, F> {
    left: Peekable<PersistentTreeMapIterator<'a, K, V>>,
    right: Peekable<PersistentTreeMapIterator<'a, K, V>>,
    resolver: F,
}

impl<K, V, F> Iterator for MergeEntries<'_, K, V, F>
where
    K: Clone + Ord,
    V: Clone,
    F: FnMut(&K, &V, &V) -> V,
{
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        let order = match (self.left.peek(), self.right.peek()) {
            (Some((left_key, _)), Some((right_key, _))) => left_key.cmp(right_key),
            (Some(_), None) => Ordering::Less,
            (None, Some(_)) => Ordering::Greater,
            (None, None) => return None,
        };
        match order {
            Ordering::Less => self
                .left
                .next()
                .map(|(key, value)| (key.clone(), value.clone())),
            Ordering::Greater => self
                .right
                .next()
                .map(|(key, value)| (key.clone(), value.clone())),
            Ordering::Equal => {
                let (key, left_value) = self.left.next()?;
                let (_, right_value) = self.right.next()?;
                Some((key.clone(), (self.resolver)(key, left_value, right_value)))
            }
        }
    }
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// An iterator over entries of a [`PersistentTreeMap`] in key order.
///
/// Created by [`PersistentTreeMap::iter`].
pub struct PersistentTreeMapIterator<'a, K, V> {
    front: Ascending<&'a Node<K, V>>,
    back: Descending<&'a Node<K, V>>,
    remaining: usize,
}

impl<K, V> Clone for PersistentTreeMapIterator<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            back: self.back.clone(),
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for PersistentTreeMapIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (node, index) = self.front.next()?;
        self.remaining -= 1;
        Some((&node.keys()[index], &node.values()[index]))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> DoubleEndedIterator for PersistentTreeMapIterator<'_, K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (node, index) = self.back.next()?;
        self.remaining -= 1;
        Some((&node.keys()[index], &node.values()[index]))
    }
}

impl<K, V> ExactSizeIterator for PersistentTreeMapIterator<'_, K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K, V> FusedIterator for PersistentTreeMapIterator<'_, K, V> {}

/// An iterator over the entries of a [`PersistentTreeMap`] within a range.
///
/// Created by [`PersistentTreeMap::range`].
pub struct PersistentTreeMapRangeIterator<'a, K, V> {
    front: Ascending<&'a Node<K, V>>,
    /// Largest key inside the range; `None` once exhausted
    last: Option<&'a K>,
}

impl<K, V> Clone for PersistentTreeMapRangeIterator<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            front: self.front.clone(),
            last: self.last,
        }
    }
}

impl<'a, K: Ord, V> Iterator for PersistentTreeMapRangeIterator<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        let last = self.last?;
        let (node, index) = self.front.next()?;
        let key = &node.keys()[index];
        match key.cmp(last) {
            Ordering::Less => {}
            Ordering::Equal => self.last = None,
            Ordering::Greater => {
                self.last = None;
                return None;
            }
        }
        Some((key, &node.values()[index]))
    }
}

impl<K: Ord, V> FusedIterator for PersistentTreeMapRangeIterator<'_, K, V> {}

/// An owning iterator over entries of a [`PersistentTreeMap`].
///
/// Holds shared handles to the tree nodes and clones entries as it goes.
pub struct PersistentTreeMapIntoIterator<K, V> {
    front: Ascending<NodeRef<K, V>>,
    back: Descending<NodeRef<K, V>>,
    remaining: usize,
}

impl<K: Clone, V: Clone> Iterator for PersistentTreeMapIntoIterator<K, V> {
    type Item = (K, V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (node, index) = self.front.next()?;
        self.remaining -= 1;
        Some((node.keys()[index].clone(), node.values()[index].clone()))
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K: Clone, V: Clone> DoubleEndedIterator for PersistentTreeMapIntoIterator<K, V> {
    fn next_back(&mut self) -> Option<Self::Item> {
        if self.remaining == 0 {
            return None;
        }
        let (node, index) = self.back.next()?;
        self.remaining -= 1;
        Some((node.keys()[index].clone(), node.values()[index].clone()))
    }
}

impl<K: Clone, V: Clone> ExactSizeIterator for PersistentTreeMapIntoIterator<K, V> {
    fn len(&self) -> usize {
        self.remaining
    }
}

impl<K: Clone, V: Clone> FusedIterator for PersistentTreeMapIntoIterator<K, V> {}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<K, V> Default for PersistentTreeMap<K, V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

/// Collects entries in any order.
///
/// Entries are stably sorted by key and bulk loaded, so for duplicate keys
/// the last occurrence wins.
impl<K: Clone + Ord, V: Clone> FromIterator<(K, V)> for PersistentTreeMap<K, V> {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut entries: Vec<(K, V)> = iter.into_iter().collect();
        entries.sort_by(|(left, _), (right, _)| left.cmp(right));
        Self::from_sorted_iter(entries)
    }
}

impl<K: Clone, V: Clone> IntoIterator for PersistentTreeMap<K, V> {
    type Item = (K, V);
    type IntoIter = PersistentTreeMapIntoIterator<K, V>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentTreeMapIntoIterator {
            front: Ascending::new(self.root.clone()),
            back: Descending::new(self.root),
            remaining: self.length,
        }
    }
}

impl<'a, K, V> IntoIterator for &'a PersistentTreeMap<K, V> {
    type Item = (&'a K, &'a V);
    type IntoIter = PersistentTreeMapIterator<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<K: PartialEq, V: PartialEq> PartialEq for PersistentTreeMap<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.length == other.length && (self.ptr_eq(other) || self.iter().eq(other.iter()))
    }
}

impl<K: Eq, V: Eq> Eq for PersistentTreeMap<K, V> {}

/// Computes a hash value for this tree map.
///
/// The hash is computed by first hashing the length, then hashing each
/// (key, value) pair in key order, so equal maps produce equal hash values
/// regardless of how they were built.
///
/// # Examples
///
/// ```rust
/// use persistent_btree::persistent::PersistentTreeMap;
/// use std::collections::HashMap;
///
/// let mut outer: HashMap<PersistentTreeMap<i32, String>, &str> = HashMap::new();
/// let key: PersistentTreeMap<i32, String> =
///     [(1, "one".to_string()), (2, "two".to_string())].into_iter().collect();
/// outer.insert(key.clone(), "value");
/// assert_eq!(outer.get(&key), Some(&"value"));
/// ```
impl<K: Hash, V: Hash> Hash for PersistentTreeMap<K, V> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.length.hash(state);
        for (key, value) in self {
            key.hash(state);
            value.hash(state);
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentTreeMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_map().entries(self.iter()).finish()
    }
}

impl<K: fmt::Display, V: fmt::Display> fmt::Display for PersistentTreeMap<K, V> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        let mut first = true;
        for (key, value) in self {
            if first {
                first = false;
            } else {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{key}: {value}")?;
        }
        write!(formatter, "}}")
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentTreeMap<i32, String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================


// =============================================================================
// Send + Sync Tests (arc feature only)
// =============================================================================


// =============================================================================
// Multithread Tests (arc feature only)
// =============================================================================
