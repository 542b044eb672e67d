//! Persistent (immutable) ordered set based on a B-tree.
//!
//! [`PersistentTreeSet`] is a [`PersistentTreeMap`] whose values are `()`,
//! so every tree algorithm is shared with the map. On top of that it offers
//! lazy set-algebra iterators ([`union`](PersistentTreeSet::union),
//! [`intersection`](PersistentTreeSet::intersection),
//! [`difference`](PersistentTreeSet::difference),
//! [`symmetric_difference`](PersistentTreeSet::symmetric_difference)) and
//! the relational checks built on them.
//!
//! # Examples
//!
//! ```rust
//! use persistent_btree::persistent::PersistentTreeSet;
//!
//! let set1: PersistentTreeSet<i32> = [1, 2, 3].into_iter().collect();
//! let set2: PersistentTreeSet<i32> = [2, 3, 4].into_iter().collect();
//!
//! let union: Vec<&i32> = set1.union(&set2).collect();
//! assert_eq!(union, vec![&1, &2, &3, &4]);
//!
//! // Operators build new sets
//! let common = &set1 & &set2;
//! assert_eq!(common.len(), 2);
//! assert!(common.is_subset(&set1));
//! ```

use std::borrow::Borrow;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::iter::{FusedIterator, Peekable};
use std::ops::{BitAnd, BitOr, BitXor, RangeBounds, Sub};

use super::invariant::InvariantViolation;
use super::treemap::{
    PersistentTreeMap, PersistentTreeMapIntoIterator, PersistentTreeMapIterator,
    PersistentTreeMapRangeIterator,
};

/// Size ratio beyond which probing the larger set for each element of the
/// smaller one beats walking both sets side by side.
const ITER_PERFORMANCE_TIPPING_SIZE_DIFF: usize = 16;

// =============================================================================
// PersistentTreeSet Definition
// =============================================================================

/// A persistent (immutable) ordered set based on a B-tree.
///
/// Elements must implement `Ord`. Iteration always yields elements in
/// ascending order, and every update returns a new set that shares the
/// untouched parts of the tree with the original.
///
/// # Time Complexity
///
/// | Operation            | Complexity     |
/// |----------------------|----------------|
/// | `contains`           | O(log N)       |
/// | `insert`             | O(log N)       |
/// | `remove`             | O(log N)       |
/// | `first`/`last`       | O(log N)       |
/// | `union` et al.       | O(N + M)       |
/// | `len`                | O(1)           |
///
/// # Examples
///
/// ```rust
/// use persistent_btree::persistent::PersistentTreeSet;
///
/// let set = PersistentTreeSet::new().insert(3).insert(1).insert(2);
/// assert!(set.contains(&2));
///
/// let updated = set.insert(4);
/// assert_eq!(set.len(), 3);      // Original unchanged
/// assert_eq!(updated.len(), 4);  // New version
/// ```
pub struct PersistentTreeSet<T> {
    map: PersistentTreeMap<T, ()>,
}

impl<T> Clone for PersistentTreeSet<T> {
    #[inline]
    fn clone(&self) -> Self {
        Self {
            map: self.map.clone(),
        }
    }
}

impl<T> PersistentTreeSet<T> {
    /// Creates a new empty set.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = PersistentTreeSet::new();
    /// assert!(set.is_empty());
    /// ```
    #[inline]
    #[must_use]
    pub const fn new() -> Self {
        Self {
            map: PersistentTreeMap::new(),
        }
    }

    /// Returns the number of elements in the set.
    #[inline]
    #[must_use]
    pub const fn len(&self) -> usize {
        self.map.len()
    }

    /// Returns `true` if the set contains no elements.
    #[inline]
    #[must_use]
    pub const fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    /// Returns `true` if both sets share the same root node.
    #[must_use]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        self.map.ptr_eq(&other.map)
    }

    /// Returns the smallest element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = [3, 1, 2].into_iter().collect();
    /// assert_eq!(set.first(), Some(&1));
    /// ```
    #[must_use]
    pub fn first(&self) -> Option<&T> {
        self.map.first_key_value().map(|(element, ())| element)
    }

    /// Returns the largest element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = [3, 1, 2].into_iter().collect();
    /// assert_eq!(set.last(), Some(&3));
    /// ```
    #[must_use]
    pub fn last(&self) -> Option<&T> {
        self.map.last_key_value().map(|(element, ())| element)
    }

    /// Returns an iterator over the elements in ascending order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = [3, 1, 2].into_iter().collect();
    /// let elements: Vec<&i32> = set.iter().collect();
    /// assert_eq!(elements, vec![&1, &2, &3]);
    /// ```
    pub fn iter(&self) -> PersistentTreeSetIterator<'_, T> {
        PersistentTreeSetIterator {
            inner: self.map.iter(),
        }
    }

    /// Returns an iterator over the elements in descending order.
    pub fn iter_rev(&self) -> std::iter::Rev<PersistentTreeSetIterator<'_, T>> {
        self.iter().rev()
    }
}

impl<T: Ord> PersistentTreeSet<T> {
    /// Returns `true` if the set contains the element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<String> = ["apple".to_string()].into_iter().collect();
    /// assert!(set.contains("apple"));
    /// assert!(!set.contains("banana"));
    /// ```
    #[must_use]
    pub fn contains<Q>(&self, element: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        self.map.contains_key(element)
    }

    /// Returns an iterator over the elements within the range.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = (0..20).collect();
    /// let elements: Vec<i32> = set.range(5..=8).copied().collect();
    /// assert_eq!(elements, vec![5, 6, 7, 8]);
    /// ```
    pub fn range<R, Q>(&self, range: R) -> PersistentTreeSetRangeIterator<'_, T>
    where
        R: RangeBounds<Q>,
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        PersistentTreeSetRangeIterator {
            inner: self.map.range(range),
        }
    }

    /// Verifies the structural invariants of the underlying tree.
    ///
    /// # Errors
    ///
    /// Returns the first [`InvariantViolation`] found.
    pub fn check_invariants(&self) -> Result<(), InvariantViolation> {
        self.map.check_invariants()
    }

    /// Visits the elements in `self` or `other`, ascending and without
    /// duplicates.
    ///
    /// When both sets hold an equal element, the one from `other` is
    /// yielded.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let left: PersistentTreeSet<i32> = [1, 3].into_iter().collect();
    /// let right: PersistentTreeSet<i32> = [2, 3].into_iter().collect();
    /// let union: Vec<&i32> = left.union(&right).collect();
    /// assert_eq!(union, vec![&1, &2, &3]);
    /// ```
    pub fn union<'a>(&'a self, other: &'a Self) -> Union<'a, T> {
        Union {
            left: self.iter().peekable(),
            right: other.iter().peekable(),
        }
    }

    /// Visits the elements in both `self` and `other`, ascending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let left: PersistentTreeSet<i32> = [1, 2, 3].into_iter().collect();
    /// let right: PersistentTreeSet<i32> = [2, 3, 4].into_iter().collect();
    /// let common: Vec<&i32> = left.intersection(&right).collect();
    /// assert_eq!(common, vec![&2, &3]);
    /// ```
    pub fn intersection<'a>(&'a self, other: &'a Self) -> Intersection<'a, T> {
        let (small, large) = if self.len() <= other.len() {
            (self, other)
        } else {
            (other, self)
        };
        let (Some(small_min), Some(small_max), Some(large_min), Some(large_max)) =
            (small.first(), small.last(), large.first(), large.last())
        else {
            return Intersection {
                inner: IntersectionInner::Answer(None),
            };
        };

        let inner = match (small_min.cmp(large_max), small_max.cmp(large_min)) {
            (Ordering::Greater, _) | (_, Ordering::Less) => IntersectionInner::Answer(None),
            (Ordering::Equal, _) => IntersectionInner::Answer(Some(small_min)),
            (_, Ordering::Equal) => IntersectionInner::Answer(Some(small_max)),
            _ if small.len() <= large.len() / ITER_PERFORMANCE_TIPPING_SIZE_DIFF => {
                IntersectionInner::Probe {
                    small_iter: small.iter(),
                    large_set: large,
                }
            }
            _ => IntersectionInner::Merge {
                small_iter: small.iter(),
                large_iter: large.iter(),
            },
        };
        Intersection { inner }
    }

    /// Visits the elements in `self` but not in `other`, ascending.
    ///
    /// Disjoint key ranges are detected up front, as is an overlap of a
    /// single element at either end.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let left: PersistentTreeSet<i32> = [1, 2, 3].into_iter().collect();
    /// let right: PersistentTreeSet<i32> = [2, 3, 4].into_iter().collect();
    /// let only_left: Vec<&i32> = left.difference(&right).collect();
    /// assert_eq!(only_left, vec![&1]);
    /// ```
    pub fn difference<'a>(&'a self, other: &'a Self) -> Difference<'a, T> {
        let mut self_iter = self.iter();
        let (Some(self_min), Some(self_max), Some(other_min), Some(other_max)) =
            (self.first(), self.last(), other.first(), other.last())
        else {
            return Difference {
                inner: DifferenceInner::Iterate(self_iter),
            };
        };

        let inner = match (self_min.cmp(other_max), self_max.cmp(other_min)) {
            (Ordering::Greater, _) | (_, Ordering::Less) => DifferenceInner::Iterate(self_iter),
            (Ordering::Equal, _) => {
                self_iter.next();
                DifferenceInner::Iterate(self_iter)
            }
            (_, Ordering::Equal) => {
                self_iter.next_back();
                DifferenceInner::Iterate(self_iter)
            }
            _ if self.len() <= other.len() / ITER_PERFORMANCE_TIPPING_SIZE_DIFF => {
                DifferenceInner::Probe {
                    self_iter,
                    other_set: other,
                }
            }
            _ => DifferenceInner::Merge {
                self_iter,
                other_iter: other.iter().peekable(),
            },
        };
        Difference { inner }
    }

    /// Visits the elements in exactly one of `self` and `other`, ascending.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let left: PersistentTreeSet<i32> = [1, 2, 3].into_iter().collect();
    /// let right: PersistentTreeSet<i32> = [2, 3, 4].into_iter().collect();
    /// let either: Vec<&i32> = left.symmetric_difference(&right).collect();
    /// assert_eq!(either, vec![&1, &4]);
    /// ```
    pub fn symmetric_difference<'a>(&'a self, other: &'a Self) -> SymmetricDifference<'a, T> {
        SymmetricDifference {
            left: self.iter().peekable(),
            right: other.iter().peekable(),
        }
    }

    /// Returns `true` if the sets have no element in common.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let low: PersistentTreeSet<i32> = (0..10).collect();
    /// let high: PersistentTreeSet<i32> = (10..20).collect();
    /// assert!(low.is_disjoint(&high));
    /// assert!(!low.is_disjoint(&(5..15).collect()));
    /// ```
    #[must_use]
    pub fn is_disjoint(&self, other: &Self) -> bool {
        self.intersection(other).next().is_none()
    }

    /// Returns `true` if every element of `self` is in `other`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let small: PersistentTreeSet<i32> = [2, 4].into_iter().collect();
    /// let large: PersistentTreeSet<i32> = (0..10).collect();
    /// assert!(small.is_subset(&large));
    /// assert!(!large.is_subset(&small));
    /// ```
    #[must_use]
    pub fn is_subset(&self, other: &Self) -> bool {
        if self.len() > other.len() {
            return false;
        }
        let (Some(self_min), Some(self_max)) = (self.first(), self.last()) else {
            return true;
        };
        let (Some(other_min), Some(other_max)) = (other.first(), other.last()) else {
            return false;
        };
        if self_min < other_min || self_max > other_max {
            return false;
        }

        if self.len() <= other.len() / ITER_PERFORMANCE_TIPPING_SIZE_DIFF {
            self.iter().all(|element| other.contains(element))
        } else {
            let mut other_iter = other.iter();
            self.iter().all(|element| {
                other_iter
                    .by_ref()
                    .find(|candidate| *candidate >= element)
                    .is_some_and(|candidate| candidate == element)
            })
        }
    }

    /// Returns `true` if every element of `other` is in `self`.
    #[must_use]
    pub fn is_superset(&self, other: &Self) -> bool {
        other.is_subset(self)
    }
}

impl<T: Clone + Ord> PersistentTreeSet<T> {
    /// Creates a set containing a single element.
    #[inline]
    #[must_use]
    pub fn singleton(element: T) -> Self {
        Self {
            map: PersistentTreeMap::singleton(element, ()),
        }
    }

    /// Builds a set from elements in non-decreasing order.
    ///
    /// Adjacent duplicates collapse into one element.
    ///
    /// # Panics
    ///
    /// In debug builds, panics if the elements are out of order.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set = PersistentTreeSet::from_sorted_iter([1, 1, 2, 3, 3]);
    /// assert_eq!(set.len(), 3);
    /// ```
    #[must_use]
    pub fn from_sorted_iter<I>(elements: I) -> Self
    where
        I: IntoIterator<Item = T>,
    {
        Self {
            map: PersistentTreeMap::from_sorted_iter(
                elements.into_iter().map(|element| (element, ())),
            ),
        }
    }

    /// Returns a new set with the element added.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set = PersistentTreeSet::new().insert(1);
    /// let same = set.insert(1);
    /// assert_eq!(same.len(), 1);
    /// ```
    #[must_use]
    pub fn insert(&self, element: T) -> Self {
        Self {
            map: self.map.insert(element, ()).1,
        }
    }

    /// Returns a new set without the element.
    ///
    /// Removing an absent element returns a set sharing the original root.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = [1, 2].into_iter().collect();
    /// let smaller = set.remove(&1);
    /// assert!(!smaller.contains(&1));
    /// assert!(set.contains(&1));
    /// ```
    #[must_use]
    pub fn remove<Q>(&self, element: &Q) -> Self
    where
        T: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        Self {
            map: self.map.remove(element).1,
        }
    }

    /// Removes the smallest element.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use persistent_btree::persistent::PersistentTreeSet;
    ///
    /// let set: PersistentTreeSet<i32> = [2, 1].into_iter().collect();
    /// let (first, rest) = set.pop_first();
    /// assert_eq!(first, Some(1));
    /// assert_eq!(rest.len(), 1);
    /// ```
    #[must_use]
    pub fn pop_first(&self) -> (Option<T>, Self) {
        let (entry, map) = self.map.pop_first();
        (entry.map(|(element, ())| element), Self { map })
    }

    /// Removes the largest element.
    #[must_use]
    pub fn pop_last(&self) -> (Option<T>, Self) {
        let (entry, map) = self.map.pop_last();
        (entry.map(|(element, ())| element), Self { map })
    }
}

// =============================================================================
// Iterator Implementations
// =============================================================================

/// An iterator over the elements of a [`PersistentTreeSet`] in order.
pub struct PersistentTreeSetIterator<'a, T> {
    inner: PersistentTreeMapIterator<'a, T, ()>,
}

impl<T> Clone for PersistentTreeSetIterator<'_, T> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
        }
    }
}

impl<'a, T> Iterator for PersistentTreeSetIterator<'a, T> {
    type Item = &'a T;

    #[inline]
    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T> DoubleEndedIterator for PersistentTreeSetIterator<'_, T> {
    #[inline]
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(element, ())| element)
    }
}

impl<T> ExactSizeIterator for PersistentTreeSetIterator<'_, T> {}

impl<T> FusedIterator for PersistentTreeSetIterator<'_, T> {}

/// An iterator over the elements of a [`PersistentTreeSet`] within a range.
pub struct PersistentTreeSetRangeIterator<'a, T> {
    inner: PersistentTreeMapRangeIterator<'a, T, ()>,
}

impl<'a, T: Ord> Iterator for PersistentTreeSetRangeIterator<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }
}

impl<T: Ord> FusedIterator for PersistentTreeSetRangeIterator<'_, T> {}

/// An owning iterator over the elements of a [`PersistentTreeSet`].
pub struct PersistentTreeSetIntoIterator<T> {
    inner: PersistentTreeMapIntoIterator<T, ()>,
}

impl<T: Clone> Iterator for PersistentTreeSetIntoIterator<T> {
    type Item = T;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(element, ())| element)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: Clone> DoubleEndedIterator for PersistentTreeSetIntoIterator<T> {
    fn next_back(&mut self) -> Option<Self::Item> {
        self.inner.next_back().map(|(element, ())| element)
    }
}

impl<T: Clone> ExactSizeIterator for PersistentTreeSetIntoIterator<T> {}

impl<T: Clone> FusedIterator for PersistentTreeSetIntoIterator<T> {}

// =============================================================================
// Set Algebra Iterators
// =============================================================================

/// Orders the heads of two sorted streams; an exhausted stream sorts last.
fn order_heads<T: Ord>(left: Option<&&T>, right: Option<&&T>) -> Ordering {
    match (left, right) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(left), Some(right)) => left.cmp(right),
    }
}

/// A lazy iterator over the union of two sets.
///
/// Created by [`PersistentTreeSet::union`].
pub struct Union<'a, T> {
    left: Peekable<PersistentTreeSetIterator<'a, T>>,
    right: Peekable<PersistentTreeSetIterator<'a, T>>,
}

impl<T> Clone for Union<'_, T> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl<'a, T: Ord> Iterator for Union<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        match order_heads(self.left.peek(), self.right.peek()) {
            Ordering::Less => self.left.next(),
            Ordering::Greater => self.right.next(),
            Ordering::Equal => {
                self.left.next();
                self.right.next()
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (left_len, right_len) = (self.left.len(), self.right.len());
        (left_len.max(right_len), Some(left_len + right_len))
    }
}

impl<T: Ord> FusedIterator for Union<'_, T> {}

/// A lazy iterator over the intersection of two sets.
///
/// Created by [`PersistentTreeSet::intersection`].
pub struct Intersection<'a, T> {
    inner: IntersectionInner<'a, T>,
}

enum IntersectionInner<'a, T> {
    /// Walks both sets side by side.
    Merge {
        small_iter: PersistentTreeSetIterator<'a, T>,
        large_iter: PersistentTreeSetIterator<'a, T>,
    },
    /// Looks up each element of the much smaller set in the larger one.
    Probe {
        small_iter: PersistentTreeSetIterator<'a, T>,
        large_set: &'a PersistentTreeSet<T>,
    },
    /// The result was settled from the key ranges alone.
    Answer(Option<&'a T>),
}

impl<T> Clone for Intersection<'_, T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            IntersectionInner::Merge {
                small_iter,
                large_iter,
            } => IntersectionInner::Merge {
                small_iter: small_iter.clone(),
                large_iter: large_iter.clone(),
            },
            IntersectionInner::Probe {
                small_iter,
                large_set,
            } => IntersectionInner::Probe {
                small_iter: small_iter.clone(),
                large_set: *large_set,
            },
            IntersectionInner::Answer(answer) => IntersectionInner::Answer(*answer),
        };
        Self { inner }
    }
}

impl<'a, T: Ord> Iterator for Intersection<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            IntersectionInner::Merge {
                small_iter,
                large_iter,
            } => {
                let mut small_next = small_iter.next()?;
                let mut large_next = large_iter.next()?;
                loop {
                    match small_next.cmp(large_next) {
                        Ordering::Less => small_next = small_iter.next()?,
                        Ordering::Greater => large_next = large_iter.next()?,
                        Ordering::Equal => return Some(small_next),
                    }
                }
            }
            IntersectionInner::Probe {
                small_iter,
                large_set,
            } => small_iter.find(|element| large_set.contains(*element)),
            IntersectionInner::Answer(answer) => answer.take(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.inner {
            IntersectionInner::Merge { small_iter, .. }
            | IntersectionInner::Probe { small_iter, .. } => (0, Some(small_iter.len())),
            IntersectionInner::Answer(answer) => {
                let len = usize::from(answer.is_some());
                (len, Some(len))
            }
        }
    }
}

impl<T: Ord> FusedIterator for Intersection<'_, T> {}

/// A lazy iterator over the difference of two sets.
///
/// Created by [`PersistentTreeSet::difference`].
pub struct Difference<'a, T> {
    inner: DifferenceInner<'a, T>,
}

enum DifferenceInner<'a, T> {
    /// Walks both sets side by side.
    Merge {
        self_iter: PersistentTreeSetIterator<'a, T>,
        other_iter: Peekable<PersistentTreeSetIterator<'a, T>>,
    },
    /// Looks up each element of the much smaller set in the other one.
    Probe {
        self_iter: PersistentTreeSetIterator<'a, T>,
        other_set: &'a PersistentTreeSet<T>,
    },
    /// Every remaining element belongs to the result.
    Iterate(PersistentTreeSetIterator<'a, T>),
}

impl<T> Clone for Difference<'_, T> {
    fn clone(&self) -> Self {
        let inner = match &self.inner {
            DifferenceInner::Merge {
                self_iter,
                other_iter,
            } => DifferenceInner::Merge {
                self_iter: self_iter.clone(),
                other_iter: other_iter.clone(),
            },
            DifferenceInner::Probe {
                self_iter,
                other_set,
            } => DifferenceInner::Probe {
                self_iter: self_iter.clone(),
                other_set: *other_set,
            },
            DifferenceInner::Iterate(iter) => DifferenceInner::Iterate(iter.clone()),
        };
        Self { inner }
    }
}

impl<'a, T: Ord> Iterator for Difference<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        match &mut self.inner {
            DifferenceInner::Merge {
                self_iter,
                other_iter,
            } => {
                let mut self_next = self_iter.next()?;
                loop {
                    let order = other_iter
                        .peek()
                        .map_or(Ordering::Less, |other_next| self_next.cmp(other_next));
                    match order {
                        Ordering::Less => return Some(self_next),
                        Ordering::Equal => {
                            self_next = self_iter.next()?;
                            other_iter.next();
                        }
                        Ordering::Greater => {
                            other_iter.next();
                        }
                    }
                }
            }
            DifferenceInner::Probe {
                self_iter,
                other_set,
            } => self_iter.find(|element| !other_set.contains(*element)),
            DifferenceInner::Iterate(iter) => iter.next(),
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let (self_len, other_len) = match &self.inner {
            DifferenceInner::Merge {
                self_iter,
                other_iter,
            } => (self_iter.len(), other_iter.len()),
            DifferenceInner::Probe {
                self_iter,
                other_set,
            } => (self_iter.len(), other_set.len()),
            DifferenceInner::Iterate(iter) => (iter.len(), 0),
        };
        (self_len.saturating_sub(other_len), Some(self_len))
    }
}

impl<T: Ord> FusedIterator for Difference<'_, T> {}

/// A lazy iterator over the symmetric difference of two sets.
///
/// Created by [`PersistentTreeSet::symmetric_difference`].
pub struct SymmetricDifference<'a, T> {
    left: Peekable<PersistentTreeSetIterator<'a, T>>,
    right: Peekable<PersistentTreeSetIterator<'a, T>>,
}

impl<T> Clone for SymmetricDifference<'_, T> {
    fn clone(&self) -> Self {
        Self {
            left: self.left.clone(),
            right: self.right.clone(),
        }
    }
}

impl<'a, T: Ord> Iterator for SymmetricDifference<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match order_heads(self.left.peek(), self.right.peek()) {
                Ordering::Less => return self.left.next(),
                Ordering::Greater => return self.right.next(),
                Ordering::Equal => {
                    self.left.next()?;
                    self.right.next();
                }
            }
        }
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (0, Some(self.left.len() + self.right.len()))
    }
}

impl<T: Ord> FusedIterator for SymmetricDifference<'_, T> {}

// =============================================================================
// Operator Implementations
// =============================================================================

impl<T: Clone + Ord> BitOr<&PersistentTreeSet<T>> for &PersistentTreeSet<T> {
    type Output = PersistentTreeSet<T>;

    /// Returns the union of two sets as a new set.
    fn bitor(self, rhs: &PersistentTreeSet<T>) -> Self::Output {
        PersistentTreeSet::from_sorted_iter(self.union(rhs).cloned())
    }
}

impl<T: Clone + Ord> BitAnd<&PersistentTreeSet<T>> for &PersistentTreeSet<T> {
    type Output = PersistentTreeSet<T>;

    /// Returns the intersection of two sets as a new set.
    fn bitand(self, rhs: &PersistentTreeSet<T>) -> Self::Output {
        PersistentTreeSet::from_sorted_iter(self.intersection(rhs).cloned())
    }
}

impl<T: Clone + Ord> Sub<&PersistentTreeSet<T>> for &PersistentTreeSet<T> {
    type Output = PersistentTreeSet<T>;

    /// Returns the difference of two sets as a new set.
    fn sub(self, rhs: &PersistentTreeSet<T>) -> Self::Output {
        PersistentTreeSet::from_sorted_iter(self.difference(rhs).cloned())
    }
}

impl<T: Clone + Ord> BitXor<&PersistentTreeSet<T>> for &PersistentTreeSet<T> {
    type Output = PersistentTreeSet<T>;

    /// Returns the symmetric difference of two sets as a new set.
    fn bitxor(self, rhs: &PersistentTreeSet<T>) -> Self::Output {
        PersistentTreeSet::from_sorted_iter(self.symmetric_difference(rhs).cloned())
    }
}

// =============================================================================
// Standard Trait Implementations
// =============================================================================

impl<T> Default for PersistentTreeSet<T> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Clone + Ord> FromIterator<T> for PersistentTreeSet<T> {
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            map: iter.into_iter().map(|element| (element, ())).collect(),
        }
    }
}

impl<T: Clone> IntoIterator for PersistentTreeSet<T> {
    type Item = T;
    type IntoIter = PersistentTreeSetIntoIterator<T>;

    fn into_iter(self) -> Self::IntoIter {
        PersistentTreeSetIntoIterator {
            inner: self.map.into_iter(),
        }
    }
}

impl<'a, T> IntoIterator for &'a PersistentTreeSet<T> {
    type Item = &'a T;
    type IntoIter = PersistentTreeSetIterator<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<T: PartialEq> PartialEq for PersistentTreeSet<T> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<T: Eq> Eq for PersistentTreeSet<T> {}

impl<T: Hash> Hash for PersistentTreeSet<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for element in self {
            element.hash(state);
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentTreeSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        formatter.debug_set().entries(self.iter()).finish()
    }
}

impl<T: fmt::Display> fmt::Display for PersistentTreeSet<T> {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(formatter, "{{")?;
        for (index, element) in self.iter().enumerate() {
            if index > 0 {
                write!(formatter, ", ")?;
            }
            write!(formatter, "{element}")?;
        }
        write!(formatter, "}}")
    }
}

#[cfg(feature = "arc")]
static_assertions::assert_impl_all!(PersistentTreeSet<String>: Send, Sync);

// =============================================================================
// Tests
// =============================================================================
