//! Persistent (immutable) ordered collections.
//!
//! This module provides two collections backed by the same immutable
//! B-tree of minimum degree 6:
//!
//! - [`PersistentTreeMap`]: Persistent ordered map
//! - [`PersistentTreeSet`]: Persistent ordered set
//!
//! # Structural Sharing
//!
//! Every update returns a new collection and leaves the receiver untouched.
//! Only the nodes on the path from the root to the changed position are
//! copied; all other subtrees are shared between the old and the new
//! version, so an update costs O(log n) time and space.
//!
//! # Examples
//!
//! ## `PersistentTreeMap`
//!
//! ```rust
//! use persistent_btree::persistent::PersistentTreeMap;
//!
//! let (_, map) = PersistentTreeMap::new().insert(3, "three");
//! let (_, map) = map.insert(1, "one");
//! let (_, map) = map.insert(2, "two");
//!
//! // Entries are always in sorted order
//! let keys: Vec<&i32> = map.keys().collect();
//! assert_eq!(keys, vec![&1, &2, &3]);
//!
//! // Structural sharing: the original map is preserved
//! let (previous, updated) = map.insert(1, "ONE");
//! assert_eq!(previous, Some("one"));
//! assert_eq!(map.get(&1), Some(&"one"));
//! assert_eq!(updated.get(&1), Some(&"ONE"));
//!
//! // Range queries
//! let range: Vec<(&i32, &&str)> = map.range(1..=2).collect();
//! assert_eq!(range.len(), 2);
//! ```
//!
//! ## `PersistentTreeSet`
//!
//! ```rust
//! use persistent_btree::persistent::PersistentTreeSet;
//!
//! let set: PersistentTreeSet<i32> = [1, 2, 3].into_iter().collect();
//! let other: PersistentTreeSet<i32> = [2, 3, 4].into_iter().collect();
//!
//! let union: Vec<&i32> = set.union(&other).collect();
//! assert_eq!(union, vec![&1, &2, &3, &4]);
//!
//! let intersection = &set & &other;
//! assert_eq!(intersection.len(), 2);
//! assert!(intersection.is_subset(&set));
//! ```

// =============================================================================
// Reference Counter Type Alias
// =============================================================================

/// Reference-counted smart pointer type.
///
/// When the `arc` feature is enabled, this is `std::sync::Arc`,
/// which is thread-safe but has slightly higher overhead.
///
/// When the `arc` feature is disabled (default), this is `std::rc::Rc`,
/// which is faster but not thread-safe.
#[cfg(feature = "arc")]
pub(crate) type ReferenceCounter<T> = std::sync::Arc<T>;

#[cfg(not(feature = "arc"))]
pub(crate) type ReferenceCounter<T> = std::rc::Rc<T>;

// =============================================================================
// Structural Tracing
// =============================================================================

/// Emits a `tracing` event at TRACE level when the `tracing` feature is on.
///
/// Without the feature the invocation expands to nothing.
macro_rules! trace_structure {
    ($($argument:tt)+) => {
        #[cfg(feature = "tracing")]
        ::tracing::trace!(target: "persistent_btree", $($argument)+);
    };
}

mod bulk;
mod invariant;
mod iter;
mod node;
mod remove;
mod treemap;
mod treeset;

pub use invariant::InvariantViolation;
pub use treemap::PersistentTreeMap;
pub use treemap::PersistentTreeMapIntoIterator;
pub use treemap::PersistentTreeMapIterator;
pub use treemap::PersistentTreeMapRangeIterator;
pub use treeset::Difference;
pub use treeset::Intersection;
pub use treeset::PersistentTreeSet;
pub use treeset::PersistentTreeSetIntoIterator;
pub use treeset::PersistentTreeSetIterator;
pub use treeset::PersistentTreeSetRangeIterator;
pub use treeset::SymmetricDifference;
pub use treeset::Union;

// =============================================================================
// Tests
// =============================================================================

#[cfg(test)]
mod reference_counter_tests {
    use super::ReferenceCounter;
    use rstest::rstest;

    #[rstest]
    fn test_reference_counter_clone() {
        let reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        let reference_counter_clone = reference_counter.clone();
        assert_eq!(*reference_counter, *reference_counter_clone);
    }

    #[rstest]
    fn test_reference_counter_make_mut_copies_shared_value() {
        let mut reference_counter: ReferenceCounter<i32> = ReferenceCounter::new(42);
        let shared = reference_counter.clone();
        *ReferenceCounter::make_mut(&mut reference_counter) += 1;
        assert_eq!(*reference_counter, 43);
        assert_eq!(*shared, 42);
        assert_eq!(ReferenceCounter::strong_count(&shared), 1);
    }
}
