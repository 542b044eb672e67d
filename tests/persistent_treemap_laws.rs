//! Property-based tests for PersistentTreeMap.
//!
//! These tests verify that PersistentTreeMap satisfies the expected laws
//! and structural invariants using proptest, with `std::collections::BTreeMap`
//! as the reference model.

use persistent_btree::persistent::PersistentTreeMap;
use proptest::prelude::*;
use std::collections::BTreeMap;

// =============================================================================
// Strategies for Generating Test Data
// =============================================================================

/// Narrow key space so inserts and removals collide often.
fn key() -> impl Strategy<Value = i32> {
    -500..500_i32
}

fn arbitrary_treemap(max_size: usize) -> impl Strategy<Value = PersistentTreeMap<i32, i32>> {
    prop::collection::vec((key(), any::<i32>()), 0..max_size)
        .prop_map(|entries| entries.into_iter().collect::<PersistentTreeMap<i32, i32>>())
}

#[derive(Debug, Clone)]
enum Operation {
    Insert(i32, i32),
    Remove(i32),
    PopFirst,
    PopLast,
}

fn operation() -> impl Strategy<Value = Operation> {
    prop_oneof![
        4 => (key(), any::<i32>()).prop_map(|(key, value)| Operation::Insert(key, value)),
        3 => key().prop_map(Operation::Remove),
        1 => Just(Operation::PopFirst),
        1 => Just(Operation::PopLast),
    ]
}

// =============================================================================
// Structural Invariants
// =============================================================================

proptest! {
    /// Property: every reachable map satisfies the B-tree invariants and
    /// agrees with a `BTreeMap` driven by the same operations.
    #[test]
    fn prop_operations_preserve_invariants(
        operations in prop::collection::vec(operation(), 0..400)
    ) {
        let mut map = PersistentTreeMap::new();
        let mut model = BTreeMap::new();

        for operation in operations {
            match operation {
                Operation::Insert(key, value) => {
                    let (previous, next) = map.insert(key, value);
                    prop_assert_eq!(previous, model.insert(key, value));
                    map = next;
                }
                Operation::Remove(key) => {
                    let (removed, next) = map.remove(&key);
                    prop_assert_eq!(removed, model.remove(&key));
                    map = next;
                }
                Operation::PopFirst => {
                    let (popped, next) = map.pop_first();
                    prop_assert_eq!(popped, model.pop_first());
                    map = next;
                }
                Operation::PopLast => {
                    let (popped, next) = map.pop_last();
                    prop_assert_eq!(popped, model.pop_last());
                    map = next;
                }
            }
            prop_assert_eq!(map.check_invariants(), Ok(()));
        }

        let entries: Vec<(i32, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
        let expected: Vec<(i32, i32)> = model.into_iter().collect();
        prop_assert_eq!(entries, expected);
    }

    /// Property: bulk loading sorted input yields a valid tree.
    #[test]
    fn prop_from_sorted_iter_is_valid(
        keys in prop::collection::btree_set(any::<i32>(), 0..2000)
    ) {
        let map = PersistentTreeMap::from_sorted_iter(keys.iter().map(|key| (*key, ())));
        prop_assert_eq!(map.check_invariants(), Ok(()));
        prop_assert!(map.keys().eq(keys.iter()));
    }

    /// Property: in-order iteration yields strictly ascending keys.
    #[test]
    fn prop_iter_is_sorted(map in arbitrary_treemap(300)) {
        let keys: Vec<&i32> = map.keys().collect();
        prop_assert!(keys.windows(2).all(|pair| pair[0] < pair[1]));
    }

    /// Property: `len` equals the number of iterated entries.
    #[test]
    fn prop_len_equals_count(map in arbitrary_treemap(300)) {
        prop_assert_eq!(map.len(), map.iter().count());
        prop_assert_eq!(map.len(), map.iter_rev().count());
    }
}

// =============================================================================
// Get-Insert-Remove Laws
// =============================================================================

proptest! {
    /// Law: get after insert of an absent key returns the inserted value.
    #[test]
    fn prop_get_after_insert(map in arbitrary_treemap(200), key in key(), value: i32) {
        let (_, updated) = map.insert(key, value);
        prop_assert_eq!(updated.get(&key), Some(&value));
    }

    /// Law: insert does not affect other keys.
    #[test]
    fn prop_insert_leaves_other_keys(
        map in arbitrary_treemap(200),
        key1 in key(),
        key2 in key(),
        value: i32
    ) {
        prop_assume!(key1 != key2);
        let (_, updated) = map.insert(key1, value);
        prop_assert_eq!(updated.get(&key2), map.get(&key2));
    }

    /// Law: removing an absent key returns the map unchanged.
    #[test]
    fn prop_remove_absent_is_identity(map in arbitrary_treemap(200), key in key()) {
        prop_assume!(!map.contains_key(&key));
        let (removed, same) = map.remove(&key);
        prop_assert_eq!(removed, None);
        prop_assert!(same.ptr_eq(&map));
    }

    /// Law: inserting then removing an absent key restores the sequence.
    #[test]
    fn prop_insert_remove_round_trip(map in arbitrary_treemap(200), key in key(), value: i32) {
        prop_assume!(!map.contains_key(&key));
        let (_, inserted) = map.insert(key, value);
        let (removed, restored) = inserted.remove(&key);
        prop_assert_eq!(removed, Some(value));
        prop_assert_eq!(&restored, &map);
        prop_assert_eq!(restored.check_invariants(), Ok(()));
    }

    /// Law: updates never modify the original version.
    #[test]
    fn prop_updates_preserve_original(map in arbitrary_treemap(200), key in key(), value: i32) {
        let before: Vec<(i32, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
        let _ = map.insert(key, value);
        let _ = map.remove(&key);
        let after: Vec<(i32, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
        prop_assert_eq!(before, after);
    }
}

// =============================================================================
// Range Laws
// =============================================================================

proptest! {
    /// Law: range agrees with filtering the full iteration.
    #[test]
    fn prop_range_matches_filter(map in arbitrary_treemap(300), start in key(), end in key()) {
        let ranged: Vec<i32> = map.range(start..=end).map(|(key, _)| *key).collect();
        let filtered: Vec<i32> = map
            .keys()
            .copied()
            .filter(|key| (start..=end).contains(key))
            .collect();
        prop_assert_eq!(ranged, filtered);
    }

    /// Law: half-open ranges never include their end.
    #[test]
    fn prop_half_open_range_excludes_end(map in arbitrary_treemap(300), start in key(), end in key()) {
        prop_assert!(map.range(start..end).all(|(key, _)| *key >= start && *key < end));
    }
}

// =============================================================================
// Equality and Folding Laws
// =============================================================================

proptest! {
    /// Law: equality does not depend on insertion order.
    #[test]
    fn prop_eq_insertion_order_independent(
        entries in prop::collection::btree_map(key(), any::<i32>(), 0..200)
    ) {
        let forward = entries
            .iter()
            .fold(PersistentTreeMap::new(), |map, (key, value)| map.insert(*key, *value).1);
        let backward = entries
            .iter()
            .rev()
            .fold(PersistentTreeMap::new(), |map, (key, value)| map.insert(*key, *value).1);
        prop_assert_eq!(forward, backward);
    }

    /// Law: fold_left and fold_right visit every value once.
    #[test]
    fn prop_folds_sum_values(map in arbitrary_treemap(200)) {
        let expected: i64 = map.values().map(|value| i64::from(*value)).sum();
        let left = map.fold_left(0_i64, |sum, (_, value)| sum + i64::from(*value));
        let right = map.fold_right(0_i64, |(_, value), sum| sum + i64::from(*value));
        prop_assert_eq!(left, expected);
        prop_assert_eq!(right, expected);
    }
}
