//! Unit tests for PersistentTreeMap.
//!
//! Covers the public map surface end to end, including the seed scenarios
//! the collection was originally specified against.

use persistent_btree::persistent::PersistentTreeMap;
use rstest::rstest;
use std::ops::Bound;

fn numbered(size: i32) -> PersistentTreeMap<i32, i32> {
    (0..size).map(|key| (key, key * 10)).collect()
}

fn assert_sorted<K: Ord + std::fmt::Debug, V>(map: &PersistentTreeMap<K, V>) {
    let keys: Vec<&K> = map.keys().collect();
    assert!(
        keys.windows(2).all(|pair| pair[0] < pair[1]),
        "keys out of order: {keys:?}"
    );
}

// =============================================================================
// Seed Scenarios
// =============================================================================

#[rstest]
fn test_movie_titles_contains_and_remove() {
    let movies = [
        ("Office Space", 1999),
        ("Pulp Fiction", 1994),
        ("The Godfather", 1972),
        ("The Blues Brothers", 1980),
    ];
    let map = movies
        .into_iter()
        .fold(PersistentTreeMap::new(), |map, (title, year)| {
            map.insert(title.to_string(), year).1
        });

    assert!(map.contains_key("Office Space"));
    assert!(!map.contains_key("Les Misérables"));

    let (removed, without) = map.remove("The Blues Brothers");
    assert_eq!(removed, Some(1980));
    let dump: Vec<(&str, i32)> = without
        .iter()
        .map(|(title, year)| (title.as_str(), *year))
        .collect();
    assert_eq!(
        dump,
        vec![
            ("Office Space", 1999),
            ("Pulp Fiction", 1994),
            ("The Godfather", 1972),
        ]
    );
    assert_eq!(map.len(), 4);
}

#[rstest]
fn test_two_hundred_string_keys_inserted_then_removed_in_order() {
    let keys: Vec<String> = (0..200).map(|index| index.to_string()).collect();
    let mut map = PersistentTreeMap::new();
    for (index, key) in keys.iter().enumerate() {
        map = map.insert(key.clone(), index).1;
    }

    assert_eq!(map.len(), 200);
    assert!(keys.iter().all(|key| map.contains_key(key.as_str())));
    assert!(!map.contains_key("-1"));
    assert!(!map.contains_key("200"));
    assert_eq!(map.check_invariants(), Ok(()));

    for (removed_count, key) in keys.iter().enumerate() {
        let (removed, next) = map.remove(key.as_str());
        assert_eq!(removed, Some(removed_count));
        assert_sorted(&next);
        assert_eq!(next.len(), 199 - removed_count);
        assert_eq!(next.check_invariants(), Ok(()));
        map = next;
    }
    assert!(map.is_empty());
}

#[rstest]
fn test_from_iter_last_write_wins() {
    let map: PersistentTreeMap<&str, i32> = [
        ("one", 1),
        ("one", 11),
        ("two", 22),
        ("two", 2),
        ("three", 3),
        ("for", 4),
    ]
    .into_iter()
    .collect();

    let entries: Vec<(&str, i32)> = map.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(
        entries,
        vec![("for", 4), ("one", 11), ("three", 3), ("two", 2)]
    );
}

#[rstest]
fn test_range_inclusive_over_sparse_keys() {
    let map: PersistentTreeMap<u64, &str> =
        [(3, "a"), (5, "b"), (8, "c"), (9, "d")].into_iter().collect();
    let in_range: Vec<(u64, &str)> = map
        .range(4_u64..=8)
        .map(|(key, value)| (*key, *value))
        .collect();
    assert_eq!(in_range, vec![(5, "b"), (8, "c")]);
}

// =============================================================================
// Construction
// =============================================================================

#[rstest]
fn test_new_and_default_are_empty() {
    let map: PersistentTreeMap<i32, String> = PersistentTreeMap::new();
    assert!(map.is_empty());
    assert_eq!(map, PersistentTreeMap::default());
    assert_eq!(map.height(), 0);
    assert_eq!(map.first_key_value(), None);
    assert_eq!(map.iter().next(), None);
}

#[rstest]
fn test_singleton_holds_one_entry() {
    let map = PersistentTreeMap::singleton(42, "answer".to_string());
    assert_eq!(map.len(), 1);
    assert_eq!(map.get(&42).map(String::as_str), Some("answer"));
}

#[rstest]
#[case(0)]
#[case(1)]
#[case(11)]
#[case(12)]
#[case(143)]
#[case(144)]
#[case(3000)]
fn test_from_sorted_iter_matches_inserts(#[case] size: i32) {
    let bulk = PersistentTreeMap::from_sorted_iter((0..size).map(|key| (key, key)));
    let inserted = (0..size).fold(PersistentTreeMap::new(), |map, key| map.insert(key, key).1);
    assert_eq!(bulk.check_invariants(), Ok(()));
    assert_eq!(bulk.len(), size as usize);
    assert_eq!(bulk, inserted);
}

// =============================================================================
// Insert / Remove
// =============================================================================

#[rstest]
fn test_insert_overwrite_reports_previous_value() {
    let (previous, map) = PersistentTreeMap::new().insert(1, "one");
    assert_eq!(previous, None);
    let (previous, updated) = map.insert(1, "ONE");
    assert_eq!(previous, Some("one"));
    assert_eq!(map.get(&1), Some(&"one"));
    assert_eq!(updated.get(&1), Some(&"ONE"));
    assert_eq!(updated.len(), 1);
}

#[rstest]
fn test_remove_absent_key_returns_original() {
    let map = numbered(100);
    let (removed, same) = map.remove(&1000);
    assert_eq!(removed, None);
    assert!(same.ptr_eq(&map));
}

#[rstest]
#[case::ascending((0..500).collect())]
#[case::descending((0..500).rev().collect())]
#[case::interleaved((0..500).map(|index| (index * 37) % 500).collect())]
fn test_insert_remove_orders_keep_invariants(#[case] order: Vec<i32>) {
    let mut map = PersistentTreeMap::new();
    for key in &order {
        map = map.insert(*key, *key).1;
        assert_eq!(map.check_invariants(), Ok(()));
    }
    assert_eq!(map.len(), 500);

    for key in order.iter().rev() {
        let (removed, next) = map.remove(key);
        assert_eq!(removed, Some(*key));
        assert_eq!(next.check_invariants(), Ok(()));
        map = next;
    }
    assert!(map.is_empty());
}

#[rstest]
fn test_old_versions_survive_many_updates() {
    let versions: Vec<PersistentTreeMap<i32, i32>> = (0..300)
        .scan(PersistentTreeMap::new(), |map, key| {
            *map = map.insert(key, key).1;
            Some(map.clone())
        })
        .collect();

    for (index, version) in versions.iter().enumerate() {
        assert_eq!(version.len(), index + 1);
        assert_eq!(version.last_key_value(), Some((&(index as i32), &(index as i32))));
    }
}

#[rstest]
fn test_pop_first_and_last() {
    let map = numbered(30);
    let (first, rest) = map.pop_first();
    let (last, rest) = rest.pop_last();
    assert_eq!(first, Some((0, 0)));
    assert_eq!(last, Some((29, 290)));
    assert_eq!(rest.len(), 28);
    assert_eq!(rest.check_invariants(), Ok(()));

    let (nothing, empty) = PersistentTreeMap::<i32, i32>::new().pop_first();
    assert_eq!(nothing, None);
    assert!(empty.is_empty());
}

// =============================================================================
// Traversal
// =============================================================================

#[rstest]
fn test_iter_is_double_ended_and_exact() {
    let map = numbered(200);
    let mut iterator = map.iter();
    assert_eq!(iterator.len(), 200);
    assert_eq!(iterator.next(), Some((&0, &0)));
    assert_eq!(iterator.next_back(), Some((&199, &1990)));
    assert_eq!(iterator.len(), 198);

    let middle: Vec<i32> = iterator.map(|(key, _)| *key).collect();
    assert_eq!(middle, (1..199).collect::<Vec<_>>());
}

#[rstest]
fn test_iter_rev_and_folds() {
    let map = numbered(50);
    let reversed: Vec<i32> = map.iter_rev().map(|(key, _)| *key).collect();
    assert_eq!(reversed, (0..50).rev().collect::<Vec<_>>());

    let forward = map.fold_left(Vec::new(), |mut keys, (key, _)| {
        keys.push(*key);
        keys
    });
    let backward = map.fold_right(Vec::new(), |(key, _), mut keys| {
        keys.push(*key);
        keys
    });
    assert_eq!(forward, (0..50).collect::<Vec<_>>());
    assert_eq!(backward, reversed);
}

#[rstest]
#[case((Bound::Included(10), Bound::Excluded(20)), (10..20).collect())]
#[case((Bound::Excluded(10), Bound::Included(20)), (11..=20).collect())]
#[case((Bound::Unbounded, Bound::Excluded(3)), vec![0, 1, 2])]
#[case((Bound::Included(995), Bound::Unbounded), (995..1000).collect())]
#[case((Bound::Included(30), Bound::Excluded(10)), vec![])]
#[case((Bound::Excluded(10), Bound::Excluded(10)), vec![])]
#[case((Bound::Included(2000), Bound::Unbounded), vec![])]
fn test_range_bounds(#[case] bounds: (Bound<i32>, Bound<i32>), #[case] expected: Vec<i32>) {
    let map = numbered(1000);
    let keys: Vec<i32> = map.range(bounds).map(|(key, _)| *key).collect();
    assert_eq!(keys, expected);
}

#[rstest]
fn test_into_iter_outlives_map() {
    let iterator = numbered(40).into_iter();
    let entries: Vec<(i32, i32)> = iterator.rev().take(2).collect();
    assert_eq!(entries, vec![(39, 390), (38, 380)]);
}

// =============================================================================
// Transformations
// =============================================================================

#[rstest]
fn test_map_values_and_filter_map() {
    let map = numbered(20);
    let halves = map.map_values(|value| value / 2);
    assert_eq!(halves.get(&6), Some(&30));

    let odd = map.filter_map(|key, value| (key % 2 == 1).then(|| value.to_string()));
    assert_eq!(odd.len(), 10);
    assert_eq!(odd.get(&3).map(String::as_str), Some("30"));
    assert_eq!(odd.check_invariants(), Ok(()));
}

#[rstest]
fn test_keep_delete_and_partition() {
    let map = numbered(100);
    let low = map.keep_if(|key, _| *key < 25);
    let high = map.delete_if(|key, _| *key < 25);
    let (evens, odds) = map.partition(|key, _| key % 2 == 0);

    assert_eq!(low.len(), 25);
    assert_eq!(high.len(), 75);
    assert_eq!(evens.len(), 50);
    assert_eq!(odds.len(), 50);
    for part in [&low, &high, &evens, &odds] {
        assert_eq!(part.check_invariants(), Ok(()));
    }
}

#[rstest]
fn test_merge_prefers_other_and_merge_with_resolves() {
    let left: PersistentTreeMap<i32, i32> = [(1, 1), (2, 2), (3, 3)].into_iter().collect();
    let right: PersistentTreeMap<i32, i32> = [(3, 30), (4, 40)].into_iter().collect();

    let merged = left.merge(&right);
    let entries: Vec<(i32, i32)> = merged.iter().map(|(key, value)| (*key, *value)).collect();
    assert_eq!(entries, vec![(1, 1), (2, 2), (3, 30), (4, 40)]);

    let summed = left.merge_with(&right, |_, mine, theirs| mine + theirs);
    assert_eq!(summed.get(&3), Some(&33));
    assert_eq!(summed.len(), 4);
}

// =============================================================================
// Trait Implementations
// =============================================================================

#[rstest]
fn test_equality_ignores_construction_history() {
    let inserted = (0..60).rev().fold(PersistentTreeMap::new(), |map, key| map.insert(key, ()).1);
    let collected: PersistentTreeMap<i32, ()> = (0..60).map(|key| (key, ())).collect();
    assert_eq!(inserted, collected);
    assert_ne!(inserted, collected.remove(&7).1);
}

#[rstest]
fn test_display_and_debug() {
    let map: PersistentTreeMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
    assert_eq!(format!("{map}"), "{1: one, 2: two}");
    assert_eq!(format!("{map:?}"), r#"{1: "one", 2: "two"}"#);
    assert_eq!(format!("{}", PersistentTreeMap::<i32, i32>::new()), "{}");
}
