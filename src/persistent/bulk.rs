//! Bottom-up construction from sorted input.
//!
//! Entries are packed left to right into full nodes, one level at a time:
//! whenever the node being filled at some height is full, it is finished
//! and the next entry is lifted one level up as a separator. Only the
//! rightmost node of each level can end up short, so a final top-down pass
//! along the right border borrows from left neighbours to restore the
//! minimum fill.

use std::mem;

use super::ReferenceCounter;
use super::node::{MIN_LEN, Node, NodeRef};

const UNSORTED_INPUT_PANIC_MESSAGE: &str =
    "from_sorted_iter requires entries in non-decreasing key order";

impl<K: Clone + Ord, V: Clone> Node<K, V> {
    /// Builds a tree from entries sorted by key.
    ///
    /// Runs of equal keys keep their last entry. Returns the root together
    /// with the number of stored entries.
    pub(crate) fn build_from_sorted<I>(entries: I) -> (Option<NodeRef<K, V>>, usize)
    where
        I: IntoIterator<Item = (K, V)>,
    {
        let mut levels = vec![Self::empty_leaf()];
        let mut length = 0;
        let mut entries = entries.into_iter().peekable();

        while let Some((key, value)) = entries.next() {
            if let Some((next_key, _)) = entries.peek() {
                debug_assert!(*next_key >= key, "{}", UNSORTED_INPUT_PANIC_MESSAGE);
                if *next_key == key {
                    continue;
                }
            }
            Self::push_entry(&mut levels, key, value);
            length += 1;
        }

        trace_structure!(length, height = levels.len(), "bulk load finished");
        (Self::finish(levels), length)
    }

    /// Appends one entry, finishing full nodes and lifting separators.
    ///
    /// An in-progress internal node holds as many edges as keys; its last
    /// edge is attached when it is finished.
    fn push_entry(levels: &mut Vec<Self>, key: K, value: V) {
        let mut finished: Option<Self> = None;
        let mut height = 0;

        loop {
            let Some(node) = levels.get_mut(height) else {
                let mut root = Self::empty_internal();
                root.edges_mut().extend(finished.map(ReferenceCounter::new));
                root.push_back_pending(key, value);
                levels.push(root);
                return;
            };

            if !node.is_full() {
                if let Some(child) = finished {
                    node.edges_mut().push(ReferenceCounter::new(child));
                }
                node.push_back_pending(key, value);
                return;
            }

            let fresh = if node.is_leaf() {
                Self::empty_leaf()
            } else {
                Self::empty_internal()
            };
            let mut full = mem::replace(node, fresh);
            if let Some(child) = finished.take() {
                full.edges_mut().push(ReferenceCounter::new(child));
            }
            finished = Some(full);
            height += 1;
        }
    }

    /// Appends an entry whose edge, if any, is already in place.
    fn push_back_pending(&mut self, key: K, value: V) {
        match self {
            Self::Leaf { keys, values } | Self::Internal { keys, values, .. } => {
                keys.push(key);
                values.push(value);
            }
        }
    }

    /// Attaches every level's node as the last edge of the level above.
    fn finish(levels: Vec<Self>) -> Option<NodeRef<K, V>> {
        let mut levels = levels.into_iter();
        let mut node = levels.next()?;
        for mut parent in levels {
            parent.edges_mut().push(ReferenceCounter::new(node));
            node = parent;
        }
        if node.len() == 0 {
            return None;
        }
        node.fix_right_border();
        Some(ReferenceCounter::new(node))
    }

    fn fix_right_border(&mut self) {
        if self.is_leaf() {
            return;
        }
        let last = self.len();
        let deficit = MIN_LEN.saturating_sub(self.edge(last).len());
        if deficit > 0 {
            trace_structure!(deficit, "refilling right border");
            for _ in 0..deficit {
                self.rotate_right(last);
            }
        }
        ReferenceCounter::make_mut(&mut self.edges_mut()[last]).fix_right_border();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::persistent::invariant::check_tree;
    use crate::persistent::node::CAPACITY;
    use rstest::rstest;

    fn build(size: i32) -> (Option<NodeRef<i32, i32>>, usize) {
        Node::build_from_sorted((0..size).map(|key| (key, key * 2)))
    }

    fn height(root: Option<&NodeRef<i32, i32>>) -> usize {
        let mut height = 0;
        let mut current = root.map(|root| &**root);
        while let Some(node) = current {
            height += 1;
            current = node.edges().map(|edges| &*edges[0]);
        }
        height
    }

    #[rstest]
    fn empty_input_builds_empty_tree() {
        let (root, length) = build(0);
        assert!(root.is_none());
        assert_eq!(length, 0);
    }

    #[rstest]
    #[case(1, 1)]
    #[case(11, 1)]
    #[case(12, 2)]
    #[case(13, 2)]
    #[case(17, 2)]
    #[case(143, 2)]
    #[case(144, 3)]
    #[case(1000, 3)]
    #[case(5000, 4)]
    fn builds_valid_tree(#[case] size: i32, #[case] expected_height: usize) {
        let (root, length) = build(size);

        assert_eq!(length, usize::try_from(size).unwrap());
        assert_eq!(check_tree(root.as_deref(), length), Ok(()));
        assert_eq!(height(root.as_ref()), expected_height);
    }

    #[rstest]
    fn inner_nodes_are_packed_full() {
        let (root, _) = build(1000);
        let root = root.unwrap();
        let edges = root.edges().unwrap();

        assert!(edges[..edges.len() - 1].iter().all(|edge| edge.len() >= CAPACITY - MIN_LEN));
        assert_eq!(edges[0].len(), CAPACITY);
    }

    #[rstest]
    fn duplicate_keys_keep_last_value() {
        let entries = vec![(1, "a"), (2, "b"), (2, "c"), (3, "d"), (3, "e"), (3, "f")];
        let (root, length) = Node::build_from_sorted(entries);
        let root = root.unwrap();

        assert_eq!(length, 3);
        assert_eq!(root.keys(), &[1, 2, 3]);
        assert_eq!(root.values(), &["a", "c", "f"]);
    }

    #[rstest]
    #[cfg(debug_assertions)]
    #[should_panic(expected = "non-decreasing key order")]
    fn unsorted_input_is_rejected_in_debug_builds() {
        let _ = Node::build_from_sorted(vec![(2, ()), (1, ())]);
    }
}
