//! Top-down deletion.
//!
//! Before descending into a child that holds only [`MIN_LEN`](super::node::MIN_LEN)
//! keys, the child is topped up by borrowing from a sibling or merged with
//! one, so the removal itself never leaves a node underfull.

use std::borrow::Borrow;

use super::ReferenceCounter;
use super::node::{Node, NodeRef};

/// Which entry a removal targets.
pub(crate) enum Seek<'a, Q: ?Sized> {
    Key(&'a Q),
    First,
    Last,
}

impl<Q: ?Sized> Clone for Seek<'_, Q> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<Q: ?Sized> Copy for Seek<'_, Q> {}

impl<Q: ?Sized> Seek<'_, Q> {
    /// `Ok(i)` when `keys[i]` is the target, `Err(i)` when it lies in child `i`.
    fn locate<K, V>(self, node: &Node<K, V>) -> Result<usize, usize>
    where
        K: Borrow<Q>,
        Q: Ord,
    {
        match self {
            Self::Key(key) => node.find_key_in(key),
            Self::First if node.is_leaf() && node.len() > 0 => Ok(0),
            Self::First => Err(0),
            Self::Last if node.is_leaf() => node.len().checked_sub(1).ok_or(0),
            Self::Last => Err(node.len()),
        }
    }
}

impl<K: Clone + Ord, V: Clone> Node<K, V> {
    /// Removes the targeted entry from the tree rooted at `root`.
    ///
    /// Returns `None` when nothing matches. Otherwise returns the removed
    /// entry and the new root, which is `None` once the tree is empty. A root
    /// left without keys by a merge is replaced by its only child.
    pub(crate) fn remove_root<Q>(
        root: &NodeRef<K, V>,
        seek: Seek<'_, Q>,
    ) -> Option<((K, V), Option<NodeRef<K, V>>)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let (entry, node) = root.remove_not_thin(seek)?;
        let new_root = match node {
            node if node.len() > 0 => Some(ReferenceCounter::new(node)),
            Self::Leaf { .. } => None,
            Self::Internal { edges, .. } => {
                trace_structure!("collapsing empty root");
                edges.into_iter().next()
            }
        };
        Some((entry, new_root))
    }

    /// Removes from a subtree whose root is either the tree root or holds
    /// more than the minimum number of keys.
    fn remove_not_thin<Q>(&self, seek: Seek<'_, Q>) -> Option<((K, V), Self)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        match seek.locate(self) {
            Ok(index) => self.remove_at(index),
            Err(_) if self.is_leaf() => None,
            Err(index) => self.remove_in_child(index, seek),
        }
    }

    fn remove_at(&self, index: usize) -> Option<((K, V), Self)> {
        if self.is_leaf() {
            let mut node = self.clone();
            let removed = node.remove_entry(index);
            return Some((removed, node));
        }
        self.remove_internal_key(index)
    }

    fn pop_min(&self) -> Option<((K, V), Self)> {
        self.remove_not_thin(Seek::<K>::First)
    }

    fn pop_max(&self) -> Option<((K, V), Self)> {
        self.remove_not_thin(Seek::<K>::Last)
    }

    /// Removes separator `index` of an internal node.
    ///
    /// The separator is replaced by its predecessor or successor when the
    /// child holding it can spare a key. Otherwise both neighbours are merged
    /// around the separator and the removal continues in the merged child.
    fn remove_internal_key(&self, index: usize) -> Option<((K, V), Self)> {
        let left = self.edge(index);
        let right = self.edge(index + 1);

        if !left.is_thin() {
            let ((key, value), new_left) = left.pop_max()?;
            let mut node = self.clone();
            let removed = node.replace_entry(index, key, value);
            node.set_edge(index, new_left);
            Some((removed, node))
        } else if !right.is_thin() {
            let ((key, value), new_right) = right.pop_min()?;
            let mut node = self.clone();
            let removed = node.replace_entry(index, key, value);
            node.set_edge(index + 1, new_right);
            Some((removed, node))
        } else {
            let separator_position = left.len();
            let mut node = self.clone();
            node.merge_children(index);
            let (removed, merged) = node.edge(index).remove_at(separator_position)?;
            node.set_edge(index, merged);
            Some((removed, node))
        }
    }

    /// Descends into child `index`, refilling it first when it is thin.
    fn remove_in_child<Q>(&self, index: usize, seek: Seek<'_, Q>) -> Option<((K, V), Self)>
    where
        K: Borrow<Q>,
        Q: Ord + ?Sized,
    {
        let child = self.edge(index);
        if !child.is_thin() {
            let (removed, new_child) = child.remove_not_thin(seek)?;
            let mut node = self.clone();
            node.set_edge(index, new_child);
            return Some((removed, node));
        }

        let has_left = index > 0;
        let has_right = index < self.len();
        let mut node = self.clone();
        let target = if has_left && !self.edge(index - 1).is_thin() {
            node.rotate_right(index);
            index
        } else if has_right && !self.edge(index + 1).is_thin() {
            node.rotate_left(index);
            index
        } else if has_left {
            node.merge_children(index - 1);
            index - 1
        } else {
            node.merge_children(index);
            index
        };

        let (removed, new_child) = node.edge(target).remove_not_thin(seek)?;
        node.set_edge(target, new_child);
        Some((removed, node))
    }
}
