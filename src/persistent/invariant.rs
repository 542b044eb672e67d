//! Structural validation of B-tree shape.

use std::fmt;

use super::node::{MIN_LEN, Node};

/// A broken structural invariant reported by `check_invariants`.
///
/// Depths count from the root at depth 0.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvariantViolation {
    /// The tree is present but its root holds no keys.
    EmptyRoot,
    /// A node's key and value arrays differ in length.
    ValueCount {
        /// Depth of the offending node.
        depth: usize,
        /// Number of keys in the node.
        keys: usize,
        /// Number of values in the node.
        values: usize,
    },
    /// A non-root node holds fewer keys than the minimum fill.
    Underfull {
        /// Depth of the offending node.
        depth: usize,
        /// Number of keys in the node.
        len: usize,
    },
    /// The keys of a node are not strictly increasing.
    UnsortedKeys {
        /// Depth of the offending node.
        depth: usize,
    },
    /// A key lies outside the interval its ancestors' separators allow.
    KeyOutOfRange {
        /// Depth of the offending node.
        depth: usize,
    },
    /// An internal node does not have exactly one more child than keys.
    EdgeCount {
        /// Depth of the offending node.
        depth: usize,
        /// Number of keys in the node.
        keys: usize,
        /// Number of children of the node.
        edges: usize,
    },
    /// Two leaves sit at different depths.
    UnevenLeaves {
        /// Depth of the first leaf visited.
        expected: usize,
        /// Depth of the leaf that disagrees.
        found: usize,
    },
    /// The recorded length differs from the number of stored entries.
    LengthMismatch {
        /// Length the collection reports.
        recorded: usize,
        /// Number of entries actually stored.
        counted: usize,
    },
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, formatter: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::EmptyRoot => write!(formatter, "root node holds no keys"),
            Self::ValueCount {
                depth,
                keys,
                values,
            } => write!(
                formatter,
                "node at depth {depth} holds {keys} keys but {values} values"
            ),
            Self::Underfull { depth, len } => write!(
                formatter,
                "node at depth {depth} holds {len} keys, fewer than the minimum of {MIN_LEN}"
            ),
            Self::UnsortedKeys { depth } => {
                write!(formatter, "keys of node at depth {depth} are not strictly increasing")
            }
            Self::KeyOutOfRange { depth } => write!(
                formatter,
                "node at depth {depth} holds a key outside its parent's separators"
            ),
            Self::EdgeCount { depth, keys, edges } => write!(
                formatter,
                "internal node at depth {depth} holds {keys} keys but {edges} children"
            ),
            Self::UnevenLeaves { expected, found } => write!(
                formatter,
                "leaf found at depth {found}, expected all leaves at depth {expected}"
            ),
            Self::LengthMismatch { recorded, counted } => write!(
                formatter,
                "length is recorded as {recorded} but the tree stores {counted} entries"
            ),
        }
    }
}

impl std::error::Error for InvariantViolation {}

/// Validates the tree rooted at `root` against the recorded length.
pub(crate) fn check_tree<K: Ord, V>(
    root: Option<&Node<K, V>>,
    recorded: usize,
) -> Result<(), InvariantViolation> {
    let counted = match root {
        None => 0,
        Some(root) if root.len() == 0 => return Err(InvariantViolation::EmptyRoot),
        Some(root) => Checker::default().check(root, 0, None, None)?,
    };
    if counted == recorded {
        Ok(())
    } else {
        Err(InvariantViolation::LengthMismatch { recorded, counted })
    }
}

#[derive(Default)]
struct Checker {
    leaf_depth: Option<usize>,
}

impl Checker {
    /// Checks the subtree at `depth` whose keys must lie strictly between
    /// `lower` and `upper`, returning its entry count.
    fn check<K: Ord, V>(
        &mut self,
        node: &Node<K, V>,
        depth: usize,
        lower: Option<&K>,
        upper: Option<&K>,
    ) -> Result<usize, InvariantViolation> {
        let keys = node.keys();

        if node.values().len() != keys.len() {
            return Err(InvariantViolation::ValueCount {
                depth,
                keys: keys.len(),
                values: node.values().len(),
            });
        }
        if depth > 0 && keys.len() < MIN_LEN {
            return Err(InvariantViolation::Underfull {
                depth,
                len: keys.len(),
            });
        }
        if keys.windows(2).any(|pair| pair[0] >= pair[1]) {
            return Err(InvariantViolation::UnsortedKeys { depth });
        }
        let below_lower =
            lower.is_some_and(|lower| keys.first().is_some_and(|first| first <= lower));
        let above_upper =
            upper.is_some_and(|upper| keys.last().is_some_and(|last| last >= upper));
        if below_lower || above_upper {
            return Err(InvariantViolation::KeyOutOfRange { depth });
        }

        let Some(edges) = node.edges() else {
            return match self.leaf_depth {
                Some(expected) if expected != depth => Err(InvariantViolation::UnevenLeaves {
                    expected,
                    found: depth,
                }),
                Some(_) => Ok(keys.len()),
                None => {
                    self.leaf_depth = Some(depth);
                    Ok(keys.len())
                }
            };
        };

        if edges.len() != keys.len() + 1 {
            return Err(InvariantViolation::EdgeCount {
                depth,
                keys: keys.len(),
                edges: edges.len(),
            });
        }

        let mut total = keys.len();
        for (index, edge) in edges.iter().enumerate() {
            let child_lower = index.checked_sub(1).map_or(lower, |previous| Some(&keys[previous]));
            let child_upper = keys.get(index).or(upper);
            total += self.check(edge, depth + 1, child_lower, child_upper)?;
        }
        Ok(total)
    }
}
