//! # persistent-btree
//!
//! Persistent (immutable) ordered map and set for Rust, backed by a B-tree
//! of minimum degree 6.
//!
//! ## Overview
//!
//! Every update returns a new collection and leaves the original intact.
//! Versions share all the nodes an update did not touch, so keeping old
//! versions around costs only the copied path.
//!
//! - **`PersistentTreeMap`**: Ordered key-value map with range queries
//! - **`PersistentTreeSet`**: Ordered set with lazy set algebra
//!
//! ## Feature Flags
//!
//! - `arc`: Share nodes through `Arc` so collections are `Send + Sync`
//! - `tracing`: Emit TRACE events when the tree splits, collapses, or is
//!   bulk loaded
//!
//! ## Example
//!
//! ```rust
//! use persistent_btree::prelude::*;
//!
//! let map: PersistentTreeMap<i32, &str> = [(2, "two"), (1, "one")].into_iter().collect();
//! let (_, extended) = map.insert(3, "three");
//! assert_eq!(map.len(), 2);
//! assert_eq!(extended.len(), 3);
//!
//! let set: PersistentTreeSet<i32> = extended.keys().copied().collect();
//! assert!(set.contains(&3));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
// Note: Disabling redundant_closure_for_method_calls due to clippy 0.1.92 panic bug
#![allow(clippy::redundant_closure_for_method_calls)]

/// Prelude module for convenient imports.
///
/// # Usage
///
/// ```rust
/// use persistent_btree::prelude::*;
/// ```
pub mod prelude {
    pub use crate::persistent::*;
}

pub mod persistent;

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    #[test]
    fn prelude_exposes_both_collections() {
        let map = PersistentTreeMap::singleton(1, "one");
        let set = PersistentTreeSet::singleton(1);
        assert_eq!(map.len(), set.len());
    }
}
