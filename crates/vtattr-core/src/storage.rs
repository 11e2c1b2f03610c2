//! Reference-counted attribute storage.
//!
//! ## Design
//!
//! `AttrStorage` is the facade the cell buffer talks to. Writing a cell
//! asks for an identifier with [`ref_attr`](AttrStorage::ref_attr);
//! overwriting or scrolling a cell out gives the identifier back with
//! [`unref`](AttrStorage::unref). Attributes without true color are encoded
//! inline in the identifier and cost nothing; true-color attributes are
//! interned in the red-black tree and shared between all cells with the
//! same `(flags, fg, bg)` triple, tracked by a per-node reference count.
//!
//! ## Reference Counting
//!
//! `ref_attr` and `unref` must balance. Losing an identifier without an
//! `unref` leaks a tree node; a second `unref` of the same identifier
//! corrupts the count (debug builds assert, release builds ignore it).
//! Reading an identifier back after its last `unref` returns whatever the
//! pool currently holds and is a caller bug.
//!
//! ## Thread Safety
//!
//! Single-threaded by design: every operation is synchronous and bounded
//! (tree descent is O(log n), pool alloc/free amortized O(1)). Wrap the
//! storage in a lock if an embedding ever needs to share it.

use std::fmt;

use crate::attr::{AttrId, Attributes};
use crate::pool::PoolError;
use crate::tree::AttrTree;

/// Construction-time knobs for [`AttrStorage`].
#[derive(Debug, Clone, Copy)]
pub struct StorageConfig {
    /// Initial pool capacity in nodes.
    pub initial_nodes: u32,
    /// Hard pool bound; interning fails with
    /// [`PoolError::OutOfMemory`] once reached.
    pub max_nodes: u32,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            initial_nodes: 16,
            max_nodes: 65_536,
        }
    }
}

/// Usage statistics for an [`AttrStorage`].
#[derive(Debug, Clone, Copy)]
pub struct StorageStats {
    /// Interned (live) tree nodes.
    pub tree_nodes: usize,
    /// Total pool capacity in nodes, including reserved blocks.
    pub pool_nodes: u32,
    /// Pool blocks currently on the free list.
    pub free_nodes: u32,
    /// Bytes held by the pool's backing array.
    pub memory_bytes: usize,
}

impl fmt::Display for StorageStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} interned, {}/{} pool blocks free, {} bytes",
            self.tree_nodes, self.free_nodes, self.pool_nodes, self.memory_bytes
        )
    }
}

/// Reference-counted interning facade over the attribute tree.
#[derive(Debug)]
pub struct AttrStorage {
    tree: AttrTree,
    config: StorageConfig,
}

impl Default for AttrStorage {
    fn default() -> Self {
        Self::new(StorageConfig::default())
    }
}

impl AttrStorage {
    /// Create a storage with the given pool bounds.
    #[must_use]
    pub fn new(config: StorageConfig) -> Self {
        Self {
            tree: AttrTree::new(config.initial_nodes, config.max_nodes),
            config,
        }
    }

    /// Acquire an identifier for the current value of `a`.
    ///
    /// Non-RGB values encode inline (the identifier *is* the flags word and
    /// no pool state is touched). RGB values are interned: an equal triple
    /// shares its node and the node's reference count goes up by one per
    /// call. The identifier is memoized on `a`, so repeated calls with an
    /// unchanged value take a verify-and-increment fast path.
    ///
    /// # Errors
    ///
    /// [`PoolError::OutOfMemory`] when a new node is needed and the pool is
    /// at its configured maximum.
    pub fn ref_attr(&mut self, a: &mut Attributes) -> Result<AttrId, PoolError> {
        let memo = a.update_address();
        if memo.is_pooled() {
            let node = memo.index();
            // The memo may be stale: the node could have been freed (and
            // possibly reused for a different key) since it was recorded.
            if self.tree.contains_index(node)
                && self.tree.key_of(node) == a.raw_parts()
                && self.tree.ref_count(node) > 0
            {
                self.tree.incr_ref(node);
                return Ok(memo);
            }
        }

        if !a.has_rgb() {
            let id = AttrId(a.flags_word());
            a.memoize(id);
            return Ok(id);
        }

        let (flags, fg, bg) = a.raw_parts();
        let node = match self.tree.insert(flags, fg, bg) {
            Ok(node) => node,
            Err(e) => {
                tracing::debug!(max_nodes = self.config.max_nodes, "attribute intern failed: {e}");
                return Err(e);
            }
        };
        self.tree.incr_ref(node);
        let id = AttrId::from_index(node);
        a.memoize(id);
        Ok(id)
    }

    /// Release one reference to an identifier.
    ///
    /// Inline identifiers carry no pool state and are ignored. For a
    /// pool-pointer identifier the node's count is decremented; at zero the
    /// node is removed from the tree and its block returns to the free
    /// list. Releasing an identifier whose node is already at zero is a
    /// silent no-op (debug builds assert).
    pub fn unref(&mut self, id: AttrId) {
        if !id.is_pooled() {
            return;
        }
        let node = id.index();
        if !self.tree.contains_index(node) {
            debug_assert!(false, "unref of an identifier outside the pool");
            return;
        }
        if self.tree.ref_count(node) == 0 {
            debug_assert!(false, "unref of a node with zero references");
            return;
        }
        if self.tree.decr_ref(node) == 0 {
            let (flags, fg, bg) = self.tree.key_of(node);
            let removed = self.tree.remove(flags, fg, bg);
            debug_assert!(removed, "zero-ref node missing from the tree");
        }
    }

    /// Populate `out` from an identifier.
    ///
    /// Inline identifiers decode without touching the pool; pool-pointer
    /// identifiers read the node's key words. Either way `out`'s memo is
    /// refreshed so a following [`ref_attr`](Self::ref_attr) with the
    /// unchanged value takes the fast path. The identifier must be live
    /// (see the module docs on reading after `unref`).
    pub fn from_id(&self, id: AttrId, out: &mut Attributes) {
        if id.is_pooled() {
            let node = id.index();
            if self.tree.contains_index(node) {
                let (flags, fg, bg) = self.tree.key_of(node);
                out.load(flags, fg, bg, id);
            } else {
                debug_assert!(false, "readback of an identifier outside the pool");
                out.load(0, 0, 0, AttrId::INLINE_DEFAULT);
            }
        } else {
            out.load(id.bits(), 0, 0, id);
        }
    }

    /// Drop every interned node and re-initialize the pool and tree.
    ///
    /// All previously returned pool-pointer identifiers become invalid.
    pub fn reset(&mut self) {
        tracing::debug!(interned = self.tree.len(), "attribute storage reset");
        self.tree = AttrTree::new(self.config.initial_nodes, self.config.max_nodes);
    }

    /// Number of interned (true-color) nodes.
    #[must_use]
    #[inline]
    pub fn interned_len(&self) -> usize {
        self.tree.len()
    }

    /// The interning tree, for inspection.
    #[must_use]
    #[inline]
    pub fn tree(&self) -> &AttrTree {
        &self.tree
    }

    /// Reference count behind a pool-pointer identifier, 0 for inline ones.
    #[must_use]
    pub fn ref_count(&self, id: AttrId) -> u32 {
        if id.is_pooled() && self.tree.contains_index(id.index()) {
            self.tree.ref_count(id.index())
        } else {
            0
        }
    }

    /// Usage statistics.
    #[must_use]
    pub fn stats(&self) -> StorageStats {
        StorageStats {
            tree_nodes: self.tree.len(),
            pool_nodes: self.tree.pool().node_capacity(),
            free_nodes: self.tree.pool().free_count(),
            memory_bytes: self.tree.pool().memory_bytes(),
        }
    }
}
