//! Compact interned cell attributes for terminal scrollback.
//!
//! ## Design
//!
//! - 32-bit attribute identifiers; the common no-true-color case encodes
//!   the whole style inline with zero storage cost
//! - True-color styles interned once per `(flags, fg, bg)` triple in a
//!   red-black tree living inside a flat 32-bit node pool
//! - Reference counting frees interned styles when the last cell holding
//!   them is overwritten or scrolled out
//! - A streaming serializer replays buffer contents as minimal SGR escape
//!   transitions
//!
//! ## Architecture
//!
//! ```text
//!  SGR parser ──mutates──▶ Attributes ──ref_attr──▶ AttrId (in cells)
//!                              ▲                        │
//!                              └────── from_id ─────────┤
//!                                                       ▼
//!                  AttrStorage ─▶ AttrTree ─▶ NodePool (Vec<u32>)
//!
//!  Serializer ──walks cells──▶ minimal SGR escapes + glyph text
//! ```
//!
//! The core is single-threaded: every operation is synchronous and bounded
//! (tree descent O(log n), pool alloc/free amortized O(1)).

pub mod attr;
pub mod cell;
pub mod pool;
pub mod serialize;
pub mod storage;
pub mod tree;
mod verification;

#[cfg(test)]
mod tests;

pub use attr::{rgb, rgb_parts, AttrFlags, AttrId, Attributes, ColorMode};
pub use cell::Cell;
pub use pool::{NodePool, PoolError, NODE_WORDS};
pub use serialize::{serialize_lines, sgr_transition, Serializer};
pub use storage::{AttrStorage, StorageConfig, StorageStats};
pub use tree::{AttrTree, TreeIter};
