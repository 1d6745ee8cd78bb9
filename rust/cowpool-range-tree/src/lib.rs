//! Interval-set ("range tree") engine for the copy-on-write storage pool.
//!
//! A [`RangeTree`] maintains a sorted, coalesced set of non-overlapping
//! half-open intervals over a logical address space. The pool uses it to
//! track free space within an extent, regions dirtied since a transaction
//! group, regions pending defragmentation, and segments queued for
//! sequential I/O.
//!
//! - Segments are stored in one of three physical encodings
//!   ([`SegmentKind`]) that trade address range for memory density.
//! - A per-tree `(origin, shift)` pair quantizes logical byte offsets into
//!   block-granular physical offsets, letting the narrow encoding address a
//!   full-width logical space.
//! - An optional non-zero `gap` enables bridging: two segments within `gap`
//!   of each other merge, and the intervening span becomes part of the
//!   resulting segment's extent while a separate `fill` count tracks how
//!   much of the span is actually populated.
//! - A 64-bucket power-of-two size histogram is maintained alongside every
//!   mutation for O(1) reporting.
//!
//! The tree is a pure, synchronous, single-threaded structure; callers
//! serialize access. Observer hooks fire synchronously inside mutating
//! calls and must not re-enter the tree.

pub mod diff;
pub mod histogram;
pub mod segment;
pub mod store;
pub mod tree;

#[cfg(test)]
mod tests;

pub use diff::{remove_xor_add, remove_xor_add_segment};
pub use segment::{Segment, SegmentKind};
pub use tree::{FaultPolicy, RangeTree, SpaceObserver};
