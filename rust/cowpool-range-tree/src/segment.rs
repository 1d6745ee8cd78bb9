//! The segment value type and the physical encodings a tree can choose from.
//!
//! A segment is one maintained half-open interval `[start, end)` with an
//! optional `fill` sub-count. Segments have no identity beyond their position
//! in the backing container: they are value types copied in and out of the
//! store, never referenced across a mutation.

/// Identifies the physical encoding used for the segments of a tree.
///
/// The encoding is fixed at tree creation and trades addressable range and
/// semantics for memory density. All encodings run the same logical
/// algorithms; only the backing storage differs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SegmentKind {
    /// `start`/`end` stored as 32-bit quantized offsets. Densest encoding;
    /// the addressable range is bounded by `u32::MAX` physical blocks
    /// (`2^32 * 2^shift` logical bytes, less one block).
    Narrow32,
    /// `start`/`end` stored as 64-bit quantized offsets. Full address range.
    Wide64,
    /// Same as [`SegmentKind::Wide64`], plus an explicit per-segment `fill`
    /// count. The only encoding that supports a non-zero bridging `gap`.
    Gapped64,
}

impl SegmentKind {
    /// Whether this encoding carries a distinct `fill` count per segment.
    #[inline]
    pub fn tracks_fill(&self) -> bool {
        matches!(self, SegmentKind::Gapped64)
    }
}

/// One maintained interval `[start, end)` with a `fill` sub-count.
///
/// Invariants: `start < end` and `0 < fill <= end - start`. For trees
/// created without gap support `fill` always equals `end - start`.
///
/// The same triple serves two coordinate spaces: the backing store and the
/// mutation algorithms work in quantized physical units, while segments
/// crossing the public API (returned by `find`/`iter`, passed to observers
/// and to `resize_segment`/`adjust_fill`) are in logical byte coordinates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Segment {
    /// Inclusive interval start.
    pub start: u64,
    /// Exclusive interval end.
    pub end: u64,
    /// Populated portion of the interval.
    pub fill: u64,
}

impl Segment {
    /// Creates a fully populated segment (`fill == end - start`).
    #[inline]
    pub fn new(start: u64, end: u64) -> Segment {
        debug_assert!(start < end);
        Segment {
            start,
            end,
            fill: end - start,
        }
    }

    /// Creates a segment with an explicit fill count.
    #[inline]
    pub fn with_fill(start: u64, end: u64, fill: u64) -> Segment {
        debug_assert!(start < end);
        debug_assert!(fill > 0 && fill <= end - start);
        Segment { start, end, fill }
    }

    #[inline]
    pub fn size(&self) -> u64 {
        self.end - self.start
    }

    /// Whether the populated portion covers the whole span.
    #[inline]
    pub fn is_saturated(&self) -> bool {
        self.fill == self.size()
    }

    #[inline]
    pub fn overlaps(&self, start: u64, end: u64) -> bool {
        self.start < end && start < self.end
    }

    #[inline]
    pub fn contains_range(&self, start: u64, end: u64) -> bool {
        self.start <= start && self.end >= end
    }

    #[inline]
    pub fn contains(&self, pos: u64) -> bool {
        pos >= self.start && pos < self.end
    }

    /// Maps a physical-unit segment into logical byte coordinates.
    #[inline]
    pub(crate) fn rebase(self, origin: u64, shift: u32) -> Segment {
        Segment {
            start: (self.start << shift) + origin,
            end: (self.end << shift) + origin,
            fill: self.fill << shift,
        }
    }
}
