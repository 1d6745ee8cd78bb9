//! The range tree: coalescing insert, split-aware remove, gap bridging,
//! queries and bulk operations.

use std::fmt;
use std::ops::Range;

use cowpool_common::{Result, verify_arg};
use itertools::Itertools;

use crate::histogram::SizeHistogram;
use crate::segment::{Segment, SegmentKind};
use crate::store::{SegmentIter, SegmentStore};

/// What to do when a caller violates a mutation contract (double add,
/// double free, fill underflow, swapping into a non-empty tree, ...).
///
/// A caller bug must never pass unnoticed, but it also must not be allowed
/// to silently take down an entire running pool: embedding systems pick the
/// policy per tree. Under [`FaultPolicy::Log`] the offending call is
/// reported through `log::error!` and becomes a best-effort no-op.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FaultPolicy {
    /// Panic at the point of detection.
    Panic,
    /// Report the offending range and carry on.
    Log,
}

impl Default for FaultPolicy {
    fn default() -> Self {
        if cfg!(debug_assertions) {
            FaultPolicy::Panic
        } else {
            FaultPolicy::Log
        }
    }
}

/// Side-effect hooks fired synchronously inside mutating calls.
///
/// Clients use these to keep companion bookkeeping (e.g. a per-metaslab
/// allocation weight) consistent with the tree. The observer owns whatever
/// client state it needs. Hooks fire once per structural change, not once
/// per public call, and see the tree mid-mutation: they must not re-enter
/// the tree they are attached to. Segments are in logical byte coordinates.
pub trait SpaceObserver {
    /// The observer was attached to a tree.
    fn on_create(&mut self) {}
    /// The tree is being destroyed (it is logically empty at this point).
    fn on_destroy(&mut self) {}
    /// A segment became present with the given final shape.
    fn on_add(&mut self, seg: Segment) {
        let _ = seg;
    }
    /// A segment was removed or is about to be resized/merged away.
    fn on_remove(&mut self, seg: Segment) {
        let _ = seg;
    }
    /// The tree is about to be drained wholesale.
    fn on_vacate(&mut self) {}
}

/// A sorted, coalesced set of non-overlapping half-open intervals over a
/// logical address space.
///
/// The tree fixes its physical segment encoding, quantization and bridging
/// gap at creation. All public offsets and sizes are logical bytes and must
/// be multiples of the block size `1 << shift`, at or above `origin`.
///
/// The tree is single-threaded-safe only; callers serialize access.
pub struct RangeTree {
    store: SegmentStore,
    /// Logical start of the addressable space.
    origin: u64,
    /// Quantization: physical units = logical units >> shift.
    shift: u32,
    /// Maximum distance (logical bytes) still bridged by a merge; 0 disables.
    gap: u64,
    /// Sum of logical segment sizes, bridged gaps included.
    space: u64,
    histogram: SizeHistogram,
    observer: Option<Box<dyn SpaceObserver>>,
    policy: FaultPolicy,
}

impl RangeTree {
    /// Creates an empty tree without gap bridging.
    ///
    /// `shift` must be below 64. Fails with `InvalidArgument` otherwise.
    pub fn new(kind: SegmentKind, origin: u64, shift: u32) -> Result<RangeTree> {
        Self::create(kind, origin, shift, 0)
    }

    /// Creates an empty gap-bridging tree ([`SegmentKind::Gapped64`]).
    ///
    /// `gap` is the maximum logical distance between two segments that still
    /// causes them to be merged; it must be a multiple of `1 << shift`.
    pub fn with_gap(origin: u64, shift: u32, gap: u64) -> Result<RangeTree> {
        Self::create(SegmentKind::Gapped64, origin, shift, gap)
    }

    fn create(kind: SegmentKind, origin: u64, shift: u32, gap: u64) -> Result<RangeTree> {
        verify_arg!(shift, shift < 64);
        verify_arg!(gap, gap == 0 || kind == SegmentKind::Gapped64);
        verify_arg!(gap, gap.trailing_zeros() >= shift || gap == 0);
        Ok(RangeTree {
            store: SegmentStore::new(kind),
            origin,
            shift,
            gap,
            space: 0,
            histogram: SizeHistogram::new(),
            observer: None,
            policy: FaultPolicy::default(),
        })
    }

    /// Builds a tree from ascending, possibly touching or overlapping
    /// logical ranges, coalescing them on the way in.
    pub fn from_ranges(
        kind: SegmentKind,
        origin: u64,
        shift: u32,
        ranges: impl IntoIterator<Item = Range<u64>>,
    ) -> Result<RangeTree> {
        let mut tree = Self::new(kind, origin, shift)?;
        let coalesced = ranges.into_iter().coalesce(|prev, next| {
            debug_assert!(prev.start <= next.start);
            if next.start <= prev.end {
                Ok(prev.start..prev.end.max(next.end))
            } else {
                Err((prev, next))
            }
        });
        for r in coalesced {
            tree.add(r.start, r.end - r.start);
        }
        Ok(tree)
    }

    /// Attaches an observer, firing its `on_create` hook.
    pub fn set_observer(&mut self, mut observer: Box<dyn SpaceObserver>) {
        observer.on_create();
        self.observer = Some(observer);
    }

    pub fn set_fault_policy(&mut self, policy: FaultPolicy) {
        self.policy = policy;
    }

    #[inline]
    pub fn kind(&self) -> SegmentKind {
        self.store.kind()
    }

    #[inline]
    pub fn origin(&self) -> u64 {
        self.origin
    }

    #[inline]
    pub fn shift(&self) -> u32 {
        self.shift
    }

    #[inline]
    pub fn gap(&self) -> u64 {
        self.gap
    }

    /// Sum of logical segment sizes, bridged gaps included.
    #[inline]
    pub fn space(&self) -> u64 {
        self.space
    }

    #[inline]
    pub fn segment_count(&self) -> usize {
        self.store.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// The maintained power-of-two histogram of logical segment sizes.
    #[inline]
    pub fn histogram(&self) -> &[u64; SizeHistogram::BUCKETS] {
        self.histogram.buckets()
    }

    /// Approximate heap bytes held by the segment entries.
    pub fn heap_size_bytes(&self) -> usize {
        self.store.entry_bytes()
    }

    // ---- coordinate space -------------------------------------------------

    #[inline]
    fn block(&self) -> u64 {
        1u64 << self.shift
    }

    #[inline]
    fn gap_phys(&self) -> u64 {
        self.gap >> self.shift
    }

    #[inline]
    fn to_phys(&self, v: u64) -> u64 {
        debug_assert!(v >= self.origin);
        debug_assert!((v - self.origin).is_multiple_of(self.block()));
        (v - self.origin) >> self.shift
    }

    #[inline]
    fn to_logical(&self, p: u64) -> u64 {
        (p << self.shift) + self.origin
    }

    #[inline]
    fn size_to_phys(&self, size: u64) -> u64 {
        debug_assert!(size.is_multiple_of(self.block()));
        size >> self.shift
    }

    // ---- bookkeeping ------------------------------------------------------

    #[cold]
    fn fault(&self, op: &str, detail: fmt::Arguments<'_>) {
        match self.policy {
            FaultPolicy::Panic => panic!("range tree {op}: {detail}"),
            FaultPolicy::Log => log::error!("range tree {op}: {detail}"),
        }
    }

    fn stat_record(&mut self, seg: Segment) {
        self.histogram.record(seg.size() << self.shift);
    }

    fn stat_forget(&mut self, seg: Segment) {
        self.histogram.forget(seg.size() << self.shift);
    }

    fn notify_add(&mut self, seg: Segment) {
        let (origin, shift) = (self.origin, self.shift);
        if let Some(obs) = self.observer.as_mut() {
            obs.on_add(seg.rebase(origin, shift));
        }
    }

    fn notify_remove(&mut self, seg: Segment) {
        let (origin, shift) = (self.origin, self.shift);
        if let Some(obs) = self.observer.as_mut() {
            obs.on_remove(seg.rebase(origin, shift));
        }
    }

    /// Inserts a segment together with its histogram and observer effects.
    fn install(&mut self, seg: Segment) {
        self.store.insert(seg);
        self.stat_record(seg);
        self.notify_add(seg);
    }

    /// Removes a whole segment together with its histogram and observer
    /// effects. Does not touch `space`; callers account for it.
    fn uninstall(&mut self, seg: Segment) {
        self.stat_forget(seg);
        self.notify_remove(seg);
        let removed = self.store.remove(seg.start);
        debug_assert!(removed);
    }

    // ---- add --------------------------------------------------------------

    /// Marks `[start, start + size)` present with `fill == size`.
    ///
    /// Coalesces with touching neighbors; with a non-zero `gap`, neighbors
    /// within `gap` are bridged and the bridged span joins `space()`.
    /// Adding a range already (partially) present is a contract violation
    /// for non-gap trees; gap trees treat full containment as a fill bump
    /// and widen partial overlaps to the union.
    pub fn add(&mut self, start: u64, size: u64) {
        self.add_with_fill(start, size, size);
    }

    /// [`RangeTree::add`] with an explicit initial fill for a fresh segment.
    pub fn add_with_fill(&mut self, start: u64, size: u64, fill: u64) {
        if size == 0 {
            self.fault("add", format_args!("zero-size add (offset={start:#x})"));
            return;
        }
        if fill == 0 || fill > size {
            self.fault(
                "add",
                format_args!("bad fill (offset={start:#x} size={size:#x} fill={fill:#x})"),
            );
            return;
        }
        if !self.kind().tracks_fill() && fill != size {
            self.fault(
                "add",
                format_args!("partial fill on a tree without fill support (fill={fill:#x})"),
            );
            return;
        }
        debug_assert!(start.checked_add(size).is_some());
        let (pstart, psize, pfill) = (
            self.to_phys(start),
            self.size_to_phys(size),
            self.size_to_phys(fill),
        );
        self.add_phys(pstart, pstart + psize, pfill);
    }

    fn add_phys(&mut self, start: u64, end: u64, fill: u64) {
        if let Some(rs) = self.store.overlapping(start, end) {
            if self.gap_phys() == 0 {
                let (ls, le) = (self.to_logical(start), self.to_logical(end));
                self.fault(
                    "add",
                    format_args!("adding existent segment (offset={ls:#x} end={le:#x})"),
                );
                return;
            }
            if rs.contains_range(start, end) {
                // Fill bump: the request lies entirely inside a live segment.
                self.adjust_fill_phys(rs, fill as i64);
                return;
            }
            // Partial overlap: widen to the union of the two and retry, so a
            // single code path handles every overlap shape.
            let old_fill = rs.fill;
            self.uninstall(rs);
            self.space -= rs.size() << self.shift;
            self.add_phys(start.min(rs.start), end.max(rs.end), fill + old_fill);
            return;
        }

        let gap = self.gap_phys();
        let before = self.store.prev_before(start);
        let after = self.store.next_from(start);

        // No overlap was found, so any predecessor ends at or before `start`
        // and any successor starts at or after `end`.
        let merge_before = before.is_some_and(|b| start - b.end <= gap);
        let merge_after = after.is_some_and(|a| a.start - end <= gap);

        let mut bridge = 0;
        if gap != 0 {
            if merge_before {
                bridge += start - before.unwrap().end;
            }
            if merge_after {
                bridge += after.unwrap().start - end;
            }
        }

        let seg = match (merge_before, merge_after) {
            (true, true) => {
                let (b, a) = (before.unwrap(), after.unwrap());
                self.uninstall(b);
                self.uninstall(a);
                Segment::with_fill(b.start, a.end, b.fill + a.fill + fill)
            }
            (true, false) => {
                let b = before.unwrap();
                self.uninstall(b);
                Segment::with_fill(b.start, end, b.fill + fill)
            }
            (false, true) => {
                let a = after.unwrap();
                self.uninstall(a);
                Segment::with_fill(start, a.end, a.fill + fill)
            }
            (false, false) => Segment::with_fill(start, end, fill),
        };
        debug_assert!(seg.fill <= seg.size());
        debug_assert!(gap != 0 || seg.is_saturated());
        self.install(seg);
        self.space += (end - start + bridge) << self.shift;
    }

    // ---- remove -----------------------------------------------------------

    /// Unmarks `[start, start + size)`, which must lie entirely within a
    /// single live segment. Trims or splits that segment as needed.
    ///
    /// A request over a region that is not present is a double free: it is
    /// diagnosed through the fault policy and otherwise a no-op. For gap
    /// trees, a bridged segment (`fill < size`) can only be removed whole;
    /// there is no partial un-bridging.
    pub fn remove(&mut self, start: u64, size: u64) {
        self.remove_impl(start, size, false);
    }

    /// Fill-aware removal for gap trees.
    ///
    /// Removing less than the covering segment's fill is a pure fill
    /// decrement with no structural change. Removing exactly the remaining
    /// fill deletes the entire bridged segment, whatever its span. On
    /// non-gap trees this behaves like [`RangeTree::remove`].
    pub fn remove_fill(&mut self, start: u64, size: u64) {
        self.remove_impl(start, size, true);
    }

    /// Removes whatever portions of `[start, start + size)` are present.
    ///
    /// Tolerant counterpart of [`RangeTree::remove`]: absence and partial
    /// overlap are not faults, and the window may cross any number of
    /// segments and holes. A zero-size window is a no-op.
    ///
    /// Removal can shrink or split the matched segment, so the container is
    /// re-probed after each step rather than traversed.
    pub fn clear_range(&mut self, start: u64, size: u64) {
        if size == 0 {
            return;
        }
        let end = start + size;
        let mut cursor = start;
        while cursor < end {
            let Some(rs) = self.first_overlapping_or_after(cursor) else {
                return;
            };
            if rs.start >= end {
                return;
            }
            let ostart = rs.start.max(cursor);
            let oend = rs.end.min(end);
            self.remove(ostart, oend - ostart);
            cursor = oend;
        }
    }

    fn remove_impl(&mut self, start: u64, size: u64, do_fill: bool) {
        if size == 0 {
            self.fault("remove", format_args!("zero-size remove (offset={start:#x})"));
            return;
        }
        if size > self.space {
            self.fault(
                "remove",
                format_args!(
                    "removing more than is present (size={size:#x} space={:#x})",
                    self.space
                ),
            );
            return;
        }
        debug_assert!(start.checked_add(size).is_some());
        let (pstart, psize) = (self.to_phys(start), self.size_to_phys(size));
        self.remove_phys(pstart, pstart + psize, do_fill);
    }

    fn remove_phys(&mut self, mut start: u64, mut end: u64, do_fill: bool) {
        let size = end - start;
        let Some(rs) = self.store.overlapping(start, end) else {
            let (ls, le) = (self.to_logical(start), self.to_logical(end));
            self.fault(
                "remove",
                format_args!("removing nonexistent segment (offset={ls:#x} end={le:#x})"),
            );
            return;
        };

        if self.gap_phys() != 0 {
            if do_fill {
                if rs.fill == size {
                    // The request consumes the remaining fill: the entire
                    // bridged segment goes, whatever its span.
                    start = rs.start;
                    end = rs.end;
                } else {
                    self.adjust_fill_phys(rs, -(size as i64));
                    return;
                }
            } else if !rs.is_saturated() && !(start == rs.start && end == rs.end) {
                let (ls, le) = (self.to_logical(start), self.to_logical(end));
                self.fault(
                    "remove",
                    format_args!(
                        "partial removal of a bridged segment (offset={ls:#x} end={le:#x})"
                    ),
                );
                return;
            }
        }

        if !rs.contains_range(start, end) {
            let (ls, le) = (self.to_logical(start), self.to_logical(end));
            self.fault(
                "remove",
                format_args!(
                    "removing partially present segment (offset={ls:#x} end={le:#x})"
                ),
            );
            return;
        }

        let left_over = rs.start != start;
        let right_over = rs.end != end;

        self.uninstall(rs);
        // Survivors of a trim or split are fully populated by construction:
        // only saturated segments can be partially removed.
        if left_over {
            self.install(Segment::new(rs.start, start));
        }
        if right_over {
            self.install(Segment::new(end, rs.end));
        }
        self.space -= (end - start) << self.shift;
    }

    // ---- fill and resize --------------------------------------------------

    /// Adjusts the fill count of a live segment by `delta` logical bytes.
    ///
    /// `seg` is a value handle previously returned by [`RangeTree::find`] or
    /// iteration; a stale handle is a contract violation.
    pub fn adjust_fill(&mut self, seg: Segment, delta: i64) {
        if !self.kind().tracks_fill() {
            self.fault("adjust_fill", format_args!("tree does not track fill"));
            return;
        }
        let Some(rs) = self.resolve(seg) else {
            self.fault(
                "adjust_fill",
                format_args!("stale segment handle (offset={:#x})", seg.start),
            );
            return;
        };
        debug_assert!(delta.unsigned_abs().is_multiple_of(self.block()));
        let mag = (delta.unsigned_abs() >> self.shift) as i64;
        self.adjust_fill_phys(rs, if delta < 0 { -mag } else { mag });
    }

    fn adjust_fill_phys(&mut self, rs: Segment, delta: i64) {
        let fill = rs.fill as i64 + delta;
        if fill <= 0 || fill > rs.size() as i64 {
            let ls = self.to_logical(rs.start);
            self.fault(
                "adjust_fill",
                format_args!(
                    "fill out of bounds (offset={ls:#x} fill={:#x} delta={delta:#x})",
                    rs.fill << self.shift
                ),
            );
            return;
        }
        self.store.set_fill(rs.start, fill as u64);
    }

    /// Moves a live segment to `[new_start, new_start + new_size)` in place,
    /// without a remove+add round trip.
    ///
    /// Used for monotonic extension of a known segment, where the
    /// overlap-merge generality of [`RangeTree::add`] is unnecessary. The
    /// new range must not collide with any other segment; no coalescing is
    /// performed. The fill count carries over on gap trees.
    pub fn resize_segment(&mut self, seg: Segment, new_start: u64, new_size: u64) {
        if new_size == 0 {
            self.fault("resize", format_args!("zero-size resize (offset={new_start:#x})"));
            return;
        }
        let Some(rs) = self.resolve(seg) else {
            self.fault(
                "resize",
                format_args!("stale segment handle (offset={:#x})", seg.start),
            );
            return;
        };
        let (nstart, nsize) = (self.to_phys(new_start), self.size_to_phys(new_size));
        let nend = nstart + nsize;

        self.uninstall(rs);
        debug_assert!(self.store.overlapping(nstart, nend).is_none());
        let nseg = if self.kind().tracks_fill() {
            Segment::with_fill(nstart, nend, rs.fill.min(nsize))
        } else {
            Segment::new(nstart, nend)
        };
        self.install(nseg);
        self.space = self.space - (rs.size() << self.shift) + new_size;
    }

    /// Re-resolves a logical segment handle against the store.
    fn resolve(&self, seg: Segment) -> Option<Segment> {
        let pstart = self.to_phys(seg.start);
        self.store
            .get(pstart)
            .filter(|rs| rs.end == self.to_phys(seg.end))
    }

    // ---- queries ----------------------------------------------------------

    /// Returns the segment fully containing `[start, start + size)`, if any.
    pub fn find(&self, start: u64, size: u64) -> Option<Segment> {
        assert_ne!(size, 0);
        let (pstart, psize) = (self.to_phys(start), self.size_to_phys(size));
        self.store
            .overlapping(pstart, pstart + psize)
            .filter(|rs| rs.contains_range(pstart, pstart + psize))
            .map(|rs| rs.rebase(self.origin, self.shift))
    }

    /// Whether `[start, start + size)` lies entirely within one segment.
    pub fn contains(&self, start: u64, size: u64) -> bool {
        self.find(start, size).is_some()
    }

    /// Returns the first sub-range of `[start, start + size)` that
    /// intersects the tree, as `(ostart, osize)`.
    pub fn find_in(&self, start: u64, size: u64) -> Option<(u64, u64)> {
        assert_ne!(size, 0);
        let (pstart, psize) = (self.to_phys(start), self.size_to_phys(size));
        let pend = pstart + psize;
        let rs = self
            .store
            .overlapping(pstart, pstart + 1)
            .or_else(|| self.store.next_from(pstart))?;
        if rs.start >= pend {
            return None;
        }
        let ostart = rs.start.max(pstart);
        let oend = rs.end.min(pend);
        Some((self.to_logical(ostart), (oend - ostart) << self.shift))
    }

    /// Asserts that no part of `[start, start + size)` is present.
    ///
    /// Debug aid; panics unconditionally on overlap, regardless of the
    /// fault policy.
    pub fn verify_not_present(&self, start: u64, size: u64) {
        assert_ne!(size, 0);
        let (pstart, psize) = (self.to_phys(start), self.size_to_phys(size));
        if let Some(rs) = self.store.overlapping(pstart, pstart + psize) {
            let rs = rs.rebase(self.origin, self.shift);
            panic!(
                "segment [{:#x}, {:#x}) is not absent (overlaps [{:#x}, {:#x}))",
                start,
                start + size,
                rs.start,
                rs.end
            );
        }
    }

    /// First sub-range of the tree overlapping or following `start`.
    pub(crate) fn first_overlapping_or_after(&self, start: u64) -> Option<Segment> {
        let pstart = self.to_phys(start);
        self.store
            .overlapping(pstart, pstart + 1)
            .or_else(|| self.store.next_from(pstart))
            .map(|rs| rs.rebase(self.origin, self.shift))
    }

    /// Smallest covered logical offset, if any.
    pub fn min(&self) -> Option<u64> {
        self.store.first().map(|rs| self.to_logical(rs.start))
    }

    /// Largest covered logical offset (exclusive), if any.
    pub fn max(&self) -> Option<u64> {
        self.store.last().map(|rs| self.to_logical(rs.end))
    }

    /// Distance between the smallest and largest covered offsets.
    pub fn span(&self) -> u64 {
        match (self.min(), self.max()) {
            (Some(lo), Some(hi)) => hi - lo,
            _ => 0,
        }
    }

    /// Lazy, ordered, non-destructive enumeration of all segments in
    /// logical byte coordinates.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            inner: self.store.iter(),
            origin: self.origin,
            shift: self.shift,
        }
    }

    /// Calls `f(start, size)` for every segment, ascending by start.
    pub fn walk(&self, mut f: impl FnMut(u64, u64)) {
        for seg in self.iter() {
            f(seg.start, seg.size());
        }
    }

    // ---- bulk -------------------------------------------------------------

    /// Drains every segment, streaming each to `f` before discarding.
    ///
    /// Enumeration order is unspecified; segments are destroyed
    /// back-to-front for container efficiency. Fires `on_vacate` once,
    /// then resets histogram and space.
    pub fn vacate(&mut self, mut f: impl FnMut(u64, u64)) {
        if let Some(obs) = self.observer.as_mut() {
            obs.on_vacate();
        }
        while let Some(rs) = self.store.last() {
            self.store.remove(rs.start);
            let seg = rs.rebase(self.origin, self.shift);
            f(seg.start, seg.size());
        }
        self.histogram.clear();
        self.space = 0;
    }

    /// [`RangeTree::vacate`] without the per-segment callback; skips
    /// segment enumeration entirely.
    pub fn clear(&mut self) {
        if let Some(obs) = self.observer.as_mut() {
            obs.on_vacate();
        }
        self.store.clear();
        self.histogram.clear();
        self.space = 0;
    }

    /// Exchanges the entire state of two trees in O(1).
    ///
    /// `other` must be empty; swapping into a populated tree is a contract
    /// violation (diagnosed, then a no-op).
    pub fn swap(&mut self, other: &mut RangeTree) {
        if other.space != 0 || !other.store.is_empty() {
            self.fault(
                "swap",
                format_args!("swap destination is not empty (space={:#x})", other.space),
            );
            return;
        }
        std::mem::swap(self, other);
    }

    /// Tears the tree down, firing `on_destroy`.
    ///
    /// The tree must be logically empty (`space() == 0`).
    pub fn destroy(mut self) {
        if !self.is_empty() || self.space != 0 {
            self.fault(
                "destroy",
                format_args!("destroying non-empty tree (space={:#x})", self.space),
            );
        }
        if let Some(obs) = self.observer.as_mut() {
            obs.on_destroy();
        }
    }

    // ---- verification -----------------------------------------------------

    /// Recomputes every maintained invariant from the backing container and
    /// asserts that it matches the tracked state. O(n); test and debug aid.
    pub fn check_invariants(&self) {
        let mut prev: Option<Segment> = None;
        let mut space = 0u64;
        let mut histogram = SizeHistogram::new();
        for rs in self.store.iter() {
            assert!(rs.start < rs.end, "segment bounds: {rs:?}");
            assert!(
                rs.fill > 0 && rs.fill <= rs.size(),
                "segment fill: {rs:?}"
            );
            if !self.kind().tracks_fill() {
                assert!(rs.is_saturated(), "unsaturated segment: {rs:?}");
            }
            if let Some(p) = prev {
                assert!(
                    p.end <= rs.start,
                    "segments must be sorted and disjoint: prev={p:?}, next={rs:?}"
                );
            }
            space += rs.size() << self.shift;
            histogram.record(rs.size() << self.shift);
            prev = Some(rs);
        }
        assert_eq!(space, self.space, "space accounting drift");
        assert_eq!(histogram, self.histogram, "histogram drift");
        assert_eq!(histogram.count_segments() as usize, self.store.len());
    }
}

impl fmt::Debug for RangeTree {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RangeTree")
            .field("kind", &self.kind())
            .field("origin", &self.origin)
            .field("shift", &self.shift)
            .field("gap", &self.gap)
            .field("space", &self.space)
            .field("segments", &self.store.len())
            .finish()
    }
}

/// Ascending iterator over the tree's segments in logical byte coordinates.
pub struct Iter<'a> {
    inner: SegmentIter<'a>,
    origin: u64,
    shift: u32,
}

impl Iterator for Iter<'_> {
    type Item = Segment;

    #[inline]
    fn next(&mut self) -> Option<Segment> {
        self.inner.next().map(|rs| rs.rebase(self.origin, self.shift))
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl DoubleEndedIterator for Iter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Segment> {
        self.inner
            .next_back()
            .map(|rs| rs.rebase(self.origin, self.shift))
    }
}

impl ExactSizeIterator for Iter<'_> {}

impl std::iter::FusedIterator for Iter<'_> {}
