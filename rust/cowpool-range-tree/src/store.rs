//! Ordered backing container for the tree's segments.
//!
//! Segments are kept in a `std::collections::BTreeMap` keyed by quantized
//! start offset, wrapped in one store type per physical encoding:
//! - [`NarrowStore`]: `u32` keys and bounds, 8 bytes per entry payload.
//! - [`WideStore`]: `u64` keys and bounds.
//! - [`GappedStore`]: `u64` bounds plus an explicit per-segment fill.
//!
//! [`SegmentStore`] dispatches over the three encodings so the mutation and
//! query algorithms are written once against a uniform `u64` surface.
//!
//! All offsets at this layer are quantized physical units; the tree converts
//! to and from logical byte coordinates at its public boundary. Lookups
//! return [`Segment`] value copies, never references: any structural
//! mutation invalidates prior results, and callers re-resolve by key.

use std::collections::{BTreeMap, btree_map};

use crate::segment::{Segment, SegmentKind};

const NARROW_LIMIT: u64 = u32::MAX as u64;

/// Segment store with 32-bit quantized offsets.
#[derive(Debug, Clone, Default)]
pub struct NarrowStore(BTreeMap<u32, u32>);

/// Segment store with 64-bit quantized offsets.
#[derive(Debug, Clone, Default)]
pub struct WideStore(BTreeMap<u64, u64>);

/// Value half of a [`GappedStore`] entry.
#[derive(Debug, Clone, Copy)]
struct GappedSlot {
    end: u64,
    fill: u64,
}

/// Segment store with 64-bit quantized offsets and per-segment fill counts.
#[derive(Debug, Clone, Default)]
pub struct GappedStore(BTreeMap<u64, GappedSlot>);

impl NarrowStore {
    fn first(&self) -> Option<Segment> {
        self.0
            .first_key_value()
            .map(|(&s, &e)| Segment::new(s as u64, e as u64))
    }

    fn last(&self) -> Option<Segment> {
        self.0
            .last_key_value()
            .map(|(&s, &e)| Segment::new(s as u64, e as u64))
    }

    fn prev_before(&self, start: u64) -> Option<Segment> {
        if start > NARROW_LIMIT {
            return self.last();
        }
        self.0
            .range(..start as u32)
            .next_back()
            .map(|(&s, &e)| Segment::new(s as u64, e as u64))
    }

    fn next_from(&self, start: u64) -> Option<Segment> {
        if start > NARROW_LIMIT {
            return None;
        }
        self.0
            .range(start as u32..)
            .next()
            .map(|(&s, &e)| Segment::new(s as u64, e as u64))
    }

    fn get(&self, start: u64) -> Option<Segment> {
        if start > NARROW_LIMIT {
            return None;
        }
        self.0
            .get(&(start as u32))
            .map(|&e| Segment::new(start, e as u64))
    }

    fn insert(&mut self, seg: Segment) {
        debug_assert!(seg.start <= NARROW_LIMIT && seg.end <= NARROW_LIMIT);
        debug_assert!(seg.is_saturated());
        let prev = self.0.insert(seg.start as u32, seg.end as u32);
        debug_assert!(prev.is_none());
    }

    fn remove(&mut self, start: u64) -> bool {
        start <= NARROW_LIMIT && self.0.remove(&(start as u32)).is_some()
    }
}

impl WideStore {
    fn first(&self) -> Option<Segment> {
        self.0.first_key_value().map(|(&s, &e)| Segment::new(s, e))
    }

    fn last(&self) -> Option<Segment> {
        self.0.last_key_value().map(|(&s, &e)| Segment::new(s, e))
    }

    fn prev_before(&self, start: u64) -> Option<Segment> {
        self.0
            .range(..start)
            .next_back()
            .map(|(&s, &e)| Segment::new(s, e))
    }

    fn next_from(&self, start: u64) -> Option<Segment> {
        self.0.range(start..).next().map(|(&s, &e)| Segment::new(s, e))
    }

    fn get(&self, start: u64) -> Option<Segment> {
        self.0.get(&start).map(|&e| Segment::new(start, e))
    }

    fn insert(&mut self, seg: Segment) {
        debug_assert!(seg.is_saturated());
        let prev = self.0.insert(seg.start, seg.end);
        debug_assert!(prev.is_none());
    }

    fn remove(&mut self, start: u64) -> bool {
        self.0.remove(&start).is_some()
    }
}

impl GappedStore {
    fn first(&self) -> Option<Segment> {
        self.0
            .first_key_value()
            .map(|(&s, v)| Segment::with_fill(s, v.end, v.fill))
    }

    fn last(&self) -> Option<Segment> {
        self.0
            .last_key_value()
            .map(|(&s, v)| Segment::with_fill(s, v.end, v.fill))
    }

    fn prev_before(&self, start: u64) -> Option<Segment> {
        self.0
            .range(..start)
            .next_back()
            .map(|(&s, v)| Segment::with_fill(s, v.end, v.fill))
    }

    fn next_from(&self, start: u64) -> Option<Segment> {
        self.0
            .range(start..)
            .next()
            .map(|(&s, v)| Segment::with_fill(s, v.end, v.fill))
    }

    fn get(&self, start: u64) -> Option<Segment> {
        self.0
            .get(&start)
            .map(|v| Segment::with_fill(start, v.end, v.fill))
    }

    fn insert(&mut self, seg: Segment) {
        debug_assert!(seg.fill > 0 && seg.fill <= seg.size());
        let prev = self.0.insert(
            seg.start,
            GappedSlot {
                end: seg.end,
                fill: seg.fill,
            },
        );
        debug_assert!(prev.is_none());
    }

    fn remove(&mut self, start: u64) -> bool {
        self.0.remove(&start).is_some()
    }

    fn set_fill(&mut self, start: u64, fill: u64) {
        let slot = self.0.get_mut(&start).expect("segment present");
        debug_assert!(fill > 0 && fill <= slot.end - start);
        slot.fill = fill;
    }
}

/// The ordered backing container of one tree, dispatching over the physical
/// segment encodings.
///
/// Offers point/range lookup, insert, removal by key, predecessor/successor
/// traversal, first/last and bulk clear in logarithmic time, with stable
/// ascending iteration. Owned exclusively by its tree.
#[derive(Debug, Clone)]
pub enum SegmentStore {
    Narrow(NarrowStore),
    Wide(WideStore),
    Gapped(GappedStore),
}

impl SegmentStore {
    pub fn new(kind: SegmentKind) -> SegmentStore {
        match kind {
            SegmentKind::Narrow32 => SegmentStore::Narrow(NarrowStore::default()),
            SegmentKind::Wide64 => SegmentStore::Wide(WideStore::default()),
            SegmentKind::Gapped64 => SegmentStore::Gapped(GappedStore::default()),
        }
    }

    pub fn kind(&self) -> SegmentKind {
        match self {
            SegmentStore::Narrow(_) => SegmentKind::Narrow32,
            SegmentStore::Wide(_) => SegmentKind::Wide64,
            SegmentStore::Gapped(_) => SegmentKind::Gapped64,
        }
    }

    pub fn len(&self) -> usize {
        match self {
            SegmentStore::Narrow(s) => s.0.len(),
            SegmentStore::Wide(s) => s.0.len(),
            SegmentStore::Gapped(s) => s.0.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn clear(&mut self) {
        match self {
            SegmentStore::Narrow(s) => s.0.clear(),
            SegmentStore::Wide(s) => s.0.clear(),
            SegmentStore::Gapped(s) => s.0.clear(),
        }
    }

    pub fn first(&self) -> Option<Segment> {
        match self {
            SegmentStore::Narrow(s) => s.first(),
            SegmentStore::Wide(s) => s.first(),
            SegmentStore::Gapped(s) => s.first(),
        }
    }

    pub fn last(&self) -> Option<Segment> {
        match self {
            SegmentStore::Narrow(s) => s.last(),
            SegmentStore::Wide(s) => s.last(),
            SegmentStore::Gapped(s) => s.last(),
        }
    }

    /// Returns the last segment whose start lies strictly before `start`.
    pub fn prev_before(&self, start: u64) -> Option<Segment> {
        match self {
            SegmentStore::Narrow(s) => s.prev_before(start),
            SegmentStore::Wide(s) => s.prev_before(start),
            SegmentStore::Gapped(s) => s.prev_before(start),
        }
    }

    /// Returns the first segment whose start is at or after `start`.
    pub fn next_from(&self, start: u64) -> Option<Segment> {
        match self {
            SegmentStore::Narrow(s) => s.next_from(start),
            SegmentStore::Wide(s) => s.next_from(start),
            SegmentStore::Gapped(s) => s.next_from(start),
        }
    }

    /// Returns a segment intersecting `[start, end)`, if any.
    ///
    /// Because stored segments are pairwise disjoint, the only candidate is
    /// the last segment starting before `end`; when the query window spans
    /// several segments this returns the last of them.
    pub fn overlapping(&self, start: u64, end: u64) -> Option<Segment> {
        debug_assert!(start < end);
        self.prev_before(end).filter(|seg| seg.end > start)
    }

    /// Returns the segment keyed exactly at `start`, if present.
    pub fn get(&self, start: u64) -> Option<Segment> {
        match self {
            SegmentStore::Narrow(s) => s.get(start),
            SegmentStore::Wide(s) => s.get(start),
            SegmentStore::Gapped(s) => s.get(start),
        }
    }

    /// Inserts a segment that must not collide with an existing key.
    pub fn insert(&mut self, seg: Segment) {
        match self {
            SegmentStore::Narrow(s) => s.insert(seg),
            SegmentStore::Wide(s) => s.insert(seg),
            SegmentStore::Gapped(s) => s.insert(seg),
        }
    }

    /// Removes the segment keyed at `start`; returns whether it was present.
    pub fn remove(&mut self, start: u64) -> bool {
        match self {
            SegmentStore::Narrow(s) => s.remove(start),
            SegmentStore::Wide(s) => s.remove(start),
            SegmentStore::Gapped(s) => s.remove(start),
        }
    }

    /// Rewrites the fill count of the segment keyed at `start`.
    ///
    /// Only the gapped encoding stores fill; for the others the value must
    /// equal the segment size (checked in debug builds).
    pub fn set_fill(&mut self, start: u64, fill: u64) {
        if let SegmentStore::Gapped(s) = self {
            s.set_fill(start, fill);
        } else {
            debug_assert_eq!(
                self.get(start).map(|seg| seg.size()),
                Some(fill),
                "fill rewrite on an encoding without fill storage"
            );
        }
    }

    /// Ascending iteration over all segments.
    pub fn iter(&self) -> SegmentIter<'_> {
        SegmentIter(match self {
            SegmentStore::Narrow(s) => IterInner::Narrow(s.0.iter()),
            SegmentStore::Wide(s) => IterInner::Wide(s.0.iter()),
            SegmentStore::Gapped(s) => IterInner::Gapped(s.0.iter()),
        })
    }

    /// Approximate heap payload of the stored entries, ignoring node-level
    /// overhead of the container itself.
    pub fn entry_bytes(&self) -> usize {
        let per_entry = match self {
            SegmentStore::Narrow(_) => size_of::<(u32, u32)>(),
            SegmentStore::Wide(_) => size_of::<(u64, u64)>(),
            SegmentStore::Gapped(_) => size_of::<(u64, GappedSlot)>(),
        };
        self.len() * per_entry
    }
}

/// Ascending iterator over the segments of a [`SegmentStore`], in quantized
/// physical units.
pub struct SegmentIter<'a>(IterInner<'a>);

enum IterInner<'a> {
    Narrow(btree_map::Iter<'a, u32, u32>),
    Wide(btree_map::Iter<'a, u64, u64>),
    Gapped(btree_map::Iter<'a, u64, GappedSlot>),
}

impl Iterator for SegmentIter<'_> {
    type Item = Segment;

    #[inline]
    fn next(&mut self) -> Option<Segment> {
        match &mut self.0 {
            IterInner::Narrow(it) => it.next().map(|(&s, &e)| Segment::new(s as u64, e as u64)),
            IterInner::Wide(it) => it.next().map(|(&s, &e)| Segment::new(s, e)),
            IterInner::Gapped(it) => it.next().map(|(&s, v)| Segment::with_fill(s, v.end, v.fill)),
        }
    }

    #[inline]
    fn size_hint(&self) -> (usize, Option<usize>) {
        match &self.0 {
            IterInner::Narrow(it) => it.size_hint(),
            IterInner::Wide(it) => it.size_hint(),
            IterInner::Gapped(it) => it.size_hint(),
        }
    }
}

impl DoubleEndedIterator for SegmentIter<'_> {
    #[inline]
    fn next_back(&mut self) -> Option<Segment> {
        match &mut self.0 {
            IterInner::Narrow(it) => {
                it.next_back().map(|(&s, &e)| Segment::new(s as u64, e as u64))
            }
            IterInner::Wide(it) => it.next_back().map(|(&s, &e)| Segment::new(s, e)),
            IterInner::Gapped(it) => it
                .next_back()
                .map(|(&s, v)| Segment::with_fill(s, v.end, v.fill)),
        }
    }
}

impl ExactSizeIterator for SegmentIter<'_> {}

impl std::iter::FusedIterator for SegmentIter<'_> {}
