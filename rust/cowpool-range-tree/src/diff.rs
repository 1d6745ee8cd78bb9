//! Set-difference primitive used to diff two trees.
//!
//! Incremental rebuild planning keeps a "desired state" tree and an
//! "actual state" tree; diffing them with [`remove_xor_add`] produces the
//! minimal set of structural changes: overlap already accounted for is
//! carved out of one tree, while the unaccounted remainder lands in
//! another.

use crate::tree::RangeTree;

/// For the single input range `[start, end)`: deletes whatever portion of
/// it overlaps `removefrom` out of `removefrom`, and adds the remainder to
/// `addto`.
///
/// `removefrom` is re-probed after every partial removal, since removal can
/// shrink or split the matched segment out from under a traversal cursor.
/// All offsets are logical bytes and must respect the quantization of both
/// trees.
pub fn remove_xor_add_segment(
    mut start: u64,
    end: u64,
    removefrom: &mut RangeTree,
    addto: &mut RangeTree,
) {
    while start != end {
        debug_assert!(start < end);
        let Some(curr) = removefrom.first_overlapping_or_after(start) else {
            addto.add(start, end - start);
            return;
        };
        if end <= curr.start {
            // No overlap with anything at or beyond `start`.
            addto.add(start, end - start);
            return;
        }

        let overlap_start = curr.start.max(start);
        let overlap_end = curr.end.min(end);
        debug_assert!(overlap_start < overlap_end);

        removefrom.remove(overlap_start, overlap_end - overlap_start);
        if start < overlap_start {
            addto.add(start, overlap_start - start);
        }
        start = overlap_end;
    }
}

/// Applies [`remove_xor_add_segment`] for every segment of `tree`.
///
/// Afterwards, `removefrom` has lost its intersection with `tree` and
/// `addto` has gained everything in `tree` that `removefrom` did not cover.
pub fn remove_xor_add(tree: &RangeTree, removefrom: &mut RangeTree, addto: &mut RangeTree) {
    for seg in tree.iter() {
        remove_xor_add_segment(seg.start, seg.end, removefrom, addto);
    }
}
