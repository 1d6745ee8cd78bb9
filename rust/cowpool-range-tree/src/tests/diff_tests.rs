use crate::diff::{remove_xor_add, remove_xor_add_segment};
use crate::segment::SegmentKind;
use crate::tree::{FaultPolicy, RangeTree};

fn tree_of(ranges: &[(u64, u64)]) -> RangeTree {
    let mut t = RangeTree::new(SegmentKind::Wide64, 0, 0).unwrap();
    t.set_fault_policy(FaultPolicy::Panic);
    for &(start, end) in ranges {
        t.add(start, end - start);
    }
    t
}

fn ranges(t: &RangeTree) -> Vec<(u64, u64)> {
    t.iter().map(|s| (s.start, s.end)).collect()
}

#[test]
fn test_carve_out_intersection() {
    let a = tree_of(&[(0, 50)]);
    let mut b = tree_of(&[(20, 30)]);
    let mut c = tree_of(&[]);

    remove_xor_add(&a, &mut b, &mut c);
    assert!(b.is_empty());
    assert_eq!(ranges(&c), vec![(0, 20), (30, 50)]);
    b.check_invariants();
    c.check_invariants();
}

#[test]
fn test_no_overlap_moves_everything() {
    let a = tree_of(&[(0, 10), (40, 60)]);
    let mut b = tree_of(&[(100, 120)]);
    let mut c = tree_of(&[]);

    remove_xor_add(&a, &mut b, &mut c);
    assert_eq!(ranges(&b), vec![(100, 120)]);
    assert_eq!(ranges(&c), vec![(0, 10), (40, 60)]);
}

#[test]
fn test_fully_covered_input_yields_nothing() {
    let a = tree_of(&[(10, 20)]);
    let mut b = tree_of(&[(0, 50)]);
    let mut c = tree_of(&[]);

    remove_xor_add(&a, &mut b, &mut c);
    assert_eq!(ranges(&b), vec![(0, 10), (20, 50)]);
    assert!(c.is_empty());
}

#[test]
fn test_multiple_holes_re_probe() {
    // Removal shrinks segments out from under the traversal; every
    // iteration must re-probe the container.
    let mut b = tree_of(&[(10, 20), (40, 50), (90, 95)]);
    let mut c = tree_of(&[]);

    remove_xor_add_segment(0, 100, &mut b, &mut c);
    assert!(b.is_empty());
    assert_eq!(ranges(&c), vec![(0, 10), (20, 40), (50, 90), (95, 100)]);
    c.check_invariants();
}

#[test]
fn test_partial_segment_overlaps() {
    // B's segments poke out of the input range on both sides.
    let mut b = tree_of(&[(0, 15), (45, 60)]);
    let mut c = tree_of(&[]);

    remove_xor_add_segment(10, 50, &mut b, &mut c);
    assert_eq!(ranges(&b), vec![(0, 10), (50, 60)]);
    assert_eq!(ranges(&c), vec![(15, 45)]);
    b.check_invariants();
    c.check_invariants();
}

#[test]
fn test_whole_tree_diff() {
    let a = tree_of(&[(0, 30), (50, 80), (200, 210)]);
    let mut b = tree_of(&[(25, 55), (70, 100)]);
    let mut c = tree_of(&[]);

    remove_xor_add(&a, &mut b, &mut c);
    assert_eq!(ranges(&b), vec![(30, 50), (80, 100)]);
    assert_eq!(ranges(&c), vec![(0, 25), (55, 70), (200, 210)]);
    b.check_invariants();
    c.check_invariants();
}

#[test]
fn test_empty_input_range_is_noop() {
    let a = tree_of(&[]);
    let mut b = tree_of(&[(0, 10)]);
    let mut c = tree_of(&[]);

    remove_xor_add(&a, &mut b, &mut c);
    assert_eq!(ranges(&b), vec![(0, 10)]);
    assert!(c.is_empty());
}
