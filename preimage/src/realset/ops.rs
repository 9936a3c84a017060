//! Set operations over normalized interval lists

use super::{Bound, Interval, RealSet};
use crate::number::Real;
use num_rational::BigRational;
use std::cmp::Ordering;

pub fn value_within(v: &Real, min: &Bound, max: &Bound) -> bool {
    let ge_min = match min {
        Bound::Unbounded => true,
        Bound::Inclusive(m) => v >= m,
        Bound::Exclusive(m) => v > m,
    };
    let le_max = match max {
        Bound::Unbounded => true,
        Bound::Inclusive(m) => v <= m,
        Bound::Exclusive(m) => v < m,
    };
    ge_min && le_max
}

/// True when no point satisfies both bounds
pub fn bounds_contradict(min: &Bound, max: &Bound) -> bool {
    use Bound as B;
    match (min, max) {
        (B::Unbounded, _) | (_, B::Unbounded) => false,
        (B::Inclusive(a), B::Inclusive(b)) => a > b,
        (B::Inclusive(a), B::Exclusive(b)) => a >= b,
        (B::Exclusive(a), B::Inclusive(b)) => a >= b,
        (B::Exclusive(a), B::Exclusive(b)) => a >= b,
    }
}

/// Order lower bounds: `-∞` first, and `[v` before `(v`
pub fn compare_min(a: &Bound, b: &Bound) -> Ordering {
    use Bound as B;
    match (a, b) {
        (B::Unbounded, B::Unbounded) => Ordering::Equal,
        (B::Unbounded, _) => Ordering::Less,
        (_, B::Unbounded) => Ordering::Greater,
        (B::Inclusive(v1), B::Inclusive(v2)) | (B::Exclusive(v1), B::Exclusive(v2)) => v1.cmp(v2),
        (B::Inclusive(v1), B::Exclusive(v2)) => v1.cmp(v2).then(Ordering::Less),
        (B::Exclusive(v1), B::Inclusive(v2)) => v1.cmp(v2).then(Ordering::Greater),
    }
}

/// Order upper bounds: `+∞` last, and `v)` before `v]`
pub fn compare_max(a: &Bound, b: &Bound) -> Ordering {
    use Bound as B;
    match (a, b) {
        (B::Unbounded, B::Unbounded) => Ordering::Equal,
        (B::Unbounded, _) => Ordering::Greater,
        (_, B::Unbounded) => Ordering::Less,
        (B::Inclusive(v1), B::Inclusive(v2)) | (B::Exclusive(v1), B::Exclusive(v2)) => v1.cmp(v2),
        (B::Inclusive(v1), B::Exclusive(v2)) => v1.cmp(v2).then(Ordering::Greater),
        (B::Exclusive(v1), B::Inclusive(v2)) => v1.cmp(v2).then(Ordering::Less),
    }
}

/// Whether an interval ending at `max` overlaps or touches one starting at `min`
///
/// Touching at a shared point merges when either side contains that point.
fn adjacent_or_overlap(max: &Bound, min: &Bound) -> bool {
    use Bound as B;
    match (max, min) {
        (B::Unbounded, _) | (_, B::Unbounded) => true,
        (B::Inclusive(v1), B::Inclusive(v2))
        | (B::Inclusive(v1), B::Exclusive(v2))
        | (B::Exclusive(v1), B::Inclusive(v2)) => v1 >= v2,
        (B::Exclusive(v1), B::Exclusive(v2)) => v1 > v2,
    }
}

/// Total-order key for lower bounds: `-∞` first, and `[v` before `(v`
///
/// `compare_min` is not transitive for endpoints closer than the separation
/// precision, so sorting goes through rational keys instead.
fn min_sort_key(bound: &Bound) -> (Option<BigRational>, bool) {
    match bound {
        Bound::Unbounded => (None, false),
        Bound::Inclusive(v) => (Some(v.sort_key()), false),
        Bound::Exclusive(v) => (Some(v.sort_key()), true),
    }
}

/// Sort and merge into the canonical disjoint form
pub fn merge_intervals(mut intervals: Vec<Interval>) -> Vec<Interval> {
    if intervals.len() <= 1 {
        return intervals;
    }
    intervals.sort_by_cached_key(|interval| min_sort_key(&interval.min));

    let mut merged: Vec<Interval> = Vec::with_capacity(intervals.len());
    let mut iter = intervals.into_iter();
    let Some(mut current) = iter.next() else {
        return merged;
    };
    for next in iter {
        if adjacent_or_overlap(&current.max, &next.min) {
            if compare_max(&next.max, &current.max) == Ordering::Greater {
                current.max = next.max;
            }
        } else {
            merged.push(current);
            current = next;
        }
    }
    merged.push(current);
    merged
}

pub fn union(a: &RealSet, b: &RealSet) -> RealSet {
    if a.is_empty() {
        return b.clone();
    }
    if b.is_empty() {
        return a.clone();
    }
    let intervals = a.intervals.iter().chain(b.intervals.iter()).cloned().collect();
    RealSet {
        intervals: merge_intervals(intervals),
    }
}

fn interval_intersection(a: &Interval, b: &Interval) -> Option<Interval> {
    let min = match compare_min(&a.min, &b.min) {
        Ordering::Less => b.min.clone(),
        _ => a.min.clone(),
    };
    let max = match compare_max(&a.max, &b.max) {
        Ordering::Greater => b.max.clone(),
        _ => a.max.clone(),
    };
    Interval::checked(min, max)
}

/// Sweep both sorted lists, advancing whichever interval ends first
pub fn intersection(a: &RealSet, b: &RealSet) -> RealSet {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    while i < a.intervals.len() && j < b.intervals.len() {
        let (x, y) = (&a.intervals[i], &b.intervals[j]);
        if let Some(ix) = interval_intersection(x, y) {
            out.push(ix);
        }
        if compare_max(&x.max, &y.max) == Ordering::Less {
            i += 1;
        } else {
            j += 1;
        }
    }
    // Pieces of disjoint sorted inputs are already disjoint, merge is a no-op guard
    RealSet {
        intervals: merge_intervals(out),
    }
}

/// Gaps between intervals, openness flipped at each shared boundary
pub fn complement(set: &RealSet) -> RealSet {
    let mut gaps = Vec::with_capacity(set.intervals.len() + 1);
    let mut cursor = Some(Bound::Unbounded);
    for interval in &set.intervals {
        if let (Some(start), Bound::Inclusive(_) | Bound::Exclusive(_)) = (&cursor, &interval.min)
        {
            if let Some(gap) = Interval::checked(start.clone(), interval.min.flipped()) {
                gaps.push(gap);
            }
        }
        cursor = match &interval.max {
            Bound::Unbounded => None,
            bound => Some(bound.flipped()),
        };
    }
    if let Some(start) = cursor {
        if let Some(gap) = Interval::checked(start, Bound::Unbounded) {
            gaps.push(gap);
        }
    }
    RealSet { intervals: gaps }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::rational;

    fn closed(a: i64, b: i64) -> RealSet {
        RealSet::closed(a, b).unwrap()
    }

    fn open(a: i64, b: i64) -> RealSet {
        RealSet::open(a, b).unwrap()
    }

    #[test]
    fn union_merges_overlapping_runs() {
        let s = closed(0, 2).union(&closed(1, 3));
        assert_eq!(s, closed(0, 3));
    }

    #[test]
    fn union_merges_touching_when_point_is_covered() {
        let s = RealSet::right_open(0, 1).unwrap().union(&closed(1, 2));
        assert_eq!(s, closed(0, 2));
        let s = open(0, 1).union(&RealSet::left_open(1, 2).unwrap());
        assert_eq!(s.intervals().len(), 2);
    }

    #[test]
    fn union_orders_irrational_endpoints() {
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        let pieces = vec![
            Interval::new(Bound::Inclusive(Real::e()), Bound::Inclusive(Real::from(3))).unwrap(),
            Interval::new(Bound::Exclusive(sqrt2.clone()), Bound::Exclusive(Real::from(2)))
                .unwrap(),
            Interval::new(Bound::Unbounded, Bound::Inclusive(Real::from(-5))).unwrap(),
            Interval::new(Bound::Inclusive(sqrt2.clone()), Bound::Inclusive(sqrt2.clone()))
                .unwrap(),
        ];
        let s = RealSet::from_intervals(pieces);
        let starts: Vec<Bound> = s.intervals().iter().map(|i| i.min().clone()).collect();
        assert_eq!(
            starts,
            vec![Bound::Unbounded, Bound::Inclusive(sqrt2), Bound::Inclusive(Real::e())]
        );
    }

    #[test]
    fn open_neighbours_stay_apart() {
        let s = open(0, 1).union(&open(1, 2));
        assert_eq!(s.intervals().len(), 2);
        assert!(!s.contains(&Real::from(1)));
    }

    #[test]
    fn a_point_fills_the_gap() {
        let s = open(0, 1).union(&open(1, 2)).union(&RealSet::point(1));
        assert_eq!(s, open(0, 2));
    }

    #[test]
    fn intersection_takes_tighter_flags() {
        let s = closed(0, 2).intersection(&RealSet::open(1, 3).unwrap());
        assert_eq!(s, RealSet::left_open(1, 2).unwrap());
    }

    #[test]
    fn intersection_of_touching_closed_ends_is_a_point() {
        let s = closed(0, 1).intersection(&closed(1, 2));
        assert_eq!(s, RealSet::point(1));
        let s = RealSet::right_open(0, 1).unwrap().intersection(&closed(1, 2));
        assert!(s.is_empty());
    }

    #[test]
    fn intersection_across_multiple_intervals() {
        let a = closed(0, 1).union(&closed(2, 3)).union(&closed(4, 5));
        let b = RealSet::open(rational(1, 2), rational(9, 2)).unwrap();
        let expected = RealSet::left_open(rational(1, 2), 1)
            .unwrap()
            .union(&closed(2, 3))
            .union(&RealSet::right_open(4, rational(9, 2)).unwrap());
        assert_eq!(a.intersection(&b), expected);
    }

    #[test]
    fn complement_flips_openness() {
        let s = closed(0, 1).complement();
        let expected = RealSet::less_than(0).union(&RealSet::greater_than(1));
        assert_eq!(s, expected);
    }

    #[test]
    fn complement_of_extremes() {
        assert!(RealSet::reals().complement().is_empty());
        assert!(RealSet::empty().complement().is_reals());
        assert_eq!(RealSet::at_least(2).complement(), RealSet::less_than(2));
    }

    #[test]
    fn complement_of_punctured_line_is_the_point() {
        let s = RealSet::less_than(3).union(&RealSet::greater_than(3));
        assert_eq!(s.complement(), RealSet::point(3));
    }

    #[test]
    fn reversed_endpoints_are_rejected() {
        assert!(RealSet::closed(2, 1).is_err());
        assert!(Interval::new(Bound::Inclusive(Real::from(1)), Bound::Exclusive(Real::from(1))).is_err());
        assert!(RealSet::right_open(1, 1).unwrap().is_empty());
    }
}
