#![no_main]

use libfuzzer_sys::fuzz_target;
use preimage::{rational, Bound, Interval, Real, RealSet};

fn bound(value: i8, kind: u8) -> Bound {
    let v = Real::from_rational(rational(value as i64, 4));
    match kind % 3 {
        0 => Bound::Unbounded,
        1 => Bound::Inclusive(v),
        _ => Bound::Exclusive(v),
    }
}

fn set(data: &[u8]) -> RealSet {
    let intervals = data
        .chunks_exact(4)
        .filter_map(|c| {
            Interval::new(bound(c[0] as i8, c[1]), bound(c[2] as i8, c[3])).ok()
        })
        .collect();
    RealSet::from_intervals(intervals)
}

fuzz_target!(|data: &[u8]| {
    let (left, right) = data.split_at(data.len() / 2);
    let a = set(left);
    let b = set(right);

    assert_eq!(a.union(&b), b.union(&a));
    assert_eq!(a.intersection(&b), b.intersection(&a));
    assert_eq!(a.complement().complement(), a);
    assert_eq!(RealSet::from_intervals(a.intervals().to_vec()), a);
    assert!(a.intersection(&a.complement()).is_empty());
});
