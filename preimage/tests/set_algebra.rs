use preimage::{rational, Bound, Interval, Real, RealSet};
use proptest::prelude::*;

fn bound(value: i64, kind: u8) -> Bound {
    let v = Real::from_rational(rational(value, 2));
    match kind % 5 {
        0 => Bound::Unbounded,
        1 | 2 => Bound::Inclusive(v),
        _ => Bound::Exclusive(v),
    }
}

fn arb_set() -> impl Strategy<Value = RealSet> {
    prop::collection::vec((-20i64..20, 0i64..10, any::<u8>(), any::<u8>()), 0..5).prop_map(
        |specs| {
            let intervals = specs
                .into_iter()
                .filter_map(|(start, width, lo, hi)| {
                    Interval::new(bound(start, lo), bound(start + width, hi)).ok()
                })
                .collect();
            RealSet::from_intervals(intervals)
        },
    )
}

fn sample_points() -> Vec<Real> {
    (-48..=48).map(|n| Real::from_rational(rational(n, 4))).collect()
}

proptest! {
    #![proptest_config(ProptestConfig {
        cases: 200,
        ..ProptestConfig::default()
    })]

    #[test]
    fn prop_normalization_is_idempotent(set in arb_set()) {
        let again = RealSet::from_intervals(set.intervals().to_vec());
        prop_assert_eq!(&again, &set);
        for pair in set.intervals().windows(2) {
            // sorted, disjoint and not mergeable
            prop_assert!(pair[0].upper() <= pair[1].lower());
            if pair[0].upper() == pair[1].lower() {
                prop_assert!(pair[0].right_open() && pair[1].left_open());
            }
        }
    }

    #[test]
    fn prop_union_and_intersection_commute(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(a.union(&b), b.union(&a));
        prop_assert_eq!(a.intersection(&b), b.intersection(&a));
    }

    #[test]
    fn prop_union_and_intersection_associate(a in arb_set(), b in arb_set(), c in arb_set()) {
        prop_assert_eq!(a.union(&b).union(&c), a.union(&b.union(&c)));
        prop_assert_eq!(
            a.intersection(&b).intersection(&c),
            a.intersection(&b.intersection(&c))
        );
    }

    #[test]
    fn prop_double_complement(set in arb_set()) {
        prop_assert_eq!(set.complement().complement(), set);
    }

    #[test]
    fn prop_de_morgan(a in arb_set(), b in arb_set()) {
        prop_assert_eq!(
            a.union(&b).complement(),
            a.complement().intersection(&b.complement())
        );
    }

    #[test]
    fn prop_membership_agrees_with_operations(a in arb_set(), b in arb_set()) {
        let union = a.union(&b);
        let intersection = a.intersection(&b);
        let complement = a.complement();
        for p in sample_points() {
            prop_assert_eq!(union.contains(&p), a.contains(&p) || b.contains(&p));
            prop_assert_eq!(intersection.contains(&p), a.contains(&p) && b.contains(&p));
            prop_assert_eq!(complement.contains(&p), !a.contains(&p));
        }
    }
}

#[test]
fn empty_and_reals_are_canonical() {
    let a = RealSet::closed(0, 1).unwrap();
    assert_eq!(a.intersection(&a.complement()), RealSet::empty());
    assert_eq!(a.union(&a.complement()), RealSet::reals());
    assert_eq!(RealSet::empty().intervals().len(), 0);
    assert_eq!(RealSet::reals().intervals().len(), 1);
}
