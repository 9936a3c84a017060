use crate::event::Event;
use crate::expression::Symbol;
use crate::number::{integer, rational, Real};
use crate::realset::RealSet;
use crate::transform::Transform;
use crate::ResourceLimits;
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::One;

fn x() -> Transform {
    Transform::identity(Symbol::new("x"))
}

fn closed(a: i64, b: i64) -> RealSet {
    RealSet::closed(a, b).unwrap()
}

#[test]
fn test_pow_of_abs_matches_direct_quadratic() {
    let via_pow = Transform::pow(Transform::abs(x()), integer(2)).unwrap();
    let via_poly = Transform::poly(x(), vec![integer(0), integer(0), integer(1)]).unwrap();
    let target = closed(1, 4);
    let expected = closed(-2, -1).union(&closed(1, 2));
    assert_eq!(via_pow.solve(&target).unwrap(), expected);
    assert_eq!(via_poly.solve(&target).unwrap(), expected);
}

#[test]
fn test_exp_of_polynomial() {
    let shifted = Transform::poly(x(), vec![integer(-1), integer(0), integer(1)]).unwrap();
    let t = Transform::exp(shifted, 2).unwrap();
    assert_eq!(t.solve(&RealSet::at_most(8)).unwrap(), closed(-2, 2));
    assert!(t.solve(&RealSet::at_most(0)).unwrap().is_empty());
}

#[test]
fn test_log_of_abs() {
    let t = Transform::log(Transform::abs(x()), 2).unwrap();
    let expected = closed(-8, -2).union(&closed(2, 8));
    assert_eq!(t.solve(&closed(1, 3)).unwrap(), expected);
}

#[test]
fn test_cube_below_irrational_bound() {
    let t = Transform::pow(x(), integer(3)).unwrap();
    let solved = t.solve(&RealSet::at_most(2)).unwrap();
    assert!(solved.contains(&Real::from_rational(rational(5, 4))));
    assert!(!solved.contains(&Real::from_rational(rational(63, 50))));
    assert!(solved.contains(&Real::from(-1000)));
}

#[test]
fn test_deep_abs_chain_solves_without_recursion() {
    let mut t = x();
    for _ in 0..10_000 {
        t = Transform::abs(t);
    }
    assert_eq!(t.depth(), 10_000);
    assert_eq!(t.solve(&closed(1, 4)).unwrap(), closed(-4, -1).union(&closed(1, 4)));
}

#[test]
fn test_deep_sqrt_chain_hits_the_magnitude_limit() {
    let mut t = x();
    for _ in 0..500 {
        t = Transform::sqrt(t).unwrap();
    }
    assert!(matches!(
        t.solve(&closed(1, 2)),
        Err(crate::PreimageError::ResourceExhausted(_))
    ));

    let mut shallow = x();
    for _ in 0..12 {
        shallow = Transform::sqrt(shallow).unwrap();
    }
    let top = BigRational::from_integer(BigInt::one() << 4096usize);
    assert_eq!(
        shallow.solve(&closed(1, 2)).unwrap(),
        RealSet::closed(1, top).unwrap()
    );
}

#[test]
fn test_deep_exp_pow_chain_is_bounded() {
    let mut t = x();
    for _ in 0..200 {
        t = Transform::exp_nat(Transform::pow(t, integer(3)).unwrap());
    }
    let limits = ResourceLimits::default();
    match t.solve_with_limits(&closed(1, 2), &limits) {
        Ok(solved) => assert!(!solved.contains(&Real::from(2))),
        Err(err) => assert!(matches!(err, crate::PreimageError::ResourceExhausted(_))),
    }
}

#[test]
fn test_deep_not_nest_solves() {
    let mut e = Event::interval(x(), closed(0, 1));
    for _ in 0..2_001 {
        e = Event::not_of(e);
    }
    let expected = RealSet::less_than(0).union(&RealSet::greater_than(1));
    assert_eq!(e.solve().unwrap(), expected);
    // too deep for BDD translation, returned as is
    assert_eq!(e.simplify(64), e);
}

#[test]
fn test_solutions_map_back_into_the_target() {
    let chains = vec![
        Transform::pow(Transform::abs(x()), integer(3)).unwrap(),
        Transform::exp(Transform::pow(x(), integer(3)).unwrap(), 3).unwrap(),
        Transform::log(Transform::abs(x()), 10).unwrap(),
        Transform::poly(x(), vec![integer(1), integer(-3), integer(0), integer(1)]).unwrap(),
    ];
    let target = RealSet::closed(rational(1, 2), 5).unwrap();
    for t in chains {
        let solved = t.solve(&target).unwrap();
        assert!(!solved.is_empty(), "{} has a preimage", t);
        for interval in &solved {
            let lo = interval.lower();
            let hi = interval.upper();
            let (Some(a), Some(b)) = (lo.finite(), hi.finite()) else {
                continue;
            };
            if let Some(mid) = a.rational_between(b) {
                let image = t.evaluate(&Real::from_rational(mid)).unwrap();
                assert!(target.contains(&image), "{} maps back into the target", t);
            }
        }
    }
}

#[test]
fn test_limits_reach_polynomial_isolation() {
    let t = Transform::poly(
        x(),
        vec![integer(2), integer(-4), integer(0), integer(0), integer(0), integer(1)],
    )
    .unwrap();
    let limits = ResourceLimits {
        max_isolation_steps: 1,
        ..ResourceLimits::default()
    };
    assert!(t.solve_with_limits(&RealSet::at_most(0), &limits).is_err());
    assert!(!t.solve(&RealSet::at_most(0)).unwrap().is_empty());
}
