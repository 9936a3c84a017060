//! Exact solution sets of `p(x) < b`, `p(x) <= b` and `a <= p(x) <= b`
//!
//! The real line is cut at the critical points of `p` (roots of `p'`). On every
//! piece between consecutive cuts `p` is strictly monotone, so `p(x) = b` has at
//! most one crossing there, and the bound may itself be irrational.

use super::{degree, derivative, real_roots, snap_rational_root, trim, Budget};
use crate::number::{horner, integer, rational, ExtendedReal, Real};
use crate::realset::{Bound, Interval, RealSet};
use crate::{PreimageError, PreimageResult, ResourceLimits};
use num_rational::BigRational;
use num_traits::{Signed, Zero};
use std::cmp::Ordering;
use tracing::trace;

/// Highest precision spent looking for a rational point beside a critical point
const MAX_BRACKET_BITS: u32 = 1024;

/// `{x : p(x) < bound}` when `strict`, `{x : p(x) <= bound}` otherwise
pub fn solve_bound(
    coeffs: &[BigRational],
    bound: &ExtendedReal,
    strict: bool,
) -> PreimageResult<RealSet> {
    solve_bound_with_limits(coeffs, bound, strict, &ResourceLimits::default())
}

pub fn solve_bound_with_limits(
    coeffs: &[BigRational],
    bound: &ExtendedReal,
    strict: bool,
    limits: &ResourceLimits,
) -> PreimageResult<RealSet> {
    let mut budget = Budget::new(limits);
    below(coeffs, bound, strict, &mut budget)
}

/// `{x : p(x) ∈ interval}`
///
/// Computed as `U ∩ complement(L)` where `U` holds the points compatible with
/// the upper end and `L` the points that violate the lower end.
pub fn solve(coeffs: &[BigRational], interval: &Interval) -> PreimageResult<RealSet> {
    solve_with_limits(coeffs, interval, &ResourceLimits::default())
}

pub fn solve_with_limits(
    coeffs: &[BigRational],
    interval: &Interval,
    limits: &ResourceLimits,
) -> PreimageResult<RealSet> {
    let mut budget = Budget::new(limits);
    let upper = below(coeffs, &interval.upper(), interval.right_open(), &mut budget)?;
    if upper.is_empty() {
        return Ok(upper);
    }
    let violating = below(coeffs, &interval.lower(), !interval.left_open(), &mut budget)?;
    Ok(upper.difference(&violating))
}

/// Image of `p` over the real line
pub fn range(coeffs: &[BigRational], limits: &ResourceLimits) -> PreimageResult<RealSet> {
    let p = trim(coeffs);
    let n = match degree(&p) {
        None => return Ok(RealSet::point(0)),
        Some(0) => return Ok(RealSet::point(p[0].clone())),
        Some(n) => n,
    };
    if n % 2 == 1 {
        return Ok(RealSet::reals());
    }
    let mut budget = Budget::new(limits);
    let values: Vec<Real> = real_roots(&derivative(&p), &mut budget)?
        .iter()
        .map(|c| Real::poly_value(&p, c))
        .collect();
    let leading_positive = p[n].is_positive();
    let extreme = if leading_positive {
        values.into_iter().min()
    } else {
        values.into_iter().max()
    };
    // An even-degree polynomial always has a critical point
    let Some(extreme) = extreme else {
        return Ok(RealSet::reals());
    };
    Ok(if leading_positive {
        RealSet::at_least(extreme)
    } else {
        RealSet::at_most(extreme)
    })
}

fn below(
    coeffs: &[BigRational],
    bound: &ExtendedReal,
    strict: bool,
    budget: &mut Budget,
) -> PreimageResult<RealSet> {
    let bound = match bound {
        ExtendedReal::PosInfinity => return Ok(RealSet::reals()),
        ExtendedReal::NegInfinity => return Ok(RealSet::empty()),
        ExtendedReal::Finite(b) => b,
    };
    let p = trim(coeffs);
    let n = degree(&p).unwrap_or(0);
    if n == 0 {
        let constant = Real::from(p.first().cloned().unwrap_or_else(BigRational::zero));
        let holds = match constant.cmp(bound) {
            Ordering::Less => true,
            Ordering::Equal => !strict,
            Ordering::Greater => false,
        };
        return Ok(if holds {
            RealSet::reals()
        } else {
            RealSet::empty()
        });
    }

    let critical = real_roots(&derivative(&p), budget)?;
    let mut cuts = Vec::with_capacity(critical.len() + 2);
    cuts.push(ExtendedReal::NegInfinity);
    cuts.extend(critical.iter().cloned().map(ExtendedReal::Finite));
    cuts.push(ExtendedReal::PosInfinity);

    let leading_positive = p[n].is_positive();
    let values: Vec<ExtendedReal> = cuts
        .iter()
        .map(|cut| match cut {
            ExtendedReal::Finite(c) => ExtendedReal::Finite(Real::poly_value(&p, c)),
            ExtendedReal::PosInfinity => infinity(leading_positive),
            ExtendedReal::NegInfinity => infinity(leading_positive == (n % 2 == 0)),
        })
        .collect();
    let target = ExtendedReal::Finite(bound.clone());

    let mut pieces = Vec::new();
    for (c, value) in critical.iter().zip(&values[1..]) {
        let included = match value.cmp(&target) {
            Ordering::Less => true,
            Ordering::Equal => !strict,
            Ordering::Greater => false,
        };
        if included {
            pieces.push(Interval::point(c.clone()));
        }
    }

    for k in 0..cuts.len() - 1 {
        let (left, right) = (&cuts[k], &cuts[k + 1]);
        let (v_left, v_right) = (&values[k], &values[k + 1]);
        let rising = v_left < v_right;
        let (low, high) = if rising {
            (v_left, v_right)
        } else {
            (v_right, v_left)
        };

        if *high <= target {
            pieces.extend(open_between(left, right));
            continue;
        }
        if *low >= target {
            continue;
        }

        let root = crossing(&p, n, bound, left, right, rising, budget)?;
        trace!(piece = k, rising, root = %root, "bound crossed inside monotone piece");
        let at_root = if strict {
            Bound::Exclusive(root.clone())
        } else {
            Bound::Inclusive(root.clone())
        };
        let piece = if rising {
            Interval::checked(open_at(left), at_root)
        } else {
            Interval::checked(at_root, open_at(right))
        };
        pieces.extend(piece);
    }

    Ok(RealSet::from_intervals(pieces))
}

fn infinity(positive: bool) -> ExtendedReal {
    if positive {
        ExtendedReal::PosInfinity
    } else {
        ExtendedReal::NegInfinity
    }
}

/// Open side of a piece at a cut; critical points are handled on their own
fn open_at(cut: &ExtendedReal) -> Bound {
    match cut {
        ExtendedReal::Finite(c) => Bound::Exclusive(c.clone()),
        _ => Bound::Unbounded,
    }
}

fn open_between(left: &ExtendedReal, right: &ExtendedReal) -> Option<Interval> {
    Interval::checked(open_at(left), open_at(right))
}

/// The point of the monotone piece `(left, right)` where `p` meets `bound`
fn crossing(
    p: &[BigRational],
    n: usize,
    bound: &Real,
    left: &ExtendedReal,
    right: &ExtendedReal,
    rising: bool,
    budget: &mut Budget,
) -> PreimageResult<Real> {
    match n {
        1 => {
            // a0 + a1 x = b
            let scale = p[1].recip();
            let offset = -&p[0] / &p[1];
            Ok(bound.affine(&scale, &offset))
        }
        2 => {
            // x = vertex ± sqrt(a1² - 4 a2 (a0 - b)) / (2|a2|)
            let (a0, a1, a2) = (&p[0], &p[1], &p[2]);
            let four_a2 = integer(4) * a2;
            let disc = bound.affine(&four_a2, &(a1 * a1 - &four_a2 * a0));
            let root = disc.pow(&rational(1, 2)).ok_or_else(|| {
                PreimageError::invalid("negative discriminant inside a crossing piece")
            })?;
            let vertex = -a1 / (integer(2) * a2);
            let half_width = (integer(2) * a2).abs().recip();
            let side = if matches!(left, ExtendedReal::NegInfinity) {
                -half_width
            } else {
                half_width
            };
            Ok(root.affine(&side, &vertex))
        }
        _ => {
            let lo = bracket_end(p, bound, left, right, rising, true, budget)?;
            let hi = bracket_end(p, bound, right, left, rising, false, budget)?;
            if let Some(b) = bound.as_rational() {
                let mut shifted = p.to_vec();
                shifted[0] -= b;
                if let Some(exact) = snap_rational_root(&shifted, lo.clone(), hi.clone(), budget)? {
                    return Ok(Real::from(exact));
                }
            }
            Ok(Real::poly_root(p.to_vec(), bound.clone(), lo, hi, rising))
        }
    }
}

/// A rational point inside the piece next to `end`, on `end`'s side of the crossing
///
/// At the left end of a rising piece `p` must be below `bound`; the other three
/// combinations follow by symmetry.
fn bracket_end(
    p: &[BigRational],
    bound: &Real,
    end: &ExtendedReal,
    other: &ExtendedReal,
    rising: bool,
    is_left: bool,
    budget: &mut Budget,
) -> PreimageResult<BigRational> {
    let want_below = rising == is_left;
    let on_side = |x: &BigRational| {
        let value = Real::from(horner(p, x));
        if want_below {
            value < *bound
        } else {
            value > *bound
        }
    };
    let inside = |x: &BigRational| {
        let x = ExtendedReal::Finite(Real::from(x.clone()));
        if is_left {
            x < *other
        } else {
            x > *other
        }
    };

    match end {
        ExtendedReal::Finite(c) => {
            if let Some(exact) = c.as_rational() {
                return Ok(exact.clone());
            }
            let mut bits = 32;
            while bits <= MAX_BRACKET_BITS {
                let (lo, hi) = c.enclose(bits);
                let candidate = if is_left { hi } else { lo };
                if inside(&candidate) && on_side(&candidate) {
                    return Ok(candidate);
                }
                bits *= 2;
            }
            Err(PreimageError::exhausted(format!(
                "no rational point separates critical point {} from bound {}",
                c, bound
            )))
        }
        ExtendedReal::NegInfinity | ExtendedReal::PosInfinity => {
            let step = if is_left { integer(-1) } else { integer(1) };
            let mut x = match other.finite() {
                Some(o) if is_left => o.rational_below(),
                Some(o) => o.rational_above(),
                None => step.clone(),
            };
            while !on_side(&x) {
                budget.step()?;
                x = &x * integer(2) + &step;
            }
            Ok(x)
        }
    }
}
