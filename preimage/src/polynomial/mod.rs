//! Dense rational polynomials and exact real-root isolation
//!
//! Coefficients are ascending: `[a0, a1, a2]` is `a0 + a1*x + a2*x^2`. An empty
//! vector is the zero polynomial.

pub mod inequality;

pub use inequality::{range, solve, solve_bound, solve_bound_with_limits, solve_with_limits};

use crate::number::{horner, integer, rational, Real};
use crate::{PreimageError, PreimageResult, ResourceLimits};
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use tracing::{trace, warn};

/// Largest leading coefficient whose divisors are enumerated for rational roots
const MAX_SNAP_LEADING: u64 = 1 << 32;

/// Bisection steps left for one solve
pub(crate) struct Budget {
    remaining: usize,
    limit: usize,
}

impl Budget {
    pub(crate) fn new(limits: &ResourceLimits) -> Self {
        Budget {
            remaining: limits.max_isolation_steps,
            limit: limits.max_isolation_steps,
        }
    }

    pub(crate) fn step(&mut self) -> PreimageResult<()> {
        if self.remaining == 0 {
            warn!(limit = self.limit, "root isolation exhausted its step budget");
            return Err(PreimageError::exhausted(format!(
                "root isolation exceeded {} bisection steps",
                self.limit
            )));
        }
        self.remaining -= 1;
        Ok(())
    }
}

fn trim_in_place(coeffs: &mut Vec<BigRational>) {
    while coeffs.last().is_some_and(|c| c.is_zero()) {
        coeffs.pop();
    }
}

/// Drop trailing zero coefficients
pub fn trim(coeffs: &[BigRational]) -> Vec<BigRational> {
    let mut out = coeffs.to_vec();
    trim_in_place(&mut out);
    out
}

/// Degree of the polynomial; `None` for the zero polynomial
pub fn degree(coeffs: &[BigRational]) -> Option<usize> {
    coeffs.iter().rposition(|c| !c.is_zero())
}

pub fn evaluate(coeffs: &[BigRational], x: &BigRational) -> BigRational {
    horner(coeffs, x)
}

pub fn derivative(coeffs: &[BigRational]) -> Vec<BigRational> {
    let mut out: Vec<BigRational> = coeffs
        .iter()
        .enumerate()
        .skip(1)
        .map(|(i, c)| c * integer(i as i64))
        .collect();
    trim_in_place(&mut out);
    out
}

/// Quotient and remainder of `a / b`; `b` must be non-zero
fn div_rem(a: &[BigRational], b: &[BigRational]) -> (Vec<BigRational>, Vec<BigRational>) {
    let b = trim(b);
    let mut r = trim(a);
    let Some(lead) = b.last().cloned() else {
        return (Vec::new(), r);
    };
    if r.len() < b.len() {
        return (Vec::new(), r);
    }
    let mut q = vec![BigRational::zero(); r.len() - b.len() + 1];
    while r.len() >= b.len() {
        let shift = r.len() - b.len();
        let factor = match r.last() {
            Some(top) => top / &lead,
            None => break,
        };
        for (i, c) in b.iter().enumerate() {
            r[i + shift] -= &factor * c;
        }
        q[shift] = factor;
        trim_in_place(&mut r);
    }
    trim_in_place(&mut q);
    (q, r)
}

pub fn rem(a: &[BigRational], b: &[BigRational]) -> Vec<BigRational> {
    div_rem(a, b).1
}

/// Monic greatest common divisor
pub fn gcd(a: &[BigRational], b: &[BigRational]) -> Vec<BigRational> {
    let mut a = trim(a);
    let mut b = trim(b);
    while !b.is_empty() {
        let r = rem(&a, &b);
        a = std::mem::replace(&mut b, r);
    }
    match a.last().cloned() {
        Some(lead) => a.iter().map(|c| c / &lead).collect(),
        None => a,
    }
}

/// The polynomial with every repeated root reduced to a simple one
pub fn square_free(coeffs: &[BigRational]) -> Vec<BigRational> {
    let p = trim(coeffs);
    if degree(&p).unwrap_or(0) < 2 {
        return p;
    }
    let g = gcd(&p, &derivative(&p));
    div_rem(&p, &g).0
}

fn sturm_sequence(p: &[BigRational]) -> Vec<Vec<BigRational>> {
    let mut seq = vec![trim(p), derivative(p)];
    loop {
        let n = seq.len();
        let r = rem(&seq[n - 2], &seq[n - 1]);
        if r.is_empty() {
            break;
        }
        seq.push(r.into_iter().map(|c| -c).collect());
    }
    seq
}

fn sign_changes(seq: &[Vec<BigRational>], x: &BigRational) -> usize {
    let mut changes = 0;
    let mut last: Option<bool> = None;
    for p in seq {
        let v = horner(p, x);
        if v.is_zero() {
            continue;
        }
        let positive = v.is_positive();
        if last.is_some_and(|l| l != positive) {
            changes += 1;
        }
        last = Some(positive);
    }
    changes
}

/// Every real root lies strictly inside `(-M, M)`
fn cauchy_bound(p: &[BigRational]) -> BigRational {
    let Some(lead) = p.last() else {
        return BigRational::one();
    };
    let max = p[..p.len() - 1]
        .iter()
        .map(|c| (c / lead).abs())
        .max()
        .unwrap_or_else(BigRational::zero);
    max + BigRational::one()
}

/// Distinct real roots in ascending order
pub(crate) fn real_roots(coeffs: &[BigRational], budget: &mut Budget) -> PreimageResult<Vec<Real>> {
    let p = trim(coeffs);
    let mut roots = match degree(&p) {
        None | Some(0) => Vec::new(),
        Some(1) => vec![Real::from(-&p[0] / &p[1])],
        Some(2) => quadratic_roots(&p),
        Some(_) => {
            let sq = square_free(&p);
            if degree(&sq).unwrap_or(0) <= 2 {
                return real_roots(&sq, budget);
            }
            sturm_roots(&sq, budget)?
        }
    };
    roots.sort_by_cached_key(Real::sort_key);
    Ok(roots)
}

fn quadratic_roots(p: &[BigRational]) -> Vec<Real> {
    let (a0, a1, a2) = (&p[0], &p[1], &p[2]);
    let disc = a1 * a1 - integer(4) * a2 * a0;
    let vertex = -a1 / (integer(2) * a2);
    match disc.cmp(&BigRational::zero()) {
        Ordering::Less => Vec::new(),
        Ordering::Equal => vec![Real::from(vertex)],
        Ordering::Greater => {
            let Some(s) = Real::from(disc).pow(&rational(1, 2)) else {
                return Vec::new();
            };
            let half_width = (integer(2) * a2).abs().recip();
            vec![
                s.affine(&-&half_width, &vertex),
                s.affine(&half_width, &vertex),
            ]
        }
    }
}

/// Bisect `(-M, M]` with Sturm counts until every piece holds one root
fn sturm_roots(p: &[BigRational], budget: &mut Budget) -> PreimageResult<Vec<Real>> {
    let seq = sturm_sequence(p);
    let bound = cauchy_bound(p);
    let lo = -bound.clone();
    let v_lo = sign_changes(&seq, &lo);
    let v_hi = sign_changes(&seq, &bound);

    let mut roots = Vec::new();
    let mut stack = vec![(lo, bound, v_lo, v_hi)];
    while let Some((lo, hi, v_lo, v_hi)) = stack.pop() {
        // roots in (lo, hi]
        match v_lo.saturating_sub(v_hi) {
            0 => {}
            1 => roots.push(isolated_root(p, lo, hi, budget)?),
            _ => {
                budget.step()?;
                let mid = (&lo + &hi) / integer(2);
                let v_mid = sign_changes(&seq, &mid);
                stack.push((lo, mid.clone(), v_lo, v_mid));
                stack.push((mid, hi, v_mid, v_hi));
            }
        }
    }
    trace!(degree = p.len() - 1, roots = roots.len(), "isolated real roots");
    Ok(roots)
}

/// The single root of square-free `p` in `(lo, hi]`
fn isolated_root(
    p: &[BigRational],
    lo: BigRational,
    hi: BigRational,
    budget: &mut Budget,
) -> PreimageResult<Real> {
    let at_hi = horner(p, &hi);
    if at_hi.is_zero() {
        return Ok(Real::from(hi));
    }
    if let Some(exact) = snap_rational_root(p, lo.clone(), hi.clone(), budget)? {
        return Ok(Real::from(exact));
    }
    Ok(Real::poly_root(
        p.to_vec(),
        Real::zero(),
        lo,
        hi,
        at_hi.is_positive(),
    ))
}

/// The root of `q` strictly inside `(lo, hi)`, when it is rational
///
/// `q(hi)` must be non-zero with a sign opposite to `q` just right of the root.
/// By the rational root theorem the denominator of a rational root divides the
/// leading coefficient of `q` scaled to integers, so once the bracket is narrower
/// than half its reciprocal at most one candidate per divisor remains.
pub(crate) fn snap_rational_root(
    q: &[BigRational],
    mut lo: BigRational,
    mut hi: BigRational,
    budget: &mut Budget,
) -> PreimageResult<Option<BigRational>> {
    let Some(lead) = integer_leading(q) else {
        return Ok(None);
    };
    let Some(denominators) = lead
        .to_u64()
        .filter(|l| *l <= MAX_SNAP_LEADING)
        .map(divisors)
    else {
        return Ok(None);
    };

    let width = rational(1, 2) / BigRational::from_integer(lead);
    let hi_positive = horner(q, &hi).is_positive();
    while &hi - &lo > width {
        budget.step()?;
        let mid = (&lo + &hi) / integer(2);
        let value = horner(q, &mid);
        if value.is_zero() {
            return Ok(Some(mid));
        }
        if value.is_positive() == hi_positive {
            hi = mid;
        } else {
            lo = mid;
        }
    }

    for v in denominators {
        let v = BigRational::from_integer(BigInt::from(v));
        let u = (&lo * &v).ceil();
        let candidate = u / &v;
        if candidate > lo && candidate < hi && horner(q, &candidate).is_zero() {
            return Ok(Some(candidate));
        }
    }
    Ok(None)
}

/// `|leading coefficient|` after scaling `q` to integer coefficients
fn integer_leading(q: &[BigRational]) -> Option<BigInt> {
    let q = trim(q);
    let lcm = q
        .iter()
        .fold(BigInt::one(), |acc, c| acc.lcm(c.denom()));
    let lead = q.last()?;
    let scaled = lead * BigRational::from_integer(lcm);
    Some(scaled.to_integer().abs())
}

fn divisors(n: u64) -> Vec<u64> {
    let mut small = Vec::new();
    let mut large = Vec::new();
    let mut d = 1u64;
    while d * d <= n {
        if n % d == 0 {
            small.push(d);
            if d != n / d {
                large.push(n / d);
            }
        }
        d += 1;
    }
    small.extend(large.into_iter().rev());
    small
}
