//! Rational enclosures with directed rounding
//!
//! Every function returns `(lo, hi)` with `lo <= true value <= hi`. Results are
//! rounded outward to dyadic rationals so denominators stay bounded while the
//! enclosure shrinks as the requested bit count grows.

use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::sync::Mutex;

pub type Bounds = (BigRational, BigRational);

pub fn pow2(bits: u32) -> BigInt {
    BigInt::one() << bits as usize
}

/// Largest multiple of `2^-bits` not above `x`
pub fn floor_to(x: &BigRational, bits: u32) -> BigRational {
    from_fixed(fixed_floor(x, bits), bits)
}

/// Smallest multiple of `2^-bits` not below `x`
pub fn ceil_to(x: &BigRational, bits: u32) -> BigRational {
    from_fixed(fixed_ceil(x, bits), bits)
}

/// Approximate binary logarithm of `|x|`; only used for guard-bit estimates
pub fn approx_log2(x: &BigRational) -> f64 {
    fn log2_int(n: &BigInt) -> f64 {
        let bits = n.bits();
        if bits <= 1000 {
            n.abs().to_f64().map(f64::log2).unwrap_or(0.0)
        } else {
            let shift = bits - 53;
            let top = (n.abs() >> shift as usize).to_f64().unwrap_or(1.0);
            top.log2() + shift as f64
        }
    }
    if x.is_zero() {
        return f64::NEG_INFINITY;
    }
    log2_int(x.numer()) - log2_int(x.denom())
}

/// Floating point approximation that survives numerators past `f64::MAX`
pub fn to_f64(x: &BigRational) -> f64 {
    if x.is_zero() {
        return 0.0;
    }
    if let (Some(n), Some(d)) = (x.numer().to_f64(), x.denom().to_f64()) {
        if n.is_finite() && d.is_finite() {
            return n / d;
        }
    }
    let magnitude = approx_log2(x).exp2();
    if x.is_negative() {
        -magnitude
    } else {
        magnitude
    }
}

/// `x^n` for a signed integer exponent; `x` must be non-zero when `n < 0`
pub fn powi(x: &BigRational, n: i64) -> BigRational {
    let magnitude = n.unsigned_abs() as u32;
    let raised = BigRational::new(x.numer().pow(magnitude), x.denom().pow(magnitude));
    if n < 0 {
        raised.recip()
    } else {
        raised
    }
}

/// Exact `q`-th root of a non-negative rational, when it is rational
pub fn exact_root(x: &BigRational, q: u32) -> Option<BigRational> {
    if x.is_negative() {
        return None;
    }
    let n = x.numer().nth_root(q);
    let d = x.denom().nth_root(q);
    if &n.pow(q) == x.numer() && &d.pow(q) == x.denom() {
        Some(BigRational::new(n, d))
    } else {
        None
    }
}

/// Lower bound of `x^(1/q)` at `bits` of precision, for `x >= 0`
pub fn root_floor(x: &BigRational, q: u32, bits: u32) -> BigRational {
    if !x.is_positive() {
        return BigRational::zero();
    }
    let scaled = (x * BigRational::from_integer(pow2(bits * q)))
        .floor()
        .to_integer();
    BigRational::new(scaled.nth_root(q), pow2(bits))
}

/// Upper bound of `x^(1/q)` at `bits` of precision, for `x >= 0`
pub fn root_ceil(x: &BigRational, q: u32, bits: u32) -> BigRational {
    if !x.is_positive() {
        return BigRational::zero();
    }
    let scaled = (x * BigRational::from_integer(pow2(bits * q)))
        .ceil()
        .to_integer();
    let mut root = scaled.nth_root(q);
    if root.pow(q) < scaled {
        root += BigInt::one();
    }
    BigRational::new(root, pow2(bits))
}

/// Number of bits needed to write `n`
pub fn bit_length(n: u64) -> u32 {
    64 - n.leading_zeros()
}

/// `floor(a / 2^by)` for `a >= 0`
fn shr_floor(a: &BigInt, by: u32) -> BigInt {
    a >> by as usize
}

/// `ceil(a / 2^by)` for `a >= 0`
fn shr_ceil(a: &BigInt, by: u32) -> BigInt {
    (a + (pow2(by) - BigInt::one())) >> by as usize
}

/// `ceil(a / b)` for `a >= 0`, `b > 0`
fn div_ceil(a: &BigInt, b: &BigInt) -> BigInt {
    (a + b - BigInt::one()) / b
}

/// `floor(x * 2^bits)`
fn fixed_floor(x: &BigRational, bits: u32) -> BigInt {
    (x.numer() << bits as usize).div_floor(x.denom())
}

/// `ceil(x * 2^bits)`
fn fixed_ceil(x: &BigRational, bits: u32) -> BigInt {
    -(-(x.numer() << bits as usize)).div_floor(x.denom())
}

fn from_fixed(fixed: BigInt, bits: u32) -> BigRational {
    BigRational::new(fixed, pow2(bits))
}

/// `atanh(p/q) * 2^bits` rounded down and up, for `0 <= p/q < 1/3`
///
/// Terms are truncated at `bits` plus guard bits; each loses at most four
/// units and the tail after the last non-zero power is below four units.
fn atanh_fixed(p: &BigInt, q: &BigInt, bits: u32) -> (BigInt, BigInt) {
    let w = bits + 2 * bit_length(bits as u64) + 8;
    let p2 = p * p;
    let q2 = q * q;
    // Small denominators step exactly; large ones through a fixed-point y^2
    let y2 = (q.bits() > 64).then(|| (&p2 << w as usize).div_floor(&q2));
    let mut power = (p << w as usize).div_floor(q);
    let mut sum = BigInt::zero();
    let mut n: u64 = 0;
    while power.is_positive() {
        sum += &power / BigInt::from(2 * n + 1);
        power = match &y2 {
            Some(y2) => (&power * y2) >> w as usize,
            None => (&power * &p2).div_floor(&q2),
        };
        n += 1;
    }
    let upper = &sum + BigInt::from(4 * n + 4);
    (shr_floor(&sum, w - bits), shr_ceil(&upper, w - bits))
}

/// Precision of the cached `ln 2`, with its fixed-point bounds
static LN2: Mutex<Option<(u32, BigInt, BigInt)>> = Mutex::new(None);

/// `ln 2 * 2^bits` rounded down and up
fn ln2_fixed(bits: u32) -> (BigInt, BigInt) {
    if let Ok(cache) = LN2.lock() {
        if let Some((have, lo, hi)) = cache.as_ref() {
            if *have >= bits {
                let drop = have - bits;
                return (shr_floor(lo, drop), shr_ceil(hi, drop));
            }
        }
    }
    let (lo, hi) = atanh_fixed(&BigInt::one(), &BigInt::from(3), bits);
    let (lo, hi): (BigInt, BigInt) = (lo << 1, hi << 1);
    if let Ok(mut cache) = LN2.lock() {
        *cache = Some((bits, lo.clone(), hi.clone()));
    }
    (lo, hi)
}

/// Natural logarithm of a positive rational
pub fn ln_bounds(x: &BigRational, bits: u32) -> Bounds {
    if x.is_one() || !x.is_positive() {
        return (BigRational::zero(), BigRational::zero());
    }
    // x = m * 2^k with m in [1, 2)
    let mut k: i64 = x.numer().bits() as i64 - x.denom().bits() as i64;
    let mut m = if k >= 0 {
        x / BigRational::from_integer(pow2(k as u32))
    } else {
        x * BigRational::from_integer(pow2((-k) as u32))
    };
    let two = BigRational::from_integer(BigInt::from(2));
    while m < BigRational::one() {
        m *= &two;
        k -= 1;
    }
    while m >= two {
        m /= &two;
        k += 1;
    }

    // ln m = 2 atanh((m - 1) / (m + 1))
    let g = bits + bit_length(k.unsigned_abs()) + 4;
    let (al, ah) = atanh_fixed(
        &(m.numer() - m.denom()),
        &(m.numer() + m.denom()),
        g,
    );
    let (l2l, l2h) = ln2_fixed(g);
    let kk = BigInt::from(k);
    let (kl, kh) = if k >= 0 {
        (&kk * l2l, &kk * l2h)
    } else {
        (&kk * l2h, &kk * l2l)
    };
    (from_fixed((al << 1) + kl, g), from_fixed((ah << 1) + kh, g))
}

/// `e^r * 2^q` rounded down or up, for `r = fixed / 2^q`
fn exp_fixed(fixed: &BigInt, q: u32, upper: bool) -> BigInt {
    if fixed.is_negative() {
        // e^-a = 1 / e^a, with the rounding direction swapped
        let inverse = exp_fixed(&-fixed, q, !upper);
        let one = pow2(2 * q);
        return if upper {
            div_ceil(&one, &inverse)
        } else {
            one / inverse
        };
    }
    // Halve the argument below 1/2, sum the series, square back
    let whole = bit_length((fixed >> q as usize).to_u64().unwrap_or(u64::MAX));
    let halvings = (q as f64).sqrt() as u32 / 2 + whole + 1;
    let w = q + halvings + bit_length(q as u64) + 8;
    let x = fixed << (w - q - halvings) as usize;

    let one = BigInt::one();
    let mut term = pow2(w);
    let mut sum = term.clone();
    let mut n: u64 = 1;
    loop {
        let product = &term * &x;
        term = if upper {
            div_ceil(&shr_ceil(&product, w), &BigInt::from(n))
        } else {
            (product >> w as usize) / BigInt::from(n)
        };
        let done = if upper { term <= one } else { term.is_zero() };
        if done {
            break;
        }
        sum += &term;
        n += 1;
    }
    // Remaining terms at most halve each step
    let mut value = if upper { sum + BigInt::from(2) } else { sum };
    for _ in 0..halvings {
        let square = &value * &value;
        value = if upper {
            shr_ceil(&square, w)
        } else {
            square >> w as usize
        };
    }
    if upper {
        shr_ceil(&value, w - q)
    } else {
        shr_floor(&value, w - q)
    }
}

/// Natural exponential of a rational
///
/// Works in relative precision: `t = k ln 2 + r` with `|r|` below one, so
/// the series cost depends on the requested bits plus the binary magnitude
/// of the result, not on the size of `t` itself.
pub fn exp_bounds(t: &BigRational, bits: u32) -> Bounds {
    if t.is_zero() {
        return (BigRational::one(), BigRational::one());
    }
    let k = (to_f64(t) / std::f64::consts::LN_2).round() as i64;
    let lift = k.clamp(0, u32::MAX as i64) as u32;
    let q = bits
        .saturating_add(lift)
        .saturating_add(bit_length(k.unsigned_abs()) + 16);
    let (l2l, l2h) = ln2_fixed(q);
    let kk = BigInt::from(k);
    let (kl, kh) = if k >= 0 {
        (&kk * l2l, &kk * l2h)
    } else {
        (&kk * l2h, &kk * l2l)
    };
    let lo = exp_fixed(&(fixed_floor(t, q) - kh), q, false);
    let hi = exp_fixed(&(fixed_ceil(t, q) - kl), q, true);
    let scale = |fixed: BigInt| {
        if k >= 0 {
            BigRational::new(fixed << k as usize, pow2(q))
        } else {
            BigRational::new(fixed, pow2(q) << k.unsigned_abs() as usize)
        }
    };
    (scale(lo), scale(hi))
}

/// `x^(e)` for `0 <= lo <= x <= hi` and a positive rational `e`, via `exp(e ln x)`
pub fn rational_power_bounds(lo: &BigRational, hi: &BigRational, e: &BigRational, bits: u32) -> Bounds {
    let magnitude = (approx_log2(hi) * to_f64(e)).clamp(0.0, f64::from(1u32 << 24)) as u32;
    let guard = bit_length(e.numer().to_u64().unwrap_or(u64::MAX)) + magnitude + 8;
    let lower = if lo.is_positive() {
        let t = ln_bounds(lo, bits + guard).0 * e;
        exp_bounds(&floor_to(&t, bits + guard), bits).0
    } else {
        BigRational::zero()
    };
    let upper = if hi.is_positive() {
        let t = ln_bounds(hi, bits + guard).1 * e;
        exp_bounds(&ceil_to(&t, bits + guard), bits).1
    } else {
        BigRational::zero()
    };
    (lower, upper)
}

pub fn mul(a: &Bounds, b: &Bounds) -> Bounds {
    let products = [&a.0 * &b.0, &a.0 * &b.1, &a.1 * &b.0, &a.1 * &b.1];
    extremes(products)
}

/// Quotient of two enclosures; the divisor must not straddle zero
pub fn div(a: &Bounds, b: &Bounds) -> Bounds {
    let quotients = [&a.0 / &b.0, &a.0 / &b.1, &a.1 / &b.0, &a.1 / &b.1];
    extremes(quotients)
}

fn extremes(values: [BigRational; 4]) -> Bounds {
    let mut lo = values[0].clone();
    let mut hi = values[0].clone();
    for v in &values[1..] {
        if *v < lo {
            lo = v.clone();
        }
        if *v > hi {
            hi = v.clone();
        }
    }
    (lo, hi)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn r(n: i64, d: i64) -> BigRational {
        BigRational::new(BigInt::from(n), BigInt::from(d))
    }

    #[test]
    fn ln_two_encloses_reference_value() {
        let (lo, hi) = ln_bounds(&r(2, 1), 64);
        assert!(to_f64(&lo) <= std::f64::consts::LN_2 + 1e-15);
        assert!(to_f64(&hi) >= std::f64::consts::LN_2 - 1e-15);
        assert!(&hi - &lo < r(1, 1 << 40));
    }

    #[test]
    fn ln_of_small_values_is_negative() {
        let (lo, hi) = ln_bounds(&r(1, 8), 64);
        let expected = -3.0 * std::f64::consts::LN_2;
        assert!(to_f64(&lo) <= expected + 1e-12);
        assert!(to_f64(&hi) >= expected - 1e-12);
    }

    #[test]
    fn exp_encloses_e() {
        let (lo, hi) = exp_bounds(&r(1, 1), 64);
        assert!(to_f64(&lo) <= std::f64::consts::E + 1e-15);
        assert!(to_f64(&hi) >= std::f64::consts::E - 1e-15);
    }

    #[test]
    fn exp_of_negative_argument() {
        let (lo, hi) = exp_bounds(&r(-3, 1), 64);
        let expected = (-3.0f64).exp();
        assert!(to_f64(&lo) <= expected + 1e-15);
        assert!(to_f64(&hi) >= expected - 1e-15);
        assert!(lo.is_positive());
    }

    #[test]
    fn exp_of_large_argument_stays_tight() {
        let (lo, hi) = exp_bounds(&r(5000, 1), 32);
        assert!(lo <= hi);
        assert!(&hi - &lo < r(1, 1 << 32));
        let expected = 5000.0 * std::f64::consts::LOG2_E;
        assert!((approx_log2(&lo) - expected).abs() < 1e-6);
    }

    #[test]
    fn exp_of_large_negative_argument_is_tiny_and_positive() {
        let (lo, hi) = exp_bounds(&r(-3000, 1), 32);
        assert!(!lo.is_negative());
        assert!(hi < r(1, 1 << 30));
    }

    #[test]
    fn ln_of_huge_rational() {
        let x = BigRational::from_integer(pow2(20_000));
        let (lo, hi) = ln_bounds(&x, 64);
        let expected = 20_000.0 * std::f64::consts::LN_2;
        assert!(to_f64(&lo) <= expected && to_f64(&hi) >= expected - 1e-9);
        assert!(&hi - &lo < r(1, 1 << 40));
    }

    #[test]
    fn fractional_powers_via_logarithms() {
        // 2^(1/100) and 3^(7/5)
        let (lo, hi) = rational_power_bounds(&r(2, 1), &r(2, 1), &r(1, 100), 64);
        let expected = 2f64.powf(0.01);
        assert!(to_f64(&lo) <= expected + 1e-15 && to_f64(&hi) >= expected - 1e-15);
        let (lo, hi) = rational_power_bounds(&r(3, 1), &r(3, 1), &r(7, 5), 64);
        let expected = 3f64.powf(1.4);
        assert!(to_f64(&lo) <= expected + 1e-12 && to_f64(&hi) >= expected - 1e-12);
        assert!(&hi - &lo < r(1, 1 << 40));
    }

    #[test]
    fn roots_bracket_irrational_values() {
        let lo = root_floor(&r(2, 1), 2, 40);
        let hi = root_ceil(&r(2, 1), 2, 40);
        assert!(&lo * &lo <= r(2, 1));
        assert!(&hi * &hi >= r(2, 1));
        assert!(hi - lo <= r(1, 1 << 39));
    }

    #[test]
    fn exact_roots_are_detected() {
        assert_eq!(exact_root(&r(9, 4), 2), Some(r(3, 2)));
        assert_eq!(exact_root(&r(2, 1), 2), None);
        assert_eq!(exact_root(&r(27, 8), 3), Some(r(3, 2)));
    }

    #[test]
    fn outward_rounding() {
        let third = r(1, 3);
        assert!(floor_to(&third, 10) <= third);
        assert!(ceil_to(&third, 10) >= third);
        assert_eq!(floor_to(&r(1, 2), 10), r(1, 2));
    }
}
