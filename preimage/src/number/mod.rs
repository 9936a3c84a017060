//! Exact real endpoints
//!
//! Rational values are kept as `BigRational`. Irrational values (roots, logarithms,
//! powers of e, polynomial roots) are kept as a recipe that yields a rational
//! enclosure of any requested precision. Two values are ordered by refining both
//! enclosures until they separate; values that still overlap after
//! [`MAX_SEPARATION_BITS`] bits are considered equal.
//!
//! Every irrational value also carries a rough sketch of its sign and binary
//! magnitude plus its nesting depth, read off the recipe at construction.
//! Solvers use them to refuse endpoints whose enclosures would be too costly
//! to refine.

pub mod enclosure;

use enclosure::Bounds;
use num_bigint::BigInt;
use num_integer::Integer;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::cmp::Ordering;
use std::fmt;
use std::sync::{Arc, Mutex};

/// Precision at which overlapping enclosures are declared equal
///
/// This makes `Ord for Real` non-transitive for values closer than about
/// `2^-256`: `a == b` and `b == c` do not imply `a == c`. Sorting goes through
/// [`Real::sort_key`], which is a total order, instead of `cmp`.
pub const MAX_SEPARATION_BITS: u32 = 256;

const INITIAL_BITS: u32 = 32;
const GUARD_BITS: u32 = 16;
/// Rational exponents with a denominator beyond this many bits stay symbolic
const MAX_EXACT_EXPONENT_BITS: u64 = 10;
/// Exact powers are expanded only while the result stays below this many bits
const MAX_EXACT_POWER_BITS: u64 = 1 << 16;
/// Nested roots collapse while the combined numerator and denominator stay this small
const MAX_ROOT_DEGREE: u32 = 64;

/// Build the rational `n / d`
pub fn rational(n: i64, d: i64) -> BigRational {
    BigRational::new(BigInt::from(n), BigInt::from(d))
}

/// Build the rational `n`
pub fn integer(n: i64) -> BigRational {
    BigRational::from_integer(BigInt::from(n))
}

/// A real number with an exact rational fast path
#[derive(Clone)]
pub struct Real(Repr);

#[derive(Clone)]
enum Repr {
    Exact(BigRational),
    Approx(Arc<Irrational>),
}

struct Irrational {
    recipe: Recipe,
    cache: Mutex<Option<(u32, Bounds)>>,
    sketch: Sketch,
    depth: u32,
}

/// Rough sign and `log2 |v|` of a value
#[derive(Debug, Clone, Copy)]
struct Sketch {
    negative: bool,
    log2: f64,
}

impl Sketch {
    fn of_rational(r: &BigRational) -> Sketch {
        Sketch {
            negative: r.is_negative(),
            log2: enclosure::approx_log2(r),
        }
    }
}

enum Recipe {
    /// Euler's number
    E,
    /// `scale * of + offset`
    Affine {
        scale: BigRational,
        offset: BigRational,
        of: Real,
    },
    /// `base^(numer/denom)` for `base >= 0`
    Root { base: Real, numer: u32, denom: u32 },
    /// `1 / of` for non-zero `of`
    Recip(Real),
    /// `log_base(arg)`
    Log { arg: Real, base: Real },
    /// `base^exponent` for `base > 0`
    Exp { base: Real, exponent: Real },
    /// The unique point in `(lo, hi)` where `p(x) - bound` changes sign;
    /// negative to positive when `rising`
    PolyRoot {
        coeffs: Vec<BigRational>,
        bound: Real,
        lo: BigRational,
        hi: BigRational,
        rising: bool,
    },
    /// `p(at)`
    PolyValue { coeffs: Vec<BigRational>, at: Real },
}

impl Real {
    pub fn zero() -> Self {
        Real(Repr::Exact(BigRational::zero()))
    }

    pub fn one() -> Self {
        Real(Repr::Exact(BigRational::one()))
    }

    /// Euler's number
    pub fn e() -> Self {
        Real::irrational(Recipe::E)
    }

    pub fn from_rational(value: BigRational) -> Self {
        Real(Repr::Exact(value))
    }

    /// Exact conversion of a finite float
    pub fn from_f64(value: f64) -> Option<Self> {
        BigRational::from_float(value).map(Real::from_rational)
    }

    fn irrational(recipe: Recipe) -> Self {
        let sketch = recipe.sketch();
        let depth = recipe.depth();
        Real(Repr::Approx(Arc::new(Irrational {
            recipe,
            cache: Mutex::new(None),
            sketch,
            depth,
        })))
    }

    fn sketch(&self) -> Sketch {
        match &self.0 {
            Repr::Exact(r) => Sketch::of_rational(r),
            Repr::Approx(node) => node.sketch,
        }
    }

    /// Order-of-magnitude estimate of `log2 |self|`, read off the recipe
    /// without refining it; `-∞` for an exact zero
    pub fn log2_estimate(&self) -> f64 {
        self.sketch().log2
    }

    /// Symbolic operations between this value and exact rationals
    pub fn symbolic_depth(&self) -> u32 {
        match &self.0 {
            Repr::Exact(_) => 0,
            Repr::Approx(node) => node.depth,
        }
    }

    /// A rational within `2^-256` of the value
    ///
    /// Keys are totally ordered and agree with `cmp` for every pair of values
    /// that `cmp` can separate at that precision.
    pub fn sort_key(&self) -> BigRational {
        match &self.0 {
            Repr::Exact(r) => r.clone(),
            Repr::Approx(_) => self.enclose(MAX_SEPARATION_BITS).0,
        }
    }

    pub(crate) fn poly_root(
        coeffs: Vec<BigRational>,
        bound: Real,
        lo: BigRational,
        hi: BigRational,
        rising: bool,
    ) -> Self {
        Real::irrational(Recipe::PolyRoot {
            coeffs,
            bound,
            lo,
            hi,
            rising,
        })
    }

    /// The rational value, when known exactly
    pub fn as_rational(&self) -> Option<&BigRational> {
        match &self.0 {
            Repr::Exact(r) => Some(r),
            Repr::Approx(_) => None,
        }
    }

    pub fn is_exact(&self) -> bool {
        matches!(self.0, Repr::Exact(_))
    }

    pub fn is_zero(&self) -> bool {
        self.signum() == Ordering::Equal
    }

    pub fn is_positive(&self) -> bool {
        self.signum() == Ordering::Greater
    }

    pub fn is_negative(&self) -> bool {
        self.signum() == Ordering::Less
    }

    /// Sign as an ordering against zero
    pub fn signum(&self) -> Ordering {
        match &self.0 {
            Repr::Exact(r) => r.cmp(&BigRational::zero()),
            Repr::Approx(_) => self.cmp(&Real::zero()),
        }
    }

    pub fn to_f64(&self) -> f64 {
        match &self.0 {
            Repr::Exact(r) => enclosure::to_f64(r),
            Repr::Approx(_) => {
                let (lo, hi) = self.enclose(64);
                enclosure::to_f64(&((lo + hi) / integer(2)))
            }
        }
    }

    /// `scale * self + offset`
    pub fn affine(&self, scale: &BigRational, offset: &BigRational) -> Real {
        if scale.is_zero() {
            return Real::from_rational(offset.clone());
        }
        match &self.0 {
            Repr::Exact(r) => Real::from_rational(r * scale + offset),
            Repr::Approx(node) => match &node.recipe {
                Recipe::Affine {
                    scale: inner_scale,
                    offset: inner_offset,
                    of,
                } => Real::irrational(Recipe::Affine {
                    scale: scale * inner_scale,
                    offset: scale * inner_offset + offset,
                    of: of.clone(),
                }),
                _ => Real::irrational(Recipe::Affine {
                    scale: scale.clone(),
                    offset: offset.clone(),
                    of: self.clone(),
                }),
            },
        }
    }

    pub fn recip(&self) -> Option<Real> {
        if self.is_zero() {
            return None;
        }
        Some(match &self.0 {
            Repr::Exact(r) => Real::from_rational(r.recip()),
            Repr::Approx(_) => Real::irrational(Recipe::Recip(self.clone())),
        })
    }

    /// `self^exponent` over the reals
    ///
    /// Negative bases are allowed when the exponent has an odd denominator.
    /// Returns `None` where the power is undefined (`0^-1`, `(-1)^(1/2)`).
    pub fn pow(&self, exponent: &BigRational) -> Option<Real> {
        if exponent.is_zero() {
            return Some(Real::one());
        }
        let numer = exponent.numer().abs().to_u32()?;
        let denom = exponent.denom().to_u32()?;
        match self.signum() {
            Ordering::Equal => {
                if exponent.is_positive() {
                    Some(Real::zero())
                } else {
                    None
                }
            }
            Ordering::Less => {
                if denom % 2 == 0 {
                    return None;
                }
                let magnitude = (-self).pow(exponent)?;
                if numer % 2 == 1 {
                    Some(-magnitude)
                } else {
                    Some(magnitude)
                }
            }
            Ordering::Greater => {
                let positive = match &self.0 {
                    Repr::Exact(r)
                        if u64::from(numer).saturating_mul(r.numer().bits() + r.denom().bits())
                            > MAX_EXACT_POWER_BITS =>
                    {
                        Real::irrational(Recipe::Root {
                            base: self.clone(),
                            numer,
                            denom,
                        })
                    }
                    Repr::Exact(r) => {
                        let raised = enclosure::powi(r, numer as i64);
                        match enclosure::exact_root(&raised, denom) {
                            Some(root) => Real::from_rational(root),
                            None => Real::irrational(Recipe::Root {
                                base: Real::from_rational(raised),
                                numer: 1,
                                denom,
                            }),
                        }
                    }
                    Repr::Approx(node) => match &node.recipe {
                        // (b^(n/d))^(m/k) = b^(nm/dk)
                        Recipe::Root {
                            base,
                            numer: inner_numer,
                            denom: inner_denom,
                        } if inner_numer.saturating_mul(numer) <= MAX_ROOT_DEGREE
                            && inner_denom.saturating_mul(denom) <= MAX_ROOT_DEGREE =>
                        {
                            let n = inner_numer * numer;
                            let d = inner_denom * denom;
                            let common = n.gcd(&d);
                            Real::irrational(Recipe::Root {
                                base: base.clone(),
                                numer: n / common,
                                denom: d / common,
                            })
                        }
                        _ => Real::irrational(Recipe::Root {
                            base: self.clone(),
                            numer,
                            denom,
                        }),
                    },
                };
                if exponent.is_negative() {
                    positive.recip()
                } else {
                    Some(positive)
                }
            }
        }
    }

    /// `log_base(self)`; `None` unless `self > 0`, `base > 0` and `base != 1`
    pub fn log(&self, base: &Real) -> Option<Real> {
        if !self.is_positive() || !base.is_positive() || *base == Real::one() {
            return None;
        }
        if *self == Real::one() {
            return Some(Real::zero());
        }
        if self.same_node(base) {
            return Some(Real::one());
        }
        if let Repr::Approx(node) = &self.0 {
            if let Recipe::Exp {
                base: inner,
                exponent,
            } = &node.recipe
            {
                if inner.same_base(base) {
                    return Some(exponent.clone());
                }
            }
        }
        if let (Repr::Exact(y), Repr::Exact(b)) = (&self.0, &base.0) {
            if let Some(exact) = exact_log(y, b) {
                return Some(Real::from_rational(exact));
            }
        }
        Some(Real::irrational(Recipe::Log {
            arg: self.clone(),
            base: base.clone(),
        }))
    }

    /// `self^exponent` for a positive base and any real exponent
    ///
    /// A rational base raised to a rational exponent with a small denominator
    /// is expanded exactly while the result stays below a fixed size; larger
    /// powers stay symbolic.
    pub fn raise(&self, exponent: &Real) -> Option<Real> {
        if !self.is_positive() {
            return None;
        }
        match (&self.0, &exponent.0) {
            (_, Repr::Exact(e)) if e.is_zero() => Some(Real::one()),
            (_, Repr::Exact(e)) if e.is_one() => Some(self.clone()),
            (_, Repr::Approx(node)) => match &node.recipe {
                Recipe::Log { arg, base } if base.same_base(self) => Some(arg.clone()),
                _ => Some(self.symbolic_power(exponent)),
            },
            (Repr::Exact(b), Repr::Exact(e)) if e.denom().bits() <= MAX_EXACT_EXPONENT_BITS => {
                let size = e
                    .numer()
                    .magnitude()
                    .to_u64()
                    .and_then(|n| n.checked_mul(b.numer().bits() + b.denom().bits()));
                match size {
                    Some(bits) if bits <= MAX_EXACT_POWER_BITS => self.pow(e),
                    _ => Some(self.symbolic_power(exponent)),
                }
            }
            _ => Some(self.symbolic_power(exponent)),
        }
    }

    fn symbolic_power(&self, exponent: &Real) -> Real {
        Real::irrational(Recipe::Exp {
            base: self.clone(),
            exponent: exponent.clone(),
        })
    }

    /// Value of the polynomial with ascending `coeffs` at `at`
    pub fn poly_value(coeffs: &[BigRational], at: &Real) -> Real {
        match &at.0 {
            Repr::Exact(x) => Real::from_rational(horner(coeffs, x)),
            Repr::Approx(_) => Real::irrational(Recipe::PolyValue {
                coeffs: coeffs.to_vec(),
                at: at.clone(),
            }),
        }
    }

    /// A rational strictly between `self` and a larger `other`
    pub fn rational_between(&self, other: &Real) -> Option<BigRational> {
        if let (Repr::Exact(a), Repr::Exact(b)) = (&self.0, &other.0) {
            return (a < b).then(|| (a + b) / integer(2));
        }
        let mut bits = INITIAL_BITS;
        loop {
            let (_, a_hi) = self.enclose(bits);
            let (b_lo, _) = other.enclose(bits);
            if a_hi < b_lo {
                return Some((a_hi + b_lo) / integer(2));
            }
            if bits >= MAX_SEPARATION_BITS {
                return None;
            }
            bits *= 2;
        }
    }

    /// A rational at most `self - 1`
    pub fn rational_below(&self) -> BigRational {
        self.enclose(INITIAL_BITS).0.floor() - BigRational::one()
    }

    /// A rational at least `self + 1`
    pub fn rational_above(&self) -> BigRational {
        self.enclose(INITIAL_BITS).1.ceil() + BigRational::one()
    }

    /// Ordering that reports `None` when the values could not be separated
    pub fn try_cmp(&self, other: &Real) -> Option<Ordering> {
        match (&self.0, &other.0) {
            (Repr::Exact(a), Repr::Exact(b)) => Some(a.cmp(b)),
            _ if self.same_node(other) => Some(Ordering::Equal),
            _ => {
                let mut bits = INITIAL_BITS;
                loop {
                    let (a_lo, a_hi) = self.enclose(bits);
                    let (b_lo, b_hi) = other.enclose(bits);
                    if a_hi < b_lo {
                        return Some(Ordering::Less);
                    }
                    if a_lo > b_hi {
                        return Some(Ordering::Greater);
                    }
                    if bits >= MAX_SEPARATION_BITS {
                        return None;
                    }
                    bits *= 2;
                }
            }
        }
    }

    fn same_node(&self, other: &Real) -> bool {
        match (&self.0, &other.0) {
            (Repr::Approx(a), Repr::Approx(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }

    /// Rational enclosure `[lo, hi]` whose width shrinks as `bits` grows
    pub(crate) fn enclose(&self, bits: u32) -> Bounds {
        let node = match &self.0 {
            Repr::Exact(r) => return (r.clone(), r.clone()),
            Repr::Approx(node) => node,
        };
        if let Ok(cache) = node.cache.lock() {
            if let Some((cached_bits, bounds)) = cache.as_ref() {
                if *cached_bits >= bits {
                    return bounds.clone();
                }
            }
        }
        let bounds = node.recipe.enclose(bits, node.sketch.log2);
        if let Ok(mut cache) = node.cache.lock() {
            *cache = Some((bits, bounds.clone()));
        }
        bounds
    }

    /// Enclosure refined until it lies strictly on one side of zero
    fn enclose_signed(&self, bits: u32) -> Bounds {
        let give_up = bits.saturating_add(4 * MAX_SEPARATION_BITS);
        let mut current = bits.saturating_add(lift(0.0, self.log2_estimate()));
        loop {
            let bounds = self.enclose(current);
            if bounds.0.is_positive() || bounds.1.is_negative() || current >= give_up {
                return bounds;
            }
            current = current.saturating_mul(2);
        }
    }

    /// Same value as a logarithm or exponential base, without refinement
    fn same_base(&self, other: &Real) -> bool {
        match (&self.0, &other.0) {
            (Repr::Exact(a), Repr::Exact(b)) => a == b,
            _ => self.same_node(other) || (self.is_e() && other.is_e()),
        }
    }

    fn is_e(&self) -> bool {
        matches!(&self.0, Repr::Approx(node) if matches!(node.recipe, Recipe::E))
    }
}

impl Recipe {
    fn depth(&self) -> u32 {
        let children = match self {
            Recipe::E => 0,
            Recipe::Affine { of, .. } | Recipe::Recip(of) => of.symbolic_depth(),
            Recipe::Root { base, .. } => base.symbolic_depth(),
            Recipe::Log { arg, base } => arg.symbolic_depth().max(base.symbolic_depth()),
            Recipe::Exp { base, exponent } => base.symbolic_depth().max(exponent.symbolic_depth()),
            Recipe::PolyRoot { bound, .. } => bound.symbolic_depth(),
            Recipe::PolyValue { at, .. } => at.symbolic_depth(),
        };
        children.saturating_add(1)
    }

    fn sketch(&self) -> Sketch {
        match self {
            Recipe::E => Sketch {
                negative: false,
                log2: std::f64::consts::LOG2_E,
            },
            Recipe::Affine { scale, offset, of } => {
                let inner = of.sketch();
                let term = Sketch {
                    negative: scale.is_negative() != inner.negative,
                    log2: enclosure::approx_log2(scale) + inner.log2,
                };
                sum_sketch(term, Sketch::of_rational(offset))
            }
            Recipe::Root { base, numer, denom } => Sketch {
                negative: false,
                log2: base.log2_estimate() * f64::from(*numer) / f64::from(*denom),
            },
            Recipe::Recip(of) => {
                let inner = of.sketch();
                Sketch {
                    negative: inner.negative,
                    log2: -inner.log2,
                }
            }
            Recipe::Log { arg, base } => {
                let (a, b) = (arg.log2_estimate(), base.log2_estimate());
                Sketch {
                    negative: (a < 0.0) != (b < 0.0),
                    log2: a.abs().max(NEAR_ONE).log2() - b.abs().max(NEAR_ONE).log2(),
                }
            }
            Recipe::Exp { base, exponent } => {
                let b = base.log2_estimate();
                let e = exponent.sketch();
                let size = e.log2.exp2();
                let log2 = if b == 0.0 {
                    0.0
                } else if e.negative {
                    -size * b
                } else {
                    size * b
                };
                Sketch {
                    negative: false,
                    log2,
                }
            }
            Recipe::PolyRoot { lo, hi, .. } => Sketch::of_rational(&((lo + hi) / integer(2))),
            Recipe::PolyValue { coeffs, at } => {
                let x = at.sketch();
                coeffs
                    .iter()
                    .enumerate()
                    .filter(|(_, c)| !c.is_zero())
                    .map(|(i, c)| Sketch {
                        negative: c.is_negative() != (x.negative && i % 2 == 1),
                        log2: if i == 0 {
                            enclosure::approx_log2(c)
                        } else {
                            enclosure::approx_log2(c) + i as f64 * x.log2
                        },
                    })
                    .fold(
                        Sketch {
                            negative: false,
                            log2: f64::NEG_INFINITY,
                        },
                        sum_sketch,
                    )
            }
        }
    }

    /// Enclosure of width about `2^-bits`; `own` is the value's `log2` estimate
    fn enclose(&self, bits: u32, own: f64) -> Bounds {
        let g = bits.saturating_add(GUARD_BITS);
        match self {
            Recipe::E => enclosure::exp_bounds(&BigRational::one(), g),
            Recipe::Affine { scale, offset, of } => {
                let extra = lift(enclosure::approx_log2(scale), 0.0);
                let (lo, hi) = of.enclose(g.saturating_add(extra));
                let (a, b) = (scale * lo + offset, scale * hi + offset);
                if scale.is_negative() {
                    (b, a)
                } else {
                    (a, b)
                }
            }
            Recipe::Root { base, numer, denom } => {
                let scale = base.log2_estimate();
                let precision = bits
                    .saturating_add(2)
                    .saturating_add(lift(own, scale))
                    .saturating_add(enclosure::bit_length(u64::from(*numer)));
                let (lo, hi) = base.enclose(precision);
                let lo = if lo.is_negative() {
                    BigRational::zero()
                } else {
                    lo
                };
                let expanded = scale.abs() * f64::from(*numer);
                if *numer <= MAX_ROOT_DEGREE && *denom <= MAX_ROOT_DEGREE && expanded <= 4096.0 {
                    (
                        enclosure::root_floor(&enclosure::powi(&lo, i64::from(*numer)), *denom, g),
                        enclosure::root_ceil(&enclosure::powi(&hi, i64::from(*numer)), *denom, g),
                    )
                } else {
                    let exponent =
                        BigRational::new(BigInt::from(*numer), BigInt::from(*denom));
                    enclosure::rational_power_bounds(&lo, &hi, &exponent, g)
                }
            }
            Recipe::Recip(of) => {
                let precision = g.saturating_add(2 * lift(0.0, of.log2_estimate()));
                let (lo, hi) = of.enclose_signed(precision);
                if lo.is_zero() || hi.is_zero() || (lo.is_negative() && hi.is_positive()) {
                    let wide = BigRational::from_integer(enclosure::pow2(g));
                    return (-wide.clone(), wide);
                }
                (
                    enclosure::floor_to(&hi.recip(), g),
                    enclosure::ceil_to(&lo.recip(), g),
                )
            }
            Recipe::Log { arg, base } => {
                let ln_base_log2 = base.log2_estimate().abs().max(NEAR_ONE).log2();
                let mut precision = g
                    .saturating_add(lift(0.0, ln_base_log2))
                    .saturating_add(lift(own, 0.0))
                    .saturating_add(2);
                let give_up = precision.saturating_add(4 * MAX_SEPARATION_BITS);
                let denominator = loop {
                    let candidate = ln_of(base, precision);
                    if candidate.0.is_positive() || candidate.1.is_negative() {
                        break candidate;
                    }
                    if precision >= give_up {
                        let wide = BigRational::from_integer(enclosure::pow2(g));
                        return (-wide.clone(), wide);
                    }
                    precision = precision.saturating_mul(2);
                };
                let numerator = ln_of(arg, precision);
                enclosure::div(&numerator, &denominator)
            }
            Recipe::Exp { base, exponent } => {
                let target = g.saturating_add(lift(own, 0.0)).saturating_add(2);
                let ln_precision = target.saturating_add(lift(exponent.log2_estimate(), 0.0));
                let ln_base = ln_of(base, ln_precision);
                let ln_size = base.log2_estimate().abs().max(NEAR_ONE).log2();
                let exponent_precision = target.saturating_add(lift(ln_size, 0.0));
                let power = enclosure::mul(&ln_base, &exponent.enclose(exponent_precision));
                (
                    enclosure::exp_bounds(&enclosure::floor_to(&power.0, target), g).0,
                    enclosure::exp_bounds(&enclosure::ceil_to(&power.1, target), g).1,
                )
            }
            Recipe::PolyRoot {
                coeffs,
                bound,
                lo,
                hi,
                rising,
            } => {
                let width = BigRational::new(BigInt::one(), enclosure::pow2(bits));
                let (mut lo, mut hi) = (lo.clone(), hi.clone());
                while &hi - &lo > width {
                    let mid = (&lo + &hi) / integer(2);
                    let value = Real::from_rational(horner(coeffs, &mid));
                    match (value.cmp(bound), rising) {
                        (Ordering::Equal, _) => return (mid.clone(), mid),
                        (Ordering::Less, true) | (Ordering::Greater, false) => lo = mid,
                        (Ordering::Less, false) | (Ordering::Greater, true) => hi = mid,
                    }
                }
                (lo, hi)
            }
            Recipe::PolyValue { coeffs, at } => {
                let reach = at.log2_estimate().max(0.0);
                let degree = coeffs.len().saturating_sub(1) as f64;
                let slope = coeffs
                    .iter()
                    .enumerate()
                    .skip(1)
                    .filter(|(_, c)| !c.is_zero())
                    .map(|(i, c)| {
                        enclosure::approx_log2(c) + (i as f64).log2() + (i - 1) as f64 * reach
                    })
                    .fold(0.0, f64::max);
                let working = g.saturating_add(16).saturating_add(lift(degree * reach, 0.0));
                let x = at.enclose(working.saturating_add(lift(slope, 0.0)));
                let mut acc: Bounds = match coeffs.last() {
                    Some(lead) => (lead.clone(), lead.clone()),
                    None => return (BigRational::zero(), BigRational::zero()),
                };
                for c in coeffs.iter().rev().skip(1) {
                    let product = enclosure::mul(&acc, &x);
                    acc = (
                        enclosure::floor_to(&(product.0 + c), working),
                        enclosure::ceil_to(&(product.1 + c), working),
                    );
                }
                acc
            }
        }
    }
}

/// Floor on `|log2 x|` estimates for `x` near one
const NEAR_ONE: f64 = 1e-18;

/// Most extra bits any single magnitude estimate can ask for
const MAX_LIFT_BITS: f64 = (1u32 << 24) as f64;

/// Extra bits needed to carry a magnitude of `2^to` at the precision of `2^from`
fn lift(to: f64, from: f64) -> u32 {
    (to - from).max(0.0).min(MAX_LIFT_BITS).ceil() as u32
}

/// Sketch of `a + b` from the sketches of its terms
fn sum_sketch(a: Sketch, b: Sketch) -> Sketch {
    if b.log2 == f64::NEG_INFINITY {
        return a;
    }
    if a.log2 == f64::NEG_INFINITY {
        return b;
    }
    if a.log2.abs() < 1000.0 && b.log2.abs() < 1000.0 {
        let value = |s: Sketch| if s.negative { -s.log2.exp2() } else { s.log2.exp2() };
        let total = value(a) + value(b);
        return Sketch {
            negative: total < 0.0,
            log2: total.abs().log2(),
        };
    }
    if a.log2 >= b.log2 {
        a
    } else {
        b
    }
}

/// Natural log enclosure of a positive value
fn ln_of(x: &Real, bits: u32) -> Bounds {
    if x.is_e() {
        return (BigRational::one(), BigRational::one());
    }
    let (lo, hi) = x.enclose_signed(bits);
    if !lo.is_positive() {
        // Unreachable for validated inputs; keep the enclosure sound regardless
        let floor = BigRational::new(BigInt::one(), enclosure::pow2(bits));
        return (
            enclosure::ln_bounds(&floor, bits).0,
            enclosure::ln_bounds(&hi.max(floor), bits).1,
        );
    }
    (
        enclosure::ln_bounds(&lo, bits).0,
        enclosure::ln_bounds(&hi, bits).1,
    )
}

/// Horner evaluation of ascending coefficients at a rational point
pub(crate) fn horner(coeffs: &[BigRational], x: &BigRational) -> BigRational {
    coeffs
        .iter()
        .rev()
        .fold(BigRational::zero(), |acc, c| acc * x + c)
}

/// `log_b(y)` when it is rational with a small denominator
fn exact_log(y: &BigRational, b: &BigRational) -> Option<BigRational> {
    let estimate = enclosure::approx_log2(y) / enclosure::approx_log2(b);
    if !estimate.is_finite() {
        return None;
    }
    for v in 1..=12i64 {
        let u = (estimate * v as f64).round();
        if u == 0.0 || u.abs() > 4096.0 {
            continue;
        }
        let u = u as i64;
        if enclosure::powi(b, u) == enclosure::powi(y, v) {
            return Some(rational(u, v));
        }
    }
    None
}

impl PartialEq for Real {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Real {}

impl PartialOrd for Real {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Real {
    fn cmp(&self, other: &Self) -> Ordering {
        self.try_cmp(other).unwrap_or(Ordering::Equal)
    }
}

impl std::ops::Neg for &Real {
    type Output = Real;

    fn neg(self) -> Real {
        self.affine(&integer(-1), &BigRational::zero())
    }
}

impl std::ops::Neg for Real {
    type Output = Real;

    fn neg(self) -> Real {
        -&self
    }
}

impl From<BigRational> for Real {
    fn from(value: BigRational) -> Self {
        Real::from_rational(value)
    }
}

impl From<BigInt> for Real {
    fn from(value: BigInt) -> Self {
        Real::from_rational(BigRational::from_integer(value))
    }
}

impl From<i64> for Real {
    fn from(value: i64) -> Self {
        Real::from_rational(integer(value))
    }
}

impl From<i32> for Real {
    fn from(value: i32) -> Self {
        Real::from(value as i64)
    }
}

impl fmt::Display for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.0 {
            Repr::Exact(r) => write!(f, "{}", r),
            Repr::Approx(node) => match node.recipe {
                Recipe::E => write!(f, "e"),
                _ => write!(f, "≈{:.6}", self.to_f64()),
            },
        }
    }
}

impl fmt::Debug for Real {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Real({})", self)
    }
}

/// A real number or one of the two infinities
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub enum ExtendedReal {
    NegInfinity,
    Finite(Real),
    PosInfinity,
}

impl ExtendedReal {
    pub fn finite(&self) -> Option<&Real> {
        match self {
            ExtendedReal::Finite(r) => Some(r),
            _ => None,
        }
    }

    pub fn is_finite(&self) -> bool {
        matches!(self, ExtendedReal::Finite(_))
    }
}

impl From<Real> for ExtendedReal {
    fn from(value: Real) -> Self {
        ExtendedReal::Finite(value)
    }
}

impl fmt::Display for ExtendedReal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtendedReal::NegInfinity => write!(f, "-∞"),
            ExtendedReal::Finite(r) => write!(f, "{}", r),
            ExtendedReal::PosInfinity => write!(f, "+∞"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real(n: i64, d: i64) -> Real {
        Real::from(rational(n, d))
    }

    #[test]
    fn exact_values_compare_exactly() {
        assert!(real(1, 3) < real(1, 2));
        assert_eq!(real(2, 4), real(1, 2));
    }

    #[test]
    fn perfect_powers_stay_exact() {
        let root = real(9, 4).pow(&rational(1, 2)).unwrap();
        assert_eq!(root.as_rational(), Some(&rational(3, 2)));
        let cube = real(-27, 1).pow(&rational(1, 3)).unwrap();
        assert_eq!(cube.as_rational(), Some(&integer(-3)));
    }

    #[test]
    fn square_root_of_two_is_ordered_against_rationals() {
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        assert!(!sqrt2.is_exact());
        assert!(sqrt2 > real(141, 100));
        assert!(sqrt2 < real(142, 100));
        assert!((sqrt2.to_f64() - std::f64::consts::SQRT_2).abs() < 1e-12);
    }

    #[test]
    fn irrational_values_that_agree_are_equal() {
        let a = Real::from(2).pow(&rational(1, 2)).unwrap();
        let b = Real::from(8).pow(&rational(1, 6)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn even_roots_of_negative_values_are_undefined() {
        assert!(Real::from(-4).pow(&rational(1, 2)).is_none());
        assert!(Real::zero().pow(&integer(-1)).is_none());
    }

    #[test]
    fn logarithms_of_exact_powers_are_rational() {
        let three = Real::from(8).log(&Real::from(2)).unwrap();
        assert_eq!(three.as_rational(), Some(&integer(3)));
        let half = Real::from(2).log(&Real::from(4)).unwrap();
        assert_eq!(half.as_rational(), Some(&rational(1, 2)));
        let minus_two = real(1, 100).log(&Real::from(10)).unwrap();
        assert_eq!(minus_two.as_rational(), Some(&integer(-2)));
    }

    #[test]
    fn natural_log_and_exp_round_trip() {
        let ln5 = Real::from(5).log(&Real::e()).unwrap();
        assert!((ln5.to_f64() - 5f64.ln()).abs() < 1e-12);
        let back = Real::e().raise(&ln5).unwrap();
        assert_eq!(back, Real::from(5));
    }

    #[test]
    fn nested_roots_collapse_into_one() {
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        let eighth = sqrt2.pow(&rational(1, 2)).unwrap().pow(&rational(1, 2)).unwrap();
        assert_eq!(eighth.symbolic_depth(), 1);
        assert!((eighth.to_f64() - 2f64.powf(0.125)).abs() < 1e-12);
    }

    #[test]
    fn huge_exact_powers_stay_symbolic() {
        let big = Real::from(3).raise(&Real::from(100_000)).unwrap();
        assert!(!big.is_exact());
        assert!((big.log2_estimate() - 100_000.0 * 3f64.log2()).abs() < 1e-6);
        let small = Real::from(3).raise(&Real::from(40)).unwrap();
        assert!(small.is_exact());
    }

    #[test]
    fn magnitude_estimates_follow_the_recipe() {
        let ln5 = Real::from(5).log(&Real::e()).unwrap();
        assert!((ln5.log2_estimate() - 5f64.ln().log2()).abs() < 1e-9);
        let tiny = Real::e().raise(&Real::from(-3000)).unwrap();
        assert!((tiny.log2_estimate() + 3000.0 * std::f64::consts::LOG2_E).abs() < 1e-6);
        assert!(tiny.is_positive());
        let negative = -Real::from(2).pow(&rational(1, 2)).unwrap();
        assert!(negative.is_negative());
        assert!((negative.log2_estimate() - 0.5).abs() < 1e-12);
    }

    #[test]
    fn sort_keys_are_total_and_agree_with_order() {
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        let mut values = vec![Real::from(3), sqrt2.clone(), Real::from(-1), Real::e()];
        values.sort_by_cached_key(Real::sort_key);
        assert_eq!(values, vec![Real::from(-1), sqrt2, Real::e(), Real::from(3)]);
    }

    #[test]
    fn logarithms_undo_matching_powers() {
        let y = Real::from(3).pow(&rational(1, 2)).unwrap();
        let power = Real::e().raise(&y).unwrap();
        let back = power.log(&Real::e()).unwrap();
        assert!(back.same_node(&y));
        let ln7 = Real::from(7).log(&Real::e()).unwrap();
        assert_eq!(Real::e().raise(&ln7).unwrap().symbolic_depth(), 0);
        let log2_3 = Real::from(3).log(&Real::from(2)).unwrap();
        assert_eq!(Real::from(2).raise(&log2_3).unwrap(), Real::from(3));
    }

    #[test]
    fn log_rejects_invalid_arguments() {
        assert!(Real::zero().log(&Real::from(2)).is_none());
        assert!(Real::from(3).log(&Real::one()).is_none());
        assert!(Real::from(3).log(&Real::from(-2)).is_none());
    }

    #[test]
    fn negation_and_affine_maps() {
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        let neg = -&sqrt2;
        assert!(neg.is_negative());
        assert_eq!(-neg, sqrt2);
    }

    #[test]
    fn rational_between_separates_close_values() {
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        let q = sqrt2.rational_between(&real(3, 2)).unwrap();
        let q = Real::from(q);
        assert!(sqrt2 < q && q < real(3, 2));
        assert!(Real::from(1).rational_between(&Real::from(1)).is_none());
    }

    #[test]
    fn display_forms() {
        assert_eq!(real(3, 4).to_string(), "3/4");
        assert_eq!(Real::from(-2).to_string(), "-2");
        assert_eq!(Real::e().to_string(), "e");
        let sqrt2 = Real::from(2).pow(&rational(1, 2)).unwrap();
        assert_eq!(sqrt2.to_string(), "≈1.414214");
    }

    #[test]
    fn extended_reals_order_infinities_outside() {
        let finite = ExtendedReal::Finite(Real::from(1_000_000));
        assert!(ExtendedReal::NegInfinity < finite);
        assert!(finite < ExtendedReal::PosInfinity);
    }
}
