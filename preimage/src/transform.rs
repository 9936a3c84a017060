//! Chains of invertible unary real functions
//!
//! A [`Transform`] is one free symbol wrapped in zero or more layers. The chain
//! is owned innermost-first, so the identity is a transform with no layers and
//! `abs(pow(x, 3))` is `x` followed by `Pow(3)` and then `Abs`.

use crate::expression::Symbol;
use crate::number::{ExtendedReal, Real};
use crate::polynomial;
use crate::realset::{Bound, Interval, RealSet, NON_NEGATIVE, POSITIVE};
use crate::{PreimageError, PreimageResult, ResourceLimits};
use num_bigint::BigInt;
use num_rational::BigRational;
use num_traits::{One, Signed, ToPrimitive, Zero};
use std::fmt;
use tracing::{trace, warn};

/// One function in a transform chain
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Layer {
    /// `|u|`
    Abs,
    /// `u^exponent` for a non-zero rational exponent
    Pow { exponent: BigRational },
    /// `base^u`
    Exp { base: Real },
    /// `log_base(u)`
    Log { base: Real },
    /// `c0 + c1*u + c2*u^2 + ...`
    Poly { coeffs: Vec<BigRational> },
}

/// A chain of layers around one free symbol
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Transform {
    symbol: Symbol,
    layers: Vec<Layer>,
}

impl Transform {
    pub fn identity(symbol: Symbol) -> Self {
        Transform {
            symbol,
            layers: Vec::new(),
        }
    }

    pub fn abs(inner: Transform) -> Self {
        inner.wrap(Layer::Abs)
    }

    /// `inner^exponent`; the exponent must be non-zero with a numerator and
    /// denominator that fit in 16 bits
    pub fn pow(inner: Transform, exponent: BigRational) -> PreimageResult<Self> {
        if exponent.is_zero() {
            return Err(PreimageError::invalid("power exponent must be non-zero"));
        }
        let fits = |n: &BigInt| n.abs().to_u16().is_some();
        if !fits(exponent.numer()) || !fits(exponent.denom()) {
            return Err(PreimageError::invalid(format!(
                "power exponent {} is too large",
                exponent
            )));
        }
        Ok(inner.wrap(Layer::Pow { exponent }))
    }

    /// `inner^(1/n)`
    pub fn radical(inner: Transform, n: u16) -> PreimageResult<Self> {
        if n == 0 {
            return Err(PreimageError::invalid("radical index must be positive"));
        }
        Transform::pow(
            inner,
            BigRational::new(BigInt::one(), BigInt::from(n)),
        )
    }

    pub fn sqrt(inner: Transform) -> PreimageResult<Self> {
        Transform::radical(inner, 2)
    }

    /// `base^inner`; the base must be positive and not one
    pub fn exp(inner: Transform, base: impl Into<Real>) -> PreimageResult<Self> {
        let base = checked_base(base.into(), "exponential")?;
        Ok(inner.wrap(Layer::Exp { base }))
    }

    pub fn exp_nat(inner: Transform) -> Self {
        inner.wrap(Layer::Exp { base: Real::e() })
    }

    /// `log_base(inner)`; the base must be positive and not one
    pub fn log(inner: Transform, base: impl Into<Real>) -> PreimageResult<Self> {
        let base = checked_base(base.into(), "logarithm")?;
        Ok(inner.wrap(Layer::Log { base }))
    }

    pub fn log_nat(inner: Transform) -> Self {
        inner.wrap(Layer::Log { base: Real::e() })
    }

    /// Polynomial in `inner` with ascending coefficients
    pub fn poly(inner: Transform, coeffs: Vec<BigRational>) -> PreimageResult<Self> {
        if coeffs.is_empty() {
            return Err(PreimageError::invalid(
                "polynomial needs at least one coefficient",
            ));
        }
        Ok(inner.wrap(Layer::Poly { coeffs }))
    }

    fn wrap(mut self, layer: Layer) -> Self {
        self.layers.push(layer);
        self
    }

    pub fn symbol(&self) -> &Symbol {
        &self.symbol
    }

    /// Layers innermost first
    pub fn layers(&self) -> &[Layer] {
        &self.layers
    }

    pub fn outermost(&self) -> Option<&Layer> {
        self.layers.last()
    }

    pub fn is_identity(&self) -> bool {
        self.layers.is_empty()
    }

    /// Number of layers between the symbol and the output
    pub fn depth(&self) -> usize {
        self.layers.len()
    }

    /// Inputs for which the outermost layer is defined
    pub fn domain(&self) -> RealSet {
        self.outermost()
            .map(Layer::domain)
            .unwrap_or_else(RealSet::reals)
    }

    /// Outputs the outermost layer can produce
    pub fn range(&self) -> RealSet {
        self.outermost()
            .map(|layer| layer.range(&ResourceLimits::default()))
            .unwrap_or_else(RealSet::reals)
    }

    /// Values of the symbol whose image under the whole chain lies in `target`
    pub fn solve(&self, target: &RealSet) -> PreimageResult<RealSet> {
        self.solve_with_limits(target, &ResourceLimits::default())
    }

    pub fn solve_with_limits(
        &self,
        target: &RealSet,
        limits: &ResourceLimits,
    ) -> PreimageResult<RealSet> {
        check_endpoints(target, limits)?;
        let mut current = target.clone();
        for layer in self.layers.iter().rev() {
            if current.is_empty() {
                break;
            }
            trace!(layer = %layer, target = %current, "inverting layer");
            current = layer.invert(&current, limits)?;
            check_endpoints(&current, limits)?;
        }
        Ok(current)
    }

    /// Apply the chain to a value of the symbol; `None` outside its domain
    pub fn evaluate(&self, x: &Real) -> Option<Real> {
        let mut value = x.clone();
        for layer in &self.layers {
            value = layer.apply(&value)?;
        }
        Some(value)
    }
}

fn checked_base(base: Real, what: &str) -> PreimageResult<Real> {
    if !base.is_positive() {
        return Err(PreimageError::invalid(format!(
            "{} base must be positive, got {}",
            what, base
        )));
    }
    if base == Real::one() {
        return Err(PreimageError::invalid(format!("{} base must not be 1", what)));
    }
    Ok(base)
}

fn is_odd_integer(exponent: &BigRational) -> bool {
    exponent.is_integer() && exponent.numer() % 2 != BigInt::zero()
}

fn nonzero_reals() -> RealSet {
    RealSet::less_than(0).union(&POSITIVE)
}

impl Layer {
    pub fn domain(&self) -> RealSet {
        match self {
            Layer::Abs | Layer::Exp { .. } | Layer::Poly { .. } => RealSet::reals(),
            Layer::Log { .. } => POSITIVE.clone(),
            Layer::Pow { exponent } => match (exponent.is_integer(), exponent.is_positive()) {
                (true, true) => RealSet::reals(),
                (true, false) => nonzero_reals(),
                (false, true) => NON_NEGATIVE.clone(),
                (false, false) => POSITIVE.clone(),
            },
        }
    }

    pub fn range(&self, limits: &ResourceLimits) -> RealSet {
        match self {
            Layer::Abs => NON_NEGATIVE.clone(),
            Layer::Exp { .. } => POSITIVE.clone(),
            Layer::Log { .. } => RealSet::reals(),
            Layer::Pow { exponent } => match (is_odd_integer(exponent), exponent.is_positive()) {
                (true, true) => RealSet::reals(),
                (true, false) => nonzero_reals(),
                (false, true) => NON_NEGATIVE.clone(),
                (false, false) => POSITIVE.clone(),
            },
            Layer::Poly { coeffs } => match polynomial::range(coeffs, limits) {
                Ok(range) => range,
                Err(err) => {
                    warn!(error = %err, "polynomial range unavailable, using the real line");
                    RealSet::reals()
                }
            },
        }
    }

    /// Forward map of this layer alone
    pub fn apply(&self, u: &Real) -> Option<Real> {
        match self {
            Layer::Abs => Some(if u.is_negative() { -u } else { u.clone() }),
            Layer::Pow { exponent } => {
                if !self.domain().contains(u) {
                    return None;
                }
                u.pow(exponent)
            }
            Layer::Exp { base } => base.raise(u),
            Layer::Log { base } => u.log(base),
            Layer::Poly { coeffs } => Some(Real::poly_value(coeffs, u)),
        }
    }

    /// Preimage of `target` under this layer alone, component by component
    pub fn invert(&self, target: &RealSet, limits: &ResourceLimits) -> PreimageResult<RealSet> {
        let within = match self {
            // log maps onto the whole line, and a polynomial solve needs no pre-clipping
            Layer::Log { .. } | Layer::Poly { .. } => target.clone(),
            _ => target.intersection(&self.range(limits)),
        };
        let mut pieces: Vec<Interval> = Vec::new();
        for component in &within {
            match self {
                Layer::Abs => {
                    pieces.push(component.clone());
                    pieces.extend(monotone_image(component, limits, false, |v| Ok(negate(v)))?);
                }
                Layer::Pow { exponent } if exponent.is_positive() => {
                    let root = exponent.recip();
                    pieces.extend(monotone_image(component, limits, true, |v| match v {
                        ExtendedReal::Finite(y) => y
                            .pow(&root)
                            .map(ExtendedReal::Finite)
                            .ok_or_else(|| outside(y, self)),
                        infinite => Ok(infinite.clone()),
                    })?);
                }
                Layer::Pow { exponent } => {
                    let root = exponent.recip();
                    let halves = [
                        (POSITIVE.clone(), ExtendedReal::PosInfinity),
                        (RealSet::less_than(0), ExtendedReal::NegInfinity),
                    ];
                    for (half, zero_to) in halves {
                        let part = RealSet::from(component.clone()).intersection(&half);
                        for piece in &part {
                            pieces.extend(monotone_image(piece, limits, false, |v| match v {
                                ExtendedReal::Finite(y) if y.is_zero() => Ok(zero_to.clone()),
                                ExtendedReal::Finite(y) => y
                                    .pow(&root)
                                    .map(ExtendedReal::Finite)
                                    .ok_or_else(|| outside(y, self)),
                                _ => Ok(ExtendedReal::Finite(Real::zero())),
                            })?);
                        }
                    }
                }
                Layer::Exp { base } => {
                    let increasing = *base > Real::one();
                    pieces.extend(monotone_image(component, limits, increasing, |v| match v {
                        ExtendedReal::Finite(y) if !y.is_positive() => {
                            Ok(if increasing {
                                ExtendedReal::NegInfinity
                            } else {
                                ExtendedReal::PosInfinity
                            })
                        }
                        ExtendedReal::Finite(y) => y
                            .log(base)
                            .map(ExtendedReal::Finite)
                            .ok_or_else(|| outside(y, self)),
                        ExtendedReal::PosInfinity if increasing => Ok(ExtendedReal::PosInfinity),
                        _ => Ok(ExtendedReal::NegInfinity),
                    })?);
                }
                Layer::Log { base } => {
                    let increasing = *base > Real::one();
                    pieces.extend(monotone_image(component, limits, increasing, |v| match v {
                        ExtendedReal::Finite(y) => base
                            .raise(y)
                            .map(ExtendedReal::Finite)
                            .ok_or_else(|| outside(y, self)),
                        ExtendedReal::PosInfinity if increasing => Ok(ExtendedReal::PosInfinity),
                        ExtendedReal::NegInfinity if !increasing => Ok(ExtendedReal::PosInfinity),
                        _ => Ok(ExtendedReal::Finite(Real::zero())),
                    })?);
                }
                Layer::Poly { coeffs } => {
                    let solved = polynomial::solve_with_limits(coeffs, component, limits)?;
                    pieces.extend(solved);
                }
            }
        }
        Ok(RealSet::from_intervals(pieces))
    }
}

fn negate(v: &ExtendedReal) -> ExtendedReal {
    match v {
        ExtendedReal::NegInfinity => ExtendedReal::PosInfinity,
        ExtendedReal::Finite(r) => ExtendedReal::Finite(-r),
        ExtendedReal::PosInfinity => ExtendedReal::NegInfinity,
    }
}

fn outside(y: &Real, layer: &Layer) -> PreimageError {
    PreimageError::invalid(format!("{} is outside the range of {}", y, layer))
}

/// Image of one interval under a monotone inverse applied to its endpoints
///
/// Openness travels with each endpoint; a decreasing map swaps the ends. An
/// infinite endpoint that lands on a finite value is open there.
fn monotone_image(
    interval: &Interval,
    limits: &ResourceLimits,
    increasing: bool,
    map: impl Fn(&ExtendedReal) -> PreimageResult<ExtendedReal>,
) -> PreimageResult<Option<Interval>> {
    let low = map(&interval.lower())?;
    let high = map(&interval.upper())?;
    check_endpoint(&low, limits)?;
    check_endpoint(&high, limits)?;
    let low = to_bound(low, interval.min().is_inclusive());
    let high = to_bound(high, interval.max().is_inclusive());
    Ok(if increasing {
        Interval::checked(low, high)
    } else {
        Interval::checked(high, low)
    })
}

/// Refuse endpoints too deep or too far from one to compare at bounded cost
///
/// Runs on the magnitude and depth sketches alone, before any enclosure of the
/// endpoint is refined.
fn check_endpoint(value: &ExtendedReal, limits: &ResourceLimits) -> PreimageResult<()> {
    let value = match value {
        ExtendedReal::Finite(value) => value,
        _ => return Ok(()),
    };
    let depth = value.symbolic_depth();
    if depth > limits.max_endpoint_depth {
        return Err(PreimageError::exhausted(format!(
            "interval endpoint nests {} symbolic operations, limit is {}",
            depth, limits.max_endpoint_depth
        )));
    }
    let magnitude = value.log2_estimate();
    if magnitude != f64::NEG_INFINITY && !(magnitude.abs() <= limits.max_magnitude_bits as f64) {
        return Err(PreimageError::exhausted(format!(
            "interval endpoint near 2^{:.0} is beyond the {}-bit magnitude limit",
            magnitude, limits.max_magnitude_bits
        )));
    }
    Ok(())
}

fn check_endpoints(set: &RealSet, limits: &ResourceLimits) -> PreimageResult<()> {
    for interval in set {
        check_endpoint(&interval.lower(), limits)?;
        check_endpoint(&interval.upper(), limits)?;
    }
    Ok(())
}

fn to_bound(value: ExtendedReal, inclusive: bool) -> Bound {
    match value {
        ExtendedReal::Finite(r) if inclusive => Bound::Inclusive(r),
        ExtendedReal::Finite(r) => Bound::Exclusive(r),
        _ => Bound::Unbounded,
    }
}

fn base_suffix(base: &Real) -> String {
    if *base == Real::e() {
        String::new()
    } else {
        format!("_{}", base)
    }
}

impl fmt::Display for Layer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Layer::Abs => write!(f, "abs"),
            Layer::Pow { exponent } => write!(f, "pow({})", exponent),
            Layer::Exp { base } => write!(f, "exp{}", base_suffix(base)),
            Layer::Log { base } => write!(f, "log{}", base_suffix(base)),
            Layer::Poly { coeffs } => {
                let list: Vec<String> = coeffs.iter().map(|c| c.to_string()).collect();
                write!(f, "poly[{}]", list.join(", "))
            }
        }
    }
}

impl fmt::Display for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut text = self.symbol.to_string();
        let mut atomic = true;
        for layer in &self.layers {
            text = match layer {
                Layer::Abs => format!("|{}|", text),
                Layer::Pow { exponent } => {
                    let base = if atomic { text } else { format!("({})", text) };
                    if exponent.is_integer() && exponent.is_positive() {
                        format!("{}^{}", base, exponent)
                    } else {
                        format!("{}^({})", base, exponent)
                    }
                }
                Layer::Exp { base } => format!("exp{}({})", base_suffix(base), text),
                Layer::Log { base } => format!("log{}({})", base_suffix(base), text),
                Layer::Poly { coeffs } => {
                    let list: Vec<String> = coeffs.iter().map(|c| c.to_string()).collect();
                    format!("poly[{}]({})", list.join(", "), text)
                }
            };
            atomic = !matches!(layer, Layer::Pow { .. });
        }
        write!(f, "{}", text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::{integer, rational};

    fn x() -> Transform {
        Transform::identity(Symbol::new("x"))
    }

    fn closed(a: i64, b: i64) -> RealSet {
        RealSet::closed(a, b).unwrap()
    }

    #[test]
    fn identity_returns_target() {
        let target = closed(0, 1).union(&RealSet::greater_than(5));
        assert_eq!(x().solve(&target).unwrap(), target);
    }

    #[test]
    fn abs_reflects_with_matching_openness() {
        let t = Transform::abs(x());
        let target = RealSet::left_open(1, 4).unwrap();
        let expected = RealSet::right_open(-4, -1)
            .unwrap()
            .union(&RealSet::left_open(1, 4).unwrap());
        assert_eq!(t.solve(&target).unwrap(), expected);
    }

    #[test]
    fn abs_clips_negative_targets() {
        let t = Transform::abs(x());
        assert!(t.solve(&RealSet::less_than(0)).unwrap().is_empty());
        assert_eq!(t.solve(&closed(-3, 2)).unwrap(), closed(-2, 2));
    }

    #[test]
    fn odd_power_keeps_sign() {
        let t = Transform::pow(x(), integer(3)).unwrap();
        assert_eq!(t.solve(&closed(-8, 27)).unwrap(), closed(-2, 3));
    }

    #[test]
    fn even_power_keeps_only_non_negative_branch() {
        let t = Transform::pow(x(), integer(2)).unwrap();
        assert_eq!(t.solve(&closed(1, 4)).unwrap(), closed(1, 2));
    }

    #[test]
    fn negative_exponent_swaps_ends() {
        let t = Transform::pow(x(), integer(-1)).unwrap();
        // 1/x in [1/4, 2]  <=>  x in [1/2, 4]
        let target = RealSet::closed(rational(1, 4), 2).unwrap();
        assert_eq!(
            t.solve(&target).unwrap(),
            RealSet::closed(rational(1, 2), 4).unwrap()
        );
        // 1/x > 0  <=>  x > 0
        assert_eq!(t.solve(&RealSet::greater_than(0)).unwrap(), POSITIVE.clone());
        // 1/x <= -1  <=>  -1 <= x < 0
        assert_eq!(
            t.solve(&RealSet::at_most(-1)).unwrap(),
            RealSet::right_open(-1, 0).unwrap()
        );
    }

    #[test]
    fn exp_maps_through_logarithms() {
        let t = Transform::exp(x(), 2).unwrap();
        assert_eq!(t.solve(&closed(-5, 8)).unwrap(), RealSet::at_most(3));
        let decreasing = Transform::exp(x(), rational(1, 2)).unwrap();
        assert_eq!(
            decreasing.solve(&RealSet::closed(rational(1, 4), 2).unwrap()).unwrap(),
            closed(-1, 2)
        );
    }

    #[test]
    fn large_log_bounds_stay_exact_below_the_magnitude_limit() {
        let t = Transform::log(x(), 2).unwrap();
        let power = BigRational::from_integer(BigInt::one() << 10_000usize);
        assert_eq!(
            t.solve(&RealSet::at_most(10_000)).unwrap(),
            RealSet::left_open(0, power).unwrap()
        );
    }

    #[test]
    fn log_bounds_past_the_magnitude_limit_are_exhausted() {
        let t = Transform::log(x(), 2).unwrap();
        match t.solve(&RealSet::at_most(100_000)) {
            Err(PreimageError::ResourceExhausted(msg)) => assert!(msg.contains("16384")),
            other => panic!("expected ResourceExhausted, got {:?}", other),
        }
        let nested = Transform::log(Transform::log(t, 2).unwrap(), 2).unwrap();
        assert!(matches!(
            nested.solve(&RealSet::at_most(5)),
            Err(PreimageError::ResourceExhausted(_))
        ));
    }

    #[test]
    fn natural_log_bounds_are_symbolic_but_comparable() {
        let t = Transform::log_nat(x());
        let solved = t.solve(&RealSet::at_most(5_000)).unwrap();
        let two = Real::from(2);
        assert!(solved.contains(&two.raise(&Real::from(7_000)).unwrap()));
        assert!(!solved.contains(&two.raise(&Real::from(7_300)).unwrap()));
        assert!(!solved.contains(&Real::zero()));
    }

    #[test]
    fn magnitude_limit_is_configurable() {
        let t = Transform::exp(x(), 2).unwrap();
        let target = RealSet::at_least(BigRational::from_integer(BigInt::one() << 2_000usize));
        let limits = ResourceLimits {
            max_magnitude_bits: 1_000,
            ..ResourceLimits::default()
        };
        assert!(matches!(
            t.solve_with_limits(&target, &limits),
            Err(PreimageError::ResourceExhausted(_))
        ));
        assert_eq!(t.solve(&target).unwrap(), RealSet::at_least(2_000));
    }

    #[test]
    fn log_maps_through_powers() {
        let t = Transform::log(x(), 10).unwrap();
        assert_eq!(
            t.solve(&RealSet::right_open(-1, 2).unwrap()).unwrap(),
            RealSet::right_open(rational(1, 10), 100).unwrap()
        );
        assert_eq!(t.solve(&RealSet::less_than(0)).unwrap(), RealSet::open(0, 1).unwrap());
    }

    #[test]
    fn natural_log_of_exp_round_trips() {
        let t = Transform::log_nat(Transform::exp_nat(x()));
        assert_eq!(t.solve(&closed(-1, 1)).unwrap(), closed(-1, 1));
    }

    #[test]
    fn polynomial_layer_unions_components() {
        let t = Transform::poly(x(), vec![integer(0), integer(0), integer(1)]).unwrap();
        let expected = closed(-2, -1).union(&closed(1, 2));
        assert_eq!(t.solve(&closed(1, 4)).unwrap(), expected);
    }

    #[test]
    fn constructor_validation() {
        assert!(Transform::pow(x(), integer(0)).is_err());
        assert!(Transform::pow(x(), rational(1, 100_000)).is_err());
        assert!(Transform::exp(x(), 0).is_err());
        assert!(Transform::exp(x(), 1).is_err());
        assert!(Transform::log(x(), -2).is_err());
        assert!(Transform::poly(x(), vec![]).is_err());
        assert!(Transform::radical(x(), 0).is_err());
    }

    #[test]
    fn domains_and_ranges() {
        let sqrt = Transform::sqrt(x()).unwrap();
        assert_eq!(sqrt.domain(), NON_NEGATIVE.clone());
        assert_eq!(sqrt.range(), NON_NEGATIVE.clone());
        let cube = Transform::pow(x(), integer(3)).unwrap();
        assert!(cube.range().is_reals());
        let inv = Transform::pow(x(), integer(-2)).unwrap();
        assert_eq!(inv.domain(), nonzero_reals());
        assert_eq!(inv.range(), POSITIVE.clone());
        assert_eq!(Transform::log_nat(x()).domain(), POSITIVE.clone());
        let shifted = Transform::poly(x(), vec![integer(3), integer(0), integer(1)]).unwrap();
        assert_eq!(shifted.range(), RealSet::at_least(3));
    }

    #[test]
    fn evaluate_respects_domains() {
        let t = Transform::sqrt(x()).unwrap();
        assert!(t.evaluate(&Real::from(-1)).is_none());
        assert_eq!(t.evaluate(&Real::from(9)), Some(Real::from(3)));
        let chain = Transform::abs(Transform::pow(x(), integer(3)).unwrap());
        assert_eq!(chain.evaluate(&Real::from(-2)), Some(Real::from(8)));
    }

    #[test]
    fn display_uses_function_notation() {
        let t = Transform::pow(Transform::abs(x()), integer(3)).unwrap();
        assert_eq!(t.to_string(), "|x|^3");
        let t = Transform::exp(Transform::pow(x(), integer(2)).unwrap(), 2).unwrap();
        assert_eq!(t.to_string(), "exp_2(x^2)");
        let t = Transform::pow(Transform::pow(x(), integer(2)).unwrap(), rational(1, 2)).unwrap();
        assert_eq!(t.to_string(), "(x^2)^(1/2)");
        assert_eq!(Transform::log_nat(x()).to_string(), "log(x)");
    }

    #[test]
    fn depth_counts_layers() {
        let t = Transform::abs(Transform::abs(x()));
        assert_eq!(t.depth(), 2);
        assert!(x().is_identity());
        assert_eq!(t.symbol(), &Symbol::new("x"));
    }
}
