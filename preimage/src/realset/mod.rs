//! Finite unions of disjoint real intervals

pub mod display;
pub mod ops;

use crate::number::{ExtendedReal, Real};
use crate::{PreimageError, PreimageResult};
use std::sync::LazyLock;

/// The whole real line
pub static REALS: LazyLock<RealSet> = LazyLock::new(|| RealSet {
    intervals: vec![Interval {
        min: Bound::Unbounded,
        max: Bound::Unbounded,
    }],
});

/// `[0, +∞)`
pub static NON_NEGATIVE: LazyLock<RealSet> = LazyLock::new(|| RealSet::at_least(Real::zero()));

/// `(0, +∞)`
pub static POSITIVE: LazyLock<RealSet> = LazyLock::new(|| RealSet::greater_than(Real::zero()));

/// Bound specification for one side of an interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Bound {
    /// Inclusive bound [value
    Inclusive(Real),

    /// Exclusive bound (value
    Exclusive(Real),

    /// Unbounded (-∞ or +∞)
    Unbounded,
}

impl Bound {
    pub fn value(&self) -> Option<&Real> {
        match self {
            Bound::Inclusive(v) | Bound::Exclusive(v) => Some(v),
            Bound::Unbounded => None,
        }
    }

    pub fn is_inclusive(&self) -> bool {
        matches!(self, Bound::Inclusive(_))
    }

    /// Same openness, different value
    pub fn with_value(&self, value: Real) -> Bound {
        match self {
            Bound::Inclusive(_) => Bound::Inclusive(value),
            Bound::Exclusive(_) | Bound::Unbounded => Bound::Exclusive(value),
        }
    }

    /// Bound of the complementary side: `[v` becomes `v)` and `(v` becomes `v]`
    pub fn flipped(&self) -> Bound {
        match self {
            Bound::Inclusive(v) => Bound::Exclusive(v.clone()),
            Bound::Exclusive(v) => Bound::Inclusive(v.clone()),
            Bound::Unbounded => Bound::Unbounded,
        }
    }
}

/// A single non-empty interval
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Interval {
    min: Bound,
    max: Bound,
}

impl Interval {
    /// Build an interval, rejecting reversed endpoints and empty ranges
    pub fn new(min: Bound, max: Bound) -> PreimageResult<Interval> {
        if let (Some(a), Some(b)) = (min.value(), max.value()) {
            if a > b {
                return Err(PreimageError::invalid(format!(
                    "interval left endpoint {} exceeds right endpoint {}",
                    a, b
                )));
            }
        }
        Interval::checked(min, max).ok_or_else(|| {
            PreimageError::invalid("interval with equal endpoints must be closed on both sides")
        })
    }

    /// The interval, or `None` when the bounds enclose no point
    pub(crate) fn checked(min: Bound, max: Bound) -> Option<Interval> {
        if ops::bounds_contradict(&min, &max) {
            None
        } else {
            Some(Interval { min, max })
        }
    }

    /// `[value, value]`
    pub fn point(value: Real) -> Interval {
        Interval {
            min: Bound::Inclusive(value.clone()),
            max: Bound::Inclusive(value),
        }
    }

    pub fn min(&self) -> &Bound {
        &self.min
    }

    pub fn max(&self) -> &Bound {
        &self.max
    }

    pub fn lower(&self) -> ExtendedReal {
        match &self.min {
            Bound::Unbounded => ExtendedReal::NegInfinity,
            Bound::Inclusive(v) | Bound::Exclusive(v) => ExtendedReal::Finite(v.clone()),
        }
    }

    pub fn upper(&self) -> ExtendedReal {
        match &self.max {
            Bound::Unbounded => ExtendedReal::PosInfinity,
            Bound::Inclusive(v) | Bound::Exclusive(v) => ExtendedReal::Finite(v.clone()),
        }
    }

    /// Infinite sides count as open
    pub fn left_open(&self) -> bool {
        !self.min.is_inclusive()
    }

    pub fn right_open(&self) -> bool {
        !self.max.is_inclusive()
    }

    pub fn is_point(&self) -> bool {
        match (&self.min, &self.max) {
            (Bound::Inclusive(a), Bound::Inclusive(b)) => a == b,
            _ => false,
        }
    }

    pub fn contains(&self, x: &Real) -> bool {
        ops::value_within(x, &self.min, &self.max)
    }
}

/// An ordered, normalized union of disjoint intervals
///
/// Intervals are sorted, pairwise disjoint, and never touch at a point that
/// either of them contains, so structural equality is set equality.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct RealSet {
    intervals: Vec<Interval>,
}

impl RealSet {
    pub fn empty() -> Self {
        RealSet::default()
    }

    pub fn reals() -> Self {
        REALS.clone()
    }

    /// Normalize arbitrary (possibly overlapping) intervals into a set
    pub fn from_intervals(intervals: Vec<Interval>) -> Self {
        RealSet {
            intervals: ops::merge_intervals(intervals),
        }
    }

    pub(crate) fn from_interval(interval: Interval) -> Self {
        RealSet {
            intervals: vec![interval],
        }
    }

    /// Set between two bounds; reversed endpoints are rejected, an empty
    /// degenerate range such as `[a, a)` yields the empty set
    pub fn from_bounds(min: Bound, max: Bound) -> PreimageResult<Self> {
        if let (Some(a), Some(b)) = (min.value(), max.value()) {
            if a > b {
                return Err(PreimageError::invalid(format!(
                    "interval left endpoint {} exceeds right endpoint {}",
                    a, b
                )));
            }
        }
        Ok(Interval::checked(min, max)
            .map(RealSet::from_interval)
            .unwrap_or_default())
    }

    /// `[a, b]`
    pub fn closed(a: impl Into<Real>, b: impl Into<Real>) -> PreimageResult<Self> {
        RealSet::from_bounds(Bound::Inclusive(a.into()), Bound::Inclusive(b.into()))
    }

    /// `(a, b)`
    pub fn open(a: impl Into<Real>, b: impl Into<Real>) -> PreimageResult<Self> {
        RealSet::from_bounds(Bound::Exclusive(a.into()), Bound::Exclusive(b.into()))
    }

    /// `(a, b]`
    pub fn left_open(a: impl Into<Real>, b: impl Into<Real>) -> PreimageResult<Self> {
        RealSet::from_bounds(Bound::Exclusive(a.into()), Bound::Inclusive(b.into()))
    }

    /// `[a, b)`
    pub fn right_open(a: impl Into<Real>, b: impl Into<Real>) -> PreimageResult<Self> {
        RealSet::from_bounds(Bound::Inclusive(a.into()), Bound::Exclusive(b.into()))
    }

    /// `{a}`
    pub fn point(a: impl Into<Real>) -> Self {
        RealSet::from_interval(Interval::point(a.into()))
    }

    /// `[a, +∞)`
    pub fn at_least(a: impl Into<Real>) -> Self {
        RealSet::from_interval(Interval {
            min: Bound::Inclusive(a.into()),
            max: Bound::Unbounded,
        })
    }

    /// `(a, +∞)`
    pub fn greater_than(a: impl Into<Real>) -> Self {
        RealSet::from_interval(Interval {
            min: Bound::Exclusive(a.into()),
            max: Bound::Unbounded,
        })
    }

    /// `(-∞, a]`
    pub fn at_most(a: impl Into<Real>) -> Self {
        RealSet::from_interval(Interval {
            min: Bound::Unbounded,
            max: Bound::Inclusive(a.into()),
        })
    }

    /// `(-∞, a)`
    pub fn less_than(a: impl Into<Real>) -> Self {
        RealSet::from_interval(Interval {
            min: Bound::Unbounded,
            max: Bound::Exclusive(a.into()),
        })
    }

    pub fn intervals(&self) -> &[Interval] {
        &self.intervals
    }

    pub fn is_empty(&self) -> bool {
        self.intervals.is_empty()
    }

    pub fn is_reals(&self) -> bool {
        matches!(
            self.intervals.as_slice(),
            [Interval {
                min: Bound::Unbounded,
                max: Bound::Unbounded
            }]
        )
    }

    pub fn contains(&self, x: &Real) -> bool {
        self.intervals.iter().any(|i| i.contains(x))
    }

    pub fn union(&self, other: &RealSet) -> RealSet {
        ops::union(self, other)
    }

    pub fn intersection(&self, other: &RealSet) -> RealSet {
        ops::intersection(self, other)
    }

    /// Complement relative to the whole real line
    pub fn complement(&self) -> RealSet {
        ops::complement(self)
    }

    /// Points of `self` not in `other`
    pub fn difference(&self, other: &RealSet) -> RealSet {
        ops::intersection(self, &ops::complement(other))
    }

    pub fn union_all<'a>(sets: impl IntoIterator<Item = &'a RealSet>) -> RealSet {
        let intervals = sets
            .into_iter()
            .flat_map(|s| s.intervals.iter().cloned())
            .collect();
        RealSet::from_intervals(intervals)
    }

    /// Intersection of all `sets`; the empty family yields the real line
    pub fn intersection_all<'a>(sets: impl IntoIterator<Item = &'a RealSet>) -> RealSet {
        let mut acc = RealSet::reals();
        for set in sets {
            if acc.is_empty() {
                break;
            }
            acc = acc.intersection(set);
        }
        acc
    }
}

impl From<Interval> for RealSet {
    fn from(interval: Interval) -> Self {
        RealSet::from_interval(interval)
    }
}

impl IntoIterator for RealSet {
    type Item = Interval;
    type IntoIter = std::vec::IntoIter<Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.into_iter()
    }
}

impl<'a> IntoIterator for &'a RealSet {
    type Item = &'a Interval;
    type IntoIter = std::slice::Iter<'a, Interval>;

    fn into_iter(self) -> Self::IntoIter {
        self.intervals.iter()
    }
}
