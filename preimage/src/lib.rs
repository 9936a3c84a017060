//! # Preimage Engine
//!
//! **Exact preimages of real-valued events**
//!
//! Preimage turns a constraint on a transformed real variable, such as
//! `|x|^3 ∈ [1, 8]` or `x^4 - 3x^2 + 1 < 0`, into the exact set of values of
//! `x` that satisfy it. Endpoints stay exact: rationals as big rationals, and
//! irrational roots and logarithms as symbolic values with verified
//! enclosures.
//!
//! ## Quick Start
//!
//! ```rust
//! use preimage::{integer, solve_expression, RealSet, Term, PreimageResult};
//!
//! fn main() -> PreimageResult<()> {
//!     // |x|^2 <= 4  and  x > -1
//!     let expr = preimage::Expression::and(vec![
//!         Term::symbol("x").abs().pow(integer(2)).le(Term::constant(4)),
//!         Term::symbol("x").gt(Term::constant(-1)),
//!     ]);
//!     let solution = solve_expression(&expr)?;
//!     assert_eq!(solution, RealSet::left_open(-1, 2)?);
//!     Ok(())
//! }
//! ```
//!
//! ## Core Concepts
//!
//! ### Real sets
//! A [`RealSet`] is a normalized union of disjoint intervals with exact
//! endpoints. Union, intersection and complement always return normalized
//! sets.
//!
//! ### Transforms
//! A [`Transform`] is a chain of invertible maps (`abs`, `pow`, `exp`, `log`,
//! polynomials) around one symbol. [`Transform::solve`] pulls a target set
//! back through the chain.
//!
//! ### Events
//! An [`Event`] is a boolean tree of transform constraints. Solving it
//! combines the leaf preimages by union, intersection and complement.
//!
//! ### Expressions
//! [`solve_expression`] lowers relational expressions to events. Relations
//! outside the invertible vocabulary go to a [`ScalarOracle`].

pub mod error;
pub mod event;
pub mod expression;
pub mod number;
pub mod polynomial;
pub mod realset;
pub mod resource_limits;
pub mod solver;
pub mod transform;

pub use error::PreimageError;
pub use event::{Event, EventKind};
pub use expression::{ComparisonOperator, Expression, Relation, Symbol, Term};
pub use number::{integer, rational, ExtendedReal, Real};
pub use realset::{Bound, Interval, RealSet, NON_NEGATIVE, POSITIVE, REALS};
pub use resource_limits::ResourceLimits;
pub use solver::{solve_expression, NoOracle, OracleAnswer, ScalarOracle, Solver};
pub use transform::{Layer, Transform};

/// Result type for preimage operations
pub type PreimageResult<T> = Result<T, PreimageError>;

#[cfg(test)]
mod tests;
