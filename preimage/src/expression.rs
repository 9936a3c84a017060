//! Relational and boolean expressions over real terms
//!
//! This is the input shape of [`crate::solve_expression`]. Terms built only from
//! the invertible vocabulary lower to a [`Transform`]; anything else (an
//! [`Term::Apply`] of an opaque function, a symbol on both sides) is handed to
//! the scalar oracle.

use crate::number::Real;
use crate::realset::RealSet;
use crate::transform::Transform;
use crate::{PreimageError, PreimageResult};
use num_rational::BigRational;
use num_traits::Signed;
use std::collections::BTreeSet;
use std::fmt;

/// A free variable
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Symbol(String);

impl Symbol {
    pub fn new(name: impl Into<String>) -> Self {
        Symbol(name.into())
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

/// A real-valued term
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Term {
    Symbol(Symbol),
    Constant(Real),
    Abs(Box<Term>),
    Pow(Box<Term>, BigRational),
    /// `base^term`
    Exp(Box<Term>, Real),
    /// `log_base(term)`
    Log(Box<Term>, Real),
    /// Polynomial in the term with ascending coefficients
    Poly(Box<Term>, Vec<BigRational>),
    /// A function outside the invertible vocabulary
    Apply(String, Vec<Term>),
}

impl Term {
    pub fn symbol(name: impl Into<String>) -> Self {
        Term::Symbol(Symbol::new(name))
    }

    pub fn constant(value: impl Into<Real>) -> Self {
        Term::Constant(value.into())
    }

    pub fn abs(self) -> Self {
        Term::Abs(Box::new(self))
    }

    pub fn pow(self, exponent: BigRational) -> Self {
        Term::Pow(Box::new(self), exponent)
    }

    pub fn exp(self, base: impl Into<Real>) -> Self {
        Term::Exp(Box::new(self), base.into())
    }

    pub fn exp_nat(self) -> Self {
        Term::Exp(Box::new(self), Real::e())
    }

    pub fn log(self, base: impl Into<Real>) -> Self {
        Term::Log(Box::new(self), base.into())
    }

    pub fn log_nat(self) -> Self {
        Term::Log(Box::new(self), Real::e())
    }

    pub fn poly(self, coeffs: Vec<BigRational>) -> Self {
        Term::Poly(Box::new(self), coeffs)
    }

    pub fn apply(name: impl Into<String>, args: Vec<Term>) -> Self {
        Term::Apply(name.into(), args)
    }

    pub fn lt(self, rhs: Term) -> Expression {
        Expression::relation(self, ComparisonOperator::Lt, rhs)
    }

    pub fn le(self, rhs: Term) -> Expression {
        Expression::relation(self, ComparisonOperator::Le, rhs)
    }

    pub fn gt(self, rhs: Term) -> Expression {
        Expression::relation(self, ComparisonOperator::Gt, rhs)
    }

    pub fn ge(self, rhs: Term) -> Expression {
        Expression::relation(self, ComparisonOperator::Ge, rhs)
    }

    pub fn equals(self, rhs: Term) -> Expression {
        Expression::relation(self, ComparisonOperator::Eq, rhs)
    }

    pub fn not_equals(self, rhs: Term) -> Expression {
        Expression::relation(self, ComparisonOperator::Ne, rhs)
    }

    fn collect_symbols(&self, out: &mut BTreeSet<Symbol>) {
        let mut stack = vec![self];
        while let Some(term) = stack.pop() {
            match term {
                Term::Symbol(s) => {
                    out.insert(s.clone());
                }
                Term::Constant(_) => {}
                Term::Abs(inner)
                | Term::Pow(inner, _)
                | Term::Exp(inner, _)
                | Term::Log(inner, _)
                | Term::Poly(inner, _) => stack.push(inner),
                Term::Apply(_, args) => stack.extend(args.iter()),
            }
        }
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.collect_symbols(&mut out);
        out
    }

    /// Value of a term without free symbols; `None` when it has symbols, calls
    /// an opaque function, or leaves the real domain
    pub fn constant_value(&self) -> Option<Real> {
        let mut chain = Vec::new();
        let mut term = self;
        let mut value = loop {
            match term {
                Term::Constant(c) => break c.clone(),
                Term::Symbol(_) | Term::Apply(_, _) => return None,
                Term::Abs(inner)
                | Term::Pow(inner, _)
                | Term::Exp(inner, _)
                | Term::Log(inner, _)
                | Term::Poly(inner, _) => {
                    chain.push(term);
                    term = inner.as_ref();
                }
            }
        };
        for outer in chain.into_iter().rev() {
            value = match outer {
                Term::Abs(_) if value.is_negative() => -value,
                Term::Abs(_) => value,
                Term::Pow(_, e) => {
                    if !e.is_integer() && value.is_negative() {
                        return None;
                    }
                    value.pow(e)?
                }
                Term::Exp(_, base) => base.raise(&value)?,
                Term::Log(_, base) => value.log(base)?,
                Term::Poly(_, coeffs) => Real::poly_value(coeffs, &value),
                Term::Constant(_) | Term::Symbol(_) | Term::Apply(_, _) => return None,
            };
        }
        Some(value)
    }

    /// The transform chain this term spells out, when it only uses the
    /// invertible vocabulary around a single symbol
    pub fn to_transform(&self) -> Option<PreimageResult<Transform>> {
        let mut chain = Vec::new();
        let mut term = self;
        let symbol = loop {
            match term {
                Term::Symbol(s) => break s.clone(),
                Term::Constant(_) | Term::Apply(_, _) => return None,
                Term::Abs(inner)
                | Term::Pow(inner, _)
                | Term::Exp(inner, _)
                | Term::Log(inner, _)
                | Term::Poly(inner, _) => {
                    chain.push(term);
                    term = inner.as_ref();
                }
            }
        };
        let build = || -> PreimageResult<Transform> {
            let mut transform = Transform::identity(symbol);
            for outer in chain.into_iter().rev() {
                transform = match outer {
                    Term::Abs(_) => Transform::abs(transform),
                    Term::Pow(_, e) => Transform::pow(transform, e.clone())?,
                    Term::Exp(_, base) => Transform::exp(transform, base.clone())?,
                    Term::Log(_, base) => Transform::log(transform, base.clone())?,
                    Term::Poly(_, coeffs) => Transform::poly(transform, coeffs.clone())?,
                    Term::Constant(_) | Term::Symbol(_) | Term::Apply(_, _) => {
                        return Err(PreimageError::Unsupported(outer.to_string()))
                    }
                };
            }
            Ok(transform)
        };
        Some(build())
    }
}

/// Comparison operators of a relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ComparisonOperator {
    Lt,
    Le,
    Gt,
    Ge,
    Eq,
    Ne,
}

impl ComparisonOperator {
    /// Returns a human-readable name for the operator
    pub fn name(&self) -> &'static str {
        match self {
            ComparisonOperator::Lt => "less than",
            ComparisonOperator::Le => "less than or equal",
            ComparisonOperator::Gt => "greater than",
            ComparisonOperator::Ge => "greater than or equal",
            ComparisonOperator::Eq => "equal",
            ComparisonOperator::Ne => "not equal",
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            ComparisonOperator::Lt => "<",
            ComparisonOperator::Le => "<=",
            ComparisonOperator::Gt => ">",
            ComparisonOperator::Ge => ">=",
            ComparisonOperator::Eq => "=",
            ComparisonOperator::Ne => "!=",
        }
    }

    /// The operator that holds after swapping both sides
    pub fn flipped(&self) -> Self {
        match self {
            ComparisonOperator::Lt => ComparisonOperator::Gt,
            ComparisonOperator::Le => ComparisonOperator::Ge,
            ComparisonOperator::Gt => ComparisonOperator::Lt,
            ComparisonOperator::Ge => ComparisonOperator::Le,
            ComparisonOperator::Eq => ComparisonOperator::Eq,
            ComparisonOperator::Ne => ComparisonOperator::Ne,
        }
    }

    /// Values `v` with `v op bound`
    pub fn solution_set(&self, bound: Real) -> RealSet {
        match self {
            ComparisonOperator::Lt => RealSet::less_than(bound),
            ComparisonOperator::Le => RealSet::at_most(bound),
            ComparisonOperator::Gt => RealSet::greater_than(bound),
            ComparisonOperator::Ge => RealSet::at_least(bound),
            ComparisonOperator::Eq => RealSet::point(bound),
            ComparisonOperator::Ne => RealSet::point(bound).complement(),
        }
    }
}

/// `lhs op rhs`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub lhs: Term,
    pub op: ComparisonOperator,
    pub rhs: Term,
}

impl Relation {
    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        self.lhs.collect_symbols(&mut out);
        self.rhs.collect_symbols(&mut out);
        out
    }
}

/// A boolean combination of relations
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Expression {
    Relation(Relation),
    And(Vec<Expression>),
    Or(Vec<Expression>),
    Not(Box<Expression>),
    /// A bare term where a truth value is expected
    Term(Term),
}

impl Expression {
    pub fn relation(lhs: Term, op: ComparisonOperator, rhs: Term) -> Self {
        Expression::Relation(Relation { lhs, op, rhs })
    }

    pub fn and(children: Vec<Expression>) -> Self {
        Expression::And(children)
    }

    pub fn or(children: Vec<Expression>) -> Self {
        Expression::Or(children)
    }

    pub fn negate(self) -> Self {
        Expression::Not(Box::new(self))
    }

    pub fn free_symbols(&self) -> BTreeSet<Symbol> {
        let mut out = BTreeSet::new();
        let mut stack = vec![self];
        while let Some(expr) = stack.pop() {
            match expr {
                Expression::Relation(r) => {
                    r.lhs.collect_symbols(&mut out);
                    r.rhs.collect_symbols(&mut out);
                }
                Expression::And(children) | Expression::Or(children) => stack.extend(children),
                Expression::Not(inner) => stack.push(inner),
                Expression::Term(t) => t.collect_symbols(&mut out),
            }
        }
        out
    }
}

// ---------------------------
// Display implementations
// ---------------------------

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

fn base_suffix(base: &Real) -> String {
    if *base == Real::e() {
        String::new()
    } else {
        format!("_{}", base)
    }
}

fn is_atomic(term: &Term) -> bool {
    match term {
        Term::Symbol(_) | Term::Abs(_) | Term::Exp(_, _) | Term::Log(_, _) => true,
        Term::Poly(_, _) | Term::Apply(_, _) => true,
        Term::Constant(c) => !c.is_negative() && c.as_rational().map_or(true, |r| r.is_integer()),
        Term::Pow(_, _) => false,
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Term::Symbol(s) => write!(f, "{}", s),
            Term::Constant(c) => write!(f, "{}", c),
            Term::Abs(inner) => write!(f, "|{}|", inner),
            Term::Pow(inner, e) => {
                if is_atomic(inner) {
                    write!(f, "{}", inner)?;
                } else {
                    write!(f, "({})", inner)?;
                }
                if e.is_integer() && !e.is_negative() {
                    write!(f, "^{}", e)
                } else {
                    write!(f, "^({})", e)
                }
            }
            Term::Exp(inner, base) => write!(f, "exp{}({})", base_suffix(base), inner),
            Term::Log(inner, base) => write!(f, "log{}({})", base_suffix(base), inner),
            Term::Poly(inner, coeffs) => {
                let list: Vec<String> = coeffs.iter().map(|c| c.to_string()).collect();
                write!(f, "poly[{}]({})", list.join(", "), inner)
            }
            Term::Apply(name, args) => {
                let list: Vec<String> = args.iter().map(|a| a.to_string()).collect();
                write!(f, "{}({})", name, list.join(", "))
            }
        }
    }
}

impl fmt::Display for ComparisonOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.symbol())
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.lhs, self.op, self.rhs)
    }
}

fn write_joined(f: &mut fmt::Formatter<'_>, children: &[Expression], sep: &str) -> fmt::Result {
    for (i, child) in children.iter().enumerate() {
        if i > 0 {
            write!(f, " {} ", sep)?;
        }
        match child {
            Expression::And(_) | Expression::Or(_) => write!(f, "({})", child)?,
            _ => write!(f, "{}", child)?,
        }
    }
    Ok(())
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::Relation(r) => write!(f, "{}", r),
            Expression::And(children) => write_joined(f, children, "&"),
            Expression::Or(children) => write_joined(f, children, "|"),
            Expression::Not(inner) => write!(f, "~({})", inner),
            Expression::Term(t) => write!(f, "{}", t),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::number::{integer, rational};

    fn x() -> Term {
        Term::symbol("x")
    }

    #[test]
    fn free_symbols_are_collected_across_the_tree() {
        let expr = Expression::and(vec![
            x().lt(Term::constant(1)),
            Term::apply("sin", vec![Term::symbol("y")]).gt(Term::constant(0)),
        ]);
        let names: Vec<String> = expr
            .free_symbols()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["x", "y"]);
    }

    #[test]
    fn constants_fold_through_the_vocabulary() {
        let t = Term::constant(-8).abs().pow(rational(1, 3));
        assert_eq!(t.constant_value(), Some(Real::from(2)));
        let t = Term::constant(100).log(10);
        assert_eq!(t.constant_value(), Some(Real::from(2)));
        assert_eq!(x().abs().constant_value(), None);
        assert_eq!(Term::constant(0).log(2).constant_value(), None);
    }

    #[test]
    fn vocabulary_terms_become_transforms() {
        let t = x().abs().pow(integer(3)).to_transform().unwrap().unwrap();
        assert_eq!(t.depth(), 2);
        assert_eq!(t.to_string(), "|x|^3");
        assert!(Term::apply("sin", vec![x()]).to_transform().is_none());
        assert!(x().pow(integer(0)).to_transform().unwrap().is_err());
    }

    #[test]
    fn operators_flip_when_sides_swap() {
        assert_eq!(ComparisonOperator::Lt.flipped(), ComparisonOperator::Gt);
        assert_eq!(ComparisonOperator::Ge.flipped(), ComparisonOperator::Le);
        assert_eq!(ComparisonOperator::Ne.flipped(), ComparisonOperator::Ne);
        assert_eq!(ComparisonOperator::Le.name(), "less than or equal");
    }

    #[test]
    fn solution_sets_of_operators() {
        let ne = ComparisonOperator::Ne.solution_set(Real::from(2));
        assert!(!ne.contains(&Real::from(2)));
        assert!(ne.contains(&Real::from(3)));
        assert_eq!(
            ComparisonOperator::Le.solution_set(Real::from(1)),
            RealSet::at_most(1)
        );
    }

    #[test]
    fn display_reads_like_math() {
        let expr = Expression::or(vec![
            x().abs().pow(integer(2)).le(Term::constant(4)),
            Expression::and(vec![
                x().gt(Term::constant(0)),
                x().exp(2).lt(Term::constant(8)),
            ]),
        ])
        .negate();
        assert_eq!(expr.to_string(), "~(|x|^2 <= 4 | (x > 0 & exp_2(x) < 8))");
    }
}
