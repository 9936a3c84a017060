//! Dispatch of relational expressions to events and the scalar oracle

use crate::event::Event;
use crate::expression::{Expression, Relation, Symbol};
use crate::realset::RealSet;
use crate::transform::Transform;
use crate::{PreimageError, PreimageResult, ResourceLimits};
use tracing::debug;

/// What a scalar oracle made of a relation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OracleAnswer {
    Solved(RealSet),
    /// The relation could not be inverted into a concrete set
    Unresolved,
}

/// Solves single-variable relations outside the invertible vocabulary
pub trait ScalarOracle {
    fn scalar_solve(&self, relation: &Relation, symbol: &Symbol) -> OracleAnswer;
}

/// An oracle that resolves nothing
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOracle;

impl ScalarOracle for NoOracle {
    fn scalar_solve(&self, _relation: &Relation, _symbol: &Symbol) -> OracleAnswer {
        OracleAnswer::Unresolved
    }
}

impl<F> ScalarOracle for F
where
    F: Fn(&Relation, &Symbol) -> OracleAnswer,
{
    fn scalar_solve(&self, relation: &Relation, symbol: &Symbol) -> OracleAnswer {
        self(relation, symbol)
    }
}

/// Turns expressions in one free symbol into the set of values satisfying them
#[derive(Debug, Clone, Default)]
pub struct Solver<O = NoOracle> {
    oracle: O,
    limits: ResourceLimits,
}

impl Solver<NoOracle> {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<O: ScalarOracle> Solver<O> {
    pub fn with_oracle(oracle: O) -> Self {
        Solver {
            oracle,
            limits: ResourceLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ResourceLimits) -> Self {
        self.limits = limits;
        self
    }

    pub fn limits(&self) -> &ResourceLimits {
        &self.limits
    }

    /// Values of the expression's only symbol that make it true
    pub fn solve_expression(&self, expr: &Expression) -> PreimageResult<RealSet> {
        debug!(expression = %expr, "solving expression");
        let event = self.to_event(expr)?;
        let simplified = event.simplify(self.limits.max_bdd_atoms);
        let solution = simplified.solve_with_limits(&self.limits)?;
        debug!(solution = %solution, "solved expression");
        Ok(solution)
    }

    /// Lower an expression to an event on its only free symbol
    ///
    /// Relations with a constant on one side and a vocabulary term on the
    /// other become transform leaves. Every other relation is handed to the
    /// oracle; an unresolved answer fails with `NotInvertible`.
    pub fn to_event(&self, expr: &Expression) -> PreimageResult<Event> {
        let symbol = single_symbol(expr)?;

        enum Visit<'a> {
            Enter(&'a Expression, usize),
            Exit(&'a Expression),
        }

        let mut work = vec![Visit::Enter(expr, 0)];
        let mut lowered: Vec<Event> = Vec::new();
        while let Some(visit) = work.pop() {
            match visit {
                Visit::Enter(node, depth) => {
                    if depth > self.limits.max_expression_depth {
                        return Err(PreimageError::exhausted(format!(
                            "expression nesting exceeds {}",
                            self.limits.max_expression_depth
                        )));
                    }
                    match node {
                        Expression::Relation(relation) => {
                            lowered.push(self.lower_relation(relation, &symbol)?);
                        }
                        Expression::And(children) | Expression::Or(children)
                            if children.is_empty() =>
                        {
                            return Err(PreimageError::Unsupported(node.to_string()));
                        }
                        Expression::And(children) | Expression::Or(children) => {
                            work.push(Visit::Exit(node));
                            work.extend(
                                children
                                    .iter()
                                    .rev()
                                    .map(|child| Visit::Enter(child, depth + 1)),
                            );
                        }
                        Expression::Not(inner) => {
                            work.push(Visit::Exit(node));
                            work.push(Visit::Enter(inner, depth + 1));
                        }
                        Expression::Term(term) => {
                            return Err(PreimageError::Unsupported(term.to_string()));
                        }
                    }
                }
                Visit::Exit(node) => {
                    let event = match node {
                        Expression::And(children) => {
                            let kids = lowered.split_off(lowered.len() - children.len());
                            Event::and_of(kids)?
                        }
                        Expression::Or(children) => {
                            let kids = lowered.split_off(lowered.len() - children.len());
                            Event::or_of(kids)?
                        }
                        Expression::Not(_) => match lowered.pop() {
                            Some(inner) => Event::not_of(inner),
                            None => return Err(PreimageError::Unsupported(node.to_string())),
                        },
                        Expression::Relation(_) | Expression::Term(_) => continue,
                    };
                    lowered.push(event);
                }
            }
        }
        lowered
            .pop()
            .ok_or_else(|| PreimageError::Unsupported(expr.to_string()))
    }

    fn lower_relation(&self, relation: &Relation, symbol: &Symbol) -> PreimageResult<Event> {
        let lhs = relation.lhs.constant_value();
        let rhs = relation.rhs.constant_value();
        match (lhs, rhs) {
            (Some(a), Some(b)) => {
                let holds = relation.op.solution_set(b).contains(&a);
                let target = if holds {
                    RealSet::reals()
                } else {
                    RealSet::empty()
                };
                return Ok(Event::interval(Transform::identity(symbol.clone()), target));
            }
            (None, Some(bound)) => {
                if let Some(transform) = relation.lhs.to_transform() {
                    return Ok(Event::interval(transform?, relation.op.solution_set(bound)));
                }
            }
            (Some(bound), None) => {
                if let Some(transform) = relation.rhs.to_transform() {
                    let target = relation.op.flipped().solution_set(bound);
                    return Ok(Event::interval(transform?, target));
                }
            }
            (None, None) => {}
        }

        match self.oracle.scalar_solve(relation, symbol) {
            OracleAnswer::Solved(set) => {
                debug!(relation = %relation, solution = %set, "oracle solved relation");
                Ok(Event::interval(Transform::identity(symbol.clone()), set))
            }
            OracleAnswer::Unresolved => Err(PreimageError::NotInvertible(relation.to_string())),
        }
    }
}

fn single_symbol(expr: &Expression) -> PreimageResult<Symbol> {
    let symbols = expr.free_symbols();
    match symbols.first() {
        Some(symbol) if symbols.len() == 1 => return Ok(symbol.clone()),
        _ => {}
    }
    Err(PreimageError::SymbolCount {
        expression: expr.to_string(),
        symbols: symbols.iter().map(|s| s.name().to_string()).collect(),
    })
}

/// Solve with no oracle and default limits
pub fn solve_expression(expr: &Expression) -> PreimageResult<RealSet> {
    Solver::new().solve_expression(expr)
}
