//! Boolean events over transform-constrained intervals
//!
//! `Not` complements relative to the whole real line, not the domain of the
//! transforms underneath it: `~(log(x) < 0)` solves to `(-∞, 0] ∪ [1, +∞)`.

pub mod boolean;

use crate::expression::Symbol;
use crate::realset::RealSet;
use crate::transform::Transform;
use crate::{PreimageError, PreimageResult, ResourceLimits};
use std::fmt;
use tracing::debug;

/// A boolean tree whose leaves constrain a transform's output
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    kind: EventKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventKind {
    /// `transform(symbol) ∈ target`
    Interval { transform: Transform, target: RealSet },
    And(Vec<Event>),
    Or(Vec<Event>),
    Not(Box<Event>),
}

impl Event {
    pub fn interval(transform: Transform, target: RealSet) -> Self {
        Event {
            kind: EventKind::Interval { transform, target },
        }
    }

    /// Conjunction of events on one symbol
    pub fn and_of(events: Vec<Event>) -> PreimageResult<Self> {
        check_children(&events, "and")?;
        Ok(Event {
            kind: EventKind::And(events),
        })
    }

    /// Disjunction of events on one symbol
    pub fn or_of(events: Vec<Event>) -> PreimageResult<Self> {
        check_children(&events, "or")?;
        Ok(Event {
            kind: EventKind::Or(events),
        })
    }

    pub fn not_of(event: Event) -> Self {
        Event {
            kind: EventKind::Not(Box::new(event)),
        }
    }

    pub fn kind(&self) -> &EventKind {
        &self.kind
    }

    /// The symbol every leaf constrains
    pub fn symbol(&self) -> Option<&Symbol> {
        let mut event = self;
        loop {
            match &event.kind {
                EventKind::Interval { transform, .. } => return Some(transform.symbol()),
                EventKind::Not(inner) => event = inner.as_ref(),
                EventKind::And(children) | EventKind::Or(children) => {
                    event = children.first()?;
                }
            }
        }
    }

    /// Values of the symbol for which the event holds
    pub fn solve(&self) -> PreimageResult<RealSet> {
        self.solve_with_limits(&ResourceLimits::default())
    }

    pub fn solve_with_limits(&self, limits: &ResourceLimits) -> PreimageResult<RealSet> {
        debug!(event = %self, "solving event");

        enum Visit<'a> {
            Enter(&'a Event),
            Exit(&'a Event),
        }

        let mut work = vec![Visit::Enter(self)];
        let mut solved: Vec<RealSet> = Vec::new();
        while let Some(visit) = work.pop() {
            match visit {
                Visit::Enter(event) => match &event.kind {
                    EventKind::Interval { transform, target } => {
                        solved.push(transform.solve_with_limits(target, limits)?);
                    }
                    EventKind::And(children) | EventKind::Or(children) => {
                        work.push(Visit::Exit(event));
                        work.extend(children.iter().rev().map(Visit::Enter));
                    }
                    EventKind::Not(inner) => {
                        work.push(Visit::Exit(event));
                        work.push(Visit::Enter(inner));
                    }
                },
                Visit::Exit(event) => {
                    let combined = match &event.kind {
                        EventKind::And(children) => {
                            let sets = solved.split_off(solved.len() - children.len());
                            RealSet::intersection_all(&sets)
                        }
                        EventKind::Or(children) => {
                            let sets = solved.split_off(solved.len() - children.len());
                            RealSet::union_all(&sets)
                        }
                        EventKind::Not(_) => solved.pop().unwrap_or_default().complement(),
                        EventKind::Interval { .. } => continue,
                    };
                    solved.push(combined);
                }
            }
        }
        Ok(solved.pop().unwrap_or_default())
    }

    /// Rewrite the boolean skeleton through a BDD, sharing equal leaves
    ///
    /// Leaves with the same transform and target become one BDD variable, so
    /// tautologies and contradictions collapse to the real line or the empty set.
    /// Events with more than `max_atoms` distinct leaves are returned unchanged.
    pub fn simplify(&self, max_atoms: usize) -> Event {
        boolean::simplify(self, max_atoms)
    }
}

fn check_children(events: &[Event], what: &str) -> PreimageResult<()> {
    let Some(first) = events.first() else {
        return Err(PreimageError::invalid(format!(
            "'{}' needs at least one event",
            what
        )));
    };
    let symbol = first.symbol();
    for other in events.iter().map(Event::symbol) {
        if let (Some(a), Some(b)) = (symbol, other) {
            if a != b {
                return Err(PreimageError::invalid(format!(
                    "'{}' mixes events on {} and {}",
                    what, a, b
                )));
            }
        }
    }
    Ok(())
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            EventKind::Interval { transform, target } => write!(f, "{} ∈ {}", transform, target),
            EventKind::And(children) | EventKind::Or(children) => {
                let sep = if matches!(self.kind, EventKind::And(_)) {
                    " ∧ "
                } else {
                    " ∨ "
                };
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "({})", child)?;
                }
                Ok(())
            }
            EventKind::Not(inner) => write!(f, "¬({})", inner),
        }
    }
}
