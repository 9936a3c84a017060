//! Event simplification using BDDs

use super::{Event, EventKind};
use crate::expression::Symbol;
use crate::realset::RealSet;
use crate::transform::Transform;
use boolean_expression::Expr as BExpr;
use tracing::trace;

/// Deepest event tree translated; deeper trees are left alone
const MAX_DEPTH: usize = 256;

type Atom = (Transform, RealSet);

/// Simplify the boolean skeleton of an event
pub fn simplify(event: &Event, max_atoms: usize) -> Event {
    let Some(symbol) = event.symbol().cloned() else {
        return event.clone();
    };
    let mut atoms: Vec<Atom> = Vec::new();
    if let Some(bexpr) = to_bool_expr(event, &mut atoms, 0) {
        if atoms.len() <= max_atoms {
            let simplified = bexpr.simplify_via_bdd();
            trace!(atoms = atoms.len(), "simplified event via BDD");
            return from_bool_expr(&simplified, &atoms, &symbol);
        }
    }
    event.clone()
}

fn to_bool_expr(event: &Event, atoms: &mut Vec<Atom>, depth: usize) -> Option<BExpr<usize>> {
    if depth > MAX_DEPTH {
        return None;
    }
    match &event.kind {
        EventKind::Interval { transform, target } => {
            if target.is_empty() {
                return Some(BExpr::Const(false));
            }
            if target.is_reals() && transform.is_identity() {
                return Some(BExpr::Const(true));
            }
            let idx = match atoms
                .iter()
                .position(|(t, s)| t == transform && s == target)
            {
                Some(i) => i,
                None => {
                    atoms.push((transform.clone(), target.clone()));
                    atoms.len() - 1
                }
            };
            Some(BExpr::Terminal(idx))
        }
        EventKind::And(children) => {
            let mut acc: Option<BExpr<usize>> = None;
            for child in children {
                let be = to_bool_expr(child, atoms, depth + 1)?;
                acc = Some(match acc {
                    Some(prev) => BExpr::and(prev, be),
                    None => be,
                });
            }
            acc
        }
        EventKind::Or(children) => {
            let mut acc: Option<BExpr<usize>> = None;
            for child in children {
                let be = to_bool_expr(child, atoms, depth + 1)?;
                acc = Some(match acc {
                    Some(prev) => BExpr::or(prev, be),
                    None => be,
                });
            }
            acc
        }
        EventKind::Not(inner) => {
            let ibe = to_bool_expr(inner, atoms, depth + 1)?;
            Some(BExpr::not(ibe))
        }
    }
}

fn from_bool_expr(be: &BExpr<usize>, atoms: &[Atom], symbol: &Symbol) -> Event {
    let constant = |holds: bool| {
        let target = if holds {
            RealSet::reals()
        } else {
            RealSet::empty()
        };
        Event::interval(Transform::identity(symbol.clone()), target)
    };

    match be {
        BExpr::Const(b) => constant(*b),
        BExpr::Terminal(i) => match atoms.get(*i) {
            Some((transform, target)) => Event::interval(transform.clone(), target.clone()),
            None => constant(false),
        },
        BExpr::Not(inner) => Event::not_of(from_bool_expr(inner, atoms, symbol)),
        BExpr::And(l, r) => {
            let mut children = Vec::new();
            flatten(from_bool_expr(l, atoms, symbol), true, &mut children);
            flatten(from_bool_expr(r, atoms, symbol), true, &mut children);
            Event {
                kind: EventKind::And(children),
            }
        }
        BExpr::Or(l, r) => {
            let mut children = Vec::new();
            flatten(from_bool_expr(l, atoms, symbol), false, &mut children);
            flatten(from_bool_expr(r, atoms, symbol), false, &mut children);
            Event {
                kind: EventKind::Or(children),
            }
        }
    }
}

/// Splice the children of a same-kind node into `out`
fn flatten(event: Event, conjunction: bool, out: &mut Vec<Event>) {
    match event.kind {
        EventKind::And(children) if conjunction => out.extend(children),
        EventKind::Or(children) if !conjunction => out.extend(children),
        kind => out.push(Event { kind }),
    }
}
