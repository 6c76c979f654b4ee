//! Sideways-information-passing strategies
//!
//! A SIPS metric picks the next body atom to schedule given the set of
//! variables already bound by earlier atoms. The preprocessor's literal
//! reordering pass applies the configured metric greedily to every
//! clause that does not carry an explicit execution plan.

use datalog_ast::{Argument, Atom, Symbol};
use std::collections::HashSet;

/// Strategy object choosing the next atom during reordering.
pub trait SipsMetric {
    /// Index into `atoms` of the atom to schedule next. `bound` holds
    /// the variables grounded by already-scheduled atoms.
    fn next_atom(&self, atoms: &[&Atom], bound: &HashSet<Symbol>) -> usize;
}

/// Keep the written order.
#[derive(Debug, Default)]
pub struct InputOrderSips;

impl SipsMetric for InputOrderSips {
    fn next_atom(&self, _atoms: &[&Atom], _bound: &HashSet<Symbol>) -> usize {
        0
    }
}

/// Prefer the first atom whose arguments are all bound; fall back to the
/// written order.
#[derive(Debug, Default)]
pub struct AllBoundSips;

impl SipsMetric for AllBoundSips {
    fn next_atom(&self, atoms: &[&Atom], bound: &HashSet<Symbol>) -> usize {
        atoms
            .iter()
            .position(|atom| atom.args.iter().all(|arg| is_bound(arg, bound)))
            .unwrap_or(0)
    }
}

/// Prefer the atom with the most bound arguments; ties go to the
/// earliest atom.
#[derive(Debug, Default)]
pub struct MaxBoundSips;

impl SipsMetric for MaxBoundSips {
    fn next_atom(&self, atoms: &[&Atom], bound: &HashSet<Symbol>) -> usize {
        let mut best = 0;
        let mut best_count = 0;
        for (i, atom) in atoms.iter().enumerate() {
            let count = atom.args.iter().filter(|arg| is_bound(arg, bound)).count();
            if i == 0 || count > best_count {
                best = i;
                best_count = count;
            }
        }
        best
    }
}

fn is_bound(arg: &Argument, bound: &HashSet<Symbol>) -> bool {
    match arg {
        Argument::Constant(_) => true,
        Argument::Variable(name) => bound.contains(name),
        Argument::Record(rec) => rec.args.iter().all(|a| is_bound(a, bound)),
        Argument::Intrinsic(func) => func.args.iter().all(|a| is_bound(a, bound)),
        Argument::UserFunctor(func) => func.args.iter().all(|a| is_bound(a, bound)),
        Argument::UnnamedVariable | Argument::Aggregator(_) | Argument::Branch(_) => false,
    }
}

/// Named strategy selection, carried on the translator configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SipsStrategy {
    /// No reordering.
    #[default]
    InputOrder,
    AllBound,
    MaxBound,
}

impl SipsStrategy {
    pub fn metric(self) -> &'static dyn SipsMetric {
        match self {
            SipsStrategy::InputOrder => &InputOrderSips,
            SipsStrategy::AllBound => &AllBoundSips,
            SipsStrategy::MaxBound => &MaxBoundSips,
        }
    }
}
