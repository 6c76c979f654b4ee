//! Depth-first traversal helpers
//!
//! The clause translator indexes generators in the order a pre-order
//! walk encounters them, so the walk order here is load-bearing: head
//! first, then body literals in written order, arguments left to right,
//! each node before its children. Aggregator bodies are entered too.

use crate::ast::{Argument, Atom, Clause, Literal};

/// Walk all arguments of a clause depth-first, head atom first.
pub fn walk_clause_arguments<'a>(clause: &'a Clause, f: &mut impl FnMut(&'a Argument)) {
    walk_atom(&clause.head, f);
    for lit in &clause.body {
        walk_literal(lit, f);
    }
}

fn walk_literal<'a>(lit: &'a Literal, f: &mut impl FnMut(&'a Argument)) {
    match lit {
        Literal::Atom(atom) | Literal::Negation(atom) => walk_atom(atom, f),
        Literal::Constraint(c) => {
            walk_argument(&c.lhs, f);
            walk_argument(&c.rhs, f);
        }
    }
}

fn walk_atom<'a>(atom: &'a Atom, f: &mut impl FnMut(&'a Argument)) {
    for arg in &atom.args {
        walk_argument(arg, f);
    }
}

/// Walk an argument tree depth-first, visiting each node before its
/// children.
pub fn walk_argument<'a>(arg: &'a Argument, f: &mut impl FnMut(&'a Argument)) {
    f(arg);
    match arg {
        Argument::Variable(_) | Argument::UnnamedVariable | Argument::Constant(_) => {}
        Argument::Record(rec) => {
            for child in &rec.args {
                walk_argument(child, f);
            }
        }
        Argument::Intrinsic(func) => {
            for child in &func.args {
                walk_argument(child, f);
            }
        }
        Argument::UserFunctor(func) => {
            for child in &func.args {
                walk_argument(child, f);
            }
        }
        Argument::Aggregator(agg) => {
            if let Some(target) = &agg.target {
                walk_argument(target, f);
            }
            for lit in &agg.body {
                walk_literal(lit, f);
            }
        }
        Argument::Branch(branch) => {
            for child in &branch.args {
                walk_argument(child, f);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Aggregator, BinaryConstraint, Clause};
    use crate::ops::{AggregateOp, BinaryConstraintOp};

    #[test]
    fn test_walk_enters_aggregator_bodies() {
        let clause = Clause::new(
            Atom::new("q", vec![Argument::var("N")]),
            vec![Literal::Constraint(BinaryConstraint {
                op: BinaryConstraintOp::Eq,
                lhs: Argument::var("N"),
                rhs: Argument::Aggregator(Aggregator::new(
                    AggregateOp::Count,
                    None,
                    vec![Literal::Atom(Atom::new("t", vec![Argument::var("X")]))],
                )),
            })],
        );

        let mut vars = Vec::new();
        walk_clause_arguments(&clause, &mut |arg| {
            if let Argument::Variable(name) = arg {
                vars.push(name.as_ref().clone());
            }
        });
        assert_eq!(vars, vec!["N", "N", "X"]);
    }
}
