//! Traversal helpers over RAM trees
//!
//! Used by tests and tooling to check structural properties (level
//! discipline, relation references) without pattern-matching every node
//! shape at each call site.

use crate::{Condition, Expression, Operation, Statement};

/// Visit every statement in the tree, including the root.
pub fn each_statement<'a>(stmt: &'a Statement, f: &mut impl FnMut(&'a Statement)) {
    f(stmt);
    match stmt {
        Statement::Sequence(stmts) => {
            for s in stmts {
                each_statement(s, f);
            }
        }
        Statement::Loop(inner)
        | Statement::LogRelationTimer { inner, .. }
        | Statement::DebugInfo { inner, .. } => each_statement(inner, f),
        _ => {}
    }
}

/// Visit every operation nested under a statement tree.
pub fn each_operation<'a>(stmt: &'a Statement, f: &mut impl FnMut(&'a Operation)) {
    each_statement(stmt, &mut |s| {
        if let Statement::Query(op) = s {
            let mut cur = Some(op);
            while let Some(op) = cur {
                f(op);
                cur = op.inner();
            }
        }
    });
}

/// Visit every expression appearing anywhere under a statement tree,
/// including expressions nested in conditions.
pub fn each_expression<'a>(stmt: &'a Statement, f: &mut impl FnMut(&'a Expression)) {
    each_statement(stmt, &mut |s| {
        if let Statement::Exit(cond) = s {
            each_condition_expression(cond, f);
        }
    });
    each_operation(stmt, &mut |op| match op {
        Operation::Project { values, .. } => {
            for v in values {
                each_subexpression(v, f);
            }
        }
        Operation::Filter { condition, .. } | Operation::Break { condition, .. } => {
            each_condition_expression(condition, f);
        }
        Operation::Scan { .. } => {}
        Operation::UnpackRecord { reference, .. } => each_subexpression(reference, f),
        Operation::Aggregate {
            target, condition, ..
        } => {
            each_subexpression(target, f);
            each_condition_expression(condition, f);
        }
        Operation::NestedIntrinsic { args, .. } => {
            for a in args {
                each_subexpression(a, f);
            }
        }
    });
}

fn each_condition_expression<'a>(cond: &'a Condition, f: &mut impl FnMut(&'a Expression)) {
    match cond {
        Condition::True | Condition::EmptinessCheck { .. } => {}
        Condition::Conjunction(lhs, rhs) => {
            each_condition_expression(lhs, f);
            each_condition_expression(rhs, f);
        }
        Condition::Negation(inner) => each_condition_expression(inner, f),
        Condition::Constraint { lhs, rhs, .. } => {
            each_subexpression(lhs, f);
            each_subexpression(rhs, f);
        }
        Condition::ExistenceCheck { values, .. } => {
            for v in values {
                each_subexpression(v, f);
            }
        }
    }
}

fn each_subexpression<'a>(expr: &'a Expression, f: &mut impl FnMut(&'a Expression)) {
    f(expr);
    match expr {
        Expression::Intrinsic { args, .. }
        | Expression::UserOperator { args, .. }
        | Expression::PackRecord(args) => {
            for a in args {
                each_subexpression(a, f);
            }
        }
        _ => {}
    }
}
