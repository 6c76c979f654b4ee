//! AST preprocessing
//!
//! Four in-place passes run before any translation, in this order:
//!
//! 1. lower ADT branch terms into record encodings
//! 2. number record/functor/aggregator/constant nodes with dense ids
//! 3. finalise polymorphic types on numeric constants and functors
//! 4. reorder body atoms of plan-less clauses per the SIPS metric
//!
//! The clause translator assumes all of them have run.

use datalog_analysis::{PolymorphicObjects, SipsMetric, TypeEnvironment};
use datalog_ast::{
    walk_argument, Argument, Atom, Clause, Constant, Literal, NodeId, NumericConstant,
    NumericType, Program, RecordInit, Symbol,
};
use std::collections::HashSet;
use tracing::debug;

/// Run all preprocessing passes.
pub fn preprocess(
    program: &mut Program,
    type_env: &TypeEnvironment,
    poly: &PolymorphicObjects,
    sips: &dyn SipsMetric,
) {
    lower_adt_terms(program, type_env);
    number_nodes(program);
    finalise_types(program, poly);
    reorder_literals(program, sips);
    debug!(clauses = program.clauses.len(), "preprocessing finished");
}

// --- pass 1: ADT lowering -----------------------------------------------

/// Replace every ADT branch term with its record encoding: plain
/// ordinal for enum-like types, `[ordinal, nil]` for argument-free
/// branches of mixed types, `[ordinal, [args...]]` otherwise.
pub fn lower_adt_terms(program: &mut Program, type_env: &TypeEnvironment) {
    for clause in &mut program.clauses {
        each_argument_mut(clause, &mut |arg| lower_branch(arg, type_env));
    }
}

fn lower_branch(arg: &mut Argument, type_env: &TypeEnvironment) {
    if !matches!(arg, Argument::Branch(_)) {
        return;
    }
    let Argument::Branch(branch) = std::mem::replace(arg, Argument::UnnamedVariable) else {
        unreachable!();
    };
    let info = type_env
        .branch(branch.name)
        .unwrap_or_else(|| panic!("ADT branch {} should be declared", branch.name));
    assert_eq!(
        info.arity,
        branch.args.len(),
        "ADT branch {} used with wrong arity",
        branch.name
    );

    let ordinal = signed_constant(info.ordinal);
    *arg = if info.enum_like {
        ordinal
    } else if branch.args.is_empty() {
        Argument::Record(RecordInit::new(vec![ordinal, Argument::Constant(Constant::Nil)]))
    } else {
        Argument::Record(RecordInit::new(vec![
            ordinal,
            Argument::Record(RecordInit::new(branch.args)),
        ]))
    };
}

fn signed_constant(value: usize) -> Argument {
    let mut constant = NumericConstant::new(value.to_string());
    constant.numeric_type = Some(NumericType::Signed);
    Argument::Constant(Constant::Numeric(constant))
}

// --- pass 2: node numbering ---------------------------------------------

/// Assign dense, program-unique ids to every node the value index or
/// the polymorphic-objects analysis may reference. Ids start at 1;
/// id 0 marks an unnumbered node.
pub fn number_nodes(program: &mut Program) {
    let mut next = 1u32;
    for clause in &mut program.clauses {
        each_argument_mut(clause, &mut |arg| {
            let id = match arg {
                Argument::Record(rec) => &mut rec.id,
                Argument::Intrinsic(func) => &mut func.id,
                Argument::Aggregator(agg) => &mut agg.id,
                Argument::Branch(branch) => &mut branch.id,
                Argument::Constant(Constant::Numeric(numeric)) => &mut numeric.id,
                _ => return,
            };
            *id = NodeId(next);
            next += 1;
        });
    }
}

// --- pass 3: polymorphic finalisation -----------------------------------

/// Stamp each numeric constant and intrinsic functor with its resolved
/// type, leaving already-finalised nodes untouched.
pub fn finalise_types(program: &mut Program, poly: &PolymorphicObjects) {
    for clause in &mut program.clauses {
        each_argument_mut(clause, &mut |arg| match arg {
            Argument::Constant(Constant::Numeric(numeric)) => {
                if numeric.numeric_type.is_none() {
                    numeric.numeric_type = Some(poly.constant_type(numeric));
                }
            }
            Argument::Intrinsic(func) => {
                if func.final_op.is_none() {
                    func.final_op = Some(poly.functor_op(func));
                }
            }
            _ => {}
        });
    }
}

// --- pass 4: literal reordering -----------------------------------------

/// Greedily reorder the body atoms of every plan-less clause using the
/// SIPS metric. Non-atom literals keep their positions; atoms are
/// permuted within the slots they occupy.
pub fn reorder_literals(program: &mut Program, sips: &dyn SipsMetric) {
    for clause in &mut program.clauses {
        if clause.plan.is_some() || clause.is_fact() {
            continue;
        }
        reorder_clause(clause, sips);
    }
}

fn reorder_clause(clause: &mut Clause, sips: &dyn SipsMetric) {
    let positions: Vec<usize> = clause
        .body
        .iter()
        .enumerate()
        .filter_map(|(i, lit)| matches!(lit, Literal::Atom(_)).then_some(i))
        .collect();
    if positions.len() < 2 {
        return;
    }

    let atoms: Vec<Atom> = positions
        .iter()
        .map(|&p| match &clause.body[p] {
            Literal::Atom(atom) => atom.clone(),
            _ => unreachable!(),
        })
        .collect();

    let mut remaining: Vec<usize> = (0..atoms.len()).collect();
    let mut bound: HashSet<Symbol> = HashSet::new();
    let mut order = Vec::with_capacity(atoms.len());
    while !remaining.is_empty() {
        let views: Vec<&Atom> = remaining.iter().map(|&i| &atoms[i]).collect();
        let chosen = remaining.remove(sips.next_atom(&views, &bound));
        for arg in &atoms[chosen].args {
            walk_argument(arg, &mut |node| {
                if let Argument::Variable(name) = node {
                    bound.insert(*name);
                }
            });
        }
        order.push(chosen);
    }

    if order.iter().enumerate().all(|(i, &o)| i == o) {
        return;
    }
    debug!(clause = %clause, ?order, "reordering body atoms");
    for (slot, &source) in positions.iter().zip(&order) {
        clause.body[*slot] = Literal::Atom(atoms[source].clone());
    }
}

// --- shared mutable walk ------------------------------------------------

/// Apply `f` to every argument node of a clause, pre-order, recursing
/// into records, functors, aggregator targets and aggregator bodies.
fn each_argument_mut(clause: &mut Clause, f: &mut impl FnMut(&mut Argument)) {
    for arg in &mut clause.head.args {
        each_argument_node(arg, f);
    }
    for lit in &mut clause.body {
        each_literal_argument(lit, f);
    }
}

fn each_literal_argument(lit: &mut Literal, f: &mut impl FnMut(&mut Argument)) {
    match lit {
        Literal::Atom(atom) | Literal::Negation(atom) => {
            for arg in &mut atom.args {
                each_argument_node(arg, f);
            }
        }
        Literal::Constraint(constraint) => {
            each_argument_node(&mut constraint.lhs, f);
            each_argument_node(&mut constraint.rhs, f);
        }
    }
}

fn each_argument_node(arg: &mut Argument, f: &mut impl FnMut(&mut Argument)) {
    f(arg);
    match arg {
        Argument::Variable(_) | Argument::UnnamedVariable | Argument::Constant(_) => {}
        Argument::Record(rec) => {
            for child in &mut rec.args {
                each_argument_node(child, f);
            }
        }
        Argument::Intrinsic(func) => {
            for child in &mut func.args {
                each_argument_node(child, f);
            }
        }
        Argument::UserFunctor(func) => {
            for child in &mut func.args {
                each_argument_node(child, f);
            }
        }
        Argument::Aggregator(agg) => {
            if let Some(target) = agg.target.as_deref_mut() {
                each_argument_node(target, f);
            }
            for lit in &mut agg.body {
                each_literal_argument(lit, f);
            }
        }
        Argument::Branch(branch) => {
            for child in &mut branch.args {
                each_argument_node(child, f);
            }
        }
    }
}
