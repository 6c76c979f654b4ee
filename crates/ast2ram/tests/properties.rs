//! Property-based tests over randomly generated join clauses
//!
//! The generator produces single-clause programs joining up to four
//! binary atoms with a shared variable pool and occasional constants;
//! the first argument of the first atom is always a variable so the
//! head stays grounded.

mod common;

use ast2ram::{translate_unit, TranslatorConfig};
use common::{atom, program, rule};
use datalog_analysis::SymbolTable;
use datalog_ast::{Argument, Literal, Program};
use proptest::prelude::*;
use ram::{walk, Operation, Statement, TranslationUnit};
use std::collections::HashMap;

#[derive(Debug, Clone)]
enum TermSpec {
    Var(usize),
    Const(i64),
}

fn term_spec() -> impl Strategy<Value = TermSpec> {
    prop_oneof![
        (0..4usize).prop_map(TermSpec::Var),
        (-5i64..100).prop_map(TermSpec::Const),
    ]
}

fn atom_spec() -> impl Strategy<Value = (usize, Vec<TermSpec>)> {
    (0..3usize, proptest::collection::vec(term_spec(), 2))
}

fn arbitrary_program() -> impl Strategy<Value = Program> {
    proptest::collection::vec(atom_spec(), 1..4).prop_map(|mut specs| {
        // keep the head grounded
        specs[0].1[0] = TermSpec::Var(0);

        let names = ["a", "b", "c"];
        let to_arg = |spec: &TermSpec| match spec {
            TermSpec::Var(i) => Argument::var(format!("V{}", i)),
            TermSpec::Const(value) => Argument::number(*value),
        };

        let body: Vec<Literal> = specs
            .iter()
            .map(|(name, args)| {
                Literal::Atom(atom(names[*name], args.iter().map(to_arg).collect()))
            })
            .collect();

        program(
            &[("a", 2), ("b", 2), ("c", 2), ("h", 1)],
            vec![rule(atom("h", vec![Argument::var("V0")]), body)],
        )
    })
}

/// Tuple arities per binding level of one query, taken from the
/// operations that introduce the levels.
fn level_arities(op: &Operation, decl_arities: &HashMap<String, usize>) -> HashMap<usize, usize> {
    let mut arities = HashMap::new();
    let mut current = Some(op);
    while let Some(op) = current {
        match op {
            Operation::Scan { relation, level, .. } => {
                arities.insert(*level, decl_arities[relation]);
            }
            Operation::UnpackRecord { level, arity, .. } => {
                arities.insert(*level, *arity);
            }
            Operation::Aggregate { relation, level, .. } => {
                arities.insert(*level, decl_arities[relation].max(1));
            }
            Operation::NestedIntrinsic { level, .. } => {
                arities.insert(*level, 1);
            }
            _ => {}
        }
        current = op.inner();
    }
    arities
}

fn check_level_discipline(unit: &TranslationUnit) {
    let decl_arities: HashMap<String, usize> = unit
        .relations
        .iter()
        .map(|decl| (decl.name.clone(), decl.arity))
        .collect();

    walk::each_statement(&unit.program, &mut |stmt| {
        let Statement::Query(op) = stmt else { return };
        let arities = level_arities(op, &decl_arities);
        let query = Statement::Query(op.clone());
        walk::each_expression(&query, &mut |expr| {
            if let ram::Expression::TupleElement { level, column } = expr {
                let arity = arities
                    .get(level)
                    .unwrap_or_else(|| panic!("tuple level {} is never bound in {}", level, query));
                assert!(
                    column < arity,
                    "column {} out of bounds for level {} (arity {})",
                    column,
                    level,
                    arity
                );
            }
        });
    });
}

proptest! {
    #[test]
    fn translation_is_deterministic(prog in arbitrary_program()) {
        let mut first = prog.clone();
        let mut second = prog;
        let unit_a = translate_unit(&mut first, &SymbolTable::new(), &TranslatorConfig::default());
        let unit_b = translate_unit(&mut second, &SymbolTable::new(), &TranslatorConfig::default());
        prop_assert_eq!(unit_a, unit_b);
    }

    #[test]
    fn tuple_elements_stay_within_their_levels(prog in arbitrary_program()) {
        let mut prog = prog;
        let unit = translate_unit(&mut prog, &SymbolTable::new(), &TranslatorConfig::default());
        check_level_discipline(&unit);
    }

    #[test]
    fn scans_only_reference_declared_relations(prog in arbitrary_program()) {
        let mut prog = prog;
        let unit = translate_unit(&mut prog, &SymbolTable::new(), &TranslatorConfig::default());

        let declared: Vec<&str> = unit.relations.iter().map(|d| d.name.as_str()).collect();
        walk::each_operation(&unit.program, &mut |op| {
            if let Operation::Scan { relation, .. } = op {
                assert!(
                    declared.contains(&relation.as_str()),
                    "scan of undeclared relation {}",
                    relation
                );
            }
        });
    }
}
