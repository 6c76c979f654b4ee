//! Whole-unit driver tests: stratum scheduling, fixpoint loops, table
//! maintenance, IO and profiling wrappers.

mod common;

use ast2ram::{translate_unit, TranslatorConfig, UnitTranslator};
use common::{atom, pos, program, rule, var, with_context};
use datalog_analysis::SymbolTable;
use datalog_ast::{Argument, Program, Relation};
use ram::{walk, Condition, Statement};

fn transitive_closure_io() -> Program {
    let mut prog = program(
        &[],
        vec![
            rule(
                atom("tc", vec![var("X"), var("Y")]),
                vec![pos("edge", vec![var("X"), var("Y")])],
            ),
            rule(
                atom("tc", vec![var("X"), var("Z")]),
                vec![
                    pos("edge", vec![var("X"), var("Y")]),
                    pos("tc", vec![var("Y"), var("Z")]),
                ],
            ),
        ],
    );
    let mut edge = Relation::new("edge", 2);
    edge.input = true;
    let mut tc = Relation::new("tc", 2);
    tc.output = true;
    prog.relations = vec![edge, tc];
    prog
}

fn statement_names<F>(unit: &ram::TranslationUnit, mut pick: F) -> Vec<String>
where
    F: FnMut(&Statement) -> Option<String>,
{
    let mut names = Vec::new();
    walk::each_statement(&unit.program, &mut |stmt| {
        if let Some(name) = pick(stmt) {
            names.push(name);
        }
    });
    names
}

#[test]
fn test_recursive_relations_declare_all_variants() {
    let mut prog = transitive_closure_io();
    let symbols = SymbolTable::new();
    let unit = translate_unit(&mut prog, &symbols, &TranslatorConfig::default());

    let names: Vec<&str> = unit.relations.iter().map(|decl| decl.name.as_str()).collect();
    assert_eq!(names, vec!["edge", "tc", "@delta_tc", "@new_tc"]);
    assert!(unit.relations.iter().all(|decl| decl.arity == 2));
}

#[test]
fn test_recursive_stratum_has_fixpoint_machinery() {
    let mut prog = transitive_closure_io();
    let symbols = SymbolTable::new();
    let unit = translate_unit(&mut prog, &symbols, &TranslatorConfig::default());

    // one loop, exiting when the delta drains
    let mut exits = Vec::new();
    walk::each_statement(&unit.program, &mut |stmt| {
        if let Statement::Exit(cond) = stmt {
            exits.push(cond.clone());
        }
    });
    assert_eq!(exits, vec![Condition::empty("@delta_tc")]);

    // table updates: new folds into concrete and replaces delta
    let merges = statement_names(&unit, |stmt| match stmt {
        Statement::Merge { dest, src } => Some(format!("{} <- {}", dest, src)),
        _ => None,
    });
    assert_eq!(
        merges,
        vec![
            "@delta_tc <- tc",      // preamble seeds the delta
            "tc <- @new_tc",        // loop: accumulate
            "@delta_tc <- @new_tc", // loop: delta := new
        ]
    );

    // IO: edge loads, tc stores, edge expires after its last consumer
    let loads = statement_names(&unit, |stmt| match stmt {
        Statement::Load(rel) => Some(rel.clone()),
        _ => None,
    });
    assert_eq!(loads, vec!["edge"]);
    let stores = statement_names(&unit, |stmt| match stmt {
        Statement::Store(rel) => Some(rel.clone()),
        _ => None,
    });
    assert_eq!(stores, vec!["tc"]);
    let clears = statement_names(&unit, |stmt| match stmt {
        Statement::Clear(rel) => Some(rel.clone()),
        _ => None,
    });
    // loop update clears + postamble clears + expired edge
    assert_eq!(
        clears,
        vec!["@delta_tc", "@new_tc", "@delta_tc", "@new_tc", "edge"]
    );
}

#[test]
fn test_fact_for_recursive_relation_lands_in_preamble() {
    let mut prog = transitive_closure_io();
    prog.clauses.push(rule(
        atom("tc", vec![Argument::number(1), Argument::number(2)]),
        vec![],
    ));

    let symbols = SymbolTable::new();
    let unit = translate_unit(&mut prog, &symbols, &TranslatorConfig::default());

    // the fact projects into the concrete relation, outside the loop
    let mut fact_targets = Vec::new();
    walk::each_operation(&unit.program, &mut |op| {
        if let ram::Operation::Project { relation, values } = op {
            if values == &[ram::Expression::SignedConstant(1), ram::Expression::SignedConstant(2)]
            {
                fact_targets.push(relation.clone());
            }
        }
    });
    assert_eq!(fact_targets, vec!["tc"]);
}

#[test]
fn test_translation_is_deterministic() {
    let build = transitive_closure_io;

    let mut first = build();
    let mut second = build();
    let unit_a = translate_unit(&mut first, &SymbolTable::new(), &TranslatorConfig::default());
    let unit_b = translate_unit(&mut second, &SymbolTable::new(), &TranslatorConfig::default());

    assert_eq!(unit_a, unit_b);
}

#[test]
fn test_profiling_adds_size_logging_for_non_recursive_relations() {
    let mut prog = program(
        &[("p", 1), ("q", 1)],
        vec![rule(
            atom("p", vec![var("X")]),
            vec![pos("q", vec![var("X")])],
        )],
    );
    let symbols = SymbolTable::new();
    let unit = translate_unit(&mut prog, &symbols, &TranslatorConfig::profiled());

    let mut log_sizes = Vec::new();
    let mut timers = Vec::new();
    walk::each_statement(&unit.program, &mut |stmt| match stmt {
        Statement::LogSize { relation, .. } => log_sizes.push(relation.clone()),
        Statement::LogRelationTimer { message, .. } => timers.push(message.clone()),
        _ => {}
    });
    assert!(log_sizes.contains(&"p".to_string()));
    assert!(timers.iter().any(|m| m.starts_with("@t-nonrecursive-relation;p;")));
    assert!(timers.iter().any(|m| m.starts_with("@t-nonrecursive-rule;p;")));
}

#[test]
fn test_debug_hook_sees_every_clause() {
    let mut prog = transitive_closure_io();
    let symbols = SymbolTable::new();
    let config = TranslatorConfig::default();

    let reports = std::cell::RefCell::new(Vec::new());
    with_context(&mut prog, &config, &symbols, |context| {
        let mut translator = UnitTranslator::new(context, &symbols);
        translator.set_debug_hook(Box::new(|report| {
            reports.borrow_mut().push(report.to_string());
        }));
        translator.generate_program()
    });

    let reports = reports.into_inner();
    // base clause, and one semi-naive version of the recursive clause
    assert_eq!(reports.len(), 2);
    assert!(reports[0].starts_with("tc(X, Y) :- edge(X, Y)."));
    assert!(reports[1].starts_with("tc(X, Z) :- edge(X, Y), tc(Y, Z)."));
}
