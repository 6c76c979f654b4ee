//! Shared fixtures for translation tests
#![allow(dead_code)]

use ast2ram::{preprocess, TranslatorConfig, TranslatorContext};
use datalog_analysis::{
    AuxiliaryArity, FunctorAnalysis, IoDirectives, PolymorphicObjects, RelationDetailCache,
    RelationSchedule, SccGraph, SymbolTable, TypeEnvironment,
};
use datalog_ast::{Argument, Atom, Clause, Literal, Program, Relation};

pub fn var(name: &str) -> Argument {
    Argument::var(name)
}

pub fn atom(name: &str, args: Vec<Argument>) -> Atom {
    Atom::new(name, args)
}

pub fn pos(name: &str, args: Vec<Argument>) -> Literal {
    Literal::Atom(Atom::new(name, args))
}

pub fn rule(head: Atom, body: Vec<Literal>) -> Clause {
    Clause::new(head, body)
}

/// A program over binary relations with the given names; clauses are
/// appended by the caller.
pub fn program(relations: &[(&str, usize)], clauses: Vec<Clause>) -> Program {
    let mut program = Program::new();
    for (name, arity) in relations {
        program.relations.push(Relation::new(*name, *arity));
    }
    program.clauses = clauses;
    program
}

/// Preprocess the program with empty type oracles, build every
/// analysis, and hand the assembled context to the callback.
pub fn with_context<R>(
    program: &mut Program,
    config: &TranslatorConfig,
    symbols: &SymbolTable,
    f: impl FnOnce(&TranslatorContext<'_>) -> R,
) -> R {
    let type_env = TypeEnvironment::new();
    let poly = PolymorphicObjects::new();
    preprocess(program, &type_env, &poly, config.sips.metric());

    let functors = FunctorAnalysis::new();
    let aux_arity = AuxiliaryArity::new();
    let relation_details = RelationDetailCache::build(program);
    let scc_graph = SccGraph::build(program);
    let io = IoDirectives::build(program);
    let schedule = RelationSchedule::build(program, &scc_graph, &io);

    let context = TranslatorContext {
        type_env: &type_env,
        functors: &functors,
        poly: &poly,
        aux_arity: &aux_arity,
        relation_details: &relation_details,
        scc_graph: &scc_graph,
        schedule: &schedule,
        io: &io,
        config,
    };
    f(&context)
}

/// Unwrap the `DebugInfo` (and any profiling timer) around a clause
/// version to reach the underlying query.
pub fn unwrap_rule(stmt: &ram::Statement) -> &ram::Statement {
    match stmt {
        ram::Statement::DebugInfo { inner, .. } => unwrap_rule(inner),
        ram::Statement::LogRelationTimer { inner, .. } => unwrap_rule(inner),
        other => other,
    }
}
