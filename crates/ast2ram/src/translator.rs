//! The unit driver
//!
//! Walks the SCCs of the relation dependency graph in topological order
//! and assembles the full RAM program: plain clause evaluation for
//! non-recursive relations, semi-naïve fixpoint loops for recursive
//! SCCs, plus the surrounding table maintenance (loads, stores, merges,
//! clears) dictated by the relation schedule.

use crate::clause::ClauseTranslator;
use crate::context::{TranslatorConfig, TranslatorContext};
use crate::logs;
use crate::names::{concrete_name, delta_name, new_name};
use crate::preprocess::preprocess;
use datalog_analysis::{
    AuxiliaryArity, FunctorAnalysis, IoDirectives, PolymorphicObjects, RelationDetailCache,
    RelationSchedule, SccGraph, SymbolTable, TypeEnvironment,
};
use datalog_ast::{Program, Relation, Symbol};
use ram::{Condition, RelationDecl, Statement, TranslationUnit};
use tracing::debug;

/// Hook receiving per-clause intermediate renderings.
pub type DebugReportHook<'a> = Box<dyn FnMut(&str) + 'a>;

/// Translates a preprocessed program into a RAM translation unit.
pub struct UnitTranslator<'a> {
    context: &'a TranslatorContext<'a>,
    symbols: &'a SymbolTable,
    debug_hook: Option<DebugReportHook<'a>>,
}

impl<'a> UnitTranslator<'a> {
    pub fn new(context: &'a TranslatorContext<'a>, symbols: &'a SymbolTable) -> Self {
        UnitTranslator {
            context,
            symbols,
            debug_hook: None,
        }
    }

    /// Attach a debug-report hook; it is invoked once per translated
    /// clause with the clause text and its RAM rendering.
    pub fn set_debug_hook(&mut self, hook: DebugReportHook<'a>) {
        self.debug_hook = Some(hook);
    }

    /// Emit the complete RAM program, stratum by stratum.
    pub fn generate_program(&mut self) -> TranslationUnit {
        let relations = self.create_ram_relations();

        let mut strata = Vec::new();
        for scc in 0..self.context.scc_graph.num_sccs() {
            debug!(scc, recursive = self.context.scc_graph.is_recursive(scc), "generating stratum");
            strata.push(self.generate_stratum(scc));
        }

        TranslationUnit {
            relations,
            program: Statement::Sequence(strata),
        }
    }

    /// Declarations for every relation, in stratum order; recursive
    /// relations additionally get their delta and new tables.
    fn create_ram_relations(&self) -> Vec<RelationDecl> {
        let mut decls = Vec::new();
        for scc in 0..self.context.scc_graph.num_sccs() {
            for &name in self.context.scc_graph.relations(scc) {
                let relation = self.declared(name);
                let aux_arity = self.context.aux_arity.arity_of(name);
                let decl = |table: String| RelationDecl {
                    name: table,
                    arity: relation.arity,
                    aux_arity,
                };
                decls.push(decl(concrete_name(name)));
                if self.context.scc_graph.is_recursive(scc) {
                    decls.push(decl(delta_name(name)));
                    decls.push(decl(new_name(name)));
                }
            }
        }
        decls
    }

    fn declared(&self, name: Symbol) -> &'a Relation {
        self.context
            .relation_details
            .relation(name)
            .unwrap_or_else(|| panic!("relation {} should be declared", name))
    }

    fn generate_stratum(&mut self, scc: usize) -> Statement {
        let mut stmts = Vec::new();

        if self.context.scc_graph.is_recursive(scc) {
            for &name in self.context.schedule.loaded(scc) {
                stmts.push(Statement::Load(concrete_name(name)));
            }
            stmts.push(self.generate_recursive_stratum(scc));
        } else {
            let name = self.context.scc_graph.relations(scc)[0];
            stmts.push(self.generate_non_recursive_relation(name));
        }

        if let Some(clear) = self.generate_clear_expired(scc) {
            stmts.push(clear);
        }

        Statement::Sequence(stmts)
    }

    /// Load, clause queries, store, and size logging for one
    /// non-recursive relation, timer-wrapped under profiling.
    fn generate_non_recursive_relation(&mut self, name: Symbol) -> Statement {
        let concrete = concrete_name(name);
        let mut stmts = Vec::new();

        if self.context.io.is_input(name) {
            stmts.push(Statement::Load(concrete.clone()));
        }
        stmts.extend(self.translate_non_recursive_clauses(name));
        if self.context.io.is_output(name) {
            stmts.push(Statement::Store(concrete.clone()));
        }
        if self.context.profiling() {
            stmts.push(Statement::LogSize {
                relation: concrete.clone(),
                message: logs::n_nonrecursive_relation(&concrete),
            });
        }

        let sequence = Statement::Sequence(stmts);
        if self.context.profiling() {
            return Statement::LogRelationTimer {
                message: logs::t_nonrecursive_relation(&concrete),
                relation: concrete,
                inner: Box::new(sequence),
            };
        }
        sequence
    }

    /// One query per non-recursive clause of the relation, each wrapped
    /// in debug info (and a rule timer under profiling).
    fn translate_non_recursive_clauses(&mut self, name: Symbol) -> Vec<Statement> {
        let clauses = self.context.relation_details.clauses(name);
        let mut stmts = Vec::new();
        for &clause in clauses {
            if self.context.scc_graph.is_recursive_clause(clause) {
                continue;
            }

            let mut stmt =
                ClauseTranslator::generate_clause(self.context, self.symbols, clause, clause, 0);
            self.report_clause(&clause.to_string(), &stmt);
            if self.context.profiling() {
                stmt = Statement::LogRelationTimer {
                    message: logs::t_nonrecursive_rule(
                        name.as_ref(),
                        &clause.loc,
                        &clause.to_string(),
                    ),
                    relation: concrete_name(name),
                    inner: Box::new(stmt),
                };
            }
            stmts.push(Statement::debug_info(
                format!("{}\nin file {}", clause, clause.loc),
                stmt,
            ));
        }
        stmts
    }

    /// Preamble, fixpoint loop and postamble of one recursive SCC.
    fn generate_recursive_stratum(&mut self, scc: usize) -> Statement {
        let mut stmts = self.generate_stratum_preamble(scc);

        let mut loop_body = self.generate_stratum_loop_body(scc);
        loop_body.extend(self.generate_stratum_table_updates(scc));
        loop_body.push(self.generate_stratum_exit(scc));
        stmts.push(Statement::Loop(Box::new(Statement::Sequence(loop_body))));

        stmts.extend(self.generate_stratum_postamble(scc));
        Statement::Sequence(stmts)
    }

    /// Initialise the concrete relations from their non-recursive
    /// clauses, then seed every delta relation with the result.
    fn generate_stratum_preamble(&mut self, scc: usize) -> Vec<Statement> {
        let members = self.context.scc_graph.relations(scc);
        let mut stmts = Vec::new();
        for &name in members {
            stmts.extend(self.translate_non_recursive_clauses(name));
        }
        for &name in members {
            stmts.push(Statement::Merge {
                dest: delta_name(name),
                src: concrete_name(name),
            });
        }
        stmts
    }

    /// All semi-naïve versions of every recursive clause in the SCC.
    fn generate_stratum_loop_body(&mut self, scc: usize) -> Vec<Statement> {
        let members = self.context.scc_graph.relations(scc);
        let mut stmts = Vec::new();
        for &name in members {
            for &clause in self.context.relation_details.clauses(name) {
                if !self.context.scc_graph.is_recursive_clause(clause) {
                    continue;
                }
                let versions = ClauseTranslator::generate_clause_versions(
                    self.context,
                    self.symbols,
                    scc,
                    clause,
                );
                for version in &versions {
                    self.report_clause(&clause.to_string(), version);
                }
                stmts.extend(versions);
            }
        }
        stmts
    }

    /// Fold this iteration's additions into the accumulated tables and
    /// move them into the deltas for the next round. The node alphabet
    /// has no swap, so `delta := new` is a clear followed by a merge.
    fn generate_stratum_table_updates(&self, scc: usize) -> Vec<Statement> {
        let mut stmts = Vec::new();
        for &name in self.context.scc_graph.relations(scc) {
            stmts.push(Statement::Merge {
                dest: concrete_name(name),
                src: new_name(name),
            });
            stmts.push(Statement::Clear(delta_name(name)));
            stmts.push(Statement::Merge {
                dest: delta_name(name),
                src: new_name(name),
            });
            stmts.push(Statement::Clear(new_name(name)));
        }
        stmts
    }

    /// The loop terminates once no delta relation holds tuples.
    fn generate_stratum_exit(&self, scc: usize) -> Statement {
        let mut condition: Option<Condition> = None;
        for &name in self.context.scc_graph.relations(scc) {
            condition = Condition::conjoin(condition, Condition::empty(delta_name(name)));
        }
        Statement::Exit(condition.expect("recursive stratum should contain a relation"))
    }

    /// Store outputs and drop the working tables.
    fn generate_stratum_postamble(&self, scc: usize) -> Vec<Statement> {
        let members = self.context.scc_graph.relations(scc);
        let mut stmts = Vec::new();
        for &name in members {
            if self.context.io.is_output(name) {
                stmts.push(Statement::Store(concrete_name(name)));
            }
        }
        for &name in members {
            stmts.push(Statement::Clear(delta_name(name)));
            stmts.push(Statement::Clear(new_name(name)));
        }
        stmts
    }

    /// Clear relations whose last consumer stratum has passed.
    fn generate_clear_expired(&self, scc: usize) -> Option<Statement> {
        let expired = self.context.schedule.expired(scc);
        if expired.is_empty() {
            return None;
        }
        Some(Statement::Sequence(
            expired
                .iter()
                .map(|&name| Statement::Clear(concrete_name(name)))
                .collect(),
        ))
    }

    fn report_clause(&mut self, clause_text: &str, stmt: &Statement) {
        if let Some(hook) = &mut self.debug_hook {
            hook(&format!("{}\n{}", clause_text, stmt));
        }
    }
}

/// Preprocess and translate a program with explicitly provided type
/// oracles. The symbol table is caller-owned so ids can be resolved (or
/// pre-seeded) outside the translation.
pub fn translate_unit_with(
    program: &mut Program,
    symbols: &SymbolTable,
    type_env: &TypeEnvironment,
    poly: &PolymorphicObjects,
    config: &TranslatorConfig,
) -> TranslationUnit {
    preprocess(program, type_env, poly, config.sips.metric());

    let functors = FunctorAnalysis::new();
    let aux_arity = AuxiliaryArity::new();
    let relation_details = RelationDetailCache::build(program);
    let scc_graph = SccGraph::build(program);
    let io = IoDirectives::build(program);
    let schedule = RelationSchedule::build(program, &scc_graph, &io);

    let context = TranslatorContext {
        type_env,
        functors: &functors,
        poly,
        aux_arity: &aux_arity,
        relation_details: &relation_details,
        scc_graph: &scc_graph,
        schedule: &schedule,
        io: &io,
        config,
    };
    let result = UnitTranslator::new(&context, symbols).generate_program();
    result
}

/// Preprocess and translate a program that uses no ADTs and no
/// polymorphic overrides.
pub fn translate_unit(
    program: &mut Program,
    symbols: &SymbolTable,
    config: &TranslatorConfig,
) -> TranslationUnit {
    let type_env = TypeEnvironment::new();
    let poly = PolymorphicObjects::new();
    translate_unit_with(program, symbols, &type_env, &poly, config)
}
