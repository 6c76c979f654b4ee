//! Relation lifetime schedule
//!
//! For each SCC step of the topological order, which relations must be
//! loaded before it runs and which become expired once it has run. A
//! relation expires at the last step that reads it (or at its own step
//! if nothing ever does), unless it carries an output directive.

use crate::relation::IoDirectives;
use crate::scc::SccGraph;
use datalog_ast::{walk_clause_arguments, Argument, Literal, Program, Symbol};
use std::collections::HashMap;

/// Load/expiry lists for one SCC step.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SccStep {
    pub loaded: Vec<Symbol>,
    pub expired: Vec<Symbol>,
}

/// The per-step schedule, indexed by SCC id.
#[derive(Debug)]
pub struct RelationSchedule {
    steps: Vec<SccStep>,
}

impl RelationSchedule {
    pub fn build(program: &Program, scc_graph: &SccGraph, io: &IoDirectives) -> Self {
        let mut steps = vec![SccStep::default(); scc_graph.num_sccs()];

        for (scc, step) in steps.iter_mut().enumerate() {
            step.loaded = scc_graph
                .relations(scc)
                .iter()
                .copied()
                .filter(|rel| io.is_input(*rel))
                .collect();
        }

        // A relation's last use is the latest step whose clauses read it.
        let mut last_use: HashMap<Symbol, usize> = HashMap::new();
        for relation in &program.relations {
            if let Some(scc) = scc_graph.scc_of(relation.name) {
                last_use.insert(relation.name, scc);
            }
        }
        for clause in &program.clauses {
            let Some(reader) = scc_graph.scc_of(clause.head.name) else {
                continue;
            };
            for read in clause_reads(clause) {
                if let Some(entry) = last_use.get_mut(&read) {
                    *entry = (*entry).max(reader);
                }
            }
        }

        for (relation, step) in last_use {
            if !io.is_output(relation) {
                steps[step].expired.push(relation);
            }
        }
        for step in &mut steps {
            step.expired.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
        }

        RelationSchedule { steps }
    }

    /// Relations to load before the step runs.
    pub fn loaded(&self, scc: usize) -> &[Symbol] {
        &self.steps[scc].loaded
    }

    /// Relations whose last consumer has now run.
    pub fn expired(&self, scc: usize) -> &[Symbol] {
        &self.steps[scc].expired
    }
}

fn clause_reads(clause: &datalog_ast::Clause) -> Vec<Symbol> {
    let mut reads = Vec::new();
    for lit in &clause.body {
        match lit {
            Literal::Atom(atom) | Literal::Negation(atom) => reads.push(atom.name),
            Literal::Constraint(_) => {}
        }
    }
    walk_clause_arguments(clause, &mut |arg| {
        if let Argument::Aggregator(agg) = arg {
            for atom in agg.body_atoms() {
                reads.push(atom.name);
            }
        }
    });
    reads
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{Atom, Clause, Relation};

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.to_string())
    }

    #[test]
    fn test_inputs_load_and_intermediates_expire() {
        let mut program = Program::new();
        let mut edge = Relation::new("edge", 2);
        edge.input = true;
        program.relations.push(edge);
        let mut tc = Relation::new("tc", 2);
        tc.output = true;
        program.relations.push(tc);
        program.clauses.push(Clause::new(
            Atom::new("tc", vec![Argument::var("X"), Argument::var("Y")]),
            vec![Literal::Atom(Atom::new(
                "edge",
                vec![Argument::var("X"), Argument::var("Y")],
            ))],
        ));
        program.clauses.push(Clause::new(
            Atom::new("tc", vec![Argument::var("X"), Argument::var("Z")]),
            vec![
                Literal::Atom(Atom::new(
                    "edge",
                    vec![Argument::var("X"), Argument::var("Y")],
                )),
                Literal::Atom(Atom::new("tc", vec![Argument::var("Y"), Argument::var("Z")])),
            ],
        ));

        let scc_graph = SccGraph::build(&program);
        let io = IoDirectives::build(&program);
        let schedule = RelationSchedule::build(&program, &scc_graph, &io);

        let edge_scc = scc_graph.scc_of(sym("edge")).unwrap();
        let tc_scc = scc_graph.scc_of(sym("tc")).unwrap();

        assert_eq!(schedule.loaded(edge_scc), &[sym("edge")]);
        assert!(schedule.loaded(tc_scc).is_empty());

        // edge is last read by the tc stratum; tc itself is an output.
        assert!(schedule.expired(edge_scc).is_empty());
        assert_eq!(schedule.expired(tc_scc), &[sym("edge")]);
    }
}
