//! Per-relation detail caches
//!
//! Three small oracles the driver and clause translator consult on every
//! atom: the declaration/clause cache, auxiliary arities, and IO
//! directives.

use datalog_ast::{Atom, Clause, Program, Relation, Symbol};
use std::collections::{HashMap, HashSet};

/// Cache from relation name to its declaration and its clauses.
#[derive(Debug)]
pub struct RelationDetailCache<'a> {
    relations: HashMap<Symbol, &'a Relation>,
    clauses: HashMap<Symbol, Vec<&'a Clause>>,
}

impl<'a> RelationDetailCache<'a> {
    /// Build the cache with one scan over the program.
    pub fn build(program: &'a Program) -> Self {
        let mut relations = HashMap::new();
        let mut clauses: HashMap<Symbol, Vec<&'a Clause>> = HashMap::new();
        for relation in &program.relations {
            relations.insert(relation.name, relation);
        }
        for clause in &program.clauses {
            clauses.entry(clause.head.name).or_default().push(clause);
        }
        RelationDetailCache { relations, clauses }
    }

    /// The declaration an atom refers to.
    pub fn relation_of(&self, atom: &Atom) -> Option<&'a Relation> {
        self.relations.get(&atom.name).copied()
    }

    pub fn relation(&self, name: Symbol) -> Option<&'a Relation> {
        self.relations.get(&name).copied()
    }

    /// Clauses whose head is the given relation, in program order.
    pub fn clauses(&self, name: Symbol) -> &[&'a Clause] {
        self.clauses.get(&name).map(|v| v.as_slice()).unwrap_or(&[])
    }
}

/// Auxiliary arities: the count of trailing provenance columns per
/// relation, excluded from matching in negations.
///
/// Defaults to zero everywhere; provenance pipelines install overrides.
#[derive(Debug, Default)]
pub struct AuxiliaryArity {
    overrides: HashMap<Symbol, usize>,
}

impl AuxiliaryArity {
    pub fn new() -> Self {
        AuxiliaryArity::default()
    }

    pub fn set_arity(&mut self, relation: Symbol, arity: usize) {
        self.overrides.insert(relation, arity);
    }

    pub fn arity_of(&self, relation: Symbol) -> usize {
        self.overrides.get(&relation).copied().unwrap_or(0)
    }
}

/// Which relations carry input and output directives.
#[derive(Debug, Default)]
pub struct IoDirectives {
    inputs: HashSet<Symbol>,
    outputs: HashSet<Symbol>,
}

impl IoDirectives {
    pub fn build(program: &Program) -> Self {
        let mut io = IoDirectives::default();
        for relation in &program.relations {
            if relation.input {
                io.inputs.insert(relation.name);
            }
            if relation.output {
                io.outputs.insert(relation.name);
            }
        }
        io
    }

    pub fn is_input(&self, relation: Symbol) -> bool {
        self.inputs.contains(&relation)
    }

    pub fn is_output(&self, relation: Symbol) -> bool {
        self.outputs.contains(&relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{Argument, Literal};

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.to_string())
    }

    #[test]
    fn test_cache_groups_clauses_by_head() {
        let mut program = Program::new();
        program.relations.push(Relation::new("p", 1));
        program.relations.push(Relation::new("q", 1));
        program.clauses.push(Clause::new(
            Atom::new("p", vec![Argument::number(1)]),
            vec![],
        ));
        program.clauses.push(Clause::new(
            Atom::new("p", vec![Argument::var("X")]),
            vec![Literal::Atom(Atom::new("q", vec![Argument::var("X")]))],
        ));

        let cache = RelationDetailCache::build(&program);
        assert_eq!(cache.clauses(sym("p")).len(), 2);
        assert!(cache.clauses(sym("q")).is_empty());
        assert_eq!(cache.relation(sym("q")).unwrap().arity, 1);
    }

    #[test]
    fn test_aux_arity_defaults_to_zero() {
        let mut aux = AuxiliaryArity::new();
        aux.set_arity(sym("p"), 2);

        assert_eq!(aux.arity_of(sym("p")), 2);
        assert_eq!(aux.arity_of(sym("q")), 0);
    }
}
