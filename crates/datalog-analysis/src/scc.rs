//! Strongly-connected components of the relation dependency graph
//!
//! Relations are grouped into SCCs; each SCC is the unit of mutual
//! recursion and becomes one stratum of the emitted RAM program. The
//! graph has an edge from a clause's head relation to every relation its
//! body references (positive atoms, negated atoms, and atoms inside
//! aggregator bodies).
//!
//! SCC ids are handed out in topological order: every relation an SCC
//! depends on lives in an SCC with a smaller id. Members within an SCC
//! are sorted by name so emission order never depends on hashing.

use datalog_ast::{walk_clause_arguments, Argument, Clause, Literal, Program, Symbol};
use std::collections::HashMap;

/// The condensed relation dependency graph.
#[derive(Debug)]
pub struct SccGraph {
    sccs: Vec<Vec<Symbol>>,
    scc_of: HashMap<Symbol, usize>,
    recursive: Vec<bool>,
}

impl SccGraph {
    /// Compute SCCs with Tarjan's algorithm. Deterministic: nodes are
    /// visited in declaration order, edges in clause order.
    pub fn build(program: &Program) -> Self {
        let mut nodes: Vec<Symbol> = Vec::new();
        let mut index_of: HashMap<Symbol, usize> = HashMap::new();
        let mut add_node = |name: Symbol, nodes: &mut Vec<Symbol>| -> usize {
            *index_of.entry(name).or_insert_with(|| {
                nodes.push(name);
                nodes.len() - 1
            })
        };

        for relation in &program.relations {
            add_node(relation.name, &mut nodes);
        }

        let mut edges: Vec<Vec<usize>> = vec![Vec::new(); nodes.len()];
        for clause in &program.clauses {
            let head = add_node(clause.head.name, &mut nodes);
            edges.resize(nodes.len(), Vec::new());
            for dep in referenced_relations(clause) {
                let dep = add_node(dep, &mut nodes);
                edges.resize(nodes.len(), Vec::new());
                if !edges[head].contains(&dep) {
                    edges[head].push(dep);
                }
            }
        }

        let components = tarjan(nodes.len(), &edges);

        let mut sccs = Vec::with_capacity(components.len());
        let mut scc_of = HashMap::new();
        let mut recursive = Vec::with_capacity(components.len());
        for (id, members) in components.into_iter().enumerate() {
            let self_loop = members.len() == 1 && edges[members[0]].contains(&members[0]);
            recursive.push(members.len() > 1 || self_loop);

            let mut names: Vec<Symbol> = members.into_iter().map(|i| nodes[i]).collect();
            names.sort_by(|a, b| a.as_ref().cmp(b.as_ref()));
            for name in &names {
                scc_of.insert(*name, id);
            }
            sccs.push(names);
        }

        SccGraph {
            sccs,
            scc_of,
            recursive,
        }
    }

    /// SCC count; ids `0..num_sccs()` are in topological order.
    pub fn num_sccs(&self) -> usize {
        self.sccs.len()
    }

    pub fn scc_of(&self, relation: Symbol) -> Option<usize> {
        self.scc_of.get(&relation).copied()
    }

    /// Members of an SCC, sorted by name.
    pub fn relations(&self, scc: usize) -> &[Symbol] {
        &self.sccs[scc]
    }

    /// Whether the SCC needs fixpoint iteration (more than one relation,
    /// or a single relation with a self-loop).
    pub fn is_recursive(&self, scc: usize) -> bool {
        self.recursive[scc]
    }

    /// Whether a clause's body references a relation in the same SCC as
    /// its head.
    pub fn is_recursive_clause(&self, clause: &Clause) -> bool {
        let Some(head_scc) = self.scc_of(clause.head.name) else {
            return false;
        };
        clause
            .body_atoms()
            .iter()
            .any(|atom| self.scc_of(atom.name) == Some(head_scc))
    }
}

/// All relations a clause body mentions, in visit order.
fn referenced_relations(clause: &Clause) -> Vec<Symbol> {
    let mut deps = Vec::new();
    for lit in &clause.body {
        match lit {
            Literal::Atom(atom) | Literal::Negation(atom) => deps.push(atom.name),
            Literal::Constraint(_) => {}
        }
    }
    // Aggregators nest further atoms anywhere an argument can appear.
    walk_clause_arguments(clause, &mut |arg| {
        if let Argument::Aggregator(agg) = arg {
            for atom in agg.body_atoms() {
                deps.push(atom.name);
            }
        }
    });
    deps
}

/// Tarjan's SCC algorithm; components are emitted dependencies-first.
fn tarjan(node_count: usize, edges: &[Vec<usize>]) -> Vec<Vec<usize>> {
    struct State<'e> {
        edges: &'e [Vec<usize>],
        index: Vec<Option<usize>>,
        lowlink: Vec<usize>,
        on_stack: Vec<bool>,
        stack: Vec<usize>,
        next_index: usize,
        components: Vec<Vec<usize>>,
    }

    fn connect(v: usize, st: &mut State<'_>) {
        st.index[v] = Some(st.next_index);
        st.lowlink[v] = st.next_index;
        st.next_index += 1;
        st.stack.push(v);
        st.on_stack[v] = true;

        for &w in &st.edges[v] {
            if st.index[w].is_none() {
                connect(w, st);
                st.lowlink[v] = st.lowlink[v].min(st.lowlink[w]);
            } else if st.on_stack[w] {
                st.lowlink[v] = st.lowlink[v].min(st.index[w].unwrap());
            }
        }

        if st.lowlink[v] == st.index[v].unwrap() {
            let mut component = Vec::new();
            loop {
                let w = st.stack.pop().unwrap();
                st.on_stack[w] = false;
                component.push(w);
                if w == v {
                    break;
                }
            }
            st.components.push(component);
        }
    }

    let mut st = State {
        edges,
        index: vec![None; node_count],
        lowlink: vec![0; node_count],
        on_stack: vec![false; node_count],
        stack: Vec::new(),
        next_index: 0,
        components: Vec::new(),
    };
    for v in 0..node_count {
        if st.index[v].is_none() {
            connect(v, &mut st);
        }
    }
    st.components
}

#[cfg(test)]
mod tests {
    use super::*;
    use datalog_ast::{Atom, Relation};

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.to_string())
    }

    fn rule(head: Atom, body: Vec<Literal>) -> Clause {
        Clause::new(head, body)
    }

    fn pos(name: &str, vars: &[&str]) -> Literal {
        Literal::Atom(Atom::new(
            name,
            vars.iter().map(|v| Argument::var(*v)).collect(),
        ))
    }

    fn transitive_closure() -> Program {
        let mut program = Program::new();
        program.relations.push(Relation::new("edge", 2));
        program.relations.push(Relation::new("tc", 2));
        program.clauses.push(rule(
            Atom::new("tc", vec![Argument::var("X"), Argument::var("Y")]),
            vec![pos("edge", &["X", "Y"])],
        ));
        program.clauses.push(rule(
            Atom::new("tc", vec![Argument::var("X"), Argument::var("Z")]),
            vec![pos("edge", &["X", "Y"]), pos("tc", &["Y", "Z"])],
        ));
        program
    }

    #[test]
    fn test_dependencies_come_first() {
        let graph = SccGraph::build(&transitive_closure());

        assert_eq!(graph.num_sccs(), 2);
        let edge_scc = graph.scc_of(sym("edge")).unwrap();
        let tc_scc = graph.scc_of(sym("tc")).unwrap();
        assert!(edge_scc < tc_scc);
    }

    #[test]
    fn test_self_loop_is_recursive() {
        let graph = SccGraph::build(&transitive_closure());

        let edge_scc = graph.scc_of(sym("edge")).unwrap();
        let tc_scc = graph.scc_of(sym("tc")).unwrap();
        assert!(!graph.is_recursive(edge_scc));
        assert!(graph.is_recursive(tc_scc));
    }

    #[test]
    fn test_mutual_recursion_shares_an_scc() {
        let mut program = Program::new();
        program.relations.push(Relation::new("p", 1));
        program.relations.push(Relation::new("q", 1));
        program.relations.push(Relation::new("base", 1));
        program.clauses.push(rule(
            Atom::new("p", vec![Argument::var("X")]),
            vec![pos("q", &["X"])],
        ));
        program.clauses.push(rule(
            Atom::new("q", vec![Argument::var("X")]),
            vec![pos("p", &["X"]), pos("base", &["X"])],
        ));

        let graph = SccGraph::build(&program);
        let p_scc = graph.scc_of(sym("p")).unwrap();
        assert_eq!(graph.scc_of(sym("q")), Some(p_scc));
        assert!(graph.is_recursive(p_scc));
        assert_eq!(graph.relations(p_scc), &[sym("p"), sym("q")]);
        assert!(graph.scc_of(sym("base")).unwrap() < p_scc);
    }

    #[test]
    fn test_recursive_clause_detection() {
        let program = transitive_closure();
        let graph = SccGraph::build(&program);

        assert!(!graph.is_recursive_clause(&program.clauses[0]));
        assert!(graph.is_recursive_clause(&program.clauses[1]));
    }
}
