//! The clause translator
//!
//! Lowers one clause into a RAM `Query`. A rule is assembled bottom-up:
//! the projection into the head relation sits innermost, then variable
//! binding equalities, then body-literal conditions (including the
//! semi-naïve negations for recursive clauses), then generator levels,
//! then the scans and record unpacks that introduce variables, and
//! finally the nullary-head entry filter.
//!
//! Per-clause state (the value index, the operator stack, the generator
//! list, the delta/prev atoms of the current semi-naïve version) lives
//! on the translator, which is created fresh per clause and dropped when
//! the statement is returned.

use crate::constraint::translate_constraint;
use crate::context::TranslatorContext;
use crate::location::Location;
use crate::logs;
use crate::names::{concrete_name, delta_name, new_name};
use crate::value::{translate_constant, translate_value};
use crate::value_index::ValueIndex;
use datalog_analysis::SymbolTable;
use datalog_ast::{
    walk_clause_arguments, Aggregator, Argument, Atom, BinaryConstraint, BinaryConstraintOp,
    Clause, Constant, FunctorOp, IntrinsicFunctor, Literal, NumericType, RecordInit,
};
use ram::{Condition, Expression, NestedIntrinsicOp, Operation, Statement};

/// A variable-introduction site on the operator stack.
#[derive(Clone, Copy)]
enum Operator<'c> {
    /// A body atom, realized as a scan.
    Scan(&'c Atom),
    /// A record-init, realized as an unpack.
    Unpack(&'c RecordInit),
}

/// A multi-valued binding site; generator levels sit above the operator
/// stack.
#[derive(Clone, Copy)]
enum Generator<'c> {
    Aggregate(&'c Aggregator),
    MultiResult(&'c IntrinsicFunctor),
}

pub struct ClauseTranslator<'a, 'c> {
    context: &'a TranslatorContext<'a>,
    symbols: &'a SymbolTable,
    value_index: ValueIndex,
    operators: Vec<Operator<'c>>,
    generators: Vec<Generator<'c>>,
    /// The body atom scanned over the delta relation in the current
    /// semi-naïve version; `None` outside recursive translation.
    delta_atom: Option<&'c Atom>,
    /// Same-SCC atoms after the delta atom in the chosen order; each is
    /// additionally negated against its delta relation.
    prevs: Vec<&'c Atom>,
}

impl<'a, 'c> ClauseTranslator<'a, 'c> {
    pub fn new(context: &'a TranslatorContext<'a>, symbols: &'a SymbolTable) -> Self {
        ClauseTranslator {
            context,
            symbols,
            value_index: ValueIndex::new(),
            operators: Vec::new(),
            generators: Vec::new(),
            delta_atom: None,
            prevs: Vec::new(),
        }
    }

    /// Translate a non-recursive clause (or a fact).
    pub fn generate_clause(
        context: &'a TranslatorContext<'a>,
        symbols: &'a SymbolTable,
        clause: &'c Clause,
        original_clause: &'c Clause,
        version: usize,
    ) -> Statement {
        ClauseTranslator::new(context, symbols).translate_clause(clause, original_clause, version)
    }

    /// Produce the semi-naïve versions of a recursive clause: one
    /// statement per body atom whose relation lies in `scc`.
    ///
    /// # Panics
    /// If the clause's execution plan references a version that was
    /// never generated.
    pub fn generate_clause_versions(
        context: &'a TranslatorContext<'a>,
        symbols: &'a SymbolTable,
        scc: usize,
        clause: &'c Clause,
    ) -> Vec<Statement> {
        let atoms = clause.body_atoms();
        let mut versions = Vec::new();
        let mut version = 0;
        for (delta_idx, atom) in atoms.iter().enumerate() {
            // only atoms within the same SCC become delta sources
            if context.scc_graph.scc_of(atom.name) != Some(scc) {
                continue;
            }
            versions.push(
                ClauseTranslator::new(context, symbols)
                    .generate_clause_version(scc, clause, delta_idx, version),
            );
            version += 1;
        }

        if let Some(max_version) = clause.plan.as_ref().and_then(|plan| plan.max_version()) {
            assert!(
                version > max_version,
                "execution plan of `{}` references missing version {}",
                clause,
                max_version
            );
        }

        versions
    }

    fn generate_clause_version(
        mut self,
        scc: usize,
        clause: &'c Clause,
        delta_idx: usize,
        version: usize,
    ) -> Statement {
        let atoms = clause.body_atoms();
        let delta_atom = atoms[delta_idx];
        self.delta_atom = Some(delta_atom);

        // prevs are the same-SCC atoms after the delta in the chosen
        // order, so each derivation is owed to exactly one delta.
        let scc_graph = self.context.scc_graph;
        let ordered = Self::atom_ordering(clause, version);
        let delta_pos = ordered
            .iter()
            .position(|atom| std::ptr::eq(*atom, delta_atom))
            .expect("delta atom should survive reordering");
        self.prevs = ordered[delta_pos + 1..]
            .iter()
            .copied()
            .filter(|atom| scc_graph.scc_of(atom.name) == Some(scc))
            .collect();

        let profiling = self.context.profiling();
        let mut rule = self.translate_clause(clause, clause, version);

        if profiling {
            rule = Statement::LogRelationTimer {
                message: logs::t_recursive_rule(
                    clause.head.name.as_ref(),
                    version,
                    &clause.loc,
                    &clause.to_string(),
                ),
                relation: new_name(clause.head.name),
                inner: Box::new(rule),
            };
        }

        Statement::debug_info(format!("{}\nin file {}", clause, clause.loc), rule)
    }

    /// Translate one clause into a RAM query. `original_clause` is the
    /// user-written clause; `clause` may be a reordered copy.
    pub fn translate_clause(
        &mut self,
        clause: &'c Clause,
        original_clause: &'c Clause,
        version: usize,
    ) -> Statement {
        if clause.is_fact() {
            return self.create_fact_query(clause);
        }
        self.create_rule_query(clause, original_clause, version)
    }

    fn is_recursive(&self) -> bool {
        self.delta_atom.is_some()
    }

    /// The RAM table an atom reads or writes in this clause version.
    fn clause_atom_name(&self, clause: &Clause, atom: &Atom) -> String {
        if !self.is_recursive() {
            return concrete_name(atom.name);
        }
        if std::ptr::eq(&clause.head, atom) {
            return new_name(atom.name);
        }
        if self
            .delta_atom
            .is_some_and(|delta| std::ptr::eq(delta, atom))
        {
            return delta_name(atom.name);
        }
        concrete_name(atom.name)
    }

    fn create_fact_query(&self, clause: &Clause) -> Statement {
        assert!(clause.is_fact(), "clause should be a fact");
        assert!(!self.is_recursive(), "facts cannot appear in recursive strata");

        let values = clause
            .head
            .args
            .iter()
            .map(|arg| translate_value(self.context, self.symbols, &self.value_index, arg))
            .collect();
        Statement::Query(Operation::Project {
            relation: self.clause_atom_name(clause, &clause.head),
            values,
        })
    }

    fn create_rule_query(
        &mut self,
        clause: &'c Clause,
        original_clause: &'c Clause,
        version: usize,
    ) -> Statement {
        assert!(!clause.is_fact(), "clause should be a rule");

        let ordered_atoms = Self::atom_ordering(clause, version);
        self.index_clause(&ordered_atoms, clause);

        let mut op = self.create_projection(clause);
        op = self.add_variable_binding_constraints(op);
        op = self.add_body_literal_constraints(clause, op);
        op = self.add_generator_levels(op, clause);
        op = self.add_variable_introductions(clause, original_clause, version, op);
        op = self.add_entry_point(original_clause, op);
        Statement::Query(op)
    }

    /// Body atoms in the order imposed by the execution plan for this
    /// version, or written order when no plan applies.
    fn atom_ordering(clause: &'c Clause, version: usize) -> Vec<&'c Atom> {
        let atoms = clause.body_atoms();
        let Some(order) = clause.plan.as_ref().and_then(|plan| plan.order(version)) else {
            return atoms;
        };

        assert_eq!(
            order.len(),
            atoms.len(),
            "execution plan order of `{}` should mention every body atom",
            clause
        );
        let mut seen = vec![false; atoms.len()];
        order
            .iter()
            .map(|&position| {
                // plan positions are 1-based
                assert!(
                    (1..=atoms.len()).contains(&position) && !seen[position - 1],
                    "execution plan order of `{}` should be a permutation",
                    clause
                );
                seen[position - 1] = true;
                atoms[position - 1]
            })
            .collect()
    }

    // --- indexing -------------------------------------------------------

    fn index_clause(&mut self, ordered_atoms: &[&'c Atom], clause: &'c Clause) {
        self.index_atoms(ordered_atoms);
        self.index_aggregators(clause);
        self.index_multi_result_functors(clause);
    }

    fn add_operator_level(&mut self, operator: Operator<'c>) -> usize {
        let level = self.operators.len() + self.generators.len();
        self.operators.push(operator);
        level
    }

    fn add_generator_level(&mut self, generator: Generator<'c>) -> usize {
        let level = self.operators.len() + self.generators.len();
        self.generators.push(generator);
        level
    }

    fn index_atoms(&mut self, ordered_atoms: &[&'c Atom]) {
        for &atom in ordered_atoms {
            let scan_level = self.add_operator_level(Operator::Scan(atom));
            self.index_node_arguments(scan_level, &atom.args);
        }
    }

    fn index_node_arguments(&mut self, level: usize, args: &'c [Argument]) {
        for (column, arg) in args.iter().enumerate() {
            match arg {
                Argument::Variable(name) => {
                    self.value_index.add_var_reference(*name, level, column);
                }
                Argument::Record(rec) => {
                    self.value_index.set_record_definition(rec.id, level, column);
                    // nested records open their own unpack level
                    let unpack_level = self.add_operator_level(Operator::Unpack(rec));
                    self.index_node_arguments(unpack_level, &rec.args);
                }
                _ => {}
            }
        }
    }

    fn index_aggregators(&mut self, clause: &'c Clause) {
        let mut aggregators: Vec<&'c Aggregator> = Vec::new();
        walk_clause_arguments(clause, &mut |arg| {
            if let Argument::Aggregator(agg) = arg {
                aggregators.push(agg);
            }
        });

        for &agg in &aggregators {
            let level = self.add_generator_level(Generator::Aggregate(agg));
            self.value_index
                .set_generator_loc(agg.id, Location::new(level, 0));
        }
        for &agg in &aggregators {
            self.index_aggregator_body(agg);
        }

        // a binding `V = <aggregator>` aliases V to the generator output
        for constraint in collect_constraints(clause) {
            if !constraint.op.is_eq() {
                continue;
            }
            let (Argument::Variable(name), Argument::Aggregator(agg)) =
                (&constraint.lhs, &constraint.rhs)
            else {
                continue;
            };
            let loc = self.value_index.generator_loc(agg.id);
            self.value_index.alias_var(*name, loc);
        }
    }

    fn index_aggregator_body(&mut self, agg: &'c Aggregator) {
        let agg_loc = self.value_index.generator_loc(agg.id);
        let body_atoms = agg.body_atoms();
        assert_eq!(
            body_atoms.len(),
            1,
            "aggregator should have exactly one body atom"
        );

        for (column, arg) in body_atoms[0].args.iter().enumerate() {
            if let Argument::Variable(name) = arg {
                self.value_index
                    .add_var_reference(*name, agg_loc.level, column);
            }
        }
    }

    fn index_multi_result_functors(&mut self, clause: &'c Clause) {
        let mut functors: Vec<&'c IntrinsicFunctor> = Vec::new();
        walk_clause_arguments(clause, &mut |arg| {
            if let Argument::Intrinsic(func) = arg {
                if self.context.functors.is_multi_result(func) {
                    functors.push(func);
                }
            }
        });

        for func in functors {
            let level = self.add_generator_level(Generator::MultiResult(func));
            self.value_index
                .set_generator_loc(func.id, Location::new(level, 0));
        }

        for constraint in collect_constraints(clause) {
            if !constraint.op.is_eq() {
                continue;
            }
            let (Argument::Variable(name), Argument::Intrinsic(func)) =
                (&constraint.lhs, &constraint.rhs)
            else {
                continue;
            };
            if !self.context.functors.is_multi_result(func) {
                continue;
            }
            let loc = self.value_index.generator_loc(func.id);
            self.value_index.alias_var(*name, loc);
        }
    }

    // --- bottom-up assembly ---------------------------------------------

    fn create_projection(&self, clause: &Clause) -> Operation {
        let head = &clause.head;
        let relation = self.clause_atom_name(clause, head);

        let values = head
            .args
            .iter()
            .map(|arg| translate_value(self.context, self.symbols, &self.value_index, arg))
            .collect();
        let project = Operation::Project {
            relation: relation.clone(),
            values,
        };

        if head.arity() == 0 {
            // project the null tuple at most once
            return Operation::filter(Condition::empty(relation), project);
        }
        project
    }

    fn add_variable_binding_constraints(&self, mut op: Operation) -> Operation {
        for (name, references) in self.value_index.variable_references() {
            assert!(
                !references.is_empty(),
                "variable {} should appear at least once",
                name
            );
            // equate the defining appearance to all non-generator others
            let first = references[0];
            for reference in references {
                if *reference != first && !self.value_index.is_generator(reference.level) {
                    // TODO: float type equivalence check
                    op = self.add_equality_check(
                        op,
                        first.tuple_element(),
                        reference.tuple_element(),
                        false,
                    );
                }
            }
        }
        op
    }

    fn add_body_literal_constraints(&self, clause: &Clause, mut op: Operation) -> Operation {
        for literal in &clause.body {
            if let Literal::Negation(atom) = literal {
                op = self.add_negate(atom, op, false);
            } else if let Some(condition) =
                translate_constraint(self.context, self.symbols, &self.value_index, literal)
            {
                op = Operation::filter(condition, op);
            }
        }

        if self.is_recursive() {
            if clause.head.arity() > 0 {
                // suppress tuples the concrete relation already holds
                op = self.add_negate(&clause.head, op, false);
            }
            for prev in &self.prevs {
                op = self.add_negate(prev, op, true);
            }
        }

        op
    }

    /// The negated existence condition for an atom: value columns match,
    /// auxiliary columns stay undefined. Nullary atoms reduce to an
    /// emptiness check.
    fn negation_condition(&self, atom: &Atom, against_delta: bool) -> Condition {
        let aux_arity = self.context.evaluation_arity(atom);
        assert!(
            aux_arity <= atom.arity(),
            "auxiliary arity of {} out of bounds",
            atom.name
        );
        let arity = atom.arity() - aux_arity;
        let relation = if against_delta {
            delta_name(atom.name)
        } else {
            concrete_name(atom.name)
        };

        if arity == 0 {
            return Condition::empty(relation);
        }

        let mut values: Vec<Expression> = atom.args[..arity]
            .iter()
            .map(|arg| translate_value(self.context, self.symbols, &self.value_index, arg))
            .collect();
        values.extend(std::iter::repeat(Expression::Undef).take(aux_arity));
        Condition::ExistenceCheck { relation, values }.not()
    }

    fn add_negate(&self, atom: &Atom, op: Operation, against_delta: bool) -> Operation {
        Operation::filter(self.negation_condition(atom, against_delta), op)
    }

    fn add_generator_levels(&self, mut op: Operation, clause: &Clause) -> Operation {
        let mut level = self.operators.len() + self.generators.len();
        for generator in self.generators.iter().rev() {
            level -= 1;
            op = match generator {
                Generator::Aggregate(agg) => self.instantiate_aggregator(op, clause, agg, level),
                Generator::MultiResult(func) => {
                    self.instantiate_multi_result_functor(op, func, level)
                }
            };
        }
        op
    }

    fn instantiate_aggregator(
        &self,
        op: Operation,
        clause: &Clause,
        agg: &Aggregator,
        level: usize,
    ) -> Operation {
        let mut condition: Option<Condition> = None;

        // constraints of the sub-clause
        for literal in &agg.body {
            if let Literal::Negation(atom) = literal {
                condition = Condition::conjoin(condition, self.negation_condition(atom, false));
            } else if let Some(translated) =
                translate_constraint(self.context, self.symbols, &self.value_index, literal)
            {
                condition = Condition::conjoin(condition, translated);
            }
        }

        let body_atoms = agg.body_atoms();
        assert_eq!(
            body_atoms.len(),
            1,
            "aggregator should have exactly one body atom"
        );
        let agg_atom = body_atoms[0];

        // equate atom arguments with the aggregate tuple, avoiding
        // self-referential bindings for variables defined right here
        for (column, arg) in agg_atom.args.iter().enumerate() {
            match arg {
                Argument::Variable(name) => {
                    for reference in self.value_index.references(*name) {
                        if reference.level != level || reference.column != column {
                            condition = Condition::conjoin(
                                condition,
                                Condition::eq(
                                    Expression::tuple(level, column),
                                    reference.tuple_element(),
                                ),
                            );
                            break;
                        }
                    }
                }
                _ => {
                    let value =
                        translate_value(self.context, self.symbols, &self.value_index, arg);
                    if !value.is_undef() {
                        condition = Condition::conjoin(
                            condition,
                            Condition::eq(Expression::tuple(level, column), value),
                        );
                    }
                }
            }
        }

        let target = agg
            .target
            .as_deref()
            .map(|expr| translate_value(self.context, self.symbols, &self.value_index, expr))
            .unwrap_or(Expression::Undef);

        Operation::Aggregate {
            op: agg.op,
            relation: self.clause_atom_name(clause, agg_atom),
            target,
            condition: condition.unwrap_or(Condition::True),
            level,
            inner: Box::new(op),
        }
    }

    fn instantiate_multi_result_functor(
        &self,
        op: Operation,
        func: &IntrinsicFunctor,
        level: usize,
    ) -> Operation {
        let args = func
            .args
            .iter()
            .map(|arg| translate_value(self.context, self.symbols, &self.value_index, arg))
            .collect();

        let nested_op = match func.final_op.unwrap_or(func.op) {
            FunctorOp::Range => NestedIntrinsicOp::Range,
            FunctorOp::Urange => NestedIntrinsicOp::Urange,
            FunctorOp::Frange => NestedIntrinsicOp::Frange,
            other => panic!("unhandled generator functor `{}`", other.symbol()),
        };

        Operation::NestedIntrinsic {
            op: nested_op,
            args,
            level,
            inner: Box::new(op),
        }
    }

    fn add_variable_introductions(
        &self,
        clause: &Clause,
        original_clause: &Clause,
        version: usize,
        mut op: Operation,
    ) -> Operation {
        for level in (0..self.operators.len()).rev() {
            op = match self.operators[level] {
                Operator::Scan(atom) => {
                    self.add_atom_scan(op, atom, clause, original_clause, level, version)
                }
                Operator::Unpack(rec) => self.add_record_unpack(op, rec, level),
            };
        }
        op
    }

    fn add_atom_scan(
        &self,
        op: Operation,
        atom: &Atom,
        clause: &Clause,
        original_clause: &Clause,
        level: usize,
        version: usize,
    ) -> Operation {
        let relation = self.clause_atom_name(clause, atom);

        let mut op = self.add_constant_constraints(level, &atom.args, op);
        op = Operation::filter(Condition::empty(relation.clone()).not(), op);

        let all_unnamed = atom
            .args
            .iter()
            .all(|arg| matches!(arg, Argument::UnnamedVariable));
        if atom.arity() == 0 || all_unnamed {
            return op;
        }

        if clause.head.arity() == 0 {
            // one successful projection settles a nullary head
            op = Operation::Break {
                condition: Condition::empty(self.clause_atom_name(clause, &clause.head)).not(),
                inner: Box::new(op),
            };
        }

        let profile_text = if self.context.profiling() {
            format!(
                "@frequency-atom;{};{};{};{};{};{};",
                original_clause.head.name,
                version,
                logs::stringify(&clause.to_string()),
                logs::stringify(&atom.to_string()),
                logs::stringify(&original_clause.to_string()),
                level
            )
        } else {
            String::new()
        };

        Operation::Scan {
            relation,
            level,
            inner: Box::new(op),
            profile_text,
        }
    }

    fn add_record_unpack(&self, op: Operation, rec: &RecordInit, level: usize) -> Operation {
        let op = self.add_constant_constraints(level, &rec.args, op);
        Operation::UnpackRecord {
            reference: self.value_index.record_definition(rec.id).tuple_element(),
            level,
            arity: rec.args.len(),
            inner: Box::new(op),
        }
    }

    fn add_constant_constraints(
        &self,
        level: usize,
        args: &[Argument],
        mut op: Operation,
    ) -> Operation {
        for (column, arg) in args.iter().enumerate() {
            let Argument::Constant(constant) = arg else {
                continue;
            };
            let is_float = match constant {
                Constant::Numeric(numeric) => {
                    let ty = numeric
                        .numeric_type
                        .expect("numeric constant should have a finalised type");
                    ty == NumericType::Float
                }
                Constant::String(_) | Constant::Nil => false,
            };
            op = self.add_equality_check(
                op,
                Expression::tuple(level, column),
                translate_constant(self.symbols, constant),
                is_float,
            );
        }
        op
    }

    fn add_equality_check(
        &self,
        op: Operation,
        lhs: Expression,
        rhs: Expression,
        is_float: bool,
    ) -> Operation {
        let eq_op = if is_float {
            BinaryConstraintOp::Feq
        } else {
            BinaryConstraintOp::Eq
        };
        Operation::filter(Condition::Constraint { op: eq_op, lhs, rhs }, op)
    }

    /// The fixpoint stopping criterion for nullary heads: only run the
    /// query while the head relation is still empty.
    fn add_entry_point(&self, original_clause: &Clause, op: Operation) -> Operation {
        let head = &original_clause.head;
        if head.arity() == 0 {
            let relation = self.clause_atom_name(original_clause, head);
            return Operation::filter(Condition::empty(relation), op);
        }
        op
    }
}

/// Binary constraints of a clause, including those inside aggregator
/// bodies.
fn collect_constraints<'c>(clause: &'c Clause) -> Vec<&'c BinaryConstraint> {
    let mut constraints = Vec::new();
    for literal in &clause.body {
        if let Literal::Constraint(constraint) = literal {
            constraints.push(constraint);
        }
    }
    walk_clause_arguments(clause, &mut |arg| {
        if let Argument::Aggregator(agg) = arg {
            for literal in &agg.body {
                if let Literal::Constraint(constraint) = literal {
                    constraints.push(constraint);
                }
            }
        }
    });
    constraints
}
