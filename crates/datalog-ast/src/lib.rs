//! AST definitions for the Datalog dialect consumed by the RAM translator
//!
//! This crate defines the typed abstract syntax tree handed to the
//! translation pipeline: programs of relation declarations and clauses,
//! where clause bodies mix positive atoms, negated atoms and binary
//! constraints, and arguments form a tree of variables, constants,
//! records, functors and aggregators.
//!
//! The front-end parser is not part of this workspace; programs are
//! produced upstream (or built directly in tests) and arrive here fully
//! resolved except for the properties stamped by the preprocessor
//! (node ids, finalised numeric/functor types, lowered ADT branches).

mod ast;
mod ops;
mod visit;

pub use ast::{
    Aggregator, Argument, Atom, BinaryConstraint, BranchInit, Clause, Constant, ExecutionPlan,
    IntrinsicFunctor, Literal, NodeId, NumericConstant, Program, RecordInit, Relation, SrcLocation,
    Symbol, UserFunctor,
};
pub use ops::{AggregateOp, BinaryConstraintOp, FunctorOp, NumericType};
pub use visit::{walk_argument, walk_clause_arguments};
