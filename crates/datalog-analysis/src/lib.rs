//! Read-only analyses consumed by the AST-to-RAM translator
//!
//! Each analysis is computed once, before translation begins, and is
//! immutable for the duration of the run (the symbol table is the one
//! exception: string constants intern into it during lowering, through
//! interior mutability). The translator receives them through a context
//! object and never reaches for global state.

mod functor;
mod relation;
mod scc;
mod schedule;
mod sips;
mod symbols;
mod types;

pub use functor::FunctorAnalysis;
pub use relation::{AuxiliaryArity, IoDirectives, RelationDetailCache};
pub use scc::SccGraph;
pub use schedule::RelationSchedule;
pub use sips::{AllBoundSips, InputOrderSips, MaxBoundSips, SipsMetric, SipsStrategy};
pub use symbols::SymbolTable;
pub use types::{AdtBranch, PolymorphicObjects, TypeEnvironment};
