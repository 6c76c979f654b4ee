//! Functor classification

use datalog_ast::{FunctorOp, IntrinsicFunctor};

/// Classifies functor applications for the translator.
///
/// The only property the core needs is single- versus multi-result: a
/// multi-result functor produces a stream of values per application and
/// becomes a generator level rather than an expression.
#[derive(Debug, Default)]
pub struct FunctorAnalysis;

impl FunctorAnalysis {
    pub fn new() -> Self {
        FunctorAnalysis
    }

    /// Whether an operator yields multiple results per application.
    pub fn is_multi_result_op(op: FunctorOp) -> bool {
        matches!(op, FunctorOp::Range | FunctorOp::Urange | FunctorOp::Frange)
    }

    /// Whether a functor application is multi-result. Uses the finalised
    /// operator when one has been stamped, the written one otherwise.
    pub fn is_multi_result(&self, functor: &IntrinsicFunctor) -> bool {
        Self::is_multi_result_op(functor.final_op.unwrap_or(functor.op))
    }
}
