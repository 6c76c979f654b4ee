//! Shared operator vocabulary
//!
//! These enums are used on both sides of the translation: the AST carries
//! them on functors, aggregators and constraints, and the RAM IR reuses
//! them verbatim on its operator nodes. Keeping a single definition avoids
//! a lossy mapping layer between the two languages.

/// Intrinsic functor operators.
///
/// `Range`, `Urange` and `Frange` are multi-result: one application
/// produces a stream of values and is installed as a generator level by
/// the clause translator rather than lowered to an expression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FunctorOp {
    // Arithmetic
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Neg,
    Min,
    Max,
    // Strings
    Cat,
    StrLen,
    // Multi-result range generators (signed / unsigned / float)
    Range,
    Urange,
    Frange,
}

impl FunctorOp {
    /// Source-level spelling of the operator.
    pub fn symbol(self) -> &'static str {
        match self {
            FunctorOp::Add => "+",
            FunctorOp::Sub => "-",
            FunctorOp::Mul => "*",
            FunctorOp::Div => "/",
            FunctorOp::Mod => "%",
            FunctorOp::Neg => "-",
            FunctorOp::Min => "min",
            FunctorOp::Max => "max",
            FunctorOp::Cat => "cat",
            FunctorOp::StrLen => "strlen",
            FunctorOp::Range => "range",
            FunctorOp::Urange => "urange",
            FunctorOp::Frange => "frange",
        }
    }
}

/// Aggregation operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AggregateOp {
    Count,
    Sum,
    Min,
    Max,
    Mean,
}

impl std::fmt::Display for AggregateOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AggregateOp::Count => write!(f, "count"),
            AggregateOp::Sum => write!(f, "sum"),
            AggregateOp::Min => write!(f, "min"),
            AggregateOp::Max => write!(f, "max"),
            AggregateOp::Mean => write!(f, "mean"),
        }
    }
}

/// Binary constraint operators.
///
/// `Feq` is float equality; the translator emits it only for constant
/// constraints on float constants. Variable-to-variable equalities use
/// `Eq` regardless of type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryConstraintOp {
    Eq,
    Feq,
    Ne,
    Lt,
    Le,
    Gt,
    Ge,
}

impl BinaryConstraintOp {
    /// Whether this is the (non-float) equality operator.
    pub fn is_eq(self) -> bool {
        matches!(self, BinaryConstraintOp::Eq)
    }
}

impl std::fmt::Display for BinaryConstraintOp {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            BinaryConstraintOp::Eq => write!(f, "="),
            BinaryConstraintOp::Feq => write!(f, "=f="),
            BinaryConstraintOp::Ne => write!(f, "!="),
            BinaryConstraintOp::Lt => write!(f, "<"),
            BinaryConstraintOp::Le => write!(f, "<="),
            BinaryConstraintOp::Gt => write!(f, ">"),
            BinaryConstraintOp::Ge => write!(f, ">="),
        }
    }
}

/// Finalised type of a numeric constant, stamped by the preprocessor.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericType {
    Signed,
    Unsigned,
    Float,
}
