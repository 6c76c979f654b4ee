//! Type-level oracles: the type environment and polymorphic-object
//! resolution
//!
//! The type environment carries the ADT branch table the preprocessor
//! needs to lower branch terms into record encodings. The
//! polymorphic-objects analysis resolves the overloaded pieces of the
//! AST: which concrete type a numeric literal has, and which overload an
//! intrinsic functor application binds to. Upstream semantic analysis
//! would populate the per-node overrides; absent an override, a
//! deterministic lexical default applies.

use datalog_ast::{FunctorOp, IntrinsicFunctor, NodeId, NumericConstant, NumericType, Symbol};
use std::collections::HashMap;

/// Shape of one ADT branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdtBranch {
    /// Position of the branch within its type's declaration.
    pub ordinal: usize,
    pub arity: usize,
    /// True when every branch of the owning type is argument-free, in
    /// which case values are encoded as plain ordinals.
    pub enum_like: bool,
}

/// ADT branch table, keyed by branch name.
///
/// Branch names are globally unique in the source language, so a flat
/// table suffices.
#[derive(Debug, Default)]
pub struct TypeEnvironment {
    branches: HashMap<Symbol, AdtBranch>,
}

impl TypeEnvironment {
    pub fn new() -> Self {
        TypeEnvironment::default()
    }

    /// Declare an ADT by its branches, in declaration order.
    pub fn declare_adt(&mut self, branches: &[(&str, usize)]) {
        let enum_like = branches.iter().all(|(_, arity)| *arity == 0);
        for (ordinal, (name, arity)) in branches.iter().enumerate() {
            self.branches.insert(
                Symbol::new((*name).to_string()),
                AdtBranch {
                    ordinal,
                    arity: *arity,
                    enum_like,
                },
            );
        }
    }

    pub fn branch(&self, name: Symbol) -> Option<&AdtBranch> {
        self.branches.get(&name)
    }
}

/// Finalised types for polymorphic AST nodes.
#[derive(Debug, Default)]
pub struct PolymorphicObjects {
    constant_types: HashMap<NodeId, NumericType>,
    functor_ops: HashMap<NodeId, FunctorOp>,
}

impl PolymorphicObjects {
    pub fn new() -> Self {
        PolymorphicObjects::default()
    }

    /// Pin the type of one numeric constant node.
    pub fn set_constant_type(&mut self, id: NodeId, ty: NumericType) {
        self.constant_types.insert(id, ty);
    }

    /// Pin the overload of one functor node.
    pub fn set_functor_op(&mut self, id: NodeId, op: FunctorOp) {
        self.functor_ops.insert(id, op);
    }

    /// Resolved type of a numeric constant. Falls back to the lexical
    /// form: a decimal point or exponent means float, everything else
    /// (including `0x`/`0b` literals) is signed.
    pub fn constant_type(&self, constant: &NumericConstant) -> NumericType {
        if let Some(ty) = self.constant_types.get(&constant.id) {
            return *ty;
        }
        let text = constant.text.as_str();
        if text.starts_with("0x") || text.starts_with("0b") {
            NumericType::Signed
        } else if text.contains('.') || text.contains(['e', 'E']) {
            NumericType::Float
        } else {
            NumericType::Signed
        }
    }

    /// Resolved overload of a functor application; the written operator
    /// when no override was recorded.
    pub fn functor_op(&self, functor: &IntrinsicFunctor) -> FunctorOp {
        self.functor_ops
            .get(&functor.id)
            .copied()
            .unwrap_or(functor.op)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lexical_constant_defaults() {
        let poly = PolymorphicObjects::new();
        assert_eq!(
            poly.constant_type(&NumericConstant::new("42")),
            NumericType::Signed
        );
        assert_eq!(
            poly.constant_type(&NumericConstant::new("4.2")),
            NumericType::Float
        );
        assert_eq!(
            poly.constant_type(&NumericConstant::new("1e6")),
            NumericType::Float
        );
        assert_eq!(
            poly.constant_type(&NumericConstant::new("0xff")),
            NumericType::Signed
        );
    }

    #[test]
    fn test_override_wins_over_lexical_form() {
        let mut poly = PolymorphicObjects::new();
        let mut constant = NumericConstant::new("42");
        constant.id = NodeId(7);
        poly.set_constant_type(NodeId(7), NumericType::Unsigned);

        assert_eq!(poly.constant_type(&constant), NumericType::Unsigned);
    }

    #[test]
    fn test_enum_adt_detection() {
        let mut env = TypeEnvironment::new();
        env.declare_adt(&[("Red", 0), ("Green", 0), ("Blue", 0)]);
        env.declare_adt(&[("Leaf", 1), ("Node", 2)]);

        let green = env.branch(Symbol::new("Green".to_string())).unwrap();
        assert!(green.enum_like);
        assert_eq!(green.ordinal, 1);

        let node = env.branch(Symbol::new("Node".to_string())).unwrap();
        assert!(!node.enum_like);
        assert_eq!(node.ordinal, 1);
        assert_eq!(node.arity, 2);
    }
}
