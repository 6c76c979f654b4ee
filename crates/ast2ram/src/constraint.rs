//! The constraint translator
//!
//! Lowers body literals into RAM conditions. Only binary constraints
//! produce a condition here: positive atoms are structural (they become
//! scans), and negated atoms are realized by the clause translator's
//! negation machinery, which also knows about auxiliary columns and
//! delta variants.

use crate::context::TranslatorContext;
use crate::value::translate_value;
use crate::value_index::ValueIndex;
use datalog_analysis::SymbolTable;
use datalog_ast::Literal;
use ram::Condition;

/// The condition a body literal contributes, if any.
pub fn translate_constraint(
    context: &TranslatorContext<'_>,
    symbols: &SymbolTable,
    index: &ValueIndex,
    literal: &Literal,
) -> Option<Condition> {
    match literal {
        Literal::Constraint(constraint) => Some(Condition::Constraint {
            op: constraint.op,
            lhs: translate_value(context, symbols, index, &constraint.lhs),
            rhs: translate_value(context, symbols, index, &constraint.rhs),
        }),
        Literal::Atom(_) | Literal::Negation(_) => None,
    }
}
