//! The value translator
//!
//! Pure recursive lowering of AST argument expressions into RAM
//! expressions. Variables resolve to their defining location in the
//! clause's value index; generators resolve to the level the clause
//! translator installed for them; constants lower per their finalised
//! type.

use crate::context::TranslatorContext;
use crate::value_index::ValueIndex;
use datalog_analysis::SymbolTable;
use datalog_ast::{Argument, Constant, NumericConstant, NumericType};
use ram::Expression;

/// Lower an argument to a RAM expression.
///
/// # Panics
/// On structural violations: an unindexed variable, an unfinalised
/// constant or functor, or an ADT branch that survived preprocessing.
pub fn translate_value(
    context: &TranslatorContext<'_>,
    symbols: &SymbolTable,
    index: &ValueIndex,
    arg: &Argument,
) -> Expression {
    match arg {
        Argument::Variable(name) => index
            .defining_location(*name)
            .unwrap_or_else(|| panic!("variable {} should have been indexed", name))
            .tuple_element(),
        Argument::UnnamedVariable => Expression::Undef,
        Argument::Constant(constant) => translate_constant(symbols, constant),
        Argument::Record(rec) => Expression::PackRecord(
            rec.args
                .iter()
                .map(|child| translate_value(context, symbols, index, child))
                .collect(),
        ),
        Argument::Intrinsic(func) => {
            if context.functors.is_multi_result(func) {
                // installed as a generator level by the clause translator
                return index.generator_loc(func.id).tuple_element();
            }
            let op = func
                .final_op
                .expect("intrinsic functor should have a finalised operator");
            Expression::Intrinsic {
                op,
                args: func
                    .args
                    .iter()
                    .map(|child| translate_value(context, symbols, index, child))
                    .collect(),
            }
        }
        Argument::UserFunctor(func) => Expression::UserOperator {
            name: func.name.as_ref().clone(),
            args: func
                .args
                .iter()
                .map(|child| translate_value(context, symbols, index, child))
                .collect(),
        },
        Argument::Aggregator(agg) => index.generator_loc(agg.id).tuple_element(),
        Argument::Branch(branch) => {
            panic!("ADT branch {} should have been lowered before translation", branch.name)
        }
    }
}

/// Lower a constant per §constant-lowering: strings intern into the
/// symbol table, nil is signed zero, numerics parse under their
/// finalised type.
pub fn translate_constant(symbols: &SymbolTable, constant: &Constant) -> Expression {
    match constant {
        Constant::String(text) => Expression::SignedConstant(symbols.intern(text)),
        Constant::Nil => Expression::SignedConstant(0),
        Constant::Numeric(numeric) => translate_numeric_constant(numeric),
    }
}

fn translate_numeric_constant(constant: &NumericConstant) -> Expression {
    let ty = constant
        .numeric_type
        .expect("numeric constant should have a finalised type");
    let text = constant.text.as_str();
    match ty {
        NumericType::Signed => Expression::SignedConstant(parse_signed(text)),
        NumericType::Unsigned => Expression::UnsignedConstant(parse_unsigned(text)),
        NumericType::Float => Expression::FloatConstant(
            text.parse()
                .unwrap_or_else(|_| panic!("malformed float constant `{}`", text)),
        ),
    }
}

// Numeric literals support 0x/0b prefixes; malformed text is a
// programmer error since upstream validation accepted the literal.

fn parse_signed(text: &str) -> i64 {
    let result = if let Some(hex) = text.strip_prefix("0x") {
        i64::from_str_radix(hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b") {
        i64::from_str_radix(bin, 2)
    } else {
        text.parse()
    };
    result.unwrap_or_else(|_| panic!("malformed signed constant `{}`", text))
}

fn parse_unsigned(text: &str) -> u64 {
    let result = if let Some(hex) = text.strip_prefix("0x") {
        u64::from_str_radix(hex, 16)
    } else if let Some(bin) = text.strip_prefix("0b") {
        u64::from_str_radix(bin, 2)
    } else {
        text.parse()
    };
    result.unwrap_or_else(|_| panic!("malformed unsigned constant `{}`", text))
}
