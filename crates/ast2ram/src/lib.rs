//! AST to RAM translation
//!
//! Turns a declarative Datalog program into a procedural RAM program:
//! the preprocessor normalises the AST (ADT lowering, type
//! finalisation, literal reordering), the clause translator lowers each
//! clause into a nested operation tree, and the unit driver schedules
//! strata and emits the semi-naïve fixpoint loops for recursive SCCs.
//!
//! Translation is deterministic and synchronous. Structural invariant
//! violations are programmer errors and panic; by the time a program
//! reaches this crate it has passed upstream semantic analysis.
//!
//! ```ignore
//! let symbols = SymbolTable::new();
//! let unit = translate_unit(&mut program, &symbols, &TranslatorConfig::default());
//! println!("{}", unit);
//! ```

mod clause;
mod constraint;
mod context;
mod location;
mod logs;
mod names;
mod preprocess;
mod translator;
mod value;
mod value_index;

pub use clause::ClauseTranslator;
pub use constraint::translate_constraint;
pub use context::{TranslatorConfig, TranslatorContext};
pub use location::Location;
pub use names::{concrete_name, delta_name, new_name};
pub use preprocess::{
    finalise_types, lower_adt_terms, number_nodes, preprocess, reorder_literals,
};
pub use translator::{translate_unit, translate_unit_with, DebugReportHook, UnitTranslator};
pub use value::{translate_constant, translate_value};
pub use value_index::ValueIndex;
