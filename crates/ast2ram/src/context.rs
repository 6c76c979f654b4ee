//! Translator context and configuration
//!
//! All analyses flow through one immutable context object passed to
//! every lowering call; nothing reads process-wide state. The symbol
//! table travels alongside the context rather than inside it because it
//! is the one collaborator that mutates (internally) during lowering.

use datalog_analysis::{
    AuxiliaryArity, FunctorAnalysis, IoDirectives, PolymorphicObjects, RelationDetailCache,
    RelationSchedule, SccGraph, SipsStrategy, TypeEnvironment,
};
use datalog_ast::Atom;

/// Configuration surface honored by the translator.
#[derive(Debug, Clone, Copy, Default)]
pub struct TranslatorConfig {
    /// Emit `LogRelationTimer`/`LogSize` wrappers and `@frequency-atom`
    /// scan annotations.
    pub profile: bool,
    /// SIPS strategy used by the literal reordering pass.
    pub sips: SipsStrategy,
}

impl TranslatorConfig {
    pub fn profiled() -> Self {
        TranslatorConfig {
            profile: true,
            ..TranslatorConfig::default()
        }
    }
}

/// Read-only analyses consumed during translation.
pub struct TranslatorContext<'a> {
    pub type_env: &'a TypeEnvironment,
    pub functors: &'a FunctorAnalysis,
    pub poly: &'a PolymorphicObjects,
    pub aux_arity: &'a AuxiliaryArity,
    pub relation_details: &'a RelationDetailCache<'a>,
    pub scc_graph: &'a SccGraph,
    pub schedule: &'a RelationSchedule,
    pub io: &'a IoDirectives,
    pub config: &'a TranslatorConfig,
}

impl<'a> TranslatorContext<'a> {
    /// Auxiliary columns of the relation an atom refers to; these are
    /// excluded from matching when the atom is negated.
    pub fn evaluation_arity(&self, atom: &Atom) -> usize {
        self.aux_arity.arity_of(atom.name)
    }

    pub fn profiling(&self) -> bool {
        self.config.profile
    }
}
