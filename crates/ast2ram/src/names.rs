//! Relation name variants
//!
//! Every relation has up to three RAM-level tables: the concrete table,
//! the delta table (tuples added in the previous fixpoint iteration) and
//! the new table (tuples added in the current iteration). These
//! functions are the only place the variant strings are built; user
//! relation names never start with `@`, so the scheme is injective.

use datalog_ast::Symbol;

/// The concrete (accumulated) table of a relation.
pub fn concrete_name(name: Symbol) -> String {
    name.as_ref().clone()
}

/// The delta table: last-iteration additions.
pub fn delta_name(name: Symbol) -> String {
    format!("@delta_{}", name)
}

/// The new table: this-iteration additions.
pub fn new_name(name: Symbol) -> String {
    format!("@new_{}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variants_are_distinct_and_stable() {
        let name = Symbol::new("reach".to_string());
        assert_eq!(concrete_name(name), "reach");
        assert_eq!(delta_name(name), "@delta_reach");
        assert_eq!(new_name(name), "@new_reach");
        assert_eq!(delta_name(name), delta_name(name));
    }
}
