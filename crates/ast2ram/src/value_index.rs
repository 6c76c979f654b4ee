//! The per-clause value index
//!
//! Built while a clause is indexed, consulted while its RAM tree is
//! assembled, and dropped with the clause translator. Maps every
//! variable to the ordered list of locations it appears at (the first
//! is the defining one), every record-init node to its definition
//! point, and every generator node to the level that binds its result.
//!
//! Variable iteration is ordered by name so emitted binding constraints
//! never depend on hashing.

use crate::location::Location;
use datalog_ast::{NodeId, Symbol};
use std::collections::{BTreeMap, HashMap, HashSet};

#[derive(Debug, Default)]
pub struct ValueIndex {
    var_references: BTreeMap<String, Vec<Location>>,
    record_definitions: HashMap<NodeId, Location>,
    generator_locs: HashMap<NodeId, Location>,
    generator_levels: HashSet<usize>,
}

impl ValueIndex {
    pub fn new() -> Self {
        ValueIndex::default()
    }

    /// Record an occurrence of a variable. The first recorded occurrence
    /// becomes the defining one.
    pub fn add_var_reference(&mut self, name: Symbol, level: usize, column: usize) {
        self.alias_var(name, Location::new(level, column));
    }

    /// Bind a variable to an existing location, e.g. the output of a
    /// generator it is equated with. Defining iff it is the variable's
    /// first reference.
    pub fn alias_var(&mut self, name: Symbol, loc: Location) {
        self.var_references
            .entry(name.as_ref().clone())
            .or_default()
            .push(loc);
    }

    /// The defining (first) location of a variable, if it was indexed.
    pub fn defining_location(&self, name: Symbol) -> Option<Location> {
        self.var_references
            .get(name.as_ref())
            .and_then(|refs| refs.first())
            .copied()
    }

    /// All locations a variable appears at, defining one first.
    pub fn references(&self, name: Symbol) -> &[Location] {
        self.var_references
            .get(name.as_ref())
            .map(|refs| refs.as_slice())
            .unwrap_or(&[])
    }

    /// Iterate `(variable, references)` pairs in name order.
    pub fn variable_references(&self) -> impl Iterator<Item = (&str, &[Location])> {
        self.var_references
            .iter()
            .map(|(name, refs)| (name.as_str(), refs.as_slice()))
    }

    /// Record the definition point of a record-init node. One-shot.
    ///
    /// # Panics
    /// If the node already has a definition point.
    pub fn set_record_definition(&mut self, node: NodeId, level: usize, column: usize) {
        let previous = self
            .record_definitions
            .insert(node, Location::new(level, column));
        assert!(
            previous.is_none(),
            "record node {:?} should have a unique definition point",
            node
        );
    }

    /// The definition point of a record-init node.
    ///
    /// # Panics
    /// If the node was never indexed.
    pub fn record_definition(&self, node: NodeId) -> Location {
        *self
            .record_definitions
            .get(&node)
            .unwrap_or_else(|| panic!("record node {:?} should have a definition point", node))
    }

    /// Iterate record definition points (unordered).
    pub fn record_definitions(&self) -> impl Iterator<Item = (NodeId, Location)> + '_ {
        self.record_definitions.iter().map(|(id, loc)| (*id, *loc))
    }

    /// Record the binding level of a generator node. One-shot.
    pub fn set_generator_loc(&mut self, node: NodeId, loc: Location) {
        let previous = self.generator_locs.insert(node, loc);
        assert!(
            previous.is_none(),
            "generator node {:?} should be indexed once",
            node
        );
        self.generator_levels.insert(loc.level);
    }

    /// The location holding a generator's result.
    ///
    /// # Panics
    /// If the node was never indexed.
    pub fn generator_loc(&self, node: NodeId) -> Location {
        *self
            .generator_locs
            .get(&node)
            .unwrap_or_else(|| panic!("generator node {:?} should have a location", node))
    }

    /// Whether a level binds a generator result rather than a scan or
    /// unpack tuple.
    pub fn is_generator(&self, level: usize) -> bool {
        self.generator_levels.contains(&level)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sym(s: &str) -> Symbol {
        Symbol::new(s.to_string())
    }

    #[test]
    fn test_first_reference_defines() {
        let mut index = ValueIndex::new();
        index.add_var_reference(sym("X"), 0, 1);
        index.add_var_reference(sym("X"), 1, 0);

        assert_eq!(index.defining_location(sym("X")), Some(Location::new(0, 1)));
        assert_eq!(
            index.references(sym("X")),
            &[Location::new(0, 1), Location::new(1, 0)]
        );
        assert_eq!(index.defining_location(sym("Y")), None);
    }

    #[test]
    fn test_alias_establishes_definition() {
        let mut index = ValueIndex::new();
        index.set_generator_loc(NodeId(3), Location::new(2, 0));
        index.alias_var(sym("N"), index.generator_loc(NodeId(3)));

        assert_eq!(index.defining_location(sym("N")), Some(Location::new(2, 0)));
        assert!(index.is_generator(2));
        assert!(!index.is_generator(0));
    }

    #[test]
    fn test_variables_iterate_in_name_order() {
        let mut index = ValueIndex::new();
        index.add_var_reference(sym("Z"), 0, 0);
        index.add_var_reference(sym("A"), 0, 1);
        index.add_var_reference(sym("M"), 0, 2);

        let names: Vec<&str> = index.variable_references().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["A", "M", "Z"]);
    }

    #[test]
    #[should_panic(expected = "unique definition point")]
    fn test_duplicate_record_definition_panics() {
        let mut index = ValueIndex::new();
        index.set_record_definition(NodeId(1), 0, 0);
        index.set_record_definition(NodeId(1), 1, 0);
    }
}
