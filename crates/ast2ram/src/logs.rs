//! Profiling log-message strings
//!
//! The profiler downstream parses these messages, so their shape is
//! part of the output contract: a `@`-prefixed kind tag followed by
//! `;`-separated fields. All producers live here.

use datalog_ast::SrcLocation;

pub fn t_nonrecursive_rule(relation: &str, loc: &SrcLocation, clause_text: &str) -> String {
    format!("@t-nonrecursive-rule;{};{};{};", relation, loc, stringify(clause_text))
}

pub fn t_nonrecursive_relation(relation: &str) -> String {
    format!("@t-nonrecursive-relation;{};", relation)
}

pub fn n_nonrecursive_relation(relation: &str) -> String {
    format!("@n-nonrecursive-relation;{};", relation)
}

pub fn t_recursive_rule(
    relation: &str,
    version: usize,
    loc: &SrcLocation,
    clause_text: &str,
) -> String {
    format!(
        "@t-recursive-rule;{};{};{};{};",
        relation,
        version,
        loc,
        stringify(clause_text)
    )
}

/// Flatten a clause rendering into a single log field.
pub fn stringify(text: &str) -> String {
    text.replace('\n', " ").replace(';', ",")
}
