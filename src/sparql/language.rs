//! Static SPARQL vocabulary: query-routing keywords, completion names and
//! per-keyword help text.

use indexmap::IndexMap;
use once_cell::sync::Lazy;

/// Leading keywords that classify a payload as a remote query, in the
/// order they are tested. First match wins.
pub const QUERY_STARTERS: &[&str] = &[
    "SELECT",
    "CONSTRUCT",
    "ASK",
    "DESCRIBE",
    "INSERT",
    "DELETE",
    "LOAD",
    "CLEAR",
    "DROP",
    "CREATE",
];

/// Keywords offered by tab completion, discovery order.
pub const SPARQL_KEYWORDS: &[&str] = &[
    "SELECT", "CONSTRUCT", "ASK", "DESCRIBE", "INSERT", "DELETE", "LOAD", "CLEAR", "DROP",
    "CREATE", "WHERE", "FROM", "NAMED", "PREFIX", "BASE", "OPTIONAL", "UNION", "MINUS", "GRAPH",
    "SERVICE", "FILTER", "BIND", "VALUES", "ORDER", "GROUP", "HAVING", "LIMIT", "OFFSET",
    "DISTINCT", "REDUCED",
];

/// Help text per query keyword, looked up by exact upper-case token.
pub static KEYWORD_HELP: Lazy<IndexMap<&'static str, &'static str>> = Lazy::new(|| {
    IndexMap::from([
        (
            "SELECT",
            "SELECT <vars> WHERE { <pattern> }\n\nReturns variable bindings matching the graph pattern.",
        ),
        (
            "CONSTRUCT",
            "CONSTRUCT { <template> } WHERE { <pattern> }\n\nReturns an RDF graph built from the template.",
        ),
        (
            "ASK",
            "ASK { <pattern> }\n\nReturns a boolean: does any solution match the pattern?",
        ),
        (
            "DESCRIBE",
            "DESCRIBE <resource>\n\nReturns an RDF description of the resource.",
        ),
        (
            "INSERT",
            "INSERT DATA { <triples> }\n\nAdds triples to the endpoint's store (SPARQL Update).",
        ),
        (
            "DELETE",
            "DELETE DATA { <triples> }\n\nRemoves triples from the endpoint's store (SPARQL Update).",
        ),
        (
            "LOAD",
            "LOAD <documentURI> [INTO GRAPH <uri>]\n\nReads RDF from a document into a graph.",
        ),
        (
            "CLEAR",
            "CLEAR GRAPH <uri>\n\nRemoves all triples from the given graph.",
        ),
        ("DROP", "DROP GRAPH <uri>\n\nRemoves the given graph entirely."),
        ("CREATE", "CREATE GRAPH <uri>\n\nCreates a new empty graph."),
        (
            "WHERE",
            "WHERE { <pattern> }\n\nIntroduces the graph pattern to match against.",
        ),
        (
            "FILTER",
            "FILTER ( <expression> )\n\nRestricts solutions to those where the expression is true.",
        ),
        (
            "OPTIONAL",
            "OPTIONAL { <pattern> }\n\nBinds extra variables when the pattern matches, without discarding solutions.",
        ),
        (
            "ORDER",
            "ORDER BY [ASC|DESC] ( <expression> )\n\nSorts the solution sequence.",
        ),
        ("LIMIT", "LIMIT <n>\n\nCaps the number of returned solutions."),
        ("OFFSET", "OFFSET <n>\n\nSkips the first n solutions."),
    ])
});

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn starters_are_a_subset_of_keywords() {
        for starter in QUERY_STARTERS {
            assert!(SPARQL_KEYWORDS.contains(starter), "{starter} missing");
        }
    }

    #[test]
    fn help_is_keyed_upper_case() {
        for key in KEYWORD_HELP.keys() {
            assert_eq!(*key, key.to_uppercase());
        }
    }
}
