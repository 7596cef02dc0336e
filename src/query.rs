//! Glue over tree-sitter's query engine: compile a query for a grammar, run
//! it over a parsed tree, and hand back plain capture records.

use streaming_iterator::StreamingIterator;
use tracing::debug;
use tree_sitter::{Language, Query, QueryCursor, QueryErrorKind, Tree};

use crate::capture::Position;

/// One captured node of a match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedNode {
    pub name: String,
    pub text: String,
    pub start: Position,
    pub end: Position,
}

/// All captures of one query match, in the engine's order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryHit {
    pub captures: Vec<CapturedNode>,
}

impl QueryHit {
    pub fn get(&self, name: &str) -> Option<&CapturedNode> {
        self.captures.iter().find(|c| c.name == name)
    }
}

/// Compile `source` for `language`. The error string names the failing
/// offset and the kind of problem.
pub fn compile_query(language: &Language, source: &str) -> Result<Query, String> {
    Query::new(language, source).map_err(|e| {
        let kind = match e.kind {
            QueryErrorKind::Syntax => "syntax error",
            QueryErrorKind::NodeType => "unknown node type",
            QueryErrorKind::Field => "unknown field name",
            QueryErrorKind::Capture => "unknown capture name",
            QueryErrorKind::Structure => "invalid query structure",
            QueryErrorKind::Predicate => "invalid predicate",
            QueryErrorKind::Language => "language error",
        };
        format!("{kind} at row {} column {}: {}", e.row, e.column, e.message)
    })
}

/// Run a compiled query over the whole tree. Text predicates (`#match?`,
/// `#not-match?`, `#eq?`) are applied by the engine.
pub fn execute(query: &Query, tree: &Tree, source: &[u8]) -> Vec<QueryHit> {
    let names = query.capture_names();
    let mut cursor = QueryCursor::new();
    let mut matches = cursor.matches(query, tree.root_node(), source);

    let mut hits = Vec::new();
    while let Some(m) = matches.next() {
        let captures = m
            .captures
            .iter()
            .map(|c| CapturedNode {
                name: names[c.index as usize].to_string(),
                text: c.node.utf8_text(source).unwrap_or_default().to_string(),
                start: c.node.start_position().into(),
                end: c.node.end_position().into(),
            })
            .collect();
        hits.push(QueryHit { captures });
    }
    debug!(hits = hits.len(), "query executed");
    hits
}

/// Compile and run in one step.
pub fn run(
    language: &Language,
    source_query: &str,
    tree: &Tree,
    text: &[u8],
) -> Result<Vec<QueryHit>, String> {
    let query = compile_query(language, source_query)?;
    Ok(execute(&query, tree, text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parse::parse_tree;

    fn python() -> Language {
        tree_sitter_python::LANGUAGE.into()
    }

    #[test]
    fn captures_carry_text_and_positions() {
        let src = "import os\nimport neo4j.Bookmark\n";
        let tree = parse_tree(&python(), src).unwrap();
        let hits = run(
            &python(),
            r#"(import_statement name: (dotted_name) @name (#match? @name "neo4j"))"#,
            &tree,
            src.as_bytes(),
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
        let node = hits[0].get("name").unwrap();
        assert_eq!(node.text, "neo4j.Bookmark");
        assert_eq!(node.start, Position::new(1, 7));
        assert_eq!(node.end, Position::new(1, 21));
    }

    #[test]
    fn not_match_predicate_filters() {
        let src = "a.close()\nb.open()\n";
        let tree = parse_tree(&python(), src).unwrap();
        let hits = run(
            &python(),
            r#"(call function: (attribute attribute: (identifier) @m) (#not-match? @m "^close$"))"#,
            &tree,
            src.as_bytes(),
        )
        .unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].get("m").unwrap().text, "open");
    }

    #[test]
    fn bad_node_type_is_reported() {
        let err = compile_query(&python(), "(no_such_node) @x").unwrap_err();
        assert!(err.contains("unknown node type"), "{err}");
    }

    #[test]
    fn syntax_error_is_reported() {
        let err = compile_query(&python(), "(call").unwrap_err();
        assert!(err.contains("syntax error"), "{err}");
    }
}
