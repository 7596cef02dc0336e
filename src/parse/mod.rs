pub mod source;

use tree_sitter::{Language, Parser, Tree};

use crate::error::ConfigError;

/// Parse source text with the given tree-sitter grammar.
///
/// Syntax errors do not fail the parse; tree-sitter produces a tree with
/// `ERROR` nodes and queries still match the well-formed parts.
pub fn parse_tree(language: &Language, text: &str) -> Result<Tree, ConfigError> {
    let mut parser = Parser::new();
    parser
        .set_language(language)
        .map_err(|e| ConfigError::Grammar(e.to_string()))?;
    parser
        .parse(text, None)
        .ok_or_else(|| ConfigError::Grammar("parser produced no tree".to_string()))
}
