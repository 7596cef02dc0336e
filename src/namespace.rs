//! Import-alias resolution: which name does a file use for the target library?

use std::collections::HashMap;

use tracing::{debug, warn};
use tree_sitter::Tree;

use crate::catalog::Rule;
use crate::error::PatternCompileError;
use crate::grammar::{Library, PatternCompiler};
use crate::query;

/// Placeholder a match expression uses for the rule's namespace.
pub const PLACEHOLDER: &str = "{{namespace}}";

/// Canonical namespace name -> the alias a file binds it to.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NamespaceAliasMap {
    aliases: HashMap<String, String>,
}

impl NamespaceAliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a binding. Later imports of the same namespace win.
    pub fn insert(&mut self, canonical: impl Into<String>, alias: impl Into<String>) {
        self.aliases.insert(canonical.into(), alias.into());
    }

    pub fn get(&self, canonical: &str) -> Option<&str> {
        self.aliases.get(canonical).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.aliases.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aliases.is_empty()
    }

    /// The name the file uses for `namespace`: its alias, else the literal
    /// namespace.
    pub fn resolve<'a>(&'a self, namespace: &'a str) -> &'a str {
        self.get(namespace).unwrap_or(namespace)
    }
}

/// Build the alias map for one parsed file.
///
/// A query the grammar rejects yields an empty map; patterns then fall back to
/// the literal namespace.
pub fn resolve_aliases(
    compiler: &dyn PatternCompiler,
    library: &Library,
    tree: &Tree,
    source: &[u8],
) -> NamespaceAliasMap {
    let language = compiler.ts_language();
    let query_src = compiler.namespace_import_query(library);
    let hits = match query::run(&language, &query_src, tree, source) {
        Ok(hits) => hits,
        Err(e) => {
            warn!(language = %compiler.language(), "namespace query rejected: {e}");
            return NamespaceAliasMap::new();
        }
    };

    let mut map = NamespaceAliasMap::new();
    for binding in hits.iter().filter_map(|h| compiler.extract_alias(h, library)) {
        debug!(canonical = %binding.canonical, alias = %binding.alias, "namespace alias");
        map.insert(binding.canonical, binding.alias);
    }
    map
}

/// Replace the namespace placeholder in `expr` for `rule`.
pub fn substitute(
    expr: &str,
    rule: &Rule,
    aliases: &NamespaceAliasMap,
) -> Result<String, PatternCompileError> {
    let out = match rule.namespace.as_deref() {
        Some(ns) => expr.replace(PLACEHOLDER, aliases.resolve(ns)),
        None => expr.to_string(),
    };
    if out.contains(PLACEHOLDER) {
        return Err(PatternCompileError::UnresolvedNamespace {
            rule: rule.identifier.clone(),
            expr: expr.to_string(),
        });
    }
    Ok(out)
}
