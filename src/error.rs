use std::path::PathBuf;

use thiserror::Error;

/// Fatal configuration problems, raised before any file is processed.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("version `{0}` is not a valid version")]
    InvalidVersion(String),

    #[error("unknown language `{0}` (expected one of: python, go, javascript, java, dotnet)")]
    UnknownLanguage(String),

    #[error("language `{0}` has no structural grammar; use the regex parser")]
    NoGrammar(String),

    #[error("failed to read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {origin}: {source}")]
    Catalog {
        origin: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("no built-in catalog for `{0}`; pass one with --catalog")]
    NoCatalog(String),

    #[error("duplicate rule identifier `{0}` in catalog")]
    DuplicateRule(String),

    #[error("failed to load tree-sitter grammar: {0}")]
    Grammar(String),
}

/// A single pattern of a rule could not be turned into an executable query.
///
/// These never abort a run: the offending pattern is skipped and the error is
/// reported alongside the file's diagnostics.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum PatternCompileError {
    #[error("rule `{rule}`: invalid regular expression `{expr}`: {reason}")]
    InvalidRegex {
        rule: String,
        expr: String,
        reason: String,
    },

    #[error("rule `{rule}`: `{kind}` takes {expected} expression(s), got {got}")]
    Arity {
        rule: String,
        kind: &'static str,
        expected: String,
        got: usize,
    },

    #[error("rule `{rule}`: pattern `{expr}` contains `{{{{namespace}}}}` but the rule declares no namespace")]
    UnresolvedNamespace { rule: String, expr: String },

    #[error("rule `{rule}`: query rejected by the grammar: {reason}")]
    Query { rule: String, reason: String },

    #[error("rule `{rule}`: pattern has `ts_pattern` but no `ts_type`")]
    MissingKind { rule: String },
}

impl PatternCompileError {
    /// Attach the owning rule identifier to an error built without one.
    pub fn for_rule(self, rule_id: &str) -> Self {
        let rule = rule_id.to_string();
        match self {
            Self::InvalidRegex { expr, reason, .. } => Self::InvalidRegex { rule, expr, reason },
            Self::Arity {
                kind, expected, got, ..
            } => Self::Arity {
                rule,
                kind,
                expected,
                got,
            },
            Self::UnresolvedNamespace { expr, .. } => Self::UnresolvedNamespace { rule, expr },
            Self::Query { reason, .. } => Self::Query { rule, reason },
            Self::MissingKind { .. } => Self::MissingKind { rule },
        }
    }
}

#[derive(Debug, Error)]
#[error("failed to read {path}: {source}")]
pub struct SourceReadError {
    pub path: PathBuf,
    #[source]
    pub source: std::io::Error,
}
