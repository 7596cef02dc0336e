//! Per-grammar pattern compilers.
//!
//! Every grammar turns the same abstract operations into tree-sitter query
//! source. The shape differences between grammars (what a call, an attribute
//! access or an import looks like) stay inside each grammar module.

pub mod go;
pub mod javascript;
pub mod python;

use std::fmt;
use std::str::FromStr;

use crate::catalog::OperationKind;
use crate::error::{ConfigError, PatternCompileError};
use crate::query::QueryHit;

/// Reserved prefix that turns a match expression into a negative condition.
pub const NEGATION_PREFIX: &str = "?!";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Language {
    Python,
    Go,
    JavaScript,
    Java,
    DotNet,
}

impl Language {
    pub const ALL: [Language; 5] = [
        Language::Python,
        Language::Go,
        Language::JavaScript,
        Language::Java,
        Language::DotNet,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Language::Python => "python",
            Language::Go => "go",
            Language::JavaScript => "javascript",
            Language::Java => "java",
            Language::DotNet => "dotnet",
        }
    }

    /// The structural compiler for this language. Java and .NET sources are
    /// only scanned with the regex fallback.
    pub fn compiler(&self) -> Option<&'static dyn PatternCompiler> {
        match self {
            Language::Python => Some(&python::PythonCompiler),
            Language::Go => Some(&go::GoCompiler),
            Language::JavaScript => Some(&javascript::JavaScriptCompiler),
            Language::Java | Language::DotNet => None,
        }
    }

    pub fn extensions(&self) -> &'static [&'static str] {
        match self {
            Language::Python => &["py"],
            Language::Go => &["go"],
            Language::JavaScript => &["js", "mjs", "cjs", "jsx"],
            Language::Java => &["java"],
            Language::DotNet => &["cs", "vb", "fs"],
        }
    }

    /// How the driver is imported in this language.
    pub fn default_library(&self) -> Library {
        match self {
            Language::JavaScript => Library::new(r"\bneo4j-driver\b", "neo4j"),
            _ => Library::new(r"\bneo4j\b", "neo4j"),
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Language {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "python" | "py" => Ok(Language::Python),
            "go" | "golang" => Ok(Language::Go),
            "javascript" | "js" => Ok(Language::JavaScript),
            "java" => Ok(Language::Java),
            "dotnet" | ".net" | "csharp" => Ok(Language::DotNet),
            _ => Err(ConfigError::UnknownLanguage(s.to_string())),
        }
    }
}

/// The target library as seen from import statements.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Library {
    /// Plain regex matched against the imported module/path.
    pub import_regex: String,
    /// Canonical namespace the catalog's `namespace` tags refer to.
    pub namespace: String,
}

impl Library {
    pub fn new(import_regex: &str, namespace: &str) -> Self {
        Self {
            import_regex: import_regex.to_string(),
            namespace: namespace.to_string(),
        }
    }
}

/// A file's binding of the target library: `canonical` is the package name
/// the catalog uses, `alias` the name the code actually uses.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportBinding {
    pub canonical: String,
    pub alias: String,
}

/// Query source plus the capture names that carry findings, in expression
/// order. Other captures in the query only constrain the match.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompiledQuery {
    pub source: String,
    pub captures: Vec<String>,
}

impl CompiledQuery {
    fn new(source: String, captures: &[&str]) -> Self {
        Self {
            source,
            captures: captures.iter().map(|c| c.to_string()).collect(),
        }
    }
}

/// One grammar's implementation of every operation kind.
///
/// Each method returns a query with exactly one reported capture per match
/// expression, so a compound pattern yields fixed-size capture groups whose
/// last member is the most specific node.
pub trait PatternCompiler: Send + Sync {
    fn language(&self) -> Language;

    fn ts_language(&self) -> tree_sitter::Language;

    fn function_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError>;

    fn method_call(&self, name: &str) -> Result<CompiledQuery, PatternCompileError>;

    fn property_access(&self, name: &str) -> Result<CompiledQuery, PatternCompileError>;

    /// All conditions apply to the same type node.
    fn type_reference(&self, conditions: &[&str]) -> Result<CompiledQuery, PatternCompileError>;

    fn import(&self, name: &str) -> Result<CompiledQuery, PatternCompileError>;

    fn import_from_module(&self, module: &str) -> Result<CompiledQuery, PatternCompileError>;

    fn import_from_name(&self, module: &str, name: &str)
    -> Result<CompiledQuery, PatternCompileError>;

    fn function_call_with_argument(
        &self,
        function: &str,
        argument: &str,
    ) -> Result<CompiledQuery, PatternCompileError>;

    fn method_call_with_keyword_argument(
        &self,
        method: &str,
        keyword: &str,
    ) -> Result<CompiledQuery, PatternCompileError>;

    fn function_call_with_keyword_argument(
        &self,
        function: &str,
        keyword: &str,
    ) -> Result<CompiledQuery, PatternCompileError>;

    fn method_call_with_keyword_argument_value(
        &self,
        method: &str,
        keyword: &str,
        value: &str,
    ) -> Result<CompiledQuery, PatternCompileError>;

    fn function_call_with_keyword_argument_value(
        &self,
        function: &str,
        keyword: &str,
        value: &str,
    ) -> Result<CompiledQuery, PatternCompileError>;

    /// Query finding the file's import of the target library.
    fn namespace_import_query(&self, library: &Library) -> String;

    /// Typed binding from one match of [`PatternCompiler::namespace_import_query`].
    fn extract_alias(&self, hit: &QueryHit, library: &Library) -> Option<ImportBinding>;
}

/// Compile one pattern's expressions for `kind`.
pub fn compile(
    compiler: &dyn PatternCompiler,
    kind: OperationKind,
    exprs: &[&str],
) -> Result<CompiledQuery, PatternCompileError> {
    if !kind.arity().accepts(exprs.len()) {
        return Err(PatternCompileError::Arity {
            rule: String::new(),
            kind: kind.tag(),
            expected: kind.arity().to_string(),
            got: exprs.len(),
        });
    }
    match kind {
        OperationKind::FunctionCall => compiler.function_call(exprs[0]),
        OperationKind::MethodCall => compiler.method_call(exprs[0]),
        OperationKind::PropertyAccess => compiler.property_access(exprs[0]),
        OperationKind::TypeReference => compiler.type_reference(exprs),
        OperationKind::Import => compiler.import(exprs[0]),
        OperationKind::ImportFromModule => compiler.import_from_module(exprs[0]),
        OperationKind::ImportFromName => compiler.import_from_name(exprs[0], exprs[1]),
        OperationKind::FunctionCallWithArgument => {
            compiler.function_call_with_argument(exprs[0], exprs[1])
        }
        OperationKind::MethodCallWithKeywordArgument => {
            compiler.method_call_with_keyword_argument(exprs[0], exprs[1])
        }
        OperationKind::FunctionCallWithKeywordArgument => {
            compiler.function_call_with_keyword_argument(exprs[0], exprs[1])
        }
        OperationKind::MethodCallWithKeywordArgumentValue => {
            compiler.method_call_with_keyword_argument_value(exprs[0], exprs[1], exprs[2])
        }
        OperationKind::FunctionCallWithKeywordArgumentValue => {
            compiler.function_call_with_keyword_argument_value(exprs[0], exprs[1], exprs[2])
        }
    }
}

/// Build the predicate constraining `capture` by `expr`.
///
/// `expr` is in query-literal form (backslashes escaped once more than the
/// regex needs). It is validated as the regex the engine will actually see.
pub fn match_condition(capture: &str, expr: &str) -> Result<String, PatternCompileError> {
    let (predicate, literal) = match expr.strip_prefix(NEGATION_PREFIX) {
        Some(rest) => ("not-match?", rest),
        None => ("match?", expr),
    };
    let regex = unescape_literal(literal);
    if let Err(e) = regex::Regex::new(&regex) {
        return Err(PatternCompileError::InvalidRegex {
            rule: String::new(),
            expr: expr.to_string(),
            reason: e.to_string(),
        });
    }
    Ok(format!("(#{predicate} @{capture} \"{literal}\")"))
}

/// Conditions for several expressions that all constrain one node; capture
/// `i` is named `{base}_{i}`.
pub fn stacked_conditions(
    base: &str,
    exprs: &[&str],
) -> Result<(String, String, Vec<String>), PatternCompileError> {
    let names: Vec<String> = (0..exprs.len()).map(|i| format!("{base}_{i}")).collect();
    let captures = names
        .iter()
        .map(|n| format!("@{n}"))
        .collect::<Vec<_>>()
        .join(" ");
    let conditions = names
        .iter()
        .zip(exprs)
        .map(|(n, e)| match_condition(n, e))
        .collect::<Result<Vec<_>, _>>()?
        .join("\n  ");
    Ok((captures, conditions, names))
}

/// Escape a plain string for use inside a query string literal.
pub fn escape_literal(plain: &str) -> String {
    plain.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Decode a query string literal the way tree-sitter does: `\n`, `\r`, `\t`
/// and `\0` are control characters, any other escaped character stands for
/// itself.
pub fn unescape_literal(literal: &str) -> String {
    let mut out = String::with_capacity(literal.len());
    let mut chars = literal.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('r') => out.push('\r'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn positive_condition() {
        assert_eq!(
            match_condition("name", "\\\\bConfig\\\\b").unwrap(),
            "(#match? @name \"\\\\bConfig\\\\b\")"
        );
    }

    #[test]
    fn negative_condition_strips_prefix() {
        assert_eq!(
            match_condition("type", "?!config\\\\.Config").unwrap(),
            "(#not-match? @type \"config\\\\.Config\")"
        );
    }

    #[test]
    fn invalid_regex_rejected() {
        let err = match_condition("name", "(unclosed").unwrap_err();
        assert!(matches!(err, PatternCompileError::InvalidRegex { .. }));
        let err = match_condition("name", "?![").unwrap_err();
        assert!(matches!(err, PatternCompileError::InvalidRegex { .. }));
    }

    #[test]
    fn unescape_mirrors_query_literals() {
        assert_eq!(unescape_literal("\\\\bneo4j\\\\b"), "\\bneo4j\\b");
        assert_eq!(unescape_literal("a\\.b"), "a.b");
        assert_eq!(unescape_literal("\\\"x\\\""), "\"x\"");
        assert_eq!(unescape_literal("tab\\t"), "tab\t");
    }

    #[test]
    fn escape_then_unescape_is_identity() {
        for s in [r"\bneo4j\b", r#"say "hi""#, r"a\\b", "plain"] {
            assert_eq!(unescape_literal(&escape_literal(s)), s);
        }
    }

    #[test]
    fn stacked_conditions_name_each_capture() {
        let (caps, conds, names) =
            stacked_conditions("type", &["Config", "?!config\\\\.Config"]).unwrap();
        assert_eq!(caps, "@type_0 @type_1");
        assert_eq!(names, vec!["type_0", "type_1"]);
        assert!(conds.contains("(#match? @type_0 \"Config\")"));
        assert!(conds.contains("(#not-match? @type_1 \"config\\\\.Config\")"));
    }

    #[test]
    fn language_from_str() {
        assert_eq!("python".parse::<Language>().unwrap(), Language::Python);
        assert_eq!("Go".parse::<Language>().unwrap(), Language::Go);
        assert_eq!("js".parse::<Language>().unwrap(), Language::JavaScript);
        assert_eq!("dotnet".parse::<Language>().unwrap(), Language::DotNet);
        assert!("cobol".parse::<Language>().is_err());
    }

    #[test]
    fn only_three_languages_have_grammars() {
        let with_grammar: Vec<Language> = Language::ALL
            .into_iter()
            .filter(|l| l.compiler().is_some())
            .collect();
        assert_eq!(
            with_grammar,
            vec![Language::Python, Language::Go, Language::JavaScript]
        );
        for lang in with_grammar {
            assert_eq!(lang.compiler().unwrap().language(), lang);
        }
    }

    #[test]
    fn arity_mismatch_is_compile_error() {
        let compiler = Language::Python.compiler().unwrap();
        let err = compile(compiler, OperationKind::MethodCallWithKeywordArgument, &["run"])
            .unwrap_err();
        assert!(matches!(err, PatternCompileError::Arity { got: 1, .. }));
    }
}
