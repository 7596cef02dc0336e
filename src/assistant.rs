//! The orchestrator: runs every catalog rule over a file and collects the
//! findings that matter at the target version.

use std::io;
use std::ops::AddAssign;
use std::path::{Path, PathBuf};

use rayon::prelude::*;
use tracing::{debug, warn};
use tree_sitter::Tree;

use crate::capture::{Capture, extract_captures};
use crate::catalog::{Catalog, Pattern, Rule};
use crate::diagnostic::{Diagnostic, render};
use crate::error::{ConfigError, PatternCompileError, SourceReadError};
use crate::fallback::FallbackMatcher;
use crate::grammar::{self, CompiledQuery, Language, Library, PatternCompiler};
use crate::namespace::{NamespaceAliasMap, resolve_aliases, substitute};
use crate::parse::parse_tree;
use crate::parse::source::SourceFile;
use crate::query;
use crate::suppression::{SuppressionStore, compute_key};
use crate::version::VersionGate;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MatcherMode {
    /// Syntax-tree queries.
    #[default]
    Structural,
    /// Line-by-line `re_pattern` scan.
    Fallback,
}

pub struct AssistantOptions {
    pub language: Language,
    pub version: String,
    pub context_lines: usize,
    pub mode: MatcherMode,
    /// `None` uses the built-in catalog of `language`.
    pub catalog: Option<Catalog>,
    pub store_path: PathBuf,
    /// `None` uses the language's default library.
    pub library: Option<Library>,
}

/// Deprecation/removal counters. Suppressed findings are not counted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Counts {
    pub deprecated: usize,
    pub removed: usize,
}

impl Counts {
    fn add(&mut self, d: &Diagnostic) {
        self.deprecated += usize::from(d.deprecated);
        self.removed += usize::from(d.removed);
    }

    fn subtract(&mut self, d: &Diagnostic) {
        self.deprecated -= usize::from(d.deprecated);
        self.removed -= usize::from(d.removed);
    }

    pub fn is_zero(&self) -> bool {
        self.deprecated == 0 && self.removed == 0
    }
}

impl AddAssign for Counts {
    fn add_assign(&mut self, other: Counts) {
        self.deprecated += other.deprecated;
        self.removed += other.removed;
    }
}

#[derive(Debug)]
pub struct FileReport {
    pub path: PathBuf,
    /// Sorted by `(line, col_start)`.
    pub diagnostics: Vec<Diagnostic>,
    pub counts: Counts,
    /// Patterns skipped for this file.
    pub errors: Vec<PatternCompileError>,
}

#[derive(Debug, Default)]
pub struct RunSummary {
    /// In input order.
    pub reports: Vec<FileReport>,
    pub read_errors: Vec<SourceReadError>,
    pub totals: Counts,
}

impl RunSummary {
    pub fn diagnostic_count(&self) -> usize {
        self.reports.iter().map(|r| r.diagnostics.len()).sum()
    }

    pub fn unsuppressed_count(&self) -> usize {
        self.reports
            .iter()
            .flat_map(|r| &r.diagnostics)
            .filter(|d| !d.suppressed)
            .count()
    }
}

/// Per-file matching context: the parse tree and alias map exist only in
/// structural mode.
struct Parsed<'a> {
    source: &'a SourceFile,
    structural: Option<(&'static dyn PatternCompiler, Tree, NamespaceAliasMap)>,
}

pub struct Assistant {
    language: Language,
    gate: VersionGate,
    context_lines: usize,
    mode: MatcherMode,
    catalog: Catalog,
    store: SuppressionStore,
    library: Library,
    catalog_errors: Vec<PatternCompileError>,
}

impl Assistant {
    /// Fails on an invalid target version, a missing catalog, or structural
    /// mode for a language without a grammar.
    pub fn new(options: AssistantOptions) -> Result<Self, ConfigError> {
        let gate = VersionGate::new(&options.version)?;
        if options.mode == MatcherMode::Structural && options.language.compiler().is_none() {
            return Err(ConfigError::NoGrammar(options.language.name().to_string()));
        }
        let catalog = match options.catalog {
            Some(catalog) => catalog,
            None => Catalog::builtin(options.language)?,
        };
        let library = options
            .library
            .unwrap_or_else(|| options.language.default_library());
        let catalog_errors = validate_catalog(&catalog, options.language.compiler());
        for e in &catalog_errors {
            warn!("invalid catalog pattern: {e}");
        }
        debug!(
            language = %options.language,
            target = %gate.target(),
            rules = catalog.len(),
            mode = ?options.mode,
            "assistant ready"
        );
        Ok(Self {
            language: options.language,
            gate,
            context_lines: options.context_lines,
            mode: options.mode,
            catalog,
            store: SuppressionStore::open(&options.store_path),
            library,
            catalog_errors,
        })
    }

    pub fn language(&self) -> Language {
        self.language
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn mode(&self) -> MatcherMode {
        self.mode
    }

    /// Patterns of any rule, gated or not, that can never match.
    pub fn catalog_errors(&self) -> &[PatternCompileError] {
        &self.catalog_errors
    }

    pub fn process_file(&self, path: &Path) -> Result<FileReport, SourceReadError> {
        let source = SourceFile::from_path(path)?;
        Ok(self.process_source(&source))
    }

    /// Run every rule over an already loaded file.
    pub fn process_source(&self, source: &SourceFile) -> FileReport {
        debug!(path = %source.path.display(), lines = source.line_count(), "processing file");
        let parsed = self.prepare(source);

        let mut diagnostics = Vec::new();
        let mut counts = Counts::default();
        let mut errors = Vec::new();

        for rule in self.catalog.rules() {
            let gate = self.gate.check(rule);
            if !gate.is_relevant() {
                continue;
            }
            for pattern in &rule.patterns {
                let captures = match self.captures_for(&parsed, rule, pattern) {
                    Ok(captures) => captures,
                    Err(e) => {
                        warn!(path = %source.path.display(), "skipping pattern: {e}");
                        errors.push(e);
                        continue;
                    }
                };
                for capture in &captures {
                    let mut diagnostic = render(rule, gate, source, capture, self.context_lines);
                    counts.add(&diagnostic);
                    if self.is_suppressed(&diagnostic) {
                        diagnostic.suppressed = true;
                        counts.subtract(&diagnostic);
                    }
                    diagnostics.push(diagnostic);
                }
            }
        }

        diagnostics.sort_by_key(Diagnostic::sort_key);
        FileReport {
            path: source.path.clone(),
            diagnostics,
            counts,
            errors,
        }
    }

    fn prepare<'a>(&self, source: &'a SourceFile) -> Parsed<'a> {
        let structural = match (self.mode, self.language.compiler()) {
            (MatcherMode::Structural, Some(compiler)) => {
                match parse_tree(&compiler.ts_language(), source.text()) {
                    Ok(tree) => {
                        let aliases =
                            resolve_aliases(compiler, &self.library, &tree, source.as_bytes());
                        Some((compiler, tree, aliases))
                    }
                    Err(e) => {
                        warn!(path = %source.path.display(), "parse failed: {e}");
                        None
                    }
                }
            }
            _ => None,
        };
        Parsed { source, structural }
    }

    fn captures_for(
        &self,
        parsed: &Parsed<'_>,
        rule: &Rule,
        pattern: &Pattern,
    ) -> Result<Vec<Capture>, PatternCompileError> {
        match self.mode {
            MatcherMode::Fallback => match &pattern.regex {
                Some(re) => Ok(FallbackMatcher::new(re)
                    .map_err(|e| e.for_rule(&rule.identifier))?
                    .scan(parsed.source)),
                None => Ok(Vec::new()),
            },
            MatcherMode::Structural => {
                let Some((compiler, tree, aliases)) = &parsed.structural else {
                    return Ok(Vec::new());
                };
                let Some(compiled) = compile_structural(*compiler, rule, pattern, aliases)? else {
                    return Ok(Vec::new());
                };
                let hits = query::run(
                    &compiler.ts_language(),
                    &compiled.source,
                    tree,
                    parsed.source.as_bytes(),
                )
                .map_err(|reason| PatternCompileError::Query {
                    rule: rule.identifier.clone(),
                    reason,
                })?;
                Ok(extract_captures(&hits, &compiled.captures, pattern.deduplicate))
            }
        }
    }

    /// Whether the finding was acknowledged before. Pure lookup.
    pub fn is_suppressed(&self, diagnostic: &Diagnostic) -> bool {
        self.store.contains(&suppression_key(diagnostic))
    }

    /// Acknowledge a finding. Returns `false` when it already was.
    pub fn suppress(&self, diagnostic: &Diagnostic) -> io::Result<bool> {
        self.store.append(&suppression_key(diagnostic))
    }

    /// Process files in parallel. A file that cannot be read is recorded and
    /// the run continues.
    pub fn run_assistant(&self, files: &[PathBuf]) -> RunSummary {
        let results: Vec<Result<FileReport, SourceReadError>> =
            files.par_iter().map(|path| self.process_file(path)).collect();

        let mut summary = RunSummary::default();
        for result in results {
            match result {
                Ok(report) => {
                    summary.totals += report.counts;
                    summary.reports.push(report);
                }
                Err(e) => {
                    warn!("{e}");
                    summary.read_errors.push(e);
                }
            }
        }
        summary
    }
}

/// The query for a pattern's structural part, `None` when it has none.
fn compile_structural(
    compiler: &dyn PatternCompiler,
    rule: &Rule,
    pattern: &Pattern,
    aliases: &NamespaceAliasMap,
) -> Result<Option<CompiledQuery>, PatternCompileError> {
    let Some(exprs) = &pattern.structural else {
        return Ok(None);
    };
    let Some(kind) = pattern.kind else {
        return Err(PatternCompileError::MissingKind {
            rule: rule.identifier.clone(),
        });
    };
    let exprs = exprs
        .as_slice()
        .iter()
        .map(|e| substitute(e, rule, aliases))
        .collect::<Result<Vec<_>, _>>()?;
    let exprs: Vec<&str> = exprs.iter().map(String::as_str).collect();
    grammar::compile(compiler, kind, &exprs)
        .map(Some)
        .map_err(|e| e.for_rule(&rule.identifier))
}

/// Compile every pattern of every rule once, regardless of the target
/// version. Namespaces resolve to their canonical names.
fn validate_catalog(
    catalog: &Catalog,
    compiler: Option<&dyn PatternCompiler>,
) -> Vec<PatternCompileError> {
    let aliases = NamespaceAliasMap::new();
    let mut errors = Vec::new();
    for rule in catalog.rules() {
        for pattern in &rule.patterns {
            if let Some(re) = &pattern.regex {
                if let Err(e) = FallbackMatcher::new(re) {
                    errors.push(e.for_rule(&rule.identifier));
                }
            }
            let Some(compiler) = compiler else {
                continue;
            };
            match compile_structural(compiler, rule, pattern, &aliases) {
                Ok(Some(compiled)) => {
                    let language = compiler.ts_language();
                    if let Err(reason) = query::compile_query(&language, &compiled.source) {
                        errors.push(PatternCompileError::Query {
                            rule: rule.identifier.clone(),
                            reason,
                        });
                    }
                }
                Ok(None) => {}
                Err(e) => errors.push(e),
            }
        }
    }
    debug!(rules = catalog.len(), errors = errors.len(), "catalog validated");
    errors
}

fn suppression_key(diagnostic: &Diagnostic) -> String {
    compute_key(&diagnostic.path, &diagnostic.line_text, &diagnostic.rule_id)
}
