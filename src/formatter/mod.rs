pub mod json;
pub mod text;

use std::io::{self, Write};

use crate::assistant::RunSummary;
use crate::grammar::Language;

pub trait Formatter {
    fn format_to(&self, summary: &RunSummary, out: &mut dyn Write) -> io::Result<()>;

    fn print(&self, summary: &RunSummary) -> io::Result<()> {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        self.format_to(summary, &mut lock)
    }
}

/// `show_ignored` decides whether acknowledged findings are shown in full.
pub fn create_formatter(format: &str, language: Language, show_ignored: bool) -> Box<dyn Formatter> {
    match format {
        "json" => Box::new(json::JsonFormatter { show_ignored }),
        _ => Box::new(text::TextFormatter {
            language,
            show_ignored,
        }),
    }
}

#[cfg(test)]
pub(crate) mod testutil {
    use std::path::PathBuf;

    use crate::assistant::{Counts, FileReport, RunSummary};
    use crate::capture::{Capture, Position};
    use crate::catalog::{OneOrMany, Rule};
    use crate::diagnostic::render;
    use crate::error::PatternCompileError;
    use crate::parse::source::SourceFile;
    use crate::version::GateResult;

    /// One file with a removed finding (suppressed) and a deprecated one.
    pub fn sample_summary() -> RunSummary {
        let source = SourceFile::from_string(
            PathBuf::from("app.py"),
            "import neo4j.Bookmark\nb = s.last_bookmark()\n".to_string(),
        );
        let rule = |id: &str, removed: Option<&str>| Rule {
            identifier: id.to_string(),
            msg: format!("{id} is going away"),
            deprecated: Some("5.0".to_string()),
            removed: removed.map(str::to_string),
            refs: Some(OneOrMany::One("https://example.com/docs".to_string())),
            namespace: None,
            patterns: Vec::new(),
        };
        let mut removed = render(
            &rule("import_neo4j.Bookmark", Some("6.0")),
            GateResult {
                deprecated: true,
                removed: true,
            },
            &source,
            &Capture::new(Position::new(0, 7), Position::new(0, 21)),
            1,
        );
        removed.suppressed = true;
        let deprecated = render(
            &rule("Session.last_bookmark", None),
            GateResult {
                deprecated: true,
                removed: false,
            },
            &source,
            &Capture::new(Position::new(1, 6), Position::new(1, 19)),
            1,
        );
        let counts = Counts {
            deprecated: 1,
            removed: 0,
        };
        RunSummary {
            reports: vec![FileReport {
                path: PathBuf::from("app.py"),
                diagnostics: vec![removed, deprecated],
                counts,
                errors: vec![PatternCompileError::Query {
                    rule: "broken".to_string(),
                    reason: "syntax error".to_string(),
                }],
            }],
            read_errors: Vec::new(),
            totals: counts,
        }
    }
}
