use std::io::{self, Write};

use crate::assistant::RunSummary;
use crate::formatter::Formatter;
use crate::grammar::Language;

const RULE: &str = "--------------------------------------------------";

pub struct TextFormatter {
    pub language: Language,
    pub show_ignored: bool,
}

impl Formatter for TextFormatter {
    fn format_to(&self, summary: &RunSummary, out: &mut dyn Write) -> io::Result<()> {
        let file_count = summary.reports.len() + summary.read_errors.len();
        writeln!(out, "{RULE}")?;
        writeln!(out, "Files to process: {file_count}")?;
        writeln!(out, "{RULE}")?;

        for report in &summary.reports {
            writeln!(out, "File: {}\n", report.path.display())?;
            let total = report.diagnostics.len();
            for (i, d) in report.diagnostics.iter().enumerate() {
                if d.suppressed && !self.show_ignored {
                    writeln!(out, "({}/{total}) Ignored\n", i + 1)?;
                    continue;
                }
                let tag = if d.suppressed { " [ignored]" } else { "" };
                writeln!(out, "({}/{total}){tag} {}", i + 1, d.render_text())?;
            }
            for e in &report.errors {
                writeln!(out, "Skipped pattern: {e}")?;
            }
            writeln!(out, "Deprecations in file: {}", report.counts.deprecated)?;
            writeln!(out, "Removals in file: {}\n", report.counts.removed)?;
            writeln!(out, "{RULE}")?;
        }

        for e in &summary.read_errors {
            writeln!(out, "Could not process {}: {}", e.path.display(), e.source)?;
        }

        writeln!(out, "\nTotal deprecations: {}", summary.totals.deprecated)?;
        writeln!(out, "Total removals: {}", summary.totals.removed)?;

        let name = self.language.name();
        writeln!(
            out,
            "\nLibrary full manual: https://neo4j.com/docs/{name}-manual/current/"
        )?;
        writeln!(
            out,
            "Migration guide: https://neo4j.com/docs/{name}-manual/current/migration/"
        )
    }
}
