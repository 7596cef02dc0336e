use std::io::{self, Write};

use serde::Serialize;

use crate::assistant::RunSummary;
use crate::diagnostic::Diagnostic;
use crate::formatter::Formatter;

pub struct JsonFormatter {
    pub show_ignored: bool,
}

#[derive(Serialize)]
struct JsonOutput {
    metadata: Metadata,
    findings: Vec<Finding>,
    errors: Vec<String>,
}

#[derive(Serialize)]
struct Metadata {
    files_inspected: usize,
    finding_count: usize,
    suppressed_count: usize,
    deprecated_count: usize,
    removed_count: usize,
}

#[derive(Serialize)]
struct Finding {
    path: String,
    /// 1-indexed
    line: usize,
    col_start: usize,
    col_end: usize,
    severity: &'static str,
    rule_id: String,
    message: String,
    deprecated_in: Option<String>,
    removed_in: Option<String>,
    links: Vec<String>,
    suppressed: bool,
}

impl Finding {
    fn from_diagnostic(d: &Diagnostic) -> Self {
        Self {
            path: d.path.clone(),
            line: d.line + 1,
            col_start: d.col_start,
            col_end: d.col_end,
            severity: d.severity().name(),
            rule_id: d.rule_id.clone(),
            message: d.body.header.clone(),
            deprecated_in: d.body.deprecated_in.clone(),
            removed_in: d.body.removed_in.clone(),
            links: d.body.links.clone(),
            suppressed: d.suppressed,
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_to(&self, summary: &RunSummary, out: &mut dyn Write) -> io::Result<()> {
        let all = summary.reports.iter().flat_map(|r| &r.diagnostics);
        let suppressed_count = all.clone().filter(|d| d.suppressed).count();
        let findings: Vec<Finding> = all
            .filter(|d| self.show_ignored || !d.suppressed)
            .map(Finding::from_diagnostic)
            .collect();

        let errors = summary
            .reports
            .iter()
            .flat_map(|r| r.errors.iter().map(|e| format!("{}: {e}", r.path.display())))
            .chain(summary.read_errors.iter().map(|e| e.to_string()))
            .collect();

        let output = JsonOutput {
            metadata: Metadata {
                files_inspected: summary.reports.len(),
                finding_count: findings.len(),
                suppressed_count,
                deprecated_count: summary.totals.deprecated,
                removed_count: summary.totals.removed,
            },
            findings,
            errors,
        };
        let json = serde_json::to_string_pretty(&output).map_err(io::Error::other)?;
        writeln!(out, "{json}")
    }
}
