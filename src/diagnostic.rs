use std::fmt;

use crate::capture::Capture;
use crate::catalog::Rule;
use crate::parse::source::SourceFile;
use crate::version::GateResult;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Severity {
    Deprecated,
    Removed,
}

impl Severity {
    pub fn letter(&self) -> char {
        match self {
            Severity::Deprecated => 'D',
            Severity::Removed => 'R',
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Severity::Deprecated => "deprecated",
            Severity::Removed => "removed",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.letter())
    }
}

/// One row of the context window.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContextLine {
    /// 0-indexed row
    pub row: usize,
    pub text: String,
    /// Byte range to highlight, only on the matched row.
    pub highlight: Option<(usize, usize)>,
}

/// Rendered content of a finding. Nothing here rewrites the source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Body {
    pub header: String,
    pub context: Vec<ContextLine>,
    pub deprecated_in: Option<String>,
    pub removed_in: Option<String>,
    pub links: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub rule_id: String,
    pub path: String,
    /// 0-indexed row of the capture start
    pub line: usize,
    /// Byte offsets within the line
    pub col_start: usize,
    pub col_end: usize,
    pub deprecated: bool,
    pub removed: bool,
    /// Full text of the matched line; part of the suppression key.
    pub line_text: String,
    pub suppressed: bool,
    pub body: Body,
}

impl Diagnostic {
    /// Removal wins over deprecation.
    pub fn severity(&self) -> Severity {
        if self.removed {
            Severity::Removed
        } else {
            Severity::Deprecated
        }
    }

    pub fn sort_key(&self) -> (usize, usize) {
        (self.line, self.col_start)
    }

    /// Multi-line plain-text rendering: header, context window with a `> `
    /// marker and caret line on the matched row, then annotations and links.
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&self.body.header);
        out.push_str("\n\n");

        let width = self
            .body
            .context
            .last()
            .map_or(1, |c| (c.row + 1).to_string().len());
        for line in &self.body.context {
            let marker = if line.highlight.is_some() { "> " } else { "  " };
            out.push_str(&format!("{marker}{:>width$} {}\n", line.row + 1, line.text));
            if let Some((start, end)) = line.highlight {
                let lead = display_width(&line.text, 0, start);
                let len = display_width(&line.text, start, end).max(1);
                out.push_str(&format!(
                    "  {:width$} {}{}\n",
                    "",
                    " ".repeat(lead),
                    "^".repeat(len)
                ));
            }
        }

        if let Some(v) = &self.body.deprecated_in {
            out.push_str(&format!("\n  Deprecated in: {v}"));
        }
        if let Some(v) = &self.body.removed_in {
            out.push_str(&format!("\n  Removed in: {v}"));
        }
        for link in &self.body.links {
            out.push_str(&format!("\n  Docs: {link}"));
        }
        out.push('\n');
        out
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:{}:{}: {}: {}: {}",
            self.path,
            self.line + 1,
            self.col_start,
            self.severity(),
            self.rule_id,
            self.body.header,
        )
    }
}

/// Number of characters in `text[from..to]`, tolerating offsets that are out
/// of range or inside a multi-byte character.
fn display_width(text: &str, from: usize, to: usize) -> usize {
    let from = from.min(text.len());
    let to = to.clamp(from, text.len());
    text.as_bytes()[from..to]
        .iter()
        .filter(|b| (**b & 0xC0) != 0x80)
        .count()
}

/// Build the finding for one capture of `rule`.
pub fn render(
    rule: &Rule,
    gate: GateResult,
    source: &SourceFile,
    capture: &Capture,
    context_lines: usize,
) -> Diagnostic {
    let row = capture.start.row;
    let line_text = source.line(row).unwrap_or_default().to_string();

    let col_start = capture.start.column.min(line_text.len());
    let col_end = if capture.end.row > row {
        line_text.len()
    } else {
        capture.end.column.clamp(col_start, line_text.len())
    };

    let last = source.line_count().saturating_sub(1);
    let first = row.saturating_sub(context_lines);
    let end = row.saturating_add(context_lines).min(last);
    let context = (first..=end)
        .filter_map(|r| {
            source.line(r).map(|text| ContextLine {
                row: r,
                text: text.to_string(),
                highlight: (r == row).then_some((col_start, col_end)),
            })
        })
        .collect();

    Diagnostic {
        rule_id: rule.identifier.clone(),
        path: source.path_str().to_string(),
        line: row,
        col_start,
        col_end,
        deprecated: gate.deprecated,
        removed: gate.removed,
        line_text,
        suppressed: false,
        body: Body {
            header: interpolate(&rule.msg, rule),
            context,
            deprecated_in: rule.deprecated.clone(),
            removed_in: rule.removed.clone(),
            links: rule.links().to_vec(),
        },
    }
}

/// Fill `{field}` placeholders of a message template from the rule.
///
/// `{{` and `}}` produce literal braces; unknown names are kept verbatim.
pub fn interpolate(template: &str, rule: &Rule) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(pos) = rest.find(['{', '}']) {
        out.push_str(&rest[..pos]);
        let tail = &rest[pos..];
        if tail.starts_with("{{") || tail.starts_with("}}") {
            out.push_str(&tail[..1]);
            rest = &tail[2..];
            continue;
        }
        if tail.starts_with('}') {
            out.push('}');
            rest = &tail[1..];
            continue;
        }
        match tail.find('}') {
            Some(close) => {
                let name = &tail[1..close];
                match field(rule, name) {
                    Some(value) => out.push_str(&value),
                    None => out.push_str(&tail[..=close]),
                }
                rest = &tail[close + 1..];
            }
            None => {
                out.push_str(tail);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

fn field(rule: &Rule, name: &str) -> Option<String> {
    let value = match name {
        "identifier" => rule.identifier.clone(),
        "msg" => rule.msg.clone(),
        "deprecated" => rule.deprecated.clone().unwrap_or_default(),
        "removed" => rule.removed.clone().unwrap_or_default(),
        "namespace" => rule.namespace.clone().unwrap_or_default(),
        "ref" => rule.links().join(", "),
        _ => return None,
    };
    Some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::Position;
    use crate::catalog::OneOrMany;
    use std::path::PathBuf;

    fn bookmark_rule() -> Rule {
        Rule {
            identifier: "import_neo4j.Bookmark".to_string(),
            msg: "`{namespace}.Bookmark` has been removed in {removed}.".to_string(),
            deprecated: Some("5.0".to_string()),
            removed: Some("6.0".to_string()),
            refs: Some(OneOrMany::One("https://example.com/bookmarks".to_string())),
            namespace: Some("neo4j".to_string()),
            patterns: Vec::new(),
        }
    }

    fn source() -> SourceFile {
        SourceFile::from_string(
            PathBuf::from("app.py"),
            "import os\nimport sys\nimport neo4j.Bookmark\nx = 1\n".to_string(),
        )
    }

    fn cap(row: usize, start: usize, end_row: usize, end: usize) -> Capture {
        Capture::new(Position::new(row, start), Position::new(end_row, end))
    }

    const BOTH: GateResult = GateResult {
        deprecated: true,
        removed: true,
    };

    #[test]
    fn interpolates_rule_fields() {
        let rule = bookmark_rule();
        assert_eq!(
            interpolate(&rule.msg, &rule),
            "`neo4j.Bookmark` has been removed in 6.0."
        );
        assert_eq!(
            interpolate("{identifier} see {ref}", &rule),
            "import_neo4j.Bookmark see https://example.com/bookmarks"
        );
    }

    #[test]
    fn doubled_braces_are_literal() {
        let rule = bookmark_rule();
        assert_eq!(interpolate("{{namespace}} {unknown}", &rule), "{namespace} {unknown}");
        assert_eq!(interpolate("dangling {", &rule), "dangling {");
    }

    #[test]
    fn context_window_is_clipped() {
        let d = render(&bookmark_rule(), BOTH, &source(), &cap(2, 7, 2, 21), 3);
        let rows: Vec<usize> = d.body.context.iter().map(|c| c.row).collect();
        assert_eq!(rows, vec![0, 1, 2, 3, 4]);
        let d = render(&bookmark_rule(), BOTH, &source(), &cap(0, 0, 0, 6), 1);
        let rows: Vec<usize> = d.body.context.iter().map(|c| c.row).collect();
        assert_eq!(rows, vec![0, 1]);
    }

    #[test]
    fn zero_context_shows_only_match() {
        let d = render(&bookmark_rule(), BOTH, &source(), &cap(2, 7, 2, 21), 0);
        assert_eq!(d.body.context.len(), 1);
        assert_eq!(d.body.context[0].highlight, Some((7, 21)));
    }

    #[test]
    fn multi_line_capture_highlights_to_end_of_line() {
        let d = render(&bookmark_rule(), BOTH, &source(), &cap(2, 7, 3, 2), 0);
        assert_eq!((d.col_start, d.col_end), (7, 21));
    }

    #[test]
    fn text_rendering() {
        let d = render(&bookmark_rule(), BOTH, &source(), &cap(2, 7, 2, 21), 1);
        assert_eq!(
            d.render_text(),
            "`neo4j.Bookmark` has been removed in 6.0.\n\
             \n  \
             2 import sys\n\
             > 3 import neo4j.Bookmark\n    \
             \x20      ^^^^^^^^^^^^^^\n  \
             4 x = 1\n\
             \n  Deprecated in: 5.0\
             \n  Removed in: 6.0\
             \n  Docs: https://example.com/bookmarks\n"
        );
    }

    #[test]
    fn fields_and_severity() {
        let d = render(&bookmark_rule(), BOTH, &source(), &cap(2, 7, 2, 21), 3);
        assert_eq!(d.line_text, "import neo4j.Bookmark");
        assert_eq!(d.path, "app.py");
        assert_eq!(d.severity(), Severity::Removed);
        assert!(!d.suppressed);
        assert_eq!(
            d.to_string(),
            "app.py:3:7: R: import_neo4j.Bookmark: `neo4j.Bookmark` has been removed in 6.0."
        );

        let deprecated_only = GateResult {
            deprecated: true,
            removed: false,
        };
        let d = render(&bookmark_rule(), deprecated_only, &source(), &cap(2, 7, 2, 21), 3);
        assert_eq!(d.severity(), Severity::Deprecated);
    }

    #[test]
    fn caret_width_counts_characters() {
        assert_eq!(display_width("é = Bookmark", 0, 5), 4);
        assert_eq!(display_width("abc", 1, 99), 2);
        assert_eq!(display_width("abc", 9, 12), 0);
    }
}
