//! Textual fallback matcher: scans lines with the pattern's `re_pattern`.
//!
//! Used when no grammar is available or when structural matching is turned
//! off. Surfaces more hits than the structural matcher, at the price of more
//! false positives.

use fancy_regex::Regex;
use tracing::warn;

use crate::capture::{Capture, Position};
use crate::error::PatternCompileError;
use crate::parse::source::SourceFile;

/// A compiled `re_pattern`.
#[derive(Debug)]
pub struct FallbackMatcher {
    regex: Regex,
}

impl FallbackMatcher {
    pub fn new(pattern: &str) -> Result<Self, PatternCompileError> {
        Regex::new(pattern)
            .map(|regex| Self { regex })
            .map_err(|e| PatternCompileError::InvalidRegex {
                rule: String::new(),
                expr: pattern.to_string(),
                reason: e.to_string(),
            })
    }

    /// One capture per line containing a match, spanning the first match.
    /// Columns are byte offsets within the line.
    pub fn scan(&self, source: &SourceFile) -> Vec<Capture> {
        let mut captures = Vec::new();
        for (row, line) in source.lines().enumerate() {
            match self.regex.find(line) {
                Ok(Some(m)) => captures.push(Capture::new(
                    Position::new(row, m.start()),
                    Position::new(row, m.end()),
                )),
                Ok(None) => {}
                Err(e) => {
                    warn!(row, "regex gave up on line: {e}");
                }
            }
        }
        captures
    }
}
