use std::path::{Path, PathBuf};

use crate::error::SourceReadError;

#[derive(Debug)]
pub struct SourceFile {
    pub path: PathBuf,
    text: String,
    /// Byte range of each line within `text`, excluding the `\n` terminator
    /// and one trailing `\r`.
    line_ranges: Vec<(usize, usize)>,
}

impl SourceFile {
    pub fn from_path(path: &Path) -> Result<Self, SourceReadError> {
        let bytes = std::fs::read(path).map_err(|source| SourceReadError {
            path: path.to_path_buf(),
            source,
        })?;
        let text = match String::from_utf8(bytes) {
            Ok(s) => s,
            Err(e) => String::from_utf8_lossy(e.as_bytes()).into_owned(),
        };
        Ok(Self::from_string(path.to_path_buf(), text))
    }

    /// Create a SourceFile from a string, using the given path for display purposes.
    pub fn from_string(path: PathBuf, text: String) -> Self {
        let line_ranges = compute_line_ranges(&text);
        Self {
            path,
            text,
            line_ranges,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn as_bytes(&self) -> &[u8] {
        self.text.as_bytes()
    }

    pub fn line_count(&self) -> usize {
        self.line_ranges.len()
    }

    /// The 0-indexed line `row`, or `None` past the end of the file.
    pub fn line(&self, row: usize) -> Option<&str> {
        self.line_ranges
            .get(row)
            .map(|&(start, end)| &self.text[start..end])
    }

    pub fn lines(&self) -> impl Iterator<Item = &str> {
        self.line_ranges
            .iter()
            .map(|&(start, end)| &self.text[start..end])
    }

    pub fn path_str(&self) -> &str {
        self.path.to_str().unwrap_or("<non-utf8 path>")
    }
}

/// Split on `\n`; a trailing newline yields a final empty line, so the line
/// list always has `newline count + 1` entries. A `\r` directly before a `\n`
/// (or at end of text) belongs to the terminator, not the line.
fn compute_line_ranges(text: &str) -> Vec<(usize, usize)> {
    let bytes = text.as_bytes();
    let mut ranges = Vec::new();
    let mut start = 0;
    for (i, &b) in bytes.iter().enumerate() {
        if b == b'\n' {
            ranges.push((start, strip_cr(bytes, start, i)));
            start = i + 1;
        }
    }
    ranges.push((start, strip_cr(bytes, start, bytes.len())));
    ranges
}

fn strip_cr(bytes: &[u8], start: usize, end: usize) -> usize {
    if end > start && bytes[end - 1] == b'\r' {
        end - 1
    } else {
        end
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(s: &str) -> SourceFile {
        SourceFile::from_string(PathBuf::from("test.py"), s.to_string())
    }

    #[test]
    fn single_line() {
        let sf = source("hello");
        assert_eq!(sf.line_count(), 1);
        assert_eq!(sf.line(0), Some("hello"));
    }

    #[test]
    fn multiple_lines() {
        let sf = source("abc\ndef\nghi");
        let lines: Vec<&str> = sf.lines().collect();
        assert_eq!(lines, vec!["abc", "def", "ghi"]);
    }

    #[test]
    fn trailing_newline_yields_empty_last_line() {
        let sf = source("abc\n");
        let lines: Vec<&str> = sf.lines().collect();
        assert_eq!(lines, vec!["abc", ""]);
    }

    #[test]
    fn crlf_lines_match_lf_lines() {
        let crlf = source("import neo4j\r\nx = 1\r\n");
        let lf = source("import neo4j\nx = 1\n");
        assert_eq!(
            crlf.lines().collect::<Vec<_>>(),
            lf.lines().collect::<Vec<_>>()
        );
    }

    #[test]
    fn lone_cr_inside_line_is_kept() {
        let sf = source("a\rb\n");
        assert_eq!(sf.line(0), Some("a\rb"));
    }

    #[test]
    fn line_out_of_range() {
        let sf = source("abc");
        assert_eq!(sf.line(1), None);
    }

    #[test]
    fn from_path_reads_file() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("app.py");
        std::fs::write(&file, b"x = 1\n").unwrap();
        let sf = SourceFile::from_path(&file).unwrap();
        assert_eq!(sf.text(), "x = 1\n");
        assert_eq!(sf.path, file);
    }

    #[test]
    fn from_path_nonexistent() {
        let result = SourceFile::from_path(Path::new("/nonexistent/file.py"));
        assert!(result.is_err());
    }

    #[test]
    fn invalid_utf8_is_read_lossily() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("bad.py");
        std::fs::write(&file, b"x = '\xff'\n").unwrap();
        let sf = SourceFile::from_path(&file).unwrap();
        assert_eq!(sf.line_count(), 2);
        assert!(sf.line(0).unwrap().starts_with("x = '"));
    }

    mod prop_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #[test]
            fn line_count_is_newlines_plus_one(content in "[a-z\\r\\n ]{0,200}") {
                let sf = source(&content);
                let newlines = content.bytes().filter(|&b| b == b'\n').count();
                prop_assert_eq!(sf.line_count(), newlines + 1);
            }

            #[test]
            fn crlf_joined_lines_round_trip(lines in prop::collection::vec("[a-z ]{0,20}", 1..20)) {
                let sf = source(&lines.join("\r\n"));
                let got: Vec<&str> = sf.lines().collect();
                prop_assert_eq!(got, lines.iter().map(String::as_str).collect::<Vec<_>>());
            }
        }
    }
}
