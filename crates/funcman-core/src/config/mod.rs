//! Override table parsing.
//!
//! The table is a line-oriented UTF-8 text file:
//!
//! ```text
//! # comment line, ignored
//! key   library_name   symbol_name   # optional trailing comment
//! ```
//!
//! Lines that do not yield exactly three fields are skipped, never rejected as
//! a whole-file error. Applying a table to a registry happens in the cache
//! crate; this module only turns text into ordered triples.

mod line;

use std::path::{Path, PathBuf};

use thiserror::Error;

pub use line::{
    COMMENT_CHAR, MAX_NAME_LEN, NameError, NameField, NamePolicy, SkipReason, Triple,
    parse_line, strip_comment, truncate_name,
};

#[derive(Debug, Error)]
pub enum ConfigError {
    /// Non-fatal: callers proceed with an empty table.
    #[error("config file {} cannot be opened: {source}", .path.display())]
    FileNotOpenable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A triple together with its 1-based source line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideLine {
    pub line_number: usize,
    pub triple: Triple,
}

/// A line that produced no triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SkippedLine {
    pub line_number: usize,
    pub reason: SkipReason,
}

/// Parsed override table, in file order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideTable {
    lines: Vec<OverrideLine>,
    skipped: Vec<SkippedLine>,
}

impl OverrideTable {
    /// Create an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse table text.
    #[must_use]
    pub fn parse(content: &str, policy: NamePolicy) -> Self {
        let mut table = Self::new();
        for (idx, raw) in content.lines().enumerate() {
            let line_number = idx + 1;
            match parse_line(raw, policy) {
                Ok(triple) => table.lines.push(OverrideLine {
                    line_number,
                    triple,
                }),
                Err(SkipReason::Empty) => {}
                Err(reason) => table.skipped.push(SkippedLine {
                    line_number,
                    reason,
                }),
            }
        }
        table
    }

    /// Read and parse a table file.
    ///
    /// Invalid UTF-8 sequences are replaced rather than failing the read.
    pub fn load(path: &Path, policy: NamePolicy) -> Result<Self, ConfigError> {
        let bytes = std::fs::read(path).map_err(|source| ConfigError::FileNotOpenable {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::parse(&String::from_utf8_lossy(&bytes), policy))
    }

    /// Parsed triples in file order. Duplicate keys are kept; the last wins
    /// when applied.
    #[must_use]
    pub fn lines(&self) -> &[OverrideLine] {
        &self.lines
    }

    /// Malformed lines (blank and comment-only lines are not recorded).
    #[must_use]
    pub fn skipped(&self) -> &[SkippedLine] {
        &self.skipped
    }

    /// Effective mapping for `key` (last line wins).
    #[must_use]
    pub fn lookup(&self, key: &str) -> Option<&Triple> {
        self.lines
            .iter()
            .rev()
            .map(|line| &line.triple)
            .find(|triple| triple.key == key)
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.lines.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn comment_blank_and_malformed_lines_yield_nothing() {
        let table = OverrideTable::parse("# just a comment\n\nfoo bar\n", NamePolicy::Truncate);
        assert!(table.is_empty());
        assert_eq!(
            table.skipped(),
            &[SkippedLine {
                line_number: 3,
                reason: SkipReason::WrongTokenCount(2),
            }]
        );
    }

    #[test]
    fn duplicate_keys_last_wins() {
        let table = OverrideTable::parse(
            "sample_func liba first\nsample_func libb second\n",
            NamePolicy::Truncate,
        );
        assert_eq!(table.lines().len(), 2);
        let effective = table.lookup("sample_func").unwrap();
        assert_eq!(effective.library_name, "libb");
        assert_eq!(effective.symbol_name, "second");
        assert!(table.lookup("other").is_none());
    }

    #[test]
    fn crlf_line_endings_parse() {
        let table = OverrideTable::parse("k lib sym\r\n", NamePolicy::Truncate);
        assert_eq!(table.lookup("k").unwrap().symbol_name, "sym");
    }

    #[test]
    fn missing_file_is_file_not_openable() {
        let path = std::env::temp_dir().join("funcman-core-definitely-missing.cfg");
        let err = OverrideTable::load(&path, NamePolicy::Truncate).unwrap_err();
        assert!(matches!(err, ConfigError::FileNotOpenable { .. }));
        assert!(err.to_string().contains("cannot be opened"));
    }
}
