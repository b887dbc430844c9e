//! Static checks on an override table, without loading anything.

use std::collections::HashMap;
use std::path::Path;

use funcman_core::config::OverrideLine;
use funcman_core::{ConfigError, NamePolicy, OverrideTable, naming};
use serde::Serialize;

/// One parsed line, annotated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintedLine {
    pub line: usize,
    pub key: String,
    pub library: String,
    pub symbol: String,
    /// Composed module file name, or `None` when it would be too long.
    pub module_file: Option<String>,
    /// `None` when no key list was given to check against.
    pub known_key: Option<bool>,
    /// A later line for the same key replaces this one.
    pub superseded: bool,
}

/// A line the loader skips.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LintedSkip {
    pub line: usize,
    pub reason: String,
}

/// Lint result for a whole table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConfigLint {
    pub lines: Vec<LintedLine>,
    pub skipped: Vec<LintedSkip>,
}

impl ConfigLint {
    /// Keys that match no known key (only when a key list was given).
    #[must_use]
    pub fn unknown_keys(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter(|l| l.known_key == Some(false))
            .map(|l| l.key.as_str())
            .collect()
    }

    /// True when every line parses, names a known key, and composes a valid
    /// module file name.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.skipped.is_empty()
            && self
                .lines
                .iter()
                .all(|l| l.module_file.is_some() && l.known_key != Some(false))
    }
}

/// Lint a parsed table. `keys`, when given, are the keys the host registers.
#[must_use]
pub fn lint_table(table: &OverrideTable, keys: Option<&[String]>) -> ConfigLint {
    let mut last_line: HashMap<&str, usize> = HashMap::new();
    for line in table.lines() {
        last_line.insert(&line.triple.key, line.line_number);
    }

    let lines = table
        .lines()
        .iter()
        .map(|line: &OverrideLine| {
            let t = &line.triple;
            LintedLine {
                line: line.line_number,
                key: t.key.clone(),
                library: t.library_name.clone(),
                symbol: t.symbol_name.clone(),
                module_file: naming::module_file_name(&t.library_name).ok(),
                known_key: keys.map(|keys| keys.iter().any(|k| *k == t.key)),
                superseded: last_line.get(t.key.as_str()) != Some(&line.line_number),
            }
        })
        .collect();

    let skipped = table
        .skipped()
        .iter()
        .map(|s| LintedSkip {
            line: s.line_number,
            reason: s.reason.to_string(),
        })
        .collect();

    ConfigLint { lines, skipped }
}

/// Read, parse and lint `path`.
pub fn lint_file(
    path: &Path,
    policy: NamePolicy,
    keys: Option<&[String]>,
) -> Result<ConfigLint, ConfigError> {
    let table = OverrideTable::load(path, policy)?;
    Ok(lint_table(&table, keys))
}
