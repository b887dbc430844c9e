//! Single-line grammar: `key library_name symbol_name  # comment`.

use std::fmt;

use thiserror::Error;

/// Comment marker; everything from the first occurrence onward is dropped.
pub const COMMENT_CHAR: char = '#';

/// Maximum length in bytes of a key, library name or symbol name.
pub const MAX_NAME_LEN: usize = 255;

/// What to do with a field longer than [`MAX_NAME_LEN`].
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamePolicy {
    /// Keep the leading `MAX_NAME_LEN` bytes (cut on a char boundary).
    #[default]
    Truncate,
    /// Skip the whole line.
    Reject,
}

impl NamePolicy {
    /// Parse from string (case-insensitive). Unknown values select `Truncate`.
    #[must_use]
    pub fn from_str_loose(s: &str) -> Self {
        match s.to_ascii_lowercase().as_str() {
            "reject" | "strict" | "deny" => Self::Reject,
            _ => Self::Truncate,
        }
    }
}

/// Which of the three fields a name error refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NameField {
    Key,
    Library,
    Symbol,
}

impl fmt::Display for NameField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Key => "key",
            Self::Library => "library name",
            Self::Symbol => "symbol name",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum NameError {
    #[error("{field} is {len} bytes, maximum is {max}")]
    TooLong {
        field: NameField,
        len: usize,
        max: usize,
    },
}

/// Why a line produced no triple.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// Blank or comment-only.
    Empty,
    /// Token count after comment stripping was not three.
    WrongTokenCount(usize),
    /// A field violated the length policy.
    Name(NameError),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Empty => f.write_str("blank or comment-only"),
            Self::WrongTokenCount(n) => write!(f, "expected 3 fields, found {n}"),
            Self::Name(err) => write!(f, "{err}"),
        }
    }
}

/// A parsed `(key, library_name, symbol_name)` triple.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Triple {
    pub key: String,
    pub library_name: String,
    pub symbol_name: String,
}

/// Strip the trailing comment, if any.
#[must_use]
pub fn strip_comment(raw: &str) -> &str {
    match raw.find(COMMENT_CHAR) {
        Some(idx) => &raw[..idx],
        None => raw,
    }
}

/// Cut `name` to at most `max` bytes without splitting a UTF-8 sequence.
#[must_use]
pub fn truncate_name(name: &str, max: usize) -> &str {
    if name.len() <= max {
        return name;
    }
    let mut end = max;
    while !name.is_char_boundary(end) {
        end -= 1;
    }
    &name[..end]
}

fn bounded(field: NameField, token: &str, policy: NamePolicy) -> Result<String, SkipReason> {
    if token.len() <= MAX_NAME_LEN {
        return Ok(token.to_owned());
    }
    match policy {
        NamePolicy::Truncate => Ok(truncate_name(token, MAX_NAME_LEN).to_owned()),
        NamePolicy::Reject => Err(SkipReason::Name(NameError::TooLong {
            field,
            len: token.len(),
            max: MAX_NAME_LEN,
        })),
    }
}

/// Parse one config line.
pub fn parse_line(raw: &str, policy: NamePolicy) -> Result<Triple, SkipReason> {
    let body = strip_comment(raw);
    let tokens: Vec<&str> = body.split_whitespace().collect();
    match tokens.as_slice() {
        [] => Err(SkipReason::Empty),
        [key, library, symbol] => Ok(Triple {
            key: bounded(NameField::Key, key, policy)?,
            library_name: bounded(NameField::Library, library, policy)?,
            symbol_name: bounded(NameField::Symbol, symbol, policy)?,
        }),
        other => Err(SkipReason::WrongTokenCount(other.len())),
    }
}
