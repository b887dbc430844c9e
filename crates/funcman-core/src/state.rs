//! Resolution state and error taxonomy.
//!
//! A [`ResolveState`] moves `Unresolved -> {ResolvedOk, ResolvedFailed}` exactly
//! once per entry. The raw `u8` encoding below is what the cache stores in its
//! atomic state cell; the signed status codes are what the C-facing report
//! prints.

use serde::Serialize;
use thiserror::Error;

// Raw state-cell encoding: 0=unresolved, 1=bound, 2..=5 failed with reason.
pub const STATE_UNRESOLVED: u8 = 0;
pub const STATE_RESOLVED_OK: u8 = 1;
const STATE_NO_CONFIG: u8 = 2;
const STATE_NAME_TOO_LONG: u8 = 3;
const STATE_MODULE_NOT_FOUND: u8 = 4;
const STATE_SYMBOL_NOT_FOUND: u8 = 5;

/// Reason an override could not be bound.
///
/// Never propagated to a dispatcher caller under the fail-open policy; it is
/// recorded in the entry's terminal state instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error, Serialize)]
pub enum BindError {
    /// Entry has no library or no symbol configured.
    #[error("no override library/symbol configured")]
    NoConfig,
    /// Composed module file name exceeds the maximum length.
    #[error("module file name exceeds the maximum length")]
    NameTooLong,
    /// The platform loader could not locate or load the module.
    #[error("shared module could not be loaded")]
    ModuleNotFound,
    /// The module loaded but does not export the symbol.
    #[error("symbol not exported by module")]
    SymbolNotFound,
}

impl BindError {
    /// Signed status code used by reports (`-1` .. `-4`).
    #[must_use]
    pub const fn status_code(self) -> i32 {
        match self {
            Self::NoConfig => -1,
            Self::NameTooLong => -2,
            Self::ModuleNotFound => -3,
            Self::SymbolNotFound => -4,
        }
    }

    /// Returns true when the entry had a mapping that turned out to be broken,
    /// as opposed to never having been configured.
    #[must_use]
    pub const fn was_configured(self) -> bool {
        !matches!(self, Self::NoConfig)
    }
}

/// Terminal-or-not state of a resolution entry.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ResolveState {
    #[default]
    Unresolved,
    ResolvedOk,
    ResolvedFailed(BindError),
}

impl ResolveState {
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        !matches!(self, Self::Unresolved)
    }

    #[must_use]
    pub const fn failure(self) -> Option<BindError> {
        match self {
            Self::ResolvedFailed(reason) => Some(reason),
            _ => None,
        }
    }

    /// Encode for the atomic state cell.
    #[must_use]
    pub const fn to_raw(self) -> u8 {
        match self {
            Self::Unresolved => STATE_UNRESOLVED,
            Self::ResolvedOk => STATE_RESOLVED_OK,
            Self::ResolvedFailed(BindError::NoConfig) => STATE_NO_CONFIG,
            Self::ResolvedFailed(BindError::NameTooLong) => STATE_NAME_TOO_LONG,
            Self::ResolvedFailed(BindError::ModuleNotFound) => STATE_MODULE_NOT_FOUND,
            Self::ResolvedFailed(BindError::SymbolNotFound) => STATE_SYMBOL_NOT_FOUND,
        }
    }

    /// Decode a raw state-cell value. Unknown values decode as `Unresolved`.
    #[must_use]
    pub const fn from_raw(raw: u8) -> Self {
        match raw {
            STATE_RESOLVED_OK => Self::ResolvedOk,
            STATE_NO_CONFIG => Self::ResolvedFailed(BindError::NoConfig),
            STATE_NAME_TOO_LONG => Self::ResolvedFailed(BindError::NameTooLong),
            STATE_MODULE_NOT_FOUND => Self::ResolvedFailed(BindError::ModuleNotFound),
            STATE_SYMBOL_NOT_FOUND => Self::ResolvedFailed(BindError::SymbolNotFound),
            _ => Self::Unresolved,
        }
    }

    /// Signed status code: `0` unresolved, `1` bound, negative on failure.
    #[must_use]
    pub const fn status_code(self) -> i32 {
        match self {
            Self::Unresolved => 0,
            Self::ResolvedOk => 1,
            Self::ResolvedFailed(reason) => reason.status_code(),
        }
    }
}

/// Caller-side misuse of a public entry point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MisuseError {
    /// A required output location was null.
    #[error("required output location is null")]
    NullOutput,
}

impl MisuseError {
    /// C return code for this misuse.
    #[must_use]
    pub const fn return_code(self) -> i32 {
        match self {
            Self::NullOutput => -1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [ResolveState; 6] = [
        ResolveState::Unresolved,
        ResolveState::ResolvedOk,
        ResolveState::ResolvedFailed(BindError::NoConfig),
        ResolveState::ResolvedFailed(BindError::NameTooLong),
        ResolveState::ResolvedFailed(BindError::ModuleNotFound),
        ResolveState::ResolvedFailed(BindError::SymbolNotFound),
    ];

    #[test]
    fn raw_encoding_is_lossless() {
        for state in ALL {
            assert_eq!(ResolveState::from_raw(state.to_raw()), state);
        }
        assert_eq!(ResolveState::from_raw(200), ResolveState::Unresolved);
    }

    #[test]
    fn only_unresolved_is_non_terminal() {
        let terminal: Vec<bool> = ALL.iter().map(|s| s.is_terminal()).collect();
        assert_eq!(terminal, [false, true, true, true, true, true]);
    }

    #[test]
    fn status_codes_match_report_numbering() {
        let codes: Vec<i32> = ALL.iter().map(|s| s.status_code()).collect();
        assert_eq!(codes, [0, 1, -1, -2, -3, -4]);
    }

    #[test]
    fn failure_is_reported_only_for_failed_states() {
        let failures: Vec<Option<BindError>> = ALL.iter().map(|s| s.failure()).collect();
        assert_eq!(
            failures,
            [
                None,
                None,
                Some(BindError::NoConfig),
                Some(BindError::NameTooLong),
                Some(BindError::ModuleNotFound),
                Some(BindError::SymbolNotFound),
            ]
        );
    }

    #[test]
    fn no_config_is_not_a_configured_failure() {
        assert!(!BindError::NoConfig.was_configured());
        assert!(BindError::ModuleNotFound.was_configured());
        assert!(BindError::SymbolNotFound.was_configured());
        assert!(BindError::NameTooLong.was_configured());
    }
}
