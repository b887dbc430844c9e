//! Registry introspection.

use std::fmt::Write as _;

use funcman_core::ResolveState;
use serde::Serialize;

use crate::binder::DynamicLibraryBinder;
use crate::cache::ResolutionCache;
use crate::entry::ResolutionEntry;
use crate::registry::Registry;

/// Point-in-time view of one entry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntrySnapshot {
    pub key: String,
    pub state: ResolveState,
    /// `0` unresolved, `1` bound, negative bind-failure code.
    pub status: i32,
    pub library_name: String,
    pub symbol_name: String,
    pub module_bound: bool,
    pub function_bound: bool,
}

impl EntrySnapshot {
    #[must_use]
    pub fn capture(entry: &ResolutionEntry) -> Self {
        let names = entry.names();
        let state = entry.state();
        let function_bound = entry.settled().is_some_and(|f| f.is_some());
        Self {
            key: entry.key().to_owned(),
            state,
            status: state.status_code(),
            library_name: names.library_name,
            symbol_name: names.symbol_name,
            module_bound: entry.is_bound(),
            function_bound,
        }
    }
}

/// Snapshot of a whole registry.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RegistryReport {
    pub entries: Vec<EntrySnapshot>,
    /// Any entry in a failed state, including never-configured ones.
    pub any_failed: bool,
}

impl RegistryReport {
    /// C-style return code: `-1` when any entry failed, else `0`.
    #[must_use]
    pub const fn return_code(&self) -> i32 {
        if self.any_failed { -1 } else { 0 }
    }

    /// One line per entry, `key state=.. lib=.. sym=.. handle=.. func=..`.
    #[must_use]
    pub fn render_text(&self) -> String {
        let mut out = String::new();
        for e in &self.entries {
            let _ = writeln!(
                out,
                "{} state={} lib={} sym={} handle={} func={}",
                e.key,
                e.status,
                e.library_name,
                e.symbol_name,
                if e.module_bound { "set" } else { "null" },
                if e.function_bound { "set" } else { "null" },
            );
        }
        out
    }
}

impl Registry<'_> {
    /// Snapshot every entry without resolving anything.
    #[must_use]
    pub fn snapshot(&self) -> Vec<EntrySnapshot> {
        self.iter().map(EntrySnapshot::capture).collect()
    }
}

/// Force-resolve all unresolved entries, then snapshot the registry.
pub fn info<B: DynamicLibraryBinder>(
    cache: &ResolutionCache<'_, B>,
    registry: &Registry<'_>,
) -> RegistryReport {
    cache.resolve_all(registry);
    let entries = registry.snapshot();
    let any_failed = entries.iter().any(|e| e.state.failure().is_some());
    RegistryReport {
        entries,
        any_failed,
    }
}
