//! Host load/unload contract: `init` once before first use, `dispose` once
//! after last use.

use std::collections::HashSet;
use std::path::Path;

use funcman_core::{ConfigError, NamePolicy, OverrideTable};
use serde::Serialize;

use crate::binder::DynamicLibraryBinder;
use crate::observe::{ResolutionEvent, ResolutionObserver, notify};
use crate::registry::{Registry, RegistryError};

/// Outcome of [`LifecycleManager::init`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum InitReport {
    /// A config file was read and applied.
    Configured {
        /// Distinct entries whose names were set.
        configured: usize,
        /// Parsed lines whose key matched no entry.
        unknown_keys: usize,
        /// Malformed lines (wrong token count, rejected names).
        skipped_lines: usize,
    },
    /// No path was given, or the file could not be opened. All entries stay
    /// unconfigured.
    ConfigMissing,
}

impl InitReport {
    #[must_use]
    pub const fn configured(&self) -> usize {
        match self {
            Self::Configured { configured, .. } => *configured,
            Self::ConfigMissing => 0,
        }
    }
}

/// Applies configuration on load and releases modules on unload.
///
/// Never binds anything itself; binding is always lazy, on first `get`.
#[derive(Clone, Copy)]
pub struct LifecycleManager<'o> {
    policy: NamePolicy,
    observer: Option<&'o dyn ResolutionObserver>,
}

impl std::fmt::Debug for LifecycleManager<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LifecycleManager")
            .field("policy", &self.policy)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl Default for LifecycleManager<'_> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'o> LifecycleManager<'o> {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            policy: NamePolicy::Truncate,
            observer: None,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: NamePolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn with_observer(mut self, observer: &'o dyn ResolutionObserver) -> Self {
        self.observer = Some(observer);
        self
    }

    #[must_use]
    pub const fn policy(&self) -> NamePolicy {
        self.policy
    }

    /// Validate `registry` and apply the override table at `config_path`.
    ///
    /// Must run before any other thread can reach the registry. A missing or
    /// unreadable file is not an error.
    pub fn init(
        &self,
        registry: &Registry<'_>,
        config_path: Option<&Path>,
    ) -> Result<InitReport, RegistryError> {
        registry.validate()?;
        let Some(path) = config_path else {
            return Ok(InitReport::ConfigMissing);
        };
        match self.load_config(registry, path) {
            Ok(report) => Ok(report),
            Err(ConfigError::FileNotOpenable { .. }) => Ok(InitReport::ConfigMissing),
        }
    }

    /// Read `path` and apply it to `registry`.
    pub fn load_config(
        &self,
        registry: &Registry<'_>,
        path: &Path,
    ) -> Result<InitReport, ConfigError> {
        let table = OverrideTable::load(path, self.policy)?;
        Ok(self.apply_table(registry, &table))
    }

    /// Apply parsed lines in file order; the last line for a key wins.
    pub fn apply_table(&self, registry: &Registry<'_>, table: &OverrideTable) -> InitReport {
        let mut configured = HashSet::new();
        let mut unknown_keys = 0;
        for line in table.lines() {
            let triple = &line.triple;
            let Some(entry) = registry.find(&triple.key) else {
                unknown_keys += 1;
                notify(
                    self.observer,
                    ResolutionEvent::UnknownKey {
                        key: &triple.key,
                        line: line.line_number,
                    },
                );
                continue;
            };
            if entry.configure(&triple.library_name, &triple.symbol_name) {
                configured.insert(entry.key());
                notify(
                    self.observer,
                    ResolutionEvent::Configured {
                        key: entry.key(),
                        library: &triple.library_name,
                        symbol: &triple.symbol_name,
                    },
                );
            }
        }
        InitReport::Configured {
            configured: configured.len(),
            unknown_keys,
            skipped_lines: table.skipped().len(),
        }
    }

    /// Close every held module handle. Returns the number closed.
    ///
    /// Lock-free: takes no entry lock, allocates nothing and emits no events,
    /// so it is safe under a loader lock. The host guarantees no resolution is
    /// in flight.
    pub fn dispose<B: DynamicLibraryBinder + ?Sized>(
        &self,
        registry: &Registry<'_>,
        binder: &B,
    ) -> usize {
        let mut closed = 0;
        for entry in registry.iter() {
            if let Some(handle) = entry.release_binding() {
                binder.close(handle);
                closed += 1;
            }
        }
        closed
    }
}
