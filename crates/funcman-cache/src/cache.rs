//! Lazy, double-checked resolution of override entries.
//!
//! ```text
//! get(entry)
//!   state terminal?  ── yes ──> cached pointer (no lock, no I/O)
//!        │ no
//!   lock entry ── state terminal now? ── yes ──> cached pointer
//!        │ no
//!   names empty?        -> ResolvedFailed(NoConfig)
//!   file name too long? -> ResolvedFailed(NameTooLong)
//!   open fails?         -> ResolvedFailed(ModuleNotFound)
//!   resolve fails?      -> close, ResolvedFailed(SymbolNotFound)
//!   otherwise           -> ResolvedOk(handle, pointer)
//! ```
//!
//! Failures are terminal and cached; a failed key is never retried for the
//! life of the process.

use funcman_core::naming;
use funcman_core::BindError;

use crate::binder::{DynamicLibraryBinder, ModuleHandle, SymbolPtr};
use crate::entry::{OverrideNames, ResolutionEntry};
use crate::observe::{ResolutionEvent, ResolutionObserver, notify};
use crate::registry::Registry;

/// Resolution front-end over a binder.
pub struct ResolutionCache<'o, B> {
    binder: B,
    observer: Option<&'o dyn ResolutionObserver>,
}

impl<B: std::fmt::Debug> std::fmt::Debug for ResolutionCache<'_, B> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResolutionCache")
            .field("binder", &self.binder)
            .field("observed", &self.observer.is_some())
            .finish()
    }
}

impl<'o, B: DynamicLibraryBinder> ResolutionCache<'o, B> {
    /// Create a cache. Usable in `static` items.
    #[must_use]
    pub const fn new(binder: B) -> Self {
        Self {
            binder,
            observer: None,
        }
    }

    /// Create a cache that reports bind outcomes to `observer`.
    #[must_use]
    pub const fn with_observer(binder: B, observer: &'o dyn ResolutionObserver) -> Self {
        Self {
            binder,
            observer: Some(observer),
        }
    }

    #[must_use]
    pub fn binder(&self) -> &B {
        &self.binder
    }

    /// Resolved override pointer for `entry`, or `None` when the entry has no
    /// (working) override. Binds on first call; later calls are lock-free.
    pub fn get(&self, entry: &ResolutionEntry) -> Option<SymbolPtr> {
        if let Some(cached) = entry.settled() {
            return cached;
        }
        self.resolve_slow(entry)
    }

    /// True when `entry` resolves to an override.
    pub fn is_overridden(&self, entry: &ResolutionEntry) -> bool {
        self.get(entry).is_some()
    }

    /// Force resolution of every still-unresolved entry. Returns the number of
    /// entries that ended in a failed state.
    pub fn resolve_all(&self, registry: &Registry<'_>) -> usize {
        let mut failed = 0;
        for entry in registry.iter() {
            self.get(entry);
            if entry.state().failure().is_some() {
                failed += 1;
            }
        }
        failed
    }

    #[cold]
    fn resolve_slow(&self, entry: &ResolutionEntry) -> Option<SymbolPtr> {
        let guard = entry.lock_for_resolution();
        // Another thread may have finished while we waited on the lock.
        if let Some(cached) = entry.settled() {
            return cached;
        }
        let names = guard.clone();

        match self.bind(&names) {
            Ok(bound) => {
                entry.publish_bound(bound.handle, bound.function);
                drop(guard);
                notify(
                    self.observer,
                    ResolutionEvent::Bound {
                        key: entry.key(),
                        module: &bound.module_file,
                        symbol: &names.symbol_name,
                    },
                );
                Some(bound.function)
            }
            Err(reason) => {
                entry.publish_failed(reason);
                drop(guard);
                notify(
                    self.observer,
                    ResolutionEvent::BindFailed {
                        key: entry.key(),
                        library: &names.library_name,
                        symbol: &names.symbol_name,
                        reason,
                    },
                );
                None
            }
        }
    }

    /// Open and resolve under the entry lock. On symbol failure the module is
    /// closed again before returning.
    fn bind(&self, names: &OverrideNames) -> Result<Bound, BindError> {
        if !names.is_configured() {
            return Err(BindError::NoConfig);
        }
        let module_file = naming::module_file_name(&names.library_name)?;
        let handle = self.binder.open(&module_file)?;
        match self.binder.resolve(handle, &names.symbol_name) {
            Ok(function) => Ok(Bound {
                handle,
                function,
                module_file,
            }),
            Err(reason) => {
                self.binder.close(handle);
                Err(reason)
            }
        }
    }
}

struct Bound {
    handle: ModuleHandle,
    function: SymbolPtr,
    module_file: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::observe::ResolutionStats;
    use funcman_core::ResolveState;
    use crate::testing::RecordingBinder;

    extern "C" fn answer() -> i32 {
        42
    }

    fn binder() -> RecordingBinder {
        RecordingBinder::new()
            .with_symbol("libgood", "answer", answer as *const ())
            .with_module("libempty")
    }

    #[test]
    fn unconfigured_entry_never_touches_binder() {
        let cache = ResolutionCache::new(binder());
        let entry = ResolutionEntry::with_key("k");
        assert!(cache.get(&entry).is_none());
        assert!(cache.get(&entry).is_none());
        assert_eq!(entry.state(), ResolveState::ResolvedFailed(BindError::NoConfig));
        assert_eq!(cache.binder().open_calls(), 0);
        assert_eq!(cache.binder().resolve_calls(), 0);
    }

    #[test]
    fn half_configured_entry_is_no_config() {
        let cache = ResolutionCache::new(binder());
        let entry = ResolutionEntry::with_key("k");
        entry.configure("libgood", "");
        assert!(cache.get(&entry).is_none());
        assert_eq!(entry.state(), ResolveState::ResolvedFailed(BindError::NoConfig));
        assert_eq!(cache.binder().open_calls(), 0);
    }

    #[test]
    fn successful_bind_is_cached() {
        let cache = ResolutionCache::new(binder());
        let entry = ResolutionEntry::with_key("k");
        entry.configure("libgood", "answer");

        let first = cache.get(&entry).unwrap();
        let second = cache.get(&entry).unwrap();
        assert_eq!(first, second);
        assert_eq!(entry.state(), ResolveState::ResolvedOk);
        assert!(entry.is_bound());
        assert_eq!(cache.binder().open_calls(), 1);
        assert_eq!(cache.binder().resolve_calls(), 1);

        // SAFETY: `answer` has this exact signature.
        let f: extern "C" fn() -> i32 = unsafe { first.cast() };
        assert_eq!(f(), 42);
    }

    #[test]
    fn missing_module_is_sticky() {
        let cache = ResolutionCache::new(binder());
        let entry = ResolutionEntry::with_key("k");
        entry.configure("nosuchlib", "nosuchfunc");
        for _ in 0..3 {
            assert!(cache.get(&entry).is_none());
        }
        assert_eq!(
            entry.state(),
            ResolveState::ResolvedFailed(BindError::ModuleNotFound)
        );
        assert_eq!(cache.binder().open_calls(), 1);
    }

    #[test]
    fn missing_symbol_closes_module_and_is_sticky() {
        let cache = ResolutionCache::new(binder());
        let entry = ResolutionEntry::with_key("k");
        entry.configure("libempty", "answer");
        assert!(cache.get(&entry).is_none());
        assert!(cache.get(&entry).is_none());
        assert_eq!(
            entry.state(),
            ResolveState::ResolvedFailed(BindError::SymbolNotFound)
        );
        assert!(!entry.is_bound());
        assert_eq!(cache.binder().open_calls(), 1);
        assert_eq!(cache.binder().close_calls(), 1);
        assert_eq!(cache.binder().live_handles(), 0);
    }

    #[test]
    fn over_long_library_name_fails_before_open() {
        let cache = ResolutionCache::new(binder());
        let entry = ResolutionEntry::with_key("k");
        entry.configure(&"l".repeat(naming::MAX_MODULE_FILE_NAME), "answer");
        assert!(cache.get(&entry).is_none());
        assert_eq!(
            entry.state(),
            ResolveState::ResolvedFailed(BindError::NameTooLong)
        );
        assert_eq!(cache.binder().open_calls(), 0);
    }

    #[test]
    fn resolve_all_counts_failures_and_observer_sees_outcomes() {
        let stats = ResolutionStats::new();
        let cache = ResolutionCache::with_observer(binder(), &stats);
        let good = ResolutionEntry::with_key("good");
        let bad = ResolutionEntry::with_key("bad");
        let unset = ResolutionEntry::with_key("unset");
        good.configure("libgood", "answer");
        bad.configure("libempty", "missing");
        let entries = [&good, &bad, &unset];
        let registry = Registry::new(&entries).unwrap();

        assert_eq!(cache.resolve_all(&registry), 2);
        assert!(cache.is_overridden(&good));
        let snap = stats.snapshot();
        assert_eq!(snap.bound, 1);
        assert_eq!(snap.failed, 2);
    }
}
