//! One cache slot per overridable function.
//!
//! Field ownership:
//! - `names`: written by the config loader before first resolution; the same
//!   mutex serializes resolution for this entry (one lock per entry, never a
//!   registry-wide lock).
//! - `handle` / `function`: written once under `names` during resolution, then
//!   cleared without locking by teardown.
//! - `state`: atomic cell with release-store on publish and acquire-load on the
//!   fast path, so a reader that observes a terminal state also observes the
//!   handle/function writes that preceded it.

use std::borrow::Cow;
use std::ffi::c_void;
use std::ptr;
use std::sync::atomic::{AtomicPtr, AtomicU8, Ordering};

use funcman_core::state::STATE_UNRESOLVED;
use funcman_core::{BindError, ResolveState};
use parking_lot::{Mutex, MutexGuard, const_mutex};

use crate::binder::{ModuleHandle, SymbolPtr};

/// Configured override target for an entry. Empty strings mean "not configured".
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OverrideNames {
    pub library_name: String,
    pub symbol_name: String,
}

impl OverrideNames {
    #[must_use]
    pub fn is_configured(&self) -> bool {
        !self.library_name.is_empty() && !self.symbol_name.is_empty()
    }
}

/// Resolution slot for a single overridable function.
#[derive(Debug)]
pub struct ResolutionEntry {
    key: Cow<'static, str>,
    names: Mutex<OverrideNames>,
    handle: AtomicPtr<c_void>,
    function: AtomicPtr<c_void>,
    state: AtomicU8,
}

impl ResolutionEntry {
    /// Create an unconfigured entry. Usable in `static` items.
    #[must_use]
    pub const fn new(key: &'static str) -> Self {
        Self {
            key: Cow::Borrowed(key),
            names: const_mutex(OverrideNames {
                library_name: String::new(),
                symbol_name: String::new(),
            }),
            handle: AtomicPtr::new(ptr::null_mut()),
            function: AtomicPtr::new(ptr::null_mut()),
            state: AtomicU8::new(STATE_UNRESOLVED),
        }
    }

    /// Create an entry whose key is only known at run time.
    #[must_use]
    pub fn with_key(key: impl Into<String>) -> Self {
        let mut entry = Self::new("");
        entry.key = Cow::Owned(key.into());
        entry
    }

    #[must_use]
    pub fn key(&self) -> &str {
        &self.key
    }

    /// Current state (acquire load).
    #[must_use]
    pub fn state(&self) -> ResolveState {
        ResolveState::from_raw(self.state.load(Ordering::Acquire))
    }

    /// Copy of the configured names.
    #[must_use]
    pub fn names(&self) -> OverrideNames {
        self.names.lock().clone()
    }

    /// Set the override target. Refused (returns `false`) once the entry has
    /// left `Unresolved`.
    pub fn configure(&self, library_name: &str, symbol_name: &str) -> bool {
        let mut names = self.names.lock();
        if self.state().is_terminal() {
            return false;
        }
        names.library_name.clear();
        names.library_name.push_str(library_name);
        names.symbol_name.clear();
        names.symbol_name.push_str(symbol_name);
        true
    }

    /// True while a module handle is held.
    #[must_use]
    pub fn is_bound(&self) -> bool {
        !self.handle.load(Ordering::Acquire).is_null()
    }

    /// Cached result if the entry is terminal, without locking.
    ///
    /// `Some(None)` means "settled, no override".
    pub(crate) fn settled(&self) -> Option<Option<SymbolPtr>> {
        if !self.state().is_terminal() {
            return None;
        }
        Some(SymbolPtr::from_raw(self.function.load(Ordering::Acquire)))
    }

    /// Acquire the per-entry resolution lock.
    pub(crate) fn lock_for_resolution(&self) -> MutexGuard<'_, OverrideNames> {
        self.names.lock()
    }

    /// Publish a successful bind. Caller holds the resolution lock.
    pub(crate) fn publish_bound(&self, handle: ModuleHandle, function: SymbolPtr) {
        debug_assert!(!self.state().is_terminal(), "entry {} published twice", self.key);
        self.handle.store(handle.as_ptr(), Ordering::Relaxed);
        self.function.store(function.as_ptr(), Ordering::Relaxed);
        self.state
            .store(ResolveState::ResolvedOk.to_raw(), Ordering::Release);
    }

    /// Publish a terminal failure. Caller holds the resolution lock.
    pub(crate) fn publish_failed(&self, reason: BindError) {
        debug_assert!(!self.state().is_terminal(), "entry {} published twice", self.key);
        self.state
            .store(ResolveState::ResolvedFailed(reason).to_raw(), Ordering::Release);
    }

    /// Detach the module handle for teardown. Lock-free; returns the handle at
    /// most once.
    pub(crate) fn release_binding(&self) -> Option<ModuleHandle> {
        self.function.store(ptr::null_mut(), Ordering::Release);
        ModuleHandle::from_raw(self.handle.swap(ptr::null_mut(), Ordering::AcqRel))
    }
}
