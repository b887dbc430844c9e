//! Lazy, thread-safe override resolution.
//!
//! A [`ResolutionEntry`] names one overridable function. On first use the
//! [`ResolutionCache`] opens the configured module and looks up the configured
//! symbol through a [`DynamicLibraryBinder`], then caches the outcome (success
//! or failure) for the life of the process. [`LifecycleManager`] applies the
//! override table on load and closes modules on unload; an
//! [`OverrideDispatcher`] calls the override when present and a built-in
//! default otherwise.
//!
//! ```text
//! load hook ── LifecycleManager::init ── OverrideTable ──> entries (names)
//! caller    ── OverrideDispatcher ── ResolutionCache::get ──> binder.open/resolve (once)
//! unload    ── LifecycleManager::dispose ──> binder.close (lock-free)
//! ```

pub mod binder;
pub mod cache;
pub mod dispatch;
pub mod entry;
pub mod lifecycle;
pub mod observe;
pub mod registry;
pub mod report;
#[cfg(any(test, feature = "test-support"))]
pub mod testing;

pub use binder::{DynamicLibraryBinder, ModuleHandle, SymbolPtr, SystemBinder};
pub use cache::ResolutionCache;
pub use dispatch::{DispatchError, FallbackPolicy, OverrideDispatcher};
pub use entry::{OverrideNames, ResolutionEntry};
pub use lifecycle::{InitReport, LifecycleManager};
pub use observe::{ResolutionEvent, ResolutionObserver, ResolutionStats, StatsSnapshot};
pub use registry::{Registry, RegistryError};
pub use report::{EntrySnapshot, RegistryReport, info};
