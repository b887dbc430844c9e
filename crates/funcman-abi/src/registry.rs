//! Process-wide registry of this library's overridable functions.

use funcman_cache::{LifecycleManager, Registry, ResolutionCache, ResolutionEntry, SystemBinder};

use crate::sample_func_abi::SAMPLE_FUNC;

static ENTRIES: [&ResolutionEntry; 1] = [&SAMPLE_FUNC];

/// Every overridable function exported by this library.
pub static REGISTRY: Registry<'static> = Registry::from_slice(&ENTRIES);

/// Cache over the platform loader.
pub static CACHE: ResolutionCache<'static, SystemBinder> = ResolutionCache::new(SystemBinder::new());

/// Look up an entry by key.
#[must_use]
pub fn entry(key: &str) -> Option<&'static ResolutionEntry> {
    REGISTRY.find(key)
}

pub(crate) fn lifecycle() -> LifecycleManager<'static> {
    LifecycleManager::new().with_policy(crate::host::name_policy())
}
