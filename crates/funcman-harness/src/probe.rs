//! Run the full init -> resolve -> dispose cycle against a config file.

use std::path::Path;

use funcman_cache::{
    DynamicLibraryBinder, EntrySnapshot, InitReport, LifecycleManager, Registry, RegistryError,
    ResolutionCache, ResolutionEntry, ResolutionObserver,
};
use funcman_core::NamePolicy;
use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no keys to probe")]
    NoKeys,
    #[error(transparent)]
    Registry(#[from] RegistryError),
}

/// What a probe run observed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProbeReport {
    pub init: InitReport,
    /// Entry states after forced resolution, before teardown.
    pub entries: Vec<EntrySnapshot>,
    pub any_failed: bool,
    /// Module handles closed by teardown.
    pub closed: usize,
}

/// Probe settings.
#[derive(Clone, Copy, Default)]
pub struct ProbeOptions<'o> {
    pub policy: NamePolicy,
    pub observer: Option<&'o dyn ResolutionObserver>,
}

/// Register `keys`, apply `config`, resolve every entry through `binder`,
/// snapshot, then dispose.
pub fn probe<B: DynamicLibraryBinder>(
    binder: B,
    config: &Path,
    keys: &[String],
    options: ProbeOptions<'_>,
) -> Result<ProbeReport, ProbeError> {
    if keys.is_empty() {
        return Err(ProbeError::NoKeys);
    }
    let entries: Vec<ResolutionEntry> = keys
        .iter()
        .map(|k| ResolutionEntry::with_key(k.as_str()))
        .collect();
    let refs: Vec<&ResolutionEntry> = entries.iter().collect();
    let registry = Registry::new(&refs)?;

    let mut manager = LifecycleManager::new().with_policy(options.policy);
    let cache = match options.observer {
        Some(observer) => {
            manager = manager.with_observer(observer);
            ResolutionCache::with_observer(binder, observer)
        }
        None => ResolutionCache::new(binder),
    };

    let init = manager.init(&registry, Some(config))?;
    let info = funcman_cache::info(&cache, &registry);
    let closed = manager.dispose(&registry, cache.binder());

    Ok(ProbeReport {
        init,
        entries: info.entries,
        any_failed: info.any_failed,
        closed,
    })
}
