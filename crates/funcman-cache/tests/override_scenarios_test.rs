//! End-to-end override scenarios over an instrumented binder.

use std::path::{Path, PathBuf};
use std::sync::Barrier;
use std::time::Duration;

use funcman_cache::testing::RecordingBinder;
use funcman_cache::{
    InitReport, LifecycleManager, OverrideDispatcher, Registry, ResolutionCache, ResolutionEntry,
    SymbolPtr,
};
use funcman_core::{BindError, ResolveState};

type SampleFn = extern "C" fn(i32, i32) -> i32;

extern "C" fn override_func(a: i32, b: i32) -> i32 {
    a * b
}

fn overrides() -> RecordingBinder {
    RecordingBinder::new().with_symbol("liboverride", "override_func", override_func as *const ())
}

struct TempConfig(PathBuf);

impl TempConfig {
    fn new(tag: &str, content: &str) -> Self {
        let path = std::env::temp_dir().join(format!(
            "funcman-cache-{tag}-{}_extdef.txt",
            std::process::id()
        ));
        std::fs::write(&path, content).unwrap();
        Self(path)
    }

    fn path(&self) -> &Path {
        &self.0
    }
}

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

fn call_override(f: SymbolPtr, a: i32, b: i32) -> i32 {
    // SAFETY: the only symbol registered with the test binder is `override_func`.
    let f: SampleFn = unsafe { f.cast() };
    f(a, b)
}

fn sample_func(
    dispatcher: &OverrideDispatcher<'_, '_, RecordingBinder>,
    entry: &ResolutionEntry,
    a: i32,
    b: i32,
) -> i32 {
    dispatcher.dispatch_or_default(entry, |f| call_override(f, a, b), || a + b)
}

#[test]
fn no_config_file_uses_default_and_never_binds() {
    let entry = ResolutionEntry::with_key("sample_func");
    let entries = [&entry];
    let registry = Registry::new(&entries).unwrap();
    let report = LifecycleManager::new()
        .init(&registry, Some(Path::new("/nonexistent/funcman_extdef.txt")))
        .unwrap();
    assert_eq!(report, InitReport::ConfigMissing);

    let cache = ResolutionCache::new(overrides());
    let dispatcher = OverrideDispatcher::new(&cache);
    assert_eq!(sample_func(&dispatcher, &entry, 1, 2), 3);
    assert_eq!(cache.binder().open_calls(), 0);
    assert_eq!(cache.binder().resolve_calls(), 0);
}

#[test]
fn configured_override_is_bound_once() {
    let cfg = TempConfig::new("bound", "sample_func liboverride override_func\n");
    let entry = ResolutionEntry::with_key("sample_func");
    let entries = [&entry];
    let registry = Registry::new(&entries).unwrap();
    let report = LifecycleManager::new()
        .init(&registry, Some(cfg.path()))
        .unwrap();
    assert_eq!(report.configured(), 1);

    let cache = ResolutionCache::new(overrides());
    let dispatcher = OverrideDispatcher::new(&cache);
    for _ in 0..10 {
        assert_eq!(sample_func(&dispatcher, &entry, 1, 2), 2);
    }
    assert_eq!(sample_func(&dispatcher, &entry, 6, 7), 42);
    assert_eq!(cache.binder().open_calls(), 1);
    assert_eq!(entry.state(), ResolveState::ResolvedOk);
}

#[test]
fn broken_override_fails_open_and_records_failure() {
    let cfg = TempConfig::new("broken", "sample_func nosuchlib nosuchfunc\n");
    let entry = ResolutionEntry::with_key("sample_func");
    let entries = [&entry];
    let registry = Registry::new(&entries).unwrap();
    LifecycleManager::new()
        .init(&registry, Some(cfg.path()))
        .unwrap();

    let cache = ResolutionCache::new(overrides());
    let dispatcher = OverrideDispatcher::new(&cache);
    assert_eq!(sample_func(&dispatcher, &entry, 1, 2), 3);
    assert_eq!(sample_func(&dispatcher, &entry, 1, 2), 3);
    assert_eq!(
        entry.state(),
        ResolveState::ResolvedFailed(BindError::ModuleNotFound)
    );
    assert_eq!(cache.binder().open_calls(), 1);
}

#[test]
fn concurrent_first_calls_bind_exactly_once() {
    const THREADS: usize = 8;

    let entry = ResolutionEntry::with_key("sample_func");
    entry.configure("liboverride", "override_func");
    let cache = ResolutionCache::new(overrides().with_open_delay(Duration::from_millis(20)));
    let dispatcher = OverrideDispatcher::new(&cache);
    let barrier = Barrier::new(THREADS);

    let results: Vec<(i32, Option<SymbolPtr>)> = std::thread::scope(|s| {
        let handles: Vec<_> = (0..THREADS)
            .map(|_| {
                s.spawn(|| {
                    barrier.wait();
                    (sample_func(&dispatcher, &entry, 1, 2), cache.get(&entry))
                })
            })
            .collect();
        handles.into_iter().map(|h| h.join().unwrap()).collect()
    });

    assert!(results.iter().all(|&(value, _)| value == 2));
    let first_ptr = results[0].1;
    assert!(first_ptr.is_some());
    assert!(results.iter().all(|&(_, ptr)| ptr == first_ptr));
    assert_eq!(cache.binder().open_calls(), 1);
    assert_eq!(cache.binder().resolve_calls(), 1);
}

#[test]
fn concurrent_first_calls_on_broken_entry_fail_once() {
    const THREADS: usize = 6;

    let entry = ResolutionEntry::with_key("sample_func");
    entry.configure("nosuchlib", "nosuchfunc");
    let cache = ResolutionCache::new(overrides().with_open_delay(Duration::from_millis(20)));
    let barrier = Barrier::new(THREADS);

    std::thread::scope(|s| {
        for _ in 0..THREADS {
            s.spawn(|| {
                barrier.wait();
                assert!(cache.get(&entry).is_none());
            });
        }
    });
    assert_eq!(cache.binder().open_calls(), 1);
    assert_eq!(
        entry.state(),
        ResolveState::ResolvedFailed(BindError::ModuleNotFound)
    );
}

#[test]
fn comments_blank_and_malformed_lines_leave_entries_untouched() {
    let cfg = TempConfig::new("malformed", "# just a comment\n\nfoo bar\n");
    let sample = ResolutionEntry::with_key("sample_func");
    let other = ResolutionEntry::with_key("foo");
    let entries = [&sample, &other];
    let registry = Registry::new(&entries).unwrap();
    let report = LifecycleManager::new()
        .init(&registry, Some(cfg.path()))
        .unwrap();
    assert_eq!(
        report,
        InitReport::Configured {
            configured: 0,
            unknown_keys: 0,
            skipped_lines: 1,
        }
    );
    for entry in registry.iter() {
        assert_eq!(entry.state(), ResolveState::Unresolved);
        assert!(!entry.names().is_configured());
    }
}

#[test]
fn unknown_keys_are_ignored() {
    let cfg = TempConfig::new("unknown", "not_a_func liboverride override_func\n");
    let entry = ResolutionEntry::with_key("sample_func");
    let entries = [&entry];
    let registry = Registry::new(&entries).unwrap();
    let report = LifecycleManager::new()
        .init(&registry, Some(cfg.path()))
        .unwrap();
    assert_eq!(report.configured(), 0);
    assert!(!entry.names().is_configured());
}

#[test]
fn dispose_closes_every_opened_module() {
    let a = ResolutionEntry::with_key("a");
    let b = ResolutionEntry::with_key("b");
    let missing_sym = ResolutionEntry::with_key("c");
    let unset = ResolutionEntry::with_key("d");
    a.configure("liboverride", "override_func");
    b.configure("liboverride", "override_func");
    missing_sym.configure("liboverride", "nope");
    let entries = [&a, &b, &missing_sym, &unset];
    let registry = Registry::new(&entries).unwrap();

    let cache = ResolutionCache::new(overrides());
    assert_eq!(cache.resolve_all(&registry), 2);
    assert_eq!(cache.binder().successful_opens(), 3);

    let manager = LifecycleManager::new();
    assert_eq!(manager.dispose(&registry, cache.binder()), 2);
    assert_eq!(cache.binder().close_calls(), cache.binder().successful_opens());
    assert_eq!(cache.binder().live_handles(), 0);

    // Second dispose finds nothing left to close.
    assert_eq!(manager.dispose(&registry, cache.binder()), 0);
    assert_eq!(cache.binder().close_calls(), 3);

    // Terminal state survives teardown; calls after unload take the default.
    assert_eq!(a.state(), ResolveState::ResolvedOk);
    assert!(cache.get(&a).is_none());
    let dispatcher = OverrideDispatcher::new(&cache);
    assert_eq!(sample_func(&dispatcher, &a, 1, 2), 3);
}

#[test]
fn repeated_gets_are_identical_across_threads() {
    let entry = ResolutionEntry::with_key("sample_func");
    entry.configure("liboverride", "override_func");
    let cache = ResolutionCache::new(overrides());
    let first = cache.get(&entry);
    std::thread::scope(|s| {
        for _ in 0..4 {
            s.spawn(|| {
                for _ in 0..100 {
                    assert_eq!(cache.get(&entry), first);
                }
            });
        }
    });
    assert_eq!(cache.binder().open_calls(), 1);
}
