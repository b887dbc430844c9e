//! Load/unload hooks and registry introspection exports.
//!
//! With the `host-hooks` feature the platform runs [`on_load`] / [`on_unload`]
//! automatically (ELF `.init_array`/`.fini_array`, or `DllMain`). Without it
//! the embedding application calls `funcman_on_load` / `funcman_on_unload`.
//! Either way each runs at most once per process.

use std::ffi::{CStr, c_char, c_int};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU8, Ordering};

use funcman_cache::{DynamicLibraryBinder, InitReport, LifecycleManager, Registry};

use crate::host;
use crate::macros::abi_fn;
use crate::registry::{CACHE, REGISTRY, entry, lifecycle};

const IDLE: u8 = 0;
const LOADED: u8 = 1;
const UNLOADED: u8 = 2;

/// One-way `IDLE -> LOADED -> UNLOADED` cell gating the hooks.
#[derive(Debug)]
pub struct HookPhase(AtomicU8);

impl Default for HookPhase {
    fn default() -> Self {
        Self::new()
    }
}

impl HookPhase {
    #[must_use]
    pub const fn new() -> Self {
        Self(AtomicU8::new(IDLE))
    }

    /// Claim the load transition. True for exactly one caller, and only
    /// before any unload.
    pub fn enter_loaded(&self) -> bool {
        self.0
            .compare_exchange(IDLE, LOADED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Claim the unload transition. True for exactly one caller, and only
    /// after a load.
    pub fn enter_unloaded(&self) -> bool {
        self.0
            .compare_exchange(LOADED, UNLOADED, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }
}

static PHASE: HookPhase = HookPhase::new();

/// Apply the override table. Binds nothing.
pub fn on_load() {
    load_hook(&PHASE, &REGISTRY, &lifecycle(), host::config_path);
}

/// Close every bound override module. Takes no entry locks.
pub fn on_unload() {
    unload_hook(&PHASE, &REGISTRY, CACHE.binder());
}

/// Body of the load hook. `None` when `phase` has already left `IDLE` (the
/// config is not read) or the registry is invalid.
pub fn load_hook(
    phase: &HookPhase,
    registry: &Registry<'_>,
    manager: &LifecycleManager<'_>,
    config_path: impl FnOnce() -> Option<PathBuf>,
) -> Option<InitReport> {
    if !phase.enter_loaded() {
        return None;
    }
    host::hook_log(c"base: onLoad called");
    let path = config_path();
    match manager.init(registry, path.as_deref()) {
        Ok(report) => Some(report),
        Err(_) => {
            host::hook_log(c"base: duplicate registry key, overrides disabled");
            None
        }
    }
}

/// Body of the unload hook. Returns the number of modules closed, or `None`
/// when `phase` is not `LOADED`.
pub fn unload_hook<B: DynamicLibraryBinder + ?Sized>(
    phase: &HookPhase,
    registry: &Registry<'_>,
    binder: &B,
) -> Option<usize> {
    if !phase.enter_unloaded() {
        return None;
    }
    host::hook_log(c"base: onUnload called");
    Some(LifecycleManager::new().dispose(registry, binder))
}

abi_fn! {
    /// Run the load hook manually (no-op after the first call).
    fn funcman_on_load() {
        on_load();
    }
}

abi_fn! {
    /// Run the unload hook manually (no-op unless loaded, and after the first call).
    fn funcman_on_unload() {
        on_unload();
    }
}

abi_fn! {
    /// Resolve every entry, print one line per entry to stdout, and return -1
    /// if any entry has no working override, else 0.
    fn funcman_info() -> c_int {
        let report = funcman_cache::info(&CACHE, &REGISTRY);
        print!("{}", report.render_text());
        report.return_code()
    }
}

abi_fn! {
    /// 1 if `key` resolves to an override, 0 if it uses the built-in default,
    /// -1 for a null or unknown key.
    fn funcman_is_overridden(key: *const c_char) -> c_int {
        if key.is_null() {
            return -1;
        }
        // SAFETY: caller passes a NUL-terminated string.
        let key = CStr::from_ptr(key);
        match key.to_str().ok().and_then(entry) {
            Some(e) => c_int::from(CACHE.is_overridden(e)),
            None => -1,
        }
    }
}

#[cfg(all(target_os = "linux", feature = "host-hooks", not(test)))]
mod elf_hooks {
    extern "C" fn run_on_load() {
        super::on_load();
    }

    extern "C" fn run_on_unload() {
        super::on_unload();
    }

    #[used]
    #[unsafe(link_section = ".init_array")]
    static ON_LOAD: extern "C" fn() = run_on_load;

    #[used]
    #[unsafe(link_section = ".fini_array")]
    static ON_UNLOAD: extern "C" fn() = run_on_unload;
}

#[cfg(all(windows, feature = "host-hooks", not(test)))]
mod dll_main {
    use std::ffi::c_void;

    use windows_sys::Win32::Foundation::{HMODULE, TRUE};
    use windows_sys::Win32::System::SystemServices::{DLL_PROCESS_ATTACH, DLL_PROCESS_DETACH};

    #[unsafe(no_mangle)]
    #[allow(non_snake_case)]
    pub extern "system" fn DllMain(_module: HMODULE, reason: u32, _reserved: *mut c_void) -> i32 {
        match reason {
            DLL_PROCESS_ATTACH => super::on_load(),
            DLL_PROCESS_DETACH => super::on_unload(),
            _ => {}
        }
        TRUE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use funcman_cache::testing::RecordingBinder;
    use funcman_cache::{ResolutionCache, ResolutionEntry};

    extern "C" fn mul(a: c_int, b: c_int) -> c_int {
        a * b
    }

    struct TempConfig(PathBuf);

    impl TempConfig {
        fn new(tag: &str, content: &str) -> Self {
            let path = std::env::temp_dir().join(format!(
                "funcman-abi-{tag}-{}_extdef.txt",
                std::process::id()
            ));
            std::fs::write(&path, content).unwrap();
            Self(path)
        }

        fn rewrite(&self, content: &str) {
            std::fs::write(&self.0, content).unwrap();
        }
    }

    impl Drop for TempConfig {
        fn drop(&mut self) {
            let _ = std::fs::remove_file(&self.0);
        }
    }

    #[test]
    fn phase_moves_one_way() {
        let phase = HookPhase::new();
        assert!(!phase.enter_unloaded());
        assert!(phase.enter_loaded());
        assert!(!phase.enter_loaded());
        assert!(phase.enter_unloaded());
        assert!(!phase.enter_unloaded());
        assert!(!phase.enter_loaded());
    }

    #[test]
    fn unload_before_load_is_a_no_op() {
        let phase = HookPhase::new();
        let entry = ResolutionEntry::with_key("sample_func");
        let entries = [&entry];
        let registry = Registry::new(&entries).unwrap();
        let binder = RecordingBinder::new();

        assert_eq!(unload_hook(&phase, &registry, &binder), None);
        assert_eq!(binder.close_calls(), 0);

        // Load still works afterwards.
        let report = load_hook(&phase, &registry, &LifecycleManager::new(), || None);
        assert_eq!(report, Some(InitReport::ConfigMissing));
    }

    #[test]
    fn second_load_does_not_reapply_config() {
        let config = TempConfig::new("reload", "sample_func libfirst first\n");
        let phase = HookPhase::new();
        let entry = ResolutionEntry::with_key("sample_func");
        let entries = [&entry];
        let registry = Registry::new(&entries).unwrap();
        let manager = LifecycleManager::new();

        let first = load_hook(&phase, &registry, &manager, || Some(config.0.clone()));
        assert_eq!(first.map(|r| r.configured()), Some(1));

        config.rewrite("sample_func libsecond second\n");
        let mut read_again = false;
        let second = load_hook(&phase, &registry, &manager, || {
            read_again = true;
            Some(config.0.clone())
        });
        assert_eq!(second, None);
        assert!(!read_again);
        assert_eq!(entry.names().library_name, "libfirst");
        assert_eq!(entry.names().symbol_name, "first");
    }

    #[test]
    fn second_unload_closes_nothing() {
        let config = TempConfig::new("unload", "sample_func libmul mul\n");
        let phase = HookPhase::new();
        let entry = ResolutionEntry::with_key("sample_func");
        let entries = [&entry];
        let registry = Registry::new(&entries).unwrap();
        let cache = ResolutionCache::new(RecordingBinder::new().with_symbol(
            "libmul",
            "mul",
            mul as *const (),
        ));

        load_hook(&phase, &registry, &LifecycleManager::new(), || {
            Some(config.0.clone())
        });
        assert!(cache.is_overridden(&entry));

        assert_eq!(unload_hook(&phase, &registry, cache.binder()), Some(1));
        assert_eq!(unload_hook(&phase, &registry, cache.binder()), None);
        assert_eq!(cache.binder().close_calls(), 1);
        assert_eq!(cache.binder().live_handles(), 0);
    }

    #[test]
    fn null_key_is_rejected() {
        // SAFETY: null is handled before any dereference.
        assert_eq!(unsafe { funcman_is_overridden(std::ptr::null()) }, -1);
    }

    #[test]
    fn unknown_key_is_rejected() {
        // SAFETY: literal is NUL-terminated.
        assert_eq!(unsafe { funcman_is_overridden(c"no_such_func".as_ptr()) }, -1);
    }
}
