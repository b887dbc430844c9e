//! Instrumented in-memory binder for tests.

use std::env::consts::{DLL_PREFIX, DLL_SUFFIX};
use std::ffi::c_void;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::Duration;

use funcman_core::{BindError, naming};

use crate::binder::{DynamicLibraryBinder, ModuleHandle, SymbolPtr};

const SLOT_BITS: u32 = 16;
const SLOT_MASK: usize = (1 << SLOT_BITS) - 1;

#[derive(Debug)]
struct FakeModule {
    file_name: String,
    symbols: Vec<(String, usize)>,
}

/// Binder over a fixed table of fake modules, counting every call.
///
/// Handles are synthetic: `(open serial << 16) | (module index + 1)`, so each
/// successful `open` yields a distinct, non-null handle that maps back to its
/// module.
#[derive(Debug, Default)]
pub struct RecordingBinder {
    modules: Vec<FakeModule>,
    open_delay: Option<Duration>,
    open_calls: AtomicU64,
    successful_opens: AtomicU64,
    resolve_calls: AtomicU64,
    close_calls: AtomicU64,
    serial: AtomicUsize,
}

impl RecordingBinder {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a loadable module for the extension-less `library_name`.
    #[must_use]
    pub fn with_module(mut self, library_name: &str) -> Self {
        self.module_index(library_name);
        self
    }

    /// Register `symbol` at `address` in `library_name`'s module.
    #[must_use]
    pub fn with_symbol(mut self, library_name: &str, symbol: &str, address: *const ()) -> Self {
        let idx = self.module_index(library_name);
        self.modules[idx]
            .symbols
            .push((symbol.to_owned(), address as usize));
        self
    }

    /// Sleep inside every `open`, widening race windows.
    #[must_use]
    pub fn with_open_delay(mut self, delay: Duration) -> Self {
        self.open_delay = Some(delay);
        self
    }

    #[must_use]
    pub fn open_calls(&self) -> u64 {
        self.open_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn successful_opens(&self) -> u64 {
        self.successful_opens.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn resolve_calls(&self) -> u64 {
        self.resolve_calls.load(Ordering::SeqCst)
    }

    #[must_use]
    pub fn close_calls(&self) -> u64 {
        self.close_calls.load(Ordering::SeqCst)
    }

    /// Successful opens not yet matched by a close.
    #[must_use]
    pub fn live_handles(&self) -> u64 {
        self.successful_opens()
            .saturating_sub(self.close_calls())
    }

    fn module_index(&mut self, library_name: &str) -> usize {
        let file_name = naming::module_file_name(library_name)
            .unwrap_or_else(|_| format!("{library_name}{}", naming::MODULE_SUFFIX));
        if let Some(idx) = self.modules.iter().position(|m| m.file_name == file_name) {
            return idx;
        }
        assert!(self.modules.len() < SLOT_MASK, "too many fake modules");
        self.modules.push(FakeModule {
            file_name,
            symbols: Vec::new(),
        });
        self.modules.len() - 1
    }

    fn module_for(&self, handle: ModuleHandle) -> Option<&FakeModule> {
        let slot = handle.as_ptr() as usize & SLOT_MASK;
        slot.checked_sub(1).and_then(|idx| self.modules.get(idx))
    }
}

impl DynamicLibraryBinder for RecordingBinder {
    fn open(&self, file_name: &str) -> Result<ModuleHandle, BindError> {
        self.open_calls.fetch_add(1, Ordering::SeqCst);
        if let Some(delay) = self.open_delay {
            std::thread::sleep(delay);
        }
        let idx = self
            .modules
            .iter()
            .position(|m| m.file_name == file_name)
            .ok_or(BindError::ModuleNotFound)?;
        let serial = self.serial.fetch_add(1, Ordering::SeqCst) + 1;
        let raw = (serial << SLOT_BITS) | (idx + 1);
        self.successful_opens.fetch_add(1, Ordering::SeqCst);
        ModuleHandle::from_raw(raw as *mut c_void).ok_or(BindError::ModuleNotFound)
    }

    fn resolve(&self, handle: ModuleHandle, symbol: &str) -> Result<SymbolPtr, BindError> {
        self.resolve_calls.fetch_add(1, Ordering::SeqCst);
        let module = self.module_for(handle).ok_or(BindError::SymbolNotFound)?;
        module
            .symbols
            .iter()
            .find(|(name, _)| name == symbol)
            .and_then(|&(_, address)| SymbolPtr::from_raw(address as *mut c_void))
            .ok_or(BindError::SymbolNotFound)
    }

    fn close(&self, _handle: ModuleHandle) {
        self.close_calls.fetch_add(1, Ordering::SeqCst);
    }
}

/// Shared object cargo built for workspace crate `crate_name` (underscored),
/// found next to the running test binary.
///
/// Looks in the profile directory first (`target/<profile>/libX.so`), then in
/// `deps/` where dependency artifacts carry a hash suffix. The newest match
/// wins.
#[must_use]
pub fn built_shared_object(crate_name: &str) -> Option<PathBuf> {
    let exe = std::env::current_exe().ok()?;
    let deps = exe.parent()?;
    let exact = format!("{DLL_PREFIX}{crate_name}{DLL_SUFFIX}");
    let hashed = format!("{DLL_PREFIX}{crate_name}-");

    for dir in [deps.parent(), Some(deps)].into_iter().flatten() {
        let Ok(read) = std::fs::read_dir(dir) else {
            continue;
        };
        let newest = read
            .flatten()
            .filter(|e| {
                let name = e.file_name();
                let name = name.to_string_lossy();
                name == exact || (name.starts_with(&hashed) && name.ends_with(DLL_SUFFIX))
            })
            .filter_map(|e| Some((e.metadata().ok()?.modified().ok()?, e.path())))
            .max_by_key(|(modified, _)| *modified);
        if let Some((_, path)) = newest {
            return Some(path);
        }
    }
    None
}

/// Extension-less library name for `path`, as written in an override table.
#[must_use]
pub fn library_name_of(path: &Path) -> Option<String> {
    path.to_str()?.strip_suffix(DLL_SUFFIX).map(str::to_owned)
}
