//! `dlopen` / `dlsym` / `dlclose` binder.

use std::ffi::CString;

use funcman_core::BindError;

use super::{DynamicLibraryBinder, ModuleHandle, SymbolPtr};

/// Platform loader binder. Stateless.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemBinder;

impl SystemBinder {
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl DynamicLibraryBinder for SystemBinder {
    fn open(&self, file_name: &str) -> Result<ModuleHandle, BindError> {
        let c_name = CString::new(file_name).map_err(|_| BindError::ModuleNotFound)?;
        // SAFETY: `c_name` is a valid NUL-terminated string for the call.
        let raw = unsafe { libc::dlopen(c_name.as_ptr(), libc::RTLD_LAZY) };
        ModuleHandle::from_raw(raw).ok_or(BindError::ModuleNotFound)
    }

    fn resolve(&self, handle: ModuleHandle, symbol: &str) -> Result<SymbolPtr, BindError> {
        let c_symbol = CString::new(symbol).map_err(|_| BindError::SymbolNotFound)?;
        // SAFETY: `handle` came from a successful dlopen and has not been closed;
        // `c_symbol` is NUL-terminated.
        let raw = unsafe { libc::dlsym(handle.as_ptr(), c_symbol.as_ptr()) };
        SymbolPtr::from_raw(raw).ok_or(BindError::SymbolNotFound)
    }

    fn close(&self, handle: ModuleHandle) {
        // SAFETY: the caller hands over ownership of a live handle exactly once.
        unsafe { libc::dlclose(handle.as_ptr()) };
    }
}
