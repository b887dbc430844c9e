//! `LoadLibraryA` / `GetProcAddress` / `FreeLibrary` binder.

use std::ffi::{CString, c_void};

use funcman_core::BindError;
use windows_sys::Win32::Foundation::FreeLibrary;
use windows_sys::Win32::System::LibraryLoader::{GetProcAddress, LoadLibraryA};

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
        // SAFETY: `c_name` is a valid NUL-terminated ANSI string for the call.
        let raw = unsafe { LoadLibraryA(c_name.as_ptr().cast::<u8>()) };
        ModuleHandle::from_raw(raw).ok_or(BindError::ModuleNotFound)
    }

    fn resolve(&self, handle: ModuleHandle, symbol: &str) -> Result<SymbolPtr, BindError> {
        let c_symbol = CString::new(symbol).map_err(|_| BindError::SymbolNotFound)?;
        // SAFETY: `handle` came from LoadLibraryA and has not been freed.
        let proc = unsafe { GetProcAddress(handle.as_ptr(), c_symbol.as_ptr().cast::<u8>()) };
        proc.and_then(|f| SymbolPtr::from_raw(f as *mut c_void))
            .ok_or(BindError::SymbolNotFound)
    }

    fn close(&self, handle: ModuleHandle) {
        // SAFETY: the caller hands over ownership of a live handle exactly once.
        unsafe { FreeLibrary(handle.as_ptr()) };
    }
}
