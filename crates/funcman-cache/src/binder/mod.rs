//! Dynamic library binding capability.
//!
//! The cache never calls the platform loader directly; it goes through a
//! [`DynamicLibraryBinder`]. [`SystemBinder`] is the per-OS implementation,
//! selected at build time (`dlopen` family on Unix, `LoadLibraryA` family on
//! Windows).

use std::ffi::c_void;
use std::ptr::NonNull;

use funcman_core::BindError;

#[cfg(unix)]
mod unix;
#[cfg(windows)]
mod windows;

#[cfg(unix)]
pub use unix::SystemBinder;
#[cfg(windows)]
pub use windows::SystemBinder;

/// Opaque handle to a loaded module. Never null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ModuleHandle(NonNull<c_void>);

// SAFETY: module handles are process-wide loader tokens, not thread-bound.
unsafe impl Send for ModuleHandle {}
unsafe impl Sync for ModuleHandle {}

impl ModuleHandle {
    /// Wrap a raw loader handle; `None` for null.
    #[must_use]
    pub fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }
}

/// Address of a resolved symbol. Never null.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SymbolPtr(NonNull<c_void>);

// SAFETY: a code address is valid from any thread while its module is loaded.
unsafe impl Send for SymbolPtr {}
unsafe impl Sync for SymbolPtr {}

impl SymbolPtr {
    /// Wrap a raw symbol address; `None` for null.
    #[must_use]
    pub fn from_raw(raw: *mut c_void) -> Option<Self> {
        NonNull::new(raw).map(Self)
    }

    #[must_use]
    pub fn as_ptr(self) -> *mut c_void {
        self.0.as_ptr()
    }

    /// Reinterpret the address as a typed function pointer.
    ///
    /// # Safety
    ///
    /// - `F` must be a function pointer type whose signature and ABI match the
    ///   exported symbol. The cache does not verify this.
    /// - The owning module must stay loaded for as long as the returned
    ///   pointer is called.
    #[must_use]
    pub unsafe fn cast<F: Copy>(self) -> F {
        debug_assert_eq!(
            std::mem::size_of::<F>(),
            std::mem::size_of::<*mut c_void>(),
            "SymbolPtr::cast target must be pointer-sized"
        );
        let raw = self.as_ptr();
        // SAFETY: size equality checked above; the caller vouches for the type.
        unsafe { std::mem::transmute_copy::<*mut c_void, F>(&raw) }
    }
}

/// Open / resolve / close over a platform module loader.
///
/// All calls are synchronous; failure is immediate and final for that attempt.
/// No retries.
pub trait DynamicLibraryBinder: Send + Sync {
    /// Load the module `file_name` (already carrying the platform suffix).
    fn open(&self, file_name: &str) -> Result<ModuleHandle, BindError>;

    /// Look up `symbol` in `handle`.
    fn resolve(&self, handle: ModuleHandle, symbol: &str) -> Result<SymbolPtr, BindError>;

    /// Release `handle`.
    ///
    /// Called from unload context: implementations must not take locks or call
    /// back into the loader beyond the release itself.
    fn close(&self, handle: ModuleHandle);
}

impl<B: DynamicLibraryBinder + ?Sized> DynamicLibraryBinder for &B {
    fn open(&self, file_name: &str) -> Result<ModuleHandle, BindError> {
        (**self).open(file_name)
    }

    fn resolve(&self, handle: ModuleHandle, symbol: &str) -> Result<SymbolPtr, BindError> {
        (**self).resolve(handle, symbol)
    }

    fn close(&self, handle: ModuleHandle) {
        (**self).close(handle);
    }
}
