//! Host-environment glue: where the override table lives, and logging that is
//! safe inside load/unload hooks.
//!
//! Config path resolution order:
//! 1. `FUNCMAN_CONFIG`, if set and non-empty, used verbatim.
//! 2. `<temp>/<basename>_extdef.txt`, where `<basename>` is this library's own
//!    file name without directory or extension (`/tmp` on Unix, `%TEMP%` on
//!    Windows).
//! 3. Nothing: every entry stays unconfigured.

use std::ffi::{CStr, OsString};
use std::path::PathBuf;

use funcman_core::{NamePolicy, naming};

/// Environment variable overriding the config path.
pub const CONFIG_ENV: &str = "FUNCMAN_CONFIG";
/// Environment variable selecting the over-length name policy.
pub const NAME_POLICY_ENV: &str = "FUNCMAN_NAME_POLICY";

/// Config path for this library in the current process.
#[must_use]
pub fn config_path() -> Option<PathBuf> {
    config_path_from(std::env::var_os(CONFIG_ENV), library_path().as_deref())
}

/// Config path from an explicit override and the library's on-disk path.
#[must_use]
pub fn config_path_from(
    env_override: Option<OsString>,
    library_path: Option<&str>,
) -> Option<PathBuf> {
    if let Some(path) = env_override.filter(|p| !p.is_empty()) {
        return Some(PathBuf::from(path));
    }
    let basename = naming::library_basename(library_path?)?;
    Some(temp_dir().join(naming::config_file_name(basename)))
}

/// Name policy requested via the environment; `Truncate` when unset.
#[must_use]
pub fn name_policy() -> NamePolicy {
    name_policy_from(std::env::var(NAME_POLICY_ENV).ok().as_deref())
}

/// Name policy for an optional `FUNCMAN_NAME_POLICY` value.
#[must_use]
pub fn name_policy_from(value: Option<&str>) -> NamePolicy {
    value.map(NamePolicy::from_str_loose).unwrap_or_default()
}

#[cfg(unix)]
fn temp_dir() -> PathBuf {
    PathBuf::from("/tmp")
}

#[cfg(windows)]
fn temp_dir() -> PathBuf {
    std::env::temp_dir()
}

/// Path of the module containing this code, as reported by the loader.
#[cfg(unix)]
#[must_use]
pub fn library_path() -> Option<String> {
    let mut info = std::mem::MaybeUninit::<libc::Dl_info>::zeroed();
    let anchor = library_path as *const () as *const libc::c_void;
    // SAFETY: `anchor` is an address inside this module; `info` is writable.
    let rc = unsafe { libc::dladdr(anchor, info.as_mut_ptr()) };
    if rc == 0 {
        return None;
    }
    // SAFETY: dladdr succeeded and filled `info`.
    let info = unsafe { info.assume_init() };
    if info.dli_fname.is_null() {
        return None;
    }
    // SAFETY: non-null `dli_fname` is a NUL-terminated string owned by the loader.
    let name = unsafe { CStr::from_ptr(info.dli_fname) };
    Some(name.to_string_lossy().into_owned())
}

/// Path of the module containing this code, as reported by the loader.
#[cfg(windows)]
#[must_use]
pub fn library_path() -> Option<String> {
    use windows_sys::Win32::Foundation::{HMODULE, MAX_PATH};
    use windows_sys::Win32::System::LibraryLoader::{
        GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS, GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
        GetModuleFileNameW, GetModuleHandleExW,
    };

    let mut module: HMODULE = std::ptr::null_mut();
    let anchor = library_path as *const () as *const u16;
    // SAFETY: FROM_ADDRESS interprets `anchor` as an address inside a module;
    // UNCHANGED_REFCOUNT means nothing needs to be released.
    let ok = unsafe {
        GetModuleHandleExW(
            GET_MODULE_HANDLE_EX_FLAG_FROM_ADDRESS | GET_MODULE_HANDLE_EX_FLAG_UNCHANGED_REFCOUNT,
            anchor,
            &mut module,
        )
    };
    if ok == 0 {
        return None;
    }
    let mut buf = vec![0u16; MAX_PATH as usize * 4];
    // SAFETY: `buf` is writable for `buf.len()` UTF-16 units.
    let len = unsafe { GetModuleFileNameW(module, buf.as_mut_ptr(), buf.len() as u32) } as usize;
    if len == 0 || len >= buf.len() {
        return None;
    }
    Some(String::from_utf16_lossy(&buf[..len]))
}

/// Log from a load/unload hook without touching stdio or locks.
#[cfg(unix)]
pub fn hook_log(msg: &CStr) {
    // SAFETY: both arguments are NUL-terminated; "%s" consumes exactly one.
    unsafe { libc::syslog(libc::LOG_INFO, c"%s".as_ptr(), msg.as_ptr()) };
}

/// Log from a load/unload hook without touching stdio or locks.
#[cfg(windows)]
pub fn hook_log(msg: &CStr) {
    use windows_sys::Win32::System::Diagnostics::Debug::OutputDebugStringA;
    // SAFETY: `msg` is NUL-terminated.
    unsafe { OutputDebugStringA(msg.as_ptr().cast::<u8>()) };
}
