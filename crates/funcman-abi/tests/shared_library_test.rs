//! The built host library, loaded through `dlopen` with an override table in
//! place: the load hook reads `/tmp/<basename>_extdef.txt` and `sample_func`
//! dispatches to the override module.
#![cfg(target_os = "linux")]

use std::ffi::{CString, c_char, c_int, c_void};
use std::path::PathBuf;

use funcman_cache::testing::{built_shared_object, library_name_of};
use funcman_core::naming;

type SampleFn = unsafe extern "C" fn(c_int, c_int, *mut c_int) -> c_int;
type IsOverriddenFn = unsafe extern "C" fn(*const c_char) -> c_int;

struct TempConfig(PathBuf);

impl Drop for TempConfig {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

struct Library(*mut c_void);

impl Library {
    fn open(path: &str) -> Self {
        let c_path = CString::new(path).unwrap();
        // SAFETY: `c_path` is NUL-terminated.
        let handle = unsafe { libc::dlopen(c_path.as_ptr(), libc::RTLD_NOW | libc::RTLD_LOCAL) };
        assert!(!handle.is_null(), "dlopen {path} failed");
        Self(handle)
    }

    fn symbol(&self, name: &std::ffi::CStr) -> *mut c_void {
        // SAFETY: `self.0` is a live handle; `name` is NUL-terminated.
        let sym = unsafe { libc::dlsym(self.0, name.as_ptr()) };
        assert!(!sym.is_null(), "{name:?} not exported");
        sym
    }
}

impl Drop for Library {
    fn drop(&mut self) {
        // SAFETY: handle from a successful dlopen, closed once.
        unsafe { libc::dlclose(self.0) };
    }
}

#[test]
fn load_hook_applies_table_and_sample_func_uses_override() {
    let host = built_shared_object("funcman_abi").expect("funcman-abi cdylib is built");
    let host = host.to_str().expect("UTF-8 path").to_owned();
    let target = built_shared_object("funcman_override").expect("funcman-override is built");
    let target = library_name_of(&target).expect("UTF-8 path");

    let basename = naming::library_basename(&host).expect("host has a file name");
    let config = TempConfig(PathBuf::from("/tmp").join(naming::config_file_name(basename)));
    std::fs::write(&config.0, format!("sample_func {target} override_func\n")).unwrap();

    let library = Library::open(&host);
    // SAFETY: exported with exactly these signatures.
    let sample_func: SampleFn = unsafe { std::mem::transmute(library.symbol(c"sample_func")) };
    let is_overridden: IsOverriddenFn =
        unsafe { std::mem::transmute(library.symbol(c"funcman_is_overridden")) };

    let mut out: c_int = 0;
    // SAFETY: `out` is writable.
    let rc = unsafe { sample_func(1, 2, &mut out) };
    assert_eq!((rc, out), (0, 2));
    // SAFETY: as above.
    let rc = unsafe { sample_func(6, 7, &mut out) };
    assert_eq!((rc, out), (0, 42));
    // SAFETY: literal is NUL-terminated.
    assert_eq!(unsafe { is_overridden(c"sample_func".as_ptr()) }, 1);
    // SAFETY: null output is rejected before any write.
    assert_eq!(unsafe { sample_func(1, 2, std::ptr::null_mut()) }, -1);
}
