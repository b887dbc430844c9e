#![allow(clippy::missing_safety_doc)]
//! Override module for `sample_func`.
//!
//! Built as `libfuncman_override.so` (`funcman_override.dll` on Windows). To
//! activate it, put the directory on the loader search path and add to the
//! host's override table:
//!
//! ```text
//! sample_func  libfuncman_override  override_func
//! ```

use std::ffi::c_int;

/// Store `a * b` in `*result` and return 0. Returns -1 when `result` is null.
#[unsafe(no_mangle)]
pub unsafe extern "C" fn override_func(a: c_int, b: c_int, result: *mut c_int) -> c_int {
    if result.is_null() {
        return -1;
    }
    // SAFETY: non-null; the caller vouches it is writable.
    unsafe { *result = a.wrapping_mul(b) };
    0
}
