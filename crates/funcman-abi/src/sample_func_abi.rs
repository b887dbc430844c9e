//! `sample_func`: built-in addition, overridable via the config file.

use std::ffi::c_int;

use funcman_cache::{OverrideDispatcher, ResolutionEntry};
use funcman_core::MisuseError;

use crate::macros::abi_fn;
use crate::registry::CACHE;

/// C signature shared by `sample_func` and any override of it.
pub type SampleFn = unsafe extern "C" fn(a: c_int, b: c_int, result: *mut c_int) -> c_int;

/// Resolution entry for `sample_func`.
pub static SAMPLE_FUNC: ResolutionEntry = ResolutionEntry::new("sample_func");

abi_fn! {
    /// Store `a + b` in `*result` and return 0, or delegate to the configured
    /// override and return its result verbatim.
    ///
    /// Returns -1 without touching anything when `result` is null.
    fn sample_func(a: c_int, b: c_int, result: *mut c_int) -> c_int {
        if result.is_null() {
            return MisuseError::NullOutput.return_code();
        }
        OverrideDispatcher::new(&CACHE).dispatch_or_default(
            &SAMPLE_FUNC,
            |f| {
                // SAFETY: an override of `sample_func` must export this
                // signature; `result` was checked non-null above.
                let f: SampleFn = f.cast();
                f(a, b, result)
            },
            || {
                // SAFETY: `result` is non-null; the caller vouches it is writable.
                *result = a.wrapping_add(b);
                0
            },
        )
    }
}
