//! Export helpers.

/// Define an unmangled `extern "C"` export whose body runs in an unsafe
/// context.
///
/// ```ignore
/// abi_fn! {
///     /// Docs.
///     fn my_export(out: *mut c_int) -> c_int {
///         if out.is_null() { return -1; }
///         *out = 1;
///         0
///     }
/// }
/// ```
macro_rules! abi_fn {
    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? ) -> $ret:ty
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) -> $ret {
            unsafe { $body }
        }
    };

    (
        $(#[$meta:meta])*
        fn $name:ident( $($arg:ident : $argty:ty),* $(,)? )
        $body:block
    ) => {
        $(#[$meta])*
        #[unsafe(no_mangle)]
        #[allow(unused_unsafe)]
        pub unsafe extern "C" fn $name( $($arg : $argty),* ) {
            unsafe { $body }
        }
    };
}

pub(crate) use abi_fn;
