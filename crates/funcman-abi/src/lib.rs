// Exports take raw pointers from C callers and check them at runtime.
#![allow(clippy::missing_safety_doc)]
//! # funcman-abi
//!
//! Host library (`cdylib`) whose exported functions can be replaced at run
//! time by functions from other shared modules, named in a per-library
//! override table.
//!
//! ```text
//! C caller -> sample_func -> OverrideDispatcher -> override module (if bound)
//!                                               -> built-in default
//! ```
//!
//! The table is read once from the load hook; modules are opened lazily on
//! first call and closed from the unload hook.

mod macros;

pub mod host;
pub mod lifecycle_abi;
pub mod registry;
pub mod sample_func_abi;

pub use lifecycle_abi::{on_load, on_unload};
pub use registry::{CACHE, REGISTRY};
pub use sample_func_abi::{SAMPLE_FUNC, SampleFn};
