//! funcman core crate.
//!
//! Pure-logic helpers for the override-resolution cache: the override table
//! grammar, module file-name composition, and the resolution state/error
//! taxonomy. Actual dlopen/dlsym/dlclose invocations live in `funcman-cache`.

pub mod config;
pub mod naming;
pub mod state;

pub use config::{ConfigError, NamePolicy, OverrideTable};
pub use state::{BindError, MisuseError, ResolveState};
