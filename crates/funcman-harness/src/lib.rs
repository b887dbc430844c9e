//! Tooling for funcman override tables and resolution.
//!
//! - [`lint`]: static checks on an override table.
//! - [`probe`]: full init/resolve/dispose cycle with a real or fake binder.
//! - [`structured_log`]: JSONL records, emitter, validator.

pub mod lint;
pub mod probe;
pub mod structured_log;

pub use lint::{ConfigLint, lint_file, lint_table};
pub use probe::{ProbeError, ProbeOptions, ProbeReport, probe};
pub use structured_log::{
    JsonlObserver, LogEmitter, LogEntry, LogLevel, LogValidationError, Outcome, validate_log_file,
    validate_log_line,
};
