//! Structured JSONL logging for probe and lint runs.
//!
//! Provides:
//! - [`LogEntry`]: one JSONL record with required + optional fields.
//! - [`LogEmitter`]: writes records to a file or any writer, assigning
//!   sequenced trace ids.
//! - [`JsonlObserver`]: turns resolution events into log records.
//! - [`validate_log_line`] / [`validate_log_file`]: schema checks.

use std::io::Write;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};

use funcman_cache::{ResolutionEvent, ResolutionObserver};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

// ---------------------------------------------------------------------------
// Log entry
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warn,
    Error,
}

/// Outcome of a probed operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Outcome {
    Pass,
    Fail,
    Skip,
}

const LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];
const OUTCOMES: [&str; 3] = ["pass", "fail", "skip"];
const BIND_REASONS: [&str; 4] = ["NoConfig", "NameTooLong", "ModuleNotFound", "SymbolNotFound"];

/// Canonical structured log entry.
///
/// Required fields: `timestamp`, `trace_id`, `level`, `event`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: String,
    pub trace_id: String,
    pub level: LogLevel,
    pub event: String,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub library: Option<String>,
    /// Composed module file name actually opened.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub module: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub symbol: Option<String>,
    /// Bind failure reason (`BindError` variant name).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    /// 1-based config line.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub outcome: Option<Outcome>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl LogEntry {
    /// Create a new log entry with required fields only.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, level: LogLevel, event: impl Into<String>) -> Self {
        Self {
            timestamp: now_utc(),
            trace_id: trace_id.into(),
            level,
            event: event.into(),
            key: None,
            library: None,
            module: None,
            symbol: None,
            reason: None,
            line: None,
            outcome: None,
            details: None,
        }
    }

    #[must_use]
    pub fn with_key(mut self, key: impl Into<String>) -> Self {
        self.key = Some(key.into());
        self
    }

    /// Set the configured library and symbol names.
    #[must_use]
    pub fn with_target(mut self, library: impl Into<String>, symbol: impl Into<String>) -> Self {
        self.library = Some(library.into());
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_symbol(mut self, symbol: impl Into<String>) -> Self {
        self.symbol = Some(symbol.into());
        self
    }

    #[must_use]
    pub fn with_module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    #[must_use]
    pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
        self.reason = Some(reason.into());
        self
    }

    #[must_use]
    pub fn with_line(mut self, line: usize) -> Self {
        self.line = Some(line);
        self
    }

    #[must_use]
    pub fn with_outcome(mut self, outcome: Outcome) -> Self {
        self.outcome = Some(outcome);
        self
    }

    /// Set free-form details.
    #[must_use]
    pub fn with_details(mut self, details: serde_json::Value) -> Self {
        self.details = Some(details);
        self
    }

    /// Serialize to a single JSONL line (no trailing newline).
    pub fn to_jsonl(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

// ---------------------------------------------------------------------------
// Emitter
// ---------------------------------------------------------------------------

/// JSONL writer with `<component>::<run_id>::<seq>` trace ids.
pub struct LogEmitter {
    writer: Box<dyn Write + Send>,
    seq: u64,
    component: String,
    run_id: String,
}

impl std::fmt::Debug for LogEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LogEmitter")
            .field("seq", &self.seq)
            .field("component", &self.component)
            .field("run_id", &self.run_id)
            .finish_non_exhaustive()
    }
}

impl LogEmitter {
    /// Create an emitter that writes to a file.
    pub fn to_file(path: &Path, component: &str, run_id: &str) -> std::io::Result<Self> {
        let file = std::fs::File::create(path)?;
        Ok(Self::to_writer(
            std::io::BufWriter::new(file),
            component,
            run_id,
        ))
    }

    /// Create an emitter over any writer.
    #[must_use]
    pub fn to_writer(writer: impl Write + Send + 'static, component: &str, run_id: &str) -> Self {
        Self {
            writer: Box::new(writer),
            seq: 0,
            component: component.to_string(),
            run_id: run_id.to_string(),
        }
    }

    fn next_trace_id(&mut self) -> String {
        self.seq += 1;
        format!("{}::{}::{:03}", self.component, self.run_id, self.seq)
    }

    /// Emit a bare entry with an auto-generated trace id.
    pub fn emit(&mut self, level: LogLevel, event: &str) -> std::io::Result<LogEntry> {
        let entry = LogEntry::new(self.next_trace_id(), level, event);
        self.write_entry(&entry)?;
        Ok(entry)
    }

    /// Emit a populated entry; an empty trace id is filled in.
    pub fn emit_entry(&mut self, mut entry: LogEntry) -> std::io::Result<()> {
        if entry.trace_id.is_empty() {
            entry.trace_id = self.next_trace_id();
        }
        self.write_entry(&entry)
    }

    fn write_entry(&mut self, entry: &LogEntry) -> std::io::Result<()> {
        let line = entry.to_jsonl().map_err(std::io::Error::other)?;
        writeln!(self.writer, "{line}")
    }

    pub fn flush(&mut self) -> std::io::Result<()> {
        self.writer.flush()
    }
}

// ---------------------------------------------------------------------------
// Observer adapter
// ---------------------------------------------------------------------------

/// Writes every resolution event as a JSONL record.
///
/// Write failures are counted rather than propagated; resolution must not
/// depend on the log sink.
#[derive(Debug)]
pub struct JsonlObserver {
    emitter: Mutex<LogEmitter>,
    write_errors: AtomicU64,
}

impl JsonlObserver {
    #[must_use]
    pub fn new(emitter: LogEmitter) -> Self {
        Self {
            emitter: Mutex::new(emitter),
            write_errors: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn write_errors(&self) -> u64 {
        self.write_errors.load(Ordering::Relaxed)
    }

    /// Emit a non-event record (run start/end) through the same stream.
    pub fn emit_entry(&self, entry: LogEntry) -> std::io::Result<()> {
        self.emitter.lock().emit_entry(entry)
    }

    pub fn flush(&self) -> std::io::Result<()> {
        self.emitter.lock().flush()
    }
}

/// Log record for a resolution event (trace id left for the emitter).
#[must_use]
pub fn entry_for_event(event: &ResolutionEvent<'_>) -> LogEntry {
    let base = |level| LogEntry::new(String::new(), level, event.name()).with_key(event.key());
    match *event {
        ResolutionEvent::Configured {
            library, symbol, ..
        } => base(LogLevel::Info).with_target(library, symbol),
        ResolutionEvent::UnknownKey { line, .. } => base(LogLevel::Warn)
            .with_line(line)
            .with_outcome(Outcome::Skip),
        ResolutionEvent::Bound { module, symbol, .. } => base(LogLevel::Info)
            .with_module(module)
            .with_symbol(symbol)
            .with_outcome(Outcome::Pass),
        ResolutionEvent::BindFailed {
            library,
            symbol,
            reason,
            ..
        } => base(if reason.was_configured() {
            LogLevel::Warn
        } else {
            LogLevel::Debug
        })
        .with_target(library, symbol)
        .with_reason(format!("{reason:?}"))
        .with_outcome(Outcome::Fail),
    }
}

impl ResolutionObserver for JsonlObserver {
    fn on_event(&self, event: &ResolutionEvent<'_>) {
        if self.emitter.lock().emit_entry(entry_for_event(event)).is_err() {
            self.write_errors.fetch_add(1, Ordering::Relaxed);
        }
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

/// Validation error for a log line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LogValidationError {
    pub line_number: usize,
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for LogValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "line {}: field '{}': {}",
            self.line_number, self.field, self.message
        )
    }
}

/// Validate a single JSONL line against the schema.
pub fn validate_log_line(
    line: &str,
    line_number: usize,
) -> Result<LogEntry, Vec<LogValidationError>> {
    let mut errors = Vec::new();
    let mut fail = |field: &str, message: String| {
        errors.push(LogValidationError {
            line_number,
            field: field.to_string(),
            message,
        });
    };

    let value: serde_json::Value = match serde_json::from_str(line) {
        Ok(v) => v,
        Err(e) => {
            fail("<json>", format!("invalid JSON: {e}"));
            return Err(errors);
        }
    };
    let Some(obj) = value.as_object() else {
        fail("<root>", "expected JSON object".to_string());
        return Err(errors);
    };

    for field in ["timestamp", "trace_id", "level", "event"] {
        if !obj.contains_key(field) {
            fail(field, "required field missing".to_string());
        }
    }

    if let Some(level) = obj.get("level").and_then(|v| v.as_str())
        && !LEVELS.contains(&level)
    {
        fail("level", format!("invalid level: '{level}'"));
    }

    if let Some(outcome) = obj.get("outcome").and_then(|v| v.as_str())
        && !OUTCOMES.contains(&outcome)
    {
        fail("outcome", format!("invalid outcome: '{outcome}'"));
    }

    if let Some(trace_id) = obj.get("trace_id").and_then(|v| v.as_str())
        && trace_id.split("::").count() != 3
    {
        fail(
            "trace_id",
            format!("trace_id should follow <component>::<run_id>::<seq>, got: '{trace_id}'"),
        );
    }

    // Resolution events carry their key; failures carry a known reason.
    let event = obj.get("event").and_then(|v| v.as_str()).unwrap_or_default();
    if ["configured", "unknown_key", "bound", "bind_failed"].contains(&event)
        && !obj.get("key").is_some_and(serde_json::Value::is_string)
    {
        fail("key", format!("{event} events must include key"));
    }
    if event == "bind_failed" {
        match obj.get("reason").and_then(|v| v.as_str()) {
            Some(reason) if BIND_REASONS.contains(&reason) => {}
            Some(reason) => fail("reason", format!("invalid reason: '{reason}'")),
            None => fail("reason", "bind_failed events must include reason".to_string()),
        }
    }

    if !errors.is_empty() {
        return Err(errors);
    }

    serde_json::from_value::<LogEntry>(value).map_err(|e| {
        vec![LogValidationError {
            line_number,
            field: "<deserialization>".to_string(),
            message: format!("failed to deserialize: {e}"),
        }]
    })
}

/// Validate an entire JSONL file.
///
/// Returns the non-blank line count and any validation errors found.
pub fn validate_log_file(path: &Path) -> Result<(usize, Vec<LogValidationError>), std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut all_errors = Vec::new();
    let mut line_count = 0;

    for (i, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        line_count += 1;
        if let Err(errs) = validate_log_line(line, i + 1) {
            all_errors.extend(errs);
        }
    }

    Ok((line_count, all_errors))
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// `YYYY-MM-DDTHH:MM:SS.mmmZ` without a date-time dependency.
fn now_utc() -> String {
    let duration = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default();
    let secs = duration.as_secs();
    let (year, month, day) = civil_from_days(secs / 86_400);
    format!(
        "{year:04}-{month:02}-{day:02}T{:02}:{:02}:{:02}.{:03}Z",
        (secs % 86_400) / 3_600,
        (secs % 3_600) / 60,
        secs % 60,
        duration.subsec_millis(),
    )
}

/// Days since 1970-01-01 to a proleptic Gregorian (year, month, day).
fn civil_from_days(days: u64) -> (u64, u64, u64) {
    let z = days + 719_468;
    let era = z / 146_097;
    let doe = z % 146_097;
    let yoe = (doe - doe / 1_460 + doe / 36_524 - doe / 146_096) / 365;
    let doy = doe - (365 * yoe + yoe / 4 - yoe / 100);
    let mp = (5 * doy + 2) / 153;
    let day = doy - (153 * mp + 2) / 5 + 1;
    let month = if mp < 10 { mp + 3 } else { mp - 9 };
    let year = yoe + era * 400 + u64::from(month <= 2);
    (year, month, day)
}
