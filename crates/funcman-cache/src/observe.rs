//! Resolution events and counters.
//!
//! Observers are notified after the per-entry lock has been released. Teardown
//! never notifies: it may run under a loader-level lock where an observer's
//! own synchronization could deadlock.

use std::sync::atomic::{AtomicU64, Ordering};

use funcman_core::BindError;
use serde::Serialize;

/// Something that happened to an entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum ResolutionEvent<'a> {
    /// Config loader set the entry's library/symbol.
    Configured {
        key: &'a str,
        library: &'a str,
        symbol: &'a str,
    },
    /// Config line named a key no entry carries.
    UnknownKey { key: &'a str, line: usize },
    /// First resolution bound the override.
    Bound {
        key: &'a str,
        module: &'a str,
        symbol: &'a str,
    },
    /// First resolution failed; the failure is now cached.
    BindFailed {
        key: &'a str,
        library: &'a str,
        symbol: &'a str,
        reason: BindError,
    },
}

impl ResolutionEvent<'_> {
    /// Stable event name (matches the serialized tag).
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Configured { .. } => "configured",
            Self::UnknownKey { .. } => "unknown_key",
            Self::Bound { .. } => "bound",
            Self::BindFailed { .. } => "bind_failed",
        }
    }

    #[must_use]
    pub const fn key(&self) -> &str {
        match self {
            Self::Configured { key, .. }
            | Self::UnknownKey { key, .. }
            | Self::Bound { key, .. }
            | Self::BindFailed { key, .. } => *key,
        }
    }
}

/// Receives resolution events.
pub trait ResolutionObserver: Sync {
    fn on_event(&self, event: &ResolutionEvent<'_>);
}

/// Lock-free event counters.
#[derive(Debug, Default)]
pub struct ResolutionStats {
    configured: AtomicU64,
    unknown_keys: AtomicU64,
    bound: AtomicU64,
    failed: AtomicU64,
}

/// Point-in-time copy of [`ResolutionStats`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StatsSnapshot {
    pub configured: u64,
    pub unknown_keys: u64,
    pub bound: u64,
    pub failed: u64,
}

impl ResolutionStats {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            configured: AtomicU64::new(0),
            unknown_keys: AtomicU64::new(0),
            bound: AtomicU64::new(0),
            failed: AtomicU64::new(0),
        }
    }

    #[must_use]
    pub fn snapshot(&self) -> StatsSnapshot {
        StatsSnapshot {
            configured: self.configured.load(Ordering::Relaxed),
            unknown_keys: self.unknown_keys.load(Ordering::Relaxed),
            bound: self.bound.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
        }
    }
}

impl ResolutionObserver for ResolutionStats {
    fn on_event(&self, event: &ResolutionEvent<'_>) {
        let counter = match event {
            ResolutionEvent::Configured { .. } => &self.configured,
            ResolutionEvent::UnknownKey { .. } => &self.unknown_keys,
            ResolutionEvent::Bound { .. } => &self.bound,
            ResolutionEvent::BindFailed { .. } => &self.failed,
        };
        counter.fetch_add(1, Ordering::Relaxed);
    }
}

pub(crate) fn notify(observer: Option<&dyn ResolutionObserver>, event: ResolutionEvent<'_>) {
    if let Some(observer) = observer {
        observer.on_event(&event);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_count_by_kind() {
        let stats = ResolutionStats::new();
        stats.on_event(&ResolutionEvent::Bound {
            key: "k",
            module: "liba.so",
            symbol: "f",
        });
        stats.on_event(&ResolutionEvent::BindFailed {
            key: "k2",
            library: "",
            symbol: "",
            reason: BindError::NoConfig,
        });
        stats.on_event(&ResolutionEvent::BindFailed {
            key: "k3",
            library: "libz",
            symbol: "z",
            reason: BindError::ModuleNotFound,
        });
        assert_eq!(
            stats.snapshot(),
            StatsSnapshot {
                configured: 0,
                unknown_keys: 0,
                bound: 1,
                failed: 2,
            }
        );
    }

    #[test]
    fn event_serializes_with_tag() {
        let event = ResolutionEvent::BindFailed {
            key: "sample_func",
            library: "nosuchlib",
            symbol: "nosuchfunc",
            reason: BindError::ModuleNotFound,
        };
        let json = serde_json::to_value(event).unwrap();
        assert_eq!(json["event"], event.name());
        assert_eq!(json["key"], "sample_func");
        assert_eq!(json["reason"], "ModuleNotFound");
    }
}
