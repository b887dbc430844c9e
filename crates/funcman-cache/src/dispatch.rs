//! Call-through-or-default dispatch for overridable functions.

use funcman_core::BindError;
use thiserror::Error;

use crate::binder::{DynamicLibraryBinder, SymbolPtr};
use crate::cache::ResolutionCache;
use crate::entry::ResolutionEntry;

/// What to do when a configured override failed to bind.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FallbackPolicy {
    /// Run the built-in default; a broken override looks like no override.
    #[default]
    FailOpen,
    /// Report [`DispatchError::Unavailable`] instead of running the default.
    FailClosed,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("override configured but unavailable: {0}")]
    Unavailable(BindError),
}

/// Routes a call to the bound override or to a built-in default.
pub struct OverrideDispatcher<'c, 'o, B> {
    cache: &'c ResolutionCache<'o, B>,
    policy: FallbackPolicy,
}

impl<B> Clone for OverrideDispatcher<'_, '_, B> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<B> Copy for OverrideDispatcher<'_, '_, B> {}

impl<'c, 'o, B: DynamicLibraryBinder> OverrideDispatcher<'c, 'o, B> {
    #[must_use]
    pub const fn new(cache: &'c ResolutionCache<'o, B>) -> Self {
        Self {
            cache,
            policy: FallbackPolicy::FailOpen,
        }
    }

    #[must_use]
    pub const fn with_policy(mut self, policy: FallbackPolicy) -> Self {
        self.policy = policy;
        self
    }

    #[must_use]
    pub const fn policy(&self) -> FallbackPolicy {
        self.policy
    }

    /// Invoke `call` with the override pointer when bound, else `default`.
    ///
    /// Under [`FallbackPolicy::FailOpen`] this never fails. Unconfigured
    /// entries take the default under either policy.
    pub fn dispatch<R>(
        &self,
        entry: &ResolutionEntry,
        call: impl FnOnce(SymbolPtr) -> R,
        default: impl FnOnce() -> R,
    ) -> Result<R, DispatchError> {
        if let Some(function) = self.cache.get(entry) {
            return Ok(call(function));
        }
        match (self.policy, entry.state().failure()) {
            (FallbackPolicy::FailClosed, Some(reason)) if reason.was_configured() => {
                Err(DispatchError::Unavailable(reason))
            }
            _ => Ok(default()),
        }
    }

    /// Fail-open dispatch regardless of the configured policy.
    pub fn dispatch_or_default<R>(
        &self,
        entry: &ResolutionEntry,
        call: impl FnOnce(SymbolPtr) -> R,
        default: impl FnOnce() -> R,
    ) -> R {
        match self.cache.get(entry) {
            Some(function) => call(function),
            None => default(),
        }
    }
}
