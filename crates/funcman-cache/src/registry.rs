//! Ordered set of resolution entries known at startup.

use thiserror::Error;

use crate::entry::ResolutionEntry;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("duplicate registry key `{key}`")]
    DuplicateKey { key: String },
}

/// Borrowed, fixed-order collection of entries.
///
/// The registry never owns entries; statically-lived entries are collected in
/// a `static` slice and wrapped with [`Registry::from_slice`].
#[derive(Debug, Clone, Copy)]
pub struct Registry<'a> {
    entries: &'a [&'a ResolutionEntry],
}

impl<'a> Registry<'a> {
    /// Wrap `entries` without checking key uniqueness. Usable in `static` items;
    /// call [`Registry::validate`] before use.
    #[must_use]
    pub const fn from_slice(entries: &'a [&'a ResolutionEntry]) -> Self {
        Self { entries }
    }

    /// Wrap `entries`, rejecting duplicate keys.
    pub fn new(entries: &'a [&'a ResolutionEntry]) -> Result<Self, RegistryError> {
        let registry = Self::from_slice(entries);
        registry.validate()?;
        Ok(registry)
    }

    /// Check that every key appears at most once.
    pub fn validate(&self) -> Result<(), RegistryError> {
        for (idx, entry) in self.entries.iter().enumerate() {
            if self.entries[..idx].iter().any(|e| e.key() == entry.key()) {
                return Err(RegistryError::DuplicateKey {
                    key: entry.key().to_owned(),
                });
            }
        }
        Ok(())
    }

    /// Entry with exactly this key.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<&'a ResolutionEntry> {
        self.entries.iter().copied().find(|entry| entry.key() == key)
    }

    pub fn iter(&self) -> std::iter::Copied<std::slice::Iter<'a, &'a ResolutionEntry>> {
        self.entries.iter().copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
