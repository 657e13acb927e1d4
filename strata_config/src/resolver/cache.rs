//! Process-wide settings cache with at-most-once-load semantics.

use std::collections::HashMap;

use crate::document::Document;

/// Explicit, caller-owned cache of loaded documents keyed by locator.
///
/// The host application constructs and owns the cache; nothing populates it
/// as an import-time side effect. A hit returns the stored handle, so every
/// consumer of a key shares one document node and sees each other's
/// mutations — first load wins, later loads observe it.
#[derive(Debug, Default)]
pub struct SettingsCache {
    entries: HashMap<String, Document>,
}

impl SettingsCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the cached document for `key`, as a shared handle.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<Document> {
        self.entries.get(key).cloned()
    }

    /// Stores `doc` under `key`, replacing any previous entry.
    pub fn insert(&mut self, key: impl Into<String>, doc: Document) {
        self.entries.insert(key.into(), doc);
    }

    /// Drops the entry for `key`, forcing the next load to re-resolve.
    pub fn invalidate(&mut self, key: &str) -> Option<Document> {
        self.entries.remove(key)
    }

    /// Number of cached documents.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing is cached.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
