//! In-memory resolver for embedded defaults and tests.

use indexmap::IndexMap;

use super::{Resolver, Target};
use crate::error::{SettingsError, SettingsResult};

/// Resolves `mem://` locators against a fixed name-to-text table.
///
/// Useful for settings compiled into the binary and for exercising
/// first-candidate-wins loads without touching the filesystem.
#[derive(Debug, Clone, Default)]
pub struct StaticResolver {
    documents: IndexMap<String, String>,
}

impl StaticResolver {
    /// Creates an empty resolver.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a named document.
    #[must_use]
    pub fn with_document(mut self, name: impl Into<String>, text: impl Into<String>) -> Self {
        self.documents.insert(name.into(), text.into());
        self
    }
}

impl Resolver for StaticResolver {
    fn schemes(&self) -> &'static [&'static str] {
        &["mem"]
    }

    fn resolve(&self, target: &Target) -> SettingsResult<String> {
        self.documents
            .get(target.path())
            .cloned()
            .ok_or_else(|| SettingsError::NotFound {
                locator: target.locator().to_owned(),
            })
    }
}
