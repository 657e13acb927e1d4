//! Locator resolution: URI-scheme dispatch from locators to document text.
//!
//! A [`Registry`] maps scheme names to [`Resolver`]s and drives the
//! first-candidate-wins load over ordered locator lists. Resolvers only turn
//! a parsed [`Target`] into raw YAML text (or a not-found error); parsing
//! and merging stay in the core.

mod cache;
mod file;
mod memory;
mod registry;
mod target;

pub use cache::SettingsCache;
pub use file::FileResolver;
pub use memory::StaticResolver;
pub use registry::Registry;
pub use target::Target;

use crate::error::SettingsResult;

/// A source of settings text for one or more locator schemes.
pub trait Resolver {
    /// Scheme names this resolver serves, e.g. `["file"]`.
    fn schemes(&self) -> &'static [&'static str];

    /// Default query options, filled in for keys the locator omits.
    fn default_query(&self) -> Vec<(String, crate::Value)> {
        Vec::new()
    }

    /// Produces the document text for `target`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NotFound`](crate::SettingsError::NotFound)
    /// when the target does not exist, which a multi-candidate load recovers
    /// from by trying the next candidate; any other error is fatal.
    fn resolve(&self, target: &Target) -> SettingsResult<String>;
}
