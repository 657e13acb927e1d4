//! Scheme dispatch and first-candidate-wins loading.

use std::collections::HashMap;

use super::{FileResolver, Resolver, SettingsCache, Target};
use crate::document::Document;
use crate::error::{SettingsError, SettingsResult};

/// Maps scheme names to resolvers and loads documents through them.
///
/// `file` is registered out of the box and doubles as the default scheme
/// for scheme-less locators. The registry is built up front and read-only
/// afterwards.
pub struct Registry {
    resolvers: Vec<Box<dyn Resolver>>,
    by_scheme: HashMap<String, usize>,
    default_scheme: String,
}

impl Default for Registry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry {
    /// Creates a registry with the [`FileResolver`] registered.
    #[must_use]
    pub fn new() -> Self {
        let mut registry = Self {
            resolvers: Vec::new(),
            by_scheme: HashMap::new(),
            default_scheme: "file".to_owned(),
        };
        registry.register(Box::new(FileResolver::new()));
        registry
    }

    /// Registers an additional resolver, claiming every scheme it names.
    #[must_use]
    pub fn with_resolver(mut self, resolver: impl Resolver + 'static) -> Self {
        self.register(Box::new(resolver));
        self
    }

    fn register(&mut self, resolver: Box<dyn Resolver>) {
        let index = self.resolvers.len();
        for scheme in resolver.schemes() {
            self.by_scheme.insert((*scheme).to_owned(), index);
        }
        self.resolvers.push(resolver);
    }

    /// Returns the resolver registered for `scheme`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownScheme`] when nothing is registered.
    pub fn resolver_for(&self, scheme: &str) -> SettingsResult<&dyn Resolver> {
        self.by_scheme
            .get(scheme)
            .map(|index| self.resolvers[*index].as_ref())
            .ok_or_else(|| SettingsError::UnknownScheme {
                scheme: scheme.to_owned(),
            })
    }

    /// Resolves one locator to raw document text.
    ///
    /// # Errors
    ///
    /// Propagates [`SettingsError::UnknownScheme`], the resolver's
    /// [`SettingsError::NotFound`] and any I/O failure.
    pub fn fetch(&self, locator: &str) -> SettingsResult<String> {
        let mut target = Target::parse(locator, &self.default_scheme);
        let resolver = self.resolver_for(target.scheme())?;
        target.apply_defaults(resolver.default_query());
        resolver.resolve(&target)
    }

    /// Loads the first candidate that resolves, optionally narrowed to the
    /// given top-level fields.
    ///
    /// Candidates are tried in order; a `NotFound` moves on to the next
    /// one, any other failure (unknown scheme, I/O, malformed YAML) is
    /// fatal immediately.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::NoCandidate`] naming every attempted
    /// locator when none resolves.
    pub fn load(&self, candidates: &[&str], fields: Option<&[&str]>) -> SettingsResult<Document> {
        let (locator, text) = self.first_hit(candidates)?;
        let doc = Document::parse(&text)?;
        tracing::debug!(%locator, "loaded settings document");
        if let Some(fields) = fields {
            doc.limit(fields);
        }
        Ok(doc)
    }

    /// Loads every `---`-delimited document from the first candidate that
    /// resolves.
    ///
    /// # Errors
    ///
    /// As for [`Registry::load`].
    pub fn load_all(&self, candidates: &[&str]) -> SettingsResult<Vec<Document>> {
        let (locator, text) = self.first_hit(candidates)?;
        tracing::debug!(%locator, "loaded settings stream");
        Document::parse_all(&text)
    }

    /// Loads `locator` through `cache` with at-most-once semantics.
    ///
    /// A cache hit returns the stored [`Document`] handle, so every caller
    /// shares one node per key; first load wins. `bypass` skips the cache
    /// in both directions for this call.
    ///
    /// # Errors
    ///
    /// As for [`Registry::load`], with the candidate list being just
    /// `locator`.
    pub fn load_cached(
        &self,
        cache: &mut SettingsCache,
        locator: &str,
        bypass: bool,
    ) -> SettingsResult<Document> {
        if !bypass && let Some(doc) = cache.get(locator) {
            tracing::debug!(%locator, "settings cache hit");
            return Ok(doc);
        }
        let doc = self.load(&[locator], None)?;
        if !bypass {
            cache.insert(locator, doc.clone());
        }
        Ok(doc)
    }

    fn first_hit<'a>(&self, candidates: &[&'a str]) -> SettingsResult<(&'a str, String)> {
        for &locator in candidates {
            match self.fetch(locator) {
                Ok(text) => return Ok((locator, text)),
                Err(err) if matches!(err, SettingsError::NotFound { .. }) => {
                    tracing::debug!(%locator, "candidate not found, trying next");
                }
                Err(err) => return Err(err),
            }
        }
        Err(SettingsError::NoCandidate {
            attempted: candidates.iter().map(|c| (*c).to_owned()).collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::Registry;
    use crate::error::SettingsError;
    use crate::resolver::{SettingsCache, StaticResolver};

    fn registry() -> Registry {
        Registry::new().with_resolver(
            StaticResolver::new()
                .with_document("defaults", "config:\n  greet: Hello\nextra: 1\n")
                .with_document("broken", "config: ["),
        )
    }

    #[test]
    fn first_resolving_candidate_wins() {
        let doc = registry()
            .load(&["mem://missing", "mem://defaults", "mem://never-tried"], None)
            .expect("load");
        assert_eq!(doc.get_path("config.greet").unwrap().as_str(), Some("Hello"));
    }

    #[test]
    fn exhausted_candidates_name_every_attempt() {
        let err = registry()
            .load(&["mem://a", "mem://b"], None)
            .unwrap_err();
        let SettingsError::NoCandidate { attempted } = err else {
            panic!("expected NoCandidate, got {err}");
        };
        assert_eq!(attempted, ["mem://a", "mem://b"]);
    }

    #[test]
    fn unknown_schemes_are_fatal_not_skipped() {
        let err = registry()
            .load(&["bogus://a", "mem://defaults"], None)
            .unwrap_err();
        assert!(matches!(err, SettingsError::UnknownScheme { .. }));
    }

    #[test]
    fn malformed_winners_are_fatal() {
        let err = registry().load(&["mem://broken"], None).unwrap_err();
        assert!(matches!(err, SettingsError::Malformed { .. }));
    }

    #[test]
    fn fields_narrow_the_loaded_document() {
        let doc = registry()
            .load(&["mem://defaults"], Some(&["config"]))
            .expect("load");
        assert_eq!(doc.keys(), ["config"]);
    }

    #[test]
    fn cached_loads_share_one_document_per_key() {
        let registry = registry();
        let mut cache = SettingsCache::new();
        let first = registry
            .load_cached(&mut cache, "mem://defaults", false)
            .expect("first load");
        first.set("marker", true);
        let second = registry
            .load_cached(&mut cache, "mem://defaults", false)
            .expect("second load");
        assert!(second.same_node(&first));
        assert_eq!(second.get("marker").unwrap().as_bool(), Some(true));
    }

    #[test]
    fn bypass_skips_the_cache_in_both_directions() {
        let registry = registry();
        let mut cache = SettingsCache::new();
        let fresh = registry
            .load_cached(&mut cache, "mem://defaults", true)
            .expect("bypass load");
        assert!(cache.is_empty());
        let cached = registry
            .load_cached(&mut cache, "mem://defaults", false)
            .expect("cached load");
        assert!(!cached.same_node(&fresh));
    }
}
