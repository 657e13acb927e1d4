//! Opinionated layering on top of the core: defaults plus overrides plus
//! environment, with optional named-section inheritance.
//!
//! The section model: a defaults document holds a shared default section
//! (say `config`), and an overrides document may define sibling sections
//! (`config_excited`, `config_cool`) that each carry only their deltas.
//! Loading rebases every override section onto the default section, so a
//! section inherits everything it does not override.

use crate::document::{Document, Value};
use crate::env::update_from_env;
use crate::error::{SettingsError, SettingsResult};
use crate::resolver::Registry;
use crate::traverse::{PathSegment, render_path};

/// Overrides `doc` in place from the first candidate that loads, narrowed
/// to the top-level fields `doc` already has.
///
/// # Errors
///
/// Propagates load failures, including
/// [`SettingsError::NoCandidate`] when nothing resolves.
pub fn update_from_file(
    doc: &Document,
    candidates: &[&str],
    registry: &Registry,
) -> SettingsResult<()> {
    let keys = doc.keys();
    let fields: Vec<&str> = keys.iter().map(String::as_str).collect();
    let loaded = registry.load(candidates, Some(&fields))?;
    doc.update(&loaded);
    Ok(())
}

/// Checks that no path listed under the document's `required_keys` is null.
///
/// `required_keys` is a sequence of dotted paths; a null anywhere at or
/// under a listed path fails validation. Documents without the key pass.
///
/// # Errors
///
/// Returns [`SettingsError::Validation`] carrying the full dotted path of
/// the first null required value, in traversal order.
pub fn validate_required(doc: &Document) -> SettingsResult<()> {
    let required = required_paths(doc);
    if required.is_empty() {
        return Ok(());
    }
    let mut violation: Option<String> = None;
    doc.traverse(&mut |path: &[PathSegment], value: &Value| {
        if violation.is_none() && value.is_null() && matches_required(path, &required) {
            violation = Some(render_path(path));
        }
        None
    });
    match violation {
        Some(path) => Err(SettingsError::Validation { path }),
        None => Ok(()),
    }
}

fn required_paths(doc: &Document) -> Vec<Vec<String>> {
    let Some(Value::Sequence(items)) = doc.try_get("required_keys") else {
        return Vec::new();
    };
    items
        .iter()
        .filter_map(Value::as_str)
        .map(|dotted| dotted.split('.').map(str::to_owned).collect())
        .collect()
}

/// True when the key components of `path` fall at or under any required
/// path. Index segments never match, so nulls inside sequences are not
/// validated, consistent with the override model.
fn matches_required(path: &[PathSegment], required: &[Vec<String>]) -> bool {
    let keys: Vec<&str> = path
        .iter()
        .map(|segment| match segment {
            PathSegment::Key(key) => key.as_str(),
            PathSegment::Index(_) => "",
        })
        .collect();
    required.iter().any(|req| {
        keys.len() >= req.len() && keys.iter().zip(req).all(|(have, want)| *have == want)
    })
}

/// Loaded, layered settings; see [`SettingsBuilder`].
#[derive(Debug)]
pub struct Settings {
    document: Document,
    default_section: Option<String>,
}

impl Settings {
    /// The whole merged document.
    #[must_use]
    pub const fn document(&self) -> &Document {
        &self.document
    }

    /// The named section.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::MissingKey`] when the section is absent or
    /// not a mapping.
    pub fn section(&self, name: &str) -> SettingsResult<Document> {
        self.document
            .try_get(name)
            .and_then(|value| value.as_mapping())
            .ok_or_else(|| SettingsError::MissingKey {
                section: name.to_owned(),
            })
    }

    /// The default section when one was configured, the whole document
    /// otherwise.
    ///
    /// # Errors
    ///
    /// As for [`Settings::section`].
    pub fn current(&self) -> SettingsResult<Document> {
        match &self.default_section {
            Some(name) => self.section(name),
            None => Ok(self.document.clone()),
        }
    }
}

/// Builder for layered settings loads.
///
/// ```no_run
/// use strata_config::{Registry, SettingsBuilder};
///
/// # fn run() -> strata_config::SettingsResult<()> {
/// let registry = Registry::new();
/// let settings = SettingsBuilder::new()
///     .defaults(["defaults.yml"])
///     .overrides(["settings.yml"])
///     .default_section("config")
///     .load(&registry)?;
/// let _greet = settings.section("config_excited")?.get("greet")?;
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, Default)]
pub struct SettingsBuilder {
    defaults: Vec<String>,
    overrides: Vec<String>,
    default_section: Option<String>,
    override_envs: bool,
    envs_override_defaults_only: bool,
    override_required: bool,
}

impl SettingsBuilder {
    /// Creates a builder with environment overrides enabled and optional
    /// override layers.
    #[must_use]
    pub fn new() -> Self {
        Self {
            override_envs: true,
            ..Self::default()
        }
    }

    /// Candidate locators for the defaults layer, tried in order.
    #[must_use]
    pub fn defaults<I, S>(mut self, locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.defaults = locators.into_iter().map(Into::into).collect();
        self
    }

    /// Candidate locators for the overrides layer, tried in order.
    #[must_use]
    pub fn overrides<I, S>(mut self, locators: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.overrides = locators.into_iter().map(Into::into).collect();
        self
    }

    /// Enables section mode: override sections inherit from this section
    /// of the defaults, and it doubles as the environment prefix.
    #[must_use]
    pub fn default_section(mut self, name: impl Into<String>) -> Self {
        self.default_section = Some(name.into());
        self
    }

    /// Enables or disables environment overrides (default: enabled).
    #[must_use]
    pub const fn override_envs(mut self, enabled: bool) -> Self {
        self.override_envs = enabled;
        self
    }

    /// Applies environment overrides to the defaults layer before merging,
    /// instead of to the merged result, so file overrides beat the
    /// environment.
    #[must_use]
    pub const fn envs_override_defaults_only(mut self, enabled: bool) -> Self {
        self.envs_override_defaults_only = enabled;
        self
    }

    /// Makes a missing overrides layer fatal instead of skipped.
    #[must_use]
    pub const fn override_required(mut self, required: bool) -> Self {
        self.override_required = required;
        self
    }

    /// Loads and layers the configured sources.
    ///
    /// # Errors
    ///
    /// Propagates load and parse failures; a missing overrides layer is
    /// only fatal when [`SettingsBuilder::override_required`] was set.
    /// Returns [`SettingsError::MissingKey`] in section mode when the
    /// defaults lack the default section.
    pub fn load(self, registry: &Registry) -> SettingsResult<Settings> {
        let default_candidates: Vec<&str> = self.defaults.iter().map(String::as_str).collect();
        let override_candidates: Vec<&str> = self.overrides.iter().map(String::as_str).collect();
        let defaults = registry.load(&default_candidates, None)?;

        if self.override_envs && self.envs_override_defaults_only {
            match &self.default_section {
                Some(section) => {
                    let target = section_of(&defaults, section)?;
                    update_from_env(&target, section);
                }
                None => update_from_env(&defaults, ""),
            }
        }

        let document = match &self.default_section {
            None => {
                let document = defaults;
                match registry.load(&override_candidates, None) {
                    Ok(overrides) => document.update(&overrides),
                    Err(err) if err.is_not_found() && !self.override_required => {
                        tracing::warn!(%err, "optional overrides skipped");
                    }
                    Err(err) => return Err(err),
                }
                if self.override_envs && !self.envs_override_defaults_only {
                    update_from_env(&document, "");
                }
                document
            }
            Some(section) => {
                let document = match registry.load(&override_candidates, None) {
                    Ok(overrides) => overrides,
                    Err(err) if err.is_not_found() && !self.override_required => {
                        tracing::warn!(%err, "optional overrides skipped");
                        defaults.clone()
                    }
                    Err(err) => return Err(err),
                };
                let base = section_of(&defaults, section)?;

                for name in document.keys() {
                    let Some(current) = document.get(&name)?.as_mapping() else {
                        return Err(SettingsError::Malformed {
                            message: format!("section '{name}' is not a mapping"),
                        });
                    };
                    current.rebase(&base);
                    if self.override_envs && !self.envs_override_defaults_only {
                        update_from_env(&current, section);
                    }
                }

                // The default section always exists after a load, inherited
                // verbatim when the overrides omit it.
                if !document.contains_key(section.as_str()) {
                    document.set(section.clone(), base.clone());
                    if self.override_envs && !self.envs_override_defaults_only {
                        update_from_env(&base, section);
                    }
                }
                document
            }
        };

        Ok(Settings {
            document,
            default_section: self.default_section,
        })
    }
}

fn section_of(doc: &Document, name: &str) -> SettingsResult<Document> {
    doc.try_get(name)
        .and_then(|value| value.as_mapping())
        .ok_or_else(|| SettingsError::MissingKey {
            section: name.to_owned(),
        })
}

#[cfg(test)]
mod tests {
    use super::{validate_required, update_from_file};
    use crate::doc;
    use crate::document::{Document, Value};
    use crate::error::SettingsError;
    use crate::resolver::{Registry, StaticResolver};

    fn registry() -> Registry {
        Registry::new().with_resolver(
            StaticResolver::new()
                .with_document(
                    "defaults",
                    "config:\n  greet: Hello\n  leave: Goodbye\n  secret: I have no secrets\n",
                )
                .with_document(
                    "settings",
                    "config:\n  secret: I have many secrets\nother_stuff:\n  ignored: true\n",
                ),
        )
    }

    #[test]
    fn update_from_file_narrows_to_existing_fields() {
        let doc = Document::parse("config:\n  greet: Hello\n  secret: s1\n").unwrap();
        update_from_file(&doc, &["mem://missing", "mem://settings"], &registry())
            .expect("update");
        assert_eq!(
            doc.get_path("config.secret").unwrap().as_str(),
            Some("I have many secrets")
        );
        assert_eq!(doc.get_path("config.greet").unwrap().as_str(), Some("Hello"));
        assert!(doc.try_get("other_stuff").is_none());
    }

    #[test]
    fn validation_passes_without_required_keys() {
        let doc = doc! { "a" => Value::Null };
        assert!(validate_required(&doc).is_ok());
    }

    #[test]
    fn validation_reports_the_full_dotted_path() {
        let doc = Document::parse(
            "required_keys:\n- database.host\ndatabase:\n  host: null\n  port: 5432\n",
        )
        .unwrap();
        let err = validate_required(&doc).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Validation { ref path } if path == "database.host"
        ));
    }

    #[test]
    fn validation_covers_everything_under_a_required_path() {
        let doc = Document::parse(
            "required_keys:\n- database\ndatabase:\n  host: ok\n  password: null\n",
        )
        .unwrap();
        let err = validate_required(&doc).unwrap_err();
        assert!(matches!(
            err,
            SettingsError::Validation { ref path } if path == "database.password"
        ));
    }

    #[test]
    fn unrelated_nulls_do_not_fail_validation() {
        let doc = Document::parse(
            "required_keys:\n- database.host\ndatabase:\n  host: ok\noptional: null\n",
        )
        .unwrap();
        assert!(validate_required(&doc).is_ok());
    }
}
