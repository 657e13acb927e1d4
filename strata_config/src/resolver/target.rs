//! Locator parsing: scheme, path and YAML-typed query options.

use url::form_urlencoded;

use crate::document::Value;

/// A parsed locator such as `file://settings.yml` or `mem://app?flag&n=5`.
///
/// Query option values arrive already parsed from their string form into
/// YAML scalars: a bare `?flag` is boolean true, `?n=5` is the integer 5.
/// Resolver-specific defaults are filled in for omitted keys before the
/// resolver sees the target.
#[derive(Debug, Clone)]
pub struct Target {
    raw: String,
    scheme: String,
    path: String,
    query: Vec<(String, Value)>,
}

impl Target {
    /// Parses `locator`, falling back to `default_scheme` for scheme-less
    /// locators like plain file paths.
    #[must_use]
    pub fn parse(locator: &str, default_scheme: &str) -> Self {
        let (scheme, rest) = locator
            .split_once("://")
            .map_or((default_scheme, locator), |(s, rest)| (s, rest));
        let (path, query_text) = rest
            .split_once('?')
            .map_or((rest, None), |(p, q)| (p, Some(q)));
        let query = query_text.map(parse_query).unwrap_or_default();
        Self {
            raw: locator.to_owned(),
            scheme: scheme.to_owned(),
            path: path.to_owned(),
            query,
        }
    }

    /// The locator text as given.
    #[must_use]
    pub fn locator(&self) -> &str {
        &self.raw
    }

    /// Scheme name, lowercase as written.
    #[must_use]
    pub fn scheme(&self) -> &str {
        &self.scheme
    }

    /// Path component, without scheme or query.
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Looks up a query option by key.
    #[must_use]
    pub fn option(&self, key: &str) -> Option<&Value> {
        self.query
            .iter()
            .find_map(|(k, v)| (k == key).then_some(v))
    }

    /// Fills in defaults for options the locator did not set.
    pub(crate) fn apply_defaults(&mut self, defaults: Vec<(String, Value)>) {
        for (key, value) in defaults {
            if self.option(&key).is_none() {
                self.query.push((key, value));
            }
        }
    }
}

/// Parses a query string into YAML-typed options. Repeated keys keep their
/// first value; a key without a value means boolean true.
fn parse_query(text: &str) -> Vec<(String, Value)> {
    let mut options: Vec<(String, Value)> = Vec::new();
    for (key, raw) in form_urlencoded::parse(text.as_bytes()) {
        if options.iter().any(|(k, _)| *k == key) {
            continue;
        }
        let value = if raw.is_empty() {
            Value::Bool(true)
        } else {
            crate::env::parse_env_value(&raw)
        };
        options.push((key.into_owned(), value));
    }
    options
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::Target;
    use crate::document::Value;

    #[test]
    fn scheme_less_locators_use_the_default() {
        let target = Target::parse("conf/settings.yml", "file");
        assert_eq!(target.scheme(), "file");
        assert_eq!(target.path(), "conf/settings.yml");
    }

    #[test]
    fn explicit_scheme_and_path_split() {
        let target = Target::parse("mem://app/settings", "file");
        assert_eq!(target.scheme(), "mem");
        assert_eq!(target.path(), "app/settings");
    }

    #[rstest]
    #[case("mem://a?flag", "flag", Value::Bool(true))]
    #[case("mem://a?n=5", "n", Value::Int(5))]
    #[case("mem://a?ratio=0.5", "ratio", Value::Float(0.5))]
    #[case("mem://a?name=other", "name", Value::Str("other".to_owned()))]
    #[case("mem://a?off=false", "off", Value::Bool(false))]
    #[case("mem://a?note=a%3A+b", "note", Value::Str("a: b".to_owned()))]
    fn query_options_arrive_yaml_typed(
        #[case] locator: &str,
        #[case] key: &str,
        #[case] expected: Value,
    ) {
        let target = Target::parse(locator, "file");
        assert_eq!(target.option(key), Some(&expected));
    }

    #[test]
    fn repeated_keys_keep_the_first_value() {
        let target = Target::parse("mem://a?n=1&n=2", "file");
        assert_eq!(target.option("n"), Some(&Value::Int(1)));
    }

    #[test]
    fn defaults_fill_only_missing_options() {
        let mut target = Target::parse("mem://a?n=5", "file");
        target.apply_defaults(vec![
            ("n".to_owned(), Value::Int(1)),
            ("resource".to_owned(), Value::Str("settings.yaml".to_owned())),
        ]);
        assert_eq!(target.option("n"), Some(&Value::Int(5)));
        assert_eq!(
            target.option("resource").and_then(Value::as_str),
            Some("settings.yaml")
        );
    }
}
