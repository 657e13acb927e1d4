//! Environment-variable overrides keyed by hierarchical path.
//!
//! Every scalar leaf path is addressable from the flat environment
//! namespace: the canonical variable name is the uppercased prefix plus the
//! uppercased path segments joined by underscores, so with prefix `CONFIG`
//! the path `database.host` is overridden by `CONFIG_DATABASE_HOST`. Values
//! are parsed as YAML scalars before substitution, so `"42"` arrives as an
//! integer and `"true"` as a boolean.

use crate::de;
use crate::document::{Document, Value};
use crate::traverse::PathSegment;

/// Builds the canonical environment-variable name for a path.
///
/// Segments and the prefix are uppercased and joined with underscores; an
/// empty prefix contributes nothing, not even its underscore. Dashes inside
/// keys map to underscores so `foo-bar` is addressable as `FOO_BAR`. Index
/// segments render bracketed onto the preceding segment; paths containing
/// them are skipped by the override, which keeps sequence elements invisible
/// to the environment.
#[must_use]
pub fn env_var_name(prefix: &str, path: &[PathSegment]) -> String {
    let mut name = String::new();
    if !prefix.is_empty() {
        name.push_str(&canonical_segment(prefix));
    }
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !name.is_empty() {
                    name.push('_');
                }
                name.push_str(&canonical_segment(key));
            }
            PathSegment::Index(idx) => {
                name.push('[');
                name.push_str(&idx.to_string());
                name.push(']');
            }
        }
    }
    name
}

fn canonical_segment(segment: &str) -> String {
    segment
        .chars()
        .map(|c| if c == '-' { '_' } else { c.to_ascii_uppercase() })
        .collect()
}

/// Overrides scalar leaves of `doc` from the process environment.
///
/// For every scalar leaf, the canonical variable name is looked up; when
/// present, its value is parsed as a YAML scalar and substituted at that
/// path. Absent variables leave the original value untouched.
pub fn update_from_env(doc: &Document, prefix: &str) {
    doc.traverse(&mut |path: &[PathSegment], value: &Value| {
        // Sequence elements are not overridable; their bracketed names are
        // not legal shell identifiers anyway.
        if !value.is_scalar() || path.iter().any(|s| matches!(s, PathSegment::Index(_))) {
            return None;
        }
        let name = env_var_name(prefix, path);
        let text = std::env::var(name.as_str()).ok()?;
        tracing::debug!(variable = %name, "environment override applied");
        Some(parse_env_value(&text))
    });
}

/// Parses an environment string as a single YAML scalar. Text that parses
/// as a mapping or sequence, or does not parse at all, stays a string: only
/// scalars may be substituted at a scalar leaf.
#[must_use]
pub(crate) fn parse_env_value(text: &str) -> Value {
    match de::parse_value(text) {
        Ok(value) if value.is_scalar() => value,
        _ => Value::Str(text.to_owned()),
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;
    use test_helpers::env;

    use super::{env_var_name, update_from_env};
    use crate::doc;
    use crate::document::Value;
    use crate::traverse::PathSegment;

    fn key_path(segments: &[&str]) -> Vec<PathSegment> {
        segments
            .iter()
            .map(|s| PathSegment::Key((*s).to_owned()))
            .collect()
    }

    #[rstest]
    #[case("CONFIG", &["database", "host"], "CONFIG_DATABASE_HOST")]
    #[case("", &["database", "host"], "DATABASE_HOST")]
    #[case("", &["foo-bar"], "FOO_BAR")]
    #[case("app", &["greet"], "APP_GREET")]
    fn canonical_names(#[case] prefix: &str, #[case] path: &[&str], #[case] expected: &str) {
        assert_eq!(env_var_name(prefix, &key_path(path)), expected);
    }

    #[test]
    fn index_segments_render_bracketed() {
        let path = vec![
            PathSegment::Key("name".to_owned()),
            PathSegment::Index(2),
            PathSegment::Key("deep".to_owned()),
        ];
        assert_eq!(env_var_name("", &path), "NAME[2]_DEEP");
    }

    #[test]
    fn present_variable_wins_and_absent_leaves_untouched() {
        let doc = doc! { "config" => doc! { "greet" => "Hi", "leave" => "Bye" } };
        env::with_var("CONFIG_GREET", "Yo", || update_from_env(&doc, ""));
        assert_eq!(doc.get_path("config.greet").unwrap().as_str(), Some("Yo"));
        assert_eq!(doc.get_path("config.leave").unwrap().as_str(), Some("Bye"));
    }

    #[test]
    fn prefix_scopes_the_lookup() {
        let doc = doc! { "greet" => "Hi" };
        env::with_var("APP_GREET", "Yo", || update_from_env(&doc, "app"));
        assert_eq!(doc.get("greet").unwrap().as_str(), Some("Yo"));
    }

    #[rstest]
    #[case("42", Value::Int(42))]
    #[case("42.42", Value::Float(42.42))]
    #[case("true", Value::Bool(true))]
    #[case("null", Value::Null)]
    #[case("plain text", Value::Str("plain text".to_owned()))]
    #[case("'42'", Value::Str("42".to_owned()))]
    #[case("warning: low disk", Value::Str("warning: low disk".to_owned()))]
    #[case("[1, 2]", Value::Str("[1, 2]".to_owned()))]
    fn values_are_parsed_as_yaml_scalars(#[case] raw: &str, #[case] expected: Value) {
        let doc = doc! { "meaning" => "unset" };
        env::with_var("MEANING", raw, || update_from_env(&doc, ""));
        assert_eq!(doc.get("meaning").unwrap(), expected);
    }

    #[test]
    fn dashed_keys_are_addressable() {
        let doc = doc! { "foo-bar" => "baz" };
        env::with_var("FOO_BAR", "new-baz", || update_from_env(&doc, ""));
        assert_eq!(doc.get("foo-bar").unwrap().as_str(), Some("new-baz"));
    }

    #[test]
    fn sequence_elements_are_not_overridden() {
        let doc = doc! { "items" => vec![Value::from("a"), Value::from("b")] };
        env::with_var("ITEMS[0]", "changed", || update_from_env(&doc, ""));
        assert_eq!(
            doc.get("items").unwrap(),
            Value::Sequence(vec![Value::from("a"), Value::from("b")])
        );
    }
}
