//! Event-driven YAML parsing into [`Document`] trees.
//!
//! Built on `yaml-rust2`'s marked event stream rather than a serde
//! deserializer so that two properties of the source survive: key order
//! (mapping nodes become `Document`s in source order) and alias identity
//! (an anchored mapping is entered into an anchor table and every alias to
//! it resolves to the *same* shared node, never an independent copy).

use std::collections::HashMap;

use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser, Tag};
use yaml_rust2::scanner::{Marker, TScalarStyle};

use crate::document::{Document, Value};
use crate::error::{SettingsError, SettingsResult};

impl Document {
    /// Parses the first YAML document in `text`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Malformed`] for YAML syntax errors,
    /// duplicate or non-scalar mapping keys, or a non-mapping root node.
    pub fn parse(text: &str) -> SettingsResult<Self> {
        let roots = parse_documents(text, false)?;
        match roots.into_iter().next() {
            Some(Value::Mapping(doc)) => Ok(doc),
            Some(_) => Err(SettingsError::Malformed {
                message: "expected a mapping at the document root".to_owned(),
            }),
            None => Err(SettingsError::Malformed {
                message: "no YAML document found".to_owned(),
            }),
        }
    }

    /// Parses every `---`-delimited document in `text`, in stream order.
    ///
    /// Each element is fully independent; anchors do not cross document
    /// boundaries.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::Malformed`] under the same conditions as
    /// [`Document::parse`], applied per document.
    pub fn parse_all(text: &str) -> SettingsResult<Vec<Self>> {
        let roots = parse_documents(text, true)?;
        roots
            .into_iter()
            .map(|root| match root {
                Value::Mapping(doc) => Ok(doc),
                _ => Err(SettingsError::Malformed {
                    message: "expected a mapping at the document root".to_owned(),
                }),
            })
            .collect()
    }
}

/// Parses `text` and returns the root value of its first document, whatever
/// its kind. Used for environment values and locator query options.
pub(crate) fn parse_value(text: &str) -> SettingsResult<Value> {
    // An empty stream is the empty document, which is null.
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    let roots = parse_documents(text, false)?;
    roots.into_iter().next().ok_or(SettingsError::Malformed {
        message: "no YAML document found".to_owned(),
    })
}

fn parse_documents(text: &str, multi: bool) -> SettingsResult<Vec<Value>> {
    let mut parser = Parser::new_from_str(text);
    let mut builder = DocumentBuilder::default();
    parser.load(&mut builder, multi)?;
    if let Some(err) = builder.error {
        return Err(err);
    }
    Ok(builder.documents)
}

/// Event receiver that assembles `Document` trees.
///
/// Anchored mappings are registered in `anchors` at `MappingStart`, before
/// their content arrives, so the handle aliases resolve to is the very node
/// still being filled. An alias naming a mapping that is still on the build
/// stack is rejected: it would close a cycle in the tree.
#[derive(Default)]
struct DocumentBuilder {
    stack: Vec<BuildNode>,
    documents: Vec<Value>,
    current_root: Option<Value>,
    anchors: HashMap<usize, Value>,
    error: Option<SettingsError>,
}

enum BuildNode {
    Sequence {
        anchor: usize,
        items: Vec<Value>,
    },
    Mapping {
        doc: Document,
        pending_key: Option<String>,
    },
}

impl DocumentBuilder {
    fn fail(&mut self, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(SettingsError::Malformed {
                message: message.into(),
            });
        }
    }

    fn is_open_mapping(&self, value: &Value) -> bool {
        let Value::Mapping(target) = value else {
            return false;
        };
        self.stack.iter().any(|node| {
            matches!(node, BuildNode::Mapping { doc, .. } if doc.same_node(target))
        })
    }

    fn push_value(&mut self, value: Value) {
        match self.stack.last_mut() {
            None => self.current_root = Some(value),
            Some(BuildNode::Sequence { items, .. }) => items.push(value),
            Some(BuildNode::Mapping { doc, pending_key }) => match pending_key.take() {
                Some(key) => {
                    if doc.contains_key(&key) {
                        let message = format!("duplicate mapping key '{key}'");
                        self.fail(message);
                        return;
                    }
                    doc.set(key, value);
                }
                None => match scalar_key(&value) {
                    Some(key) => *pending_key = Some(key),
                    None => self.fail("mapping keys must be scalars"),
                },
            },
        }
    }
}

impl MarkedEventReceiver for DocumentBuilder {
    fn on_event(&mut self, ev: Event, _marker: Marker) {
        if self.error.is_some() {
            return;
        }
        match ev {
            Event::Nothing | Event::StreamStart | Event::StreamEnd | Event::DocumentStart => {}

            Event::DocumentEnd => {
                self.documents
                    .push(self.current_root.take().unwrap_or(Value::Null));
                // Anchors are scoped to one document.
                self.anchors.clear();
            }

            Event::Scalar(text, style, anchor, tag) => {
                let value = resolve_scalar(&text, style, tag.as_ref());
                if anchor != 0 {
                    self.anchors.insert(anchor, value.clone());
                }
                self.push_value(value);
            }

            Event::SequenceStart(anchor, _tag) => {
                self.stack.push(BuildNode::Sequence {
                    anchor,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => {
                let Some(BuildNode::Sequence { anchor, items }) = self.stack.pop() else {
                    self.fail("sequence end without a matching start");
                    return;
                };
                let value = Value::Sequence(items);
                if anchor != 0 {
                    self.anchors.insert(anchor, value.clone());
                }
                self.push_value(value);
            }

            Event::MappingStart(anchor, _tag) => {
                let doc = Document::new();
                if anchor != 0 {
                    // Registered before the content arrives: aliases must
                    // share this very node.
                    self.anchors.insert(anchor, Value::Mapping(doc.clone()));
                }
                self.stack.push(BuildNode::Mapping {
                    doc,
                    pending_key: None,
                });
            }

            Event::MappingEnd => {
                let Some(BuildNode::Mapping { doc, pending_key }) = self.stack.pop() else {
                    self.fail("mapping end without a matching start");
                    return;
                };
                if pending_key.is_some() {
                    self.fail("mapping entry without a value");
                    return;
                }
                self.push_value(Value::Mapping(doc));
            }

            Event::Alias(anchor) => {
                let Some(value) = self.anchors.get(&anchor).cloned() else {
                    self.fail("alias to an unknown anchor");
                    return;
                };
                // An alias into a still-open mapping would make the tree
                // cyclic; recursive walks could never terminate on it.
                if self.is_open_mapping(&value) {
                    self.fail("alias references a node that encloses it");
                    return;
                }
                self.push_value(value);
            }
        }
    }
}

fn scalar_key(value: &Value) -> Option<String> {
    match value {
        Value::Str(s) => Some(s.clone()),
        Value::Int(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        Value::Float(n) => Some(n.to_string()),
        Value::Null => Some("null".to_owned()),
        Value::Sequence(_) | Value::Mapping(_) => None,
    }
}

fn resolve_scalar(text: &str, style: TScalarStyle, tag: Option<&Tag>) -> Value {
    if let Some(tag) = tag {
        return resolve_tagged(text, tag);
    }
    if style == TScalarStyle::Plain {
        resolve_plain(text)
    } else {
        Value::Str(text.to_owned())
    }
}

/// Core-schema resolution for a tagged scalar. Unknown tags (including
/// application-specific ones) keep the raw text as a string.
fn resolve_tagged(text: &str, tag: &Tag) -> Value {
    if tag.handle != "tag:yaml.org,2002:" {
        return Value::Str(text.to_owned());
    }
    match tag.suffix.as_str() {
        "null" => Value::Null,
        "bool" => match resolve_plain(text) {
            v @ Value::Bool(_) => v,
            _ => Value::Str(text.to_owned()),
        },
        "int" => text
            .parse::<i64>()
            .map_or_else(|_| Value::Str(text.to_owned()), Value::Int),
        "float" => text
            .parse::<f64>()
            .map_or_else(|_| Value::Str(text.to_owned()), Value::Float),
        _ => Value::Str(text.to_owned()),
    }
}

/// Resolves an untagged plain scalar: null, booleans (including the YAML
/// 1.1 spellings), integers, floats, then strings.
pub(crate) fn resolve_plain(text: &str) -> Value {
    match text {
        "" | "~" | "null" | "Null" | "NULL" => return Value::Null,
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            return Value::Bool(true);
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            return Value::Bool(false);
        }
        ".inf" | "+.inf" => return Value::Float(f64::INFINITY),
        "-.inf" => return Value::Float(f64::NEG_INFINITY),
        ".nan" => return Value::Float(f64::NAN),
        _ => {}
    }
    if let Ok(n) = text.parse::<i64>() {
        return Value::Int(n);
    }
    if looks_numeric(text)
        && let Ok(n) = text.parse::<f64>()
    {
        return Value::Float(n);
    }
    Value::Str(text.to_owned())
}

/// Guards the float fallback: `f64::from_str` accepts spellings like `inf`
/// and `nan` that YAML treats as strings.
fn looks_numeric(text: &str) -> bool {
    !text.is_empty()
        && text
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '+' | '-'))
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::resolve_plain;
    use crate::document::{Document, Value};
    use crate::error::SettingsError;

    #[test]
    fn mapping_keys_keep_source_order() {
        let doc = Document::parse("greet: Hello\nleave: Goodbye\nsecret: I have no secrets\nmeaning: 42\n")
            .unwrap();
        assert_eq!(doc.keys(), ["greet", "leave", "secret", "meaning"]);
        assert_eq!(doc.get("meaning").unwrap().as_i64(), Some(42));
    }

    #[test]
    fn aliases_resolve_to_the_same_shared_node() {
        let doc = Document::parse(
            "id1: &id001\n  name: hi\nmix:\n  a: 10\n  b: *id001\n",
        )
        .unwrap();
        let id1 = doc.get("id1").unwrap().as_mapping().unwrap();
        let b = doc.get_path("mix.b").unwrap().as_mapping().unwrap();
        assert!(id1.same_node(&b));
        id1.set("name", "changed");
        assert_eq!(doc.get_path("mix.b.name").unwrap().as_str(), Some("changed"));
    }

    #[test]
    fn aliases_inside_sequences_share_too() {
        let doc = Document::parse(
            "id1: &a\n  name: hi\nvar_list:\n- *a\n- *a\n",
        )
        .unwrap();
        let items = doc.get("var_list").unwrap();
        let items = items.as_sequence().unwrap();
        let first = items[0].as_mapping().unwrap();
        assert!(first.same_node(&items[1].as_mapping().unwrap()));
        assert!(first.same_node(&doc.get("id1").unwrap().as_mapping().unwrap()));
    }

    #[test]
    fn multi_document_streams_split_on_markers() {
        let docs = Document::parse_all(
            "---\nfirst:\n  n: 1\n---\nsecond:\n  n: 2\n---\nthird:\n  n: 3\n",
        )
        .unwrap();
        assert_eq!(docs.len(), 3);
        assert_eq!(docs[1].get_path("second.n").unwrap().as_i64(), Some(2));
    }

    #[rstest]
    #[case("recipient: [")]
    #[case("a: 1\na: 2")]
    #[case("- just\n- a\n- sequence")]
    #[case("just a scalar")]
    fn malformed_input_is_fatal(#[case] text: &str) {
        assert!(matches!(
            Document::parse(text),
            Err(SettingsError::Malformed { .. })
        ));
    }

    #[rstest]
    #[case("42", Value::Int(42))]
    #[case("-7", Value::Int(-7))]
    #[case("3.14", Value::Float(3.14))]
    #[case("1e3", Value::Float(1000.0))]
    #[case("yes", Value::Bool(true))]
    #[case("Off", Value::Bool(false))]
    #[case("~", Value::Null)]
    #[case("inf", Value::Str("inf".to_owned()))]
    #[case("nan", Value::Str("nan".to_owned()))]
    #[case("hello", Value::Str("hello".to_owned()))]
    fn plain_scalars_resolve_by_the_core_schema(#[case] text: &str, #[case] expected: Value) {
        assert_eq!(resolve_plain(text), expected);
    }

    #[rstest]
    #[case("a: &x\n  b: *x\n")]
    #[case("a: &x\n  items:\n  - *x\n")]
    #[case("a: &x\n  b:\n    c: *x\n")]
    fn aliases_into_an_enclosing_mapping_are_rejected(#[case] text: &str) {
        assert!(matches!(
            Document::parse(text),
            Err(SettingsError::Malformed { .. })
        ));
    }

    #[test]
    fn quoted_scalars_stay_strings() {
        let doc = Document::parse("a: '42'\nb: \"true\"\nc: 42\n").unwrap();
        assert_eq!(doc.get("a").unwrap().as_str(), Some("42"));
        assert_eq!(doc.get("b").unwrap().as_str(), Some("true"));
        assert_eq!(doc.get("c").unwrap().as_i64(), Some(42));
    }

    #[test]
    fn tagged_str_forces_a_string() {
        let doc = Document::parse("a: !!str 42\n").unwrap();
        assert_eq!(doc.get("a").unwrap().as_str(), Some("42"));
    }

    #[test]
    fn numeric_keys_are_stringified() {
        let doc = Document::parse("42: answer\n").unwrap();
        assert_eq!(doc.get("42").unwrap().as_str(), Some("answer"));
    }
}
