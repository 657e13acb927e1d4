//! Traversal over documents: flat path enumeration, inflation of sparse
//! path/value lists, and the general visitor-driven walk.
//!
//! `flat` and `inflate` operate on key-only paths and do not descend into
//! sequences; sequence elements are invisible to flattening and therefore to
//! environment overrides. That is a documented limitation of the override
//! model, not an oversight. `traverse` does descend into sequences, using
//! bracketed index segments (`name[2]`) as path components.

use std::fmt;

use crate::document::{Document, Value};

/// One component of a traversal path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    /// A mapping key.
    Key(String),
    /// A sequence index, rendered bracketed onto the preceding segment.
    Index(usize),
}

impl fmt::Display for PathSegment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Key(key) => f.write_str(key),
            Self::Index(idx) => write!(f, "[{idx}]"),
        }
    }
}

/// Renders a path as dotted keys with bracketed indices, e.g. `a.b[2].c`.
#[must_use]
pub fn render_path(path: &[PathSegment]) -> String {
    let mut out = String::new();
    for segment in path {
        match segment {
            PathSegment::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
            PathSegment::Index(idx) => {
                out.push('[');
                out.push_str(&idx.to_string());
                out.push(']');
            }
        }
    }
    out
}

/// Visitor for [`Document::traverse`].
///
/// At every node the driver calls [`visit`](Visitor::visit) with the path so
/// far and the node's value. Returning `Some(replacement)` replaces the node
/// and stops descent into it; returning `None` descends into the node's
/// children (a no-op for scalars).
pub trait Visitor {
    /// Inspects one node, optionally replacing it.
    fn visit(&mut self, path: &[PathSegment], value: &Value) -> Option<Value>;
}

impl<F> Visitor for F
where
    F: FnMut(&[PathSegment], &Value) -> Option<Value>,
{
    fn visit(&mut self, path: &[PathSegment], value: &Value) -> Option<Value> {
        self(path, value)
    }
}

impl Document {
    /// Depth-first enumeration of `(path, value)` for every scalar leaf.
    ///
    /// Mappings recurse in insertion order, pre-order; sequences are not
    /// descended into and do not appear in the output.
    #[must_use]
    pub fn flat(&self) -> Vec<(Vec<String>, Value)> {
        let mut out = Vec::new();
        let mut path = Vec::new();
        flatten_into(self, &mut path, &mut out);
        out
    }

    /// Writes a sparse `(path, value)` list back into nested structure,
    /// creating missing intermediate documents as empty mappings.
    pub fn inflate<P, K>(&self, pairs: P)
    where
        P: IntoIterator<Item = (Vec<K>, Value)>,
        K: Into<String>,
    {
        for (path, value) in pairs {
            let mut current = self.clone();
            let mut segments = path.into_iter().map(Into::into).peekable();
            while let Some(key) = segments.next() {
                if segments.peek().is_none() {
                    current.set(key, value);
                    break;
                }
                let next = match current.try_get(&key) {
                    Some(Value::Mapping(doc)) => doc,
                    _ => {
                        let created = Self::new();
                        current.set(key, created.clone());
                        created
                    }
                };
                current = next;
            }
        }
    }

    /// Pre-order walk over mappings and sequences with replace-or-descend
    /// semantics; see [`Visitor`].
    pub fn traverse<V: Visitor>(&self, visitor: &mut V) {
        let mut path = Vec::new();
        traverse_document(self, &mut path, visitor);
    }
}

fn flatten_into(doc: &Document, path: &mut Vec<String>, out: &mut Vec<(Vec<String>, Value)>) {
    for (key, value) in doc.entries() {
        path.push(key);
        match value {
            Value::Mapping(child) => flatten_into(&child, path, out),
            // Sequence leaves are opaque to flattening.
            Value::Sequence(_) => {}
            scalar => out.push((path.clone(), scalar)),
        }
        path.pop();
    }
}

fn traverse_document<V: Visitor>(doc: &Document, path: &mut Vec<PathSegment>, visitor: &mut V) {
    for (key, value) in doc.entries() {
        path.push(PathSegment::Key(key.clone()));
        if let Some(replacement) = visitor.visit(path, &value) {
            doc.set(key, replacement);
        } else {
            match value {
                Value::Mapping(child) => traverse_document(&child, path, visitor),
                Value::Sequence(mut items) => {
                    traverse_sequence(&mut items, path, visitor);
                    doc.set(key, Value::Sequence(items));
                }
                _ => {}
            }
        }
        path.pop();
    }
}

fn traverse_sequence<V: Visitor>(
    items: &mut Vec<Value>,
    path: &mut Vec<PathSegment>,
    visitor: &mut V,
) {
    for (idx, slot) in items.iter_mut().enumerate() {
        path.push(PathSegment::Index(idx));
        if let Some(replacement) = visitor.visit(path, slot) {
            *slot = replacement;
        } else {
            match slot {
                Value::Mapping(child) => traverse_document(&child.clone(), path, visitor),
                Value::Sequence(nested) => traverse_sequence(nested, path, visitor),
                _ => {}
            }
        }
        path.pop();
    }
}
