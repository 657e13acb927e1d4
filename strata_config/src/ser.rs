//! Block-style YAML serialization of [`Document`] trees.
//!
//! The inverse of [`Document::parse`]: emits keys in insertion order, block
//! style throughout, and re-derives anchors for any mapping node reachable
//! from more than one path. Anchor names are assigned in first-visit order
//! (`id001` upward), the first visit emits `&idNNN` ahead of the node's
//! content and every later visit emits `*idNNN` instead of duplicating it.

use std::collections::HashMap;
use std::fmt::Write;

use camino::Utf8Path;

use crate::de::resolve_plain;
use crate::document::{Document, Value};
use crate::error::{SettingsError, SettingsResult};

/// Serializes `doc` as block-style YAML, ending with a newline.
#[must_use]
pub fn to_yaml(doc: &Document) -> String {
    if doc.is_empty() {
        return "{}\n".to_owned();
    }
    let mut emitter = Emitter::new(doc);
    emitter.emit_mapping(doc, 0, None);
    emitter.out
}

/// Serializes a document series, separating documents with `---` markers.
#[must_use]
pub fn to_yaml_multi(docs: &[Document]) -> String {
    let mut out = String::new();
    for (idx, doc) in docs.iter().enumerate() {
        if idx > 0 {
            out.push_str("---\n");
        }
        out.push_str(&to_yaml(doc));
    }
    out
}

/// Writes `doc` to `path` as block-style YAML.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] when the file cannot be written.
pub fn save(doc: &Document, path: &Utf8Path) -> SettingsResult<()> {
    write_text(path, &to_yaml(doc))
}

/// Writes a document series to `path`, separating documents with `---`
/// markers.
///
/// # Errors
///
/// Returns [`SettingsError::Io`] when the file cannot be written.
pub fn save_all(docs: &[Document], path: &Utf8Path) -> SettingsResult<()> {
    write_text(path, &to_yaml_multi(docs))
}

fn write_text(path: &Utf8Path, text: &str) -> SettingsResult<()> {
    std::fs::write(path, text).map_err(|source| SettingsError::Io {
        path: path.to_string(),
        source,
    })
}

struct Emitter {
    out: String,
    /// Mapping nodes reachable from more than one path.
    shared: HashMap<usize, usize>,
    /// Anchor names handed out so far, keyed by node identity.
    anchors: HashMap<usize, String>,
    next_anchor: usize,
}

impl Emitter {
    fn new(root: &Document) -> Self {
        let mut counts = HashMap::new();
        count_mapping_visits(root, &mut counts);
        let shared = counts.into_iter().filter(|(_, n)| *n > 1).collect();
        Self {
            out: String::new(),
            shared,
            anchors: HashMap::new(),
            next_anchor: 1,
        }
    }

    /// Emits the entries of `doc` at `indent` spaces. When `first_prefix` is
    /// given, the first line uses it in place of its indentation; sequence
    /// items use this to pull the first entry onto the dash line.
    fn emit_mapping(&mut self, doc: &Document, indent: usize, first_prefix: Option<&str>) {
        let mut first = first_prefix;
        for (key, value) in doc.entries() {
            match first.take() {
                Some(prefix) => self.out.push_str(prefix),
                None => self.push_indent(indent),
            }
            self.out.push_str(&render_scalar_text(&key, true));
            self.out.push(':');
            self.emit_mapping_value(&value, indent);
        }
    }

    /// Emits the value part of a `key:` line, including the newline.
    fn emit_mapping_value(&mut self, value: &Value, indent: usize) {
        match value {
            Value::Mapping(child) => match self.anchor_for(child) {
                AnchorUse::Alias(name) => {
                    let _ = writeln!(self.out, " *{name}");
                }
                AnchorUse::Declare(name) => {
                    let _ = writeln!(self.out, " &{name}");
                    self.emit_mapping(child, indent + 2, None);
                }
                AnchorUse::None if child.is_empty() => self.out.push_str(" {}\n"),
                AnchorUse::None => {
                    self.out.push('\n');
                    self.emit_mapping(child, indent + 2, None);
                }
            },
            Value::Sequence(items) if items.is_empty() => self.out.push_str(" []\n"),
            Value::Sequence(items) => {
                self.out.push('\n');
                // Block sequence items sit at the same indent as their key.
                self.emit_sequence(items, indent);
            }
            scalar => {
                self.out.push(' ');
                self.out.push_str(&render_scalar(scalar));
                self.out.push('\n');
            }
        }
    }

    fn emit_sequence(&mut self, items: &[Value], indent: usize) {
        for item in items {
            match item {
                Value::Mapping(child) => match self.anchor_for(child) {
                    AnchorUse::Alias(name) => {
                        self.push_indent(indent);
                        let _ = writeln!(self.out, "- *{name}");
                    }
                    AnchorUse::Declare(name) => {
                        self.push_indent(indent);
                        let _ = writeln!(self.out, "- &{name}");
                        self.emit_mapping(child, indent + 2, None);
                    }
                    AnchorUse::None if child.is_empty() => {
                        self.push_indent(indent);
                        self.out.push_str("- {}\n");
                    }
                    AnchorUse::None => {
                        let prefix = format!("{}- ", " ".repeat(indent));
                        self.emit_mapping(child, indent + 2, Some(&prefix));
                    }
                },
                Value::Sequence(nested) if nested.is_empty() => {
                    self.push_indent(indent);
                    self.out.push_str("- []\n");
                }
                Value::Sequence(nested) => {
                    self.push_indent(indent);
                    self.out.push_str("-\n");
                    self.emit_sequence(nested, indent + 2);
                }
                scalar => {
                    self.push_indent(indent);
                    self.out.push_str("- ");
                    self.out.push_str(&render_scalar(scalar));
                    self.out.push('\n');
                }
            }
        }
    }

    fn anchor_for(&mut self, doc: &Document) -> AnchorUse {
        let id = doc.node_id();
        if !self.shared.contains_key(&id) {
            return AnchorUse::None;
        }
        if let Some(name) = self.anchors.get(&id) {
            return AnchorUse::Alias(name.clone());
        }
        let name = format!("id{:03}", self.next_anchor);
        self.next_anchor += 1;
        self.anchors.insert(id, name.clone());
        AnchorUse::Declare(name)
    }

    fn push_indent(&mut self, indent: usize) {
        for _ in 0..indent {
            self.out.push(' ');
        }
    }
}

enum AnchorUse {
    None,
    Declare(String),
    Alias(String),
}

/// Counts how many paths reach each mapping node. Children of a node are
/// counted once, on its first visit.
fn count_mapping_visits(doc: &Document, counts: &mut HashMap<usize, usize>) {
    let entry = counts.entry(doc.node_id()).or_insert(0);
    *entry += 1;
    if *entry > 1 {
        return;
    }
    for (_, value) in doc.entries() {
        count_value_visits(&value, counts);
    }
}

fn count_value_visits(value: &Value, counts: &mut HashMap<usize, usize>) {
    match value {
        Value::Mapping(child) => count_mapping_visits(child, counts),
        Value::Sequence(items) => {
            for item in items {
                count_value_visits(item, counts);
            }
        }
        _ => {}
    }
}

fn render_scalar(value: &Value) -> String {
    match value {
        Value::Null => "null".to_owned(),
        Value::Bool(true) => "true".to_owned(),
        Value::Bool(false) => "false".to_owned(),
        Value::Int(n) => n.to_string(),
        Value::Float(n) => render_float(*n),
        Value::Str(s) => render_scalar_text(s, false),
        Value::Sequence(_) | Value::Mapping(_) => unreachable!("containers emit as blocks"),
    }
}

fn render_float(n: f64) -> String {
    if n.is_nan() {
        return ".nan".to_owned();
    }
    if n.is_infinite() {
        return if n > 0.0 { ".inf" } else { "-.inf" }.to_owned();
    }
    let text = format!("{n}");
    if text.contains('.') || text.contains('e') || text.contains('E') {
        text
    } else {
        // Keep a float re-parsing as a float.
        format!("{text}.0")
    }
}

/// Renders a string scalar, quoting when the plain form would be ambiguous.
fn render_scalar_text(text: &str, is_key: bool) -> String {
    if needs_quoting(text) || (is_key && text.contains(": ")) {
        quote(text)
    } else {
        text.to_owned()
    }
}

fn needs_quoting(text: &str) -> bool {
    if text.is_empty() {
        return true;
    }
    // A plain form that would re-parse as another type must be quoted.
    if !matches!(resolve_plain(text), Value::Str(_)) {
        return true;
    }
    let first = text.chars().next().unwrap_or(' ');
    if text.starts_with(char::is_whitespace) || text.ends_with(char::is_whitespace) {
        return true;
    }
    if matches!(
        first,
        '!' | '&' | '*' | '[' | ']' | '{' | '}' | ',' | '"' | '\'' | '%' | '@' | '`' | '#' | '|'
            | '>'
    ) {
        return true;
    }
    if text == "-" || text.starts_with("- ") || text.starts_with("? ") || text.starts_with(": ") {
        return true;
    }
    text.contains(": ")
        || text.ends_with(':')
        || text.contains(" #")
        || text.contains('\n')
        || text.contains('\t')
}

fn quote(text: &str) -> String {
    if text.contains('\n') || text.contains('\t') || text.chars().any(char::is_control) {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('"');
        for c in text.chars() {
            match c {
                '"' => out.push_str("\\\""),
                '\\' => out.push_str("\\\\"),
                '\n' => out.push_str("\\n"),
                '\t' => out.push_str("\\t"),
                c if c.is_control() => {
                    let _ = write!(out, "\\x{:02x}", c as u32);
                }
                c => out.push(c),
            }
        }
        out.push('"');
        out
    } else {
        let mut out = String::with_capacity(text.len() + 2);
        out.push('\'');
        for c in text.chars() {
            if c == '\'' {
                out.push_str("''");
            } else {
                out.push(c);
            }
        }
        out.push('\'');
        out
    }
}
