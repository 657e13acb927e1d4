//! The ordered, attribute-addressable settings document.
//!
//! A [`Document`] is a cheap-to-clone handle over an insertion-ordered map,
//! mirroring YAML's anchor/alias semantics: a nested mapping reachable
//! through two paths is one shared node, and mutation through either path is
//! visible through the other. [`Document::deep_clone`] produces an
//! independent copy; the `Clone` impl shares.

use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;

use indexmap::IndexMap;

use crate::error::{SettingsError, SettingsResult};

/// One value in a settings document.
#[derive(Clone)]
pub enum Value {
    /// YAML `null` / `~`.
    Null,
    /// Boolean scalar.
    Bool(bool),
    /// Integer scalar.
    Int(i64),
    /// Floating-point scalar.
    Float(f64),
    /// String scalar.
    Str(String),
    /// Block or flow sequence. Elements may be any [`Value`].
    Sequence(Vec<Value>),
    /// Nested mapping, held as a shared handle.
    Mapping(Document),
}

/// Ordered, attribute-addressable mapping of settings.
///
/// Key iteration order is insertion order, which is also serialization
/// order. Every nested mapping value is itself a `Document`.
#[derive(Clone, Default)]
pub struct Document {
    inner: Rc<RefCell<IndexMap<String, Value>>>,
}

impl Document {
    /// Creates an empty document.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a document from `(key, value)` pairs, preserving their order.
    pub fn from_pairs<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let doc = Self::new();
        for (key, value) in pairs {
            doc.set(key, value);
        }
        doc
    }

    /// Returns the value stored at `key`.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownAttribute`] when the key is absent,
    /// so callers can tell "no such setting" apart from other failures.
    pub fn get(&self, key: &str) -> SettingsResult<Value> {
        self.try_get(key)
            .ok_or_else(|| SettingsError::UnknownAttribute {
                key: key.to_owned(),
            })
    }

    /// Returns the value stored at `key`, or `None` when absent.
    #[must_use]
    pub fn try_get(&self, key: &str) -> Option<Value> {
        self.inner.borrow().get(key).cloned()
    }

    /// Stores `value` at `key`.
    ///
    /// Existing keys keep their position; new keys append. Mapping values
    /// are stored as shared handles.
    pub fn set(&self, key: impl Into<String>, value: impl Into<Value>) {
        self.inner.borrow_mut().insert(key.into(), value.into());
    }

    /// Removes `key`, preserving the order of the remaining entries.
    pub fn remove(&self, key: &str) -> Option<Value> {
        self.inner.borrow_mut().shift_remove(key)
    }

    /// True when `key` is present.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.inner.borrow().contains_key(key)
    }

    /// Keys in insertion order.
    #[must_use]
    pub fn keys(&self) -> Vec<String> {
        self.inner.borrow().keys().cloned().collect()
    }

    /// Snapshot of the entries in insertion order.
    #[must_use]
    pub fn entries(&self) -> Vec<(String, Value)> {
        self.inner
            .borrow()
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Number of top-level entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// True when the document has no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    /// Follows a dotted path (`"database.host"`) through nested mappings.
    ///
    /// # Errors
    ///
    /// Returns [`SettingsError::UnknownAttribute`] carrying the full dotted
    /// path when any segment is absent or a non-terminal segment is not a
    /// mapping.
    pub fn get_path(&self, dotted: &str) -> SettingsResult<Value> {
        let miss = || SettingsError::UnknownAttribute {
            key: dotted.to_owned(),
        };
        let mut current = Value::Mapping(self.clone());
        for segment in dotted.split('.') {
            let Value::Mapping(doc) = current else {
                return Err(miss());
            };
            current = doc.try_get(segment).ok_or_else(miss)?;
        }
        Ok(current)
    }

    /// Replaces this document's entries with `other`'s.
    pub(crate) fn replace_contents(&self, other: &Self) {
        if Rc::ptr_eq(&self.inner, &other.inner) {
            return;
        }
        let snapshot = other.inner.borrow().clone();
        *self.inner.borrow_mut() = snapshot;
    }

    /// True when `other` is the same underlying node.
    #[must_use]
    pub fn same_node(&self, other: &Self) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }

    /// Stable identity of the underlying node, used for alias detection.
    pub(crate) fn node_id(&self) -> usize {
        Rc::as_ptr(&self.inner) as usize
    }
}

impl Value {
    /// String slice when this is a string scalar.
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Integer value when this is an integer scalar.
    #[must_use]
    pub const fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(n) => Some(*n),
            _ => None,
        }
    }

    /// Float value when this is a float scalar.
    #[must_use]
    pub const fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(n) => Some(*n),
            _ => None,
        }
    }

    /// Boolean value when this is a boolean scalar.
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Shared handle when this is a nested mapping.
    #[must_use]
    pub fn as_mapping(&self) -> Option<Document> {
        match self {
            Self::Mapping(doc) => Some(doc.clone()),
            _ => None,
        }
    }

    /// Element slice when this is a sequence.
    #[must_use]
    pub fn as_sequence(&self) -> Option<&[Value]> {
        match self {
            Self::Sequence(items) => Some(items),
            _ => None,
        }
    }

    /// True for `null`.
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// True for any non-sequence, non-mapping value.
    #[must_use]
    pub const fn is_scalar(&self) -> bool {
        !matches!(self, Self::Sequence(_) | Self::Mapping(_))
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Self::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Self::Int(i64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Self::Float(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Self::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Self::Str(v)
    }
}

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Self::Mapping(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Self::Sequence(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        v.map_or(Self::Null, Into::into)
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Int(a), Self::Int(b)) => a == b,
            (Self::Float(a), Self::Float(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Sequence(a), Self::Sequence(b)) => a == b,
            (Self::Mapping(a), Self::Mapping(b)) => a == b,
            _ => false,
        }
    }
}

impl PartialEq for Document {
    fn eq(&self, other: &Self) -> bool {
        if self.same_node(other) {
            return true;
        }
        self.entries() == other.entries()
    }
}

impl fmt::Display for Document {
    /// Renders the document as canonical block-style YAML.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&crate::ser::to_yaml(self))
    }
}

impl fmt::Debug for Document {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for (key, value) in self.entries() {
            map.entry(&key, &value);
        }
        map.finish()
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => write!(f, "{v}"),
            Self::Int(v) => write!(f, "{v}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Str(v) => write!(f, "{v:?}"),
            Self::Sequence(items) => f.debug_list().entries(items).finish(),
            Self::Mapping(doc) => doc.fmt(f),
        }
    }
}

/// Builds a [`Document`] literal, auto-promoting nested values.
///
/// ```
/// use strata_config::doc;
///
/// let settings = doc! {
///     "config" => doc! {
///         "greet" => "Hello",
///         "meaning" => 42,
///     },
/// };
/// assert_eq!(settings.get_path("config.meaning").unwrap().as_i64(), Some(42));
/// ```
#[macro_export]
macro_rules! doc {
    () => { $crate::Document::new() };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let doc = $crate::Document::new();
        $( doc.set($key, $value); )+
        doc
    }};
}
