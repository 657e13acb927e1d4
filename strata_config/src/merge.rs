//! The merge algebra: `update`, `rebase`, `deep_clone`, `limit`.
//!
//! `update` is the primitive: a recursive deep merge where incoming values
//! win, sequences are replaced wholesale, and an incoming null never erases
//! an existing mapping. `rebase` is its inverse orientation, re-parenting a
//! document onto a new base while keeping its own values as the override
//! layer.

use std::collections::HashMap;

use crate::document::{Document, Value};

impl Document {
    /// Recursively merges `other` into `self`, mutating `self`.
    ///
    /// Per node kind:
    /// - mapping over mapping recurses key by key; keys only in `other` are
    ///   added, keys only in `self` are kept;
    /// - an incoming sequence replaces the target wholesale, never
    ///   concatenates or merges element-wise;
    /// - an incoming scalar replaces whatever was there;
    /// - an incoming null replaces scalars but never an existing mapping, so
    ///   a null sentinel cannot erase a subtree.
    ///
    /// Subtrees copied in from `other` are independent of it, but alias
    /// sharing inside the incoming tree is kept: one shared node in `other`
    /// becomes one shared node here.
    pub fn update(&self, other: &Self) {
        if self.same_node(other) {
            return;
        }
        let mut seen = CopyTable::new();
        for (key, incoming) in other.entries() {
            let existing = self.try_get(&key);
            self.set(key, merge_value(existing, &incoming, &mut seen));
        }
    }

    /// Re-parents `self` onto `base`: `self` becomes "`base`, overridden by
    /// what `self` already had".
    ///
    /// Values present in `self` win over `base`; values only in `base` are
    /// inherited. This is the override-resolution step used when a named
    /// section inherits from a shared default section.
    pub fn rebase(&self, base: &Self) {
        let rebased = base.deep_clone();
        rebased.update(self);
        self.replace_contents(&rebased);
    }

    /// Returns an independent deep copy.
    ///
    /// No structure is shared with the original. Alias sharing *within* the
    /// copied tree is preserved: a node reachable through two paths in
    /// `self` is reachable through two paths in the copy, as one node.
    #[must_use]
    pub fn deep_clone(&self) -> Self {
        let mut seen = CopyTable::new();
        copy_document(self, &mut seen)
    }

    /// Removes every top-level key not present in `keys`, keeping the order
    /// of the surviving entries.
    pub fn limit(&self, keys: &[&str]) {
        for key in self.keys() {
            if !keys.contains(&key.as_str()) {
                self.remove(&key);
            }
        }
    }
}

/// Copies already made during one merge/clone pass, keyed by source node
/// identity. Keeps alias sharing intact without copying a node twice.
type CopyTable = HashMap<usize, Document>;

fn merge_value(existing: Option<Value>, incoming: &Value, seen: &mut CopyTable) -> Value {
    match incoming {
        Value::Mapping(update) => {
            if let Some(shared) = seen.get(&update.node_id()) {
                return Value::Mapping(shared.clone());
            }
            let target = match existing {
                Some(Value::Mapping(doc)) => doc,
                _ => Document::new(),
            };
            seen.insert(update.node_id(), target.clone());
            for (key, value) in update.entries() {
                let current = target.try_get(&key);
                target.set(key, merge_value(current, &value, seen));
            }
            Value::Mapping(target)
        }
        Value::Sequence(items) => Value::Sequence(
            items
                .iter()
                .map(|item| merge_value(None, item, seen))
                .collect(),
        ),
        Value::Null => match existing {
            // A null sentinel must not erase a subtree.
            Some(mapping @ Value::Mapping(_)) => mapping,
            _ => Value::Null,
        },
        scalar => scalar.clone(),
    }
}

fn copy_document(source: &Document, seen: &mut CopyTable) -> Document {
    if let Some(copied) = seen.get(&source.node_id()) {
        return copied.clone();
    }
    let copy = Document::new();
    seen.insert(source.node_id(), copy.clone());
    for (key, value) in source.entries() {
        copy.set(key, copy_value(&value, seen));
    }
    copy
}

fn copy_value(value: &Value, seen: &mut CopyTable) -> Value {
    match value {
        Value::Mapping(doc) => Value::Mapping(copy_document(doc, seen)),
        Value::Sequence(items) => {
            Value::Sequence(items.iter().map(|item| copy_value(item, seen)).collect())
        }
        scalar => scalar.clone(),
    }
}

#[cfg(test)]
mod tests {
    use crate::doc;
    use crate::document::Value;

    #[test]
    fn disjoint_keys_are_unioned_and_overlaps_lose_to_the_incoming_side() {
        let base = doc! { "keep" => 1, "shared" => "old" };
        let over = doc! { "shared" => "new", "added" => 2 };
        base.update(&over);
        assert_eq!(base.keys(), ["keep", "shared", "added"]);
        assert_eq!(base.get("shared").unwrap().as_str(), Some("new"));
        assert_eq!(base.get("added").unwrap().as_i64(), Some(2));
    }

    #[test]
    fn update_with_own_deep_clone_is_identity() {
        let doc = doc! {
            "config" => doc! { "greet" => "Hello", "meaning" => 42 },
            "list" => vec![1, 2, 3],
        };
        let before = doc.to_string();
        doc.update(&doc.deep_clone());
        assert_eq!(doc.to_string(), before);
    }

    #[test]
    fn sequences_are_replaced_wholesale() {
        let doc = doc! { "k" => vec![1, 2, 3] };
        doc.update(&doc! { "k" => vec![4] });
        assert_eq!(
            doc.get("k").unwrap(),
            Value::Sequence(vec![Value::Int(4)])
        );
    }

    #[test]
    fn incoming_null_spares_mappings_but_replaces_scalars() {
        let doc = doc! {
            "tree" => doc! { "leaf" => 1 },
            "scalar" => "present",
        };
        doc.update(&doc! { "tree" => Value::Null, "scalar" => Value::Null });
        assert_eq!(
            doc.get_path("tree.leaf").unwrap().as_i64(),
            Some(1)
        );
        assert!(doc.get("scalar").unwrap().is_null());
    }

    #[test]
    fn merged_subtrees_are_independent_of_the_source() {
        let base = doc! {};
        let over = doc! { "section" => doc! { "value" => 1 } };
        base.update(&over);
        over.get("section")
            .unwrap()
            .as_mapping()
            .unwrap()
            .set("value", 2);
        assert_eq!(base.get_path("section.value").unwrap().as_i64(), Some(1));
    }

    #[test]
    fn update_keeps_alias_sharing_within_the_incoming_tree() {
        let shared = doc! { "name" => "hi" };
        let over = doc! { "a" => shared.clone(), "b" => shared };
        let base = doc! {};
        base.update(&over);
        let a = base.get("a").unwrap().as_mapping().unwrap();
        let b = base.get("b").unwrap().as_mapping().unwrap();
        assert!(a.same_node(&b));
    }

    #[test]
    fn rebase_inherits_the_base_and_keeps_own_overrides() {
        let settings = doc! { "config" => doc! { "secret" => "s2" } };
        let defaults = doc! {
            "config" => doc! { "greet" => "Hello", "leave" => "Goodbye", "secret" => "s1" },
        };
        settings.rebase(&defaults);
        let config = settings.get("config").unwrap().as_mapping().unwrap();
        assert_eq!(config.get("greet").unwrap().as_str(), Some("Hello"));
        assert_eq!(config.get("leave").unwrap().as_str(), Some("Goodbye"));
        assert_eq!(config.get("secret").unwrap().as_str(), Some("s2"));
    }

    #[test]
    fn rebase_then_reapplying_the_original_reproduces_its_keys() {
        let original = doc! { "config" => doc! { "secret" => "s2" } };
        let snapshot = original.deep_clone();
        original.rebase(&doc! { "config" => doc! { "greet" => "Hello", "secret" => "s1" } });
        original.update(&snapshot);
        assert_eq!(
            original.get_path("config.secret").unwrap().as_str(),
            Some("s2")
        );
        assert_eq!(
            original.get_path("config.greet").unwrap().as_str(),
            Some("Hello")
        );
    }

    #[test]
    fn deep_clone_isolates_changes() {
        let settings = doc! { "config" => doc! { "greet" => "Hello" } };
        let clone = settings.deep_clone();
        settings
            .get("config")
            .unwrap()
            .as_mapping()
            .unwrap()
            .set("greet", "Hodo");
        assert_eq!(
            clone.get_path("config.greet").unwrap().as_str(),
            Some("Hello")
        );
    }

    #[test]
    fn deep_clone_preserves_internal_sharing() {
        let shared = doc! { "name" => "hi" };
        let original = doc! { "a" => shared.clone(), "b" => shared };
        let clone = original.deep_clone();
        let a = clone.get("a").unwrap().as_mapping().unwrap();
        let b = clone.get("b").unwrap().as_mapping().unwrap();
        assert!(a.same_node(&b));
        assert!(!a.same_node(&original.get("a").unwrap().as_mapping().unwrap()));
    }

    #[test]
    fn limit_keeps_only_the_allow_list() {
        let doc = doc! { "a" => 1, "b" => 2, "c" => 3 };
        doc.limit(&["c", "a"]);
        assert_eq!(doc.keys(), ["a", "c"]);
    }
}
