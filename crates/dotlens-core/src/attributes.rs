//! Per-element attribute storage.
//!
//! DOT attributes are untyped `name = value` string pairs. [`AttributeStore`]
//! keeps them in sorted key order so serialization is deterministic, and the
//! [`defaults`] module names the values Graphviz assumes when an attribute is
//! absent.

use std::collections::BTreeMap;

/// Values Graphviz assumes for attributes that are not set.
pub mod defaults {
    /// Font size in points.
    pub const FONT_SIZE: u32 = 14;
    pub const FONT_NAME: &str = "Times-Roman";
    pub const FONT_COLOR: &str = "black";
    pub const SHAPE: &str = "ellipse";
    pub const STYLE: &str = "solid";
    pub const LINE_COLOR: &str = "black";
    /// Fill color of a node without `fillcolor` or a filled `color`.
    pub const NODE_BACK_COLOR: &str = "white";
    pub const BACKGROUND_COLOR: &str = "white";
    /// Default z-order of every element.
    pub const Z: f64 = 1.0;
}

/// Ordered mapping from attribute name to attribute value.
///
/// Lookups of absent keys yield an empty string, mirroring how DOT treats an
/// unset attribute and an empty one the same way.
///
/// # Examples
///
/// ```
/// use dotlens_core::attributes::AttributeStore;
///
/// let mut attrs = AttributeStore::new();
/// assert!(attrs.set("shape", "box"));
/// assert!(!attrs.set("shape", "box"));
/// assert_eq!(attrs.get("shape"), "box");
/// assert_eq!(attrs.get("color"), "");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AttributeStore {
    entries: BTreeMap<String, String>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value for `key`, or `""` when absent.
    pub fn get(&self, key: &str) -> &str {
        self.entries.get(key).map(String::as_str).unwrap_or("")
    }

    /// Returns the value for `key` if present.
    pub fn value(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Sets `key` to `value`. Returns true iff the stored value changed.
    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) -> bool {
        let key = key.into();
        let value = value.into();
        match self.entries.get(&key) {
            Some(existing) if *existing == value => false,
            _ => {
                self.entries.insert(key, value);
                true
            }
        }
    }

    /// Removes `key`. Returns true iff it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        self.entries.remove(key).is_some()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Attribute names in sorted order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    /// `(name, value)` pairs in sorted name order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for AttributeStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut store = Self::new();
        store.extend(iter);
        store
    }
}

impl<K, V> Extend<(K, V)> for AttributeStore
where
    K: Into<String>,
    V: Into<String>,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (k, v) in iter {
            self.entries.insert(k.into(), v.into());
        }
    }
}
