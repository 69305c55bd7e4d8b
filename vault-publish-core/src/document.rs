//! Documents as the host environment hands them to the publisher.
//!
//! A [`Document`] is read-only to this crate: it carries the identity of a
//! markdown file (vault-relative `path`, display `name`) and the metadata the
//! host parsed from its frontmatter. Content is never stored here; it is read
//! on demand through [`crate::contract::DocumentHost::read_content`].

use std::collections::HashMap;

/// A single frontmatter value.
///
/// Frontmatter is YAML, so anything can appear; the publisher only ever
/// looks at booleans and strings. Sequences, mappings and nulls are kept as
/// [`MetaValue::Other`] so that they never compare equal to `true`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    String(String),
    Bool(bool),
    Number(f64),
    Other,
}

impl MetaValue {
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }
}

impl From<serde_yaml::Value> for MetaValue {
    fn from(value: serde_yaml::Value) -> Self {
        match value {
            serde_yaml::Value::Bool(b) => MetaValue::Bool(b),
            serde_yaml::Value::String(s) => MetaValue::String(s),
            serde_yaml::Value::Number(n) => match n.as_f64() {
                Some(f) => MetaValue::Number(f),
                None => MetaValue::Other,
            },
            serde_yaml::Value::Tagged(tagged) => MetaValue::from(tagged.value),
            _ => MetaValue::Other,
        }
    }
}

impl From<bool> for MetaValue {
    fn from(b: bool) -> Self {
        MetaValue::Bool(b)
    }
}

impl From<&str> for MetaValue {
    fn from(s: &str) -> Self {
        MetaValue::String(s.to_string())
    }
}

impl From<String> for MetaValue {
    fn from(s: String) -> Self {
        MetaValue::String(s)
    }
}

impl From<f64> for MetaValue {
    fn from(n: f64) -> Self {
        MetaValue::Number(n)
    }
}

impl From<i64> for MetaValue {
    fn from(n: i64) -> Self {
        MetaValue::Number(n as f64)
    }
}

/// Parsed frontmatter: unordered key -> value.
pub type Metadata = HashMap<String, MetaValue>;

/// A document known to the host.
#[derive(Debug, Clone, PartialEq)]
pub struct Document {
    /// Identifier unique within the vault (vault-relative, `/`-separated).
    pub path: String,
    /// Display name, the final segment of `path` including its extension.
    pub name: String,
    /// Frontmatter as last parsed by the host. `None` when the document has
    /// no frontmatter block (or it could not be parsed).
    pub metadata: Option<Metadata>,
}

impl Document {
    /// Builds a document whose display name is the last segment of `path`.
    pub fn new(path: impl Into<String>, metadata: Option<Metadata>) -> Self {
        let path = path.into();
        let name = path.rsplit('/').next().unwrap_or(&path).to_string();
        Document {
            path,
            name,
            metadata,
        }
    }

    pub fn meta(&self, key: &str) -> Option<&MetaValue> {
        self.metadata.as_ref().and_then(|m| m.get(key))
    }
}

/// Convenience for building metadata in callers and tests.
pub fn metadata<K, V, I>(entries: I) -> Metadata
where
    I: IntoIterator<Item = (K, V)>,
    K: Into<String>,
    V: Into<MetaValue>,
{
    entries
        .into_iter()
        .map(|(k, v)| (k.into(), v.into()))
        .collect()
}
