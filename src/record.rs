//! Searchable record contract.
//!
//! The index never looks inside a record beyond two things: a stable
//! identifier and a lookup of named text fields. Any type that provides
//! those can be indexed.

use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fmt::{self, Debug};
use std::hash::Hash;

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A record that can be stored in a trigram index.
///
/// The identifier must not change while the record is indexed. Fields that
/// are missing or empty are skipped during indexing.
pub trait Searchable: Clone + Send + Sync {
    /// Stable unique identifier type.
    type Id: Clone + Eq + Hash + Debug + Send + Sync;

    /// The record's identifier.
    fn id(&self) -> Self::Id;

    /// Text content of the named field, if present.
    fn field(&self, name: &str) -> Option<Cow<'_, str>>;

    /// Join the given fields with single spaces, skipping empty ones.
    fn searchable_text(&self, fields: &[String]) -> String {
        let mut text = String::new();
        for name in fields {
            let Some(value) = self.field(name) else {
                continue;
            };
            if value.trim().is_empty() {
                continue;
            }
            if !text.is_empty() {
                text.push(' ');
            }
            text.push_str(&value);
        }
        text
    }
}

/// A record identifier that is either an integer or a string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Int(n) => write!(f, "{}", n),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        Self::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<String> for RecordId {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

/// A schemaless record: an identifier plus arbitrary JSON fields.
///
/// This is the shape the JSON corpus files use. Text fields are read as
/// follows: strings as-is, numbers and booleans via their display form,
/// arrays by joining their string-like elements with spaces. Objects and
/// nulls contribute nothing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Document {
    /// Stable identifier.
    pub id: RecordId,
    /// All other fields.
    #[serde(flatten)]
    pub fields: BTreeMap<String, Value>,
}

impl Document {
    /// Create a document with no fields.
    pub fn new(id: impl Into<RecordId>) -> Self {
        Self {
            id: id.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Builder-style field setter.
    pub fn with_field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.insert(name.into(), value.into());
        self
    }

    /// Get a field as a string slice, if it is a JSON string.
    pub fn get_str(&self, name: &str) -> Option<&str> {
        self.fields.get(name).and_then(Value::as_str)
    }
}

fn scalar_text(value: &Value) -> Option<Cow<'_, str>> {
    match value {
        Value::String(s) => Some(Cow::Borrowed(s.as_str())),
        Value::Number(n) => Some(Cow::Owned(n.to_string())),
        Value::Bool(b) => Some(Cow::Owned(b.to_string())),
        _ => None,
    }
}

impl Searchable for Document {
    type Id = RecordId;

    fn id(&self) -> RecordId {
        self.id.clone()
    }

    fn field(&self, name: &str) -> Option<Cow<'_, str>> {
        match self.fields.get(name)? {
            Value::Array(items) => {
                let parts: Vec<Cow<'_, str>> = items.iter().filter_map(scalar_text).collect();
                if parts.is_empty() {
                    None
                } else {
                    Some(Cow::Owned(parts.join(" ")))
                }
            }
            other => scalar_text(other),
        }
    }
}
