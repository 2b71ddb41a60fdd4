use serde::{Deserialize, Serialize};

/// A single key/value pair of a resource table
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct ResourceEntry {
    /// Resource name, unique within a table
    pub key: String,

    /// Resource text
    pub value: String,
}

impl ResourceEntry {
    /// Create a new entry
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

impl<K: Into<String>, V: Into<String>> From<(K, V)> for ResourceEntry {
    fn from((key, value): (K, V)) -> Self {
        Self::new(key, value)
    }
}
