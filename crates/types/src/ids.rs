//! Newtype wrapper for installable-unit identifiers.
//!
//! Identifiers are opaque: the engine only ever compares and hashes them,
//! it never parses their contents.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hash;
use std::sync::Arc;

/// The identifier of a versioned item (e.g. `org.example.core`).
#[derive(Debug, Clone, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct ItemId(Arc<str>);

impl ItemId {
    /// Creates a new ItemId from a string
    pub fn new(id: impl Into<Arc<str>>) -> Self {
        Self(id.into())
    }

    /// Returns the string representation of this identifier
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<String> for ItemId {
    fn from(s: String) -> Self {
        Self(s.into())
    }
}

impl From<&str> for ItemId {
    fn from(s: &str) -> Self {
        Self(s.into())
    }
}

impl From<Arc<str>> for ItemId {
    fn from(s: Arc<str>) -> Self {
        Self(s)
    }
}

impl From<ItemId> for String {
    fn from(id: ItemId) -> Self {
        id.0.to_string()
    }
}

impl AsRef<str> for ItemId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ItemId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_item_id_creation() {
        let id1 = ItemId::new("org.example.core");
        let id2 = ItemId::from("org.example.core");
        let id3 = ItemId::from(String::from("org.example.core"));

        assert_eq!(id1, id2);
        assert_eq!(id2, id3);
        assert_eq!(id1.as_str(), "org.example.core");
    }

    #[test]
    fn test_item_id_display() {
        let id = ItemId::new("org.example.ui");
        assert_eq!(format!("{}", id), "org.example.ui");
    }

    #[test]
    fn test_item_id_serde_as_plain_string() {
        let id = ItemId::new("org.example.ui");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"org.example.ui\"");
        let back: ItemId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_item_ids_usable_as_map_keys() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(ItemId::new("a"), 1);
        map.insert(ItemId::new("b"), 2);

        assert_eq!(map.get(&ItemId::new("a")), Some(&1));
        assert_eq!(map.get(&ItemId::new("b")), Some(&2));
    }
}
