//! Global string attributes of a dataset.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Well-known global attribute names.
pub mod keys {
    pub const CONVENTIONS: &str = "Conventions";
    pub const VERSION: &str = "Version";
    pub const SOFA_CONVENTIONS: &str = "SOFAConventions";
    pub const SOFA_CONVENTIONS_VERSION: &str = "SOFAConventionsVersion";
    pub const DATA_TYPE: &str = "DataType";
    pub const ROOM_TYPE: &str = "RoomType";
    pub const ROOM_DESCRIPTION: &str = "RoomDescription";
    pub const TITLE: &str = "Title";
    pub const DATE_CREATED: &str = "DateCreated";
    pub const DATE_MODIFIED: &str = "DateModified";
    pub const API_NAME: &str = "APIName";
    pub const API_VERSION: &str = "APIVersion";
    pub const AUTHOR_CONTACT: &str = "AuthorContact";
    pub const ORGANIZATION: &str = "Organization";
    pub const LICENSE: &str = "License";
    pub const COMMENT: &str = "Comment";
    pub const HISTORY: &str = "History";
    pub const REFERENCES: &str = "References";
    pub const DATABASE_NAME: &str = "DatabaseName";
    pub const LISTENER_SHORT_NAME: &str = "ListenerShortName";
}

/// Global attributes, keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Metadata {
    attributes: BTreeMap<String, String>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Sets `key`, replacing any previous value.
    pub fn set(&mut self, key: &str, value: impl Into<String>) {
        self.attributes.insert(key.to_string(), value.into());
    }

    /// Sets `key` only if it has no value yet. Returns whether it was set.
    pub fn create(&mut self, key: &str, value: impl Into<String>) -> bool {
        if self.attributes.contains_key(key) {
            return false;
        }
        self.attributes.insert(key.to_string(), value.into());
        true
    }

    pub fn remove(&mut self, key: &str) -> Option<String> {
        self.attributes.remove(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.attributes.contains_key(key)
    }

    /// Attribute names in sorted order.
    pub fn list(&self) -> Vec<&str> {
        self.attributes.keys().map(String::as_str).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    pub fn len(&self) -> usize {
        self.attributes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attributes.is_empty()
    }
}
