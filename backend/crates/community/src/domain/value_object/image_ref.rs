//! Reference to an image held by the blob store

use serde::{Deserialize, Serialize};

/// Public URL plus the storage key used for deletion
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImageRef {
    pub url: String,
    pub key: String,
}

impl ImageRef {
    /// Both parts trimmed; `None` if either is blank
    pub fn new(url: impl AsRef<str>, key: impl AsRef<str>) -> Option<Self> {
        let url = url.as_ref().trim();
        let key = key.as_ref().trim();
        if url.is_empty() || key.is_empty() {
            return None;
        }
        Some(Self {
            url: url.to_string(),
            key: key.to_string(),
        })
    }

    /// Key of `old` that is no longer referenced once `new` is stored
    pub fn replaced_key(old: Option<&ImageRef>, new: Option<&ImageRef>) -> Option<String> {
        let old = old?;
        match new {
            Some(new) if new.key == old.key => None,
            _ => Some(old.key.clone()),
        }
    }
}
