//! Tag encoding into provider metadata
//!
//! Providers store arbitrary instance data as a flat list of key/value items.
//! Tags are written into and read back out of that list without interpretation.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Metadata key carrying an instance init script
pub const STARTUP_SCRIPT_KEY: &str = "startup-script";

/// A single provider metadata entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataItem {
    pub key: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub value: Option<String>,
}

impl MetadataItem {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: Some(value.into()),
        }
    }
}

/// Encode tags as metadata items, ordered by key
pub fn tags_to_metadata(tags: &BTreeMap<String, String>) -> Vec<MetadataItem> {
    tags.iter()
        .map(|(key, value)| MetadataItem::new(key.clone(), value.clone()))
        .collect()
}

/// Decode metadata items back into tags; items without a value decode to ""
pub fn metadata_to_tags(items: &[MetadataItem]) -> BTreeMap<String, String> {
    items
        .iter()
        .map(|item| (item.key.clone(), item.value.clone().unwrap_or_default()))
        .collect()
}
