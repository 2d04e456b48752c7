//! Normalized instance properties
//!
//! `InstanceProperties` is the comparable record derived from the opaque
//! instance properties of a group spec. Equality on this record is what
//! decides whether a group needs a new instance template.

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

const DEFAULT_NAME_PREFIX: &str = "instance";
const DEFAULT_DISK_SIZE_MB: i64 = 10;
const DEFAULT_DISK_TYPE: &str = "pd-standard";

/// Instance configuration understood by the provider
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceProperties {
    #[serde(default)]
    pub name_prefix: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub machine_type: String,

    #[serde(default)]
    pub network: String,

    #[serde(default)]
    pub disk_size_mb: i64,

    #[serde(default)]
    pub disk_image: String,

    #[serde(default)]
    pub disk_type: String,

    /// Network tags; order is not significant
    #[serde(default)]
    pub tags: Vec<String>,

    /// Service account scopes; order is not significant
    #[serde(default)]
    pub scopes: Vec<String>,

    #[serde(default)]
    pub preemptible: bool,

    #[serde(default)]
    pub target_pool: String,

    #[serde(default = "default_true")]
    pub auto_delete_disk: bool,

    #[serde(default)]
    pub reuse_existing_disk: bool,

    /// Extra metadata entries written into the template
    #[serde(default)]
    pub metadata: BTreeMap<String, String>,
}

fn default_true() -> bool {
    true
}

impl Default for InstanceProperties {
    fn default() -> Self {
        Self {
            name_prefix: DEFAULT_NAME_PREFIX.to_string(),
            description: String::new(),
            machine_type: String::new(),
            network: String::new(),
            disk_size_mb: DEFAULT_DISK_SIZE_MB,
            disk_image: String::new(),
            disk_type: DEFAULT_DISK_TYPE.to_string(),
            tags: Vec::new(),
            scopes: Vec::new(),
            preemptible: false,
            target_pool: String::new(),
            auto_delete_disk: true,
            reuse_existing_disk: false,
            metadata: BTreeMap::new(),
        }
    }
}

impl InstanceProperties {
    /// Parse raw properties and fill in provider defaults.
    ///
    /// Any decoding failure is reported as a validation error.
    pub fn parse(raw: &serde_json::Value) -> Result<Self> {
        let mut properties: InstanceProperties = if raw.is_null() {
            InstanceProperties::default()
        } else {
            serde_json::from_value(raw.clone())
                .map_err(|e| Error::validation(format!("Invalid instance properties: {}", e)))?
        };

        if properties.name_prefix.is_empty() {
            properties.name_prefix = DEFAULT_NAME_PREFIX.to_string();
        }
        if properties.disk_size_mb == 0 {
            properties.disk_size_mb = DEFAULT_DISK_SIZE_MB;
        }
        if properties.disk_type.is_empty() {
            properties.disk_type = DEFAULT_DISK_TYPE.to_string();
        }

        Ok(properties)
    }

    /// Names of required fields that are still empty
    pub fn missing_required(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.machine_type.is_empty() {
            missing.push("MachineType");
        }
        if self.network.is_empty() {
            missing.push("Network");
        }
        missing
    }

    /// Field-by-field value equality with tags and scopes compared as sets.
    ///
    /// A `false` result is the only trigger for a new instance template.
    pub fn same_as(&self, other: &Self) -> bool {
        self.name_prefix == other.name_prefix
            && self.description == other.description
            && self.machine_type == other.machine_type
            && self.network == other.network
            && self.disk_size_mb == other.disk_size_mb
            && self.disk_image == other.disk_image
            && self.disk_type == other.disk_type
            && sorted(&self.tags) == sorted(&other.tags)
            && sorted(&self.scopes) == sorted(&other.scopes)
            && self.preemptible == other.preemptible
            && self.target_pool == other.target_pool
            && self.auto_delete_disk == other.auto_delete_disk
            && self.reuse_existing_disk == other.reuse_existing_disk
            && self.metadata == other.metadata
    }
}

impl PartialEq for InstanceProperties {
    fn eq(&self, other: &Self) -> bool {
        self.same_as(other)
    }
}

impl Eq for InstanceProperties {}

fn sorted(values: &[String]) -> Vec<&str> {
    let mut out: Vec<&str> = values.iter().map(String::as_str).collect();
    out.sort_unstable();
    out
}
