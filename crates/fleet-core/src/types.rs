//! Core type definitions for fleet

use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// Unique identifier for a watched group
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(String);

impl GroupId {
    /// Create a new GroupId from a string
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Get the string representation of the GroupId
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// True when the id is empty or whitespace only
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for GroupId {
    fn from(id: String) -> Self {
        Self(id)
    }
}

impl From<&str> for GroupId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Provider-side name of a single instance
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InstanceId(String);

impl InstanceId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InstanceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<&str> for InstanceId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

/// Desired instance count for a group.
///
/// `logical_ids` is accepted on the wire so that it can be rejected with a
/// useful message; identity-based placement is not supported.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Allocation {
    #[serde(rename = "Size", default)]
    pub size: i64,

    #[serde(rename = "LogicalIDs", default, skip_serializing_if = "Option::is_none")]
    pub logical_ids: Option<Vec<String>>,
}

impl Allocation {
    /// Allocation of `size` anonymous instances
    pub fn with_size(size: i64) -> Self {
        Self {
            size,
            logical_ids: None,
        }
    }

    /// True when explicit instance identities were requested
    pub fn has_logical_ids(&self) -> bool {
        self.logical_ids.as_ref().is_some_and(|ids| !ids.is_empty())
    }

    /// Size as a provider target, clamped at zero
    pub fn target_size(&self) -> u64 {
        self.size.max(0) as u64
    }
}

/// Reference to a plugin by name plus its opaque properties
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PluginSpec {
    #[serde(default)]
    pub plugin: String,

    #[serde(default)]
    pub properties: serde_json::Value,
}

impl PluginSpec {
    pub fn new(plugin: impl Into<String>, properties: serde_json::Value) -> Self {
        Self {
            plugin: plugin.into(),
            properties,
        }
    }
}

/// Raw group specification as declared by the orchestrator
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupSpec {
    #[serde(rename = "ID")]
    pub id: GroupId,

    #[serde(rename = "Properties", default)]
    pub properties: serde_json::Value,
}

impl GroupSpec {
    pub fn new(id: impl Into<GroupId>, properties: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            properties,
        }
    }

    /// Load a spec from JSON or YAML text; YAML is a superset so it parses both
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(text)?)
    }
}

/// Structured view of `GroupSpec::properties`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupProperties {
    #[serde(default)]
    pub allocation: Allocation,

    #[serde(default)]
    pub instance: PluginSpec,

    #[serde(default)]
    pub flavor: PluginSpec,
}

impl GroupProperties {
    /// Parse the properties of a group spec
    pub fn parse(spec: &GroupSpec) -> Result<Self> {
        if spec.properties.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(spec.properties.clone())
            .map_err(|e| Error::validation(format!("Invalid group properties: {}", e)))
    }
}

/// Instance spec handed to flavors for augmentation
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceSpec {
    #[serde(default)]
    pub properties: serde_json::Value,

    #[serde(default)]
    pub tags: BTreeMap<String, String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub init: Option<String>,
}

impl InstanceSpec {
    /// Spec with no tags carrying the given properties
    pub fn from_properties(properties: serde_json::Value) -> Self {
        Self {
            properties,
            tags: BTreeMap::new(),
            init: None,
        }
    }
}

/// A live instance as reported back to the orchestrator
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct InstanceDescription {
    #[serde(rename = "ID")]
    pub id: InstanceId,
    pub tags: BTreeMap<String, String>,
}

/// Convergence report for a watched group
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct GroupDescription {
    pub converged: bool,
    pub instances: Vec<InstanceDescription>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_group_id_blank() {
        assert!(GroupId::new("").is_blank());
        assert!(GroupId::new("  ").is_blank());
        assert!(!GroupId::new("workers").is_blank());
        assert_eq!(GroupId::from("workers").to_string(), "workers");
    }

    #[test]
    fn test_parse_group_properties() {
        let spec = GroupSpec::new(
            "workers",
            json!({
                "Allocation": {"Size": 3},
                "Instance": {"Plugin": "instance-gcp", "Properties": {"MachineType": "n1-standard-1"}},
                "Flavor": {"Plugin": "vanilla", "Properties": {"Init": "echo hi"}}
            }),
        );

        let props = GroupProperties::parse(&spec).unwrap();
        assert_eq!(props.allocation.size, 3);
        assert!(!props.allocation.has_logical_ids());
        assert_eq!(props.instance.plugin, "instance-gcp");
        assert_eq!(props.flavor.plugin, "vanilla");
        assert_eq!(props.instance.properties["MachineType"], "n1-standard-1");
    }

    #[test]
    fn test_parse_rejects_malformed_properties() {
        let spec = GroupSpec::new("workers", json!({"Allocation": {"Size": "three"}}));
        let err = GroupProperties::parse(&spec).unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
    }

    #[test]
    fn test_logical_ids() {
        let mut allocation = Allocation::with_size(2);
        allocation.logical_ids = Some(vec![]);
        assert!(!allocation.has_logical_ids());

        allocation.logical_ids = Some(vec!["a".into()]);
        assert!(allocation.has_logical_ids());
    }

    #[test]
    fn test_target_size_clamps_negative() {
        assert_eq!(Allocation::with_size(-4).target_size(), 0);
        assert_eq!(Allocation::with_size(5).target_size(), 5);
    }

    #[test]
    fn test_group_spec_from_yaml() {
        let yaml = r#"
ID: workers
Properties:
  Allocation:
    Size: 2
"#;
        let spec = GroupSpec::from_yaml_str(yaml).unwrap();
        assert_eq!(spec.id.as_str(), "workers");
        assert_eq!(GroupProperties::parse(&spec).unwrap().allocation.size, 2);

        let spec = GroupSpec::from_yaml_str(r#"{"ID": "json-group"}"#).unwrap();
        assert_eq!(spec.id.as_str(), "json-group");
        assert!(spec.properties.is_null());
    }
}
