//! Collaborator traits for fleet components
//!
//! These traits define the seams between the reconciliation core and the
//! pieces it drives: flavor plugins that shape instance specs, and the cloud
//! provider driver that performs the actual CRUD calls.

use crate::metadata::MetadataItem;
use crate::{Allocation, InstanceProperties, InstanceSpec, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// Deployment strategy that validates and augments instance specs
#[async_trait]
pub trait Flavor: Send + Sync {
    /// Validate flavor properties against the requested allocation
    async fn validate(&self, properties: &serde_json::Value, allocation: &Allocation) -> Result<()>;

    /// Return a copy of `spec` with flavor-specific tags, init or properties applied
    async fn prepare(
        &self,
        properties: &serde_json::Value,
        spec: InstanceSpec,
        allocation: &Allocation,
    ) -> Result<InstanceSpec>;
}

/// Resolves flavor plugins by name
pub trait FlavorLookup: Send + Sync {
    /// Find a flavor; unknown names yield `Error::NotFound`
    fn lookup(&self, name: &str) -> Result<Arc<dyn Flavor>>;
}

/// Managed-group operations of the cloud provider.
///
/// Deleting a manager or template that is already gone should succeed, so
/// that an interrupted teardown can simply be retried.
#[async_trait]
pub trait CloudDriver: Send + Sync {
    /// Create a named instance template
    async fn create_instance_template(&self, name: &str, settings: &InstanceSettings) -> Result<()>;

    /// Delete a named instance template
    async fn delete_instance_template(&self, name: &str) -> Result<()>;

    /// Create a managed instance group
    async fn create_instance_group_manager(
        &self,
        name: &str,
        settings: &InstanceManagerSettings,
    ) -> Result<()>;

    /// Point an existing manager at another template
    async fn set_instance_template(&self, group_name: &str, template_name: &str) -> Result<()>;

    /// Change the target size of a manager
    async fn resize_instance_group_manager(&self, name: &str, target_size: u64) -> Result<()>;

    /// Delete a managed instance group
    async fn delete_instance_group_manager(&self, name: &str) -> Result<()>;

    /// List the current members of a managed group
    async fn list_instance_group_instances(&self, name: &str) -> Result<Vec<GroupMember>>;

    /// Fetch a single instance by name
    async fn get_instance(&self, name: &str) -> Result<InstanceRecord>;
}

/// Single-instance operations of the cloud provider
#[async_trait]
pub trait InstanceDriver: Send + Sync {
    async fn create_instance(&self, name: &str, settings: &InstanceSettings) -> Result<()>;

    async fn delete_instance(&self, name: &str) -> Result<()>;

    async fn list_instances(&self) -> Result<Vec<InstanceRecord>>;
}

/// Settings for an instance template or a standalone instance
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InstanceSettings {
    pub description: String,
    pub machine_type: String,
    pub network: String,
    pub tags: Vec<String>,
    pub disk_size_mb: i64,
    pub disk_image: String,
    pub disk_type: String,
    pub scopes: Vec<String>,
    pub preemptible: bool,
    pub auto_delete_disk: bool,
    pub reuse_existing_disk: bool,
    pub metadata: Vec<MetadataItem>,
}

impl InstanceSettings {
    /// Build provider settings from normalized properties and encoded metadata
    pub fn from_properties(properties: &InstanceProperties, metadata: Vec<MetadataItem>) -> Self {
        Self {
            description: properties.description.clone(),
            machine_type: properties.machine_type.clone(),
            network: properties.network.clone(),
            tags: properties.tags.clone(),
            disk_size_mb: properties.disk_size_mb,
            disk_image: properties.disk_image.clone(),
            disk_type: properties.disk_type.clone(),
            scopes: properties.scopes.clone(),
            preemptible: properties.preemptible,
            auto_delete_disk: properties.auto_delete_disk,
            reuse_existing_disk: properties.reuse_existing_disk,
            metadata,
        }
    }
}

/// Settings for a managed instance group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceManagerSettings {
    pub template_name: String,
    pub target_size: u64,
    pub description: String,
    pub target_pool: String,
    pub base_instance_name: String,
}

/// Member reference returned when listing a managed group
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupMember {
    /// Instance URL or bare name
    pub instance: String,

    #[serde(default)]
    pub status: String,
}

impl GroupMember {
    /// Instance name, taken from the last path segment of the reference
    pub fn instance_name(&self) -> &str {
        self.instance.rsplit('/').next().unwrap_or(&self.instance)
    }
}

/// A provider instance record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceRecord {
    pub name: String,

    #[serde(default)]
    pub status: String,

    #[serde(default)]
    pub metadata: Vec<MetadataItem>,
}
