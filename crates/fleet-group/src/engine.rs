//! Group reconciliation engine
//!
//! `GroupPlugin` owns the registry of watched groups and turns each committed
//! spec into the driver calls needed to converge the provider on it. Every
//! public operation holds the registry lock for its whole duration, including
//! the driver calls it awaits, so operations never interleave.

use crate::flavor::FlavorRegistry;
use crate::registry::{GroupRegistry, GroupSettings, TemplateHistory};
use crate::validator::{NormalizedSettings, SpecValidator};
use fleet_core::{
    metadata_to_tags, CloudDriver, Error, FlavorLookup, GroupDescription, GroupId, GroupSpec,
    InstanceDescription, InstanceId, InstanceManagerSettings, InstanceSettings, Result,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Driver operations required to move a group from its stored to its new settings
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CommitPlan {
    pub create_template: bool,
    pub create_manager: bool,
    /// Reserved for pointing an existing manager at a new template. No diff
    /// outcome sets it yet, so new templates only reach instances created by
    /// a fresh manager.
    pub update_manager: bool,
    pub resize: bool,
    /// Human-readable description of each step
    pub operations: Vec<String>,
}

impl CommitPlan {
    /// Diff `new` against the stored settings of the group, if any
    pub fn new(stored: Option<&GroupSettings>, new: &NormalizedSettings) -> Self {
        let target_size = new.allocation().size;
        let mut plan = CommitPlan::default();

        match stored {
            None => {
                plan.operations.push(format!("Managing {} instances", target_size));
                plan.create_template = true;
                plan.create_manager = true;
            }
            Some(stored) => {
                if !stored.instance_properties().same_as(&new.instance_properties) {
                    plan.operations.push("Updating instance template".to_string());
                    plan.create_template = true;
                }
                if stored.allocation().size != target_size {
                    plan.operations
                        .push(format!("Scaling group to {} instance.", target_size));
                    plan.resize = true;
                }
            }
        }

        plan
    }

    /// True when no driver call is needed
    pub fn is_noop(&self) -> bool {
        !(self.create_template || self.create_manager || self.update_manager || self.resize)
    }

    /// Newline-joined operation descriptions
    pub fn summary(&self) -> String {
        self.operations.join("\n")
    }
}

/// Reconciles declared group specs against the cloud provider
pub struct GroupPlugin {
    driver: Arc<dyn CloudDriver>,
    validator: SpecValidator,
    registry: Mutex<GroupRegistry>,
}

impl GroupPlugin {
    /// Create a plugin over `driver`, resolving flavors through `flavors`
    pub fn new(driver: Arc<dyn CloudDriver>, flavors: Arc<dyn FlavorLookup>) -> Self {
        Self {
            driver,
            validator: SpecValidator::new(flavors),
            registry: Mutex::new(GroupRegistry::new()),
        }
    }

    /// Create a plugin with only the built-in flavors available
    pub fn with_builtin_flavors(driver: Arc<dyn CloudDriver>) -> Self {
        Self::new(driver, Arc::new(FlavorRegistry::with_builtin()))
    }

    /// Flavor applied to specs that do not name one
    pub fn with_default_flavor(mut self, name: impl Into<String>) -> Self {
        self.validator = self.validator.with_default_flavor(name);
        self
    }

    /// Validate a spec without committing it
    pub async fn validate(&self, spec: &GroupSpec) -> Result<()> {
        self.validator.validate(spec).await.map(|_| ())
    }

    /// Converge the provider on `spec`.
    ///
    /// With `pretend` set, only the summary of intended operations is
    /// returned. A driver failure aborts the commit with the registry left at
    /// the previously committed settings; driver calls that already succeeded
    /// are not undone.
    pub async fn commit_group(&self, spec: &GroupSpec, pretend: bool) -> Result<String> {
        let mut registry = self.registry.lock().await;

        let new_settings = self.validator.validate(spec).await?;

        info!("Committing group {} (pretend={})", spec.id, pretend);

        let stored = registry.get(&spec.id).cloned();
        let plan = CommitPlan::new(stored.as_ref(), &new_settings);
        debug!("commit plan for {}: {:?}", spec.id, plan);

        if pretend {
            return Ok(plan.summary());
        }

        let replaces_template = plan.create_template && stored.is_some();
        let mut templates = stored
            .map(|settings| settings.templates)
            .unwrap_or_else(TemplateHistory::new);
        if replaces_template {
            templates.bump();
        }

        let name = spec.id.as_str();
        let template_name = templates.template_name(&spec.id);
        let target_size = new_settings.allocation().target_size();
        let properties = &new_settings.instance_properties;

        if plan.create_template {
            debug!("creating instance template {}", template_name);
            let settings =
                InstanceSettings::from_properties(properties, new_settings.template_metadata());
            self.driver
                .create_instance_template(&template_name, &settings)
                .await?;
        }

        if plan.create_manager {
            debug!("creating instance group manager {} with {} instances", name, target_size);
            let settings = InstanceManagerSettings {
                template_name: template_name.clone(),
                target_size,
                description: properties.description.clone(),
                target_pool: properties.target_pool.clone(),
                base_instance_name: properties.name_prefix.clone(),
            };
            self.driver
                .create_instance_group_manager(name, &settings)
                .await?;
        }

        if plan.update_manager {
            self.driver
                .set_instance_template(name, &template_name)
                .await?;
        }

        if plan.resize {
            debug!("resizing instance group manager {} to {}", name, target_size);
            self.driver
                .resize_instance_group_manager(name, target_size)
                .await?;
        }

        templates.record(template_name);
        registry.insert(spec.id.clone(), GroupSettings::new(new_settings, templates));

        Ok(plan.summary())
    }

    /// Stop watching a group without touching provider resources
    pub async fn free_group(&self, id: &GroupId) -> Result<()> {
        let mut registry = self.registry.lock().await;

        registry
            .remove(id)
            .ok_or_else(|| Error::not_watched(id.clone()))?;

        info!("Freed group {}", id);
        Ok(())
    }

    /// Report the live members of a group and whether it has converged
    pub async fn describe_group(&self, id: &GroupId) -> Result<GroupDescription> {
        let registry = self.registry.lock().await;

        let settings = registry
            .get(id)
            .ok_or_else(|| Error::not_watched(id.clone()))?;

        let members = self
            .driver
            .list_instance_group_instances(id.as_str())
            .await?;

        let mut instances = Vec::with_capacity(members.len());
        for member in &members {
            let instance = self.driver.get_instance(member.instance_name()).await?;
            instances.push(InstanceDescription {
                id: InstanceId::new(instance.name),
                tags: metadata_to_tags(&instance.metadata),
            });
        }

        let converged = members.len() as i64 == settings.allocation().size;
        debug!(
            "group {} has {}/{} instances",
            id,
            members.len(),
            settings.allocation().size
        );

        Ok(GroupDescription {
            converged,
            instances,
        })
    }

    /// Delete the manager and every template ever created for a group, then
    /// stop watching it. On failure the group stays watched so the call can
    /// be retried.
    pub async fn destroy_group(&self, id: &GroupId) -> Result<()> {
        let mut registry = self.registry.lock().await;

        let settings = registry
            .get(id)
            .ok_or_else(|| Error::not_watched(id.clone()))?;

        info!("Destroying group {}", id);

        self.driver
            .delete_instance_group_manager(id.as_str())
            .await?;

        for template in settings.created_template_names() {
            if let Err(e) = self.driver.delete_instance_template(template).await {
                warn!(
                    "failed to delete template {} of group {}; group stays watched: {}",
                    template, id, e
                );
                return Err(e);
            }
        }

        registry.remove(id);
        Ok(())
    }

    /// Declared specs of all watched groups
    pub async fn inspect_groups(&self) -> Result<Vec<GroupSpec>> {
        let registry = self.registry.lock().await;
        Ok(registry.specs())
    }

    /// Snapshot of the committed settings of a group
    pub async fn group_settings(&self, id: &GroupId) -> Option<GroupSettings> {
        self.registry.lock().await.get(id).cloned()
    }
}
