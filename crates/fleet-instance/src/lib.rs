//! # fleet-instance
//!
//! Single-instance provisioning plugin for fleet.
//!
//! A thin, stateless layer over an `InstanceDriver`: it validates instance
//! properties, creates uniquely named instances carrying their tags as
//! provider metadata, destroys them, and finds them again by tag.

use fleet_core::{
    metadata_to_tags, tags_to_metadata, Error, InstanceDescription, InstanceDriver, InstanceId,
    InstanceProperties, InstanceSettings, InstanceSpec, Result, STARTUP_SCRIPT_KEY,
};
use rand::Rng;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

/// Provisions individual instances through an `InstanceDriver`
#[derive(Clone)]
pub struct InstancePlugin {
    driver: Arc<dyn InstanceDriver>,
}

impl InstancePlugin {
    pub fn new(driver: Arc<dyn InstanceDriver>) -> Self {
        Self { driver }
    }

    /// Check that raw instance properties parse and name the required fields
    pub fn validate(&self, properties: &serde_json::Value) -> Result<()> {
        debug!("validate {}", properties);

        let properties = InstanceProperties::parse(properties)?;
        let missing = properties.missing_required();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(Error::validation(format!("Missing: {}", missing.join(", "))))
        }
    }

    /// Create an instance for `spec` and return its generated id
    pub async fn provision(&self, spec: &InstanceSpec) -> Result<InstanceId> {
        let properties = InstanceProperties::parse(&spec.properties)?;

        let suffix: i64 = rand::thread_rng().gen_range(0..i64::MAX);
        let name = format!("{}-{}", properties.name_prefix, suffix);

        let mut tags = spec.tags.clone();
        if let Some(init) = &spec.init {
            tags.insert(STARTUP_SCRIPT_KEY.to_string(), init.clone());
        }

        let settings = InstanceSettings::from_properties(&properties, tags_to_metadata(&tags));
        let result = self.driver.create_instance(&name, &settings).await;
        debug!("provision {} err={:?}", name, result.as_ref().err());
        result?;

        Ok(InstanceId::new(name))
    }

    /// Delete an instance
    pub async fn destroy(&self, id: &InstanceId) -> Result<()> {
        let result = self.driver.delete_instance(id.as_str()).await;
        debug!("destroy {} err={:?}", id, result.as_ref().err());
        result
    }

    /// Instances whose tags include every entry of `tags`
    pub async fn describe_instances(
        &self,
        tags: &BTreeMap<String, String>,
    ) -> Result<Vec<InstanceDescription>> {
        debug!("describe-instances {:?}", tags);

        let instances = self.driver.list_instances().await?;
        debug!("total count: {}", instances.len());

        let result: Vec<InstanceDescription> = instances
            .into_iter()
            .map(|instance| InstanceDescription {
                id: InstanceId::new(instance.name),
                tags: metadata_to_tags(&instance.metadata),
            })
            .filter(|description| {
                tags.iter()
                    .all(|(key, value)| description.tags.get(key) == Some(value))
            })
            .collect();

        debug!("matching count: {}", result.len());
        Ok(result)
    }
}
