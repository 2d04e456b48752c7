//! Group spec validation and normalization
//!
//! Turns a raw `GroupSpec` into `NormalizedSettings`. Validation never touches
//! the registry or the cloud driver; the only collaborator it calls is the
//! flavor named by the spec.

use fleet_core::{
    metadata, Allocation, Error, FlavorLookup, GroupProperties, GroupSpec, InstanceProperties,
    InstanceSpec, MetadataItem, Result, STARTUP_SCRIPT_KEY,
};
use std::sync::Arc;
use tracing::debug;

/// A validated group spec together with everything derived from it
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedSettings {
    /// The spec exactly as declared
    pub spec: GroupSpec,

    /// Structured view of the spec properties
    pub properties: GroupProperties,

    /// Instance spec after flavor preparation
    pub instance_spec: InstanceSpec,

    /// Normalized instance properties parsed from the prepared spec
    pub instance_properties: InstanceProperties,
}

impl NormalizedSettings {
    pub fn allocation(&self) -> &Allocation {
        &self.properties.allocation
    }

    /// Metadata written into instance templates: property metadata, then
    /// flavor tags, then the init script
    pub fn template_metadata(&self) -> Vec<MetadataItem> {
        let mut tags = self.instance_properties.metadata.clone();
        tags.extend(
            self.instance_spec
                .tags
                .iter()
                .map(|(k, v)| (k.clone(), v.clone())),
        );
        if let Some(init) = &self.instance_spec.init {
            tags.insert(STARTUP_SCRIPT_KEY.to_string(), init.clone());
        }
        metadata::tags_to_metadata(&tags)
    }
}

/// Validates group specs against structural rules and their flavor
#[derive(Clone)]
pub struct SpecValidator {
    flavors: Arc<dyn FlavorLookup>,
    default_flavor: Option<String>,
}

impl SpecValidator {
    pub fn new(flavors: Arc<dyn FlavorLookup>) -> Self {
        Self {
            flavors,
            default_flavor: None,
        }
    }

    /// Flavor used when a spec leaves `Flavor.Plugin` empty
    pub fn with_default_flavor(mut self, name: impl Into<String>) -> Self {
        self.default_flavor = Some(name.into());
        self
    }

    /// Validate `spec` and derive its normalized settings
    pub async fn validate(&self, spec: &GroupSpec) -> Result<NormalizedSettings> {
        if spec.id.is_blank() {
            return Err(Error::validation("Group ID must not be blank"));
        }

        let properties = GroupProperties::parse(spec)?;

        if properties.allocation.has_logical_ids() {
            return Err(Error::validation("Allocation.LogicalIDs is not supported"));
        }

        if properties.allocation.size <= 0 {
            return Err(Error::validation("Allocation must be > 0"));
        }

        let flavor_name = match (&properties.flavor.plugin, &self.default_flavor) {
            (name, Some(default)) if name.is_empty() => default.clone(),
            (name, _) => name.clone(),
        };

        let flavor = self.flavors.lookup(&flavor_name).map_err(|e| {
            Error::validation(format!("Failed to find Flavor plugin '{}': {}", flavor_name, e))
        })?;

        flavor
            .validate(&properties.flavor.properties, &properties.allocation)
            .await?;

        let instance_spec = InstanceSpec::from_properties(properties.instance.properties.clone());
        let instance_spec = flavor
            .prepare(&properties.flavor.properties, instance_spec, &properties.allocation)
            .await?;

        let instance_properties = InstanceProperties::parse(&instance_spec.properties)?;

        debug!(
            "validated group {} (flavor={}, size={})",
            spec.id, flavor_name, properties.allocation.size
        );

        Ok(NormalizedSettings {
            spec: spec.clone(),
            properties,
            instance_spec,
            instance_properties,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::FlavorRegistry;
    use fleet_dev::{GroupSpecBuilder, MockFlavor};
    use serde_json::json;

    fn validator_with(flavor: MockFlavor) -> SpecValidator {
        SpecValidator::new(Arc::new(FlavorRegistry::with_builtin().with("mock", flavor)))
    }

    fn validation_message(err: Error) -> String {
        match err {
            Error::Validation(message) => message,
            other => panic!("expected validation error, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_valid_spec() {
        let validator = validator_with(MockFlavor::new());
        let settings = validator
            .validate(&GroupSpecBuilder::new("workers").size(3).build())
            .await
            .unwrap();

        assert_eq!(settings.allocation().size, 3);
        assert_eq!(settings.instance_properties.machine_type, "n1-standard-1");
        assert_eq!(settings.instance_properties.name_prefix, "worker");
        assert!(settings.instance_spec.tags.is_empty());
    }

    #[tokio::test]
    async fn test_blank_id_rejected() {
        let validator = validator_with(MockFlavor::new());
        let err = validator
            .validate(&GroupSpecBuilder::new("").build())
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), "Group ID must not be blank");
    }

    #[tokio::test]
    async fn test_non_positive_size_rejected() {
        let validator = validator_with(MockFlavor::new());
        for size in [0, -2] {
            let err = validator
                .validate(&GroupSpecBuilder::new("workers").size(size).build())
                .await
                .unwrap_err();
            assert_eq!(validation_message(err), "Allocation must be > 0");
        }
    }

    #[tokio::test]
    async fn test_logical_ids_rejected() {
        let flavor = MockFlavor::new();
        let validator = validator_with(flavor.clone());
        let err = validator
            .validate(&GroupSpecBuilder::new("workers").logical_ids(&["a", "b"]).build())
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), "Allocation.LogicalIDs is not supported");
        assert_eq!(flavor.validate_calls(), 0);
    }

    #[tokio::test]
    async fn test_empty_logical_ids_accepted() {
        let validator = validator_with(MockFlavor::new());
        assert!(validator
            .validate(&GroupSpecBuilder::new("workers").logical_ids(&[]).build())
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_unknown_flavor_rejected() {
        let validator = validator_with(MockFlavor::new());
        let err = validator
            .validate(&GroupSpecBuilder::new("workers").flavor("swarm").build())
            .await
            .unwrap_err();
        assert!(validation_message(err).starts_with("Failed to find Flavor plugin 'swarm'"));
    }

    #[tokio::test]
    async fn test_flavor_rejection_propagated() {
        let validator = validator_with(MockFlavor::rejecting("manager count must be odd"));
        let err = validator
            .validate(&GroupSpecBuilder::new("workers").build())
            .await
            .unwrap_err();
        assert_eq!(validation_message(err), "manager count must be odd");
    }

    #[tokio::test]
    async fn test_malformed_instance_properties_rejected() {
        let validator = validator_with(MockFlavor::new());
        let err = validator
            .validate(
                &GroupSpecBuilder::new("workers")
                    .instance_property("DiskSizeMb", json!("large"))
                    .build(),
            )
            .await
            .unwrap_err();
        assert!(validation_message(err).starts_with("Invalid instance properties"));
    }

    #[tokio::test]
    async fn test_flavor_prepare_shapes_properties() {
        let flavor = MockFlavor::new()
            .with_tag("swarm-role", "worker")
            .with_init("docker swarm join")
            .with_property("MachineType", json!("n1-highcpu-8"));
        let validator = validator_with(flavor.clone());

        let settings = validator
            .validate(&GroupSpecBuilder::new("workers").build())
            .await
            .unwrap();

        assert_eq!(flavor.prepare_calls(), 1);
        assert_eq!(settings.instance_properties.machine_type, "n1-highcpu-8");
        assert_eq!(
            settings.template_metadata(),
            vec![
                MetadataItem::new("startup-script", "docker swarm join"),
                MetadataItem::new("swarm-role", "worker"),
            ]
        );
    }

    #[tokio::test]
    async fn test_template_metadata_precedence() {
        let flavor = MockFlavor::new().with_tag("owner", "flavor");
        let validator = validator_with(flavor);

        let settings = validator
            .validate(
                &GroupSpecBuilder::new("workers")
                    .instance_property("Metadata", json!({"owner": "spec", "team": "infra"}))
                    .build(),
            )
            .await
            .unwrap();

        assert_eq!(
            settings.template_metadata(),
            vec![
                MetadataItem::new("owner", "flavor"),
                MetadataItem::new("team", "infra"),
            ]
        );
    }

    #[tokio::test]
    async fn test_default_flavor_used_when_unnamed() {
        let validator = validator_with(MockFlavor::new()).with_default_flavor("vanilla");
        let settings = validator
            .validate(
                &GroupSpecBuilder::new("workers")
                    .flavor("")
                    .flavor_properties(json!({"Tags": {"tier": "batch"}}))
                    .build(),
            )
            .await
            .unwrap();
        assert_eq!(settings.instance_spec.tags["tier"], "batch");

        let strict = validator_with(MockFlavor::new());
        assert!(strict
            .validate(&GroupSpecBuilder::new("workers").flavor("").build())
            .await
            .is_err());
    }
}
