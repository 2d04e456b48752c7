//! Flavor plugin lookup and the built-in vanilla flavor

use fleet_core::{Allocation, Error, Flavor, FlavorLookup, InstanceSpec, Result};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};
use std::fmt;
use std::sync::Arc;
use tracing::debug;

/// Name the vanilla flavor is registered under
pub const VANILLA: &str = "vanilla";

/// Name-indexed set of flavor plugins
#[derive(Clone, Default)]
pub struct FlavorRegistry {
    flavors: HashMap<String, Arc<dyn Flavor>>,
}

impl FlavorRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry holding the built-in flavors
    pub fn with_builtin() -> Self {
        Self::new().with(VANILLA, VanillaFlavor)
    }

    /// Register a flavor, replacing any previous one with the same name
    pub fn register(&mut self, name: impl Into<String>, flavor: impl Flavor + 'static) {
        self.flavors.insert(name.into(), Arc::new(flavor));
    }

    /// Builder form of `register`
    pub fn with(mut self, name: impl Into<String>, flavor: impl Flavor + 'static) -> Self {
        self.register(name, flavor);
        self
    }

    /// Registered names, sorted
    pub fn names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.flavors.keys().cloned().collect();
        names.sort();
        names
    }
}

impl fmt::Debug for FlavorRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FlavorRegistry")
            .field("flavors", &self.names())
            .finish()
    }
}

impl FlavorLookup for FlavorRegistry {
    fn lookup(&self, name: &str) -> Result<Arc<dyn Flavor>> {
        self.flavors
            .get(name)
            .cloned()
            .ok_or_else(|| Error::not_found(format!("flavor plugin '{}'", name)))
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", deny_unknown_fields)]
struct VanillaProperties {
    #[serde(default)]
    init: Option<String>,

    #[serde(default)]
    tags: BTreeMap<String, String>,
}

impl VanillaProperties {
    fn parse(properties: &serde_json::Value) -> Result<Self> {
        if properties.is_null() {
            return Ok(Self::default());
        }
        serde_json::from_value(properties.clone())
            .map_err(|e| Error::validation(format!("Invalid vanilla flavor properties: {}", e)))
    }
}

/// Pass-through flavor that adds fixed tags and an init script
#[derive(Debug, Clone, Copy, Default)]
pub struct VanillaFlavor;

#[async_trait::async_trait]
impl Flavor for VanillaFlavor {
    async fn validate(&self, properties: &serde_json::Value, _allocation: &Allocation) -> Result<()> {
        VanillaProperties::parse(properties).map(|_| ())
    }

    async fn prepare(
        &self,
        properties: &serde_json::Value,
        mut spec: InstanceSpec,
        _allocation: &Allocation,
    ) -> Result<InstanceSpec> {
        let vanilla = VanillaProperties::parse(properties)?;
        debug!("vanilla flavor adding {} tags", vanilla.tags.len());

        spec.tags.extend(vanilla.tags);
        if vanilla.init.is_some() {
            spec.init = vanilla.init;
        }
        Ok(spec)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fleet_dev::MockFlavor;
    use serde_json::json;

    #[test]
    fn test_lookup_unknown_flavor() {
        let registry = FlavorRegistry::with_builtin();
        let err = registry.lookup("swarm").err().unwrap();
        assert!(matches!(err, Error::NotFound(_)));
        assert!(registry.lookup(VANILLA).is_ok());
    }

    #[test]
    fn test_register_replaces() {
        let mut registry = FlavorRegistry::new();
        registry.register("mock", MockFlavor::new());
        registry.register("mock", MockFlavor::new());
        registry.register("other", VanillaFlavor);
        assert_eq!(registry.names(), vec!["mock", "other"]);
    }

    #[tokio::test]
    async fn test_vanilla_validate() {
        let allocation = Allocation::with_size(1);
        assert!(VanillaFlavor.validate(&json!(null), &allocation).await.is_ok());
        assert!(VanillaFlavor
            .validate(&json!({"Init": "echo", "Tags": {"a": "b"}}), &allocation)
            .await
            .is_ok());

        let err = VanillaFlavor
            .validate(&json!(["not", "an", "object"]), &allocation)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(VanillaFlavor
            .validate(&json!({"Unknown": 1}), &allocation)
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_vanilla_prepare_merges_tags_and_init() {
        let mut spec = InstanceSpec::from_properties(json!({"MachineType": "e2-small"}));
        spec.tags.insert("existing".to_string(), "1".to_string());

        let prepared = VanillaFlavor
            .prepare(
                &json!({"Init": "#!/bin/sh\necho up", "Tags": {"role": "web"}}),
                spec,
                &Allocation::with_size(2),
            )
            .await
            .unwrap();

        assert_eq!(prepared.tags.len(), 2);
        assert_eq!(prepared.tags["role"], "web");
        assert_eq!(prepared.init.as_deref(), Some("#!/bin/sh\necho up"));
        assert_eq!(prepared.properties["MachineType"], "e2-small");
    }
}
