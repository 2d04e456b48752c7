//! Utility functions for development and testing

use fleet_core::{GroupSpec, InstanceSpec};
use serde_json::{json, Map, Value};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Setup test logging with appropriate levels
pub fn setup_test_logging() {
    let _ = tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "fleet_group=debug,fleet_instance=debug,fleet_dev=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_test_writer())
        .try_init();
}

/// Fluent builder for group specs in tests
#[derive(Debug, Clone)]
pub struct GroupSpecBuilder {
    id: String,
    size: Value,
    logical_ids: Option<Vec<String>>,
    instance_plugin: String,
    instance_properties: Map<String, Value>,
    flavor_plugin: String,
    flavor_properties: Value,
}

impl GroupSpecBuilder {
    /// Start a spec for `id` with one `n1-standard-1` instance on the default network
    pub fn new(id: impl Into<String>) -> Self {
        let mut instance_properties = Map::new();
        instance_properties.insert("NamePrefix".to_string(), json!("worker"));
        instance_properties.insert("MachineType".to_string(), json!("n1-standard-1"));
        instance_properties.insert("Network".to_string(), json!("default"));

        Self {
            id: id.into(),
            size: json!(1),
            logical_ids: None,
            instance_plugin: "instance-mock".to_string(),
            instance_properties,
            flavor_plugin: "mock".to_string(),
            flavor_properties: json!({}),
        }
    }

    pub fn size(mut self, size: i64) -> Self {
        self.size = json!(size);
        self
    }

    pub fn logical_ids(mut self, ids: &[&str]) -> Self {
        self.logical_ids = Some(ids.iter().map(|id| id.to_string()).collect());
        self
    }

    pub fn machine_type(self, machine_type: &str) -> Self {
        self.instance_property("MachineType", json!(machine_type))
    }

    pub fn instance_property(mut self, key: &str, value: Value) -> Self {
        self.instance_properties.insert(key.to_string(), value);
        self
    }

    pub fn flavor(mut self, plugin: &str) -> Self {
        self.flavor_plugin = plugin.to_string();
        self
    }

    pub fn flavor_properties(mut self, properties: Value) -> Self {
        self.flavor_properties = properties;
        self
    }

    pub fn build(self) -> GroupSpec {
        let mut allocation = Map::new();
        allocation.insert("Size".to_string(), self.size);
        if let Some(ids) = self.logical_ids {
            allocation.insert("LogicalIDs".to_string(), json!(ids));
        }

        GroupSpec::new(
            self.id,
            json!({
                "Allocation": allocation,
                "Instance": {
                    "Plugin": self.instance_plugin,
                    "Properties": self.instance_properties,
                },
                "Flavor": {
                    "Plugin": self.flavor_plugin,
                    "Properties": self.flavor_properties,
                },
            }),
        )
    }
}

/// Instance spec with the given properties and tags
pub fn instance_spec(properties: Value, tags: &[(&str, &str)]) -> InstanceSpec {
    let mut spec = InstanceSpec::from_properties(properties);
    for (key, value) in tags {
        spec.tags.insert(key.to_string(), value.to_string());
    }
    spec
}
