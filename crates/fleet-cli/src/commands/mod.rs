//! Command implementations for fleetctl

pub mod apply;
pub mod config;
pub mod validate;

use anyhow::{Context, Result};
use fleet_core::GroupSpec;
use std::path::Path;

/// Read a group spec from a JSON or YAML file
pub fn load_spec(path: &Path) -> Result<GroupSpec> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read group spec {}", path.display()))?;
    GroupSpec::from_yaml_str(&text)
        .with_context(|| format!("Failed to parse group spec {}", path.display()))
}
