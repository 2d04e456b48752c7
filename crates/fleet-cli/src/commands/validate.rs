//! `fleetctl validate`

use super::load_spec;
use crate::output::OutputFormatter;
use anyhow::{Context, Result};
use fleet_core::{Config, InstanceProperties, MetadataItem};
use fleet_group::{FlavorRegistry, SpecValidator};
use serde::Serialize;
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// What a valid spec normalizes to
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ValidationReport {
    #[serde(rename = "ID")]
    pub id: String,
    pub size: i64,
    pub instance_properties: InstanceProperties,
    pub metadata: Vec<MetadataItem>,
}

/// Validate one spec file and build its report
pub async fn run(config: &Config, path: &Path) -> Result<ValidationReport> {
    let spec = load_spec(path)?;
    let validator = SpecValidator::new(Arc::new(FlavorRegistry::with_builtin()))
        .with_default_flavor(config.group.default_flavor.clone());

    let settings = validator
        .validate(&spec)
        .await
        .with_context(|| format!("Group spec {} is invalid", path.display()))?;
    info!("group spec {} is valid", spec.id);

    Ok(ValidationReport {
        id: spec.id.to_string(),
        size: settings.allocation().size,
        metadata: settings.template_metadata(),
        instance_properties: settings.instance_properties,
    })
}

pub async fn execute(config: &Config, path: &Path, formatter: &OutputFormatter) -> Result<()> {
    let report = run(config, path).await?;

    if formatter.is_structured() {
        return formatter.print_value(&report);
    }

    formatter.print_success(&format!("Group '{}' is valid", report.id));
    formatter.print_info(&format!("Size: {}", report.size));
    formatter.print_info(&format!(
        "Machine type: {}, network: {}",
        report.instance_properties.machine_type, report.instance_properties.network
    ));
    if !report.metadata.is_empty() {
        let keys: Vec<&str> = report.metadata.iter().map(|item| item.key.as_str()).collect();
        formatter.print_info(&format!("Metadata keys: {}", keys.join(", ")));
    }
    Ok(())
}
