//! `fleetctl config`

use crate::output::OutputFormatter;
use anyhow::{Context, Result};
use fleet_core::Config;
use std::path::PathBuf;

/// Default configuration rendered as YAML
pub fn render_default() -> Result<String> {
    Ok(serde_yaml::to_string(&Config::default())?)
}

pub fn execute(output: Option<PathBuf>, formatter: &OutputFormatter) -> Result<()> {
    let yaml = render_default()?;

    match output {
        Some(path) => {
            std::fs::write(&path, yaml)
                .with_context(|| format!("Failed to write configuration to {}", path.display()))?;
            formatter.print_success(&format!("Configuration written to {}", path.display()));
        }
        None => print!("{}", yaml),
    }

    Ok(())
}
