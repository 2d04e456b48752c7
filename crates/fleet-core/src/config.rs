//! Configuration management for fleet
//!
//! Provides a unified configuration system that supports YAML files,
//! environment variables, and command-line argument overrides.

use crate::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Main configuration structure for fleet components
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Cloud provider location
    pub provider: ProviderConfig,

    /// Logging configuration
    pub logging: LoggingConfig,

    /// Group plugin configuration
    pub group: GroupConfig,
}

impl Config {
    /// Load configuration from multiple sources with precedence:
    /// 1. Environment variables (highest)
    /// 2. Configuration file
    /// 3. Defaults (lowest)
    pub fn load() -> Result<Self> {
        let mut builder = config::Config::builder();

        builder = builder.add_source(config::Config::try_from(&Self::default())?);

        if let Ok(config_path) = std::env::var("FLEET_CONFIG") {
            builder = builder.add_source(config::File::with_name(&config_path).required(false));
        } else {
            for path in &["./fleet.yaml", "/etc/fleet/config.yaml"] {
                builder = builder.add_source(config::File::with_name(path).required(false));
            }
        }

        // FLEET__PROVIDER__ZONE=europe-west1-b
        builder = builder.add_source(
            config::Environment::with_prefix("FLEET")
                .prefix_separator("__")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        let parsed: Self = config.try_deserialize()?;

        parsed.validate()?;

        Ok(parsed)
    }

    /// Load configuration from a specific file
    pub fn load_from_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let builder = config::Config::builder()
            .add_source(config::Config::try_from(&Self::default())?)
            .add_source(config::File::from(path));

        let config = builder.build()?;
        let parsed: Self = config.try_deserialize()?;
        parsed.validate()?;

        Ok(parsed)
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.provider.validate()?;
        self.logging.validate()?;
        self.group.validate()?;
        Ok(())
    }
}

/// Project and zone that groups are provisioned into
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProviderConfig {
    pub project: String,
    pub zone: String,
}

impl ProviderConfig {
    pub fn validate(&self) -> Result<()> {
        if self.project.trim().is_empty() {
            return Err(crate::Error::config("Provider project cannot be empty"));
        }
        if self.zone.trim().is_empty() {
            return Err(crate::Error::config("Provider zone cannot be empty"));
        }
        Ok(())
    }
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            project: "fleet-dev".to_string(),
            zone: "us-central1-f".to_string(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level or filter directive (trace, debug, info, warn, error)
    pub level: String,

    /// Log format (text, json)
    pub format: String,

    /// Show target in logs
    pub show_target: bool,

    /// Show thread IDs in logs
    pub show_thread_ids: bool,

    /// Show line numbers in logs
    pub show_line_numbers: bool,
}

impl LoggingConfig {
    pub fn validate(&self) -> Result<()> {
        match self.format.as_str() {
            "text" | "json" => Ok(()),
            other => Err(crate::Error::config(format!("Unknown log format: {}", other))),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "text".to_string(),
            show_target: true,
            show_thread_ids: false,
            show_line_numbers: false,
        }
    }
}

/// Group plugin configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupConfig {
    /// Flavor used when a spec does not name one
    pub default_flavor: String,
}

impl GroupConfig {
    pub fn validate(&self) -> Result<()> {
        if self.default_flavor.trim().is_empty() {
            return Err(crate::Error::config("Default flavor cannot be empty"));
        }
        Ok(())
    }
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            default_flavor: "vanilla".to_string(),
        }
    }
}
