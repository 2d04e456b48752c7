//! # fleet-core
//!
//! Core types, traits, and utilities for fleet - declarative management of
//! cloud instance groups.
//!
//! This crate provides the foundational data structures and interfaces that are
//! shared across all other fleet components. It includes:
//!
//! - Group and instance spec types, and the normalized instance properties
//! - Traits for the flavor plugins and the cloud provider driver
//! - Reversible encoding of tags into provider metadata
//! - Configuration schema and loading
//! - Error handling types

pub mod config;
pub mod error;
pub mod metadata;
pub mod properties;
pub mod traits;
pub mod types;

// Re-export commonly used types at the crate root
pub use config::{Config, GroupConfig, LoggingConfig, ProviderConfig};
pub use error::{Error, Result};
pub use metadata::{metadata_to_tags, tags_to_metadata, MetadataItem, STARTUP_SCRIPT_KEY};
pub use properties::InstanceProperties;
pub use traits::{
    CloudDriver, Flavor, FlavorLookup, GroupMember, InstanceDriver, InstanceManagerSettings,
    InstanceRecord, InstanceSettings,
};
pub use types::{
    Allocation, GroupDescription, GroupId, GroupProperties, GroupSpec, InstanceDescription,
    InstanceId, InstanceSpec, PluginSpec,
};
