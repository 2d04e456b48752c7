//! # fleet-group
//!
//! Managed instance group reconciliation for fleet.
//!
//! This crate provides:
//! - Validation and normalization of group specs through flavor plugins
//! - An in-memory registry of watched groups and their template history
//! - The reconciliation engine that creates, updates, resizes and tears down
//!   managed groups through a `CloudDriver`
//!
//! ## Example
//!
//! ```rust,no_run
//! use fleet_core::{CloudDriver, GroupSpec};
//! use fleet_group::GroupPlugin;
//! use std::sync::Arc;
//!
//! # async fn run(driver: Arc<dyn CloudDriver>, spec: GroupSpec) -> fleet_core::Result<()> {
//! let plugin = GroupPlugin::with_builtin_flavors(driver);
//!
//! // Preview, then apply
//! println!("{}", plugin.commit_group(&spec, true).await?);
//! plugin.commit_group(&spec, false).await?;
//!
//! let description = plugin.describe_group(&spec.id).await?;
//! println!("converged: {}", description.converged);
//! # Ok(())
//! # }
//! ```

pub mod engine;
pub mod flavor;
pub mod registry;
pub mod validator;

// Re-export commonly used types
pub use engine::{CommitPlan, GroupPlugin};
pub use flavor::{FlavorRegistry, VanillaFlavor, VANILLA};
pub use registry::{GroupRegistry, GroupSettings, TemplateHistory};
pub use validator::{NormalizedSettings, SpecValidator};
