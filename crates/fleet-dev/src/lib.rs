//! # fleet-dev
//!
//! Development and testing utilities for fleet.
//!
//! This crate provides:
//! - An in-memory cloud provider driver that records calls and injects failures
//! - A scriptable flavor plugin
//! - Spec builders and test logging setup

pub mod mock_driver;
pub mod mock_flavor;
pub mod utils;

// Re-export commonly used types
pub use mock_driver::{CallKind, DriverCall, MockCloudDriver};
pub use mock_flavor::MockFlavor;
pub use utils::{instance_spec, setup_test_logging, GroupSpecBuilder};
