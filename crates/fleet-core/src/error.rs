//! Error handling for fleet
//!
//! Provides a unified error type and result type for use across all fleet components.

use crate::GroupId;

/// Result type alias for fleet operations
pub type Result<T> = std::result::Result<T, Error>;

/// Unified error type for fleet
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// A group or instance spec was rejected before any mutation took place
    #[error("Validation error: {0}")]
    Validation(String),

    /// The addressed group is not tracked by the registry
    #[error("This group is not being watched: '{0}'")]
    NotWatched(GroupId),

    /// Failure reported by the cloud provider driver
    #[error("Provider error: {0}")]
    Provider(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Resource already exists
    #[error("Resource already exists: {0}")]
    AlreadyExists(String),

    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    InvalidConfiguration(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// JSON parsing errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// YAML parsing errors
    #[error("YAML error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Configuration parsing errors
    #[error("Config error: {0}")]
    Config(#[from] config::ConfigError),

    /// Generic error with context
    #[error("Error: {0}")]
    Other(#[from] anyhow::Error),
}

impl Error {
    /// Create a validation error
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Create a not-watched error for a group
    pub fn not_watched(id: impl Into<GroupId>) -> Self {
        Self::NotWatched(id.into())
    }

    /// Create a provider error
    pub fn provider(msg: impl Into<String>) -> Self {
        Self::Provider(msg.into())
    }

    /// Create a not found error
    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Create an already exists error
    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::InvalidConfiguration(msg.into())
    }

    /// Check if this error indicates a problem with the caller's input
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Error::Validation(_)
                | Error::NotWatched(_)
                | Error::InvalidConfiguration(_)
                | Error::Json(_)
                | Error::Yaml(_)
        )
    }

    /// Get the error category for logging
    pub fn category(&self) -> &'static str {
        match self {
            Error::Validation(_) => "validation",
            Error::NotWatched(_) => "not_watched",
            Error::Provider(_) => "provider",
            Error::NotFound(_) => "not_found",
            Error::AlreadyExists(_) => "already_exists",
            Error::InvalidConfiguration(_) => "configuration",
            Error::Io(_) => "io",
            Error::Json(_) => "json",
            Error::Yaml(_) => "yaml",
            Error::Config(_) => "config",
            Error::Other(_) => "other",
        }
    }
}
