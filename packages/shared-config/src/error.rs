//! Configuration error types

use thiserror::Error;

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Settings file could not be read
    #[error("unable to read settings file {path}: {reason}")]
    Unreadable { path: String, reason: String },

    /// Settings file is not a valid settings document
    #[error("settings file {path} is not valid: {reason}")]
    Invalid { path: String, reason: String },

    /// Configuration validation error
    #[error("configuration validation failed: {0}")]
    Validation(String),
}

impl ConfigError {
    /// Create an `Unreadable` error for a settings path
    pub fn unreadable(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Unreadable {
            path: path.into(),
            reason: reason.into(),
        }
    }

    /// Create an `Invalid` error for a settings path
    pub fn invalid(path: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Invalid {
            path: path.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for configuration operations
pub type ConfigResult<T> = Result<T, ConfigError>;
