//! Shared configuration types for Unison services
//!
//! This crate provides the settings document describing the sync topology:
//! one master server and any number of slave servers, each with a host,
//! port, and optional shared secret.
//!
//! The settings document is a JSON file:
//!
//! ```json
//! {
//!     "servers": {
//!         "master": { "host": "living-room", "port": 6600 },
//!         "slaves": [
//!             { "host": "kitchen" },
//!             { "host": "office", "port": 6601, "password": "hunter2" }
//!         ]
//!     }
//! }
//! ```

mod error;
mod servers;

pub use error::{ConfigError, ConfigResult};
pub use servers::{ServerConfig, ServersConfig, DEFAULT_MPD_PORT};

use std::fs;
use std::path::Path;

use serde::Deserialize;

/// Top-level settings document
#[derive(Debug, Clone, Deserialize)]
pub struct SyncSettings {
    /// Sync topology: master and slaves
    pub servers: ServersConfig,
}

impl SyncSettings {
    /// Load and validate a settings document from a JSON file
    ///
    /// # Errors
    /// - `ConfigError::Unreadable` if the file cannot be read
    /// - `ConfigError::Invalid` if it is not valid JSON or is missing the
    ///   `servers`, `servers.master`, or `servers.slaves` sections
    /// - `ConfigError::Validation` if a server entry fails validation
    pub fn load(path: &Path) -> ConfigResult<Self> {
        let raw = fs::read_to_string(path)
            .map_err(|e| ConfigError::unreadable(path.display().to_string(), e.to_string()))?;
        Self::parse(&raw, &path.display().to_string())
    }

    /// Parse and validate a settings document from a JSON string
    pub fn parse(raw: &str, origin: &str) -> ConfigResult<Self> {
        let settings: SyncSettings = serde_json::from_str(raw)
            .map_err(|e| ConfigError::invalid(origin, e.to_string()))?;
        settings.servers.validate()?;
        Ok(settings)
    }
}
