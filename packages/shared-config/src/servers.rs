//! Server topology configuration types

use serde::Deserialize;

use crate::{ConfigError, ConfigResult};

/// Default MPD control port
pub const DEFAULT_MPD_PORT: u16 = 6600;

/// Network address and credentials for one MPD server
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ServerConfig {
    /// Hostname or IP address
    pub host: String,

    /// Control-protocol port
    #[serde(default = "default_port")]
    pub port: u16,

    /// Shared secret, sent after connecting when present
    #[serde(default)]
    pub password: Option<String>,
}

fn default_port() -> u16 {
    DEFAULT_MPD_PORT
}

impl ServerConfig {
    /// Create a configuration with host and port (useful for testing)
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            password: None,
        }
    }

    /// Attach a shared secret
    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// `host:port` form for diagnostics
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    pub(crate) fn validate(&self, role: &str) -> ConfigResult<()> {
        if self.host.trim().is_empty() {
            return Err(ConfigError::Validation(format!(
                "{} server host cannot be empty",
                role
            )));
        }
        Ok(())
    }
}

/// The `servers` section of the settings document
#[derive(Debug, Clone, Deserialize)]
pub struct ServersConfig {
    /// The authoritative server whose state is mirrored
    pub master: ServerConfig,

    /// Followers driven to mirror the master. May be empty.
    pub slaves: Vec<ServerConfig>,
}

impl ServersConfig {
    pub(crate) fn validate(&self) -> ConfigResult<()> {
        self.master.validate("master")?;
        for slave in &self.slaves {
            slave.validate("slave")?;
        }
        Ok(())
    }
}
