//! Peer records for the servers participating in sync
//!
//! A [`Peer`] owns the live connection to one MPD server together with the
//! per-peer sync state: the last play-queue revision the peer is known to
//! have, and the volume offset captured at full sync.

use std::fmt;

use tracing::{info, warn};
use unison_mpd_client::MpdClient;
use unison_shared_config::ServerConfig;

/// Role of a peer in the sync topology
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    /// The authoritative server
    Master,
    /// A follower mirroring the master
    Slave,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Master => write!(f, "master"),
            Self::Slave => write!(f, "slave"),
        }
    }
}

/// One MPD server participating in sync
pub struct Peer {
    /// Role in the topology
    pub role: Role,

    /// Hostname, kept for diagnostics
    pub host: String,

    /// Control-protocol port
    pub port: u16,

    /// Live protocol connection
    pub client: MpdClient,

    /// Last play-queue revision this peer is known to have.
    /// Never exceeds the master's revision outside an in-flight sync.
    pub playlist_version: u32,

    /// Master volume minus this peer's volume, captured once at full sync
    pub volume_offset: i32,
}

impl Peer {
    /// Build a peer from a validated server configuration
    pub fn from_config(role: Role, config: &ServerConfig) -> Self {
        Self {
            role,
            host: config.host.clone(),
            port: config.port,
            client: MpdClient::new(config.host.clone(), config.port, config.password.clone()),
            playlist_version: 0,
            volume_offset: 0,
        }
    }

    /// `host:port` form for diagnostics
    pub fn endpoint(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Establish a fresh connection, tearing down any stale session first
    ///
    /// Failures never propagate past this boundary; the outcome is logged
    /// and returned as a flag.
    pub async fn connect(&mut self) -> bool {
        match self.client.connect().await {
            Ok(()) => {
                info!(role = %self.role, endpoint = %self.endpoint(), "connected");
                true
            }
            Err(e) => {
                warn!(
                    role = %self.role,
                    endpoint = %self.endpoint(),
                    error = %e,
                    "unable to connect"
                );
                false
            }
        }
    }

    /// Lightweight liveness check with a single recovery attempt
    ///
    /// Pings the peer; on failure makes exactly one `connect()` attempt and
    /// reports its outcome. No further retries.
    pub async fn check_health(&mut self) -> bool {
        match self.client.ping().await {
            Ok(()) => true,
            Err(_) => self.connect().await,
        }
    }
}

impl fmt::Debug for Peer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Peer")
            .field("role", &self.role)
            .field("endpoint", &self.endpoint())
            .field("playlist_version", &self.playlist_version)
            .field("volume_offset", &self.volume_offset)
            .finish()
    }
}
