//! Error handling for the Unison sync daemon
//!
//! Only two conditions halt the process: an unusable settings document and a
//! master connection that one reconnect attempt could not bring back. Each
//! maps to its own exit code; everything else is logged and survived.

use thiserror::Error;
use unison_mpd_client::MpdError;
use unison_shared_config::ConfigError;

/// Exit code for an invalid or unreadable settings document
pub const EXIT_CONFIG: i32 = 1;

/// Exit code for an unrecoverable master connection
pub const EXIT_MASTER_GONE: i32 = 2;

/// Sync daemon errors
#[derive(Error, Debug)]
pub enum SyncError {
    /// Settings document is missing, unreadable, or invalid
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Master connection lost and the single reconnect attempt failed
    #[error("lost connection to master {endpoint} and could not get it back")]
    MasterGone { endpoint: String },

    /// A protocol operation against the master failed irrecoverably
    #[error("MPD operation failed: {0}")]
    Protocol(#[from] MpdError),
}

impl SyncError {
    /// Process exit code for this error when it halts the daemon
    pub fn exit_code(&self) -> i32 {
        match self {
            Self::Config(_) => EXIT_CONFIG,
            Self::MasterGone { .. } | Self::Protocol(_) => EXIT_MASTER_GONE,
        }
    }
}

/// Result type for sync operations
pub type SyncResult<T> = Result<T, SyncError>;
