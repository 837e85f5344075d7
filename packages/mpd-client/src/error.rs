//! MPD client error types

use thiserror::Error;

/// MPD control-protocol client errors
#[derive(Error, Debug)]
pub enum MpdError {
    /// No connection is established
    #[error("not connected to MPD server")]
    NotConnected,

    /// Transport-level failure
    #[error("I/O error talking to MPD: {0}")]
    Io(#[from] std::io::Error),

    /// The server answered a command with an `ACK` error line
    #[error("MPD error {code} in '{command}': {message}")]
    Server {
        code: u32,
        command: String,
        message: String,
    },

    /// The server sent a response this client cannot make sense of
    #[error("malformed MPD response: {0}")]
    Protocol(String),

    /// The server rejected the configured password
    #[error("MPD server rejected the password")]
    Auth,
}

impl MpdError {
    /// Check if this error means the connection itself is gone
    ///
    /// Connection errors are the ones worth a reconnect attempt; server
    /// `ACK`s and malformed responses arrive over a healthy connection.
    pub fn is_connection_error(&self) -> bool {
        matches!(self, Self::NotConnected | Self::Io(_))
    }
}

/// Result type for MPD operations
pub type MpdResult<T> = Result<T, MpdError>;
