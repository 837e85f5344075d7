//! Async MPD control-protocol client for Unison
//!
//! This crate speaks the MPD line protocol over TCP: connection lifecycle
//! with greeting and optional password, the blocking `idle` wait, status and
//! queue queries (including `plchanges` diffs), and queue/transport control.
//!
//! # Example
//!
//! ```rust,no_run
//! use unison_mpd_client::MpdClient;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let mut client = MpdClient::new("living-room", 6600, None);
//! client.connect().await?;
//!
//! let status = client.status().await?;
//! println!("queue revision {}", status.playlist_version);
//!
//! // Blocks until the server reports a change
//! for subsystem in client.idle().await? {
//!     println!("changed: {}", subsystem);
//! }
//! # Ok(())
//! # }
//! ```

mod client;
mod error;
mod models;

pub use client::MpdClient;
pub use error::{MpdError, MpdResult};
pub use models::{PlayState, QueueChange, Status, Subsystem};
