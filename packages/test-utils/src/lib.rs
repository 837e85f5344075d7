//! Shared test utilities for Unison workspace
//!
//! This crate provides a mock MPD server for testing the sync engine and
//! the protocol client without a real MPD instance. The mock speaks the MPD
//! line protocol over a real TCP listener, keeps a versioned play queue so
//! `plchanges` returns genuine diffs, and records every received command for
//! assertions.
//!
//! # Example
//!
//! ```rust,ignore
//! use unison_test_utils::MockMpdServer;
//!
//! #[tokio::test]
//! async fn test_with_mock() {
//!     let server = MockMpdServer::start().await;
//!     server.set_queue(&["a.flac", "b.flac"]).await;
//!
//!     // Point your client at server.host() / server.port()
//! }
//! ```

mod mpd;

pub use mpd::MockMpdServer;
