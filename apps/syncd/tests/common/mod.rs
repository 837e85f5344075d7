//! Common test utilities for syncd integration tests

#![allow(dead_code)]

use unison_shared_config::{ServerConfig, ServersConfig, SyncSettings};
use unison_syncd::peer::{Peer, Role};
use unison_test_utils::MockMpdServer;

/// Build a peer wired to a mock server and connect it
pub async fn connected_peer(role: Role, server: &MockMpdServer) -> Peer {
    let config = ServerConfig::new(server.host(), server.port());
    let mut peer = Peer::from_config(role, &config);
    assert!(peer.connect().await, "mock peer must connect");
    peer
}

/// Build a settings document pointing at mock servers
pub fn settings_for(master: &MockMpdServer, slaves: &[&MockMpdServer]) -> SyncSettings {
    SyncSettings {
        servers: ServersConfig {
            master: ServerConfig::new(master.host(), master.port()),
            slaves: slaves
                .iter()
                .map(|s| ServerConfig::new(s.host(), s.port()))
                .collect(),
        },
    }
}
