//! Integration tests for the MPD protocol client against the mock server

use assert_matches::assert_matches;
use unison_mpd_client::{MpdClient, MpdError, PlayState, Subsystem};
use unison_test_utils::MockMpdServer;

async fn connected_client(server: &MockMpdServer) -> MpdClient {
    let mut client = MpdClient::new(server.host(), server.port(), None);
    client.connect().await.unwrap();
    client
}

#[tokio::test]
async fn test_connect_reads_greeting() {
    let server = MockMpdServer::start().await;
    let client = connected_client(&server).await;
    assert!(client.is_connected());
}

#[tokio::test]
async fn test_connect_sends_configured_password() {
    let server = MockMpdServer::start_with_password("hunter2").await;
    let mut client = MpdClient::new(server.host(), server.port(), Some("hunter2".to_string()));

    client.connect().await.unwrap();
    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_wrong_password_is_auth_error() {
    let server = MockMpdServer::start_with_password("hunter2").await;
    let mut client = MpdClient::new(server.host(), server.port(), Some("wrong".to_string()));

    assert_matches!(client.connect().await, Err(MpdError::Auth));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_status_round_trip() {
    let server = MockMpdServer::start().await;
    server
        .set_queue(&["a.flac", "b.flac", "c.flac", "d.flac"])
        .await;
    server.set_player("play", Some(3), Some(42)).await;
    server.set_volume(85).await;

    let mut client = connected_client(&server).await;
    let status = client.status().await.unwrap();

    assert_eq!(status.state, PlayState::Play);
    assert_eq!(status.song, Some(3));
    assert_eq!(status.elapsed_component(), Some(42));
    assert_eq!(status.volume, Some(85));
    assert_eq!(status.playlist_length, 4);
    assert_eq!(status.playlist_version, server.playlist_version().await);
}

#[tokio::test]
async fn test_queue_round_trip_preserves_order() {
    let server = MockMpdServer::start().await;
    server.set_queue(&["z.flac", "a.flac", "m.flac"]).await;

    let mut client = connected_client(&server).await;
    assert_eq!(
        client.queue().await.unwrap(),
        vec!["z.flac", "a.flac", "m.flac"]
    );
}

#[tokio::test]
async fn test_queue_changes_since_revision() {
    let server = MockMpdServer::start().await;
    server.set_queue(&["a.flac", "b.flac"]).await;
    let since = server.playlist_version().await;
    server.push_queue("c.flac").await;

    let mut client = connected_client(&server).await;
    let changes = client.queue_changes(since).await.unwrap();

    assert_eq!(changes.len(), 1);
    assert_eq!(changes[0].position, 2);
    assert_eq!(changes[0].uri, "c.flac");
}

#[tokio::test]
async fn test_idle_returns_changed_subsystems() {
    let server = MockMpdServer::start().await;
    server.signal_change(&["playlist", "player"]).await;

    let mut client = connected_client(&server).await;
    let changed = client.idle().await.unwrap();

    assert_eq!(changed, vec![Subsystem::Playlist, Subsystem::Player]);
}

#[tokio::test]
async fn test_uri_with_spaces_survives_quoting() {
    let server = MockMpdServer::start().await;
    let mut client = connected_client(&server).await;

    client.append("albums/ok computer/01.flac").await.unwrap();
    client.insert_at("b side/02 \"live\".flac", 0).await.unwrap();

    assert_eq!(
        server.queue().await,
        vec!["b side/02 \"live\".flac", "albums/ok computer/01.flac"]
    );
}

#[tokio::test]
async fn test_server_ack_is_server_error() {
    let server = MockMpdServer::start().await;
    let mut client = connected_client(&server).await;

    let err = client.delete_at(5).await.unwrap_err();
    assert_matches!(err, MpdError::Server { code: 2, ref command, .. } if command == "delete");
    assert!(!err.is_connection_error());
    // The connection survives a server error
    client.ping().await.unwrap();
}

#[tokio::test]
async fn test_dropped_connection_is_connection_error() {
    let server = MockMpdServer::start().await;
    let mut client = connected_client(&server).await;

    server.fail_next_commands(1).await;
    let err = client.ping().await.unwrap_err();

    assert!(err.is_connection_error());
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_command_without_connection_is_not_connected() {
    let mut client = MpdClient::new("127.0.0.1", 1, None);
    assert_matches!(client.ping().await, Err(MpdError::NotConnected));
}

#[tokio::test]
async fn test_refused_connection_fails_connect() {
    let server = MockMpdServer::start().await;
    server.refuse_connections(true).await;

    let mut client = MpdClient::new(server.host(), server.port(), None);
    let err = client.connect().await.unwrap_err();

    assert!(err.is_connection_error() || matches!(err, MpdError::Protocol(_)));
    assert!(!client.is_connected());
}

#[tokio::test]
async fn test_transport_commands_drive_player_state() {
    let server = MockMpdServer::start().await;
    server.set_queue(&["a.flac", "b.flac"]).await;

    let mut client = connected_client(&server).await;

    client.seek(1, 30).await.unwrap();
    client.play().await.unwrap();
    assert_eq!(server.play_state().await, "play");
    assert_eq!(server.current_song().await, Some(1));
    assert_eq!(server.elapsed().await, Some(30));

    client.pause_toggle().await.unwrap();
    assert_eq!(server.play_state().await, "pause");

    client.stop().await.unwrap();
    assert_eq!(server.play_state().await, "stop");
}

#[tokio::test]
async fn test_clear_empties_queue() {
    let server = MockMpdServer::start().await;
    server.set_queue(&["a.flac", "b.flac"]).await;

    let mut client = connected_client(&server).await;
    client.clear().await.unwrap();

    assert!(server.queue().await.is_empty());
    assert_eq!(client.status().await.unwrap().playlist_length, 0);
}
