//! Integration tests for transport-state reconciliation

mod common;

use common::connected_peer;
use unison_syncd::peer::Role;
use unison_syncd::sync::player;
use unison_test_utils::MockMpdServer;

const QUEUE: &[&str] = &["a.flac", "b.flac", "c.flac", "d.flac"];

async fn servers() -> (MockMpdServer, MockMpdServer) {
    let master = MockMpdServer::start().await;
    let slave = MockMpdServer::start().await;
    master.set_queue(QUEUE).await;
    slave.set_queue(QUEUE).await;
    (master, slave)
}

#[tokio::test]
async fn test_playing_master_seeks_then_plays_slave() {
    let (master, slave) = servers().await;
    master.set_player("play", Some(3), Some(42)).await;

    let mut master_peer = connected_peer(Role::Master, &master).await;
    let mut slave_peer = connected_peer(Role::Slave, &slave).await;
    player::reconcile(&mut master_peer, &mut slave_peer)
        .await
        .unwrap();

    assert_eq!(slave.play_state().await, "play");
    assert_eq!(slave.current_song().await, Some(3));
    assert_eq!(slave.elapsed().await, Some(42));
}

#[tokio::test]
async fn test_seek_target_keeps_leading_time_component() {
    let (master, slave) = servers().await;
    // Mock reports time as "42:300"; only the 42 may reach the seek
    master.set_player("play", Some(3), Some(42)).await;

    let mut master_peer = connected_peer(Role::Master, &master).await;
    let mut slave_peer = connected_peer(Role::Slave, &slave).await;
    player::reconcile(&mut master_peer, &mut slave_peer)
        .await
        .unwrap();

    let commands = slave.commands().await;
    assert!(
        commands.iter().any(|c| c == "seek 3 42"),
        "expected 'seek 3 42' in {:?}",
        commands
    );
}

#[tokio::test]
async fn test_paused_master_pauses_playing_slave() {
    let (master, slave) = servers().await;
    master.set_player("pause", Some(1), Some(10)).await;
    slave.set_player("play", Some(0), Some(5)).await;

    let mut master_peer = connected_peer(Role::Master, &master).await;
    let mut slave_peer = connected_peer(Role::Slave, &slave).await;
    player::reconcile(&mut master_peer, &mut slave_peer)
        .await
        .unwrap();

    assert_eq!(slave.play_state().await, "pause");
    assert_eq!(slave.current_song().await, Some(1));
    assert_eq!(slave.elapsed().await, Some(10));
}

#[tokio::test]
async fn test_paused_master_leaves_paused_slave_untoggled() {
    let (master, slave) = servers().await;
    master.set_player("pause", Some(1), Some(10)).await;
    slave.set_player("pause", Some(1), Some(10)).await;

    let mut master_peer = connected_peer(Role::Master, &master).await;
    let mut slave_peer = connected_peer(Role::Slave, &slave).await;
    player::reconcile(&mut master_peer, &mut slave_peer)
        .await
        .unwrap();

    // A toggle here would resume playback on the slave
    assert_eq!(slave.play_state().await, "pause");
    assert_eq!(slave.command_count("pause").await, 0);
}

#[tokio::test]
async fn test_stopped_master_stops_slave() {
    let (master, slave) = servers().await;
    master.set_player("stop", None, None).await;
    slave.set_player("play", Some(2), Some(30)).await;

    let mut master_peer = connected_peer(Role::Master, &master).await;
    let mut slave_peer = connected_peer(Role::Slave, &slave).await;
    player::reconcile(&mut master_peer, &mut slave_peer)
        .await
        .unwrap();

    assert_eq!(slave.play_state().await, "stop");
    // Stop is unconditional; no seek is issued first
    assert_eq!(slave.command_count("seek").await, 0);
}
