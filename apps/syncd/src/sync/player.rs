//! Transport-state reconciliation between master and slave players

use tracing::debug;
use unison_mpd_client::PlayState;

use crate::error::SyncResult;
use crate::peer::Peer;

/// Drive the slave's transport to match the master's
///
/// The seek target is the leading component of the master's colon-separated
/// elapsed time, in whole units; finer precision is not invented.
pub async fn reconcile(master: &mut Peer, slave: &mut Peer) -> SyncResult<()> {
    let status = master.client.status().await?;

    match status.state {
        PlayState::Play => {
            let song = status.song.unwrap_or(0);
            let elapsed = status.elapsed_component().unwrap_or(0);
            slave.client.seek(song, elapsed).await?;
            slave.client.play().await?;
        }
        PlayState::Pause => {
            let song = status.song.unwrap_or(0);
            let elapsed = status.elapsed_component().unwrap_or(0);
            slave.client.seek(song, elapsed).await?;

            // `pause` is a toggle: sending it to an already-paused slave
            // would resume playback there.
            if slave.client.status().await?.state == PlayState::Play {
                slave.client.pause_toggle().await?;
            }
        }
        PlayState::Stop => {
            slave.client.stop().await?;
        }
    }

    debug!(
        slave = %slave.endpoint(),
        state = %status.state,
        song = status.song,
        "reconciled player state"
    );
    Ok(())
}
