//! Play-queue synchronization between master and slave
//!
//! Two strategies: a full copy for bootstrap, and a `plchanges`-based diff
//! for the steady state. Both leave the slave's queue equal to the master's
//! in content and order, and stamp the slave with the master's queue
//! revision.

use tracing::debug;
use unison_mpd_client::Status;

use crate::error::SyncResult;
use crate::peer::Peer;

/// Reset the slave's queue to an exact ordered copy of the master's
///
/// Clears the slave queue, appends every master entry in order, and adopts
/// the master's queue revision.
pub async fn full_sync(master: &mut Peer, slave: &mut Peer) -> SyncResult<()> {
    let status = master.client.status().await?;
    let queue = master.client.queue().await?;

    slave.client.clear().await?;
    for uri in &queue {
        slave.client.append(uri).await?;
    }
    slave.playlist_version = status.playlist_version;

    debug!(
        slave = %slave.endpoint(),
        entries = queue.len(),
        revision = slave.playlist_version,
        "copied full queue"
    );
    Ok(())
}

/// Bring the slave's queue up to the master's by applying the diff since
/// the slave's last known revision
///
/// Applies each (position, entry) pair in the order the master reports,
/// then trims the slave's tail one entry at a time until the lengths match.
/// The collaborator exposes no range delete, so trimming is a bounded loop
/// of single deletions. An empty diff with equal lengths does nothing.
pub async fn incremental_sync(
    master: &mut Peer,
    slave: &mut Peer,
    master_status: &Status,
) -> SyncResult<()> {
    let changes = master.client.queue_changes(slave.playlist_version).await?;
    for change in &changes {
        slave.client.insert_at(&change.uri, change.position).await?;
    }

    let master_length = master.client.status().await?.playlist_length;
    let mut slave_length = slave.client.status().await?.playlist_length;
    let mut deleted = 0;
    while slave_length > master_length {
        slave.client.delete_at(slave_length - 1).await?;
        slave_length -= 1;
        deleted += 1;
    }

    slave.playlist_version = master_status.playlist_version;

    debug!(
        slave = %slave.endpoint(),
        applied = changes.len(),
        deleted,
        revision = slave.playlist_version,
        "applied queue diff"
    );
    Ok(())
}
