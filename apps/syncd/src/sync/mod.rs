//! Sync orchestration: bootstrap full sync and the perpetual watch loop
//!
//! The orchestrator owns one [`Peer`] record per configured server. After
//! connecting and full-syncing every reachable slave it parks on the
//! master's blocking `idle` call and replays each reported change category
//! onto the healthy slaves. A failing slave is skipped for the current
//! event and picked up again by the next health check; a failing master
//! ends the process.

pub mod player;
pub mod playlist;

use tracing::{debug, info, warn};
use unison_mpd_client::{Status, Subsystem};
use unison_shared_config::SyncSettings;

use crate::error::{SyncError, SyncResult};
use crate::peer::{Peer, Role};

/// Owner of the sync topology and driver of the watch loop
#[derive(Debug)]
pub struct Orchestrator {
    master: Peer,
    slaves: Vec<Peer>,
}

impl Orchestrator {
    /// Connect the master and every configured slave
    ///
    /// Slaves that fail to connect are logged and excluded from the active
    /// set; a master that fails to connect is fatal.
    pub async fn connect(settings: &SyncSettings) -> SyncResult<Self> {
        let mut master = Peer::from_config(Role::Master, &settings.servers.master);
        if !master.connect().await {
            return Err(SyncError::MasterGone {
                endpoint: master.endpoint(),
            });
        }

        let mut slaves = Vec::with_capacity(settings.servers.slaves.len());
        for server in &settings.servers.slaves {
            let mut slave = Peer::from_config(Role::Slave, server);
            if slave.connect().await {
                slaves.push(slave);
            } else {
                warn!(slave = %server.endpoint(), "slave excluded from sync set");
            }
        }

        Ok(Self { master, slaves })
    }

    /// The master peer
    pub fn master(&self) -> &Peer {
        &self.master
    }

    /// The active slave set
    pub fn slaves(&self) -> &[Peer] {
        &self.slaves
    }

    /// Bootstrap: copy the master's full state to every connected slave
    ///
    /// A slave whose full sync fails stays in the active set; its stale
    /// queue revision makes the next playlist event replay everything it
    /// missed.
    pub async fn full_sync(&mut self) {
        let Self { master, slaves } = self;
        for slave in slaves.iter_mut() {
            if let Err(e) = full_sync_slave(master, slave).await {
                warn!(
                    slave = %slave.endpoint(),
                    error = %e,
                    "full sync failed; slave will catch up on the next change event"
                );
            }
        }
    }

    /// Run the watch loop until the master becomes unreachable
    ///
    /// Never returns `Ok`: the loop is perpetual, and the only exit is a
    /// master the single reconnect attempt could not bring back (or a
    /// malformed master response).
    pub async fn run(&mut self) -> SyncResult<()> {
        self.full_sync().await;
        info!(slaves = self.slaves.len(), "entering watch loop");

        loop {
            if !self.master.check_health().await {
                return Err(SyncError::MasterGone {
                    endpoint: self.master.endpoint(),
                });
            }

            let subsystems = match wait_for_change(&mut self.master).await {
                Ok(subsystems) => subsystems,
                Err(e) if e.is_connection_error() => {
                    // The health check at the top of the loop decides
                    // whether this is recoverable.
                    warn!(
                        master = %self.master.endpoint(),
                        error = %e,
                        "wait for master change interrupted"
                    );
                    continue;
                }
                Err(e) => return Err(e.into()),
            };

            debug!(?subsystems, "master reported changes");
            self.apply_changes(&subsystems).await?;
        }
    }

    /// Replay one change event onto the healthy slaves
    async fn apply_changes(&mut self, subsystems: &[Subsystem]) -> SyncResult<()> {
        let Self { master, slaves } = self;

        // One health check per slave per event; an unhealthy slave sits
        // this event out and is retried on the next one.
        let mut healthy = Vec::with_capacity(slaves.len());
        for slave in slaves.iter_mut() {
            let alive = slave.check_health().await;
            if !alive {
                warn!(
                    slave = %slave.endpoint(),
                    "lost slave and was not able to reconnect; retrying on next change"
                );
            }
            healthy.push(alive);
        }

        for subsystem in subsystems {
            match subsystem {
                Subsystem::Playlist | Subsystem::Player => {}
                Subsystem::Mixer => {
                    // Placeholder: following the master's volume from the
                    // offset captured at full sync is not implemented.
                    debug!("mixer change ignored");
                    continue;
                }
                Subsystem::Other(name) => {
                    debug!(subsystem = %name, "no handler for subsystem");
                    continue;
                }
            }

            let master_status = match master.client.status().await {
                Ok(status) => status,
                Err(e) if e.is_connection_error() => {
                    // Abandon the event; the watch loop's health gate
                    // reconnects or escalates.
                    warn!(
                        master = %master.endpoint(),
                        error = %e,
                        "master status unavailable mid-event"
                    );
                    return Ok(());
                }
                Err(e) => return Err(e.into()),
            };

            for (slave, alive) in slaves.iter_mut().zip(healthy.iter().copied()) {
                if !alive {
                    continue;
                }
                // Per-slave isolation: one misbehaving slave must not stall
                // the others or the loop.
                if let Err(e) = sync_slave(master, slave, subsystem, &master_status).await {
                    warn!(
                        slave = %slave.endpoint(),
                        subsystem = %subsystem,
                        error = %e,
                        "sync operation failed; slave skipped for this event"
                    );
                }
            }
        }
        Ok(())
    }
}

/// Block until the master signals that one or more state categories changed
///
/// Parks on the master's `idle` call; a lost connection surfaces here as a
/// connection error for the watch loop to act on, never swallowed. Only
/// called while the master is believed healthy.
async fn wait_for_change(master: &mut Peer) -> unison_mpd_client::MpdResult<Vec<Subsystem>> {
    master.client.idle().await
}

/// Copy queue, transport state, and the volume offset to one slave
async fn full_sync_slave(master: &mut Peer, slave: &mut Peer) -> SyncResult<()> {
    playlist::full_sync(master, slave).await?;
    player::reconcile(master, slave).await?;

    let master_volume = master.client.status().await?.volume.unwrap_or(0);
    let slave_volume = slave.client.status().await?.volume.unwrap_or(0);
    slave.volume_offset = master_volume - slave_volume;

    info!(
        slave = %slave.endpoint(),
        master = %master.endpoint(),
        volume_offset = slave.volume_offset,
        "synced slave to master"
    );
    Ok(())
}

/// Dispatch one changed category to one slave
async fn sync_slave(
    master: &mut Peer,
    slave: &mut Peer,
    subsystem: &Subsystem,
    master_status: &Status,
) -> SyncResult<()> {
    match subsystem {
        Subsystem::Playlist => playlist::incremental_sync(master, slave, master_status).await,
        Subsystem::Player => player::reconcile(master, slave).await,
        Subsystem::Mixer | Subsystem::Other(_) => Ok(()),
    }
}
