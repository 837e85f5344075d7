//! Typed models for MPD control-protocol responses

use std::collections::HashMap;
use std::fmt;

use crate::error::{MpdError, MpdResult};

/// Player transport state as reported by `status`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlayState {
    Play,
    Pause,
    Stop,
}

impl std::str::FromStr for PlayState {
    type Err = MpdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "play" => Ok(Self::Play),
            "pause" => Ok(Self::Pause),
            "stop" => Ok(Self::Stop),
            other => Err(MpdError::Protocol(format!(
                "unknown player state '{}'",
                other
            ))),
        }
    }
}

impl fmt::Display for PlayState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Play => write!(f, "play"),
            Self::Pause => write!(f, "pause"),
            Self::Stop => write!(f, "stop"),
        }
    }
}

/// A state category reported by `idle`
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Subsystem {
    /// The play queue changed
    Playlist,
    /// Transport state, current song, or seek position changed
    Player,
    /// Volume changed
    Mixer,
    /// Any category this client has no special handling for
    Other(String),
}

impl From<&str> for Subsystem {
    fn from(name: &str) -> Self {
        match name {
            "playlist" => Self::Playlist,
            "player" => Self::Player,
            "mixer" => Self::Mixer,
            other => Self::Other(other.to_string()),
        }
    }
}

impl fmt::Display for Subsystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Playlist => write!(f, "playlist"),
            Self::Player => write!(f, "player"),
            Self::Mixer => write!(f, "mixer"),
            Self::Other(name) => write!(f, "{}", name),
        }
    }
}

/// Snapshot of server state from a `status` command
#[derive(Debug, Clone)]
pub struct Status {
    /// Mixer volume, absent when the server has no mixer
    pub volume: Option<i32>,

    /// Transport state
    pub state: PlayState,

    /// Zero-based queue index of the current song, absent when stopped
    pub song: Option<u32>,

    /// Elapsed and total time of the current song, `elapsed:total`,
    /// verbatim as the server reported it
    pub time: Option<String>,

    /// Play-queue revision; grows monotonically with every queue mutation
    pub playlist_version: u32,

    /// Number of entries in the play queue
    pub playlist_length: u32,
}

impl Status {
    /// Build a status from the `key: value` fields of a `status` response
    pub(crate) fn from_fields(fields: &HashMap<String, String>) -> MpdResult<Self> {
        Ok(Self {
            volume: match fields.get("volume") {
                Some(raw) => Some(parse_field("volume", raw)?),
                None => None,
            },
            state: required(fields, "state")?.parse()?,
            song: match fields.get("song") {
                Some(raw) => Some(parse_field("song", raw)?),
                None => None,
            },
            time: fields.get("time").cloned(),
            playlist_version: parse_field("playlist", required(fields, "playlist")?)?,
            playlist_length: parse_field(
                "playlistlength",
                required(fields, "playlistlength")?,
            )?,
        })
    }

    /// Leading component of the `time` field, in whole units
    ///
    /// The seek target derived from this keeps the granularity of whatever
    /// the server reports before the colon; no finer precision is invented.
    pub fn elapsed_component(&self) -> Option<u64> {
        self.time
            .as_deref()
            .and_then(|t| t.split(':').next())
            .and_then(|s| s.parse().ok())
    }
}

/// One `plchanges` entry: a queue position whose entry was added or changed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueChange {
    /// Zero-based queue position
    pub position: u32,

    /// Opaque media reference at that position
    pub uri: String,
}

fn required<'a>(fields: &'a HashMap<String, String>, key: &str) -> MpdResult<&'a str> {
    fields
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| MpdError::Protocol(format!("status response missing '{}'", key)))
}

fn parse_field<T>(key: &str, raw: &str) -> MpdResult<T>
where
    T: std::str::FromStr,
{
    raw.parse()
        .map_err(|_| MpdError::Protocol(format!("unparseable '{}' value '{}'", key, raw)))
}
