//! Core types for playback management

use jukebox_core::{Destination, EntryId, MediaDescriptor, Requester};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// One pending playback request
///
/// Created when a request resolves, consumed exactly once by the playback
/// loop, and dropped when its playback ends or is skipped.
#[derive(Debug, Clone, PartialEq)]
pub struct QueueEntry {
    /// Entry identifier (log correlation)
    pub id: EntryId,

    /// Channel the media should be played into
    pub destination: Destination,

    /// Who asked for it
    pub requester: Requester,

    /// Resolved media
    pub media: MediaDescriptor,
}

impl QueueEntry {
    /// Create a new entry with a fresh id
    pub fn new(destination: Destination, requester: Requester, media: MediaDescriptor) -> Self {
        Self {
            id: EntryId::generate(),
            destination,
            requester,
            media,
        }
    }
}

/// Player state as shown to observers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerState {
    /// Nothing playing, queue drained
    Empty,

    /// Fetching the stream for the current item
    Downloading,

    /// Attaching the output session to the item's destination
    Connecting,

    /// Audio is playing
    Playing,

    /// Paused mid-item
    Paused,

    /// Active but the session reports neither playing nor paused
    Processing,
}

impl PlayerState {
    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Empty => "Empty",
            Self::Downloading => "Downloading",
            Self::Connecting => "Connecting",
            Self::Playing => "Playing",
            Self::Paused => "Paused",
            Self::Processing => "Processing",
        }
    }
}

impl fmt::Display for PlayerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Shortest loop tick the engine will run with
const MIN_TICK_MS: u64 = 1;

/// Configuration for the playback engine
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Poll period of the playback loop in milliseconds (default: 1000,
    /// minimum: 1)
    pub tick_ms: u64,

    /// Wait after moving the session to another destination (default: 1000)
    pub move_settle_ms: u64,

    /// Wait before deleting a finished item's temporary file (default: 1000)
    pub artifact_release_ms: u64,

    /// Volume for the first item, in percent (default: 100)
    pub initial_volume: u32,

    /// Upcoming entries listed in a status snapshot (default: 24)
    pub max_listed_entries: usize,
}

impl EngineConfig {
    /// Loop tick period, never zero
    pub fn tick(&self) -> Duration {
        Duration::from_millis(self.tick_ms.max(MIN_TICK_MS))
    }

    /// Settle delay after a destination move
    pub fn move_settle(&self) -> Duration {
        Duration::from_millis(self.move_settle_ms)
    }

    /// Delay before temporary files are removed
    pub fn artifact_release(&self) -> Duration {
        Duration::from_millis(self.artifact_release_ms)
    }
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            tick_ms: 1000,
            move_settle_ms: 1000,
            artifact_release_ms: 1000,
            initial_volume: 100,
            max_listed_entries: 24,
        }
    }
}
