//! Error types for playback management

use jukebox_core::{DeviceError, ResolutionError};
use thiserror::Error;

/// Playback errors
#[derive(Debug, Error)]
pub enum PlaybackError {
    /// The request could not be resolved into playable media
    #[error(transparent)]
    Resolution(#[from] ResolutionError),

    /// The output session rejected a control call
    #[error(transparent)]
    Device(#[from] DeviceError),

    /// Queue position outside `[0, len)`
    #[error("Index out of bounds: {index} (queue holds {len} entries)")]
    IndexOutOfBounds {
        /// Requested position (0-based)
        index: usize,
        /// Queue length at the time of the request
        len: usize,
    },

    /// Requester is not in the destination the output is attached to
    #[error("Join the channel {expected} to use the music player")]
    NotInSession {
        /// Name of the destination the output is attached to
        expected: String,
    },

    /// Requester is not in any destination
    #[error("Please join a channel so I can play music there!")]
    NoDestination,
}

/// Result type for playback operations
pub type Result<T> = std::result::Result<T, PlaybackError>;
