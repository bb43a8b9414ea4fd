//! Error types raised by the engine's external collaborators

use thiserror::Error;

/// A query could not be turned into a playable media descriptor.
///
/// The `Display` text is user-facing: front-ends reply with it verbatim to
/// the requester whose request failed.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ResolutionError {
    /// Nothing matched the URL or search phrase
    #[error("Sorry, I couldn't find the media at the specified location.")]
    NotFound,

    /// The media exists but cannot be fetched because of an age restriction
    #[error("Sorry, I cannot download the media as it is age restricted.")]
    AgeRestricted,

    /// Any other resolver failure
    #[error("Sorry, an error occurred: {0}")]
    Unknown(String),
}

impl ResolutionError {
    /// Create an unknown resolution error
    pub fn unknown(msg: impl Into<String>) -> Self {
        Self::Unknown(msg.into())
    }
}

/// Transport or output-session failure
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// Attaching (or moving) the session to a destination failed
    #[error("Connect error: {0}")]
    Connect(String),

    /// Obtaining a playable stream for a media descriptor failed
    #[error("Stream error: {0}")]
    Stream(String),

    /// The output device failed while starting or controlling playback
    #[error("Playback error: {0}")]
    Playback(String),

    /// Playback ended abnormally (device reset, transport dropped)
    #[error("Playback interrupted: {0}")]
    Interrupted(String),
}

impl DeviceError {
    /// Create a connect error
    pub fn connect(msg: impl Into<String>) -> Self {
        Self::Connect(msg.into())
    }

    /// Create a stream error
    pub fn stream(msg: impl Into<String>) -> Self {
        Self::Stream(msg.into())
    }

    /// Create a playback error
    pub fn playback(msg: impl Into<String>) -> Self {
        Self::Playback(msg.into())
    }

    /// Create an interruption error
    pub fn interrupted(msg: impl Into<String>) -> Self {
        Self::Interrupted(msg.into())
    }
}

/// The surface a status observer renders into no longer exists
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[error("status surface no longer exists")]
pub struct ObserverGone;
