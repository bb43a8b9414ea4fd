//! Console error types

use jukebox_playback::PlaybackError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, ConsoleError>;

#[derive(Debug, Error)]
pub enum ConsoleError {
    #[error("Configuration error: {0}")]
    Config(String),

    /// Unparseable or out-of-range command input; shown to the user as is
    #[error("{0}")]
    Command(String),

    #[error(transparent)]
    Playback(#[from] PlaybackError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl ConsoleError {
    pub fn command(msg: impl Into<String>) -> Self {
        Self::Command(msg.into())
    }
}

impl From<config::ConfigError> for ConsoleError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}
