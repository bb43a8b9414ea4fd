//! Collaborator contracts consumed by the playback engine

use crate::error::{DeviceError, ResolutionError};
use crate::types::{Destination, MediaDescriptor, StreamHandle};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::sync::oneshot;

/// Turns user queries into media and media into playable streams
///
/// Implementers may hit the network or the filesystem; both calls are
/// awaited by the engine without holding any engine lock.
#[async_trait]
pub trait Resolver: Send + Sync {
    /// Resolve a URL or search phrase into a media descriptor
    ///
    /// # Errors
    /// Returns a `ResolutionError` describing why nothing playable was found
    async fn resolve(&self, query: &str) -> Result<MediaDescriptor, ResolutionError>;

    /// Obtain a playable stream for an already-resolved descriptor
    ///
    /// This may download the media to a temporary file, in which case the
    /// returned handle names it in `local_artifact`.
    ///
    /// # Errors
    /// Returns `DeviceError::Stream` if the stream cannot be produced
    async fn stream(&self, media: &MediaDescriptor) -> Result<StreamHandle, DeviceError>;
}

/// One output device attached to (at most) one destination
///
/// All methods take `&self`; implementers use interior mutability. The
/// synchronous methods are called while the engine holds its state lock, so
/// they must return promptly and must never call back into the engine.
#[async_trait]
pub trait PlaybackSession: Send + Sync {
    /// Destination the session is currently attached to, if connected
    fn destination(&self) -> Option<Destination>;

    /// Attach to a destination from a disconnected state
    async fn connect(&self, destination: &Destination) -> Result<(), DeviceError>;

    /// Re-attach an already connected session to another destination
    async fn move_to(&self, destination: &Destination) -> Result<(), DeviceError>;

    /// Detach from the current destination
    async fn disconnect(&self) -> Result<(), DeviceError>;

    /// Start playing a stream at the given gain
    ///
    /// The returned completion resolves when the stream ends, is stopped, or
    /// fails.
    fn play(&self, stream: &StreamHandle, volume: f32) -> Result<PlaybackCompletion, DeviceError>;

    /// Pause the current stream
    fn pause(&self) -> Result<(), DeviceError>;

    /// Resume a paused stream
    fn resume(&self) -> Result<(), DeviceError>;

    /// Stop the current stream (no-op when nothing is playing)
    fn stop(&self) -> Result<(), DeviceError>;

    /// Change the gain of the live stream
    fn set_volume(&self, volume: f32) -> Result<(), DeviceError>;

    /// Whether a stream is currently audible
    fn is_playing(&self) -> bool;

    /// Whether a stream is loaded but paused
    fn is_paused(&self) -> bool;
}

/// End-of-item notification for one `PlaybackSession::play` call
///
/// Resolves to `Ok(())` when the item ended normally (or was stopped) and to
/// a `DeviceError` when playback failed. A session that drops its
/// [`CompletionSender`] without reporting is treated as a normal end.
#[derive(Debug)]
pub struct PlaybackCompletion {
    rx: oneshot::Receiver<Result<(), DeviceError>>,
}

/// Session-side half of a [`PlaybackCompletion`]
#[derive(Debug)]
pub struct CompletionSender {
    tx: oneshot::Sender<Result<(), DeviceError>>,
}

impl PlaybackCompletion {
    /// Create a linked sender / completion pair
    pub fn channel() -> (CompletionSender, Self) {
        let (tx, rx) = oneshot::channel();
        (CompletionSender { tx }, Self { rx })
    }

    /// A completion that has already resolved with `result`
    pub fn ready(result: Result<(), DeviceError>) -> Self {
        let (sender, completion) = Self::channel();
        sender.finish(result);
        completion
    }
}

impl CompletionSender {
    /// Report the end of the item
    pub fn finish(self, result: Result<(), DeviceError>) {
        // The engine may already have moved on (skip); nobody to tell then.
        let _ = self.tx.send(result);
    }

    /// Whether the engine stopped waiting for this item
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

impl Future for PlaybackCompletion {
    type Output = Result<(), DeviceError>;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        Pin::new(&mut self.rx)
            .poll(cx)
            .map(|received| received.unwrap_or(Ok(())))
    }
}
