//! Simulated output session
//!
//! Stands in for a real audio device: "plays" a stream by running a timer
//! for the stream's length, honoring pause/resume, and reports the end of
//! the item through its `PlaybackCompletion`.

use async_trait::async_trait;
use jukebox_core::{
    CompletionSender, Destination, DeviceError, PlaybackCompletion, PlaybackSession, StreamHandle,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::time::Instant;
use tracing::{debug, info};

/// Length assumed for streams nobody registered
const FALLBACK_LENGTH: Duration = Duration::from_secs(30);

/// Stream lengths shared between the resolver (which knows them) and the
/// session (which plays for that long)
#[derive(Debug, Clone, Default)]
pub struct StreamLengths {
    lengths: Arc<Mutex<HashMap<String, Duration>>>,
}

impl StreamLengths {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<String, Duration>> {
        self.lengths.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn record(&self, locator: impl Into<String>, length: Duration) {
        self.lock().insert(locator.into(), length);
    }

    pub fn forget(&self, locator: &str) {
        self.lock().remove(locator);
    }

    pub fn length_of(&self, locator: &str) -> Duration {
        self.lock().get(locator).copied().unwrap_or(FALLBACK_LENGTH)
    }
}

struct Loaded {
    locator: String,
    remaining: Duration,
    /// `None` while paused
    resumed_at: Option<Instant>,
    volume: f32,
    completion: Option<CompletionSender>,
}

#[derive(Default)]
struct SessionState {
    destination: Option<Destination>,
    loaded: Option<Loaded>,
    /// Bumped whenever the running timer becomes stale
    generation: u64,
}

/// Timer-driven `PlaybackSession`
#[derive(Clone)]
pub struct SimulatedSession {
    state: Arc<Mutex<SessionState>>,
    lengths: StreamLengths,
}

impl SimulatedSession {
    pub fn new(lengths: StreamLengths) -> Self {
        Self {
            state: Arc::new(Mutex::new(SessionState::default())),
            lengths,
        }
    }

    fn lock(&self) -> MutexGuard<'_, SessionState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Gain of the loaded stream
    pub fn volume(&self) -> Option<f32> {
        self.lock().loaded.as_ref().map(|l| l.volume)
    }

    /// Start the end-of-stream timer for the loaded stream
    fn start_timer(&self, state: &mut SessionState) {
        state.generation += 1;
        let generation = state.generation;
        let Some(loaded) = state.loaded.as_mut() else {
            return;
        };
        loaded.resumed_at = Some(Instant::now());
        let remaining = loaded.remaining;

        let shared = Arc::clone(&self.state);
        let lengths = self.lengths.clone();
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut state = shared.lock().unwrap_or_else(PoisonError::into_inner);
            if state.generation != generation {
                return;
            }
            if let Some(mut loaded) = state.loaded.take() {
                debug!(locator = %loaded.locator, "Stream ended");
                lengths.forget(&loaded.locator);
                if let Some(completion) = loaded.completion.take() {
                    completion.finish(Ok(()));
                }
            }
        });
    }
}

#[async_trait]
impl PlaybackSession for SimulatedSession {
    fn destination(&self) -> Option<Destination> {
        self.lock().destination.clone()
    }

    async fn connect(&self, destination: &Destination) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if let Some(current) = &state.destination {
            return Err(DeviceError::connect(format!(
                "already connected to {}",
                current.name
            )));
        }
        info!(destination = %destination.name, "Output connected");
        state.destination = Some(destination.clone());
        Ok(())
    }

    async fn move_to(&self, destination: &Destination) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.destination.is_none() {
            return Err(DeviceError::connect("not connected"));
        }
        info!(destination = %destination.name, "Output moved");
        state.destination = Some(destination.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.generation += 1;
        state.loaded = None;
        if let Some(previous) = state.destination.take() {
            info!(destination = %previous.name, "Output disconnected");
        }
        Ok(())
    }

    fn play(&self, stream: &StreamHandle, volume: f32) -> Result<PlaybackCompletion, DeviceError> {
        let mut state = self.lock();
        if state.destination.is_none() {
            return Err(DeviceError::playback("not connected"));
        }
        if state.loaded.is_some() {
            return Err(DeviceError::playback("already playing"));
        }

        let remaining = self.lengths.length_of(&stream.locator);
        let (sender, completion) = PlaybackCompletion::channel();
        debug!(locator = %stream.locator, length = ?remaining, volume, "Stream started");
        state.loaded = Some(Loaded {
            locator: stream.locator.clone(),
            remaining,
            resumed_at: None,
            volume,
            completion: Some(sender),
        });
        self.start_timer(&mut state);
        Ok(completion)
    }

    fn pause(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let loaded = state
            .loaded
            .as_mut()
            .ok_or_else(|| DeviceError::playback("nothing to pause"))?;
        if let Some(resumed_at) = loaded.resumed_at.take() {
            loaded.remaining = loaded.remaining.saturating_sub(resumed_at.elapsed());
        }
        state.generation += 1;
        Ok(())
    }

    fn resume(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let paused = match &state.loaded {
            Some(loaded) => loaded.resumed_at.is_none(),
            None => return Err(DeviceError::playback("nothing to resume")),
        };
        if paused {
            self.start_timer(&mut state);
        }
        Ok(())
    }

    fn stop(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(mut loaded) = state.loaded.take() {
            debug!(locator = %loaded.locator, "Stream stopped");
            self.lengths.forget(&loaded.locator);
            if let Some(completion) = loaded.completion.take() {
                completion.finish(Ok(()));
            }
        }
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let loaded = state
            .loaded
            .as_mut()
            .ok_or_else(|| DeviceError::playback("nothing loaded"))?;
        loaded.volume = volume;
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.lock()
            .loaded
            .as_ref()
            .is_some_and(|l| l.resumed_at.is_some())
    }

    fn is_paused(&self) -> bool {
        self.lock()
            .loaded
            .as_ref()
            .is_some_and(|l| l.resumed_at.is_none())
    }
}
