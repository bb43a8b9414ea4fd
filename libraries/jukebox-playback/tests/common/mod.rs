//! Shared test infrastructure for the engine integration tests
//!
//! - `MockResolver`: mockall double for `Resolver`
//! - `FakeSession`: timer-driven output session that records every call
//! - `RecordingObserver`: status observer that keeps every snapshot

#![allow(dead_code)]

use async_trait::async_trait;
use jukebox_core::{
    CompletionSender, Destination, DeviceError, MediaDescriptor, ObserverGone, PlaybackCompletion,
    PlaybackSession, Requester, ResolutionError, Resolver, StreamHandle,
};
use jukebox_playback::{EngineConfig, PlaybackEngine, PlayerState, StatusObserver, StatusSnapshot};
use mockall::mock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::time::Instant;

// ============================================================================
// Resolver
// ============================================================================

mock! {
    pub Resolver {}

    #[async_trait]
    impl Resolver for Resolver {
        async fn resolve(&self, query: &str) -> Result<MediaDescriptor, ResolutionError>;
        async fn stream(&self, media: &MediaDescriptor) -> Result<StreamHandle, DeviceError>;
    }
}

pub fn media(title: &str, duration_secs: u64) -> MediaDescriptor {
    MediaDescriptor::new(title, "Artist", duration_secs, source_of(title)).with_view_count(1_500)
}

pub fn source_of(title: &str) -> String {
    format!("https://media.example/{}", title.replace(' ', "-"))
}

/// Resolver over a fixed catalog: exact titles resolve, anything else is
/// `NotFound`; every resolved item streams from its source URL.
pub fn catalog_resolver(catalog: &[(&str, u64)]) -> MockResolver {
    let items: Vec<MediaDescriptor> = catalog.iter().map(|(t, d)| media(t, *d)).collect();

    let mut resolver = MockResolver::new();
    resolver.expect_resolve().returning(move |query| {
        items
            .iter()
            .find(|m| m.title == query)
            .cloned()
            .ok_or(ResolutionError::NotFound)
    });
    resolver
        .expect_stream()
        .returning(|media| Ok(StreamHandle::remote(media.source.clone())));
    resolver
}

// ============================================================================
// Output session
// ============================================================================

struct Current {
    locator: String,
    remaining: Duration,
    resumed_at: Option<Instant>,
    sender: Option<CompletionSender>,
}

#[derive(Default)]
struct SessionState {
    destination: Option<Destination>,
    current: Option<Current>,
    generation: u64,
    lengths: HashMap<String, Duration>,
    events: Vec<String>,
    played: Vec<String>,
    volumes: Vec<f32>,
    overlapping_plays: usize,
    fail_next_connect: bool,
}

/// Output session whose items end after their registered length
///
/// Unknown locators play for 60 seconds. Pausing freezes the remaining time.
#[derive(Default)]
pub struct FakeSession {
    state: Arc<Mutex<SessionState>>,
}

impl FakeSession {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn set_length(&self, locator: &str, length: Duration) {
        self.lock().lengths.insert(locator.to_string(), length);
    }

    pub fn fail_next_connect(&self) {
        self.lock().fail_next_connect = true;
    }

    /// Every call, e.g. `connect:Lounge`, `play:<locator>@1.00`, `stop`
    pub fn events(&self) -> Vec<String> {
        self.lock().events.clone()
    }

    /// Locators in the order they started playing
    pub fn played(&self) -> Vec<String> {
        self.lock().played.clone()
    }

    /// Gains passed to `set_volume`
    pub fn volumes(&self) -> Vec<f32> {
        self.lock().volumes.clone()
    }

    /// `play` calls made while another item was still loaded
    pub fn overlapping_plays(&self) -> usize {
        self.lock().overlapping_plays
    }

    /// End the current item with a device failure
    pub fn fail_current(&self, reason: &str) {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(mut current) = state.current.take() {
            if let Some(sender) = current.sender.take() {
                sender.finish(Err(DeviceError::interrupted(reason)));
            }
        }
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, SessionState> {
        self.state.lock().unwrap()
    }

    /// Start the end-of-item timer for the loaded item
    fn arm(&self, state: &mut SessionState) {
        state.generation += 1;
        let generation = state.generation;
        let Some(current) = state.current.as_mut() else {
            return;
        };
        current.resumed_at = Some(Instant::now());
        let remaining = current.remaining;

        let shared = Arc::clone(&self.state);
        tokio::spawn(async move {
            tokio::time::sleep(remaining).await;
            let mut state = shared.lock().unwrap();
            if state.generation != generation {
                return;
            }
            if let Some(mut current) = state.current.take() {
                if let Some(sender) = current.sender.take() {
                    sender.finish(Ok(()));
                }
            }
        });
    }
}

#[async_trait]
impl PlaybackSession for FakeSession {
    fn destination(&self) -> Option<Destination> {
        self.lock().destination.clone()
    }

    async fn connect(&self, destination: &Destination) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if std::mem::take(&mut state.fail_next_connect) {
            state.events.push(format!("connect-failed:{}", destination.name));
            return Err(DeviceError::connect("permission denied"));
        }
        state.events.push(format!("connect:{}", destination.name));
        state.destination = Some(destination.clone());
        Ok(())
    }

    async fn move_to(&self, destination: &Destination) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.events.push(format!("move:{}", destination.name));
        state.destination = Some(destination.clone());
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.events.push("disconnect".to_string());
        state.destination = None;
        Ok(())
    }

    fn play(&self, stream: &StreamHandle, volume: f32) -> Result<PlaybackCompletion, DeviceError> {
        let mut state = self.lock();
        if state.current.is_some() {
            state.overlapping_plays += 1;
        }

        let remaining = state
            .lengths
            .get(&stream.locator)
            .copied()
            .unwrap_or(Duration::from_secs(60));
        let (sender, completion) = PlaybackCompletion::channel();
        state.current = Some(Current {
            locator: stream.locator.clone(),
            remaining,
            resumed_at: None,
            sender: Some(sender),
        });
        state.events.push(format!("play:{}@{volume:.2}", stream.locator));
        state.played.push(stream.locator.clone());
        self.arm(&mut state);
        Ok(completion)
    }

    fn pause(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        let current = state
            .current
            .as_mut()
            .ok_or_else(|| DeviceError::playback("nothing loaded"))?;
        if let Some(resumed_at) = current.resumed_at.take() {
            current.remaining = current.remaining.saturating_sub(resumed_at.elapsed());
        }
        state.generation += 1;
        state.events.push("pause".to_string());
        Ok(())
    }

    fn resume(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        if state.current.as_ref().map_or(true, |c| c.resumed_at.is_some()) {
            return Err(DeviceError::playback("not paused"));
        }
        state.events.push("resume".to_string());
        self.arm(&mut state);
        Ok(())
    }

    fn stop(&self) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.generation += 1;
        if let Some(mut current) = state.current.take() {
            state.events.push(format!("stop:{}", current.locator));
            if let Some(sender) = current.sender.take() {
                sender.finish(Ok(()));
            }
        }
        Ok(())
    }

    fn set_volume(&self, volume: f32) -> Result<(), DeviceError> {
        let mut state = self.lock();
        state.volumes.push(volume);
        state.events.push(format!("volume:{volume:.2}"));
        Ok(())
    }

    fn is_playing(&self) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|c| c.resumed_at.is_some())
    }

    fn is_paused(&self) -> bool {
        self.lock()
            .current
            .as_ref()
            .is_some_and(|c| c.resumed_at.is_none())
    }
}

// ============================================================================
// Observer
// ============================================================================

pub struct RecordingObserver {
    id: String,
    snapshots: Mutex<Vec<StatusSnapshot>>,
    gone: AtomicBool,
}

impl RecordingObserver {
    pub fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.to_string(),
            snapshots: Mutex::new(Vec::new()),
            gone: AtomicBool::new(false),
        })
    }

    /// Make every further update fail as if the surface was deleted
    pub fn vanish(&self) {
        self.gone.store(true, Ordering::SeqCst);
    }

    pub fn snapshots(&self) -> Vec<StatusSnapshot> {
        self.snapshots.lock().unwrap().clone()
    }

    /// Observed states with consecutive duplicates collapsed
    pub fn state_changes(&self) -> Vec<PlayerState> {
        let mut states: Vec<PlayerState> =
            self.snapshots().into_iter().map(|s| s.state).collect();
        states.dedup();
        states
    }
}

#[async_trait]
impl StatusObserver for RecordingObserver {
    fn surface_id(&self) -> &str {
        &self.id
    }

    async fn update(&self, snapshot: &StatusSnapshot) -> Result<(), ObserverGone> {
        if self.gone.load(Ordering::SeqCst) {
            return Err(ObserverGone);
        }
        self.snapshots.lock().unwrap().push(snapshot.clone());
        Ok(())
    }
}

// ============================================================================
// Fixture
// ============================================================================

pub fn lounge() -> Destination {
    Destination::new("100", "Lounge")
}

pub fn bar() -> Destination {
    Destination::new("200", "Bar")
}

pub fn alice() -> Requester {
    Requester::new("u-1", "alice")
}

/// Engine over a catalog resolver and a fake session that knows every
/// catalog item's length
pub fn engine_with(catalog: &[(&str, u64)]) -> (PlaybackEngine, Arc<FakeSession>) {
    engine_with_resolver(catalog, catalog_resolver(catalog))
}

pub fn engine_with_resolver(
    catalog: &[(&str, u64)],
    resolver: MockResolver,
) -> (PlaybackEngine, Arc<FakeSession>) {
    engine_with_config(catalog, resolver, EngineConfig::default())
}

pub fn engine_with_config(
    catalog: &[(&str, u64)],
    resolver: MockResolver,
    config: EngineConfig,
) -> (PlaybackEngine, Arc<FakeSession>) {
    let session = FakeSession::new();
    for (title, secs) in catalog {
        session.set_length(&source_of(title), Duration::from_secs(*secs));
    }
    let engine = PlaybackEngine::new(config, Arc::new(resolver), session.clone());
    (engine, session)
}

/// Wait (in virtual time) for the loop to drain the queue
pub async fn drain(engine: &PlaybackEngine) {
    tokio::time::timeout(Duration::from_secs(24 * 3600), engine.wait_idle())
        .await
        .expect("playback loop never went idle");
}

pub async fn advance(secs: u64) {
    tokio::time::sleep(Duration::from_secs(secs)).await;
}
