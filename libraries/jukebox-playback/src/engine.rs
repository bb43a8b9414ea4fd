//! Playback engine - core orchestration
//!
//! Owns the queue, the single background playback loop, the elapsed-time and
//! pause bookkeeping, and the volume. Control calls from any number of
//! concurrent callers only edit shared state under one mutex and return
//! immediately; the loop observes their effect at its next tick (or at once
//! for device calls such as pause and volume).
//!
//! Loop states:
//!
//! ```text
//! IDLE ──request──▶ ACTIVE( DOWNLOADING ─▶ CONNECTING ─▶ PLAYING ⇄ PAUSED ) ──queue drained──▶ IDLE
//!                              ▲                                   │
//!                              └──────── next entry ◀──────────────┘
//! ```
//!
//! At most one loop runs at a time: `active` is checked and set under the
//! state lock by the caller that launches it, and only the loop itself clears
//! it, again under the lock, after confirming the queue is empty.

use crate::{
    error::{PlaybackError, Result},
    observers::{ObserverRegistry, StatusObserver},
    queue::Queue,
    status::StatusSnapshot,
    types::{EngineConfig, PlayerState, QueueEntry},
    volume::Volume,
};
use jukebox_core::{
    Destination, DeviceError, MediaDescriptor, PlaybackSession, Requester, Resolver, StreamHandle,
};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::sync::{Mutex as AsyncMutex, Notify};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

/// Where the loop is within the current item
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Phase {
    Downloading,
    Connecting,
    Playing,
}

#[derive(Debug)]
struct EngineState {
    queue: Queue,
    active: bool,
    skip_requested: bool,
    volume: Volume,
    now_playing: Option<QueueEntry>,
    phase: Phase,
    started_at: Option<Instant>,
    paused_at: Option<Instant>,
}

impl EngineState {
    fn new(volume: Volume) -> Self {
        Self {
            queue: Queue::new(),
            active: false,
            skip_requested: false,
            volume,
            now_playing: None,
            phase: Phase::Downloading,
            started_at: None,
            paused_at: None,
        }
    }

    /// Move the queue head into `now_playing`
    ///
    /// Any pending skip referred to the item that just ended, so it is
    /// consumed here. A "play now" issued in the meantime already sits at
    /// the head of the queue.
    fn take_next(&mut self) -> Option<QueueEntry> {
        self.skip_requested = false;
        self.started_at = None;
        self.paused_at = None;
        self.phase = Phase::Downloading;
        self.now_playing = self.queue.pop_front();
        self.now_playing.clone()
    }

    fn elapsed_secs(&self) -> u64 {
        let Some(started_at) = self.started_at else {
            return 0;
        };
        let until = self.paused_at.unwrap_or_else(Instant::now);
        until.saturating_duration_since(started_at).as_secs()
    }
}

struct Inner {
    config: EngineConfig,
    resolver: Arc<dyn Resolver>,
    session: Arc<dyn PlaybackSession>,
    state: Mutex<EngineState>,
    observers: ObserverRegistry,
    /// Held from snapshot to delivery so observers see snapshots in order
    publishing: AsyncMutex<()>,
    /// An idle-engine broadcast is spawned and has not taken its snapshot yet
    broadcast_queued: AtomicBool,
    /// Wakes the loop to broadcast right away after a control call
    wake: Notify,
    /// Signalled when the loop exits
    idle: Notify,
}

/// Queue-driven playback controller for one managed output
///
/// Cheap to clone; all clones drive the same engine.
#[derive(Clone)]
pub struct PlaybackEngine {
    inner: Arc<Inner>,
}

impl PlaybackEngine {
    /// Create an idle engine
    pub fn new(
        config: EngineConfig,
        resolver: Arc<dyn Resolver>,
        session: Arc<dyn PlaybackSession>,
    ) -> Self {
        let volume = Volume::new(config.initial_volume);
        Self {
            inner: Arc::new(Inner {
                config,
                resolver,
                session,
                state: Mutex::new(EngineState::new(volume)),
                observers: ObserverRegistry::new(),
                publishing: AsyncMutex::new(()),
                broadcast_queued: AtomicBool::new(false),
                wake: Notify::new(),
                idle: Notify::new(),
            }),
        }
    }

    fn state(&self) -> MutexGuard<'_, EngineState> {
        self.inner
            .state
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
    }

    /// Engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.inner.config
    }

    // ===== Requests and controls =====

    /// Resolve `query` and queue it for `destination`
    ///
    /// With `add_to_queue` the entry goes to the end of the queue; otherwise
    /// it goes to the head and, if something is already playing, that item is
    /// skipped at the next tick. On an idle engine this launches the playback
    /// loop; the call returns once the first entry is `now_playing`, not when
    /// the queue has drained.
    ///
    /// Resolution failures leave the queue untouched.
    pub async fn request_media(
        &self,
        destination: Destination,
        requester: Requester,
        query: &str,
        add_to_queue: bool,
    ) -> Result<()> {
        debug!(query, add_to_queue, destination = %destination.id, "Media requested");

        let media = self.inner.resolver.resolve(query).await.map_err(|e| {
            warn!(query, error = %e, "Request could not be resolved");
            e
        })?;

        let entry = QueueEntry::new(destination, requester, media);
        let launch = {
            let mut state = self.state();
            info!(
                entry = %entry.id,
                title = %entry.media.title,
                position = if add_to_queue { "end" } else { "head" },
                "Adding request to the queue"
            );
            if add_to_queue {
                state.queue.append(entry);
            } else {
                state.queue.prepend(entry);
            }
            debug!(size = state.queue.len(), "Queue size");

            if state.active {
                if !add_to_queue {
                    state.skip_requested = true;
                }
                None
            } else {
                state.active = true;
                state.take_next()
            }
        };

        match launch {
            Some(first) => {
                debug!("Launching the playback loop");
                tokio::spawn(self.clone().run(first));
            }
            None => self.publish(true),
        }
        Ok(())
    }

    /// Skip the item currently playing
    ///
    /// Idempotent until the loop observes it. Ignored on an idle engine.
    pub fn request_skip(&self) {
        let mut state = self.state();
        if !state.active {
            debug!("Skip ignored, nothing is playing");
            return;
        }
        debug!(already_requested = state.skip_requested, "Skip requested");
        state.skip_requested = true;
    }

    /// Pause the item currently playing
    pub fn request_pause(&self) -> Result<()> {
        {
            let mut state = self.state();
            if !state.active || state.paused_at.is_some() || !self.inner.session.is_playing() {
                debug!("Pause ignored, nothing is playing");
                return Ok(());
            }
            debug!("Pause requested");
            self.inner.session.pause()?;
            state.paused_at = Some(Instant::now());
        }
        self.publish(true);
        Ok(())
    }

    /// Resume a paused item
    ///
    /// The pause duration is added to the start time so progress continues
    /// where it stopped.
    pub fn request_resume(&self) -> Result<()> {
        let active = {
            let mut state = self.state();
            let Some(paused_at) = state.paused_at else {
                debug!("Resume ignored, playback is not paused");
                return Ok(());
            };
            debug!("Resume requested");
            self.inner.session.resume()?;

            let paused_for = Instant::now().saturating_duration_since(paused_at);
            if let Some(started_at) = state.started_at.as_mut() {
                *started_at += paused_for;
            }
            state.paused_at = None;
            state.active
        };
        self.publish(active);
        Ok(())
    }

    /// Drop every pending entry and stop the item currently playing
    pub fn request_clear(&self) {
        let active = {
            let mut state = self.state();
            debug!(dropped = state.queue.len(), "Clear requested");
            state.queue.clear();
            if state.active {
                state.skip_requested = true;
            }
            state.active
        };
        self.publish(active);
    }

    /// Set the volume in percent (0 mutes; values above 100 amplify)
    ///
    /// Applies to the live item immediately and to every following item.
    pub fn request_set_volume(&self, percent: u32) -> Result<()> {
        let (active, applied) = {
            let mut state = self.state();
            debug!(from = state.volume.percent(), to = percent, "Volume change requested");
            state.volume.set_percent(percent);

            let session = &self.inner.session;
            let live = state.active && (session.is_playing() || session.is_paused());
            let applied = if live {
                session.set_volume(state.volume.gain())
            } else {
                Ok(())
            };
            (state.active, applied)
        };
        self.publish(active);
        applied.map_err(PlaybackError::from)
    }

    /// Remove the pending entry at `index` (0-based)
    pub fn request_remove(&self, index: usize) -> Result<QueueEntry> {
        let (removed, active) = {
            let mut state = self.state();
            debug!(index, "Removal requested");
            let removed = state.queue.remove_at(index)?;
            (removed, state.active)
        };
        self.publish(active);
        Ok(removed)
    }

    /// Make the pending entry at `index` (0-based) play next
    ///
    /// Drops every entry before it, then skips the item currently playing.
    pub fn request_jump(&self, index: usize) -> Result<()> {
        let active = {
            let mut state = self.state();
            let len = state.queue.len();
            if index >= len {
                return Err(PlaybackError::IndexOutOfBounds { index, len });
            }
            debug!(index, "Jump requested");
            state.queue.truncate_prefix(index)?;
            if state.active {
                state.skip_requested = true;
            }
            state.active
        };
        self.publish(active);
        Ok(())
    }

    /// Check that a requester may control the player
    ///
    /// The requester has to be in a destination, and while the output is
    /// attached somewhere it has to be that same destination.
    pub fn authorize(&self, requester_destination: Option<&Destination>) -> Result<()> {
        let requester_destination = requester_destination.ok_or(PlaybackError::NoDestination)?;
        match self.inner.session.destination() {
            Some(current) if current != *requester_destination => {
                Err(PlaybackError::NotInSession {
                    expected: current.name,
                })
            }
            _ => Ok(()),
        }
    }

    // ===== Status =====

    /// Snapshot of the engine; `state` overrides the derived player state
    pub fn queue_status(&self, state: Option<PlayerState>) -> StatusSnapshot {
        let engine = self.state();
        let player_state = state.unwrap_or_else(|| self.derive_state(&engine));
        StatusSnapshot::capture(
            player_state,
            engine.now_playing.as_ref(),
            engine.elapsed_secs(),
            engine.volume,
            &engine.queue,
            self.inner.config.max_listed_entries,
        )
    }

    fn derive_state(&self, state: &EngineState) -> PlayerState {
        if !state.active || state.now_playing.is_none() {
            return PlayerState::Empty;
        }
        match state.phase {
            Phase::Downloading => PlayerState::Downloading,
            Phase::Connecting => PlayerState::Connecting,
            Phase::Playing if self.inner.session.is_playing() => PlayerState::Playing,
            Phase::Playing if self.inner.session.is_paused() => PlayerState::Paused,
            Phase::Playing => PlayerState::Processing,
        }
    }

    /// Whether the playback loop is running
    pub fn is_active(&self) -> bool {
        self.state().active
    }

    /// Volume in percent
    pub fn volume(&self) -> u32 {
        self.state().volume.percent()
    }

    /// Pending entries (excludes the item playing)
    pub fn queue_size(&self) -> usize {
        self.state().queue.len()
    }

    /// Media currently held by the loop
    pub fn now_playing(&self) -> Option<MediaDescriptor> {
        self.state().now_playing.as_ref().map(|e| e.media.clone())
    }

    /// Destination the output session is attached to
    pub fn current_destination(&self) -> Option<Destination> {
        self.inner.session.destination()
    }

    /// Wait until the playback loop has exited
    pub async fn wait_idle(&self) {
        loop {
            let notified = self.inner.idle.notified();
            if !self.is_active() {
                return;
            }
            notified.await;
        }
    }

    // ===== Observers =====

    /// Register a status observer (one per surface)
    pub fn register_observer(&self, observer: Arc<dyn StatusObserver>) -> Arc<dyn StatusObserver> {
        self.inner.observers.register(observer)
    }

    /// Remove the observer of `surface_id`
    pub fn unregister_observer(&self, surface_id: &str) -> bool {
        self.inner.observers.unregister(surface_id)
    }

    /// Number of registered observers
    pub fn observer_count(&self) -> usize {
        self.inner.observers.len()
    }

    /// Push a fresh snapshot to every observer
    ///
    /// Broadcasts never interleave, and each one snapshots the engine only
    /// once the previous delivery is done.
    pub async fn broadcast(&self, state: Option<PlayerState>) {
        let _publishing = self.inner.publishing.lock().await;
        let snapshot = self.queue_status(state);
        self.inner.observers.broadcast(&snapshot).await;
    }

    /// Get observers up to date after a control call
    ///
    /// A running loop broadcasts on its own. An idle engine spawns a one-off
    /// broadcast when a runtime is available; calls made before it snapshots
    /// share it.
    fn publish(&self, active: bool) {
        if active {
            self.inner.wake.notify_one();
            return;
        }
        if self.inner.broadcast_queued.swap(true, Ordering::AcqRel) {
            return;
        }
        match tokio::runtime::Handle::try_current() {
            Ok(handle) => {
                handle.spawn(self.clone().publish_idle());
            }
            Err(_) => self.inner.broadcast_queued.store(false, Ordering::Release),
        }
    }

    async fn publish_idle(self) {
        let _publishing = self.inner.publishing.lock().await;
        self.inner.broadcast_queued.store(false, Ordering::Release);
        let snapshot = self.queue_status(None);
        self.inner.observers.broadcast(&snapshot).await;
    }

    // ===== Playback loop =====

    async fn run(self, first: QueueEntry) {
        info!("Playback loop started");
        let mut entry = first;

        loop {
            self.play_entry(&entry).await;

            let next = self.state().take_next();
            if let Some(next) = next {
                entry = next;
                continue;
            }

            self.broadcast(Some(PlayerState::Empty)).await;
            self.disconnect().await;

            // A request may have arrived while disconnecting; it saw an
            // active engine and only queued itself.
            let next = {
                let mut state = self.state();
                let next = state.take_next();
                if next.is_none() {
                    state.active = false;
                }
                next
            };
            match next {
                Some(next) => entry = next,
                None => break,
            }
        }

        info!("Queue drained, playback loop finished");
        self.inner.idle.notify_waiters();
    }

    async fn play_entry(&self, entry: &QueueEntry) {
        let media = &entry.media;
        info!(entry = %entry.id, title = %media.title, source = %media.source, "Downloading");
        self.broadcast(None).await;

        let stream = match self.inner.resolver.stream(media).await {
            Ok(stream) => stream,
            Err(e) => {
                error!(entry = %entry.id, error = %e, "Could not get a stream, skipping item");
                return;
            }
        };

        self.state().phase = Phase::Connecting;
        if let Err(e) = self.attach(&entry.destination).await {
            error!(
                entry = %entry.id,
                destination = %entry.destination.name,
                error = %e,
                "Could not attach the output, skipping item"
            );
            self.finish_item(&stream).await;
            return;
        }

        let started = {
            let mut state = self.state();
            let gain = state.volume.gain();
            self.inner.session.play(&stream, gain).map(|completion| {
                state.phase = Phase::Playing;
                state.started_at = Some(Instant::now());
                state.paused_at = None;
                completion
            })
        };
        let mut completion = match started {
            Ok(completion) => completion,
            Err(e) => {
                error!(entry = %entry.id, error = %e, "Could not start playback, skipping item");
                self.finish_item(&stream).await;
                return;
            }
        };

        info!(entry = %entry.id, destination = %entry.destination.name, "Playing");
        self.broadcast(None).await;

        let tick = self.inner.config.tick();
        let mut ticker = time::interval_at(Instant::now() + tick, tick);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            tokio::select! {
                result = &mut completion => {
                    match result {
                        Ok(()) => debug!(entry = %entry.id, "Item ended"),
                        Err(e) => error!(entry = %entry.id, error = %e, "Playback failed, moving on"),
                    }
                    break;
                }
                _ = ticker.tick() => {
                    if self.take_skip() {
                        debug!(entry = %entry.id, "Terminating current item");
                        break;
                    }
                    if !self.inner.session.is_playing() && !self.inner.session.is_paused() {
                        debug!(entry = %entry.id, "Session went idle");
                        break;
                    }
                    self.broadcast(None).await;
                }
                () = self.inner.wake.notified() => self.broadcast(None).await,
            }
        }

        info!(entry = %entry.id, "Item finished");
        self.finish_item(&stream).await;
    }

    fn take_skip(&self) -> bool {
        std::mem::take(&mut self.state().skip_requested)
    }

    async fn attach(&self, destination: &Destination) -> std::result::Result<(), DeviceError> {
        let session = &self.inner.session;
        match session.destination() {
            None => {
                info!(destination = %destination.name, "Connecting");
                session.connect(destination).await
            }
            Some(current) if current == *destination => Ok(()),
            Some(current) => {
                info!(from = %current.name, to = %destination.name, "Moving");
                session.move_to(destination).await?;
                time::sleep(self.inner.config.move_settle()).await;
                Ok(())
            }
        }
    }

    /// Stop the device and delete the item's temporary file
    async fn finish_item(&self, stream: &StreamHandle) {
        let stopped = {
            let _state = self.state();
            self.inner.session.stop()
        };
        if let Err(e) = stopped {
            warn!(error = %e, "Could not stop the output session");
        }

        if let Some(path) = &stream.local_artifact {
            time::sleep(self.inner.config.artifact_release()).await;
            match tokio::fs::remove_file(path).await {
                Ok(()) => debug!(path = %path.display(), "Removed temporary file"),
                Err(e) => warn!(path = %path.display(), error = %e, "Temporary file not removed"),
            }
        }
    }

    async fn disconnect(&self) {
        if let Some(current) = self.inner.session.destination() {
            info!(destination = %current.name, "Disconnecting");
            if let Err(e) = self.inner.session.disconnect().await {
                warn!(error = %e, "Could not disconnect the output session");
            }
        }
    }
}
