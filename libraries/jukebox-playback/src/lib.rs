//! Jukebox - Playback Engine
//!
//! Queue-driven playback controller for one managed audio output.
//!
//! This crate provides:
//! - Pending-request queue ("queue" appends, "play now" jumps the line)
//! - A single background playback loop per engine
//! - Skip, pause/resume, clear, remove, jump and volume controls
//! - Elapsed-time tracking that excludes pauses
//! - Status snapshots pushed to any number of observers
//!
//! # Architecture
//!
//! `jukebox-playback` never talks to a network or a sound card directly.
//! Media lookup goes through a [`jukebox_core::Resolver`] and audio output
//! through a [`jukebox_core::PlaybackSession`]; both are injected when the
//! engine is built.
//!
//! Control calls are synchronous state edits; the loop applies them at its
//! next tick (skips and "play now" preemption) or immediately (pause, resume,
//! volume).
//!
//! # Example
//!
//! ```rust,no_run
//! use jukebox_core::{Destination, PlaybackSession, Requester, Resolver};
//! use jukebox_playback::{EngineConfig, PlaybackEngine};
//! use std::sync::Arc;
//!
//! # async fn demo(resolver: Arc<dyn Resolver>, session: Arc<dyn PlaybackSession>)
//! #     -> jukebox_playback::Result<()> {
//! let engine = PlaybackEngine::new(EngineConfig::default(), resolver, session);
//!
//! let lounge = Destination::new("lounge-1", "Lounge");
//! let alice = Requester::new("u-1", "alice");
//!
//! // Queue two songs; the first one starts playing right away
//! engine.request_media(lounge.clone(), alice.clone(), "song a", true).await?;
//! engine.request_media(lounge, alice, "song b", true).await?;
//!
//! engine.request_set_volume(60)?;
//! println!("{}", engine.queue_status(None).headline());
//!
//! engine.request_skip();
//! # Ok(())
//! # }
//! ```

mod engine;
mod error;
mod observers;
mod queue;
pub mod status;
pub mod types;
mod volume;

// Public exports
pub use engine::PlaybackEngine;
pub use error::{PlaybackError, Result};
pub use observers::{ObserverRegistry, StatusObserver};
pub use queue::Queue;
pub use status::{
    human_readable_number, readable_time_progress, NowPlaying, StatusSnapshot, UpcomingEntry,
};
pub use types::{EngineConfig, PlayerState, QueueEntry};
pub use volume::Volume;
