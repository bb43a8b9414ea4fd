//! Jukebox Core
//!
//! Domain types, collaborator contracts, and error handling shared by the
//! Jukebox playback crates.
//!
//! # Architecture
//!
//! The core crate defines:
//! - **Domain Types**: `MediaDescriptor`, `Destination`, `Requester`, `StreamHandle`
//! - **Collaborator Traits**: `Resolver` (query → media, media → stream) and
//!   `PlaybackSession` (one output device attached to one destination)
//! - **Error Handling**: `ResolutionError`, `DeviceError` and `ObserverGone`
//!
//! The playback engine itself lives in `jukebox-playback`; it only ever talks
//! to the outside world through the traits defined here.
//!
//! # Example
//!
//! ```rust
//! use jukebox_core::types::{Destination, MediaDescriptor, Requester};
//!
//! let lounge = Destination::new("lounge-1", "Lounge");
//! let alice = Requester::new("u-1", "alice");
//!
//! let media = MediaDescriptor::new("Song A", "Artist", 215, "https://media.example/a")
//!     .with_view_count(12_500);
//!
//! assert_eq!(media.duration().as_secs(), 215);
//! assert_eq!(lounge.name, "Lounge");
//! assert_eq!(alice.name, "alice");
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod error;
pub mod traits;
pub mod types;

// Re-export commonly used types
pub use error::{DeviceError, ObserverGone, ResolutionError};
pub use traits::{CompletionSender, PlaybackCompletion, PlaybackSession, Resolver};

pub use types::{
    Destination, DestinationId, EntryId, MediaDescriptor, Requester, RequesterId, StreamHandle,
};
