//! Jukebox Console Library
//!
//! Interactive front-end for a single managed output: configuration, a
//! catalog-backed resolver, a simulated output session, a stdout status
//! surface and the line-oriented command set.
//!
//! This library exposes the core components for testing purposes.

pub mod commands;
pub mod config;
pub mod error;
pub mod observer;
pub mod resolver;
pub mod session;

// Re-export commonly used types for convenience
pub use commands::{Command, Console, Outcome};
pub use config::ConsoleConfig;
pub use error::{ConsoleError, Result};
pub use observer::ConsoleObserver;
pub use resolver::CatalogResolver;
pub use session::{SimulatedSession, StreamLengths};
