//! Status observers
//!
//! Every interaction surface that shows the player (a status message, a
//! console, a dashboard) registers one observer. Broadcasting pushes the same
//! snapshot to all of them; an observer whose surface vanished is dropped
//! from the registry during that pass.

use crate::status::StatusSnapshot;
use async_trait::async_trait;
use jukebox_core::ObserverGone;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, warn};

/// Receiver of status snapshots
#[async_trait]
pub trait StatusObserver: Send + Sync {
    /// Identifier of the surface this observer renders into
    ///
    /// At most one observer is registered per surface.
    fn surface_id(&self) -> &str;

    /// Render a fresh snapshot
    ///
    /// # Errors
    /// `ObserverGone` when the surface no longer exists
    async fn update(&self, snapshot: &StatusSnapshot) -> Result<(), ObserverGone>;
}

/// The set of registered observers
#[derive(Default)]
pub struct ObserverRegistry {
    observers: Mutex<Vec<Arc<dyn StatusObserver>>>,
}

impl ObserverRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    fn observers(&self) -> MutexGuard<'_, Vec<Arc<dyn StatusObserver>>> {
        self.observers.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register an observer
    ///
    /// If the surface already has an observer, that one is kept and returned.
    pub fn register(&self, observer: Arc<dyn StatusObserver>) -> Arc<dyn StatusObserver> {
        let mut observers = self.observers();
        if let Some(existing) = observers
            .iter()
            .find(|o| o.surface_id() == observer.surface_id())
        {
            debug!(surface = existing.surface_id(), "Observer already registered");
            return Arc::clone(existing);
        }

        debug!(surface = observer.surface_id(), "Observer registered");
        observers.push(Arc::clone(&observer));
        observer
    }

    /// Remove the observer for `surface_id`; returns whether one was registered
    pub fn unregister(&self, surface_id: &str) -> bool {
        let mut observers = self.observers();
        let before = observers.len();
        observers.retain(|o| o.surface_id() != surface_id);
        before != observers.len()
    }

    /// Whether `surface_id` has an observer
    pub fn contains(&self, surface_id: &str) -> bool {
        self.observers().iter().any(|o| o.surface_id() == surface_id)
    }

    /// Number of registered observers
    pub fn len(&self) -> usize {
        self.observers().len()
    }

    /// Check if no observer is registered
    pub fn is_empty(&self) -> bool {
        self.observers().is_empty()
    }

    /// Push `snapshot` to every observer, dropping those whose surface is gone
    ///
    /// Never fails: a vanished surface is logged and deregistered.
    pub async fn broadcast(&self, snapshot: &StatusSnapshot) {
        let targets = self.observers().clone();

        let mut gone = Vec::new();
        for observer in &targets {
            if observer.update(snapshot).await.is_err() {
                warn!(
                    surface = observer.surface_id(),
                    "Status surface vanished, removing it from the observer list"
                );
                gone.push(observer.surface_id().to_string());
            }
        }

        if !gone.is_empty() {
            self.observers()
                .retain(|o| !gone.iter().any(|surface| surface == o.surface_id()));
        }
    }
}
