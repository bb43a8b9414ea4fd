//! Pending-request queue
//!
//! FIFO of resolved requests. "Play now" requests are inserted at the head;
//! the item currently playing is never part of the queue.

use crate::error::{PlaybackError, Result};
use crate::types::QueueEntry;
use std::collections::VecDeque;

/// Ordered queue of pending entries
///
/// ```text
/// Now playing: Entry A            (held by the engine, not the queue)
/// ─────────────────────────────
/// Queue:
///   [0] Entry D   <- prepend ("play now")
///   [1] Entry B
///   [2] Entry C   <- append ("queue")
/// ```
#[derive(Debug, Clone, Default)]
pub struct Queue {
    entries: VecDeque<QueueEntry>,
}

impl Queue {
    /// Create new empty queue
    pub fn new() -> Self {
        Self::default()
    }

    /// Add entry to the end of the queue
    pub fn append(&mut self, entry: QueueEntry) {
        self.entries.push_back(entry);
    }

    /// Add entry to the head of the queue (plays next)
    pub fn prepend(&mut self, entry: QueueEntry) {
        self.entries.push_front(entry);
    }

    /// Take the entry that plays next
    pub fn pop_front(&mut self) -> Option<QueueEntry> {
        self.entries.pop_front()
    }

    /// Remove entry at `index`
    pub fn remove_at(&mut self, index: usize) -> Result<QueueEntry> {
        let len = self.entries.len();
        self.entries
            .remove(index)
            .ok_or(PlaybackError::IndexOutOfBounds { index, len })
    }

    /// Drop the first `n` entries
    ///
    /// `n == len()` empties the queue; anything larger is rejected and leaves
    /// the queue untouched.
    pub fn truncate_prefix(&mut self, n: usize) -> Result<()> {
        let len = self.entries.len();
        if n > len {
            return Err(PlaybackError::IndexOutOfBounds { index: n, len });
        }
        self.entries.drain(..n);
        Ok(())
    }

    /// Remove every pending entry
    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// Entry at `index` without removing it
    pub fn get(&self, index: usize) -> Option<&QueueEntry> {
        self.entries.get(index)
    }

    /// Entries in play order
    pub fn iter(&self) -> impl Iterator<Item = &QueueEntry> {
        self.entries.iter()
    }

    /// Number of pending entries
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Check if queue is empty
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jukebox_core::{Destination, MediaDescriptor, Requester};

    fn entry(title: &str) -> QueueEntry {
        QueueEntry::new(
            Destination::new("1", "Music"),
            Requester::new("u1", "user"),
            MediaDescriptor::new(title, "Artist", 180, format!("https://media.example/{title}")),
        )
    }

    fn titles(queue: &Queue) -> Vec<String> {
        queue.iter().map(|e| e.media.title.clone()).collect()
    }

    #[test]
    fn append_preserves_order() {
        let mut queue = Queue::new();
        queue.append(entry("a"));
        queue.append(entry("b"));
        queue.append(entry("c"));

        assert_eq!(titles(&queue), ["a", "b", "c"]);
        assert_eq!(queue.pop_front().map(|e| e.media.title), Some("a".to_string()));
        assert_eq!(queue.len(), 2);
    }

    #[test]
    fn prepend_goes_to_head() {
        let mut queue = Queue::new();
        queue.append(entry("a"));
        queue.append(entry("b"));
        queue.prepend(entry("now"));

        assert_eq!(titles(&queue), ["now", "a", "b"]);
    }

    #[test]
    fn remove_at_bounds() {
        let mut queue = Queue::new();
        queue.append(entry("a"));
        queue.append(entry("b"));

        let removed = queue.remove_at(1).unwrap();
        assert_eq!(removed.media.title, "b");

        assert!(matches!(
            queue.remove_at(1),
            Err(PlaybackError::IndexOutOfBounds { index: 1, len: 1 })
        ));
        assert_eq!(titles(&queue), ["a"]);
    }

    #[test]
    fn truncate_prefix_drops_head() {
        let mut queue = Queue::new();
        for title in ["a", "b", "c", "d"] {
            queue.append(entry(title));
        }

        queue.truncate_prefix(2).unwrap();
        assert_eq!(titles(&queue), ["c", "d"]);

        queue.truncate_prefix(0).unwrap();
        assert_eq!(queue.len(), 2);

        assert!(queue.truncate_prefix(3).is_err());
        assert_eq!(queue.len(), 2, "failed truncate leaves queue untouched");

        queue.truncate_prefix(2).unwrap();
        assert!(queue.is_empty());
    }

    #[test]
    fn clear_empties_queue() {
        let mut queue = Queue::new();
        queue.append(entry("a"));
        queue.clear();

        assert!(queue.is_empty());
        assert!(queue.get(0).is_none());
        assert!(queue.pop_front().is_none());
    }
}
