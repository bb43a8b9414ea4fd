//! Destinations and requesters

use super::ids::{DestinationId, RequesterId};
use serde::{Deserialize, Serialize};

/// An output channel that media can be played into
///
/// Two destinations are the same channel iff their ids match; the name is
/// display-only and may change between requests.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Destination {
    /// Stable channel identifier
    pub id: DestinationId,

    /// Human-readable channel name
    pub name: String,
}

impl Destination {
    /// Create a new destination
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: DestinationId::new(id),
            name: name.into(),
        }
    }
}

impl PartialEq for Destination {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Destination {}

/// The caller a request originated from
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Requester {
    /// Requester identifier
    pub id: RequesterId,

    /// Display name
    pub name: String,
}

impl Requester {
    /// Create a new requester
    pub fn new(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: RequesterId::new(id),
            name: name.into(),
        }
    }
}
