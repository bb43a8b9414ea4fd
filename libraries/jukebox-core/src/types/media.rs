//! Media descriptor and stream handle types

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// Resolved metadata for one playable item
///
/// Produced by a [`Resolver`](crate::Resolver) and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaDescriptor {
    /// Media title
    pub title: String,

    /// Author / uploader
    pub author: String,

    /// Length in whole seconds
    pub duration_secs: u64,

    /// Source locator (URL or provider-specific id)
    pub source: String,

    /// Thumbnail image URL
    pub thumbnail_url: Option<String>,

    /// View count reported by the provider
    pub view_count: Option<u64>,
}

impl MediaDescriptor {
    /// Create a descriptor with the required fields
    pub fn new(
        title: impl Into<String>,
        author: impl Into<String>,
        duration_secs: u64,
        source: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            author: author.into(),
            duration_secs,
            source: source.into(),
            thumbnail_url: None,
            view_count: None,
        }
    }

    /// Attach a thumbnail URL
    #[must_use]
    pub fn with_thumbnail(mut self, url: impl Into<String>) -> Self {
        self.thumbnail_url = Some(url.into());
        self
    }

    /// Attach a view count
    #[must_use]
    pub fn with_view_count(mut self, views: u64) -> Self {
        self.view_count = Some(views);
        self
    }

    /// Length as a `Duration`
    pub fn duration(&self) -> Duration {
        Duration::from_secs(self.duration_secs)
    }
}

/// A playable stream for one media descriptor
///
/// When the stream was materialized on disk, `local_artifact` names the
/// temporary file; the playback loop deletes it once the item has ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamHandle {
    /// What the output session should open (URL or file path)
    pub locator: String,

    /// Temporary local file backing the stream
    pub local_artifact: Option<PathBuf>,
}

impl StreamHandle {
    /// A stream that is played straight from its locator
    pub fn remote(locator: impl Into<String>) -> Self {
        Self {
            locator: locator.into(),
            local_artifact: None,
        }
    }

    /// A stream backed by a downloaded temporary file
    pub fn local(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        Self {
            locator: path.to_string_lossy().into_owned(),
            local_artifact: Some(path),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_builder() {
        let media = MediaDescriptor::new("Title", "Author", 90, "https://media.example/x")
            .with_thumbnail("https://img.example/x.jpg")
            .with_view_count(7);

        assert_eq!(media.duration(), Duration::from_secs(90));
        assert_eq!(media.thumbnail_url.as_deref(), Some("https://img.example/x.jpg"));
        assert_eq!(media.view_count, Some(7));
    }

    #[test]
    fn local_stream_tracks_its_artifact() {
        let stream = StreamHandle::local("/tmp/jukebox/a.webm");
        assert_eq!(stream.locator, "/tmp/jukebox/a.webm");
        assert_eq!(
            stream.local_artifact,
            Some(PathBuf::from("/tmp/jukebox/a.webm"))
        );

        assert!(StreamHandle::remote("https://cdn.example/a").local_artifact.is_none());
    }
}
