//! Catalog-backed resolver
//!
//! Resolves queries against the configured catalog. A query that is a
//! source URL must match an entry's source exactly; any other query is a
//! case-insensitive title search.

use crate::config::CatalogEntry;
use crate::session::StreamLengths;
use async_trait::async_trait;
use jukebox_core::{DeviceError, MediaDescriptor, ResolutionError, Resolver, StreamHandle};
use std::path::PathBuf;
use tracing::debug;
use url::Url;
use uuid::Uuid;

/// Search phrases shorter than this (ignoring whitespace) never match
const MIN_SEARCH_CHARS: usize = 3;

pub struct CatalogResolver {
    entries: Vec<CatalogEntry>,
    lengths: StreamLengths,
    download_dir: Option<PathBuf>,
}

impl CatalogResolver {
    pub fn new(entries: Vec<CatalogEntry>, lengths: StreamLengths) -> Self {
        Self {
            entries,
            lengths,
            download_dir: None,
        }
    }

    /// Materialize every stream as a temporary file in `dir`
    #[must_use]
    pub fn with_download_dir(mut self, dir: Option<PathBuf>) -> Self {
        self.download_dir = dir;
        self
    }

    fn lookup(&self, query: &str) -> Option<&CatalogEntry> {
        if let Some(entry) = self.entries.iter().find(|e| e.source == query) {
            return Some(entry);
        }
        if is_url(query) {
            return None;
        }

        let needle = query.to_lowercase();
        self.entries
            .iter()
            .find(|e| e.title.to_lowercase().contains(&needle))
    }
}

fn is_url(query: &str) -> bool {
    Url::parse(query).is_ok_and(|url| matches!(url.scheme(), "http" | "https"))
}

#[async_trait]
impl Resolver for CatalogResolver {
    async fn resolve(&self, query: &str) -> Result<MediaDescriptor, ResolutionError> {
        let query = query.trim();
        let meaningful = query.chars().filter(|c| !c.is_whitespace()).count();
        if !is_url(query) && meaningful < MIN_SEARCH_CHARS {
            debug!(query, "Search phrase too short");
            return Err(ResolutionError::NotFound);
        }

        let entry = self.lookup(query).ok_or(ResolutionError::NotFound)?;
        if entry.age_restricted {
            return Err(ResolutionError::AgeRestricted);
        }

        debug!(query, title = %entry.title, "Query resolved");
        Ok(entry.to_media())
    }

    async fn stream(&self, media: &MediaDescriptor) -> Result<StreamHandle, DeviceError> {
        let stream = match &self.download_dir {
            None => StreamHandle::remote(media.source.clone()),
            Some(dir) => {
                tokio::fs::create_dir_all(dir)
                    .await
                    .map_err(|e| DeviceError::stream(e.to_string()))?;
                let path = dir.join(format!("{}.part", Uuid::new_v4()));
                tokio::fs::write(&path, media.source.as_bytes())
                    .await
                    .map_err(|e| DeviceError::stream(e.to_string()))?;
                debug!(path = %path.display(), title = %media.title, "Downloaded");
                StreamHandle::local(path)
            }
        };

        self.lengths.record(stream.locator.clone(), media.duration());
        Ok(stream)
    }
}
