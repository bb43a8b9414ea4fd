//! Console configuration
//!
//! Loaded from an optional TOML file, then overridden by `JUKEBOX_*`
//! environment variables (`__` separates nested keys, e.g.
//! `JUKEBOX_ENGINE__TICK_MS=500`).

use crate::error::{ConsoleError, Result};
use jukebox_core::{Destination, MediaDescriptor};
use jukebox_playback::EngineConfig;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Config file read when no `--config` is given (if it exists)
pub const DEFAULT_CONFIG_FILE: &str = "jukebox.toml";

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ConsoleConfig {
    #[serde(default)]
    pub engine: EngineConfig,

    #[serde(default)]
    pub logging: LoggingSettings,

    #[serde(default)]
    pub downloads: DownloadSettings,

    #[serde(default)]
    pub catalog: Vec<CatalogEntry>,

    #[serde(default = "default_destinations")]
    pub destinations: Vec<DestinationSettings>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct LoggingSettings {
    /// `EnvFilter` directive used when `RUST_LOG` is unset
    #[serde(default = "default_log_level")]
    pub level: String,
}

/// Where simulated downloads are written
///
/// Without a directory every item streams straight from its source.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct DownloadSettings {
    pub dir: Option<PathBuf>,
}

/// One playable item known to the console resolver
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct CatalogEntry {
    pub title: String,

    #[serde(default = "default_author")]
    pub author: String,

    pub duration_secs: u64,

    pub source: String,

    #[serde(default)]
    pub thumbnail_url: Option<String>,

    #[serde(default)]
    pub view_count: Option<u64>,

    #[serde(default)]
    pub age_restricted: bool,
}

impl CatalogEntry {
    pub fn to_media(&self) -> MediaDescriptor {
        let mut media = MediaDescriptor::new(
            self.title.clone(),
            self.author.clone(),
            self.duration_secs,
            self.source.clone(),
        );
        media.thumbnail_url.clone_from(&self.thumbnail_url);
        media.view_count = self.view_count;
        media
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct DestinationSettings {
    pub id: String,
    pub name: String,
}

impl DestinationSettings {
    pub fn to_destination(&self) -> Destination {
        Destination::new(self.id.clone(), self.name.clone())
    }
}

impl ConsoleConfig {
    /// Load configuration from file and environment
    ///
    /// An explicit `path` must exist; the default file is optional.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut settings = config::Config::builder();

        match path {
            Some(path) if !path.exists() => {
                return Err(ConsoleError::Config(format!(
                    "config file {} not found",
                    path.display()
                )));
            }
            Some(path) => {
                settings = settings.add_source(config::File::from(path));
            }
            None => {
                let default_path = PathBuf::from(DEFAULT_CONFIG_FILE);
                if default_path.exists() {
                    settings = settings.add_source(config::File::from(default_path));
                }
            }
        }

        // Override with environment variables (prefixed with JUKEBOX_)
        settings = settings.add_source(
            config::Environment::with_prefix("JUKEBOX")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        Ok(settings.build()?.try_deserialize()?)
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.engine.tick_ms == 0 {
            return Err(ConsoleError::Config(
                "engine.tick_ms must be greater than zero".to_string(),
            ));
        }

        if self.destinations.is_empty() {
            return Err(ConsoleError::Config(
                "at least one destination is required".to_string(),
            ));
        }

        let mut seen = HashSet::new();
        for destination in &self.destinations {
            if !seen.insert(destination.id.as_str()) {
                return Err(ConsoleError::Config(format!(
                    "duplicate destination id '{}'",
                    destination.id
                )));
            }
        }

        for (idx, entry) in self.catalog.iter().enumerate() {
            if entry.title.trim().is_empty() {
                return Err(ConsoleError::Config(format!(
                    "catalog entry {} has an empty title",
                    idx + 1
                )));
            }
            if entry.source.trim().is_empty() {
                return Err(ConsoleError::Config(format!(
                    "catalog entry '{}' has an empty source",
                    entry.title
                )));
            }
        }

        Ok(())
    }

    pub fn destinations(&self) -> Vec<Destination> {
        self.destinations
            .iter()
            .map(DestinationSettings::to_destination)
            .collect()
    }
}

// Default values
fn default_log_level() -> String {
    "jukebox_playback=info,jukebox_console=info".to_string()
}

fn default_author() -> String {
    "Unknown".to_string()
}

fn default_destinations() -> Vec<DestinationSettings> {
    vec![DestinationSettings {
        id: "lounge".to_string(),
        name: "Lounge".to_string(),
    }]
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Default for ConsoleConfig {
    fn default() -> Self {
        Self {
            engine: EngineConfig::default(),
            logging: LoggingSettings::default(),
            downloads: DownloadSettings::default(),
            catalog: Vec::new(),
            destinations: default_destinations(),
        }
    }
}
