/// Persisted viewer settings
///
/// Stored as JSON in the user's config directory:
/// - Linux: ~/.config/photo-viewer/settings.json
/// - macOS: ~/Library/Application Support/photo-viewer/settings.json
/// - Windows: %APPDATA%\photo-viewer\settings.json

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::thumbnail::{ThumbnailSize, ThumbnailStore};

#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

/// Which of the two configured thumbnail sizes the list shows
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ThumbnailMode {
    #[default]
    Normal,
    Large,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct ViewerSettings {
    /// Thumbnail box in normal mode
    pub normal_thumbnail: ThumbnailSize,

    /// Thumbnail box in large mode
    pub large_thumbnail: ThumbnailSize,

    /// Cache directory override
    /// - None = `<temp>/photo-viewer-thumbnails`
    pub cache_dir: Option<PathBuf>,

    /// Upper bound for the thumbnail cache
    /// - None = unbounded, nothing is ever pruned
    pub max_cache_bytes: Option<u64>,
}

impl Default for ViewerSettings {
    fn default() -> Self {
        Self {
            normal_thumbnail: ThumbnailSize::square(120),
            large_thumbnail: ThumbnailSize::square(240),
            cache_dir: None,
            max_cache_bytes: None,
        }
    }
}

impl ViewerSettings {
    /// Load from the default location, falling back to defaults when the
    /// file does not exist yet
    pub fn load() -> Result<Self, SettingsError> {
        match Self::settings_path() {
            Some(path) => Self::load_from(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self, SettingsError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let json = fs::read_to_string(path)?;
        Ok(Self::from_json(&json)?)
    }

    pub fn save_to(&self, path: &Path) -> Result<(), SettingsError> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, self.to_json()?)?;
        Ok(())
    }

    /// Where settings live, if the platform has a config directory
    pub fn settings_path() -> Option<PathBuf> {
        let mut path = dirs::config_dir()?;
        path.push("photo-viewer");
        path.push("settings.json");
        Some(path)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    /// Resolved cache directory
    pub fn cache_dir(&self) -> PathBuf {
        self.cache_dir
            .clone()
            .unwrap_or_else(ThumbnailStore::default_cache_dir)
    }

    pub fn thumbnail_size(&self, mode: ThumbnailMode) -> ThumbnailSize {
        match mode {
            ThumbnailMode::Normal => self.normal_thumbnail,
            ThumbnailMode::Large => self.large_thumbnail,
        }
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
