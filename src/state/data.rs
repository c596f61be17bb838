/// Shared data structures handed to the presentation layer

use image::DynamicImage;
use std::path::PathBuf;
use std::sync::Arc;

/// One row of the virtualized thumbnail list
#[derive(Debug, Clone)]
pub struct ListItem {
    /// File name, with " (Error)" appended when no thumbnail could be made
    pub label: String,
    /// Full path to the source image
    pub path: PathBuf,
    /// Decoded thumbnail, shared with the in-memory list cache
    pub thumbnail: Option<Arc<DynamicImage>>,
}

impl ListItem {
    pub fn is_error(&self) -> bool {
        self.thumbnail.is_none()
    }
}
