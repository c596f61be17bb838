/// Thumbnail cache module
///
/// This module handles:
/// - Deriving content-addressed cache keys (key.rs)
/// - Loading full-size images for preview (loader.rs)
/// - Fitting images into thumbnail boxes (resize.rs)
/// - Caching thumbnails to disk (store.rs)

pub mod error;
pub mod key;
pub mod loader;
pub mod resize;
pub mod store;

pub use error::{Result, ThumbnailError};
pub use key::{CacheKey, ThumbnailSize};
pub use loader::{load_full_image, load_full_image_async};
pub use store::{CacheStats, PruneReport, ThumbnailStore};
