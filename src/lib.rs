//! Photo viewer core
//!
//! - `thumbnail` - content-addressed, disk-backed thumbnail cache and
//!   full-image loading
//! - `state` - settings and the model behind the virtualized thumbnail list

pub mod state;
pub mod thumbnail;

pub use state::browser::{get_image_files, ImageBrowser};
pub use state::settings::{ThumbnailMode, ViewerSettings};
pub use thumbnail::{ThumbnailError, ThumbnailSize, ThumbnailStore};
