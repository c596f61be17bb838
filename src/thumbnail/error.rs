use std::path::PathBuf;

pub type Result<T> = std::result::Result<T, ThumbnailError>;

#[derive(thiserror::Error, Debug)]
pub enum ThumbnailError {
    #[error("i/o error at {}: {source}", .path.display())]
    Filesystem {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to decode image {}: {source}", .path.display())]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },
    #[error("failed to write cache entry {}: {reason}", .path.display())]
    CacheWrite { path: PathBuf, reason: String },
    #[error("directory not found or inaccessible: {}", .0.display())]
    DirectoryNotFound(PathBuf),
    #[error("background task failed: {0}")]
    Task(#[from] tokio::task::JoinError),
}

impl ThumbnailError {
    pub(crate) fn filesystem(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Filesystem {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn decode(path: impl Into<PathBuf>, source: image::ImageError) -> Self {
        Self::ImageDecode {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn cache_write(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        Self::CacheWrite {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
