/// Full-resolution image loading
///
/// Files are read into memory completely before decoding, so the returned
/// image never keeps a file handle open. That matters because the same file
/// may be re-read for a thumbnail while a preview of it is on screen.
///
/// Decoding runs without the `image` crate's default allocation cap:
/// stitched panoramas easily exceed it and are still valid photos.
use image::{DynamicImage, ImageReader, Limits};
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use super::error::{Result, ThumbnailError};

/// Load and decode a full image (blocking)
pub fn load_full_image(path: &Path) -> Result<DynamicImage> {
    let bytes = fs::read(path).map_err(|e| ThumbnailError::filesystem(path, e))?;
    decode_bytes(path, &bytes)
}

/// Load and decode a full image without blocking the calling task.
///
/// The read is async; the CPU-bound decode runs on a blocking worker.
pub async fn load_full_image_async(path: PathBuf) -> Result<DynamicImage> {
    let bytes = tokio::fs::read(&path)
        .await
        .map_err(|e| ThumbnailError::filesystem(&path, e))?;

    tokio::task::spawn_blocking(move || decode_bytes(&path, &bytes)).await?
}

/// Decode an in-memory encoding, guessing the format from its magic bytes
fn decode_bytes(path: &Path, bytes: &[u8]) -> Result<DynamicImage> {
    decode_with_limits(path, bytes, Limits::no_limits())
}

fn decode_with_limits(path: &Path, bytes: &[u8], limits: Limits) -> Result<DynamicImage> {
    let mut reader = ImageReader::new(Cursor::new(bytes))
        .with_guessed_format()
        .map_err(|e| ThumbnailError::decode(path, image::ImageError::IoError(e)))?;
    reader.limits(limits);

    let image = reader.decode().map_err(|e| ThumbnailError::decode(path, e))?;
    log::debug!(
        "Decoded {} ({}x{})",
        path.display(),
        image.width(),
        image.height()
    );
    Ok(image)
}
