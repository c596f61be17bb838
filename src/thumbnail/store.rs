/// Disk-backed thumbnail store
///
/// Entries live in one flat directory, named by `key::derive(path, size)`.
/// The store is `Sync` and holds no locks: concurrent callers that miss on
/// the same key each produce an equivalent PNG and the last rename wins.
use image::{DynamicImage, ImageFormat};
use std::fs;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, SystemTime};

use super::error::{Result, ThumbnailError};
use super::key::{self, ThumbnailSize};
use super::loader;
use super::resize;

/// Name of the cache directory under the platform temp dir
pub const CACHE_DIR_NAME: &str = "photo-viewer-thumbnails";

/// In-flight writes are named `.thumb-XXXXXX.tmp` until renamed into place
const TEMP_PREFIX: &str = ".thumb-";
const TEMP_SUFFIX: &str = ".tmp";

/// Temp files older than this were left behind by an interrupted write
const STALE_TEMP_AGE: Duration = Duration::from_secs(60 * 60);

/// Snapshot of the store's counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    pub hits: u64,
    pub misses: u64,
    /// Entries that existed but failed to decode (counted as misses too)
    pub corrupt: u64,
    pub generated: u64,
    pub write_failures: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    corrupt: AtomicU64,
    generated: AtomicU64,
    write_failures: AtomicU64,
}

/// Outcome of a `prune` pass
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PruneReport {
    pub removed: usize,
    pub freed_bytes: u64,
    pub remaining_bytes: u64,
    /// Leftover temp files from interrupted writes
    pub stale_temp_removed: usize,
}

#[derive(Debug)]
pub struct ThumbnailStore {
    cache_dir: PathBuf,
    counters: Counters,
}

impl ThumbnailStore {
    /// Open a store rooted at `cache_dir`, creating the directory if needed.
    ///
    /// The directory is never removed; it outlives the process on purpose.
    pub fn new(cache_dir: impl Into<PathBuf>) -> Result<Self> {
        let cache_dir = cache_dir.into();
        fs::create_dir_all(&cache_dir).map_err(|e| ThumbnailError::filesystem(&cache_dir, e))?;

        log::debug!("Thumbnail cache at {}", cache_dir.display());

        Ok(Self {
            cache_dir,
            counters: Counters::default(),
        })
    }

    /// Open the store in the default location
    pub fn open_default() -> Result<Self> {
        Self::new(Self::default_cache_dir())
    }

    /// `<temp>/photo-viewer-thumbnails`
    pub fn default_cache_dir() -> PathBuf {
        std::env::temp_dir().join(CACHE_DIR_NAME)
    }

    pub fn cache_dir(&self) -> &Path {
        &self.cache_dir
    }

    /// Path of the cache entry for a request (whether or not it exists)
    pub fn cache_path(&self, source_path: &Path, size: ThumbnailSize) -> PathBuf {
        let key = key::derive(&source_path.to_string_lossy(), size);
        self.cache_dir.join(key.file_name())
    }

    /// Look up a cached thumbnail.
    ///
    /// A missing entry is a miss. So is an entry that fails to read or
    /// decode; the broken file is left in place until the next save
    /// overwrites it.
    pub fn try_get_cached(&self, source_path: &Path, size: ThumbnailSize) -> Option<DynamicImage> {
        let cache_path = self.cache_path(source_path, size);

        if !cache_path.is_file() {
            self.counters.misses.fetch_add(1, Ordering::Relaxed);
            log::debug!("Cache miss for {} at {}", source_path.display(), size);
            return None;
        }

        let decoded = fs::read(&cache_path)
            .map_err(|e| e.to_string())
            .and_then(|bytes| {
                image::load_from_memory_with_format(&bytes, ImageFormat::Png).map_err(|e| e.to_string())
            });

        match decoded {
            Ok(image) => {
                self.counters.hits.fetch_add(1, Ordering::Relaxed);
                log::debug!("Cache hit for {} at {}", source_path.display(), size);
                Some(image)
            }
            Err(e) => {
                self.counters.misses.fetch_add(1, Ordering::Relaxed);
                self.counters.corrupt.fetch_add(1, Ordering::Relaxed);
                log::warn!("Ignoring unreadable cache entry {}: {}", cache_path.display(), e);
                None
            }
        }
    }

    /// Decode the source and render an aspect-preserving, centered thumbnail
    /// of exactly `size`.
    pub fn create_thumbnail(&self, source_path: &Path, size: ThumbnailSize) -> Result<DynamicImage> {
        let source = loader::load_full_image(source_path)?;
        let (width, height) = (source.width(), source.height());

        let thumbnail = resize::render_thumbnail(source, size);
        self.counters.generated.fetch_add(1, Ordering::Relaxed);

        log::info!(
            "Generated {} thumbnail for {} ({}x{})",
            size,
            source_path.display(),
            width,
            height
        );
        Ok(thumbnail)
    }

    /// Write a thumbnail to the cache. Best effort: failures are logged
    /// and counted, never returned.
    pub fn save_to_cache(&self, source_path: &Path, size: ThumbnailSize, image: &DynamicImage) {
        let cache_path = self.cache_path(source_path, size);

        if let Err(e) = self.write_entry(&cache_path, image) {
            self.counters.write_failures.fetch_add(1, Ordering::Relaxed);
            log::warn!("{}", e);
        }
    }

    /// Encode as PNG into a temp file beside the entry, then rename over it
    fn write_entry(&self, cache_path: &Path, image: &DynamicImage) -> Result<()> {
        let mut encoded = Cursor::new(Vec::new());
        image
            .write_to(&mut encoded, ImageFormat::Png)
            .map_err(|e| ThumbnailError::cache_write(cache_path, e))?;

        let mut tmp = tempfile::Builder::new()
            .prefix(TEMP_PREFIX)
            .suffix(TEMP_SUFFIX)
            .tempfile_in(&self.cache_dir)
            .map_err(|e| ThumbnailError::cache_write(cache_path, e))?;
        tmp.write_all(encoded.get_ref())
            .map_err(|e| ThumbnailError::cache_write(cache_path, e))?;
        tmp.persist(cache_path)
            .map_err(|e| ThumbnailError::cache_write(cache_path, e))?;

        Ok(())
    }

    /// Cached thumbnail if there is a valid one, otherwise generate, cache
    /// and return a fresh one. Only generation failures are returned.
    pub fn get_or_create(&self, source_path: &Path, size: ThumbnailSize) -> Result<DynamicImage> {
        if let Some(image) = self.try_get_cached(source_path, size) {
            return Ok(image);
        }

        let thumbnail = self.create_thumbnail(source_path, size)?;
        self.save_to_cache(source_path, size, &thumbnail);
        Ok(thumbnail)
    }

    pub fn stats(&self) -> CacheStats {
        CacheStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            corrupt: self.counters.corrupt.load(Ordering::Relaxed),
            generated: self.counters.generated.load(Ordering::Relaxed),
            write_failures: self.counters.write_failures.load(Ordering::Relaxed),
        }
    }

    /// Delete the oldest entries until the cache holds at most `max_bytes`.
    ///
    /// Only files named like cache entries are considered. Entries that
    /// cannot be removed are skipped and still count as remaining.
    /// Temp files from writes interrupted over an hour ago are removed too.
    pub fn prune(&self, max_bytes: u64) -> Result<PruneReport> {
        let read_dir =
            fs::read_dir(&self.cache_dir).map_err(|e| ThumbnailError::filesystem(&self.cache_dir, e))?;

        let now = SystemTime::now();
        let mut report = PruneReport::default();
        let mut entries: Vec<(SystemTime, PathBuf, u64)> = Vec::new();

        for entry in read_dir.filter_map(|entry| entry.ok()) {
            let Ok(metadata) = entry.metadata() else {
                continue;
            };
            if !metadata.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().into_owned();
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);

            if key::is_cache_file_name(&name) {
                entries.push((modified, entry.path(), metadata.len()));
            } else if is_temp_file_name(&name) {
                let age = now.duration_since(modified).unwrap_or_default();
                if age < STALE_TEMP_AGE {
                    continue;
                }
                match fs::remove_file(entry.path()) {
                    Ok(()) => report.stale_temp_removed += 1,
                    Err(e) => log::warn!("Could not remove stale temp file {}: {}", name, e),
                }
            }
        }

        entries.sort();
        report.remaining_bytes = entries.iter().map(|(_, _, len)| len).sum();

        for (_, path, len) in entries {
            if report.remaining_bytes <= max_bytes {
                break;
            }
            match fs::remove_file(&path) {
                Ok(()) => {
                    report.removed += 1;
                    report.freed_bytes += len;
                    report.remaining_bytes -= len;
                }
                Err(e) => log::warn!("Could not remove cache entry {}: {}", path.display(), e),
            }
        }

        if report.stale_temp_removed > 0 {
            log::info!("Removed {} stale temp files", report.stale_temp_removed);
        }
        if report.removed > 0 {
            log::info!(
                "Pruned {} thumbnails ({} bytes), {} bytes remain",
                report.removed,
                report.freed_bytes,
                report.remaining_bytes
            );
        }

        Ok(report)
    }
}

fn is_temp_file_name(name: &str) -> bool {
    name.starts_with(TEMP_PREFIX) && name.ends_with(TEMP_SUFFIX)
}
