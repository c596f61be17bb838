/// Image browser: the model behind the virtualized thumbnail list
///
/// The list asks for rows by index as they scroll into view. Each row is
/// resolved through a small in-memory map first and the disk-backed
/// `ThumbnailStore` second. The map is owned here, not by the store, and is
/// dropped wholesale whenever the directory or the thumbnail size changes.
use image::DynamicImage;
use std::collections::HashMap;
use std::ops::Range;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::task::JoinSet;
use walkdir::WalkDir;

use super::data::ListItem;
use super::settings::{ThumbnailMode, ViewerSettings};
use crate::thumbnail::{self, Result, ThumbnailError, ThumbnailSize, ThumbnailStore};

/// Image extensions shown in the list (compared case-insensitively)
pub const SUPPORTED_EXTENSIONS: [&str; 6] = ["jpg", "jpeg", "png", "bmp", "gif", "tiff"];

/// List the supported image files directly inside `dir`, sorted by path.
///
/// A missing or unreadable directory yields an empty list.
pub fn get_image_files(dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .follow_links(true)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .map(|e| e.into_path())
        .filter(|path| is_supported_image(path))
        .collect();

    files.sort();
    files
}

fn is_supported_image(path: &Path) -> bool {
    match path.extension() {
        Some(extension) => {
            let ext = extension.to_string_lossy().to_lowercase();
            SUPPORTED_EXTENSIONS.contains(&ext.as_str())
        }
        None => false,
    }
}

fn display_name(path: &Path) -> String {
    path.file_name()
        .unwrap_or_default()
        .to_string_lossy()
        .to_string()
}

pub struct ImageBrowser {
    store: Arc<ThumbnailStore>,
    settings: ViewerSettings,
    mode: ThumbnailMode,
    directory: Option<PathBuf>,
    files: Vec<PathBuf>,
    /// Decoded thumbnails at the current size, keyed by source path
    thumbnails: HashMap<PathBuf, Arc<DynamicImage>>,
}

impl ImageBrowser {
    pub fn new(store: Arc<ThumbnailStore>, settings: ViewerSettings) -> Self {
        Self {
            store,
            settings,
            mode: ThumbnailMode::default(),
            directory: None,
            files: Vec::new(),
            thumbnails: HashMap::new(),
        }
    }

    pub fn store(&self) -> &Arc<ThumbnailStore> {
        &self.store
    }

    pub fn directory(&self) -> Option<&Path> {
        self.directory.as_deref()
    }

    pub fn files(&self) -> &[PathBuf] {
        &self.files
    }

    /// Number of rows in the virtual list
    pub fn len(&self) -> usize {
        self.files.len()
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }

    pub fn mode(&self) -> ThumbnailMode {
        self.mode
    }

    pub fn thumbnail_size(&self) -> ThumbnailSize {
        self.settings.thumbnail_size(self.mode)
    }

    /// Show the images of `dir`. Returns the new list length.
    pub fn open_directory(&mut self, dir: &Path) -> Result<usize> {
        if !dir.is_dir() {
            return Err(ThumbnailError::DirectoryNotFound(dir.to_path_buf()));
        }

        self.thumbnails.clear();
        self.files = get_image_files(dir);
        self.directory = Some(dir.to_path_buf());

        log::info!("Opened {} ({} images)", dir.display(), self.files.len());
        Ok(self.files.len())
    }

    /// Switch thumbnail size. Returns whether the size actually changed.
    pub fn set_mode(&mut self, mode: ThumbnailMode) -> bool {
        let previous = self.thumbnail_size();
        self.mode = mode;

        if self.thumbnail_size() == previous {
            return false;
        }
        self.thumbnails.clear();
        true
    }

    /// Produce the row at `index`, or `None` past the end of the list.
    ///
    /// Thumbnail failures never escape: the row comes back labelled
    /// "<name> (Error)" without an image, and is retried on the next call.
    pub fn item(&mut self, index: usize) -> Option<ListItem> {
        let path = self.files.get(index)?.clone();
        let label = display_name(&path);

        if let Some(thumbnail) = self.thumbnails.get(&path) {
            return Some(ListItem {
                label,
                thumbnail: Some(Arc::clone(thumbnail)),
                path,
            });
        }

        match self.store.get_or_create(&path, self.thumbnail_size()) {
            Ok(image) => {
                let thumbnail = Arc::new(image);
                self.thumbnails.insert(path.clone(), Arc::clone(&thumbnail));
                Some(ListItem {
                    label,
                    path,
                    thumbnail: Some(thumbnail),
                })
            }
            Err(e) => {
                log::warn!("No thumbnail for {}: {}", path.display(), e);
                Some(ListItem {
                    label: format!("{} (Error)", label),
                    path,
                    thumbnail: None,
                })
            }
        }
    }

    /// Warm the disk cache for rows about to become visible.
    ///
    /// Rows are generated concurrently on blocking workers. Returns how many
    /// rows now have a thumbnail on disk.
    pub async fn prefetch(&self, range: Range<usize>) -> usize {
        let end = range.end.min(self.files.len());
        let start = range.start.min(end);
        let size = self.thumbnail_size();

        let mut tasks = JoinSet::new();
        for path in &self.files[start..end] {
            let store = Arc::clone(&self.store);
            let path = path.clone();
            tasks.spawn_blocking(move || store.get_or_create(&path, size).is_ok());
        }

        let mut warmed = 0;
        while let Some(result) = tasks.join_next().await {
            match result {
                Ok(true) => warmed += 1,
                Ok(false) => {}
                Err(e) => log::warn!("Prefetch worker failed: {}", e),
            }
        }

        log::debug!("Prefetched {}/{} rows", warmed, end - start);
        warmed
    }

    /// Load the full image behind row `index` for the preview pane.
    ///
    /// Runs off the calling thread; `None` if the index is out of range.
    pub async fn load_preview(&self, index: usize) -> Option<Result<DynamicImage>> {
        let path = self.files.get(index)?.clone();
        Some(thumbnail::load_full_image_async(path).await)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgb, RgbImage};
    use std::fs;
    use tempfile::TempDir;

    struct Fixture {
        _dir: TempDir,
        photos: PathBuf,
        browser: ImageBrowser,
    }

    fn fixture() -> Fixture {
        let dir = TempDir::new().unwrap();
        let photos = dir.path().join("photos");
        fs::create_dir(&photos).unwrap();

        RgbImage::from_pixel(400, 300, Rgb([255, 0, 0]))
            .save(photos.join("a.jpg"))
            .unwrap();
        RgbImage::from_pixel(100, 200, Rgb([0, 255, 0]))
            .save(photos.join("b.png"))
            .unwrap();
        fs::write(photos.join("c.gif"), "not a gif").unwrap();
        fs::write(photos.join("notes.txt"), "hello").unwrap();

        let store = Arc::new(ThumbnailStore::new(dir.path().join("cache")).unwrap());
        let browser = ImageBrowser::new(store, ViewerSettings::default());
        Fixture {
            _dir: dir,
            photos,
            browser,
        }
    }

    #[test]
    fn test_get_image_files_filters_extensions() {
        let dir = TempDir::new().unwrap();
        for name in ["a.jpg", "B.JPEG", "c.Png", "d.bmp", "e.gif", "f.tiff", "g.txt", "h", "i.webp"] {
            fs::write(dir.path().join(name), "x").unwrap();
        }
        fs::create_dir(dir.path().join("nested.jpg")).unwrap();
        fs::write(dir.path().join("nested.jpg").join("inner.jpg"), "x").unwrap();

        let names: Vec<String> = get_image_files(dir.path())
            .iter()
            .map(|p| display_name(p))
            .collect();
        assert_eq!(names, ["B.JPEG", "a.jpg", "c.Png", "d.bmp", "e.gif", "f.tiff"]);
    }

    #[test]
    fn test_get_image_files_missing_directory() {
        assert!(get_image_files(Path::new("/definitely/not/here")).is_empty());
    }

    #[test]
    fn test_open_directory() {
        let mut f = fixture();
        let photos = f.photos.clone();
        assert_eq!(f.browser.open_directory(&photos).unwrap(), 3);
        assert_eq!(f.browser.len(), 3);
        assert_eq!(f.browser.directory(), Some(photos.as_path()));

        let missing = f.browser.open_directory(&photos.join("gone"));
        assert!(matches!(missing, Err(ThumbnailError::DirectoryNotFound(_))));
        // Previous listing is kept
        assert_eq!(f.browser.len(), 3);
    }

    #[test]
    fn test_items() {
        let mut f = fixture();
        f.browser.open_directory(&f.photos).unwrap();

        let a = f.browser.item(0).unwrap();
        assert_eq!(a.label, "a.jpg");
        let thumb = a.thumbnail.unwrap();
        assert_eq!((thumb.width(), thumb.height()), (120, 120));

        let broken = f.browser.item(2).unwrap();
        assert_eq!(broken.label, "c.gif (Error)");
        assert!(broken.is_error());

        assert!(f.browser.item(3).is_none());
    }

    #[test]
    fn test_item_uses_memory_cache() {
        let mut f = fixture();
        f.browser.open_directory(&f.photos).unwrap();

        let first = f.browser.item(1).unwrap().thumbnail.unwrap();
        let second = f.browser.item(1).unwrap().thumbnail.unwrap();
        assert!(Arc::ptr_eq(&first, &second));

        let stats = f.browser.store().stats();
        assert_eq!(stats.generated, 1);
        assert_eq!(stats.misses, 1);
        assert_eq!(stats.hits, 0);
    }

    #[test]
    fn test_set_mode_invalidates() {
        let mut f = fixture();
        f.browser.open_directory(&f.photos).unwrap();
        f.browser.item(0).unwrap();

        assert!(!f.browser.set_mode(ThumbnailMode::Normal));
        assert!(f.browser.set_mode(ThumbnailMode::Large));
        assert_eq!(f.browser.thumbnail_size(), ThumbnailSize::square(240));

        let large = f.browser.item(0).unwrap().thumbnail.unwrap();
        assert_eq!((large.width(), large.height()), (240, 240));
        assert_eq!(f.browser.store().stats().generated, 2);

        // Back to normal: memory cache is gone but the disk entry is still there
        assert!(f.browser.set_mode(ThumbnailMode::Normal));
        let normal = f.browser.item(0).unwrap().thumbnail.unwrap();
        assert_eq!((normal.width(), normal.height()), (120, 120));
        let stats = f.browser.store().stats();
        assert_eq!(stats.generated, 2);
        assert_eq!(stats.hits, 1);
    }

    #[tokio::test]
    async fn test_prefetch_warms_disk_cache() {
        let mut f = fixture();
        f.browser.open_directory(&f.photos).unwrap();

        assert_eq!(f.browser.prefetch(0..10).await, 2);
        assert_eq!(f.browser.store().stats().generated, 2);
        assert_eq!(f.browser.prefetch(5..1).await, 0);

        f.browser.item(0).unwrap();
        f.browser.item(1).unwrap();
        let stats = f.browser.store().stats();
        assert_eq!(stats.generated, 2);
        assert_eq!(stats.hits, 2);
    }

    #[tokio::test]
    async fn test_load_preview() {
        let mut f = fixture();
        f.browser.open_directory(&f.photos).unwrap();

        let image = f.browser.load_preview(1).await.unwrap().unwrap();
        assert_eq!((image.width(), image.height()), (100, 200));

        let broken = f.browser.load_preview(2).await.unwrap();
        assert!(matches!(broken, Err(ThumbnailError::ImageDecode { .. })));

        assert!(f.browser.load_preview(7).await.is_none());
    }
}
