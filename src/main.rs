use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use photo_viewer::thumbnail::load_full_image_async;
use photo_viewer::{ImageBrowser, ThumbnailError, ThumbnailMode, ThumbnailSize, ThumbnailStore, ViewerSettings};

/// Build the thumbnail cache for a photo directory
#[derive(Parser, Debug)]
#[command(name = "photo-viewer", version, about)]
struct Args {
    /// Directory containing photos
    directory: PathBuf,

    /// Use the large thumbnail size from the settings
    #[arg(long)]
    large: bool,

    /// Thumbnail box, e.g. 160x120 (overrides the settings)
    #[arg(long)]
    size: Option<ThumbnailSize>,

    /// Cache directory (overrides the settings)
    #[arg(long)]
    cache_dir: Option<PathBuf>,

    /// Generate thumbnails in parallel before walking the list
    #[arg(long)]
    prefetch: bool,

    /// Also load this file at full resolution, as the preview pane would
    #[arg(long, value_name = "FILE")]
    preview: Option<PathBuf>,

    /// Prune the cache to this many megabytes afterwards
    #[arg(long)]
    max_cache_mb: Option<u64>,
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    match run(Args::parse()).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{}", e);
            ExitCode::FAILURE
        }
    }
}

/// Saturates instead of overflowing on absurd sizes
fn megabytes_to_bytes(mb: u64) -> u64 {
    mb.saturating_mul(1024 * 1024)
}

async fn run(args: Args) -> Result<(), ThumbnailError> {
    let mut settings = ViewerSettings::load().unwrap_or_else(|e| {
        log::warn!("Could not read settings, using defaults: {}", e);
        ViewerSettings::default()
    });

    if let Some(size) = args.size {
        settings.normal_thumbnail = size;
        settings.large_thumbnail = size;
    }
    if let Some(cache_dir) = args.cache_dir {
        settings.cache_dir = Some(cache_dir);
    }
    if let Some(mb) = args.max_cache_mb {
        settings.max_cache_bytes = Some(megabytes_to_bytes(mb));
    }

    let store = Arc::new(ThumbnailStore::new(settings.cache_dir())?);
    let mut browser = ImageBrowser::new(Arc::clone(&store), settings.clone());
    if args.large {
        browser.set_mode(ThumbnailMode::Large);
    }

    let count = browser.open_directory(&args.directory)?;

    if args.prefetch {
        let warmed = browser.prefetch(0..count).await;
        log::info!("Prefetched {} of {} thumbnails", warmed, count);
    }

    let mut failed = 0;
    for index in 0..count {
        if let Some(item) = browser.item(index) {
            if item.is_error() {
                failed += 1;
            }
            println!("{}", item.label);
        }
    }

    if let Some(path) = args.preview {
        let image = load_full_image_async(path.clone()).await?;
        println!("Preview {}: {}x{}", path.display(), image.width(), image.height());
    }

    if let Some(max_bytes) = settings.max_cache_bytes {
        store.prune(max_bytes)?;
    }

    let stats = store.stats();
    println!(
        "{} images at {}, {} failed | hits: {}, generated: {}, corrupt: {}, write failures: {}",
        count,
        browser.thumbnail_size(),
        failed,
        stats.hits,
        stats.generated,
        stats.corrupt,
        stats.write_failures,
    );

    Ok(())
}
