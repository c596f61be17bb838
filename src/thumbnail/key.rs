/// Content-addressed cache keys
///
/// A key is the lowercase hex SHA-256 of `"{path}{width}x{height}"`.
/// Keys double as file names inside the flat cache directory, so they must
/// stay fixed-length and filesystem-safe whatever the source path looks like.
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::fmt;
use std::str::FromStr;

/// Extension of every cache entry (PNG keeps the transparent padding)
pub const CACHE_EXTENSION: &str = "png";

/// Length of a rendered SHA-256 digest
const KEY_LEN: usize = 64;

/// Requested thumbnail box in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ThumbnailSize {
    pub width: u32,
    pub height: u32,
}

impl ThumbnailSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    pub const fn square(side: u32) -> Self {
        Self::new(side, side)
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

impl fmt::Display for ThumbnailSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

impl FromStr for ThumbnailSize {
    type Err = String;

    /// Parses `"120x90"` (or a single number for a square box)
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parse = |v: &str| {
            v.trim()
                .parse::<u32>()
                .map_err(|e| format!("invalid dimension {:?}: {}", v, e))
        };

        match s.split_once(|c: char| c == 'x' || c == 'X') {
            Some((w, h)) => Ok(Self::new(parse(w)?, parse(h)?)),
            None => parse(s).map(Self::square),
        }
    }
}

/// Fixed-length hex digest identifying a (source path, size) pair
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Name of the cache entry on disk: `<key>.png`
    pub fn file_name(&self) -> String {
        format!("{}.{}", self.0, CACHE_EXTENSION)
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Derive the cache key for a source path at a target size.
///
/// Pure; the path is not checked for existence.
pub fn derive(source_path: &str, size: ThumbnailSize) -> CacheKey {
    let input = format!("{}{}x{}", source_path, size.width, size.height);
    let digest = Sha256::digest(input.as_bytes());
    CacheKey(hex::encode(digest))
}

/// Whether a file name looks like one of our cache entries.
///
/// Used by pruning so foreign files in the directory are never touched.
pub fn is_cache_file_name(name: &str) -> bool {
    match name.strip_suffix(CACHE_EXTENSION).and_then(|s| s.strip_suffix('.')) {
        Some(stem) => {
            stem.len() == KEY_LEN
                && stem
                    .bytes()
                    .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
        }
        None => false,
    }
}
