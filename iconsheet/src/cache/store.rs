//! On-disk image cache directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use super::key::{is_key_name, CacheKey};

/// Statistics about the files in a cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CacheStats {
    /// Number of cached files.
    pub files: u64,
    /// Total size of cached files in bytes.
    pub bytes: u64,
}

/// Result of clearing a cache directory.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ClearResult {
    /// Number of files removed.
    pub files_deleted: u64,
    /// Total bytes freed.
    pub bytes_freed: u64,
}

/// Flat directory of content-addressed images.
///
/// Each file is named by its [`CacheKey`]. Existence of a file is the only
/// freshness check: a cached image is never re-validated or re-fetched.
#[derive(Debug, Clone)]
pub struct ImageCache {
    directory: PathBuf,
}

impl ImageCache {
    /// Create a cache rooted at `directory`. The directory is not created.
    pub fn new(directory: impl Into<PathBuf>) -> Self {
        Self {
            directory: directory.into(),
        }
    }

    /// Returns the cache directory.
    pub fn directory(&self) -> &Path {
        &self.directory
    }

    /// Path of the cached file for `key`.
    pub fn path_for(&self, key: &CacheKey) -> PathBuf {
        self.directory.join(key.as_str())
    }

    /// Check whether an image is cached for `key`.
    pub fn contains(&self, key: &CacheKey) -> io::Result<bool> {
        self.path_for(key).try_exists()
    }

    /// Create the cache directory (and parents) if missing.
    pub fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.directory)
    }

    /// Count cached images and their bytes. A missing directory is empty.
    ///
    /// Only files named like a cache key are counted.
    pub fn stats(&self) -> io::Result<CacheStats> {
        let mut stats = CacheStats::default();
        for (_, len) in self.cached_files()? {
            stats.files += 1;
            stats.bytes += len;
        }
        Ok(stats)
    }

    /// Remove every cached image.
    ///
    /// Files not named like a cache key and subdirectories are left alone.
    pub fn clear(&self) -> io::Result<ClearResult> {
        let mut result = ClearResult::default();
        for (path, len) in self.cached_files()? {
            fs::remove_file(&path)?;
            result.files_deleted += 1;
            result.bytes_freed += len;
        }
        Ok(result)
    }

    fn cached_files(&self) -> io::Result<Vec<(PathBuf, u64)>> {
        let entries = match fs::read_dir(&self.directory) {
            Ok(entries) => entries,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e),
        };

        let mut files = Vec::new();
        for entry in entries {
            let entry = entry?;
            if !entry.file_name().to_str().is_some_and(is_key_name) {
                continue;
            }
            let metadata = entry.metadata()?;
            if metadata.is_file() {
                files.push((entry.path(), metadata.len()));
            }
        }
        Ok(files)
    }
}
