// src/map/tile_cache.rs
//! Content-addressed disk cache of tile responses

use crate::error::{BuildingsError, Result};
use chrono::{DateTime, Utc};
use log::debug;
use sha2::{Digest, Sha256};
use std::path::{Path, PathBuf};

/// Cache key of a request URL: lowercase hex SHA-256
pub fn cache_key(url: &str) -> String {
    format!("{:x}", Sha256::digest(url.as_bytes()))
}

/// One file per distinct URL, named by its key, holding the raw response.
/// Entries are never rewritten; `remove` and `clear` delete them.
#[derive(Debug, Clone)]
pub struct TileCache {
    cache_dir: PathBuf,
}

impl TileCache {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir).map_err(|e| BuildingsError::CacheIo(cache_dir.clone(), e))?;
        Ok(Self { cache_dir })
    }

    pub fn dir(&self) -> &Path {
        &self.cache_dir
    }

    pub fn entry_path(&self, key: &str) -> PathBuf {
        self.cache_dir.join(key)
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entry_path(&cache_key(url)).exists()
    }

    /// Read an entry. A missing entry is `None`; an entry that exists but
    /// cannot be read is an error, never a miss.
    pub fn read(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let path = self.entry_path(key);
        if !path.exists() {
            return Ok(None);
        }
        let bytes = std::fs::read(&path).map_err(|e| BuildingsError::CacheIo(path.clone(), e))?;
        debug!("Cache hit {} ({} bytes)", key, bytes.len());
        Ok(Some(bytes))
    }

    /// Write an entry through a temporary file so readers never see a partial body
    pub fn write(&self, key: &str, bytes: &[u8]) -> Result<()> {
        let path = self.entry_path(key);
        let partial = self.cache_dir.join(format!("{}.partial", key));

        std::fs::write(&partial, bytes).map_err(|e| BuildingsError::CacheIo(partial.clone(), e))?;
        std::fs::rename(&partial, &path).map_err(|e| BuildingsError::CacheIo(path.clone(), e))?;
        debug!("Cached {} ({} bytes)", key, bytes.len());
        Ok(())
    }

    /// Delete one entry. Returns whether it existed.
    pub fn remove(&self, key: &str) -> Result<bool> {
        let path = self.entry_path(key);
        match std::fs::remove_file(&path) {
            Ok(()) => {
                debug!("Removed cache entry {}", key);
                Ok(true)
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(BuildingsError::CacheIo(path, e)),
        }
    }

    /// Delete every file in the cache directory. Returns how many were removed.
    pub fn clear(&self) -> Result<usize> {
        let entries =
            std::fs::read_dir(&self.cache_dir).map_err(|e| BuildingsError::CacheIo(self.cache_dir.clone(), e))?;

        let mut removed = 0;
        for entry in entries {
            let entry = entry.map_err(|e| BuildingsError::CacheIo(self.cache_dir.clone(), e))?;
            let path = entry.path();
            if path.is_file() {
                std::fs::remove_file(&path).map_err(|e| BuildingsError::CacheIo(path.clone(), e))?;
                removed += 1;
            }
        }
        Ok(removed)
    }

    /// Get cache statistics
    pub fn stats(&self) -> Result<CacheStats> {
        let entries =
            std::fs::read_dir(&self.cache_dir).map_err(|e| BuildingsError::CacheIo(self.cache_dir.clone(), e))?;

        let mut stats = CacheStats::default();
        for entry in entries.flatten() {
            if entry.file_name().to_string_lossy().ends_with(".partial") {
                continue;
            }
            if let Ok(metadata) = entry.metadata() {
                if metadata.is_file() {
                    stats.entries += 1;
                    stats.total_bytes += metadata.len();

                    if let Ok(modified) = metadata.modified() {
                        let modified = DateTime::<Utc>::from(modified);
                        if stats.newest.map_or(true, |newest| modified > newest) {
                            stats.newest = Some(modified);
                        }
                    }
                }
            }
        }
        Ok(stats)
    }
}

#[derive(Debug, Clone, Default)]
pub struct CacheStats {
    pub entries: usize,
    pub total_bytes: u64,
    pub newest: Option<DateTime<Utc>>,
}

impl CacheStats {
    pub fn size_mb(&self) -> f64 {
        self.total_bytes as f64 / 1_048_576.0
    }
}
