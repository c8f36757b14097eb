// src/map/loader.rs
//! Tile loading: disk cache first, transport on a miss

use super::tile_cache::{cache_key, TileCache};
use super::transport::Transport;
use crate::error::{BuildingsError, Result};
use log::{debug, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::sync::OnceCell;

/// Where a delivered body came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOrigin {
    Disk,
    Network,
}

#[derive(Debug, Clone)]
pub struct LoadedTile {
    pub url: String,
    pub key: String,
    pub origin: LoadOrigin,
    pub bytes: Arc<Vec<u8>>,
}

type SharedOutcome = std::result::Result<LoadedTile, Arc<BuildingsError>>;

/// Loads request URLs through the disk cache.
///
/// Each `load` call completes exactly once, with the body or an explicit
/// error. Concurrent loads of the same URL share a single in-flight
/// operation, so the transport sees one request and every caller the same
/// outcome.
pub struct TileLoader<T: Transport> {
    cache: TileCache,
    transport: T,
    in_flight: Mutex<HashMap<String, Arc<OnceCell<SharedOutcome>>>>,
}

impl<T: Transport> TileLoader<T> {
    pub fn new(cache: TileCache, transport: T) -> Self {
        Self {
            cache,
            transport,
            in_flight: Mutex::new(HashMap::new()),
        }
    }

    pub fn cache(&self) -> &TileCache {
        &self.cache
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    pub async fn load(&self, url: &str) -> Result<LoadedTile> {
        let cell = {
            let mut in_flight = self.lock_in_flight();
            Arc::clone(in_flight.entry(url.to_string()).or_default())
        };

        let outcome = cell
            .get_or_init(|| async { self.load_uncached(url).await.map_err(Arc::new) })
            .await
            .clone();

        {
            let mut in_flight = self.lock_in_flight();
            if in_flight.get(url).map_or(false, |current| Arc::ptr_eq(current, &cell)) {
                in_flight.remove(url);
            }
        }

        outcome.map_err(BuildingsError::Shared)
    }

    /// Delete every cached response
    pub fn clear_cache(&self) -> Result<usize> {
        self.cache.clear()
    }

    async fn load_uncached(&self, url: &str) -> Result<LoadedTile> {
        let key = cache_key(url);

        if let Some(bytes) = self.cache.read(&key)? {
            debug!("Loaded {} from disk", url);
            return Ok(LoadedTile {
                url: url.to_string(),
                key,
                origin: LoadOrigin::Disk,
                bytes: Arc::new(bytes),
            });
        }

        debug!("Cache miss for {}, fetching", url);
        let bytes = match self.transport.fetch(url).await {
            Ok(bytes) => bytes,
            Err(e) => {
                warn!("Fetching {} failed: {}", url, e);
                return Err(e);
            }
        };

        // Only JSON text is cached; a gateway error page must not pin the URL
        if let Err(e) = serde_json::from_slice::<serde::de::IgnoredAny>(&bytes) {
            warn!("Response for {} is not JSON, not caching: {}", url, e);
            return Err(BuildingsError::Malformed(e.to_string()));
        }

        // Persist before delivering: a crash in between only costs a refetch
        self.cache.write(&key, &bytes)?;

        Ok(LoadedTile {
            url: url.to_string(),
            key,
            origin: LoadOrigin::Network,
            bytes: Arc::new(bytes),
        })
    }

    fn lock_in_flight(&self) -> std::sync::MutexGuard<'_, HashMap<String, Arc<OnceCell<SharedOutcome>>>> {
        self.in_flight.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}
