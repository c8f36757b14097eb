// src/layer.rs
//! Building layer coordination: one tile from coordinates to built footprints

use crate::{
    builder::Builder,
    error::Result,
    map::{
        loader::{LoadOrigin, TileLoader},
        mercator::Vector2,
        tile_math::{geo_to_tile, GeoBoundary, TileCoord},
        transport::Transport,
        url_template::UrlTemplate,
    },
    osm::{self, OsmId, Relation, UnresolvedMember, Way},
};
use futures::stream::{self, StreamExt};
use log::{info, warn};
use std::{
    collections::{BTreeMap, HashSet},
    sync::{Mutex, MutexGuard},
};

/// Most tile requests an area ingestion keeps in flight at once
pub const MAX_CONCURRENT_TILES: usize = 4;

/// Static settings of a layer
#[derive(Debug, Clone)]
pub struct LayerSettings {
    pub zoom: u8,
    pub url: UrlTemplate,
    pub params: BTreeMap<String, String>,
    /// Mercator position every tile-local point is measured from
    pub origin: Vector2,
}

/// Outcome of ingesting one tile
#[derive(Debug)]
pub struct TileReport<H> {
    pub tile: TileCoord,
    pub boundary: GeoBoundary,
    pub url: String,
    pub origin: LoadOrigin,
    pub built: Vec<(OsmId, H)>,
    pub unresolved: Vec<UnresolvedMember>,
}

/// Ways and relations of every tile the layer has ingested, append-only
#[derive(Debug, Default)]
struct LayerStore {
    ways: Vec<Way>,
    relations: Vec<Relation>,
}

/// Loads building tiles and hands their footprints to a builder.
///
/// Tiles may be ingested concurrently; the builder and the accumulated
/// store each sit behind a lock that is never held across an await.
pub struct BuildingLayer<T: Transport, B: Builder> {
    settings: LayerSettings,
    loader: TileLoader<T>,
    builder: Mutex<B>,
    store: Mutex<LayerStore>,
}

impl<T, B> BuildingLayer<T, B>
where
    T: Transport,
    B: Builder + Send,
    B::Handle: Send,
{
    pub fn new(settings: LayerSettings, loader: TileLoader<T>, builder: B) -> Self {
        Self {
            settings,
            loader,
            builder: Mutex::new(builder),
            store: Mutex::new(LayerStore::default()),
        }
    }

    pub fn settings(&self) -> &LayerSettings {
        &self.settings
    }

    pub fn loader(&self) -> &TileLoader<T> {
        &self.loader
    }

    /// Ingest the tile containing a point
    pub async fn ingest(&self, latitude: f64, longitude: f64) -> Result<TileReport<B::Handle>> {
        self.ingest_tile(geo_to_tile(self.settings.zoom, latitude, longitude)).await
    }

    pub async fn ingest_tile(&self, tile: TileCoord) -> Result<TileReport<B::Handle>> {
        let boundary = GeoBoundary::of_tile(tile);
        let url = self.settings.url.interpolate(&boundary, &self.settings.params);

        let loaded = self.loader.load(&url).await?;
        let data = match osm::parse_bytes(&loaded.bytes, self.settings.origin) {
            Ok(data) => data,
            Err(e) => {
                // Drop the entry so the next attempt fetches again
                warn!("Tile {} response is malformed, evicting it: {}", tile, e);
                self.loader.cache().remove(&loaded.key)?;
                return Err(e);
            }
        };
        let unresolved = data.diagnostics().unresolved_members.clone();

        let built = {
            let mut builder = lock(&self.builder);
            let mut already_built: HashSet<OsmId> = HashSet::new();
            let mut built = Vec::new();

            // The way set already holds every relation member exactly once
            for way in data.ways() {
                if already_built.insert(way.id) {
                    let handle = builder.build(&way.id.to_string(), &way.positions());
                    built.push((way.id, handle));
                }
            }
            built
        };

        let (ways, relations) = data.into_parts();
        {
            let mut store = lock(&self.store);
            store.ways.extend(ways);
            store.relations.extend(relations);
        }

        info!(
            "Tile {} ready: {} buildings ({:?}, {} unresolved members)",
            tile,
            built.len(),
            loaded.origin,
            unresolved.len()
        );

        Ok(TileReport {
            tile,
            boundary,
            url,
            origin: loaded.origin,
            built,
            unresolved,
        })
    }

    /// Ingest the tile containing a point and its neighbours within `radius`.
    /// Up to `MAX_CONCURRENT_TILES` tiles load at once; each fails on its own.
    /// Results come back in `TileCoord::neighbors` order.
    pub async fn ingest_area(
        &self,
        latitude: f64,
        longitude: f64,
        radius: u32,
    ) -> Vec<(TileCoord, Result<TileReport<B::Handle>>)> {
        let center = geo_to_tile(self.settings.zoom, latitude, longitude);
        let tiles = center.neighbors(radius);

        stream::iter(tiles)
            .map(|tile| async move { (tile, self.ingest_tile(tile).await) })
            .buffered(MAX_CONCURRENT_TILES)
            .collect()
            .await
    }

    /// Snapshot of every way ingested so far, across tiles
    pub fn ways(&self) -> Vec<Way> {
        lock(&self.store).ways.clone()
    }

    pub fn relations(&self) -> Vec<Relation> {
        lock(&self.store).relations.clone()
    }

    pub fn clear_cache(&self) -> Result<usize> {
        self.loader.clear_cache()
    }

    /// Run a closure against the builder, e.g. to read back what it built
    pub fn with_builder<R>(&self, f: impl FnOnce(&mut B) -> R) -> R {
        f(&mut lock(&self.builder))
    }

    pub fn into_builder(self) -> B {
        self.builder.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

fn lock<V>(mutex: &Mutex<V>) -> MutexGuard<'_, V> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
