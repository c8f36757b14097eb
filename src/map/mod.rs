// src/map/mod.rs
//! Tile math, request URLs and tile loading with disk caching

pub mod loader;
pub mod mercator;
pub mod tile_cache;
pub mod tile_math;
pub mod transport;
pub mod url_template;

pub use loader::{LoadOrigin, LoadedTile, TileLoader};
pub use mercator::{to_mercator, Vector2};
pub use tile_cache::{cache_key, CacheStats, TileCache};
pub use tile_math::{geo_to_tile, tile_boundary, tile_size, tile_size_at_equator, GeoBoundary, TileCoord};
pub use transport::{HttpTransport, Transport};
pub use url_template::UrlTemplate;
