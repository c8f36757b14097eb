// src/lib.rs
//! OSM Buildings Library
//!
//! Loads OpenStreetMap building footprints tile by tile: Web Mercator tile
//! addressing, Overpass JSON parsing with relation resolution, and a
//! content-addressed disk cache in front of the network.

pub mod builder;
pub mod config;
pub mod error;
pub mod layer;
pub mod map;
pub mod osm;

// Re-export main types for convenience
pub use builder::{Builder, Building, CollectingBuilder};
pub use config::LayerConfig;
pub use error::{BuildingsError, Result};
pub use layer::{BuildingLayer, LayerSettings, TileReport};
pub use osm::Data;
