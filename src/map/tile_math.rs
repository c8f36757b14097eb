// src/map/tile_math.rs
//! Web Mercator tile addressing: lat/lon to tile coordinates and back

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::fmt;

/// Ground resolution at zoom 0 on the equator, in metres per pixel
const METERS_PER_PIXEL_Z0: f64 = 156543.03;
const TILE_PIXELS: f64 = 256.0;

/// A slippy-map tile address
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TileCoord {
    pub zoom: u8,
    pub x: u32,
    pub y: u32,
}

impl TileCoord {
    pub fn new(zoom: u8, x: u32, y: u32) -> Self {
        let max = tiles_per_axis(zoom) as u32 - 1;
        Self {
            zoom,
            x: x.min(max),
            y: y.min(max),
        }
    }

    /// Tiles in the square of `radius` around this one, including itself,
    /// clipped to the world. Row-major from the north-west corner.
    pub fn neighbors(&self, radius: u32) -> Vec<TileCoord> {
        let max = tiles_per_axis(self.zoom) as i64 - 1;
        let r = radius as i64;
        let mut tiles = Vec::new();

        for y in (self.y as i64 - r)..=(self.y as i64 + r) {
            for x in (self.x as i64 - r)..=(self.x as i64 + r) {
                if (0..=max).contains(&x) && (0..=max).contains(&y) {
                    tiles.push(TileCoord {
                        zoom: self.zoom,
                        x: x as u32,
                        y: y as u32,
                    });
                }
            }
        }
        tiles
    }
}

impl fmt::Display for TileCoord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}/{}", self.zoom, self.x, self.y)
    }
}

/// Geographic box covered by a tile. `start` is the north-west corner,
/// `end` the south-east one.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBoundary {
    pub start_lat: f64,
    pub start_lon: f64,
    pub end_lat: f64,
    pub end_lon: f64,
}

impl GeoBoundary {
    pub fn of_tile(tile: TileCoord) -> Self {
        Self {
            start_lat: tile_y_to_latitude(tile.zoom, tile.y as f64),
            start_lon: tile_x_to_longitude(tile.zoom, tile.x as f64),
            end_lat: tile_y_to_latitude(tile.zoom, tile.y as f64 + 1.0),
            end_lon: tile_x_to_longitude(tile.zoom, tile.x as f64 + 1.0),
        }
    }

    pub fn contains(&self, lat: f64, lon: f64) -> bool {
        self.start_lat >= lat && lat >= self.end_lat && self.start_lon <= lon && lon <= self.end_lon
    }

    pub fn center(&self) -> (f64, f64) {
        (
            (self.start_lat + self.end_lat) / 2.0,
            (self.start_lon + self.end_lon) / 2.0,
        )
    }
}

fn tiles_per_axis(zoom: u8) -> f64 {
    2_f64.powi(zoom as i32)
}

fn clamp_tile(zoom: u8, value: f64) -> u32 {
    let max = tiles_per_axis(zoom) - 1.0;
    value.floor().clamp(0.0, max) as u32
}

fn x_position(zoom: u8, longitude: f64) -> f64 {
    (longitude + 180.0) / 360.0 * tiles_per_axis(zoom)
}

fn y_position(zoom: u8, latitude: f64) -> f64 {
    let lat_rad = latitude.to_radians();
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0 * tiles_per_axis(zoom)
}

pub fn longitude_to_tile_x(zoom: u8, longitude: f64) -> u32 {
    clamp_tile(zoom, x_position(zoom, longitude))
}

/// Position inside the tile along X, in `[0, 1)`
pub fn longitude_to_fractional_x(zoom: u8, longitude: f64) -> f64 {
    x_position(zoom, longitude) - longitude_to_tile_x(zoom, longitude) as f64
}

/// !!! Y grows southward, the reverse of a cartesian frame !!!
pub fn latitude_to_tile_y(zoom: u8, latitude: f64) -> u32 {
    clamp_tile(zoom, y_position(zoom, latitude))
}

pub fn latitude_to_fractional_y(zoom: u8, latitude: f64) -> f64 {
    y_position(zoom, latitude) - latitude_to_tile_y(zoom, latitude) as f64
}

pub fn tile_x_to_longitude(zoom: u8, x: f64) -> f64 {
    x / tiles_per_axis(zoom) * 360.0 - 180.0
}

pub fn tile_y_to_latitude(zoom: u8, y: f64) -> f64 {
    let n = PI - 2.0 * PI * y / tiles_per_axis(zoom);
    n.sinh().atan().to_degrees()
}

pub fn geo_to_tile(zoom: u8, latitude: f64, longitude: f64) -> TileCoord {
    TileCoord {
        zoom,
        x: longitude_to_tile_x(zoom, longitude),
        y: latitude_to_tile_y(zoom, latitude),
    }
}

/// Edge length of a tile in metres at the given latitude (degrees)
pub fn tile_size(zoom: u8, latitude: f64) -> f64 {
    METERS_PER_PIXEL_Z0 / tiles_per_axis(zoom) * latitude.to_radians().cos() * TILE_PIXELS
}

/// Edge length of a tile in metres, without the latitude distortion
pub fn tile_size_at_equator(zoom: u8) -> f64 {
    METERS_PER_PIXEL_Z0 / tiles_per_axis(zoom) * TILE_PIXELS
}

/// Boundary of the tile containing the point, not of the point itself
pub fn tile_boundary(zoom: u8, latitude: f64, longitude: f64) -> GeoBoundary {
    GeoBoundary::of_tile(geo_to_tile(zoom, latitude, longitude))
}
