// src/map/mercator.rs
//! Spherical Web Mercator projection into metres

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;
use std::ops::Sub;

/// WGS84 semi-major axis, the sphere radius used by Web Mercator
pub const EARTH_RADIUS: f64 = 6_378_137.0;

/// A position in metres. Tile-local positions are relative to the layer origin.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vector2 {
    pub x: f64,
    pub y: f64,
}

impl Vector2 {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Vector2) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl Sub for Vector2 {
    type Output = Vector2;

    fn sub(self, rhs: Vector2) -> Vector2 {
        Vector2::new(self.x - rhs.x, self.y - rhs.y)
    }
}

pub fn to_mercator(latitude: f64, longitude: f64) -> Vector2 {
    let x = EARTH_RADIUS * longitude.to_radians();
    let y = EARTH_RADIUS * (PI / 4.0 + latitude.to_radians() / 2.0).tan().ln();
    Vector2::new(x, y)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_origin_maps_to_zero() {
        let p = to_mercator(0.0, 0.0);
        assert!(p.x.abs() < 1e-9);
        assert!(p.y.abs() < 1e-9);
    }

    #[test]
    fn test_known_projection() {
        // EPSG:3857 coordinates of Paris
        let p = to_mercator(48.8566, 2.3522);
        assert!((p.x - 261845.7).abs() < 1.0);
        assert!((p.y - 6250564.3).abs() < 1.0);
    }

    #[test]
    fn test_north_is_positive_y() {
        assert!(to_mercator(10.0, 0.0).y > 0.0);
        assert!(to_mercator(-10.0, 0.0).y < 0.0);
        assert!(to_mercator(0.0, -10.0).x < 0.0);
    }

    #[test]
    fn test_vector_subtraction() {
        let d = Vector2::new(5.0, 7.0) - Vector2::new(2.0, 3.0);
        assert_eq!(d, Vector2::new(3.0, 4.0));
        assert_eq!(d.distance(Vector2::default()), 5.0);
    }
}
