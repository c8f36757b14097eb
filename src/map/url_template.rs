// src/map/url_template.rs
//! Request URL interpolation for tile boundaries

use super::tile_math::GeoBoundary;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

pub const START_LATITUDE: &str = "startLatitude";
pub const START_LONGITUDE: &str = "startLongitude";
pub const END_LATITUDE: &str = "endLatitude";
pub const END_LONGITUDE: &str = "endLongitude";

/// A URL with `{name}` placeholders. Placeholders nobody provides a value
/// for are left as they are.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UrlTemplate(String);

impl UrlTemplate {
    pub fn new(template: impl Into<String>) -> Self {
        Self(template.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Insert the boundary and the static parameters into the template
    pub fn interpolate(&self, boundary: &GeoBoundary, params: &BTreeMap<String, String>) -> String {
        let mut url = self.0.clone();

        let coordinates = [
            (START_LATITUDE, boundary.start_lat),
            (START_LONGITUDE, boundary.start_lon),
            (END_LATITUDE, boundary.end_lat),
            (END_LONGITUDE, boundary.end_lon),
        ];
        for (name, value) in coordinates {
            // `Display` for f64 is locale independent and always uses '.'
            url = url.replace(&placeholder(name), &value.to_string());
        }

        for (name, value) in params {
            url = url.replace(&placeholder(name), value);
        }

        url
    }
}

impl Default for UrlTemplate {
    /// Overpass query for building footprints, with geometry inlined.
    /// Overpass bounding boxes are south,west,north,east.
    fn default() -> Self {
        Self::new(
            "https://overpass-api.de/api/interpreter?data=[out:json][timeout:{timeout}];\
             (way[\"building\"]({endLatitude},{startLongitude},{startLatitude},{endLongitude});\
             relation[\"building\"]({endLatitude},{startLongitude},{startLatitude},{endLongitude}););\
             out geom;",
        )
    }
}

fn placeholder(name: &str) -> String {
    format!("{{{}}}", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn boundary() -> GeoBoundary {
        GeoBoundary {
            start_lat: 48.86,
            start_lon: 2.35,
            end_lat: 48.85,
            end_lon: 2.36,
        }
    }

    #[test]
    fn test_interpolate_boundary() {
        let template = UrlTemplate::new(
            "https://example.com/q?bbox={startLatitude},{startLongitude},{endLatitude},{endLongitude}",
        );
        let url = template.interpolate(&boundary(), &BTreeMap::new());
        assert_eq!(url, "https://example.com/q?bbox=48.86,2.35,48.85,2.36");
    }

    #[test]
    fn test_interpolate_static_params() {
        let template = UrlTemplate::new("https://example.com/{layer}?s={startLatitude}&key={key}&x={unknown}");
        let mut params = BTreeMap::new();
        params.insert("layer".to_string(), "buildings".to_string());
        params.insert("key".to_string(), "abc".to_string());

        let url = template.interpolate(&boundary(), &params);
        assert_eq!(url, "https://example.com/buildings?s=48.86&key=abc&x={unknown}");
    }

    #[test]
    fn test_negative_coordinates_use_decimal_point() {
        let template = UrlTemplate::new("{startLatitude};{startLongitude}");
        let b = GeoBoundary {
            start_lat: -33.5,
            start_lon: -70.25,
            end_lat: -34.0,
            end_lon: -70.0,
        };
        assert_eq!(template.interpolate(&b, &BTreeMap::new()), "-33.5;-70.25");
    }

    #[test]
    fn test_default_template_orders_bbox_south_first() {
        let mut params = BTreeMap::new();
        params.insert("timeout".to_string(), "25".to_string());
        let url = UrlTemplate::default().interpolate(&boundary(), &params);
        assert!(url.contains("[timeout:25]"));
        assert!(url.contains("(48.85,2.35,48.86,2.36)"));
        assert!(!url.contains('{'));
    }
}
