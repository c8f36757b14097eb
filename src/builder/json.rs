// src/builder/json.rs
//! JSON export of building footprints in the tile-local frame

use super::{Builder, Building};
use crate::error::{BuildingsError, Result};
use crate::map::mercator::Vector2;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Accumulates footprints and writes them as a FeatureCollection of
/// polygons. Coordinates are metres relative to the layer origin, not
/// longitude/latitude.
#[derive(Debug, Default)]
pub struct JsonExporter {
    buildings: Vec<Building>,
}

impl JsonExporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn building_count(&self) -> usize {
        self.buildings.len()
    }

    pub fn export_to_file(&self, path: &Path) -> Result<()> {
        if self.buildings.is_empty() {
            return Err(BuildingsError::Other("No buildings to export".to_string()));
        }

        let content = self.to_json()?;
        let mut file = File::create(path)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    pub fn to_json(&self) -> Result<String> {
        let features: Vec<serde_json::Value> = self
            .buildings
            .iter()
            .map(|building| {
                let ring: Vec<[f64; 2]> = closed_ring(&building.points).iter().map(|p| [p.x, p.y]).collect();

                serde_json::json!({
                    "type": "Feature",
                    "geometry": {
                        "type": "Polygon",
                        "coordinates": [ring]
                    },
                    "properties": {
                        "id": building.id,
                        "points": building.points.len(),
                    }
                })
            })
            .collect();

        let feature_collection = serde_json::json!({
            "type": "FeatureCollection",
            "crs": "local-metres",
            "features": features
        });

        Ok(serde_json::to_string_pretty(&feature_collection)?)
    }
}

impl Builder for JsonExporter {
    type Handle = usize;

    fn build(&mut self, id: &str, points: &[Vector2]) -> usize {
        self.buildings.push(Building {
            id: id.to_string(),
            points: points.to_vec(),
        });
        self.buildings.len() - 1
    }
}

fn closed_ring(points: &[Vector2]) -> Vec<Vector2> {
    let mut ring = points.to_vec();
    if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
        if points.len() > 1 && first != last {
            ring.push(first);
        }
    }
    ring
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_export() {
        let mut exporter = JsonExporter::new();
        exporter.build(
            "5",
            &[Vector2::new(0.0, 0.0), Vector2::new(10.0, 0.0), Vector2::new(10.0, 10.0)],
        );

        let value: serde_json::Value = serde_json::from_str(&exporter.to_json().unwrap()).unwrap();
        assert_eq!(value["type"], "FeatureCollection");

        let feature = &value["features"][0];
        assert_eq!(feature["properties"]["id"], "5");
        let ring = feature["geometry"]["coordinates"][0].as_array().unwrap();
        assert_eq!(ring.len(), 4);
        assert_eq!(ring[0], ring[3]);
    }

    #[test]
    fn test_closed_ring_is_not_closed_twice() {
        let square = [
            Vector2::new(0.0, 0.0),
            Vector2::new(1.0, 0.0),
            Vector2::new(1.0, 1.0),
            Vector2::new(0.0, 0.0),
        ];
        assert_eq!(closed_ring(&square).len(), 4);
        assert!(closed_ring(&[]).is_empty());
    }

    #[test]
    fn test_export_to_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("buildings.json");

        let empty = JsonExporter::new();
        assert!(empty.export_to_file(&path).is_err());

        let mut exporter = JsonExporter::new();
        exporter.build("1", &[Vector2::new(0.0, 0.0), Vector2::new(1.0, 1.0)]);
        exporter.export_to_file(&path).unwrap();
        assert!(std::fs::read_to_string(&path).unwrap().contains("\"Polygon\""));
    }
}
