// src/builder/mod.rs
//! Consumers of finished building footprints

pub mod json;

use crate::map::mercator::Vector2;

/// Receives one finished building per distinct way of a tile and owns
/// whatever it makes of it. The handle is opaque to the loader.
pub trait Builder {
    type Handle;

    fn build(&mut self, id: &str, points: &[Vector2]) -> Self::Handle;
}

#[derive(Debug, Clone, PartialEq)]
pub struct Building {
    pub id: String,
    pub points: Vec<Vector2>,
}

impl Building {
    /// Mean of the footprint's points
    pub fn centroid(&self) -> Option<Vector2> {
        if self.points.is_empty() {
            return None;
        }
        let n = self.points.len() as f64;
        let (x, y) = self.points.iter().fold((0.0, 0.0), |(x, y), p| (x + p.x, y + p.y));
        Some(Vector2::new(x / n, y / n))
    }
}

/// Keeps every building in memory; the handle is the building's index
#[derive(Debug, Default)]
pub struct CollectingBuilder {
    buildings: Vec<Building>,
}

impl CollectingBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn buildings(&self) -> &[Building] {
        &self.buildings
    }

    pub fn get(&self, handle: usize) -> Option<&Building> {
        self.buildings.get(handle)
    }

    pub fn len(&self) -> usize {
        self.buildings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buildings.is_empty()
    }
}

impl Builder for CollectingBuilder {
    type Handle = usize;

    fn build(&mut self, id: &str, points: &[Vector2]) -> usize {
        self.buildings.push(Building {
            id: id.to_string(),
            points: points.to_vec(),
        });
        self.buildings.len() - 1
    }
}
