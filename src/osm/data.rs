// src/osm/data.rs
//! OSM data structures for one tile

use crate::map::mercator::{to_mercator, Vector2};
use std::collections::HashMap;

pub type OsmId = i64;

#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    pub lat: f64,
    pub lon: f64,
    pub position: Vector2, // metres, relative to the layer origin
}

impl Point {
    pub fn new(lat: f64, lon: f64, origin: Vector2) -> Self {
        Self {
            lat,
            lon,
            position: to_mercator(lat, lon) - origin,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Tag {
    pub key: String,
    pub value: String,
}

impl Tag {
    pub fn new(key: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            key: key.into(),
            value: value.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Way {
    pub id: OsmId,
    pub points: Vec<Point>,
    pub tags: Vec<Tag>,
}

impl Way {
    pub fn new(id: OsmId) -> Self {
        Self {
            id,
            points: Vec::new(),
            tags: Vec::new(),
        }
    }

    /// Tile-local positions of the way's points, in order
    pub fn positions(&self) -> Vec<Vector2> {
        self.points.iter().map(|p| p.position).collect()
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        find_tag(&self.tags, key)
    }

    /// A way whose first and last points coincide
    pub fn is_closed(&self) -> bool {
        match (self.points.first(), self.points.last()) {
            (Some(first), Some(last)) => self.points.len() > 2 && first.lat == last.lat && first.lon == last.lon,
            _ => false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RelationMember {
    pub way_id: OsmId,
    pub role: String, // "outer", "inner", or empty
}

/// A relation only references ways; the geometry lives in the tile's way set
#[derive(Debug, Clone, PartialEq)]
pub struct Relation {
    pub id: OsmId,
    pub members: Vec<RelationMember>,
    pub tags: Vec<Tag>,
}

impl Relation {
    pub fn new(id: OsmId) -> Self {
        Self {
            id,
            members: Vec::new(),
            tags: Vec::new(),
        }
    }

    pub fn tag(&self, key: &str) -> Option<&str> {
        find_tag(&self.tags, key)
    }
}

/// A relation member that matched no way and carried no geometry of its own
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnresolvedMember {
    pub relation_id: OsmId,
    pub way_ref: OsmId,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParseDiagnostics {
    pub unresolved_members: Vec<UnresolvedMember>,
    pub duplicate_ways: Vec<OsmId>,
    pub skipped_elements: usize,
}

/// Parse result for one element array: the canonical way set in first-seen
/// order and the relations in element order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Data {
    ways: Vec<Way>,
    index: HashMap<OsmId, usize>,
    relations: Vec<Relation>,
    diagnostics: ParseDiagnostics,
}

impl Data {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn ways(&self) -> &[Way] {
        &self.ways
    }

    pub fn relations(&self) -> &[Relation] {
        &self.relations
    }

    pub fn diagnostics(&self) -> &ParseDiagnostics {
        &self.diagnostics
    }

    pub fn way(&self, id: OsmId) -> Option<&Way> {
        self.index.get(&id).map(|&i| &self.ways[i])
    }

    pub fn contains_way(&self, id: OsmId) -> bool {
        self.index.contains_key(&id)
    }

    /// Ways referenced by a relation, in member order
    pub fn relation_ways<'a>(&'a self, relation: &'a Relation) -> impl Iterator<Item = &'a Way> + 'a {
        relation.members.iter().filter_map(move |m| self.way(m.way_id))
    }

    /// Insert a way unless its id is already present. Returns whether it was added.
    pub(crate) fn insert_way(&mut self, way: Way) -> bool {
        if self.index.contains_key(&way.id) {
            return false;
        }
        self.index.insert(way.id, self.ways.len());
        self.ways.push(way);
        true
    }

    pub(crate) fn push_relation(&mut self, relation: Relation) {
        self.relations.push(relation);
    }

    pub(crate) fn diagnostics_mut(&mut self) -> &mut ParseDiagnostics {
        &mut self.diagnostics
    }

    pub fn into_parts(self) -> (Vec<Way>, Vec<Relation>) {
        (self.ways, self.relations)
    }
}

fn find_tag<'a>(tags: &'a [Tag], key: &str) -> Option<&'a str> {
    tags.iter().find(|t| t.key == key).map(|t| t.value.as_str())
}
