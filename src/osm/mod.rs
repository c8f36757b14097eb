// src/osm/mod.rs
//! OpenStreetMap data model and parsing

pub mod data;
pub mod parser;

pub use data::{Data, OsmId, ParseDiagnostics, Point, Relation, RelationMember, Tag, UnresolvedMember, Way};
pub use parser::{parse_bytes, parse_elements, parse_str, parse_value};
