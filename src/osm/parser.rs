// src/osm/parser.rs
//! Overpass JSON parsing with relation-to-way resolution

use super::data::{Data, OsmId, Point, Relation, RelationMember, Tag, UnresolvedMember, Way};
use crate::error::{BuildingsError, Result};
use crate::map::mercator::Vector2;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Debug, Deserialize)]
struct Response {
    elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
enum Element {
    Way(RawWay),
    Relation(RawRelation),
    #[serde(other)]
    Other,
}

#[derive(Debug, Deserialize)]
struct RawWay {
    id: OsmId,
    #[serde(default)]
    tags: Option<BTreeMap<String, serde_json::Value>>,
    geometry: Vec<RawCoord>,
}

#[derive(Debug, Deserialize)]
struct RawRelation {
    id: OsmId,
    #[serde(default)]
    tags: Option<BTreeMap<String, serde_json::Value>>,
    members: Vec<RawMember>,
}

#[derive(Debug, Deserialize)]
struct RawMember {
    #[serde(rename = "type", default)]
    kind: Option<String>,
    #[serde(rename = "ref")]
    way_ref: OsmId,
    #[serde(default)]
    role: Option<String>,
    #[serde(default)]
    geometry: Option<Vec<RawCoord>>,
}

#[derive(Debug, Deserialize)]
struct RawCoord {
    lat: f64,
    lon: f64,
}

/// Parse a raw response body
pub fn parse_bytes(bytes: &[u8], origin: Vector2) -> Result<Data> {
    let response: Response = serde_json::from_slice(bytes).map_err(malformed)?;
    Ok(build_data(response.elements, origin))
}

pub fn parse_str(text: &str, origin: Vector2) -> Result<Data> {
    parse_bytes(text.as_bytes(), origin)
}

/// Parse an already decoded document with a top-level `elements` array
pub fn parse_value(document: serde_json::Value, origin: Vector2) -> Result<Data> {
    let response: Response = serde_json::from_value(document).map_err(malformed)?;
    Ok(build_data(response.elements, origin))
}

/// Parse a bare element array
pub fn parse_elements(elements: Vec<serde_json::Value>, origin: Vector2) -> Result<Data> {
    let elements = elements
        .into_iter()
        .map(serde_json::from_value)
        .collect::<std::result::Result<Vec<Element>, _>>()
        .map_err(malformed)?;
    Ok(build_data(elements, origin))
}

fn malformed(error: serde_json::Error) -> BuildingsError {
    BuildingsError::Malformed(error.to_string())
}

fn build_data(elements: Vec<Element>, origin: Vector2) -> Data {
    let mut data = Data::new();

    for element in elements {
        match element {
            Element::Way(raw) => add_way(&mut data, raw, origin),
            Element::Relation(raw) => add_relation(&mut data, raw, origin),
            Element::Other => data.diagnostics_mut().skipped_elements += 1,
        }
    }

    debug!(
        "Parsed {} ways and {} relations ({} elements skipped)",
        data.ways().len(),
        data.relations().len(),
        data.diagnostics().skipped_elements
    );
    data
}

fn add_way(data: &mut Data, raw: RawWay, origin: Vector2) {
    let mut way = Way::new(raw.id);
    way.points = to_points(&raw.geometry, origin);
    way.tags = to_tags(raw.tags);

    if !data.insert_way(way) {
        warn!("Duplicate way {}, keeping the first occurrence", raw.id);
        data.diagnostics_mut().duplicate_ways.push(raw.id);
    }
}

fn add_relation(data: &mut Data, raw: RawRelation, origin: Vector2) {
    let mut relation = Relation::new(raw.id);

    for member in raw.members {
        if member.kind.as_deref().map_or(false, |kind| kind != "way") {
            continue;
        }

        if !data.contains_way(member.way_ref) {
            match member.geometry {
                Some(ref geometry) => {
                    // Relation-only way, visible to later relations
                    let mut way = Way::new(member.way_ref);
                    way.points = to_points(geometry, origin);
                    data.insert_way(way);
                }
                None => {
                    warn!("Relation {} references unknown way {}", raw.id, member.way_ref);
                    data.diagnostics_mut().unresolved_members.push(UnresolvedMember {
                        relation_id: raw.id,
                        way_ref: member.way_ref,
                    });
                    continue;
                }
            }
        }

        relation.members.push(RelationMember {
            way_id: member.way_ref,
            role: member.role.unwrap_or_default(),
        });
    }

    relation.tags = to_tags(raw.tags);
    data.push_relation(relation);
}

fn to_points(geometry: &[RawCoord], origin: Vector2) -> Vec<Point> {
    geometry.iter().map(|c| Point::new(c.lat, c.lon, origin)).collect()
}

fn to_tags(tags: Option<BTreeMap<String, serde_json::Value>>) -> Vec<Tag> {
    tags.unwrap_or_default()
        .into_iter()
        .map(|(key, value)| match value {
            serde_json::Value::String(s) => Tag::new(key, s),
            other => Tag::new(key, other.to_string()),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::mercator::to_mercator;
    use serde_json::json;

    fn origin() -> Vector2 {
        to_mercator(48.85, 2.35)
    }

    fn way(id: OsmId) -> serde_json::Value {
        json!({
            "type": "way",
            "id": id,
            "tags": {"building": "yes"},
            "geometry": [{"lat": 48.85, "lon": 2.35}, {"lat": 48.851, "lon": 2.351}, {"lat": 48.85, "lon": 2.352}]
        })
    }

    #[test]
    fn test_single_way() {
        let text = r#"{"elements":[{"type":"way","id":1,"tags":{},"geometry":[{"lat":48.85,"lon":2.35},{"lat":48.86,"lon":2.36}]}]}"#;
        let data = parse_str(text, origin()).unwrap();

        assert_eq!(data.ways().len(), 1);
        let way = &data.ways()[0];
        assert_eq!(way.id, 1);
        assert_eq!(way.points.len(), 2);
        assert!(way.tags.is_empty());
        assert_eq!(way.points[0].position, Vector2::new(0.0, 0.0));
        assert!(data.relations().is_empty());
    }

    #[test]
    fn test_relation_way_dedup() {
        let document = json!({"elements": [
            way(5),
            {"type": "relation", "id": 100, "tags": {"building": "yes"},
             "members": [{"type": "way", "ref": 5, "role": "outer"}]},
            {"type": "relation", "id": 101,
             "members": [{"type": "way", "ref": 5, "role": "outer",
                          "geometry": [{"lat": 1.0, "lon": 1.0}]}]}
        ]});
        let data = parse_value(document, origin()).unwrap();

        assert_eq!(data.ways().iter().filter(|w| w.id == 5).count(), 1);
        assert_eq!(data.relations().len(), 2);
        // The top-level geometry is reused, the inline copy is ignored
        assert_eq!(data.way(5).unwrap().points.len(), 3);
        for relation in data.relations() {
            let ids: Vec<OsmId> = data.relation_ways(relation).map(|w| w.id).collect();
            assert_eq!(ids, vec![5]);
        }
        assert_eq!(data.relations()[0].members[0].role, "outer");
        assert_eq!(data.relations()[0].tag("building"), Some("yes"));
    }

    #[test]
    fn test_relation_only_way_is_shared() {
        let document = json!({"elements": [
            {"type": "relation", "id": 1, "members": [
                {"type": "way", "ref": 42, "role": "outer",
                 "geometry": [{"lat": 48.85, "lon": 2.35}, {"lat": 48.851, "lon": 2.35}]}
            ]},
            {"type": "relation", "id": 2, "members": [
                {"type": "way", "ref": 42, "role": "inner"}
            ]}
        ]});
        let data = parse_value(document, origin()).unwrap();

        assert_eq!(data.ways().len(), 1);
        assert_eq!(data.way(42).unwrap().points.len(), 2);
        assert!(data.way(42).unwrap().tags.is_empty());
        assert_eq!(data.relations()[1].members.len(), 1);
        assert!(data.diagnostics().unresolved_members.is_empty());
    }

    #[test]
    fn test_unresolved_member_is_skipped() {
        let document = json!({"elements": [
            way(1),
            {"type": "relation", "id": 9, "members": [
                {"type": "way", "ref": 77, "role": "outer"},
                {"type": "way", "ref": 1, "role": "inner"}
            ]}
        ]});
        let data = parse_value(document, origin()).unwrap();

        let relation = &data.relations()[0];
        assert_eq!(relation.members.len(), 1);
        assert_eq!(relation.members[0].way_id, 1);
        assert_eq!(
            data.diagnostics().unresolved_members,
            vec![UnresolvedMember { relation_id: 9, way_ref: 77 }]
        );
    }

    #[test]
    fn test_non_way_members_are_ignored() {
        let document = json!({"elements": [
            way(1),
            {"type": "relation", "id": 9, "members": [
                {"type": "node", "ref": 3, "role": "entrance", "lat": 48.85, "lon": 2.35},
                {"type": "relation", "ref": 4, "role": ""},
                {"type": "way", "ref": 1, "role": "outer"}
            ]}
        ]});
        let data = parse_value(document, origin()).unwrap();
        assert_eq!(data.relations()[0].members.len(), 1);
        assert!(data.diagnostics().unresolved_members.is_empty());
    }

    #[test]
    fn test_unknown_element_types_ignored() {
        let node = json!({"type": "node", "id": 3, "lat": 48.85, "lon": 2.35});
        let relation = json!({"type": "relation", "id": 10, "members": [{"type": "way", "ref": 2, "role": "outer"}]});

        let with_node = parse_elements(vec![way(1), node, way(2), relation.clone()], origin()).unwrap();
        let without_node = parse_elements(vec![way(1), way(2), relation], origin()).unwrap();

        assert_eq!(with_node.ways(), without_node.ways());
        assert_eq!(with_node.relations(), without_node.relations());
        assert_eq!(with_node.diagnostics().skipped_elements, 1);
        assert_eq!(without_node.diagnostics().skipped_elements, 0);
    }

    #[test]
    fn test_missing_and_null_tags() {
        let document = json!({"elements": [
            {"type": "way", "id": 1, "geometry": []},
            {"type": "way", "id": 2, "tags": null, "geometry": []},
            {"type": "relation", "id": 3, "members": []}
        ]});
        let data = parse_value(document, origin()).unwrap();
        assert!(data.ways().iter().all(|w| w.tags.is_empty()));
        assert!(data.relations()[0].tags.is_empty());
    }

    #[test]
    fn test_non_string_tag_values() {
        let document = json!({"elements": [
            {"type": "way", "id": 1, "tags": {"levels": 4, "name": "Hall"}, "geometry": []}
        ]});
        let data = parse_value(document, origin()).unwrap();
        let way = data.way(1).unwrap();
        assert_eq!(way.tag("levels"), Some("4"));
        assert_eq!(way.tag("name"), Some("Hall"));
    }

    #[test]
    fn test_duplicate_way_first_wins() {
        let mut second = way(1);
        second["tags"] = json!({"building": "garage"});
        let data = parse_elements(vec![way(1), second], origin()).unwrap();

        assert_eq!(data.ways().len(), 1);
        assert_eq!(data.way(1).unwrap().tag("building"), Some("yes"));
        assert_eq!(data.diagnostics().duplicate_ways, vec![1]);
    }

    #[test]
    fn test_ways_keep_first_seen_order() {
        let data = parse_elements(vec![way(30), way(10), way(20)], origin()).unwrap();
        let ids: Vec<OsmId> = data.ways().iter().map(|w| w.id).collect();
        assert_eq!(ids, vec![30, 10, 20]);
    }

    #[test]
    fn test_malformed_documents() {
        let cases = [
            r#"{"version": 0.6}"#,
            r#"{"elements": [{"type": "way", "id": 1}]}"#,
            r#"{"elements": [{"type": "way", "geometry": []}]}"#,
            r#"{"elements": [{"type": "relation", "id": 1}]}"#,
            r#"{"elements": [{"id": 1}]}"#,
            r#"not json"#,
        ];
        for text in cases {
            let err = parse_str(text, origin()).unwrap_err();
            assert!(err.is_malformed(), "{} -> {}", text, err);
        }
    }
}
