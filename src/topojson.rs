//! TopoJSON topologies decoded into GeoJSON features.
//!
//! Arcs are shared between neighbouring countries and, when the topology
//! carries a `transform`, quantized and delta-encoded. Decoding stitches
//! each ring back together from its arc references so the result can go
//! through the same feature walk as a GeoJSON document.

use std::collections::BTreeMap;

use geojson::{Feature, FeatureCollection, Geometry, JsonObject, Value};
use serde::Deserialize;

use crate::error::{MapError, OptionExt, Result};

/// Object preferred when a topology holds several (world-atlas layout)
const COUNTRIES_OBJECT: &str = "countries";

#[derive(Debug, Deserialize)]
struct Topology {
    #[serde(default)]
    transform: Option<Transform>,
    arcs: Vec<Vec<Vec<f64>>>,
    objects: BTreeMap<String, TopoGeometry>,
}

#[derive(Debug, Deserialize)]
struct Transform {
    scale: [f64; 2],
    translate: [f64; 2],
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type")]
enum TopoGeometry {
    GeometryCollection {
        geometries: Vec<TopoGeometry>,
    },
    Polygon {
        arcs: Vec<Vec<i64>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    MultiPolygon {
        arcs: Vec<Vec<Vec<i64>>>,
        #[serde(default)]
        properties: Option<JsonObject>,
    },
    #[serde(other)]
    Other,
}

/// Whether a parsed document is a TopoJSON topology
pub(crate) fn is_topology(value: &serde_json::Value) -> bool {
    value.get("type").and_then(|t| t.as_str()) == Some("Topology")
}

/// Decode a topology into a feature collection of its polygon geometries
pub(crate) fn to_feature_collection(value: serde_json::Value) -> Result<FeatureCollection> {
    let topology: Topology = serde_json::from_value(value).map_err(|e| MapError::Boundary {
        message: format!("invalid topology: {}", e),
    })?;
    let arcs = decode_arcs(&topology);

    let objects: Vec<&TopoGeometry> = match topology.objects.get(COUNTRIES_OBJECT) {
        Some(countries) => vec![countries],
        None => topology.objects.values().collect(),
    };

    let mut features = Vec::new();
    for object in objects {
        collect_features(object, &arcs, &mut features)?;
    }
    log::debug!("Decoded {} features from {} arcs", features.len(), arcs.len());

    Ok(FeatureCollection {
        bbox: None,
        features,
        foreign_members: None,
    })
}

/// Absolute (lon, lat) positions for every arc
fn decode_arcs(topology: &Topology) -> Vec<Vec<(f64, f64)>> {
    topology
        .arcs
        .iter()
        .map(|arc| {
            let (mut x, mut y) = (0.0, 0.0);
            let mut points = Vec::with_capacity(arc.len());
            for position in arc.iter().filter(|p| p.len() >= 2) {
                match &topology.transform {
                    Some(t) => {
                        x += position[0];
                        y += position[1];
                        points.push((
                            x * t.scale[0] + t.translate[0],
                            y * t.scale[1] + t.translate[1],
                        ));
                    }
                    None => points.push((position[0], position[1])),
                }
            }
            points
        })
        .collect()
}

/// Stitch a ring from arc references; a negative index `i` means arc `!i`
/// reversed. Each arc after the first repeats the previous end point.
fn stitch_ring(arcs: &[Vec<(f64, f64)>], indices: &[i64]) -> Result<Vec<Vec<f64>>> {
    let mut points: Vec<(f64, f64)> = Vec::new();
    for &index in indices {
        let (arc_index, reversed) = if index < 0 {
            (!index, true)
        } else {
            (index, false)
        };
        let arc = usize::try_from(arc_index)
            .ok()
            .and_then(|i| arcs.get(i))
            .ok_or_boundary(&format!("arc index {} out of range", index))?;
        let skip = usize::from(!points.is_empty());
        if reversed {
            points.extend(arc.iter().rev().skip(skip));
        } else {
            points.extend(arc.iter().skip(skip));
        }
    }
    Ok(points.into_iter().map(|(x, y)| vec![x, y]).collect())
}

fn stitch_polygon(arcs: &[Vec<(f64, f64)>], rings: &[Vec<i64>]) -> Result<Vec<Vec<Vec<f64>>>> {
    rings.iter().map(|ring| stitch_ring(arcs, ring)).collect()
}

fn feature(value: Value, properties: &Option<JsonObject>) -> Feature {
    Feature {
        bbox: None,
        geometry: Some(Geometry::new(value)),
        id: None,
        properties: properties.clone(),
        foreign_members: None,
    }
}

fn collect_features(
    object: &TopoGeometry,
    arcs: &[Vec<(f64, f64)>],
    out: &mut Vec<Feature>,
) -> Result<()> {
    match object {
        TopoGeometry::GeometryCollection { geometries } => {
            for geometry in geometries {
                collect_features(geometry, arcs, out)?;
            }
        }
        TopoGeometry::Polygon { arcs: rings, properties } => {
            let polygon = stitch_polygon(arcs, rings)?;
            out.push(feature(Value::Polygon(polygon), properties));
        }
        TopoGeometry::MultiPolygon { arcs: polygons, properties } => {
            let polygons = polygons
                .iter()
                .map(|rings| stitch_polygon(arcs, rings))
                .collect::<Result<Vec<_>>>()?;
            out.push(feature(Value::MultiPolygon(polygons), properties));
        }
        TopoGeometry::Other => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SHARED_EDGE: &str = r#"{
      "type": "Topology",
      "arcs": [
        [[126,34],[130,34],[130,38.6]],
        [[130,38.6],[126,38.6],[126,34]]
      ],
      "objects": {"countries": {"type": "GeometryCollection", "geometries": [
        {"type": "Polygon", "arcs": [[0, 1]], "properties": {"ISO_A2": "KR"}},
        {"type": "Polygon", "arcs": [[-2, -1]], "properties": {"ISO_A2": "XK"}},
        {"type": "LineString", "arcs": [0]}
      ]}}
    }"#;

    fn parse(doc: &str) -> serde_json::Value {
        serde_json::from_str(doc).unwrap()
    }

    fn exterior(feature: &Feature) -> Vec<Vec<f64>> {
        match &feature.geometry.as_ref().unwrap().value {
            Value::Polygon(rings) => rings[0].clone(),
            other => panic!("unexpected geometry {:?}", other),
        }
    }

    #[test]
    fn test_detects_topology() {
        assert!(is_topology(&parse(SHARED_EDGE)));
        assert!(!is_topology(&parse(r#"{"type": "FeatureCollection"}"#)));
    }

    #[test]
    fn test_stitches_rings_without_repeated_joins() {
        let fc = to_feature_collection(parse(SHARED_EDGE)).unwrap();
        assert_eq!(fc.features.len(), 2);

        let ring = exterior(&fc.features[0]);
        assert_eq!(ring.len(), 5);
        assert_eq!(ring[0], vec![126.0, 34.0]);
        assert_eq!(ring[2], vec![130.0, 38.6]);
        assert_eq!(ring.first(), ring.last());

        // Reversed arcs walk the same square the other way round
        let reversed = exterior(&fc.features[1]);
        assert_eq!(reversed.len(), 5);
        assert_eq!(reversed[1], vec![126.0, 38.6]);
        assert_eq!(reversed.first(), reversed.last());
    }

    #[test]
    fn test_quantized_arcs() {
        let doc = r#"{
          "type": "Topology",
          "transform": {"scale": [0.5, 0.5], "translate": [130, 31]},
          "arcs": [[[0,0],[24,0],[0,20],[-24,0],[0,-20]]],
          "objects": {"land": {"type": "MultiPolygon", "arcs": [[[0]]],
                               "properties": {"name": "Japan"}}}
        }"#;
        let fc = to_feature_collection(parse(doc)).unwrap();
        let Value::MultiPolygon(polygons) = &fc.features[0].geometry.as_ref().unwrap().value
        else {
            panic!("expected a multipolygon");
        };
        assert_eq!(
            polygons[0][0],
            vec![
                vec![130.0, 31.0],
                vec![142.0, 31.0],
                vec![142.0, 41.0],
                vec![130.0, 41.0],
                vec![130.0, 31.0],
            ]
        );
    }

    #[test]
    fn test_bad_arc_index() {
        let doc = r#"{"type": "Topology", "arcs": [],
          "objects": {"countries": {"type": "Polygon", "arcs": [[3]]}}}"#;
        assert!(to_feature_collection(parse(doc)).is_err());
    }
}
