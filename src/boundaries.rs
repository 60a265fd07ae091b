//! World country polygons from a GeoJSON or TopoJSON document.
//!
//! Each feature is keyed by its ISO alpha-2 property. Features without a
//! usable code (missing, empty or Natural Earth's `-99`) are kept so they are
//! still drawn, but they never match a visit record.

use std::path::Path;

use geo::{BoundingRect, Contains, LineString, MultiPolygon, Point, Polygon};
use geojson::{GeoJson, Geometry, Value};

use crate::error::{MapError, OptionExt, Result};
use crate::model::{Coordinate, GeoBounds};
use crate::spatial::FeatureGrid;
use crate::topojson;

/// Properties checked, in order, for the country code
const CODE_PROPERTIES: [&str; 3] = ["ISO_A2", "iso_a2", "ISO_A2_EH"];
/// Properties checked, in order, for the display name
const NAME_PROPERTIES: [&str; 4] = ["NAME", "name", "ADMIN", "admin"];
/// Index cell size in degrees
const GRID_CELL_DEGREES: f64 = 10.0;

/// One country outline
#[derive(Debug, Clone)]
pub struct CountryShape {
    /// Uppercase ISO alpha-2 code, when the feature carries a usable one
    pub code: Option<String>,
    pub name: String,
    pub polygons: MultiPolygon<f64>,
    pub bounds: GeoBounds,
}

impl CountryShape {
    pub fn contains(&self, coord: Coordinate) -> bool {
        self.bounds.contains(&coord) && self.polygons.contains(&Point::new(coord.lon, coord.lat))
    }

    /// Exterior rings as (lon, lat) sequences, for drawing
    pub fn outlines(&self) -> impl Iterator<Item = Vec<(f64, f64)>> + '_ {
        self.polygons
            .iter()
            .map(|p| p.exterior().coords().map(|c| (c.x, c.y)).collect())
    }
}

/// Parsed boundary document with a point-lookup index
#[derive(Debug, Clone)]
pub struct WorldBoundaries {
    shapes: Vec<CountryShape>,
    grid: FeatureGrid,
}

impl WorldBoundaries {
    pub fn new(shapes: Vec<CountryShape>) -> Self {
        let grid = FeatureGrid::build(shapes.iter().map(|s| s.bounds), GRID_CELL_DEGREES);
        Self { shapes, grid }
    }

    /// Read and parse a GeoJSON or TopoJSON file
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path).map_err(|e| MapError::Boundary {
            message: format!("{}: {}", path.display(), e),
        })?;
        let boundaries = Self::from_bytes(bytes)?;
        log::info!(
            "Loaded {} country shapes from {}",
            boundaries.len(),
            path.display()
        );
        Ok(boundaries)
    }

    /// Parse a GeoJSON or TopoJSON document
    pub fn from_bytes(mut bytes: Vec<u8>) -> Result<Self> {
        let value: serde_json::Value =
            simd_json::serde::from_slice(&mut bytes).map_err(|e| MapError::Boundary {
                message: e.to_string(),
            })?;
        if topojson::is_topology(&value) {
            let fc = topojson::to_feature_collection(value)?;
            return Self::from_geojson(&GeoJson::FeatureCollection(fc));
        }
        let geojson = GeoJson::from_json_value(value).map_err(|e| MapError::Boundary {
            message: e.to_string(),
        })?;
        Self::from_geojson(&geojson)
    }

    pub fn from_geojson(geojson: &GeoJson) -> Result<Self> {
        let GeoJson::FeatureCollection(fc) = geojson else {
            return Err(MapError::Boundary {
                message: "expected a FeatureCollection".to_string(),
            });
        };

        let mut shapes = Vec::with_capacity(fc.features.len());
        for feature in &fc.features {
            let Some(geometry) = feature.geometry.as_ref() else {
                continue;
            };
            let Some(polygons) = geometry_polygons(geometry) else {
                continue;
            };
            let Some(rect) = polygons.bounding_rect() else {
                continue;
            };

            let props = feature.properties.as_ref();
            let code = CODE_PROPERTIES
                .iter()
                .find_map(|key| props.and_then(|p| p.get(*key)).and_then(|v| v.as_str()))
                .map(|s| s.trim().to_ascii_uppercase())
                .filter(|s| !s.is_empty() && s != "-99");
            let name = NAME_PROPERTIES
                .iter()
                .find_map(|key| props.and_then(|p| p.get(*key)).and_then(|v| v.as_str()))
                .unwrap_or("Unknown")
                .to_string();

            shapes.push(CountryShape {
                code,
                name,
                polygons,
                bounds: GeoBounds::new(rect.min().y, rect.min().x, rect.max().y, rect.max().x),
            });
        }

        if shapes.is_empty() {
            return None.ok_or_boundary("document has no polygon features");
        }
        Ok(Self::new(shapes))
    }

    pub fn shapes(&self) -> &[CountryShape] {
        &self.shapes
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    /// Country whose outline contains `coord`
    pub fn country_at(&self, coord: Coordinate) -> Option<&CountryShape> {
        self.grid
            .query_point(coord.lon, coord.lat)
            .iter()
            .filter_map(|&idx| self.shapes.get(idx))
            .find(|shape| shape.contains(coord))
    }

    /// Shapes whose bbox overlaps `bounds`, in document order
    pub fn visible(&self, bounds: &GeoBounds) -> Vec<&CountryShape> {
        let mut indices = Vec::new();
        self.grid.query_into(bounds, &mut indices);
        indices.sort_unstable();
        indices.dedup();
        indices
            .into_iter()
            .filter_map(|idx| self.shapes.get(idx))
            .collect()
    }
}

fn ring(coords: &[Vec<f64>]) -> LineString<f64> {
    coords
        .iter()
        .filter(|c| c.len() >= 2)
        .map(|c| (c[0], c[1]))
        .collect::<Vec<_>>()
        .into()
}

fn polygon(rings: &[Vec<Vec<f64>>]) -> Option<Polygon<f64>> {
    let (exterior, interiors) = rings.split_first()?;
    Some(Polygon::new(
        ring(exterior),
        interiors.iter().map(|r| ring(r)).collect(),
    ))
}

fn geometry_polygons(geometry: &Geometry) -> Option<MultiPolygon<f64>> {
    let polygons: Vec<Polygon<f64>> = match &geometry.value {
        Value::Polygon(rings) => polygon(rings).into_iter().collect(),
        Value::MultiPolygon(polys) => polys.iter().filter_map(|rings| polygon(rings)).collect(),
        Value::GeometryCollection(geometries) => geometries
            .iter()
            .filter_map(geometry_polygons)
            .flat_map(|mp| mp.0)
            .collect(),
        _ => Vec::new(),
    };
    if polygons.is_empty() {
        None
    } else {
        Some(MultiPolygon::new(polygons))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const DOC: &str = r#"{
      "type": "FeatureCollection",
      "features": [
        {"type": "Feature", "properties": {"ISO_A2": "KR", "NAME": "South Korea"},
         "geometry": {"type": "Polygon", "coordinates": [[[126,34],[130,34],[130,38.6],[126,38.6],[126,34]]]}},
        {"type": "Feature", "properties": {"iso_a2": "jp", "name": "Japan"},
         "geometry": {"type": "MultiPolygon", "coordinates": [
            [[[130,31],[142,31],[142,41],[130,41],[130,31]]],
            [[[140,41.5],[146,41.5],[146,45.5],[140,45.5],[140,41.5]]]]}},
        {"type": "Feature", "properties": {"ISO_A2": "-99", "NAME": "Somaliland"},
         "geometry": {"type": "Polygon", "coordinates": [[[43,8],[48,8],[48,11],[43,11],[43,8]]]}},
        {"type": "Feature", "properties": {"ISO_A2": "XP"},
         "geometry": {"type": "Point", "coordinates": [0, 0]}}
      ]
    }"#;

    fn world() -> WorldBoundaries {
        WorldBoundaries::from_bytes(DOC.as_bytes().to_vec()).unwrap()
    }

    #[test]
    fn test_parses_polygon_features_only() {
        let w = world();
        assert_eq!(w.len(), 3);
        assert_eq!(w.shapes()[0].code.as_deref(), Some("KR"));
        assert_eq!(w.shapes()[1].code.as_deref(), Some("JP"));
        assert_eq!(w.shapes()[2].code, None);
        assert_eq!(w.shapes()[2].name, "Somaliland");
    }

    #[test]
    fn test_country_at() {
        let w = world();
        let seoul = Coordinate::new(37.5, 127.0);
        assert_eq!(w.country_at(seoul).and_then(|s| s.code.as_deref()), Some("KR"));
        let hokkaido = Coordinate::new(43.0, 142.5);
        assert_eq!(w.country_at(hokkaido).and_then(|s| s.code.as_deref()), Some("JP"));
        assert!(w.country_at(Coordinate::new(0.0, 0.0)).is_none());
    }

    #[test]
    fn test_bounds_and_outlines() {
        let w = world();
        let jp = &w.shapes()[1];
        assert_eq!(jp.bounds, GeoBounds::new(31.0, 130.0, 45.5, 146.0));
        assert_eq!(jp.outlines().count(), 2);
        let visible = w.visible(&GeoBounds::new(30.0, 120.0, 40.0, 135.0));
        assert_eq!(visible.len(), 2);
    }

    #[test]
    fn test_loads_topology() {
        let doc = r#"{
          "type": "Topology",
          "transform": {"scale": [0.5, 0.5], "translate": [126, 34]},
          "arcs": [[[0,0],[8,0],[0,9]], [[8,9],[-8,0],[0,-9]]],
          "objects": {"countries": {"type": "GeometryCollection", "geometries": [
            {"type": "Polygon", "arcs": [[0, 1]],
             "properties": {"ISO_A2": "KR", "name": "South Korea"}}
          ]}}
        }"#;
        let w = WorldBoundaries::from_bytes(doc.as_bytes().to_vec()).unwrap();
        assert_eq!(w.len(), 1);
        assert_eq!(w.shapes()[0].bounds, GeoBounds::new(34.0, 126.0, 38.5, 130.0));
        let seoul = Coordinate::new(37.5, 127.0);
        assert_eq!(w.country_at(seoul).map(|s| s.name.as_str()), Some("South Korea"));
    }

    #[test]
    fn test_rejects_bad_documents() {
        assert!(WorldBoundaries::from_bytes(b"not json".to_vec()).is_err());
        let point = r#"{"type": "Point", "coordinates": [0, 0]}"#;
        assert!(WorldBoundaries::from_bytes(point.as_bytes().to_vec()).is_err());
        let empty = r#"{"type": "FeatureCollection", "features": []}"#;
        assert!(matches!(
            WorldBoundaries::from_bytes(empty.as_bytes().to_vec()),
            Err(MapError::Boundary { .. })
        ));
    }
}
