//! Per-traveler paths through the countries they visited.

use std::collections::HashMap;

use crate::classify::Rgb;
use crate::coords::CoordinateResolver;
use crate::model::{Coordinate, CountryVisitRecord};

/// Degrees between consecutive route hues
pub const HUE_STEP: f64 = 60.0;
const SATURATION: f64 = 0.7;
const LIGHTNESS: f64 = 0.5;

/// HSL route color
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RouteColor {
    /// Degrees in [0, 360)
    pub hue: f64,
    pub saturation: f64,
    pub lightness: f64,
}

impl RouteColor {
    /// Color for the `index`-th route
    pub fn for_index(index: usize) -> Self {
        Self {
            hue: (index as f64 * HUE_STEP) % 360.0,
            saturation: SATURATION,
            lightness: LIGHTNESS,
        }
    }

    pub fn to_rgb(&self) -> Rgb {
        let c = (1.0 - (2.0 * self.lightness - 1.0).abs()) * self.saturation;
        let h = self.hue / 60.0;
        let x = c * (1.0 - (h % 2.0 - 1.0).abs());
        let (r, g, b) = match h as u32 {
            0 => (c, x, 0.0),
            1 => (x, c, 0.0),
            2 => (0.0, c, x),
            3 => (0.0, x, c),
            4 => (x, 0.0, c),
            _ => (c, 0.0, x),
        };
        let m = self.lightness - c / 2.0;
        let channel = |v: f64| ((v + m) * 255.0).round().clamp(0.0, 255.0) as u8;
        Rgb(channel(r), channel(g), channel(b))
    }
}

/// A traveler's path, at least two distinct waypoints
#[derive(Debug, Clone, PartialEq)]
pub struct Route {
    pub traveler_id: i64,
    pub traveler_name: String,
    pub waypoints: Vec<Coordinate>,
    pub color: RouteColor,
}

struct PathBuilder {
    name: String,
    waypoints: Vec<Coordinate>,
}

/// Build one route per traveler with two or more distinct waypoints.
///
/// Travelers are enumerated in first-seen order; waypoints follow record
/// order and are deduplicated by exact coordinate, so two countries that
/// resolve to the same point share one waypoint.
pub fn build_routes(records: &[CountryVisitRecord], resolver: &CoordinateResolver) -> Vec<Route> {
    let mut order: Vec<i64> = Vec::new();
    let mut paths: HashMap<i64, PathBuilder> = HashMap::new();

    for record in records {
        if record.travelers.is_empty() {
            continue;
        }
        let coord = resolver.resolve(&record.country_code);
        for traveler in &record.travelers {
            let path = paths.entry(traveler.id).or_insert_with(|| {
                order.push(traveler.id);
                PathBuilder {
                    name: traveler.name.clone(),
                    waypoints: Vec::new(),
                }
            });
            if !path.waypoints.contains(&coord) {
                path.waypoints.push(coord);
            }
        }
    }

    let mut routes = Vec::new();
    for id in order {
        let Some(path) = paths.remove(&id) else {
            continue;
        };
        if path.waypoints.len() < 2 {
            continue;
        }
        routes.push(Route {
            traveler_id: id,
            traveler_name: path.name,
            waypoints: path.waypoints,
            color: RouteColor::for_index(routes.len()),
        });
    }
    routes
}
