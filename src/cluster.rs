//! Spatial clustering of visit records on a fixed degree grid.
//!
//! Each record's resolved coordinate is rounded to the nearest grid step on
//! both axes; records that round to the same bin become one marker. The bin
//! is a pure function of the coordinate, so the result does not depend on
//! input order.

use std::collections::HashMap;

use crate::classify::Rgb;
use crate::coords::CoordinateResolver;
use crate::model::{Coordinate, CountryVisitRecord, Traveler};

/// Marker size never grows past this
pub const MAX_MARKER_SIZE: u32 = 60;
const BASE_MARKER_SIZE: u32 = 40;
const MARKER_SIZE_PER_MEMBER: u32 = 5;

/// Grid bin: (lat steps, lon steps)
pub type GridKey = (i64, i64);

/// Bin for a coordinate at `grid_degrees` resolution
#[inline]
pub fn grid_key(coord: Coordinate, grid_degrees: f64) -> GridKey {
    (
        (coord.lat / grid_degrees).round() as i64,
        (coord.lon / grid_degrees).round() as i64,
    )
}

/// Marker color bucket by member count
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkerTier {
    /// One country
    Single,
    /// Two or three countries
    Few,
    /// Four or more
    Many,
}

impl MarkerTier {
    pub fn from_member_count(count: usize) -> Self {
        match count {
            0 | 1 => MarkerTier::Single,
            2 | 3 => MarkerTier::Few,
            _ => MarkerTier::Many,
        }
    }

    pub fn color(self) -> Rgb {
        match self {
            MarkerTier::Single => Rgb(0x42, 0xa5, 0xf5),
            MarkerTier::Few => Rgb(0xff, 0xa7, 0x26),
            MarkerTier::Many => Rgb(0xe5, 0x39, 0x35),
        }
    }
}

/// Records sharing one grid bin
#[derive(Debug, Clone, PartialEq)]
pub struct Cluster {
    pub key: GridKey,
    /// Bin center
    pub position: Coordinate,
    pub members: Vec<CountryVisitRecord>,
    pub total_visits: u64,
    /// Member traveler lists concatenated in member order (not deduplicated)
    pub travelers: Vec<Traveler>,
}

impl Cluster {
    pub fn member_count(&self) -> usize {
        self.members.len()
    }

    /// `min(40 + 5 × members, 60)`
    pub fn marker_size(&self) -> u32 {
        let n = self.members.len().min(u32::MAX as usize) as u32;
        BASE_MARKER_SIZE
            .saturating_add(MARKER_SIZE_PER_MEMBER.saturating_mul(n))
            .min(MAX_MARKER_SIZE)
    }

    pub fn marker_tier(&self) -> MarkerTier {
        MarkerTier::from_member_count(self.members.len())
    }

    /// Country code to report when the marker is clicked.
    ///
    /// Only single-member clusters are clickable; multi-member clusters are
    /// inert.
    pub fn click_target(&self) -> Option<&str> {
        match self.members.as_slice() {
            [only] => Some(only.country_code.as_str()),
            _ => None,
        }
    }

    /// Short marker label
    pub fn label(&self) -> String {
        match self.members.as_slice() {
            [only] => only.display_name(),
            members => format!("{} countries", members.len()),
        }
    }

    /// Hover text: label, visit total and up to three traveler names
    pub fn tooltip(&self) -> Vec<String> {
        let mut lines = vec![self.label(), format!("Visits: {}", self.total_visits)];
        if !self.travelers.is_empty() {
            lines.push(traveler_summary(&self.travelers, 3));
        }
        lines
    }
}

/// "A, B, C and 2 more"
pub fn traveler_summary(travelers: &[Traveler], shown: usize) -> String {
    let names: Vec<&str> = travelers.iter().take(shown).map(|t| t.name.as_str()).collect();
    let mut summary = names.join(", ");
    if travelers.len() > shown {
        summary.push_str(&format!(" and {} more", travelers.len() - shown));
    }
    summary
}

#[derive(Default)]
struct ClusterBuilder {
    members: Vec<CountryVisitRecord>,
    total_visits: u64,
    travelers: Vec<Traveler>,
}

/// Group records into grid clusters, ordered by grid key
pub fn cluster_visits(
    records: &[CountryVisitRecord],
    resolver: &CoordinateResolver,
    grid_degrees: f64,
) -> Vec<Cluster> {
    let mut cells: HashMap<GridKey, ClusterBuilder> = HashMap::new();

    for record in records {
        let coord = resolver.resolve(&record.country_code);
        let cell = cells.entry(grid_key(coord, grid_degrees)).or_default();
        cell.total_visits = cell.total_visits.saturating_add(record.visit_count);
        cell.travelers.extend(record.travelers.iter().cloned());
        cell.members.push(record.clone());
    }

    let mut clusters: Vec<Cluster> = cells
        .into_iter()
        .map(|(key, cell)| Cluster {
            key,
            position: Coordinate::new(
                key.0 as f64 * grid_degrees,
                key.1 as f64 * grid_degrees,
            ),
            members: cell.members,
            total_visits: cell.total_visits,
            travelers: cell.travelers,
        })
        .collect();
    clusters.sort_by_key(|c| c.key);

    log::debug!(
        "Clustered {} records into {} markers",
        records.len(),
        clusters.len()
    );
    clusters
}
