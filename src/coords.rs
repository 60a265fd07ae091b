//! Country code → map coordinate.
//!
//! Resolution never fails: codes missing from the table land on the
//! configured fallback coordinate, so countries without a tabulated position
//! collapse onto one spot instead of vanishing.

use std::collections::HashMap;
use std::path::Path;

use crate::error::{MapError, OptionExt, Result};
use crate::model::Coordinate;

/// Approximate marker positions for ISO 3166-1 alpha-2 codes: (code, lat, lon)
const BUILTIN: &[(&str, f64, f64)] = &[
    ("AE", 23.4241, 53.8478),
    ("AR", -38.4161, -63.6167),
    ("AT", 47.5162, 14.5501),
    ("AU", -25.2744, 133.7751),
    ("BD", 23.6850, 90.3563),
    ("BE", 50.5039, 4.4699),
    ("BG", 42.7339, 25.4858),
    ("BO", -16.2902, -63.5887),
    ("BR", -14.2350, -51.9253),
    ("BT", 27.5142, 90.4336),
    ("CA", 56.1304, -106.3468),
    ("CH", 46.8182, 8.2275),
    ("CL", -35.6751, -71.5430),
    ("CN", 35.8617, 104.1954),
    ("CO", 4.5709, -74.2973),
    ("CR", 9.7489, -83.7534),
    ("CU", 21.5218, -77.7812),
    ("CZ", 49.8175, 15.4730),
    ("DE", 51.1657, 10.4515),
    ("DK", 56.2639, 9.5018),
    ("EC", -1.8312, -78.1834),
    ("EE", 58.5953, 25.0136),
    ("EG", 26.8206, 30.8025),
    ("ES", 40.4637, -3.7492),
    ("ET", 9.1450, 40.4897),
    ("FI", 61.9241, 25.7482),
    ("FJ", -17.7134, 178.0650),
    ("FR", 46.2276, 2.2137),
    ("GB", 55.3781, -3.4360),
    ("GE", 42.3154, 43.3569),
    ("GR", 39.0742, 21.8243),
    ("GU", 13.4443, 144.7937),
    ("HK", 22.3193, 114.1694),
    ("HR", 45.1000, 15.2000),
    ("HU", 47.1625, 19.5033),
    ("ID", -0.7893, 113.9213),
    ("IE", 53.4129, -8.2439),
    ("IL", 31.0461, 34.8516),
    ("IN", 20.5937, 78.9629),
    ("IS", 64.9631, -19.0208),
    ("IT", 41.8719, 12.5674),
    ("JO", 30.5852, 36.2384),
    ("JP", 36.2048, 138.2529),
    ("KE", -0.0236, 37.9062),
    ("KG", 41.2044, 74.7661),
    ("KH", 12.5657, 104.9910),
    ("KR", 35.9078, 127.7669),
    ("KZ", 48.0196, 66.9237),
    ("LA", 19.8563, 102.4955),
    ("LK", 7.8731, 80.7718),
    ("LT", 55.1694, 23.8813),
    ("LV", 56.8796, 24.6032),
    ("MA", 31.7917, -7.0926),
    ("MN", 46.8625, 103.8467),
    ("MO", 22.1987, 113.5439),
    ("MV", 3.2028, 73.2207),
    ("MX", 23.6345, -102.5528),
    ("MY", 4.2105, 101.9758),
    ("NL", 52.1326, 5.2913),
    ("NO", 60.4720, 8.4689),
    ("NP", 28.3949, 84.1240),
    ("NZ", -40.9006, 174.8860),
    ("PE", -9.1900, -75.0152),
    ("PH", 12.8797, 121.7740),
    ("PK", 30.3753, 69.3451),
    ("PL", 51.9194, 19.1451),
    ("PT", 39.3999, -8.2245),
    ("QA", 25.3548, 51.1839),
    ("RO", 45.9432, 24.9668),
    ("RS", 44.0165, 21.0059),
    ("RU", 61.5240, 105.3188),
    ("SA", 23.8859, 45.0792),
    ("SE", 60.1282, 18.6435),
    ("SG", 1.3521, 103.8198),
    ("SI", 46.1512, 14.9955),
    ("SK", 48.6690, 19.6990),
    ("TH", 15.8700, 100.9925),
    ("TN", 33.8869, 9.5375),
    ("TR", 38.9637, 35.2433),
    ("TW", 23.6978, 120.9605),
    ("TZ", -6.3690, 34.8888),
    ("UA", 48.3794, 31.1656),
    ("US", 37.0902, -95.7129),
    ("UY", -32.5228, -55.7658),
    ("UZ", 41.3775, 64.5853),
    ("VN", 14.0583, 108.2772),
    ("ZA", -30.5595, 22.9375),
];

/// Data-driven lookup table with a fixed fallback.
#[derive(Debug, Clone)]
pub struct CoordinateResolver {
    table: HashMap<String, Coordinate>,
    fallback: Coordinate,
}

impl CoordinateResolver {
    /// Resolver over the built-in table
    pub fn new(fallback: Coordinate) -> Self {
        let table = BUILTIN
            .iter()
            .map(|&(code, lat, lon)| (code.to_string(), Coordinate::new(lat, lon)))
            .collect();
        Self { table, fallback }
    }

    /// Resolver with no entries; everything resolves to `fallback`
    pub fn empty(fallback: Coordinate) -> Self {
        Self {
            table: HashMap::new(),
            fallback,
        }
    }

    pub fn fallback(&self) -> Coordinate {
        self.fallback
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Add or replace one entry
    pub fn insert(&mut self, code: &str, coord: Coordinate) -> Result<()> {
        let key = normalize(code).ok_or_config(&format!("invalid country code '{}'", code))?;
        if !coord.is_valid() {
            return Err(MapError::config(format!(
                "coordinate for '{}' out of range: ({}, {})",
                key, coord.lat, coord.lon
            )));
        }
        self.table.insert(key, coord);
        Ok(())
    }

    /// Merge a JSON object of `{"CODE": [lat, lon]}` entries into the table.
    /// Nothing is inserted if any entry is invalid.
    pub fn extend_from_json(&mut self, json: &str) -> Result<usize> {
        let entries: HashMap<String, Coordinate> =
            serde_json::from_str(json).map_err(|e| MapError::config(e.to_string()))?;

        let mut staged = self.clone();
        for (code, coord) in &entries {
            staged.insert(code, *coord)?;
        }
        *self = staged;
        Ok(entries.len())
    }

    /// Merge entries from a JSON file
    pub fn load_overrides(&mut self, path: &Path) -> Result<usize> {
        let content = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        let added = self.extend_from_json(&content)?;
        log::info!("Loaded {} coordinate entries from {}", added, path.display());
        Ok(added)
    }

    /// Tabulated coordinate, if any
    pub fn lookup(&self, code: &str) -> Option<Coordinate> {
        normalize(code).and_then(|key| self.table.get(&key).copied())
    }

    /// Coordinate for `code`, or the fallback
    pub fn resolve(&self, code: &str) -> Coordinate {
        match self.lookup(code) {
            Some(coord) => coord,
            None => {
                log::warn!(
                    "No coordinate for country code {:?}, using fallback ({}, {})",
                    code,
                    self.fallback.lat,
                    self.fallback.lon
                );
                self.fallback
            }
        }
    }
}

fn normalize(code: &str) -> Option<String> {
    let trimmed = code.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_ascii_uppercase())
    }
}
