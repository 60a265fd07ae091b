//! Input records and geographic primitives shared by every stage.

use serde::{Deserialize, Deserializer, Serialize};

/// A geographic position in degrees.
///
/// Serialized as a `[lat, lon]` pair, the shape used by coordinate tables
/// and config files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct Coordinate {
    pub lat: f64,
    pub lon: f64,
}

impl Coordinate {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// True if latitude is in [-90, 90] and longitude in [-180, 180]
    pub fn is_valid(&self) -> bool {
        (-90.0..=90.0).contains(&self.lat) && (-180.0..=180.0).contains(&self.lon)
    }
}

impl From<[f64; 2]> for Coordinate {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<Coordinate> for [f64; 2] {
    fn from(c: Coordinate) -> Self {
        [c.lat, c.lon]
    }
}

/// A person whose visits are recorded. Identity is `id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Traveler {
    pub id: i64,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gender: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel_url: Option<String>,
}

impl Traveler {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            gender: None,
            channel_url: None,
        }
    }
}

/// Visits aggregated for one country.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryVisitRecord {
    /// ISO alpha-2 code as supplied; anything that is not a string reads as ""
    #[serde(default, deserialize_with = "lenient_code")]
    pub country_code: String,
    #[serde(default)]
    pub country_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub country_emoji: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub continent: Option<String>,
    #[serde(default, deserialize_with = "null_as_zero")]
    pub visit_count: u64,
    #[serde(
        default,
        alias = "youtuberCount",
        skip_serializing_if = "Option::is_none"
    )]
    pub traveler_count: Option<u64>,
    #[serde(default, alias = "youtubers")]
    pub travelers: Vec<Traveler>,
}

impl CountryVisitRecord {
    pub fn new(code: impl Into<String>, name: impl Into<String>, visit_count: u64) -> Self {
        Self {
            country_code: code.into(),
            country_name: name.into(),
            country_emoji: None,
            continent: None,
            visit_count,
            traveler_count: None,
            travelers: Vec::new(),
        }
    }

    pub fn with_travelers(mut self, travelers: Vec<Traveler>) -> Self {
        self.travelers = travelers;
        self
    }

    /// Reported traveler count, or the number of distinct traveler ids
    pub fn traveler_count(&self) -> u64 {
        self.traveler_count.unwrap_or_else(|| {
            let mut ids: Vec<i64> = self.travelers.iter().map(|t| t.id).collect();
            ids.sort_unstable();
            ids.dedup();
            ids.len() as u64
        })
    }

    /// Name with the flag emoji prefixed when present
    pub fn display_name(&self) -> String {
        match &self.country_emoji {
            Some(emoji) if !emoji.is_empty() => format!("{} {}", emoji, self.country_name),
            _ => self.country_name.clone(),
        }
    }
}

/// The whole input for one render cycle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MapData {
    #[serde(default)]
    pub countries: Vec<CountryVisitRecord>,
}

impl MapData {
    pub fn new(countries: Vec<CountryVisitRecord>) -> Self {
        Self { countries }
    }

    pub fn is_empty(&self) -> bool {
        self.countries.is_empty()
    }

    /// Parse the camelCase JSON document produced by the map-data API
    pub fn from_json(json: &str) -> crate::Result<Self> {
        serde_json::from_str(json).map_err(|e| crate::MapError::Data {
            message: e.to_string(),
        })
    }

    /// Record for a country code, matched case-insensitively
    pub fn find(&self, code: &str) -> Option<&CountryVisitRecord> {
        let code = code.trim();
        if code.is_empty() {
            return None;
        }
        self.countries
            .iter()
            .find(|c| c.country_code.trim().eq_ignore_ascii_case(code))
    }
}

fn lenient_code<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => s,
        _ => String::new(),
    })
}

fn null_as_zero<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<u64>::deserialize(deserializer)?.unwrap_or(0))
}

/// Axis-aligned lat/lon rectangle.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoBounds {
    pub south: f64,
    pub west: f64,
    pub north: f64,
    pub east: f64,
}

impl GeoBounds {
    /// The extent a viewport may ever show (Web Mercator latitude limit)
    pub const WORLD: GeoBounds = GeoBounds {
        south: -85.0,
        west: -180.0,
        north: 85.0,
        east: 180.0,
    };

    pub const fn new(south: f64, west: f64, north: f64, east: f64) -> Self {
        Self {
            south,
            west,
            north,
            east,
        }
    }

    /// Minimal box enclosing all points; `None` for an empty set
    pub fn from_points<'a>(points: impl IntoIterator<Item = &'a Coordinate>) -> Option<Self> {
        points.into_iter().fold(None, |acc: Option<Self>, p| {
            Some(match acc {
                None => Self::new(p.lat, p.lon, p.lat, p.lon),
                Some(b) => Self::new(
                    b.south.min(p.lat),
                    b.west.min(p.lon),
                    b.north.max(p.lat),
                    b.east.max(p.lon),
                ),
            })
        })
    }

    /// Longitude span in degrees
    pub fn width(&self) -> f64 {
        self.east - self.west
    }

    /// Latitude span in degrees
    pub fn height(&self) -> f64 {
        self.north - self.south
    }

    pub fn max_dimension(&self) -> f64 {
        self.width().max(self.height())
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(
            (self.south + self.north) / 2.0,
            (self.west + self.east) / 2.0,
        )
    }

    /// Grow each side by `ratio` times the span of its axis
    pub fn pad(&self, ratio: f64) -> Self {
        self.pad_with_min_span(ratio, 0.0)
    }

    /// Like [`pad`](Self::pad), but each axis span is treated as at least
    /// `min_span` degrees so a single point still grows.
    pub fn pad_with_min_span(&self, ratio: f64, min_span: f64) -> Self {
        let lat_buffer = self.height().max(min_span) * ratio;
        let lon_buffer = self.width().max(min_span) * ratio;
        Self::new(
            self.south - lat_buffer,
            self.west - lon_buffer,
            self.north + lat_buffer,
            self.east + lon_buffer,
        )
    }

    /// Intersect with `limit`
    pub fn clamp_to(&self, limit: &GeoBounds) -> Self {
        Self::new(
            self.south.clamp(limit.south, limit.north),
            self.west.clamp(limit.west, limit.east),
            self.north.clamp(limit.south, limit.north),
            self.east.clamp(limit.west, limit.east),
        )
    }

    pub fn contains(&self, c: &Coordinate) -> bool {
        c.lat >= self.south && c.lat <= self.north && c.lon >= self.west && c.lon <= self.east
    }

    /// Move `c` to the nearest point inside the box
    pub fn clamp_point(&self, c: Coordinate) -> Coordinate {
        Coordinate::new(
            c.lat.clamp(self.south, self.north),
            c.lon.clamp(self.west, self.east),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_api_shape() {
        let json = r#"{"countries":[{"countryCode":"KR","countryName":"Korea","countryEmoji":"🇰🇷",
            "continent":"Asia","visitCount":12,"youtuberCount":1,
            "youtubers":[{"id":1,"name":"A","youtubeChannelId":"x"}]}]}"#;
        let data = MapData::from_json(json).unwrap();
        let kr = &data.countries[0];
        assert_eq!(kr.country_code, "KR");
        assert_eq!(kr.visit_count, 12);
        assert_eq!(kr.traveler_count(), 1);
        assert_eq!(kr.travelers[0].name, "A");
        assert_eq!(kr.display_name(), "🇰🇷 Korea");
    }

    #[test]
    fn test_non_string_code_reads_empty() {
        let json = r#"{"countries":[{"countryCode":42,"countryName":"?","visitCount":null}]}"#;
        let data = MapData::from_json(json).unwrap();
        assert_eq!(data.countries[0].country_code, "");
        assert_eq!(data.countries[0].visit_count, 0);
    }

    #[test]
    fn test_malformed_data_is_error() {
        assert!(MapData::from_json("{\"countries\": 3}").is_err());
    }

    #[test]
    fn test_traveler_count_dedups_ids() {
        let rec = CountryVisitRecord::new("JP", "Japan", 3).with_travelers(vec![
            Traveler::new(1, "A"),
            Traveler::new(1, "A"),
            Traveler::new(2, "B"),
        ]);
        assert_eq!(rec.traveler_count(), 2);
    }

    #[test]
    fn test_bounds_from_points() {
        let pts = [Coordinate::new(10.0, 20.0), Coordinate::new(-5.0, 40.0)];
        let b = GeoBounds::from_points(&pts).unwrap();
        assert_eq!(b, GeoBounds::new(-5.0, 20.0, 10.0, 40.0));
        assert_eq!(b.max_dimension(), 20.0);
        assert!(GeoBounds::from_points(&[]).is_none());
    }

    #[test]
    fn test_pad_grows_each_side() {
        let b = GeoBounds::new(0.0, 0.0, 10.0, 20.0).pad(0.5);
        assert_eq!(b, GeoBounds::new(-5.0, -10.0, 15.0, 30.0));
    }

    #[test]
    fn test_point_pad_needs_min_span() {
        let p = GeoBounds::new(1.0, 1.0, 1.0, 1.0);
        assert_eq!(p.pad(5.0), p);
        assert_eq!(p.pad_with_min_span(5.0, 1.0), GeoBounds::new(-4.0, -4.0, 6.0, 6.0));
    }

    #[test]
    fn test_clamp_world_is_noop_on_world() {
        assert_eq!(GeoBounds::WORLD.clamp_to(&GeoBounds::WORLD), GeoBounds::WORLD);
        let inside = GeoBounds::new(-10.0, -10.0, 10.0, 10.0);
        assert_eq!(inside.clamp_to(&GeoBounds::WORLD), inside);
    }
}
