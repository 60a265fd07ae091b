//! Tunable parameters for clustering, fitting and event coalescing.
//!
//! Every field has a default, so a config file only needs the values it
//! changes:
//!
//! ```json
//! { "gridDegrees": 1.0, "paddingTiers": [[45, 4.0], [null, 2.5]] }
//! ```

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::model::Coordinate;

/// One step of the padding step function: boxes whose largest side is below
/// `below` degrees (or any box, when `below` is `None`) get `multiplier`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "(Option<f64>, f64)", into = "(Option<f64>, f64)")]
pub struct PaddingTier {
    pub below: Option<f64>,
    pub multiplier: f64,
}

impl PaddingTier {
    pub const fn new(below: Option<f64>, multiplier: f64) -> Self {
        Self { below, multiplier }
    }
}

impl From<(Option<f64>, f64)> for PaddingTier {
    fn from((below, multiplier): (Option<f64>, f64)) -> Self {
        Self { below, multiplier }
    }
}

impl From<PaddingTier> for (Option<f64>, f64) {
    fn from(t: PaddingTier) -> Self {
        (t.below, t.multiplier)
    }
}

/// Map configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct MapConfig {
    /// Cluster bin size in degrees (default: 0.5)
    pub grid_degrees: f64,
    /// Pan-boundary padding by bounding-box size, ascending
    pub padding_tiers: Vec<PaddingTier>,
    /// Padding used once zoomed past `zoom_threshold` (default: 6.0)
    pub zoom_padding_multiplier: f64,
    /// Zoom level at which the pan boundary relaxes (default: 6)
    pub zoom_threshold: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom cap for the initial fit to the data (default: 5)
    pub initial_fit_max_zoom: f64,
    /// Zoom shown around the fallback coordinate with no data (default: 7)
    pub empty_zoom: f64,
    /// Margin around the data box for the initial fit (default: 0.4)
    pub fit_padding: f64,
    /// Smallest axis span used when padding the pan boundary (default: 1.0)
    pub min_span_degrees: f64,
    /// Quiet period before a resize/zoom notification is acted on
    pub debounce_ms: u64,
    /// Where unresolvable country codes land (default: Seoul)
    pub fallback: Coordinate,
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            grid_degrees: 0.5,
            padding_tiers: vec![
                PaddingTier::new(Some(30.0), 5.0),
                PaddingTier::new(Some(60.0), 4.0),
                PaddingTier::new(Some(120.0), 3.5),
                PaddingTier::new(None, 3.0),
            ],
            zoom_padding_multiplier: 6.0,
            zoom_threshold: 6.0,
            min_zoom: 2.0,
            max_zoom: 10.0,
            initial_fit_max_zoom: 5.0,
            empty_zoom: 7.0,
            fit_padding: 0.4,
            min_span_degrees: 1.0,
            debounce_ms: 150,
            fallback: Coordinate::new(37.5665, 126.9780),
        }
    }
}

impl MapConfig {
    /// Parse and validate a JSON config document
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json).map_err(|e| MapError::config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load and validate a JSON config file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| MapError::io(path, e))?;
        let config = Self::from_json(&content)?;
        log::info!("Loaded map config from {}", path.display());
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.grid_degrees.is_nan() || self.grid_degrees <= 0.0 {
            return Err(MapError::config("gridDegrees must be positive"));
        }
        if self.padding_tiers.is_empty() {
            return Err(MapError::config("paddingTiers must not be empty"));
        }
        let mut last = f64::NEG_INFINITY;
        for (i, tier) in self.padding_tiers.iter().enumerate() {
            if tier.multiplier < 0.0 {
                return Err(MapError::config("padding multipliers must be non-negative"));
            }
            match tier.below {
                Some(below) if below <= last => {
                    return Err(MapError::config("paddingTiers must be in ascending order"));
                }
                Some(below) => last = below,
                None if i + 1 != self.padding_tiers.len() => {
                    return Err(MapError::config("only the last padding tier may be unbounded"));
                }
                None => {}
            }
        }
        if self.min_zoom > self.max_zoom {
            return Err(MapError::config("minZoom must not exceed maxZoom"));
        }
        if self.fit_padding < 0.0 || self.min_span_degrees < 0.0 {
            return Err(MapError::config("fitPadding and minSpanDegrees must be non-negative"));
        }
        if !self.fallback.is_valid() {
            return Err(MapError::config("fallback coordinate out of range"));
        }
        Ok(())
    }

    /// Pan-boundary padding for a bounding box whose largest side is
    /// `max_dimension` degrees.
    pub fn padding_multiplier(&self, max_dimension: f64) -> f64 {
        self.padding_tiers
            .iter()
            .find(|tier| tier.below.map_or(true, |below| max_dimension < below))
            .or(self.padding_tiers.last())
            .map_or(1.0, |tier| tier.multiplier)
    }

    pub fn debounce_window(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }
}
