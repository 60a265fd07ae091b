//! Pan boundary and initial view for the current dataset.
//!
//! ```text
//! Unbounded ──data──▶ Fitting ──▶ Bounded ◀──zoom < threshold── Adjusting
//!     ▲                              │                             ▲
//!     └──────────── empty ───────────┴──── zoom ≥ threshold ───────┘
//! ```
//!
//! The fitter only recommends: the rendering surface owns the viewport and
//! applies the returned commands.

use crate::config::MapConfig;
use crate::model::{Coordinate, GeoBounds};

/// Fitting state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FitState {
    /// No data; fallback view over the whole world
    Unbounded,
    /// Bounds being computed for a new dataset
    Fitting,
    /// Tiered pan boundary active
    Bounded,
    /// Zoomed past the threshold; relaxed pan boundary active
    Adjusting,
}

/// How the surface should move its view
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewCommand {
    /// Jump to a center and zoom
    SetView { center: Coordinate, zoom: f64 },
    /// Fit `bounds` into the visible area, never zooming past `max_zoom`
    FitBounds {
        bounds: GeoBounds,
        max_zoom: f64,
        animate: bool,
    },
}

/// Result of fitting a dataset
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ViewRecommendation {
    pub command: ViewCommand,
    pub pan_boundary: GeoBounds,
}

/// Pan boundary for `bounds` at `multiplier`, clamped to the world extent
pub fn pan_boundary(bounds: &GeoBounds, multiplier: f64, min_span: f64) -> GeoBounds {
    bounds
        .pad_with_min_span(multiplier, min_span)
        .clamp_to(&GeoBounds::WORLD)
}

/// Adaptive bounds fitting over resolved coordinates
#[derive(Debug, Clone)]
pub struct ViewportFitter {
    config: MapConfig,
    state: FitState,
    data_bounds: Option<GeoBounds>,
    pan_boundary: GeoBounds,
    size_stale: bool,
}

impl ViewportFitter {
    pub fn new(config: MapConfig) -> Self {
        Self {
            config,
            state: FitState::Unbounded,
            data_bounds: None,
            pan_boundary: GeoBounds::WORLD,
            size_stale: false,
        }
    }

    pub fn state(&self) -> FitState {
        self.state
    }

    /// Active pan boundary
    pub fn pan_boundary(&self) -> GeoBounds {
        self.pan_boundary
    }

    /// Unexpanded bounding box of the current dataset
    pub fn data_bounds(&self) -> Option<GeoBounds> {
        self.data_bounds
    }

    /// Fit a new dataset. An empty set re-enters `Unbounded`.
    pub fn fit(&mut self, points: &[Coordinate]) -> ViewRecommendation {
        let Some(bounds) = GeoBounds::from_points(points) else {
            self.transition(FitState::Unbounded);
            self.data_bounds = None;
            self.pan_boundary = GeoBounds::WORLD;
            return ViewRecommendation {
                command: ViewCommand::SetView {
                    center: self.config.fallback,
                    zoom: self.config.empty_zoom,
                },
                pan_boundary: self.pan_boundary,
            };
        };

        self.transition(FitState::Fitting);
        self.data_bounds = Some(bounds);

        let multiplier = self.config.padding_multiplier(bounds.max_dimension());
        self.pan_boundary = pan_boundary(&bounds, multiplier, self.config.min_span_degrees);
        log::info!(
            "Fitting {} points: box {:.1}° (multiplier {}), pan boundary {:?}",
            points.len(),
            bounds.max_dimension(),
            multiplier,
            self.pan_boundary
        );
        self.transition(FitState::Bounded);

        ViewRecommendation {
            command: ViewCommand::FitBounds {
                bounds: bounds.pad(self.config.fit_padding),
                max_zoom: self.config.initial_fit_max_zoom,
                animate: true,
            },
            pan_boundary: self.pan_boundary,
        }
    }

    /// React to a (debounced) zoom change. Returns the new pan boundary when
    /// it changed.
    pub fn on_zoom(&mut self, zoom: f64) -> Option<GeoBounds> {
        let bounds = self.data_bounds?;
        let above = zoom >= self.config.zoom_threshold;

        let multiplier = match (self.state, above) {
            (FitState::Bounded, true) => {
                self.transition(FitState::Adjusting);
                self.config.zoom_padding_multiplier
            }
            (FitState::Adjusting, false) => {
                self.transition(FitState::Bounded);
                self.config.padding_multiplier(bounds.max_dimension())
            }
            _ => return None,
        };

        let relaxed = pan_boundary(&bounds, multiplier, self.config.min_span_degrees);
        if relaxed == self.pan_boundary {
            return None;
        }
        self.pan_boundary = relaxed;
        Some(relaxed)
    }

    /// The surface was resized; its cached pixel size must be recomputed.
    /// Bounds and zoom are untouched.
    pub fn invalidate_size(&mut self) {
        self.size_stale = true;
    }

    /// Consume a pending size invalidation
    pub fn take_size_invalidation(&mut self) -> bool {
        std::mem::take(&mut self.size_stale)
    }

    fn transition(&mut self, next: FitState) {
        if self.state != next {
            log::debug!("Viewport fitter {:?} -> {:?}", self.state, next);
            self.state = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fitter() -> ViewportFitter {
        ViewportFitter::new(MapConfig::default())
    }

    #[test]
    fn test_empty_dataset_unbounded() {
        let mut f = fitter();
        let rec = f.fit(&[]);
        assert_eq!(f.state(), FitState::Unbounded);
        assert_eq!(
            rec.command,
            ViewCommand::SetView {
                center: MapConfig::default().fallback,
                zoom: 7.0
            }
        );
        assert_eq!(rec.pan_boundary, GeoBounds::WORLD);
    }

    #[test]
    fn test_single_country_uses_largest_padding() {
        let mut f = fitter();
        let kr = Coordinate::new(35.9078, 127.7669);
        let rec = f.fit(&[kr]);
        assert_eq!(f.state(), FitState::Bounded);
        // span floored at 1°, padded 5× on each side
        let expected = GeoBounds::new(kr.lat - 5.0, kr.lon - 5.0, kr.lat + 5.0, kr.lon + 5.0);
        assert_eq!(rec.pan_boundary, expected);
        match rec.command {
            ViewCommand::FitBounds {
                bounds,
                max_zoom,
                animate,
            } => {
                assert_eq!(bounds, GeoBounds::new(kr.lat, kr.lon, kr.lat, kr.lon));
                assert_eq!(max_zoom, 5.0);
                assert!(animate);
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_padding_tier_selection() {
        let mut f = fitter();
        // 40° wide box → 4.0
        let rec = f.fit(&[Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 40.0)]);
        assert_eq!(rec.pan_boundary, GeoBounds::new(-40.0, -160.0, 50.0, 180.0));
    }

    #[test]
    fn test_pan_boundary_clamped_to_world() {
        let mut f = fitter();
        let rec = f.fit(&[Coordinate::new(-40.0, -120.0), Coordinate::new(60.0, 150.0)]);
        assert_eq!(rec.pan_boundary, GeoBounds::WORLD);
        let b = pan_boundary(&GeoBounds::WORLD, 0.0, 0.0);
        assert_eq!(b, GeoBounds::WORLD);
    }

    #[test]
    fn test_fit_padding_forty_percent() {
        let mut f = fitter();
        let rec = f.fit(&[Coordinate::new(0.0, 0.0), Coordinate::new(10.0, 20.0)]);
        match rec.command {
            ViewCommand::FitBounds { bounds, .. } => {
                assert_eq!(bounds, GeoBounds::new(-4.0, -8.0, 14.0, 28.0));
            }
            other => panic!("unexpected command {:?}", other),
        }
    }

    #[test]
    fn test_zoom_threshold_relaxes_and_restores() {
        let mut f = fitter();
        let kr = Coordinate::new(36.0, 128.0);
        let initial = f.fit(&[kr]).pan_boundary;

        assert_eq!(f.on_zoom(5.0), None);
        let relaxed = f.on_zoom(6.0).unwrap();
        assert_eq!(f.state(), FitState::Adjusting);
        assert_eq!(relaxed, GeoBounds::new(30.0, 122.0, 42.0, 134.0));
        assert_eq!(f.on_zoom(8.0), None);

        assert_eq!(f.on_zoom(4.0), Some(initial));
        assert_eq!(f.state(), FitState::Bounded);
    }

    #[test]
    fn test_zoom_without_data_is_ignored() {
        let mut f = fitter();
        assert_eq!(f.on_zoom(9.0), None);
        assert_eq!(f.state(), FitState::Unbounded);
        assert_eq!(f.pan_boundary(), GeoBounds::WORLD);
    }

    #[test]
    fn test_empty_after_data_resets() {
        let mut f = fitter();
        f.fit(&[Coordinate::new(36.0, 128.0)]);
        f.on_zoom(7.0);
        f.fit(&[]);
        assert_eq!(f.state(), FitState::Unbounded);
        assert_eq!(f.pan_boundary(), GeoBounds::WORLD);
        assert!(f.data_bounds().is_none());
    }

    #[test]
    fn test_resize_only_invalidates_size() {
        let mut f = fitter();
        let rec = f.fit(&[Coordinate::new(36.0, 128.0)]);
        f.invalidate_size();
        assert!(f.take_size_invalidation());
        assert!(!f.take_size_invalidation());
        assert_eq!(f.pan_boundary(), rec.pan_boundary);
        assert_eq!(f.state(), FitState::Bounded);
    }
}
