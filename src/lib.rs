//! # visitmap
//!
//! Turns per-country visit records into a map scene: countries colored by
//! visit intensity, clustered markers, and one route per traveler, plus a
//! viewport recommendation that keeps the data framed.
//!
//! ## Quick Start
//!
//! ```rust
//! use visitmap::{
//!     CoordinateResolver, CountryVisitRecord, MapConfig, MapData, MapScene, Traveler,
//!     ViewportFitter,
//! };
//!
//! let config = MapConfig::default();
//! let resolver = CoordinateResolver::new(config.fallback);
//! let mut fitter = ViewportFitter::new(config.clone());
//!
//! let data = MapData::new(vec![
//!     CountryVisitRecord::new("KR", "Korea", 12).with_travelers(vec![Traveler::new(1, "A")]),
//! ]);
//! let scene = MapScene::build(&data, &resolver, &config, &mut fitter);
//!
//! assert_eq!(scene.clusters()[0].marker_size(), 45);
//! assert_eq!(scene.clusters()[0].click_target(), Some("KR"));
//! ```
//!
//! Everything here is synchronous and pure over its inputs apart from the
//! fitter's state machine; rerun [`MapScene::build`] whenever the data
//! changes.

pub mod error;
pub use error::{MapError, OptionExt, Result};

pub mod config;
pub use config::{MapConfig, PaddingTier};

pub mod model;
pub use model::{Coordinate, CountryVisitRecord, GeoBounds, MapData, Traveler};

// Country code → coordinate with fallback
pub mod coords;
pub use coords::CoordinateResolver;

// Visit count → color tier
pub mod classify;
pub use classify::{Rgb, VisitTier};

// 0.5° grid clustering
pub mod cluster;
pub use cluster::{cluster_visits, grid_key, Cluster, MarkerTier};

// Per-traveler routes
pub mod routes;
pub use routes::{build_routes, Route, RouteColor};

// Pan boundary / initial view state machine
pub mod fit;
pub use fit::{FitState, ViewCommand, ViewRecommendation, ViewportFitter};

// Debounced resize/zoom notifications
pub mod events;
pub use events::{Debouncer, ViewportAction, ViewportEvent, ViewportEvents};

pub mod spatial;

// Country outlines from GeoJSON or TopoJSON
mod topojson;
pub mod boundaries;
pub use boundaries::{CountryShape, WorldBoundaries};

pub mod scene;
pub use scene::{ClickHandler, Hit, MapScene, RegionStyle, RenderAdapter, Renderable};
