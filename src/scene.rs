//! Composition of the map stages into one renderable scene.
//!
//! [`MapScene::build`] runs every stage over a [`MapData`] value. The scene
//! is then drawn through a [`RenderAdapter`] and answers click lookups; it
//! never talks to a concrete rendering surface.

use std::collections::HashMap;

use crate::boundaries::{CountryShape, WorldBoundaries};
use crate::classify::VisitTier;
use crate::cluster::{cluster_visits, traveler_summary, Cluster};
use crate::config::MapConfig;
use crate::coords::CoordinateResolver;
use crate::fit::{ViewRecommendation, ViewportFitter};
use crate::model::{Coordinate, CountryVisitRecord, MapData};
use crate::routes::{build_routes, Route};

/// Fill for one country outline
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegionStyle {
    pub tier: VisitTier,
    /// True when the country has a record, so a click reports it
    pub clickable: bool,
}

/// Anything the scene asks a surface to draw
#[derive(Debug, Clone, Copy)]
pub enum Renderable<'a> {
    CountryPolygon {
        shape: &'a CountryShape,
        style: RegionStyle,
    },
    Route(&'a Route),
    Cluster {
        index: usize,
        cluster: &'a Cluster,
    },
}

/// A rendering surface
pub trait RenderAdapter {
    fn draw(&mut self, renderable: &Renderable<'_>);
}

/// What the user clicked, as located by the surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Hit {
    /// A cluster marker, by index into [`MapScene::clusters`]
    Cluster(usize),
    /// A point on the map away from any marker
    Map(Coordinate),
}

/// Everything derived from one `MapData` value
#[derive(Debug, Clone)]
pub struct MapScene {
    records: HashMap<String, CountryVisitRecord>,
    clusters: Vec<Cluster>,
    routes: Vec<Route>,
    view: ViewRecommendation,
}

impl MapScene {
    /// Run clustering, route building and fitting over `data`
    pub fn build(
        data: &MapData,
        resolver: &CoordinateResolver,
        config: &MapConfig,
        fitter: &mut ViewportFitter,
    ) -> Self {
        let points: Vec<Coordinate> = data
            .countries
            .iter()
            .map(|c| resolver.resolve(&c.country_code))
            .collect();

        let clusters = cluster_visits(&data.countries, resolver, config.grid_degrees);
        let routes = build_routes(&data.countries, resolver);
        let view = fitter.fit(&points);

        // Last record wins if a code repeats
        let mut records = HashMap::with_capacity(data.countries.len());
        for record in &data.countries {
            let code = record.country_code.trim().to_ascii_uppercase();
            if !code.is_empty() {
                records.insert(code, record.clone());
            }
        }

        log::info!(
            "Scene: {} countries, {} clusters, {} routes",
            data.countries.len(),
            clusters.len(),
            routes.len()
        );

        Self {
            records,
            clusters,
            routes,
            view,
        }
    }

    pub fn clusters(&self) -> &[Cluster] {
        &self.clusters
    }

    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Initial view and pan boundary recommended for this data
    pub fn view(&self) -> &ViewRecommendation {
        &self.view
    }

    pub fn record(&self, code: &str) -> Option<&CountryVisitRecord> {
        self.records.get(&code.trim().to_ascii_uppercase())
    }

    /// Fill for a country outline with the given code
    pub fn region_style(&self, code: Option<&str>) -> RegionStyle {
        let record = code.and_then(|c| self.record(c));
        RegionStyle {
            tier: VisitTier::classify(record.map(|r| r.visit_count)),
            clickable: record.is_some(),
        }
    }

    /// Draw regions, then routes, then cluster markers on top
    pub fn render(&self, boundaries: Option<&WorldBoundaries>, adapter: &mut dyn RenderAdapter) {
        if let Some(boundaries) = boundaries {
            for shape in boundaries.shapes() {
                adapter.draw(&Renderable::CountryPolygon {
                    shape,
                    style: self.region_style(shape.code.as_deref()),
                });
            }
        }
        for route in &self.routes {
            adapter.draw(&Renderable::Route(route));
        }
        for (index, cluster) in self.clusters.iter().enumerate() {
            adapter.draw(&Renderable::Cluster { index, cluster });
        }
    }

    /// Country code a click should report, if any.
    ///
    /// Single-member clusters report their record's code; multi-member
    /// clusters report nothing. Map clicks report the shape's uppercase code
    /// when that country has a record.
    pub fn click_target<'a>(
        &'a self,
        hit: Hit,
        boundaries: Option<&'a WorldBoundaries>,
    ) -> Option<&'a str> {
        match hit {
            Hit::Cluster(index) => self.clusters.get(index)?.click_target(),
            Hit::Map(coord) => {
                let code = boundaries?.country_at(coord)?.code.as_deref()?;
                self.record(code).map(|_| code)
            }
        }
    }

    /// Hover text for a country outline
    pub fn region_tooltip(&self, shape: &CountryShape) -> Vec<String> {
        match shape.code.as_deref().and_then(|c| self.record(c)) {
            Some(record) => {
                let mut lines = vec![
                    record.display_name(),
                    format!("Visits: {}", record.visit_count),
                    format!("Travelers: {}", record.traveler_count()),
                ];
                if !record.travelers.is_empty() {
                    lines.push(traveler_summary(&record.travelers, 3));
                }
                lines
            }
            None => vec![shape.name.clone(), "No visits recorded".to_string()],
        }
    }
}

/// Delivers country clicks to the single `on_country_click` callback.
///
/// Disabled while the boundary document is loading or after it failed; a
/// disabled handler swallows every click.
pub struct ClickHandler {
    on_country_click: Box<dyn FnMut(&str)>,
    enabled: bool,
}

impl ClickHandler {
    pub fn new(on_country_click: impl FnMut(&str) + 'static) -> Self {
        Self {
            on_country_click: Box::new(on_country_click),
            enabled: false,
        }
    }

    pub fn set_enabled(&mut self, enabled: bool) {
        self.enabled = enabled;
    }

    pub fn is_enabled(&self) -> bool {
        self.enabled
    }

    /// Resolve a hit and invoke the callback at most once. Returns whether
    /// the callback ran.
    pub fn click(
        &mut self,
        scene: &MapScene,
        hit: Hit,
        boundaries: Option<&WorldBoundaries>,
    ) -> bool {
        if !self.enabled {
            return false;
        }
        match scene.click_target(hit, boundaries) {
            Some(code) => {
                log::debug!("Country click: {}", code);
                (self.on_country_click)(code);
                true
            }
            None => false,
        }
    }
}

impl std::fmt::Debug for ClickHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ClickHandler")
            .field("enabled", &self.enabled)
            .finish_non_exhaustive()
    }
}
