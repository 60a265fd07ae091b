use visitmap::{
    Cluster, CountryShape, GeoBounds, MarkerTier, RegionStyle, RenderAdapter, Renderable, Rgb,
    Route, VisitTier,
};

use crate::braille::BrailleCanvas;
use crate::map::geometry::{draw_circle, draw_line, draw_ring, draw_thick_line, fill_polygon};
use crate::map::projection::Viewport;

/// Braille pixels of marker radius per unit of cluster marker size
const MARKER_SIZE_PER_PIXEL: u32 = 10;

/// Marker radius in braille pixels for a cluster marker size
pub fn marker_radius(size: u32) -> i32 {
    (size / MARKER_SIZE_PER_PIXEL).max(1) as i32
}

/// Index of the cluster whose marker covers pixel (px, py), nearest first
pub fn cluster_at(viewport: &Viewport, clusters: &[Cluster], px: i32, py: i32) -> Option<usize> {
    clusters
        .iter()
        .enumerate()
        .filter_map(|(idx, c)| {
            let (cx, cy) = viewport.project(c.position.lon, c.position.lat);
            let r = i64::from(marker_radius(c.marker_size()) + 1);
            // Projected distances span the whole world at high zoom
            let (dx, dy) = (i64::from(cx) - i64::from(px), i64::from(cy) - i64::from(py));
            let d2 = dx * dx + dy * dy;
            (d2 <= r * r).then_some((d2, idx))
        })
        .min()
        .map(|(_, idx)| idx)
}

/// Layer toggles owned by the view, not by the scene
#[derive(Clone, Debug)]
pub struct DisplaySettings {
    pub show_regions: bool,
    pub show_routes: bool,
    pub show_clusters: bool,
    pub show_labels: bool,
    pub show_legend: bool,
}

impl Default for DisplaySettings {
    fn default() -> Self {
        Self {
            show_regions: true,
            show_routes: true,
            show_clusters: true,
            show_labels: true,
            show_legend: true,
        }
    }
}

/// Rendered canvases, back to front
pub struct MapLayers {
    pub outlines: BrailleCanvas,
    pub fills: Vec<(VisitTier, BrailleCanvas)>,
    pub routes: Vec<(Rgb, BrailleCanvas)>,
    pub markers: Vec<(MarkerTier, BrailleCanvas)>,
    /// (column, row, text) in character cells
    pub labels: Vec<(u16, u16, String)>,
}

/// Draws scene renderables onto braille layers
pub struct BrailleAdapter<'a> {
    viewport: &'a Viewport,
    settings: &'a DisplaySettings,
    visible: GeoBounds,
    width: usize,
    height: usize,
    layers: MapLayers,
}

impl<'a> BrailleAdapter<'a> {
    /// Adapter for a `width` x `height` character area
    pub fn new(
        viewport: &'a Viewport,
        settings: &'a DisplaySettings,
        width: usize,
        height: usize,
    ) -> Self {
        let fills = VisitTier::LEGEND
            .iter()
            .map(|&tier| (tier, BrailleCanvas::new(width, height)))
            .collect();
        let markers = [MarkerTier::Single, MarkerTier::Few, MarkerTier::Many]
            .into_iter()
            .map(|tier| (tier, BrailleCanvas::new(width, height)))
            .collect();
        Self {
            viewport,
            settings,
            visible: viewport.visible_bounds(),
            width,
            height,
            layers: MapLayers {
                outlines: BrailleCanvas::new(width, height),
                fills,
                routes: Vec::new(),
                markers,
                labels: Vec::new(),
            },
        }
    }

    pub fn finish(self) -> MapLayers {
        self.layers
    }

    fn draw_region(&mut self, shape: &CountryShape, style: RegionStyle) {
        let b = &shape.bounds;
        let v = &self.visible;
        if b.east < v.west || b.west > v.east || b.north < v.south || b.south > v.north {
            return;
        }

        // No fill canvas for countries without visits
        let mut fill = self
            .layers
            .fills
            .iter_mut()
            .find(|(tier, _)| *tier == style.tier)
            .map(|(_, canvas)| canvas);
        let viewport = self.viewport;

        for ring in shape.outlines() {
            let points: Vec<(i32, i32)> = ring
                .iter()
                .map(|&(lon, lat)| viewport.project(lon, lat))
                .collect();
            draw_ring_path(&mut self.layers.outlines, &points, viewport);
            if let Some(canvas) = fill.as_deref_mut() {
                fill_polygon(canvas, &points);
            }
        }
    }

    fn draw_route(&mut self, route: &Route) {
        let mut canvas = BrailleCanvas::new(self.width, self.height);
        let points: Vec<(i32, i32)> = route
            .waypoints
            .iter()
            .map(|c| self.viewport.project(c.lon, c.lat))
            .collect();
        for pair in points.windows(2) {
            let (a, b) = (pair[0], pair[1]);
            if self.viewport.line_might_be_visible(a, b) {
                draw_thick_line(&mut canvas, a.0, a.1, b.0, b.1);
            }
        }
        // Waypoint dots
        for &(x, y) in &points {
            draw_circle(&mut canvas, x, y, 1);
        }
        self.layers.routes.push((route.color.to_rgb(), canvas));
    }

    fn draw_cluster(&mut self, cluster: &Cluster) {
        let (px, py) = self.viewport.project(cluster.position.lon, cluster.position.lat);
        if !self.viewport.is_visible(px, py) {
            return;
        }
        let radius = marker_radius(cluster.marker_size());
        let tier = cluster.marker_tier();
        if let Some((_, canvas)) = self.layers.markers.iter_mut().find(|(t, _)| *t == tier) {
            draw_circle(canvas, px, py, radius);
            draw_ring(canvas, px, py, radius + 1);
        }

        if self.settings.show_labels && px >= 0 && py >= 0 {
            let char_x = (px / 2) as u16;
            let char_y = (py / 4) as u16;
            let text = if cluster.member_count() > 1 {
                cluster.member_count().to_string()
            } else {
                cluster.total_visits.to_string()
            };
            let label_x = char_x.saturating_sub(text.len() as u16 / 2);
            self.layers.labels.push((label_x, char_y, text));
        }
    }
}

/// Draw a projected ring with viewport culling; long jumps (antimeridian
/// crossings) are skipped.
fn draw_ring_path(canvas: &mut BrailleCanvas, points: &[(i32, i32)], viewport: &Viewport) {
    if points.len() < 2 {
        return;
    }
    for pair in points.windows(2) {
        let ((x0, y0), (x1, y1)) = (pair[0], pair[1]);
        let dist = ((x1 - x0).abs() + (y1 - y0).abs()) as usize;
        if dist < viewport.width && viewport.line_might_be_visible((x0, y0), (x1, y1)) {
            draw_line(canvas, x0, y0, x1, y1);
        }
    }
}

impl RenderAdapter for BrailleAdapter<'_> {
    fn draw(&mut self, renderable: &Renderable<'_>) {
        match *renderable {
            Renderable::CountryPolygon { shape, style } => {
                if self.settings.show_regions {
                    self.draw_region(shape, style);
                }
            }
            Renderable::Route(route) => {
                if self.settings.show_routes {
                    self.draw_route(route);
                }
            }
            Renderable::Cluster { cluster, .. } => {
                if self.settings.show_clusters {
                    self.draw_cluster(cluster);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use visitmap::{
        Coordinate, CoordinateResolver, CountryVisitRecord, MapConfig, MapData, MapScene,
        Traveler, ViewportFitter,
    };

    fn scene() -> MapScene {
        let config = MapConfig::default();
        let resolver = CoordinateResolver::new(config.fallback);
        let mut fitter = ViewportFitter::new(config.clone());
        let data = MapData::new(vec![
            CountryVisitRecord::new("KR", "Korea", 12).with_travelers(vec![Traveler::new(1, "A")]),
            CountryVisitRecord::new("JP", "Japan", 3).with_travelers(vec![Traveler::new(1, "A")]),
        ]);
        MapScene::build(&data, &resolver, &config, &mut fitter)
    }

    fn viewport() -> Viewport {
        Viewport::new(Coordinate::new(36.0, 133.0), 5.0, 160, 96)
    }

    #[test]
    fn test_marker_radius() {
        assert_eq!(marker_radius(45), 4);
        assert_eq!(marker_radius(60), 6);
        assert_eq!(marker_radius(0), 1);
    }

    #[test]
    fn test_cluster_at_marker_center() {
        let scene = scene();
        let vp = viewport();
        let kr = &scene.clusters()[0];
        let (px, py) = vp.project(kr.position.lon, kr.position.lat);
        let hit = cluster_at(&vp, scene.clusters(), px, py).unwrap();
        assert_eq!(scene.clusters()[hit].click_target(), Some("KR"));
        assert_eq!(cluster_at(&vp, scene.clusters(), px + 40, py + 40), None);
    }

    #[test]
    fn test_cluster_at_far_side_of_world() {
        let config = MapConfig::default();
        let resolver = CoordinateResolver::new(config.fallback);
        let mut fitter = ViewportFitter::new(config.clone());
        let data = MapData::new(vec![
            CountryVisitRecord::new("NZ", "New Zealand", 2),
            CountryVisitRecord::new("MX", "Mexico", 7),
        ]);
        let scene = MapScene::build(&data, &resolver, &config, &mut fitter);
        let nz = scene
            .clusters()
            .iter()
            .position(|c| c.click_target() == Some("NZ"))
            .unwrap();

        let vp = Viewport::new(scene.clusters()[nz].position, 10.0, 160, 96);
        assert_eq!(cluster_at(&vp, scene.clusters(), 80, 48), Some(nz));
        assert_eq!(cluster_at(&vp, scene.clusters(), 0, 0), None);
    }

    #[test]
    fn test_adapter_draws_routes_and_markers() {
        let scene = scene();
        let vp = viewport();
        let settings = DisplaySettings::default();
        let mut adapter = BrailleAdapter::new(&vp, &settings, 80, 24);
        scene.render(None, &mut adapter);
        let layers = adapter.finish();
        assert_eq!(layers.routes.len(), 1);
        assert!(!layers.routes[0].1.is_blank());
        assert!(layers.markers.iter().any(|(_, c)| !c.is_blank()));
        assert_eq!(layers.labels.len(), 2);
    }

    #[test]
    fn test_hidden_layers_skip_drawing() {
        let scene = scene();
        let vp = viewport();
        let settings = DisplaySettings {
            show_routes: false,
            show_clusters: false,
            ..DisplaySettings::default()
        };
        let mut adapter = BrailleAdapter::new(&vp, &settings, 80, 24);
        scene.render(None, &mut adapter);
        let layers = adapter.finish();
        assert!(layers.routes.is_empty());
        assert!(layers.markers.iter().all(|(_, c)| c.is_blank()));
    }
}
