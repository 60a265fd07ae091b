use std::f64::consts::PI;

use visitmap::{Coordinate, GeoBounds};

/// Braille pixels spanned by the whole world at zoom 0
pub const TILE_PIXELS: f64 = 64.0;

/// Web Mercator x in [0, 1]
#[inline]
pub fn mercator_x(lon: f64) -> f64 {
    (lon + 180.0) / 360.0
}

/// Web Mercator y in [0, 1], north at 0
#[inline]
pub fn mercator_y(lat: f64) -> f64 {
    let lat_rad = lat.clamp(-85.0511, 85.0511) * PI / 180.0;
    (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0
}

#[inline]
fn inverse_mercator_y(y: f64) -> f64 {
    (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI
}

/// Visible map area: center, discrete zoom level and pan limits
#[derive(Clone, Debug)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level; each step doubles the scale
    pub zoom: f64,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// The center may not leave this box
    pub pan_boundary: GeoBounds,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub fn new(center: Coordinate, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon: center.lon,
            center_lat: center.lat,
            zoom,
            min_zoom: 0.0,
            max_zoom: 18.0,
            pan_boundary: GeoBounds::WORLD,
            width,
            height,
        }
    }

    pub fn with_zoom_limits(mut self, min_zoom: f64, max_zoom: f64) -> Self {
        self.min_zoom = min_zoom;
        self.max_zoom = max_zoom;
        self.zoom = self.zoom.clamp(min_zoom, max_zoom);
        self
    }

    pub fn center(&self) -> Coordinate {
        Coordinate::new(self.center_lat, self.center_lon)
    }

    /// World size in pixels at the current zoom
    fn scale(&self) -> f64 {
        TILE_PIXELS * self.zoom.exp2()
    }

    /// Jump to a center and zoom, respecting zoom limits and pan boundary
    pub fn set_view(&mut self, center: Coordinate, zoom: f64) {
        self.zoom = zoom.clamp(self.min_zoom, self.max_zoom);
        self.center_lon = center.lon;
        self.center_lat = center.lat;
        self.clamp_center();
    }

    /// Replace the pan boundary and pull the center back inside it
    pub fn set_pan_boundary(&mut self, boundary: GeoBounds) {
        self.pan_boundary = boundary;
        self.clamp_center();
    }

    fn clamp_center(&mut self) {
        let c = self.pan_boundary.clamp_point(self.center());
        self.center_lat = c.lat.clamp(-85.0, 85.0);
        self.center_lon = c.lon;
    }

    /// Center and zoom that fit `bounds` in the canvas, capped at `max_zoom`.
    /// Zoom snaps down to whole levels.
    pub fn fit_bounds(&self, bounds: &GeoBounds, max_zoom: f64) -> (Coordinate, f64) {
        let x0 = mercator_x(bounds.west);
        let x1 = mercator_x(bounds.east);
        let y0 = mercator_y(bounds.north);
        let y1 = mercator_y(bounds.south);

        let fit_w = self.width as f64 / ((x1 - x0) * TILE_PIXELS);
        let fit_h = self.height as f64 / ((y1 - y0) * TILE_PIXELS);
        // Zero-size spans divide to infinity and fall through to the cap
        let zoom = fit_w.min(fit_h).log2().floor();
        let cap = max_zoom.min(self.max_zoom);
        let zoom = if zoom.is_nan() { cap } else { zoom.clamp(self.min_zoom, cap) };

        let center = Coordinate::new(
            inverse_mercator_y((y0 + y1) / 2.0),
            (bounds.west + bounds.east) / 2.0,
        );
        (center, zoom)
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let (lon, lat) = self.unproject(
            self.width as i32 / 2 + dx,
            self.height as i32 / 2 + dy,
        );
        self.center_lon = lon;
        self.center_lat = lat;
        self.clamp_center();
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom + 1.0).min(self.max_zoom);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom - 1.0).max(self.min_zoom);
    }

    /// Zoom in one level keeping the point under (px, py) fixed
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0);
    }

    /// Zoom out one level keeping the point under (px, py) fixed
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, -1.0);
    }

    fn zoom_at(&mut self, px: i32, py: i32, delta: f64) {
        let (lon, lat) = self.unproject(px, py);

        let new_zoom = (self.zoom + delta).clamp(self.min_zoom, self.max_zoom);
        if new_zoom == self.zoom {
            return;
        }
        self.zoom = new_zoom;

        // Shift so the same geographic point lands back under the cursor
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let scale = self.scale();
        let x = (px as f64 - self.width as f64 / 2.0) / scale + mercator_x(self.center_lon);
        let y = (py as f64 - self.height as f64 / 2.0) / scale + mercator_y(self.center_lat);

        let lon = (x * 360.0 - 180.0).clamp(-180.0, 180.0);
        let lat = inverse_mercator_y(y.clamp(0.0, 1.0));
        (lon, lat)
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let scale = self.scale();
        let px = (mercator_x(lon) - mercator_x(self.center_lon)) * scale + self.width as f64 / 2.0;
        let py = (mercator_y(lat) - mercator_y(self.center_lat)) * scale + self.height as f64 / 2.0;
        (px as i32, py as i32)
    }

    /// Geographic extent currently on screen
    pub fn visible_bounds(&self) -> GeoBounds {
        let (west, north) = self.unproject(0, 0);
        let (east, south) = self.unproject(self.width as i32, self.height as i32);
        GeoBounds::new(south, west, north, east)
    }

    /// Check if a projected point is visible in the viewport
    pub fn is_visible(&self, px: i32, py: i32) -> bool {
        px >= -10 && px < self.width as i32 + 10 && py >= -10 && py < self.height as i32 + 10
    }

    /// Check if a line segment might be visible (rough bounding box check)
    pub fn line_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn vp() -> Viewport {
        Viewport::new(Coordinate::new(0.0, 0.0), 2.0, 200, 100).with_zoom_limits(2.0, 10.0)
    }

    #[test]
    fn test_project_center() {
        let v = vp();
        assert_eq!(v.project(0.0, 0.0), (100, 50));
        let (lon, lat) = v.unproject(100, 50);
        assert!(lon.abs() < 1e-9 && lat.abs() < 1e-9);
    }

    #[test]
    fn test_pan_moves_center() {
        let mut v = vp();
        v.pan(10, 0);
        assert!(v.center_lon > 0.0);
        v.pan(0, 10);
        assert!(v.center_lat < 0.0);
    }

    #[test]
    fn test_pan_respects_boundary() {
        let mut v = vp();
        v.set_pan_boundary(GeoBounds::new(-5.0, -5.0, 5.0, 5.0));
        v.pan(1000, -1000);
        assert_eq!(v.center(), Coordinate::new(5.0, 5.0));
    }

    #[test]
    fn test_zoom_limits() {
        let mut v = vp();
        v.zoom_out();
        assert_eq!(v.zoom, 2.0);
        for _ in 0..20 {
            v.zoom_in();
        }
        assert_eq!(v.zoom, 10.0);
    }

    #[test]
    fn test_zoom_at_keeps_point() {
        let mut v = vp();
        let before = v.unproject(150, 30);
        v.zoom_in_at(150, 30);
        let after = v.unproject(150, 30);
        assert!((before.0 - after.0).abs() < 1.0);
        assert!((before.1 - after.1).abs() < 1.0);
    }

    #[test]
    fn test_fit_point_hits_cap() {
        let v = vp();
        let kr = GeoBounds::new(36.0, 128.0, 36.0, 128.0);
        let (center, zoom) = v.fit_bounds(&kr, 5.0);
        assert_eq!(zoom, 5.0);
        assert!((center.lat - 36.0).abs() < 1e-9);
        assert_eq!(center.lon, 128.0);
    }

    #[test]
    fn test_fit_world_uses_min_zoom() {
        let v = vp();
        let (_, zoom) = v.fit_bounds(&GeoBounds::WORLD, 5.0);
        assert_eq!(zoom, 2.0);
    }
}
