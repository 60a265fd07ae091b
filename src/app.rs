use std::cell::RefCell;
use std::rc::Rc;
use std::sync::mpsc::{Receiver, TryRecvError};
use std::time::Instant;

use glam::DVec2;
use visitmap::{
    ClickHandler, Cluster, Coordinate, CoordinateResolver, FitState, Hit, MapConfig, MapData,
    MapScene, ViewCommand, ViewRecommendation, ViewportAction, ViewportEvent, ViewportEvents,
    ViewportFitter, WorldBoundaries,
};

use crate::map::{cluster_at, DisplaySettings, Viewport};

/// Frames an animated fit takes (~300ms at 60fps)
const FLY_FRAMES: u32 = 20;

/// Boundary document lifecycle
pub enum BoundaryState {
    Loading,
    Ready(WorldBoundaries),
    Failed(String),
}

/// Eased camera move toward a fitted view
struct FlyTo {
    /// (lon, lat)
    from: DVec2,
    to: DVec2,
    from_zoom: f64,
    to_zoom: f64,
    frame: u32,
}

impl FlyTo {
    /// Position and zoom for the next frame, and whether the move is done
    fn step(&mut self) -> (DVec2, f64, bool) {
        self.frame += 1;
        let t = (self.frame as f64 / FLY_FRAMES as f64).min(1.0);
        let eased = 1.0 - (1.0 - t).powi(3);
        let pos = self.from.lerp(self.to, eased);
        let zoom = self.from_zoom + (self.to_zoom - self.from_zoom) * eased;
        (pos, zoom, self.frame >= FLY_FRAMES)
    }
}

/// Convert a terminal cell to braille pixel coordinates inside the border
fn cell_to_pixel(col: u16, row: u16) -> (i32, i32) {
    ((col.saturating_sub(1)) as i32 * 2, (row.saturating_sub(1)) as i32 * 4)
}

/// Braille pixel size of the map area for a terminal size
fn pixel_size(width: usize, height: usize) -> (usize, usize) {
    // 2 for border, plus 1 row for the status bar
    (width.saturating_sub(2) * 2, height.saturating_sub(3) * 4)
}

/// Application state
pub struct App {
    config: MapConfig,
    resolver: CoordinateResolver,
    data: MapData,
    pub scene: MapScene,
    fitter: ViewportFitter,
    events: ViewportEvents,
    clicks: ClickHandler,
    /// Last country reported through the click callback
    pub selected: Rc<RefCell<Option<String>>>,
    pub viewport: Viewport,
    pub settings: DisplaySettings,
    pub boundaries: BoundaryState,
    boundary_rx: Option<Receiver<visitmap::Result<WorldBoundaries>>>,
    fly_to: Option<FlyTo>,
    pub should_quit: bool,
    /// Last mouse position for drag tracking
    pub last_mouse: Option<(u16, u16)>,
    drag_moved: bool,
    /// Current mouse position for hover tooltips
    pub mouse_pos: Option<(u16, u16)>,
}

impl App {
    pub fn new(
        config: MapConfig,
        resolver: CoordinateResolver,
        data: MapData,
        boundary_rx: Receiver<visitmap::Result<WorldBoundaries>>,
        width: usize,
        height: usize,
    ) -> Self {
        let (pixel_width, pixel_height) = pixel_size(width, height);
        let viewport = Viewport::new(config.fallback, config.empty_zoom, pixel_width, pixel_height)
            .with_zoom_limits(config.min_zoom, config.max_zoom);

        let selected = Rc::new(RefCell::new(None));
        let sink = Rc::clone(&selected);
        let clicks = ClickHandler::new(move |code: &str| {
            log::info!("Selected country {}", code);
            *sink.borrow_mut() = Some(code.to_string());
        });

        let mut fitter = ViewportFitter::new(config.clone());
        let scene = MapScene::build(&data, &resolver, &config, &mut fitter);

        let mut app = Self {
            events: ViewportEvents::new(config.debounce_window()),
            config,
            resolver,
            data,
            scene,
            fitter,
            clicks,
            selected,
            viewport,
            settings: DisplaySettings::default(),
            boundaries: BoundaryState::Loading,
            boundary_rx: Some(boundary_rx),
            fly_to: None,
            should_quit: false,
            last_mouse: None,
            drag_moved: false,
            mouse_pos: None,
        };
        let view = *app.scene.view();
        app.apply_view(view);
        app
    }

    /// Replace the dataset and refit the view
    pub fn set_data(&mut self, data: MapData) {
        self.data = data;
        self.refit();
    }

    /// Rebuild the scene from the current data and fit to it again
    pub fn refit(&mut self) {
        self.scene = MapScene::build(&self.data, &self.resolver, &self.config, &mut self.fitter);
        self.events.clear();
        let view = *self.scene.view();
        self.apply_view(view);
    }

    fn apply_view(&mut self, view: ViewRecommendation) {
        self.viewport.set_pan_boundary(view.pan_boundary);
        self.fly_to = None;
        match view.command {
            ViewCommand::SetView { center, zoom } => self.viewport.set_view(center, zoom),
            ViewCommand::FitBounds {
                bounds,
                max_zoom,
                animate,
            } => {
                let (center, zoom) = self.viewport.fit_bounds(&bounds, max_zoom);
                if animate {
                    self.fly_to = Some(FlyTo {
                        from: DVec2::new(self.viewport.center_lon, self.viewport.center_lat),
                        to: DVec2::new(center.lon, center.lat),
                        from_zoom: self.viewport.zoom,
                        to_zoom: zoom,
                        frame: 0,
                    });
                } else {
                    self.viewport.set_view(center, zoom);
                }
            }
        }
    }

    /// Advance background work: boundary loading, animation, debounced events
    pub fn tick(&mut self, now: Instant) {
        self.poll_boundaries();

        if let Some(fly) = self.fly_to.as_mut() {
            let (pos, zoom, done) = fly.step();
            self.viewport.set_view(Coordinate::new(pos.y, pos.x), zoom);
            if done {
                self.fly_to = None;
                self.notify_zoom(now);
            }
        }

        for action in self.events.poll(now, &mut self.fitter) {
            match action {
                ViewportAction::InvalidateSize { width, height } => {
                    let (pixel_width, pixel_height) = pixel_size(width as usize, height as usize);
                    if self.fitter.take_size_invalidation() {
                        log::debug!("Map area now {}x{} px", pixel_width, pixel_height);
                    }
                    self.viewport.width = pixel_width;
                    self.viewport.height = pixel_height;
                }
                ViewportAction::SetPanBoundary(boundary) => {
                    self.viewport.set_pan_boundary(boundary);
                }
                ViewportAction::Deferred => {}
            }
        }
    }

    fn poll_boundaries(&mut self) {
        let Some(rx) = self.boundary_rx.as_ref() else {
            return;
        };
        let next = match rx.try_recv() {
            Ok(Ok(world)) => BoundaryState::Ready(world),
            Ok(Err(e)) => BoundaryState::Failed(e.to_string()),
            Err(TryRecvError::Empty) => return,
            Err(TryRecvError::Disconnected) => {
                BoundaryState::Failed("boundary loader stopped".to_string())
            }
        };
        self.clicks.set_enabled(matches!(next, BoundaryState::Ready(_)));
        self.boundaries = next;
        self.boundary_rx = None;
    }

    /// Earliest time `tick` has work to do
    pub fn next_deadline(&self) -> Option<Instant> {
        self.events.next_deadline()
    }

    /// Map interaction is only live once boundaries are loaded
    pub fn is_interactive(&self) -> bool {
        matches!(self.boundaries, BoundaryState::Ready(_))
    }

    pub fn world(&self) -> Option<&WorldBoundaries> {
        match &self.boundaries {
            BoundaryState::Ready(world) => Some(world),
            _ => None,
        }
    }

    /// Terminal resized; the map picks up the new size once resizing settles
    pub fn resize(&mut self, width: u16, height: u16, now: Instant) {
        self.events.on_viewport_event(ViewportEvent::Resized { width, height }, now);
    }

    fn notify_zoom(&mut self, now: Instant) {
        let zoom = self.viewport.zoom;
        self.events.on_viewport_event(ViewportEvent::ZoomEnd { zoom }, now);
    }

    /// Pan the map
    pub fn pan(&mut self, dx: i32, dy: i32) {
        if self.is_interactive() {
            self.fly_to = None;
            self.viewport.pan(dx, dy);
        }
    }

    pub fn zoom_in(&mut self, now: Instant) {
        if self.is_interactive() {
            self.fly_to = None;
            self.viewport.zoom_in();
            self.notify_zoom(now);
        }
    }

    pub fn zoom_out(&mut self, now: Instant) {
        if self.is_interactive() {
            self.fly_to = None;
            self.viewport.zoom_out();
            self.notify_zoom(now);
        }
    }

    /// Zoom in towards a screen position (terminal column/row)
    pub fn zoom_in_at(&mut self, col: u16, row: u16, now: Instant) {
        if self.is_interactive() {
            self.fly_to = None;
            let (px, py) = cell_to_pixel(col, row);
            self.viewport.zoom_in_at(px, py);
            self.notify_zoom(now);
        }
    }

    /// Zoom out from a screen position (terminal column/row)
    pub fn zoom_out_at(&mut self, col: u16, row: u16, now: Instant) {
        if self.is_interactive() {
            self.fly_to = None;
            let (px, py) = cell_to_pixel(col, row);
            self.viewport.zoom_out_at(px, py);
            self.notify_zoom(now);
        }
    }

    /// Request quit
    pub fn quit(&mut self) {
        self.should_quit = true;
    }

    pub fn begin_drag(&mut self, col: u16, row: u16) {
        self.last_mouse = Some((col, row));
        self.drag_moved = false;
    }

    /// Handle mouse drag
    pub fn handle_drag(&mut self, x: u16, y: u16) {
        if let Some((last_x, last_y)) = self.last_mouse {
            let dx = last_x as i32 - x as i32;
            let dy = last_y as i32 - y as i32;
            if dx != 0 || dy != 0 {
                self.drag_moved = true;
            }
            self.pan(dx * 2, dy * 4);
        }
        self.last_mouse = Some((x, y));
    }

    /// Button released: a press without movement is a click
    pub fn end_drag(&mut self, col: u16, row: u16) {
        if self.last_mouse.is_some() && !self.drag_moved {
            self.click(col, row);
        }
        self.last_mouse = None;
        self.drag_moved = false;
    }

    /// What lies under a terminal cell
    fn hit_at(&self, col: u16, row: u16) -> Hit {
        let (px, py) = cell_to_pixel(col, row);
        let clusters: &[Cluster] = if self.settings.show_clusters {
            self.scene.clusters()
        } else {
            &[]
        };
        match cluster_at(&self.viewport, clusters, px, py) {
            Some(index) => Hit::Cluster(index),
            None => {
                let (lon, lat) = self.viewport.unproject(px, py);
                Hit::Map(Coordinate::new(lat, lon))
            }
        }
    }

    /// Click at a terminal cell. Returns whether a country was reported.
    pub fn click(&mut self, col: u16, row: u16) -> bool {
        let hit = self.hit_at(col, row);
        let world = match &self.boundaries {
            BoundaryState::Ready(world) => Some(world),
            _ => None,
        };
        self.clicks.click(&self.scene, hit, world)
    }

    /// Update mouse cursor position
    pub fn set_mouse_pos(&mut self, col: u16, row: u16) {
        self.mouse_pos = Some((col, row));
    }

    /// Tooltip for whatever is under the mouse
    pub fn hover_tooltip(&self) -> Option<Vec<String>> {
        if !self.is_interactive() {
            return None;
        }
        let (col, row) = self.mouse_pos?;
        match self.hit_at(col, row) {
            Hit::Cluster(index) => self.scene.clusters().get(index).map(|c| c.tooltip()),
            Hit::Map(coord) => self
                .world()?
                .country_at(coord)
                .map(|shape| self.scene.region_tooltip(shape)),
        }
    }

    pub fn fit_state(&self) -> FitState {
        self.fitter.state()
    }

    /// Get current zoom level as a string
    pub fn zoom_level(&self) -> String {
        format!("z{:.0}", self.viewport.zoom)
    }

    /// Get current center coordinates as a string
    pub fn center_coords(&self) -> String {
        format!(
            "{:.1}°{}, {:.1}°{}",
            self.viewport.center_lat.abs(),
            if self.viewport.center_lat >= 0.0 { "N" } else { "S" },
            self.viewport.center_lon.abs(),
            if self.viewport.center_lon >= 0.0 { "E" } else { "W" }
        )
    }
}
