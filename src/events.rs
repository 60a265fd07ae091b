//! Resize and zoom notifications from the rendering surface.
//!
//! Notifications are not acted on immediately. Each kind is coalesced by a
//! [`Debouncer`]: the latest value wins and fires once no newer notification
//! of that kind has arrived for the debounce window. Time is passed in
//! explicitly so the policy is deterministic under test.

use std::time::{Duration, Instant};

use crate::fit::ViewportFitter;
use crate::model::GeoBounds;

/// Trailing-edge timer coalescing for one kind of notification.
#[derive(Debug, Clone)]
pub struct Debouncer<T> {
    window: Duration,
    pending: Option<(Instant, T)>,
}

impl<T> Debouncer<T> {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            pending: None,
        }
    }

    /// Replace any pending value and restart the quiet window
    pub fn push(&mut self, value: T, now: Instant) {
        self.pending = Some((now + self.window, value));
    }

    /// Pending value once its window has elapsed
    pub fn poll(&mut self, now: Instant) -> Option<T> {
        match self.pending {
            Some((deadline, _)) if now >= deadline => self.pending.take().map(|(_, v)| v),
            _ => None,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.pending.as_ref().map(|(deadline, _)| *deadline)
    }

    pub fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    pub fn cancel(&mut self) {
        self.pending = None;
    }
}

/// Notification raised by the rendering surface
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportEvent {
    /// Container size changed (surface units)
    Resized { width: u16, height: u16 },
    /// A zoom gesture finished at `zoom`
    ZoomEnd { zoom: f64 },
}

/// What the surface should do in response
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ViewportAction {
    /// Queued; nothing to do yet
    Deferred,
    /// Recompute cached pixel dimensions for the new size
    InvalidateSize { width: u16, height: u16 },
    /// Replace the active pan boundary
    SetPanBoundary(GeoBounds),
}

/// Subscription point for surface notifications
#[derive(Debug, Clone)]
pub struct ViewportEvents {
    resize: Debouncer<(u16, u16)>,
    zoom: Debouncer<f64>,
}

impl ViewportEvents {
    pub fn new(window: Duration) -> Self {
        Self {
            resize: Debouncer::new(window),
            zoom: Debouncer::new(window),
        }
    }

    /// Accept a notification. Always deferred until [`poll`](Self::poll).
    pub fn on_viewport_event(&mut self, event: ViewportEvent, now: Instant) -> ViewportAction {
        match event {
            ViewportEvent::Resized { width, height } => self.resize.push((width, height), now),
            ViewportEvent::ZoomEnd { zoom } => self.zoom.push(zoom, now),
        }
        ViewportAction::Deferred
    }

    /// Fire every notification whose quiet window has elapsed
    pub fn poll(&mut self, now: Instant, fitter: &mut ViewportFitter) -> Vec<ViewportAction> {
        let mut actions = Vec::new();

        if let Some((width, height)) = self.resize.poll(now) {
            fitter.invalidate_size();
            actions.push(ViewportAction::InvalidateSize { width, height });
        }

        if let Some(zoom) = self.zoom.poll(now) {
            if let Some(boundary) = fitter.on_zoom(zoom) {
                log::debug!("Zoom {:.1} replaced pan boundary with {:?}", zoom, boundary);
                actions.push(ViewportAction::SetPanBoundary(boundary));
            }
        }

        actions
    }

    /// Earliest pending deadline, for choosing an event-loop timeout
    pub fn next_deadline(&self) -> Option<Instant> {
        match (self.resize.deadline(), self.zoom.deadline()) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        }
    }

    pub fn clear(&mut self) {
        self.resize.cancel();
        self.zoom.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::MapConfig;
    use crate::model::Coordinate;

    const WINDOW: Duration = Duration::from_millis(150);

    #[test]
    fn test_burst_coalesces_to_last() {
        let t0 = Instant::now();
        let mut d = Debouncer::new(WINDOW);
        d.push(1, t0);
        d.push(2, t0 + Duration::from_millis(50));
        d.push(3, t0 + Duration::from_millis(100));

        assert_eq!(d.poll(t0 + Duration::from_millis(200)), None);
        assert_eq!(d.poll(t0 + Duration::from_millis(250)), Some(3));
        assert_eq!(d.poll(t0 + Duration::from_millis(900)), None);
        assert!(!d.is_pending());
    }

    #[test]
    fn test_resize_invalidates_once() {
        let t0 = Instant::now();
        let mut fitter = ViewportFitter::new(MapConfig::default());
        let mut events = ViewportEvents::new(WINDOW);

        for i in 0..5u16 {
            let action = events.on_viewport_event(
                ViewportEvent::Resized {
                    width: 80 + i,
                    height: 24,
                },
                t0 + Duration::from_millis(i as u64 * 20),
            );
            assert_eq!(action, ViewportAction::Deferred);
        }
        assert!(events.poll(t0 + Duration::from_millis(100), &mut fitter).is_empty());

        let actions = events.poll(t0 + Duration::from_millis(300), &mut fitter);
        assert_eq!(
            actions,
            vec![ViewportAction::InvalidateSize {
                width: 84,
                height: 24
            }]
        );
        assert!(fitter.take_size_invalidation());
        assert!(events.next_deadline().is_none());
    }

    #[test]
    fn test_zoom_end_relaxes_boundary() {
        let t0 = Instant::now();
        let mut fitter = ViewportFitter::new(MapConfig::default());
        fitter.fit(&[Coordinate::new(36.0, 128.0)]);
        let mut events = ViewportEvents::new(WINDOW);

        events.on_viewport_event(ViewportEvent::ZoomEnd { zoom: 3.0 }, t0);
        events.on_viewport_event(ViewportEvent::ZoomEnd { zoom: 7.0 }, t0 + Duration::from_millis(10));
        assert_eq!(events.next_deadline(), Some(t0 + Duration::from_millis(160)));

        let actions = events.poll(t0 + Duration::from_millis(200), &mut fitter);
        assert_eq!(
            actions,
            vec![ViewportAction::SetPanBoundary(GeoBounds::new(
                30.0, 122.0, 42.0, 134.0
            ))]
        );
    }

    #[test]
    fn test_zoom_without_data_yields_nothing() {
        let t0 = Instant::now();
        let mut fitter = ViewportFitter::new(MapConfig::default());
        let mut events = ViewportEvents::new(WINDOW);
        events.on_viewport_event(ViewportEvent::ZoomEnd { zoom: 9.0 }, t0);
        assert!(events.poll(t0 + WINDOW, &mut fitter).is_empty());
    }
}
