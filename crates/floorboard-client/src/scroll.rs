//! Scroll position controller
//!
//! Keeps a chat-style feed anchored at the newest message while letting the
//! resident scroll up through history without being pulled back down.
//!
//! Geometry is read through [`ScrollViewport`] every time it is needed and
//! never cached across a frame. Scroll events are coalesced with a single
//! pending-frame flag: the first event after a frame requests one, later
//! events are dropped until [`ScrollController::on_frame`] runs.

use tracing::trace;

/// Measured geometry of a scroll container
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScrollMetrics {
    pub scroll_top: f64,
    pub scroll_height: f64,
    pub client_height: f64,
}

impl ScrollMetrics {
    /// Largest valid offset; zero when content does not overflow
    pub fn max_scroll_top(&self) -> f64 {
        (self.scroll_height - self.client_height).max(0.0)
    }

    pub fn overflows(&self) -> bool {
        self.scroll_height > self.client_height
    }
}

/// A scroll container owned by the view layer
pub trait ScrollViewport {
    /// Current geometry, or `None` if the container has not been laid out yet
    fn measure(&self) -> Option<ScrollMetrics>;

    /// Move the scroll offset. Implementations clamp to the valid range.
    fn set_scroll_top(&mut self, offset: f64);
}

/// Derived pin state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PinState {
    pub pinned_to_bottom: bool,
    pub show_jump_to_bottom: bool,
}

impl Default for PinState {
    fn default() -> Self {
        Self {
            pinned_to_bottom: true,
            show_jump_to_bottom: false,
        }
    }
}

impl PinState {
    pub fn from_metrics(metrics: &ScrollMetrics, threshold: f64) -> Self {
        let pinned_to_bottom =
            metrics.scroll_top + metrics.client_height >= metrics.scroll_height - threshold;
        Self {
            pinned_to_bottom,
            show_jump_to_bottom: !pinned_to_bottom && metrics.overflows(),
        }
    }
}

/// Whether the caller must schedule an animation frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameRequest {
    None,
    /// Call [`ScrollController::on_frame`] on the next frame
    Schedule,
}

/// Bottom-anchoring logic for one scroll container
#[derive(Debug)]
pub struct ScrollController<V> {
    viewport: Option<V>,
    threshold: f64,
    frame_pending: bool,
    pin: PinState,
}

impl<V: ScrollViewport> ScrollController<V> {
    pub fn new(threshold: f64) -> Self {
        Self {
            viewport: None,
            threshold,
            frame_pending: false,
            pin: PinState::default(),
        }
    }

    pub fn threshold(&self) -> f64 {
        self.threshold
    }

    /// Attach the container once it exists
    pub fn mount(&mut self, viewport: V) {
        self.viewport = Some(viewport);
        self.frame_pending = false;
        self.recheck();
    }

    /// Detach and return the container
    pub fn unmount(&mut self) -> Option<V> {
        self.frame_pending = false;
        self.pin = PinState::default();
        self.viewport.take()
    }

    pub fn is_mounted(&self) -> bool {
        self.viewport.is_some()
    }

    pub fn viewport(&self) -> Option<&V> {
        self.viewport.as_ref()
    }

    pub fn viewport_mut(&mut self) -> Option<&mut V> {
        self.viewport.as_mut()
    }

    /// Move to the maximum offset. No-op until mounted and measured.
    pub fn scroll_to_bottom(&mut self) {
        let Some(viewport) = self.viewport.as_mut() else {
            return;
        };
        let Some(metrics) = viewport.measure() else {
            return;
        };
        viewport.set_scroll_top(metrics.max_scroll_top());
    }

    /// A scroll event from the container.
    ///
    /// Returns [`FrameRequest::Schedule`] only for the first event since the
    /// last frame.
    pub fn on_scroll(&mut self) -> FrameRequest {
        self.request_frame()
    }

    /// A new snapshot has been rendered: snap to the newest message and
    /// re-check pin state once layout has settled on the next frame.
    pub fn on_data_arrived(&mut self) -> FrameRequest {
        self.scroll_to_bottom();
        self.request_frame()
    }

    /// The resident asked to jump to the newest message.
    pub fn jump_to_bottom(&mut self) {
        self.scroll_to_bottom();
        self.recheck();
    }

    /// The frame requested by [`on_scroll`](Self::on_scroll) or
    /// [`on_data_arrived`](Self::on_data_arrived) has arrived.
    pub fn on_frame(&mut self) {
        if !self.frame_pending {
            return;
        }
        self.frame_pending = false;
        self.recheck();
    }

    pub fn frame_pending(&self) -> bool {
        self.frame_pending
    }

    /// Computed from fresh geometry when the container is measurable.
    pub fn is_pinned_to_bottom(&self) -> bool {
        self.measure()
            .map(|m| PinState::from_metrics(&m, self.threshold).pinned_to_bottom)
            .unwrap_or(self.pin.pinned_to_bottom)
    }

    /// Whether the "jump to newest" affordance is visible
    pub fn show_jump_to_bottom(&self) -> bool {
        self.pin.show_jump_to_bottom
    }

    pub fn pin_state(&self) -> PinState {
        self.pin
    }

    fn measure(&self) -> Option<ScrollMetrics> {
        self.viewport.as_ref().and_then(ScrollViewport::measure)
    }

    fn request_frame(&mut self) -> FrameRequest {
        if self.viewport.is_none() || self.frame_pending {
            return FrameRequest::None;
        }
        self.frame_pending = true;
        FrameRequest::Schedule
    }

    fn recheck(&mut self) {
        if let Some(metrics) = self.measure() {
            self.pin = PinState::from_metrics(&metrics, self.threshold);
            trace!(
                scroll_top = metrics.scroll_top,
                scroll_height = metrics.scroll_height,
                pinned = self.pin.pinned_to_bottom,
                "scroll pin rechecked"
            );
        }
    }
}

/// An in-memory scroll container with instant layout
///
/// Used by the terminal front-end and by tests.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualViewport {
    metrics: Option<ScrollMetrics>,
}

impl VirtualViewport {
    /// A container that has not been laid out yet
    pub fn unmeasured() -> Self {
        Self::default()
    }

    pub fn new(scroll_height: f64, client_height: f64) -> Self {
        Self {
            metrics: Some(ScrollMetrics {
                scroll_top: 0.0,
                scroll_height,
                client_height,
            }),
        }
    }

    /// Replace the content height, keeping the offset in range
    pub fn set_content_height(&mut self, scroll_height: f64) {
        match self.metrics.as_mut() {
            Some(metrics) => {
                metrics.scroll_height = scroll_height;
                metrics.scroll_top = metrics.scroll_top.min(metrics.max_scroll_top());
            }
            None => {
                self.metrics = Some(ScrollMetrics {
                    scroll_top: 0.0,
                    scroll_height,
                    client_height: 0.0,
                });
            }
        }
    }

    /// Scroll by `delta` (negative is up)
    pub fn scroll_by(&mut self, delta: f64) {
        if let Some(top) = self.metrics.map(|m| m.scroll_top) {
            self.set_scroll_top(top + delta);
        }
    }
}

impl ScrollViewport for VirtualViewport {
    fn measure(&self) -> Option<ScrollMetrics> {
        self.metrics
    }

    fn set_scroll_top(&mut self, offset: f64) {
        if let Some(metrics) = self.metrics.as_mut() {
            metrics.scroll_top = offset.clamp(0.0, metrics.max_scroll_top());
        }
    }
}
