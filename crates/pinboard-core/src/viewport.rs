//! Viewport module for pan/zoom transforms.

use kurbo::{Affine, Point, Rect, Size, Vec2};

/// Smallest allowed zoom level.
pub const MIN_ZOOM: f64 = 0.1;
/// Largest allowed zoom level.
pub const MAX_ZOOM: f64 = 3.0;

/// Viewport manages the view transform for the board.
///
/// A board point `p` appears on screen at `p * zoom + pan`.
#[derive(Debug, Clone, PartialEq)]
pub struct Viewport {
    /// Current zoom level (1.0 = 100%)
    pub zoom: f64,
    /// Current translation offset in container coordinates
    pub pan: Vec2,
    /// Minimum allowed zoom level
    pub min_zoom: f64,
    /// Maximum allowed zoom level
    pub max_zoom: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            zoom: 1.0,
            pan: Vec2::ZERO,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
        }
    }
}

impl Viewport {
    /// Create a viewport at 100% with no pan.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a viewport with custom zoom bounds.
    ///
    /// Bounds that are not finite, positive and ordered are replaced by the
    /// defaults.
    pub fn with_bounds(min_zoom: f64, max_zoom: f64) -> Self {
        let valid = min_zoom.is_finite()
            && max_zoom.is_finite()
            && min_zoom > 0.0
            && min_zoom <= max_zoom;
        if !valid {
            log::warn!("Invalid zoom bounds [{}, {}], using defaults", min_zoom, max_zoom);
            return Self::default();
        }
        Self {
            min_zoom,
            max_zoom,
            ..Self::default()
        }
    }

    /// Clamp a zoom value to the allowed range.
    pub fn clamp_zoom(&self, zoom: f64) -> f64 {
        if zoom.is_nan() {
            return self.zoom;
        }
        zoom.max(self.min_zoom).min(self.max_zoom)
    }

    /// Set zoom and pan directly, clamping the zoom.
    ///
    /// A non-finite pan leaves the current pan in place.
    pub fn set(&mut self, zoom: f64, pan: Vec2) {
        self.zoom = self.clamp_zoom(zoom);
        if pan.is_finite() {
            self.pan = pan;
        }
    }

    /// Get the affine transform for rendering (board to screen).
    pub fn transform(&self) -> Affine {
        Affine::translate(self.pan) * Affine::scale(self.zoom)
    }

    /// Convert a container point to board coordinates.
    pub fn screen_to_board(&self, screen_point: Point) -> Point {
        Point::new(
            (screen_point.x - self.pan.x) / self.zoom,
            (screen_point.y - self.pan.y) / self.zoom,
        )
    }

    /// Convert a board point to container coordinates.
    pub fn board_to_screen(&self, board_point: Point) -> Point {
        Point::new(
            board_point.x * self.zoom + self.pan.x,
            board_point.y * self.zoom + self.pan.y,
        )
    }

    /// Set the pan offset. Returns false, leaving the pan alone, if `pan`
    /// is not finite.
    pub fn set_pan(&mut self, pan: Vec2) -> bool {
        if !pan.is_finite() {
            return false;
        }
        self.pan = pan;
        true
    }

    /// Pan the viewport by a delta in container coordinates.
    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        self.set_pan(self.pan + delta)
    }

    /// Zoom to `zoom`, keeping the board point under `cursor` fixed.
    ///
    /// The target is clamped before the ratio is taken, so the fixed point
    /// holds even when the request is out of range. Returns false, changing
    /// nothing, if the cursor is not finite.
    pub fn zoom_at(&mut self, cursor: Point, zoom: f64) -> bool {
        if !cursor.is_finite() {
            return false;
        }
        let new_zoom = self.clamp_zoom(zoom);
        let ratio = new_zoom / self.zoom;
        let cursor = cursor.to_vec2();
        let pan = cursor - (cursor - self.pan) * ratio;
        if !pan.is_finite() {
            return false;
        }
        self.pan = pan;
        self.zoom = new_zoom;
        true
    }

    /// Multiply the zoom by `factor` around `cursor`.
    pub fn zoom_by(&mut self, cursor: Point, factor: f64) -> bool {
        self.zoom_at(cursor, self.zoom * factor)
    }

    /// Reset to 100% with no pan.
    pub fn reset(&mut self) {
        self.zoom = 1.0;
        self.pan = Vec2::ZERO;
    }

    /// Fit the viewport to show the given board rectangle.
    ///
    /// Returns false, changing nothing, if the result would not be finite.
    pub fn fit_to_bounds(&mut self, bounds: Rect, container: Size, padding: f64) -> bool {
        if bounds.is_zero_area() {
            self.reset();
            return true;
        }

        let padded = Size::new(
            (container.width - padding * 2.0).max(1.0),
            (container.height - padding * 2.0).max(1.0),
        );

        let scale_x = padded.width / bounds.width();
        let scale_y = padded.height / bounds.height();
        let zoom = self.clamp_zoom(scale_x.min(scale_y));

        // Center the bounds in the container
        let bounds_center = bounds.center();
        let container_center = Point::new(container.width / 2.0, container.height / 2.0);
        let pan = Vec2::new(
            container_center.x - bounds_center.x * zoom,
            container_center.y - bounds_center.y * zoom,
        );

        if !pan.is_finite() {
            log::warn!("Ignoring fit to non-finite bounds {:?}", bounds);
            return false;
        }
        self.zoom = zoom;
        self.pan = pan;
        true
    }
}
