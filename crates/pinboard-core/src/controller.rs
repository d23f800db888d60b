//! Input controllers that turn user gestures into board mutations.

use crate::board::BoardState;
use crate::pin::{PinId, PinKind};
use crate::storage::KeyValueStore;
use kurbo::{Point, Size, Vec2};

/// In-progress drag of the board background.
#[derive(Debug, Clone, Copy)]
struct PanDrag {
    pointer_start: Point,
    pan_start: Vec2,
}

/// Wheel zoom and drag-to-pan on the board background.
#[derive(Debug, Clone)]
pub struct ViewportController {
    zoom_step: f64,
    drag: Option<PanDrag>,
}

impl ViewportController {
    pub fn new(zoom_step: f64) -> Self {
        Self {
            zoom_step,
            drag: None,
        }
    }

    /// Zoom toward `cursor` by one step. Negative `delta_y` (wheel up) zooms in.
    pub fn on_wheel<S: KeyValueStore>(&self, board: &mut BoardState<S>, cursor: Point, delta_y: f64) {
        if delta_y == 0.0 || delta_y.is_nan() {
            return;
        }
        let factor = if delta_y < 0.0 {
            self.zoom_step
        } else {
            1.0 / self.zoom_step
        };
        board.zoom_by(cursor, factor);
    }

    /// Start panning from `pointer`.
    pub fn begin_pan<S: KeyValueStore>(&mut self, board: &BoardState<S>, pointer: Point) {
        self.drag = Some(PanDrag {
            pointer_start: pointer,
            pan_start: board.viewport().pan,
        });
    }

    /// Follow the pointer. Does nothing unless a pan is in progress and
    /// `pointer` is finite.
    pub fn update_pan<S: KeyValueStore>(&mut self, board: &mut BoardState<S>, pointer: Point) -> bool {
        let Some(drag) = self.drag else {
            return false;
        };
        board.set_pan(drag.pan_start + (pointer - drag.pointer_start))
    }

    pub fn end_pan(&mut self) {
        self.drag = None;
    }

    pub fn is_panning(&self) -> bool {
        self.drag.is_some()
    }
}

/// Toolbar actions against a container of known size.
#[derive(Debug, Clone)]
pub struct ToolbarController {
    /// Size of the board's container in screen pixels.
    container: Size,
    zoom_step: f64,
}

impl ToolbarController {
    pub fn new(container: Size, zoom_step: f64) -> Self {
        Self {
            container,
            zoom_step,
        }
    }

    /// Update the container size after a resize.
    pub fn set_container_size(&mut self, container: Size) {
        self.container = container;
    }

    pub fn container_size(&self) -> Size {
        self.container
    }

    fn container_center(&self) -> Point {
        Point::new(self.container.width / 2.0, self.container.height / 2.0)
    }

    /// Add a pin of `kind` centred in the visible part of the board.
    pub fn add_pin<S: KeyValueStore>(&self, board: &mut BoardState<S>, kind: PinKind) -> PinId {
        let center = board.viewport().screen_to_board(self.container_center());
        let size = kind.default_size();
        let position = Point::new(center.x - size.width / 2.0, center.y - size.height / 2.0);
        board.add_pin(kind, position)
    }

    pub fn zoom_in<S: KeyValueStore>(&self, board: &mut BoardState<S>) {
        board.zoom_by(self.container_center(), self.zoom_step);
    }

    pub fn zoom_out<S: KeyValueStore>(&self, board: &mut BoardState<S>) {
        board.zoom_by(self.container_center(), 1.0 / self.zoom_step);
    }

    /// Back to 100%, keeping the centre of the view in place.
    pub fn reset_zoom<S: KeyValueStore>(&self, board: &mut BoardState<S>) {
        board.zoom_at(self.container_center(), 1.0);
    }

    /// Frame all pins.
    pub fn fit<S: KeyValueStore>(&self, board: &mut BoardState<S>) {
        board.fit_to_content(self.container);
    }

    pub fn undo<S: KeyValueStore>(&self, board: &mut BoardState<S>) -> bool {
        board.undo()
    }

    pub fn redo<S: KeyValueStore>(&self, board: &mut BoardState<S>) -> bool {
        board.redo()
    }

    /// Select a tag from the filter bar.
    pub fn select_filter<S: KeyValueStore>(&self, board: &mut BoardState<S>, tag: &str) -> bool {
        board.set_filter(Some(tag))
    }
}
