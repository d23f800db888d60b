//! Board tunables.

use crate::viewport::{MAX_ZOOM, MIN_ZOOM};
use serde::{Deserialize, Serialize};

/// Default number of undo states to keep.
pub const DEFAULT_HISTORY_CAPACITY: usize = 50;

/// Default zoom multiplier for one wheel notch or toolbar click.
pub const DEFAULT_ZOOM_STEP: f64 = 1.1;

/// Configuration for a [`BoardState`](crate::BoardState).
///
/// Every field has a default, so a partial JSON object is a valid config.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Maximum number of history entries, including the current one.
    pub history_capacity: usize,
    pub min_zoom: f64,
    pub max_zoom: f64,
    /// Zoom multiplier applied per wheel notch.
    pub zoom_step: f64,
    /// Offset applied to duplicated pins, in board units.
    pub duplicate_offset: f64,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            history_capacity: DEFAULT_HISTORY_CAPACITY,
            min_zoom: MIN_ZOOM,
            max_zoom: MAX_ZOOM,
            zoom_step: DEFAULT_ZOOM_STEP,
            duplicate_offset: 20.0,
        }
    }
}

impl BoardConfig {
    /// Parse a config from JSON, filling missing fields with defaults.
    ///
    /// Out-of-range values are replaced as described in [`BoardConfig::validated`].
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str::<Self>(json).map(Self::validated)
    }

    /// Replace unusable values with their defaults.
    ///
    /// Zoom bounds must be finite, positive and ordered; they are reset as a
    /// pair. The zoom step must be finite and positive, the duplicate offset
    /// finite, and the history must hold at least one entry.
    pub fn validated(mut self) -> Self {
        let defaults = Self::default();

        let bounds_ok = self.min_zoom.is_finite()
            && self.max_zoom.is_finite()
            && self.min_zoom > 0.0
            && self.min_zoom <= self.max_zoom;
        if !bounds_ok {
            log::warn!(
                "Invalid zoom bounds [{}, {}], using defaults",
                self.min_zoom,
                self.max_zoom
            );
            self.min_zoom = defaults.min_zoom;
            self.max_zoom = defaults.max_zoom;
        }

        if !(self.zoom_step.is_finite() && self.zoom_step > 0.0) {
            log::warn!("Invalid zoom step {}, using default", self.zoom_step);
            self.zoom_step = defaults.zoom_step;
        }

        if !self.duplicate_offset.is_finite() {
            log::warn!("Invalid duplicate offset {}, using default", self.duplicate_offset);
            self.duplicate_offset = defaults.duplicate_offset;
        }

        if self.history_capacity == 0 {
            log::warn!("History capacity 0, using default");
            self.history_capacity = defaults.history_capacity;
        }

        self
    }
}
