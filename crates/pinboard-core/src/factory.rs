//! Default-initialised pin construction.

use crate::pin::{Pin, PinBody, PinId, PinKind};
use chrono::Utc;
use kurbo::Point;

/// Builds new pins and hands out their ids.
///
/// The counter only ever moves forward: ids of deleted pins are never reused.
#[derive(Debug, Clone)]
pub struct PinFactory {
    next_id: PinId,
}

impl Default for PinFactory {
    fn default() -> Self {
        Self::new()
    }
}

impl PinFactory {
    /// Create a factory whose first pin gets id 1.
    pub fn new() -> Self {
        Self { next_id: 1 }
    }

    /// Create a factory resuming from a stored counter.
    pub fn starting_at(next_id: PinId) -> Self {
        Self {
            next_id: next_id.max(1),
        }
    }

    /// The id the next pin will receive.
    pub fn next_id(&self) -> PinId {
        self.next_id
    }

    /// Make sure future ids are strictly greater than `id`.
    pub fn reserve_past(&mut self, id: PinId) {
        if id >= self.next_id {
            self.next_id = id.saturating_add(1);
        }
    }

    fn allocate(&mut self) -> PinId {
        let id = self.next_id;
        self.next_id = id.saturating_add(1);
        id
    }

    /// Create an empty pin of `kind` with its top-left corner at `position`.
    pub fn create(&mut self, kind: PinKind, position: Point) -> Pin {
        let size = kind.default_size();
        Pin {
            id: self.allocate(),
            x: position.x,
            y: position.y,
            width: size.width,
            height: size.height,
            tags: Vec::new(),
            created: Utc::now(),
            body: PinBody::empty(kind),
        }
    }

    pub fn text(&mut self, position: Point) -> Pin {
        self.create(PinKind::Text, position)
    }

    pub fn image(&mut self, position: Point) -> Pin {
        self.create(PinKind::Image, position)
    }

    pub fn list(&mut self, position: Point) -> Pin {
        self.create(PinKind::List, position)
    }

    /// Copy `source` under a fresh id and timestamp.
    pub fn duplicate(&mut self, source: &Pin, position: Point) -> Pin {
        Pin {
            id: self.allocate(),
            x: position.x,
            y: position.y,
            created: Utc::now(),
            ..source.clone()
        }
    }
}
