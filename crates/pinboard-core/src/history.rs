//! Linear undo/redo history.
//!
//! History is a window of board snapshots with a cursor. Recording after an
//! undo drops the redo tail. Once the window is full the oldest entry is
//! evicted and the cursor stays on the newest one.

use crate::pin::{Pin, PinId};
use crate::record::pin_entries;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A deep copy of the board at one point in time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoardSnapshot {
    #[serde(with = "pin_entries")]
    pub pins: BTreeMap<PinId, Pin>,
    pub zoom: f64,
    pub pan_x: f64,
    pub pan_y: f64,
}

/// Bounded history of board snapshots.
#[derive(Debug, Clone)]
pub struct History {
    entries: Vec<BoardSnapshot>,
    index: usize,
    capacity: usize,
}

impl History {
    /// Start a history whose only entry is `baseline`.
    pub fn new(baseline: BoardSnapshot, capacity: usize) -> Self {
        Self {
            entries: vec![baseline],
            index: 0,
            capacity: capacity.max(1),
        }
    }

    /// Record a new state after the cursor.
    pub fn record(&mut self, snapshot: BoardSnapshot) {
        // Drop redo tail when branching off
        self.entries.truncate(self.index + 1);
        self.entries.push(snapshot);

        if self.entries.len() > self.capacity {
            self.entries.remove(0);
        } else {
            self.index += 1;
        }
    }

    /// Step back. Returns the state to restore, or None at the oldest entry.
    pub fn undo(&mut self) -> Option<&BoardSnapshot> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Step forward. Returns the state to restore, or None at the newest entry.
    pub fn redo(&mut self) -> Option<&BoardSnapshot> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn can_undo(&self) -> bool {
        self.index > 0
    }

    pub fn can_redo(&self) -> bool {
        self.index + 1 < self.entries.len()
    }

    /// The entry under the cursor.
    pub fn current(&self) -> Option<&BoardSnapshot> {
        self.entries.get(self.index)
    }

    /// Cursor position.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Number of retained entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}
