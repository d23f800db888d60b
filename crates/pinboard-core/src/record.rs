//! Storage records and their JSON encoding.
//!
//! The board lives under [`BOARD_STATE_KEY`] and the named snapshots under
//! [`SNAPSHOTS_KEY`]. Pins are stored as a sequence of `[id, pin]` pairs.

use crate::history::BoardSnapshot;
use crate::pin::{MAX_PIN_ID, Pin, PinId};
use crate::storage::{StorageError, StorageResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Key of the live board record.
pub const BOARD_STATE_KEY: &str = "board_state";

/// Key of the named snapshot list.
pub const SNAPSHOTS_KEY: &str = "board_snapshots";

/// Serde adapter storing a pin map as `[[id, pin], ...]`.
pub mod pin_entries {
    use super::{Pin, PinId};
    use serde::{Deserialize, Deserializer, Serializer};
    use std::collections::BTreeMap;

    pub fn serialize<S>(pins: &BTreeMap<PinId, Pin>, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_seq(pins.iter())
    }

    /// Later duplicates of an id win; each pin's `id` is forced to its key.
    pub fn deserialize<'de, D>(deserializer: D) -> Result<BTreeMap<PinId, Pin>, D::Error>
    where
        D: Deserializer<'de>,
    {
        let entries = Vec::<(PinId, Pin)>::deserialize(deserializer)?;
        Ok(entries
            .into_iter()
            .map(|(id, mut pin)| {
                pin.id = id;
                (id, pin)
            })
            .collect())
    }
}

/// The persisted live board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StoredBoard {
    #[serde(with = "pin_entries")]
    pub pins: BTreeMap<PinId, Pin>,
    #[serde(default = "default_zoom")]
    pub zoom: f64,
    #[serde(default)]
    pub pan_x: f64,
    #[serde(default)]
    pub pan_y: f64,
    #[serde(default = "default_next_pin_id")]
    pub next_pin_id: PinId,
}

fn default_zoom() -> f64 {
    1.0
}

fn default_next_pin_id() -> PinId {
    1
}

impl StoredBoard {
    /// Serialize to the storage JSON encoding.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    /// Deserialize from the storage JSON encoding.
    ///
    /// Records whose ids are out of range are rejected like malformed JSON.
    pub fn from_json(json: &str) -> StorageResult<Self> {
        let board: Self = serde_json::from_str(json)?;
        check_pin_ids(&board.pins)?;
        if board.next_pin_id > MAX_PIN_ID + 1 {
            return Err(StorageError::Serialization(format!(
                "nextPinId {} out of range",
                board.next_pin_id
            )));
        }
        Ok(board)
    }

    /// Smallest id that is safe to hand out next.
    ///
    /// Repairs a stored counter that fell behind the pins it describes.
    pub fn safe_next_id(&self) -> PinId {
        let past_max = match self.pins.keys().next_back() {
            Some(id) => id.checked_add(1).unwrap_or(PinId::MAX),
            None => 1,
        };
        self.next_pin_id.max(past_max)
    }

    /// Board content without the id counter.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            pins: self.pins.clone(),
            zoom: self.zoom,
            pan_x: self.pan_x,
            pan_y: self.pan_y,
        }
    }
}

/// Reject pin maps holding ids the factory could never have issued.
pub fn check_pin_ids(pins: &BTreeMap<PinId, Pin>) -> StorageResult<()> {
    match pins.keys().find(|&&id| id == 0 || id > MAX_PIN_ID) {
        Some(id) => Err(StorageError::Serialization(format!(
            "pin id {} out of range",
            id
        ))),
        None => Ok(()),
    }
}

/// A user-named saved board, independent of undo history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NamedSnapshot {
    pub name: String,
    pub date: DateTime<Utc>,
    pub data: BoardSnapshot,
}

impl NamedSnapshot {
    pub fn new(name: impl Into<String>, data: BoardSnapshot) -> Self {
        Self {
            name: name.into(),
            date: Utc::now(),
            data,
        }
    }

    /// Number of pins captured.
    pub fn pin_count(&self) -> usize {
        self.data.pins.len()
    }
}
