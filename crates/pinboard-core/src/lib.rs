//! Pinboard Core Library
//!
//! Platform-agnostic board state, undo history and persistence for the
//! Pinboard editor.

pub mod board;
pub mod config;
pub mod controller;
pub mod factory;
pub mod history;
pub mod pin;
pub mod preferences;
pub mod record;
pub mod snapshots;
pub mod storage;
pub mod upload;
pub mod viewport;

pub use board::{ALL_TAG, BoardState};
pub use config::BoardConfig;
pub use controller::{ToolbarController, ViewportController};
pub use factory::PinFactory;
pub use history::{BoardSnapshot, History};
pub use pin::{ListItem, Pin, PinBody, PinId, PinKind};
pub use preferences::{Preferences, Theme};
pub use record::{NamedSnapshot, StoredBoard};
pub use snapshots::SnapshotStore;
pub use storage::{KeyValueStore, MemoryStorage, StorageError, StorageResult};
pub use upload::{DecodedImage, ImageError, ImageFormat, ImageLoads, LoadTicket, decode_image};
pub use viewport::Viewport;
