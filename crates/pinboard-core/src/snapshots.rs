//! Named snapshots saved by the user.
//!
//! Snapshots are kept as one ordered list under [`SNAPSHOTS_KEY`]. They have no
//! relation to undo history: saving, loading or deleting one never touches it.

use crate::history::BoardSnapshot;
use crate::record::{NamedSnapshot, SNAPSHOTS_KEY};
use crate::storage::{KeyValueStore, StorageResult};
use std::sync::Arc;

/// CRUD access to the persisted snapshot list.
pub struct SnapshotStore<S: KeyValueStore> {
    store: Arc<S>,
}

impl<S: KeyValueStore> SnapshotStore<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// All snapshots, oldest first.
    ///
    /// An unreadable or corrupt list is logged and treated as empty.
    pub fn list(&self) -> Vec<NamedSnapshot> {
        let raw = match self.store.get(SNAPSHOTS_KEY) {
            Ok(Some(raw)) => raw,
            Ok(None) => return Vec::new(),
            Err(e) => {
                log::error!("Failed to read snapshots: {}", e);
                return Vec::new();
            }
        };

        serde_json::from_str(&raw).unwrap_or_else(|e| {
            log::warn!("Discarding corrupt snapshot list: {}", e);
            Vec::new()
        })
    }

    /// Snapshot at `index`, if any.
    pub fn get(&self, index: usize) -> Option<NamedSnapshot> {
        self.list().into_iter().nth(index)
    }

    pub fn len(&self) -> usize {
        self.list().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Append a snapshot of `data` under `name`.
    ///
    /// A blank name becomes "Snapshot N". Returns the stored snapshot.
    pub fn save(&self, name: &str, data: BoardSnapshot) -> StorageResult<NamedSnapshot> {
        let mut snapshots = self.list();
        let name = match name.trim() {
            "" => format!("Snapshot {}", snapshots.len() + 1),
            trimmed => trimmed.to_string(),
        };

        let snapshot = NamedSnapshot::new(name, data);
        snapshots.push(snapshot.clone());
        self.write(&snapshots)?;

        log::info!("Saved snapshot '{}' ({} pins)", snapshot.name, snapshot.pin_count());
        Ok(snapshot)
    }

    /// Delete the snapshot at `index`. Returns false if there was none.
    pub fn delete(&self, index: usize) -> StorageResult<bool> {
        let mut snapshots = self.list();
        if index >= snapshots.len() {
            return Ok(false);
        }
        let removed = snapshots.remove(index);
        self.write(&snapshots)?;

        log::info!("Deleted snapshot '{}'", removed.name);
        Ok(true)
    }

    fn write(&self, snapshots: &[NamedSnapshot]) -> StorageResult<()> {
        let json = serde_json::to_string(snapshots)?;
        self.store.set(SNAPSHOTS_KEY, &json)
    }
}
