//! Board state: pins, viewport, history and persistence.
//!
//! [`BoardState`] is the only way to change a board. Every edit runs the same
//! commit sequence: apply the change, record a history snapshot, write the
//! live board to storage, then rebuild the tag set. Undo and redo restore a
//! recorded snapshot without recording a new one.

use crate::config::BoardConfig;
use crate::factory::PinFactory;
use crate::history::{BoardSnapshot, History};
use crate::pin::{ListItem, Pin, PinBody, PinId, PinKind};
use crate::record::{BOARD_STATE_KEY, NamedSnapshot, StoredBoard, check_pin_ids};
use crate::snapshots::SnapshotStore;
use crate::storage::{KeyValueStore, StorageResult};
use crate::upload::DecodedImage;
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use std::collections::BTreeMap;
use std::sync::Arc;

/// Tag entry that matches every pin.
pub const ALL_TAG: &str = "all";

/// Padding around content when fitting the view.
const FIT_PADDING: f64 = 50.0;

/// The board being edited.
pub struct BoardState<S: KeyValueStore> {
    store: Arc<S>,
    snapshots: SnapshotStore<S>,
    config: BoardConfig,
    /// All pins, keyed and ordered by id.
    pins: BTreeMap<PinId, Pin>,
    /// "all" followed by every pin tag in first-seen order.
    tags: Vec<String>,
    /// Active filter tag; None shows everything.
    filter: Option<String>,
    viewport: Viewport,
    history: History,
    factory: PinFactory,
}

impl<S: KeyValueStore> BoardState<S> {
    /// Load the board from `store` with default configuration.
    pub fn load(store: Arc<S>) -> Self {
        Self::load_with_config(store, BoardConfig::default())
    }

    /// Load the board from `store`.
    ///
    /// Missing or corrupt data yields an empty board. Either way history
    /// starts with a single baseline entry for the loaded state. Unusable
    /// config values are replaced by their defaults.
    pub fn load_with_config(store: Arc<S>, config: BoardConfig) -> Self {
        let config = config.validated();
        let mut viewport = Viewport::with_bounds(config.min_zoom, config.max_zoom);
        let mut factory = PinFactory::new();
        let mut pins = BTreeMap::new();
        let mut discard_stored = false;

        match Self::read_stored(&store) {
            Ok(Some(board)) => {
                factory = PinFactory::starting_at(board.safe_next_id());
                viewport.set(board.zoom, Vec2::new(board.pan_x, board.pan_y));
                pins = board.pins;
                for pin in pins.values_mut() {
                    pin.enforce_min_size();
                }
                log::info!("Loaded board with {} pins", pins.len());
            }
            Ok(None) => log::info!("No saved board, starting empty"),
            Err(e) => {
                log::error!("Discarding unreadable board state: {}", e);
                discard_stored = true;
            }
        }

        let baseline = BoardSnapshot {
            pins: pins.clone(),
            zoom: viewport.zoom,
            pan_x: viewport.pan.x,
            pan_y: viewport.pan.y,
        };

        let mut state = Self {
            snapshots: SnapshotStore::new(Arc::clone(&store)),
            store,
            history: History::new(baseline, config.history_capacity),
            config,
            pins,
            tags: Vec::new(),
            filter: None,
            viewport,
            factory,
        };
        state.recompute_tags();

        if discard_stored {
            state.persist();
        }
        state
    }

    fn read_stored(store: &S) -> StorageResult<Option<StoredBoard>> {
        match store.get(BOARD_STATE_KEY)? {
            Some(raw) => Ok(Some(StoredBoard::from_json(&raw)?)),
            None => Ok(None),
        }
    }

    // --- Pins -------------------------------------------------------------

    /// Add an empty pin of `kind` with its top-left corner at `position`.
    ///
    /// A non-finite position is replaced by the origin.
    pub fn add_pin(&mut self, kind: PinKind, position: Point) -> PinId {
        let position = if position.is_finite() {
            position
        } else {
            log::warn!("Placing new pin at origin instead of {:?}", position);
            Point::ZERO
        };
        let pin = self.factory.create(kind, position);
        let id = pin.id;
        self.pins.insert(id, pin);
        log::debug!("Added {} pin {}", kind, id);
        self.commit();
        id
    }

    /// Apply `f` to a pin and commit.
    ///
    /// The pin keeps its id and minimum size whatever `f` does. Returns false,
    /// leaving the pin unchanged, if no pin has `id` or `f` leaves a
    /// non-finite position or size.
    pub fn update_pin<F>(&mut self, id: PinId, f: F) -> bool
    where
        F: FnOnce(&mut Pin),
    {
        self.edit_pin(id, |pin| {
            f(pin);
            true
        })
    }

    /// Apply `f` to a pin, committing only if it reports a change.
    fn edit_pin<F>(&mut self, id: PinId, f: F) -> bool
    where
        F: FnOnce(&mut Pin) -> bool,
    {
        let Some(current) = self.pins.get(&id) else {
            log::debug!("Ignoring edit of missing pin {}", id);
            return false;
        };
        let mut pin = current.clone();
        if !f(&mut pin) {
            return false;
        }
        pin.id = id;
        pin.enforce_min_size();
        if !pin.is_finite() {
            log::warn!("Rejecting non-finite geometry for pin {}", id);
            return false;
        }
        self.pins.insert(id, pin);
        self.commit();
        true
    }

    /// Move a pin's top-left corner to `position`.
    pub fn move_pin(&mut self, id: PinId, position: Point) -> bool {
        self.update_pin(id, |pin| {
            pin.x = position.x;
            pin.y = position.y;
        })
    }

    /// Resize a pin. Sizes below the pin's minimum are raised to it.
    pub fn resize_pin(&mut self, id: PinId, size: Size) -> bool {
        self.update_pin(id, |pin| {
            pin.width = size.width;
            pin.height = size.height;
        })
    }

    /// Replace a text pin's content.
    pub fn set_text(&mut self, id: PinId, text: &str) -> bool {
        self.edit_pin(id, |pin| match &mut pin.body {
            PinBody::Text { content } => {
                content.clear();
                content.push_str(text);
                true
            }
            _ => false,
        })
    }

    /// Tag a pin. Blank, duplicate and reserved tags are rejected.
    pub fn add_tag(&mut self, id: PinId, tag: &str) -> bool {
        if tag.trim() == ALL_TAG {
            return false;
        }
        self.edit_pin(id, |pin| pin.add_tag(tag))
    }

    pub fn remove_tag(&mut self, id: PinId, tag: &str) -> bool {
        self.edit_pin(id, |pin| pin.remove_tag(tag))
    }

    /// Append a checklist item to a list pin.
    pub fn add_list_item(&mut self, id: PinId, text: &str) -> bool {
        self.edit_pin(id, |pin| match pin.items_mut() {
            Some(items) => {
                items.push(ListItem::new(text));
                true
            }
            None => false,
        })
    }

    pub fn set_list_item_text(&mut self, id: PinId, index: usize, text: &str) -> bool {
        self.edit_pin(id, |pin| {
            match pin.items_mut().and_then(|items| items.get_mut(index)) {
                Some(item) => {
                    item.text = text.to_string();
                    true
                }
                None => false,
            }
        })
    }

    /// Flip an item's completed flag.
    pub fn toggle_list_item(&mut self, id: PinId, index: usize) -> bool {
        self.edit_pin(id, |pin| {
            match pin.items_mut().and_then(|items| items.get_mut(index)) {
                Some(item) => {
                    item.completed = !item.completed;
                    true
                }
                None => false,
            }
        })
    }

    pub fn remove_list_item(&mut self, id: PinId, index: usize) -> bool {
        self.edit_pin(id, |pin| match pin.items_mut() {
            Some(items) if index < items.len() => {
                items.remove(index);
                true
            }
            _ => false,
        })
    }

    /// Store a decoded image on an image pin.
    ///
    /// The pin grows to the image's natural size if it is smaller.
    pub fn set_image(&mut self, id: PinId, image: &DecodedImage) -> bool {
        self.edit_pin(id, |pin| match &mut pin.body {
            PinBody::Image {
                image_url,
                image_width,
                image_height,
            } => {
                *image_url = Some(image.data_url.clone());
                *image_width = Some(image.width);
                *image_height = Some(image.height);
                true
            }
            _ => false,
        })
    }

    /// Delete a pin, returning it.
    pub fn delete_pin(&mut self, id: PinId) -> Option<Pin> {
        let removed = self.pins.remove(&id)?;
        log::debug!("Deleted pin {}", id);
        self.commit();
        Some(removed)
    }

    /// Copy a pin next to the original under a fresh id.
    pub fn duplicate_pin(&mut self, id: PinId) -> Option<PinId> {
        let source = self.pins.get(&id)?;
        let offset = Vec2::new(self.config.duplicate_offset, self.config.duplicate_offset);
        let copy = self.factory.duplicate(source, source.position() + offset);
        let copy_id = copy.id;
        self.pins.insert(copy_id, copy);
        log::debug!("Duplicated pin {} as {}", id, copy_id);
        self.commit();
        Some(copy_id)
    }

    /// Remove every pin as a single undoable step.
    pub fn clear(&mut self) -> bool {
        if self.pins.is_empty() {
            return false;
        }
        self.pins.clear();
        log::debug!("Cleared board");
        self.commit();
        true
    }

    pub fn pin(&self, id: PinId) -> Option<&Pin> {
        self.pins.get(&id)
    }

    /// All pins in creation order.
    pub fn pins(&self) -> impl Iterator<Item = &Pin> {
        self.pins.values()
    }

    pub fn len(&self) -> usize {
        self.pins.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pins.is_empty()
    }

    /// Bounding box of all pins.
    pub fn bounds(&self) -> Option<Rect> {
        self.pins
            .values()
            .map(Pin::bounds)
            .reduce(|acc, bounds| acc.union(bounds))
    }

    // --- Tags and filtering ------------------------------------------------

    /// Tag set: "all" followed by each pin tag in first-seen order.
    pub fn tags(&self) -> &[String] {
        &self.tags
    }

    /// Show only pins tagged `tag`. `None` or "all" shows everything.
    ///
    /// Returns false, leaving the filter unchanged, for unknown tags.
    pub fn set_filter(&mut self, tag: Option<&str>) -> bool {
        match tag {
            None | Some(ALL_TAG) => {
                self.filter = None;
                true
            }
            Some(tag) if self.tags.iter().any(|t| t == tag) => {
                self.filter = Some(tag.to_string());
                true
            }
            Some(_) => false,
        }
    }

    pub fn active_filter(&self) -> Option<&str> {
        self.filter.as_deref()
    }

    /// Pins passing the active filter, in creation order.
    pub fn visible_pins(&self) -> impl Iterator<Item = &Pin> {
        let filter = self.filter.as_deref();
        self.pins
            .values()
            .filter(move |pin| filter.is_none_or(|tag| pin.has_tag(tag)))
    }

    fn recompute_tags(&mut self) {
        let mut tags = vec![ALL_TAG.to_string()];
        for tag in self.pins.values().flat_map(|pin| pin.tags.iter()) {
            if !tags.contains(tag) {
                tags.push(tag.clone());
            }
        }
        self.tags = tags;

        if let Some(filter) = &self.filter {
            if !self.tags.contains(filter) {
                log::debug!("Filter tag '{}' no longer in use, showing all", filter);
                self.filter = None;
            }
        }
    }

    // --- Viewport ------------------------------------------------------------

    pub fn viewport(&self) -> &Viewport {
        &self.viewport
    }

    /// Zoom to `zoom` around `cursor` (container coordinates).
    ///
    /// The viewport operations below return false, changing nothing, when
    /// given non-finite input.
    pub fn zoom_at(&mut self, cursor: Point, zoom: f64) -> bool {
        let changed = self.viewport.zoom_at(cursor, zoom);
        self.persist_if(changed)
    }

    /// Multiply the zoom by `factor` around `cursor`.
    pub fn zoom_by(&mut self, cursor: Point, factor: f64) -> bool {
        let changed = self.viewport.zoom_by(cursor, factor);
        self.persist_if(changed)
    }

    pub fn pan_by(&mut self, delta: Vec2) -> bool {
        let changed = self.viewport.pan_by(delta);
        self.persist_if(changed)
    }

    /// Set the pan offset directly.
    pub fn set_pan(&mut self, pan: Vec2) -> bool {
        let changed = self.viewport.set_pan(pan);
        self.persist_if(changed)
    }

    /// Back to 100% with no pan.
    pub fn reset_view(&mut self) {
        self.viewport.reset();
        self.persist();
    }

    /// Frame every pin inside a container of the given size.
    pub fn fit_to_content(&mut self, container: Size) -> bool {
        let changed = match self.bounds() {
            Some(bounds) => self.viewport.fit_to_bounds(bounds, container, FIT_PADDING),
            None => {
                self.viewport.reset();
                true
            }
        };
        self.persist_if(changed)
    }

    // --- History -------------------------------------------------------------

    /// Step back one edit. Returns false if there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        let Some(snapshot) = self.history.undo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        log::debug!("Undo to history entry {}", self.history.index());
        true
    }

    /// Step forward one edit. Returns false if there is nothing to redo.
    pub fn redo(&mut self) -> bool {
        let Some(snapshot) = self.history.redo().cloned() else {
            return false;
        };
        self.restore(snapshot);
        log::debug!("Redo to history entry {}", self.history.index());
        true
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    /// Deep copy of the pins and viewport.
    pub fn snapshot(&self) -> BoardSnapshot {
        BoardSnapshot {
            pins: self.pins.clone(),
            zoom: self.viewport.zoom,
            pan_x: self.viewport.pan.x,
            pan_y: self.viewport.pan.y,
        }
    }

    /// Replace the board with `snapshot` without recording history.
    fn restore(&mut self, snapshot: BoardSnapshot) {
        self.pins = snapshot.pins;
        self.viewport.set(snapshot.zoom, Vec2::new(snapshot.pan_x, snapshot.pan_y));
        self.recompute_tags();
        self.persist();
    }

    /// Replace the board with `snapshot` as a new, undoable edit.
    ///
    /// Fails, leaving the board untouched, if the snapshot holds ids out of
    /// range.
    fn replace(&mut self, snapshot: BoardSnapshot) -> StorageResult<()> {
        check_pin_ids(&snapshot.pins)?;
        self.pins = snapshot.pins;
        for (&id, pin) in self.pins.iter_mut() {
            pin.id = id;
            pin.enforce_min_size();
            self.factory.reserve_past(id);
        }
        self.viewport.set(snapshot.zoom, Vec2::new(snapshot.pan_x, snapshot.pan_y));
        self.commit();
        Ok(())
    }

    fn commit(&mut self) {
        self.history.record(self.snapshot());
        self.persist();
        self.recompute_tags();
    }

    // --- Persistence ---------------------------------------------------------

    fn persist_if(&self, changed: bool) -> bool {
        if changed {
            self.persist();
        }
        changed
    }

    /// The live board in its storage encoding.
    pub fn to_record(&self) -> StoredBoard {
        StoredBoard {
            pins: self.pins.clone(),
            zoom: self.viewport.zoom,
            pan_x: self.viewport.pan.x,
            pan_y: self.viewport.pan.y,
            next_pin_id: self.factory.next_id(),
        }
    }

    /// Write the live board to storage. Failures are logged, not returned:
    /// the in-memory board stays authoritative.
    fn persist(&self) {
        let result = self
            .to_record()
            .to_json()
            .map_err(Into::into)
            .and_then(|json| self.store.set(BOARD_STATE_KEY, &json));
        if let Err(e) = result {
            log::error!("Failed to persist board: {}", e);
        }
    }

    /// Id the next new pin will get.
    pub fn next_pin_id(&self) -> PinId {
        self.factory.next_id()
    }

    pub fn config(&self) -> &BoardConfig {
        &self.config
    }

    /// Export the board as a standalone JSON document.
    pub fn export_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(&self.to_record())
    }

    /// Replace the board with an exported document, as one undoable step.
    ///
    /// Malformed input leaves the board untouched.
    pub fn import_json(&mut self, json: &str) -> StorageResult<()> {
        let board = StoredBoard::from_json(json)?;
        self.factory.reserve_past(board.safe_next_id() - 1);
        log::info!("Imported board with {} pins", board.pins.len());
        self.replace(board.snapshot())
    }

    // --- Named snapshots -----------------------------------------------------

    /// Save the current board under `name`.
    pub fn save_snapshot(&self, name: &str) -> StorageResult<NamedSnapshot> {
        self.snapshots.save(name, self.snapshot())
    }

    /// All named snapshots, oldest first.
    pub fn snapshots(&self) -> Vec<NamedSnapshot> {
        self.snapshots.list()
    }

    /// Replace the board with a named snapshot, as one undoable step.
    pub fn load_snapshot(&mut self, index: usize) -> bool {
        let Some(snapshot) = self.snapshots.get(index) else {
            return false;
        };
        if let Err(e) = self.replace(snapshot.data) {
            log::warn!("Cannot load snapshot '{}': {}", snapshot.name, e);
            return false;
        }
        log::info!("Loaded snapshot '{}'", snapshot.name);
        true
    }

    pub fn delete_snapshot(&self, index: usize) -> StorageResult<bool> {
        self.snapshots.delete(index)
    }

    pub fn store(&self) -> &Arc<S> {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::snapshots::SnapshotStore;
    use crate::storage::{MemoryStorage, StorageError};
    use crate::upload::ImageFormat;
    use crate::viewport::MIN_ZOOM;

    const HUGE_ID_BOARD: &str = r#"{
        "pins": [[18446744073709551615, {"type": "text", "x": 0, "y": 0, "width": 300,
                  "height": 200, "created": "2024-01-01T00:00:00Z", "content": "big"}]],
        "zoom": 1, "panX": 0, "panY": 0, "nextPinId": 1
    }"#;

    fn new_board() -> BoardState<MemoryStorage> {
        BoardState::load(Arc::new(MemoryStorage::new()))
    }

    fn tags(board: &BoardState<MemoryStorage>) -> Vec<&str> {
        board.tags().iter().map(String::as_str).collect()
    }

    fn decoded(width: u32, height: u32) -> DecodedImage {
        DecodedImage {
            width,
            height,
            format: ImageFormat::Png,
            data_url: "data:image/png;base64,AAAA".to_string(),
        }
    }

    #[test]
    fn test_load_empty() {
        let board = new_board();
        assert!(board.is_empty());
        assert_eq!(board.history().len(), 1);
        assert_eq!(board.history().index(), 0);
        assert_eq!(tags(&board), vec!["all"]);
        assert!(!board.can_undo());
        assert!(!board.can_redo());
    }

    #[test]
    fn test_text_pin_tag_scenario() {
        let mut board = new_board();
        let id = board.add_pin(PinKind::Text, Point::new(100.0, 100.0));

        let pin = board.pin(id).unwrap();
        assert_eq!(pin.size(), Size::new(300.0, 200.0));

        assert!(board.add_tag(id, "work"));
        assert_eq!(tags(&board), vec!["all", "work"]);

        assert!(board.delete_pin(id).is_some());
        assert_eq!(tags(&board), vec!["all"]);
    }

    #[test]
    fn test_undo_all_then_redo_all() {
        let mut board = new_board();
        let mut states = vec![board.snapshot().pins];

        let text = board.add_pin(PinKind::Text, Point::new(0.0, 0.0));
        states.push(board.snapshot().pins);
        let list = board.add_pin(PinKind::List, Point::new(400.0, 0.0));
        states.push(board.snapshot().pins);
        board.set_text(text, "hello");
        states.push(board.snapshot().pins);
        board.add_list_item(list, "milk");
        states.push(board.snapshot().pins);
        board.toggle_list_item(list, 0);
        states.push(board.snapshot().pins);
        board.add_tag(text, "work");
        states.push(board.snapshot().pins);
        board.move_pin(text, Point::new(50.0, 75.0));
        states.push(board.snapshot().pins);
        board.delete_pin(list);
        states.push(board.snapshot().pins);

        let n = states.len() - 1;
        for expected in states.iter().rev().skip(1) {
            assert!(board.undo());
            assert_eq!(&board.snapshot().pins, expected);
        }
        assert!(board.is_empty());
        assert!(!board.undo());

        for expected in states.iter().skip(1) {
            assert!(board.redo());
            assert_eq!(&board.snapshot().pins, expected);
        }
        assert!(!board.redo());
        assert_eq!(board.history().len(), n + 1);
    }

    #[test]
    fn test_history_is_capped() {
        let mut board = new_board();
        for i in 0..60 {
            board.add_pin(PinKind::Text, Point::new(i as f64, 0.0));
        }
        assert_eq!(board.history().len(), 50);
        assert_eq!(board.history().index(), 49);

        let mut undos = 0;
        while board.undo() {
            undos += 1;
        }
        assert_eq!(undos, 49);
        assert_eq!(board.len(), 11);
    }

    #[test]
    fn test_edit_after_undo_discards_redo() {
        let mut board = new_board();
        let first = board.add_pin(PinKind::Text, Point::ZERO);
        let second = board.add_pin(PinKind::Text, Point::ZERO);
        assert!(board.undo());
        let third = board.add_pin(PinKind::List, Point::ZERO);

        // Baseline plus the two surviving edits
        assert_eq!(board.history().len(), 3);
        assert!(!board.can_redo());
        assert!(board.pin(second).is_none());

        assert!(board.undo());
        assert!(board.pin(first).is_some());
        assert!(board.pin(third).is_none());
        assert!(board.undo());
        assert!(board.is_empty());
        assert!(!board.undo());
    }

    #[test]
    fn test_shared_tag_survives_single_delete() {
        let mut board = new_board();
        let a = board.add_pin(PinKind::Text, Point::ZERO);
        let b = board.add_pin(PinKind::List, Point::ZERO);
        board.add_tag(a, "work");
        board.add_tag(b, "work");
        board.add_tag(b, "home");
        assert_eq!(tags(&board), vec!["all", "work", "home"]);

        board.delete_pin(b);
        assert_eq!(tags(&board), vec!["all", "work"]);
        board.delete_pin(a);
        assert_eq!(tags(&board), vec!["all"]);
    }

    #[test]
    fn test_storage_roundtrip() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = BoardState::load(Arc::clone(&storage));

        let text = board.add_pin(PinKind::Text, Point::new(10.0, 20.0));
        board.set_text(text, "remember the milk");
        board.add_tag(text, "errands");
        let list = board.add_pin(PinKind::List, Point::new(-300.0, 40.5));
        board.add_list_item(list, "eggs");
        board.toggle_list_item(list, 0);
        let image = board.add_pin(PinKind::Image, Point::new(0.0, 500.0));
        board.set_image(image, &decoded(120, 80));
        board.zoom_at(Point::new(200.0, 100.0), 1.75);

        let reloaded = BoardState::load(storage);
        assert_eq!(reloaded.snapshot(), board.snapshot());
        assert_eq!(reloaded.next_pin_id(), board.next_pin_id());
        assert_eq!(reloaded.tags(), board.tags());
        assert_eq!(reloaded.history().len(), 1);
    }

    #[test]
    fn test_corrupt_storage_falls_back_to_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(BOARD_STATE_KEY, "{ definitely not json").unwrap();

        let board = BoardState::load(Arc::clone(&storage));
        assert!(board.is_empty());
        assert_eq!(board.history().len(), 1);
        assert_eq!(tags(&board), vec!["all"]);

        // The corrupt value was replaced with a readable one
        let raw = storage.get(BOARD_STATE_KEY).unwrap().unwrap();
        assert!(StoredBoard::from_json(&raw).is_ok());
    }

    #[test]
    fn test_stale_next_id_is_repaired() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = BoardState::load(Arc::clone(&storage));
        board.add_pin(PinKind::Text, Point::ZERO);
        board.add_pin(PinKind::Text, Point::ZERO);

        let mut record = board.to_record();
        record.next_pin_id = 1;
        storage.set(BOARD_STATE_KEY, &record.to_json().unwrap()).unwrap();

        let mut reloaded = BoardState::load(storage);
        let id = reloaded.add_pin(PinKind::List, Point::ZERO);
        assert_eq!(id, 3);
        assert_eq!(reloaded.len(), 3);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut board = new_board();
        board.add_pin(PinKind::Text, Point::ZERO);
        let second = board.add_pin(PinKind::Text, Point::ZERO);
        board.delete_pin(second);
        assert_eq!(board.add_pin(PinKind::Text, Point::ZERO), 3);

        board.undo();
        board.undo();
        assert_eq!(board.add_pin(PinKind::Text, Point::ZERO), 4);
    }

    #[test]
    fn test_missing_pin_is_fail_soft() {
        let mut board = new_board();
        assert!(!board.update_pin(42, |pin| pin.x = 1.0));
        assert!(!board.move_pin(42, Point::ZERO));
        assert!(board.delete_pin(42).is_none());
        assert!(board.duplicate_pin(42).is_none());
        assert!(board.pin(42).is_none());
        assert_eq!(board.history().len(), 1);
    }

    #[test]
    fn test_wrong_kind_payload_edit_is_ignored() {
        let mut board = new_board();
        let text = board.add_pin(PinKind::Text, Point::ZERO);
        let list = board.add_pin(PinKind::List, Point::ZERO);
        let entries = board.history().len();

        assert!(!board.add_list_item(text, "nope"));
        assert!(!board.set_text(list, "nope"));
        assert!(!board.set_image(text, &decoded(10, 10)));
        assert!(!board.toggle_list_item(list, 0));
        assert!(!board.remove_list_item(list, 3));
        assert!(!board.add_tag(text, "all"));
        assert!(!board.add_tag(text, "  "));
        assert_eq!(board.history().len(), entries);
    }

    #[test]
    fn test_update_keeps_identity_and_min_size() {
        let mut board = new_board();
        let id = board.add_pin(PinKind::List, Point::ZERO);
        assert!(board.update_pin(id, |pin| {
            pin.id = 999;
            pin.width = 1.0;
        }));

        let pin = board.pin(id).unwrap();
        assert_eq!(pin.id, id);
        assert_eq!(pin.width, PinKind::List.min_size().width);
        assert!(board.pin(999).is_none());

        board.resize_pin(id, Size::new(10.0, 10.0));
        assert_eq!(board.pin(id).unwrap().size(), PinKind::List.min_size());
    }

    #[test]
    fn test_set_image_grows_to_natural_size() {
        let mut board = new_board();
        let id = board.add_pin(PinKind::Image, Point::ZERO);
        assert!(board.pin(id).unwrap().is_placeholder());

        assert!(board.set_image(id, &decoded(640, 120)));
        let pin = board.pin(id).unwrap();
        assert!(!pin.is_placeholder());
        assert_eq!(pin.size(), Size::new(640.0, 300.0));

        board.resize_pin(id, Size::new(200.0, 200.0));
        assert_eq!(board.pin(id).unwrap().size(), Size::new(640.0, 200.0));
    }

    #[test]
    fn test_list_item_editing() {
        let mut board = new_board();
        let id = board.add_pin(PinKind::List, Point::ZERO);
        board.add_list_item(id, "eggs");
        board.add_list_item(id, "");
        assert!(board.set_list_item_text(id, 1, "flour"));
        assert!(board.toggle_list_item(id, 0));
        assert!(board.remove_list_item(id, 1));

        let items = board.pin(id).unwrap().items().unwrap();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].text, "eggs");
        assert!(items[0].completed);
    }

    #[test]
    fn test_filter() {
        let mut board = new_board();
        let a = board.add_pin(PinKind::Text, Point::ZERO);
        let b = board.add_pin(PinKind::Text, Point::ZERO);
        board.add_tag(a, "work");

        assert!(!board.set_filter(Some("missing")));
        assert!(board.set_filter(Some("work")));
        assert_eq!(board.active_filter(), Some("work"));
        let visible: Vec<PinId> = board.visible_pins().map(|p| p.id).collect();
        assert_eq!(visible, vec![a]);

        assert!(board.set_filter(Some("all")));
        assert_eq!(board.visible_pins().count(), 2);

        board.set_filter(Some("work"));
        board.remove_tag(a, "work");
        assert_eq!(board.active_filter(), None);
        assert!(board.pin(b).is_some());
    }

    #[test]
    fn test_viewport_persists_without_history() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = BoardState::load(Arc::clone(&storage));
        board.zoom_by(Point::new(50.0, 50.0), 1.2);
        board.pan_by(Vec2::new(5.0, 5.0));

        assert_eq!(board.history().len(), 1);
        let viewport = board.viewport();
        assert!((viewport.zoom - 1.2).abs() < 1e-12);
        assert!((viewport.pan.x - -5.0).abs() < 1e-9);

        let reloaded = BoardState::load(storage);
        assert!((reloaded.viewport().zoom - 1.2).abs() < 1e-12);
        assert!((reloaded.viewport().pan.y - -5.0).abs() < 1e-9);
    }

    #[test]
    fn test_zoom_is_always_clamped() {
        let mut board = new_board();
        board.zoom_by(Point::ZERO, 1e9);
        assert_eq!(board.viewport().zoom, 3.0);
        board.zoom_at(Point::ZERO, -4.0);
        assert_eq!(board.viewport().zoom, 0.1);
    }

    #[test]
    fn test_undo_restores_viewport() {
        let mut board = new_board();
        board.add_pin(PinKind::Text, Point::ZERO);
        board.zoom_at(Point::ZERO, 2.0);
        board.add_pin(PinKind::Text, Point::ZERO);

        board.undo();
        assert_eq!(board.viewport().zoom, 1.0);
        board.redo();
        assert_eq!(board.viewport().zoom, 2.0);
    }

    #[test]
    fn test_duplicate_and_clear() {
        let mut board = new_board();
        let id = board.add_pin(PinKind::Text, Point::new(10.0, 10.0));
        board.add_tag(id, "copy-me");

        let copy = board.duplicate_pin(id).unwrap();
        let pin = board.pin(copy).unwrap();
        assert_eq!(pin.position(), Point::new(30.0, 30.0));
        assert_eq!(pin.tags, vec!["copy-me"]);

        assert!(board.clear());
        assert!(board.is_empty());
        assert!(!board.clear());
        assert!(board.undo());
        assert_eq!(board.len(), 2);
    }

    #[test]
    fn test_named_snapshot_load_is_undoable() {
        let mut board = new_board();
        board.add_pin(PinKind::Text, Point::ZERO);
        board.add_pin(PinKind::List, Point::ZERO);
        board.save_snapshot("two pins").unwrap();

        board.clear();
        let entries = board.history().len();

        assert!(board.load_snapshot(0));
        assert_eq!(board.len(), 2);
        assert_eq!(board.history().len(), entries + 1);
        assert_eq!(board.snapshots().len(), 1);

        assert!(board.undo());
        assert!(board.is_empty());
        assert!(!board.load_snapshot(7));
    }

    #[test]
    fn test_snapshot_load_reserves_ids() {
        let storage = Arc::new(MemoryStorage::new());
        let mut other = BoardState::load(Arc::new(MemoryStorage::new()));
        for _ in 0..5 {
            other.add_pin(PinKind::Text, Point::ZERO);
        }
        SnapshotStore::new(Arc::clone(&storage))
            .save("imported", other.snapshot())
            .unwrap();

        let mut board = BoardState::load(storage);
        assert!(board.load_snapshot(0));
        assert_eq!(board.add_pin(PinKind::List, Point::ZERO), 6);
    }

    #[test]
    fn test_delete_snapshot_leaves_history() {
        let mut board = new_board();
        board.add_pin(PinKind::Text, Point::ZERO);
        board.save_snapshot("a").unwrap();
        let entries = board.history().len();

        assert!(board.delete_snapshot(0).unwrap());
        assert!(board.snapshots().is_empty());
        assert_eq!(board.history().len(), entries);
    }

    #[test]
    fn test_export_import() {
        let mut source = new_board();
        let id = source.add_pin(PinKind::Text, Point::new(1.0, 2.0));
        source.set_text(id, "exported");
        let json = source.export_json().unwrap();

        let mut target = new_board();
        target.add_pin(PinKind::List, Point::ZERO);
        target.import_json(&json).unwrap();
        assert_eq!(target.snapshot().pins, source.snapshot().pins);
        assert!(target.next_pin_id() >= 2);

        assert!(target.undo());
        assert_eq!(target.len(), 1);
        assert_eq!(target.pins().next().unwrap().kind(), PinKind::List);
    }

    #[test]
    fn test_import_garbage_leaves_board() {
        let mut board = new_board();
        board.add_pin(PinKind::Text, Point::ZERO);
        let before = board.snapshot();

        assert!(board.import_json("[1, 2, 3]").is_err());
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.history().len(), 2);
    }

    #[test]
    fn test_fit_to_content() {
        let mut board = new_board();
        board.fit_to_content(Size::new(800.0, 600.0));
        assert_eq!(board.viewport().zoom, 1.0);

        board.add_pin(PinKind::Text, Point::new(0.0, 0.0));
        board.add_pin(PinKind::Text, Point::new(1700.0, 0.0));
        board.fit_to_content(Size::new(800.0, 600.0));
        assert!(board.viewport().zoom < 1.0);
        assert!(board.viewport().zoom >= 0.1);
    }

    #[test]
    fn test_non_finite_input_never_reaches_storage() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = BoardState::load(Arc::clone(&storage));
        let a = board.add_pin(PinKind::Text, Point::new(10.0, 20.0));
        board.add_pin(PinKind::List, Point::new(400.0, 0.0));
        let entries = board.history().len();

        assert!(!board.move_pin(a, Point::new(f64::NAN, 5.0)));
        assert!(!board.resize_pin(a, Size::new(f64::INFINITY, 200.0)));
        assert!(!board.update_pin(a, |pin| pin.y = f64::NEG_INFINITY));
        assert!(!board.set_pan(Vec2::new(f64::NAN, 0.0)));
        assert!(!board.pan_by(Vec2::new(0.0, f64::INFINITY)));
        assert!(!board.zoom_at(Point::new(f64::NAN, 0.0), 2.0));
        assert!(!board.zoom_by(Point::new(0.0, f64::INFINITY), 1.5));
        assert!(!board.fit_to_content(Size::new(f64::NAN, f64::INFINITY)));

        assert_eq!(board.history().len(), entries);
        assert_eq!(board.pin(a).unwrap().position(), Point::new(10.0, 20.0));

        let reloaded = BoardState::load(storage);
        assert_eq!(reloaded.len(), 2);
        assert_eq!(reloaded.snapshot(), board.snapshot());
    }

    #[test]
    fn test_non_finite_new_pin_lands_at_origin() {
        let storage = Arc::new(MemoryStorage::new());
        let mut board = BoardState::load(Arc::clone(&storage));
        let id = board.add_pin(PinKind::Text, Point::new(f64::NAN, 3.0));
        assert_eq!(board.pin(id).unwrap().position(), Point::ZERO);

        let reloaded = BoardState::load(storage);
        assert_eq!(reloaded.len(), 1);
    }

    #[test]
    fn test_import_rejects_out_of_range_ids() {
        let mut board = new_board();
        board.add_pin(PinKind::Text, Point::ZERO);
        let before = board.snapshot();

        assert!(matches!(
            board.import_json(HUGE_ID_BOARD),
            Err(StorageError::Serialization(_))
        ));
        assert_eq!(board.snapshot(), before);
        assert_eq!(board.history().len(), 2);
        assert_eq!(board.add_pin(PinKind::Text, Point::ZERO), 2);
    }

    #[test]
    fn test_out_of_range_ids_in_storage_fall_back_to_empty() {
        let storage = Arc::new(MemoryStorage::new());
        storage.set(BOARD_STATE_KEY, HUGE_ID_BOARD).unwrap();

        let mut board = BoardState::load(Arc::clone(&storage));
        assert!(board.is_empty());
        assert_eq!(board.history().len(), 1);
        assert_eq!(board.add_pin(PinKind::Text, Point::ZERO), 1);

        let raw = storage.get(BOARD_STATE_KEY).unwrap().unwrap();
        assert_eq!(StoredBoard::from_json(&raw).unwrap().pins.len(), 1);
    }

    #[test]
    fn test_snapshot_with_out_of_range_ids_is_not_loaded() {
        let storage = Arc::new(MemoryStorage::new());
        let mut pin = PinFactory::new().text(Point::ZERO);
        pin.id = PinId::MAX;
        let snapshot = BoardSnapshot {
            pins: BTreeMap::from([(PinId::MAX, pin)]),
            zoom: 1.0,
            pan_x: 0.0,
            pan_y: 0.0,
        };
        SnapshotStore::new(Arc::clone(&storage))
            .save("broken", snapshot)
            .unwrap();

        let mut board = BoardState::load(storage);
        assert!(!board.load_snapshot(0));
        assert!(board.is_empty());
        assert_eq!(board.history().len(), 1);
        assert_eq!(board.add_pin(PinKind::List, Point::ZERO), 1);
    }

    #[test]
    fn test_inconsistent_config_falls_back() {
        let config = BoardConfig {
            min_zoom: 5.0,
            ..BoardConfig::default()
        };
        let mut board = BoardState::load_with_config(Arc::new(MemoryStorage::new()), config);
        assert_eq!(board.config().min_zoom, MIN_ZOOM);

        assert!(board.zoom_by(Point::ZERO, 1.1));
        assert!((board.viewport().zoom - 1.1).abs() < 1e-12);
        board.zoom_by(Point::new(10.0, 10.0), 0.0);
        assert_eq!(board.viewport().zoom, MIN_ZOOM);
        assert!(board.viewport().pan.is_finite());
    }
}
