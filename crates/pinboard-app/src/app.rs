//! Application context.
//!
//! [`App`] is constructed once by the page and passed to whatever renders the
//! board. There is no global board: everything reaches the state through it.

use kurbo::Size;
use pinboard_core::storage::KeyValueStore;
use pinboard_core::{
    BoardConfig, BoardState, ImageError, ImageLoads, LoadTicket, PinId, PinKind, Preferences,
    StorageResult, ToolbarController, ViewportController, decode_image,
};
use std::sync::Arc;

/// The running editor: board, preferences, controllers and image uploads.
pub struct App<S: KeyValueStore> {
    board: BoardState<S>,
    preferences: Preferences<S>,
    viewport: ViewportController,
    toolbar: ToolbarController,
    image_loads: ImageLoads,
}

impl<S: KeyValueStore> App<S> {
    /// Start the editor on `store` with a container of the given size.
    pub fn new(store: Arc<S>, container: Size) -> Self {
        Self::with_config(store, BoardConfig::default(), container)
    }

    pub fn with_config(store: Arc<S>, config: BoardConfig, container: Size) -> Self {
        let zoom_step = config.zoom_step;
        let preferences = Preferences::new(Arc::clone(&store));
        let board = BoardState::load_with_config(store, config);
        log::info!(
            "Pinboard ready: {} pins, theme {}",
            board.len(),
            preferences.theme()
        );

        Self {
            board,
            preferences,
            viewport: ViewportController::new(zoom_step),
            toolbar: ToolbarController::new(container, zoom_step),
            image_loads: ImageLoads::new(),
        }
    }

    pub fn board(&self) -> &BoardState<S> {
        &self.board
    }

    /// Direct access for pin edits.
    ///
    /// Pins removed through this are noticed at the next upload call; use
    /// the removal methods on `App` to cancel their uploads right away.
    pub fn board_mut(&mut self) -> &mut BoardState<S> {
        &mut self.board
    }

    pub fn preferences(&self) -> &Preferences<S> {
        &self.preferences
    }

    /// Whether the onboarding tour should be shown.
    pub fn show_onboarding(&self) -> bool {
        !self.preferences.onboarding_complete()
    }

    /// Container resized.
    pub fn resize(&mut self, container: Size) {
        self.toolbar.set_container_size(container);
    }

    // --- Toolbar -------------------------------------------------------------

    /// Add a pin of `kind` in the middle of the view.
    pub fn add_pin(&mut self, kind: PinKind) -> PinId {
        self.toolbar.add_pin(&mut self.board, kind)
    }

    pub fn zoom_in(&mut self) {
        self.toolbar.zoom_in(&mut self.board);
    }

    pub fn zoom_out(&mut self) {
        self.toolbar.zoom_out(&mut self.board);
    }

    pub fn reset_zoom(&mut self) {
        self.toolbar.reset_zoom(&mut self.board);
    }

    pub fn fit(&mut self) {
        self.toolbar.fit(&mut self.board);
    }

    pub fn undo(&mut self) -> bool {
        let undone = self.toolbar.undo(&mut self.board);
        self.prune_uploads();
        undone
    }

    pub fn redo(&mut self) -> bool {
        let redone = self.toolbar.redo(&mut self.board);
        self.prune_uploads();
        redone
    }

    pub fn select_filter(&mut self, tag: &str) -> bool {
        self.toolbar.select_filter(&mut self.board, tag)
    }

    // --- Viewport gestures ---------------------------------------------------

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        self.viewport
            .on_wheel(&mut self.board, kurbo::Point::new(x, y), delta_y);
    }

    pub fn begin_pan(&mut self, x: f64, y: f64) {
        self.viewport.begin_pan(&self.board, kurbo::Point::new(x, y));
    }

    pub fn update_pan(&mut self, x: f64, y: f64) -> bool {
        self.viewport
            .update_pan(&mut self.board, kurbo::Point::new(x, y))
    }

    pub fn end_pan(&mut self) {
        self.viewport.end_pan();
    }

    // --- Pins with side state ------------------------------------------------

    /// Delete a pin, cancelling any image upload still running for it.
    pub fn delete_pin(&mut self, id: PinId) -> bool {
        if self.image_loads.cancel(id) {
            log::debug!("Cancelled image upload for deleted pin {}", id);
        }
        self.board.delete_pin(id).is_some()
    }

    /// Remove every pin, cancelling their uploads.
    pub fn clear(&mut self) -> bool {
        let cleared = self.board.clear();
        self.prune_uploads();
        cleared
    }

    /// Replace the board with a named snapshot.
    pub fn load_snapshot(&mut self, index: usize) -> bool {
        let loaded = self.board.load_snapshot(index);
        self.prune_uploads();
        loaded
    }

    /// Replace the board with an exported document.
    pub fn import_json(&mut self, json: &str) -> StorageResult<()> {
        let result = self.board.import_json(json);
        self.prune_uploads();
        result
    }

    /// Cancel uploads whose pin has left the board.
    fn prune_uploads(&mut self) {
        let board = &self.board;
        let dropped = self.image_loads.retain(|id| board.pin(id).is_some());
        if dropped > 0 {
            log::debug!("Cancelled {} image uploads for removed pins", dropped);
        }
    }

    /// Start an upload for an image pin.
    ///
    /// Returns None for missing or non-image pins. Starting another upload
    /// for the same pin supersedes this one.
    pub fn begin_image_upload(&mut self, id: PinId) -> Option<LoadTicket> {
        self.prune_uploads();
        let pin = self.board.pin(id)?;
        if pin.kind() != PinKind::Image {
            return None;
        }
        Some(self.image_loads.begin(id))
    }

    /// Complete an upload with the file's bytes.
    ///
    /// Returns Ok(false) when the upload was superseded or cancelled, or the
    /// pin disappeared meanwhile.
    pub fn finish_image_upload(
        &mut self,
        ticket: LoadTicket,
        bytes: &[u8],
    ) -> Result<bool, ImageError> {
        self.prune_uploads();
        if !self.image_loads.is_current(&ticket) {
            log::debug!("Ignoring superseded upload for pin {}", ticket.pin_id);
            return Ok(false);
        }
        let decoded = decode_image(bytes);
        self.image_loads.finish(ticket);

        let decoded = decoded?;
        log::debug!(
            "Decoded {}x{} image for pin {}",
            decoded.width,
            decoded.height,
            ticket.pin_id
        );
        Ok(self.board.set_image(ticket.pin_id, &decoded))
    }

    /// Whether an upload is still running for `id`.
    pub fn is_uploading(&self, id: PinId) -> bool {
        self.image_loads.is_pending(id) && self.board.pin(id).is_some()
    }
}
