//! WebAssembly entry point and bindings for the page script.

use crate::App;
use kurbo::Size;
use pinboard_core::storage::{LocalStorage, create_default_storage};
use pinboard_core::{LoadTicket, Pin, PinKind};
use serde::Serialize;
use wasm_bindgen::prelude::*;

/// Initialize logging and panic reporting.
#[wasm_bindgen(start)]
pub fn start() {
    // Set up panic hook for better error messages
    console_error_panic_hook::set_once();

    // Initialize logging
    console_log::init_with_level(log::Level::Info).expect("Failed to initialize logger");

    log::info!("Starting Pinboard (WASM)");
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsValue> {
    let serializer = serde_wasm_bindgen::Serializer::json_compatible();
    value.serialize(&serializer).map_err(Into::into)
}

fn js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct ViewportView {
    zoom: f64,
    pan_x: f64,
    pan_y: f64,
}

#[derive(Serialize)]
struct SnapshotView {
    name: String,
    date: String,
    pins: usize,
}

/// Pending image upload handed to the page.
#[wasm_bindgen]
pub struct UploadTicket(LoadTicket);

/// The board as seen from JavaScript.
#[wasm_bindgen]
pub struct WebBoard {
    app: App<LocalStorage>,
}

#[wasm_bindgen]
impl WebBoard {
    /// Open the board saved in localStorage.
    #[wasm_bindgen(constructor)]
    pub fn new(width: f64, height: f64) -> Result<WebBoard, JsValue> {
        let storage = create_default_storage().map_err(js_error)?;
        Ok(Self {
            app: App::new(storage, Size::new(width, height)),
        })
    }

    pub fn resize(&mut self, width: f64, height: f64) {
        self.app.resize(Size::new(width, height));
    }

    /// Add a pin of kind `"text"`, `"image"` or `"list"`.
    #[wasm_bindgen(js_name = addPin)]
    pub fn add_pin(&mut self, kind: &str) -> Result<u64, JsValue> {
        let kind: PinKind = kind.parse().map_err(js_error)?;
        Ok(self.app.add_pin(kind))
    }

    #[wasm_bindgen(js_name = movePin)]
    pub fn move_pin(&mut self, id: u64, x: f64, y: f64) -> bool {
        self.app.board_mut().move_pin(id, kurbo::Point::new(x, y))
    }

    #[wasm_bindgen(js_name = resizePin)]
    pub fn resize_pin(&mut self, id: u64, width: f64, height: f64) -> bool {
        self.app.board_mut().resize_pin(id, Size::new(width, height))
    }

    #[wasm_bindgen(js_name = setText)]
    pub fn set_text(&mut self, id: u64, text: &str) -> bool {
        self.app.board_mut().set_text(id, text)
    }

    #[wasm_bindgen(js_name = addTag)]
    pub fn add_tag(&mut self, id: u64, tag: &str) -> bool {
        self.app.board_mut().add_tag(id, tag)
    }

    #[wasm_bindgen(js_name = removeTag)]
    pub fn remove_tag(&mut self, id: u64, tag: &str) -> bool {
        self.app.board_mut().remove_tag(id, tag)
    }

    #[wasm_bindgen(js_name = addListItem)]
    pub fn add_list_item(&mut self, id: u64, text: &str) -> bool {
        self.app.board_mut().add_list_item(id, text)
    }

    #[wasm_bindgen(js_name = setListItemText)]
    pub fn set_list_item_text(&mut self, id: u64, index: usize, text: &str) -> bool {
        self.app.board_mut().set_list_item_text(id, index, text)
    }

    #[wasm_bindgen(js_name = toggleListItem)]
    pub fn toggle_list_item(&mut self, id: u64, index: usize) -> bool {
        self.app.board_mut().toggle_list_item(id, index)
    }

    #[wasm_bindgen(js_name = removeListItem)]
    pub fn remove_list_item(&mut self, id: u64, index: usize) -> bool {
        self.app.board_mut().remove_list_item(id, index)
    }

    #[wasm_bindgen(js_name = deletePin)]
    pub fn delete_pin(&mut self, id: u64) -> bool {
        self.app.delete_pin(id)
    }

    #[wasm_bindgen(js_name = duplicatePin)]
    pub fn duplicate_pin(&mut self, id: u64) -> Option<u64> {
        self.app.board_mut().duplicate_pin(id)
    }

    pub fn clear(&mut self) -> bool {
        self.app.clear()
    }

    pub fn undo(&mut self) -> bool {
        self.app.undo()
    }

    pub fn redo(&mut self) -> bool {
        self.app.redo()
    }

    #[wasm_bindgen(js_name = canUndo)]
    pub fn can_undo(&self) -> bool {
        self.app.board().can_undo()
    }

    #[wasm_bindgen(js_name = canRedo)]
    pub fn can_redo(&self) -> bool {
        self.app.board().can_redo()
    }

    /// Visible pins as plain objects in creation order.
    pub fn pins(&self) -> Result<JsValue, JsValue> {
        let pins: Vec<&Pin> = self.app.board().visible_pins().collect();
        to_js(&pins)
    }

    pub fn tags(&self) -> Result<JsValue, JsValue> {
        to_js(self.app.board().tags())
    }

    /// Select a filter tag; `"all"` clears it.
    #[wasm_bindgen(js_name = setFilter)]
    pub fn set_filter(&mut self, tag: &str) -> bool {
        self.app.select_filter(tag)
    }

    #[wasm_bindgen(js_name = activeFilter)]
    pub fn active_filter(&self) -> Option<String> {
        self.app.board().active_filter().map(str::to_string)
    }

    pub fn viewport(&self) -> Result<JsValue, JsValue> {
        let viewport = self.app.board().viewport();
        to_js(&ViewportView {
            zoom: viewport.zoom,
            pan_x: viewport.pan.x,
            pan_y: viewport.pan.y,
        })
    }

    pub fn wheel(&mut self, x: f64, y: f64, delta_y: f64) {
        self.app.wheel(x, y, delta_y);
    }

    #[wasm_bindgen(js_name = beginPan)]
    pub fn begin_pan(&mut self, x: f64, y: f64) {
        self.app.begin_pan(x, y);
    }

    #[wasm_bindgen(js_name = updatePan)]
    pub fn update_pan(&mut self, x: f64, y: f64) -> bool {
        self.app.update_pan(x, y)
    }

    #[wasm_bindgen(js_name = endPan)]
    pub fn end_pan(&mut self) {
        self.app.end_pan();
    }

    #[wasm_bindgen(js_name = zoomIn)]
    pub fn zoom_in(&mut self) {
        self.app.zoom_in();
    }

    #[wasm_bindgen(js_name = zoomOut)]
    pub fn zoom_out(&mut self) {
        self.app.zoom_out();
    }

    #[wasm_bindgen(js_name = resetZoom)]
    pub fn reset_zoom(&mut self) {
        self.app.reset_zoom();
    }

    pub fn fit(&mut self) {
        self.app.fit();
    }

    #[wasm_bindgen(js_name = saveSnapshot)]
    pub fn save_snapshot(&self, name: &str) -> Result<(), JsValue> {
        self.app
            .board()
            .save_snapshot(name)
            .map(|_| ())
            .map_err(js_error)
    }

    pub fn snapshots(&self) -> Result<JsValue, JsValue> {
        let views: Vec<SnapshotView> = self
            .app
            .board()
            .snapshots()
            .into_iter()
            .map(|s| SnapshotView {
                pins: s.pin_count(),
                date: s.date.to_rfc3339(),
                name: s.name,
            })
            .collect();
        to_js(&views)
    }

    #[wasm_bindgen(js_name = loadSnapshot)]
    pub fn load_snapshot(&mut self, index: usize) -> bool {
        self.app.load_snapshot(index)
    }

    #[wasm_bindgen(js_name = deleteSnapshot)]
    pub fn delete_snapshot(&self, index: usize) -> Result<bool, JsValue> {
        self.app.board().delete_snapshot(index).map_err(js_error)
    }

    #[wasm_bindgen(js_name = exportJson)]
    pub fn export_json(&self) -> Result<String, JsValue> {
        self.app.board().export_json().map_err(js_error)
    }

    #[wasm_bindgen(js_name = importJson)]
    pub fn import_json(&mut self, json: &str) -> Result<(), JsValue> {
        self.app.import_json(json).map_err(js_error)
    }

    pub fn theme(&self) -> String {
        self.app.preferences().theme().to_string()
    }

    #[wasm_bindgen(js_name = toggleTheme)]
    pub fn toggle_theme(&self) -> Result<String, JsValue> {
        self.app
            .preferences()
            .toggle_theme()
            .map(|theme| theme.to_string())
            .map_err(js_error)
    }

    #[wasm_bindgen(js_name = showOnboarding)]
    pub fn show_onboarding(&self) -> bool {
        self.app.show_onboarding()
    }

    #[wasm_bindgen(js_name = completeOnboarding)]
    pub fn complete_onboarding(&self) -> Result<(), JsValue> {
        self.app.preferences().complete_onboarding().map_err(js_error)
    }

    /// Start an image upload; pass the ticket back with the file's bytes.
    #[wasm_bindgen(js_name = beginImageUpload)]
    pub fn begin_image_upload(&mut self, id: u64) -> Option<UploadTicket> {
        self.app.begin_image_upload(id).map(UploadTicket)
    }

    #[wasm_bindgen(js_name = finishImageUpload)]
    pub fn finish_image_upload(&mut self, ticket: UploadTicket, bytes: &[u8]) -> Result<bool, JsValue> {
        self.app
            .finish_image_upload(ticket.0, bytes)
            .map_err(js_error)
    }
}
