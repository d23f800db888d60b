//! Pinboard Application
//!
//! The application shell: owns the board and the controllers that drive it,
//! and exposes them to the browser page.

mod app;

pub use app::App;

#[cfg(target_arch = "wasm32")]
mod web;

#[cfg(target_arch = "wasm32")]
pub use web::{WebBoard, start};
