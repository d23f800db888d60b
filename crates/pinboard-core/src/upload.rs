//! Image uploads for image pins.
//!
//! Uploading an image is the one deferred operation on the board: the bytes
//! are read and decoded off the mutation path, and the pin only changes once
//! decoding finishes. [`ImageLoads`] hands out one ticket per upload so a newer
//! upload for the same pin supersedes any load still in flight.

use crate::pin::PinId;
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::HashMap;
use std::io::Cursor;
use thiserror::Error;

/// Image decoding errors.
#[derive(Debug, Error)]
pub enum ImageError {
    #[error("Unsupported image format")]
    Unsupported,
    #[error("Failed to decode image: {0}")]
    Decode(String),
}

impl From<image::ImageError> for ImageError {
    fn from(err: image::ImageError) -> Self {
        ImageError::Decode(err.to_string())
    }
}

/// Image format accepted for upload.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImageFormat {
    Png,
    Jpeg,
    WebP,
    Gif,
}

impl ImageFormat {
    /// Get MIME type for this format.
    pub fn mime_type(&self) -> &'static str {
        match self {
            ImageFormat::Png => "image/png",
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Gif => "image/gif",
        }
    }

    /// Detect format from magic bytes.
    pub fn from_magic_bytes(data: &[u8]) -> Option<Self> {
        if data.len() < 4 {
            return None;
        }

        // PNG: 89 50 4E 47
        if data.starts_with(&[0x89, 0x50, 0x4E, 0x47]) {
            return Some(ImageFormat::Png);
        }

        // JPEG: FF D8 FF
        if data.starts_with(&[0xFF, 0xD8, 0xFF]) {
            return Some(ImageFormat::Jpeg);
        }

        // GIF: GIF8
        if data.starts_with(b"GIF8") {
            return Some(ImageFormat::Gif);
        }

        // WebP: RIFF....WEBP
        if data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP" {
            return Some(ImageFormat::WebP);
        }

        None
    }

    fn codec(self) -> image::ImageFormat {
        match self {
            ImageFormat::Png => image::ImageFormat::Png,
            ImageFormat::Jpeg => image::ImageFormat::Jpeg,
            ImageFormat::WebP => image::ImageFormat::WebP,
            ImageFormat::Gif => image::ImageFormat::Gif,
        }
    }
}

/// A decoded upload, ready to be stored on an image pin.
#[derive(Debug, Clone, PartialEq)]
pub struct DecodedImage {
    /// Natural width in pixels.
    pub width: u32,
    /// Natural height in pixels.
    pub height: u32,
    pub format: ImageFormat,
    /// `data:` URL embedding the original bytes.
    pub data_url: String,
}

/// Decode image bytes far enough to learn their format and dimensions.
pub fn decode_image(data: &[u8]) -> Result<DecodedImage, ImageError> {
    let format = ImageFormat::from_magic_bytes(data).ok_or(ImageError::Unsupported)?;
    let (width, height) =
        image::ImageReader::with_format(Cursor::new(data), format.codec()).into_dimensions()?;

    Ok(DecodedImage {
        width,
        height,
        format,
        data_url: format!("data:{};base64,{}", format.mime_type(), STANDARD.encode(data)),
    })
}

/// Handle for one in-flight image load.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LoadTicket {
    pub pin_id: PinId,
    generation: u64,
}

/// Tracks in-flight image loads, at most one live load per pin.
#[derive(Debug, Default)]
pub struct ImageLoads {
    current: HashMap<PinId, u64>,
    generation: u64,
}

impl ImageLoads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a load for `pin_id`, superseding any load already running for it.
    pub fn begin(&mut self, pin_id: PinId) -> LoadTicket {
        self.generation += 1;
        if self.current.insert(pin_id, self.generation).is_some() {
            log::debug!("Image load for pin {} superseded", pin_id);
        }
        LoadTicket {
            pin_id,
            generation: self.generation,
        }
    }

    /// Whether `ticket` is still the live load for its pin.
    pub fn is_current(&self, ticket: &LoadTicket) -> bool {
        self.current.get(&ticket.pin_id) == Some(&ticket.generation)
    }

    /// Finish a load. Returns true only if its result should be applied.
    pub fn finish(&mut self, ticket: LoadTicket) -> bool {
        if !self.is_current(&ticket) {
            log::debug!("Dropping stale image load for pin {}", ticket.pin_id);
            return false;
        }
        self.current.remove(&ticket.pin_id);
        true
    }

    /// Cancel the live load for `pin_id`, if any.
    pub fn cancel(&mut self, pin_id: PinId) -> bool {
        self.current.remove(&pin_id).is_some()
    }

    /// Whether a load is in flight for `pin_id`.
    pub fn is_pending(&self, pin_id: PinId) -> bool {
        self.current.contains_key(&pin_id)
    }

    /// Drop every load whose pin fails `keep`. Returns how many were dropped.
    pub fn retain(&mut self, mut keep: impl FnMut(PinId) -> bool) -> usize {
        let before = self.current.len();
        self.current.retain(|&pin_id, _| keep(pin_id));
        before - self.current.len()
    }

    pub fn pending_count(&self) -> usize {
        self.current.len()
    }
}
