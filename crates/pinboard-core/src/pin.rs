//! Pin definitions for the board.
//!
//! A pin is a freeform widget placed on the board. Every pin shares a common
//! frame (position, size, tags, creation time) and carries a kind-specific
//! payload in [`PinBody`].

use chrono::{DateTime, Utc};
use kurbo::{Point, Rect, Size};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Unique identifier for a pin. Assigned monotonically and never reused.
pub type PinId = u64;

/// Largest id a pin may carry: the largest integer a JavaScript number holds
/// exactly.
pub const MAX_PIN_ID: PinId = (1 << 53) - 1;

/// The kind of a pin, without its payload.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PinKind {
    Text,
    Image,
    List,
}

impl PinKind {
    /// Size a freshly created pin of this kind gets.
    pub fn default_size(self) -> Size {
        match self {
            PinKind::Text => Size::new(300.0, 200.0),
            PinKind::Image => Size::new(300.0, 300.0),
            PinKind::List => Size::new(300.0, 250.0),
        }
    }

    /// Smallest size a pin of this kind may be resized to.
    pub fn min_size(self) -> Size {
        match self {
            PinKind::Text => Size::new(150.0, 100.0),
            PinKind::Image => Size::new(100.0, 100.0),
            PinKind::List => Size::new(200.0, 150.0),
        }
    }

    /// Lowercase name used in storage.
    pub fn as_str(self) -> &'static str {
        match self {
            PinKind::Text => "text",
            PinKind::Image => "image",
            PinKind::List => "list",
        }
    }
}

impl fmt::Display for PinKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PinKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(PinKind::Text),
            "image" => Ok(PinKind::Image),
            "list" => Ok(PinKind::List),
            other => Err(format!("unknown pin kind: {other}")),
        }
    }
}

/// A single checklist entry.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct ListItem {
    pub text: String,
    #[serde(default)]
    pub completed: bool,
}

impl ListItem {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            completed: false,
        }
    }
}

/// Kind-specific payload of a pin.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum PinBody {
    Text {
        #[serde(default)]
        content: String,
    },
    Image {
        /// `data:` URL of the image, `None` while showing the placeholder.
        #[serde(rename = "imageUrl", default)]
        image_url: Option<String>,
        /// Natural width of the decoded image in pixels.
        #[serde(rename = "imageWidth", default)]
        image_width: Option<u32>,
        /// Natural height of the decoded image in pixels.
        #[serde(rename = "imageHeight", default)]
        image_height: Option<u32>,
    },
    List {
        #[serde(default)]
        items: Vec<ListItem>,
    },
}

impl PinBody {
    /// Empty payload for the given kind.
    pub fn empty(kind: PinKind) -> Self {
        match kind {
            PinKind::Text => PinBody::Text {
                content: String::new(),
            },
            PinKind::Image => PinBody::Image {
                image_url: None,
                image_width: None,
                image_height: None,
            },
            PinKind::List => PinBody::List { items: Vec::new() },
        }
    }

    pub fn kind(&self) -> PinKind {
        match self {
            PinBody::Text { .. } => PinKind::Text,
            PinBody::Image { .. } => PinKind::Image,
            PinBody::List { .. } => PinKind::List,
        }
    }
}

/// A widget on the board.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Pin {
    pub id: PinId,
    /// Left edge in board coordinates.
    pub x: f64,
    /// Top edge in board coordinates.
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Tags in insertion order, without duplicates.
    #[serde(default)]
    pub tags: Vec<String>,
    pub created: DateTime<Utc>,
    #[serde(flatten)]
    pub body: PinBody,
}

impl Pin {
    pub fn kind(&self) -> PinKind {
        self.body.kind()
    }

    /// Top-left corner.
    pub fn position(&self) -> Point {
        Point::new(self.x, self.y)
    }

    pub fn size(&self) -> Size {
        Size::new(self.width, self.height)
    }

    /// Bounding rectangle in board coordinates.
    pub fn bounds(&self) -> Rect {
        Rect::from_origin_size(self.position(), self.size())
    }

    /// Smallest size this pin may take.
    ///
    /// Image pins with a decoded image are additionally bounded by the
    /// natural image dimensions.
    pub fn min_size(&self) -> Size {
        let base = self.kind().min_size();
        match &self.body {
            PinBody::Image {
                image_width: Some(w),
                image_height: Some(h),
                ..
            } => Size::new(base.width.max(f64::from(*w)), base.height.max(f64::from(*h))),
            _ => base,
        }
    }

    /// Grow width/height to satisfy [`Pin::min_size`].
    pub fn enforce_min_size(&mut self) {
        let min = self.min_size();
        if self.width.is_nan() || self.width < min.width {
            self.width = min.width;
        }
        if self.height.is_nan() || self.height < min.height {
            self.height = min.height;
        }
    }

    /// Whether position and size are all finite numbers.
    ///
    /// JSON has no encoding for NaN or infinity, so a pin failing this check
    /// cannot be stored.
    pub fn is_finite(&self) -> bool {
        [self.x, self.y, self.width, self.height]
            .iter()
            .all(|v| v.is_finite())
    }

    pub fn has_tag(&self, tag: &str) -> bool {
        self.tags.iter().any(|t| t == tag)
    }

    /// Add a tag. Returns false for blank or duplicate tags.
    pub fn add_tag(&mut self, tag: &str) -> bool {
        let tag = tag.trim();
        if tag.is_empty() || self.has_tag(tag) {
            return false;
        }
        self.tags.push(tag.to_string());
        true
    }

    /// Remove a tag. Returns false if the pin did not carry it.
    pub fn remove_tag(&mut self, tag: &str) -> bool {
        let before = self.tags.len();
        self.tags.retain(|t| t != tag);
        self.tags.len() != before
    }

    /// Text content, for text pins.
    pub fn content(&self) -> Option<&str> {
        match &self.body {
            PinBody::Text { content } => Some(content),
            _ => None,
        }
    }

    /// Checklist items, for list pins.
    pub fn items(&self) -> Option<&[ListItem]> {
        match &self.body {
            PinBody::List { items } => Some(items),
            _ => None,
        }
    }

    /// Mutable checklist items, for list pins.
    pub fn items_mut(&mut self) -> Option<&mut Vec<ListItem>> {
        match &mut self.body {
            PinBody::List { items } => Some(items),
            _ => None,
        }
    }

    /// Whether an image pin has no image yet.
    pub fn is_placeholder(&self) -> bool {
        matches!(self.body, PinBody::Image { image_url: None, .. })
    }
}
