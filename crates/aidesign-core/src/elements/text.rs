//! Text elements with approximate metrics.

use super::SerializableColor;
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Glyph advance as a fraction of the font size.
const ADVANCE_FACTOR: f64 = 0.6;
/// Line height as a multiple of the font size.
const LINE_HEIGHT_FACTOR: f64 = 1.25;

/// Default font size for new text.
pub const DEFAULT_FONT_SIZE: f64 = 24.0;

/// Horizontal text alignment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TextAlign {
    #[default]
    Left,
    Center,
    Right,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TextData {
    pub content: String,
    pub font_size: f64,
    pub font_family: String,
    pub color: SerializableColor,
    #[serde(default)]
    pub align: TextAlign,
}

impl TextData {
    pub fn new(content: impl Into<String>, font_size: f64) -> Self {
        Self {
            content: content.into(),
            font_size,
            font_family: "Inter".to_string(),
            color: SerializableColor::black(),
            align: TextAlign::default(),
        }
    }

    /// Box size for the current content and font size.
    pub fn metrics(&self) -> Size {
        text_metrics(&self.content, self.font_size)
    }

    /// Height of a single line.
    pub fn line_height(&self) -> f64 {
        self.font_size * LINE_HEIGHT_FACTOR
    }
}

/// Approximate the box size of `content` at `font_size`.
///
/// The longest line determines the width. Empty content still occupies one
/// glyph cell so the caret stays visible while editing.
pub fn text_metrics(content: &str, font_size: f64) -> Size {
    let mut lines = 0usize;
    let mut longest = 0usize;
    for line in content.split('\n') {
        lines += 1;
        longest = longest.max(line.chars().count());
    }
    Size::new(
        longest.max(1) as f64 * font_size * ADVANCE_FACTOR,
        lines.max(1) as f64 * font_size * LINE_HEIGHT_FACTOR,
    )
}
