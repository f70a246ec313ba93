//! Raster image elements.

use crate::bitmap::Bitmap;
use kurbo::Size;
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// An image element.
///
/// The decoded bitmap is shared between clones and never serialized;
/// `src` is enough to re-hydrate it.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ImageData {
    #[serde(skip)]
    pub bitmap: Option<Arc<Bitmap>>,
    /// Source encoding, usually a `data:` URL.
    pub src: String,
    /// Original image width in pixels.
    pub natural_width: u32,
    /// Original image height in pixels.
    pub natural_height: u32,
}

impl ImageData {
    /// Create image data for a source that has not been decoded yet.
    pub fn new(src: impl Into<String>, natural_width: u32, natural_height: u32) -> Self {
        Self {
            bitmap: None,
            src: src.into(),
            natural_width,
            natural_height,
        }
    }

    /// Create image data with an already decoded bitmap.
    pub fn with_bitmap(src: impl Into<String>, bitmap: Arc<Bitmap>) -> Self {
        Self {
            natural_width: bitmap.width,
            natural_height: bitmap.height,
            bitmap: Some(bitmap),
            src: src.into(),
        }
    }

    pub fn natural_size(&self) -> Size {
        Size::new(self.natural_width as f64, self.natural_height as f64)
    }

    /// Display size that fits within `max_side` while preserving aspect ratio.
    /// Images already smaller than `max_side` keep their natural size.
    pub fn fit_within(&self, max_side: f64) -> Size {
        let natural = self.natural_size();
        let largest = natural.width.max(natural.height);
        if largest <= 0.0 {
            return Size::new(max_side, max_side);
        }
        if largest <= max_side {
            return natural;
        }
        let scale = max_side / largest;
        Size::new(natural.width * scale, natural.height * scale)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fit_within_preserves_aspect() {
        let data = ImageData::new("data:", 1200, 600);
        let size = data.fit_within(600.0);
        assert!((size.width - 600.0).abs() < f64::EPSILON);
        assert!((size.height - 300.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_small_images_keep_natural_size() {
        let data = ImageData::new("data:", 200, 100);
        assert_eq!(data.fit_within(600.0), Size::new(200.0, 100.0));
    }
}
