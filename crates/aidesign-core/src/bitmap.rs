//! Decoded bitmaps and load tickets for image elements.

use crate::elements::ElementId;
use crate::error::{CanvasError, CanvasResult};
use base64::{Engine, engine::general_purpose::STANDARD};
use std::collections::HashMap;
use std::fmt;

/// A decoded RGBA8 image shared between element clones.
#[derive(Clone, PartialEq, Eq)]
pub struct Bitmap {
    pub width: u32,
    pub height: u32,
    /// Row-major RGBA8 pixels.
    pub pixels: Vec<u8>,
}

impl fmt::Debug for Bitmap {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Bitmap")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("bytes", &self.pixels.len())
            .finish()
    }
}

impl Bitmap {
    /// Decode PNG, JPEG or WebP bytes.
    pub fn decode(bytes: &[u8]) -> CanvasResult<Self> {
        let image = image::load_from_memory(bytes)?.to_rgba8();
        let (width, height) = image.dimensions();
        Ok(Self {
            width,
            height,
            pixels: image.into_raw(),
        })
    }
}

/// Decode a `data:<mime>;base64,<payload>` URL, or a bare base64 payload.
pub fn decode_data_url(src: &str) -> CanvasResult<Bitmap> {
    let payload = match src.strip_prefix("data:") {
        Some(rest) => {
            let (meta, payload) = rest
                .split_once(',')
                .ok_or_else(|| CanvasError::InvalidDataUrl("missing ',' separator".into()))?;
            if !meta.ends_with(";base64") {
                return Err(CanvasError::InvalidDataUrl(format!(
                    "unsupported encoding '{meta}'"
                )));
            }
            payload
        }
        None => src,
    };
    let bytes = STANDARD.decode(payload.trim())?;
    Bitmap::decode(&bytes)
}

/// Encode raw image bytes as a data URL.
pub fn encode_data_url(mime: &str, bytes: &[u8]) -> String {
    format!("data:{mime};base64,{}", STANDARD.encode(bytes))
}

/// Proof that a bitmap load was started for an element.
///
/// A ticket is only honored if it is the newest one issued for its element
/// and the element's `src` has not changed since.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BitmapTicket {
    pub element_id: ElementId,
    pub generation: u64,
    pub src: String,
}

/// Tracks the newest outstanding load per element.
#[derive(Debug, Default)]
pub struct BitmapLoads {
    next_generation: u64,
    current: HashMap<ElementId, u64>,
}

impl BitmapLoads {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a ticket, superseding any earlier ticket for the same element.
    pub fn issue(&mut self, element_id: ElementId, src: &str) -> BitmapTicket {
        self.next_generation += 1;
        self.current.insert(element_id, self.next_generation);
        BitmapTicket {
            element_id,
            generation: self.next_generation,
            src: src.to_string(),
        }
    }

    /// Consume a ticket. Returns false if a newer ticket was issued.
    pub fn complete(&mut self, ticket: &BitmapTicket) -> bool {
        match self.current.get(&ticket.element_id) {
            Some(&generation) if generation == ticket.generation => {
                self.current.remove(&ticket.element_id);
                true
            }
            _ => false,
        }
    }

    pub fn pending(&self) -> usize {
        self.current.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{ImageFormat, RgbaImage};
    use std::io::Cursor;
    use uuid::Uuid;

    fn png_bytes(width: u32, height: u32) -> Vec<u8> {
        let image = RgbaImage::from_pixel(width, height, image::Rgba([255, 0, 0, 255]));
        let mut bytes = Cursor::new(Vec::new());
        image.write_to(&mut bytes, ImageFormat::Png).unwrap();
        bytes.into_inner()
    }

    #[test]
    fn test_decode_png_data_url() {
        let url = encode_data_url("image/png", &png_bytes(3, 2));
        let bitmap = decode_data_url(&url).unwrap();
        assert_eq!((bitmap.width, bitmap.height), (3, 2));
        assert_eq!(bitmap.pixels.len(), 3 * 2 * 4);
        assert_eq!(&bitmap.pixels[0..4], &[255, 0, 0, 255]);
    }

    #[test]
    fn test_decode_bare_base64() {
        let raw = STANDARD.encode(png_bytes(1, 1));
        assert!(decode_data_url(&raw).is_ok());
    }

    #[test]
    fn test_rejects_non_base64_data_url() {
        let result = decode_data_url("data:image/svg+xml,<svg/>");
        assert!(matches!(result, Err(CanvasError::InvalidDataUrl(_))));
    }

    #[test]
    fn test_garbage_payload_fails() {
        let result = decode_data_url("data:image/png;base64,aGVsbG8=");
        assert!(matches!(result, Err(CanvasError::BitmapDecode(_))));
    }

    #[test]
    fn test_newer_ticket_supersedes_older() {
        let mut loads = BitmapLoads::new();
        let id = Uuid::new_v4();
        let first = loads.issue(id, "a");
        let second = loads.issue(id, "a");
        assert!(!loads.complete(&first));
        assert!(loads.complete(&second));
        assert_eq!(loads.pending(), 0);
    }
}
