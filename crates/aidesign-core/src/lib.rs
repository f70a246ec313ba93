//! AI-Design Core Library
//!
//! Platform-agnostic canvas engine for the AI-Design infinite canvas:
//! the element model, geometry, frames, snapping, history and pointer
//! interaction. Rendering lives in `aidesign-render`.

pub mod bitmap;
pub mod canvas;
pub mod config;
pub mod elements;
pub mod error;
pub mod frames;
pub mod history;
pub mod input;
pub mod interaction;
pub mod selection;
pub mod snap;
pub mod store;
pub mod tools;
pub mod viewport;

pub use bitmap::{Bitmap, BitmapTicket};
pub use canvas::{Canvas, CanvasEvent, TextEditTarget};
pub use config::{ChromeInsets, EngineConfig};
pub use elements::{
    DEFAULT_FONT_SIZE, Element, ElementId, ElementKind, FrameData, ImageData, PathData, SerializableColor,
    ShapeData, ShapeType, TextAlign, TextData,
};
pub use error::{CanvasError, CanvasResult};
pub use hit_test::HitTarget;
pub use history::History;
pub use input::{InputState, KeyEvent, Modifiers, MouseButton, PointerEvent};
pub use interaction::Gesture;
pub use selection::{Corner, Edge, Handle, HandleKind};
pub use snap::{Guide, GuideAxis};
pub use store::ElementStore;
pub use tools::{CursorIcon, ToolKind};
pub use viewport::Viewport;
