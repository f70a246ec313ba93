//! Tool system for the canvas.

use crate::elements::ShapeType;
use crate::selection::{Corner, Edge, HandleKind};
use serde::{Deserialize, Serialize};

/// Available tools.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum ToolKind {
    /// Select, move, resize and rotate.
    #[default]
    Move,
    /// Pan the viewport.
    Hand,
    Text,
    /// Drag out a vector shape.
    Shape(ShapeType),
    /// Freehand paths.
    Pencil,
    /// One-shot: create a frame and return to `Move`.
    Frame,
    /// One-shot: ask the host for an image and return to `Move`.
    Image,
}

impl ToolKind {
    /// Tools that act immediately instead of waiting for a gesture.
    pub fn is_one_shot(self) -> bool {
        matches!(self, ToolKind::Frame | ToolKind::Image)
    }

    /// Tools that create elements by dragging.
    pub fn is_drawing(self) -> bool {
        matches!(self, ToolKind::Shape(_) | ToolKind::Pencil)
    }

    /// Cursor shown over empty canvas.
    pub fn cursor(self) -> CursorIcon {
        match self {
            ToolKind::Move | ToolKind::Frame | ToolKind::Image => CursorIcon::Default,
            ToolKind::Hand => CursorIcon::Grab,
            ToolKind::Text => CursorIcon::Text,
            ToolKind::Shape(_) | ToolKind::Pencil => CursorIcon::Crosshair,
        }
    }

    /// Single-key shortcut (case-insensitive).
    pub fn from_shortcut(key: &str) -> Option<Self> {
        let tool = match key.to_ascii_lowercase().as_str() {
            "v" => ToolKind::Move,
            "h" => ToolKind::Hand,
            "t" => ToolKind::Text,
            "r" => ToolKind::Shape(ShapeType::Rectangle),
            "o" => ToolKind::Shape(ShapeType::Ellipse),
            "l" => ToolKind::Shape(ShapeType::Line),
            "p" => ToolKind::Pencil,
            "f" => ToolKind::Frame,
            "i" => ToolKind::Image,
            _ => return None,
        };
        Some(tool)
    }
}

/// Pointer cursor requested by the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum CursorIcon {
    #[default]
    Default,
    Move,
    Grab,
    Grabbing,
    Text,
    Crosshair,
    /// Top-left/bottom-right diagonal.
    NwseResize,
    /// Top-right/bottom-left diagonal.
    NeswResize,
    EwResize,
    NsResize,
    /// Rotation handle.
    Rotate,
}

impl CursorIcon {
    /// Cursor for hovering or dragging a handle.
    pub fn for_handle(kind: HandleKind) -> Self {
        match kind {
            HandleKind::Corner(Corner::TopLeft | Corner::BottomRight) => CursorIcon::NwseResize,
            HandleKind::Corner(Corner::TopRight | Corner::BottomLeft) => CursorIcon::NeswResize,
            HandleKind::Edge(Edge::Left | Edge::Right) => CursorIcon::EwResize,
            HandleKind::Edge(Edge::Top | Edge::Bottom) => CursorIcon::NsResize,
            HandleKind::Rotate => CursorIcon::Rotate,
        }
    }
}
