//! Element definitions for the canvas.

mod frame;
mod image;
mod path;
mod shape;
mod text;

pub use frame::FrameData;
pub use image::ImageData;
pub use path::PathData;
pub use shape::{ShapeData, ShapeType};
pub use text::{DEFAULT_FONT_SIZE, TextAlign, TextData, text_metrics};

use kurbo::{Affine, BezPath, Point, Rect, Vec2};
use peniko::Color;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Unique identifier for elements.
pub type ElementId = Uuid;

/// Serializable color representation (RGBA8).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SerializableColor {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl SerializableColor {
    pub fn new(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    pub fn black() -> Self {
        Self::new(0, 0, 0, 255)
    }

    pub fn white() -> Self {
        Self::new(255, 255, 255, 255)
    }
}

impl From<Color> for SerializableColor {
    fn from(color: Color) -> Self {
        let rgba = color.to_rgba8();
        Self {
            r: rgba.r,
            g: rgba.g,
            b: rgba.b,
            a: rgba.a,
        }
    }
}

impl From<SerializableColor> for Color {
    fn from(color: SerializableColor) -> Self {
        Color::from_rgba8(color.r, color.g, color.b, color.a)
    }
}

/// Distance from a point to a line segment (a→b).
pub fn point_to_segment_dist(point: Point, a: Point, b: Point) -> f64 {
    let seg = b - a;
    let pv = point - a;
    let len_sq = seg.hypot2();
    if len_sq < f64::EPSILON {
        return pv.hypot();
    }
    let t = (pv.dot(seg) / len_sq).clamp(0.0, 1.0);
    (point - (a + seg * t)).hypot()
}

/// Minimum distance from a point to a polyline.
pub fn point_to_polyline_dist(point: Point, points: &[Point]) -> f64 {
    points
        .windows(2)
        .map(|w| point_to_segment_dist(point, w[0], w[1]))
        .fold(f64::INFINITY, f64::min)
}

/// Map `point` from `from` to `to`, preserving its relative position.
pub(crate) fn map_point_between(point: Point, from: Rect, to: Rect) -> Point {
    let tx = if from.width().abs() < f64::EPSILON {
        0.0
    } else {
        (point.x - from.x0) / from.width()
    };
    let ty = if from.height().abs() < f64::EPSILON {
        0.0
    } else {
        (point.y - from.y0) / from.height()
    };
    Point::new(to.x0 + tx * to.width(), to.y0 + ty * to.height())
}

/// Variant-specific payload of an element.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ElementKind {
    Frame(FrameData),
    Image(ImageData),
    Text(TextData),
    Shape(ShapeData),
    Path(PathData),
}

/// A single item on the canvas.
///
/// `parent_frame` is an in-memory relation only. Serialized forms carry it as
/// an index (see [`crate::history::Snapshot`]).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Element {
    pub id: ElementId,
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    /// Radians about the element's own center.
    #[serde(default)]
    pub rotation: f64,
    #[serde(skip)]
    pub parent_frame: Option<ElementId>,
    pub kind: ElementKind,
}

impl Element {
    fn with_rect(rect: Rect, kind: ElementKind) -> Self {
        Self {
            id: Uuid::new_v4(),
            x: rect.x0,
            y: rect.y0,
            width: rect.width(),
            height: rect.height(),
            rotation: 0.0,
            parent_frame: None,
            kind,
        }
    }

    /// Create a frame covering `rect`.
    pub fn frame(rect: Rect, name: impl Into<String>) -> Self {
        Self::with_rect(rect, ElementKind::Frame(FrameData::new(name)))
    }

    /// Create a box-shaped vector shape (anything but a line).
    pub fn shape(shape_type: ShapeType, rect: Rect) -> Self {
        Self::with_rect(rect, ElementKind::Shape(ShapeData::new(shape_type)))
    }

    /// Create a line shape between two endpoints.
    pub fn line(start: Point, end: Point) -> Self {
        let mut data = ShapeData::new(ShapeType::Line);
        data.x2 = end.x;
        data.y2 = end.y;
        Self {
            id: Uuid::new_v4(),
            x: start.x,
            y: start.y,
            width: (end.x - start.x).abs(),
            height: (end.y - start.y).abs(),
            rotation: 0.0,
            parent_frame: None,
            kind: ElementKind::Shape(data),
        }
    }

    /// Create a text element with its box fitted to the content.
    pub fn text(position: Point, content: impl Into<String>, font_size: f64) -> Self {
        let data = TextData::new(content, font_size);
        let size = data.metrics();
        Self::with_rect(
            Rect::from_origin_size(position, size),
            ElementKind::Text(data),
        )
    }

    /// Create a freehand path from its points.
    pub fn path(points: Vec<Point>) -> Self {
        let data = PathData::new(points);
        let bounds = data.bounds();
        Self::with_rect(bounds, ElementKind::Path(data))
    }

    /// Create an image element displayed in `rect`.
    pub fn image(rect: Rect, data: ImageData) -> Self {
        Self::with_rect(rect, ElementKind::Image(data))
    }

    /// Lowercase discriminant name.
    pub fn type_name(&self) -> &'static str {
        match &self.kind {
            ElementKind::Frame(_) => "frame",
            ElementKind::Image(_) => "image",
            ElementKind::Text(_) => "text",
            ElementKind::Shape(_) => "shape",
            ElementKind::Path(_) => "path",
        }
    }

    pub fn is_frame(&self) -> bool {
        matches!(self.kind, ElementKind::Frame(_))
    }

    pub fn is_path(&self) -> bool {
        matches!(self.kind, ElementKind::Path(_))
    }

    /// Whether this is a `line` shape.
    pub fn is_line(&self) -> bool {
        matches!(&self.kind, ElementKind::Shape(s) if s.shape_type == ShapeType::Line)
    }

    /// Frames never rotate.
    pub fn can_rotate(&self) -> bool {
        !self.is_frame()
    }

    pub fn as_frame(&self) -> Option<&FrameData> {
        match &self.kind {
            ElementKind::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_frame_mut(&mut self) -> Option<&mut FrameData> {
        match &mut self.kind {
            ElementKind::Frame(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_text(&self) -> Option<&TextData> {
        match &self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_text_mut(&mut self) -> Option<&mut TextData> {
        match &mut self.kind {
            ElementKind::Text(t) => Some(t),
            _ => None,
        }
    }

    pub fn as_image(&self) -> Option<&ImageData> {
        match &self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }

    pub fn as_image_mut(&mut self) -> Option<&mut ImageData> {
        match &mut self.kind {
            ElementKind::Image(i) => Some(i),
            _ => None,
        }
    }

    /// Font size for text elements.
    pub fn font_size(&self) -> Option<f64> {
        self.as_text().map(|t| t.font_size)
    }

    /// Axis-aligned bounds, ignoring rotation.
    ///
    /// Paths derive their extent from their points; lines from both endpoints.
    pub fn bounds(&self) -> Rect {
        match &self.kind {
            ElementKind::Path(p) => p.bounds(),
            ElementKind::Shape(s) if s.shape_type == ShapeType::Line => {
                Rect::from_points(Point::new(self.x, self.y), Point::new(s.x2, s.y2))
            }
            _ => Rect::new(self.x, self.y, self.x + self.width, self.y + self.height),
        }
    }

    pub fn center(&self) -> Point {
        self.bounds().center()
    }

    /// Transform that applies this element's rotation about its center.
    pub fn rotation_transform(&self) -> Affine {
        if self.rotation == 0.0 {
            Affine::IDENTITY
        } else {
            Affine::rotate_about(self.rotation, self.center())
        }
    }

    /// Move the element by a world-space delta.
    pub fn translate(&mut self, delta: Vec2) {
        self.x += delta.x;
        self.y += delta.y;
        match &mut self.kind {
            ElementKind::Shape(s) if s.shape_type == ShapeType::Line => {
                s.x2 += delta.x;
                s.y2 += delta.y;
            }
            ElementKind::Path(p) => p.translate(delta),
            _ => {}
        }
    }

    /// Move the element so its bounds start at `origin`.
    pub fn move_to(&mut self, origin: Point) {
        let bounds = self.bounds();
        self.translate(origin - bounds.origin());
    }

    /// Replace the element's bounds.
    ///
    /// Lines and paths map their points from the old extent onto the new one.
    pub fn set_bounds(&mut self, rect: Rect) {
        let old = self.bounds();
        match &mut self.kind {
            ElementKind::Shape(s) if s.shape_type == ShapeType::Line => {
                let start = map_point_between(Point::new(self.x, self.y), old, rect);
                let end = map_point_between(Point::new(s.x2, s.y2), old, rect);
                s.x2 = end.x;
                s.y2 = end.y;
                self.x = start.x;
                self.y = start.y;
            }
            ElementKind::Path(p) => {
                for point in &mut p.points {
                    *point = map_point_between(*point, old, rect);
                }
                self.x = rect.x0;
                self.y = rect.y0;
            }
            _ => {
                self.x = rect.x0;
                self.y = rect.y0;
            }
        }
        self.width = rect.width();
        self.height = rect.height();
    }

    /// Resize a text element's box to fit its content.
    pub fn refit_text(&mut self) {
        if let ElementKind::Text(t) = &self.kind {
            let size = t.metrics();
            self.width = size.width;
            self.height = size.height;
        }
    }

    /// Unrotated outline in world coordinates.
    pub fn outline(&self) -> BezPath {
        let bounds = self.bounds();
        match &self.kind {
            ElementKind::Shape(s) if s.shape_type == ShapeType::Line => {
                let mut path = BezPath::new();
                path.move_to(Point::new(self.x, self.y));
                path.line_to(Point::new(s.x2, s.y2));
                path
            }
            ElementKind::Shape(s) => s.to_path(bounds),
            ElementKind::Path(p) => p.to_path(),
            _ => {
                use kurbo::Shape as _;
                bounds.to_path(0.1)
            }
        }
    }
}
