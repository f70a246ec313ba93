//! Selection handles and the geometry of resize and rotate gestures.

use crate::elements::{Element, ElementKind, ShapeType};
use crate::snap::{Guide, MovingEdges, SnapParams, snap_resize, snap_rotation};
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Type of selection handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HandleKind {
    /// Corner handle (aspect-preserving resize).
    Corner(Corner),
    /// Edge midpoint handle (single-axis resize).
    Edge(Edge),
    /// Rotation handle (positioned above the element).
    Rotate,
}

/// Corner positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Corner {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

/// Edge positions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Edge {
    Top,
    Right,
    Bottom,
    Left,
}

/// A selection handle with its position and type.
#[derive(Debug, Clone, Copy)]
pub struct Handle {
    /// Position in world coordinates.
    pub position: Point,
    pub kind: HandleKind,
}

impl Handle {
    pub fn new(position: Point, kind: HandleKind) -> Self {
        Self { position, kind }
    }

    /// Check if a point (in world coordinates) hits this handle.
    /// `tolerance` should be adjusted for viewport zoom.
    pub fn hit_test(&self, point: Point, tolerance: f64) -> bool {
        (point - self.position).hypot2() <= tolerance * tolerance
    }
}

/// Screen-pixel handle metrics converted with the current scale.
#[derive(Debug, Clone, Copy)]
pub struct HandleParams {
    pub scale: f64,
    pub size_px: f64,
    pub rotate_offset_px: f64,
}

impl HandleParams {
    fn tolerance(&self) -> f64 {
        self.size_px / self.scale
    }

    fn rotate_offset(&self) -> f64 {
        self.rotate_offset_px / self.scale
    }
}

/// Which handle kinds an element offers: (edges, rotate).
fn handle_set(element: &Element) -> (bool, bool) {
    let edges = match &element.kind {
        ElementKind::Frame(_) | ElementKind::Image(_) => true,
        ElementKind::Shape(s) => s.shape_type != ShapeType::Line,
        ElementKind::Text(_) | ElementKind::Path(_) => false,
    };
    (edges, element.can_rotate())
}

/// Unrotated handle positions around `bounds`.
fn local_handles(element: &Element, params: &HandleParams) -> Vec<Handle> {
    let b = element.bounds();
    let c = b.center();
    let (edges, rotate) = handle_set(element);
    let mut handles = Vec::with_capacity(9);
    if rotate {
        handles.push(Handle::new(
            Point::new(c.x, b.y0 - params.rotate_offset()),
            HandleKind::Rotate,
        ));
    }
    handles.extend([
        Handle::new(Point::new(b.x0, b.y0), HandleKind::Corner(Corner::TopLeft)),
        Handle::new(Point::new(b.x1, b.y0), HandleKind::Corner(Corner::TopRight)),
        Handle::new(Point::new(b.x0, b.y1), HandleKind::Corner(Corner::BottomLeft)),
        Handle::new(Point::new(b.x1, b.y1), HandleKind::Corner(Corner::BottomRight)),
    ]);
    if edges {
        handles.extend([
            Handle::new(Point::new(c.x, b.y0), HandleKind::Edge(Edge::Top)),
            Handle::new(Point::new(b.x1, c.y), HandleKind::Edge(Edge::Right)),
            Handle::new(Point::new(c.x, b.y1), HandleKind::Edge(Edge::Bottom)),
            Handle::new(Point::new(b.x0, c.y), HandleKind::Edge(Edge::Left)),
        ]);
    }
    handles
}

/// Handles for an element in world coordinates, rotated with it.
pub fn get_handles(element: &Element, params: &HandleParams) -> Vec<Handle> {
    let rotation = element.rotation_transform();
    local_handles(element, params)
        .into_iter()
        .map(|h| Handle::new(rotation * h.position, h.kind))
        .collect()
}

/// Find which handle (if any) is under `point`.
///
/// The point is un-rotated first. Rotation wins, then corners, then edges.
pub fn hit_test_handles(element: &Element, point: Point, params: &HandleParams) -> Option<HandleKind> {
    let local = element.rotation_transform().inverse() * point;
    let tolerance = params.tolerance();
    local_handles(element, params)
        .into_iter()
        .find(|h| h.hit_test(local, tolerance))
        .map(|h| h.kind)
}

fn rotate_vec(v: Vec2, angle: f64) -> Vec2 {
    let (sin, cos) = angle.sin_cos();
    Vec2::new(v.x * cos - v.y * sin, v.x * sin + v.y * cos)
}

/// Span of length `len` starting at `anchor` in direction `dir`
/// (centered on the anchor when `dir` is zero).
fn axis_span(anchor: f64, dir: f64, len: f64) -> (f64, f64) {
    if dir > 0.0 {
        (anchor, anchor + len)
    } else if dir < 0.0 {
        (anchor - len, anchor)
    } else {
        (anchor - len / 2.0, anchor + len / 2.0)
    }
}

/// The fixed reference of a resize gesture.
///
/// Works in the element's unrotated frame about `pivot`. `anchor` stays fixed
/// in world space; the rect grows from it along `dir` (zero = centered).
#[derive(Debug, Clone, Copy)]
pub struct ResizeFrame {
    pub pivot: Point,
    pub rotation: f64,
    pub anchor: Point,
    pub dir: Vec2,
}

impl ResizeFrame {
    /// Anchor at the corner opposite `corner`.
    pub fn for_corner(rect: Rect, rotation: f64, corner: Corner) -> Self {
        let (anchor, dir) = match corner {
            Corner::TopLeft => (Point::new(rect.x1, rect.y1), Vec2::new(-1.0, -1.0)),
            Corner::TopRight => (Point::new(rect.x0, rect.y1), Vec2::new(1.0, -1.0)),
            Corner::BottomLeft => (Point::new(rect.x1, rect.y0), Vec2::new(-1.0, 1.0)),
            Corner::BottomRight => (Point::new(rect.x0, rect.y0), Vec2::new(1.0, 1.0)),
        };
        Self {
            pivot: rect.center(),
            rotation,
            anchor,
            dir,
        }
    }

    /// Anchor at the midpoint of the edge opposite `edge`.
    pub fn for_edge(rect: Rect, rotation: f64, edge: Edge) -> Self {
        let c = rect.center();
        let (anchor, dir) = match edge {
            Edge::Top => (Point::new(c.x, rect.y1), Vec2::new(0.0, -1.0)),
            Edge::Right => (Point::new(rect.x0, c.y), Vec2::new(1.0, 0.0)),
            Edge::Bottom => (Point::new(c.x, rect.y0), Vec2::new(0.0, 1.0)),
            Edge::Left => (Point::new(rect.x1, c.y), Vec2::new(-1.0, 0.0)),
        };
        Self {
            pivot: c,
            rotation,
            anchor,
            dir,
        }
    }

    /// A world-space pointer in the unrotated frame.
    pub fn local_pointer(&self, pointer: Point) -> Point {
        if self.rotation == 0.0 {
            pointer
        } else {
            Affine::rotate_about(-self.rotation, self.pivot) * pointer
        }
    }

    /// The unrotated local rect of `size` grown from the anchor.
    pub fn local_rect(&self, size: Size) -> Rect {
        let (x0, x1) = axis_span(self.anchor.x, self.dir.x, size.width);
        let (y0, y1) = axis_span(self.anchor.y, self.dir.y, size.height);
        Rect::new(x0, y0, x1, y1)
    }

    /// Final unrotated bounds whose rotated anchor matches the original one.
    pub fn place(&self, local: Rect) -> Rect {
        if self.rotation == 0.0 {
            return local;
        }
        let anchor_world = Affine::rotate_about(self.rotation, self.pivot) * self.anchor;
        let center = anchor_world + rotate_vec(local.center() - self.anchor, self.rotation);
        Rect::from_center_size(center, local.size())
    }

    fn moving_edges(&self) -> MovingEdges {
        MovingEdges {
            left: self.dir.x < 0.0,
            right: self.dir.x > 0.0,
            top: self.dir.y < 0.0,
            bottom: self.dir.y > 0.0,
        }
    }
}

/// Outcome of a resize step.
#[derive(Debug, Clone)]
pub struct ResizeOutcome {
    /// New unrotated bounds.
    pub rect: Rect,
    pub guides: Vec<Guide>,
}

/// Snapping input for resize steps; only used for unrotated elements.
pub struct ResizeSnap<'a> {
    pub targets: &'a [Rect],
    pub params: &'a SnapParams,
}

/// Aspect-preserving corner resize from the gesture's start rect.
///
/// The width follows whichever axis the pointer moved further along
/// (relative to the start size) and the height follows the start aspect.
/// Degenerate axes (zero-width or zero-height lines) stay degenerate.
pub fn corner_resize(
    start: Rect,
    rotation: f64,
    corner: Corner,
    pointer: Point,
    min_size: f64,
    snap: Option<ResizeSnap<'_>>,
) -> ResizeOutcome {
    let frame = ResizeFrame::for_corner(start, rotation, corner);
    let local = frame.local_pointer(pointer);
    let dx = (local.x - frame.anchor.x) * frame.dir.x;
    let dy = (local.y - frame.anchor.y) * frame.dir.y;
    let (w0, h0) = (start.width(), start.height());

    let degenerate = w0 <= f64::EPSILON || h0 <= f64::EPSILON;
    if degenerate {
        let w = if w0 > f64::EPSILON { dx.max(min_size) } else { w0 };
        let h = if h0 > f64::EPSILON { dy.max(min_size) } else { h0 };
        return ResizeOutcome {
            rect: frame.place(frame.local_rect(Size::new(w, h))),
            guides: Vec::new(),
        };
    }

    let aspect = w0 / h0;
    let min_w = min_size.max(min_size * aspect);
    let x_dominant = dx >= dy * aspect;
    let mut w = if x_dominant { dx } else { dy * aspect }.max(min_w);

    let mut guides = Vec::new();
    if let Some(snap) = snap.filter(|_| rotation == 0.0) {
        let candidate = frame.local_rect(Size::new(w, w / aspect));
        let mut edges = frame.moving_edges();
        if x_dominant {
            edges.top = false;
            edges.bottom = false;
        } else {
            edges.left = false;
            edges.right = false;
        }
        let result = snap_resize(candidate, edges, snap.targets, snap.params);
        if result.is_snapped() {
            w = if x_dominant {
                result.rect.width()
            } else {
                result.rect.height() * aspect
            }
            .max(min_w);
            guides = result.guides;
        }
    }

    ResizeOutcome {
        rect: frame.place(frame.local_rect(Size::new(w, w / aspect))),
        guides,
    }
}

/// Free single-axis resize from the live rect.
pub fn edge_resize(
    current: Rect,
    rotation: f64,
    edge: Edge,
    pointer: Point,
    min_size: f64,
    snap: Option<ResizeSnap<'_>>,
) -> ResizeOutcome {
    let frame = ResizeFrame::for_edge(current, rotation, edge);
    let local = frame.local_pointer(pointer);
    let mut size = current.size();
    match edge {
        Edge::Left | Edge::Right => {
            size.width = ((local.x - frame.anchor.x) * frame.dir.x).max(min_size);
        }
        Edge::Top | Edge::Bottom => {
            size.height = ((local.y - frame.anchor.y) * frame.dir.y).max(min_size);
        }
    }

    let mut guides = Vec::new();
    if let Some(snap) = snap.filter(|_| rotation == 0.0) {
        let candidate = frame.local_rect(size);
        let result = snap_resize(candidate, frame.moving_edges(), snap.targets, snap.params);
        if result.is_snapped() {
            size = Size::new(
                result.rect.width().max(min_size),
                result.rect.height().max(min_size),
            );
            guides = result.guides;
        }
    }

    ResizeOutcome {
        rect: frame.place(frame.local_rect(size)),
        guides,
    }
}

/// Linearly map `rect` from the `from` frame rect onto the `to` frame rect.
pub fn map_rect_between(rect: Rect, from: Rect, to: Rect) -> Rect {
    let sx = if from.width() > f64::EPSILON { to.width() / from.width() } else { 1.0 };
    let sy = if from.height() > f64::EPSILON { to.height() / from.height() } else { 1.0 };
    Rect::new(
        to.x0 + (rect.x0 - from.x0) * sx,
        to.y0 + (rect.y0 - from.y0) * sy,
        to.x0 + (rect.x1 - from.x0) * sx,
        to.y0 + (rect.y1 - from.y0) * sy,
    )
}

/// Angle of `pointer` around `center`, in radians.
pub fn pointer_angle(center: Point, pointer: Point) -> f64 {
    (pointer.y - center.y).atan2(pointer.x - center.x)
}

/// Live rotation for a rotate gesture, normalized and snapped.
pub fn rotation_for_drag(
    start_rotation: f64,
    start_angle: f64,
    current_angle: f64,
    step_deg: f64,
    tolerance_deg: f64,
) -> f64 {
    snap_rotation(
        start_rotation + (current_angle - start_angle),
        step_deg,
        tolerance_deg,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::elements::ShapeType;
    use std::f64::consts::FRAC_PI_2;

    fn params() -> HandleParams {
        HandleParams {
            scale: 1.0,
            size_px: 10.0,
            rotate_offset_px: 24.0,
        }
    }

    #[test]
    fn test_handle_sets_per_type() {
        let frame = Element::frame(Rect::new(0.0, 0.0, 100.0, 100.0), "F");
        let handles = get_handles(&frame, &params());
        assert_eq!(handles.len(), 8);
        assert!(!handles.iter().any(|h| h.kind == HandleKind::Rotate));

        let shape = Element::shape(ShapeType::Rectangle, Rect::new(0.0, 0.0, 100.0, 100.0));
        assert_eq!(get_handles(&shape, &params()).len(), 9);

        let text = Element::text(Point::ZERO, "hi", 20.0);
        assert_eq!(get_handles(&text, &params()).len(), 5);
    }

    #[test]
    fn test_rotate_handle_hit() {
        let shape = Element::shape(ShapeType::Rectangle, Rect::new(0.0, 100.0, 100.0, 200.0));
        let hit = hit_test_handles(&shape, Point::new(50.0, 76.0), &params());
        assert_eq!(hit, Some(HandleKind::Rotate));
    }

    #[test]
    fn test_handle_hit_on_rotated_element() {
        let mut shape = Element::shape(ShapeType::Rectangle, Rect::new(-50.0, -25.0, 50.0, 25.0));
        shape.rotation = FRAC_PI_2;
        // The bottom-right corner (50, 25) rotates to (-25, 50).
        let hit = hit_test_handles(&shape, Point::new(-25.0, 50.0), &params());
        assert_eq!(hit, Some(HandleKind::Corner(Corner::BottomRight)));
    }

    #[test]
    fn test_corner_resize_keeps_aspect_and_anchor() {
        let start = Rect::new(0.0, 0.0, 200.0, 100.0);
        for pointer in [Point::new(250.0, 180.0), Point::new(300.0, 90.0), Point::new(150.0, 300.0)] {
            let out = corner_resize(start, 0.0, Corner::BottomRight, pointer, 10.0, None);
            assert!((out.rect.width() / out.rect.height() - 2.0).abs() < 1e-9);
            assert!(out.rect.x0.abs() < 1e-9);
            assert!(out.rect.y0.abs() < 1e-9);
        }
    }

    #[test]
    fn test_corner_resize_top_left_anchor() {
        let start = Rect::new(100.0, 100.0, 300.0, 200.0);
        let out = corner_resize(start, 0.0, Corner::TopLeft, Point::new(0.0, 90.0), 10.0, None);
        assert!((out.rect.x1 - 300.0).abs() < 1e-9);
        assert!((out.rect.y1 - 200.0).abs() < 1e-9);
        assert!((out.rect.width() - 300.0).abs() < 1e-9);
        assert!((out.rect.height() - 150.0).abs() < 1e-9);
    }

    #[test]
    fn test_corner_resize_clamps_to_minimum() {
        let start = Rect::new(0.0, 0.0, 200.0, 100.0);
        let out = corner_resize(start, 0.0, Corner::BottomRight, Point::new(-50.0, -50.0), 10.0, None);
        assert!((out.rect.height() - 10.0).abs() < 1e-9);
        assert!((out.rect.width() - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_rotated_corner_resize_keeps_world_anchor() {
        let start = Rect::new(0.0, 0.0, 200.0, 100.0);
        let rotation = 0.6;
        let rot = Affine::rotate_about(rotation, start.center());
        let anchor_before = rot * Point::new(0.0, 0.0);

        let pointer = rot * Point::new(260.0, 140.0);
        let out = corner_resize(start, rotation, Corner::BottomRight, pointer, 10.0, None);
        let rot_after = Affine::rotate_about(rotation, out.rect.center());
        let anchor_after = rot_after * out.rect.origin();

        assert!((anchor_before - anchor_after).hypot() < 1e-9);
        assert!((out.rect.width() / out.rect.height() - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_resize_is_free() {
        let current = Rect::new(0.0, 0.0, 200.0, 100.0);
        let out = edge_resize(current, 0.0, Edge::Right, Point::new(260.0, 500.0), 10.0, None);
        assert_eq!(out.rect, Rect::new(0.0, 0.0, 260.0, 100.0));
        let out = edge_resize(current, 0.0, Edge::Top, Point::new(0.0, 95.0), 10.0, None);
        assert_eq!(out.rect, Rect::new(0.0, 90.0, 200.0, 100.0));
    }

    #[test]
    fn test_edge_resize_snaps_moving_edge() {
        let current = Rect::new(0.0, 0.0, 200.0, 100.0);
        let targets = [Rect::new(300.0, 300.0, 400.0, 400.0)];
        let snap_params = SnapParams::new(true, 8.0, 1.0, 0.5);
        let out = edge_resize(
            current,
            0.0,
            Edge::Right,
            Point::new(296.0, 50.0),
            10.0,
            Some(ResizeSnap {
                targets: &targets,
                params: &snap_params,
            }),
        );
        assert!((out.rect.x1 - 300.0).abs() < 1e-9);
        assert_eq!(out.guides.len(), 1);
    }

    #[test]
    fn test_map_rect_between() {
        let from = Rect::new(0.0, 0.0, 100.0, 100.0);
        let to = Rect::new(0.0, 0.0, 200.0, 200.0);
        let mapped = map_rect_between(Rect::new(10.0, 20.0, 30.0, 40.0), from, to);
        assert_eq!(mapped, Rect::new(20.0, 40.0, 60.0, 80.0));
    }

    #[test]
    fn test_rotation_for_drag_snaps() {
        let start_angle = -FRAC_PI_2;
        let current = start_angle + 43f64.to_radians();
        let rotation = rotation_for_drag(0.0, start_angle, current, 15.0, 5.0);
        assert!((rotation - 45f64.to_radians()).abs() < 1e-12);
    }
}
