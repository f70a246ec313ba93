//! Alignment snapping against other elements, and rotation snapping.

use kurbo::{Rect, Vec2};
use std::f64::consts::TAU;

/// Orientation of an alignment guide line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GuideAxis {
    /// A vertical line at a fixed x.
    Vertical,
    /// A horizontal line at a fixed y.
    Horizontal,
}

/// An alignment guide in world coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Guide {
    pub axis: GuideAxis,
    /// x for vertical guides, y for horizontal ones.
    pub position: f64,
    /// Extent along the other axis, covering both aligned elements.
    pub start: f64,
    pub end: f64,
}

/// Thresholds for one snapping query, already in world units.
#[derive(Debug, Clone, Copy)]
pub struct SnapParams {
    pub enabled: bool,
    /// Maximum distance that snaps.
    pub threshold: f64,
    /// Alignments this close to the chosen snap also get a guide.
    pub tolerance: f64,
}

impl SnapParams {
    /// Convert a screen-pixel threshold using the viewport scale.
    pub fn new(enabled: bool, threshold_px: f64, scale: f64, tolerance: f64) -> Self {
        Self {
            enabled,
            threshold: threshold_px / scale,
            tolerance,
        }
    }
}

/// Result of a snap operation.
#[derive(Debug, Clone)]
pub struct SnapResult {
    /// The adjusted rectangle.
    pub rect: Rect,
    /// Offset that was applied to the moving edges.
    pub offset: Vec2,
    pub snapped_x: bool,
    pub snapped_y: bool,
    pub guides: Vec<Guide>,
}

impl SnapResult {
    /// Create a result with no snapping.
    pub fn none(rect: Rect) -> Self {
        Self {
            rect,
            offset: Vec2::ZERO,
            snapped_x: false,
            snapped_y: false,
            guides: Vec::new(),
        }
    }

    pub fn is_snapped(&self) -> bool {
        self.snapped_x || self.snapped_y
    }
}

/// Which edges of a rectangle a resize gesture moves.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MovingEdges {
    pub left: bool,
    pub right: bool,
    pub top: bool,
    pub bottom: bool,
}

fn x_anchors(r: Rect) -> [f64; 3] {
    [r.x0, r.center().x, r.x1]
}

fn y_anchors(r: Rect) -> [f64; 3] {
    [r.y0, r.center().y, r.y1]
}

/// Smallest signed offset that aligns any `moving` value with any target value.
fn best_offset<'a>(
    moving: &[f64],
    targets: impl Iterator<Item = &'a [f64; 3]>,
    threshold: f64,
) -> Option<f64> {
    let mut best: Option<f64> = None;
    for anchors in targets {
        for &target in anchors {
            for &m in moving {
                let d = target - m;
                if d.abs() <= threshold && best.is_none_or(|b| d.abs() < b.abs()) {
                    best = Some(d);
                }
            }
        }
    }
    best
}

/// Guides for every target anchor within `tolerance` of a moving value.
fn collect_guides(
    axis: GuideAxis,
    moving_values: &[f64],
    snapped: Rect,
    targets: &[Rect],
    tolerance: f64,
    guides: &mut Vec<Guide>,
) {
    for target in targets {
        let anchors = match axis {
            GuideAxis::Vertical => x_anchors(*target),
            GuideAxis::Horizontal => y_anchors(*target),
        };
        for anchor in anchors {
            if !moving_values.iter().any(|m| (m - anchor).abs() <= tolerance) {
                continue;
            }
            let (start, end) = match axis {
                GuideAxis::Vertical => (snapped.y0.min(target.y0), snapped.y1.max(target.y1)),
                GuideAxis::Horizontal => (snapped.x0.min(target.x0), snapped.x1.max(target.x1)),
            };
            match guides
                .iter_mut()
                .find(|g| g.axis == axis && (g.position - anchor).abs() <= f64::EPSILON)
            {
                Some(existing) => {
                    existing.start = existing.start.min(start);
                    existing.end = existing.end.max(end);
                }
                None => guides.push(Guide {
                    axis,
                    position: anchor,
                    start,
                    end,
                }),
            }
        }
    }
}

/// Snap a moving rectangle so one of its left/center/right and
/// top/center/bottom lines aligns with another element's.
pub fn snap_move(candidate: Rect, targets: &[Rect], params: &SnapParams) -> SnapResult {
    if !params.enabled || targets.is_empty() {
        return SnapResult::none(candidate);
    }
    let x_targets: Vec<[f64; 3]> = targets.iter().map(|r| x_anchors(*r)).collect();
    let y_targets: Vec<[f64; 3]> = targets.iter().map(|r| y_anchors(*r)).collect();

    let dx = best_offset(&x_anchors(candidate), x_targets.iter(), params.threshold);
    let dy = best_offset(&y_anchors(candidate), y_targets.iter(), params.threshold);
    let offset = Vec2::new(dx.unwrap_or(0.0), dy.unwrap_or(0.0));
    let rect = candidate + offset;

    let mut guides = Vec::new();
    if dx.is_some() {
        collect_guides(GuideAxis::Vertical, &x_anchors(rect), rect, targets, params.tolerance, &mut guides);
    }
    if dy.is_some() {
        collect_guides(GuideAxis::Horizontal, &y_anchors(rect), rect, targets, params.tolerance, &mut guides);
    }

    SnapResult {
        rect,
        offset,
        snapped_x: dx.is_some(),
        snapped_y: dy.is_some(),
        guides,
    }
}

/// Snap only the moving edges of a resized rectangle.
pub fn snap_resize(
    candidate: Rect,
    edges: MovingEdges,
    targets: &[Rect],
    params: &SnapParams,
) -> SnapResult {
    if !params.enabled || targets.is_empty() {
        return SnapResult::none(candidate);
    }
    let x_targets: Vec<[f64; 3]> = targets.iter().map(|r| x_anchors(*r)).collect();
    let y_targets: Vec<[f64; 3]> = targets.iter().map(|r| y_anchors(*r)).collect();

    let moving_x: Vec<f64> = [(edges.left, candidate.x0), (edges.right, candidate.x1)]
        .into_iter()
        .filter_map(|(moving, v)| moving.then_some(v))
        .collect();
    let moving_y: Vec<f64> = [(edges.top, candidate.y0), (edges.bottom, candidate.y1)]
        .into_iter()
        .filter_map(|(moving, v)| moving.then_some(v))
        .collect();

    let dx = best_offset(&moving_x, x_targets.iter(), params.threshold);
    let dy = best_offset(&moving_y, y_targets.iter(), params.threshold);

    let mut rect = candidate;
    if let Some(dx) = dx {
        if edges.left {
            rect.x0 += dx;
        }
        if edges.right {
            rect.x1 += dx;
        }
    }
    if let Some(dy) = dy {
        if edges.top {
            rect.y0 += dy;
        }
        if edges.bottom {
            rect.y1 += dy;
        }
    }

    let mut guides = Vec::new();
    if dx.is_some() {
        let values: Vec<f64> = moving_x.iter().map(|v| v + dx.unwrap_or(0.0)).collect();
        collect_guides(GuideAxis::Vertical, &values, rect, targets, params.tolerance, &mut guides);
    }
    if dy.is_some() {
        let values: Vec<f64> = moving_y.iter().map(|v| v + dy.unwrap_or(0.0)).collect();
        collect_guides(GuideAxis::Horizontal, &values, rect, targets, params.tolerance, &mut guides);
    }

    SnapResult {
        rect,
        offset: Vec2::new(dx.unwrap_or(0.0), dy.unwrap_or(0.0)),
        snapped_x: dx.is_some(),
        snapped_y: dy.is_some(),
        guides,
    }
}

/// Normalize an angle in radians to `[0, 2π)`.
pub fn normalize_angle(radians: f64) -> f64 {
    let normalized = radians.rem_euclid(TAU);
    if normalized >= TAU { 0.0 } else { normalized }
}

/// Snap an angle (radians) to the nearest multiple of `step_deg` when it is
/// within `tolerance_deg` of it. The result is normalized to `[0, 2π)`.
pub fn snap_rotation(radians: f64, step_deg: f64, tolerance_deg: f64) -> f64 {
    let normalized = normalize_angle(radians);
    if step_deg <= 0.0 {
        return normalized;
    }
    let degrees = normalized.to_degrees();
    let nearest = (degrees / step_deg).round() * step_deg;
    if (degrees - nearest).abs() <= tolerance_deg {
        nearest.rem_euclid(360.0).to_radians()
    } else {
        normalized
    }
}
