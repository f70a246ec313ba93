//! Freehand paths.

use super::SerializableColor;
use kurbo::{BezPath, Point, Rect, Vec2};
use serde::{Deserialize, Serialize};

/// A freehand stroke. Its extent is derived from the points alone.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PathData {
    pub points: Vec<Point>,
    pub stroke: SerializableColor,
    pub stroke_width: f64,
}

impl PathData {
    pub fn new(points: Vec<Point>) -> Self {
        Self {
            points,
            stroke: SerializableColor::black(),
            stroke_width: 2.0,
        }
    }

    pub fn add_point(&mut self, point: Point) {
        self.points.push(point);
    }

    /// Bounding box of the points. Empty paths collapse to the origin.
    pub fn bounds(&self) -> Rect {
        let Some(first) = self.points.first() else {
            return Rect::ZERO;
        };
        self.points
            .iter()
            .skip(1)
            .fold(Rect::from_points(*first, *first), |r, p| r.union_pt(*p))
    }

    pub fn translate(&mut self, delta: Vec2) {
        for point in &mut self.points {
            *point += delta;
        }
    }

    /// Total length of all segments.
    pub fn length(&self) -> f64 {
        self.points.windows(2).map(|w| w[0].distance(w[1])).sum()
    }

    pub fn to_path(&self) -> BezPath {
        let mut path = BezPath::new();
        if let Some(first) = self.points.first() {
            path.move_to(*first);
            for point in self.points.iter().skip(1) {
                path.line_to(*point);
            }
        }
        path
    }
}
