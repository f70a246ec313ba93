//! Vector shapes.

use super::SerializableColor;
use kurbo::{BezPath, Point, Rect, RoundedRect, Shape as KurboShape};
use serde::{Deserialize, Serialize};
use std::f64::consts::{FRAC_PI_2, PI};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ShapeType {
    #[default]
    Rectangle,
    Ellipse,
    Line,
    Triangle,
    Star,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShapeData {
    pub shape_type: ShapeType,
    pub fill: Option<SerializableColor>,
    pub stroke: Option<SerializableColor>,
    pub stroke_width: f64,
    #[serde(default)]
    pub corner_radius: f64,
    /// Second endpoint, only meaningful for lines.
    #[serde(default)]
    pub x2: f64,
    #[serde(default)]
    pub y2: f64,
}

impl ShapeData {
    pub fn new(shape_type: ShapeType) -> Self {
        let (fill, stroke) = if shape_type == ShapeType::Line {
            (None, Some(SerializableColor::black()))
        } else {
            (Some(SerializableColor::new(0xe5, 0xe7, 0xeb, 0xff)), None)
        };
        Self {
            shape_type,
            fill,
            stroke,
            stroke_width: 2.0,
            corner_radius: 0.0,
            x2: 0.0,
            y2: 0.0,
        }
    }

    /// Outline of a box-shaped variant inside `bounds`.
    pub fn to_path(&self, bounds: Rect) -> BezPath {
        match self.shape_type {
            ShapeType::Rectangle => {
                let radius = self
                    .corner_radius
                    .min(bounds.width() / 2.0)
                    .min(bounds.height() / 2.0)
                    .max(0.0);
                RoundedRect::from_rect(bounds, radius).to_path(0.1)
            }
            ShapeType::Ellipse => kurbo::Ellipse::from_rect(bounds).to_path(0.1),
            ShapeType::Triangle => {
                let mut path = BezPath::new();
                path.move_to(Point::new(bounds.center().x, bounds.y0));
                path.line_to(Point::new(bounds.x1, bounds.y1));
                path.line_to(Point::new(bounds.x0, bounds.y1));
                path.close_path();
                path
            }
            ShapeType::Star => star_path(bounds, 5, 0.5),
            ShapeType::Line => {
                let mut path = BezPath::new();
                path.move_to(Point::new(bounds.x0, bounds.y0));
                path.line_to(Point::new(bounds.x1, bounds.y1));
                path
            }
        }
    }
}

/// A star with `points` spikes inscribed in `bounds`.
fn star_path(bounds: Rect, points: usize, inner_ratio: f64) -> BezPath {
    let center = bounds.center();
    let rx = bounds.width() / 2.0;
    let ry = bounds.height() / 2.0;
    let step = PI / points as f64;
    let mut path = BezPath::new();
    for i in 0..points * 2 {
        let ratio = if i % 2 == 0 { 1.0 } else { inner_ratio };
        let angle = i as f64 * step - FRAC_PI_2;
        let p = Point::new(
            center.x + angle.cos() * rx * ratio,
            center.y + angle.sin() * ry * ratio,
        );
        if i == 0 {
            path.move_to(p);
        } else {
            path.line_to(p);
        }
    }
    path.close_path();
    path
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_star_fits_bounds() {
        let bounds = Rect::new(0.0, 0.0, 100.0, 100.0);
        let path = ShapeData::new(ShapeType::Star).to_path(bounds);
        let bbox = path.bounding_box();
        assert!(bbox.y0.abs() < 1e-9);
        assert!(bbox.x1 <= 100.0 + 1e-9);
        assert_eq!(path.elements().len(), 11);
    }

    #[test]
    fn test_corner_radius_is_clamped() {
        let mut data = ShapeData::new(ShapeType::Rectangle);
        data.corner_radius = 500.0;
        let path = data.to_path(Rect::new(0.0, 0.0, 40.0, 20.0));
        let bbox = path.bounding_box();
        assert!((bbox.width() - 40.0).abs() < 1e-6);
    }

    #[test]
    fn test_lines_default_to_stroke_only() {
        let data = ShapeData::new(ShapeType::Line);
        assert!(data.fill.is_none());
        assert!(data.stroke.is_some());
    }
}
