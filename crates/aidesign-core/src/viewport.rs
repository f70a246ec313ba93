//! Viewport module for pan/zoom transforms.

use crate::config::ChromeInsets;
use kurbo::{Affine, Point, Rect, Size, Vec2};
use serde::{Deserialize, Serialize};

/// Viewport manages the world-to-screen mapping of the canvas.
///
/// `screen = world * scale + (x, y)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    /// Horizontal screen offset of the world origin.
    pub x: f64,
    /// Vertical screen offset of the world origin.
    pub y: f64,
    /// Current zoom factor.
    pub scale: f64,
    /// Minimum allowed scale.
    pub min_scale: f64,
    /// Maximum allowed scale.
    pub max_scale: f64,
}

impl Default for Viewport {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            scale: 1.0,
            min_scale: 0.1,
            max_scale: 10.0,
        }
    }
}

impl Viewport {
    /// Create a viewport with the given scale limits.
    pub fn new(min_scale: f64, max_scale: f64) -> Self {
        Self {
            min_scale,
            max_scale,
            scale: 1.0_f64.clamp(min_scale, max_scale),
            ..Self::default()
        }
    }

    /// World-to-screen transform for rendering.
    pub fn transform(&self) -> Affine {
        Affine::translate(Vec2::new(self.x, self.y)) * Affine::scale(self.scale)
    }

    /// Screen-to-world transform for input handling.
    pub fn inverse_transform(&self) -> Affine {
        Affine::scale(1.0 / self.scale) * Affine::translate(Vec2::new(-self.x, -self.y))
    }

    /// Convert a screen point to world coordinates.
    pub fn screen_to_world(&self, screen: Point) -> Point {
        Point::new((screen.x - self.x) / self.scale, (screen.y - self.y) / self.scale)
    }

    /// Convert a world point to screen coordinates.
    pub fn world_to_screen(&self, world: Point) -> Point {
        Point::new(world.x * self.scale + self.x, world.y * self.scale + self.y)
    }

    /// Convert a screen-pixel length to world units.
    pub fn px_to_world(&self, px: f64) -> f64 {
        px / self.scale
    }

    /// Pan by a delta in screen pixels.
    pub fn pan(&mut self, dx: f64, dy: f64) {
        self.x += dx;
        self.y += dy;
    }

    /// Zoom by `factor`, keeping the world point under `focal` fixed on screen.
    pub fn zoom(&mut self, focal: Point, factor: f64) {
        let new_scale = (self.scale * factor).clamp(self.min_scale, self.max_scale);
        if (new_scale - self.scale).abs() < f64::EPSILON {
            return;
        }
        let world = self.screen_to_world(focal);
        self.scale = new_scale;
        self.x = focal.x - world.x * self.scale;
        self.y = focal.y - world.y * self.scale;
    }

    /// Fixed multiplicative zoom step (keyboard shortcuts).
    pub fn zoom_step(&mut self, focal: Point, step: f64, zoom_in: bool) {
        let factor = if zoom_in { step } else { 1.0 / step };
        self.zoom(focal, factor);
    }

    /// Continuous zoom proportional to the wheel/trackpad delta.
    ///
    /// Negative deltas zoom in. The per-event factor is clamped to
    /// `[1/max_factor, max_factor]`.
    pub fn zoom_wheel(&mut self, focal: Point, delta: f64, sensitivity: f64, max_factor: f64) {
        let factor = (-delta * sensitivity).exp().clamp(1.0 / max_factor, max_factor);
        self.zoom(focal, factor);
    }

    /// The world-space rectangle visible in a viewport of `size` pixels.
    pub fn visible_world_rect(&self, size: Size) -> Rect {
        Rect::from_points(
            self.screen_to_world(Point::ZERO),
            self.screen_to_world(Point::new(size.width, size.height)),
        )
    }

    /// Solve scale and offset so `bounds` is centered in the area of
    /// `viewport` not covered by `chrome`, leaving `padding` pixels around it.
    pub fn fit_to_bounds(&mut self, bounds: Rect, viewport: Size, chrome: ChromeInsets, padding: f64) {
        let avail_w = (viewport.width - chrome.left - chrome.right - padding * 2.0).max(1.0);
        let avail_h = (viewport.height - chrome.top - chrome.bottom - padding * 2.0).max(1.0);

        let scale = if bounds.width() <= f64::EPSILON || bounds.height() <= f64::EPSILON {
            1.0
        } else {
            (avail_w / bounds.width()).min(avail_h / bounds.height()).min(1.0)
        };
        self.scale = scale.clamp(self.min_scale, self.max_scale);

        let center_x = chrome.left + (viewport.width - chrome.left - chrome.right) / 2.0;
        let center_y = chrome.top + (viewport.height - chrome.top - chrome.bottom) / 2.0;
        let bounds_center = bounds.center();
        self.x = center_x - bounds_center.x * self.scale;
        self.y = center_y - bounds_center.y * self.scale;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_viewport() {
        let viewport = Viewport::default();
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
        assert_eq!(viewport.screen_to_world(Point::new(10.0, 20.0)), Point::new(10.0, 20.0));
    }

    #[test]
    fn test_screen_to_world_with_offset_and_scale() {
        let viewport = Viewport {
            x: 50.0,
            y: 100.0,
            scale: 2.0,
            ..Viewport::default()
        };
        let world = viewport.screen_to_world(Point::new(150.0, 300.0));
        assert!((world.x - 50.0).abs() < f64::EPSILON);
        assert!((world.y - 100.0).abs() < f64::EPSILON);
        assert!((viewport.px_to_world(8.0) - 4.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_roundtrip_conversion() {
        let viewport = Viewport {
            x: 30.0,
            y: -20.0,
            scale: 1.5,
            ..Viewport::default()
        };
        let original = Point::new(123.0, 456.0);
        let back = viewport.world_to_screen(viewport.screen_to_world(original));
        assert!((back.x - original.x).abs() < 1e-10);
        assert!((back.y - original.y).abs() < 1e-10);

        let via_affine = viewport.inverse_transform() * original;
        let direct = viewport.screen_to_world(original);
        assert!((via_affine.x - direct.x).abs() < 1e-10);
        assert!((via_affine.y - direct.y).abs() < 1e-10);
    }

    #[test]
    fn test_zoom_keeps_focal_point_fixed() {
        let mut viewport = Viewport {
            x: 13.0,
            y: -7.0,
            scale: 1.3,
            ..Viewport::default()
        };
        let focal = Point::new(400.0, 300.0);
        let before = viewport.screen_to_world(focal);
        viewport.zoom(focal, 1.7);
        let after = viewport.screen_to_world(focal);
        assert!((before.x - after.x).abs() < 1e-9);
        assert!((before.y - after.y).abs() < 1e-9);
        assert!((viewport.scale - 1.3 * 1.7).abs() < 1e-12);
    }

    #[test]
    fn test_zoom_clamp() {
        let mut viewport = Viewport::default();
        viewport.zoom(Point::ZERO, 0.001);
        assert!((viewport.scale - viewport.min_scale).abs() < f64::EPSILON);

        viewport.zoom(Point::ZERO, 1e6);
        assert!((viewport.scale - viewport.max_scale).abs() < f64::EPSILON);
    }

    #[test]
    fn test_wheel_zoom_is_clamped_per_event() {
        let mut viewport = Viewport::default();
        viewport.zoom_wheel(Point::ZERO, -10_000.0, 0.0015, 1.25);
        assert!((viewport.scale - 1.25).abs() < 1e-12);

        let mut viewport = Viewport::default();
        viewport.zoom_wheel(Point::ZERO, 10_000.0, 0.0015, 1.25);
        assert!((viewport.scale - 0.8).abs() < 1e-12);
    }

    #[test]
    fn test_small_wheel_delta_is_proportional() {
        let mut viewport = Viewport::default();
        viewport.zoom_wheel(Point::ZERO, -20.0, 0.0015, 1.25);
        assert!((viewport.scale - (0.03_f64).exp()).abs() < 1e-12);
    }

    #[test]
    fn test_pan() {
        let mut viewport = Viewport::default();
        viewport.pan(10.0, 20.0);
        assert!((viewport.x - 10.0).abs() < f64::EPSILON);
        assert!((viewport.y - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_fit_to_bounds_centers_content() {
        let mut viewport = Viewport::default();
        let chrome = ChromeInsets { left: 100.0, top: 0.0, right: 0.0, bottom: 0.0 };
        let bounds = Rect::new(0.0, 0.0, 2000.0, 1000.0);
        viewport.fit_to_bounds(bounds, Size::new(1100.0, 800.0), chrome, 50.0);

        // Available width is 1100 - 100 - 100 = 900 -> scale 0.45.
        assert!((viewport.scale - 0.45).abs() < 1e-12);
        let center = viewport.world_to_screen(bounds.center());
        assert!((center.x - 600.0).abs() < 1e-9);
        assert!((center.y - 400.0).abs() < 1e-9);
    }

    #[test]
    fn test_fit_never_zooms_past_one() {
        let mut viewport = Viewport::default();
        let bounds = Rect::new(0.0, 0.0, 10.0, 10.0);
        viewport.fit_to_bounds(bounds, Size::new(800.0, 600.0), ChromeInsets::default(), 48.0);
        assert!((viewport.scale - 1.0).abs() < f64::EPSILON);
    }
}
