//! Engine configuration.

use crate::error::{CanvasError, CanvasResult};
use kurbo::Size;
use serde::{Deserialize, Serialize};

/// Screen space occupied by floating toolbars and panels, in pixels.
///
/// Fit-to-content centers inside the remaining area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ChromeInsets {
    pub left: f64,
    pub top: f64,
    pub right: f64,
    pub bottom: f64,
}

impl Default for ChromeInsets {
    fn default() -> Self {
        Self {
            left: 72.0,
            top: 56.0,
            right: 0.0,
            bottom: 0.0,
        }
    }
}

/// Tunables for the canvas engine.
///
/// Pixel-denominated values (`*_px`) are divided by the viewport scale
/// before being compared against world coordinates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Smallest allowed viewport scale.
    pub min_scale: f64,
    /// Largest allowed viewport scale.
    pub max_scale: f64,
    /// Multiplicative step for keyboard zoom.
    pub zoom_step: f64,
    /// Exponential response of wheel/trackpad zoom per unit of delta.
    pub wheel_zoom_sensitivity: f64,
    /// Per-event cap on the wheel zoom factor.
    pub max_wheel_zoom_factor: f64,
    /// Global alignment-snapping switch.
    pub auto_snap: bool,
    /// Snap distance in screen pixels.
    pub snap_threshold_px: f64,
    /// Guides within this distance of the best match are shown too (world units).
    pub guide_tolerance: f64,
    /// Maximum number of undo states.
    pub history_capacity: usize,
    /// Floor for width/height produced by resize.
    pub min_element_size: f64,
    /// Draw gestures smaller than this are discarded.
    pub min_draw_size: f64,
    /// Height of the frame header band in screen pixels.
    pub header_band_px: f64,
    /// Extra hit slop for lines and paths in screen pixels.
    pub hit_slop_px: f64,
    /// Handle hit radius in screen pixels.
    pub handle_size_px: f64,
    /// Distance of the rotation handle above the top edge in screen pixels.
    pub rotate_handle_offset_px: f64,
    pub rotation_snap_step_deg: f64,
    pub rotation_snap_tolerance_deg: f64,
    /// Overlap ratio an element must exceed to attach to a frame.
    pub attach_overlap_threshold: f64,
    /// Separation gap between overlapping frames (world units).
    pub frame_gap: f64,
    /// Upper bound on frame separation passes.
    pub frame_separation_passes: usize,
    pub default_frame_size: Size,
    /// Largest side of a newly inserted image (world units).
    pub max_image_size: f64,
    /// Padding around fitted content in screen pixels.
    pub fit_padding: f64,
    pub chrome: ChromeInsets,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 1.2,
            wheel_zoom_sensitivity: 0.0015,
            max_wheel_zoom_factor: 1.25,
            auto_snap: true,
            snap_threshold_px: 8.0,
            guide_tolerance: 0.5,
            history_capacity: 50,
            min_element_size: 10.0,
            min_draw_size: 5.0,
            header_band_px: 24.0,
            hit_slop_px: 6.0,
            handle_size_px: 10.0,
            rotate_handle_offset_px: 24.0,
            rotation_snap_step_deg: 15.0,
            rotation_snap_tolerance_deg: 5.0,
            attach_overlap_threshold: 0.5,
            frame_gap: 40.0,
            frame_separation_passes: 5,
            default_frame_size: Size::new(1080.0, 1080.0),
            max_image_size: 600.0,
            fit_padding: 48.0,
            chrome: ChromeInsets::default(),
        }
    }
}

impl EngineConfig {
    /// Parse a configuration from JSON. Missing fields take their defaults.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize the configuration to JSON.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Check value ranges.
    pub fn validate(&self) -> CanvasResult<()> {
        if !(self.min_scale > 0.0) {
            return Err(CanvasError::InvalidConfig("min_scale must be positive".into()));
        }
        if self.min_scale > self.max_scale {
            return Err(CanvasError::InvalidConfig(format!(
                "min_scale {} exceeds max_scale {}",
                self.min_scale, self.max_scale
            )));
        }
        if !(self.zoom_step > 1.0) || !(self.max_wheel_zoom_factor >= 1.0) {
            return Err(CanvasError::InvalidConfig(
                "zoom factors must be greater than one".into(),
            ));
        }
        if self.history_capacity == 0 {
            return Err(CanvasError::InvalidConfig(
                "history_capacity must be at least 1".into(),
            ));
        }
        let positive = [
            ("snap_threshold_px", self.snap_threshold_px),
            ("min_element_size", self.min_element_size),
            ("header_band_px", self.header_band_px),
            ("handle_size_px", self.handle_size_px),
            ("max_image_size", self.max_image_size),
        ];
        for (name, value) in positive {
            if !(value > 0.0) {
                return Err(CanvasError::InvalidConfig(format!("{name} must be positive")));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert!(EngineConfig::default().validate().is_ok());
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config = EngineConfig::from_json(r#"{ "auto_snap": false, "history_capacity": 10 }"#)
            .unwrap();
        assert!(!config.auto_snap);
        assert_eq!(config.history_capacity, 10);
        assert!((config.max_scale - 10.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_rejects_inverted_scale_range() {
        let result = EngineConfig::from_json(r#"{ "min_scale": 4.0, "max_scale": 2.0 }"#);
        assert!(matches!(result, Err(CanvasError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_zero_capacity() {
        let result = EngineConfig::from_json(r#"{ "history_capacity": 0 }"#);
        assert!(result.is_err());
    }
}
