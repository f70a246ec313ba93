//! Renderer trait abstraction.

use aidesign_core::canvas::Canvas;
use kurbo::Size;
use peniko::Color;
use thiserror::Error;

/// Renderer errors.
#[derive(Debug, Error)]
pub enum RendererError {
    #[error("Invalid viewport size: {width}x{height}")]
    InvalidViewport { width: f64, height: f64 },
}

/// Result type for renderer operations.
pub type RenderResult<T> = Result<T, RendererError>;

/// Colors used for canvas chrome and overlays.
#[derive(Debug, Clone, Copy)]
pub struct RenderStyle {
    pub background: Color,
    /// Selection outlines, handles, drop targets and the marquee.
    pub selection: Color,
    /// Snap guide lines.
    pub guide: Color,
    /// Frame name labels.
    pub label: Color,
    /// Loading shimmer highlight.
    pub shimmer: Color,
}

impl Default for RenderStyle {
    fn default() -> Self {
        Self {
            background: Color::from_rgba8(245, 245, 245, 255),
            selection: Color::from_rgba8(59, 130, 246, 255), // Blue
            guide: Color::from_rgba8(236, 72, 153, 255),     // Pink
            label: Color::from_rgba8(110, 110, 110, 255),
            shimmer: Color::from_rgba8(255, 255, 255, 140),
        }
    }
}

/// Context for a single render frame.
pub struct RenderContext<'a> {
    /// The canvas to render.
    pub canvas: &'a Canvas,
    /// Viewport size in physical pixels.
    pub viewport_size: Size,
    /// Device pixel ratio (for HiDPI).
    pub scale_factor: f64,
    /// Seconds since the host started, drives the loading shimmer.
    pub time: f64,
    pub style: RenderStyle,
}

impl<'a> RenderContext<'a> {
    /// Create a new render context.
    pub fn new(canvas: &'a Canvas, viewport_size: Size) -> Self {
        Self {
            canvas,
            viewport_size,
            scale_factor: 1.0,
            time: 0.0,
            style: RenderStyle::default(),
        }
    }

    /// Set the scale factor for HiDPI.
    pub fn with_scale_factor(mut self, scale_factor: f64) -> Self {
        self.scale_factor = scale_factor;
        self
    }

    /// Set the animation time in seconds.
    pub fn with_time(mut self, time: f64) -> Self {
        self.time = time;
        self
    }

    pub fn with_style(mut self, style: RenderStyle) -> Self {
        self.style = style;
        self
    }

    /// Set the background color.
    pub fn with_background(mut self, color: Color) -> Self {
        self.style.background = color;
        self
    }
}

/// Trait for rendering backends.
///
/// Implementations can record commands, rasterize, or drive a GPU scene.
pub trait Renderer: Send + Sync {
    /// Build the scene/command buffer for a frame.
    ///
    /// This method is called once per frame and should prepare all drawing commands.
    fn build_scene(&mut self, ctx: &RenderContext);

    /// Get the background color (for clearing).
    fn background_color(&self, ctx: &RenderContext) -> Color {
        ctx.style.background
    }
}

/// Per-frame parameters supplied by the host.
#[derive(Debug, Clone, Copy)]
pub struct FrameParams {
    pub scale_factor: f64,
    pub time: f64,
    pub style: RenderStyle,
}

impl Default for FrameParams {
    fn default() -> Self {
        Self {
            scale_factor: 1.0,
            time: 0.0,
            style: RenderStyle::default(),
        }
    }
}

/// Run one render pass: flush the canvas's pending state, then build the scene.
///
/// The selection hook fires here, at most once per pass. A viewport with no
/// drawable area is rejected before anything is flushed, so the render stays
/// pending until the host reports a real size.
pub fn render_frame<R: Renderer + ?Sized>(
    canvas: &mut Canvas,
    renderer: &mut R,
    params: FrameParams,
) -> RenderResult<()> {
    let Size { width, height } = canvas.viewport_size;
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        log::warn!("Skipping render pass for viewport {}x{}", width, height);
        return Err(RendererError::InvalidViewport { width, height });
    }
    canvas.begin_render_pass();
    let scale_factor = if params.scale_factor > 0.0 { params.scale_factor } else { 1.0 };
    let viewport_size = Size::new(
        canvas.viewport_size.width * scale_factor,
        canvas.viewport_size.height * scale_factor,
    );
    let ctx = RenderContext::new(canvas, viewport_size)
        .with_scale_factor(scale_factor)
        .with_time(params.time)
        .with_style(params.style);
    renderer.build_scene(&ctx);
    Ok(())
}
