//! A renderer that records draw commands instead of rasterizing.
//!
//! Hosts replay the list on their own 2D backend. Geometry is in world
//! coordinates; each command carries the affine that maps it to device
//! pixels.

use crate::renderer::{RenderContext, Renderer};
use aidesign_core::bitmap::Bitmap;
use aidesign_core::elements::{Element, ElementKind, TextAlign};
use aidesign_core::hit_test::header_band;
use aidesign_core::selection::HandleKind;
use aidesign_core::snap::GuideAxis;
use aidesign_core::{Canvas, TextEditTarget};
use kurbo::{Affine, BezPath, Circle, Line, Point, Rect, Shape};
use peniko::Color;
use std::sync::Arc;

/// Shimmer sweep period in seconds.
const SHIMMER_PERIOD: f64 = 1.6;
/// Frame label size in screen pixels.
const LABEL_FONT_PX: f64 = 12.0;
const HANDLE_SIZE_PX: f64 = 8.0;
const OUTLINE_WIDTH_PX: f64 = 1.0;
const DROP_TARGET_WIDTH_PX: f64 = 2.0;

/// One recorded drawing operation.
#[derive(Debug, Clone)]
pub enum DrawCommand {
    /// Fill the whole target.
    Clear(Color),
    FillPath {
        path: BezPath,
        transform: Affine,
        color: Color,
    },
    StrokePath {
        path: BezPath,
        transform: Affine,
        color: Color,
        /// Width in world units.
        width: f64,
        dashed: bool,
    },
    /// Text laid out inside `rect`.
    Text {
        content: String,
        rect: Rect,
        font_size: f64,
        color: Color,
        align: TextAlign,
        transform: Affine,
    },
    /// A decoded bitmap stretched over `rect`.
    Image {
        bitmap: Arc<Bitmap>,
        rect: Rect,
        transform: Affine,
    },
    /// Clip everything until the matching `PopClip` to `rect`.
    PushClip { rect: Rect, transform: Affine },
    PopClip,
    /// Animated highlight over a loading frame; `phase` runs from 0 to 1.
    Shimmer {
        rect: Rect,
        transform: Affine,
        phase: f64,
        color: Color,
    },
}

/// Records a frame as a flat list of [`DrawCommand`]s.
#[derive(Debug, Default)]
pub struct DisplayListRenderer {
    commands: Vec<DrawCommand>,
}

impl DisplayListRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commands recorded by the last `build_scene`.
    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Take ownership of the recorded commands.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    fn fill(&mut self, path: BezPath, transform: Affine, color: Color) {
        self.commands.push(DrawCommand::FillPath { path, transform, color });
    }

    fn stroke(&mut self, path: BezPath, transform: Affine, color: Color, width: f64, dashed: bool) {
        self.commands.push(DrawCommand::StrokePath {
            path,
            transform,
            color,
            width,
            dashed,
        });
    }

    /// Render a frame: body, label, clipped children, then shimmer.
    fn render_frame_element(&mut self, ctx: &RenderContext, frame: &Element, view: Affine) {
        let Some(data) = frame.as_frame() else {
            return;
        };
        let canvas = ctx.canvas;
        let bounds = frame.bounds();
        let px = canvas.viewport.px_to_world(1.0);

        self.fill(bounds.to_path(0.1), view, data.fill.into());
        if let Some(stroke) = data.stroke {
            self.stroke(bounds.to_path(0.1), view, stroke.into(), OUTLINE_WIDTH_PX * px, false);
        }

        let renaming = canvas.editing() == Some((frame.id, TextEditTarget::FrameName));
        if !renaming {
            self.commands.push(DrawCommand::Text {
                content: data.name.clone(),
                rect: header_band(frame, canvas.viewport.scale, canvas.config.header_band_px),
                font_size: LABEL_FONT_PX * px,
                color: ctx.style.label,
                align: TextAlign::Left,
                transform: view,
            });
        }

        self.commands.push(DrawCommand::PushClip { rect: bounds, transform: view });
        for child in canvas.frame_children(frame.id) {
            self.render_element(canvas, child, view);
        }
        self.commands.push(DrawCommand::PopClip);

        if data.loading {
            self.commands.push(DrawCommand::Shimmer {
                rect: bounds,
                transform: view,
                phase: ctx.time.rem_euclid(SHIMMER_PERIOD) / SHIMMER_PERIOD,
                color: ctx.style.shimmer,
            });
        }
    }

    /// Render a single non-frame element.
    fn render_element(&mut self, canvas: &Canvas, element: &Element, view: Affine) {
        let transform = view * element.rotation_transform();
        let bounds = element.bounds();
        match &element.kind {
            ElementKind::Shape(shape) => {
                let path = element.outline();
                if !element.is_line() {
                    if let Some(fill) = shape.fill {
                        self.fill(path.clone(), transform, fill.into());
                    }
                }
                if let Some(stroke) = shape.stroke.filter(|_| shape.stroke_width > 0.0) {
                    self.stroke(path, transform, stroke.into(), shape.stroke_width, false);
                }
            }
            ElementKind::Path(path) => {
                if path.points.len() >= 2 {
                    self.stroke(path.to_path(), transform, path.stroke.into(), path.stroke_width, false);
                }
            }
            ElementKind::Text(text) => {
                // The host's text input overlay shows the content while editing.
                if canvas.editing() == Some((element.id, TextEditTarget::Text)) {
                    return;
                }
                self.commands.push(DrawCommand::Text {
                    content: text.content.clone(),
                    rect: bounds,
                    font_size: text.font_size,
                    color: text.color.into(),
                    align: text.align,
                    transform,
                });
            }
            ElementKind::Image(image) => match &image.bitmap {
                Some(bitmap) => self.commands.push(DrawCommand::Image {
                    bitmap: Arc::clone(bitmap),
                    rect: bounds,
                    transform,
                }),
                None => log::trace!("Skipping image {} without a bitmap", element.id),
            },
            ElementKind::Frame(_) => {}
        }
    }

    /// Render a selection outline around an element, following its rotation.
    fn render_outline(&mut self, element: &Element, view: Affine, color: Color, width: f64, dashed: bool) {
        let transform = view * element.rotation_transform();
        self.stroke(element.bounds().to_path(0.1), transform, color, width, dashed);
    }

    /// Render selection handles.
    /// Sizes are in screen pixels, converted to world units with `px`.
    fn render_handles(&mut self, canvas: &Canvas, view: Affine, color: Color, px: f64) {
        let half = HANDLE_SIZE_PX * px / 2.0;
        for handle in canvas.handles() {
            let path = match handle.kind {
                HandleKind::Rotate => Circle::new(handle.position, half).to_path(0.1),
                HandleKind::Corner(_) | HandleKind::Edge(_) => {
                    Rect::from_center_size(handle.position, (half * 2.0, half * 2.0)).to_path(0.1)
                }
            };
            self.fill(path.clone(), view, Color::WHITE);
            self.stroke(path, view, color, OUTLINE_WIDTH_PX * px, false);
        }
    }

    /// Render snap guide lines.
    fn render_guides(&mut self, canvas: &Canvas, view: Affine, color: Color, px: f64) {
        for guide in canvas.guides() {
            let line = match guide.axis {
                GuideAxis::Vertical => Line::new(
                    Point::new(guide.position, guide.start),
                    Point::new(guide.position, guide.end),
                ),
                GuideAxis::Horizontal => Line::new(
                    Point::new(guide.start, guide.position),
                    Point::new(guide.end, guide.position),
                ),
            };
            self.stroke(line.to_path(0.1), view, color, OUTLINE_WIDTH_PX * px, false);
        }
    }
}

impl Renderer for DisplayListRenderer {
    fn build_scene(&mut self, ctx: &RenderContext) {
        self.commands.clear();
        let canvas = ctx.canvas;
        let view = Affine::scale(ctx.scale_factor) * canvas.viewport.transform();
        let px = canvas.viewport.px_to_world(1.0);
        let selection_color = ctx.style.selection;

        self.commands.push(DrawCommand::Clear(self.background_color(ctx)));

        // Content in z-order. Children paint inside their frame's clip;
        // elements whose parent no longer resolves paint at top level.
        for element in canvas.elements.iter() {
            if element.is_frame() {
                self.render_frame_element(ctx, element, view);
            } else if canvas.elements.parent_of(element.id).is_none() {
                self.render_element(canvas, element, view);
            }
        }

        if let Some(preview) = canvas.draw_preview() {
            self.render_element(canvas, preview, view);
        }

        if let Some(target) = canvas.drop_target().and_then(|id| canvas.elements.get(id)) {
            self.render_outline(target, view, selection_color, DROP_TARGET_WIDTH_PX * px, false);
        }

        if let Some(entered) = canvas.entered_frame().and_then(|id| canvas.elements.get(id)) {
            self.render_outline(entered, view, selection_color, OUTLINE_WIDTH_PX * px, true);
        }

        for element in canvas.selected_elements() {
            self.render_outline(element, view, selection_color, OUTLINE_WIDTH_PX * px, false);
        }
        self.render_handles(canvas, view, selection_color, px);

        self.render_guides(canvas, view, ctx.style.guide, px);

        if let Some(rect) = canvas.marquee_rect() {
            self.fill(rect.to_path(0.1), view, selection_color.with_alpha(0.1));
            self.stroke(rect.to_path(0.1), view, selection_color, OUTLINE_WIDTH_PX * px, false);
        }

        if let Some((id, target)) = canvas.editing() {
            if let Some(element) = canvas.elements.get(id) {
                match target {
                    TextEditTarget::Text => {
                        self.render_outline(element, view, selection_color, OUTLINE_WIDTH_PX * px, true)
                    }
                    TextEditTarget::FrameName => {
                        let band = header_band(element, canvas.viewport.scale, canvas.config.header_band_px);
                        self.stroke(band.to_path(0.1), view, selection_color, OUTLINE_WIDTH_PX * px, true);
                    }
                }
            }
        }

        log::trace!("Recorded {} draw commands", self.commands.len());
    }
}
