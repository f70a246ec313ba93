//! AI-Design Render Library
//!
//! Renderer abstraction for the AI-Design canvas.
//! The bundled implementation records a display list for the host to replay.

mod display_list;
mod renderer;

pub use display_list::{DisplayListRenderer, DrawCommand};
pub use renderer::{FrameParams, RenderContext, RenderResult, RenderStyle, Renderer, RendererError, render_frame};
