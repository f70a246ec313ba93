//! The canvas engine: owns the element store, viewport, selection, history
//! and tool state, and is the single entry point for hosts.

use crate::bitmap::{Bitmap, BitmapLoads, BitmapTicket, decode_data_url};
use crate::config::EngineConfig;
use crate::elements::{Element, ElementId, ImageData};
use crate::error::CanvasResult;
use crate::frames;
use crate::history::History;
use crate::hit_test::{self, HitTarget, HitTestParams};
use crate::input::{InputState, KeyEvent, Modifiers};
use crate::interaction::Interaction;
use crate::selection::{Handle, HandleParams, get_handles};
use crate::snap::{Guide, SnapParams};
use crate::store::ElementStore;
use crate::tools::{CursorIcon, ToolKind};
use crate::viewport::Viewport;
use kurbo::{Point, Rect, Size, Vec2};
use std::sync::Arc;

/// Which string a text edit targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextEditTarget {
    /// The content of a text element.
    Text,
    /// The name of a frame.
    FrameName,
}

/// Requests the engine queues for the host. Drained with [`Canvas::take_events`].
#[derive(Debug, Clone, PartialEq)]
pub enum CanvasEvent {
    /// The image tool was picked; the host should obtain an image and call
    /// [`Canvas::insert_image`].
    RequestImage,
    /// A text input overlay should be shown and focused.
    TextEditStarted { id: ElementId, target: TextEditTarget },
    /// The text input overlay should be hidden.
    TextEditEnded { id: ElementId, committed: bool },
    ToolChanged(ToolKind),
}

type SelectionHook = Box<dyn FnMut(&[ElementId])>;

/// The canvas engine context.
///
/// There is no global state: hosts own a `Canvas` and forward input and
/// render requests to it.
pub struct Canvas {
    pub config: EngineConfig,
    /// The live, ordered element store.
    pub elements: ElementStore,
    /// Selected element ids, in selection order.
    pub selection: Vec<ElementId>,
    pub viewport: Viewport,
    /// Viewport size in screen pixels.
    pub viewport_size: Size,
    pub(crate) history: History,
    pub(crate) tool: ToolKind,
    pub(crate) interaction: Interaction,
    pub(crate) input: InputState,
    pub(crate) entered_frame: Option<ElementId>,
    pub(crate) cursor: CursorIcon,
    /// Snap guides of the gesture in progress.
    pub(crate) guides: Vec<Guide>,
    /// Frame highlighted as the drop target of a drag.
    pub(crate) drop_target: Option<ElementId>,
    events: Vec<CanvasEvent>,
    render_pending: bool,
    selection_hook: Option<SelectionHook>,
    hook_last_selection: Vec<ElementId>,
    bitmap_loads: BitmapLoads,
}

impl Default for Canvas {
    fn default() -> Self {
        Self::new(EngineConfig::default())
    }
}

impl Canvas {
    /// Create an empty canvas.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_store(config, ElementStore::new())
    }

    /// Create a canvas over existing elements. The store becomes the history baseline.
    pub fn with_store(config: EngineConfig, elements: ElementStore) -> Self {
        let history = History::new(&elements, config.history_capacity);
        Self {
            viewport: Viewport::new(config.min_scale, config.max_scale),
            viewport_size: Size::new(800.0, 600.0),
            history,
            tool: ToolKind::default(),
            interaction: Interaction::Idle,
            input: InputState::new(),
            entered_frame: None,
            cursor: CursorIcon::Default,
            guides: Vec::new(),
            drop_target: None,
            events: Vec::new(),
            render_pending: false,
            selection_hook: None,
            hook_last_selection: Vec::new(),
            bitmap_loads: BitmapLoads::new(),
            selection: Vec::new(),
            elements,
            config,
        }
    }

    /// Create a canvas from a JSON configuration.
    pub fn from_config_json(json: &str) -> CanvasResult<Self> {
        Ok(Self::new(EngineConfig::from_json(json)?))
    }

    pub fn tool(&self) -> ToolKind {
        self.tool
    }

    pub fn cursor(&self) -> CursorIcon {
        self.cursor
    }

    /// The frame whose children are directly selectable, if any.
    pub fn entered_frame(&self) -> Option<ElementId> {
        self.entered_frame
    }

    /// Alignment guides of the current drag or resize.
    pub fn guides(&self) -> &[Guide] {
        &self.guides
    }

    pub fn drop_target(&self) -> Option<ElementId> {
        self.drop_target
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    // --- History ---

    /// Record the current store on the undo stack (deduplicated).
    pub fn save_state(&mut self) -> bool {
        self.history.save_state(&self.elements)
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    pub fn undo(&mut self) -> bool {
        self.commit_text_edit();
        if !self.history.undo(&mut self.elements) {
            return false;
        }
        log::debug!("Undo ({} levels left)", self.history.past_len() - 1);
        self.after_store_replaced();
        true
    }

    pub fn redo(&mut self) -> bool {
        self.commit_text_edit();
        if !self.history.redo(&mut self.elements) {
            return false;
        }
        log::debug!("Redo ({} levels left)", self.history.future_len());
        self.after_store_replaced();
        true
    }

    /// Run several mutations with history paused, then record one snapshot.
    pub fn batch<R>(&mut self, f: impl FnOnce(&mut Self) -> R) -> R {
        self.history.suppress();
        let result = f(self);
        self.history.resume();
        self.save_state();
        self.request_render();
        result
    }

    fn after_store_replaced(&mut self) {
        self.interaction = Interaction::Idle;
        self.prune_selection();
        if self
            .entered_frame
            .is_some_and(|id| !self.elements.get(id).is_some_and(Element::is_frame))
        {
            self.entered_frame = None;
        }
        self.guides.clear();
        self.drop_target = None;
        self.request_render();
    }

    fn prune_selection(&mut self) {
        let elements = &self.elements;
        self.selection.retain(|id| elements.contains(*id));
    }

    // --- Rendering and hooks ---

    /// Ask for a render. Returns true only for the first request since the
    /// last render pass; the host schedules one frame in that case.
    pub fn request_render(&mut self) -> bool {
        let first = !self.render_pending;
        self.render_pending = true;
        first
    }

    pub fn is_render_pending(&self) -> bool {
        self.render_pending
    }

    /// Start a render pass: clears the pending flag and notifies the
    /// selection hook if the selection changed since it last ran.
    pub fn begin_render_pass(&mut self) {
        self.render_pending = false;
        self.prune_selection();
        if self.selection == self.hook_last_selection {
            return;
        }
        self.hook_last_selection = self.selection.clone();
        if let Some(hook) = self.selection_hook.as_mut() {
            hook(&self.selection);
        }
    }

    /// Install a selection-change hook after any existing one.
    ///
    /// The previous hook still runs first on every change.
    pub fn chain_selection_hook(&mut self, mut hook: impl FnMut(&[ElementId]) + 'static) {
        let chained: SelectionHook = match self.selection_hook.take() {
            Some(mut previous) => Box::new(move |ids: &[ElementId]| {
                previous(ids);
                hook(ids);
            }),
            None => Box::new(hook),
        };
        self.selection_hook = Some(chained);
    }

    /// Drain queued host requests.
    pub fn take_events(&mut self) -> Vec<CanvasEvent> {
        std::mem::take(&mut self.events)
    }

    pub(crate) fn emit(&mut self, event: CanvasEvent) {
        self.events.push(event);
    }

    // --- Tools ---

    /// Switch tools.
    ///
    /// Commits any text edit and clears the selection and entered frame.
    /// `Frame` and `Image` act once and leave `Move` active.
    pub fn set_tool(&mut self, tool: ToolKind) {
        self.commit_text_edit();
        self.interaction = Interaction::Idle;
        self.guides.clear();
        self.drop_target = None;
        self.selection.clear();
        self.entered_frame = None;

        match tool {
            ToolKind::Frame => {
                self.tool = ToolKind::Move;
                let id = self.create_frame_at_center();
                log::debug!("Frame tool created {}", id);
            }
            ToolKind::Image => {
                self.tool = ToolKind::Move;
                self.emit(CanvasEvent::RequestImage);
                log::debug!("Image tool requested an image from the host");
            }
            other => {
                self.tool = other;
                log::debug!("Tool changed to {:?}", other);
            }
        }
        self.cursor = self.tool.cursor();
        self.emit(CanvasEvent::ToolChanged(self.tool));
        self.request_render();
    }

    // --- Selection ---

    pub fn select(&mut self, id: ElementId) {
        self.selection.clear();
        self.add_to_selection(id);
    }

    pub fn add_to_selection(&mut self, id: ElementId) {
        if self.elements.contains(id) && !self.selection.contains(&id) {
            self.selection.push(id);
            self.request_render();
        }
    }

    /// Add `id` if unselected, remove it otherwise.
    pub fn toggle_selection(&mut self, id: ElementId) {
        if let Some(pos) = self.selection.iter().position(|s| *s == id) {
            self.selection.remove(pos);
            self.request_render();
        } else {
            self.add_to_selection(id);
        }
    }

    pub fn clear_selection(&mut self) {
        if !self.selection.is_empty() {
            self.selection.clear();
            self.request_render();
        }
    }

    /// Select every element that is not inside a frame.
    pub fn select_all(&mut self) {
        self.selection = self
            .elements
            .iter()
            .filter(|e| self.elements.parent_of(e.id).is_none())
            .map(|e| e.id)
            .collect();
        self.request_render();
    }

    pub fn is_selected(&self, id: ElementId) -> bool {
        self.selection.contains(&id)
    }

    /// Live references to the selected elements.
    pub fn selected_elements(&self) -> impl Iterator<Item = &Element> {
        self.selection.iter().filter_map(|id| self.elements.get(*id))
    }

    /// The selected element when exactly one is selected.
    pub fn single_selected(&self) -> Option<ElementId> {
        match self.selection.as_slice() {
            [id] => Some(*id),
            _ => None,
        }
    }

    /// Delete the selection and everything inside selected frames.
    /// Returns the number of removed elements.
    pub fn delete_selected(&mut self) -> usize {
        if self.selection.is_empty() {
            return 0;
        }
        let removed = self.elements.delete_cascade(&self.selection);
        self.selection.clear();
        if self.entered_frame.is_some_and(|id| removed.contains(&id)) {
            self.entered_frame = None;
        }
        log::debug!("Deleted {} element(s)", removed.len());
        self.save_state();
        self.request_render();
        removed.len()
    }

    // --- Queries ---

    pub fn frame_children(&self, frame_id: ElementId) -> Vec<&Element> {
        self.elements.frame_children(frame_id)
    }

    /// Hit-test a world point with the current view state.
    pub fn find_element_at(&self, world: Point) -> Option<HitTarget> {
        hit_test::find_element_at(&self.elements, world, &self.hit_params())
    }

    /// Handles of the single selected element, when they are shown.
    pub fn handles(&self) -> Vec<Handle> {
        if !self.interaction.shows_handles() {
            return Vec::new();
        }
        self.single_selected()
            .and_then(|id| self.elements.get(id))
            .map(|el| get_handles(el, &self.handle_params()))
            .unwrap_or_default()
    }

    pub(crate) fn hit_params(&self) -> HitTestParams {
        HitTestParams {
            scale: self.viewport.scale,
            header_band_px: self.config.header_band_px,
            slop_px: self.config.hit_slop_px,
            entered_frame: self.entered_frame,
        }
    }

    pub(crate) fn handle_params(&self) -> HandleParams {
        HandleParams {
            scale: self.viewport.scale,
            size_px: self.config.handle_size_px,
            rotate_offset_px: self.config.rotate_handle_offset_px,
        }
    }

    pub(crate) fn snap_params(&self) -> SnapParams {
        SnapParams::new(
            self.config.auto_snap,
            self.config.snap_threshold_px,
            self.viewport.scale,
            self.config.guide_tolerance,
        )
    }

    fn visible_center(&self) -> Point {
        self.viewport.visible_world_rect(self.viewport_size).center()
    }

    // --- Creation ---

    /// Add an element created by a collaborator.
    ///
    /// Non-frames are attached by overlap. Frames are pushed clear of other
    /// frames, then adopt loose elements they now cover. Records history.
    pub fn add_element(&mut self, element: Element) -> ElementId {
        let is_frame = element.is_frame();
        let id = self.elements.push(element);
        if is_frame {
            frames::resolve_frame_overlaps(
                &mut self.elements,
                id,
                self.config.frame_gap,
                self.config.frame_separation_passes,
            );
            let threshold = self.config.attach_overlap_threshold;
            let adopted = frames::adopt_loose_elements(&mut self.elements, threshold);
            if adopted > 0 {
                log::debug!("Frame {} adopted {} element(s)", id, adopted);
            }
        } else {
            frames::update_frame_attachment(&mut self.elements, id, self.config.attach_overlap_threshold);
        }
        self.save_state();
        self.request_render();
        id
    }

    /// Create a default-sized frame centered in view and select it.
    pub fn create_frame_at_center(&mut self) -> ElementId {
        let rect = Rect::from_center_size(self.visible_center(), self.config.default_frame_size);
        let name = format!("Frame {}", self.elements.frames().count() + 1);
        let id = self.add_element(Element::frame(rect, name));
        self.selection = vec![id];
        id
    }

    /// Decode `src`, insert it as an image centered in view and select it.
    pub fn insert_image(&mut self, src: &str) -> CanvasResult<ElementId> {
        let bitmap = decode_data_url(src)?;
        let data = ImageData::with_bitmap(src, Arc::new(bitmap));
        let size = data.fit_within(self.config.max_image_size);
        log::info!(
            "Inserting {}x{} image at {}x{}",
            data.natural_width,
            data.natural_height,
            size.width,
            size.height
        );
        let rect = Rect::from_center_size(self.visible_center(), size);
        let id = self.add_element(Element::image(rect, data));
        self.selection = vec![id];
        Ok(id)
    }

    // --- View ---

    pub fn set_viewport_size(&mut self, width: f64, height: f64) {
        self.viewport_size = Size::new(width, height);
        self.request_render();
    }

    /// Fit the view to every element.
    pub fn fit_to_content(&mut self) -> bool {
        let Some(bounds) = self.elements.content_bounds() else {
            return false;
        };
        self.fit_to_rect(bounds);
        true
    }

    /// Fit the view to the selection.
    pub fn fit_to_selection(&mut self) -> bool {
        let Some(bounds) = self.elements.bounds_of(&self.selection) else {
            return false;
        };
        self.fit_to_rect(bounds);
        true
    }

    fn fit_to_rect(&mut self, bounds: Rect) {
        self.viewport
            .fit_to_bounds(bounds, self.viewport_size, self.config.chrome, self.config.fit_padding);
        self.request_render();
    }

    /// Keyboard zoom around the viewport center.
    pub fn zoom_by_step(&mut self, zoom_in: bool) {
        let center = Point::new(self.viewport_size.width / 2.0, self.viewport_size.height / 2.0);
        self.viewport.zoom_step(center, self.config.zoom_step, zoom_in);
        self.request_render();
    }

    /// Wheel or trackpad scroll: zoom around the pointer with the command
    /// modifier, otherwise pan.
    pub fn handle_wheel(&mut self, position: Point, delta: Vec2, modifiers: Modifiers) {
        self.input.modifiers = modifiers;
        if modifiers.command() {
            self.viewport.zoom_wheel(
                position,
                delta.y,
                self.config.wheel_zoom_sensitivity,
                self.config.max_wheel_zoom_factor,
            );
        } else {
            self.viewport.pan(-delta.x, -delta.y);
        }
        self.request_render();
    }

    // --- Keyboard ---

    pub fn handle_key_event(&mut self, event: &KeyEvent, modifiers: Modifiers) -> bool {
        match event {
            KeyEvent::Pressed(key) => self.handle_key_down(key, modifiers),
            KeyEvent::Released(key) => {
                self.handle_key_up(key, modifiers);
                false
            }
        }
    }

    /// Handle a key press (DOM key names). Returns true if the key was used.
    ///
    /// While a text edit is active only Escape is handled; other keys belong
    /// to the host's text input.
    pub fn handle_key_down(&mut self, key: &str, modifiers: Modifiers) -> bool {
        self.input.modifiers = modifiers;
        if self.is_editing_text() {
            if key == "Escape" {
                self.cancel_text_edit();
                return true;
            }
            return false;
        }
        if key == " " {
            self.input.space_held = true;
            if self.interaction.is_idle() {
                self.cursor = CursorIcon::Grab;
            }
            return true;
        }
        if !self.interaction.is_idle() {
            return false;
        }

        if modifiers.command() {
            match key.to_ascii_lowercase().as_str() {
                "z" if modifiers.shift => {
                    self.redo();
                }
                "z" => {
                    self.undo();
                }
                "y" => {
                    self.redo();
                }
                "a" => self.select_all(),
                "=" | "+" => self.zoom_by_step(true),
                "-" => self.zoom_by_step(false),
                _ => return false,
            }
            return true;
        }

        match key {
            "Delete" | "Backspace" => {
                self.delete_selected();
            }
            "Escape" => self.escape(),
            "ArrowLeft" | "ArrowRight" | "ArrowUp" | "ArrowDown" => {
                let step = if modifiers.shift { 10.0 } else { 1.0 };
                let delta = match key {
                    "ArrowLeft" => Vec2::new(-step, 0.0),
                    "ArrowRight" => Vec2::new(step, 0.0),
                    "ArrowUp" => Vec2::new(0.0, -step),
                    _ => Vec2::new(0.0, step),
                };
                return self.nudge_selection(delta);
            }
            "!" | "1" if modifiers.shift => {
                self.fit_to_content();
            }
            "@" | "2" if modifiers.shift => {
                self.fit_to_selection();
            }
            _ => match ToolKind::from_shortcut(key) {
                Some(tool) if !modifiers.alt => self.set_tool(tool),
                _ => return false,
            },
        }
        true
    }

    pub fn handle_key_up(&mut self, key: &str, modifiers: Modifiers) {
        self.input.modifiers = modifiers;
        if key == " " {
            self.input.space_held = false;
            if self.interaction.is_idle() {
                self.cursor = self.tool.cursor();
            }
        }
    }

    /// Leave the entered frame, or else clear the selection.
    fn escape(&mut self) {
        if self.entered_frame.take().is_some() {
            log::debug!("Left entered frame");
        } else {
            self.selection.clear();
        }
        self.request_render();
    }

    /// Move the selection (and children of selected frames) by `delta`.
    pub fn nudge_selection(&mut self, delta: Vec2) -> bool {
        if self.selection.is_empty() {
            return false;
        }
        let moving = self.elements.cascade_set(&self.selection);
        for element in self.elements.iter_mut().filter(|e| moving.contains(&e.id)) {
            element.translate(delta);
        }
        self.save_state();
        self.request_render();
        true
    }

    // --- Bitmaps ---

    /// Start loading the bitmap of an image element.
    ///
    /// Any earlier ticket for the same element becomes stale.
    pub fn begin_bitmap_load(&mut self, id: ElementId) -> Option<BitmapTicket> {
        let src = self.elements.get(id)?.as_image()?.src.clone();
        Some(self.bitmap_loads.issue(id, &src))
    }

    /// Apply the outcome of a bitmap load. Returns true if a bitmap was set.
    ///
    /// Stale tickets (superseded, element gone, or `src` changed) are dropped.
    pub fn finish_bitmap_load(&mut self, ticket: BitmapTicket, result: CanvasResult<Bitmap>) -> bool {
        if !self.bitmap_loads.complete(&ticket) {
            log::debug!("Dropping superseded bitmap load for {}", ticket.element_id);
            return false;
        }
        let Some(image) = self
            .elements
            .get_mut(ticket.element_id)
            .and_then(Element::as_image_mut)
        else {
            log::debug!("Dropping bitmap load for removed element {}", ticket.element_id);
            return false;
        };
        if image.src != ticket.src {
            log::debug!("Dropping bitmap load for {}: source changed", ticket.element_id);
            return false;
        }
        match result {
            Ok(bitmap) => {
                image.bitmap = Some(Arc::new(bitmap));
                self.request_render();
                true
            }
            Err(err) => {
                log::warn!("Failed to load bitmap for {}: {}", ticket.element_id, err);
                false
            }
        }
    }

    /// Decode bitmaps for every image that lacks one. Returns how many loaded.
    pub fn hydrate_bitmaps(&mut self) -> usize {
        let missing: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|e| e.as_image().is_some_and(|img| img.bitmap.is_none()))
            .map(|e| e.id)
            .collect();
        let mut loaded = 0;
        for id in missing {
            if let Some(ticket) = self.begin_bitmap_load(id) {
                let result = decode_data_url(&ticket.src);
                if self.finish_bitmap_load(ticket, result) {
                    loaded += 1;
                }
            }
        }
        loaded
    }

    // --- Documents ---

    /// Replace the canvas content with a saved document.
    ///
    /// Resets history to the loaded state and re-hydrates bitmaps.
    pub fn load_document(&mut self, json: &str) -> CanvasResult<()> {
        let elements = ElementStore::from_json(json)?;
        self.commit_text_edit();
        self.elements = elements;
        self.selection.clear();
        self.entered_frame = None;
        self.history.reset(&self.elements);
        self.after_store_replaced();
        let loaded = self.hydrate_bitmaps();
        log::info!("Loaded document with {} element(s), {} bitmap(s)", self.elements.len(), loaded);
        Ok(())
    }

    pub fn to_document(&self) -> CanvasResult<String> {
        self.elements.to_json()
    }
}
