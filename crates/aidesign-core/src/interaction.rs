//! Pointer interaction state machine.
//!
//! Exactly one gesture is active at a time. Pointer-down picks it (handle
//! hit, then element hit, then empty space); pointer-up commits it.

use crate::canvas::{Canvas, CanvasEvent, TextEditTarget};
use crate::elements::{DEFAULT_FONT_SIZE, Element, ElementId, ElementKind, ShapeType};
use crate::frames;
use crate::hit_test::{HitTarget, elements_in_marquee};
use crate::input::{Modifiers, MouseButton, PointerEvent};
use crate::selection::{
    HandleKind, ResizeFrame, ResizeSnap, corner_resize, edge_resize, hit_test_handles,
    map_rect_between, pointer_angle, rotation_for_drag,
};
use crate::snap::snap_move;
use crate::tools::{CursorIcon, ToolKind};
use kurbo::{Point, Rect, Size, Vec2};
use std::time::Instant;

/// Starting geometry of one dragged element.
#[derive(Debug, Clone)]
pub(crate) struct DragStart {
    id: ElementId,
    bounds: Rect,
    is_path: bool,
}

/// State for moving the selection.
#[derive(Debug, Clone)]
pub(crate) struct DragState {
    start_pointer: Point,
    last_pointer: Point,
    starts: Vec<DragStart>,
    /// Bounds of everything that is not moving, for snapping.
    targets: Vec<Rect>,
    /// Element that was pressed to start the drag.
    click_target: ElementId,
    moved: bool,
}

/// State for a handle resize of the primary selection.
#[derive(Debug, Clone)]
pub(crate) struct ResizeState {
    id: ElementId,
    handle: HandleKind,
    start_bounds: Rect,
    rotation: f64,
    start_font_size: Option<f64>,
    /// Children of a resized frame: id, start bounds and start font size.
    children: Vec<(ElementId, Rect, Option<f64>)>,
    targets: Vec<Rect>,
}

#[derive(Debug, Clone)]
pub(crate) struct RotateState {
    id: ElementId,
    center: Point,
    start_angle: f64,
    start_rotation: f64,
}

/// An element being drawn; it only joins the store on release.
#[derive(Debug, Clone)]
pub(crate) struct DrawState {
    start: Point,
    /// `None` for freehand paths.
    shape: Option<ShapeType>,
    preview: Element,
}

#[derive(Debug, Clone)]
pub(crate) struct TextEdit {
    id: ElementId,
    target: TextEditTarget,
    /// Content (or frame name) before the edit, restored on cancel.
    original: String,
}

/// The active gesture.
#[derive(Debug, Clone, Default)]
pub(crate) enum Interaction {
    #[default]
    Idle,
    /// Last pointer position in screen coordinates.
    Panning { last: Point },
    /// World-space corners; `base` is kept selected (shift-marquee).
    MarqueeSelecting {
        start: Point,
        current: Point,
        base: Vec<ElementId>,
    },
    Dragging(DragState),
    Resizing(ResizeState),
    Rotating(RotateState),
    Drawing(DrawState),
    EditingText(TextEdit),
}

impl Interaction {
    pub(crate) fn is_idle(&self) -> bool {
        matches!(self, Interaction::Idle)
    }

    pub(crate) fn shows_handles(&self) -> bool {
        !matches!(
            self,
            Interaction::Drawing(_) | Interaction::EditingText(_) | Interaction::MarqueeSelecting { .. }
        )
    }

    fn gesture(&self) -> Gesture {
        match self {
            Interaction::Idle => Gesture::Idle,
            Interaction::Panning { .. } => Gesture::Panning,
            Interaction::MarqueeSelecting { .. } => Gesture::MarqueeSelecting,
            Interaction::Dragging(_) => Gesture::Dragging,
            Interaction::Resizing(_) => Gesture::Resizing,
            Interaction::Rotating(_) => Gesture::Rotating,
            Interaction::Drawing(_) => Gesture::Drawing,
            Interaction::EditingText(_) => Gesture::EditingText,
        }
    }
}

/// Which gesture is in progress, for hosts and renderers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Gesture {
    Idle,
    Panning,
    MarqueeSelecting,
    Dragging,
    Resizing,
    Rotating,
    Drawing,
    EditingText,
}

impl Canvas {
    pub fn gesture(&self) -> Gesture {
        self.interaction.gesture()
    }

    /// World-space marquee rectangle while box-selecting.
    pub fn marquee_rect(&self) -> Option<Rect> {
        match &self.interaction {
            Interaction::MarqueeSelecting { start, current, .. } => Some(Rect::from_points(*start, *current)),
            _ => None,
        }
    }

    /// The element being drawn, before it joins the store.
    pub fn draw_preview(&self) -> Option<&Element> {
        match &self.interaction {
            Interaction::Drawing(draw) => Some(&draw.preview),
            _ => None,
        }
    }

    /// The element and string under text edit.
    pub fn editing(&self) -> Option<(ElementId, TextEditTarget)> {
        match &self.interaction {
            Interaction::EditingText(edit) => Some((edit.id, edit.target)),
            _ => None,
        }
    }

    pub fn is_editing_text(&self) -> bool {
        matches!(self.interaction, Interaction::EditingText(_))
    }

    /// Dispatch a pointer event in screen coordinates.
    pub fn handle_pointer_event(&mut self, event: &PointerEvent, modifiers: Modifiers) {
        match *event {
            PointerEvent::Down { position, button } => self.handle_pointer_down(position, button, modifiers),
            PointerEvent::Up { position, button } => self.handle_pointer_up(position, button, modifiers),
            PointerEvent::Move { position } => self.handle_pointer_move(position, modifiers),
            PointerEvent::Scroll { position, delta } => self.handle_wheel(position, delta, modifiers),
        }
    }

    pub fn handle_pointer_down(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        self.pointer_down_at(screen, button, modifiers, Instant::now());
    }

    pub fn handle_pointer_up(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers) {
        self.pointer_up_at(screen, button, modifiers, Instant::now());
    }

    /// Pointer press with an explicit timestamp for double-click detection.
    pub fn pointer_down_at(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers, now: Instant) {
        let double = self.input.press(screen, button, now);
        self.input.modifiers = modifiers;
        let world = self.viewport.screen_to_world(screen);

        if let Interaction::EditingText(edit) = &self.interaction {
            let id = edit.id;
            let on_edited = self.find_element_at(world).is_some_and(|hit| hit.id() == id);
            if on_edited && button == MouseButton::Left {
                return;
            }
            self.commit_text_edit();
        }
        if !self.interaction.is_idle() {
            return;
        }

        let pans = button == MouseButton::Middle
            || (button == MouseButton::Left && (self.input.space_held || self.tool == ToolKind::Hand));
        if pans {
            self.interaction = Interaction::Panning { last: screen };
            self.cursor = CursorIcon::Grabbing;
            return;
        }
        if button != MouseButton::Left {
            return;
        }

        match self.tool {
            ToolKind::Text => self.press_text_tool(world),
            tool if tool.is_drawing() => self.begin_draw(world),
            _ => self.press_select(world, modifiers, double),
        }
        self.request_render();
    }

    pub fn handle_pointer_move(&mut self, screen: Point, modifiers: Modifiers) {
        self.input.move_to(screen);
        self.input.modifiers = modifiers;
        let world = self.viewport.screen_to_world(screen);

        let mut interaction = std::mem::take(&mut self.interaction);
        let changed = match &mut interaction {
            Interaction::Idle => {
                self.update_hover(world);
                false
            }
            Interaction::Panning { last } => {
                let delta = screen - *last;
                self.viewport.pan(delta.x, delta.y);
                *last = screen;
                true
            }
            Interaction::MarqueeSelecting { start, current, base } => {
                *current = world;
                self.update_marquee(Rect::from_points(*start, world), base);
                true
            }
            Interaction::Dragging(drag) => {
                self.update_drag(drag, world);
                true
            }
            Interaction::Resizing(resize) => {
                self.update_resize(resize, world);
                true
            }
            Interaction::Rotating(rotate) => {
                self.update_rotate(rotate, world);
                true
            }
            Interaction::Drawing(draw) => {
                update_draw(draw, world);
                true
            }
            Interaction::EditingText(_) => false,
        };
        self.interaction = interaction;
        if changed {
            self.request_render();
        }
    }

    /// Pointer release with an explicit timestamp for double-click detection.
    ///
    /// Releasing always commits the gesture in its current state.
    pub fn pointer_up_at(&mut self, screen: Point, button: MouseButton, modifiers: Modifiers, now: Instant) {
        self.input.release(screen, button, now);
        self.input.modifiers = modifiers;
        let world = self.viewport.screen_to_world(screen);

        match std::mem::take(&mut self.interaction) {
            Interaction::Idle | Interaction::Panning { .. } => {}
            Interaction::MarqueeSelecting { .. } => {
                log::debug!("Marquee selected {} element(s)", self.selection.len());
            }
            Interaction::Dragging(drag) => self.finish_drag(drag, world, modifiers),
            Interaction::Resizing(resize) => {
                log::debug!("Resize finished on {}", resize.id);
                self.save_state();
            }
            Interaction::Rotating(rotate) => {
                log::debug!("Rotate finished on {}", rotate.id);
                self.save_state();
            }
            Interaction::Drawing(draw) => self.finish_draw(draw),
            Interaction::EditingText(edit) => self.interaction = Interaction::EditingText(edit),
        }
        self.guides.clear();
        self.drop_target = None;
        if self.interaction.is_idle() {
            self.update_hover(world);
        }
        self.request_render();
    }

    // --- Press ---

    fn press_select(&mut self, world: Point, modifiers: Modifiers, double: bool) {
        if let Some(id) = self.single_selected() {
            let handle = self
                .elements
                .get(id)
                .and_then(|el| hit_test_handles(el, world, &self.handle_params()));
            if let Some(handle) = handle {
                self.begin_handle_gesture(id, handle, world);
                return;
            }
        }

        if let Some(entered) = self.entered_frame {
            let inside = self.elements.get(entered).is_some_and(|f| f.bounds().contains(world));
            if !inside {
                self.entered_frame = None;
                log::debug!("Left frame {}", entered);
            }
        }

        match self.find_element_at(world) {
            Some(HitTarget::FrameHeader(id)) if double => {
                self.select(id);
                self.begin_text_edit(id, TextEditTarget::FrameName);
            }
            Some(HitTarget::FrameBody(id)) if double && self.entered_frame != Some(id) => {
                self.entered_frame = Some(id);
                self.selection.clear();
                log::debug!("Entered frame {}", id);
            }
            Some(HitTarget::FrameBody(id)) if self.entered_frame == Some(id) => {
                self.begin_marquee(world, modifiers);
            }
            Some(HitTarget::Element(id))
                if double && self.elements.get(id).is_some_and(|e| e.as_text().is_some()) =>
            {
                self.select(id);
                self.begin_text_edit(id, TextEditTarget::Text);
            }
            Some(hit) => {
                let id = hit.id();
                if modifiers.shift {
                    self.toggle_selection(id);
                } else if !self.is_selected(id) {
                    self.select(id);
                }
                if self.is_selected(id) {
                    self.begin_drag(world, id);
                }
            }
            None => self.begin_marquee(world, modifiers),
        }
    }

    fn press_text_tool(&mut self, world: Point) {
        if let Some(HitTarget::Element(id)) = self.find_element_at(world) {
            if self.elements.get(id).is_some_and(|e| e.as_text().is_some()) {
                self.select(id);
                self.begin_text_edit(id, TextEditTarget::Text);
                return;
            }
        }
        let id = self.elements.push(Element::text(world, "", DEFAULT_FONT_SIZE));
        frames::update_frame_attachment(&mut self.elements, id, self.config.attach_overlap_threshold);
        self.select(id);
        self.begin_text_edit(id, TextEditTarget::Text);
    }

    fn begin_marquee(&mut self, world: Point, modifiers: Modifiers) {
        let base = if modifiers.shift {
            self.selection.clone()
        } else {
            self.selection.clear();
            Vec::new()
        };
        self.interaction = Interaction::MarqueeSelecting {
            start: world,
            current: world,
            base,
        };
    }

    fn begin_drag(&mut self, world: Point, click_target: ElementId) {
        let moving = self.elements.cascade_set(&self.selection);
        let starts: Vec<DragStart> = self
            .selection
            .iter()
            .filter_map(|id| self.elements.get(*id))
            .map(|e| DragStart {
                id: e.id,
                bounds: e.bounds(),
                is_path: e.is_path(),
            })
            .collect();
        let targets = self
            .elements
            .iter()
            .filter(|e| !moving.contains(&e.id))
            .map(Element::bounds)
            .collect();
        log::debug!("Drag started with {} element(s)", starts.len());
        self.interaction = Interaction::Dragging(DragState {
            start_pointer: world,
            last_pointer: world,
            starts,
            targets,
            click_target,
            moved: false,
        });
        self.cursor = CursorIcon::Move;
    }

    fn begin_handle_gesture(&mut self, id: ElementId, handle: HandleKind, world: Point) {
        let Some(element) = self.elements.get(id) else {
            return;
        };
        if handle == HandleKind::Rotate {
            if !element.can_rotate() {
                return;
            }
            let center = element.center();
            self.interaction = Interaction::Rotating(RotateState {
                id,
                center,
                start_angle: pointer_angle(center, world),
                start_rotation: element.rotation,
            });
            log::debug!("Rotate started on {}", id);
        } else {
            let children = if element.is_frame() {
                self.elements
                    .frame_children(id)
                    .into_iter()
                    .map(|c| (c.id, c.bounds(), c.font_size()))
                    .collect()
            } else {
                Vec::new()
            };
            let moving = self.elements.cascade_set(&[id]);
            let targets = self
                .elements
                .iter()
                .filter(|e| !moving.contains(&e.id))
                .map(Element::bounds)
                .collect();
            self.interaction = Interaction::Resizing(ResizeState {
                id,
                handle,
                start_bounds: element.bounds(),
                rotation: element.rotation,
                start_font_size: element.font_size(),
                children,
                targets,
            });
            log::debug!("Resize started on {} ({:?})", id, handle);
        }
        self.cursor = CursorIcon::for_handle(handle);
    }

    fn begin_draw(&mut self, world: Point) {
        let (shape, preview) = match self.tool {
            ToolKind::Shape(ShapeType::Line) => (Some(ShapeType::Line), Element::line(world, world)),
            ToolKind::Shape(shape_type) => (
                Some(shape_type),
                Element::shape(shape_type, Rect::from_points(world, world)),
            ),
            _ => (None, Element::path(vec![world])),
        };
        self.selection.clear();
        self.interaction = Interaction::Drawing(DrawState {
            start: world,
            shape,
            preview,
        });
    }

    // --- Move ---

    fn update_hover(&mut self, world: Point) {
        self.cursor = if self.input.space_held {
            CursorIcon::Grab
        } else if self.tool != ToolKind::Move {
            self.tool.cursor()
        } else if let Some(handle) = self
            .single_selected()
            .and_then(|id| self.elements.get(id))
            .and_then(|el| hit_test_handles(el, world, &self.handle_params()))
        {
            CursorIcon::for_handle(handle)
        } else if self.find_element_at(world).is_some() {
            CursorIcon::Move
        } else {
            self.tool.cursor()
        };
    }

    fn update_marquee(&mut self, rect: Rect, base: &[ElementId]) {
        let hits = elements_in_marquee(&self.elements, rect, self.entered_frame);
        let mut selection = base.to_vec();
        selection.extend(hits.into_iter().filter(|id| !base.contains(id)));
        self.selection = selection;
    }

    /// Move the selection to its start position plus the total pointer delta.
    ///
    /// The non-path selection snaps as one group. Paths follow the
    /// incremental delta unsnapped. Frames carry their unselected children
    /// by however far the frame actually moved this step.
    fn update_drag(&mut self, drag: &mut DragState, world: Point) {
        let total = world - drag.start_pointer;
        let step = world - drag.last_pointer;
        drag.last_pointer = world;
        if step == Vec2::ZERO {
            return;
        }
        drag.moved = true;

        let params = self.snap_params();
        let snap = drag
            .starts
            .iter()
            .filter(|s| !s.is_path)
            .map(|s| s.bounds)
            .reduce(|a, b| a.union(b))
            .map(|group| snap_move(group + total, &drag.targets, &params));
        let offset = snap.as_ref().map_or(Vec2::ZERO, |s| s.offset);
        self.guides = snap.map(|s| s.guides).unwrap_or_default();

        let selected: Vec<ElementId> = drag.starts.iter().map(|s| s.id).collect();
        for start in &drag.starts {
            let Some(element) = self.elements.get_mut(start.id) else {
                continue;
            };
            let before = element.bounds().origin();
            if start.is_path {
                element.translate(step);
            } else {
                element.move_to(start.bounds.origin() + total + offset);
            }
            let moved_by = element.bounds().origin() - before;
            if !element.is_frame() || moved_by == Vec2::ZERO {
                continue;
            }
            for child in self.elements.frame_child_ids(start.id) {
                if selected.contains(&child) {
                    continue;
                }
                if let Some(child) = self.elements.get_mut(child) {
                    child.translate(moved_by);
                }
            }
        }

        let carries_content = drag
            .starts
            .iter()
            .any(|s| self.elements.get(s.id).is_some_and(|e| !e.is_frame()));
        self.drop_target = if carries_content {
            frames::frame_at_point(&self.elements, world, &selected)
        } else {
            None
        };
    }

    fn update_resize(&mut self, resize: &ResizeState, world: Point) {
        let Some(current) = self.elements.get(resize.id).map(Element::bounds) else {
            return;
        };
        let params = self.snap_params();
        let snap = ResizeSnap {
            targets: &resize.targets,
            params: &params,
        };
        let min_size = self.config.min_element_size;
        let outcome = match resize.handle {
            HandleKind::Corner(corner) => corner_resize(
                resize.start_bounds,
                resize.rotation,
                corner,
                world,
                min_size,
                Some(snap),
            ),
            HandleKind::Edge(edge) => edge_resize(current, resize.rotation, edge, world, min_size, Some(snap)),
            HandleKind::Rotate => return,
        };
        self.guides = outcome.guides;
        let mut bounds = outcome.rect;

        let Some(element) = self.elements.get_mut(resize.id) else {
            return;
        };
        match (resize.handle, resize.start_font_size) {
            (HandleKind::Corner(corner), Some(start_font)) => {
                let ratio = bounds.height() / resize.start_bounds.height().max(f64::EPSILON);
                if let Some(text) = element.as_text_mut() {
                    text.font_size = start_font * ratio;
                }
                element.refit_text();
                let frame = ResizeFrame::for_corner(resize.start_bounds, resize.rotation, corner);
                bounds = frame.place(frame.local_rect(Size::new(element.width, element.height)));
                element.set_bounds(bounds);
            }
            _ => element.set_bounds(bounds),
        }

        if !matches!(resize.handle, HandleKind::Corner(_)) || resize.children.is_empty() {
            return;
        }
        let sy = bounds.height() / resize.start_bounds.height().max(f64::EPSILON);
        for (child_id, child_start, font) in &resize.children {
            let Some(child) = self.elements.get_mut(*child_id) else {
                continue;
            };
            child.set_bounds(map_rect_between(*child_start, resize.start_bounds, bounds));
            if let Some(font) = *font {
                if let Some(text) = child.as_text_mut() {
                    text.font_size = font * sy;
                }
                child.refit_text();
            }
        }
    }

    fn update_rotate(&mut self, rotate: &RotateState, world: Point) {
        let rotation = rotation_for_drag(
            rotate.start_rotation,
            rotate.start_angle,
            pointer_angle(rotate.center, world),
            self.config.rotation_snap_step_deg,
            self.config.rotation_snap_tolerance_deg,
        );
        if let Some(element) = self.elements.get_mut(rotate.id) {
            element.rotation = rotation;
        }
    }

    // --- Release ---

    fn finish_drag(&mut self, drag: DragState, world: Point, modifiers: Modifiers) {
        if !drag.moved {
            // A plain click inside a multi-selection narrows it to the clicked element.
            if !modifiers.shift && self.selection.len() > 1 && self.is_selected(drag.click_target) {
                self.selection = vec![drag.click_target];
            }
            return;
        }
        let moved: Vec<ElementId> = drag.starts.iter().map(|s| s.id).collect();
        for id in &moved {
            // Frames never nest, and children moving with their frame stay in it.
            let keep = self
                .elements
                .get(*id)
                .is_none_or(|e| e.is_frame() || e.parent_frame.is_some_and(|p| moved.contains(&p)));
            if !keep {
                frames::attach_at_point(&mut self.elements, *id, world, &moved);
            }
        }
        log::debug!("Drag finished with {} element(s)", drag.starts.len());
        self.save_state();
    }

    fn finish_draw(&mut self, draw: DrawState) {
        let mut element = draw.preview;
        let bounds = element.bounds();
        let min = self.config.min_draw_size;
        let too_small = match draw.shape {
            Some(ShapeType::Line) | None => bounds.width().max(bounds.height()) < min,
            Some(_) => bounds.width() < min || bounds.height() < min,
        };
        if too_small {
            log::debug!("Discarded {} below the minimum draw size", element.type_name());
            return;
        }
        if element.is_path() {
            element.x = bounds.x0;
            element.y = bounds.y0;
            element.width = bounds.width();
            element.height = bounds.height();
        }
        let id = self.elements.push(element);
        frames::update_frame_attachment(&mut self.elements, id, self.config.attach_overlap_threshold);
        self.selection = vec![id];
        log::debug!("Created element {}", id);
        self.save_state();
    }

    // --- Text editing ---

    /// Start editing a text element's content or a frame's name.
    ///
    /// Any other edit in progress is committed first.
    pub fn begin_text_edit(&mut self, id: ElementId, target: TextEditTarget) -> bool {
        self.commit_text_edit();
        let Some(element) = self.elements.get(id) else {
            return false;
        };
        let original = match (target, &element.kind) {
            (TextEditTarget::Text, ElementKind::Text(text)) => text.content.clone(),
            (TextEditTarget::FrameName, ElementKind::Frame(frame)) => frame.name.clone(),
            _ => return false,
        };
        self.interaction = Interaction::EditingText(TextEdit { id, target, original });
        self.cursor = CursorIcon::Text;
        self.emit(CanvasEvent::TextEditStarted { id, target });
        log::debug!("Text edit started on {} ({:?})", id, target);
        true
    }

    /// Replace the edited string, refitting text boxes.
    pub fn update_text_edit(&mut self, content: &str) -> bool {
        let Interaction::EditingText(edit) = &self.interaction else {
            return false;
        };
        let (id, target) = (edit.id, edit.target);
        let Some(element) = self.elements.get_mut(id) else {
            return false;
        };
        match (target, &mut element.kind) {
            (TextEditTarget::Text, ElementKind::Text(text)) => text.content = content.to_string(),
            (TextEditTarget::FrameName, ElementKind::Frame(frame)) => frame.name = content.to_string(),
            _ => return false,
        }
        element.refit_text();
        self.request_render();
        true
    }

    /// Finish the current text edit.
    ///
    /// Text left empty is deleted; an empty frame name reverts.
    pub fn commit_text_edit(&mut self) -> bool {
        if !self.is_editing_text() {
            return false;
        }
        let Interaction::EditingText(edit) = std::mem::take(&mut self.interaction) else {
            return false;
        };
        match edit.target {
            TextEditTarget::Text => {
                let empty = self
                    .elements
                    .get(edit.id)
                    .and_then(Element::as_text)
                    .is_none_or(|t| t.content.trim().is_empty());
                if empty {
                    self.elements.delete_cascade(&[edit.id]);
                    self.selection.retain(|s| *s != edit.id);
                    log::debug!("Removed empty text {}", edit.id);
                } else {
                    frames::update_frame_attachment(
                        &mut self.elements,
                        edit.id,
                        self.config.attach_overlap_threshold,
                    );
                }
            }
            TextEditTarget::FrameName => {
                if let Some(frame) = self.elements.get_mut(edit.id).and_then(Element::as_frame_mut) {
                    if frame.name.trim().is_empty() {
                        frame.name = edit.original;
                    }
                }
            }
        }
        self.cursor = self.tool.cursor();
        self.emit(CanvasEvent::TextEditEnded {
            id: edit.id,
            committed: true,
        });
        self.save_state();
        self.request_render();
        true
    }

    /// Abandon the current text edit, restoring the previous string.
    ///
    /// Text that was created for this edit is removed again.
    pub fn cancel_text_edit(&mut self) -> bool {
        if !self.is_editing_text() {
            return false;
        }
        let Interaction::EditingText(edit) = std::mem::take(&mut self.interaction) else {
            return false;
        };
        if let Some(element) = self.elements.get_mut(edit.id) {
            match &mut element.kind {
                ElementKind::Text(text) => text.content = edit.original.clone(),
                ElementKind::Frame(frame) => frame.name = edit.original.clone(),
                _ => {}
            }
            element.refit_text();
        }
        if edit.target == TextEditTarget::Text && edit.original.trim().is_empty() {
            self.elements.delete_cascade(&[edit.id]);
            self.selection.retain(|s| *s != edit.id);
        }
        self.cursor = self.tool.cursor();
        self.emit(CanvasEvent::TextEditEnded {
            id: edit.id,
            committed: false,
        });
        log::debug!("Text edit cancelled on {}", edit.id);
        self.request_render();
        true
    }
}

fn update_draw(draw: &mut DrawState, world: Point) {
    let mut next = match draw.shape {
        Some(ShapeType::Line) => Element::line(draw.start, world),
        Some(shape_type) => Element::shape(shape_type, Rect::from_points(draw.start, world)),
        None => {
            if let ElementKind::Path(path) = &mut draw.preview.kind {
                path.add_point(world);
            }
            return;
        }
    };
    next.id = draw.preview.id;
    draw.preview = next;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::FRAC_PI_2;
    use std::time::Duration;

    const LEFT: MouseButton = MouseButton::Left;

    /// Drives the canvas with timestamps far enough apart that consecutive
    /// gestures never count as double-clicks.
    struct Pointer {
        now: Instant,
    }

    impl Pointer {
        fn new() -> Self {
            Self { now: Instant::now() }
        }

        fn tick(&mut self) -> Instant {
            self.now += Duration::from_secs(1);
            self.now
        }

        fn drag_with(&mut self, canvas: &mut Canvas, path: &[Point], modifiers: Modifiers) {
            let t = self.tick();
            let (first, rest) = path.split_first().unwrap();
            canvas.pointer_down_at(*first, LEFT, modifiers, t);
            for p in rest {
                canvas.handle_pointer_move(*p, modifiers);
            }
            canvas.pointer_up_at(*path.last().unwrap(), LEFT, modifiers, t);
        }

        fn drag(&mut self, canvas: &mut Canvas, from: Point, to: Point) {
            self.drag_with(canvas, &[from, to], Modifiers::NONE);
        }

        fn click(&mut self, canvas: &mut Canvas, at: Point) {
            self.drag_with(canvas, &[at], Modifiers::NONE);
        }

        fn double_click(&mut self, canvas: &mut Canvas, at: Point) {
            let t = self.tick();
            canvas.pointer_down_at(at, LEFT, Modifiers::NONE, t);
            canvas.pointer_up_at(at, LEFT, Modifiers::NONE, t);
            let t2 = t + Duration::from_millis(120);
            canvas.pointer_down_at(at, LEFT, Modifiers::NONE, t2);
            canvas.pointer_up_at(at, LEFT, Modifiers::NONE, t2);
        }
    }

    fn rect_shape(x: f64, y: f64, w: f64, h: f64) -> Element {
        Element::shape(ShapeType::Rectangle, Rect::new(x, y, x + w, y + h))
    }

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn test_drag_snaps_and_clears_guides() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.add_element(rect_shape(0.0, 0.0, 100.0, 100.0));
        let b = canvas.add_element(rect_shape(300.0, 3.0, 100.0, 100.0));

        let t = pointer.tick();
        canvas.pointer_down_at(p(350.0, 53.0), LEFT, Modifiers::NONE, t);
        canvas.handle_pointer_move(p(352.0, 53.0), Modifiers::NONE);
        assert_eq!(canvas.gesture(), Gesture::Dragging);
        assert!(!canvas.guides().is_empty());
        let bounds = canvas.elements.get(b).unwrap().bounds();
        assert!((bounds.x0 - 302.0).abs() < 1e-9);
        assert!(bounds.y0.abs() < 1e-9);

        canvas.pointer_up_at(p(352.0, 53.0), LEFT, Modifiers::NONE, t);
        assert!(canvas.guides().is_empty());
        assert_eq!(canvas.gesture(), Gesture::Idle);
    }

    #[test]
    fn test_drag_without_snap_when_disabled() {
        let mut canvas = Canvas::default();
        canvas.config.auto_snap = false;
        let mut pointer = Pointer::new();
        canvas.add_element(rect_shape(0.0, 0.0, 100.0, 100.0));
        let b = canvas.add_element(rect_shape(300.0, 3.0, 100.0, 100.0));
        pointer.drag(&mut canvas, p(350.0, 53.0), p(352.0, 53.0));
        let bounds = canvas.elements.get(b).unwrap().bounds();
        assert!((bounds.y0 - 3.0).abs() < 1e-9);
    }

    #[test]
    fn test_text_corner_resize_scales_font() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let text = canvas.add_element(Element::text(Point::ZERO, "hello", 20.0));
        canvas.select(text);
        pointer.drag(&mut canvas, p(60.0, 25.0), p(120.0, 40.0));

        let element = canvas.elements.get(text).unwrap();
        assert!((element.font_size().unwrap() - 40.0).abs() < 1e-9);
        assert!((element.width - 120.0).abs() < 1e-9);
        assert!((element.height - 50.0).abs() < 1e-9);
        assert!(element.x.abs() < 1e-9 && element.y.abs() < 1e-9);
    }

    #[test]
    fn test_frame_corner_resize_scales_children() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let frame = canvas.add_element(Element::frame(Rect::new(0.0, 0.0, 100.0, 100.0), "F"));
        let child = canvas.add_element(rect_shape(10.0, 10.0, 20.0, 20.0));
        canvas.select(frame);
        pointer.drag(&mut canvas, p(100.0, 100.0), p(200.0, 200.0));

        assert_eq!(
            canvas.elements.get(frame).unwrap().bounds(),
            Rect::new(0.0, 0.0, 200.0, 200.0)
        );
        let child_bounds = canvas.elements.get(child).unwrap().bounds();
        assert!((child_bounds.x0 - 20.0).abs() < 1e-9);
        assert!((child_bounds.width() - 40.0).abs() < 1e-9);
    }

    #[test]
    fn test_edge_resize_is_free_and_clamped() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let id = canvas.add_element(rect_shape(0.0, 0.0, 100.0, 50.0));
        canvas.select(id);
        // Right edge midpoint dragged far left: width floors at the minimum.
        pointer.drag(&mut canvas, p(100.0, 25.0), p(-300.0, 25.0));
        let bounds = canvas.elements.get(id).unwrap().bounds();
        assert!((bounds.width() - 10.0).abs() < 1e-9);
        assert!((bounds.height() - 50.0).abs() < 1e-9);
        assert!(bounds.x0.abs() < 1e-9);
    }

    #[test]
    fn test_rotate_handle_quarter_turn() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let id = canvas.add_element(rect_shape(0.0, 0.0, 100.0, 100.0));
        canvas.select(id);
        // Rotate handle sits 24px above the top edge; sweep to the right side.
        pointer.drag(&mut canvas, p(50.0, -24.0), p(124.0, 50.0));
        let rotation = canvas.elements.get(id).unwrap().rotation;
        assert!((rotation - FRAC_PI_2).abs() < 1e-9);
        assert!(canvas.can_undo());
    }

    #[test]
    fn test_draw_rectangle_respects_minimum() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.set_tool(ToolKind::Shape(ShapeType::Rectangle));
        pointer.drag(&mut canvas, p(10.0, 10.0), p(12.0, 12.0));
        assert!(canvas.elements.is_empty());

        pointer.drag(&mut canvas, p(10.0, 10.0), p(60.0, 40.0));
        assert_eq!(canvas.elements.len(), 1);
        let element = &canvas.elements.elements()[0];
        assert_eq!(element.bounds(), Rect::new(10.0, 10.0, 60.0, 40.0));
        assert_eq!(canvas.selection, vec![element.id]);
        assert_eq!(canvas.tool(), ToolKind::Shape(ShapeType::Rectangle));
        assert!(canvas.can_undo());
    }

    #[test]
    fn test_draw_preview_visible_while_drawing() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.set_tool(ToolKind::Shape(ShapeType::Line));
        let t = pointer.tick();
        canvas.pointer_down_at(p(0.0, 0.0), LEFT, Modifiers::NONE, t);
        canvas.handle_pointer_move(p(30.0, 40.0), Modifiers::NONE);
        let preview = canvas.draw_preview().unwrap();
        assert!(preview.is_line());
        assert_eq!(preview.bounds(), Rect::new(0.0, 0.0, 30.0, 40.0));
        assert!(canvas.elements.is_empty());
        canvas.pointer_up_at(p(30.0, 40.0), LEFT, Modifiers::NONE, t);
        assert_eq!(canvas.elements.len(), 1);
    }

    #[test]
    fn test_pencil_collects_points() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.set_tool(ToolKind::Pencil);
        let stroke = [p(0.0, 0.0), p(10.0, 0.0), p(20.0, 5.0), p(30.0, 10.0)];
        pointer.drag_with(&mut canvas, &stroke, Modifiers::NONE);
        let element = &canvas.elements.elements()[0];
        assert!(element.is_path());
        assert_eq!(element.bounds(), Rect::new(0.0, 0.0, 30.0, 10.0));
        assert!((element.width - 30.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_text_tool_creates_and_empty_commit_removes() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.set_tool(ToolKind::Text);
        canvas.take_events();

        pointer.click(&mut canvas, p(100.0, 100.0));
        let (id, target) = canvas.editing().unwrap();
        assert_eq!(target, TextEditTarget::Text);
        assert!(canvas
            .take_events()
            .contains(&CanvasEvent::TextEditStarted { id, target }));
        assert!(canvas.update_text_edit("Hi"));
        assert!(canvas.commit_text_edit());
        assert_eq!(canvas.elements.get(id).unwrap().as_text().unwrap().content, "Hi");

        pointer.click(&mut canvas, p(400.0, 400.0));
        assert!(canvas.is_editing_text());
        assert!(canvas.commit_text_edit());
        assert_eq!(canvas.elements.len(), 1);
    }

    #[test]
    fn test_double_click_text_edit_and_escape() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let id = canvas.add_element(Element::text(Point::ZERO, "abc", 20.0));
        pointer.double_click(&mut canvas, p(10.0, 10.0));
        assert_eq!(canvas.editing(), Some((id, TextEditTarget::Text)));

        canvas.update_text_edit("changed");
        assert!(canvas.handle_key_down("Escape", Modifiers::NONE));
        assert!(!canvas.is_editing_text());
        assert_eq!(canvas.elements.get(id).unwrap().as_text().unwrap().content, "abc");
        assert!((canvas.elements.get(id).unwrap().width - 36.0).abs() < 1e-9);
    }

    #[test]
    fn test_header_double_click_renames_frame() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let frame = canvas.add_element(Element::frame(Rect::new(0.0, 100.0, 200.0, 300.0), "Board"));
        pointer.double_click(&mut canvas, p(50.0, 90.0));
        assert_eq!(canvas.editing(), Some((frame, TextEditTarget::FrameName)));

        canvas.update_text_edit("   ");
        canvas.commit_text_edit();
        assert_eq!(canvas.elements.get(frame).unwrap().as_frame().unwrap().name, "Board");

        pointer.double_click(&mut canvas, p(50.0, 90.0));
        canvas.update_text_edit("Hero");
        canvas.commit_text_edit();
        assert_eq!(canvas.elements.get(frame).unwrap().as_frame().unwrap().name, "Hero");
    }

    #[test]
    fn test_enter_frame_makes_children_selectable() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let frame = canvas.add_element(Element::frame(Rect::new(0.0, 0.0, 200.0, 200.0), "F"));
        let child = canvas.add_element(rect_shape(50.0, 50.0, 20.0, 20.0));

        pointer.click(&mut canvas, p(60.0, 60.0));
        assert_eq!(canvas.selection, vec![frame]);

        pointer.double_click(&mut canvas, p(60.0, 60.0));
        assert_eq!(canvas.entered_frame(), Some(frame));

        pointer.click(&mut canvas, p(60.0, 60.0));
        assert_eq!(canvas.selection, vec![child]);

        pointer.click(&mut canvas, p(500.0, 500.0));
        assert_eq!(canvas.entered_frame(), None);
        assert!(canvas.selection.is_empty());
    }

    #[test]
    fn test_click_narrows_multi_selection() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let a = canvas.add_element(rect_shape(0.0, 0.0, 50.0, 50.0));
        let b = canvas.add_element(rect_shape(200.0, 0.0, 50.0, 50.0));
        canvas.selection = vec![a, b];
        pointer.click(&mut canvas, p(25.0, 25.0));
        assert_eq!(canvas.selection, vec![a]);
    }

    #[test]
    fn test_shift_click_toggles() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let a = canvas.add_element(rect_shape(0.0, 0.0, 50.0, 50.0));
        let b = canvas.add_element(rect_shape(200.0, 0.0, 50.0, 50.0));
        pointer.click(&mut canvas, p(25.0, 25.0));
        pointer.drag_with(&mut canvas, &[p(225.0, 25.0)], Modifiers::shift());
        assert_eq!(canvas.selection, vec![a, b]);
        pointer.drag_with(&mut canvas, &[p(25.0, 25.0)], Modifiers::shift());
        assert_eq!(canvas.selection, vec![b]);
    }

    #[test]
    fn test_shift_marquee_extends_selection() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let a = canvas.add_element(rect_shape(0.0, 0.0, 50.0, 50.0));
        let b = canvas.add_element(rect_shape(200.0, 0.0, 50.0, 50.0));
        canvas.select(a);
        pointer.drag_with(&mut canvas, &[p(180.0, -20.0), p(210.0, 10.0)], Modifiers::shift());
        assert_eq!(canvas.selection, vec![a, b]);
        assert!(canvas.marquee_rect().is_none());
    }

    #[test]
    fn test_marquee_records_no_history() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.add_element(rect_shape(0.0, 0.0, 50.0, 50.0));
        let depth = canvas.history().past_len();
        pointer.drag(&mut canvas, p(-10.0, -10.0), p(20.0, 20.0));
        assert_eq!(canvas.selection.len(), 1);
        assert_eq!(canvas.history().past_len(), depth);
    }

    #[test]
    fn test_hover_cursor() {
        let mut canvas = Canvas::default();
        let id = canvas.add_element(rect_shape(0.0, 0.0, 100.0, 100.0));
        canvas.select(id);
        canvas.handle_pointer_move(p(100.0, 100.0), Modifiers::NONE);
        assert_eq!(canvas.cursor(), CursorIcon::NwseResize);
        canvas.handle_pointer_move(p(50.0, 50.0), Modifiers::NONE);
        assert_eq!(canvas.cursor(), CursorIcon::Move);
        canvas.handle_pointer_move(p(500.0, 500.0), Modifiers::NONE);
        assert_eq!(canvas.cursor(), CursorIcon::Default);
    }

    #[test]
    fn test_space_drag_pans() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        canvas.handle_key_down(" ", Modifiers::NONE);
        pointer.drag(&mut canvas, p(0.0, 0.0), p(30.0, 40.0));
        canvas.handle_key_up(" ", Modifiers::NONE);
        assert!((canvas.viewport.x - 30.0).abs() < f64::EPSILON);
        assert!((canvas.viewport.y - 40.0).abs() < f64::EPSILON);
        assert!(canvas.elements.is_empty());
    }

    #[test]
    fn test_middle_button_pans() {
        let mut canvas = Canvas::default();
        let t = Instant::now();
        canvas.pointer_down_at(p(10.0, 10.0), MouseButton::Middle, Modifiers::NONE, t);
        assert_eq!(canvas.gesture(), Gesture::Panning);
        canvas.handle_pointer_move(p(20.0, 5.0), Modifiers::NONE);
        canvas.pointer_up_at(p(20.0, 5.0), MouseButton::Middle, Modifiers::NONE, t);
        assert!((canvas.viewport.x - 10.0).abs() < f64::EPSILON);
        assert!((canvas.viewport.y + 5.0).abs() < f64::EPSILON);
    }

    fn path_points(canvas: &Canvas, id: ElementId) -> Vec<Point> {
        match &canvas.elements.get(id).unwrap().kind {
            ElementKind::Path(path) => path.points.clone(),
            other => panic!("expected a path, got {other:?}"),
        }
    }

    #[test]
    fn test_dragged_path_follows_raw_delta() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        // Right edge of the stroke passes within snapping range of this edge.
        canvas.add_element(rect_shape(100.0, 0.0, 50.0, 50.0));
        canvas.set_tool(ToolKind::Pencil);
        let stroke = [p(0.0, 0.0), p(20.0, 10.0), p(40.0, 20.0), p(60.0, 30.0)];
        pointer.drag_with(&mut canvas, &stroke, Modifiers::NONE);
        let id = canvas.selection[0];
        let before = path_points(&canvas, id);

        canvas.set_tool(ToolKind::Move);
        canvas.selection = vec![id];
        let t = pointer.tick();
        canvas.pointer_down_at(p(20.0, 10.0), LEFT, Modifiers::NONE, t);
        for to in [p(25.0, 11.0), p(45.0, 12.0), p(58.0, 13.0)] {
            canvas.handle_pointer_move(to, Modifiers::NONE);
            assert_eq!(canvas.gesture(), Gesture::Dragging);
            assert!(canvas.guides().is_empty());
        }
        canvas.pointer_up_at(p(58.0, 13.0), LEFT, Modifiers::NONE, t);

        let after = path_points(&canvas, id);
        assert_eq!(after.len(), before.len());
        for (a, b) in after.iter().zip(&before) {
            assert!((a.x - b.x - 38.0).abs() < 1e-9);
            assert!((a.y - b.y - 3.0).abs() < 1e-9);
        }
    }

    #[test]
    fn test_drop_target_follows_pointer() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let frame = canvas.add_element(Element::frame(Rect::new(0.0, 0.0, 200.0, 200.0), "F"));
        let shape = canvas.add_element(rect_shape(300.0, 0.0, 50.0, 50.0));

        let t = pointer.tick();
        canvas.pointer_down_at(p(325.0, 25.0), LEFT, Modifiers::NONE, t);
        canvas.handle_pointer_move(p(260.0, 25.0), Modifiers::NONE);
        assert_eq!(canvas.drop_target(), None);
        canvas.handle_pointer_move(p(100.0, 100.0), Modifiers::NONE);
        assert_eq!(canvas.drop_target(), Some(frame));
        canvas.pointer_up_at(p(100.0, 100.0), LEFT, Modifiers::NONE, t);

        assert_eq!(canvas.drop_target(), None);
        assert_eq!(canvas.elements.get(shape).unwrap().parent_frame, Some(frame));
    }

    #[test]
    fn test_frame_dragged_with_loose_shape_does_not_adopt_it() {
        let mut canvas = Canvas::default();
        let mut pointer = Pointer::new();
        let frame = canvas.add_element(Element::frame(Rect::new(0.0, 0.0, 200.0, 200.0), "F"));
        let shape = canvas.add_element(rect_shape(300.0, 0.0, 50.0, 50.0));
        canvas.selection = vec![frame, shape];

        let t = pointer.tick();
        canvas.pointer_down_at(p(100.0, 100.0), LEFT, Modifiers::NONE, t);
        canvas.handle_pointer_move(p(110.0, 110.0), Modifiers::NONE);
        assert_eq!(canvas.drop_target(), None);
        canvas.pointer_up_at(p(110.0, 110.0), LEFT, Modifiers::NONE, t);

        let moved = canvas.elements.get(shape).unwrap();
        assert_eq!(moved.bounds(), Rect::new(310.0, 10.0, 360.0, 60.0));
        assert_eq!(moved.parent_frame, None);
        assert!(canvas.frame_children(frame).is_empty());
    }
}
