//! Frame containment: attach/detach rules and frame separation.

use crate::elements::ElementId;
use crate::store::ElementStore;
use kurbo::{Point, Rect, Vec2};

/// Fraction of `element`'s area that lies inside `frame`.
///
/// Zero-area elements count as fully inside when their origin is in the
/// frame (edges inclusive) and fully outside otherwise.
pub fn overlap_percent(element: Rect, frame: Rect) -> f64 {
    let area = element.area();
    if area <= f64::EPSILON {
        let origin = element.origin();
        let inside = origin.x >= frame.x0
            && origin.x <= frame.x1
            && origin.y >= frame.y0
            && origin.y <= frame.y1;
        return if inside { 1.0 } else { 0.0 };
    }
    let intersection = element.intersect(frame);
    if intersection.width() <= 0.0 || intersection.height() <= 0.0 {
        return 0.0;
    }
    intersection.area() / area
}

/// The frame with the largest overlap above `threshold`, topmost on ties.
pub fn best_frame_for(store: &ElementStore, id: ElementId, threshold: f64) -> Option<ElementId> {
    let element = store.get(id)?;
    if element.is_frame() {
        return None;
    }
    let bounds = element.bounds();
    let mut best: Option<(ElementId, f64)> = None;
    for frame in store.frames() {
        let overlap = overlap_percent(bounds, frame.bounds());
        if overlap > threshold && best.is_none_or(|(_, b)| overlap >= b) {
            best = Some((frame.id, overlap));
        }
    }
    best.map(|(frame, _)| frame)
}

/// Re-evaluate which frame `id` belongs to by overlap.
///
/// Newly attached elements move to the top of their frame's children.
/// Returns true if the parent changed.
pub fn update_frame_attachment(store: &mut ElementStore, id: ElementId, threshold: f64) -> bool {
    let parent = best_frame_for(store, id, threshold);
    set_parent(store, id, parent)
}

/// Re-evaluate containment for every top-level non-frame element.
///
/// Returns how many were attached.
pub fn adopt_loose_elements(store: &mut ElementStore, threshold: f64) -> usize {
    let loose: Vec<ElementId> = store
        .iter()
        .filter(|e| !e.is_frame() && e.parent_frame.is_none())
        .map(|e| e.id)
        .collect();
    loose
        .into_iter()
        .filter(|id| update_frame_attachment(store, *id, threshold))
        .count()
}

/// The topmost frame whose bounds contain `point`, excluding `exclude`.
pub fn frame_at_point(store: &ElementStore, point: Point, exclude: &[ElementId]) -> Option<ElementId> {
    store
        .frames()
        .rev()
        .find(|f| !exclude.contains(&f.id) && f.bounds().contains(point))
        .map(|f| f.id)
}

/// Attach `id` to the frame under `point`, or detach it if there is none.
///
/// Frames in `exclude` never become the parent; pass every element moving
/// with `id` so a frame dragged alongside it cannot adopt it.
pub fn attach_at_point(
    store: &mut ElementStore,
    id: ElementId,
    point: Point,
    exclude: &[ElementId],
) -> bool {
    let is_frame = store.get(id).is_some_and(|e| e.is_frame());
    let parent = if is_frame {
        None
    } else {
        frame_at_point(store, point, exclude)
    };
    set_parent(store, id, parent)
}

fn set_parent(store: &mut ElementStore, id: ElementId, parent: Option<ElementId>) -> bool {
    let Some(element) = store.get_mut(id) else {
        return false;
    };
    if element.is_frame() {
        let changed = element.parent_frame.is_some();
        element.parent_frame = None;
        return changed;
    }
    let changed = element.parent_frame != parent;
    element.parent_frame = parent;
    if let Some(frame) = parent {
        store.bring_to_top_of_frame(id, frame);
    }
    changed
}

/// Move a frame and every element it contains (transitively).
pub fn translate_frame_with_children(store: &mut ElementStore, frame_id: ElementId, delta: Vec2) {
    let moved = store.cascade_set(&[frame_id]);
    for element in store.iter_mut().filter(|e| moved.contains(&e.id)) {
        element.translate(delta);
    }
}

/// Push `frame_id` away from every other frame it overlaps.
///
/// Each pass moves the frame along the axis of smaller overlap, away from the
/// other frame's center, by the overlap plus `gap`. Stops after `max_passes`
/// even if overlap remains; returns whether the frame ended clear.
pub fn resolve_frame_overlaps(
    store: &mut ElementStore,
    frame_id: ElementId,
    gap: f64,
    max_passes: usize,
) -> bool {
    let mut total = Vec2::ZERO;
    for pass in 0..max_passes {
        let Some(mut bounds) = store.get(frame_id).map(|f| f.bounds()) else {
            return true;
        };
        let others: Vec<Rect> = store
            .frames()
            .filter(|f| f.id != frame_id)
            .map(|f| f.bounds())
            .collect();

        let mut moved = false;
        for other in others {
            let overlap_x = bounds.x1.min(other.x1) - bounds.x0.max(other.x0);
            let overlap_y = bounds.y1.min(other.y1) - bounds.y0.max(other.y0);
            if overlap_x <= 0.0 || overlap_y <= 0.0 {
                continue;
            }
            let delta = if overlap_x < overlap_y {
                let dir = if bounds.center().x < other.center().x { -1.0 } else { 1.0 };
                Vec2::new(dir * (overlap_x + gap), 0.0)
            } else {
                let dir = if bounds.center().y < other.center().y { -1.0 } else { 1.0 };
                Vec2::new(0.0, dir * (overlap_y + gap))
            };
            bounds = bounds + delta;
            total += delta;
            moved = true;
        }

        if !moved {
            apply_displacement(store, frame_id, total);
            log::debug!("Frame {} separated after {} pass(es)", frame_id, pass);
            return true;
        }
    }
    apply_displacement(store, frame_id, total);
    let clear = !overlaps_any_frame(store, frame_id);
    if !clear {
        log::debug!(
            "Frame {} still overlaps after {} separation passes; accepting",
            frame_id,
            max_passes
        );
    }
    clear
}

fn apply_displacement(store: &mut ElementStore, frame_id: ElementId, delta: Vec2) {
    if delta != Vec2::ZERO {
        translate_frame_with_children(store, frame_id, delta);
    }
}

fn overlaps_any_frame(store: &ElementStore, frame_id: ElementId) -> bool {
    let Some(bounds) = store.get(frame_id).map(|f| f.bounds()) else {
        return false;
    };
    store.frames().filter(|f| f.id != frame_id).any(|f| {
        let other = f.bounds();
        bounds.x1.min(other.x1) > bounds.x0.max(other.x0)
            && bounds.y1.min(other.y1) > bounds.y0.max(other.y0)
    })
}
