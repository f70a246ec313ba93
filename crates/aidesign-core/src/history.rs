//! Undo/redo over snapshots of the element store.

use crate::elements::Element;
use crate::store::ElementStore;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// Default maximum number of undo states.
pub const MAX_UNDO_HISTORY: usize = 50;

/// An element with its parent relation rewritten to a store index.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotElement {
    pub element: Element,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent_index: Option<usize>,
}

/// A structural clone of the element store.
///
/// Bitmaps are shared with the live store and skipped when serialized, so the
/// JSON form doubles as a content key for deduplication.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Snapshot {
    pub elements: Vec<SnapshotElement>,
}

impl Snapshot {
    /// Clone `store`, rewriting `parent_frame` ids to indices.
    pub fn capture(store: &ElementStore) -> Self {
        let index: HashMap<_, _> = store
            .iter()
            .enumerate()
            .map(|(i, e)| (e.id, i))
            .collect();
        let elements = store
            .iter()
            .map(|element| SnapshotElement {
                parent_index: element
                    .parent_frame
                    .and_then(|parent| index.get(&parent).copied()),
                element: element.clone(),
            })
            .collect();
        Self { elements }
    }

    /// Rebuild a store, resolving parent indices back to ids.
    ///
    /// Indices that are out of range, self-referential or point at a
    /// non-frame resolve to "no parent".
    pub fn restore(&self) -> ElementStore {
        let mut elements: Vec<Element> = self.elements.iter().map(|s| s.element.clone()).collect();
        for (i, entry) in self.elements.iter().enumerate() {
            let parent = entry.parent_index.and_then(|p| {
                let resolved = self
                    .elements
                    .get(p)
                    .filter(|candidate| {
                        p != i && candidate.element.is_frame() && !entry.element.is_frame()
                    })
                    .map(|candidate| candidate.element.id);
                if resolved.is_none() {
                    log::warn!(
                        "Unresolvable parent index {} for element {}; treating as top-level",
                        p,
                        entry.element.id
                    );
                }
                resolved
            });
            elements[i].parent_frame = parent;
        }
        ElementStore::from_elements(elements)
    }

    /// Content key used to coalesce identical consecutive snapshots.
    pub fn content_key(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }
}

#[derive(Debug, Clone)]
struct HistoryEntry {
    snapshot: Snapshot,
    key: String,
}

impl HistoryEntry {
    fn capture(store: &ElementStore) -> Self {
        let snapshot = Snapshot::capture(store);
        let key = snapshot.content_key();
        Self { snapshot, key }
    }
}

/// Bounded undo/redo stacks.
///
/// The top of `past` always mirrors the most recently recorded state, so a
/// baseline is recorded when the history is created or reset.
#[derive(Debug, Clone)]
pub struct History {
    past: Vec<HistoryEntry>,
    future: Vec<HistoryEntry>,
    capacity: usize,
    suppress_depth: usize,
}

impl History {
    /// Create a history whose baseline is the current content of `store`.
    pub fn new(store: &ElementStore, capacity: usize) -> Self {
        Self {
            past: vec![HistoryEntry::capture(store)],
            future: Vec::new(),
            capacity: capacity.max(1),
            suppress_depth: 0,
        }
    }

    /// Drop all entries and record a new baseline.
    pub fn reset(&mut self, store: &ElementStore) {
        self.past = vec![HistoryEntry::capture(store)];
        self.future.clear();
    }

    /// Record the current store. Returns true if an entry was pushed.
    ///
    /// Skipped while suppressed, and when the content equals the top entry.
    pub fn save_state(&mut self, store: &ElementStore) -> bool {
        if self.is_suppressed() {
            return false;
        }
        let entry = HistoryEntry::capture(store);
        if self.past.last().is_some_and(|top| top.key == entry.key) {
            log::debug!("History: skipping duplicate snapshot");
            return false;
        }
        self.past.push(entry);
        if self.past.len() > self.capacity {
            self.past.remove(0);
            log::debug!("History: evicted oldest state (capacity {})", self.capacity);
        }
        self.future.clear();
        log::debug!("History: saved state ({} undo levels)", self.past.len() - 1);
        true
    }

    /// Step back one state. Returns false if there is nothing to undo.
    pub fn undo(&mut self, store: &mut ElementStore) -> bool {
        if self.past.len() < 2 {
            return false;
        }
        let Some(current) = self.past.pop() else {
            return false;
        };
        self.future.push(current);
        if let Some(previous) = self.past.last() {
            *store = previous.snapshot.restore();
        }
        true
    }

    /// Re-apply the most recently undone state.
    pub fn redo(&mut self, store: &mut ElementStore) -> bool {
        let Some(next) = self.future.pop() else {
            return false;
        };
        *store = next.snapshot.restore();
        self.past.push(next);
        true
    }

    pub fn can_undo(&self) -> bool {
        self.past.len() > 1
    }

    pub fn can_redo(&self) -> bool {
        !self.future.is_empty()
    }

    /// Number of entries on the past stack, baseline included.
    pub fn past_len(&self) -> usize {
        self.past.len()
    }

    pub fn future_len(&self) -> usize {
        self.future.len()
    }

    /// Pause recording. Calls nest; each needs a matching [`resume`](Self::resume).
    pub fn suppress(&mut self) {
        self.suppress_depth += 1;
    }

    pub fn resume(&mut self) {
        self.suppress_depth = self.suppress_depth.saturating_sub(1);
    }

    pub fn is_suppressed(&self) -> bool {
        self.suppress_depth > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bitmap::Bitmap;
    use crate::elements::{ElementKind, ImageData, ShapeType};
    use kurbo::{Rect, Vec2};
    use std::sync::Arc;

    fn store_with_shape() -> (ElementStore, uuid::Uuid) {
        let mut store = ElementStore::new();
        let id = store.push(Element::shape(
            ShapeType::Rectangle,
            Rect::new(0.0, 0.0, 10.0, 10.0),
        ));
        (store, id)
    }

    #[test]
    fn test_dedup_consecutive_saves() {
        let (mut store, id) = store_with_shape();
        let mut history = History::new(&store, MAX_UNDO_HISTORY);
        store.get_mut(id).unwrap().translate(Vec2::new(5.0, 0.0));
        assert!(history.save_state(&store));
        assert!(!history.save_state(&store));
        assert_eq!(history.past_len(), 2);
    }

    #[test]
    fn test_undo_redo() {
        let (mut store, id) = store_with_shape();
        let mut history = History::new(&store, MAX_UNDO_HISTORY);
        store.get_mut(id).unwrap().translate(Vec2::new(5.0, 0.0));
        history.save_state(&store);

        assert!(history.undo(&mut store));
        assert!((store.get(id).unwrap().x - 0.0).abs() < f64::EPSILON);
        assert!(!history.undo(&mut store));

        assert!(history.redo(&mut store));
        assert!((store.get(id).unwrap().x - 5.0).abs() < f64::EPSILON);
        assert!(!history.redo(&mut store));
    }

    #[test]
    fn test_save_clears_future() {
        let (mut store, id) = store_with_shape();
        let mut history = History::new(&store, MAX_UNDO_HISTORY);
        store.get_mut(id).unwrap().x = 1.0;
        history.save_state(&store);
        history.undo(&mut store);
        assert!(history.can_redo());
        store.get_mut(id).unwrap().x = 2.0;
        history.save_state(&store);
        assert!(!history.can_redo());
    }

    #[test]
    fn test_capacity_evicts_oldest() {
        let (mut store, id) = store_with_shape();
        let mut history = History::new(&store, 3);
        for i in 1..=5 {
            store.get_mut(id).unwrap().x = i as f64;
            history.save_state(&store);
        }
        assert_eq!(history.past_len(), 3);
        while history.undo(&mut store) {}
        assert!((store.get(id).unwrap().x - 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_suppressed_saves_are_ignored() {
        let (mut store, id) = store_with_shape();
        let mut history = History::new(&store, MAX_UNDO_HISTORY);
        history.suppress();
        store.get_mut(id).unwrap().x = 7.0;
        assert!(!history.save_state(&store));
        history.resume();
        assert!(history.save_state(&store));
        assert_eq!(history.past_len(), 2);
    }

    #[test]
    fn test_parent_relation_survives_restore() {
        let mut store = ElementStore::new();
        let frame = store.push(Element::frame(Rect::new(0.0, 0.0, 100.0, 100.0), "F"));
        let mut child = Element::shape(ShapeType::Ellipse, Rect::new(10.0, 10.0, 20.0, 20.0));
        child.parent_frame = Some(frame);
        let child = store.push(child);

        let restored = Snapshot::capture(&store).restore();
        assert_eq!(restored.get(child).unwrap().parent_frame, Some(frame));
    }

    #[test]
    fn test_invalid_parent_index_means_no_parent() {
        let (store, id) = store_with_shape();
        let mut snapshot = Snapshot::capture(&store);
        snapshot.elements[0].parent_index = Some(42);
        let restored = snapshot.restore();
        assert_eq!(restored.get(id).unwrap().parent_frame, None);

        snapshot.elements[0].parent_index = Some(0);
        assert_eq!(snapshot.restore().get(id).unwrap().parent_frame, None);
    }

    #[test]
    fn test_frame_never_restores_inside_frame() {
        let mut store = ElementStore::new();
        store.push(Element::frame(Rect::new(0.0, 0.0, 100.0, 100.0), "Outer"));
        let inner = store.push(Element::frame(Rect::new(10.0, 10.0, 50.0, 50.0), "Inner"));
        let mut snapshot = Snapshot::capture(&store);
        snapshot.elements[1].parent_index = Some(0);

        let restored = snapshot.restore();
        assert_eq!(restored.get(inner).unwrap().parent_frame, None);
        assert!(restored.frame_children(restored.elements()[0].id).is_empty());
    }

    #[test]
    fn test_bitmaps_are_shared_and_ignored_by_key() {
        let mut store = ElementStore::new();
        let bitmap = Arc::new(Bitmap {
            width: 1,
            height: 1,
            pixels: vec![0, 0, 0, 255],
        });
        let id = store.push(Element::image(
            Rect::new(0.0, 0.0, 10.0, 10.0),
            ImageData::with_bitmap("data:image/png;base64,AAAA", bitmap.clone()),
        ));
        let snapshot = Snapshot::capture(&store);
        let ElementKind::Image(data) = &snapshot.elements[0].element.kind else {
            panic!("expected image");
        };
        assert!(Arc::ptr_eq(data.bitmap.as_ref().unwrap(), &bitmap));

        store.get_mut(id).unwrap().as_image_mut().unwrap().bitmap = None;
        assert_eq!(Snapshot::capture(&store).content_key(), snapshot.content_key());
    }
}
