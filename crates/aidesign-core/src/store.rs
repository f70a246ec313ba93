//! Ordered element storage.

use crate::elements::{Element, ElementId};
use crate::error::{CanvasError, CanvasResult};
use crate::history::Snapshot;
use kurbo::Rect;
use std::collections::HashSet;

/// The ordered collection of canvas elements.
///
/// Array order is paint order: later elements draw on top.
#[derive(Debug, Clone, Default)]
pub struct ElementStore {
    elements: Vec<Element>,
}

impl ElementStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_elements(elements: Vec<Element>) -> Self {
        Self { elements }
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    pub fn iter(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = &mut Element> {
        self.elements.iter_mut()
    }

    /// Elements in paint order.
    pub fn elements(&self) -> &[Element] {
        &self.elements
    }

    /// Direct access for collaborators that reorder or bulk-edit.
    pub fn elements_mut(&mut self) -> &mut Vec<Element> {
        &mut self.elements
    }

    pub fn get(&self, id: ElementId) -> Option<&Element> {
        self.elements.iter().find(|e| e.id == id)
    }

    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut Element> {
        self.elements.iter_mut().find(|e| e.id == id)
    }

    /// Like [`get`](Self::get) but reports missing ids as an error.
    pub fn require(&self, id: ElementId) -> CanvasResult<&Element> {
        self.get(id).ok_or(CanvasError::ElementNotFound(id))
    }

    pub fn contains(&self, id: ElementId) -> bool {
        self.index_of(id).is_some()
    }

    pub fn index_of(&self, id: ElementId) -> Option<usize> {
        self.elements.iter().position(|e| e.id == id)
    }

    /// Append an element on top of everything else.
    pub fn push(&mut self, element: Element) -> ElementId {
        let id = element.id;
        self.elements.push(element);
        id
    }

    pub fn frames(&self) -> impl DoubleEndedIterator<Item = &Element> {
        self.elements.iter().filter(|e| e.is_frame())
    }

    /// The element's parent frame, if it still exists and is a frame.
    pub fn parent_of(&self, id: ElementId) -> Option<ElementId> {
        let parent = self.get(id)?.parent_frame?;
        self.get(parent).filter(|p| p.is_frame()).map(|p| p.id)
    }

    /// Children of `frame_id` in store order.
    pub fn frame_children(&self, frame_id: ElementId) -> Vec<&Element> {
        self.elements
            .iter()
            .filter(|e| e.parent_frame == Some(frame_id))
            .collect()
    }

    pub fn frame_child_ids(&self, frame_id: ElementId) -> Vec<ElementId> {
        self.frame_children(frame_id).iter().map(|e| e.id).collect()
    }

    /// Move `id` directly after the last current child of `frame_id`.
    ///
    /// Returns false when nothing moved (unknown ids, or already last).
    pub fn bring_to_top_of_frame(&mut self, id: ElementId, frame_id: ElementId) -> bool {
        let Some(from) = self.index_of(id) else {
            return false;
        };
        let Some(last) = self
            .elements
            .iter()
            .rposition(|e| e.parent_frame == Some(frame_id))
        else {
            return false;
        };
        if from == last || from == last + 1 {
            return false;
        }
        let element = self.elements.remove(from);
        let insert_at = if from < last { last } else { last + 1 };
        self.elements.insert(insert_at, element);
        true
    }

    /// `ids` plus every element transitively parented to one of them.
    pub fn cascade_set(&self, ids: &[ElementId]) -> HashSet<ElementId> {
        let mut set: HashSet<ElementId> = ids.iter().copied().collect();
        loop {
            let before = set.len();
            for element in &self.elements {
                if let Some(parent) = element.parent_frame {
                    if set.contains(&parent) {
                        set.insert(element.id);
                    }
                }
            }
            if set.len() == before {
                return set;
            }
        }
    }

    /// Delete `ids` together with their descendants. Returns the removed ids.
    pub fn delete_cascade(&mut self, ids: &[ElementId]) -> Vec<ElementId> {
        let doomed = self.cascade_set(ids);
        let removed: Vec<ElementId> = self
            .elements
            .iter()
            .filter(|e| doomed.contains(&e.id))
            .map(|e| e.id)
            .collect();
        self.elements.retain(|e| !doomed.contains(&e.id));
        removed
    }

    /// Union of the bounds of the given elements.
    pub fn bounds_of<'a>(&self, ids: impl IntoIterator<Item = &'a ElementId>) -> Option<Rect> {
        ids.into_iter()
            .filter_map(|id| self.get(*id))
            .map(Element::bounds)
            .reduce(|a, b| a.union(b))
    }

    /// Union of the bounds of every element.
    pub fn content_bounds(&self) -> Option<Rect> {
        self.elements.iter().map(Element::bounds).reduce(|a, b| a.union(b))
    }

    /// Serialize to the index-based document format.
    pub fn to_json(&self) -> CanvasResult<String> {
        Ok(serde_json::to_string(&Snapshot::capture(self))?)
    }

    /// Load from the index-based document format.
    ///
    /// Bitmaps are not part of the document; hydrate them afterwards.
    pub fn from_json(json: &str) -> CanvasResult<Self> {
        let snapshot: Snapshot = serde_json::from_str(json)?;
        Ok(snapshot.restore())
    }
}
