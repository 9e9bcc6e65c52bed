//! In-memory shape store: the reference canvas document.
//!
//! Holds every window shape, the paint/input stacking order, the current
//! selection, and popup lineage. Lineage is a directed graph: an edge
//! `opener → popup` is added when a shape is inserted with an `opener`
//! that is still present. The graph is derived state; the persisted source
//! of truth is the `opener` prop itself.

use crate::id::ShapeId;
use crate::model::{SchemaError, ShapeDescriptor, ShapePatch, WindowShape};
use crate::snapshot::DocumentSnapshot;
use petgraph::Direction;
use petgraph::graph::NodeIndex;
use petgraph::stable_graph::StableDiGraph;
use smallvec::SmallVec;
use std::collections::HashMap;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum StoreError {
    #[error("no shape with id {0}")]
    UnknownShape(ShapeId),
    #[error("a shape with id {0} already exists")]
    DuplicateId(ShapeId),
    #[error("document already holds the maximum of {limit} shapes")]
    CapacityReached { limit: usize },
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

/// The canvas document: shapes, stacking order, selection, lineage.
#[derive(Debug, Clone, Default)]
pub struct ShapeStore {
    /// Shapes as graph nodes; edges record popup lineage.
    graph: StableDiGraph<WindowShape, ()>,

    /// Index from ShapeId → NodeIndex for fast lookup.
    id_index: HashMap<ShapeId, NodeIndex>,

    /// Paint order, back to front. The last entry is on top.
    paint_order: Vec<NodeIndex>,

    /// Currently selected shapes.
    selection: SmallVec<[ShapeId; 4]>,

    /// Optional cap on the number of shapes; creation fails beyond it.
    capacity_limit: Option<usize>,
}

impl ShapeStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// A store that refuses to grow beyond `limit` shapes.
    #[must_use]
    pub fn with_capacity_limit(limit: usize) -> Self {
        Self {
            capacity_limit: Some(limit),
            ..Self::default()
        }
    }

    pub fn len(&self) -> usize {
        self.id_index.len()
    }

    pub fn is_empty(&self) -> bool {
        self.id_index.is_empty()
    }

    pub fn contains(&self, id: ShapeId) -> bool {
        self.id_index.contains_key(&id)
    }

    /// Create a shape from a descriptor, assigning a fresh id.
    pub fn create(&mut self, descriptor: ShapeDescriptor) -> Result<ShapeId, StoreError> {
        self.check_capacity()?;
        let shape = descriptor.into_shape(ShapeId::with_prefix("webview"))?;
        self.insert(shape)
    }

    /// Insert a fully-formed shape on top of the paint order.
    pub fn insert(&mut self, shape: WindowShape) -> Result<ShapeId, StoreError> {
        shape.validate()?;
        if self.contains(shape.id) {
            return Err(StoreError::DuplicateId(shape.id));
        }
        self.check_capacity()?;

        let id = shape.id;
        let opener = shape.props.opener;
        let idx = self.graph.add_node(shape);
        self.id_index.insert(id, idx);
        self.paint_order.push(idx);

        if let Some(opener_idx) = opener.and_then(|o| self.index_of(o)) {
            self.graph.add_edge(opener_idx, idx, ());
        }
        log::trace!("store: inserted {id}");
        Ok(id)
    }

    fn check_capacity(&self) -> Result<(), StoreError> {
        match self.capacity_limit {
            Some(limit) if self.len() >= limit => Err(StoreError::CapacityReached { limit }),
            _ => Ok(()),
        }
    }

    fn index_of(&self, id: ShapeId) -> Option<NodeIndex> {
        self.id_index.get(&id).copied()
    }

    pub fn get(&self, id: ShapeId) -> Option<&WindowShape> {
        self.index_of(id).map(|idx| &self.graph[idx])
    }

    /// Apply a patch atomically. A rejected patch changes nothing.
    pub fn update(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<(), StoreError> {
        let idx = self.index_of(id).ok_or(StoreError::UnknownShape(id))?;
        patch.apply(&mut self.graph[idx])?;
        Ok(())
    }

    /// Remove a shape, keeping the index, order, and selection in sync.
    pub fn remove(&mut self, id: ShapeId) -> Option<WindowShape> {
        let idx = self.id_index.remove(&id)?;
        self.paint_order.retain(|&i| i != idx);
        self.selection.retain(|s| *s != id);
        self.graph.remove_node(idx)
    }

    /// Replace the selection with a single shape.
    pub fn select(&mut self, id: ShapeId) -> bool {
        if !self.contains(id) {
            return false;
        }
        self.selection.clear();
        self.selection.push(id);
        true
    }

    pub fn selection(&self) -> &[ShapeId] {
        &self.selection
    }

    /// Move the given shapes to the top of the paint order, keeping their
    /// relative order. Returns true if the order changed.
    pub fn bring_to_front(&mut self, ids: &[ShapeId]) -> bool {
        let moving: Vec<NodeIndex> = self
            .paint_order
            .iter()
            .copied()
            .filter(|idx| ids.contains(&self.graph[*idx].id))
            .collect();
        if moving.is_empty() {
            return false;
        }
        let mut new_order: Vec<NodeIndex> = self
            .paint_order
            .iter()
            .copied()
            .filter(|idx| !moving.contains(idx))
            .collect();
        new_order.extend(moving);
        if new_order == self.paint_order {
            return false;
        }
        self.paint_order = new_order;
        true
    }

    /// Shape ids back to front.
    pub fn paint_order(&self) -> Vec<ShapeId> {
        self.paint_order.iter().map(|idx| self.graph[*idx].id).collect()
    }

    /// The shape painted on top, if any.
    pub fn topmost(&self) -> Option<ShapeId> {
        self.paint_order.last().map(|idx| self.graph[*idx].id)
    }

    /// Shapes back to front.
    pub fn shapes(&self) -> impl Iterator<Item = &WindowShape> {
        self.paint_order.iter().map(|idx| &self.graph[*idx])
    }

    /// Popups this shape opened that are still on the canvas.
    pub fn popups_of(&self, id: ShapeId) -> Vec<ShapeId> {
        let Some(idx) = self.index_of(id) else {
            return Vec::new();
        };
        let mut popups: Vec<ShapeId> = self
            .graph
            .neighbors_directed(idx, Direction::Outgoing)
            .map(|child| self.graph[child].id)
            .collect();
        popups.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        popups
    }

    /// Capture the document in paint order.
    pub fn snapshot(&self) -> DocumentSnapshot {
        DocumentSnapshot::new(self.shapes().cloned().collect(), self.selection.to_vec())
    }

    /// Rebuild a store from a snapshot. Shapes are inserted in snapshot
    /// order, so the paint order and lineage edges are restored.
    pub fn restore(snapshot: DocumentSnapshot) -> Result<Self, StoreError> {
        let mut store = Self::new();
        let shapes = snapshot.shapes;
        // Insert everything first so lineage edges can point at openers that
        // appear later in the paint order.
        for shape in &shapes {
            let mut bare = shape.clone();
            bare.props.opener = None;
            store.insert(bare)?;
        }
        for shape in shapes {
            if let (Some(opener), Some(idx)) = (shape.props.opener, store.index_of(shape.id)) {
                store.graph[idx].props.opener = Some(opener);
                if let Some(opener_idx) = store.index_of(opener) {
                    store.graph.add_edge(opener_idx, idx, ());
                }
            }
        }
        for id in snapshot.selection {
            if store.contains(id) {
                store.selection.push(id);
            }
        }
        Ok(store)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn window(store: &mut ShapeStore, x: f64, y: f64) -> ShapeId {
        store.create(ShapeDescriptor::at(x, y)).unwrap()
    }

    #[test]
    fn create_assigns_defaults_and_stacks_on_top() {
        let mut store = ShapeStore::new();
        let a = window(&mut store, 0.0, 0.0);
        let b = window(&mut store, 10.0, 10.0);
        assert_eq!(store.paint_order(), vec![a, b]);
        assert_eq!(store.get(a).unwrap().props.url, "https://example.com");
    }

    #[test]
    fn bring_to_front_is_idempotent() {
        let mut store = ShapeStore::new();
        let a = window(&mut store, 0.0, 0.0);
        let b = window(&mut store, 0.0, 0.0);
        let c = window(&mut store, 0.0, 0.0);

        assert!(store.bring_to_front(&[a]));
        let once = store.paint_order();
        assert!(!store.bring_to_front(&[a]));
        assert_eq!(store.paint_order(), once);
        assert_eq!(once, vec![b, c, a]);
    }

    #[test]
    fn bring_to_front_keeps_relative_order_of_group() {
        let mut store = ShapeStore::new();
        let a = window(&mut store, 0.0, 0.0);
        let b = window(&mut store, 0.0, 0.0);
        let c = window(&mut store, 0.0, 0.0);
        store.bring_to_front(&[c, a]);
        assert_eq!(store.paint_order(), vec![b, a, c]);
    }

    #[test]
    fn remove_drops_selection_and_lineage() {
        let mut store = ShapeStore::new();
        let parent = window(&mut store, 0.0, 0.0);
        let popup = store
            .create(ShapeDescriptor {
                opener: Some(parent),
                ..ShapeDescriptor::at(50.0, 50.0)
            })
            .unwrap();
        assert_eq!(store.popups_of(parent), vec![popup]);

        store.select(parent);
        assert!(store.remove(parent).is_some());
        assert!(store.selection().is_empty());
        assert_eq!(store.paint_order(), vec![popup]);
        // The persisted opener survives; only the live edge is gone.
        assert_eq!(store.get(popup).unwrap().props.opener, Some(parent));
    }

    #[test]
    fn capacity_limit_rejects_creation() {
        let mut store = ShapeStore::with_capacity_limit(1);
        window(&mut store, 0.0, 0.0);
        assert_eq!(
            store.create(ShapeDescriptor::at(1.0, 1.0)),
            Err(StoreError::CapacityReached { limit: 1 })
        );
        assert_eq!(store.len(), 1);
    }

    #[test]
    fn update_unknown_shape_fails() {
        let mut store = ShapeStore::new();
        let ghost = ShapeId::intern("shape:ghost");
        assert_eq!(
            store.update(ghost, &ShapePatch::minimized(true)),
            Err(StoreError::UnknownShape(ghost))
        );
    }

    #[test]
    fn restore_rebuilds_order_selection_and_lineage() {
        let mut store = ShapeStore::new();
        let a = window(&mut store, 0.0, 0.0);
        let popup = store
            .create(ShapeDescriptor {
                opener: Some(a),
                ..ShapeDescriptor::at(50.0, 50.0)
            })
            .unwrap();
        store.bring_to_front(&[a]);
        store.select(popup);

        let restored = ShapeStore::restore(store.snapshot()).unwrap();
        assert_eq!(restored.paint_order(), vec![popup, a]);
        assert_eq!(restored.selection(), &[popup]);
        assert_eq!(restored.popups_of(a), vec![popup]);
    }
}
