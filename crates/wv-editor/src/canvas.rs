//! Canvas engine boundary.
//!
//! The canvas owns shapes, ids, selection and stacking order. The
//! controller only reads shapes and requests single atomic mutations;
//! [`ShapeStore`] is the in-memory engine used by the simulator and tests.

use thiserror::Error;
use wv_core::{ShapeDescriptor, ShapeId, ShapePatch, ShapeStore, StoreError, WindowShape};

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CanvasError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("canvas rejected the request: {0}")]
    Rejected(String),
}

/// Shape operations the controller consumes.
pub trait CanvasEngine {
    fn create_shape(&mut self, descriptor: ShapeDescriptor) -> Result<ShapeId, CanvasError>;
    fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<(), CanvasError>;
    fn delete_shape(&mut self, id: ShapeId) -> Result<(), CanvasError>;
    fn select_shape(&mut self, id: ShapeId);
    fn bring_to_front(&mut self, ids: &[ShapeId]);
    fn get_shape(&self, id: ShapeId) -> Option<WindowShape>;
    /// Every webview shape id, back to front.
    fn shape_ids(&self) -> Vec<ShapeId>;
    fn selected(&self) -> Vec<ShapeId>;
    /// Shapes still on the canvas that `id` opened as popups.
    fn popups_of(&self, id: ShapeId) -> Vec<ShapeId>;
}

impl CanvasEngine for ShapeStore {
    fn create_shape(&mut self, descriptor: ShapeDescriptor) -> Result<ShapeId, CanvasError> {
        Ok(self.create(descriptor)?)
    }

    fn update_shape(&mut self, id: ShapeId, patch: &ShapePatch) -> Result<(), CanvasError> {
        Ok(self.update(id, patch)?)
    }

    fn delete_shape(&mut self, id: ShapeId) -> Result<(), CanvasError> {
        self.remove(id)
            .map(|_| ())
            .ok_or(CanvasError::Store(StoreError::UnknownShape(id)))
    }

    fn select_shape(&mut self, id: ShapeId) {
        if !self.select(id) {
            log::warn!("canvas: cannot select missing shape {id}");
        }
    }

    fn bring_to_front(&mut self, ids: &[ShapeId]) {
        ShapeStore::bring_to_front(self, ids);
    }

    fn get_shape(&self, id: ShapeId) -> Option<WindowShape> {
        self.get(id).cloned()
    }

    fn shape_ids(&self) -> Vec<ShapeId> {
        self.paint_order()
    }

    fn selected(&self) -> Vec<ShapeId> {
        self.selection().to_vec()
    }

    fn popups_of(&self, id: ShapeId) -> Vec<ShapeId> {
        ShapeStore::popups_of(self, id)
    }
}
