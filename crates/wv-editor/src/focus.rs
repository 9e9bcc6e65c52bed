//! Focus and stacking authority.
//!
//! Every path that focuses a window (title bar pointer-down, popup spawn,
//! shortcuts) goes through [`FocusArbiter::promote`]. Ordering itself is
//! stored by the canvas engine and not duplicated here.

use crate::canvas::CanvasEngine;
use wv_core::ShapeId;

pub struct FocusArbiter;

impl FocusArbiter {
    /// Select `id` and move it to the top of the paint/input order.
    /// Promoting the topmost selected shape changes nothing.
    pub fn promote(canvas: &mut dyn CanvasEngine, id: ShapeId) {
        log::debug!("{id}: promote");
        canvas.select_shape(id);
        canvas.bring_to_front(&[id]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wv_core::{ShapeDescriptor, ShapeStore};

    #[test]
    fn promote_twice_equals_promote_once() {
        let mut store = ShapeStore::new();
        let a = store.create(ShapeDescriptor::at(0.0, 0.0)).unwrap();
        let b = store.create(ShapeDescriptor::at(10.0, 10.0)).unwrap();

        FocusArbiter::promote(&mut store, a);
        let once = (store.paint_order(), store.selection().to_vec());
        FocusArbiter::promote(&mut store, a);
        let twice = (store.paint_order(), store.selection().to_vec());

        assert_eq!(once, twice);
        assert_eq!(once, (vec![b, a], vec![a]));
    }
}
