//! Hit testing: point → window shape lookup.
//!
//! Walks the paint order front to back, so the topmost window under the
//! pointer wins. Minimized windows only hit on their title bar.

use kurbo::{Point, Rect};
use wv_core::WindowShape;

/// The rectangle a window occupies on the canvas right now.
pub fn window_rect(shape: &WindowShape, title_bar_height: f64) -> Rect {
    let b = shape.visible_bounds(title_bar_height);
    Rect::new(b.x, b.y, b.x + b.width, b.y + b.height)
}

/// Find the topmost window at `point` among `shapes`, given back to front.
pub fn hit_test(
    shapes: &[WindowShape],
    point: Point,
    title_bar_height: f64,
) -> Option<&WindowShape> {
    shapes
        .iter()
        .rev()
        .find(|shape| window_rect(shape, title_bar_height).contains(point))
}
