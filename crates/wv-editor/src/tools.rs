//! Window drag-to-create tool.
//!
//! Pointer down anchors a box, move stretches it, up yields a
//! `ShapeDescriptor` for the canvas to create. A click or a drag too thin
//! to be a window creates one at the default size instead.

use kurbo::{Point, Rect};
use wv_core::{DEFAULT_URL, ShapeDescriptor};

/// Drags shorter than this on either axis count as a click.
pub const MIN_DRAG: f64 = 4.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PointerEvent {
    Down(Point),
    Move(Point),
    Up(Point),
}

#[derive(Debug, Clone)]
pub struct WindowTool {
    url: String,
    anchor: Option<Point>,
    current: Point,
}

impl Default for WindowTool {
    fn default() -> Self {
        Self::new()
    }
}

impl WindowTool {
    pub fn new() -> Self {
        Self {
            url: DEFAULT_URL.to_string(),
            anchor: None,
            current: Point::ZERO,
        }
    }

    /// URL given to windows this tool creates.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = url.into();
        self
    }

    pub fn is_dragging(&self) -> bool {
        self.anchor.is_some()
    }

    /// The box being dragged, normalized.
    pub fn preview(&self) -> Option<Rect> {
        self.anchor.map(|a| Rect::from_points(a, self.current))
    }

    /// Feed a pointer event. Returns a descriptor when a drag completes.
    pub fn handle(&mut self, event: PointerEvent) -> Option<ShapeDescriptor> {
        match event {
            PointerEvent::Down(p) => {
                self.anchor = Some(p);
                self.current = p;
                None
            }
            PointerEvent::Move(p) => {
                self.current = p;
                None
            }
            PointerEvent::Up(p) => {
                let anchor = self.anchor.take()?;
                let rect = Rect::from_points(anchor, p);
                let descriptor = if rect.width() < MIN_DRAG || rect.height() < MIN_DRAG {
                    ShapeDescriptor::at(anchor.x, anchor.y)
                } else {
                    ShapeDescriptor::at(rect.x0, rect.y0).with_size(rect.width(), rect.height())
                };
                Some(descriptor.with_url(self.url.as_str()))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn drag_creates_normalized_box() {
        let mut tool = WindowTool::new();
        tool.handle(PointerEvent::Down(Point::new(300.0, 200.0)));
        tool.handle(PointerEvent::Move(Point::new(150.0, 250.0)));
        assert_eq!(
            tool.preview(),
            Some(Rect::new(150.0, 200.0, 300.0, 250.0))
        );
        let desc = tool.handle(PointerEvent::Up(Point::new(100.0, 500.0))).unwrap();
        assert_eq!(
            desc,
            ShapeDescriptor::at(100.0, 200.0)
                .with_size(200.0, 300.0)
                .with_url(DEFAULT_URL)
        );
        assert!(!tool.is_dragging());
    }

    #[test]
    fn click_uses_default_size() {
        let mut tool = WindowTool::new().with_url("https://a.test");
        tool.handle(PointerEvent::Down(Point::new(10.0, 10.0)));
        let desc = tool.handle(PointerEvent::Up(Point::new(12.0, 11.0))).unwrap();
        assert_eq!(desc, ShapeDescriptor::at(10.0, 10.0).with_url("https://a.test"));
    }

    #[test]
    fn up_without_down_is_ignored() {
        let mut tool = WindowTool::new();
        assert_eq!(tool.handle(PointerEvent::Up(Point::new(1.0, 1.0))), None);
    }
}
