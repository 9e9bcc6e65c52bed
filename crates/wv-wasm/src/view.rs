//! Per-window view model handed to the page script.
//!
//! The page positions each frame element over its window's content box and
//! paints the chrome; everything it needs per window is flattened here.

use serde::Serialize;
use wv_core::WindowShape;
use wv_editor::{CanvasEngine, WindowController};
use wv_render::chrome::{content_opacity, title_label};

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowView {
    pub id: String,
    pub x: f64,
    pub y: f64,
    pub w: f64,
    pub h: f64,
    pub minimized: bool,
    pub selected: bool,
    pub label: String,
    pub progress: u8,
    pub loading: bool,
    pub dark_mode: bool,
    pub opacity: f64,
    /// `[x, y, w, h]` of the content box, absent while minimized.
    pub content: Option<[f64; 4]>,
}

impl WindowView {
    pub fn new(shape: &WindowShape, controller: &WindowController, selected: bool) -> Self {
        let layout = controller.chrome_layout(shape);
        let session = controller.session(shape.id);
        let title = session
            .map(|s| s.observed_title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(&shape.props.title);
        let loading = session.is_some_and(|s| s.is_loading);
        Self {
            id: shape.id.as_str().to_string(),
            x: shape.x,
            y: shape.y,
            w: shape.props.w,
            h: layout.title_bar.height() + layout.content.map_or(0.0, |c| c.height()),
            minimized: shape.props.is_minimized,
            selected,
            label: title_label(&shape.props.url, title),
            progress: session.map_or(0, |s| s.load_progress),
            loading,
            dark_mode: session.is_some_and(|s| s.is_dark_mode),
            opacity: content_opacity(loading),
            content: layout.content.map(|c| [c.x0, c.y0, c.width(), c.height()]),
        }
    }
}

/// Views for every window, back to front.
pub fn window_views(canvas: &dyn CanvasEngine, controller: &WindowController) -> Vec<WindowView> {
    let selected = canvas.selected();
    canvas
        .shape_ids()
        .into_iter()
        .filter_map(|id| canvas.get_shape(id))
        .map(|shape| {
            let is_selected = selected.contains(&shape.id);
            WindowView::new(&shape, controller, is_selected)
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wv_core::ShapeDescriptor;
    use wv_editor::{ChromeCommand, ControllerConfig, FrameEvent, SimSession};

    fn session() -> SimSession {
        SimSession::new(ControllerConfig::default())
    }

    #[test]
    fn loading_window_is_dimmed_with_progress() {
        let mut s = session();
        let id = s
            .open(ShapeDescriptor::at(10.0, 20.0).with_url("https://a.test"))
            .unwrap();
        let frame = s.frame_of(id).unwrap();
        s.emit(frame, FrameEvent::NavigationStarted);
        s.emit(frame, FrameEvent::NavigationCommitted {
            url: "https://a.test".into(),
        });

        let views = window_views(&s.canvas, &s.controller);
        assert_eq!(views.len(), 1);
        let view = &views[0];
        assert_eq!((view.progress, view.loading, view.opacity), (30, true, 0.7));
        assert_eq!(view.label, "https://a.test");
        assert_eq!(view.content, Some([10.0, 60.0, 500.0, 360.0]));
    }

    #[test]
    fn observed_title_joins_the_label() {
        let mut s = session();
        let id = s
            .open(ShapeDescriptor::at(0.0, 0.0).with_url("https://a.test"))
            .unwrap();
        let frame = s.frame_of(id).unwrap();
        s.host.set_title(frame, "Home");
        s.load(id, "https://a.test");
        s.advance(100);
        s.complete_scripts();

        let view = &window_views(&s.canvas, &s.controller)[0];
        assert_eq!(view.label, "https://a.test - Home");
        assert_eq!(view.opacity, 1.0);
    }

    #[test]
    fn minimized_window_collapses_to_its_title_bar() {
        let mut s = session();
        let id = s
            .open(ShapeDescriptor::at(0.0, 0.0).with_url("https://a.test"))
            .unwrap();
        s.command(id, ChromeCommand::Minimize).unwrap();

        let view = &window_views(&s.canvas, &s.controller)[0];
        assert!(view.minimized);
        assert_eq!((view.h, view.content), (40.0, None));
    }
}
