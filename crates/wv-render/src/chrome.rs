//! Window chrome layout.
//!
//! Every webview window carries a title bar with six round buttons: close,
//! minimize and maximize on the left; reload, fullscreen and dark mode on
//! the right. The label in between shows the URL and, once known, the page
//! title. A thin progress bar runs along the bottom edge of the title bar
//! while a page loads.
//!
//! All rectangles are in canvas coordinates.

use kurbo::{Point, Rect, RoundedRect};
use wv_core::WindowShape;

/// A clickable button in the title bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromeButton {
    Close,
    Minimize,
    Maximize,
    Reload,
    Fullscreen,
    DarkMode,
}

impl ChromeButton {
    /// Buttons anchored to the left edge, left to right.
    pub const LEFT: [ChromeButton; 3] = [Self::Close, Self::Minimize, Self::Maximize];
    /// Buttons anchored to the right edge, left to right.
    pub const RIGHT: [ChromeButton; 3] = [Self::Reload, Self::Fullscreen, Self::DarkMode];

    /// Tooltip text. Dark mode flips its wording with the current state.
    pub fn tooltip(self, dark_mode: bool) -> &'static str {
        match self {
            Self::Close => "Close",
            Self::Minimize => "Minimize",
            Self::Maximize => "Maximize",
            Self::Reload => "Reload",
            Self::Fullscreen => "Toggle Fullscreen",
            Self::DarkMode if dark_mode => "Disable Dark Mode",
            Self::DarkMode => "Enable Dark Mode",
        }
    }
}

/// What a pointer landed on inside a window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChromeHit {
    Button(ChromeButton),
    TitleBar,
    Content,
}

/// Fixed chrome dimensions.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChromeMetrics {
    pub title_bar_height: f64,
    pub padding: f64,
    pub button_size: f64,
    pub button_gap: f64,
    pub corner_radius: f64,
    pub progress_height: f64,
}

impl Default for ChromeMetrics {
    fn default() -> Self {
        Self {
            title_bar_height: 40.0,
            padding: 8.0,
            button_size: 12.0,
            button_gap: 8.0,
            corner_radius: 8.0,
            progress_height: 2.0,
        }
    }
}

impl ChromeMetrics {
    pub fn with_title_bar_height(title_bar_height: f64) -> Self {
        Self {
            title_bar_height,
            ..Self::default()
        }
    }
}

/// Resolved chrome geometry for one window.
#[derive(Debug, Clone, PartialEq)]
pub struct ChromeLayout {
    pub title_bar: Rect,
    /// `None` while the window is minimized.
    pub content: Option<Rect>,
    pub buttons: [(ChromeButton, Rect); 6],
    metrics: ChromeMetrics,
}

impl ChromeLayout {
    pub fn new(shape: &WindowShape, metrics: ChromeMetrics) -> Self {
        let (x, y) = (shape.x, shape.y);
        let w = shape.props.w;
        let bar = metrics.title_bar_height.min(shape.props.h.max(0.0));
        let bar = if shape.props.is_minimized {
            metrics.title_bar_height
        } else {
            bar
        };
        let title_bar = Rect::new(x, y, x + w, y + bar);

        let content = (!shape.props.is_minimized && shape.props.h > bar)
            .then(|| Rect::new(x, y + bar, x + w, y + shape.props.h));

        let cy = y + bar / 2.0;
        let step = metrics.button_size + metrics.button_gap;
        let button_at = |x0: f64| {
            Rect::new(
                x0,
                cy - metrics.button_size / 2.0,
                x0 + metrics.button_size,
                cy + metrics.button_size / 2.0,
            )
        };

        let left_start = x + metrics.padding;
        let right_start = x + w - metrics.padding - 3.0 * metrics.button_size - 2.0 * metrics.button_gap;
        let mut buttons = [(ChromeButton::Close, Rect::ZERO); 6];
        for (i, button) in ChromeButton::LEFT.iter().enumerate() {
            buttons[i] = (*button, button_at(left_start + i as f64 * step));
        }
        for (i, button) in ChromeButton::RIGHT.iter().enumerate() {
            buttons[3 + i] = (*button, button_at(right_start + i as f64 * step));
        }

        Self {
            title_bar,
            content,
            buttons,
            metrics,
        }
    }

    /// Classify a canvas point. Buttons take precedence over the bar.
    pub fn hit(&self, point: Point) -> Option<ChromeHit> {
        if let Some((button, _)) = self.buttons.iter().find(|(_, r)| r.contains(point)) {
            return Some(ChromeHit::Button(*button));
        }
        if self.title_bar.contains(point) {
            return Some(ChromeHit::TitleBar);
        }
        match self.content {
            Some(content) if content.contains(point) => Some(ChromeHit::Content),
            _ => None,
        }
    }

    pub fn button_rect(&self, button: ChromeButton) -> Rect {
        self.buttons
            .iter()
            .find(|(b, _)| *b == button)
            .map(|(_, r)| *r)
            .unwrap_or(Rect::ZERO)
    }

    /// The loading bar for `progress` percent, hidden at 0.
    pub fn progress_bar(&self, progress: u8) -> Option<Rect> {
        if progress == 0 {
            return None;
        }
        let frac = f64::from(progress.min(100)) / 100.0;
        let bar = self.title_bar;
        Some(Rect::new(
            bar.x0,
            bar.y1 - self.metrics.progress_height,
            bar.x0 + bar.width() * frac,
            bar.y1,
        ))
    }

    /// Selection indicator outline: the full persisted box, rounded.
    pub fn indicator(shape: &WindowShape, metrics: &ChromeMetrics) -> RoundedRect {
        RoundedRect::new(
            shape.x,
            shape.y,
            shape.x + shape.props.w,
            shape.y + shape.props.h,
            metrics.corner_radius,
        )
    }
}

/// Title bar text: the URL, followed by the page title once known.
pub fn title_label(url: &str, title: &str) -> String {
    if title.is_empty() {
        url.to_string()
    } else {
        format!("{url} - {title}")
    }
}

/// Content is dimmed while a page loads.
pub fn content_opacity(is_loading: bool) -> f64 {
    if is_loading { 0.7 } else { 1.0 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wv_core::{ShapeDescriptor, ShapeId, ShapePatch};

    fn shape() -> WindowShape {
        ShapeDescriptor::at(100.0, 100.0)
            .into_shape(ShapeId::intern("shape:chrome"))
            .unwrap()
    }

    #[test]
    fn buttons_map_to_their_slots() {
        let layout = ChromeLayout::new(&shape(), ChromeMetrics::default());
        // Close sits at padding, vertically centered in the bar.
        assert_eq!(
            layout.hit(Point::new(114.0, 120.0)),
            Some(ChromeHit::Button(ChromeButton::Close))
        );
        // Dark mode is the rightmost button.
        assert_eq!(
            layout.hit(Point::new(100.0 + 500.0 - 8.0 - 6.0, 120.0)),
            Some(ChromeHit::Button(ChromeButton::DarkMode))
        );
        assert_eq!(layout.hit(Point::new(350.0, 120.0)), Some(ChromeHit::TitleBar));
        assert_eq!(layout.hit(Point::new(350.0, 300.0)), Some(ChromeHit::Content));
        assert_eq!(layout.hit(Point::new(50.0, 50.0)), None);
    }

    #[test]
    fn minimized_window_has_no_content() {
        let mut s = shape();
        ShapePatch::minimized(true).apply(&mut s).unwrap();
        let layout = ChromeLayout::new(&s, ChromeMetrics::default());
        assert_eq!(layout.content, None);
        assert_eq!(layout.hit(Point::new(350.0, 300.0)), None);
        assert_eq!(layout.title_bar.height(), 40.0);
    }

    #[test]
    fn progress_bar_tracks_percentage() {
        let layout = ChromeLayout::new(&shape(), ChromeMetrics::default());
        assert_eq!(layout.progress_bar(0), None);
        let bar = layout.progress_bar(30).unwrap();
        assert_eq!(bar.width(), 150.0);
        assert_eq!(bar.y1, 140.0);
        assert_eq!(layout.progress_bar(100).unwrap().width(), 500.0);
    }

    #[test]
    fn label_appends_known_title() {
        assert_eq!(title_label("https://a.test", ""), "https://a.test");
        assert_eq!(title_label("https://a.test", "A"), "https://a.test - A");
        assert_eq!(content_opacity(true), 0.7);
    }
}
