//! Canvas2D window chrome painter.
//!
//! Paints the canvas backdrop and every window's title bar, buttons,
//! loading bar and selection outline. Page content is never painted here:
//! the frame elements sit on top of the canvas in their content boxes.

use kurbo::Rect;
use web_sys::CanvasRenderingContext2d;
use wv_core::WindowShape;
use wv_editor::WindowController;
use wv_render::{ChromeButton, ChromeLayout, ChromeMetrics};

use crate::view::WindowView;

/// Theme-dependent chrome colors.
pub struct ChromeTheme {
    pub bg: &'static str,
    pub bar: &'static str,
    pub bar_border: &'static str,
    pub label: &'static str,
    pub idle_button: &'static str,
    pub progress: &'static str,
    pub selection: &'static str,
}

impl ChromeTheme {
    pub fn light() -> Self {
        Self {
            bg: "#F5F5F7",
            bar: "#ECECEE",
            bar_border: "rgba(0, 0, 0, 0.12)",
            label: "#3A3A3C",
            idle_button: "#C7C7CC",
            progress: "#0A84FF",
            selection: "#4FC3F7",
        }
    }

    pub fn dark() -> Self {
        Self {
            bg: "#1C1C1E",
            bar: "#2C2C2E",
            bar_border: "rgba(255, 255, 255, 0.08)",
            label: "#D1D1D6",
            idle_button: "#636366",
            progress: "#0A84FF",
            selection: "#4FC3F7",
        }
    }
}

/// Clear the canvas and paint chrome for `windows`, back to front.
pub fn render_chrome(
    ctx: &CanvasRenderingContext2d,
    controller: &WindowController,
    windows: &[(WindowShape, WindowView)],
    width: f64,
    height: f64,
    theme: &ChromeTheme,
) {
    ctx.set_fill_style_str(theme.bg);
    ctx.fill_rect(0.0, 0.0, width, height);

    let metrics = controller.metrics();
    for (shape, view) in windows {
        let layout = ChromeLayout::new(shape, metrics);
        draw_window(ctx, &layout, view, &metrics, theme);
        if view.selected {
            let outline = ChromeLayout::indicator(shape, &metrics);
            let r = outline.rect();
            ctx.set_stroke_style_str(theme.selection);
            ctx.set_line_width(2.0);
            rounded_rect_path(ctx, r.inflate(1.0, 1.0), metrics.corner_radius);
            ctx.stroke();
        }
    }
}

fn draw_window(
    ctx: &CanvasRenderingContext2d,
    layout: &ChromeLayout,
    view: &WindowView,
    metrics: &ChromeMetrics,
    theme: &ChromeTheme,
) {
    let bar = layout.title_bar;
    ctx.save();
    ctx.set_fill_style_str(theme.bar);
    rounded_rect_path(ctx, bar, metrics.corner_radius);
    ctx.fill();
    ctx.set_stroke_style_str(theme.bar_border);
    ctx.set_line_width(1.0);
    ctx.stroke();

    for (button, rect) in &layout.buttons {
        let center = rect.center();
        ctx.begin_path();
        let _ = ctx.arc(center.x, center.y, rect.width() / 2.0, 0.0, std::f64::consts::TAU);
        ctx.set_fill_style_str(button_color(*button, view.dark_mode, theme));
        ctx.fill();
    }

    draw_label(ctx, layout, &view.label, theme);

    if let Some(progress) = layout.progress_bar(view.progress) {
        ctx.set_fill_style_str(theme.progress);
        ctx.fill_rect(progress.x0, progress.y0, progress.width(), progress.height());
    }
    ctx.restore();
}

/// Label text is clipped to the gap between the two button groups.
fn draw_label(
    ctx: &CanvasRenderingContext2d,
    layout: &ChromeLayout,
    label: &str,
    theme: &ChromeTheme,
) {
    let left = layout.button_rect(ChromeButton::Maximize).x1 + 12.0;
    let right = layout.button_rect(ChromeButton::Reload).x0 - 12.0;
    if right <= left {
        return;
    }
    let bar = layout.title_bar;
    ctx.save();
    ctx.begin_path();
    ctx.rect(left, bar.y0, right - left, bar.height());
    ctx.clip();
    ctx.set_font("12px -apple-system, BlinkMacSystemFont, sans-serif");
    ctx.set_fill_style_str(theme.label);
    ctx.set_text_baseline("middle");
    let _ = ctx.fill_text(label, left, bar.center().y);
    ctx.restore();
}

fn button_color(button: ChromeButton, dark_mode: bool, theme: &ChromeTheme) -> &'static str {
    match button {
        ChromeButton::Close => "#FF5F57",
        ChromeButton::Minimize => "#FEBC2E",
        ChromeButton::Maximize => "#28C840",
        ChromeButton::DarkMode if dark_mode => "#5E5CE6",
        ChromeButton::Reload | ChromeButton::Fullscreen | ChromeButton::DarkMode => theme.idle_button,
    }
}

fn rounded_rect_path(ctx: &CanvasRenderingContext2d, rect: Rect, r: f64) {
    let (x, y, w, h) = (rect.x0, rect.y0, rect.width(), rect.height());
    let r = r.min(w / 2.0).min(h / 2.0);
    ctx.begin_path();
    ctx.move_to(x + r, y);
    ctx.line_to(x + w - r, y);
    ctx.arc_to(x + w, y, x + w, y + r, r).unwrap_or(());
    ctx.line_to(x + w, y + h - r);
    ctx.arc_to(x + w, y + h, x + w - r, y + h, r).unwrap_or(());
    ctx.line_to(x + r, y + h);
    ctx.arc_to(x, y + h, x, y + h - r, r).unwrap_or(());
    ctx.line_to(x, y + r);
    ctx.arc_to(x, y, x + r, y, r).unwrap_or(());
    ctx.close_path();
}
