//! WASM bridge for the webview canvas: exposes the window controller to
//! JavaScript and binds it to `<controlledframe>` elements.
//!
//! Compiled via `wasm-pack build --target web`. The page owns the render
//! loop: it forwards input, calls [`WebviewCanvas::pump`] once per frame,
//! then places each frame element from [`WebviewCanvas::windows_json`].

mod chrome2d;
mod console;
pub mod host;
pub mod view;

use kurbo::Point;
use log::LevelFilter;
use wasm_bindgen::prelude::*;
use web_sys::CanvasRenderingContext2d;
use wv_core::{DocumentSnapshot, ShapeDescriptor, ShapeId, ShapeStore};
use wv_editor::tools::{PointerEvent, WindowTool};
use wv_editor::{
    ChromeCommand, ControllerConfig, FrameEvent, FrameHost, Omnibox, ShortcutAction, ShortcutMap,
    WindowController,
};

use crate::chrome2d::ChromeTheme;
use crate::host::{DomFrameHost, HostMessage};
use crate::view::{WindowView, window_views};

/// The JS-facing canvas controller.
///
/// Holds the shape store, the DOM frame host and the window controller.
/// All interaction from the page goes through this struct.
#[wasm_bindgen]
pub struct WebviewCanvas {
    canvas: ShapeStore,
    host: DomFrameHost,
    controller: WindowController,
    omnibox: Omnibox,
    tool: WindowTool,
    dark_theme: bool,
}

#[wasm_bindgen]
impl WebviewCanvas {
    /// Create a controller, optionally configured from TOML text.
    #[wasm_bindgen(constructor)]
    pub fn new(config_toml: Option<String>) -> Result<WebviewCanvas, JsValue> {
        console::panic_hook_setup();
        console::init(LevelFilter::Info);

        let config = match config_toml.as_deref() {
            Some(source) => ControllerConfig::from_toml_str(source).map_err(to_js)?,
            None => ControllerConfig::default(),
        };
        let document = web_sys::window()
            .and_then(|w| w.document())
            .ok_or_else(|| JsValue::from_str("no document"))?;

        Ok(Self {
            canvas: ShapeStore::new(),
            host: DomFrameHost::new(document),
            controller: WindowController::new(config),
            omnibox: Omnibox::new(),
            tool: WindowTool::new(),
            dark_theme: false,
        })
    }

    /// Raise console logging to debug (`true`) or back to info.
    pub fn set_verbose(&mut self, verbose: bool) {
        console::init(if verbose {
            LevelFilter::Debug
        } else {
            LevelFilter::Info
        });
    }

    // ─── Document ────────────────────────────────────────────────────────

    /// Replace the document with a JSON snapshot. Windows that survive
    /// keep their frames; the rest are torn down or mounted.
    pub fn load_snapshot(&mut self, json: &str) -> Result<(), JsValue> {
        let snapshot = DocumentSnapshot::from_json(json).map_err(to_js)?;
        self.canvas = ShapeStore::restore(snapshot).map_err(to_js)?;
        let report = self.controller.reconcile(&mut self.canvas, &mut self.host);
        log::info!(
            "snapshot loaded: {} mounted, {} unmounted",
            report.mounted.len(),
            report.unmounted.len()
        );
        Ok(())
    }

    pub fn snapshot_json(&self) -> Result<String, JsValue> {
        self.canvas.snapshot().to_json().map_err(to_js)
    }

    /// Open one window per URL on an empty canvas. Returns how many were
    /// created.
    pub fn seed_if_empty(&mut self, urls: Vec<String>) -> usize {
        let urls: Vec<&str> = urls.iter().map(String::as_str).collect();
        self.controller
            .seed_if_empty(&mut self.canvas, &mut self.host, &urls)
            .len()
    }

    /// Create and mount a window at `(x, y)`. Returns its id.
    pub fn create_window(&mut self, x: f64, y: f64, url: &str) -> Result<String, JsValue> {
        let id = self
            .canvas
            .create(ShapeDescriptor::at(x, y).with_url(url))
            .map_err(to_js)?;
        self.mount_and_focus(id)?;
        Ok(id.as_str().to_string())
    }

    /// Sync frames with the store after the page edited shapes directly.
    pub fn reconcile(&mut self) -> usize {
        let report = self.controller.reconcile(&mut self.canvas, &mut self.host);
        report.mounted.len() + report.unmounted.len() + report.updated.len()
    }

    // ─── Event loop ──────────────────────────────────────────────────────

    /// Deliver everything the frames reported since the last call, then
    /// fire timers due at `now_ms`. Returns how many messages were handled.
    pub fn pump(&mut self, now_ms: f64) -> usize {
        let messages = self.host.drain();
        let count = messages.len();
        for message in messages {
            match message {
                HostMessage::Frame { frame, event } => match event.normalize() {
                    Some(event) => {
                        let orphan = match &event {
                            FrameEvent::NewWindowRequested(request) => Some(request.window),
                            _ => None,
                        };
                        let delivered = self.controller.handle_frame_event(
                            &mut self.canvas,
                            &mut self.host,
                            frame,
                            event,
                        );
                        if !delivered && let Some(window) = orphan {
                            self.host.discard_window(window);
                        }
                    }
                    None => log::trace!("{frame:?}: {} not handled", event.name),
                },
                HostMessage::Script { ticket, result } => {
                    self.controller
                        .resolve_script(&mut self.canvas, &mut self.host, ticket, result);
                }
            }
        }
        let now = if now_ms.is_finite() && now_ms > 0.0 {
            now_ms as u64
        } else {
            0
        };
        self.controller.advance(&mut self.canvas, &mut self.host, now);
        count
    }

    // ─── Commands ────────────────────────────────────────────────────────

    /// Run a chrome command by name (`close`, `minimize`, `maximize`,
    /// `reload`, `dark-mode`, `fullscreen`, `focus`) on one window.
    pub fn command(&mut self, shape_id: &str, name: &str) -> Result<(), JsValue> {
        let id = lookup(shape_id)?;
        let command = ChromeCommand::from_name(name)
            .ok_or_else(|| JsValue::from_str(&format!("unknown command: {name}")))?;
        self.controller
            .handle_command(&mut self.canvas, &mut self.host, id, command)
            .map_err(to_js)
    }

    /// Pointer-down in canvas coordinates. Returns the id of the window hit,
    /// if any; chrome buttons under the pointer run their command.
    pub fn pointer_down(&mut self, x: f64, y: f64) -> Option<String> {
        self.controller
            .pointer_down(&mut self.canvas, &mut self.host, Point::new(x, y))
            .map(|(id, _)| id.as_str().to_string())
    }

    /// Handle a key event. Returns `true` when a shortcut consumed it.
    pub fn handle_key(
        &mut self,
        key: &str,
        ctrl: bool,
        shift: bool,
        alt: bool,
        meta: bool,
    ) -> bool {
        let Some(action) = ShortcutMap::resolve(key, ctrl, shift, alt, meta) else {
            return false;
        };
        match action {
            ShortcutAction::OpenOmnibox => self.omnibox.open(),
            ShortcutAction::CloseOmnibox => self.omnibox.close(),
            ShortcutAction::Window(command) => {
                let applied =
                    self.controller
                        .command_selection(&mut self.canvas, &mut self.host, command);
                log::debug!("{}: applied to {applied} window(s)", command.name());
            }
        }
        true
    }

    // ─── Window tool ─────────────────────────────────────────────────────

    pub fn tool_down(&mut self, x: f64, y: f64) {
        self.tool.handle(PointerEvent::Down(Point::new(x, y)));
    }

    pub fn tool_move(&mut self, x: f64, y: f64) {
        self.tool.handle(PointerEvent::Move(Point::new(x, y)));
    }

    /// Finish a drag. Returns the new window's id.
    pub fn tool_up(&mut self, x: f64, y: f64) -> Result<Option<String>, JsValue> {
        let Some(descriptor) = self.tool.handle(PointerEvent::Up(Point::new(x, y))) else {
            return Ok(None);
        };
        let id = self.canvas.create(descriptor).map_err(to_js)?;
        self.mount_and_focus(id)?;
        Ok(Some(id.as_str().to_string()))
    }

    /// The in-progress drag box as `[x, y, w, h]`, empty when idle.
    pub fn tool_preview(&self) -> Vec<f64> {
        self.tool
            .preview()
            .map(|r| vec![r.x0, r.y0, r.width(), r.height()])
            .unwrap_or_default()
    }

    // ─── Omnibox ─────────────────────────────────────────────────────────

    pub fn omnibox_is_open(&self) -> bool {
        self.omnibox.is_open()
    }

    pub fn omnibox_open(&mut self) {
        self.omnibox.open();
    }

    pub fn omnibox_close(&mut self) {
        self.omnibox.close();
    }

    pub fn omnibox_input(&self) -> String {
        self.omnibox.input().to_string()
    }

    pub fn set_omnibox_input(&mut self, input: &str) {
        self.omnibox.set_input(input);
    }

    /// Open the typed address as a new window. On error the omnibox stays
    /// open with its input.
    pub fn omnibox_submit(&mut self) -> Result<String, JsValue> {
        let id = self.omnibox.submit(&mut self.canvas).map_err(to_js)?;
        self.mount_and_focus(id)?;
        Ok(id.as_str().to_string())
    }

    // ─── Views ───────────────────────────────────────────────────────────

    /// The frame element for a window, for the page to place.
    pub fn frame_element(&self, shape_id: &str) -> Option<web_sys::Element> {
        let id = ShapeId::lookup(shape_id)?;
        let frame = self.controller.frame_of(id)?;
        self.host.element(frame).cloned()
    }

    /// Every window's geometry, label and load state, back to front.
    pub fn windows_json(&self) -> Result<String, JsValue> {
        serde_json::to_string(&window_views(&self.canvas, &self.controller)).map_err(to_js)
    }

    /// Session state of one window as JSON.
    pub fn session_json(&self, shape_id: &str) -> Result<String, JsValue> {
        let id = lookup(shape_id)?;
        let session = self
            .controller
            .session(id)
            .ok_or_else(|| JsValue::from_str(&format!("{id} is not mounted")))?;
        serde_json::to_string(session).map_err(to_js)
    }

    pub fn set_dark_theme(&mut self, dark: bool) {
        self.dark_theme = dark;
    }

    /// Paint the backdrop and window chrome.
    pub fn render(&self, ctx: &CanvasRenderingContext2d, width: f64, height: f64) {
        let theme = if self.dark_theme {
            ChromeTheme::dark()
        } else {
            ChromeTheme::light()
        };
        let selected = self.canvas.selection();
        let windows: Vec<_> = self
            .canvas
            .shapes()
            .map(|shape| {
                let view = WindowView::new(shape, &self.controller, selected.contains(&shape.id));
                (shape.clone(), view)
            })
            .collect();
        chrome2d::render_chrome(ctx, &self.controller, &windows, width, height, &theme);
    }
}

impl WebviewCanvas {
    fn mount_and_focus(&mut self, id: ShapeId) -> Result<(), JsValue> {
        self.controller
            .mount(&mut self.canvas, &mut self.host, id)
            .map_err(to_js)?;
        self.controller
            .handle_command(&mut self.canvas, &mut self.host, id, ChromeCommand::Focus)
            .map_err(to_js)
    }
}

fn lookup(shape_id: &str) -> Result<ShapeId, JsValue> {
    ShapeId::lookup(shape_id)
        .ok_or_else(|| JsValue::from_str(&format!("unknown window: {shape_id}")))
}

fn to_js(error: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&error.to_string())
}
