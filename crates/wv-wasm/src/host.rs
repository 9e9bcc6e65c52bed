//! `<controlledframe>` frame host.
//!
//! Each frame is a `controlledframe` element created and owned here; the
//! page script places it inside its window's content box. DOM callbacks
//! never reach the controller directly: they queue [`HostMessage`]s that
//! the canvas drains on its next `pump`.

use std::cell::{Cell, RefCell};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

use js_sys::{Function, Object, Promise, Reflect};
use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::{JsFuture, spawn_local};
use web_sys::{Document, Element, Event};
use wv_editor::frame::{AttachError, FullscreenError};
use wv_editor::{
    FrameHandle, FrameHost, NativeWindowRef, RawFrameEvent, ScriptError, ScriptTicket,
    Subscription,
};

pub const FRAME_TAG: &str = "controlledframe";
pub const PARTITION: &str = "persist:webview-canvas";

const EVENT_NAMES: [&str; 7] = [
    "loadstart",
    "loadcommit",
    "contentload",
    "loadstop",
    "loadabort",
    "loaderror",
    "newwindow",
];
const PAYLOAD_FIELDS: [&str; 5] = ["url", "reason", "targetUrl", "initialWidth", "initialHeight"];

/// Something the browser reported since the last pump.
#[derive(Debug)]
pub enum HostMessage {
    Frame {
        frame: FrameHandle,
        event: RawFrameEvent,
    },
    Script {
        ticket: ScriptTicket,
        result: Result<serde_json::Value, ScriptError>,
    },
}

pub type Inbox = Rc<RefCell<VecDeque<HostMessage>>>;
type Listener = Closure<dyn FnMut(Event)>;

struct DomFrame {
    element: Element,
    listeners: Vec<(&'static str, Listener)>,
}

/// Native windows handed over by `newwindow`, parked until attached or
/// discarded.
#[derive(Default)]
struct WindowTable {
    next: Cell<u64>,
    parked: RefCell<HashMap<NativeWindowRef, JsValue>>,
}

impl WindowTable {
    fn park(&self, window: JsValue) -> NativeWindowRef {
        let id = self.next.get() + 1;
        self.next.set(id);
        let window_ref = NativeWindowRef(id);
        self.parked.borrow_mut().insert(window_ref, window);
        window_ref
    }

    fn take(&self, window_ref: NativeWindowRef) -> Option<JsValue> {
        self.parked.borrow_mut().remove(&window_ref)
    }

    fn put_back(&self, window_ref: NativeWindowRef, window: JsValue) {
        self.parked.borrow_mut().insert(window_ref, window);
    }
}

/// [`FrameHost`] over `controlledframe` elements in `document`.
pub struct DomFrameHost {
    document: Document,
    next_frame: u64,
    next_ticket: u64,
    frames: HashMap<FrameHandle, DomFrame>,
    windows: Rc<WindowTable>,
    subscribed: Rc<RefCell<HashSet<FrameHandle>>>,
    inbox: Inbox,
}

impl DomFrameHost {
    pub fn new(document: Document) -> Self {
        Self {
            document,
            next_frame: 0,
            next_ticket: 0,
            frames: HashMap::new(),
            windows: Rc::new(WindowTable::default()),
            subscribed: Rc::new(RefCell::new(HashSet::new())),
            inbox: Rc::new(RefCell::new(VecDeque::new())),
        }
    }

    /// Take everything queued since the last drain, in arrival order.
    pub fn drain(&self) -> Vec<HostMessage> {
        self.inbox.borrow_mut().drain(..).collect()
    }

    pub fn element(&self, frame: FrameHandle) -> Option<&Element> {
        self.frames.get(&frame).map(|f| &f.element)
    }

    fn build(&mut self, src: Option<&str>) -> FrameHandle {
        self.next_frame += 1;
        let frame = FrameHandle(self.next_frame);
        let element = match self.document.create_element(FRAME_TAG) {
            Ok(element) => element,
            Err(e) => {
                log::error!("{frame:?}: cannot create <{FRAME_TAG}>: {e:?}");
                return frame;
            }
        };
        let attributes = [
            ("partition", PARTITION),
            ("allowpopups", ""),
            ("allowpopupstoescapesandbox", ""),
            ("style", "width:100%;height:100%;border:0"),
        ];
        for (name, value) in attributes.into_iter().chain(src.map(|url| ("src", url))) {
            if let Err(e) = element.set_attribute(name, value) {
                log::warn!("{frame:?}: cannot set {name}: {e:?}");
            }
        }
        let listeners = EVENT_NAMES
            .iter()
            .filter_map(|name| self.listen(frame, &element, name))
            .collect();
        self.frames.insert(frame, DomFrame { element, listeners });
        frame
    }

    fn listen(
        &self,
        frame: FrameHandle,
        element: &Element,
        name: &'static str,
    ) -> Option<(&'static str, Listener)> {
        let inbox = Rc::clone(&self.inbox);
        let windows = Rc::clone(&self.windows);
        let subscribed = Rc::clone(&self.subscribed);
        let listener = Closure::<dyn FnMut(Event)>::wrap(Box::new(move |event: Event| {
            if !subscribed.borrow().contains(&frame) {
                return;
            }
            let mut raw = RawFrameEvent::new(name, payload_of(&event));
            if name == "newwindow" {
                // Keep the native window alive past this handler; the
                // controller decides on the next pump.
                event.prevent_default();
                if let Ok(window) = Reflect::get(&event, &"window".into())
                    && !window.is_undefined()
                {
                    raw = raw.with_window(windows.park(window));
                }
            }
            inbox
                .borrow_mut()
                .push_back(HostMessage::Frame { frame, event: raw });
        }));
        match element.add_event_listener_with_callback(name, listener.as_ref().unchecked_ref()) {
            Ok(()) => Some((name, listener)),
            Err(e) => {
                log::warn!("{frame:?}: cannot listen for {name}: {e:?}");
                None
            }
        }
    }

    fn call_method(target: &JsValue, name: &str, args: &[&JsValue]) -> Result<JsValue, JsValue> {
        let method: Function = Reflect::get(target, &name.into())?.dyn_into()?;
        match args {
            [] => method.call0(target),
            [a] => method.call1(target, a),
            [a, b, ..] => method.call2(target, a, b),
        }
    }
}

impl FrameHost for DomFrameHost {
    fn create(&mut self, url: &str) -> FrameHandle {
        self.build(Some(url))
    }

    fn create_detached(&mut self) -> FrameHandle {
        self.build(None)
    }

    fn attach(&mut self, frame: FrameHandle, window: NativeWindowRef) -> Result<(), AttachError> {
        let native = self
            .windows
            .take(window)
            .ok_or(AttachError::UnknownWindow(window))?;
        let attached = match self.frames.get(&frame) {
            Some(f) => Self::call_method(&native, "attach", &[&JsValue::from(f.element.clone())])
                .map(|_| ())
                .map_err(|e| describe(&e)),
            None => Err("frame element missing".to_string()),
        };
        attached.map_err(|reason| {
            // Still owned by us; the caller discards it.
            self.windows.put_back(window, native);
            AttachError::Rejected {
                frame,
                window,
                reason,
            }
        })
    }

    fn navigate(&mut self, frame: FrameHandle, url: &str) {
        if let Some(f) = self.frames.get(&frame)
            && let Err(e) = f.element.set_attribute("src", url)
        {
            log::warn!("{frame:?}: navigate failed: {e:?}");
        }
    }

    fn reload(&mut self, frame: FrameHandle) {
        if let Some(f) = self.frames.get(&frame)
            && let Err(e) = Self::call_method(&f.element, "reload", &[])
        {
            log::warn!("{frame:?}: reload failed: {}", describe(&e));
        }
    }

    fn run_script(&mut self, frame: FrameHandle, code: &str) -> Result<ScriptTicket, ScriptError> {
        let element = self
            .frames
            .get(&frame)
            .map(|f| JsValue::from(f.element.clone()))
            .ok_or(ScriptError::UnknownFrame(frame))?;
        let details = JsValue::from(Object::new());
        Reflect::set(&details, &"code".into(), &code.into())
            .map_err(|e| ScriptError::Threw(describe(&e)))?;
        let promise: Promise = Self::call_method(&element, "executeScript", &[&details])
            .and_then(|value| value.dyn_into())
            .map_err(|e| ScriptError::Threw(describe(&e)))?;

        self.next_ticket += 1;
        let ticket = ScriptTicket(self.next_ticket);
        let inbox = Rc::clone(&self.inbox);
        spawn_local(async move {
            let result = match JsFuture::from(promise).await {
                Ok(value) => Ok(to_json(&value)),
                Err(e) => Err(ScriptError::Threw(describe(&e))),
            };
            inbox
                .borrow_mut()
                .push_back(HostMessage::Script { ticket, result });
        });
        Ok(ticket)
    }

    fn subscribe(&mut self, frame: FrameHandle) -> Subscription {
        self.subscribed.borrow_mut().insert(frame);
        let subscribed = Rc::clone(&self.subscribed);
        Subscription::new(frame, move || {
            subscribed.borrow_mut().remove(&frame);
        })
    }

    fn set_surface_visible(&mut self, frame: FrameHandle, visible: bool) {
        let Some(f) = self.frames.get(&frame) else {
            return;
        };
        let result = if visible {
            f.element.remove_attribute("hidden")
        } else {
            f.element.set_attribute("hidden", "")
        };
        if let Err(e) = result {
            log::warn!("{frame:?}: surface visibility failed: {e:?}");
        }
    }

    fn is_fullscreen(&self, frame: FrameHandle) -> bool {
        match (self.document.fullscreen_element(), self.frames.get(&frame)) {
            (Some(current), Some(f)) => current == f.element,
            _ => false,
        }
    }

    fn request_fullscreen(&mut self, frame: FrameHandle) -> Result<(), FullscreenError> {
        let f = self
            .frames
            .get(&frame)
            .ok_or(FullscreenError::UnknownFrame(frame))?;
        f.element
            .request_fullscreen()
            .map_err(|e| FullscreenError::Rejected(describe(&e)))
    }

    fn exit_fullscreen(&mut self, frame: FrameHandle) -> Result<(), FullscreenError> {
        if !self.frames.contains_key(&frame) {
            return Err(FullscreenError::UnknownFrame(frame));
        }
        self.document.exit_fullscreen();
        Ok(())
    }

    fn destroy(&mut self, frame: FrameHandle) {
        self.subscribed.borrow_mut().remove(&frame);
        let Some(f) = self.frames.remove(&frame) else {
            return;
        };
        for (name, listener) in &f.listeners {
            let _ = f
                .element
                .remove_event_listener_with_callback(name, listener.as_ref().unchecked_ref());
        }
        f.element.remove();
    }

    fn discard_window(&mut self, window: NativeWindowRef) {
        let Some(native) = self.windows.take(window) else {
            log::error!("{window:?}: discard of unknown native window");
            return;
        };
        if let Err(e) = Self::call_method(&native, "discard", &[]) {
            log::error!("{window:?}: discard failed: {}", describe(&e));
        }
    }
}

/// Copy the string and number fields the normalizer reads off a DOM event.
fn payload_of(event: &Event) -> serde_json::Value {
    let mut payload = serde_json::Map::new();
    for key in PAYLOAD_FIELDS {
        let Ok(value) = Reflect::get(event, &key.into()) else {
            continue;
        };
        if let Some(text) = value.as_string() {
            payload.insert(key.to_string(), serde_json::Value::String(text));
        } else if let Some(number) = value.as_f64().and_then(serde_json::Number::from_f64) {
            payload.insert(key.to_string(), serde_json::Value::Number(number));
        }
    }
    serde_json::Value::Object(payload)
}

/// Script results cross as JSON text.
fn to_json(value: &JsValue) -> serde_json::Value {
    js_sys::JSON::stringify(value)
        .ok()
        .and_then(|text| text.as_string())
        .and_then(|text| serde_json::from_str(&text).ok())
        .unwrap_or(serde_json::Value::Null)
}

fn describe(value: &JsValue) -> String {
    value
        .as_string()
        .or_else(|| {
            value
                .dyn_ref::<js_sys::Error>()
                .map(|e| String::from(e.message()))
        })
        .unwrap_or_else(|| format!("{value:?}"))
}
