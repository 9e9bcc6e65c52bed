//! In-memory frame host and simulation session.
//!
//! [`SimFrameHost`] stands in for a real browsing engine: it hands out
//! handles, records every call made on it, and holds scripts pending until
//! the caller resolves them. Failure toggles make scripts, attach, and
//! fullscreen requests fail on demand. [`SimSession`] bundles a shape
//! store, the host, and a controller so scenarios read as a list of steps.

use crate::canvas::CanvasEngine;
use crate::commands::ChromeCommand;
use crate::config::ControllerConfig;
use crate::controller::{ControllerError, WindowController};
use crate::frame::{
    AttachError, FrameEvent, FrameHandle, FrameHost, FullscreenError, NativeWindowRef,
    NewWindowRequest, ScriptError, ScriptTicket, Subscription, TITLE_PROBE_SCRIPT,
};
use serde_json::json;
use std::cell::RefCell;
use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;
use wv_core::{ShapeDescriptor, ShapeId, ShapeStore};

/// One recorded call on the host.
#[derive(Debug, Clone, PartialEq)]
pub enum HostCall {
    Create { frame: FrameHandle, url: String },
    CreateDetached { frame: FrameHandle },
    Attach { frame: FrameHandle, window: NativeWindowRef },
    Navigate { frame: FrameHandle, url: String },
    Reload { frame: FrameHandle },
    RunScript { frame: FrameHandle, code: String },
    Subscribe { frame: FrameHandle },
    SetSurfaceVisible { frame: FrameHandle, visible: bool },
    RequestFullscreen { frame: FrameHandle },
    ExitFullscreen { frame: FrameHandle },
    Destroy { frame: FrameHandle },
    DiscardWindow { window: NativeWindowRef },
}

/// Host-side view of one simulated frame.
#[derive(Debug, Clone, PartialEq)]
pub struct SimFrame {
    pub url: Option<String>,
    pub window: Option<NativeWindowRef>,
    pub visible: bool,
    pub title: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PendingScript {
    pub ticket: ScriptTicket,
    pub frame: FrameHandle,
    pub code: String,
}

#[derive(Debug, Default)]
pub struct SimFrameHost {
    next_frame: u64,
    next_ticket: u64,
    next_window: u64,
    frames: BTreeMap<FrameHandle, SimFrame>,
    subscribed: Rc<RefCell<HashSet<FrameHandle>>>,
    pending: Vec<PendingScript>,
    calls: Vec<HostCall>,
    fullscreen: Option<FrameHandle>,
    /// Native windows handed out and not yet attached or discarded.
    open_windows: HashSet<NativeWindowRef>,
    pub fail_scripts: bool,
    pub fail_attach: bool,
    pub fail_fullscreen: bool,
}

impl SimFrameHost {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> &[HostCall] {
        &self.calls
    }

    pub fn take_calls(&mut self) -> Vec<HostCall> {
        std::mem::take(&mut self.calls)
    }

    pub fn frame(&self, frame: FrameHandle) -> Option<&SimFrame> {
        self.frames.get(&frame)
    }

    pub fn live_frames(&self) -> usize {
        self.frames.len()
    }

    pub fn is_subscribed(&self, frame: FrameHandle) -> bool {
        self.subscribed.borrow().contains(&frame)
    }

    pub fn fullscreen(&self) -> Option<FrameHandle> {
        self.fullscreen
    }

    /// What `document.title` reports inside the frame.
    pub fn set_title(&mut self, frame: FrameHandle, title: &str) {
        if let Some(f) = self.frames.get_mut(&frame) {
            f.title = title.to_string();
        }
    }

    /// Simulate the engine opening a native window for a popup.
    pub fn open_native_window(&mut self) -> NativeWindowRef {
        self.next_window += 1;
        let window = NativeWindowRef(self.next_window);
        self.open_windows.insert(window);
        window
    }

    /// Native windows neither attached nor discarded.
    pub fn open_windows(&self) -> usize {
        self.open_windows.len()
    }

    pub fn pending_scripts(&self) -> &[PendingScript] {
        &self.pending
    }

    /// Complete every pending script. Title probes answer with the frame's
    /// title; anything else answers `[null]`.
    pub fn complete_scripts(&mut self) -> Vec<(ScriptTicket, Result<serde_json::Value, ScriptError>)> {
        std::mem::take(&mut self.pending)
            .into_iter()
            .map(|script| {
                let result = match self.frames.get(&script.frame) {
                    None => Err(ScriptError::UnknownFrame(script.frame)),
                    Some(f) if script.code == TITLE_PROBE_SCRIPT => Ok(json!([f.title])),
                    Some(_) => Ok(json!([null])),
                };
                (script.ticket, result)
            })
            .collect()
    }
}

impl FrameHost for SimFrameHost {
    fn create(&mut self, url: &str) -> FrameHandle {
        self.next_frame += 1;
        let frame = FrameHandle(self.next_frame);
        self.frames.insert(
            frame,
            SimFrame {
                url: Some(url.to_string()),
                window: None,
                visible: true,
                title: String::new(),
            },
        );
        self.calls.push(HostCall::Create {
            frame,
            url: url.to_string(),
        });
        frame
    }

    fn create_detached(&mut self) -> FrameHandle {
        self.next_frame += 1;
        let frame = FrameHandle(self.next_frame);
        self.frames.insert(
            frame,
            SimFrame {
                url: None,
                window: None,
                visible: true,
                title: String::new(),
            },
        );
        self.calls.push(HostCall::CreateDetached { frame });
        frame
    }

    fn attach(&mut self, frame: FrameHandle, window: NativeWindowRef) -> Result<(), AttachError> {
        self.calls.push(HostCall::Attach { frame, window });
        if self.fail_attach {
            return Err(AttachError::Rejected {
                frame,
                window,
                reason: "attach disabled".into(),
            });
        }
        if !self.open_windows.remove(&window) {
            return Err(AttachError::UnknownWindow(window));
        }
        if let Some(f) = self.frames.get_mut(&frame) {
            f.window = Some(window);
        }
        Ok(())
    }

    fn navigate(&mut self, frame: FrameHandle, url: &str) {
        if let Some(f) = self.frames.get_mut(&frame) {
            f.url = Some(url.to_string());
        }
        self.calls.push(HostCall::Navigate {
            frame,
            url: url.to_string(),
        });
    }

    fn reload(&mut self, frame: FrameHandle) {
        self.calls.push(HostCall::Reload { frame });
    }

    fn run_script(&mut self, frame: FrameHandle, code: &str) -> Result<ScriptTicket, ScriptError> {
        self.calls.push(HostCall::RunScript {
            frame,
            code: code.to_string(),
        });
        if !self.frames.contains_key(&frame) {
            return Err(ScriptError::UnknownFrame(frame));
        }
        if self.fail_scripts {
            return Err(ScriptError::NotReady(frame));
        }
        self.next_ticket += 1;
        let ticket = ScriptTicket(self.next_ticket);
        self.pending.push(PendingScript {
            ticket,
            frame,
            code: code.to_string(),
        });
        Ok(ticket)
    }

    fn subscribe(&mut self, frame: FrameHandle) -> Subscription {
        self.calls.push(HostCall::Subscribe { frame });
        self.subscribed.borrow_mut().insert(frame);
        let subscribed = Rc::clone(&self.subscribed);
        Subscription::new(frame, move || {
            subscribed.borrow_mut().remove(&frame);
        })
    }

    fn set_surface_visible(&mut self, frame: FrameHandle, visible: bool) {
        if let Some(f) = self.frames.get_mut(&frame) {
            f.visible = visible;
        }
        self.calls.push(HostCall::SetSurfaceVisible { frame, visible });
    }

    fn is_fullscreen(&self, frame: FrameHandle) -> bool {
        self.fullscreen == Some(frame)
    }

    fn request_fullscreen(&mut self, frame: FrameHandle) -> Result<(), FullscreenError> {
        self.calls.push(HostCall::RequestFullscreen { frame });
        if self.fail_fullscreen {
            return Err(FullscreenError::Rejected("permission denied".into()));
        }
        if !self.frames.contains_key(&frame) {
            return Err(FullscreenError::UnknownFrame(frame));
        }
        self.fullscreen = Some(frame);
        Ok(())
    }

    fn exit_fullscreen(&mut self, frame: FrameHandle) -> Result<(), FullscreenError> {
        self.calls.push(HostCall::ExitFullscreen { frame });
        if self.fail_fullscreen {
            return Err(FullscreenError::Rejected("permission denied".into()));
        }
        if self.fullscreen == Some(frame) {
            self.fullscreen = None;
        }
        Ok(())
    }

    fn destroy(&mut self, frame: FrameHandle) {
        self.frames.remove(&frame);
        if self.fullscreen == Some(frame) {
            self.fullscreen = None;
        }
        self.calls.push(HostCall::Destroy { frame });
    }

    fn discard_window(&mut self, window: NativeWindowRef) {
        self.open_windows.remove(&window);
        self.calls.push(HostCall::DiscardWindow { window });
    }
}

// ─── Session ─────────────────────────────────────────────────────────────

/// A store, a simulated host, and a controller driven together.
pub struct SimSession {
    pub canvas: ShapeStore,
    pub host: SimFrameHost,
    pub controller: WindowController,
}

impl SimSession {
    pub fn new(config: ControllerConfig) -> Self {
        Self::with_canvas(config, ShapeStore::new())
    }

    pub fn with_canvas(config: ControllerConfig, canvas: ShapeStore) -> Self {
        Self {
            canvas,
            host: SimFrameHost::new(),
            controller: WindowController::new(config),
        }
    }

    /// Create a window shape and mount it.
    pub fn open(&mut self, descriptor: ShapeDescriptor) -> Result<ShapeId, SimError> {
        let id = self.canvas.create_shape(descriptor)?;
        self.controller.mount(&mut self.canvas, &mut self.host, id)?;
        Ok(id)
    }

    pub fn frame_of(&self, id: ShapeId) -> Option<FrameHandle> {
        self.controller.frame_of(id)
    }

    /// Fire an event from `frame`. Like a real host, only frames with a
    /// live subscription deliver. Returns whether it was delivered.
    pub fn emit(&mut self, frame: FrameHandle, event: FrameEvent) -> bool {
        if !self.host.is_subscribed(frame) {
            log::trace!("{frame:?}: {} not delivered, unsubscribed", event.name());
            return false;
        }
        self.controller
            .handle_frame_event(&mut self.canvas, &mut self.host, frame, event)
    }

    /// Fire the full success cycle on `id`'s frame.
    pub fn load(&mut self, id: ShapeId, url: &str) {
        let Some(frame) = self.frame_of(id) else {
            return;
        };
        for event in [
            FrameEvent::NavigationStarted,
            FrameEvent::NavigationCommitted {
                url: url.to_string(),
            },
            FrameEvent::ContentLoaded,
            FrameEvent::NavigationFinished,
        ] {
            self.emit(frame, event);
        }
    }

    /// Have `id`'s content open a popup. Returns the native window handed
    /// to the controller.
    pub fn request_popup(
        &mut self,
        id: ShapeId,
        target_url: &str,
        width: Option<f64>,
        height: Option<f64>,
    ) -> Option<NativeWindowRef> {
        let frame = self.frame_of(id)?;
        let window = self.host.open_native_window();
        self.emit(
            frame,
            FrameEvent::NewWindowRequested(NewWindowRequest {
                target_url: target_url.to_string(),
                width,
                height,
                window,
            }),
        );
        Some(window)
    }

    pub fn command(&mut self, id: ShapeId, command: ChromeCommand) -> Result<(), ControllerError> {
        self.controller
            .handle_command(&mut self.canvas, &mut self.host, id, command)
    }

    /// Advance the clock by `delta_ms`.
    pub fn advance(&mut self, delta_ms: u64) {
        let now = self.controller.now_ms() + delta_ms;
        self.controller.advance(&mut self.canvas, &mut self.host, now);
    }

    /// Resolve every pending script. Returns how many results a live
    /// window accepted.
    pub fn complete_scripts(&mut self) -> usize {
        let mut accepted = 0;
        for (ticket, result) in self.host.complete_scripts() {
            if self
                .controller
                .resolve_script(&mut self.canvas, &mut self.host, ticket, result)
            {
                accepted += 1;
            }
        }
        accepted
    }
}

#[derive(Debug, thiserror::Error)]
pub enum SimError {
    #[error(transparent)]
    Canvas(#[from] crate::canvas::CanvasError),
    #[error(transparent)]
    Controller(#[from] ControllerError),
}
