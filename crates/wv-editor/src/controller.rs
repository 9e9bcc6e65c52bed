//! Window controller: binds webview shapes to live frames.
//!
//! The controller is the behavior binding the canvas registers for shape
//! type `"webview"`. It owns one [`WindowMachine`] per mounted shape, the
//! routing tables from frames and script tickets back to shapes, and the
//! timer queue. The canvas and frame host are borrowed per call, so the
//! controller holds no lock on either and every store mutation is a single
//! patch request.
//!
//! Inputs arrive in four ways: frame events, chrome commands, script
//! results, and clock advances. Each one runs the machine's transition and
//! then drains the resulting effects through [`WindowController::run_effects`].

use crate::canvas::CanvasEngine;
use crate::commands::ChromeCommand;
use crate::config::ControllerConfig;
use crate::focus::FocusArbiter;
use crate::frame::{FrameEvent, FrameHandle, FrameHost, ScriptError, ScriptTicket, Subscription};
use crate::popup::PopupCoordinator;
use crate::session::{Effect, Effects, ScriptPurpose, SessionState, WindowMachine};
use crate::timers::TimerQueue;
use kurbo::{Point, Rect};
use std::collections::{HashMap, VecDeque};
use thiserror::Error;
use wv_core::{SHAPE_TYPE, ShapeDescriptor, ShapeId, WindowProps, WindowShape};
use wv_render::{ChromeLayout, ChromeMetrics, hit_test, window_rect};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ControllerError {
    #[error("no shape with id {0}")]
    UnknownShape(ShapeId),
    #[error("shape {0} is already mounted")]
    AlreadyMounted(ShapeId),
    #[error("shape {0} is not mounted")]
    NotMounted(ShapeId),
}

/// A mounted window: its machine and the subscription keeping its frame's
/// events flowing.
struct Instance {
    machine: WindowMachine,
    subscription: Subscription,
}

/// What a `reconcile` pass changed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ReconcileReport {
    pub mounted: Vec<ShapeId>,
    pub unmounted: Vec<ShapeId>,
    pub updated: Vec<ShapeId>,
}

pub struct WindowController {
    config: ControllerConfig,
    popups: PopupCoordinator,
    instances: HashMap<ShapeId, Instance>,
    frames: HashMap<FrameHandle, ShapeId>,
    tickets: HashMap<ScriptTicket, (ShapeId, ScriptPurpose)>,
    timers: TimerQueue,
}

impl WindowController {
    /// Build a controller. A config that fails validation is replaced by
    /// the defaults.
    pub fn new(config: ControllerConfig) -> Self {
        let config = match config.validate() {
            Ok(()) => config,
            Err(e) => {
                log::warn!("{e}; falling back to default config");
                ControllerConfig::default()
            }
        };
        Self {
            popups: PopupCoordinator::new(&config),
            config,
            instances: HashMap::new(),
            frames: HashMap::new(),
            tickets: HashMap::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn shape_type(&self) -> &'static str {
        SHAPE_TYPE
    }

    pub fn config(&self) -> &ControllerConfig {
        &self.config
    }

    /// Props for a freshly created window shape.
    pub fn default_props() -> WindowProps {
        WindowProps::default()
    }

    // ─── Lifecycle ───────────────────────────────────────────────────────

    /// Mount a shape with a new frame navigating to its URL.
    pub fn mount(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        id: ShapeId,
    ) -> Result<FrameHandle, ControllerError> {
        if self.instances.contains_key(&id) {
            return Err(ControllerError::AlreadyMounted(id));
        }
        let shape = canvas.get_shape(id).ok_or(ControllerError::UnknownShape(id))?;
        let frame = host.create(&shape.props.url);
        self.bind(host, &shape, frame);
        Ok(frame)
    }

    /// Mount a shape onto a frame that already exists (a popup's attached
    /// frame).
    pub fn mount_with_frame(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        id: ShapeId,
        frame: FrameHandle,
    ) -> Result<(), ControllerError> {
        if self.instances.contains_key(&id) {
            return Err(ControllerError::AlreadyMounted(id));
        }
        let shape = canvas.get_shape(id).ok_or(ControllerError::UnknownShape(id))?;
        self.bind(host, &shape, frame);
        Ok(())
    }

    fn bind(&mut self, host: &mut dyn FrameHost, shape: &WindowShape, frame: FrameHandle) {
        let subscription = host.subscribe(frame);
        if shape.props.is_minimized {
            host.set_surface_visible(frame, false);
        }
        let machine = WindowMachine::new(shape, frame, &self.config);
        self.frames.insert(frame, shape.id);
        self.instances.insert(
            shape.id,
            Instance {
                machine,
                subscription,
            },
        );
        log::debug!("{}: mounted on {frame:?}", shape.id);
    }

    /// Tear an instance down: timers cancelled, subscription released,
    /// frame destroyed. Script results still in flight are discarded when
    /// they arrive. Returns false if the shape was not mounted.
    pub fn unmount(&mut self, host: &mut dyn FrameHost, id: ShapeId) -> bool {
        let Some(instance) = self.instances.remove(&id) else {
            return false;
        };
        let frame = instance.machine.frame();
        self.frames.remove(&frame);
        self.timers.cancel_all(id);
        self.tickets.retain(|_, (shape, _)| *shape != id);
        instance.subscription.release();
        host.destroy(frame);
        log::debug!("{id}: unmounted, {frame:?} destroyed");
        true
    }

    /// Bring mounted instances in line with the canvas: mount new shapes,
    /// unmount vanished ones, and react to changed props.
    pub fn reconcile(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
    ) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let present = canvas.shape_ids();

        let mut vanished: Vec<ShapeId> = self
            .instances
            .keys()
            .copied()
            .filter(|id| !present.contains(id))
            .collect();
        vanished.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        for id in vanished {
            self.unmount(host, id);
            report.unmounted.push(id);
        }

        for id in present {
            if !self.instances.contains_key(&id) {
                match self.mount(canvas, host, id) {
                    Ok(_) => report.mounted.push(id),
                    Err(e) => log::warn!("{id}: reconcile mount failed: {e}"),
                }
                continue;
            }
            let Some(shape) = canvas.get_shape(id) else {
                continue;
            };
            let effects = match self.instances.get_mut(&id) {
                Some(instance) => instance.machine.on_shape_changed(&shape),
                None => continue,
            };
            if !effects.is_empty() {
                report.updated.push(id);
                self.run_effects(canvas, host, id, effects);
            }
        }
        report
    }

    // ─── Inputs ──────────────────────────────────────────────────────────

    /// Deliver a frame event. Returns false when no mounted window owns
    /// the frame (already unmounted or never subscribed).
    pub fn handle_frame_event(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        frame: FrameHandle,
        event: FrameEvent,
    ) -> bool {
        let Some(&id) = self.frames.get(&frame) else {
            log::trace!("{frame:?}: {} for unknown frame dropped", event.name());
            return false;
        };
        let Some(instance) = self.instances.get_mut(&id) else {
            return false;
        };
        let effects = instance.machine.on_frame_event(event);
        self.run_effects(canvas, host, id, effects);
        true
    }

    pub fn handle_command(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        id: ShapeId,
        command: ChromeCommand,
    ) -> Result<(), ControllerError> {
        let shape = canvas.get_shape(id).ok_or(ControllerError::UnknownShape(id))?;
        let instance = self
            .instances
            .get_mut(&id)
            .ok_or(ControllerError::NotMounted(id))?;
        let effects = instance.machine.on_command(command, &shape);
        self.run_effects(canvas, host, id, effects);
        Ok(())
    }

    /// Run `command` on every selected window that is mounted. Returns
    /// how many windows received it.
    pub fn command_selection(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        command: ChromeCommand,
    ) -> usize {
        let targets: Vec<ShapeId> = canvas
            .selected()
            .into_iter()
            .filter(|id| self.is_mounted(*id))
            .collect();
        for id in &targets {
            if let Err(e) = self.handle_command(canvas, host, *id, command) {
                log::warn!("{id}: {} failed: {e}", command.name());
            }
        }
        targets.len()
    }

    /// Route a pointer-down in canvas space: the topmost window under the
    /// pointer receives the command its chrome maps the point to.
    pub fn pointer_down(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        point: Point,
    ) -> Option<(ShapeId, Option<ChromeCommand>)> {
        let shapes: Vec<WindowShape> = canvas
            .shape_ids()
            .into_iter()
            .filter_map(|id| canvas.get_shape(id))
            .collect();
        let shape = hit_test(&shapes, point, self.config.title_bar_height)?.clone();
        let command = self
            .chrome_layout(&shape)
            .hit(point)
            .and_then(ChromeCommand::from_hit);
        if let Some(command) = command
            && let Err(e) = self.handle_command(canvas, host, shape.id, command)
        {
            log::warn!("{}: pointer command {} failed: {e}", shape.id, command.name());
        }
        Some((shape.id, command))
    }

    /// Deliver an asynchronous script result. Returns false if the ticket
    /// is unknown or its window has been torn down.
    pub fn resolve_script(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        ticket: ScriptTicket,
        result: Result<serde_json::Value, ScriptError>,
    ) -> bool {
        let Some((id, purpose)) = self.tickets.remove(&ticket) else {
            log::trace!("{ticket:?}: late script result discarded");
            return false;
        };
        let Some(instance) = self.instances.get_mut(&id) else {
            return false;
        };
        let effects = instance.machine.on_script_result(purpose, result);
        self.run_effects(canvas, host, id, effects);
        true
    }

    /// Move the virtual clock to `now_ms`, firing due timers in order.
    pub fn advance(&mut self, canvas: &mut dyn CanvasEngine, host: &mut dyn FrameHost, now_ms: u64) {
        while let Some(fired) = self.timers.pop_due(now_ms) {
            let Some(instance) = self.instances.get_mut(&fired.shape) else {
                continue;
            };
            let effects = instance.machine.on_timer(fired.kind);
            self.run_effects(canvas, host, fired.shape, effects);
        }
        self.timers.set_now(now_ms);
    }

    // ─── Queries ─────────────────────────────────────────────────────────

    pub fn now_ms(&self) -> u64 {
        self.timers.now_ms()
    }

    pub fn timers(&self) -> &TimerQueue {
        &self.timers
    }

    pub fn is_mounted(&self, id: ShapeId) -> bool {
        self.instances.contains_key(&id)
    }

    pub fn mounted(&self) -> Vec<ShapeId> {
        let mut ids: Vec<ShapeId> = self.instances.keys().copied().collect();
        ids.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        ids
    }

    pub fn session(&self, id: ShapeId) -> Option<&SessionState> {
        self.instances.get(&id).map(|i| i.machine.state())
    }

    pub fn frame_of(&self, id: ShapeId) -> Option<FrameHandle> {
        self.instances.get(&id).map(|i| i.machine.frame())
    }

    pub fn shape_of(&self, frame: FrameHandle) -> Option<ShapeId> {
        self.frames.get(&frame).copied()
    }

    pub fn pending_scripts(&self) -> usize {
        self.tickets.len()
    }

    pub fn metrics(&self) -> ChromeMetrics {
        ChromeMetrics::with_title_bar_height(self.config.title_bar_height)
    }

    /// Hit area matching the shape's current size and minimized state.
    pub fn hit_geometry(&self, shape: &WindowShape) -> Rect {
        window_rect(shape, self.config.title_bar_height)
    }

    pub fn chrome_layout(&self, shape: &WindowShape) -> ChromeLayout {
        ChromeLayout::new(shape, self.metrics())
    }

    /// Create one window per URL if the canvas holds no windows yet,
    /// cascading from the quick-create position.
    pub fn seed_if_empty(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        urls: &[&str],
    ) -> Vec<ShapeId> {
        if !canvas.shape_ids().is_empty() {
            return Vec::new();
        }
        let mut created = Vec::new();
        for (i, url) in urls.iter().enumerate() {
            let step = i as f64 * self.config.popup_offset[0];
            let descriptor = ShapeDescriptor::at(100.0 + step, 100.0 + step).with_url(*url);
            match canvas.create_shape(descriptor) {
                Ok(id) => created.push(id),
                Err(e) => log::warn!("seed: cannot create window for {url}: {e}"),
            }
        }
        for id in &created {
            if let Err(e) = self.mount(canvas, host, *id) {
                log::warn!("{id}: seed mount failed: {e}");
            }
        }
        created
    }

    // ─── Effects ─────────────────────────────────────────────────────────

    /// Carry out `effects` for `id`, plus whatever they trigger in turn.
    fn run_effects(
        &mut self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        id: ShapeId,
        effects: Effects,
    ) {
        let mut queue: VecDeque<(ShapeId, Effect)> =
            effects.into_iter().map(|effect| (id, effect)).collect();

        while let Some((id, effect)) = queue.pop_front() {
            let frame = self.frame_of(id);
            match effect {
                Effect::Patch(patch) => {
                    if let Err(e) = canvas.update_shape(id, &patch) {
                        log::warn!("{id}: patch rejected: {e}");
                        continue;
                    }
                    let (Some(shape), Some(instance)) =
                        (canvas.get_shape(id), self.instances.get_mut(&id))
                    else {
                        continue;
                    };
                    let follow = instance.machine.on_shape_changed(&shape);
                    queue.extend(follow.into_iter().map(|effect| (id, effect)));
                }
                Effect::Delete => {
                    let popups = if self.config.close_popups_with_opener {
                        canvas.popups_of(id)
                    } else {
                        Vec::new()
                    };
                    if let Err(e) = canvas.delete_shape(id) {
                        log::warn!("{id}: delete failed: {e}");
                    }
                    self.unmount(host, id);
                    queue.extend(popups.into_iter().map(|popup| (popup, Effect::Delete)));
                }
                Effect::Promote => FocusArbiter::promote(canvas, id),
                Effect::Schedule { kind, delay_ms } => {
                    self.timers.schedule(id, kind, delay_ms);
                }
                Effect::Cancel(kind) => {
                    self.timers.cancel(id, kind);
                }
                Effect::SpawnPopup(request) => {
                    match self.popups.spawn(canvas, host, id, request) {
                        Ok(spawn) => {
                            if let Err(e) = self.mount_with_frame(canvas, host, spawn.shape, spawn.frame)
                            {
                                log::error!("{}: popup mount failed: {e}", spawn.shape);
                            }
                        }
                        Err(e) => log::error!("{id}: popup dropped: {e}"),
                    }
                }
                frame_effect => {
                    let Some(frame) = frame else {
                        log::trace!("{id}: {frame_effect:?} skipped, not mounted");
                        continue;
                    };
                    let follow = self.run_frame_effect(host, id, frame, frame_effect);
                    queue.extend(follow.into_iter().map(|effect| (id, effect)));
                }
            }
        }
    }

    /// Effects that talk to the frame host directly.
    fn run_frame_effect(
        &mut self,
        host: &mut dyn FrameHost,
        id: ShapeId,
        frame: FrameHandle,
        effect: Effect,
    ) -> Effects {
        match effect {
            Effect::Reload => host.reload(frame),
            Effect::Navigate(url) => host.navigate(frame, &url),
            Effect::SetSurfaceVisible(visible) => host.set_surface_visible(frame, visible),
            Effect::ToggleFullscreen => {
                let result = if host.is_fullscreen(frame) {
                    host.exit_fullscreen(frame)
                } else {
                    host.request_fullscreen(frame)
                };
                if let Err(e) = result {
                    log::warn!("{id}: {e}");
                }
            }
            Effect::RunScript { purpose, code } => match host.run_script(frame, &code) {
                Ok(ticket) => {
                    self.tickets.insert(ticket, (id, purpose));
                }
                Err(e) => {
                    if let Some(instance) = self.instances.get_mut(&id) {
                        return instance.machine.on_script_result(purpose, Err(e));
                    }
                }
            },
            other => log::trace!("{id}: {other:?} is not a frame effect"),
        }
        Effects::new()
    }
}
