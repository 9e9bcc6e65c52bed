//! Window state machine.
//!
//! One [`WindowMachine`] per mounted window shape. It is a pure transition
//! function: every input (frame event, chrome command, timer, script
//! result, persisted shape change) updates the transient [`SessionState`]
//! and returns the [`Effect`]s the controller must carry out. The machine
//! never touches the canvas or the frame host itself.
//!
//! ```text
//! Idle ──Started──▶ Loading(Started, 0%) ──Committed──▶ Loading(Committed, 30%)
//!   ──ContentLoaded──▶ Loading(Rendering, 70%) ──Finished──▶ Loaded(100% → 0%)
//! Loading ──Aborted/Failed──▶ Aborted | Failed (0%)
//! any ──Started──▶ Loading(Started, 0%)
//! ```

use crate::commands::ChromeCommand;
use crate::config::ControllerConfig;
use crate::frame::{
    FrameEvent, FrameHandle, NewWindowRequest, ScriptError, TITLE_PROBE_SCRIPT, dark_mode_script,
    title_from_result,
};
use crate::timers::TimerKind;
use serde::Serialize;
use smallvec::{SmallVec, smallvec};
use wv_core::{ShapeId, ShapePatch, WindowShape};

pub const PROGRESS_COMMITTED: u8 = 30;
pub const PROGRESS_RENDERING: u8 = 70;
pub const PROGRESS_DONE: u8 = 100;

// ─── State ───────────────────────────────────────────────────────────────

/// Stages of a loading cycle, in the order they are reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LoadStage {
    Started,
    Committed,
    Rendering,
}

/// Where the current navigation cycle stands.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum LoadPhase {
    Idle,
    Loading { stage: LoadStage },
    Loaded,
    Aborted,
    Failed { reason: String },
}

/// Transient per-instance state. Never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionState {
    pub observed_title: String,
    pub is_loading: bool,
    pub load_progress: u8,
    pub is_dark_mode: bool,
    pub phase: LoadPhase,
    /// URL the frame last committed to, which may differ from the
    /// persisted one after in-page navigation.
    pub committed_url: Option<String>,
    pub frame: FrameHandle,
}

impl SessionState {
    fn new(frame: FrameHandle) -> Self {
        Self {
            observed_title: String::new(),
            is_loading: false,
            load_progress: 0,
            is_dark_mode: false,
            phase: LoadPhase::Idle,
            committed_url: None,
            frame,
        }
    }

    /// Move the cycle forward to `stage`. Repeated or late events never
    /// pull progress back within a cycle.
    fn reach(&mut self, stage: LoadStage, progress: u8) {
        self.load_progress = self.load_progress.max(progress);
        let current = match self.phase {
            LoadPhase::Loading { stage } => Some(stage),
            _ => None,
        };
        if current.is_none_or(|c| c < stage) {
            self.phase = LoadPhase::Loading { stage };
        }
    }
}

// ─── Effects ─────────────────────────────────────────────────────────────

/// Why a script was run; decides how its result is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScriptPurpose {
    TitleProbe,
    DarkMode { enabled: bool },
}

/// Work the controller performs on the machine's behalf.
#[derive(Debug, Clone, PartialEq)]
pub enum Effect {
    /// Persisted shape patch through the canvas engine.
    Patch(ShapePatch),
    /// Delete the shape and tear the instance down.
    Delete,
    /// Select the shape and bring it to the top.
    Promote,
    Reload,
    Navigate(String),
    RunScript { purpose: ScriptPurpose, code: String },
    Schedule { kind: TimerKind, delay_ms: u64 },
    Cancel(TimerKind),
    SetSurfaceVisible(bool),
    ToggleFullscreen,
    SpawnPopup(NewWindowRequest),
}

pub type Effects = SmallVec<[Effect; 4]>;

// ─── Machine ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone)]
pub struct WindowMachine {
    id: ShapeId,
    state: SessionState,
    /// Last persisted values seen, for diffing shape changes.
    url: String,
    minimized: bool,
    probe_delay_ms: u64,
    settle_delay_ms: u64,
    probe_interval_ms: u64,
    maximize_size: [f64; 2],
    persist_observed_title: bool,
}

impl WindowMachine {
    pub fn new(shape: &WindowShape, frame: FrameHandle, config: &ControllerConfig) -> Self {
        Self {
            id: shape.id,
            state: SessionState::new(frame),
            url: shape.props.url.clone(),
            minimized: shape.props.is_minimized,
            probe_delay_ms: config.title_probe_delay_ms,
            settle_delay_ms: config.settle_delay_ms,
            // A zero interval would re-arm at the instant it fires.
            probe_interval_ms: config.title_probe_interval_ms.max(1),
            maximize_size: config.maximize_size,
            persist_observed_title: config.persist_observed_title,
        }
    }

    pub fn id(&self) -> ShapeId {
        self.id
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn frame(&self) -> FrameHandle {
        self.state.frame
    }

    pub fn on_frame_event(&mut self, event: FrameEvent) -> Effects {
        let id = self.id;
        let s = &mut self.state;
        match event {
            FrameEvent::NavigationStarted => {
                log::debug!("{id}: navigation started");
                s.is_loading = true;
                s.load_progress = 0;
                s.phase = LoadPhase::Loading {
                    stage: LoadStage::Started,
                };
                smallvec![
                    Effect::Cancel(TimerKind::Settle),
                    Effect::Cancel(TimerKind::TitleInterval),
                    Effect::Cancel(TimerKind::TitleProbe),
                ]
            }
            FrameEvent::NavigationCommitted { url } if s.is_loading => {
                log::debug!("{id}: navigation committed to {url}");
                s.reach(LoadStage::Committed, PROGRESS_COMMITTED);
                s.committed_url = Some(url);
                SmallVec::new()
            }
            FrameEvent::ContentLoaded if s.is_loading => {
                log::debug!("{id}: content loaded");
                s.reach(LoadStage::Rendering, PROGRESS_RENDERING);
                smallvec![Effect::Schedule {
                    kind: TimerKind::TitleProbe,
                    delay_ms: self.probe_delay_ms,
                }]
            }
            FrameEvent::NavigationFinished if s.is_loading => {
                log::debug!("{id}: navigation finished");
                s.is_loading = false;
                s.load_progress = PROGRESS_DONE;
                s.phase = LoadPhase::Loaded;
                smallvec![
                    Effect::Schedule {
                        kind: TimerKind::Settle,
                        delay_ms: self.settle_delay_ms,
                    },
                    Effect::Schedule {
                        kind: TimerKind::TitleInterval,
                        delay_ms: self.probe_interval_ms,
                    },
                ]
            }
            FrameEvent::NavigationAborted if s.is_loading => {
                log::debug!("{id}: navigation aborted");
                s.is_loading = false;
                s.load_progress = 0;
                s.phase = LoadPhase::Aborted;
                smallvec![Effect::Cancel(TimerKind::TitleProbe)]
            }
            FrameEvent::NavigationFailed { reason } if s.is_loading => {
                log::warn!("{id}: navigation failed: {reason}");
                s.is_loading = false;
                s.load_progress = 0;
                s.phase = LoadPhase::Failed { reason };
                smallvec![Effect::Cancel(TimerKind::TitleProbe)]
            }
            FrameEvent::NewWindowRequested(request) => {
                smallvec![Effect::SpawnPopup(request)]
            }
            other => {
                log::trace!("{id}: {} ignored while not loading", other.name());
                SmallVec::new()
            }
        }
    }

    pub fn on_timer(&mut self, kind: TimerKind) -> Effects {
        match kind {
            TimerKind::TitleProbe => self.probe(),
            TimerKind::Settle => {
                if self.state.phase == LoadPhase::Loaded {
                    self.state.load_progress = 0;
                }
                SmallVec::new()
            }
            TimerKind::TitleInterval if self.state.phase == LoadPhase::Loaded => {
                let mut effects = self.probe();
                effects.push(Effect::Schedule {
                    kind: TimerKind::TitleInterval,
                    delay_ms: self.probe_interval_ms,
                });
                effects
            }
            TimerKind::TitleInterval => SmallVec::new(),
        }
    }

    fn probe(&self) -> Effects {
        smallvec![Effect::RunScript {
            purpose: ScriptPurpose::TitleProbe,
            code: TITLE_PROBE_SCRIPT.to_string(),
        }]
    }

    pub fn on_script_result(
        &mut self,
        purpose: ScriptPurpose,
        result: Result<serde_json::Value, ScriptError>,
    ) -> Effects {
        let id = self.id;
        match (purpose, result) {
            (ScriptPurpose::TitleProbe, Ok(value)) => {
                let Some(title) = title_from_result(&value) else {
                    log::trace!("{id}: title probe returned no title");
                    return SmallVec::new();
                };
                if title == self.state.observed_title {
                    return SmallVec::new();
                }
                log::debug!("{id}: title is now {title:?}");
                self.state.observed_title = title.clone();
                if self.persist_observed_title {
                    smallvec![Effect::Patch(ShapePatch::title(title))]
                } else {
                    SmallVec::new()
                }
            }
            (ScriptPurpose::TitleProbe, Err(e)) => {
                log::warn!("{id}: title probe failed: {e}");
                SmallVec::new()
            }
            (ScriptPurpose::DarkMode { enabled }, Err(e)) => {
                log::warn!("{id}: dark mode {enabled} injection failed: {e}");
                SmallVec::new()
            }
            (ScriptPurpose::DarkMode { .. }, Ok(_)) => SmallVec::new(),
        }
    }

    /// `shape` is the window as currently stored by the canvas.
    pub fn on_command(&mut self, command: ChromeCommand, shape: &WindowShape) -> Effects {
        let id = self.id;
        log::info!("{id}: {}", command.name());
        match command {
            ChromeCommand::Close => smallvec![Effect::Delete],
            ChromeCommand::Minimize => {
                smallvec![Effect::Patch(ShapePatch::minimized(!shape.props.is_minimized))]
            }
            ChromeCommand::Maximize => {
                let [w, h] = self.maximize_size;
                smallvec![Effect::Patch(ShapePatch::size(w, h))]
            }
            ChromeCommand::Reload => smallvec![Effect::Reload],
            ChromeCommand::ToggleDarkMode => {
                // Optimistic: the flag flips even if the injection fails.
                let enabled = !self.state.is_dark_mode;
                self.state.is_dark_mode = enabled;
                smallvec![Effect::RunScript {
                    purpose: ScriptPurpose::DarkMode { enabled },
                    code: dark_mode_script(enabled),
                }]
            }
            ChromeCommand::ToggleFullscreen => smallvec![Effect::ToggleFullscreen],
            ChromeCommand::Focus => smallvec![Effect::Promote],
        }
    }

    /// React to the persisted shape as the canvas now stores it.
    pub fn on_shape_changed(&mut self, shape: &WindowShape) -> Effects {
        let mut effects = Effects::new();
        if shape.props.url != self.url {
            log::debug!("{}: url changed to {}", self.id, shape.props.url);
            self.url = shape.props.url.clone();
            effects.push(Effect::Navigate(self.url.clone()));
        }
        if shape.props.is_minimized != self.minimized {
            self.minimized = shape.props.is_minimized;
            effects.push(Effect::SetSurfaceVisible(!self.minimized));
        }
        effects
    }
}
