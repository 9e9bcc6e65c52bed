//! Frame adapter boundary.
//!
//! A frame is one live sandboxed browsing session backing a window shape.
//! The host environment owns the actual engine; the controller only sees
//! opaque handles, typed lifecycle events, and the imperative operations
//! of [`FrameHost`]. The host never touches shape data, it only reports.

use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

// ─── Handles ─────────────────────────────────────────────────────────────

/// Opaque reference to a live frame owned by the host.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameHandle(pub u64);

/// A native browsing context the host created for a popup, not yet bound
/// to any frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NativeWindowRef(pub u64);

/// Pending asynchronous script execution. The host resolves it later via
/// `WindowController::resolve_script`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScriptTicket(pub u64);

// ─── Events ──────────────────────────────────────────────────────────────

/// Normalized frame lifecycle events.
///
/// A successful navigation emits `NavigationStarted`, `NavigationCommitted`,
/// `ContentLoaded`, `NavigationFinished` in that order. `NavigationAborted`
/// and `NavigationFailed` end a cycle without `NavigationFinished`.
#[derive(Debug, Clone, PartialEq)]
pub enum FrameEvent {
    NavigationStarted,
    NavigationCommitted { url: String },
    ContentLoaded,
    NavigationFinished,
    NavigationAborted,
    NavigationFailed { reason: String },
    NewWindowRequested(NewWindowRequest),
}

impl FrameEvent {
    pub fn name(&self) -> &'static str {
        match self {
            Self::NavigationStarted => "NavigationStarted",
            Self::NavigationCommitted { .. } => "NavigationCommitted",
            Self::ContentLoaded => "ContentLoaded",
            Self::NavigationFinished => "NavigationFinished",
            Self::NavigationAborted => "NavigationAborted",
            Self::NavigationFailed { .. } => "NavigationFailed",
            Self::NewWindowRequested(_) => "NewWindowRequested",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewWindowRequest {
    pub target_url: String,
    pub width: Option<f64>,
    pub height: Option<f64>,
    pub window: NativeWindowRef,
}

/// An event as the host engine reports it: a DOM event name plus its
/// payload fields. The native window of a `newwindow` event cannot be
/// serialized, so the host registers it and passes the reference.
#[derive(Debug, Clone, PartialEq)]
pub struct RawFrameEvent {
    pub name: String,
    pub payload: serde_json::Value,
    pub window: Option<NativeWindowRef>,
}

impl RawFrameEvent {
    pub fn new(name: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            name: name.into(),
            payload,
            window: None,
        }
    }

    pub fn with_window(mut self, window: NativeWindowRef) -> Self {
        self.window = Some(window);
        self
    }

    /// Map to a typed event. Unknown names yield `None`.
    pub fn normalize(&self) -> Option<FrameEvent> {
        let event = match self.name.as_str() {
            "loadstart" => FrameEvent::NavigationStarted,
            "loadcommit" => FrameEvent::NavigationCommitted {
                url: self.str_field("url").unwrap_or_default(),
            },
            "contentload" => FrameEvent::ContentLoaded,
            "loadstop" => FrameEvent::NavigationFinished,
            "loadabort" => FrameEvent::NavigationAborted,
            "loaderror" => FrameEvent::NavigationFailed {
                reason: self
                    .str_field("reason")
                    .unwrap_or_else(|| "unknown".to_string()),
            },
            "newwindow" => {
                let Some(window) = self.window else {
                    log::warn!("frame: newwindow event without a native window, ignored");
                    return None;
                };
                FrameEvent::NewWindowRequested(NewWindowRequest {
                    target_url: self.str_field("targetUrl").unwrap_or_default(),
                    width: self.dimension("initialWidth"),
                    height: self.dimension("initialHeight"),
                    window,
                })
            }
            other => {
                log::trace!("frame: ignoring raw event `{other}`");
                return None;
            }
        };
        Some(event)
    }

    fn str_field(&self, key: &str) -> Option<String> {
        self.payload.get(key)?.as_str().map(str::to_string)
    }

    /// Zero, negative or missing dimensions count as unset.
    fn dimension(&self, key: &str) -> Option<f64> {
        self.payload
            .get(key)?
            .as_f64()
            .filter(|v| v.is_finite() && *v > 0.0)
    }
}

// ─── Errors ──────────────────────────────────────────────────────────────

/// A script could not run or threw inside the content.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ScriptError {
    #[error("frame {0:?} is not ready to run scripts")]
    NotReady(FrameHandle),
    #[error("script threw: {0}")]
    Threw(String),
    #[error("no live frame {0:?}")]
    UnknownFrame(FrameHandle),
}

/// The platform refused a fullscreen request.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum FullscreenError {
    #[error("fullscreen request rejected: {0}")]
    Rejected(String),
    #[error("no live frame {0:?}")]
    UnknownFrame(FrameHandle),
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum AttachError {
    #[error("cannot attach native window {window:?} to frame {frame:?}: {reason}")]
    Rejected {
        frame: FrameHandle,
        window: NativeWindowRef,
        reason: String,
    },
    #[error("native window {0:?} is unknown or already attached")]
    UnknownWindow(NativeWindowRef),
}

// ─── Subscriptions ───────────────────────────────────────────────────────

/// Keeps a frame's event stream flowing to the controller. Dropping the
/// guard unsubscribes.
pub struct Subscription {
    frame: FrameHandle,
    release: Option<Box<dyn FnOnce()>>,
}

impl Subscription {
    pub fn new(frame: FrameHandle, release: impl FnOnce() + 'static) -> Self {
        Self {
            frame,
            release: Some(Box::new(release)),
        }
    }

    pub fn frame(&self) -> FrameHandle {
        self.frame
    }

    /// Unsubscribe now rather than at drop.
    pub fn release(mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(release) = self.release.take() {
            release();
        }
    }
}

impl fmt::Debug for Subscription {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Subscription")
            .field("frame", &self.frame)
            .field("active", &self.release.is_some())
            .finish()
    }
}

// ─── Host trait ──────────────────────────────────────────────────────────

/// Operations the host environment provides on frames.
///
/// Events flow the other way: the host delivers them to
/// `WindowController::handle_frame_event` for every frame that still holds
/// a live [`Subscription`], in emission order per frame.
pub trait FrameHost {
    /// Create a frame and start navigating to `url`.
    fn create(&mut self, url: &str) -> FrameHandle;

    /// Create a frame with no navigation, ready for [`FrameHost::attach`].
    fn create_detached(&mut self) -> FrameHandle;

    /// Bind a host-created native window to a detached frame. The frame
    /// shows that window's session instead of loading anything itself.
    fn attach(&mut self, frame: FrameHandle, window: NativeWindowRef) -> Result<(), AttachError>;

    fn navigate(&mut self, frame: FrameHandle, url: &str);

    fn reload(&mut self, frame: FrameHandle);

    /// Start running `code` in the frame's content. The result arrives
    /// later through the returned ticket.
    fn run_script(&mut self, frame: FrameHandle, code: &str) -> Result<ScriptTicket, ScriptError>;

    fn subscribe(&mut self, frame: FrameHandle) -> Subscription;

    /// Show or hide the frame's visual surface. The session stays alive.
    fn set_surface_visible(&mut self, frame: FrameHandle, visible: bool);

    fn is_fullscreen(&self, frame: FrameHandle) -> bool;

    fn request_fullscreen(&mut self, frame: FrameHandle) -> Result<(), FullscreenError>;

    fn exit_fullscreen(&mut self, frame: FrameHandle) -> Result<(), FullscreenError>;

    /// Tear down the frame and its session.
    fn destroy(&mut self, frame: FrameHandle);

    /// Dispose a native window that will never be attached.
    fn discard_window(&mut self, window: NativeWindowRef);
}

// ─── Scripts ─────────────────────────────────────────────────────────────

/// Reads the content's document title.
pub const TITLE_PROBE_SCRIPT: &str = "document.title";

/// Override the content's preferred color scheme.
pub fn dark_mode_script(enabled: bool) -> String {
    let scheme = if enabled { "dark" } else { "light" };
    format!(
        r#"(function() {{
  const scheme = '{scheme}';
  const meta = document.querySelector('meta[name="color-scheme"]') || document.createElement('meta');
  meta.name = 'color-scheme';
  meta.content = scheme;
  if (!meta.parentNode) document.head.appendChild(meta);
  document.documentElement.style.colorScheme = scheme;
}})();"#
    )
}

/// Extract a title from a script result. Hosts report one result per
/// injected frame as an array; a bare string is accepted too.
pub fn title_from_result(result: &serde_json::Value) -> Option<String> {
    match result {
        serde_json::Value::String(s) => Some(s.clone()),
        serde_json::Value::Array(items) => items.first()?.as_str().map(str::to_string),
        _ => None,
    }
}
