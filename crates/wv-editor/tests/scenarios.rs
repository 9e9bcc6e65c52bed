//! Integration tests: end-to-end window scenarios (wv-editor).
//!
//! Drives the controller against the in-memory shape store and the
//! simulated frame host, the way a canvas and browser would.

use pretty_assertions::assert_eq;
use wv_core::{ShapeDescriptor, ShapeId};
use wv_editor::session::LoadPhase;
use wv_editor::sim::HostCall;
use wv_editor::{ChromeCommand, ControllerConfig, FrameEvent, SimSession};

fn session() -> SimSession {
    SimSession::new(ControllerConfig::default())
}

fn open(s: &mut SimSession, x: f64, y: f64, url: &str) -> ShapeId {
    s.open(ShapeDescriptor::at(x, y).with_url(url)).unwrap()
}

fn script_calls(s: &SimSession) -> usize {
    s.host
        .calls()
        .iter()
        .filter(|c| matches!(c, HostCall::RunScript { .. }))
        .count()
}

// ─── Scenario A: successful load ────────────────────────────────────────

#[test]
fn load_probes_title_and_settles_progress() {
    let mut s = session();
    let id = open(&mut s, 0.0, 0.0, "https://a.test");
    let frame = s.frame_of(id).unwrap();
    s.host.set_title(frame, "A Test");

    s.load(id, "https://a.test");
    let state = s.controller.session(id).unwrap();
    assert_eq!(state.load_progress, 100);
    assert!(!state.is_loading);

    // Probe is deferred; nothing observed yet.
    s.advance(100);
    assert_eq!(s.controller.session(id).unwrap().observed_title, "");
    assert_eq!(s.canvas.get(id).unwrap().props.title, "");

    assert_eq!(s.complete_scripts(), 1);
    assert_eq!(s.controller.session(id).unwrap().observed_title, "A Test");
    // The persisted title stays as it was.
    assert_eq!(s.canvas.get(id).unwrap().props.title, "");

    s.advance(400);
    let state = s.controller.session(id).unwrap();
    assert_eq!(state.load_progress, 0);
    assert_eq!(state.phase, LoadPhase::Loaded);
}

#[test]
fn observed_title_persists_when_configured() {
    let mut s = SimSession::new(ControllerConfig {
        persist_observed_title: true,
        ..ControllerConfig::default()
    });
    let id = open(&mut s, 0.0, 0.0, "https://a.test");
    let frame = s.frame_of(id).unwrap();
    s.host.set_title(frame, "A Test");

    s.load(id, "https://a.test");
    s.advance(100);
    s.complete_scripts();
    assert_eq!(s.canvas.get(id).unwrap().props.title, "A Test");
}

// ─── Scenario B: failed load ────────────────────────────────────────────

#[test]
fn failure_mid_load_clears_loading_without_title() {
    let mut s = session();
    let id = open(&mut s, 0.0, 0.0, "https://a.test");
    let frame = s.frame_of(id).unwrap();
    s.host.set_title(frame, "never seen");

    s.emit(frame, FrameEvent::NavigationStarted);
    s.emit(frame, FrameEvent::NavigationCommitted {
        url: "https://a.test".into(),
    });
    s.emit(frame, FrameEvent::ContentLoaded);
    s.emit(frame, FrameEvent::NavigationFailed {
        reason: "dns".into(),
    });

    let state = s.controller.session(id).unwrap();
    assert!(!state.is_loading);
    assert_eq!(state.load_progress, 0);

    // The deferred probe was cancelled with the cycle.
    s.advance(5_000);
    assert_eq!(script_calls(&s), 0);
    assert_eq!(s.controller.session(id).unwrap().observed_title, "");
    assert_eq!(s.canvas.get(id).unwrap().props.title, "");
}

// ─── Scenario C: popup ──────────────────────────────────────────────────

#[test]
fn popup_spawns_offset_attached_and_on_top() {
    let mut s = session();
    let opener = open(&mut s, 100.0, 100.0, "https://a.test");
    let other = open(&mut s, 400.0, 0.0, "https://c.test");
    let window = s
        .request_popup(opener, "https://b.test", Some(800.0), Some(600.0))
        .unwrap();

    let order = s.canvas.paint_order();
    assert_eq!(order.len(), 3);
    let popup = *order.last().unwrap();
    assert!(popup != opener && popup != other);

    let shape = s.canvas.get(popup).unwrap();
    assert_eq!((shape.x, shape.y), (150.0, 150.0));
    assert_eq!((shape.props.w, shape.props.h), (800.0, 600.0));
    assert_eq!(shape.props.url, "https://b.test");
    assert_eq!(shape.props.opener, Some(opener));
    assert_eq!(s.canvas.selection(), &[popup]);

    // The popup's frame is the attached one, mounted and listening.
    let frame = s.frame_of(popup).unwrap();
    assert!(s.host.calls().contains(&HostCall::Attach { frame, window }));
    assert!(s.host.is_subscribed(frame));
    assert_eq!(s.host.open_windows(), 0);
}

#[test]
fn popup_without_size_uses_default() {
    let mut s = session();
    let opener = open(&mut s, 0.0, 0.0, "https://a.test");
    s.request_popup(opener, "https://b.test", None, None);
    let popup = s.canvas.topmost().unwrap();
    let shape = s.canvas.get(popup).unwrap();
    assert_eq!((shape.props.w, shape.props.h), (800.0, 600.0));
    assert_eq!((shape.x, shape.y), (50.0, 50.0));
}

// ─── Scenario D: dark mode then close ───────────────────────────────────

#[test]
fn close_after_dark_mode_stops_event_delivery() {
    let mut s = session();
    let id = open(&mut s, 0.0, 0.0, "https://a.test");
    let frame = s.frame_of(id).unwrap();

    s.command(id, ChromeCommand::ToggleDarkMode).unwrap();
    assert!(s.controller.session(id).unwrap().is_dark_mode);
    s.command(id, ChromeCommand::Close).unwrap();

    let calls = s.host.calls();
    let script_at = calls
        .iter()
        .position(|c| matches!(c, HostCall::RunScript { code, .. } if code.contains("'dark'")))
        .unwrap();
    let destroy_at = calls
        .iter()
        .position(|c| *c == HostCall::Destroy { frame })
        .unwrap();
    assert!(script_at < destroy_at);

    assert!(s.canvas.get(id).is_none());
    assert!(!s.controller.is_mounted(id));
    assert!(!s.host.is_subscribed(frame));

    // The frame fires after close: nothing is delivered.
    assert!(!s.emit(frame, FrameEvent::NavigationStarted));
    assert!(!s.controller.handle_frame_event(
        &mut s.canvas,
        &mut s.host,
        frame,
        FrameEvent::NavigationFinished,
    ));
    // The dark-mode result arrives late and is dropped.
    assert_eq!(s.complete_scripts(), 0);
}
