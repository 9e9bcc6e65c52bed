//! Integration tests: controller invariants (wv-editor).

use pretty_assertions::assert_eq;
use wv_core::{ShapeDescriptor, ShapeId};
use wv_editor::sim::HostCall;
use wv_editor::{ChromeCommand, ControllerConfig, FrameEvent, SimSession};

fn session() -> SimSession {
    SimSession::new(ControllerConfig::default())
}

fn open(s: &mut SimSession, x: f64, y: f64) -> ShapeId {
    s.open(ShapeDescriptor::at(x, y).with_url("https://a.test"))
        .unwrap()
}

fn is_subsequence(seen: &[u8], of: &[u8]) -> bool {
    let mut it = of.iter();
    seen.iter().all(|v| it.any(|o| o == v))
}

// ─── Progress ───────────────────────────────────────────────────────────

#[test]
fn progress_is_monotonic_within_a_cycle() {
    let mut s = session();
    let id = open(&mut s, 0.0, 0.0);
    let frame = s.frame_of(id).unwrap();
    let progress = |s: &SimSession| s.controller.session(id).unwrap().load_progress;

    let mut cycle = Vec::new();
    for event in [
        FrameEvent::NavigationStarted,
        FrameEvent::NavigationCommitted { url: "u".into() },
        FrameEvent::ContentLoaded,
        FrameEvent::NavigationFinished,
    ] {
        s.emit(frame, event);
        cycle.push(progress(&s));
    }
    s.advance(500);
    cycle.push(progress(&s));
    assert_eq!(cycle, vec![0, 30, 70, 100, 0]);

    // A second cycle restarted before settling never dips mid-cycle.
    let mut second = Vec::new();
    s.emit(frame, FrameEvent::NavigationStarted);
    s.emit(frame, FrameEvent::NavigationCommitted { url: "u".into() });
    s.emit(frame, FrameEvent::ContentLoaded);
    s.emit(frame, FrameEvent::NavigationFinished);
    second.push(progress(&s));
    s.emit(frame, FrameEvent::NavigationStarted);
    second.push(progress(&s));
    s.emit(frame, FrameEvent::NavigationCommitted { url: "u".into() });
    second.push(progress(&s));
    // The first cycle's settle timer must not fire into this one.
    s.advance(600);
    second.push(progress(&s));
    assert_eq!(second, vec![100, 0, 30, 30]);
    assert!(is_subsequence(&second[1..], &[0, 30, 70, 100, 0]));
}

#[test]
fn repeated_commits_never_pull_progress_back() {
    let mut s = session();
    let id = open(&mut s, 0.0, 0.0);
    let frame = s.frame_of(id).unwrap();

    let mut seen = Vec::new();
    for event in [
        FrameEvent::NavigationStarted,
        FrameEvent::NavigationCommitted { url: "u".into() },
        FrameEvent::ContentLoaded,
        FrameEvent::NavigationCommitted { url: "u#frag".into() },
        FrameEvent::ContentLoaded,
        FrameEvent::NavigationFinished,
    ] {
        s.emit(frame, event);
        seen.push(s.controller.session(id).unwrap().load_progress);
    }
    assert_eq!(seen, vec![0, 30, 70, 70, 70, 100]);
    assert!(seen.windows(2).all(|w| w[0] <= w[1]));
}

#[test]
fn abort_resets_progress() {
    let mut s = session();
    let id = open(&mut s, 0.0, 0.0);
    let frame = s.frame_of(id).unwrap();
    s.emit(frame, FrameEvent::NavigationStarted);
    s.emit(frame, FrameEvent::NavigationCommitted { url: "u".into() });
    s.emit(frame, FrameEvent::NavigationAborted);
    let state = s.controller.session(id).unwrap();
    assert_eq!((state.is_loading, state.load_progress), (false, 0));
}

// ─── Focus ──────────────────────────────────────────────────────────────

#[test]
fn focusing_twice_equals_focusing_once() {
    let mut s = session();
    let a = open(&mut s, 0.0, 0.0);
    let b = open(&mut s, 10.0, 10.0);
    let c = open(&mut s, 20.0, 20.0);

    s.command(a, ChromeCommand::Focus).unwrap();
    let once = (s.canvas.paint_order(), s.canvas.selection().to_vec());
    s.command(a, ChromeCommand::Focus).unwrap();
    let twice = (s.canvas.paint_order(), s.canvas.selection().to_vec());

    assert_eq!(once, twice);
    assert_eq!(once.0, vec![b, c, a]);
}

// ─── Popups ─────────────────────────────────────────────────────────────

#[test]
fn popups_land_at_offset_and_are_never_freshly_created() {
    let mut s = session();
    for (x, y) in [(0.0, 0.0), (-300.0, 75.5), (1200.0, -40.0)] {
        let opener = open(&mut s, x, y);
        s.request_popup(opener, "https://b.test", None, None);
        let popup = s.canvas.topmost().unwrap();
        let shape = s.canvas.get(popup).unwrap();
        assert_eq!((shape.x, shape.y), (x + 50.0, y + 50.0));
    }

    let calls = s.host.calls();
    let creates = calls
        .iter()
        .filter(|c| matches!(c, HostCall::Create { .. }))
        .count();
    let attaches = calls
        .iter()
        .filter(|c| matches!(c, HostCall::Attach { .. }))
        .count();
    // One fresh frame per opener, one attach per popup.
    assert_eq!((creates, attaches), (3, 3));
    assert!(
        !calls
            .iter()
            .any(|c| matches!(c, HostCall::Create { url, .. } if url == "https://b.test"))
    );
}

#[test]
fn popup_offset_follows_config() {
    let mut s = SimSession::new(ControllerConfig {
        popup_offset: [20.0, 30.0],
        ..ControllerConfig::default()
    });
    let opener = open(&mut s, 100.0, 100.0);
    s.request_popup(opener, "https://b.test", None, None);
    let popup = s.canvas.get(s.canvas.topmost().unwrap()).unwrap();
    assert_eq!((popup.x, popup.y), (120.0, 130.0));
}

#[test]
fn popup_request_leaves_opener_progress_alone() {
    let mut s = session();
    let opener = open(&mut s, 0.0, 0.0);
    let frame = s.frame_of(opener).unwrap();
    s.emit(frame, FrameEvent::NavigationStarted);
    s.emit(frame, FrameEvent::NavigationCommitted { url: "u".into() });
    s.request_popup(opener, "https://b.test", None, None);
    let state = s.controller.session(opener).unwrap();
    assert_eq!((state.is_loading, state.load_progress), (true, 30));
}

// ─── Minimize ───────────────────────────────────────────────────────────

#[test]
fn minimize_round_trip_keeps_the_live_frame() {
    let mut s = SimSession::new(ControllerConfig {
        persist_observed_title: true,
        ..ControllerConfig::default()
    });
    let id = open(&mut s, 0.0, 0.0);
    let frame = s.frame_of(id).unwrap();
    s.host.set_title(frame, "Kept");
    s.load(id, "https://a.test");
    s.advance(100);
    s.complete_scripts();

    let before = s.canvas.get(id).unwrap().clone();
    s.command(id, ChromeCommand::Minimize).unwrap();
    assert!(s.canvas.get(id).unwrap().props.is_minimized);
    assert_eq!(s.frame_of(id), Some(frame));
    assert!(!s.host.frame(frame).unwrap().visible);

    s.command(id, ChromeCommand::Minimize).unwrap();
    let after = s.canvas.get(id).unwrap();
    assert_eq!(after, &before);
    assert_eq!(after.props.title, "Kept");
    assert_eq!(s.frame_of(id), Some(frame));
    assert!(s.host.frame(frame).unwrap().visible);

    let calls = s.host.calls();
    assert!(!calls.contains(&HostCall::Destroy { frame }));
    assert_eq!(
        calls
            .iter()
            .filter(|c| matches!(c, HostCall::Create { .. }))
            .count(),
        1
    );
}
