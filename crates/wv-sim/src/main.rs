//! Headless webview canvas session.
//!
//! Replays a scripted browsing session against the simulated frame host:
//! two windows load, one opens a popup, the popup goes dark, the other
//! window is minimized and the opener closes. The final document is
//! printed to stdout as a JSON snapshot.
//!
//! Usage: `wv-sim [config.toml]`. Logging follows `RUST_LOG` (default
//! `info`).

use std::error::Error;
use std::{env, fs};

use wv_core::ShapeDescriptor;
use wv_editor::{ChromeCommand, ControllerConfig, SimSession};

const START_URLS: [&str; 2] = ["https://example.com", "https://www.rust-lang.org"];

fn main() -> Result<(), Box<dyn Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = match env::args().nth(1) {
        Some(path) => {
            let source = fs::read_to_string(&path)?;
            let config = ControllerConfig::from_toml_str(&source)?;
            log::info!("config loaded from {path}");
            config
        }
        None => ControllerConfig::default(),
    };

    let mut s = SimSession::new(config);
    let seeded = s
        .controller
        .seed_if_empty(&mut s.canvas, &mut s.host, &START_URLS);
    let (&first, &second) = match seeded.as_slice() {
        [a, b, ..] => (a, b),
        _ => return Err("seeding produced fewer than two windows".into()),
    };

    for (id, url) in [(first, START_URLS[0]), (second, START_URLS[1])] {
        if let Some(frame) = s.frame_of(id) {
            s.host.set_title(frame, &format!("{url} (title)"));
        }
        s.load(id, url);
    }
    s.advance(100);
    log::info!("{} title probe(s) resolved", s.complete_scripts());

    s.request_popup(first, "https://example.com/popup", None, None)
        .ok_or("opener has no frame")?;
    let popup = s.canvas.topmost().ok_or("popup was not created")?;
    s.load(popup, "https://example.com/popup");

    s.command(popup, ChromeCommand::ToggleDarkMode)?;
    s.complete_scripts();
    s.command(second, ChromeCommand::Minimize)?;
    s.advance(1_000);
    s.complete_scripts();

    let extra = s.open(ShapeDescriptor::at(900.0, 100.0).with_url("http://localhost:8080"))?;
    s.command(extra, ChromeCommand::Maximize)?;
    s.command(first, ChromeCommand::Close)?;

    for id in s.controller.mounted() {
        if let Some(state) = s.controller.session(id) {
            log::info!("{id}: {}", serde_json::to_string(state)?);
        }
    }
    log::info!(
        "{} window(s), {} live frame(s), {} host call(s)",
        s.canvas.len(),
        s.host.live_frames(),
        s.host.calls().len()
    );

    println!("{}", s.canvas.snapshot().to_json()?);
    Ok(())
}
