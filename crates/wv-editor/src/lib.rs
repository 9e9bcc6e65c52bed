pub mod canvas;
pub mod commands;
pub mod config;
pub mod controller;
pub mod focus;
pub mod frame;
pub mod omnibox;
pub mod popup;
pub mod session;
pub mod shortcuts;
pub mod sim;
pub mod timers;
pub mod tools;

pub use canvas::{CanvasEngine, CanvasError};
pub use commands::ChromeCommand;
pub use config::{ConfigError, ControllerConfig};
pub use controller::{ControllerError, ReconcileReport, WindowController};
pub use focus::FocusArbiter;
pub use frame::{
    FrameEvent, FrameHandle, FrameHost, NativeWindowRef, NewWindowRequest, RawFrameEvent,
    ScriptError, ScriptTicket, Subscription,
};
pub use omnibox::{Omnibox, OmniboxError};
pub use popup::{PopupCoordinator, PopupError};
pub use session::{LoadPhase, SessionState, WindowMachine};
pub use shortcuts::{ShortcutAction, ShortcutMap};
pub use sim::{SimFrameHost, SimSession};
