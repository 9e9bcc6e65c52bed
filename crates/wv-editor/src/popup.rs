//! Popup spawning.
//!
//! When content opens a new browsing context, the host has already created
//! a native window for it. The coordinator places a new shape next to the
//! opener, binds a detached frame to that native window (so the popup's
//! first load is not repeated), and promotes the new shape. A request that
//! cannot complete disposes the native window instead of leaking it.

use crate::canvas::{CanvasEngine, CanvasError};
use crate::config::ControllerConfig;
use crate::focus::FocusArbiter;
use crate::frame::{AttachError, FrameHandle, FrameHost, NewWindowRequest};
use thiserror::Error;
use wv_core::{ShapeDescriptor, ShapeId};

/// Content that calls `window.open()` without a URL gets a blank page.
const BLANK_URL: &str = "about:blank";

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PopupError {
    #[error("opener {0} is no longer on the canvas")]
    ParentMissing(ShapeId),
    #[error("cannot create popup shape for {opener}: {source}")]
    ShapeCreationFailed {
        opener: ShapeId,
        source: CanvasError,
    },
    #[error("cannot attach popup {shape}: {source}")]
    AttachFailed { shape: ShapeId, source: AttachError },
}

/// A spawned popup: its shape and the frame bound to the native window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PopupSpawn {
    pub shape: ShapeId,
    pub frame: FrameHandle,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PopupCoordinator {
    offset: [f64; 2],
    default_size: [f64; 2],
}

impl PopupCoordinator {
    pub fn new(config: &ControllerConfig) -> Self {
        Self {
            offset: config.popup_offset,
            default_size: config.popup_default_size,
        }
    }

    /// Where a popup of `opener` at `(x, y)` lands.
    pub fn spawn_position(&self, x: f64, y: f64) -> (f64, f64) {
        (x + self.offset[0], y + self.offset[1])
    }

    pub fn spawn(
        &self,
        canvas: &mut dyn CanvasEngine,
        host: &mut dyn FrameHost,
        opener: ShapeId,
        request: NewWindowRequest,
    ) -> Result<PopupSpawn, PopupError> {
        let window = request.window;
        let Some(parent) = canvas.get_shape(opener) else {
            log::error!("{opener}: popup requested by a missing window, discarding {window:?}");
            host.discard_window(window);
            return Err(PopupError::ParentMissing(opener));
        };

        let (x, y) = self.spawn_position(parent.x, parent.y);
        let url = if request.target_url.trim().is_empty() {
            BLANK_URL.to_string()
        } else {
            request.target_url
        };
        let descriptor = ShapeDescriptor {
            opener: Some(opener),
            ..ShapeDescriptor::at(x, y)
                .with_url(url)
                .with_size(
                    request.width.unwrap_or(self.default_size[0]),
                    request.height.unwrap_or(self.default_size[1]),
                )
        };

        let shape = match canvas.create_shape(descriptor) {
            Ok(shape) => shape,
            Err(source) => {
                log::error!("{opener}: popup shape creation failed: {source}; discarding {window:?}");
                host.discard_window(window);
                return Err(PopupError::ShapeCreationFailed { opener, source });
            }
        };

        let frame = host.create_detached();
        if let Err(source) = host.attach(frame, window) {
            log::error!("{shape}: popup attach failed: {source}; removing shape");
            host.destroy(frame);
            host.discard_window(window);
            if let Err(e) = canvas.delete_shape(shape) {
                log::warn!("{shape}: cleanup after failed attach: {e}");
            }
            return Err(PopupError::AttachFailed { shape, source });
        }

        FocusArbiter::promote(canvas, shape);
        log::info!("{opener}: opened popup {shape} at ({x}, {y})");
        Ok(PopupSpawn { shape, frame })
    }
}
