//! Persisted data model for webview window shapes.
//!
//! A window shape is the record the canvas stores for one embedded browser
//! window: where it sits, how big it is, which URL it shows, and whether it
//! is collapsed to its title bar. Transient browsing state (loading progress,
//! observed title, dark mode) is deliberately absent here; it lives in the
//! editor's per-instance session and is never persisted.

use crate::id::ShapeId;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape type tag the controller registers with the canvas.
pub const SHAPE_TYPE: &str = "webview";

/// Version of the persisted property schema.
pub const SCHEMA_VERSION: u32 = 2;

pub const DEFAULT_URL: &str = "https://example.com";
pub const DEFAULT_WIDTH: f64 = 500.0;
pub const DEFAULT_HEIGHT: f64 = 400.0;

// ─── Errors ──────────────────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Error)]
pub enum SchemaError {
    #[error("window url must not be empty")]
    EmptyUrl,
    #[error("window url `{url}` is not an absolute URL: {reason}")]
    InvalidUrl { url: String, reason: String },
    #[error("window size {width}x{height} must be positive and finite")]
    InvalidSize { width: f64, height: f64 },
}

/// Check that `url` parses as an absolute URL and return it trimmed.
pub fn validate_url(url: &str) -> Result<String, SchemaError> {
    let trimmed = url.trim();
    if trimmed.is_empty() {
        return Err(SchemaError::EmptyUrl);
    }
    // `Url::parse` only accepts absolute URLs, relative input fails here.
    url::Url::parse(trimmed).map_err(|e| SchemaError::InvalidUrl {
        url: trimmed.to_string(),
        reason: e.to_string(),
    })?;
    Ok(trimmed.to_string())
}

pub fn validate_size(width: f64, height: f64) -> Result<(), SchemaError> {
    if width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0 {
        Ok(())
    } else {
        Err(SchemaError::InvalidSize { width, height })
    }
}

// ─── Props ───────────────────────────────────────────────────────────────

/// The persisted properties of a webview shape.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WindowProps {
    pub w: f64,
    pub h: f64,
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub is_minimized: bool,
    /// The window that spawned this one as a popup, if any.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub opener: Option<ShapeId>,
}

impl Default for WindowProps {
    fn default() -> Self {
        Self {
            w: DEFAULT_WIDTH,
            h: DEFAULT_HEIGHT,
            url: DEFAULT_URL.to_string(),
            title: String::new(),
            is_minimized: false,
            opener: None,
        }
    }
}

// ─── Shape ───────────────────────────────────────────────────────────────

/// A webview window as stored by the canvas.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowShape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub props: WindowProps,
}

impl WindowShape {
    /// Check the schema invariants: absolute URL, positive size.
    pub fn validate(&self) -> Result<(), SchemaError> {
        validate_url(&self.props.url)?;
        validate_size(self.props.w, self.props.h)
    }

    /// Full (un-minimized) bounds in canvas coordinates.
    pub fn bounds(&self) -> ShapeBounds {
        ShapeBounds {
            x: self.x,
            y: self.y,
            width: self.props.w,
            height: self.props.h,
        }
    }

    /// Bounds as laid out on the canvas: a minimized window collapses to its
    /// title bar.
    pub fn visible_bounds(&self, title_bar_height: f64) -> ShapeBounds {
        let height = if self.props.is_minimized {
            title_bar_height
        } else {
            self.props.h
        };
        ShapeBounds {
            height,
            ..self.bounds()
        }
    }
}

/// Request to create a new window shape. Unset fields fall back to the
/// schema defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapeDescriptor {
    pub x: f64,
    pub y: f64,
    pub url: Option<String>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub opener: Option<ShapeId>,
}

impl ShapeDescriptor {
    pub fn at(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            ..Default::default()
        }
    }

    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }

    pub fn with_size(mut self, w: f64, h: f64) -> Self {
        self.w = Some(w);
        self.h = Some(h);
        self
    }

    /// Materialize the descriptor into a validated shape with the given id.
    pub fn into_shape(self, id: ShapeId) -> Result<WindowShape, SchemaError> {
        let defaults = WindowProps::default();
        let url = match self.url {
            Some(url) => validate_url(&url)?,
            None => defaults.url,
        };
        let w = self.w.unwrap_or(defaults.w);
        let h = self.h.unwrap_or(defaults.h);
        validate_size(w, h)?;
        Ok(WindowShape {
            id,
            x: self.x,
            y: self.y,
            props: WindowProps {
                w,
                h,
                url,
                opener: self.opener,
                ..defaults
            },
        })
    }
}

// ─── Patches ─────────────────────────────────────────────────────────────

/// A partial update to a window shape. Each `Some` field overwrites the
/// stored value; the store applies a patch atomically.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ShapePatch {
    pub x: Option<f64>,
    pub y: Option<f64>,
    pub w: Option<f64>,
    pub h: Option<f64>,
    pub url: Option<String>,
    pub title: Option<String>,
    pub is_minimized: Option<bool>,
}

impl ShapePatch {
    pub fn minimized(value: bool) -> Self {
        Self {
            is_minimized: Some(value),
            ..Default::default()
        }
    }

    pub fn size(w: f64, h: f64) -> Self {
        Self {
            w: Some(w),
            h: Some(h),
            ..Default::default()
        }
    }

    pub fn title(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Default::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// Apply to `shape`, validating the result first so a rejected patch
    /// leaves the shape untouched.
    pub fn apply(&self, shape: &mut WindowShape) -> Result<(), SchemaError> {
        let mut next = shape.clone();
        if let Some(x) = self.x {
            next.x = x;
        }
        if let Some(y) = self.y {
            next.y = y;
        }
        if let Some(w) = self.w {
            next.props.w = w;
        }
        if let Some(h) = self.h {
            next.props.h = h;
        }
        if let Some(url) = &self.url {
            next.props.url = validate_url(url)?;
        }
        if let Some(title) = &self.title {
            next.props.title = title.clone();
        }
        if let Some(minimized) = self.is_minimized {
            next.props.is_minimized = minimized;
        }
        validate_size(next.props.w, next.props.h)?;
        *shape = next;
        Ok(())
    }
}

// ─── Geometry ────────────────────────────────────────────────────────────

/// Axis-aligned bounding box in canvas coordinates.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ShapeBounds {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn defaults_match_schema() {
        let props = WindowProps::default();
        assert_eq!(props.url, "https://example.com");
        assert_eq!((props.w, props.h), (500.0, 400.0));
        assert_eq!(props.title, "");
        assert!(!props.is_minimized);
    }

    #[test]
    fn descriptor_overrides_defaults() {
        let shape = ShapeDescriptor::at(10.0, 20.0)
            .with_url("https://b.test")
            .with_size(800.0, 600.0)
            .into_shape(ShapeId::intern("shape:desc"))
            .unwrap();
        assert_eq!(shape.props.url, "https://b.test");
        assert_eq!((shape.props.w, shape.props.h), (800.0, 600.0));
        assert_eq!((shape.x, shape.y), (10.0, 20.0));
    }

    #[test]
    fn relative_and_empty_urls_rejected() {
        assert_eq!(validate_url("   "), Err(SchemaError::EmptyUrl));
        assert!(matches!(
            validate_url("example.com/path"),
            Err(SchemaError::InvalidUrl { .. })
        ));
        assert_eq!(validate_url(" https://a.test ").unwrap(), "https://a.test");
    }

    #[test]
    fn rejected_patch_leaves_shape_untouched() {
        let mut shape = ShapeDescriptor::at(0.0, 0.0)
            .into_shape(ShapeId::intern("shape:patch"))
            .unwrap();
        let before = shape.clone();
        let patch = ShapePatch {
            w: Some(-5.0),
            title: Some("ignored".into()),
            ..Default::default()
        };
        assert!(patch.apply(&mut shape).is_err());
        assert_eq!(shape, before);
    }

    #[test]
    fn minimized_window_collapses_to_title_bar() {
        let mut shape = ShapeDescriptor::at(0.0, 0.0)
            .into_shape(ShapeId::intern("shape:min"))
            .unwrap();
        ShapePatch::minimized(true).apply(&mut shape).unwrap();
        let b = shape.visible_bounds(40.0);
        assert_eq!(b.height, 40.0);
        assert_eq!(b.width, 500.0);
        assert_eq!(shape.props.h, 400.0, "persisted height is kept");
    }

    #[test]
    fn opener_is_skipped_when_absent() {
        let json = serde_json::to_string(&WindowProps::default()).unwrap();
        assert!(!json.contains("opener"));
        assert!(json.contains("isMinimized"));
    }
}
