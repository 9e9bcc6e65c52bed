//! Omnibox: quick-create a window from a typed address.
//!
//! Accepted input:
//!
//! | Typed                     | Opens                          |
//! |---------------------------|--------------------------------|
//! | `https://a.test/x`        | as typed                       |
//! | `a.test/x`                | `https://a.test/x`             |
//! | `localhost:3000`          | `http://localhost:3000`        |
//! | `192.168.0.4:8080/admin`  | `http://192.168.0.4:8080/admin`|

use crate::canvas::{CanvasEngine, CanvasError};
use std::net::Ipv4Addr;
use thiserror::Error;
use winnow::ascii::digit1;
use winnow::combinator::{opt, preceded};
use winnow::prelude::*;
use winnow::token::{rest, take_while};
use wv_core::{ShapeDescriptor, ShapeId, validate_url};

/// Where quick-created windows appear.
pub const QUICK_CREATE_POSITION: (f64, f64) = (100.0, 100.0);

#[derive(Debug, Clone, PartialEq, Error)]
pub enum OmniboxError {
    #[error("address is empty")]
    Empty,
    #[error("`{0}` is not an address")]
    Unparseable(String),
    #[error(transparent)]
    Canvas(#[from] CanvasError),
}

#[derive(Debug, Default)]
pub struct Omnibox {
    open: bool,
    input: String,
}

impl Omnibox {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn open(&mut self) {
        self.open = true;
    }

    pub fn close(&mut self) {
        self.open = false;
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    pub fn input(&self) -> &str {
        &self.input
    }

    pub fn set_input(&mut self, input: impl Into<String>) {
        self.input = input.into();
    }

    /// Create a window for the typed address. On success the input is
    /// cleared and the omnibox closes; on failure it stays open as is.
    pub fn submit(&mut self, canvas: &mut dyn CanvasEngine) -> Result<ShapeId, OmniboxError> {
        let url = normalize_address(&self.input)?;
        let (x, y) = QUICK_CREATE_POSITION;
        let id = canvas.create_shape(ShapeDescriptor::at(x, y).with_url(url.as_str()))?;
        log::info!("{id}: opened {url} from the omnibox");
        self.input.clear();
        self.open = false;
        Ok(id)
    }
}

/// Turn typed text into an absolute URL.
pub fn normalize_address(input: &str) -> Result<String, OmniboxError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(OmniboxError::Empty);
    }
    let unparseable = || OmniboxError::Unparseable(trimmed.to_string());

    let mut probe = trimmed;
    if parse_scheme.parse_next(&mut probe).is_ok() || trimmed.starts_with("about:") {
        return validate_url(trimmed).map_err(|_| unparseable());
    }

    let address = parse_bare_address.parse(trimmed).map_err(|_| unparseable())?;
    let local = address.host == "localhost" || address.host.parse::<Ipv4Addr>().is_ok();
    if !local && !address.host.contains('.') {
        return Err(unparseable());
    }
    let scheme = if local { "http" } else { "https" };
    validate_url(&format!("{scheme}://{trimmed}")).map_err(|_| unparseable())
}

fn parse_scheme<'a>(input: &mut &'a str) -> ModalResult<&'a str> {
    let scheme = (
        take_while(1, |c: char| c.is_ascii_alphabetic()),
        take_while(0.., |c: char| {
            c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.')
        }),
    )
        .take()
        .parse_next(input)?;
    "://".parse_next(input)?;
    Ok(scheme)
}

struct BareAddress<'a> {
    host: &'a str,
}

/// `host[:port][/path][?query][#fragment]` with no whitespace.
fn parse_bare_address<'a>(input: &mut &'a str) -> ModalResult<BareAddress<'a>> {
    let host = take_while(1.., |c: char| {
        c.is_ascii_alphanumeric() || c == '-' || c == '.'
    })
    .parse_next(input)?;
    let _port: Option<&str> = opt(preceded(':', digit1)).parse_next(input)?;
    let tail: &str = rest.parse_next(input)?;
    let tail_ok = tail.is_empty()
        || (tail.starts_with(['/', '?', '#']) && !tail.contains(char::is_whitespace));
    if !tail_ok {
        return Err(winnow::error::ErrMode::Backtrack(
            winnow::error::ContextError::new(),
        ));
    }
    Ok(BareAddress { host })
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wv_core::ShapeStore;

    #[test]
    fn keeps_absolute_urls() {
        assert_eq!(
            normalize_address("https://a.test/x?y=1").unwrap(),
            "https://a.test/x?y=1"
        );
        assert_eq!(normalize_address("about:blank").unwrap(), "about:blank");
    }

    #[test]
    fn adds_scheme_to_bare_hosts() {
        assert_eq!(normalize_address("a.test/x").unwrap(), "https://a.test/x");
        assert_eq!(
            normalize_address(" localhost:3000 ").unwrap(),
            "http://localhost:3000"
        );
        assert_eq!(
            normalize_address("192.168.0.4:8080/admin").unwrap(),
            "http://192.168.0.4:8080/admin"
        );
    }

    #[test]
    fn rejects_non_addresses() {
        assert_eq!(normalize_address("  "), Err(OmniboxError::Empty));
        assert!(matches!(
            normalize_address("hello world"),
            Err(OmniboxError::Unparseable(_))
        ));
        assert!(matches!(
            normalize_address("intranet"),
            Err(OmniboxError::Unparseable(_))
        ));
    }

    #[test]
    fn submit_creates_window_and_closes() {
        let mut store = ShapeStore::new();
        let mut omnibox = Omnibox::new();
        omnibox.open();
        omnibox.set_input("b.test");

        let id = omnibox.submit(&mut store).unwrap();
        let shape = store.get(id).unwrap();
        assert_eq!((shape.x, shape.y), (100.0, 100.0));
        assert_eq!(shape.props.url, "https://b.test");
        assert!(!omnibox.is_open());
        assert_eq!(omnibox.input(), "");
    }

    #[test]
    fn empty_submit_keeps_omnibox_open() {
        let mut store = ShapeStore::new();
        let mut omnibox = Omnibox::new();
        omnibox.open();
        assert_eq!(omnibox.submit(&mut store), Err(OmniboxError::Empty));
        assert!(omnibox.is_open());
        assert!(store.is_empty());
    }
}
