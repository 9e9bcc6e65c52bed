//! Controller configuration.
//!
//! Every field has a default, so an empty TOML document is a valid config:
//!
//! ```toml
//! popup_offset = [50.0, 50.0]
//! settle_delay_ms = 500
//! persist_observed_title = true
//! ```

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("config parse error: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("invalid config value for `{field}`: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Offset of a popup from the window that opened it.
    pub popup_offset: [f64; 2],
    /// Popup size when the request leaves width or height unset.
    pub popup_default_size: [f64; 2],
    /// Size applied by the Maximize command.
    pub maximize_size: [f64; 2],
    /// Deferred title probe after `ContentLoaded`.
    pub title_probe_delay_ms: u64,
    /// Delay before a finished load's progress fades from 100 to 0.
    pub settle_delay_ms: u64,
    /// Periodic title re-probe after `NavigationFinished`.
    pub title_probe_interval_ms: u64,
    /// Also write a changed observed title into the persisted `title`.
    pub persist_observed_title: bool,
    /// Closing a window also closes the popups it opened.
    pub close_popups_with_opener: bool,
    /// Chrome height; a minimized window collapses to it.
    pub title_bar_height: f64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            popup_offset: [50.0, 50.0],
            popup_default_size: [800.0, 600.0],
            maximize_size: [800.0, 600.0],
            title_probe_delay_ms: 100,
            settle_delay_ms: 500,
            title_probe_interval_ms: 1000,
            persist_observed_title: false,
            close_popups_with_opener: false,
            title_bar_height: 40.0,
        }
    }
}

impl ControllerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        check_size("popup_default_size", self.popup_default_size)?;
        check_size("maximize_size", self.maximize_size)?;
        if !self.popup_offset.iter().all(|v| v.is_finite()) {
            return Err(ConfigError::Invalid {
                field: "popup_offset",
                reason: "offset must be finite".into(),
            });
        }
        if self.title_probe_interval_ms == 0 {
            return Err(ConfigError::Invalid {
                field: "title_probe_interval_ms",
                reason: "interval must be greater than zero".into(),
            });
        }
        if !(self.title_bar_height.is_finite() && self.title_bar_height > 0.0) {
            return Err(ConfigError::Invalid {
                field: "title_bar_height",
                reason: format!("{} is not a positive height", self.title_bar_height),
            });
        }
        Ok(())
    }
}

fn check_size(field: &'static str, [w, h]: [f64; 2]) -> Result<(), ConfigError> {
    if w.is_finite() && h.is_finite() && w > 0.0 && h > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Invalid {
            field,
            reason: format!("{w}x{h} is not a positive size"),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn empty_document_yields_defaults() {
        assert_eq!(
            ControllerConfig::from_toml_str("").unwrap(),
            ControllerConfig::default()
        );
    }

    #[test]
    fn partial_document_overrides_fields() {
        let config = ControllerConfig::from_toml_str(
            "popup_offset = [20.0, 30.0]\npersist_observed_title = true\n",
        )
        .unwrap();
        assert_eq!(config.popup_offset, [20.0, 30.0]);
        assert!(config.persist_observed_title);
        assert_eq!(config.settle_delay_ms, 500);
    }

    #[test]
    fn rejects_invalid_values() {
        assert!(matches!(
            ControllerConfig::from_toml_str("maximize_size = [0.0, 600.0]"),
            Err(ConfigError::Invalid { field: "maximize_size", .. })
        ));
        assert!(matches!(
            ControllerConfig::from_toml_str("title_probe_interval_ms = 0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ControllerConfig::from_toml_str("title_bar_height = -1.0"),
            Err(ConfigError::Invalid { .. })
        ));
        assert!(matches!(
            ControllerConfig::from_toml_str("settle_delay_ms = \"soon\""),
            Err(ConfigError::Parse(_))
        ));
    }
}
