//! Window chrome commands.

use wv_render::{ChromeButton, ChromeHit};

/// A command issued from a window's chrome or a keyboard shortcut.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ChromeCommand {
    Close,
    Minimize,
    Maximize,
    Reload,
    ToggleDarkMode,
    ToggleFullscreen,
    /// Pointer interaction on the window chrome.
    Focus,
}

impl ChromeCommand {
    pub fn from_button(button: ChromeButton) -> Self {
        match button {
            ChromeButton::Close => Self::Close,
            ChromeButton::Minimize => Self::Minimize,
            ChromeButton::Maximize => Self::Maximize,
            ChromeButton::Reload => Self::Reload,
            ChromeButton::Fullscreen => Self::ToggleFullscreen,
            ChromeButton::DarkMode => Self::ToggleDarkMode,
        }
    }

    /// Command for a pointer-down at a chrome hit. Content hits belong to
    /// the frame and issue nothing.
    pub fn from_hit(hit: ChromeHit) -> Option<Self> {
        match hit {
            ChromeHit::Button(button) => Some(Self::from_button(button)),
            ChromeHit::TitleBar => Some(Self::Focus),
            ChromeHit::Content => None,
        }
    }

    /// Parse a command name as sent by a host UI.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "close" => Some(Self::Close),
            "minimize" => Some(Self::Minimize),
            "maximize" => Some(Self::Maximize),
            "reload" => Some(Self::Reload),
            "dark-mode" | "darkMode" => Some(Self::ToggleDarkMode),
            "fullscreen" => Some(Self::ToggleFullscreen),
            "focus" => Some(Self::Focus),
            _ => None,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Self::Close => "close",
            Self::Minimize => "minimize",
            Self::Maximize => "maximize",
            Self::Reload => "reload",
            Self::ToggleDarkMode => "dark-mode",
            Self::ToggleFullscreen => "fullscreen",
            Self::Focus => "focus",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_round_trip() {
        for cmd in [
            ChromeCommand::Close,
            ChromeCommand::Minimize,
            ChromeCommand::Maximize,
            ChromeCommand::Reload,
            ChromeCommand::ToggleDarkMode,
            ChromeCommand::ToggleFullscreen,
            ChromeCommand::Focus,
        ] {
            assert_eq!(ChromeCommand::from_name(cmd.name()), Some(cmd));
        }
        assert_eq!(ChromeCommand::from_name("explode"), None);
    }

    #[test]
    fn title_bar_focuses_and_content_is_ignored() {
        assert_eq!(
            ChromeCommand::from_hit(ChromeHit::TitleBar),
            Some(ChromeCommand::Focus)
        );
        assert_eq!(
            ChromeCommand::from_hit(ChromeHit::Button(ChromeButton::DarkMode)),
            Some(ChromeCommand::ToggleDarkMode)
        );
        assert_eq!(ChromeCommand::from_hit(ChromeHit::Content), None);
    }
}
