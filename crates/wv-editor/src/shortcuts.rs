//! Keyboard shortcut mapping.
//!
//! Maps key + modifier combos to semantic `ShortcutAction`s. Window
//! actions apply to the current selection.
//!
//! | Keys        | Action              |
//! |-------------|---------------------|
//! | ⌘K          | Open omnibox        |
//! | Escape      | Close omnibox       |
//! | ⌘W          | Close window        |
//! | ⌘M          | Minimize / restore  |
//! | ⌘R          | Reload              |
//! | ⌘⇧D         | Toggle dark mode    |
//! | ⌘⇧F         | Toggle fullscreen   |
//! | ⌘⇧M         | Maximize            |

use crate::commands::ChromeCommand;

/// Actions that keyboard shortcuts can trigger.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShortcutAction {
    OpenOmnibox,
    CloseOmnibox,
    /// A chrome command for every selected window.
    Window(ChromeCommand),
}

/// Resolves key events into shortcut actions.
///
/// Uses platform-aware modifier detection: on macOS `meta` is ⌘,
/// on other platforms `ctrl` serves the same role.
pub struct ShortcutMap;

impl ShortcutMap {
    /// Resolve a key event to an action.
    ///
    /// `key` is the `KeyboardEvent.key` value (e.g. `"k"`, `"Escape"`).
    /// Returns `None` if the key combo has no binding.
    pub fn resolve(
        key: &str,
        ctrl: bool,
        shift: bool,
        _alt: bool,
        meta: bool,
    ) -> Option<ShortcutAction> {
        let cmd = ctrl || meta;

        if cmd && shift {
            return match key {
                "d" | "D" => Some(ShortcutAction::Window(ChromeCommand::ToggleDarkMode)),
                "f" | "F" => Some(ShortcutAction::Window(ChromeCommand::ToggleFullscreen)),
                "m" | "M" => Some(ShortcutAction::Window(ChromeCommand::Maximize)),
                _ => None,
            };
        }

        if cmd {
            return match key {
                "k" | "K" => Some(ShortcutAction::OpenOmnibox),
                "w" | "W" => Some(ShortcutAction::Window(ChromeCommand::Close)),
                "m" | "M" => Some(ShortcutAction::Window(ChromeCommand::Minimize)),
                "r" | "R" => Some(ShortcutAction::Window(ChromeCommand::Reload)),
                _ => None,
            };
        }

        match key {
            "Escape" => Some(ShortcutAction::CloseOmnibox),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resolve_omnibox() {
        // Cmd+K
        assert_eq!(
            ShortcutMap::resolve("k", false, false, false, true),
            Some(ShortcutAction::OpenOmnibox)
        );
        // Ctrl+K
        assert_eq!(
            ShortcutMap::resolve("k", true, false, false, false),
            Some(ShortcutAction::OpenOmnibox)
        );
        assert_eq!(
            ShortcutMap::resolve("Escape", false, false, false, false),
            Some(ShortcutAction::CloseOmnibox)
        );
    }

    #[test]
    fn resolve_window_actions() {
        assert_eq!(
            ShortcutMap::resolve("w", false, false, false, true),
            Some(ShortcutAction::Window(ChromeCommand::Close))
        );
        assert_eq!(
            ShortcutMap::resolve("m", false, false, false, true),
            Some(ShortcutAction::Window(ChromeCommand::Minimize))
        );
        // Shift turns minimize into maximize.
        assert_eq!(
            ShortcutMap::resolve("M", false, true, false, true),
            Some(ShortcutAction::Window(ChromeCommand::Maximize))
        );
        assert_eq!(
            ShortcutMap::resolve("D", true, true, false, false),
            Some(ShortcutAction::Window(ChromeCommand::ToggleDarkMode))
        );
    }

    #[test]
    fn unbound_keys_resolve_to_none() {
        assert_eq!(ShortcutMap::resolve("k", false, false, false, false), None);
        assert_eq!(ShortcutMap::resolve("x", false, false, false, true), None);
    }
}
