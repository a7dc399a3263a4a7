//! Global keyboard shortcuts.
//!
//! | Keys                      | Shortcut            | Precondition            |
//! |---------------------------|---------------------|-------------------------|
//! | `Cmd/Ctrl+Shift+U`        | toggle tag list     | navigation is closed    |
//! | `Cmd/Ctrl+Shift+S`        | focus search field  |                         |
//! | `Cmd/Ctrl+F`              | focus search field  | desktop host            |
//! | `Cmd/Ctrl+Shift+F`        | toggle focus mode   |                         |
//! | `Cmd/Ctrl+Shift+I`        | new note            |                         |
//! | `Cmd/Ctrl+G`              | swallowed           |                         |
//!
//! `Cmd/Ctrl` means exactly one of the two modifiers. Nothing matches while
//! keyboard shortcuts are disabled in settings.

use serde::Deserialize;

/// A key-down event as delivered by the host.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct KeyPress {
    /// Physical key code, e.g. `"KeyU"`.
    pub code: String,
    #[serde(default, rename = "ctrlKey")]
    pub ctrl: bool,
    #[serde(default, rename = "metaKey")]
    pub meta: bool,
    #[serde(default, rename = "shiftKey")]
    pub shift: bool,
}

impl KeyPress {
    /// Exactly one of Ctrl and Meta is held.
    #[must_use]
    pub const fn cmd_or_ctrl(&self) -> bool {
        self.ctrl != self.meta
    }
}

/// What a consumed key press asks for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Shortcut {
    ToggleNavigation,
    FocusSearch,
    ToggleFocusMode,
    NewNote,
    /// Consumed so the host's default behavior does not run, nothing else.
    Swallow,
}

/// State the shortcut table depends on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShortcutContext {
    pub enabled: bool,
    pub navigation_open: bool,
    pub desktop_host: bool,
}

/// Matches a key press. `None` means the event propagates untouched.
#[must_use]
pub fn match_shortcut(key: &KeyPress, ctx: ShortcutContext) -> Option<Shortcut> {
    if !ctx.enabled || !key.cmd_or_ctrl() {
        return None;
    }

    let shortcut = match (key.code.as_str(), key.shift) {
        ("KeyU", true) if !ctx.navigation_open => Shortcut::ToggleNavigation,
        ("KeyS", true) => Shortcut::FocusSearch,
        ("KeyF", false) if ctx.desktop_host => Shortcut::FocusSearch,
        ("KeyF", true) => Shortcut::ToggleFocusMode,
        ("KeyI", true) => Shortcut::NewNote,
        ("KeyG", _) => Shortcut::Swallow,
        _ => return None,
    };
    tracing::debug!(code = %key.code, ?shortcut, "shortcut matched");
    Some(shortcut)
}

#[cfg(test)]
mod tests {
    use super::*;

    const CTX: ShortcutContext = ShortcutContext {
        enabled: true,
        navigation_open: false,
        desktop_host: false,
    };

    fn ctrl(code: &str, shift: bool) -> KeyPress {
        KeyPress {
            code: code.to_string(),
            ctrl: true,
            meta: false,
            shift,
        }
    }

    #[test]
    fn table_matches() {
        assert_eq!(match_shortcut(&ctrl("KeyU", true), CTX), Some(Shortcut::ToggleNavigation));
        assert_eq!(match_shortcut(&ctrl("KeyS", true), CTX), Some(Shortcut::FocusSearch));
        assert_eq!(match_shortcut(&ctrl("KeyF", true), CTX), Some(Shortcut::ToggleFocusMode));
        assert_eq!(match_shortcut(&ctrl("KeyI", true), CTX), Some(Shortcut::NewNote));
        assert_eq!(match_shortcut(&ctrl("KeyG", false), CTX), Some(Shortcut::Swallow));
        assert_eq!(match_shortcut(&ctrl("KeyQ", true), CTX), None);
    }

    #[test]
    fn tag_list_toggle_requires_closed_navigation() {
        let open = ShortcutContext {
            navigation_open: true,
            ..CTX
        };
        assert_eq!(match_shortcut(&ctrl("KeyU", true), open), None);
    }

    #[test]
    fn plain_find_only_on_desktop() {
        assert_eq!(match_shortcut(&ctrl("KeyF", false), CTX), None);
        let desktop = ShortcutContext {
            desktop_host: true,
            ..CTX
        };
        assert_eq!(match_shortcut(&ctrl("KeyF", false), desktop), Some(Shortcut::FocusSearch));
    }

    #[test]
    fn both_modifiers_or_disabled_shortcuts_match_nothing() {
        let both = KeyPress {
            meta: true,
            ..ctrl("KeyI", true)
        };
        assert_eq!(match_shortcut(&both, CTX), None);

        let disabled = ShortcutContext {
            enabled: false,
            ..CTX
        };
        assert_eq!(match_shortcut(&ctrl("KeyI", true), disabled), None);
    }

    #[test]
    fn decodes_dom_field_names() {
        let key: KeyPress =
            serde_json::from_str(r#"{"code":"KeyI","metaKey":true,"shiftKey":true}"#).unwrap();
        assert!(key.cmd_or_ctrl());
        assert!(key.shift);
    }
}
