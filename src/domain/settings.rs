//! User settings and synced preferences.
//!
//! [`Settings`] are local, per-device choices (theme, font size, sort order...).
//! Every change goes through [`Settings::apply`], a pure transition over a
//! [`SettingsChange`], so the coordinator can detect changes and mirror the new
//! settings to the host process. [`Preferences`] are the account-level values read
//! from the preferences bucket.

use serde::{Deserialize, Serialize};

pub const DEFAULT_FONT_SIZE: u8 = 16;
pub const MIN_FONT_SIZE: u8 = 10;
pub const MAX_FONT_SIZE: u8 = 30;

/// Note list ordering key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum SortType {
    #[default]
    ModificationDate,
    CreationDate,
    Alphabetical,
}

/// Editor column width.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum LineLength {
    Full,
    #[default]
    Narrow,
}

/// Density of the note list rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum NoteDisplay {
    #[default]
    Comfy,
    Condensed,
    Expanded,
}

/// Local user settings mirrored to the host whenever they change.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Settings {
    pub account_name: Option<String>,
    pub auto_hide_menu_bar: bool,
    pub focus_mode_enabled: bool,
    pub font_size: u8,
    pub keyboard_shortcuts: bool,
    pub line_length: LineLength,
    pub note_display: NoteDisplay,
    pub sort_reversed: bool,
    pub sort_tags_alpha: bool,
    pub sort_type: SortType,
    pub spell_check_enabled: bool,
    /// `"light"`, `"dark"` or `"system"`.
    pub theme: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            account_name: None,
            auto_hide_menu_bar: false,
            focus_mode_enabled: false,
            font_size: DEFAULT_FONT_SIZE,
            keyboard_shortcuts: true,
            line_length: LineLength::default(),
            note_display: NoteDisplay::default(),
            sort_reversed: false,
            sort_tags_alpha: false,
            sort_type: SortType::default(),
            spell_check_enabled: true,
            theme: "system".to_string(),
        }
    }
}

/// A single settings transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettingsChange {
    ActivateTheme(String),
    DecreaseFontSize,
    IncreaseFontSize,
    ResetFontSize,
    SetLineLength(LineLength),
    SetNoteDisplay(NoteDisplay),
    SetAccountName(Option<String>),
    SetSortType(SortType),
    ToggleAutoHideMenuBar,
    ToggleFocusMode,
    ToggleKeyboardShortcuts,
    ToggleSortOrder,
    ToggleSortTagsAlpha,
    ToggleSpellCheck,
}

impl Settings {
    /// Returns the settings that result from applying `change`.
    ///
    /// Font size is clamped to `MIN_FONT_SIZE..=MAX_FONT_SIZE`.
    ///
    /// # Example
    ///
    /// ```
    /// use notesync::domain::{Settings, SettingsChange};
    ///
    /// let settings = Settings::default().apply(&SettingsChange::ToggleFocusMode);
    /// assert!(settings.focus_mode_enabled);
    /// ```
    #[must_use]
    pub fn apply(&self, change: &SettingsChange) -> Self {
        let mut next = self.clone();
        match change {
            SettingsChange::ActivateTheme(theme) => next.theme.clone_from(theme),
            SettingsChange::DecreaseFontSize => {
                next.font_size = self.font_size.saturating_sub(1).max(MIN_FONT_SIZE);
            }
            SettingsChange::IncreaseFontSize => {
                next.font_size = self.font_size.saturating_add(1).min(MAX_FONT_SIZE);
            }
            SettingsChange::ResetFontSize => next.font_size = DEFAULT_FONT_SIZE,
            SettingsChange::SetLineLength(length) => next.line_length = *length,
            SettingsChange::SetNoteDisplay(display) => next.note_display = *display,
            SettingsChange::SetAccountName(name) => next.account_name.clone_from(name),
            SettingsChange::SetSortType(sort_type) => next.sort_type = *sort_type,
            SettingsChange::ToggleAutoHideMenuBar => next.auto_hide_menu_bar = !self.auto_hide_menu_bar,
            SettingsChange::ToggleFocusMode => next.focus_mode_enabled = !self.focus_mode_enabled,
            SettingsChange::ToggleKeyboardShortcuts => next.keyboard_shortcuts = !self.keyboard_shortcuts,
            SettingsChange::ToggleSortOrder => next.sort_reversed = !self.sort_reversed,
            SettingsChange::ToggleSortTagsAlpha => next.sort_tags_alpha = !self.sort_tags_alpha,
            SettingsChange::ToggleSpellCheck => next.spell_check_enabled = !self.spell_check_enabled,
        }
        next
    }

    /// Resolves `"system"` to the host's current theme.
    #[must_use]
    pub fn resolved_theme<'a>(&'a self, system_theme: &'a str) -> &'a str {
        if self.theme == "system" {
            system_theme
        } else {
            &self.theme
        }
    }
}

/// Account-level preferences stored in the preferences bucket.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct Preferences {
    pub analytics_enabled: Option<bool>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn font_size_is_clamped() {
        let mut settings = Settings::default();
        for _ in 0..40 {
            settings = settings.apply(&SettingsChange::IncreaseFontSize);
        }
        assert_eq!(settings.font_size, MAX_FONT_SIZE);

        for _ in 0..40 {
            settings = settings.apply(&SettingsChange::DecreaseFontSize);
        }
        assert_eq!(settings.font_size, MIN_FONT_SIZE);

        settings = settings.apply(&SettingsChange::ResetFontSize);
        assert_eq!(settings.font_size, DEFAULT_FONT_SIZE);
    }

    #[test]
    fn apply_leaves_input_untouched() {
        let settings = Settings::default();
        let next = settings.apply(&SettingsChange::ToggleSortOrder);
        assert!(!settings.sort_reversed);
        assert!(next.sort_reversed);
    }

    #[test]
    fn system_theme_resolves_to_host_theme() {
        let settings = Settings::default();
        assert_eq!(settings.resolved_theme("dark"), "dark");

        let light = settings.apply(&SettingsChange::ActivateTheme("light".into()));
        assert_eq!(light.resolved_theme("dark"), "light");
    }

    #[test]
    fn settings_serialize_in_host_shape() {
        let json = serde_json::to_value(Settings::default()).unwrap_or_default();
        assert_eq!(json["fontSize"], 16);
        assert_eq!(json["sortType"], "modificationDate");
        assert_eq!(json["keyboardShortcuts"], true);
    }
}
