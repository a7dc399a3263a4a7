//! List mode and dialog kinds.
//!
//! The note list shows exactly one of: every live note, the trash, or the notes of
//! a single tag. Keeping that choice in one enum makes "trash is shown" and "a tag
//! is open" mutually exclusive by construction instead of by convention between
//! two independent flags.
//!
//! # Example
//!
//! ```rust
//! use notesync::app::modes::{DialogKind, ListMode};
//!
//! let mode = ListMode::Tag("work".to_string());
//! assert_eq!(mode.opened_tag_id(), Some("work"));
//! assert!(!mode.is_trash());
//! assert_eq!(DialogKind::from_name("SETTINGS"), Some(DialogKind::Settings));
//! ```

use crate::domain::EntityId;
use serde::{Deserialize, Serialize};

/// Which collection the note list is showing.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "mode", content = "tagId")]
pub enum ListMode {
    /// All notes that are not in the trash.
    #[default]
    AllNotes,

    /// Trashed notes only.
    Trash,

    /// Live notes carrying the given tag.
    Tag(EntityId),
}

impl ListMode {
    #[must_use]
    pub const fn is_trash(&self) -> bool {
        matches!(self, Self::Trash)
    }

    #[must_use]
    pub fn opened_tag_id(&self) -> Option<&str> {
        match self {
            Self::Tag(id) => Some(id),
            Self::AllNotes | Self::Trash => None,
        }
    }
}

/// Modal overlays that can sit on the dialog stack.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING-KEBAB-CASE")]
pub enum DialogKind {
    About,
    BetaWarning,
    CloseWindowConfirmation,
    Import,
    Keybindings,
    LogoutConfirmation,
    Settings,
    Share,
    TrashTagConfirmation,
}

impl DialogKind {
    /// Parses the host's wire name (e.g. `"SETTINGS"`, `"LOGOUT-CONFIRMATION"`).
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        serde_json::from_value(serde_json::Value::String(name.to_string())).ok()
    }
}
