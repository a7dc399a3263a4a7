//! Decoding of host application commands.
//!
//! The host delivers loosely typed objects such as `{"action": "setSortType",
//! "sortType": "alphabetical"}`. [`Command::decode`] turns them into a closed
//! [`Command`] type at the boundary, so unknown or malformed commands are rejected
//! there and never reach the coordinator.
//!
//! # Routing order
//!
//! First match wins:
//!
//! 1. Reserved actions with fixed semantics (`exportZipArchive`, `printNote`,
//!    `focusSearchField`, `showDialog`, `trashNote`).
//! 2. Validation: the command must be an object with a string `action`.
//! 3. `newNote`.
//! 4. Coordinator actions. Remaining fields become positional arguments in document
//!    order (`{"action": "remoteNoteUpdate", "noteId": "a", "data": {..}}` calls
//!    `remoteNoteUpdate("a", {..})`).
//! 5. Bound operations, which read named fields from the whole command object.
//!
//! # Example
//!
//! ```rust
//! use notesync::command::{Command, CoordinatorAction};
//! use notesync::domain::{SettingsChange, SortType};
//! use serde_json::json;
//!
//! let command = Command::decode(&json!({ "action": "setSortType", "sortType": "alphabetical" }));
//! assert_eq!(
//!     command,
//!     Some(Command::Coordinator(CoordinatorAction::Settings(
//!         SettingsChange::SetSortType(SortType::Alphabetical)
//!     )))
//! );
//! assert_eq!(Command::decode(&json!({ "action": "unknownThing" })), None);
//! ```

use crate::app::modes::DialogKind;
use crate::domain::{
    EntityId, LineLength, Note, NoteData, NoteDisplay, SettingsChange, SortType,
};
use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

/// A validated host command.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Ask the host to export every note.
    ExportArchive,
    /// Ask the host to print the open note.
    PrintNote,
    FocusSearchField,
    ShowDialog(DialogKind),
    /// Trash the open note, if any.
    TrashNote,
    /// Create a note in the note bucket and record the creation.
    NewNote,
    Coordinator(CoordinatorAction),
    Bound(BoundOperation),
}

/// Actions the coordinator exposes directly, invoked with positional arguments.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CoordinatorAction {
    /// A settings change. Sort changes also reload the affected list.
    Settings(SettingsChange),
    CreateNote,
    CloseNote,
    /// Toggles the navigation panel.
    OpenTagList,
    SelectNote(Note),
    LoadTags,
    RemoteNoteUpdate { note_id: EntityId, data: NoteData },
    SetConnectionStatus(bool),
    SetUnsyncedNoteIds(Vec<EntityId>),
}

/// Operations that take the whole command object.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BoundOperation {
    LoadNotes,
    LoadPreferences,
    /// `previous_index` defaults to the note's position in the current list.
    RestoreNote {
        note_id: EntityId,
        previous_index: Option<usize>,
    },
    DeleteNoteForever {
        note_id: EntityId,
        previous_index: Option<usize>,
    },
    EmptyTrash,
    /// `pin` absent toggles the current pin state.
    PinNote { note_id: EntityId, pin: Option<bool> },
    ToggleNoteInfo,
    ToggleRevisions,
    ToggleEditMode,
    ToggleTagEditing,
    Search { query: String },
    SelectTrash,
    ShowAllNotes,
    OpenTag { tag_id: EntityId },
    OpenNote { note_id: EntityId },
}

const COORDINATOR_ACTIONS: &[&str] = &[
    "activateTheme",
    "decreaseFontSize",
    "increaseFontSize",
    "resetFontSize",
    "setLineLength",
    "setNoteDisplay",
    "setAccountName",
    "toggleAutoHideMenuBar",
    "toggleFocusMode",
    "toggleSpellCheck",
    "toggleKeyboardShortcuts",
    "setSortType",
    "toggleSortOrder",
    "toggleSortTagsAlpha",
    "createNote",
    "closeNote",
    "openTagList",
    "selectNote",
    "loadTags",
    "remoteNoteUpdate",
    "setSimperiumConnectionStatus",
    "setUnsyncedNoteIds",
];

const BOUND_OPERATIONS: &[&str] = &[
    "loadNotes",
    "loadPreferences",
    "restoreNote",
    "deleteNoteForever",
    "emptyTrash",
    "pinNote",
    "toggleNoteInfo",
    "toggleRevisions",
    "toggleEditMode",
    "toggleTagEditing",
    "search",
    "selectTrash",
    "showAllNotes",
    "openTag",
    "openNote",
];

impl Command {
    /// Decodes a raw host command. Returns `None` for anything that should be
    /// dropped.
    #[must_use]
    pub fn decode(raw: &Value) -> Option<Self> {
        let action = raw.get("action").and_then(Value::as_str);

        match action {
            Some("exportZipArchive") => return Some(Self::ExportArchive),
            Some("printNote") => return Some(Self::PrintNote),
            Some("focusSearchField") => return Some(Self::FocusSearchField),
            Some("showDialog") => {
                return raw
                    .get("dialog")
                    .and_then(Value::as_str)
                    .and_then(DialogKind::from_name)
                    .map(Self::ShowDialog)
                    .or_else(|| {
                        tracing::debug!(dialog = ?raw.get("dialog"), "unknown dialog, command dropped");
                        None
                    });
            }
            Some("trashNote") => return Some(Self::TrashNote),
            _ => {}
        }

        let (Some(object), Some(action)) = (raw.as_object(), action) else {
            tracing::debug!(command = %raw, "malformed command dropped");
            return None;
        };

        let known = action == "newNote"
            || COORDINATOR_ACTIONS.contains(&action)
            || BOUND_OPERATIONS.contains(&action);
        if !known {
            tracing::debug!(action, "unknown command dropped");
            return None;
        }

        let decoded = if action == "newNote" {
            Some(Self::NewNote)
        } else if COORDINATOR_ACTIONS.contains(&action) {
            let args: Vec<&Value> = object
                .iter()
                .filter(|(key, _)| key.as_str() != "action")
                .map(|(_, value)| value)
                .collect();
            decode_coordinator(action, &args).map(Self::Coordinator)
        } else {
            decode_bound(action, object).map(Self::Bound)
        };

        if decoded.is_none() {
            tracing::debug!(action, "command arguments did not decode, dropped");
        }
        decoded
    }
}

fn arg<T: DeserializeOwned>(args: &[&Value], position: usize) -> Option<T> {
    args.get(position)
        .and_then(|value| serde_json::from_value((*value).clone()).ok())
}

fn decode_coordinator(action: &str, args: &[&Value]) -> Option<CoordinatorAction> {
    use CoordinatorAction as A;
    use SettingsChange as S;

    let action = match action {
        "activateTheme" => A::Settings(S::ActivateTheme(arg(args, 0)?)),
        "decreaseFontSize" => A::Settings(S::DecreaseFontSize),
        "increaseFontSize" => A::Settings(S::IncreaseFontSize),
        "resetFontSize" => A::Settings(S::ResetFontSize),
        "setLineLength" => A::Settings(S::SetLineLength(arg::<LineLength>(args, 0)?)),
        "setNoteDisplay" => A::Settings(S::SetNoteDisplay(arg::<NoteDisplay>(args, 0)?)),
        "setAccountName" => A::Settings(S::SetAccountName(arg(args, 0).unwrap_or_default())),
        "toggleAutoHideMenuBar" => A::Settings(S::ToggleAutoHideMenuBar),
        "toggleFocusMode" => A::Settings(S::ToggleFocusMode),
        "toggleSpellCheck" => A::Settings(S::ToggleSpellCheck),
        "toggleKeyboardShortcuts" => A::Settings(S::ToggleKeyboardShortcuts),
        "setSortType" => A::Settings(S::SetSortType(arg::<SortType>(args, 0)?)),
        "toggleSortOrder" => A::Settings(S::ToggleSortOrder),
        "toggleSortTagsAlpha" => A::Settings(S::ToggleSortTagsAlpha),
        "createNote" => A::CreateNote,
        "closeNote" => A::CloseNote,
        "openTagList" => A::OpenTagList,
        "selectNote" => A::SelectNote(arg(args, 0)?),
        "loadTags" => A::LoadTags,
        "remoteNoteUpdate" => A::RemoteNoteUpdate {
            note_id: arg(args, 0)?,
            data: arg(args, 1)?,
        },
        "setSimperiumConnectionStatus" => A::SetConnectionStatus(arg(args, 0)?),
        "setUnsyncedNoteIds" => A::SetUnsyncedNoteIds(arg(args, 0)?),
        _ => return None,
    };
    Some(action)
}

/// Note id from either `noteId` or a nested `note` object.
fn note_id(object: &Map<String, Value>) -> Option<EntityId> {
    object
        .get("noteId")
        .and_then(Value::as_str)
        .or_else(|| object.get("note")?.get("id")?.as_str())
        .map(String::from)
}

fn previous_index(object: &Map<String, Value>) -> Option<usize> {
    object
        .get("previousIndex")
        .and_then(Value::as_u64)
        .and_then(|i| usize::try_from(i).ok())
}

fn decode_bound(action: &str, object: &Map<String, Value>) -> Option<BoundOperation> {
    use BoundOperation as B;

    let operation = match action {
        "loadNotes" => B::LoadNotes,
        "loadPreferences" => B::LoadPreferences,
        "restoreNote" => B::RestoreNote {
            note_id: note_id(object)?,
            previous_index: previous_index(object),
        },
        "deleteNoteForever" => B::DeleteNoteForever {
            note_id: note_id(object)?,
            previous_index: previous_index(object),
        },
        "emptyTrash" => B::EmptyTrash,
        "pinNote" => B::PinNote {
            note_id: note_id(object)?,
            pin: object.get("pin").and_then(Value::as_bool),
        },
        "toggleNoteInfo" => B::ToggleNoteInfo,
        "toggleRevisions" => B::ToggleRevisions,
        "toggleEditMode" => B::ToggleEditMode,
        "toggleTagEditing" => B::ToggleTagEditing,
        "search" => B::Search {
            query: object
                .get("query")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
        },
        "selectTrash" => B::SelectTrash,
        "showAllNotes" => B::ShowAllNotes,
        "openTag" => B::OpenTag {
            tag_id: object
                .get("tagId")
                .and_then(Value::as_str)
                .or_else(|| object.get("tag")?.get("id")?.as_str())?
                .to_string(),
        },
        "openNote" => B::OpenNote {
            note_id: note_id(object)?,
        },
        _ => return None,
    };
    Some(operation)
}
