//! View state slices and application data.
//!
//! [`ViewState`] is a record of independent slices. Each slice has its own reducer
//! that sees only its previous value and the dispatched event, never another slice,
//! and every reducer returns a fresh value. [`ViewState::reduce`] recombines the
//! slice results into one snapshot per dispatch.
//!
//! # Slices
//!
//! - **Dialogs**: ordered stack of modal overlays, no duplicates
//! - **Selection**: opened note id, cached open-note copy, list mode (all/trash/tag)
//! - **Panels**: navigation, note list, note info, revisions, tag editing, edit mode
//! - **Search**: query, cached filtered note ids and tag suggestions
//! - **Sync**: unsynced note ids and connection flag
//!
//! [`AppData`] holds what the coordinator loaded from the buckets (ordered notes,
//! tags, preferences) plus local settings; it is reduced by the same dispatches.

use crate::app::handler::{Dispatch, Event};
use crate::app::modes::{DialogKind, ListMode};
use crate::domain::{EntityId, Note, Preferences, Settings, Tag};
use serde::Serialize;
use std::collections::BTreeSet;

/// Snapshot of everything the rendering layer needs to decide what is visible.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ViewState {
    /// Visible modal overlays, oldest first.
    pub dialogs: Vec<DialogKind>,

    pub opened_note_id: Option<EntityId>,

    /// Last record presented through `SelectNote`; may be stale if the open note
    /// was later changed by `OpenNote`/meta nomination, see [`ViewState::opened_note`].
    pub selected_note: Option<Note>,

    pub list_mode: ListMode,

    pub edit_mode: bool,
    pub editing_tags: bool,
    pub show_navigation: bool,
    pub show_note_info: bool,
    pub show_note_list: bool,
    pub show_revisions: bool,

    pub search_query: String,
    /// Bumped on every focus request; the renderer focuses when it changes.
    pub search_focus_requests: u32,
    pub filtered_note_ids: Vec<EntityId>,
    pub tag_suggestion_ids: Vec<EntityId>,

    pub unsynced_note_ids: BTreeSet<EntityId>,
    pub sync_connected: bool,
}

impl Default for ViewState {
    fn default() -> Self {
        Self {
            dialogs: Vec::new(),
            opened_note_id: None,
            selected_note: None,
            list_mode: ListMode::AllNotes,
            edit_mode: true,
            editing_tags: false,
            show_navigation: false,
            show_note_info: false,
            show_note_list: true,
            show_revisions: false,
            search_query: String::new(),
            search_focus_requests: 0,
            filtered_note_ids: Vec::new(),
            tag_suggestion_ids: Vec::new(),
            unsynced_note_ids: BTreeSet::new(),
            sync_connected: false,
        }
    }
}

impl ViewState {
    /// Produces the next snapshot; `self` is left untouched.
    #[must_use]
    pub fn reduce(&self, dispatch: &Dispatch) -> Self {
        Self {
            dialogs: dialogs(&self.dialogs, dispatch),
            opened_note_id: opened_note_id(self.opened_note_id.as_ref(), dispatch),
            selected_note: selected_note(self.selected_note.as_ref(), dispatch),
            list_mode: list_mode(&self.list_mode, dispatch),
            edit_mode: edit_mode(self.edit_mode, dispatch),
            editing_tags: editing_tags(self.editing_tags, dispatch),
            show_navigation: show_navigation(self.show_navigation, dispatch),
            show_note_info: show_note_info(self.show_note_info, dispatch),
            show_note_list: show_note_list(self.show_note_list, dispatch),
            show_revisions: show_revisions(self.show_revisions, dispatch),
            search_query: search_query(&self.search_query, dispatch),
            search_focus_requests: search_focus_requests(self.search_focus_requests, dispatch),
            filtered_note_ids: filtered_note_ids(&self.filtered_note_ids, dispatch),
            tag_suggestion_ids: tag_suggestion_ids(&self.tag_suggestion_ids, dispatch),
            unsynced_note_ids: unsynced_note_ids(&self.unsynced_note_ids, dispatch),
            sync_connected: sync_connected(self.sync_connected, dispatch),
        }
    }

    #[must_use]
    pub fn opened_tag_id(&self) -> Option<&str> {
        self.list_mode.opened_tag_id()
    }

    #[must_use]
    pub const fn show_trash(&self) -> bool {
        self.list_mode.is_trash()
    }

    /// The open note record: the cached copy when it matches the open id, otherwise
    /// the loaded copy from `notes`.
    #[must_use]
    pub fn opened_note<'a>(&'a self, notes: &'a [Note]) -> Option<&'a Note> {
        let id = self.opened_note_id.as_ref()?;
        self.selected_note
            .as_ref()
            .filter(|note| &note.id == id)
            .or_else(|| notes.iter().find(|note| &note.id == id))
    }
}

fn dialogs(state: &[DialogKind], dispatch: &Dispatch) -> Vec<DialogKind> {
    match &dispatch.event {
        Event::CloseDialog => state[..state.len().saturating_sub(1)].to_vec(),
        Event::ShowDialog(dialog) if !state.contains(dialog) => {
            let mut next = state.to_vec();
            next.push(*dialog);
            next
        }
        _ => state.to_vec(),
    }
}

fn opened_note_id(state: Option<&EntityId>, dispatch: &Dispatch) -> Option<EntityId> {
    match &dispatch.event {
        Event::CloseNote => None,
        Event::OpenNote { note_id } => Some(state.unwrap_or(note_id).clone()),
        Event::SelectNote { note } => Some(note.id.clone()),
        _ => dispatch
            .meta
            .next_note_to_open
            .clone()
            .unwrap_or_else(|| state.cloned()),
    }
}

fn selected_note(state: Option<&Note>, dispatch: &Dispatch) -> Option<Note> {
    match &dispatch.event {
        Event::CloseNote => None,
        Event::SelectNote { note } => Some(note.clone()),
        _ => state.cloned(),
    }
}

fn list_mode(state: &ListMode, dispatch: &Dispatch) -> ListMode {
    match &dispatch.event {
        Event::SelectTrash => ListMode::Trash,
        Event::ShowAllNotes => ListMode::AllNotes,
        Event::OpenTag { tag_id } => ListMode::Tag(tag_id.clone()),
        Event::CreateNote if state.is_trash() => ListMode::AllNotes,
        _ => state.clone(),
    }
}

fn edit_mode(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::ToggleEditMode => !state,
        Event::CreateNote => true,
        _ => state,
    }
}

/// Selection changes and note creation close per-note panels.
const fn is_selection_change(event: &Event) -> bool {
    matches!(
        event,
        Event::OpenNote { .. }
            | Event::SelectNote { .. }
            | Event::OpenTag { .. }
            | Event::SelectTrash
            | Event::ShowAllNotes
            | Event::CreateNote
    )
}

fn editing_tags(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::ToggleTagEditing => !state,
        Event::ToggleNavigation => false,
        ref event if is_selection_change(event) => false,
        _ => state,
    }
}

fn show_revisions(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::ToggleRevisions => !state,
        ref event if is_selection_change(event) => false,
        _ => state,
    }
}

fn show_navigation(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::ToggleNavigation => !state,
        Event::OpenNote { .. }
        | Event::OpenTag { .. }
        | Event::SelectTrash
        | Event::ShowAllNotes
        | Event::ShowDialog(DialogKind::Settings) => false,
        _ => state,
    }
}

fn show_note_info(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::ToggleNoteInfo => !state,
        Event::ToggleNavigation => false,
        _ => state,
    }
}

fn show_note_list(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::ToggleNoteList => !state,
        Event::OpenNote { .. } => false,
        _ => state,
    }
}

fn search_query(state: &str, dispatch: &Dispatch) -> String {
    match &dispatch.event {
        Event::CreateNote => String::new(),
        Event::Search { query } => query.clone(),
        _ => state.to_string(),
    }
}

fn search_focus_requests(state: u32, dispatch: &Dispatch) -> u32 {
    match dispatch.event {
        Event::FocusSearchField => state.wrapping_add(1),
        _ => state,
    }
}

fn filtered_note_ids(state: &[EntityId], dispatch: &Dispatch) -> Vec<EntityId> {
    dispatch
        .meta
        .search_results
        .as_ref()
        .map_or_else(|| state.to_vec(), |results| results.note_ids.clone())
}

fn tag_suggestion_ids(state: &[EntityId], dispatch: &Dispatch) -> Vec<EntityId> {
    dispatch
        .meta
        .search_results
        .as_ref()
        .map_or_else(|| state.to_vec(), |results| results.tag_ids.clone())
}

fn unsynced_note_ids(state: &BTreeSet<EntityId>, dispatch: &Dispatch) -> BTreeSet<EntityId> {
    match &dispatch.event {
        Event::SetUnsyncedNoteIds(ids) => ids.iter().cloned().collect(),
        _ => state.clone(),
    }
}

fn sync_connected(state: bool, dispatch: &Dispatch) -> bool {
    match dispatch.event {
        Event::SetConnectionStatus(connected) => connected,
        _ => state,
    }
}

/// Data loaded from the buckets plus local settings.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppData {
    /// Notes in display order (pinned first, then by the sort settings).
    pub notes: Vec<Note>,
    pub tags: Vec<Tag>,
    pub settings: Settings,
    pub preferences: Preferences,
    /// Unix time of the last message received from the sync client.
    pub last_synced_at: Option<i64>,
}

impl AppData {
    #[must_use]
    pub fn reduce(&self, dispatch: &Dispatch) -> Self {
        Self {
            notes: notes(&self.notes, dispatch),
            tags: match &dispatch.event {
                Event::TagsLoaded(tags) => tags.clone(),
                _ => self.tags.clone(),
            },
            settings: match &dispatch.event {
                Event::SettingsChanged(change) => self.settings.apply(change),
                _ => self.settings.clone(),
            },
            preferences: match &dispatch.event {
                Event::PreferencesLoaded(preferences) => preferences.clone(),
                _ => self.preferences.clone(),
            },
            last_synced_at: match dispatch.event {
                Event::SyncMessageReceived { at } => Some(at),
                _ => self.last_synced_at,
            },
        }
    }

    /// Position of a note in the current ordering.
    #[must_use]
    pub fn note_index(&self, note_id: &str) -> Option<usize> {
        self.notes.iter().position(|note| note.id == note_id)
    }
}

/// Keeps the loaded list consistent between a bucket write and the next reload.
fn notes(state: &[Note], dispatch: &Dispatch) -> Vec<Note> {
    let with_deleted = |note_id: &str, deleted: bool| -> Vec<Note> {
        state
            .iter()
            .map(|note| {
                if note.id == note_id {
                    let mut note = note.clone();
                    note.data.deleted = deleted;
                    note
                } else {
                    note.clone()
                }
            })
            .collect()
    };

    match &dispatch.event {
        Event::NotesLoaded(notes) => notes.clone(),
        Event::RemoteNoteUpdate { note_id, data } => state
            .iter()
            .map(|note| {
                if &note.id == note_id {
                    Note::new(note.id.clone(), data.clone())
                } else {
                    note.clone()
                }
            })
            .collect(),
        Event::TrashNote { note_id, .. } => with_deleted(note_id.as_str(), true),
        Event::RestoreNote { note_id, .. } => with_deleted(note_id.as_str(), false),
        Event::DeleteNoteForever { note_id, .. } => {
            state.iter().filter(|note| &note.id != note_id).cloned().collect()
        }
        Event::EmptyTrash => state.iter().filter(|note| !note.is_deleted()).cloned().collect(),
        _ => state.to_vec(),
    }
}
