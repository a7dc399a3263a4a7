//! View model derived from the state snapshot.
//!
//! The rendering layer is out of scope for this crate; what it gets is a
//! display-ready summary of one [`AppState`] snapshot: the theme class, the open
//! panels, the visible note list with fuzzy-match highlight ranges, the open note
//! and the sync status indicator. View models hold no logic and are recomputed
//! from scratch for every snapshot.
//!
//! # Example
//!
//! ```rust
//! use notesync::app::AppState;
//! use notesync::ui::AppViewModel;
//!
//! let vm = AppViewModel::from_state(&AppState::default(), "dark");
//! assert_eq!(vm.theme_class, "theme-dark");
//! assert!(!vm.navigation_open);
//! assert_eq!(vm.sync.unsynced_count, 0);
//! ```

use crate::app::modes::{DialogKind, ListMode};
use crate::app::AppState;
use crate::domain::{EntityId, LineLength, Note};
use fuzzy_matcher::skim::SkimMatcherV2;
use fuzzy_matcher::FuzzyMatcher;
use serde::Serialize;

/// Longest title shown in the list before truncation.
const MAX_TITLE_CHARS: usize = 64;

/// Everything the rendering layer needs for one frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppViewModel {
    /// `theme-<name>` with `"system"` resolved to the host theme.
    pub theme_class: String,
    pub line_length_full: bool,
    pub font_size: u8,

    pub navigation_open: bool,
    pub note_info_open: bool,
    pub note_list_open: bool,
    pub focus_mode: bool,

    /// Dialogs to render, bottom first.
    pub dialogs: Vec<DialogKind>,

    pub list: NoteListView,
    pub open_note: Option<OpenNoteView>,
    pub sync: SyncStatus,
}

/// The note list column.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListView {
    /// "All Notes", "Trash" or the tag name.
    pub title: String,
    pub search_query: String,
    pub items: Vec<NoteListItem>,
    /// Shown instead of the list when `items` is empty.
    pub empty_message: Option<String>,
}

/// One row of the note list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NoteListItem {
    pub id: EntityId,
    pub title: String,
    pub is_selected: bool,
    pub is_pinned: bool,
    pub is_unsynced: bool,
    /// Byte ranges `(start, end)` of the title matching the search query.
    pub highlight_ranges: Vec<(usize, usize)>,
}

/// The editor pane.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OpenNoteView {
    pub id: EntityId,
    pub title: String,
    pub edit_mode: bool,
    pub editing_tags: bool,
    pub show_revisions: bool,
    /// A remote change arrived while the note was open.
    pub has_remote_update: bool,
}

/// Sync indicator, derived from the connection flag and unsynced markers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncStatus {
    pub connected: bool,
    pub unsynced_count: usize,
    /// RFC 3339 time of the last message from the sync service.
    pub last_synced_at: Option<String>,
}

impl AppViewModel {
    /// Computes the view model for `state`. `system_theme` replaces a `"system"`
    /// theme setting.
    #[must_use]
    pub fn from_state(state: &AppState, system_theme: &str) -> Self {
        let _span = tracing::trace_span!("compute_viewmodel").entered();
        let (ui, data) = (&state.ui, &state.data);
        let settings = &data.settings;

        let open_note = ui.opened_note(&data.notes).map(|note| OpenNoteView {
            id: note.id.clone(),
            title: note.title().to_string(),
            edit_mode: ui.edit_mode,
            editing_tags: ui.editing_tags,
            show_revisions: ui.show_revisions,
            has_remote_update: note.has_remote_update,
        });

        Self {
            theme_class: format!("theme-{}", settings.resolved_theme(system_theme)),
            line_length_full: settings.line_length == LineLength::Full,
            font_size: settings.font_size,
            navigation_open: ui.show_navigation,
            note_info_open: ui.show_note_info,
            note_list_open: ui.show_note_list,
            focus_mode: settings.focus_mode_enabled,
            dialogs: ui.dialogs.clone(),
            list: compute_list(state),
            open_note,
            sync: SyncStatus {
                connected: ui.sync_connected,
                unsynced_count: ui.unsynced_note_ids.len(),
                last_synced_at: data
                    .last_synced_at
                    .and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
                    .map(|at| at.to_rfc3339()),
            },
        }
    }
}

fn compute_list(state: &AppState) -> NoteListView {
    let (ui, data) = (&state.ui, &state.data);

    let title = match &ui.list_mode {
        ListMode::AllNotes => "All Notes".to_string(),
        ListMode::Trash => "Trash".to_string(),
        ListMode::Tag(id) => data
            .tags
            .iter()
            .find(|tag| &tag.id == id)
            .map_or_else(|| id.clone(), |tag| tag.name.clone()),
    };

    let matcher = (!ui.search_query.trim().is_empty()).then(SkimMatcherV2::default);
    let items: Vec<NoteListItem> = ui
        .filtered_note_ids
        .iter()
        .filter_map(|id| data.notes.iter().find(|note| &note.id == id))
        .map(|note| compute_item(state, note, matcher.as_ref()))
        .collect();

    let empty_message = items.is_empty().then(|| {
        if ui.search_query.is_empty() {
            match ui.list_mode {
                ListMode::Trash => "Your trash is empty".to_string(),
                _ => "No notes".to_string(),
            }
        } else {
            "No results".to_string()
        }
    });

    NoteListView {
        title,
        search_query: ui.search_query.clone(),
        items,
        empty_message,
    }
}

fn compute_item(state: &AppState, note: &Note, matcher: Option<&SkimMatcherV2>) -> NoteListItem {
    let full_title = note.title();
    let title = if full_title.chars().count() > MAX_TITLE_CHARS {
        let cut: String = full_title.chars().take(MAX_TITLE_CHARS - 3).collect();
        format!("{cut}...")
    } else {
        full_title.to_string()
    };

    let highlight_ranges = matcher.map_or_else(Vec::new, |m| {
        highlight_ranges(&title, &state.ui.search_query, m)
    });

    NoteListItem {
        id: note.id.clone(),
        is_selected: state.ui.opened_note_id.as_ref() == Some(&note.id),
        is_pinned: note.is_pinned(),
        is_unsynced: state.ui.unsynced_note_ids.contains(&note.id),
        title,
        highlight_ranges,
    }
}

/// Coalesces the matcher's character indices into contiguous byte ranges.
fn highlight_ranges(text: &str, query: &str, matcher: &SkimMatcherV2) -> Vec<(usize, usize)> {
    let Some((_score, indices)) = matcher.fuzzy_indices(text, query.trim()) else {
        return Vec::new();
    };

    let byte_offsets: Vec<(usize, usize)> = text
        .char_indices()
        .map(|(offset, c)| (offset, offset + c.len_utf8()))
        .collect();

    let mut ranges: Vec<(usize, usize)> = Vec::new();
    for (start, end) in indices.iter().filter_map(|&i| byte_offsets.get(i).copied()) {
        match ranges.last_mut() {
            Some(last) if last.1 == start => last.1 = end,
            _ => ranges.push((start, end)),
        }
    }
    ranges
}
