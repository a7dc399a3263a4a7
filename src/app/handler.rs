//! Dispatched transitions and the root reducer.
//!
//! Everything that changes state arrives here as a [`Dispatch`]: an [`Event`] plus
//! optional [`Meta`] computed by whoever dispatched it (search results, the note the
//! list nominates after a deletion). [`reduce`] folds one dispatch into a brand-new
//! [`AppState`] snapshot; the previous snapshot is never touched.
//!
//! # Architecture
//!
//! ```text
//! bucket/client/host/key input → SyncBridge / Command → Dispatch → reduce → AppState
//! ```
//!
//! # Example
//!
//! ```rust
//! use notesync::app::{reduce, AppState, Dispatch, Event};
//! use notesync::app::modes::DialogKind;
//!
//! let state = AppState::default();
//! let next = reduce(&state, &Dispatch::from(Event::ShowDialog(DialogKind::About)));
//! assert_eq!(next.ui.dialogs, vec![DialogKind::About]);
//! assert!(state.ui.dialogs.is_empty());
//! ```

use crate::app::modes::DialogKind;
use crate::app::state::{AppData, ViewState};
use crate::domain::{EntityId, Note, NoteData, Preferences, SettingsChange, Tag};

/// Transitions understood by the reducers.
///
/// Reducers ignore variants that do not concern their slice, so adding a variant
/// never changes the behavior of existing slices.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Event {
    /// Pushes a dialog unless it is already on the stack.
    ShowDialog(DialogKind),
    /// Pops the topmost dialog.
    CloseDialog,

    /// Opens a note only if no note is currently open.
    OpenNote { note_id: EntityId },
    /// Opens the given note unconditionally, caching the record.
    SelectNote { note: Note },
    /// Clears the open note.
    CloseNote,
    /// A new note was created and becomes the editing target.
    CreateNote,

    /// Shows notes of a single tag.
    OpenTag { tag_id: EntityId },
    /// Shows the trash.
    SelectTrash,
    /// Shows all live notes.
    ShowAllNotes,

    ToggleNavigation,
    ToggleNoteList,
    ToggleNoteInfo,
    ToggleRevisions,
    ToggleTagEditing,
    ToggleEditMode,

    /// Sets the search query verbatim.
    Search { query: String },
    /// Asks the rendering layer to focus the search field.
    FocusSearchField,

    /// A note was moved to the trash from position `previous_index` of the list.
    TrashNote { note_id: EntityId, previous_index: usize },
    /// A note was restored from the trash.
    RestoreNote { note_id: EntityId, previous_index: usize },
    /// A trashed note was removed permanently.
    DeleteNoteForever { note_id: EntityId, previous_index: usize },
    /// Every trashed note was removed permanently.
    EmptyTrash,

    /// Replaces the set of notes still waiting to reach the server.
    SetUnsyncedNoteIds(Vec<EntityId>),
    /// Reflects the sync client's connection state.
    SetConnectionStatus(bool),
    /// The sync client delivered a message at the given unix time.
    SyncMessageReceived { at: i64 },

    /// Fresh, ordered note list read from the note bucket.
    NotesLoaded(Vec<Note>),
    /// Fresh, ordered tag list read from the tag bucket.
    TagsLoaded(Vec<Tag>),
    /// Account preferences read from the preferences bucket.
    PreferencesLoaded(Preferences),
    /// A note's payload changed in the bucket.
    RemoteNoteUpdate { note_id: EntityId, data: NoteData },
    /// A local setting changed.
    SettingsChanged(SettingsChange),
}

impl Event {
    /// Whether the event can change which notes the list shows.
    ///
    /// Events that do get fresh search metadata attached before they are reduced.
    #[must_use]
    pub const fn affects_search(&self) -> bool {
        matches!(
            self,
            Self::Search { .. }
                | Self::CreateNote
                | Self::OpenTag { .. }
                | Self::SelectTrash
                | Self::ShowAllNotes
                | Self::NotesLoaded(_)
                | Self::TagsLoaded(_)
                | Self::RemoteNoteUpdate { .. }
                | Self::TrashNote { .. }
                | Self::RestoreNote { .. }
                | Self::DeleteNoteForever { .. }
                | Self::EmptyTrash
        )
    }
}

/// Result of the last search, carried as metadata on the event that produced it.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SearchResults {
    pub note_ids: Vec<EntityId>,
    pub tag_ids: Vec<EntityId>,
}

/// Metadata attached to an event by its dispatcher.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Meta {
    /// Replaces the cached filtered-note and tag-suggestion lists when present.
    pub search_results: Option<SearchResults>,

    /// Note the list nominates to open next (`Some(None)` closes the open note).
    ///
    /// Applied by the opened-note slice to any event it does not handle itself.
    pub next_note_to_open: Option<Option<EntityId>>,
}

/// One event with its metadata, as consumed by [`reduce`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Dispatch {
    pub event: Event,
    pub meta: Meta,
}

impl Dispatch {
    #[must_use]
    pub fn with_meta(event: Event, meta: Meta) -> Self {
        Self { event, meta }
    }
}

impl From<Event> for Dispatch {
    fn from(event: Event) -> Self {
        Self {
            event,
            meta: Meta::default(),
        }
    }
}

/// Complete state snapshot: view state plus loaded application data.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AppState {
    pub ui: ViewState,
    pub data: AppData,
}

/// Folds one dispatch into a new snapshot.
///
/// Both halves are reduced independently from their own previous values.
#[must_use]
pub fn reduce(state: &AppState, dispatch: &Dispatch) -> AppState {
    let _span = tracing::trace_span!("reduce", event = ?dispatch.event).entered();

    AppState {
        ui: state.ui.reduce(dispatch),
        data: state.data.reduce(dispatch),
    }
}
