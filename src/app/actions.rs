//! Side effects requested by the sync bridge and the command dispatcher.
//!
//! Reducers stay pure; anything that touches a bucket, the sync client or the host
//! process is expressed as an [`Action`] and executed by the coordinator. Handlers
//! return a `Vec<Action>` so several effects are queued in order for one input.
//!
//! # Example
//!
//! ```rust
//! use notesync::app::{Action, Event};
//!
//! let actions = vec![
//!     Action::Dispatch(Event::SetConnectionStatus(true)),
//!     Action::ReloadNotes,
//! ];
//! assert_eq!(actions.len(), 2);
//! ```

use crate::app::handler::Event;
use crate::domain::{EntityId, NoteData};

/// Commands executed by the coordinator, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Action {
    /// Reduces an event into the next snapshot.
    Dispatch(Event),

    /// Reads and orders every note from the note bucket, then dispatches
    /// `NotesLoaded`.
    ReloadNotes,

    /// Reads and orders every tag from the tag bucket, then dispatches `TagsLoaded`.
    ReloadTags,

    /// Reads preferences from the preferences bucket, then dispatches
    /// `PreferencesLoaded`.
    LoadPreferences,

    /// Reads the note bucket's unsynced markers and dispatches `SetUnsyncedNoteIds`.
    RecomputeUnsynced,

    /// Touches every loaded note still marked unsynced so the bucket pushes it.
    NudgeUnsynced,

    /// Fetches the authoritative record of the open note and presents it.
    ///
    /// A failed fetch drops the update; `remote_patch` marks the presented copy
    /// with `has_remote_update`.
    FetchOpenNote {
        /// Note that changed in the bucket.
        note_id: EntityId,
        /// Whether the change came from a remote patch rather than a local save.
        remote_patch: bool,
    },

    /// Lets the open note write its local state before the bucket pushes `note_id`.
    CaptureOpenNote {
        /// Note about to be sent over the network.
        note_id: EntityId,
    },

    /// Writes a note payload to the note bucket.
    WriteNote {
        note_id: EntityId,
        data: NoteData,
        /// Push to the server right away instead of waiting for the next sync.
        sync: bool,
    },

    /// Creates an empty note in the note bucket and opens it.
    CreateNoteRecord,

    /// Removes a note from the note bucket permanently.
    RemoveNote { note_id: EntityId },

    /// Re-identifies the analytics client for the current account.
    InitializeAnalytics,

    /// Records a named analytics event.
    RecordAnalytics(&'static str),

    /// Asks the host to build an export archive of all notes.
    ExportArchive,

    /// Asks the host to print the open note.
    PrintNote,
}
