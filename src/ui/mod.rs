//! Presentation layer boundary.
//!
//! Rendering itself lives in the host. This module only derives the display-ready
//! [`AppViewModel`] from a state snapshot:
//!
//! ```text
//! AppState snapshot → AppViewModel::from_state → host renderer
//! ```

pub mod viewmodel;

pub use viewmodel::{AppViewModel, NoteListItem, NoteListView, OpenNoteView, SyncStatus};
