//! Domain layer: notes, tags, settings and errors.
//!
//! These types are independent of any host integration. Notes and tags are owned by
//! their buckets; the coordinator only keeps loaded copies for ordering and search.
//!
//! # Organization
//!
//! - [`error`]: Error types and result aliases
//! - [`note`]: Note and tag models plus list ordering
//! - [`settings`]: User settings, settings transitions and synced preferences

pub mod error;
pub mod note;
pub mod settings;

pub use error::{NotesyncError, Result};
pub use note::{EntityId, Note, NoteData, Tag};
pub use settings::{LineLength, NoteDisplay, Preferences, Settings, SettingsChange, SortType};
