//! Inputs from outside the sync path: host commands and keyboard shortcuts.
//!
//! # Modules
//!
//! - `decode`: raw host command objects into [`Command`]
//! - `keyboard`: the global shortcut table
//! - `search`: filtered note ids and tag suggestions attached to dispatches

pub mod decode;
pub mod keyboard;
pub mod search;

pub use decode::{BoundOperation, Command, CoordinatorAction};
pub use keyboard::{match_shortcut, KeyPress, Shortcut, ShortcutContext};
pub use search::search;
