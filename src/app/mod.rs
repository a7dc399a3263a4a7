//! View-state machine: dispatched events, reducers and side-effect actions.
//!
//! The layer follows a unidirectional data flow:
//!
//! ```text
//! Input → SyncBridge / Command → Actions → Dispatch → reduce → AppState snapshot
//!                                    ↓
//!                         bucket / host side effects
//! ```
//!
//! # Modules
//!
//! - [`actions`]: Side effect commands executed by the coordinator
//! - [`handler`]: Dispatched events, metadata and the root reducer
//! - [`modes`]: List mode and dialog kinds
//! - [`state`]: View state slices and loaded application data

pub mod actions;
pub mod handler;
pub mod modes;
pub mod state;

pub use actions::Action;
pub use handler::{reduce, AppState, Dispatch, Event, Meta, SearchResults};
pub use modes::{DialogKind, ListMode};
pub use state::{AppData, ViewState};
