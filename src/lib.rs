//! Notesync: client-side coordinator for a synced note-taking app.
//!
//! Notesync sits between a set of local record stores ("buckets"), a remote sync
//! client, a host process (window chrome, menus, printing) and the rendering layer.
//! It provides:
//! - A pure view-state machine (dialogs, selection, panels, search, sync status)
//! - A sync event bridge that turns bucket and client events into state transitions,
//!   with coalesced reloads and idle-triggered re-sync of unsynced notes
//! - A command decoder for host application commands and keyboard shortcuts
//! - A coordinator owning subscriptions and the immutable state snapshot

#![allow(clippy::multiple_crate_versions)]

//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │  Host shim (main.rs)                                │  ← Entry point
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Coordinator (coordinator/)                         │  ← Lifecycle, effects
//! │  - Subscription manager                             │
//! │  - Action execution                                 │
//! │  - Host notifications                               │
//! └─────────────────────────────────────────────────────┘
//!         │                    │                    │
//! ┌───────────────┐   ┌───────────────┐   ┌───────────────┐
//! │ Sync (sync/)  │   │ Commands      │   │ App (app/)    │
//! │ - Bridge      │   │ (command/)    │   │ - Events      │
//! │ - Coalescing  │   │ - Decoding    │   │ - Reducers    │
//! │ - Idle detect │   │ - Shortcuts   │   │ - Actions     │
//! └───────────────┘   └───────────────┘   └───────────────┘
//!         │                    │                    │
//! ┌─────────────────────────────────────────────────────┐
//! │  Storage, Domain, Infrastructure, UI view model     │
//! └─────────────────────────────────────────────────────┘
//!                        │
//! ┌─────────────────────────────────────────────────────┐
//! │  Observability (observability/)                     │  ← Optional
//! │  - OpenTelemetry tracing                            │
//! │  - JSON-lines span export with rotation             │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`app`]: View-state machine with event/action model
//! - [`domain`]: Notes, tags, settings and errors
//! - [`storage`]: Bucket contract and the in-memory bucket
//! - [`sync`]: Sync event bridge, coalescing timers, clocks
//! - [`command`]: Host command decoding, keyboard shortcuts, search metadata
//! - [`coordinator`]: The top-level controller
//! - [`ui`]: View model for the rendering layer
//! - [`infrastructure`]: Data directory resolution
//! - [`observability`]: OpenTelemetry tracing
//!
//! # Configuration
//!
//! ```toml
//! coalesce_window_ms = 200
//! coalesce_ceiling_ms = 1000
//! idle_after_ms = 2000
//! desktop_host = true
//! system_theme = "dark"
//! trace_level = "debug"
//! ```
//!
//! # Example
//!
//! ```rust
//! use notesync::coordinator::{Collaborators, Input, RecordingHost};
//! use notesync::domain::{NoteData, Preferences, Tag};
//! use notesync::storage::MemoryBucket;
//! use notesync::sync::{EventChannel, VirtualClock};
//! use notesync::{initialize, Config};
//! use serde_json::json;
//! use std::rc::Rc;
//!
//! let notes = Rc::new(MemoryBucket::<NoteData>::new("note"));
//! notes.seed("n1", NoteData { content: "Hello".into(), ..NoteData::default() });
//!
//! let io = Collaborators {
//!     notes: notes.clone(),
//!     tags: Rc::new(MemoryBucket::<Tag>::new("tag")),
//!     preferences: Rc::new(MemoryBucket::<Preferences>::new("preferences")),
//!     client: Rc::new(EventChannel::default()),
//!     commands: Rc::new(EventChannel::default()),
//!     keyboard: Rc::new(EventChannel::default()),
//!     host: Rc::new(RecordingHost::default()),
//!     clock: Rc::new(VirtualClock::default()),
//! };
//!
//! let mut coordinator = initialize(Config::default(), io);
//! assert_eq!(coordinator.state().data.notes.len(), 1);
//!
//! coordinator.update(Input::Command(json!({ "action": "openNote", "noteId": "n1" })));
//! assert_eq!(coordinator.state().ui.opened_note_id.as_deref(), Some("n1"));
//! ```

pub mod app;
pub mod command;
pub mod coordinator;
pub mod domain;
pub mod infrastructure;
pub mod storage;
pub mod sync;
pub mod ui;

pub mod observability;

pub use app::{reduce, Action, AppState, Dispatch, Event, ViewState};
pub use coordinator::{Collaborators, Coordinator, Input, Update};
pub use domain::{NotesyncError, Result};

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

const DEFAULT_TRACE_MAX_BYTES: u64 = 10 * 1024 * 1024;
const DEFAULT_TRACE_BACKUPS: usize = 3;

/// Runtime configuration.
///
/// Every field has a default, so a config file only needs the keys it changes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Quiet period after the last bucket `update` before the list reloads.
    pub coalesce_window_ms: u64,

    /// Longest a note reload may be deferred under continuous updates.
    pub coalesce_ceiling_ms: Option<u64>,

    /// Same as `coalesce_ceiling_ms` for tag reloads. Unbounded by default.
    pub tag_coalesce_ceiling_ms: Option<u64>,

    /// Sync traffic must pause this long before unsynced notes are nudged.
    pub idle_after_ms: u64,

    /// Running inside the desktop shell; enables `Cmd/Ctrl+F` for search.
    pub desktop_host: bool,

    /// Theme used when the settings say `"system"`.
    pub system_theme: String,

    /// Tracing filter directive, e.g. `"debug"` or `"notesync::sync=trace"`.
    ///
    /// Default: `"info"`
    pub trace_level: Option<String>,

    /// Overrides the data directory for span traces.
    pub data_dir: Option<String>,

    /// Span trace size before rotation.
    pub trace_max_bytes: u64,

    /// Rotated span traces to keep.
    pub trace_backups: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            coalesce_window_ms: 200,
            coalesce_ceiling_ms: Some(1000),
            tag_coalesce_ceiling_ms: None,
            idle_after_ms: 2000,
            desktop_host: false,
            system_theme: "light".to_string(),
            trace_level: None,
            data_dir: None,
            trace_max_bytes: DEFAULT_TRACE_MAX_BYTES,
            trace_backups: DEFAULT_TRACE_BACKUPS,
        }
    }
}

impl Config {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`NotesyncError::Toml`] for malformed documents or mistyped keys.
    ///
    /// # Example
    ///
    /// ```rust
    /// use notesync::Config;
    ///
    /// let config = Config::from_toml_str("idle_after_ms = 500\ndesktop_host = true")?;
    /// assert_eq!(config.idle_after_ms, 500);
    /// assert!(config.desktop_host);
    /// assert_eq!(config.coalesce_window_ms, 200);
    /// # Ok::<(), notesync::NotesyncError>(())
    /// ```
    pub fn from_toml_str(source: &str) -> Result<Self> {
        Ok(toml::from_str(source)?)
    }

    /// Reads and parses a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`NotesyncError::Io`] if the file cannot be read, or
    /// [`NotesyncError::Toml`] if it does not parse.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }

    /// Parses key/value settings handed over by a host.
    ///
    /// Unknown keys are ignored and unparsable values fall back to defaults.
    /// Ceilings accept `"none"` (or an empty value) for "unbounded".
    ///
    /// # Example
    ///
    /// ```rust
    /// use std::collections::BTreeMap;
    /// use notesync::Config;
    ///
    /// let mut map = BTreeMap::new();
    /// map.insert("coalesce_ceiling_ms".to_string(), "none".to_string());
    /// map.insert("idle_after_ms".to_string(), "oops".to_string());
    /// map.insert("desktop_host".to_string(), "true".to_string());
    ///
    /// let config = Config::from_host(&map);
    /// assert_eq!(config.coalesce_ceiling_ms, None);
    /// assert_eq!(config.idle_after_ms, 2000);
    /// assert!(config.desktop_host);
    /// ```
    #[must_use]
    pub fn from_host(config: &BTreeMap<String, String>) -> Self {
        let defaults = Self::default();
        let get = |key: &str| config.get(key).map(|v| v.trim());

        let parse_ceiling = |key: &str, default: Option<u64>| match get(key) {
            Some("" | "none") => None,
            Some(v) => v.parse().ok().or(default),
            None => default,
        };

        Self {
            coalesce_window_ms: get("coalesce_window_ms")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.coalesce_window_ms),
            coalesce_ceiling_ms: parse_ceiling("coalesce_ceiling_ms", defaults.coalesce_ceiling_ms),
            tag_coalesce_ceiling_ms: parse_ceiling(
                "tag_coalesce_ceiling_ms",
                defaults.tag_coalesce_ceiling_ms,
            ),
            idle_after_ms: get("idle_after_ms")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.idle_after_ms),
            desktop_host: get("desktop_host")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.desktop_host),
            system_theme: get("system_theme")
                .filter(|v| !v.is_empty())
                .map_or(defaults.system_theme, String::from),
            trace_level: get("trace_level").map(String::from),
            data_dir: get("data_dir").map(String::from),
            trace_max_bytes: get("trace_max_bytes")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.trace_max_bytes),
            trace_backups: get("trace_backups")
                .and_then(|v| v.parse().ok())
                .unwrap_or(defaults.trace_backups),
        }
    }
}

/// Builds and starts a coordinator.
///
/// Tracing is installed first when `config.trace_level` is set, then the
/// coordinator acquires its listeners and loads preferences, notes and tags.
pub fn initialize(config: Config, io: Collaborators) -> Coordinator {
    if config.trace_level.is_some() {
        observability::init_tracing(&config);
    }
    tracing::debug!("initializing notesync coordinator");

    let mut coordinator = Coordinator::new(config, io);
    coordinator.start();
    coordinator
}
