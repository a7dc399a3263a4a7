//! Line-oriented host shim.
//!
//! Runs a coordinator against in-memory buckets and drives it from JSON lines on
//! stdin, which makes the whole event flow scriptable:
//!
//! ```text
//! stdin (JSON lines) ──► Shell ──► Coordinator ──► host messages ─┐
//!                          ▲            │                         ├─► stdout
//!                          └─ bucket outboxes ◄─┘   view model ───┘
//! ```
//!
//! # Usage
//!
//! ```text
//! notesync [config.toml] < script.jsonl
//! ```
//!
//! # Input lines
//!
//! - `{"kind": "command", "command": {"action": "newNote"}}`
//! - `{"kind": "key", "code": "KeyI", "ctrlKey": true, "shiftKey": true}`
//! - `{"kind": "client", "event": "connect"}` (any sync client event)
//! - `{"kind": "remoteNote", "id": "n1", "note": {...}, "patch": {...}}`
//! - `{"kind": "localNote", "id": "n1", "note": {...}}`
//! - `{"kind": "removeNote", "id": "n1"}`
//! - `{"kind": "remoteTag", "id": "t1", "name": "work"}`
//! - `{"kind": "preferences", "preferences": {"analyticsEnabled": false}}`
//! - `{"kind": "acknowledge", "id": "n1"}` (server accepted a note)
//! - `{"kind": "reindex"}`
//! - `{"kind": "edit", "content": "...", "sync": true}` (edit the open note)
//! - `{"kind": "advance", "ms": 250}` (move the clock, then fire due timers)
//!
//! # Output lines
//!
//! `{"host": <message>}` for each host notification, then one `{"view": <view model>}`
//! per input line.

#![allow(clippy::multiple_crate_versions)]

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::io::{BufRead, Write};
use std::process::ExitCode;
use std::rc::Rc;
use std::time::Duration;

use notesync::command::KeyPress;
use notesync::coordinator::{Collaborators, HostMessage, Input, RecordingHost, PREFERENCES_KEY};
use notesync::domain::{NoteData, Preferences, Tag};
use notesync::storage::{Bucket, MemoryBucket};
use notesync::sync::{ClientEvent, EventChannel, VirtualClock};
use notesync::ui::AppViewModel;
use notesync::{Config, Coordinator};

/// Upper bound on outbox pump rounds per input line.
const MAX_PUMP_ROUNDS: usize = 64;

/// One scripted input.
#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
enum ScriptLine {
    Command {
        command: Value,
    },
    Key(KeyPress),
    Client(ClientEvent),
    RemoteNote {
        id: String,
        note: NoteData,
        #[serde(default)]
        patch: Option<Value>,
    },
    LocalNote {
        id: String,
        note: NoteData,
    },
    RemoveNote {
        id: String,
    },
    RemoteTag {
        id: String,
        name: String,
        #[serde(default)]
        index: Option<u32>,
    },
    Preferences {
        preferences: Preferences,
    },
    Acknowledge {
        id: String,
    },
    Reindex,
    Edit {
        content: String,
        #[serde(default)]
        sync: bool,
    },
    Advance {
        ms: u64,
    },
}

/// One output line.
#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
enum OutputLine<'a> {
    Host(&'a HostMessage),
    View(&'a AppViewModel),
}

/// The coordinator plus the concrete collaborators the shim drives.
struct Shell {
    notes: Rc<MemoryBucket<NoteData>>,
    tags: Rc<MemoryBucket<Tag>>,
    preferences: Rc<MemoryBucket<Preferences>>,
    host: Rc<RecordingHost>,
    clock: VirtualClock,
    coordinator: Coordinator,
}

impl Shell {
    fn new(config: Config) -> Self {
        let notes = Rc::new(MemoryBucket::new("note"));
        let tags = Rc::new(MemoryBucket::new("tag"));
        let preferences = Rc::new(MemoryBucket::new("preferences"));
        let host = Rc::new(RecordingHost::default());
        let clock = VirtualClock::default();

        let io = Collaborators {
            notes: notes.clone(),
            tags: tags.clone(),
            preferences: preferences.clone(),
            client: Rc::new(EventChannel::default()),
            commands: Rc::new(EventChannel::default()),
            keyboard: Rc::new(EventChannel::default()),
            host: host.clone(),
            clock: Rc::new(clock.clone()),
        };

        Self {
            coordinator: notesync::initialize(config, io),
            notes,
            tags,
            preferences,
            host,
            clock,
        }
    }

    fn apply(&mut self, line: ScriptLine) -> notesync::Result<()> {
        tracing::debug!(?line, "script line");
        match line {
            ScriptLine::Command { command } => {
                self.coordinator.update(Input::Command(command));
            }
            ScriptLine::Key(key) => {
                let update = self.coordinator.update(Input::Key(key));
                tracing::debug!(handled = update.handled, "key press");
            }
            ScriptLine::Client(event) => {
                self.coordinator.update(Input::Client(event));
            }
            ScriptLine::RemoteNote { id, note, patch } => {
                self.notes
                    .apply_remote(id, note, patch.unwrap_or_else(|| json!({})));
            }
            ScriptLine::LocalNote { id, note } => self.notes.update(&id, note, false)?,
            ScriptLine::RemoveNote { id } => self.notes.remove(&id)?,
            ScriptLine::RemoteTag { id, name, index } => {
                let tag = Tag {
                    id: id.clone(),
                    name,
                    index,
                };
                self.tags.apply_remote(id, tag, json!({}));
            }
            ScriptLine::Preferences { preferences } => {
                self.preferences
                    .apply_remote(PREFERENCES_KEY, preferences, json!({}));
            }
            ScriptLine::Acknowledge { id } => {
                if !self.notes.mark_synced(&id) {
                    tracing::debug!(note_id = %id, "acknowledged unknown note");
                }
            }
            ScriptLine::Reindex => {
                self.notes.reindex();
                self.tags.reindex();
            }
            ScriptLine::Edit { content, sync } => {
                self.coordinator.update_content(&content, sync);
            }
            ScriptLine::Advance { ms } => {
                self.clock.advance(Duration::from_millis(ms));
                self.coordinator.update(Input::Tick);
            }
        }
        self.pump();
        Ok(())
    }

    /// Feeds queued bucket events back into the coordinator until every outbox
    /// is empty.
    fn pump(&mut self) {
        for _ in 0..MAX_PUMP_ROUNDS {
            let notes = self.notes.drain_events();
            let tags = self.tags.drain_events();
            let preferences = self.preferences.drain_events();
            if notes.is_empty() && tags.is_empty() && preferences.is_empty() {
                return;
            }

            for event in notes {
                self.coordinator.update(Input::Note(event));
            }
            for event in tags {
                self.coordinator.update(Input::Tag(event));
            }
            for event in preferences {
                self.coordinator.update(Input::Preferences(event));
            }
        }
        tracing::warn!(rounds = MAX_PUMP_ROUNDS, "bucket events still pending");
    }

    fn emit(&self, out: &mut impl Write) -> notesync::Result<()> {
        for message in self.host.take() {
            serde_json::to_writer(&mut *out, &OutputLine::Host(&message))?;
            writeln!(out)?;
        }
        let view = self.coordinator.view_model();
        serde_json::to_writer(&mut *out, &OutputLine::View(&view))?;
        writeln!(out)?;
        Ok(())
    }
}

fn load_config() -> notesync::Result<Config> {
    std::env::args()
        .nth(1)
        .map_or_else(|| Ok(Config::default()), Config::load)
}

fn run() -> notesync::Result<()> {
    let config = load_config()?;
    let mut shell = Shell::new(config);

    let stdin = std::io::stdin();
    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    shell.emit(&mut out)?;

    for line in stdin.lock().lines() {
        let line = line?;
        if line.trim().is_empty() {
            continue;
        }
        match serde_json::from_str::<ScriptLine>(&line) {
            Ok(parsed) => {
                if let Err(e) = shell.apply(parsed) {
                    tracing::warn!(error = %e, "script line failed");
                    eprintln!("error: {e}");
                }
            }
            Err(e) => {
                tracing::warn!(error = %e, "unparsable script line");
                eprintln!("error: {e}");
            }
        }
        shell.emit(&mut out)?;
        out.flush()?;
    }
    Ok(())
}

fn main() -> ExitCode {
    match run() {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("notesync: {e}");
            ExitCode::FAILURE
        }
    }
}
