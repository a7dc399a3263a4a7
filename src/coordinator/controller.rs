//! The top-level controller.
//!
//! [`Coordinator`] owns the state snapshot, the sync bridge timers and the listener
//! handles. Every external input goes through [`Coordinator::update`]; the bridge,
//! the command decoder and the keyboard table turn it into [`Action`]s, which are
//! executed here in order. Dispatch actions produce a new snapshot each time.
//!
//! # Lifecycle
//!
//! ```text
//! new ──► start ──► update* ──► stop
//!          │                     │
//!          └─ acquire listeners  └─ release listeners (also on drop)
//! ```

use crate::app::{reduce, Action, AppState, Dispatch, Event, Meta};
use crate::command::keyboard::{match_shortcut, KeyPress, Shortcut, ShortcutContext};
use crate::command::search::{search, visible_note_ids};
use crate::command::{BoundOperation, Command, CoordinatorAction};
use crate::coordinator::host::{Host, HostMessage};
use crate::coordinator::subscriptions::{SourceKind, SubscriptionManager};
use crate::domain::note::{sort_notes, sort_tags, PINNED_TAG};
use crate::domain::{
    EntityId, Note, NoteData, NotesyncError, Preferences, SettingsChange, Tag,
};
use crate::storage::Bucket;
use crate::sync::{BucketEvent, ClientEvent, Clock, EventSource, SyncBridge, Topic};
use crate::ui::viewmodel::AppViewModel;
use crate::Config;
use std::rc::Rc;

/// Record id of the account preferences in the preferences bucket.
pub const PREFERENCES_KEY: &str = "preferences-key";

/// Everything the coordinator talks to.
#[derive(Clone)]
pub struct Collaborators {
    pub notes: Rc<dyn Bucket<Record = NoteData>>,
    pub tags: Rc<dyn Bucket<Record = Tag>>,
    pub preferences: Rc<dyn Bucket<Record = Preferences>>,
    /// Remote sync client lifecycle events.
    pub client: Rc<dyn EventSource>,
    /// Host command channel.
    pub commands: Rc<dyn EventSource>,
    /// Global key-down listener.
    pub keyboard: Rc<dyn EventSource>,
    pub host: Rc<dyn Host>,
    pub clock: Rc<dyn Clock>,
}

/// One external input.
#[derive(Debug, Clone, PartialEq)]
pub enum Input {
    Note(BucketEvent<NoteData>),
    Tag(BucketEvent<Tag>),
    Preferences(BucketEvent<Preferences>),
    Client(ClientEvent),
    /// Raw host command object.
    Command(serde_json::Value),
    Key(KeyPress),
    /// Time passed; fire whatever timers are due.
    Tick,
}

/// What one [`Coordinator::update`] call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Update {
    /// Number of dispatches reduced.
    pub dispatched: usize,
    /// Whether the input was consumed (key presses stop propagating).
    pub handled: bool,
}

/// Client-side coordinator of buckets, sync client, host and view state.
pub struct Coordinator {
    config: Config,
    io: Collaborators,
    bridge: SyncBridge,
    subscriptions: SubscriptionManager,
    state: Rc<AppState>,
    running: bool,
}

impl Coordinator {
    #[must_use]
    pub fn new(config: Config, io: Collaborators) -> Self {
        Self {
            bridge: SyncBridge::from_config(&config),
            config,
            io,
            subscriptions: SubscriptionManager::default(),
            state: Rc::new(AppState::default()),
            running: false,
        }
    }

    /// Attaches every listener and loads initial content.
    pub fn start(&mut self) -> Update {
        if self.running {
            return Update::default();
        }
        let _span = tracing::debug_span!("coordinator_start").entered();
        self.running = true;

        let notes = self.io.notes.events();
        let tags = self.io.tags.events();
        let preferences = self.io.preferences.events();
        let subs = &mut self.subscriptions;
        subs.acquire(
            SourceKind::Notes,
            notes,
            &[Topic::Index, Topic::Update, Topic::Remove, Topic::BeforeNetworkChange],
        );
        subs.acquire(SourceKind::Preferences, preferences, &[Topic::Update]);
        subs.acquire(SourceKind::Tags, tags, &[Topic::Index, Topic::Update, Topic::Remove]);
        subs.acquire(
            SourceKind::Client,
            self.io.client.clone(),
            &[
                Topic::Authorized,
                Topic::Unauthorized,
                Topic::Message,
                Topic::Send,
                Topic::Connect,
                Topic::Disconnect,
            ],
        );
        subs.acquire(SourceKind::Commands, self.io.commands.clone(), &[Topic::AppCommand]);
        subs.acquire(SourceKind::Keyboard, self.io.keyboard.clone(), &[Topic::KeyDown]);

        let settings = &self.state.data.settings;
        self.io
            .host
            .send(HostMessage::SetAutoHideMenuBar(settings.auto_hide_menu_bar));
        self.io.host.send(HostMessage::SettingsUpdate(settings.clone()));

        let mut actions = SyncBridge::auth_changed();
        actions.extend([
            Action::LoadPreferences,
            Action::RecordAnalytics("application_opened"),
        ]);
        let dispatched = self.run(actions);
        tracing::debug!(listeners = self.subscriptions.len(), dispatched, "coordinator started");

        Update {
            dispatched,
            handled: true,
        }
    }

    /// Releases every listener. Inputs are ignored afterwards.
    pub fn stop(&mut self) {
        let released = self.subscriptions.release_all();
        self.running = false;
        tracing::debug!(released, "coordinator stopped");
    }

    #[must_use]
    pub const fn is_running(&self) -> bool {
        self.running
    }

    /// The current snapshot. Held snapshots never change.
    #[must_use]
    pub fn snapshot(&self) -> Rc<AppState> {
        Rc::clone(&self.state)
    }

    #[must_use]
    pub fn state(&self) -> &AppState {
        &self.state
    }

    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Derived view model for the rendering layer.
    #[must_use]
    pub fn view_model(&self) -> AppViewModel {
        AppViewModel::from_state(&self.state, &self.config.system_theme)
    }

    /// Earliest time a [`Input::Tick`] has work to do.
    #[must_use]
    pub fn next_deadline(&self) -> Option<std::time::Duration> {
        self.bridge.next_deadline()
    }

    /// Single entry point for external inputs.
    pub fn update(&mut self, input: Input) -> Update {
        if !self.running {
            tracing::debug!(?input, "coordinator not running, input ignored");
            return Update::default();
        }

        let now = self.io.clock.now();
        let (actions, handled) = match input {
            Input::Note(event) => {
                if !self.listening(SourceKind::Notes, event.topic()) {
                    return Update::default();
                }
                let opened = self.state.ui.opened_note_id.clone();
                (self.bridge.on_note_event(&event, opened.as_deref(), now), true)
            }
            Input::Tag(event) => {
                if !self.listening(SourceKind::Tags, event.topic()) {
                    return Update::default();
                }
                (self.bridge.on_tag_event(&event, now), true)
            }
            Input::Preferences(event) => {
                if !self.listening(SourceKind::Preferences, event.topic()) {
                    return Update::default();
                }
                (self.bridge.on_preferences_event(&event), true)
            }
            Input::Client(event) => {
                if !self.listening(SourceKind::Client, event.topic()) {
                    return Update::default();
                }
                let unix_now = chrono::Utc::now().timestamp();
                (self.bridge.on_client_event(&event, now, unix_now), true)
            }
            Input::Command(raw) => {
                if !self.listening(SourceKind::Commands, Topic::AppCommand) {
                    return Update::default();
                }
                match Command::decode(&raw) {
                    Some(command) => (self.command_actions(command), true),
                    None => (Vec::new(), false),
                }
            }
            Input::Key(key) => {
                if !self.listening(SourceKind::Keyboard, Topic::KeyDown) {
                    return Update::default();
                }
                let ctx = ShortcutContext {
                    enabled: self.state.data.settings.keyboard_shortcuts,
                    navigation_open: self.state.ui.show_navigation,
                    desktop_host: self.config.desktop_host,
                };
                match match_shortcut(&key, ctx) {
                    Some(shortcut) => (shortcut_actions(shortcut), true),
                    None => (Vec::new(), false),
                }
            }
            Input::Tick => (self.bridge.tick(now), false),
        };

        Update {
            dispatched: self.run(actions),
            handled,
        }
    }

    /// Saves new content for the open note.
    ///
    /// The edited copy is presented right away; the bucket write follows, and with
    /// `sync` the note is pushed immediately.
    pub fn update_content(&mut self, content: &str, sync: bool) -> Update {
        let Some(note) = self.state.ui.opened_note(&self.state.data.notes).cloned() else {
            tracing::debug!("no open note, content update ignored");
            return Update::default();
        };

        let mut edited = note;
        edited.data.content = content.to_string();
        edited.data.modification_date = chrono::Utc::now().timestamp();

        let actions = vec![
            Action::Dispatch(Event::SelectNote { note: edited.clone() }),
            Action::WriteNote {
                note_id: edited.id,
                data: edited.data,
                sync,
            },
        ];
        Update {
            dispatched: self.run(actions),
            handled: true,
        }
    }

    fn listening(&self, kind: SourceKind, topic: Topic) -> bool {
        let held = self.subscriptions.holds(kind, topic);
        if !held {
            tracing::debug!(?kind, ?topic, "no listener held, input ignored");
        }
        held
    }

    fn command_actions(&self, command: Command) -> Vec<Action> {
        tracing::debug!(?command, "command");
        match command {
            Command::ExportArchive => vec![Action::ExportArchive],
            Command::PrintNote => vec![Action::PrintNote],
            Command::FocusSearchField => vec![Action::Dispatch(Event::FocusSearchField)],
            Command::ShowDialog(dialog) => vec![Action::Dispatch(Event::ShowDialog(dialog))],
            Command::TrashNote => self.trash_open_note(),
            Command::NewNote => vec![
                Action::CreateNoteRecord,
                Action::RecordAnalytics("list_note_created"),
            ],
            Command::Coordinator(action) => coordinator_actions(action),
            Command::Bound(operation) => self.bound_actions(operation),
        }
    }

    fn trash_open_note(&self) -> Vec<Action> {
        let data = &self.state.data;
        let Some(note) = self.state.ui.opened_note(&data.notes) else {
            tracing::debug!("no open note, trash ignored");
            return Vec::new();
        };

        let previous_index = data.note_index(&note.id).unwrap_or(0);
        let mut trashed = note.data.clone();
        trashed.deleted = true;
        vec![
            Action::WriteNote {
                note_id: note.id.clone(),
                data: trashed,
                sync: true,
            },
            Action::Dispatch(Event::TrashNote {
                note_id: note.id.clone(),
                previous_index,
            }),
        ]
    }

    fn loaded_note(&self, note_id: &str) -> Option<&Note> {
        let note = self.state.data.notes.iter().find(|n| n.id == note_id);
        if note.is_none() {
            tracing::debug!(note_id, "note not loaded, operation dropped");
        }
        note
    }

    fn bound_actions(&self, operation: BoundOperation) -> Vec<Action> {
        match operation {
            BoundOperation::LoadNotes => vec![Action::ReloadNotes],
            BoundOperation::LoadPreferences => vec![Action::LoadPreferences],
            BoundOperation::RestoreNote {
                note_id,
                previous_index,
            } => {
                let Some(note) = self.loaded_note(&note_id) else {
                    return Vec::new();
                };
                let previous_index = previous_index
                    .or_else(|| self.state.data.note_index(&note_id))
                    .unwrap_or(0);
                let mut restored = note.data.clone();
                restored.deleted = false;
                vec![
                    Action::WriteNote {
                        note_id: note_id.clone(),
                        data: restored,
                        sync: true,
                    },
                    Action::Dispatch(Event::RestoreNote {
                        note_id,
                        previous_index,
                    }),
                ]
            }
            BoundOperation::DeleteNoteForever {
                note_id,
                previous_index,
            } => {
                if self.loaded_note(&note_id).is_none() {
                    return Vec::new();
                }
                let previous_index = previous_index
                    .or_else(|| self.state.data.note_index(&note_id))
                    .unwrap_or(0);
                vec![
                    Action::RemoveNote {
                        note_id: note_id.clone(),
                    },
                    Action::Dispatch(Event::DeleteNoteForever {
                        note_id,
                        previous_index,
                    }),
                ]
            }
            BoundOperation::EmptyTrash => {
                let mut actions: Vec<Action> = self
                    .state
                    .data
                    .notes
                    .iter()
                    .filter(|note| note.is_deleted())
                    .map(|note| Action::RemoveNote {
                        note_id: note.id.clone(),
                    })
                    .collect();
                actions.push(Action::Dispatch(Event::EmptyTrash));
                actions
            }
            BoundOperation::PinNote { note_id, pin } => {
                let Some(note) = self.loaded_note(&note_id) else {
                    return Vec::new();
                };
                let pin = pin.unwrap_or(!note.is_pinned());
                let mut data = note.data.clone();
                data.system_tags.retain(|tag| tag != PINNED_TAG);
                if pin {
                    data.system_tags.push(PINNED_TAG.to_string());
                }
                vec![
                    Action::WriteNote {
                        note_id,
                        data,
                        sync: true,
                    },
                    Action::ReloadNotes,
                ]
            }
            BoundOperation::ToggleNoteInfo => vec![Action::Dispatch(Event::ToggleNoteInfo)],
            BoundOperation::ToggleRevisions => vec![Action::Dispatch(Event::ToggleRevisions)],
            BoundOperation::ToggleEditMode => vec![Action::Dispatch(Event::ToggleEditMode)],
            BoundOperation::ToggleTagEditing => vec![Action::Dispatch(Event::ToggleTagEditing)],
            BoundOperation::Search { query } => vec![Action::Dispatch(Event::Search { query })],
            BoundOperation::SelectTrash => vec![Action::Dispatch(Event::SelectTrash)],
            BoundOperation::ShowAllNotes => vec![Action::Dispatch(Event::ShowAllNotes)],
            BoundOperation::OpenTag { tag_id } => vec![Action::Dispatch(Event::OpenTag { tag_id })],
            BoundOperation::OpenNote { note_id } => {
                vec![Action::Dispatch(Event::OpenNote { note_id })]
            }
        }
    }

    /// Executes actions in order. Returns the number of dispatches.
    fn run(&mut self, actions: Vec<Action>) -> usize {
        actions.into_iter().map(|action| self.execute(action)).sum()
    }

    fn execute(&mut self, action: Action) -> usize {
        match action {
            Action::Dispatch(event) => {
                self.dispatch(event);
                1
            }
            Action::ReloadNotes => match self.io.notes.all() {
                Ok(records) => {
                    let mut notes: Vec<Note> = records
                        .into_iter()
                        .map(|(id, data)| Note::new(id, data))
                        .collect();
                    let settings = &self.state.data.settings;
                    sort_notes(&mut notes, settings.sort_type, settings.sort_reversed);
                    self.dispatch(Event::NotesLoaded(notes));
                    1
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load notes");
                    0
                }
            },
            Action::ReloadTags => match self.io.tags.all() {
                Ok(records) => {
                    let mut tags: Vec<Tag> = records
                        .into_iter()
                        .map(|(id, tag)| Tag { id, ..tag })
                        .collect();
                    sort_tags(&mut tags, self.state.data.settings.sort_tags_alpha);
                    self.dispatch(Event::TagsLoaded(tags));
                    1
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load tags");
                    0
                }
            },
            Action::LoadPreferences => match self.io.preferences.get(PREFERENCES_KEY) {
                Ok(preferences) => {
                    self.dispatch(Event::PreferencesLoaded(preferences));
                    1
                }
                Err(NotesyncError::NotFound(_)) => {
                    self.dispatch(Event::PreferencesLoaded(Preferences::default()));
                    1
                }
                Err(e) => {
                    tracing::warn!(error = %e, "failed to load preferences");
                    0
                }
            },
            Action::RecomputeUnsynced => {
                let unsynced = self.io.notes.unsynced_ids();
                self.dispatch(Event::SetUnsyncedNoteIds(unsynced));
                1
            }
            Action::NudgeUnsynced => {
                self.nudge_unsynced();
                0
            }
            Action::FetchOpenNote {
                note_id,
                remote_patch,
            } => self.fetch_open_note(note_id, remote_patch),
            Action::CaptureOpenNote { note_id } => {
                self.capture_open_note(&note_id);
                0
            }
            Action::WriteNote {
                note_id,
                data,
                sync,
            } => {
                if let Err(e) = self.io.notes.update(&note_id, data, sync) {
                    tracing::warn!(note_id = %note_id, error = %e, "note write failed");
                } else if sync {
                    if let Err(e) = self.io.notes.touch(&note_id) {
                        tracing::warn!(note_id = %note_id, error = %e, "note push failed");
                    }
                }
                0
            }
            Action::CreateNoteRecord => self.create_note(),
            Action::RemoveNote { note_id } => {
                if let Err(e) = self.io.notes.remove(&note_id) {
                    tracing::warn!(note_id = %note_id, error = %e, "note removal failed");
                }
                0
            }
            Action::InitializeAnalytics => {
                self.io.host.send(HostMessage::AnalyticsInitialize {
                    account_name: self.state.data.settings.account_name.clone(),
                });
                0
            }
            Action::RecordAnalytics(name) => {
                if self.state.data.preferences.analytics_enabled == Some(false) {
                    tracing::trace!(name, "analytics disabled, event skipped");
                } else {
                    self.io.host.send(HostMessage::AnalyticsEvent {
                        name: name.to_string(),
                    });
                }
                0
            }
            Action::ExportArchive => {
                self.io.host.send(HostMessage::ExportArchive);
                0
            }
            Action::PrintNote => {
                self.io.host.send(HostMessage::PrintNote {
                    note_id: self.state.ui.opened_note_id.clone(),
                });
                0
            }
        }
    }

    /// Reduces one event into a new snapshot, attaching metadata first.
    fn dispatch(&mut self, event: Event) {
        let _span = tracing::debug_span!("dispatch", event = ?event).entered();
        let meta = self.meta_for(&event);
        let next = reduce(&self.state, &Dispatch::with_meta(event, meta));

        if next.data.settings != self.state.data.settings {
            self.io
                .host
                .send(HostMessage::SettingsUpdate(next.data.settings.clone()));
        }
        self.state = Rc::new(next);
    }

    /// Search results for events that change the list, and the replacement note
    /// when the open note leaves the list.
    fn meta_for(&self, event: &Event) -> Meta {
        if !event.affects_search() {
            return Meta::default();
        }

        let preview = reduce(&self.state, &Dispatch::from(event.clone()));
        let (notes, tags, ui) = (&preview.data.notes, &preview.data.tags, &preview.ui);
        let mut meta = Meta {
            search_results: Some(search(notes, tags, &ui.list_mode, &ui.search_query)),
            next_note_to_open: None,
        };

        if let Event::TrashNote {
            note_id,
            previous_index,
        }
        | Event::RestoreNote {
            note_id,
            previous_index,
        }
        | Event::DeleteNoteForever {
            note_id,
            previous_index,
        } = event
        {
            if self.state.ui.opened_note_id.as_ref() == Some(note_id) {
                // the slot is the note's row in the list the user sees, not its
                // position among all notes
                let (data, current) = (&self.state.data, &self.state.ui);
                let slot = visible_note_ids(
                    &data.notes,
                    &data.tags,
                    &current.list_mode,
                    &current.search_query,
                )
                .iter()
                .position(|id| id == note_id)
                .unwrap_or(*previous_index);

                let visible = visible_note_ids(notes, tags, &ui.list_mode, &ui.search_query);
                let next = visible
                    .len()
                    .checked_sub(1)
                    .map(|last| visible[slot.min(last)].clone());
                tracing::debug!(next = ?next, "nominating next note");
                meta.next_note_to_open = Some(next);
            }
        }
        meta
    }

    fn fetch_open_note(&mut self, note_id: EntityId, remote_patch: bool) -> usize {
        match self.io.notes.get(&note_id) {
            Ok(data) => {
                if self.state.ui.opened_note_id.as_deref() != Some(note_id.as_str()) {
                    tracing::debug!(note_id = %note_id, "note no longer open, fetch discarded");
                    return 0;
                }
                let mut note = Note::new(note_id, data);
                note.has_remote_update = remote_patch;
                self.dispatch(Event::SelectNote { note });
                1
            }
            Err(e) => {
                tracing::debug!(note_id = %note_id, error = %e, "open note fetch failed, update dropped");
                0
            }
        }
    }

    /// Writes the cached open-note copy back before the bucket pushes it.
    fn capture_open_note(&self, note_id: &str) {
        let Some(cached) = self
            .state
            .ui
            .selected_note
            .as_ref()
            .filter(|note| self.state.ui.opened_note_id.as_deref() == Some(note.id.as_str()))
            .filter(|note| note.id == note_id)
        else {
            return;
        };

        let stored = self.io.notes.get(note_id).ok();
        if stored.as_ref() == Some(&cached.data) {
            return;
        }
        tracing::debug!(note_id, "capturing open note before push");
        if let Err(e) = self.io.notes.update(note_id, cached.data.clone(), false) {
            tracing::warn!(note_id, error = %e, "open note capture failed");
        }
    }

    fn nudge_unsynced(&self) {
        if !self.state.ui.sync_connected {
            tracing::debug!("offline, nudge skipped");
            return;
        }

        let unsynced = self.io.notes.unsynced_ids();
        let mut nudged = 0usize;
        for note in self
            .state
            .data
            .notes
            .iter()
            .filter(|note| unsynced.contains(&note.id))
        {
            match self.io.notes.touch(&note.id) {
                Ok(()) => nudged += 1,
                Err(e) => tracing::debug!(note_id = %note.id, error = %e, "nudge failed"),
            }
        }
        tracing::debug!(nudged, "unsynced notes nudged");
    }

    fn create_note(&mut self) -> usize {
        let data = NoteData::new_now();
        match self.io.notes.add(data.clone()) {
            Ok(id) => {
                tracing::debug!(note_id = %id, "note created");
                self.run(vec![
                    Action::ReloadNotes,
                    Action::Dispatch(Event::CreateNote),
                    Action::Dispatch(Event::SelectNote {
                        note: Note::new(id, data),
                    }),
                ])
            }
            Err(e) => {
                tracing::warn!(error = %e, "note creation failed");
                0
            }
        }
    }
}

impl Drop for Coordinator {
    fn drop(&mut self) {
        if self.running {
            self.stop();
        }
    }
}

fn coordinator_actions(action: CoordinatorAction) -> Vec<Action> {
    match action {
        CoordinatorAction::Settings(change) => {
            let follow_up = match change {
                SettingsChange::SetSortType(_) | SettingsChange::ToggleSortOrder => {
                    Some(Action::ReloadNotes)
                }
                SettingsChange::ToggleSortTagsAlpha => Some(Action::ReloadTags),
                _ => None,
            };
            std::iter::once(Action::Dispatch(Event::SettingsChanged(change)))
                .chain(follow_up)
                .collect()
        }
        CoordinatorAction::CreateNote => vec![Action::Dispatch(Event::CreateNote)],
        CoordinatorAction::CloseNote => vec![Action::Dispatch(Event::CloseNote)],
        CoordinatorAction::OpenTagList => vec![Action::Dispatch(Event::ToggleNavigation)],
        CoordinatorAction::SelectNote(note) => vec![Action::Dispatch(Event::SelectNote { note })],
        CoordinatorAction::LoadTags => vec![Action::ReloadTags],
        CoordinatorAction::RemoteNoteUpdate { note_id, data } => {
            vec![Action::Dispatch(Event::RemoteNoteUpdate { note_id, data })]
        }
        CoordinatorAction::SetConnectionStatus(connected) => {
            vec![Action::Dispatch(Event::SetConnectionStatus(connected))]
        }
        CoordinatorAction::SetUnsyncedNoteIds(ids) => {
            vec![Action::Dispatch(Event::SetUnsyncedNoteIds(ids))]
        }
    }
}

fn shortcut_actions(shortcut: Shortcut) -> Vec<Action> {
    match shortcut {
        Shortcut::ToggleNavigation => vec![Action::Dispatch(Event::ToggleNavigation)],
        Shortcut::FocusSearch => vec![Action::Dispatch(Event::FocusSearchField)],
        Shortcut::ToggleFocusMode => vec![Action::Dispatch(Event::SettingsChanged(
            SettingsChange::ToggleFocusMode,
        ))],
        Shortcut::NewNote => vec![
            Action::CreateNoteRecord,
            Action::RecordAnalytics("list_note_created"),
        ],
        Shortcut::Swallow => Vec::new(),
    }
}
