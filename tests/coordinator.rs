use notesync::app::{DialogKind, ListMode};
use notesync::command::KeyPress;
use notesync::coordinator::{Collaborators, HostMessage, Input, RecordingHost, PREFERENCES_KEY};
use notesync::domain::{NoteData, Preferences, Tag};
use notesync::storage::{Bucket, MemoryBucket};
use notesync::sync::{BucketEvent, ClientEvent, EventChannel, EventSource, Topic, VirtualClock};
use notesync::{Config, Coordinator};
use serde_json::json;
use std::rc::Rc;
use std::time::Duration;

struct Harness {
    notes: Rc<MemoryBucket<NoteData>>,
    tags: Rc<MemoryBucket<Tag>>,
    preferences: Rc<MemoryBucket<Preferences>>,
    client: Rc<EventChannel>,
    commands: Rc<EventChannel>,
    host: Rc<RecordingHost>,
    clock: VirtualClock,
    coordinator: Coordinator,
}

fn note(content: &str, modified: i64) -> NoteData {
    NoteData {
        content: content.to_string(),
        modification_date: modified,
        ..NoteData::default()
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

impl Harness {
    fn with_notes(notes: &[(&str, NoteData)]) -> Self {
        let bucket = Rc::new(MemoryBucket::new("note"));
        for (id, data) in notes {
            bucket.seed(*id, data.clone());
        }
        let tags = Rc::new(MemoryBucket::new("tag"));
        tags.seed(
            "t1",
            Tag {
                id: "t1".into(),
                name: "work".into(),
                index: None,
            },
        );

        let preferences = Rc::new(MemoryBucket::new("preferences"));
        let client = Rc::new(EventChannel::default());
        let commands = Rc::new(EventChannel::default());
        let host = Rc::new(RecordingHost::default());
        let clock = VirtualClock::default();

        let io = Collaborators {
            notes: bucket.clone(),
            tags: tags.clone(),
            preferences: preferences.clone(),
            client: client.clone(),
            commands: commands.clone(),
            keyboard: Rc::new(EventChannel::default()),
            host: host.clone(),
            clock: Rc::new(clock.clone()),
        };
        let mut coordinator = Coordinator::new(Config::default(), io);
        coordinator.start();

        Self {
            notes: bucket,
            tags,
            preferences,
            client,
            commands,
            host,
            clock,
            coordinator,
        }
    }

    fn new() -> Self {
        Self::with_notes(&[
            ("a", note("Alpha", 3)),
            ("b", note("Bravo", 2)),
            ("c", note("Charlie", 1)),
        ])
    }

    fn command(&mut self, command: serde_json::Value) -> notesync::Update {
        let update = self.coordinator.update(Input::Command(command));
        self.pump();
        update
    }

    /// Feeds queued bucket events back in, as a host would.
    fn pump(&mut self) {
        loop {
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
    }

    /// Moves the clock to `t` and fires due timers. Returns the dispatch count.
    fn tick_at(&mut self, t: Duration) -> usize {
        self.clock.set(t);
        self.coordinator.update(Input::Tick).dispatched
    }

    fn remote_edit(&mut self, id: &str, content: &str) {
        self.notes
            .apply_remote(id, note(content, 10), json!({ "content": content }));
        self.pump();
    }

    fn opened(&self) -> Option<String> {
        self.coordinator.state().ui.opened_note_id.clone()
    }
}

#[test]
fn start_loads_content_and_greets_host() {
    let harness = Harness::new();
    let state = harness.coordinator.state();

    let ids: Vec<_> = state.data.notes.iter().map(|n| n.id.as_str()).collect();
    assert_eq!(ids, vec!["a", "b", "c"]);
    assert_eq!(state.data.tags.len(), 1);
    assert_eq!(state.ui.filtered_note_ids, vec!["a", "b", "c"]);

    let messages = harness.host.messages();
    assert!(messages.contains(&HostMessage::SetAutoHideMenuBar(false)));
    assert!(matches!(messages[1], HostMessage::SettingsUpdate(_)));
    assert!(messages.contains(&HostMessage::AnalyticsEvent {
        name: "application_opened".into()
    }));
}

#[test]
fn dialogs_stack_without_duplicates() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "showDialog", "dialog": "ABOUT" }));
    harness.command(json!({ "action": "showDialog", "dialog": "ABOUT" }));
    harness.command(json!({ "action": "showDialog", "dialog": "SETTINGS" }));

    assert_eq!(
        harness.coordinator.state().ui.dialogs,
        vec![DialogKind::About, DialogKind::Settings]
    );
}

#[test]
fn open_keeps_current_note_and_select_replaces_it() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openNote", "noteId": "a" }));
    assert_eq!(harness.opened().as_deref(), Some("a"));

    harness.command(json!({ "action": "openNote", "noteId": "b" }));
    assert_eq!(harness.opened().as_deref(), Some("a"));

    harness.command(json!({
        "action": "selectNote",
        "note": { "id": "b", "data": { "content": "Bravo" } }
    }));
    assert_eq!(harness.opened().as_deref(), Some("b"));

    harness.command(json!({ "action": "closeNote" }));
    assert_eq!(harness.opened(), None);
    assert!(harness.coordinator.state().ui.selected_note.is_none());
}

#[test]
fn trash_and_all_notes_leave_tag_mode() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openTag", "tagId": "t1" }));
    assert_eq!(
        harness.coordinator.state().ui.list_mode,
        ListMode::Tag("t1".into())
    );

    harness.command(json!({ "action": "selectTrash" }));
    assert_eq!(harness.coordinator.state().ui.list_mode, ListMode::Trash);
    assert!(harness.coordinator.state().ui.filtered_note_ids.is_empty());

    harness.command(json!({ "action": "showAllNotes" }));
    assert_eq!(harness.coordinator.state().ui.list_mode, ListMode::AllNotes);
}

#[test]
fn update_burst_reloads_once() {
    let mut harness = Harness::new();
    for t in [0, 50, 100] {
        harness.clock.set(ms(t));
        harness.remote_edit("a", "Alpha edited");
    }

    assert_eq!(harness.coordinator.next_deadline(), Some(ms(300)));
    assert_eq!(harness.tick_at(ms(299)), 0);
    // note list and unsynced markers
    assert_eq!(harness.tick_at(ms(300)), 2);
    assert_eq!(harness.tick_at(ms(5000)), 0);
    assert_eq!(harness.coordinator.state().data.notes[0].title(), "Alpha edited");
}

#[test]
fn continuous_updates_still_reload_by_the_ceiling() {
    let mut harness = Harness::new();
    let mut reloads = Vec::new();
    for t in (0..=3200).step_by(50) {
        harness.clock.set(ms(t));
        harness.remote_edit("b", &format!("Bravo {t}"));
        if harness.tick_at(ms(t)) > 0 {
            reloads.push(t);
        }
    }
    assert_eq!(reloads, vec![1000, 2000, 3000]);
    assert!(reloads.windows(2).all(|w| w[1] - w[0] <= 1000));
}

#[test]
fn authorization_reloads_without_index() {
    let mut harness = Harness::new();
    harness.notes.seed("d", note("Delta", 0));
    harness.tags.seed(
        "t2",
        Tag {
            id: "t2".into(),
            name: "home".into(),
            index: None,
        },
    );

    harness
        .coordinator
        .update(Input::Client(ClientEvent::Authorized));

    let state = harness.coordinator.state();
    assert_eq!(state.data.notes.len(), 4);
    assert_eq!(state.data.tags.len(), 2);
}

#[test]
fn trash_without_open_note_does_nothing() {
    let mut harness = Harness::new();
    let before = harness.coordinator.snapshot();
    let update = harness.command(json!({ "action": "trashNote" }));

    assert!(update.handled);
    assert_eq!(update.dispatched, 0);
    assert!(Rc::ptr_eq(&before, &harness.coordinator.snapshot()));
    assert!(harness.notes.unsynced_ids().is_empty());
}

#[test]
fn trash_opens_the_note_that_took_its_place() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openNote", "noteId": "b" }));
    harness.command(json!({ "action": "trashNote" }));

    assert_eq!(harness.opened().as_deref(), Some("c"));
    assert!(harness.notes.get("b").unwrap().deleted);
    assert_eq!(harness.notes.unsynced_ids(), vec!["b".to_string()]);
    assert_eq!(harness.coordinator.state().ui.filtered_note_ids, vec!["a", "c"]);

    harness.command(json!({ "action": "selectTrash" }));
    assert_eq!(harness.coordinator.state().ui.filtered_note_ids, vec!["b"]);
}

#[test]
fn trash_nominates_from_the_visible_list_not_the_full_one() {
    let mut trashed = note("Xray", 9);
    trashed.deleted = true;
    let mut harness = Harness::with_notes(&[
        ("x", trashed),
        ("a", note("Alpha", 3)),
        ("b", note("Bravo", 2)),
        ("c", note("Charlie", 1)),
    ]);
    harness.command(json!({ "action": "openNote", "noteId": "a" }));
    harness.command(json!({ "action": "trashNote" }));

    assert_eq!(harness.coordinator.state().ui.filtered_note_ids, vec!["b", "c"]);
    assert_eq!(harness.opened().as_deref(), Some("b"));
}

#[test]
fn trashing_the_last_note_closes_it() {
    let mut harness = Harness::with_notes(&[("only", note("Only", 1))]);
    harness.command(json!({ "action": "openNote", "noteId": "only" }));
    harness.command(json!({ "action": "trashNote" }));
    assert_eq!(harness.opened(), None);
}

#[test]
fn unknown_and_malformed_commands_change_nothing() {
    let mut harness = Harness::new();
    let before = harness.coordinator.snapshot();
    let host_before = harness.host.messages().len();

    for command in [
        json!({ "action": "unknownThing" }),
        json!({ "action": 7 }),
        json!("newNote"),
        json!({ "action": "showDialog", "dialog": "NOPE" }),
        json!({ "action": "setSortType", "sortType": "sideways" }),
    ] {
        let update = harness.command(command);
        assert!(!update.handled);
        assert_eq!(update.dispatched, 0);
    }

    assert!(Rc::ptr_eq(&before, &harness.coordinator.snapshot()));
    assert_eq!(harness.host.messages().len(), host_before);
}

#[test]
fn idle_sync_nudges_and_recomputes_unsynced() {
    let mut harness = Harness::new();
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Connect));
    harness.notes.update("a", note("Alpha local", 4), false).unwrap();
    harness.pump();
    assert_eq!(harness.tick_at(ms(1000)), 2);
    assert!(harness.coordinator.state().ui.unsynced_note_ids.contains("a"));

    harness.clock.set(ms(1000));
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Message(json!("0:c:{}"))));
    assert!(harness.coordinator.state().data.last_synced_at.is_some());

    harness.notes.mark_synced("a");
    assert_eq!(harness.tick_at(ms(2999)), 0);
    assert_eq!(harness.tick_at(ms(3000)), 1);
    assert!(harness.coordinator.state().ui.unsynced_note_ids.is_empty());
}

#[test]
fn idle_nudge_pushes_unsynced_notes_only_when_connected() {
    let mut harness = Harness::new();
    harness.notes.update("b", note("Bravo local", 5), false).unwrap();
    harness.pump();
    harness.tick_at(ms(1000));

    harness
        .coordinator
        .update(Input::Client(ClientEvent::Message(json!("0:c:{}"))));
    harness.tick_at(ms(3000));
    assert!(harness.notes.drain_events().is_empty());

    harness
        .coordinator
        .update(Input::Client(ClientEvent::Connect));
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Message(json!("0:c:{}"))));
    harness.tick_at(ms(5000));
    assert_eq!(
        harness.notes.drain_events(),
        vec![BucketEvent::BeforeNetworkChange { id: "b".into() }]
    );
}

#[test]
fn heartbeats_do_not_count_as_sync_traffic() {
    let mut harness = Harness::new();
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Message(json!("h:1"))));
    assert_eq!(harness.coordinator.next_deadline(), None);

    harness.clock.set(ms(500));
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Message(json!("0:c:{}"))));
    assert_eq!(harness.coordinator.next_deadline(), Some(ms(2500)));
}

#[test]
fn failed_fetch_of_open_note_is_dropped() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openNote", "noteId": "a" }));

    harness.notes.fail_next_gets(1);
    harness.remote_edit("a", "Alpha remote");

    let state = harness.coordinator.state();
    assert!(state.ui.selected_note.is_none());
    let open = state.ui.opened_note(&state.data.notes).unwrap();
    assert_eq!(open.title(), "Alpha remote");
    assert!(!open.has_remote_update);
}

#[test]
fn remote_patch_on_open_note_is_flagged() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openNote", "noteId": "a" }));
    harness.remote_edit("a", "Alpha remote");

    let state = harness.coordinator.state();
    let open = state.ui.selected_note.as_ref().unwrap();
    assert_eq!(open.data.content, "Alpha remote");
    assert!(open.has_remote_update);
    assert!(harness.coordinator.view_model().open_note.unwrap().has_remote_update);
}

#[test]
fn local_save_of_open_note_is_not_flagged() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openNote", "noteId": "a" }));
    harness.coordinator.update_content("Alpha typed", false);
    harness.pump();

    let open = harness.coordinator.state().ui.selected_note.clone().unwrap();
    assert_eq!(open.data.content, "Alpha typed");
    assert!(!open.has_remote_update);
    assert_eq!(harness.notes.get("a").unwrap().content, "Alpha typed");
}

#[test]
fn pending_edit_is_captured_before_push() {
    let mut harness = Harness::new();
    harness.command(json!({
        "action": "selectNote",
        "note": { "id": "a", "data": { "content": "Alpha draft" } }
    }));
    assert_eq!(harness.notes.get("a").unwrap().content, "Alpha");

    harness.notes.touch("a").unwrap();
    harness.pump();
    assert_eq!(harness.notes.get("a").unwrap().content, "Alpha draft");
}

#[test]
fn stop_and_drop_release_listeners() {
    let mut harness = Harness::new();
    let note_events = harness.notes.events();
    assert!(note_events.is_subscribed(Topic::Update));
    assert_eq!(harness.client.listener_count(), 1);

    harness.coordinator.stop();
    assert!(!note_events.is_subscribed(Topic::Update));
    assert_eq!(harness.client.listener_count(), 0);
    assert_eq!(harness.commands.listener_count(), 0);

    let again = Harness::new();
    let commands = again.commands.clone();
    assert_eq!(commands.listener_count(), 1);
    drop(again);
    assert_eq!(commands.listener_count(), 0);
}

#[test]
fn inputs_after_stop_are_ignored() {
    let mut harness = Harness::new();
    harness.coordinator.stop();
    let before = harness.coordinator.snapshot();

    let update = harness.command(json!({ "action": "showDialog", "dialog": "ABOUT" }));
    assert_eq!(update, notesync::Update::default());
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Connect));
    assert!(Rc::ptr_eq(&before, &harness.coordinator.snapshot()));
}

#[test]
fn settings_change_notifies_host_and_sort_reloads() {
    let mut harness = Harness::new();
    harness.host.take();

    harness.command(json!({ "action": "increaseFontSize" }));
    match harness.host.take().as_slice() {
        [HostMessage::SettingsUpdate(settings)] => assert_eq!(settings.font_size, 17),
        other => panic!("unexpected host messages: {other:?}"),
    }

    let update = harness.command(json!({ "action": "setSortType", "sortType": "alphabetical" }));
    assert_eq!(update.dispatched, 2);
    harness.command(json!({ "action": "toggleSortOrder" }));
    let ids: Vec<_> = harness
        .coordinator
        .state()
        .data
        .notes
        .iter()
        .map(|n| n.id.clone())
        .collect();
    assert_eq!(ids, vec!["c", "b", "a"]);
}

#[test]
fn new_note_shortcut_creates_and_opens_a_note() {
    let mut harness = Harness::new();
    let update = harness.coordinator.update(Input::Key(KeyPress {
        code: "KeyI".into(),
        ctrl: true,
        meta: false,
        shift: true,
    }));
    harness.pump();

    assert!(update.handled);
    assert_eq!(harness.notes.len(), 4);
    let opened = harness.opened().unwrap();
    assert!(opened.starts_with("note-"));
    assert!(harness.coordinator.state().ui.edit_mode);
    assert!(harness.host.messages().contains(&HostMessage::AnalyticsEvent {
        name: "list_note_created".into()
    }));
}

#[test]
fn unmatched_keys_propagate() {
    let mut harness = Harness::new();
    let update = harness.coordinator.update(Input::Key(KeyPress {
        code: "KeyQ".into(),
        ctrl: true,
        ..KeyPress::default()
    }));
    assert!(!update.handled);
}

#[test]
fn analytics_respect_preferences() {
    let mut harness = Harness::new();
    harness.preferences.apply_remote(
        PREFERENCES_KEY,
        Preferences {
            analytics_enabled: Some(false),
        },
        json!({ "analyticsEnabled": false }),
    );
    harness.pump();
    assert_eq!(
        harness.coordinator.state().data.preferences.analytics_enabled,
        Some(false)
    );

    harness.host.take();
    harness.command(json!({ "action": "newNote" }));
    assert!(!harness
        .host
        .take()
        .iter()
        .any(|m| matches!(m, HostMessage::AnalyticsEvent { .. })));
}

#[test]
fn pin_note_moves_it_to_the_top() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "pinNote", "noteId": "c" }));

    let state = harness.coordinator.state();
    assert_eq!(state.data.notes[0].id, "c");
    assert!(state.data.notes[0].is_pinned());

    harness.command(json!({ "action": "pinNote", "noteId": "c", "pin": false }));
    assert_eq!(harness.coordinator.state().data.notes[2].id, "c");
}

#[test]
fn empty_trash_removes_deleted_notes() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "openNote", "noteId": "a" }));
    harness.command(json!({ "action": "trashNote" }));
    harness.command(json!({ "action": "emptyTrash" }));

    assert_eq!(harness.notes.len(), 2);
    assert!(harness.notes.get("a").is_err());
    assert_eq!(harness.coordinator.state().data.notes.len(), 2);
}

#[test]
fn search_filters_the_list() {
    let mut harness = Harness::new();
    harness.command(json!({ "action": "search", "query": "brav" }));
    assert_eq!(harness.coordinator.state().ui.filtered_note_ids, vec!["b"]);

    let vm = harness.coordinator.view_model();
    assert_eq!(vm.list.items.len(), 1);
    assert!(!vm.list.items[0].highlight_ranges.is_empty());
}

#[test]
fn connection_status_follows_client() {
    let mut harness = Harness::new();
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Connect));
    assert!(harness.coordinator.view_model().sync.connected);
    harness
        .coordinator
        .update(Input::Client(ClientEvent::Disconnect));
    assert!(!harness.coordinator.view_model().sync.connected);
}
