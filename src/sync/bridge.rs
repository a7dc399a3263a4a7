//! Translation of bucket and sync-client lifecycle events into actions.
//!
//! The bridge is the only component with temporal behavior. It decides, for every
//! low-level event, which reloads and dispatches follow, and shapes bursts so the
//! state machine is not flooded:
//!
//! | Source       | Event                   | Effect                                             |
//! |--------------|-------------------------|----------------------------------------------------|
//! | notes        | `index`                 | reload notes + recompute unsynced                  |
//! | notes        | `update`                | patch list, reconcile open note, coalesced reload  |
//! | notes        | `remove`                | reload notes + recompute unsynced                  |
//! | notes        | before network change   | let the open note capture its local state          |
//! | tags         | `index` / `remove`      | reload tags                                        |
//! | tags         | `update`                | coalesced tag reload                               |
//! | preferences  | `update`                | load preferences                                   |
//! | client       | `authorized`/`unauth.`  | full auth-changed sequence                         |
//! | client       | `connect`/`disconnect`  | connection status                                  |
//! | client       | `message`/`send`        | activity; idle settle → nudge + recompute unsynced |
//!
//! Timers never run on their own: the coordinator calls [`SyncBridge::tick`] with
//! the current time and receives whatever became due.

use crate::app::{Action, Event};
use crate::domain::{NoteData, Preferences, Tag};
use crate::sync::activity::ActivityTracker;
use crate::sync::coalesce::Coalescer;
use crate::sync::messages::{BucketEvent, ClientEvent};
use crate::Config;
use std::time::Duration;

/// Timer state for the bridge.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncBridge {
    notes_reload: Coalescer,
    tags_reload: Coalescer,
    activity: ActivityTracker,
}

impl Default for SyncBridge {
    fn default() -> Self {
        Self::from_config(&Config::default())
    }
}

impl SyncBridge {
    #[must_use]
    pub fn from_config(config: &Config) -> Self {
        let window = Duration::from_millis(config.coalesce_window_ms);
        Self {
            notes_reload: Coalescer::new(
                window,
                config.coalesce_ceiling_ms.map(Duration::from_millis),
            ),
            tags_reload: Coalescer::new(
                window,
                config.tag_coalesce_ceiling_ms.map(Duration::from_millis),
            ),
            activity: ActivityTracker::new(Duration::from_millis(config.idle_after_ms)),
        }
    }

    /// Actions that make freshly (un)authorized content visible right away, even if
    /// the buckets never emit another event.
    #[must_use]
    pub fn auth_changed() -> Vec<Action> {
        vec![
            Action::InitializeAnalytics,
            Action::LoadPreferences,
            Action::ReloadNotes,
            Action::RecomputeUnsynced,
            Action::ReloadTags,
        ]
    }

    /// Handles an event from the note bucket.
    ///
    /// `opened_note_id` is the note currently open in the editor, if any.
    #[tracing::instrument(level = "debug", skip(self, event), fields(topic = ?event.topic()))]
    pub fn on_note_event(
        &mut self,
        event: &BucketEvent<NoteData>,
        opened_note_id: Option<&str>,
        now: Duration,
    ) -> Vec<Action> {
        match event {
            BucketEvent::Index | BucketEvent::Remove { .. } => {
                vec![Action::ReloadNotes, Action::RecomputeUnsynced]
            }
            BucketEvent::Update { id, data, info } => {
                let mut actions = vec![Action::Dispatch(Event::RemoteNoteUpdate {
                    note_id: id.clone(),
                    data: data.clone(),
                })];

                if opened_note_id == Some(id.as_str()) {
                    tracing::debug!(note_id = %id, remote = info.is_remote(), "open note changed in bucket");
                    actions.push(Action::FetchOpenNote {
                        note_id: id.clone(),
                        remote_patch: info.is_remote(),
                    });
                }

                if self.notes_reload.trigger(now) {
                    tracing::debug!(deadline = ?self.notes_reload.deadline(), "note reload scheduled");
                }
                actions
            }
            BucketEvent::BeforeNetworkChange { id } => {
                vec![Action::CaptureOpenNote { note_id: id.clone() }]
            }
        }
    }

    /// Handles an event from the tag bucket.
    pub fn on_tag_event(&mut self, event: &BucketEvent<Tag>, now: Duration) -> Vec<Action> {
        match event {
            BucketEvent::Index | BucketEvent::Remove { .. } => vec![Action::ReloadTags],
            BucketEvent::Update { .. } => {
                if self.tags_reload.trigger(now) {
                    tracing::debug!(deadline = ?self.tags_reload.deadline(), "tag reload scheduled");
                }
                vec![]
            }
            BucketEvent::BeforeNetworkChange { .. } => vec![],
        }
    }

    /// Handles an event from the preferences bucket.
    #[must_use]
    pub fn on_preferences_event(&self, event: &BucketEvent<Preferences>) -> Vec<Action> {
        match event {
            BucketEvent::Update { .. } => vec![Action::LoadPreferences],
            _ => vec![],
        }
    }

    /// Handles an event from the sync client.
    ///
    /// `unix_now` stamps the last-synced time when a message arrives.
    #[tracing::instrument(level = "debug", skip(self, event), fields(topic = ?event.topic()))]
    pub fn on_client_event(
        &mut self,
        event: &ClientEvent,
        now: Duration,
        unix_now: i64,
    ) -> Vec<Action> {
        match event {
            ClientEvent::Authorized | ClientEvent::Unauthorized => Self::auth_changed(),
            ClientEvent::Connect => vec![Action::Dispatch(Event::SetConnectionStatus(true))],
            ClientEvent::Disconnect => vec![Action::Dispatch(Event::SetConnectionStatus(false))],
            ClientEvent::Message(frame) => {
                self.activity.record(frame, now);
                vec![Action::Dispatch(Event::SyncMessageReceived { at: unix_now })]
            }
            ClientEvent::Send(frame) => {
                self.activity.record(frame, now);
                vec![]
            }
        }
    }

    /// Returns the actions whose timers are due at `now`.
    pub fn tick(&mut self, now: Duration) -> Vec<Action> {
        let mut actions = Vec::new();

        if self.notes_reload.poll(now) {
            tracing::debug!("coalesced note reload firing");
            actions.extend([Action::ReloadNotes, Action::RecomputeUnsynced]);
        }

        if self.tags_reload.poll(now) {
            tracing::debug!("coalesced tag reload firing");
            actions.push(Action::ReloadTags);
        }

        if self.activity.poll(now) {
            tracing::debug!("sync activity settled");
            actions.extend([Action::NudgeUnsynced, Action::RecomputeUnsynced]);
        }

        actions
    }

    /// Earliest pending timer deadline, so a host can schedule its next tick.
    #[must_use]
    pub fn next_deadline(&self) -> Option<Duration> {
        [
            self.notes_reload.deadline(),
            self.tags_reload.deadline(),
            self.activity.deadline(),
        ]
            .into_iter()
            .flatten()
            .min()
    }

    #[must_use]
    pub const fn is_sync_active(&self) -> bool {
        self.activity.is_active()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::messages::RemoteUpdateInfo;
    use serde_json::json;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn update(id: &str, remote: bool) -> BucketEvent<NoteData> {
        BucketEvent::Update {
            id: id.to_string(),
            data: NoteData::default(),
            info: RemoteUpdateInfo {
                patch: remote.then(|| json!({ "content": { "o": "+", "v": "x" } })),
            },
        }
    }

    fn reloads(actions: &[Action]) -> usize {
        actions.iter().filter(|a| **a == Action::ReloadNotes).count()
    }

    #[test]
    fn burst_of_updates_reloads_once_per_window() {
        let mut bridge = SyncBridge::default();
        let mut total = 0;
        for (i, t) in (0..10).zip((0..).step_by(15)) {
            let actions = bridge.on_note_event(&update(&format!("n{i}"), false), None, ms(t));
            total += reloads(&actions);
            total += reloads(&bridge.tick(ms(t)));
        }
        assert_eq!(total, 0);

        let fired = bridge.tick(ms(135 + 200));
        assert_eq!(reloads(&fired), 1);
        assert!(fired.contains(&Action::RecomputeUnsynced));
        assert!(bridge.tick(ms(2000)).is_empty());
    }

    #[test]
    fn continuous_updates_reload_at_the_ceiling() {
        let mut bridge = SyncBridge::default();
        let mut fired_at = Vec::new();
        for t in (0..=3500).step_by(50) {
            bridge.on_note_event(&update("n", false), None, ms(t));
            if reloads(&bridge.tick(ms(t))) > 0 {
                fired_at.push(t);
            }
        }
        assert_eq!(fired_at, vec![1000, 2000, 3000]);
        assert!(fired_at.windows(2).all(|w| w[1] - w[0] <= 1000));
    }

    #[test]
    fn update_to_open_note_requests_fetch() {
        let mut bridge = SyncBridge::default();

        let actions = bridge.on_note_event(&update("a", true), Some("a"), ms(0));
        assert!(actions.contains(&Action::FetchOpenNote {
            note_id: "a".into(),
            remote_patch: true,
        }));

        let local = bridge.on_note_event(&update("a", false), Some("a"), ms(10));
        assert!(local.contains(&Action::FetchOpenNote {
            note_id: "a".into(),
            remote_patch: false,
        }));

        let other = bridge.on_note_event(&update("b", true), Some("a"), ms(20));
        assert!(!other
            .iter()
            .any(|a| matches!(a, Action::FetchOpenNote { .. })));
    }

    #[test]
    fn index_and_remove_reload_synchronously() {
        let mut bridge = SyncBridge::default();
        let index = bridge.on_note_event(&BucketEvent::Index, None, ms(0));
        assert_eq!(index, vec![Action::ReloadNotes, Action::RecomputeUnsynced]);

        let removed = bridge.on_note_event(&BucketEvent::Remove { id: "a".into() }, None, ms(0));
        assert_eq!(reloads(&removed), 1);
        assert!(!bridge.notes_reload.is_pending());
    }

    #[test]
    fn tag_updates_coalesce_but_index_is_immediate() {
        let mut bridge = SyncBridge::default();
        let tag = Tag { id: "t".into(), name: "work".into(), index: None };
        let event = BucketEvent::Update { id: "t".into(), data: tag, info: RemoteUpdateInfo::default() };

        assert!(bridge.on_tag_event(&event, ms(0)).is_empty());
        assert!(bridge.on_tag_event(&event, ms(100)).is_empty());
        assert_eq!(bridge.tick(ms(300)), vec![Action::ReloadTags]);

        assert_eq!(bridge.on_tag_event(&BucketEvent::Index, ms(400)), vec![Action::ReloadTags]);
    }

    #[test]
    fn authorization_reloads_everything() {
        let mut bridge = SyncBridge::default();
        for event in [ClientEvent::Authorized, ClientEvent::Unauthorized] {
            let actions = bridge.on_client_event(&event, ms(0), 0);
            assert!(actions.contains(&Action::ReloadNotes));
            assert!(actions.contains(&Action::ReloadTags));
            assert!(actions.contains(&Action::LoadPreferences));
            assert!(actions.contains(&Action::InitializeAnalytics));
        }
    }

    #[test]
    fn connection_events_toggle_status() {
        let mut bridge = SyncBridge::default();
        assert_eq!(
            bridge.on_client_event(&ClientEvent::Connect, ms(0), 0),
            vec![Action::Dispatch(Event::SetConnectionStatus(true))]
        );
        assert_eq!(
            bridge.on_client_event(&ClientEvent::Disconnect, ms(0), 0),
            vec![Action::Dispatch(Event::SetConnectionStatus(false))]
        );
    }

    #[test]
    fn settled_activity_nudges_and_recomputes() {
        let mut bridge = SyncBridge::default();
        let actions = bridge.on_client_event(&ClientEvent::Message(json!("0:i:1")), ms(0), 42);
        assert_eq!(actions, vec![Action::Dispatch(Event::SyncMessageReceived { at: 42 })]);
        bridge.on_client_event(&ClientEvent::Send(json!("0:c:{}")), ms(500), 42);
        assert!(bridge.is_sync_active());

        assert!(bridge.tick(ms(1000)).is_empty());
        assert_eq!(
            bridge.tick(ms(2500)),
            vec![Action::NudgeUnsynced, Action::RecomputeUnsynced]
        );
        assert!(bridge.tick(ms(9000)).is_empty());
    }

    #[test]
    fn preference_updates_reload_preferences() {
        let bridge = SyncBridge::default();
        let event = BucketEvent::Update {
            id: "preferences-key".into(),
            data: Preferences::default(),
            info: RemoteUpdateInfo::default(),
        };
        assert_eq!(bridge.on_preferences_event(&event), vec![Action::LoadPreferences]);
        assert!(bridge.on_preferences_event(&BucketEvent::Index).is_empty());
    }
}
