//! In-process bucket.
//!
//! [`MemoryBucket`] keeps records in a sorted map together with a per-record synced
//! marker. Lifecycle events are queued in an outbox (only for topics someone is
//! listening to) and handed to whoever drives the bucket via
//! [`MemoryBucket::drain_events`]. The host shim and the integration tests feed
//! those events back into the coordinator.

use crate::domain::error::{NotesyncError, Result};
use crate::domain::EntityId;
use crate::storage::bucket::Bucket;
use crate::sync::{BucketEvent, EventSource, ListenerSet, RemoteUpdateInfo};
use std::cell::{Cell, RefCell};
use std::collections::{BTreeMap, VecDeque};
use std::rc::Rc;

#[derive(Debug, Clone)]
struct Entry<T> {
    record: T,
    synced: bool,
}

/// Bucket backed by a `BTreeMap`.
#[derive(Debug)]
pub struct MemoryBucket<T> {
    name: String,
    records: RefCell<BTreeMap<EntityId, Entry<T>>>,
    outbox: RefCell<VecDeque<BucketEvent<T>>>,
    listeners: Rc<ListenerSet>,
    next_id: Cell<u64>,
    failing_gets: Cell<usize>,
}

impl<T: Clone> MemoryBucket<T> {
    /// Creates an empty bucket. `name` prefixes generated ids.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            records: RefCell::new(BTreeMap::new()),
            outbox: RefCell::new(VecDeque::new()),
            listeners: Rc::new(ListenerSet::default()),
            next_id: Cell::new(1),
            failing_gets: Cell::new(0),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Stores a record the server already knows about. Emits nothing.
    pub fn seed(&self, id: impl Into<EntityId>, record: T) {
        self.records.borrow_mut().insert(
            id.into(),
            Entry {
                record,
                synced: true,
            },
        );
    }

    /// Applies a change that arrived from the server.
    ///
    /// The record counts as synced and the `update` event carries `patch`.
    pub fn apply_remote(&self, id: impl Into<EntityId>, record: T, patch: serde_json::Value) {
        let id = id.into();
        self.records.borrow_mut().insert(
            id.clone(),
            Entry {
                record: record.clone(),
                synced: true,
            },
        );
        self.emit(BucketEvent::Update {
            id,
            data: record,
            info: RemoteUpdateInfo { patch: Some(patch) },
        });
    }

    /// Marks a record as acknowledged by the server.
    pub fn mark_synced(&self, id: &str) -> bool {
        self.records
            .borrow_mut()
            .get_mut(id)
            .map(|entry| entry.synced = true)
            .is_some()
    }

    /// Announces a completed full index.
    pub fn reindex(&self) {
        self.emit(BucketEvent::Index);
    }

    /// Makes the next `count` calls to [`Bucket::get`] fail.
    pub fn fail_next_gets(&self, count: usize) {
        self.failing_gets.set(count);
    }

    /// Takes every queued event, oldest first.
    pub fn drain_events(&self) -> Vec<BucketEvent<T>> {
        self.outbox.borrow_mut().drain(..).collect()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.records.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.records.borrow().is_empty()
    }

    fn emit(&self, event: BucketEvent<T>) {
        if self.listeners.is_subscribed(event.topic()) {
            self.outbox.borrow_mut().push_back(event);
        } else {
            tracing::trace!(bucket = %self.name, topic = ?event.topic(), "no listener, event dropped");
        }
    }

    fn not_found(&self, id: &str) -> NotesyncError {
        NotesyncError::NotFound(format!("{}/{id}", self.name))
    }
}

impl<T: Clone> Bucket for MemoryBucket<T> {
    type Record = T;

    fn events(&self) -> Rc<dyn EventSource> {
        self.listeners.clone()
    }

    fn get(&self, id: &str) -> Result<T> {
        let failing = self.failing_gets.get();
        if failing > 0 {
            self.failing_gets.set(failing - 1);
            return Err(NotesyncError::Storage(format!(
                "{}: fetch of {id} failed",
                self.name
            )));
        }

        self.records
            .borrow()
            .get(id)
            .map(|entry| entry.record.clone())
            .ok_or_else(|| self.not_found(id))
    }

    fn all(&self) -> Result<Vec<(EntityId, T)>> {
        Ok(self
            .records
            .borrow()
            .iter()
            .map(|(id, entry)| (id.clone(), entry.record.clone()))
            .collect())
    }

    fn add(&self, record: T) -> Result<EntityId> {
        let n = self.next_id.get();
        self.next_id.set(n + 1);
        let id = format!("{}-{n:06}", self.name);
        self.update(&id, record, false)?;
        Ok(id)
    }

    /// Records are pushed on [`Bucket::touch`]; `sync` only matters to networked
    /// buckets.
    fn update(&self, id: &str, record: T, _sync: bool) -> Result<()> {
        self.records.borrow_mut().insert(
            id.to_string(),
            Entry {
                record: record.clone(),
                synced: false,
            },
        );
        self.emit(BucketEvent::Update {
            id: id.to_string(),
            data: record,
            info: RemoteUpdateInfo::default(),
        });
        Ok(())
    }

    fn remove(&self, id: &str) -> Result<()> {
        self.records
            .borrow_mut()
            .remove(id)
            .ok_or_else(|| self.not_found(id))?;
        self.emit(BucketEvent::Remove { id: id.to_string() });
        Ok(())
    }

    fn touch(&self, id: &str) -> Result<()> {
        if !self.records.borrow().contains_key(id) {
            return Err(self.not_found(id));
        }
        self.emit(BucketEvent::BeforeNetworkChange { id: id.to_string() });
        Ok(())
    }

    fn unsynced_ids(&self) -> Vec<EntityId> {
        self.records
            .borrow()
            .iter()
            .filter(|(_, entry)| !entry.synced)
            .map(|(id, _)| id.clone())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::NoteData;
    use crate::sync::Topic;
    use serde_json::json;

    fn note(content: &str) -> NoteData {
        NoteData {
            content: content.to_string(),
            ..NoteData::default()
        }
    }

    #[test]
    fn events_only_queue_while_subscribed() {
        let bucket = MemoryBucket::new("note");
        bucket.update("a", note("one"), false).unwrap();
        assert!(bucket.drain_events().is_empty());

        let listener = bucket.events().subscribe(&[Topic::Update]);
        bucket.update("a", note("two"), false).unwrap();
        bucket.remove("a").unwrap();
        let events = bucket.drain_events();
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].topic(), Topic::Update);

        assert!(bucket.events().unsubscribe(listener));
        bucket.update("b", note("three"), false).unwrap();
        assert!(bucket.drain_events().is_empty());
    }

    #[test]
    fn local_writes_are_unsynced_until_acknowledged() {
        let bucket = MemoryBucket::new("note");
        bucket.seed("a", note("server"));
        bucket.update("b", note("local"), false).unwrap();
        assert_eq!(bucket.unsynced_ids(), vec!["b".to_string()]);

        assert!(bucket.mark_synced("b"));
        assert!(bucket.unsynced_ids().is_empty());
        assert!(!bucket.mark_synced("missing"));
    }

    #[test]
    fn remote_changes_carry_their_patch() {
        let bucket = MemoryBucket::new("note");
        let _listener = bucket.events().subscribe(&[Topic::Update]);
        bucket.apply_remote("a", note("remote"), json!({ "content": "remote" }));

        match bucket.drain_events().as_slice() {
            [BucketEvent::Update { id, info, .. }] => {
                assert_eq!(id, "a");
                assert!(info.is_remote());
            }
            other => panic!("unexpected events: {other:?}"),
        }
        assert!(bucket.unsynced_ids().is_empty());
    }

    #[test]
    fn touch_announces_network_change() {
        let bucket = MemoryBucket::new("note");
        let _listener = bucket
            .events()
            .subscribe(&[Topic::BeforeNetworkChange]);
        bucket.update("a", note("x"), true).unwrap();
        assert!(bucket.drain_events().is_empty());

        bucket.touch("a").unwrap();
        assert!(bucket.touch("missing").is_err());
        assert_eq!(
            bucket.drain_events(),
            vec![BucketEvent::BeforeNetworkChange { id: "a".into() }]
        );
    }

    #[test]
    fn injected_fetch_failures_are_consumed() {
        let bucket = MemoryBucket::new("note");
        let id = bucket.add(note("x")).unwrap();
        bucket.fail_next_gets(1);
        assert!(matches!(bucket.get(&id), Err(NotesyncError::Storage(_))));
        assert_eq!(bucket.get(&id).unwrap().content, "x");
        assert!(matches!(bucket.get("nope"), Err(NotesyncError::NotFound(_))));
    }

    #[test]
    fn generated_ids_are_unique_and_ordered() {
        let bucket = MemoryBucket::new("note");
        let a = bucket.add(note("a")).unwrap();
        let b = bucket.add(note("b")).unwrap();
        assert!(a < b);
        assert_eq!(bucket.len(), 2);
        let all = bucket.all().unwrap();
        assert_eq!(all[0].0, a);
    }
}
