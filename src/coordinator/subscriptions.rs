//! Scoped ownership of event-source listeners.
//!
//! Every listener the coordinator registers is held here as a handle. Releasing the
//! manager (explicitly or by dropping it) unsubscribes all of them, so no exit path
//! leaves a listener behind.

use crate::sync::{EventSource, ListenerId, Topic};
use std::fmt;
use std::rc::Rc;

/// The collaborator a listener belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceKind {
    Notes,
    Tags,
    Preferences,
    Client,
    Commands,
    Keyboard,
}

struct Handle {
    kind: SourceKind,
    source: Rc<dyn EventSource>,
    listener: ListenerId,
    topics: Vec<Topic>,
}

impl fmt::Debug for Handle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Handle")
            .field("kind", &self.kind)
            .field("listener", &self.listener)
            .field("topics", &self.topics)
            .finish_non_exhaustive()
    }
}

/// Owns every listener registration of one coordinator.
#[derive(Debug, Default)]
pub struct SubscriptionManager {
    handles: Vec<Handle>,
}

impl SubscriptionManager {
    /// Subscribes to `topics` on `source` and keeps the handle.
    pub fn acquire(&mut self, kind: SourceKind, source: Rc<dyn EventSource>, topics: &[Topic]) {
        let listener = source.subscribe(topics);
        tracing::debug!(?kind, ?listener, ?topics, "listener acquired");
        self.handles.push(Handle {
            kind,
            source,
            listener,
            topics: topics.to_vec(),
        });
    }

    /// Whether a held listener covers `topic` on the `kind` source.
    #[must_use]
    pub fn holds(&self, kind: SourceKind, topic: Topic) -> bool {
        self.handles
            .iter()
            .any(|h| h.kind == kind && h.topics.contains(&topic))
    }

    /// Unsubscribes every held listener. Returns how many were released.
    pub fn release_all(&mut self) -> usize {
        let count = self.handles.len();
        for handle in self.handles.drain(..) {
            if !handle.source.unsubscribe(handle.listener) {
                tracing::warn!(kind = ?handle.kind, listener = ?handle.listener, "listener already gone");
            }
        }
        if count > 0 {
            tracing::debug!(count, "listeners released");
        }
        count
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.handles.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.handles.is_empty()
    }
}

impl Drop for SubscriptionManager {
    fn drop(&mut self) {
        self.release_all();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sync::EventChannel;

    #[test]
    fn release_unsubscribes_everything() {
        let client = Rc::new(EventChannel::default());
        let keys = Rc::new(EventChannel::default());

        let mut manager = SubscriptionManager::default();
        manager.acquire(SourceKind::Client, client.clone(), &[Topic::Connect, Topic::Message]);
        manager.acquire(SourceKind::Keyboard, keys.clone(), &[Topic::KeyDown]);
        assert!(manager.holds(SourceKind::Client, Topic::Message));
        assert!(!manager.holds(SourceKind::Keyboard, Topic::Message));

        assert_eq!(manager.release_all(), 2);
        assert_eq!(client.listener_count(), 0);
        assert_eq!(keys.listener_count(), 0);
        assert!(!manager.holds(SourceKind::Client, Topic::Message));
        assert_eq!(manager.release_all(), 0);
    }

    #[test]
    fn drop_releases_held_listeners() {
        let commands = Rc::new(EventChannel::default());
        {
            let mut manager = SubscriptionManager::default();
            manager.acquire(SourceKind::Commands, commands.clone(), &[Topic::AppCommand]);
            assert_eq!(commands.listener_count(), 1);
        }
        assert_eq!(commands.listener_count(), 0);
    }
}
