//! Event protocol between the coordinator and its collaborators.
//!
//! Buckets, the sync client, the host command channel and the keyboard all publish
//! events on named [`Topic`]s. A collaborator only delivers a topic while someone
//! holds a listener for it, so releasing a listener is what stops delivery.
//!
//! # Example
//!
//! ```rust
//! use notesync::sync::{EventChannel, EventSource, Topic};
//!
//! let channel = EventChannel::default();
//! let listener = channel.subscribe(&[Topic::Connect, Topic::Disconnect]);
//! assert!(channel.is_subscribed(Topic::Connect));
//! assert!(channel.unsubscribe(listener));
//! assert!(!channel.is_subscribed(Topic::Connect));
//! ```

use crate::domain::EntityId;
use serde::{Deserialize, Serialize};
use std::cell::{Cell, RefCell};

/// Named event streams a collaborator can publish.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Topic {
    /// A bucket finished a full (re)index.
    Index,
    /// A bucket record changed.
    Update,
    /// A bucket record was removed.
    Remove,
    /// A bucket is about to push a record to the server.
    BeforeNetworkChange,
    Authorized,
    Unauthorized,
    Connect,
    Disconnect,
    /// The sync client received a message.
    Message,
    /// The sync client sent a message.
    Send,
    /// The host delivered an application command.
    AppCommand,
    /// A key was pressed.
    KeyDown,
}

/// Handle identifying one listener registration on a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(pub u64);

/// Anything that publishes events on topics.
///
/// Methods take `&self`; sources are shared between the host and the coordinator on
/// a single thread and keep their listener tables behind interior mutability.
pub trait EventSource {
    /// Registers one listener for `topics`.
    fn subscribe(&self, topics: &[Topic]) -> ListenerId;

    /// Removes a listener. Returns `false` if it was already gone.
    fn unsubscribe(&self, listener: ListenerId) -> bool;

    /// Whether any listener currently wants `topic`.
    fn is_subscribed(&self, topic: Topic) -> bool;
}

/// Listener table shared by the in-crate event sources.
#[derive(Debug, Default)]
pub struct ListenerSet {
    next_id: Cell<u64>,
    listeners: RefCell<Vec<(ListenerId, Vec<Topic>)>>,
}

impl ListenerSet {
    #[must_use]
    pub fn len(&self) -> usize {
        self.listeners.borrow().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.listeners.borrow().is_empty()
    }
}

impl EventSource for ListenerSet {
    fn subscribe(&self, topics: &[Topic]) -> ListenerId {
        let id = ListenerId(self.next_id.get());
        self.next_id.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, topics.to_vec()));
        id
    }

    fn unsubscribe(&self, listener: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(id, _)| *id != listener);
        listeners.len() != before
    }

    fn is_subscribed(&self, topic: Topic) -> bool {
        self.listeners
            .borrow()
            .iter()
            .any(|(_, topics)| topics.contains(&topic))
    }
}

/// A bare event source for collaborators that have no state of their own (the sync
/// client connection, the host command channel, the keyboard).
#[derive(Debug, Default)]
pub struct EventChannel {
    listeners: ListenerSet,
}

impl EventChannel {
    /// Number of live listener registrations.
    #[must_use]
    pub fn listener_count(&self) -> usize {
        self.listeners.len()
    }
}

impl EventSource for EventChannel {
    fn subscribe(&self, topics: &[Topic]) -> ListenerId {
        self.listeners.subscribe(topics)
    }

    fn unsubscribe(&self, listener: ListenerId) -> bool {
        self.listeners.unsubscribe(listener)
    }

    fn is_subscribed(&self, topic: Topic) -> bool {
        self.listeners.is_subscribed(topic)
    }
}

/// Extra information attached to a bucket `update`.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct RemoteUpdateInfo {
    /// The incoming remote patch, absent for purely local saves.
    #[serde(default)]
    pub patch: Option<serde_json::Value>,
}

impl RemoteUpdateInfo {
    #[must_use]
    pub const fn is_remote(&self) -> bool {
        self.patch.is_some()
    }
}

/// Lifecycle events published by a bucket holding records of type `T`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BucketEvent<T> {
    Index,
    Update {
        id: EntityId,
        data: T,
        info: RemoteUpdateInfo,
    },
    Remove {
        id: EntityId,
    },
    BeforeNetworkChange {
        id: EntityId,
    },
}

impl<T> BucketEvent<T> {
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Index => Topic::Index,
            Self::Update { .. } => Topic::Update,
            Self::Remove { .. } => Topic::Remove,
            Self::BeforeNetworkChange { .. } => Topic::BeforeNetworkChange,
        }
    }
}

/// Lifecycle events published by the remote sync client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "event", content = "data")]
pub enum ClientEvent {
    Authorized,
    Unauthorized,
    Connect,
    Disconnect,
    Message(serde_json::Value),
    Send(serde_json::Value),
}

impl ClientEvent {
    #[must_use]
    pub const fn topic(&self) -> Topic {
        match self {
            Self::Authorized => Topic::Authorized,
            Self::Unauthorized => Topic::Unauthorized,
            Self::Connect => Topic::Connect,
            Self::Disconnect => Topic::Disconnect,
            Self::Message(_) => Topic::Message,
            Self::Send(_) => Topic::Send,
        }
    }
}
