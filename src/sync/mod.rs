//! Sync event bridge and its timing primitives.
//!
//! # Modules
//!
//! - `messages`: topics, event sources, bucket and client events
//! - `clock`: system and virtual time sources
//! - `coalesce`: trailing-edge debounce with a maximum wait
//! - `activity`: idle detection over client traffic
//! - `bridge`: [`SyncBridge`], mapping events to actions

pub mod activity;
pub mod bridge;
pub mod clock;
pub mod coalesce;
pub mod messages;

pub use activity::ActivityTracker;
pub use bridge::SyncBridge;
pub use clock::{Clock, SystemClock, VirtualClock};
pub use coalesce::Coalescer;
pub use messages::{
    BucketEvent, ClientEvent, EventChannel, EventSource, ListenerId, ListenerSet,
    RemoteUpdateInfo, Topic,
};
