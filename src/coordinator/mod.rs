//! Top-level controller and its lifecycle plumbing.
//!
//! # Modules
//!
//! - `controller`: [`Coordinator`], the single entry point for inputs
//! - `subscriptions`: scoped listener ownership
//! - `host`: outbound notifications to the host process

pub mod controller;
pub mod host;
pub mod subscriptions;

pub use controller::{Collaborators, Coordinator, Input, Update, PREFERENCES_KEY};
pub use host::{Host, HostMessage, RecordingHost};
pub use subscriptions::{SourceKind, SubscriptionManager};
