//! Outbound messages to the host process.
//!
//! The host owns the window chrome, printing, export and analytics. The coordinator
//! only tells it what happened; nothing comes back on this path.

use crate::domain::{EntityId, Settings};
use serde::Serialize;
use std::cell::RefCell;

/// A notification for the host process.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "type", content = "payload")]
pub enum HostMessage {
    /// Mirrors the current settings; sent at start and on every change.
    SettingsUpdate(Settings),
    SetAutoHideMenuBar(bool),
    #[serde(rename_all = "camelCase")]
    PrintNote { note_id: Option<EntityId> },
    ExportArchive,
    #[serde(rename_all = "camelCase")]
    AnalyticsInitialize { account_name: Option<String> },
    AnalyticsEvent { name: String },
}

/// Receiver of [`HostMessage`]s.
pub trait Host {
    fn send(&self, message: HostMessage);
}

/// Host that keeps every message, for the shim and tests.
#[derive(Debug, Default)]
pub struct RecordingHost {
    sent: RefCell<Vec<HostMessage>>,
}

impl RecordingHost {
    /// Messages sent so far, oldest first.
    #[must_use]
    pub fn messages(&self) -> Vec<HostMessage> {
        self.sent.borrow().clone()
    }

    /// Removes and returns the messages sent so far.
    pub fn take(&self) -> Vec<HostMessage> {
        std::mem::take(&mut *self.sent.borrow_mut())
    }
}

impl Host for RecordingHost {
    fn send(&self, message: HostMessage) {
        tracing::trace!(?message, "host message");
        self.sent.borrow_mut().push(message);
    }
}
