//! Sync activity tracking and idle detection.
//!
//! Every message the sync client sends or receives counts as activity, except
//! heartbeats (`h:<n>` frames), which flow continuously even when nothing changes.
//! Once no activity has been seen for the idle threshold, the tracker reports a
//! single transition back to idle.

use crate::sync::coalesce::Coalescer;
use std::time::Duration;

/// Prefix of the client's keep-alive frames.
const HEARTBEAT_PREFIX: &str = "h:";

/// Whether a client frame is a keep-alive rather than real activity.
#[must_use]
pub fn is_heartbeat(frame: &serde_json::Value) -> bool {
    frame
        .as_str()
        .is_some_and(|s| s.starts_with(HEARTBEAT_PREFIX))
}

/// Tracks whether the sync client is busy or has settled.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityTracker {
    settle: Coalescer,
    active: bool,
}

impl ActivityTracker {
    #[must_use]
    pub const fn new(idle_after: Duration) -> Self {
        Self {
            settle: Coalescer::new(idle_after, None),
            active: false,
        }
    }

    /// Records a client frame at `now`.
    ///
    /// Returns `true` if this frame moved the tracker from idle to active.
    pub fn record(&mut self, frame: &serde_json::Value, now: Duration) -> bool {
        if is_heartbeat(frame) {
            tracing::trace!("heartbeat ignored for activity");
            return false;
        }

        self.settle.trigger(now);
        let became_active = !self.active;
        self.active = true;
        became_active
    }

    /// Returns `true` exactly once when activity has settled into idle.
    pub fn poll(&mut self, now: Duration) -> bool {
        if self.settle.poll(now) {
            self.active = false;
            return true;
        }
        false
    }

    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// When the tracker will report idle, if traffic is pending.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.settle.deadline()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn settles_once_after_quiet_period() {
        let mut tracker = ActivityTracker::new(ms(1000));
        assert!(tracker.record(&json!("0:c:{}"), ms(0)));
        assert!(!tracker.record(&json!("0:c:{}"), ms(500)));
        assert!(!tracker.poll(ms(1200)));
        assert!(tracker.poll(ms(1500)));
        assert!(!tracker.is_active());
        assert!(!tracker.poll(ms(5000)));
    }

    #[test]
    fn heartbeats_do_not_count() {
        let mut tracker = ActivityTracker::new(ms(1000));
        assert!(!tracker.record(&json!("h:12"), ms(0)));
        assert!(!tracker.is_active());
        assert!(!tracker.poll(ms(2000)));
    }
}
