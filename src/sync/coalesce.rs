//! Coalescing timer: many triggers, one deferred effect.
//!
//! A [`Coalescer`] owns a single pending slot. The first trigger arms it; later
//! triggers only push the deadline back, never past `anchor + ceiling`. The anchor
//! is the previous fire when that is less than one ceiling ago, otherwise the
//! arming trigger, so steady pressure still fires once per ceiling.
//! [`Coalescer::poll`] fires once when the deadline has passed and disarms.
//!
//! ```text
//! fire ── trigger ─┬─ trigger ─┬─ trigger ───── poll ≥ deadline → fire
//!                  │← window →│← window →│
//!  │←──────────────────── ceiling ─────────────────→│
//! ```

use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Pending {
    anchor: Duration,
    deadline: Duration,
}

/// Trailing-edge debounce with an optional maximum wait.
///
/// # Example
///
/// ```rust
/// use notesync::sync::Coalescer;
/// use std::time::Duration;
///
/// let ms = Duration::from_millis;
/// let mut reload = Coalescer::new(ms(200), Some(ms(1000)));
/// reload.trigger(ms(0));
/// reload.trigger(ms(150));
/// assert!(!reload.poll(ms(300)));
/// assert!(reload.poll(ms(350)));
/// assert!(!reload.poll(ms(400)));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Coalescer {
    window: Duration,
    ceiling: Option<Duration>,
    pending: Option<Pending>,
    last_fired: Option<Duration>,
}

impl Coalescer {
    #[must_use]
    pub const fn new(window: Duration, ceiling: Option<Duration>) -> Self {
        Self {
            window,
            ceiling,
            pending: None,
            last_fired: None,
        }
    }

    /// Records a trigger at `now`, arming the slot if it is idle.
    ///
    /// Returns `true` when this trigger armed a new pending effect.
    pub fn trigger(&mut self, now: Duration) -> bool {
        let anchor = self.pending.map_or_else(|| self.anchor_for(now), |p| p.anchor);
        let mut deadline = now + self.window;
        if let Some(ceiling) = self.ceiling {
            deadline = deadline.min(anchor + ceiling);
        }

        let armed = self.pending.is_none();
        self.pending = Some(Pending { anchor, deadline });
        armed
    }

    /// Fires (and disarms) if a pending effect is due at `now`.
    pub fn poll(&mut self, now: Duration) -> bool {
        match self.pending {
            Some(pending) if now >= pending.deadline => {
                self.pending = None;
                self.last_fired = Some(now);
                true
            }
            _ => false,
        }
    }

    fn anchor_for(&self, now: Duration) -> Duration {
        match (self.last_fired, self.ceiling) {
            (Some(fired), Some(ceiling)) if now.saturating_sub(fired) < ceiling => fired,
            _ => now,
        }
    }

    #[must_use]
    pub const fn is_pending(&self) -> bool {
        self.pending.is_some()
    }

    /// When the pending effect will fire, if any.
    #[must_use]
    pub fn deadline(&self) -> Option<Duration> {
        self.pending.map(|p| p.deadline)
    }
}
