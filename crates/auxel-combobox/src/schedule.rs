//! Deferred work scheduling
//!
//! All deferred choreography (announcement restore, blur debounce, tab-arm
//! revert) runs through keyed timers. Scheduling a key cancels any pending
//! timer under the same key, so "reschedule cancels previous" is structural
//! rather than a convention. The host drives time by calling the component's
//! `tick` with a monotonic millisecond clock.

/// Announcement restore delay. Empirically tuned against specific screen
/// reader/engine pairings; a constant, not an invariant.
pub const RESTORE_DELAY_MS: u64 = 100;

/// Delay before treating a blur as final (focus may be moving within the
/// component).
pub const BLUR_DEBOUNCE_MS: u64 = 100;

/// How long a tab-armed dismiss affordance stays focusable.
pub const TAB_REVERT_MS: u64 = 200;

/// Purpose-keyed timer identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerKey {
    /// Restore focus/attributes after an announcement divert
    AnnounceRestore,
    /// Settle a blur that may be transient
    BlurDebounce,
    /// Revert a temporarily focusable dismiss affordance
    TabRevert,
}

/// Per-component timer set
#[derive(Debug, Default)]
pub struct Scheduler {
    now: u64,
    timers: Vec<(TimerKey, u64)>,
}

impl Scheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance the internal clock (never moves backwards)
    pub fn set_now(&mut self, now: u64) {
        if now > self.now {
            self.now = now;
        }
    }

    /// Schedule `key` to fire `delay` ms from the current clock, cancelling
    /// any pending timer with the same key.
    pub fn schedule_in(&mut self, key: TimerKey, delay: u64) {
        self.cancel(key);
        self.timers.push((key, self.now + delay));
    }

    /// Cancel a pending timer. Returns true when one was pending.
    pub fn cancel(&mut self, key: TimerKey) -> bool {
        let before = self.timers.len();
        self.timers.retain(|(k, _)| *k != key);
        self.timers.len() != before
    }

    /// Cancel everything (component disconnect)
    pub fn cancel_all(&mut self) {
        self.timers.clear();
    }

    /// Check whether a timer is pending
    pub fn is_pending(&self, key: TimerKey) -> bool {
        self.timers.iter().any(|(k, _)| *k == key)
    }

    /// Advance to `now` and return the keys that fired, in due order
    pub fn run_due(&mut self, now: u64) -> Vec<TimerKey> {
        self.set_now(now);
        let mut due: Vec<(TimerKey, u64)> = self
            .timers
            .iter()
            .copied()
            .filter(|(_, at)| *at <= now)
            .collect();
        self.timers.retain(|(_, at)| *at > now);
        due.sort_by_key(|(_, at)| *at);
        due.into_iter().map(|(k, _)| k).collect()
    }
}
