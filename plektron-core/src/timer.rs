//! Tick-driven timer primitives
//!
//! Button handlers own at most one [`Deadline`] (long-press) and one
//! [`RepeatTimer`] (auto-repeat) at a time, held as `Option` tokens.
//! Cancellation is `Option::take`: a dropped token can never fire,
//! so no late-firing window exists by construction.

/// One-shot deadline in absolute milliseconds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Deadline {
    at_ms: u64,
}

impl Deadline {
    /// Create a deadline `delay_ms` from `now_ms`.
    pub fn after(now_ms: u64, delay_ms: u64) -> Self {
        Self {
            at_ms: now_ms.saturating_add(delay_ms),
        }
    }

    /// Whether the deadline has passed.
    pub fn due(&self, now_ms: u64) -> bool {
        now_ms >= self.at_ms
    }

    /// Absolute firing time in milliseconds.
    pub fn at_ms(&self) -> u64 {
        self.at_ms
    }
}

/// Periodic schedule with a separate initial delay.
///
/// The first firing happens `initial_delay_ms` after the start, every
/// subsequent firing `period_ms` after the previous one. Late polls
/// catch up: one firing is reported per elapsed period, so event
/// counts stay exact even under a slow poll cadence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RepeatTimer {
    next_ms: u64,
    period_ms: u64,
}

impl RepeatTimer {
    /// Start a schedule at `now_ms`. A zero period is clamped to 1 ms
    /// so the catch-up loop always terminates.
    pub fn starting(now_ms: u64, initial_delay_ms: u64, period_ms: u64) -> Self {
        Self {
            next_ms: now_ms.saturating_add(initial_delay_ms),
            period_ms: period_ms.max(1),
        }
    }

    /// Advance the schedule to `now_ms`, returning how many firings
    /// elapsed since the last poll.
    pub fn poll(&mut self, now_ms: u64) -> u32 {
        let mut fired = 0;
        while now_ms >= self.next_ms {
            self.next_ms = self.next_ms.saturating_add(self.period_ms);
            fired += 1;
        }
        fired
    }

    /// Absolute time of the next firing in milliseconds.
    pub fn next_ms(&self) -> u64 {
        self.next_ms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn deadline_fires_at_and_after_expiry() {
        let d = Deadline::after(100, 500);
        assert!(!d.due(599));
        assert!(d.due(600));
        assert!(d.due(601));
        assert_eq!(d.at_ms(), 600);
    }

    #[test]
    fn repeat_fires_every_period() {
        let mut t = RepeatTimer::starting(0, 100, 100);
        assert_eq!(t.poll(99), 0);
        assert_eq!(t.poll(100), 1);
        assert_eq!(t.poll(199), 0);
        assert_eq!(t.poll(200), 1);
        assert_eq!(t.poll(300), 1);
    }

    #[test]
    fn repeat_split_initial_delay() {
        let mut t = RepeatTimer::starting(0, 1000, 50);
        assert_eq!(t.poll(999), 0);
        assert_eq!(t.poll(1000), 1);
        assert_eq!(t.poll(1050), 1);
        assert_eq!(t.poll(1100), 1);
    }

    #[test]
    fn late_poll_catches_up() {
        let mut t = RepeatTimer::starting(0, 100, 100);
        assert_eq!(t.poll(350), 3);
        assert_eq!(t.next_ms(), 400);
    }

    #[test]
    fn zero_period_is_clamped() {
        let mut t = RepeatTimer::starting(0, 10, 0);
        assert_eq!(t.poll(12), 3); // 10, 11, 12
    }
}
