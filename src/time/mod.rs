//! Presentation timing
//!
//! Every component in the crate is driven by a host-supplied monotonic
//! millisecond clock. Nothing here reads wall time: the host passes `now`
//! into each operation and calls `advance(now)` whenever the earliest
//! deadline reported by `next_deadline()` has passed.
//!
//! # Architecture
//!
//! - `TimerQueue` holds pending timers ordered by due time
//! - `TimerId` is the cancellable handle returned when scheduling
//! - `VirtualClock` is a manually advanced clock for headless runs and tests

pub mod timer;

pub use timer::{TimerId, TimerQueue};

/// Milliseconds on the host's monotonic clock
pub type Millis = u64;

/// Manually advanced clock
///
/// The headless driver and the tests use this instead of a real clock so
/// runs are deterministic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VirtualClock {
    now: Millis,
}

impl VirtualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn starting_at(now: Millis) -> Self {
        Self { now }
    }

    #[inline]
    pub fn now(&self) -> Millis {
        self.now
    }

    /// Move forward by `delta` milliseconds and return the new time
    pub fn advance_by(&mut self, delta: Millis) -> Millis {
        self.now = self.now.saturating_add(delta);
        self.now
    }

    /// Jump to `target`; the clock never moves backwards
    pub fn advance_to(&mut self, target: Millis) -> Millis {
        if target > self.now {
            self.now = target;
        }
        self.now
    }
}

/// Earliest of two optional deadlines
pub fn earliest(a: Option<Millis>, b: Option<Millis>) -> Option<Millis> {
    match (a, b) {
        (Some(a), Some(b)) => Some(a.min(b)),
        (Some(a), None) => Some(a),
        (None, b) => b,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_virtual_clock_advance() {
        let mut clock = VirtualClock::new();
        assert_eq!(clock.now(), 0);
        assert_eq!(clock.advance_by(250), 250);
        assert_eq!(clock.advance_to(1000), 1000);
    }

    #[test]
    fn test_virtual_clock_never_goes_backwards() {
        let mut clock = VirtualClock::starting_at(500);
        assert_eq!(clock.advance_to(100), 500);
        assert_eq!(clock.advance_by(u64::MAX), u64::MAX);
    }

    #[test]
    fn test_earliest() {
        assert_eq!(earliest(Some(5), Some(3)), Some(3));
        assert_eq!(earliest(Some(5), None), Some(5));
        assert_eq!(earliest(None, Some(7)), Some(7));
        assert_eq!(earliest(None, None), None);
    }
}
