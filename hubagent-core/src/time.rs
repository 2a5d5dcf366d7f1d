//! Time management for the agent
//!
//! Provides the concrete clocks behind [`Clock`] and [`Delay`]:
//! - System clock and thread sleep (when `std` is available)
//! - Manual clock for tests and host-side simulation

use core::cell::Cell;

use crate::constants::MS_PER_SECOND;
use crate::traits::{Clock, Delay};

/// Timestamp in milliseconds since the Unix epoch
pub type Timestamp = u64;

/// Whole seconds of a timestamp, as used by token expiry
pub const fn to_secs(timestamp: Timestamp) -> u64 {
    timestamp / MS_PER_SECOND
}

/// Host wall clock (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

#[cfg(feature = "std")]
impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        use std::time::{SystemTime, UNIX_EPOCH};

        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_millis() as Timestamp
    }
}

/// Blocking delay backed by `thread::sleep` (requires std)
#[cfg(feature = "std")]
#[derive(Debug, Clone, Copy, Default)]
pub struct ThreadDelay;

#[cfg(feature = "std")]
impl Delay for ThreadDelay {
    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(std::time::Duration::from_millis(u64::from(ms)));
    }
}

/// Manually driven clock
///
/// Time only moves when told to. Delaying on a `&ManualClock` advances it
/// instead of sleeping, so a state machine holding the same clock as both
/// its [`Clock`] and its [`Delay`] sees backoffs pass instantly.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: Cell<Timestamp>,
}

impl ManualClock {
    /// Start at `timestamp` milliseconds
    pub fn new(timestamp: Timestamp) -> Self {
        Self { now: Cell::new(timestamp) }
    }

    /// Start at a whole number of seconds since the epoch
    pub fn from_secs(secs: u64) -> Self {
        Self::new(secs * MS_PER_SECOND)
    }

    /// Jump to an absolute reading
    pub fn set(&self, timestamp: Timestamp) {
        self.now.set(timestamp);
    }

    /// Move forward by `ms`
    pub fn advance(&self, ms: u64) {
        self.now.set(self.now.get().saturating_add(ms));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        self.now.get()
    }
}

impl Delay for &ManualClock {
    fn delay_ms(&mut self, ms: u32) {
        self.advance(u64::from(ms));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_advances() {
        let clock = ManualClock::new(1000);
        assert_eq!(clock.now(), 1000);

        clock.advance(500);
        assert_eq!(clock.now(), 1500);
    }

    #[test]
    fn delay_moves_manual_clock() {
        let clock = ManualClock::from_secs(10);
        let mut delay = &clock;
        delay.delay_ms(5_000);
        assert_eq!(to_secs(clock.now()), 15);
    }

    #[cfg(feature = "std")]
    #[test]
    fn system_clock_is_past_sanity_floor() {
        let now = SystemClock.now();
        assert!(to_secs(now) > crate::constants::CLOCK_SANITY_FLOOR_SECS);
    }
}
