//! Clock and Delay Abstractions
//!
//! The session manager never reads a hardware timer or sleeps directly. It
//! is handed a [`Clock`] and a [`Delay`], which lets the same state machine
//! run on an SNTP-synchronised device clock, on the host wall clock, or on a
//! manual clock in tests where a five-second backoff costs nothing.
//!
//! ## Common Implementations
//!
//! - `SystemClock` / `ThreadDelay`: host wall clock and `thread::sleep`
//! - `ManualClock`: controllable time; its `Delay` advances the clock
//!
//! ## Platform-Specific Considerations
//!
//! ### Bare Metal
//! - Wall-clock time comes from SNTP; the clock is only meaningful once it
//!   has been synchronised (see `CLOCK_SANITY_FLOOR_SECS`)
//! - `delay_ms` may busy-wait; it is only called between connection attempts

use crate::time::Timestamp;

/// Source of wall-clock time
///
/// `now()` returns milliseconds since the Unix epoch. The signer derives
/// token expiry from it, so it must be synchronised before the first
/// connection attempt; the scheduler only needs it to be monotonic enough
/// that publish deadlines make progress.
pub trait Clock {
    /// Current time in milliseconds since the Unix epoch
    fn now(&self) -> Timestamp;
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now(&self) -> Timestamp {
        (**self).now()
    }
}

/// Blocking delay used for the reconnect backoff
pub trait Delay {
    /// Block the execution context for `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);
}

impl<D: Delay + ?Sized> Delay for &mut D {
    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }
}
