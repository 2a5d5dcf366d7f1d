//! Time-Related Constants
//!
//! Intervals and conversion factors for the session scheduler and token
//! signer.

// ===== TIME UNIT CONVERSIONS =====

/// Milliseconds per second.
pub const MS_PER_SECOND: u64 = 1000;

/// Seconds per hour.
pub const SECONDS_PER_HOUR: u64 = 3600;

// ===== SESSION =====

/// Default telemetry publish interval (milliseconds).
pub const DEFAULT_TELEMETRY_INTERVAL_MS: u64 = 10_000;

/// Default SAS token validity (seconds).
///
/// One hour, the hub's recommended lifetime for device-generated tokens.
pub const DEFAULT_TOKEN_VALIDITY_SECS: u64 = SECONDS_PER_HOUR;

/// Fixed backoff between failed connection attempts (milliseconds).
pub const DEFAULT_RECONNECT_BACKOFF_MS: u32 = 5_000;

/// How long before expiry the session re-authenticates (seconds).
///
/// Wide enough to cover a full backoff cycle plus one publish interval.
pub const DEFAULT_REFRESH_MARGIN_SECS: u64 = 300;

// ===== CLOCK =====

/// Earliest wall-clock time accepted for signing (seconds since epoch).
///
/// 2017-11-13. A device clock below this is still at its power-on value
/// and has not been set over SNTP yet.
pub const CLOCK_SANITY_FLOOR_SECS: u64 = 1_510_592_825;
