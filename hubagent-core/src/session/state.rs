//! Session state, counters and per-tick reporting

use crate::errors::{ConnectError, SignError, TelemetryError};

/// Connection lifecycle
///
/// ```text
///                 connect()                 hub accepts
/// Disconnected ────────────▶ Authenticating ───────────▶ Connected
///      ▲   │ sign fails           │  ▲  rejected:              │
///      │   ▼                      │  └── backoff, re-sign ─────┤
///      │ Faulted                  │                            │
///      └──────────────────────────┴──── link lost / refresh ◀──┘
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConnectionState {
    /// No credential, no session
    #[default]
    Disconnected,
    /// Credential signed; handshake pending or being retried
    Authenticating,
    /// Hub accepted the credential
    Connected,
    /// Signing failed; see `SessionManager::fault`
    Faulted,
}

#[cfg(feature = "defmt")]
impl defmt::Format for ConnectionState {
    fn format(&self, fmt: defmt::Formatter) {
        match self {
            Self::Disconnected => defmt::write!(fmt, "Disconnected"),
            Self::Authenticating => defmt::write!(fmt, "Authenticating"),
            Self::Connected => defmt::write!(fmt, "Connected"),
            Self::Faulted => defmt::write!(fmt, "Faulted"),
        }
    }
}

/// Diagnostic message sequence number
///
/// Advanced once per successfully built payload, wrapping at `u32::MAX`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TelemetryCounter(u32);

impl TelemetryCounter {
    /// Counter starting at zero
    pub const fn new() -> Self {
        Self(0)
    }

    /// Value the next payload will carry
    pub fn current(&self) -> u32 {
        self.0
    }

    /// Return the current value and step past it
    pub fn advance(&mut self) -> u32 {
        let sequence = self.0;
        self.0 = self.0.wrapping_add(1);
        sequence
    }
}

/// Lifetime counters for the session
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SessionStats {
    /// Credentials presented to the transport
    pub connect_attempts: u32,
    /// Attempts the hub accepted
    pub connects: u32,
    /// Attempts that failed, for any reason
    pub connect_failures: u32,
    /// Credentials that could not be signed
    pub sign_failures: u32,
    /// Payloads handed to the transport
    pub publishes: u32,
    /// Payloads the transport refused
    pub publish_failures: u32,
    /// Sessions torn down ahead of token expiry
    pub refreshes: u32,
    /// Sessions found dead at the top of a tick
    pub link_losses: u32,
}

/// What one scheduler tick did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    /// State at the end of the tick
    pub state: ConnectionState,
    /// A session was established during this tick
    pub connected: bool,
    /// The previous session was found dead
    pub link_lost: bool,
    /// The previous session was closed to renew its credential
    pub refreshed: bool,
    /// Sequence number of the payload published this tick
    pub published: Option<u32>,
    /// Signing failed this tick
    pub sign_error: Option<SignError>,
    /// The connection attempt this tick failed
    pub connect_error: Option<ConnectError>,
    /// The due publish failed
    pub telemetry_error: Option<TelemetryError>,
}
