//! Device provisioning and session tuning
//!
//! [`DeviceIdentity`] is what the hub knows the device by; it is built once
//! at start-up and never mutated. [`SessionConfig`] holds the scheduler and
//! token timings, defaulting to the values in [`crate::constants::time`].

use heapless::String;

use crate::constants::{
    DEFAULT_RECONNECT_BACKOFF_MS, DEFAULT_REFRESH_MARGIN_SECS, DEFAULT_TELEMETRY_INTERVAL_MS,
    DEFAULT_TOKEN_VALIDITY_SECS, DEVICE_ID_MAX_LEN, DEVICE_KEY_MAX_LEN, HUB_MAX_LEN,
};
use crate::errors::ConfigError;

/// Immutable device identity: hub host, device id, base64 symmetric key
#[derive(Clone, PartialEq, Eq)]
pub struct DeviceIdentity {
    hub: String<HUB_MAX_LEN>,
    device_id: String<DEVICE_ID_MAX_LEN>,
    key: String<DEVICE_KEY_MAX_LEN>,
}

impl DeviceIdentity {
    /// Build an identity, copying each field into its bounded buffer
    ///
    /// The key is kept in its base64 form; it is only decoded, into scratch
    /// space, while a token is being signed.
    pub fn new(hub: &str, device_id: &str, key: &str) -> Result<Self, ConfigError> {
        Ok(Self {
            hub: bounded("hub", hub)?,
            device_id: bounded("device_id", device_id)?,
            key: bounded("device_key", key)?,
        })
    }

    /// Hub host name, e.g. `myhub.azure-devices.net`
    pub fn hub(&self) -> &str {
        &self.hub
    }

    /// Device name registered with the hub
    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    /// Base64 text of the symmetric key
    pub fn key(&self) -> &str {
        &self.key
    }
}

// Keeps the key out of logs.
impl core::fmt::Debug for DeviceIdentity {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("DeviceIdentity")
            .field("hub", &self.hub.as_str())
            .field("device_id", &self.device_id.as_str())
            .field("key", &"<redacted>")
            .finish()
    }
}

fn bounded<const N: usize>(field: &'static str, value: &str) -> Result<String<N>, ConfigError> {
    if value.is_empty() {
        return Err(ConfigError::EmptyField { field });
    }

    let mut out = String::new();
    out.push_str(value)
        .map_err(|_| ConfigError::FieldTooLong { field, max: N })?;
    Ok(out)
}

/// Scheduler and token timings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Time between telemetry publishes (ms)
    pub telemetry_interval_ms: u64,

    /// Lifetime of each SAS token (s)
    pub token_validity_secs: u64,

    /// Pause after a failed connection attempt (ms)
    pub reconnect_backoff_ms: u32,

    /// Re-authenticate this long before the token expires (s)
    pub refresh_margin_secs: u64,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            telemetry_interval_ms: DEFAULT_TELEMETRY_INTERVAL_MS,
            token_validity_secs: DEFAULT_TOKEN_VALIDITY_SECS,
            reconnect_backoff_ms: DEFAULT_RECONNECT_BACKOFF_MS,
            refresh_margin_secs: DEFAULT_REFRESH_MARGIN_SECS,
        }
    }
}

impl SessionConfig {
    /// Set the publish interval
    pub fn with_telemetry_interval_ms(mut self, ms: u64) -> Self {
        self.telemetry_interval_ms = ms;
        self
    }

    /// Set how long each signed token lives; must be at least one second
    pub fn with_token_validity_secs(mut self, secs: u64) -> Self {
        self.token_validity_secs = secs;
        self
    }

    /// Set the pause after a failed attempt
    pub fn with_reconnect_backoff_ms(mut self, ms: u32) -> Self {
        self.reconnect_backoff_ms = ms;
        self
    }

    /// Set the refresh margin
    ///
    /// A margin at or above the token validity would refresh on every tick;
    /// it is clamped to half the validity.
    pub fn with_refresh_margin_secs(mut self, secs: u64) -> Self {
        self.refresh_margin_secs = secs;
        self
    }

    /// Refresh margin actually applied by the session manager
    pub fn effective_refresh_margin_secs(&self) -> u64 {
        self.refresh_margin_secs.min(self.token_validity_secs / 2)
    }
}
