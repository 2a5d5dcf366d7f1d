//! Agent provisioning file
//!
//! One JSON document carries the device identity plus optional tuning for
//! the session, the MQTT link and the serial source:
//!
//! ```json
//! {
//!   "hub": "myhub.azure-devices.net",
//!   "device_id": "sensor-01",
//!   "device_key": "c2VjcmV0LWtleS1mb3ItdGVzdGluZw==",
//!   "session": { "telemetry_interval_ms": 10000 },
//!   "mqtt": { "keep_alive_secs": 60 },
//!   "serial": { "path": "/dev/ttyUSB0" }
//! }
//! ```
//!
//! Omitted sections take their defaults. The device key may instead come
//! from the `HUBAGENT_DEVICE_KEY` environment variable, which wins over the
//! file so the key need not be written to disk.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use hubagent_core::{DeviceIdentity, SessionConfig};

#[cfg(feature = "mqtt")]
use crate::mqtt::MqttSettings;
use crate::ConnectorError;

/// Environment override for the device key
pub const DEVICE_KEY_ENV: &str = "HUBAGENT_DEVICE_KEY";

/// Where serial frames come from
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialSettings {
    /// Character device to read; stdin when unset
    pub path: Option<PathBuf>,
}

/// Everything the agent binary needs at start-up
#[derive(Clone, Serialize, Deserialize)]
pub struct AgentSettings {
    pub hub: String,
    pub device_id: String,
    #[serde(default)]
    pub device_key: String,

    #[serde(default)]
    pub session: SessionConfig,

    #[cfg(feature = "mqtt")]
    #[serde(default)]
    pub mqtt: MqttSettings,

    #[serde(default)]
    pub serial: SerialSettings,
}

impl AgentSettings {
    /// Read and validate a settings file, applying the key override
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConnectorError> {
        let text = fs::read_to_string(path.as_ref())?;
        let mut settings = Self::from_json(&text)?;

        if let Ok(key) = std::env::var(DEVICE_KEY_ENV) {
            settings.device_key = key;
        }
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json(text: &str) -> Result<Self, ConnectorError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check the settings would produce a working session
    pub fn validate(&self) -> Result<(), ConnectorError> {
        self.identity()?;

        if self.session.telemetry_interval_ms == 0 {
            return Err(ConnectorError::ConfigError(
                "session.telemetry_interval_ms must be positive".into(),
            ));
        }
        if self.session.token_validity_secs == 0 {
            return Err(ConnectorError::ConfigError(
                "session.token_validity_secs must be positive".into(),
            ));
        }
        Ok(())
    }

    /// Bounded identity for the session manager
    pub fn identity(&self) -> Result<DeviceIdentity, ConnectorError> {
        Ok(DeviceIdentity::new(&self.hub, &self.device_id, &self.device_key)?)
    }
}

impl std::fmt::Debug for AgentSettings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AgentSettings")
            .field("hub", &self.hub)
            .field("device_id", &self.device_id)
            .field("device_key", &"<redacted>")
            .field("session", &self.session)
            .field("serial", &self.serial)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    const MINIMAL: &str = r#"{
        "hub": "myhub.azure-devices.net",
        "device_id": "sensor-01",
        "device_key": "c2VjcmV0LWtleS1mb3ItdGVzdGluZw=="
    }"#;

    #[test]
    fn minimal_file_takes_defaults() {
        let settings = AgentSettings::from_json(MINIMAL).unwrap();
        assert_eq!(settings.session, SessionConfig::default());
        assert_eq!(settings.serial.path, None);
        settings.validate().unwrap();

        let identity = settings.identity().unwrap();
        assert_eq!(identity.device_id(), "sensor-01");
    }

    #[test]
    fn sections_override_defaults() {
        let settings = AgentSettings::from_json(
            r#"{
                "hub": "h.example",
                "device_id": "dev1",
                "device_key": "aw==",
                "session": { "telemetry_interval_ms": 2500, "refresh_margin_secs": 60 },
                "serial": { "path": "/dev/ttyUSB0" }
            }"#,
        )
        .unwrap();

        assert_eq!(settings.session.telemetry_interval_ms, 2500);
        assert_eq!(settings.session.refresh_margin_secs, 60);
        assert_eq!(settings.session.token_validity_secs, 3600);
        assert_eq!(settings.serial.path.as_deref(), Some(Path::new("/dev/ttyUSB0")));
    }

    #[test]
    fn missing_key_fails_validation() {
        let settings =
            AgentSettings::from_json(r#"{ "hub": "h.example", "device_id": "dev1" }"#).unwrap();
        assert!(matches!(
            settings.validate(),
            Err(ConnectorError::Identity(hubagent_core::ConfigError::EmptyField {
                field: "device_key"
            }))
        ));
    }

    #[test]
    fn zero_interval_is_rejected() {
        let mut settings = AgentSettings::from_json(MINIMAL).unwrap();
        settings.session.telemetry_interval_ms = 0;
        assert!(matches!(settings.validate(), Err(ConnectorError::ConfigError(_))));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(MINIMAL.as_bytes()).unwrap();

        let settings = AgentSettings::load(file.path()).unwrap();
        assert_eq!(settings.hub, "myhub.azure-devices.net");
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"{ not json").unwrap();

        assert!(matches!(AgentSettings::load(file.path()), Err(ConnectorError::Parse(_))));
    }

    #[test]
    fn debug_redacts_key() {
        let settings = AgentSettings::from_json(MINIMAL).unwrap();
        let text = format!("{:?}", settings);
        assert!(!text.contains("c2VjcmV0"));
        assert!(text.contains("<redacted>"));
    }
}
