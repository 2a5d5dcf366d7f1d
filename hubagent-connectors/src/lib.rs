//! Host-side collaborators for HubAgent
//!
//! ## Overview
//!
//! `hubagent-core` is a `no_std` session engine that talks to the outside
//! world only through its [`Transport`], [`Clock`] and [`Delay`] traits.
//! This crate supplies the implementations a Linux-class gateway (or a
//! development host) needs to run it for real:
//!
//! | Concern        | Module       | Backed by                      |
//! |----------------|--------------|--------------------------------|
//! | Hub transport  | [`mqtt`]     | `rumqttc` over TLS, port 8883  |
//! | Topic layout   | [`topics`]   | hub-specific naming rules      |
//! | Serial frames  | [`serial`]   | any `std::io::Read`            |
//! | Provisioning   | [`settings`] | JSON file via `serde_json`     |
//!
//! Wall time and sleeping come straight from the core crate
//! ([`SystemClock`], [`ThreadDelay`]).
//!
//! ## MQTT Mapping
//!
//! The hub speaks MQTT 3.1.1 with a SAS token as the password:
//!
//! ```text
//! client id : {device_id}
//! username  : {hub}/{device_id}/?api-version=2020-09-30
//! password  : SharedAccessSignature sr=...&sig=...&se=...
//! publish   : devices/{device_id}/messages/events/$.ct=application%2Fjson&$.ce=UTF-8
//! subscribe : devices/{device_id}/messages/devicebound/#
//! ```
//!
//! Telemetry goes out at QoS 0. A lost payload is superseded by the next
//! one a few seconds later, so there is nothing to retry.
//!
//! ## Example Usage
//!
//! ```no_run
//! use hubagent_connectors::{mqtt::MqttTransport, settings::AgentSettings};
//! use hubagent_core::time::{SystemClock, ThreadDelay};
//! use hubagent_core::{SessionManager, StateRecord};
//!
//! let settings = AgentSettings::load("agent.json")?;
//! let transport = MqttTransport::new(settings.mqtt.clone());
//! let mut session = SessionManager::new(
//!     settings.identity()?,
//!     settings.session,
//!     transport,
//!     SystemClock,
//!     ThreadDelay,
//! );
//!
//! session.tick(&StateRecord::default());
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! [`Transport`]: hubagent_core::traits::Transport
//! [`Clock`]: hubagent_core::traits::Clock
//! [`Delay`]: hubagent_core::traits::Delay
//! [`SystemClock`]: hubagent_core::time::SystemClock
//! [`ThreadDelay`]: hubagent_core::time::ThreadDelay

#[cfg(feature = "mqtt")]
pub mod mqtt;

pub mod serial;
pub mod settings;
pub mod topics;

// Re-export common types
#[cfg(feature = "mqtt")]
pub use mqtt::{MqttSettings, MqttTransport};
pub use serial::{FeedSummary, SerialFeed};
pub use settings::AgentSettings;
pub use topics::HubTopics;

use thiserror::Error;

/// Common connector errors
#[derive(Debug, Error)]
pub enum ConnectorError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid settings file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Invalid device identity: {0}")]
    Identity(#[from] hubagent_core::ConfigError),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Connection statistics kept by a transport
#[derive(Debug, Default, Clone)]
pub struct ConnectionStats {
    /// Total messages sent successfully
    pub messages_sent: u64,
    /// Total messages failed to send
    pub messages_failed: u64,
    /// Total bytes sent
    pub bytes_sent: u64,
    /// Cloud-to-device messages delivered to the handler
    pub messages_received: u64,
    /// Sessions opened after the first
    pub reconnections: u32,
    /// Last error message
    pub last_error: Option<String>,
}

impl ConnectionStats {
    pub(crate) fn record_sent(&mut self, bytes: usize) {
        self.messages_sent += 1;
        self.bytes_sent += bytes as u64;
    }

    pub(crate) fn record_failure(&mut self, error: impl ToString) {
        self.messages_failed += 1;
        self.last_error = Some(error.to_string());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stats_track_traffic() {
        let mut stats = ConnectionStats::default();
        stats.record_sent(512);
        stats.record_sent(100);
        stats.record_failure("request queue full");

        assert_eq!(stats.messages_sent, 2);
        assert_eq!(stats.bytes_sent, 612);
        assert_eq!(stats.messages_failed, 1);
        assert_eq!(stats.last_error.as_deref(), Some("request queue full"));
    }

    #[test]
    fn identity_errors_convert() {
        let err: ConnectorError = hubagent_core::ConfigError::EmptyField { field: "hub" }.into();
        assert_eq!(err.to_string(), "Invalid device identity: Field hub is empty");
    }
}
