//! MQTT transport for the hub
//!
//! Implements the core [`Transport`] contract on top of `rumqttc`'s
//! synchronous client. Each [`Transport::connect`] builds a fresh client
//! with the credential as its password and drives the event loop until the
//! hub answers the CONNECT; the previous client, if any, is dropped first.
//!
//! Between connects the event loop only advances inside [`Transport::poll`],
//! which the session manager calls once per tick. Outgoing publishes are
//! queued on the request channel and flushed by that same poll.

use std::time::{Duration, Instant};

use log::{debug, error, info, warn};
use rumqttc::{
    Client, ConnectReturnCode, Connection, ConnectionError, Event, MqttOptions, Packet, QoS,
    RecvTimeoutError,
};
use serde::{Deserialize, Serialize};

use hubagent_core::traits::{MessageHandler, Transport};
use hubagent_core::{ConnectError, DeviceIdentity, PublishError, SessionCredential};

use crate::topics::HubTopics;
use crate::ConnectionStats;

/// Secure MQTT port
pub const DEFAULT_PORT: u16 = 8883;

/// Smallest keep-alive the client accepts
const MIN_KEEP_ALIVE_SECS: u64 = 5;

/// Most inbound events handled by a single poll
const MAX_EVENTS_PER_POLL: usize = 32;

/// MQTT link tuning
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MqttSettings {
    /// Broker host; the hub name when unset
    pub host: Option<String>,
    pub port: u16,
    pub keep_alive_secs: u64,
    /// Give up on a CONNECT that has not been answered after this long
    pub connect_timeout_ms: u64,
    /// How long one poll waits for each inbound event
    pub poll_timeout_ms: u64,
    /// Wrap the socket in TLS (the hub requires it; tests and local
    /// brokers may not)
    pub tls: bool,
    /// Request channel depth
    pub capacity: usize,
}

impl Default for MqttSettings {
    fn default() -> Self {
        Self {
            host: None,
            port: DEFAULT_PORT,
            keep_alive_secs: 60,
            connect_timeout_ms: 10_000,
            poll_timeout_ms: 20,
            tls: true,
            capacity: 10,
        }
    }
}

struct Link {
    client: Client,
    connection: Connection,
}

/// [`Transport`] over a `rumqttc` client
pub struct MqttTransport {
    settings: MqttSettings,
    topics: Option<HubTopics>,
    link: Option<Link>,
    connected: bool,
    handler: Option<MessageHandler>,
    sessions: u32,
    stats: ConnectionStats,
}

impl MqttTransport {
    pub fn new(settings: MqttSettings) -> Self {
        Self {
            settings,
            topics: None,
            link: None,
            connected: false,
            handler: None,
            sessions: 0,
            stats: ConnectionStats::default(),
        }
    }

    pub fn settings(&self) -> &MqttSettings {
        &self.settings
    }

    pub fn stats(&self) -> &ConnectionStats {
        &self.stats
    }

    fn options(&self, identity: &DeviceIdentity, credential: &SessionCredential, topics: &HubTopics) -> MqttOptions {
        let host = self.settings.host.as_deref().unwrap_or(identity.hub());
        let mut options = MqttOptions::new(identity.device_id(), host, self.settings.port);
        options
            .set_credentials(topics.username(), credential.token())
            .set_keep_alive(Duration::from_secs(self.settings.keep_alive_secs.max(MIN_KEEP_ALIVE_SECS)))
            .set_clean_session(true);

        if self.settings.tls {
            options.set_transport(rumqttc::Transport::tls_with_default_config());
        }
        options
    }

    /// Drive the event loop until the hub answers the CONNECT
    fn await_connack(&self, connection: &mut Connection) -> Result<(), ConnectError> {
        let deadline = Instant::now() + Duration::from_millis(self.settings.connect_timeout_ms);

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                warn!("Timed out waiting for CONNACK");
                return Err(ConnectError::TransportUnavailable);
            }

            match connection.recv_timeout(remaining) {
                Ok(Ok(Event::Incoming(Packet::ConnAck(ack)))) => {
                    return match ack.code {
                        ConnectReturnCode::Success => Ok(()),
                        code => Err(refusal_error(code)),
                    };
                }
                Ok(Ok(event)) => debug!("Handshake event: {:?}", event),
                Ok(Err(ConnectionError::ConnectionRefused(code))) => {
                    warn!("Hub refused connection: {:?}", code);
                    return Err(refusal_error(code));
                }
                Ok(Err(err)) => {
                    warn!("MQTT handshake failed: {}", err);
                    return Err(ConnectError::TransportUnavailable);
                }
                Err(RecvTimeoutError::Timeout) => {}
                Err(RecvTimeoutError::Disconnected) => return Err(ConnectError::TransportUnavailable),
            }
        }
    }

    fn dispatch(&mut self, topic: &str, payload: &[u8]) {
        self.stats.messages_received += 1;
        match self.handler {
            Some(handler) => handler(topic, payload),
            None => debug!("Dropping cloud-to-device message on {} (no handler)", topic),
        }
    }

    fn mark_lost(&mut self, reason: &str) {
        if self.connected {
            error!("MQTT link lost: {}", reason);
        }
        self.connected = false;
        self.stats.last_error = Some(reason.to_string());
    }
}

/// Map a refused CONNECT to the session's view of it
pub fn refusal_error(code: ConnectReturnCode) -> ConnectError {
    match code {
        ConnectReturnCode::BadUserNamePassword | ConnectReturnCode::NotAuthorized => {
            ConnectError::CredentialRejected
        }
        _ => ConnectError::TransportUnavailable,
    }
}

impl Transport for MqttTransport {
    fn connect(
        &mut self,
        identity: &DeviceIdentity,
        credential: &SessionCredential,
    ) -> Result<(), ConnectError> {
        self.disconnect();

        let topics = HubTopics::for_identity(identity);
        let options = self.options(identity, credential, &topics);
        let (client, mut connection) = Client::new(options, self.settings.capacity);

        self.await_connack(&mut connection)?;

        if let Err(err) = client.subscribe(topics.cloud_to_device(), QoS::AtMostOnce) {
            warn!("Subscribing to cloud-to-device messages failed: {}", err);
            return Err(ConnectError::TransportUnavailable);
        }

        info!("MQTT session open for {}", identity.device_id());
        if self.sessions > 0 {
            self.stats.reconnections += 1;
        }
        self.sessions += 1;
        self.topics = Some(topics);
        self.link = Some(Link { client, connection });
        self.connected = true;
        Ok(())
    }

    fn disconnect(&mut self) {
        if let Some(link) = self.link.take() {
            if let Err(err) = link.client.try_disconnect() {
                debug!("DISCONNECT not queued: {}", err);
            }
        }
        self.connected = false;
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        let link = match (&self.link, self.connected) {
            (Some(link), true) => link,
            _ => return Err(PublishError::NotConnected),
        };

        match link.client.try_publish(topic, QoS::AtMostOnce, false, payload.to_vec()) {
            Ok(()) => {
                self.stats.record_sent(payload.len());
                Ok(())
            }
            Err(err) => {
                self.stats.record_failure(&err);
                Err(PublishError::Transport { reason: "request queue full" })
            }
        }
    }

    fn is_connected(&self) -> bool {
        self.connected
    }

    fn telemetry_topic(&self) -> &str {
        self.topics.as_ref().map_or("", HubTopics::telemetry)
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        self.handler = Some(handler);
    }

    fn poll(&mut self) {
        let wait = Duration::from_millis(self.settings.poll_timeout_ms);

        for _ in 0..MAX_EVENTS_PER_POLL {
            let Some(link) = self.link.as_mut() else {
                return;
            };

            match link.connection.recv_timeout(wait) {
                Ok(Ok(Event::Incoming(Packet::Publish(message)))) => {
                    self.dispatch(&message.topic, &message.payload);
                }
                Ok(Ok(Event::Incoming(Packet::Disconnect))) => {
                    self.mark_lost("hub sent DISCONNECT");
                    return;
                }
                Ok(Ok(_)) => {}
                Ok(Err(err)) => {
                    self.mark_lost(&err.to_string());
                    return;
                }
                Err(RecvTimeoutError::Timeout) => return,
                Err(RecvTimeoutError::Disconnected) => {
                    self.mark_lost("event loop closed");
                    return;
                }
            }
        }
    }
}
