//! Common test utilities for integration tests
//!
//! This module provides:
//! - A scripted in-memory transport that records what it was given
//! - Identity, clock and frame fixtures

#![allow(dead_code)]

use std::cell::Cell;
use std::collections::VecDeque;

use hubagent_core::{
    time::ManualClock,
    traits::{MessageHandler, Transport},
    ConnectError, DeviceIdentity, PublishError, SessionConfig, SessionCredential, SessionManager,
};

/// Clock reading comfortably past the sanity floor
pub const START_SECS: u64 = 1_700_000_000;

pub const HUB: &str = "myhub.azure-devices.net";
pub const DEVICE: &str = "sensor-01";
/// base64("secret-key-for-testing")
pub const KEY: &str = "c2VjcmV0LWtleS1mb3ItdGVzdGluZw==";

pub const TOPIC: &str = "devices/sensor-01/messages/events/$.ct=application%2Fjson&$.ce=UTF-8";

/// Reference frame used throughout the codec tests
pub const FRAME: &str = "1,250,45,10,400,1,250,45,10,400,1,50,1200,1,50,1200,1,0,0,5";

/// Credential as presented to the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Presented {
    pub token: String,
    pub issued_at: u64,
    pub expires_at: u64,
    /// Clock reading (seconds) when the credential was presented
    pub presented_at: u64,
}

/// In-memory transport driven by a script of connect outcomes
///
/// Connect results are taken from `script` in order; once it runs dry every
/// attempt succeeds. Everything handed to the transport is recorded. The
/// link state and publish failure sit in `Cell`s so a test can flip them
/// through the manager's read-only `transport()` view.
pub struct ScriptedTransport<'c> {
    clock: &'c ManualClock,
    pub script: VecDeque<Result<(), ConnectError>>,
    pub link_up: Cell<bool>,
    pub topic: String,
    pub presented: Vec<Presented>,
    pub published: Vec<(String, Vec<u8>)>,
    pub publish_failure: Cell<Option<PublishError>>,
    pub disconnects: u32,
    pub polls: u32,
    pub handler: Option<MessageHandler>,
}

impl<'c> ScriptedTransport<'c> {
    pub fn new(clock: &'c ManualClock) -> Self {
        Self {
            clock,
            script: VecDeque::new(),
            link_up: Cell::new(false),
            topic: TOPIC.to_string(),
            presented: Vec::new(),
            published: Vec::new(),
            publish_failure: Cell::new(None),
            disconnects: 0,
            polls: 0,
            handler: None,
        }
    }

    pub fn with_script(mut self, outcomes: &[Result<(), ConnectError>]) -> Self {
        self.script.extend(outcomes.iter().copied());
        self
    }

    /// Simulate a cloud-to-device message arriving
    pub fn deliver(&self, topic: &str, payload: &[u8]) -> bool {
        match self.handler {
            Some(handler) => {
                handler(topic, payload);
                true
            }
            None => false,
        }
    }

    /// Parsed JSON of the `index`th published payload
    pub fn payload_json(&self, index: usize) -> serde_json::Value {
        serde_json::from_slice(&self.published[index].1).expect("payload is valid JSON")
    }
}

impl Transport for ScriptedTransport<'_> {
    fn connect(
        &mut self,
        _identity: &DeviceIdentity,
        credential: &SessionCredential,
    ) -> Result<(), ConnectError> {
        self.presented.push(Presented {
            token: credential.token().to_string(),
            issued_at: credential.issued_at(),
            expires_at: credential.expires_at(),
            presented_at: self.clock.now_secs(),
        });

        let outcome = self.script.pop_front().unwrap_or(Ok(()));
        self.link_up.set(outcome.is_ok());
        outcome
    }

    fn disconnect(&mut self) {
        self.disconnects += 1;
        self.link_up.set(false);
    }

    fn publish(&mut self, topic: &str, payload: &[u8]) -> Result<(), PublishError> {
        if let Some(err) = self.publish_failure.get() {
            return Err(err);
        }
        if !self.link_up.get() {
            return Err(PublishError::NotConnected);
        }
        self.published.push((topic.to_string(), payload.to_vec()));
        Ok(())
    }

    fn is_connected(&self) -> bool {
        self.link_up.get()
    }

    fn telemetry_topic(&self) -> &str {
        &self.topic
    }

    fn set_message_handler(&mut self, handler: MessageHandler) {
        self.handler = Some(handler);
    }

    fn poll(&mut self) {
        self.polls += 1;
    }
}

/// Seconds view of a manual clock
pub trait NowSecs {
    fn now_secs(&self) -> u64;
}

impl NowSecs for ManualClock {
    fn now_secs(&self) -> u64 {
        use hubagent_core::traits::Clock;
        hubagent_core::time::to_secs(self.now())
    }
}

pub type TestSession<'c> = SessionManager<ScriptedTransport<'c>, &'c ManualClock, &'c ManualClock>;

pub fn identity() -> DeviceIdentity {
    DeviceIdentity::new(HUB, DEVICE, KEY).expect("valid identity")
}

/// Session over a scripted transport, sharing one manual clock for time and
/// backoff
pub fn session<'c>(
    clock: &'c ManualClock,
    identity: DeviceIdentity,
    config: SessionConfig,
    transport: ScriptedTransport<'c>,
) -> TestSession<'c> {
    SessionManager::new(identity, config, transport, clock, clock)
}
